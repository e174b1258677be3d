/// HTTP access to the retrieval-augmented-generation backend
///
/// The backend is an opaque collaborator exposing three JSON/multipart calls:
///
/// - `POST /upload` - index a document for the current session
/// - `POST /ask` - answer a question with source citations
/// - `POST /rewrite` - restyle a previous answer
///
/// Every call carries the `X-Session-ID` header so the backend can scope
/// indexed documents per chat.
///
/// # Usage
///
/// ```rust,no_run
/// use ragchat::api::{RagBackend, RagClient};
/// use ragchat::session::SessionId;
///
/// # async fn example() -> ragchat::api::ApiResult<()> {
/// let client = RagClient::new("http://localhost:5000");
/// let session = SessionId::generate();
/// let answer = client.ask(&session, "What is the refund policy?").await?;
/// println!("{}", answer.answer);
/// # Ok(())
/// # }
/// ```
mod client;
mod error;

pub use client::{RagBackend, RagClient, UploadFile};
pub use error::{ApiError, ApiResult, NETWORK_ERROR_TEXT};
