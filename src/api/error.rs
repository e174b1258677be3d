use reqwest::StatusCode;

/// Text shown for anything that is not a server-reported error.
pub const NETWORK_ERROR_TEXT: &str = "Network error";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("transport failure: {0}")]
    Transport(String),

    /// Non-2xx response. `message` is the backend's `error` field, if it sent
    /// a non-blank one.
    #[error("{}", server_text(.status, .message))]
    Server { status: u16, message: Option<String> },

    /// A 2xx response whose body did not match the expected shape.
    #[error("unreadable response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn server(status: StatusCode, message: Option<String>) -> Self {
        ApiError::Server {
            status: status.as_u16(),
            message: message.filter(|msg| !msg.trim().is_empty()),
        }
    }

    /// Server errors are shown verbatim, or as `Request failed with status N`
    /// when the backend gave no message. Everything else collapses to
    /// [`NETWORK_ERROR_TEXT`].
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Server { status, message } => server_text(status, message),
            ApiError::Transport(_) | ApiError::Decode(_) => NETWORK_ERROR_TEXT.to_string(),
        }
    }

    /// The backend's own `error` text, without any fallback.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Server { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

fn server_text(status: &u16, message: &Option<String>) -> String {
    match message {
        Some(message) => message.clone(),
        None => format!("Request failed with status {status}"),
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
