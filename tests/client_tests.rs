//! Integration tests for the HTTP client
//!
//! Each test stands up a one-shot HTTP responder on localhost, points a
//! `RagClient` at it and inspects both the raw request and the parsed result.

use ragchat::api::{ApiError, NETWORK_ERROR_TEXT, RagBackend, RagClient, UploadFile};
use ragchat::conversation::{Conversation, UPLOAD_FAILED_TEXT, UploadStatus};
use ragchat::session::SessionId;
use ragchat::transcript::RevealStep;
use ragchat::types::SourceRef;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Answers exactly one request with `status` and `body`, then hands back the
/// request it received.
async fn respond_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let request = read_request(&mut stream).await;
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.shutdown().await.ok();
        request
    });

    (base, handle)
}

async fn read_request(stream: &mut TcpStream) -> String {
    let mut raw = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = stream.read(&mut buf).await.unwrap();
        if n == 0 {
            break;
        }
        raw.extend_from_slice(&buf[..n]);
        if request_complete(&raw) {
            break;
        }
    }
    String::from_utf8_lossy(&raw).into_owned()
}

fn request_complete(raw: &[u8]) -> bool {
    let text = String::from_utf8_lossy(raw);
    let Some(header_end) = text.find("\r\n\r\n") else {
        return false;
    };
    let head = text[..header_end].to_ascii_lowercase();
    let body_len = raw.len() - (header_end + 4);

    if head.contains("transfer-encoding: chunked") {
        return text.ends_with("0\r\n\r\n");
    }
    let expected = head
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    body_len >= expected
}

fn header_line(session: &SessionId) -> String {
    format!("x-session-id: {session}")
}

mod ask_tests {
    use super::*;

    #[tokio::test]
    async fn test_ask_posts_question_with_session_header() {
        let (base, server) = respond_once(
            "200 OK",
            r#"{"answer":"30 days.","sources":[{"filename":"policy.pdf"}]}"#,
        )
        .await;
        let client = RagClient::new(base);
        let session = SessionId::generate();

        let answer = client
            .ask(&session, "What is the refund policy?")
            .await
            .expect("answer");

        assert_eq!(answer.answer, "30 days.");
        assert_eq!(answer.sources, vec![SourceRef::new("policy.pdf", None)]);

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /ask HTTP/1.1"));
        let lowered = request.to_ascii_lowercase();
        assert!(lowered.contains(&header_line(&session)));
        assert!(lowered.contains("content-type: application/json"));
        assert!(request.ends_with(r#"{"question":"What is the refund policy?"}"#));
    }

    #[tokio::test]
    async fn test_error_field_becomes_server_error() {
        let (base, server) =
            respond_once("400 Bad Request", r#"{"error":"No question provided"}"#).await;
        let client = RagClient::new(base);

        let err = client.ask(&SessionId::generate(), "?").await.unwrap_err();
        server.await.unwrap();

        assert_eq!(
            err,
            ApiError::Server {
                status: 400,
                message: Some("No question provided".to_string()),
            }
        );
        assert_eq!(err.user_message(), "No question provided");
    }

    #[tokio::test]
    async fn test_error_without_body_names_the_status() {
        let (base, server) = respond_once("500 Internal Server Error", "oops").await;
        let client = RagClient::new(base);

        let err = client.ask(&SessionId::generate(), "?").await.unwrap_err();
        server.await.unwrap();

        assert_eq!(err.user_message(), "Request failed with status 500");
    }

    #[tokio::test]
    async fn test_malformed_success_body_reads_as_network_error() {
        let (base, server) = respond_once("200 OK", r#"{"unexpected":true}"#).await;
        let client = RagClient::new(base);

        let err = client.ask(&SessionId::generate(), "?").await.unwrap_err();
        server.await.unwrap();

        assert!(matches!(err, ApiError::Decode(_)));
        assert_eq!(err.user_message(), NETWORK_ERROR_TEXT);
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let err = RagClient::new(base)
            .ask(&SessionId::generate(), "hello")
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Transport(_)));
        assert_eq!(err.user_message(), NETWORK_ERROR_TEXT);
    }
}

mod upload_tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_sends_multipart_file_field() {
        let (base, server) = respond_once("200 OK", r#"{"chunks_indexed":4}"#).await;
        let client = RagClient::new(format!("{base}/"));
        let session = SessionId::generate();
        let file = UploadFile::new("notes.txt", b"refunds within 30 days".to_vec());

        let receipt = client.upload(&session, &file).await.expect("receipt");
        assert_eq!(receipt.chunks_indexed, 4);

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /upload HTTP/1.1"));
        let lowered = request.to_ascii_lowercase();
        assert!(lowered.contains(&header_line(&session)));
        assert!(lowered.contains("content-type: multipart/form-data; boundary="));
        assert!(request.contains(r#"name="file"; filename="notes.txt""#));
        assert!(lowered.contains("content-type: text/plain"));
        assert!(request.contains("refunds within 30 days"));
    }

    #[tokio::test]
    async fn test_upload_rejection_keeps_server_message() {
        let (base, server) = respond_once(
            "500 Internal Server Error",
            r#"{"error":"Indexing failed due to an internal server issue."}"#,
        )
        .await;
        let client = RagClient::new(base);

        let err = client
            .upload(
                &SessionId::generate(),
                &UploadFile::new("policy.pdf", b"%PDF-1.4".to_vec()),
            )
            .await
            .unwrap_err();
        server.await.unwrap();

        assert_eq!(
            err.server_message(),
            Some("Indexing failed due to an internal server issue.")
        );
    }

    #[tokio::test]
    async fn test_upload_rejection_without_message_reads_upload_failed() {
        let (base, server) = respond_once("500 Internal Server Error", "{}").await;
        let client = RagClient::new(base);
        let mut conversation = Conversation::new();

        let confirmation = conversation
            .upload_document(&client, UploadFile::new("policy.pdf", b"%PDF-1.4".to_vec()))
            .await;
        server.await.unwrap();

        assert!(confirmation.is_none());
        assert_eq!(
            conversation.upload_status(),
            &UploadStatus::Failed(UPLOAD_FAILED_TEXT.to_string())
        );
        assert_eq!(conversation.upload_status().label(), "Upload failed.");
        let last = conversation.transcript().turns().last().unwrap();
        assert_eq!(last.text, "Upload failed.");
        assert_eq!(conversation.indexed_chunks(), 0);
    }
}

mod rewrite_tests {
    use super::*;

    #[tokio::test]
    async fn test_rewrite_posts_answer_and_style() {
        let (base, server) = respond_once(
            "200 OK",
            r#"{"original_answer":"30 days.","style_request":"more formal","new_answer":"Refunds are accepted within thirty days."}"#,
        )
        .await;
        let client = RagClient::new(base);
        let session = SessionId::generate();

        let rewrite = client
            .rewrite(&session, "30 days.", "more formal")
            .await
            .expect("rewrite");
        assert_eq!(rewrite.new_answer, "Refunds are accepted within thirty days.");
        assert_eq!(rewrite.style_request.as_deref(), Some("more formal"));

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /rewrite HTTP/1.1"));
        assert!(request.to_ascii_lowercase().contains(&header_line(&session)));
        assert!(request.ends_with(r#"{"answer":"30 days.","style":"more formal"}"#));
    }
}

mod end_to_end_tests {
    use super::*;

    #[tokio::test]
    async fn test_conversation_over_http() {
        let (base, server) = respond_once(
            "200 OK",
            r#"{"answer":"30 days.","sources":[{"metadata":{"filename":"policy.pdf","chunk_index":0}}]}"#,
        )
        .await;
        let client = RagClient::new(base);
        let mut conversation = Conversation::new();

        let id = conversation
            .ask_question(&client, "What is the refund policy?")
            .await
            .unwrap();
        assert_eq!(
            conversation.transcript_mut().complete_reveal(id),
            RevealStep::Finished
        );

        let turn = conversation.transcript().get(id).unwrap();
        assert_eq!(turn.text, "30 days.");
        let lines: Vec<String> = turn.sources.iter().map(SourceRef::label).collect();
        assert_eq!(lines, vec!["policy.pdf (chunk 0)".to_string()]);

        let request = server.await.unwrap().to_ascii_lowercase();
        assert!(request.contains(&header_line(conversation.session())));
    }
}
