use super::{ApiError, ApiResult};
use crate::config::ClientConfig;
use crate::session::{SESSION_HEADER, SessionId};
use crate::types::{Answer, AskRequest, ErrorBody, Rewrite, RewriteRequest, UploadReceipt};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

/// A document picked by the user, read fully into memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "txt"];

impl UploadFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Whatever follows the last `.`, so `.pdf` on its own counts as a pdf.
    fn extension(&self) -> Option<String> {
        self.name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
    }

    /// Mirrors the backend's extension allow-list.
    pub fn is_allowed(&self) -> bool {
        self.extension()
            .is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
    }

    pub fn mime_type(&self) -> &'static str {
        match self.extension().as_deref() {
            Some("pdf") => "application/pdf",
            Some("txt") => "text/plain",
            _ => "application/octet-stream",
        }
    }
}

/// The calls the conversation makes against the backend.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait RagBackend {
    async fn upload(&self, session: &SessionId, file: &UploadFile) -> ApiResult<UploadReceipt>;

    async fn ask(&self, session: &SessionId, question: &str) -> ApiResult<Answer>;

    async fn rewrite(&self, session: &SessionId, answer: &str, style: &str)
    -> ApiResult<Rewrite>;
}

pub struct RagClient {
    client: Client,
    base_url: String,
}

impl RagClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.api_base.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let status = response.status();
    let body = response.text().await?;
    if status.is_success() {
        Ok(serde_json::from_str::<T>(&body)?)
    } else {
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|parsed| parsed.error);
        Err(ApiError::server(status, message))
    }
}

fn log_outcome<T>(call: &str, outcome: &ApiResult<T>) {
    if let Err(err) = outcome {
        tracing::warn!(call, error = %err, "backend call failed");
    }
}

impl RagClient {
    async fn send_upload(
        &self,
        session: &SessionId,
        file: &UploadFile,
    ) -> ApiResult<UploadReceipt> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(file.mime_type())?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(self.endpoint("upload"))
            .header(SESSION_HEADER, session.to_string())
            .multipart(form)
            .send()
            .await?;
        read_json(response).await
    }

    async fn send_ask(&self, session: &SessionId, question: &str) -> ApiResult<Answer> {
        let response = self
            .client
            .post(self.endpoint("ask"))
            .header(SESSION_HEADER, session.to_string())
            .json(&AskRequest { question })
            .send()
            .await?;
        read_json(response).await
    }

    async fn send_rewrite(
        &self,
        session: &SessionId,
        answer: &str,
        style: &str,
    ) -> ApiResult<Rewrite> {
        let response = self
            .client
            .post(self.endpoint("rewrite"))
            .header(SESSION_HEADER, session.to_string())
            .json(&RewriteRequest { answer, style })
            .send()
            .await?;
        read_json(response).await
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl RagBackend for RagClient {
    async fn upload(&self, session: &SessionId, file: &UploadFile) -> ApiResult<UploadReceipt> {
        tracing::debug!(
            %session,
            file = %file.name,
            bytes = file.bytes.len(),
            "uploading document"
        );
        let outcome = self.send_upload(session, file).await;
        log_outcome("upload", &outcome);
        outcome
    }

    async fn ask(&self, session: &SessionId, question: &str) -> ApiResult<Answer> {
        tracing::debug!(%session, "asking question");
        let outcome = self.send_ask(session, question).await;
        log_outcome("ask", &outcome);
        outcome
    }

    async fn rewrite(
        &self,
        session: &SessionId,
        answer: &str,
        style: &str,
    ) -> ApiResult<Rewrite> {
        tracing::debug!(%session, style, "rewriting answer");
        let outcome = self.send_rewrite(session, answer, style).await;
        log_outcome("rewrite", &outcome);
        outcome
    }
}
