//! The chat client component.
//!
//! [`Conversation`] owns the session identifier, the transcript, the upload
//! status and the single in-flight guard for questions. Every network
//! operation is split in two synchronous halves (`begin_*` / `complete_*`)
//! around the backend call, so a UI can hold the state in a reactive cell
//! without keeping it borrowed across an await point. The `*_question`,
//! `*_document` and `*_answer` async helpers run both halves against any
//! [`RagBackend`].

use crate::api::{ApiError, ApiResult, RagBackend, UploadFile};
use crate::session::SessionId;
use crate::transcript::{Transcript, TurnId, TurnOrigin, TurnState};
use crate::types::{Answer, Rewrite, SourceRef, UploadReceipt};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub const WELCOME_MESSAGE: &str =
    "Hi 👋, upload a PDF or text file and then ask me anything about it.";
pub const UPLOAD_FAILED_TEXT: &str = "Upload failed.";
pub const FILE_TYPE_NOT_ALLOWED: &str = "File type not allowed";
pub const REWRITE_STYLES: &[&str] = &["simpler", "shorter", "more formal", "bullet points"];

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum UploadStatus {
    #[default]
    Idle,
    Uploading,
    Indexed(u64),
    Failed(String),
    NetworkError,
}

impl UploadStatus {
    pub fn label(&self) -> String {
        match self {
            UploadStatus::Idle => String::new(),
            UploadStatus::Uploading => "Uploading & indexing...".to_string(),
            UploadStatus::Indexed(count) => format!("Indexed {count} chunks."),
            UploadStatus::Failed(message) => message.clone(),
            UploadStatus::NetworkError => crate::api::NETWORK_ERROR_TEXT.to_string(),
        }
    }
}

/// Shared busy flag for the ask control.
#[derive(Clone, Debug, Default)]
pub struct AskGate(Arc<AtomicBool>);

impl AskGate {
    pub fn try_acquire(&self) -> Option<AskPermit> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| AskPermit(self.clone()))
    }

    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Held while a question is outstanding; asking is re-enabled when it drops,
/// whichever way the exchange ends.
#[derive(Debug)]
pub struct AskPermit(AskGate);

impl Drop for AskPermit {
    fn drop(&mut self) {
        (self.0).0.store(false, Ordering::Release);
    }
}

/// A question that has been shown and is waiting on the backend.
#[derive(Debug)]
pub struct PendingAsk {
    session: SessionId,
    question: String,
    typing: TurnId,
    _permit: AskPermit,
}

impl PendingAsk {
    pub fn session(&self) -> &SessionId {
        &self.session
    }

    pub fn question(&self) -> &str {
        &self.question
    }
}

#[derive(Debug)]
pub struct PendingRewrite {
    session: SessionId,
    answer: String,
    style: String,
    sources: Vec<SourceRef>,
    typing: TurnId,
    _permit: AskPermit,
}

impl PendingRewrite {
    pub fn session(&self) -> &SessionId {
        &self.session
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn style(&self) -> &str {
        &self.style
    }
}

#[derive(Debug)]
pub struct PendingUpload {
    session: SessionId,
    file: UploadFile,
}

impl PendingUpload {
    pub fn session(&self) -> &SessionId {
        &self.session
    }

    pub fn file(&self) -> &UploadFile {
        &self.file
    }
}

#[derive(Debug)]
pub struct Conversation {
    session: SessionId,
    transcript: Transcript,
    ask_gate: AskGate,
    upload_status: UploadStatus,
    indexed_chunks: u64,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    /// A fresh chat: new session, welcome turn queued for reveal.
    pub fn new() -> Self {
        let mut conversation = Self {
            session: SessionId::generate(),
            transcript: Transcript::new(),
            ask_gate: AskGate::default(),
            upload_status: UploadStatus::Idle,
            indexed_chunks: 0,
        };
        conversation.push_welcome();
        conversation
    }

    fn push_welcome(&mut self) -> TurnId {
        self.transcript
            .begin_reveal(TurnOrigin::Notice, WELCOME_MESSAGE, Vec::new())
    }

    pub fn session(&self) -> &SessionId {
        &self.session
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn transcript_mut(&mut self) -> &mut Transcript {
        &mut self.transcript
    }

    pub fn upload_status(&self) -> &UploadStatus {
        &self.upload_status
    }

    pub fn indexed_chunks(&self) -> u64 {
        self.indexed_chunks
    }

    pub fn is_awaiting(&self) -> bool {
        self.ask_gate.is_busy()
    }

    /// Drops the transcript and starts over under a new session id.
    /// Returns the welcome turn, which still needs revealing.
    pub fn reset_session(&mut self) -> TurnId {
        let previous = self.session;
        self.session = SessionId::generate();
        self.transcript.clear();
        self.upload_status = UploadStatus::Idle;
        self.indexed_chunks = 0;
        tracing::info!(%previous, session = %self.session, "started new chat");
        self.push_welcome()
    }

    fn is_stale(&self, session: &SessionId, call: &str) -> bool {
        let stale = *session != self.session;
        if stale {
            tracing::info!(%session, call, "discarding response from a previous chat");
        }
        stale
    }

    // ---- ask ----

    /// Shows the question and a typing placeholder. `None` when the trimmed
    /// text is empty or another question is still outstanding.
    pub fn begin_ask(&mut self, text: &str) -> Option<PendingAsk> {
        let question = text.trim();
        if question.is_empty() {
            return None;
        }
        let permit = self.ask_gate.try_acquire()?;

        self.transcript.push_user(question);
        let typing = self.transcript.push_typing();
        Some(PendingAsk {
            session: self.session,
            question: question.to_string(),
            typing,
            _permit: permit,
        })
    }

    /// Replaces the placeholder with the answer (or error) and returns the
    /// turn to reveal. `None` if the chat was reset in the meantime.
    pub fn complete_ask(
        &mut self,
        pending: PendingAsk,
        outcome: ApiResult<Answer>,
    ) -> Option<TurnId> {
        if self.is_stale(&pending.session, "ask") {
            return None;
        }
        self.transcript.remove(pending.typing);
        let id = match outcome {
            Ok(answer) => {
                self.transcript
                    .begin_reveal(TurnOrigin::Answer, answer.answer, answer.sources)
            }
            Err(err) => {
                self.transcript
                    .begin_reveal(TurnOrigin::Notice, err.user_message(), Vec::new())
            }
        };
        Some(id)
    }

    pub async fn ask_question<B>(&mut self, backend: &B, text: &str) -> Option<TurnId>
    where
        B: RagBackend + ?Sized,
    {
        let pending = self.begin_ask(text)?;
        let outcome = backend.ask(&pending.session, &pending.question).await;
        self.complete_ask(pending, outcome)
    }

    // ---- rewrite ----

    /// Starts restyling a settled answer. Shares the in-flight guard with
    /// asking.
    pub fn begin_rewrite(&mut self, turn: TurnId, style: &str) -> Option<PendingRewrite> {
        let style = style.trim();
        if style.is_empty() {
            return None;
        }
        let source = self.transcript.get(turn)?;
        if source.origin != TurnOrigin::Answer || source.state != TurnState::Settled {
            return None;
        }
        let answer = source.text.clone();
        let sources = source.sources.clone();
        let permit = self.ask_gate.try_acquire()?;

        let typing = self.transcript.push_typing();
        Some(PendingRewrite {
            session: self.session,
            answer,
            style: style.to_string(),
            sources,
            typing,
            _permit: permit,
        })
    }

    pub fn complete_rewrite(
        &mut self,
        pending: PendingRewrite,
        outcome: ApiResult<Rewrite>,
    ) -> Option<TurnId> {
        if self.is_stale(&pending.session, "rewrite") {
            return None;
        }
        self.transcript.remove(pending.typing);
        let id = match outcome {
            Ok(rewrite) => {
                self.transcript
                    .begin_reveal(TurnOrigin::Answer, rewrite.new_answer, pending.sources)
            }
            Err(err) => {
                self.transcript
                    .begin_reveal(TurnOrigin::Notice, err.user_message(), Vec::new())
            }
        };
        Some(id)
    }

    pub async fn rewrite_answer<B>(
        &mut self,
        backend: &B,
        turn: TurnId,
        style: &str,
    ) -> Option<TurnId>
    where
        B: RagBackend + ?Sized,
    {
        let pending = self.begin_rewrite(turn, style)?;
        let outcome = backend
            .rewrite(&pending.session, &pending.answer, &pending.style)
            .await;
        self.complete_rewrite(pending, outcome)
    }

    // ---- upload ----

    /// Marks the upload as in progress. Files the backend would refuse are
    /// rejected here without a request.
    pub fn begin_upload(&mut self, file: UploadFile) -> Option<PendingUpload> {
        if !file.is_allowed() {
            tracing::warn!(file = %file.name, "refusing upload with unsupported extension");
            self.upload_status = UploadStatus::Failed(FILE_TYPE_NOT_ALLOWED.to_string());
            self.transcript
                .push_assistant(TurnOrigin::Notice, FILE_TYPE_NOT_ALLOWED);
            return None;
        }
        self.upload_status = UploadStatus::Uploading;
        Some(PendingUpload {
            session: self.session,
            file,
        })
    }

    /// Applies the upload result. Returns the confirmation turn to reveal on
    /// success.
    pub fn complete_upload(
        &mut self,
        pending: PendingUpload,
        outcome: ApiResult<UploadReceipt>,
    ) -> Option<TurnId> {
        if self.is_stale(&pending.session, "upload") {
            return None;
        }
        match outcome {
            Ok(receipt) => {
                self.indexed_chunks = self.indexed_chunks.saturating_add(receipt.chunks_indexed);
                self.upload_status = UploadStatus::Indexed(receipt.chunks_indexed);
                let confirmation = format!(
                    "Your document \"{}\" has been uploaded and indexed.",
                    pending.file.name
                );
                Some(
                    self.transcript
                        .begin_reveal(TurnOrigin::Notice, confirmation, Vec::new()),
                )
            }
            Err(ApiError::Server { message, .. }) => {
                let status = message.unwrap_or_else(|| UPLOAD_FAILED_TEXT.to_string());
                self.upload_status = UploadStatus::Failed(status.clone());
                self.transcript.push_assistant(TurnOrigin::Notice, status);
                None
            }
            Err(_) => {
                self.upload_status = UploadStatus::NetworkError;
                None
            }
        }
    }

    pub async fn upload_document<B>(&mut self, backend: &B, file: UploadFile) -> Option<TurnId>
    where
        B: RagBackend + ?Sized,
    {
        let pending = self.begin_upload(file)?;
        let outcome = backend.upload(&pending.session, &pending.file).await;
        self.complete_upload(pending, outcome)
    }
}
