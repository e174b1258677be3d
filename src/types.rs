use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn display_name(self) -> &'static str {
        match self {
            Role::User => "You",
            Role::Assistant => "Assistant",
        }
    }

    pub fn avatar(self) -> &'static str {
        match self {
            Role::User => "U",
            Role::Assistant => "A",
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A document fragment the backend cited for an answer.
///
/// The backend has shipped two shapes over time: a flat
/// `{ "filename", "chunk_index" }` object and one nested under `metadata`.
/// Both are accepted, and `chunk_index` may be a number or a string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawSource")]
pub struct SourceRef {
    pub filename: String,
    pub chunk_index: Option<String>,
}

const UNKNOWN_FILENAME: &str = "doc";

impl SourceRef {
    pub fn new(filename: impl Into<String>, chunk_index: Option<String>) -> Self {
        Self {
            filename: filename.into(),
            chunk_index,
        }
    }

    /// The single line shown under "Sources:".
    pub fn label(&self) -> String {
        match &self.chunk_index {
            Some(idx) => format!("{} (chunk {})", self.filename, idx),
            None => self.filename.clone(),
        }
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawChunkIndex {
    Number(i64),
    Text(String),
}

impl RawChunkIndex {
    fn into_label(self) -> String {
        match self {
            RawChunkIndex::Number(n) => n.to_string(),
            RawChunkIndex::Text(s) => s,
        }
    }
}

#[derive(Deserialize, Default)]
struct RawSourceFields {
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    chunk_index: Option<RawChunkIndex>,
}

#[derive(Deserialize)]
struct RawSource {
    #[serde(flatten)]
    fields: RawSourceFields,
    #[serde(default)]
    metadata: Option<RawSourceFields>,
}

impl From<RawSource> for SourceRef {
    fn from(raw: RawSource) -> Self {
        let nested = raw.metadata.unwrap_or_default();
        let filename = raw
            .fields
            .filename
            .or(nested.filename)
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_FILENAME.to_string());
        let chunk_index = raw
            .fields
            .chunk_index
            .or(nested.chunk_index)
            .map(RawChunkIndex::into_label);
        SourceRef {
            filename,
            chunk_index,
        }
    }
}

// Wire bodies for the RAG backend.

#[derive(Serialize)]
pub struct AskRequest<'a> {
    pub question: &'a str,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Answer {
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<SourceRef>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct UploadReceipt {
    pub chunks_indexed: u64,
}

#[derive(Serialize)]
pub struct RewriteRequest<'a> {
    pub answer: &'a str,
    pub style: &'a str,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Rewrite {
    #[serde(default)]
    pub original_answer: Option<String>,
    #[serde(default)]
    pub style_request: Option<String>,
    pub new_answer: String,
}

#[derive(Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}
