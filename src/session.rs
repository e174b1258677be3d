//! Per-tab session identity.
//!
//! The backend scopes indexed documents by the `X-Session-ID` header, so the
//! identifier lives exactly as long as one chat and is replaced on "New chat".

use std::fmt;
use uuid::Uuid;

pub const SESSION_HEADER: &str = "X-Session-ID";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::generate()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}
