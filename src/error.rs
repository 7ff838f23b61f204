//! Request-level error taxonomy.
//!
//! Every variant collapses to the same generic response at the HTTP
//! boundary; the distinction only matters for logs and tests.
//! Tool-level failures live in [`crate::tools::ToolError`] and never
//! reach this type.

/// Failure of a chat or history request.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// The `conversationId` cookie is present but not a positive integer.
    #[error("invalid conversationId in cookies: {0:?}")]
    InvalidSession(String),

    /// A store read or write failed, including a missing generated id.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// The agent gateway failed to produce a reply.
    #[error("agent error: {0}")]
    Agent(String),
}

impl From<rusqlite::Error> for ChatError {
    fn from(e: rusqlite::Error) -> Self {
        ChatError::Persistence(e.to_string())
    }
}

impl ChatError {
    /// Short machine-friendly tag used in structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ChatError::InvalidSession(_) => "invalid_session",
            ChatError::Persistence(_) => "persistence",
            ChatError::Agent(_) => "agent",
        }
    }
}
