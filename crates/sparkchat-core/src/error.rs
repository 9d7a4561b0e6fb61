//! Error types for conversation and turn operations.

use crate::state::ChatId;

/// Error type returned by the store, the turn controller and generators.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    /// An operation referenced a chat id that does not exist in the store.
    #[error("chat not found: {0}")]
    NotFound(ChatId),

    /// The response generator could not produce a response.
    #[error("generation failed: {0}")]
    GenerationFailure(String),

    /// A turn is already outstanding.
    #[error("a response is already pending")]
    Busy,

    #[error("message is empty")]
    EmptyMessage,

    #[error("message is too long ({len} characters, max {max})")]
    MessageTooLong { len: usize, max: usize },
}

impl From<reqwest::Error> for ChatError {
    fn from(e: reqwest::Error) -> Self {
        ChatError::GenerationFailure(e.to_string())
    }
}
