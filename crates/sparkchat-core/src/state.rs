//! UI-agnostic conversation types
//!
//! This module contains the data structures shared between the store, the turn
//! controller and any view layer. None of them depend on a UI framework.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Title shown for a chat until its first message arrives
pub const PLACEHOLDER_TITLE: &str = "New Chat";

/// Opaque identifier of a chat, unique for the process lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatId(Uuid);

impl ChatId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ChatId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chat-{}", self.0)
    }
}

/// Opaque identifier of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg-{}", self.0)
    }
}

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    pub fn label(&self) -> &'static str {
        match self {
            Sender::User => "You",
            Sender::Assistant => "AI",
        }
    }
}

/// A single message in a chat. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub content: String,
    pub sender: Sender,
    pub timestamp: String,
}

/// One conversation thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: ChatId,
    pub title: String,
    pub timestamp: String,
    pub messages: Vec<Message>,
}

impl Chat {
    pub(crate) fn new(timestamp: String) -> Self {
        Self {
            id: ChatId::new(),
            title: PLACEHOLDER_TITLE.to_string(),
            timestamp,
            messages: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Current local time as a two-digit `HH:MM` display string
pub fn display_timestamp() -> String {
    chrono::Local::now().format("%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let a = ChatId::new();
        let b = ChatId::new();
        assert_ne!(a, b);
        assert!(a.to_string().starts_with("chat-"));
        assert!(MessageId::new().to_string().starts_with("msg-"));
    }

    #[test]
    fn test_display_timestamp_is_hour_minute() {
        let ts = display_timestamp();
        assert_eq!(ts.len(), 5);
        assert_eq!(ts.as_bytes()[2], b':');
    }

    #[test]
    fn test_new_chat_has_placeholder_title() {
        let chat = Chat::new("09:30".to_string());
        assert_eq!(chat.title, PLACEHOLDER_TITLE);
        assert!(chat.is_empty());
    }
}
