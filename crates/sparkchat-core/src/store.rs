//! In-memory conversation store
//!
//! Owns the list of chats (newest first) and the active-chat pointer. The
//! active pointer only ever references a chat that exists in the list.

use tracing::debug;

use crate::error::ChatError;
use crate::state::{display_timestamp, Chat, ChatId, Message, MessageId, Sender, PLACEHOLDER_TITLE};

/// Maximum number of words kept when deriving a title from a first message
pub const TITLE_WORDS: usize = 6;

/// Build a chat title from its first message: the first six words, followed
/// by "..." when the message had more.
pub fn derive_title(text: &str) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut title = words
        .iter()
        .take(TITLE_WORDS)
        .copied()
        .collect::<Vec<_>>()
        .join(" ");

    if words.len() > TITLE_WORDS {
        title.push_str("...");
    }

    title
}

#[derive(Debug, Default)]
pub struct ConversationStore {
    chats: Vec<Chat>,
    active: Option<ChatId>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty chat, put it at the top of the list and make it active
    pub fn create_chat(&mut self) -> ChatId {
        let chat = Chat::new(display_timestamp());
        let id = chat.id;
        self.chats.insert(0, chat);
        self.active = Some(id);
        debug!(chat_id = %id, "created chat");
        id
    }

    /// Append a message to a chat. The first message of a chat also sets its title.
    pub fn append_message(
        &mut self,
        chat_id: ChatId,
        content: &str,
        sender: Sender,
    ) -> Result<MessageId, ChatError> {
        let chat = self
            .chats
            .iter_mut()
            .find(|c| c.id == chat_id)
            .ok_or(ChatError::NotFound(chat_id))?;

        if chat.messages.is_empty() {
            chat.title = derive_title(content);
        }

        let message = Message {
            id: MessageId::new(),
            content: content.to_string(),
            sender,
            timestamp: display_timestamp(),
        };
        let id = message.id;
        chat.messages.push(message);

        debug!(chat_id = %chat_id, message_id = %id, ?sender, "appended message");
        Ok(id)
    }

    /// Make `chat_id` the active chat. Unknown ids are ignored and return false.
    pub fn select_chat(&mut self, chat_id: ChatId) -> bool {
        if self.chats.iter().any(|c| c.id == chat_id) {
            self.active = Some(chat_id);
            true
        } else {
            debug!(chat_id = %chat_id, "ignoring selection of unknown chat");
            false
        }
    }

    pub fn chats(&self) -> &[Chat] {
        &self.chats
    }

    pub fn chat(&self, chat_id: ChatId) -> Option<&Chat> {
        self.chats.iter().find(|c| c.id == chat_id)
    }

    pub fn active_chat_id(&self) -> Option<ChatId> {
        self.active
    }

    pub fn active_chat(&self) -> Option<&Chat> {
        self.active.and_then(|id| self.chat(id))
    }

    /// Messages of the active chat, empty when nothing is active
    pub fn active_messages(&self) -> &[Message] {
        self.active_chat().map(|c| c.messages.as_slice()).unwrap_or(&[])
    }

    pub fn active_title(&self) -> &str {
        self.active_chat()
            .map(|c| c.title.as_str())
            .unwrap_or(PLACEHOLDER_TITLE)
    }

    /// Position of the active chat in `chats()`
    pub fn active_index(&self) -> Option<usize> {
        self.active
            .and_then(|id| self.chats.iter().position(|c| c.id == id))
    }
}
