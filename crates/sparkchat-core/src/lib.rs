pub mod config;
pub mod controller;
pub mod error;
pub mod generator;
pub mod provider;
pub mod state;
pub mod store;

// Re-export main types for convenience
pub use config::Config;
pub use controller::{ChatEvent, TurnController, TurnOutcome, TurnState, MAX_MESSAGE_CHARS};
pub use error::ChatError;
pub use generator::{build_generator, CannedGenerator, OllamaGenerator, ResponseGenerator};
pub use provider::GeneratorKind;
pub use state::{Chat, ChatId, Message, MessageId, Sender, PLACEHOLDER_TITLE};
pub use store::{derive_title, ConversationStore};
