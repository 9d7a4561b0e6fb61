//! Turn controller
//!
//! Drives one request/response turn at a time: the user message is appended,
//! the pending flag is raised, the generator runs as a background task, and
//! when its result is collected the assistant message (or the failure) is
//! recorded and the pending flag is lowered again.
//!
//! State changes are observable through the getters and through a
//! [`ChatEvent`] stream from [`TurnController::subscribe`]. Events are emitted
//! in the order the changes happen, so a subscriber always sees the user
//! message before `PendingChanged(true)` and the assistant message (or
//! `TurnFailed`) before `PendingChanged(false)`.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, warn};

use crate::error::ChatError;
use crate::generator::ResponseGenerator;
use crate::state::{ChatId, MessageId, Sender};
use crate::store::ConversationStore;

/// Longest message accepted by [`TurnController::send`], in characters
pub const MAX_MESSAGE_CHARS: usize = 2000;

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    ChatCreated(ChatId),
    ChatSelected(ChatId),
    MessageAppended {
        chat_id: ChatId,
        message_id: MessageId,
        sender: Sender,
    },
    TitleChanged {
        chat_id: ChatId,
        title: String,
    },
    PendingChanged(bool),
    TurnFailed {
        chat_id: ChatId,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    AwaitingResponse,
}

/// How a finished turn ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Replied(MessageId),
    Failed(ChatError),
}

struct InFlight {
    chat_id: ChatId,
    task: JoinHandle<Result<String, ChatError>>,
}

pub struct TurnController {
    store: ConversationStore,
    generator: Arc<dyn ResponseGenerator>,
    in_flight: Option<InFlight>,
    events: broadcast::Sender<ChatEvent>,
}

impl TurnController {
    pub fn new(generator: Arc<dyn ResponseGenerator>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            store: ConversationStore::new(),
            generator,
            in_flight: None,
            events,
        }
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn generator_name(&self) -> String {
        self.generator.name()
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn state(&self) -> TurnState {
        if self.is_pending() {
            TurnState::AwaitingResponse
        } else {
            TurnState::Idle
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.events.subscribe()
    }

    pub fn create_chat(&mut self) -> ChatId {
        let chat_id = self.store.create_chat();
        self.emit(ChatEvent::ChatCreated(chat_id));
        chat_id
    }

    /// Switch the active chat. Unknown ids are a no-op.
    pub fn select_chat(&mut self, chat_id: ChatId) -> bool {
        let selected = self.store.select_chat(chat_id);
        if selected {
            self.emit(ChatEvent::ChatSelected(chat_id));
        }
        selected
    }

    /// Start a turn: record the user message, raise the pending flag and spawn
    /// the generator. Must be called from within a tokio runtime.
    ///
    /// Rejected with [`ChatError::Busy`] while another turn is outstanding; in
    /// that case nothing is changed.
    pub fn send(&mut self, text: &str) -> Result<MessageId, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        let len = text.chars().count();
        if len > MAX_MESSAGE_CHARS {
            return Err(ChatError::MessageTooLong {
                len,
                max: MAX_MESSAGE_CHARS,
            });
        }
        if self.is_pending() {
            warn!("rejecting send while a response is pending");
            return Err(ChatError::Busy);
        }

        let chat_id = match self.store.active_chat_id() {
            Some(id) => id,
            None => self.create_chat(),
        };

        let message_id = self.append(chat_id, text, Sender::User)?;

        self.emit(ChatEvent::PendingChanged(true));
        let generator = Arc::clone(&self.generator);
        let prompt = text.to_string();
        let task = tokio::spawn(async move { generator.generate(&prompt).await });
        self.in_flight = Some(InFlight { chat_id, task });

        info!(chat_id = %chat_id, generator = %self.generator.name(), "turn started");
        Ok(message_id)
    }

    /// Finish the outstanding turn if its generator is done. Returns `None`
    /// when there is no turn or it is still running.
    pub async fn poll_turn(&mut self) -> Option<TurnOutcome> {
        let finished = self
            .in_flight
            .as_ref()
            .is_some_and(|in_flight| in_flight.task.is_finished());
        if finished {
            self.wait_turn().await
        } else {
            None
        }
    }

    /// Wait for the outstanding turn, if any, and finish it
    pub async fn wait_turn(&mut self) -> Option<TurnOutcome> {
        let InFlight { chat_id, task } = self.in_flight.take()?;
        let result = task.await;
        Some(self.finish_turn(chat_id, result))
    }

    /// Send `text` and wait for the reply
    pub async fn run_turn(&mut self, text: &str) -> Result<TurnOutcome, ChatError> {
        self.send(text)?;
        self.wait_turn()
            .await
            .ok_or_else(|| ChatError::GenerationFailure("turn vanished before completion".to_string()))
    }

    fn finish_turn(
        &mut self,
        chat_id: ChatId,
        result: Result<Result<String, ChatError>, JoinError>,
    ) -> TurnOutcome {
        let result = result.unwrap_or_else(|e| {
            Err(ChatError::GenerationFailure(format!("generator task failed: {}", e)))
        });

        let outcome = match result {
            Ok(response) => match self.append(chat_id, &response, Sender::Assistant) {
                Ok(message_id) => TurnOutcome::Replied(message_id),
                Err(e) => {
                    error!(chat_id = %chat_id, error = %e, "could not record assistant reply");
                    TurnOutcome::Failed(e)
                }
            },
            Err(e) => {
                error!(chat_id = %chat_id, error = %e, "error getting AI response");
                self.emit(ChatEvent::TurnFailed {
                    chat_id,
                    reason: e.to_string(),
                });
                TurnOutcome::Failed(e)
            }
        };

        // Pending is lowered on every path, after the reply or failure is recorded
        self.emit(ChatEvent::PendingChanged(false));
        info!(chat_id = %chat_id, ok = matches!(outcome, TurnOutcome::Replied(_)), "turn finished");
        outcome
    }

    fn append(&mut self, chat_id: ChatId, content: &str, sender: Sender) -> Result<MessageId, ChatError> {
        let first = self.store.chat(chat_id).is_some_and(|c| c.is_empty());
        let message_id = self.store.append_message(chat_id, content, sender)?;

        self.emit(ChatEvent::MessageAppended {
            chat_id,
            message_id,
            sender,
        });
        if first {
            if let Some(chat) = self.store.chat(chat_id) {
                self.emit(ChatEvent::TitleChanged {
                    chat_id,
                    title: chat.title.clone(),
                });
            }
        }
        Ok(message_id)
    }

    fn emit(&self, event: ChatEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::CannedGenerator;
    use crate::generator::canned::CANNED_RESPONSES;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::oneshot;

    /// Replies immediately with an echo of the prompt
    struct EchoGenerator;

    #[async_trait]
    impl ResponseGenerator for EchoGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, ChatError> {
            Ok(format!("echo: {}", prompt))
        }

        fn name(&self) -> String {
            "Echo".to_string()
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl ResponseGenerator for FailingGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, ChatError> {
            Err(ChatError::GenerationFailure("model unavailable".to_string()))
        }

        fn name(&self) -> String {
            "Failing".to_string()
        }
    }

    /// Replies with whatever the test pushes through the gate
    struct GatedGenerator {
        gate: Mutex<Option<oneshot::Receiver<String>>>,
    }

    #[async_trait]
    impl ResponseGenerator for GatedGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, ChatError> {
            let rx = self.gate.lock().unwrap().take();
            match rx {
                Some(rx) => rx
                    .await
                    .map_err(|_| ChatError::GenerationFailure("gate dropped".to_string())),
                None => Err(ChatError::GenerationFailure("gate already used".to_string())),
            }
        }

        fn name(&self) -> String {
            "Gated".to_string()
        }
    }

    fn drain(rx: &mut broadcast::Receiver<ChatEvent>) -> Vec<ChatEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_send_without_active_chat_creates_one() {
        let mut controller = TurnController::new(Arc::new(EchoGenerator));
        assert!(controller.store().active_chat_id().is_none());

        controller.send("hello").unwrap();

        let store = controller.store();
        assert_eq!(store.chats().len(), 1);
        let chat = store.active_chat().unwrap();
        assert_eq!(chat.id, store.chats()[0].id);
        assert_eq!(chat.messages.len(), 1);
        assert_eq!(chat.messages[0].content, "hello");
        assert_eq!(chat.messages[0].sender, Sender::User);
        assert_eq!(chat.title, "hello");
        assert!(controller.is_pending());
    }

    #[tokio::test]
    async fn test_turns_alternate_user_and_assistant() {
        let mut controller = TurnController::new(Arc::new(EchoGenerator));

        for text in ["first", "second", "third"] {
            let outcome = controller.run_turn(text).await.unwrap();
            assert!(matches!(outcome, TurnOutcome::Replied(_)));
            assert!(!controller.is_pending());
        }

        let messages = controller.store().active_messages();
        assert_eq!(messages.len(), 6);
        for (i, pair) in messages.chunks(2).enumerate() {
            assert_eq!(pair[0].sender, Sender::User);
            assert_eq!(pair[1].sender, Sender::Assistant);
            assert_eq!(pair[1].content, format!("echo: {}", pair[0].content));
            assert_eq!(pair[0].content, ["first", "second", "third"][i]);
        }
        assert_eq!(controller.store().chats().len(), 1);
        assert_eq!(controller.store().active_title(), "first");
    }

    #[tokio::test]
    async fn test_event_order_brackets_pending() {
        let mut controller = TurnController::new(Arc::new(EchoGenerator));
        let mut rx = controller.subscribe();

        controller.run_turn("How do I sort a list in Python quickly").await.unwrap();
        let events = drain(&mut rx);

        let chat_id = controller.store().active_chat_id().unwrap();
        assert_eq!(events.len(), 6, "{:?}", events);
        assert_eq!(events[0], ChatEvent::ChatCreated(chat_id));
        assert!(matches!(
            events[1],
            ChatEvent::MessageAppended { sender: Sender::User, .. }
        ));
        assert_eq!(
            events[2],
            ChatEvent::TitleChanged {
                chat_id,
                title: "How do I sort a list...".to_string()
            }
        );
        assert_eq!(events[3], ChatEvent::PendingChanged(true));
        assert!(matches!(
            events[4],
            ChatEvent::MessageAppended { sender: Sender::Assistant, .. }
        ));
        assert_eq!(events[5], ChatEvent::PendingChanged(false));
    }

    #[tokio::test]
    async fn test_failure_keeps_user_message_and_clears_pending() {
        let mut controller = TurnController::new(Arc::new(FailingGenerator));
        let mut rx = controller.subscribe();

        let outcome = controller.run_turn("will this work?").await.unwrap();
        assert_eq!(
            outcome,
            TurnOutcome::Failed(ChatError::GenerationFailure("model unavailable".to_string()))
        );
        assert!(!controller.is_pending());
        assert_eq!(controller.state(), TurnState::Idle);

        let messages = controller.store().active_messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].sender, Sender::User);

        let events = drain(&mut rx);
        let n = events.len();
        assert!(matches!(events[n - 2], ChatEvent::TurnFailed { .. }));
        assert_eq!(events[n - 1], ChatEvent::PendingChanged(false));

        // The controller is usable again afterwards
        assert!(controller.send("retry").is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_while_pending_is_busy() {
        let generator = CannedGenerator::with_delay(Duration::from_millis(1000)..Duration::from_millis(3000));
        let mut controller = TurnController::new(Arc::new(generator));

        controller.send("first question").unwrap();
        let before = controller.store().chats().to_vec();

        assert_eq!(controller.send("second question"), Err(ChatError::Busy));
        assert_eq!(controller.store().chats(), before.as_slice());
        assert_eq!(controller.state(), TurnState::AwaitingResponse);

        let outcome = controller.wait_turn().await.unwrap();
        assert!(matches!(outcome, TurnOutcome::Replied(_)));
        let messages = controller.store().active_messages();
        assert_eq!(messages.len(), 2);
        assert!(CANNED_RESPONSES.contains(&messages[1].content.as_str()));
    }

    #[tokio::test]
    async fn test_poll_turn_waits_for_generator() {
        let (tx, rx) = oneshot::channel();
        let generator = GatedGenerator {
            gate: Mutex::new(Some(rx)),
        };
        let mut controller = TurnController::new(Arc::new(generator));

        controller.send("hi").unwrap();
        assert_eq!(controller.poll_turn().await, None);
        assert!(controller.is_pending());
        // Pending implies the triggering user message is already recorded
        assert_eq!(controller.store().active_messages().len(), 1);

        tx.send("hello back".to_string()).unwrap();

        let mut outcome = None;
        for _ in 0..1000 {
            outcome = controller.poll_turn().await;
            if outcome.is_some() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(matches!(outcome, Some(TurnOutcome::Replied(_))));
        assert!(!controller.is_pending());
        assert_eq!(controller.store().active_messages()[1].content, "hello back");
    }

    #[tokio::test]
    async fn test_send_uses_selected_chat() {
        let mut controller = TurnController::new(Arc::new(EchoGenerator));
        let older = controller.create_chat();
        let newer = controller.create_chat();

        assert!(controller.select_chat(older));
        controller.run_turn("into the older chat").await.unwrap();

        assert_eq!(controller.store().chat(older).unwrap().messages.len(), 2);
        assert!(controller.store().chat(newer).unwrap().is_empty());
        assert_eq!(controller.store().chats()[0].id, newer);
    }

    #[tokio::test]
    async fn test_rejects_blank_and_oversized_messages() {
        let mut controller = TurnController::new(Arc::new(EchoGenerator));

        assert_eq!(controller.send("   \n"), Err(ChatError::EmptyMessage));
        let long = "x".repeat(MAX_MESSAGE_CHARS + 1);
        assert_eq!(
            controller.send(&long),
            Err(ChatError::MessageTooLong {
                len: MAX_MESSAGE_CHARS + 1,
                max: MAX_MESSAGE_CHARS
            })
        );
        assert!(controller.store().chats().is_empty());
        assert!(!controller.is_pending());

        // Exactly at the limit is fine, and surrounding whitespace is trimmed
        controller.send(&format!("  {}  ", "y".repeat(MAX_MESSAGE_CHARS))).unwrap();
        assert_eq!(
            controller.store().active_messages()[0].content.chars().count(),
            MAX_MESSAGE_CHARS
        );
    }

    #[tokio::test]
    async fn test_select_unknown_chat_emits_nothing() {
        let mut controller = TurnController::new(Arc::new(EchoGenerator));
        let mut rx = controller.subscribe();

        assert!(!controller.select_chat(ChatId::new()));
        assert!(drain(&mut rx).is_empty());
    }
}
