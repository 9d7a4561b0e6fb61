use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use sparkchat_core::{ChatError, TurnController, TurnOutcome, MAX_MESSAGE_CHARS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Sidebar,
    Messages,
    Input,
}

/// A suggested first prompt shown on the welcome screen
pub struct QuickStarter {
    pub title: &'static str,
    pub description: &'static str,
    pub prompt: &'static str,
}

pub const QUICK_STARTERS: [QuickStarter; 4] = [
    QuickStarter {
        title: "Explain a concept",
        description: "Get clear explanations on any topic",
        prompt: "Explain quantum computing in simple terms",
    },
    QuickStarter {
        title: "Write code",
        description: "Generate code snippets and solutions",
        prompt: "Write a React component for a todo list",
    },
    QuickStarter {
        title: "Creative writing",
        description: "Help with stories, essays, and content",
        prompt: "Write a short story about time travel",
    },
    QuickStarter {
        title: "Data analysis",
        description: "Analyze trends and interpret data",
        prompt: "How to analyze customer data for insights?",
    },
];

/// Input prefixes offered below the input box: (key, label, prefix)
pub const QUICK_ACTIONS: [(char, &str, &str); 3] = [
    ('e', "Explain", "Explain this concept in simple terms: "),
    ('c', "Code", "Help me write code for: "),
    ('u', "Summarize", "Summarize this topic: "),
];

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub focus: FocusPane,
    pub controller: TurnController,

    // Sidebar state
    pub sidebar_open: bool,
    pub sidebar_state: ListState,

    // Input state
    pub input: String,
    pub input_cursor: usize, // cursor position in input, in chars

    // Message list state
    pub scroll: u16,
    pub chat_height: u16, // Height of message area for scroll calculations
    pub chat_width: u16,  // Width of message area for wrap calculations

    // Last error, shown in the footer until the next successful send
    pub status: Option<String>,

    // Animation state
    pub animation_frame: u8, // 0-2 for typing ellipsis

    // Panel areas for mouse hit-testing (updated during render)
    pub sidebar_area: Option<Rect>,
    pub messages_area: Option<Rect>,
}

impl App {
    pub fn new(controller: TurnController) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            focus: FocusPane::Input,
            controller,

            sidebar_open: false,
            sidebar_state: ListState::default(),

            input: String::new(),
            input_cursor: 0,

            scroll: 0,
            chat_height: 0,
            chat_width: 0,

            status: None,

            animation_frame: 0,

            sidebar_area: None,
            messages_area: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.controller.is_pending()
    }

    pub fn input_len(&self) -> usize {
        self.input.chars().count()
    }

    /// Send the input box contents. The input is kept while a reply is pending.
    pub fn submit_input(&mut self) {
        if self.input.trim().is_empty() || self.is_pending() {
            return;
        }
        let text = std::mem::take(&mut self.input);
        self.input_cursor = 0;
        if !self.send_prompt(&text) {
            // Give the text back so nothing typed is lost
            self.input_cursor = text.chars().count();
            self.input = text;
        }
    }

    /// Start a turn with `text`; returns false if the controller refused it
    pub fn send_prompt(&mut self, text: &str) -> bool {
        match self.controller.send(text) {
            Ok(_) => {
                self.status = None;
                self.scroll_to_bottom();
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "send rejected");
                self.status = Some(e.to_string());
                false
            }
        }
    }

    pub fn send_quick_starter(&mut self, idx: usize) {
        if let Some(starter) = QUICK_STARTERS.get(idx) {
            self.send_prompt(starter.prompt);
        }
    }

    /// Replace the input with a quick-action prefix and start editing
    pub fn apply_quick_action(&mut self, key: char) {
        if let Some((_, _, prefix)) = QUICK_ACTIONS.iter().find(|(k, _, _)| *k == key) {
            self.input = prefix.to_string();
            self.input_cursor = self.input_len();
            self.focus = FocusPane::Input;
            self.input_mode = InputMode::Editing;
        }
    }

    /// Record a finished turn
    pub fn on_turn_finished(&mut self, outcome: TurnOutcome) {
        if let TurnOutcome::Failed(e) = outcome {
            self.status = Some(match e {
                ChatError::GenerationFailure(reason) => format!("Error getting AI response: {}", reason),
                other => other.to_string(),
            });
        }
        self.scroll_to_bottom();
    }

    pub async fn poll_turn(&mut self) {
        if let Some(outcome) = self.controller.poll_turn().await {
            self.on_turn_finished(outcome);
        }
    }

    pub fn new_chat(&mut self) {
        self.controller.create_chat();
        self.close_sidebar();
        self.scroll = 0;
    }

    // Sidebar
    pub fn open_sidebar(&mut self) {
        self.sidebar_open = true;
        self.focus = FocusPane::Sidebar;
        self.input_mode = InputMode::Normal;
        let store = self.controller.store();
        let selected = store
            .active_index()
            .or_else(|| (!store.chats().is_empty()).then_some(0));
        self.sidebar_state.select(selected);
    }

    pub fn close_sidebar(&mut self) {
        self.sidebar_open = false;
        self.focus = FocusPane::Input;
        self.input_mode = InputMode::Editing;
    }

    pub fn toggle_sidebar(&mut self) {
        if self.sidebar_open {
            self.close_sidebar();
        } else {
            self.open_sidebar();
        }
    }

    pub fn sidebar_nav_down(&mut self) {
        let len = self.controller.store().chats().len();
        if len > 0 {
            let i = self.sidebar_state.selected().unwrap_or(0);
            self.sidebar_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn sidebar_nav_up(&mut self) {
        let i = self.sidebar_state.selected().unwrap_or(0);
        self.sidebar_state.select(Some(i.saturating_sub(1)));
    }

    /// Activate the highlighted chat and close the sidebar
    pub fn select_sidebar_chat(&mut self) {
        let chat_id = self
            .sidebar_state
            .selected()
            .and_then(|i| self.controller.store().chats().get(i))
            .map(|chat| chat.id);

        if let Some(chat_id) = chat_id {
            self.controller.select_chat(chat_id);
            self.close_sidebar();
            self.scroll_to_bottom();
        }
    }

    // Input editing
    pub fn insert_char(&mut self, c: char) {
        if self.input_len() >= MAX_MESSAGE_CHARS {
            return;
        }
        let byte_pos = char_to_byte_index(&self.input, self.input_cursor);
        self.input.insert(byte_pos, c);
        self.input_cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.input_cursor > 0 {
            self.input_cursor -= 1;
            let byte_pos = char_to_byte_index(&self.input, self.input_cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.input_cursor < self.input_len() {
            let byte_pos = char_to_byte_index(&self.input, self.input_cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.input_cursor = self.input_cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        self.input_cursor = (self.input_cursor + 1).min(self.input_len());
    }

    pub fn cursor_home(&mut self) {
        self.input_cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.input_cursor = self.input_len();
    }

    // Message list scrolling
    pub fn scroll_down(&mut self) {
        self.scroll = self.scroll.saturating_add(1).min(self.max_scroll());
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn tick_animation(&mut self) {
        if self.is_pending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Total wrapped lines of the active conversation, including the typing indicator
    fn total_lines(&self) -> u16 {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for msg in self.controller.store().active_messages() {
            total_lines = total_lines.saturating_add(1); // Sender line ("You" or "AI")
            for line in msg.content.lines() {
                // Use character count, not byte length, for proper UTF-8 handling
                let char_count = line.chars().count();
                let wrapped = if char_count == 0 {
                    1
                } else {
                    char_count.div_ceil(wrap_width)
                };
                total_lines = total_lines.saturating_add(wrapped as u16);
            }
            total_lines = total_lines.saturating_add(1); // Blank line after message
        }

        if self.is_pending() {
            total_lines = total_lines.saturating_add(2); // "AI" + "Typing..."
        }

        total_lines
    }

    fn max_scroll(&self) -> u16 {
        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };
        self.total_lines().saturating_sub(visible_height)
    }

    /// Scroll so the newest message (or typing indicator) is visible
    pub fn scroll_to_bottom(&mut self) {
        self.scroll = self.max_scroll();
    }
}
