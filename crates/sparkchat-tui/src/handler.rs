use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use crate::app::{App, FocusPane, InputMode, QUICK_STARTERS};
use crate::tui::AppEvent;

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
    }

    // Collect a finished reply on any event so it shows up promptly
    app.poll_turn().await;
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }
    if key.code == KeyCode::Char('b') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.toggle_sidebar();
        return;
    }
    if key.code == KeyCode::Char('n') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.new_chat();
        return;
    }

    if app.sidebar_open {
        handle_sidebar(app, key);
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_sidebar(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.sidebar_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.sidebar_nav_up(),
        KeyCode::Enter | KeyCode::Char('l') => app.select_sidebar_chat(),
        KeyCode::Char('n') => app.new_chat(),
        KeyCode::Esc | KeyCode::Char('h') | KeyCode::Tab => app.close_sidebar(),
        KeyCode::Char('q') => app.should_quit = true,
        _ => {}
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(),
        KeyCode::Char('G') | KeyCode::End => app.scroll_to_bottom(),
        KeyCode::Char('g') | KeyCode::Home => app.scroll = 0,

        KeyCode::Char('i') | KeyCode::Enter => {
            app.focus = FocusPane::Input;
            app.input_mode = InputMode::Editing;
        }
        KeyCode::Tab | KeyCode::Char('s') => app.open_sidebar(),
        KeyCode::Char('n') => app.new_chat(),

        // Quick starters are only offered on the welcome screen
        KeyCode::Char(c @ '1'..='4') => {
            if app.controller.store().active_messages().is_empty() {
                let idx = c as usize - '1' as usize;
                if idx < QUICK_STARTERS.len() {
                    app.send_quick_starter(idx);
                }
            }
        }

        KeyCode::Char(c) => app.apply_quick_action(c),

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            app.focus = FocusPane::Messages;
        }
        KeyCode::Enter => app.submit_input(),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Delete => app.delete(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        KeyCode::Up => app.scroll_up(),
        KeyCode::Down => app.scroll_down(),
        KeyCode::Char(c) => app.insert_char(c),
        _ => {}
    }
}

fn contains(area: Option<Rect>, column: u16, row: u16) -> bool {
    area.is_some_and(|a| {
        column >= a.x && column < a.x + a.width && row >= a.y && row < a.y + a.height
    })
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollDown => {
            if contains(app.messages_area, mouse.column, mouse.row) {
                app.scroll_down();
            } else if app.sidebar_open {
                app.sidebar_nav_down();
            }
        }
        MouseEventKind::ScrollUp => {
            if contains(app.messages_area, mouse.column, mouse.row) {
                app.scroll_up();
            } else if app.sidebar_open {
                app.sidebar_nav_up();
            }
        }
        MouseEventKind::Down(MouseButton::Left) => {
            if !app.sidebar_open || !contains(app.sidebar_area, mouse.column, mouse.row) {
                return;
            }
            if let Some(area) = app.sidebar_area {
                // Each chat takes two rows (title, timestamp) below the top border
                let row = mouse.row.saturating_sub(area.y + 1) as usize;
                let idx = row / 2 + app.sidebar_state.offset();
                if idx < app.controller.store().chats().len() {
                    app.sidebar_state.select(Some(idx));
                    app.select_sidebar_chat();
                }
            }
        }
        _ => {}
    }
}
