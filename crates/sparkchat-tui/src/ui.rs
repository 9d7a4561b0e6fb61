use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};
use sparkchat_core::{Sender, MAX_MESSAGE_CHARS};
use crate::app::{App, FocusPane, InputMode, QUICK_ACTIONS, QUICK_STARTERS};

const SIDEBAR_WIDTH: u16 = 32;

/// Render a line with **bold** spans. An unmatched `**` is kept literally.
fn parse_markdown_line(text: &str) -> Line<'static> {
    let parts: Vec<&str> = text.split("**").collect();
    // An even number of parts means the last "**" has no partner
    let unmatched = parts.len() % 2 == 0;

    let mut spans: Vec<Span<'static>> = Vec::new();
    for (i, part) in parts.iter().enumerate() {
        let is_last = i == parts.len() - 1;
        if i % 2 == 1 && !(unmatched && is_last) && !part.is_empty() {
            spans.push(Span::styled(
                part.to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ));
        } else if i % 2 == 1 {
            spans.push(Span::raw(format!("**{}", part)));
        } else if !part.is_empty() {
            spans.push(Span::raw(part.to_string()));
        }
    }

    Line::from(spans)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    let main_area = if app.sidebar_open {
        let [sidebar_area, main_area] = Layout::horizontal([
            Constraint::Length(SIDEBAR_WIDTH.min(body_area.width / 2)),
            Constraint::Min(0),
        ])
        .areas(body_area);
        render_sidebar(app, frame, sidebar_area);
        main_area
    } else {
        app.sidebar_area = None;
        body_area
    };

    render_main(app, frame, main_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" ☰ ", Style::default().fg(Color::White).bold()),
        Span::styled(
            app.controller.store().active_title().to_string(),
            Style::default().fg(Color::Cyan).bold(),
        ),
        Span::raw("  "),
        Span::styled(
            format!("{} · v{}", app.controller.generator_name(), env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_sidebar(app: &mut App, frame: &mut Frame, area: Rect) {
    app.sidebar_area = Some(area);

    let focused = app.focus == FocusPane::Sidebar;
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Chats (n: new) ");

    let store = app.controller.store();
    let active = store.active_chat_id();

    let items: Vec<ListItem> = if store.chats().is_empty() {
        vec![ListItem::new(Line::from(Span::styled(
            " No conversations yet",
            Style::default().fg(Color::DarkGray),
        )))]
    } else {
        store
            .chats()
            .iter()
            .map(|chat| {
                let title_style = if Some(chat.id) == active {
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                ListItem::new(vec![
                    Line::from(Span::styled(chat.title.clone(), title_style)),
                    Line::from(Span::styled(
                        format!("{} · {} messages", chat.timestamp, chat.messages.len()),
                        Style::default().fg(Color::DarkGray),
                    )),
                ])
            })
            .collect()
    };

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.sidebar_state);
}

fn render_main(app: &mut App, frame: &mut Frame, area: Rect) {
    let [messages_area, input_area, actions_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    // Store areas for mouse hit-testing and scroll calculations (inner size minus borders)
    app.messages_area = Some(messages_area);
    app.chat_height = messages_area.height.saturating_sub(2);
    app.chat_width = messages_area.width.saturating_sub(2);

    if app.controller.store().active_messages().is_empty() && !app.is_pending() {
        render_welcome(frame, messages_area);
    } else {
        render_messages(app, frame, messages_area);
    }

    render_input(app, frame, input_area);
    render_quick_actions(frame, actions_area);
}

fn render_welcome(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let mut lines = vec![
        Line::default(),
        Line::from(Span::styled(
            "Welcome to Sparkchat",
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        ))
        .centered(),
        Line::from(Span::styled(
            "Your assistant for questions, coding help, creative writing, analysis, and much more.",
            Style::default().fg(Color::Gray),
        ))
        .centered(),
        Line::default(),
    ];

    for (i, starter) in QUICK_STARTERS.iter().enumerate() {
        lines.push(Line::from(vec![
            Span::styled(
                format!(" {} ", i + 1),
                Style::default().bg(Color::DarkGray).fg(Color::White),
            ),
            Span::styled(
                format!(" {}", starter.title),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {}", starter.description),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
        lines.push(Line::from(Span::styled(
            format!("     \"{}\"", starter.prompt),
            Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
        )));
    }

    lines.push(Line::default());
    lines.push(
        Line::from(Span::styled(
            "Type a message, or press Esc then 1-4 to use a quick starter",
            Style::default().fg(Color::DarkGray),
        ))
        .centered(),
    );

    let welcome = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(welcome, area);
}

fn render_messages(app: &App, frame: &mut Frame, area: Rect) {
    let border_color = if app.focus == FocusPane::Messages {
        Color::Cyan
    } else {
        Color::DarkGray
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    let mut lines: Vec<Line> = Vec::new();

    for msg in app.controller.store().active_messages() {
        let label_style = match msg.sender {
            Sender::User => Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            Sender::Assistant => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{}:", msg.sender.label()), label_style),
            Span::styled(format!(" {}", msg.timestamp), Style::default().fg(Color::DarkGray)),
        ]));

        match msg.sender {
            Sender::User => {
                for line in msg.content.lines() {
                    lines.push(Line::from(line.to_string()));
                }
            }
            Sender::Assistant => {
                for line in msg.content.lines() {
                    lines.push(parse_markdown_line(line));
                }
            }
        }
        lines.push(Line::default());
    }

    if app.is_pending() {
        lines.push(Line::from(Span::styled(
            "AI:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Typing{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    let messages = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.scroll, 0));

    frame.render_widget(messages, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let pending = app.is_pending();
    let editing = app.input_mode == InputMode::Editing && !app.sidebar_open;

    let border_color = if pending {
        Color::DarkGray
    } else if editing {
        Color::Yellow
    } else {
        Color::Gray
    };

    let title = if pending {
        " Waiting for response... ".to_string()
    } else {
        " Type your message here... ".to_string()
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title)
        .title_bottom(
            Line::from(format!(" {}/{} ", app.input_len(), MAX_MESSAGE_CHARS)).right_aligned(),
        );

    // Calculate visible portion of input with horizontal scrolling
    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.input_cursor;

    // Calculate scroll offset to keep cursor visible
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let text_style = if pending {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Cyan)
    };

    let input = Paragraph::new(visible_text)
        .style(text_style)
        .block(input_block);

    frame.render_widget(input, area);

    // Show cursor when editing
    if editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_quick_actions(frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().fg(Color::Gray);

    let mut spans = vec![Span::raw(" ")];
    for (key, label, _) in QUICK_ACTIONS {
        spans.push(Span::styled(format!(" {} ", key), key_style));
        spans.push(Span::styled(format!(" {}  ", label), label_style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    if let Some(status) = &app.status {
        let line = Line::from(Span::styled(
            format!(" {} ", status),
            Style::default().bg(Color::Red).fg(Color::White),
        ));
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    let (mode_text, mode_style) = if app.sidebar_open {
        (" CHATS ", Style::default().bg(Color::Magenta).fg(Color::White))
    } else {
        match app.input_mode {
            InputMode::Normal => (" NORMAL ", Style::default().bg(Color::Blue).fg(Color::White)),
            InputMode::Editing => (" INSERT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
        }
    };

    let hints: &[(&str, &str)] = if app.sidebar_open {
        &[("j/k", "nav"), ("Enter", "open"), ("n", "new"), ("Esc", "close")]
    } else if app.input_mode == InputMode::Editing {
        &[("Enter", "send"), ("Esc", "normal"), ("^B", "chats"), ("^N", "new"), ("^C", "quit")]
    } else {
        &[("i", "type"), ("j/k", "scroll"), ("s", "chats"), ("n", "new"), ("e/c/u", "actions"), ("q", "quit")]
    };

    let mut spans = vec![Span::styled(mode_text, mode_style)];
    for (key, label) in hints {
        spans.push(Span::styled(format!(" {} ", key), key_style));
        spans.push(Span::styled(format!(" {} ", label), label_style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};
    use sparkchat_core::{CannedGenerator, TurnController};
    use std::sync::Arc;
    use std::time::Duration;

    fn test_app() -> App {
        let generator = CannedGenerator::with_delay(Duration::from_millis(5)..Duration::from_millis(10));
        App::new(TurnController::new(Arc::new(generator)))
    }

    fn screen(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        let mut out = String::new();
        for (i, cell) in buffer.content().iter().enumerate() {
            out.push_str(cell.symbol());
            if (i + 1) % width == 0 {
                out.push('\n');
            }
        }
        out
    }

    #[test]
    fn test_parse_markdown_line() {
        let line = parse_markdown_line("plain **bold** tail");
        assert_eq!(line.spans.len(), 3);
        assert_eq!(line.spans[1].content, "bold");
        assert!(line.spans[1].style.add_modifier.contains(Modifier::BOLD));

        let unmatched = parse_markdown_line("a **b");
        let text: String = unmatched.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "a **b");
    }

    #[test]
    fn test_welcome_screen_when_empty() {
        let mut app = test_app();
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        let text = screen(&terminal);
        assert!(text.contains("Welcome to Sparkchat"));
        assert!(text.contains("Explain a concept"));
        assert!(text.contains("New Chat"));
        assert!(text.contains("0/2000"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_messages_and_typing_indicator() {
        let mut app = test_app();
        app.send_prompt("Tell me something");
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        let text = screen(&terminal);
        assert!(text.contains("You:"));
        assert!(text.contains("Tell me something"));
        assert!(text.contains("Typing."));
        assert!(text.contains("Waiting for response"));

        app.controller.wait_turn().await;
        terminal.draw(|frame| render(&mut app, frame)).unwrap();
        let text = screen(&terminal);
        assert!(text.contains("AI:"));
        assert!(!text.contains("Typing"));
    }

    #[test]
    fn test_sidebar_lists_chats() {
        let mut app = test_app();
        app.new_chat();
        app.open_sidebar();
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        let text = screen(&terminal);
        assert!(text.contains("Chats"));
        assert!(text.contains("0 messages"));
        assert!(app.sidebar_area.is_some());
    }
}
