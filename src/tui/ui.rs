//! Rendering for the chat TUI

use crate::tui::app::{App, AppState};
use gemchat_core::chat::Role;
use ratatui::{
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub fn render(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // title + caption
            Constraint::Min(1),    // transcript
            Constraint::Length(1), // status / banner
            Constraint::Length(3), // input
        ])
        .split(frame.area());

    render_title(frame, app, chunks[0]);
    render_transcript(frame, app, chunks[1]);
    render_status(frame, app, chunks[2]);
    render_input(frame, app, chunks[3]);
}

fn render_title(frame: &mut Frame, app: &App, area: Rect) {
    let time = chrono::Local::now().format("%I:%M %p");
    let title = Paragraph::new(vec![
        Line::from(vec![
            Span::styled(
                " 🤖 gemchat",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(" — {}", app.model),
                Style::default().fg(Color::Gray),
            ),
        ]),
        Line::from(Span::styled(
            format!(" Powered by Google Gemini | {}", time),
            Style::default().fg(Color::DarkGray),
        )),
    ]);
    frame.render_widget(title, area);
}

fn render_transcript(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Conversation ")
        .border_style(Style::default().fg(Color::DarkGray));
    let inner_width = area.width.saturating_sub(2) as usize;
    let inner_height = area.height.saturating_sub(2) as usize;

    let mut lines: Vec<Line> = Vec::new();

    if app.session.transcript().is_empty() && app.pending_prompt.is_none() {
        lines.push(Line::from(Span::styled(
            "No messages yet. Ask me anything…",
            Style::default().fg(Color::DarkGray),
        )));
    }

    for turn in app.session.transcript() {
        let (avatar, name, color) = match turn.role {
            Role::User => ("🧑‍💻", "you", Color::Cyan),
            Role::Model => ("🤖", "gemini", Color::Magenta),
        };
        lines.push(Line::from(vec![
            Span::styled(
                format!("{} {}", avatar, name),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {}", turn.timestamp.with_timezone(&chrono::Local).format("%H:%M")),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
        for wrapped in wrap_text(&turn.text, inner_width) {
            lines.push(Line::from(wrapped));
        }
        lines.push(Line::from(""));
    }

    // The in-flight prompt shows right away; it joins the transcript once
    // the outcome confirms a conversation exists
    if let Some(pending) = &app.pending_prompt {
        lines.push(Line::from(vec![
            Span::styled(
                "🧑‍💻 you",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {}", chrono::Local::now().format("%H:%M")),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
        for wrapped in wrap_text(pending, inner_width) {
            lines.push(Line::from(wrapped));
        }
        lines.push(Line::from(""));
    }

    // Clamp the scroll offset; stick to the bottom while auto-scrolling
    let max_offset = lines.len().saturating_sub(inner_height);
    if app.auto_scroll {
        app.scroll = max_offset;
    } else {
        app.scroll = app.scroll.min(max_offset);
        if app.scroll == max_offset {
            app.auto_scroll = true;
        }
    }

    let transcript = Paragraph::new(lines)
        .block(block)
        .scroll((app.scroll as u16, 0));
    frame.render_widget(transcript, area);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let line = match &app.state {
        AppState::Thinking => {
            let frame_idx = (app.tick / 4) as usize % SPINNER_FRAMES.len();
            Line::from(Span::styled(
                format!(" {} Thinking…", SPINNER_FRAMES[frame_idx]),
                Style::default().fg(Color::Yellow),
            ))
        }
        AppState::Error(message) => Line::from(Span::styled(
            format!(" ✖ {}", message),
            Style::default().fg(Color::Red),
        )),
        AppState::Idle if app.session.credential().is_none() => Line::from(Span::styled(
            " ⚠ Chat disabled — no API key configured (set GOOGLE_API_KEY)",
            Style::default().fg(Color::Yellow),
        )),
        AppState::Idle => Line::from(Span::styled(
            " Enter send · Ctrl+L clear history · ↑/↓ scroll · Esc quit",
            Style::default().fg(Color::DarkGray),
        )),
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn render_input(frame: &mut Frame, app: &App, area: Rect) {
    let style = if app.busy() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Ask me anything… ")
        .border_style(style);

    // Keep the cursor in view when the line outgrows the box
    let inner_width = area.width.saturating_sub(2) as usize;
    let skip = app.cursor.saturating_sub(inner_width.saturating_sub(1));
    let visible: String = app.input.chars().skip(skip).collect();

    let input = Paragraph::new(visible).style(style).block(block);
    frame.render_widget(input, area);

    if !app.busy() {
        frame.set_cursor_position(Position::new(
            area.x + 1 + (app.cursor - skip) as u16,
            area.y + 1,
        ));
    }
}

/// Greedy word wrap on a character budget; words longer than the budget are
/// hard-broken
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    for raw in text.lines() {
        if raw.trim().is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current = String::new();
        let mut current_len = 0;
        for word in raw.split_whitespace() {
            let word_len = word.chars().count();
            let sep = usize::from(current_len > 0);

            if current_len + sep + word_len <= width {
                if sep == 1 {
                    current.push(' ');
                }
                current.push_str(word);
                current_len += sep + word_len;
            } else if word_len <= width {
                lines.push(std::mem::take(&mut current));
                current = word.to_string();
                current_len = word_len;
            } else {
                // Hard-break an overlong word
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let mut chunk = String::new();
                for c in word.chars() {
                    chunk.push(c);
                    if chunk.chars().count() == width {
                        lines.push(std::mem::take(&mut chunk));
                    }
                }
                current = chunk;
                current_len = current.chars().count();
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_short_line_untouched() {
        assert_eq!(wrap_text("hello world", 20), vec!["hello world"]);
    }

    #[test]
    fn test_wrap_breaks_on_words() {
        assert_eq!(
            wrap_text("one two three four", 9),
            vec!["one two", "three", "four"]
        );
    }

    #[test]
    fn test_wrap_hard_breaks_long_words() {
        assert_eq!(wrap_text("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_wrap_preserves_blank_lines() {
        assert_eq!(wrap_text("a\n\nb", 10), vec!["a", "", "b"]);
    }

    #[test]
    fn test_wrap_zero_width_is_identity() {
        assert_eq!(wrap_text("abc", 0), vec!["abc"]);
    }
}
