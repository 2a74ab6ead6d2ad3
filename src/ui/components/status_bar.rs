//! Bottom status bar: key hints, a loading spinner and the latest message.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Spinner animation frames.
const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Spinner frame for a tick count.
pub fn spinner_frame(tick: usize) -> &'static str {
    SPINNER_FRAMES[tick % SPINNER_FRAMES.len()]
}

/// A message shown until the next success or mode change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusMessage {
    Info(String),
    Error(String),
}

impl StatusMessage {
    pub fn text(&self) -> &str {
        match self {
            StatusMessage::Info(text) | StatusMessage::Error(text) => text,
        }
    }
}

/// Render the two-line status bar.
///
/// The first line shows the message (or the spinner while loading), the
/// second the key hints for the active mode.
pub fn render_status_bar(
    frame: &mut Frame,
    area: Rect,
    hints: &str,
    message: Option<&StatusMessage>,
    spinner: Option<&str>,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(area);

    let mut spans = Vec::new();
    if let Some(frame_char) = spinner {
        spans.push(Span::styled(
            format!("{} ", frame_char),
            Style::default().fg(Color::Cyan),
        ));
    }
    match message {
        Some(StatusMessage::Error(text)) => {
            spans.push(Span::styled(text.clone(), Style::default().fg(Color::Red)))
        }
        Some(StatusMessage::Info(text)) => {
            spans.push(Span::styled(text.clone(), Style::default().fg(Color::Green)))
        }
        None if spinner.is_some() => {
            spans.push(Span::styled("Loading...", Style::default().fg(Color::Gray)))
        }
        None => {}
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), chunks[0]);
    frame.render_widget(Paragraph::new(Line::from(hint_spans(hints))), chunks[1]);
}

/// Parse hint text into styled spans.
///
/// Highlights the key portion (in brackets) differently from the description.
pub fn hint_spans(hints: &str) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    let mut current = String::new();
    let mut in_bracket = false;

    for c in hints.chars() {
        match c {
            '[' => {
                if !current.is_empty() {
                    spans.push(Span::styled(
                        std::mem::take(&mut current),
                        Style::default().fg(Color::DarkGray),
                    ));
                }
                in_bracket = true;
                current.push(c);
            }
            ']' if in_bracket => {
                current.push(c);
                spans.push(Span::styled(
                    std::mem::take(&mut current),
                    Style::default().fg(Color::Cyan),
                ));
                in_bracket = false;
            }
            _ => current.push(c),
        }
    }

    if !current.is_empty() {
        spans.push(Span::styled(current, Style::default().fg(Color::DarkGray)));
    }

    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hint_spans_simple() {
        assert_eq!(hint_spans("[j/k] navigate").len(), 2);
    }

    #[test]
    fn test_hint_spans_multiple_keys() {
        // [j/k], " navigate  ", [Enter], " open  ", [q], " quit"
        assert_eq!(hint_spans("[j/k] navigate  [Enter] open  [q] quit").len(), 6);
    }

    #[test]
    fn test_hint_spans_edge_cases() {
        assert!(hint_spans("").is_empty());
        assert_eq!(hint_spans("just text").len(), 1);
    }

    #[test]
    fn test_spinner_wraps() {
        assert_eq!(spinner_frame(0), spinner_frame(SPINNER_FRAMES.len()));
        assert_ne!(spinner_frame(0), spinner_frame(1));
    }

    #[test]
    fn test_status_message() {
        let err = StatusMessage::Error("Failed to load issue".into());
        assert_eq!(err.text(), "Failed to load issue");
        assert_eq!(StatusMessage::Info("Saved".into()).text(), "Saved");
    }
}
