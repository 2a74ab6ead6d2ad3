//! Text input component.
//!
//! This module provides a text input widget with support for:
//! - Character input and deletion
//! - Cursor movement (left/right, home/end, line up/down)
//! - Multi-line editing for descriptions, comments and reasons
//!
//! The cursor is a character index, so non-ASCII names and text edit
//! correctly.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Position, Rect},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// A text input widget.
#[derive(Debug, Clone, Default)]
pub struct TextInput {
    /// The current input value.
    value: String,
    /// Cursor position, in characters.
    cursor: usize,
    /// Whether Enter inserts a newline.
    multiline: bool,
    /// Placeholder text shown when empty.
    placeholder: String,
}

impl TextInput {
    /// Create a new empty single-line input.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new empty multi-line input.
    pub fn multiline() -> Self {
        Self {
            multiline: true,
            ..Self::default()
        }
    }

    /// Create a new input with an initial value.
    pub fn with_value(value: impl Into<String>) -> Self {
        let mut input = Self::new();
        input.set_value(value);
        input
    }

    pub fn is_multiline(&self) -> bool {
        self.multiline
    }

    /// Set the placeholder text.
    pub fn set_placeholder(&mut self, placeholder: impl Into<String>) {
        self.placeholder = placeholder.into();
    }

    /// Get the current value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Set the value and move cursor to end.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.cursor = self.char_count();
    }

    /// Clear the input.
    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    /// Check if the input is empty.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Get the cursor position.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn char_count(&self) -> usize {
        self.value.chars().count()
    }

    /// Byte offset of a character index.
    fn byte_index(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    /// Line and column of the cursor.
    fn cursor_line_col(&self) -> (usize, usize) {
        let before = &self.value[..self.byte_index(self.cursor)];
        let line = before.matches('\n').count();
        let col = before
            .rsplit('\n')
            .next()
            .map(|l| l.chars().count())
            .unwrap_or(0);
        (line, col)
    }

    /// Handle keyboard input.
    ///
    /// Returns true if the input was modified.
    pub fn handle_input(&mut self, key: KeyEvent) -> bool {
        match (key.code, key.modifiers) {
            (KeyCode::Char(c), KeyModifiers::NONE | KeyModifiers::SHIFT) => {
                self.insert_char(c);
                true
            }
            (KeyCode::Enter, KeyModifiers::NONE) if self.multiline => {
                self.insert_char('\n');
                true
            }
            // Backspace - delete character before cursor
            (KeyCode::Backspace, _) => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let at = self.byte_index(self.cursor);
                    self.value.remove(at);
                    true
                } else {
                    false
                }
            }
            // Delete - delete character at cursor
            (KeyCode::Delete, _) => {
                if self.cursor < self.char_count() {
                    let at = self.byte_index(self.cursor);
                    self.value.remove(at);
                    true
                } else {
                    false
                }
            }
            (KeyCode::Left, KeyModifiers::NONE) => {
                self.cursor = self.cursor.saturating_sub(1);
                false
            }
            (KeyCode::Right, KeyModifiers::NONE) => {
                if self.cursor < self.char_count() {
                    self.cursor += 1;
                }
                false
            }
            (KeyCode::Up, _) if self.multiline => {
                self.move_line(-1);
                false
            }
            (KeyCode::Down, _) if self.multiline => {
                self.move_line(1);
                false
            }
            (KeyCode::Home, _) | (KeyCode::Char('a'), KeyModifiers::CONTROL) => {
                self.cursor = 0;
                false
            }
            (KeyCode::End, _) | (KeyCode::Char('e'), KeyModifiers::CONTROL) => {
                self.cursor = self.char_count();
                false
            }
            // Ctrl+U - clear everything
            (KeyCode::Char('u'), KeyModifiers::CONTROL) => {
                if !self.value.is_empty() {
                    self.clear();
                    true
                } else {
                    false
                }
            }
            // Ctrl+W - delete word before cursor
            (KeyCode::Char('w'), KeyModifiers::CONTROL) => {
                if self.cursor > 0 {
                    let end = self.byte_index(self.cursor);
                    let before = &self.value[..end];
                    let trimmed = before.trim_end();
                    let word_start = trimmed
                        .rfind(|c: char| !c.is_alphanumeric())
                        .map(|i| i + trimmed[i..].chars().next().map_or(1, char::len_utf8))
                        .unwrap_or(0);
                    self.value.replace_range(word_start..end, "");
                    self.cursor = self.value[..word_start].chars().count();
                    true
                } else {
                    false
                }
            }
            _ => false,
        }
    }

    /// Insert a character at the cursor position.
    fn insert_char(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.value.insert(at, c);
        self.cursor += 1;
    }

    fn move_line(&mut self, delta: isize) {
        let (line, col) = self.cursor_line_col();
        let lines: Vec<&str> = self.value.split('\n').collect();
        let target = line as isize + delta;
        if target < 0 || target as usize >= lines.len() {
            return;
        }
        let target = target as usize;
        let offset: usize = lines[..target].iter().map(|l| l.chars().count() + 1).sum();
        self.cursor = offset + col.min(lines[target].chars().count());
    }

    /// Render the input field with a label.
    pub fn render_with_label(&self, frame: &mut Frame, area: Rect, label: &str, focused: bool) {
        let placeholder = self.value.is_empty() && !self.placeholder.is_empty();
        let display = if placeholder {
            self.placeholder.as_str()
        } else {
            self.value.as_str()
        };

        let style = if placeholder {
            Style::default().fg(Color::DarkGray)
        } else if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };

        let border_style = if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let title_style = if focused {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };

        let block = Block::default()
            .title(Span::styled(format!(" {} ", label), title_style))
            .borders(Borders::ALL)
            .border_style(border_style);

        let (line, col) = self.cursor_line_col();
        let visible_rows = area.height.saturating_sub(2) as usize;
        let scroll = line.saturating_sub(visible_rows.saturating_sub(1));

        let input = Paragraph::new(display.to_string())
            .style(style)
            .block(block)
            .scroll((scroll as u16, 0));

        frame.render_widget(input, area);

        if focused {
            let cursor_x = area.x + 1 + col as u16;
            let cursor_y = area.y + 1 + (line - scroll) as u16;

            if cursor_x < area.x + area.width.saturating_sub(1)
                && cursor_y < area.y + area.height.saturating_sub(1)
            {
                frame.set_cursor_position(Position::new(cursor_x, cursor_y));
            }
        }
    }
}
