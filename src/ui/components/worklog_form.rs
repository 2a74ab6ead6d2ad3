//! Work-log entry: time spent, start date and an optional note.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    Frame,
};

use super::input::TextInput;
use crate::error::ValidationError;
use crate::time::{parse_date, parse_duration, today};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Field {
    #[default]
    Time,
    Date,
    Note,
}

impl Field {
    fn next(self) -> Self {
        match self {
            Field::Time => Field::Date,
            Field::Date => Field::Note,
            Field::Note => Field::Time,
        }
    }

    fn prev(self) -> Self {
        match self {
            Field::Time => Field::Note,
            Field::Date => Field::Time,
            Field::Note => Field::Date,
        }
    }
}

/// A validated work-log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorklogEntry {
    pub seconds: u64,
    /// `YYYY-MM-DD`.
    pub date: String,
    pub note: String,
}

#[derive(Debug, Clone)]
pub struct WorklogForm {
    time: TextInput,
    date: TextInput,
    note: TextInput,
    focus: Field,
}

impl WorklogForm {
    /// A blank entry dated today.
    pub fn new() -> Self {
        Self::with_date(today())
    }

    pub fn with_date(date: impl Into<String>) -> Self {
        let mut time = TextInput::new();
        time.set_placeholder("1h 30m");
        Self {
            time,
            date: TextInput::with_value(date),
            note: TextInput::new(),
            focus: Field::Time,
        }
    }

    fn focused_input(&mut self) -> &mut TextInput {
        match self.focus {
            Field::Time => &mut self.time,
            Field::Date => &mut self.date,
            Field::Note => &mut self.note,
        }
    }

    /// Handle a key. `Some` carries the validation result on Enter.
    pub fn handle_input(&mut self, key: KeyEvent) -> Option<Result<WorklogEntry, ValidationError>> {
        match (key.code, key.modifiers) {
            (KeyCode::Tab, _) => {
                self.focus = self.focus.next();
                None
            }
            (KeyCode::BackTab, _) => {
                self.focus = self.focus.prev();
                None
            }
            (KeyCode::Enter, KeyModifiers::NONE) => Some(self.entry()),
            _ => {
                self.focused_input().handle_input(key);
                None
            }
        }
    }

    fn entry(&self) -> Result<WorklogEntry, ValidationError> {
        let seconds = parse_duration(self.time.value())?;
        let date = parse_date(self.date.value())?;
        Ok(WorklogEntry {
            seconds,
            date: date.format("%Y-%m-%d").to_string(),
            note: self.note.value().trim().to_string(),
        })
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
            ])
            .split(area);

        self.time
            .render_with_label(frame, chunks[0], "Time spent", self.focus == Field::Time);
        self.date
            .render_with_label(frame, chunks[1], "Date (YYYY-MM-DD)", self.focus == Field::Date);
        self.note
            .render_with_label(frame, chunks[2], "Note", self.focus == Field::Note);
    }
}

impl Default for WorklogForm {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(form: &mut WorklogForm, code: KeyCode) -> Option<Result<WorklogEntry, ValidationError>> {
        form.handle_input(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_str(form: &mut WorklogForm, text: &str) {
        for c in text.chars() {
            press(form, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_valid_entry() {
        let mut form = WorklogForm::with_date("2025-03-04");
        type_str(&mut form, "1h 30m");
        press(&mut form, KeyCode::Tab);
        press(&mut form, KeyCode::Tab);
        type_str(&mut form, "pairing");

        let entry = press(&mut form, KeyCode::Enter).unwrap().unwrap();
        assert_eq!(
            entry,
            WorklogEntry {
                seconds: 5400,
                date: "2025-03-04".to_string(),
                note: "pairing".to_string(),
            }
        );
    }

    #[test]
    fn test_bad_time_is_rejected() {
        let mut form = WorklogForm::with_date("2025-03-04");
        type_str(&mut form, "soon");
        assert!(press(&mut form, KeyCode::Enter).unwrap().is_err());
    }

    #[test]
    fn test_bad_date_is_rejected() {
        let mut form = WorklogForm::with_date("2025-13-40");
        type_str(&mut form, "2h");
        let err = press(&mut form, KeyCode::Enter).unwrap().unwrap_err();
        assert!(err.to_string().contains("YYYY-MM-DD"));
    }

    #[test]
    fn test_back_tab_cycles_backwards() {
        let mut form = WorklogForm::default();
        press(&mut form, KeyCode::BackTab);
        assert_eq!(form.focus, Field::Note);
        press(&mut form, KeyCode::Tab);
        assert_eq!(form.focus, Field::Time);
    }
}
