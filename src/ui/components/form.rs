//! Forms owned by the editing modes.
//!
//! A [`Form`] buffers input until it validates and is submitted. Validation
//! problems are shown on the form itself and never leave it; the application
//! only sees a [`FormValue`] once the input is acceptable.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::Line,
    widgets::Paragraph,
    Frame,
};

use super::input::TextInput;
use super::modal::render_modal;
use super::select::SelectList;
use super::user_picker::UserPicker;
use super::worklog_form::{WorklogEntry, WorklogForm};
use crate::api::User;
use crate::error::ValidationError;
use crate::time::parse_duration;

/// What a text form accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRule {
    Any,
    /// Non-blank text.
    Required,
    /// A duration such as `1h 30m`.
    Duration,
    /// A non-blank issue key, upper-cased.
    IssueKey,
}

/// Result of feeding a key to a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormOutcome {
    Pending,
    Submitted(FormValue),
}

/// A validated form value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    /// Index of the chosen item.
    Choice(usize),
    /// Duration in seconds.
    Duration(u64),
    User(User),
    Worklog(WorklogEntry),
}

#[derive(Debug, Clone)]
pub struct TextForm {
    input: TextInput,
    rule: TextRule,
}

impl TextForm {
    fn submit(&self) -> Result<FormValue, ValidationError> {
        let value = self.input.value();
        match self.rule {
            TextRule::Any => Ok(FormValue::Text(value.trim_end().to_string())),
            TextRule::Required => {
                if value.trim().is_empty() {
                    Err(ValidationError::new("text is required"))
                } else {
                    Ok(FormValue::Text(value.trim().to_string()))
                }
            }
            TextRule::Duration => {
                Ok(FormValue::Duration(parse_duration(value)?))
            }
            TextRule::IssueKey => {
                let key = value.trim();
                if key.is_empty() {
                    Err(ValidationError::new("issue key is required"))
                } else {
                    Ok(FormValue::Text(key.to_uppercase()))
                }
            }
        }
    }

    fn is_submit_key(&self, key: &KeyEvent) -> bool {
        match key.code {
            KeyCode::Enter if !self.input.is_multiline() => true,
            KeyCode::Enter => key.modifiers.contains(KeyModifiers::ALT),
            KeyCode::Char('s') => key.modifiers.contains(KeyModifiers::CONTROL),
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
enum Body {
    Text(TextForm),
    Select(SelectList),
    Users(UserPicker),
    Worklog(WorklogForm),
}

/// The form of an editing mode plus its inline error line.
#[derive(Debug, Clone)]
pub struct Form {
    body: Body,
    error: Option<String>,
}

impl Form {
    fn with_body(body: Body) -> Self {
        Self { body, error: None }
    }

    /// Single-line text input.
    pub fn text(initial: impl Into<String>, rule: TextRule) -> Self {
        Self::with_body(Body::Text(TextForm {
            input: TextInput::with_value(initial),
            rule,
        }))
    }

    /// Multi-line text input, submitted with Ctrl+S or Alt+Enter.
    pub fn multiline(initial: impl Into<String>, rule: TextRule) -> Self {
        let mut input = TextInput::multiline();
        input.set_value(initial);
        Self::with_body(Body::Text(TextForm { input, rule }))
    }

    pub fn select(items: Vec<String>) -> Self {
        Self::with_body(Body::Select(SelectList::new(items)))
    }

    pub fn users(users: Vec<User>) -> Self {
        Self::with_body(Body::Users(UserPicker::new(users)))
    }

    pub fn worklog() -> Self {
        Self::with_body(Body::Worklog(WorklogForm::new()))
    }

    /// Fill a select form once its items have been fetched.
    pub fn set_choices(&mut self, items: Vec<String>, preselect: Option<usize>) {
        if let Body::Select(list) = &mut self.body {
            list.set_items(items, preselect);
        }
    }

    /// Fill a user form once the users have been fetched.
    pub fn set_users(&mut self, users: Vec<User>) {
        if let Body::Users(picker) = &mut self.body {
            picker.set_users(users);
        }
    }

    pub fn set_error(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn handle_input(&mut self, key: KeyEvent) -> FormOutcome {
        let result = match &mut self.body {
            Body::Text(form) => {
                if form.is_submit_key(&key) {
                    Some(form.submit())
                } else {
                    form.input.handle_input(key);
                    None
                }
            }
            Body::Select(list) => list.handle_input(key).map(|i| Ok(FormValue::Choice(i))),
            Body::Users(picker) => {
                if key.code == KeyCode::Enter && picker.selected_user().is_none() {
                    Some(Err(ValidationError::new("no user selected")))
                } else {
                    picker.handle_input(key).map(|u| Ok(FormValue::User(u)))
                }
            }
            Body::Worklog(form) => form
                .handle_input(key)
                .map(|entry| entry.map(FormValue::Worklog)),
        };

        match result {
            Some(Ok(value)) => {
                self.error = None;
                FormOutcome::Submitted(value)
            }
            Some(Err(e)) => {
                self.error = Some(e.to_string());
                FormOutcome::Pending
            }
            None => FormOutcome::Pending,
        }
    }

    fn hints(&self) -> &'static str {
        match &self.body {
            Body::Text(form) if form.input.is_multiline() => "[Ctrl+S] save  [Esc] cancel",
            Body::Text(_) => "[Enter] save  [Esc] cancel",
            Body::Select(_) => "[j/k] move  [Enter] choose  [Esc] cancel",
            Body::Users(_) => "[↑/↓] move  [Enter] assign  [Esc] cancel",
            Body::Worklog(_) => "[Tab] next field  [Enter] log  [Esc] cancel",
        }
    }

    fn size(&self) -> (u16, u16) {
        match &self.body {
            Body::Text(form) if form.input.is_multiline() => (80, 20),
            Body::Text(_) => (60, 8),
            Body::Select(_) => (50, 16),
            Body::Users(_) => (50, 18),
            Body::Worklog(_) => (60, 15),
        }
    }

    /// Render the form as a modal over `area`.
    pub fn render(&self, frame: &mut Frame, area: Rect, title: &str, loading: bool) {
        let (width, height) = self.size();
        let inner = render_modal(frame, area, title, width, height);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(inner);

        match &self.body {
            Body::Text(form) => form.input.render_with_label(frame, chunks[0], title, true),
            Body::Select(list) => list.render(frame, chunks[0], loading),
            Body::Users(picker) => picker.render(frame, chunks[0], loading),
            Body::Worklog(form) => form.render(frame, chunks[0]),
        }

        if let Some(error) = &self.error {
            let line = Paragraph::new(Line::from(error.as_str()))
                .style(Style::default().fg(Color::Red));
            frame.render_widget(line, chunks[1]);
        } else if loading && matches!(self.body, Body::Text(_) | Body::Worklog(_)) {
            let line = Paragraph::new("Saving...").style(Style::default().fg(Color::Gray));
            frame.render_widget(line, chunks[1]);
        }

        let hints = Paragraph::new(Line::from(super::status_bar::hint_spans(self.hints())));
        frame.render_widget(hints, chunks[2]);
    }
}
