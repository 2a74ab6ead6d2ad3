//! Assignee search: a query input over the assignable users.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{List, ListItem, ListState, Paragraph},
    Frame,
};

use super::input::TextInput;
use crate::api::User;

/// Queries shorter than this show every user.
const MIN_QUERY_CHARS: usize = 2;

/// User picker component.
///
/// Typing narrows the list to users whose name (or any word of it) starts
/// with the query.
#[derive(Debug, Clone, Default)]
pub struct UserPicker {
    query: TextInput,
    users: Vec<User>,
    /// Indices into `users` that match the query.
    filtered: Vec<usize>,
    selected: usize,
}

impl UserPicker {
    pub fn new(users: Vec<User>) -> Self {
        let mut picker = Self::default();
        picker.query.set_placeholder("type at least 2 letters");
        picker.set_users(users);
        picker
    }

    pub fn set_users(&mut self, users: Vec<User>) {
        self.users = users;
        self.update_filtered();
    }

    pub fn query(&self) -> &str {
        self.query.value()
    }

    fn update_filtered(&mut self) {
        let query = self.query.value().trim().to_lowercase();
        self.filtered = if query.chars().count() < MIN_QUERY_CHARS {
            (0..self.users.len()).collect()
        } else {
            self.users
                .iter()
                .enumerate()
                .filter(|(_, u)| name_matches(&u.display_name, &query))
                .map(|(i, _)| i)
                .collect()
        };
        self.selected = 0;
    }

    /// The highlighted user, if any matches.
    pub fn selected_user(&self) -> Option<&User> {
        self.filtered
            .get(self.selected)
            .and_then(|&i| self.users.get(i))
    }

    /// Handle a key. Returns the chosen user on Enter.
    pub fn handle_input(&mut self, key: KeyEvent) -> Option<User> {
        match (key.code, key.modifiers) {
            (KeyCode::Down, _) | (KeyCode::Char('n'), KeyModifiers::CONTROL) => {
                if self.selected + 1 < self.filtered.len() {
                    self.selected += 1;
                }
                None
            }
            (KeyCode::Up, _) | (KeyCode::Char('p'), KeyModifiers::CONTROL) => {
                self.selected = self.selected.saturating_sub(1);
                None
            }
            (KeyCode::Enter, KeyModifiers::NONE) => self.selected_user().cloned(),
            _ => {
                if self.query.handle_input(key) {
                    self.update_filtered();
                }
                None
            }
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, loading: bool) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(1)])
            .split(area);

        self.query.render_with_label(frame, chunks[0], "Search", true);

        if self.filtered.is_empty() {
            let text = if loading { "Loading users..." } else { "No matching users" };
            let empty = Paragraph::new(text)
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center);
            frame.render_widget(empty, chunks[1]);
            return;
        }

        let items: Vec<ListItem> = self
            .filtered
            .iter()
            .filter_map(|&i| self.users.get(i))
            .map(|u| ListItem::new(u.display_name.as_str()))
            .collect();

        let list = List::new(items)
            .highlight_style(
                Style::default()
                    .fg(Color::White)
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");

        let mut state = ListState::default();
        state.select(Some(self.selected));
        frame.render_stateful_widget(list, chunks[1], &mut state);
    }
}

fn name_matches(name: &str, query: &str) -> bool {
    let name = name.to_lowercase();
    name.starts_with(query) || name.split_whitespace().any(|word| word.starts_with(query))
}
