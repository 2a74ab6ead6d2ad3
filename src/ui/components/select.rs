//! Single-choice list used for transitions and priorities.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    widgets::{List, ListItem, ListState, Paragraph},
    Frame,
};

/// A navigable list of labels. Submitting yields the selected index.
#[derive(Debug, Clone, Default)]
pub struct SelectList {
    items: Vec<String>,
    selected: usize,
}

impl SelectList {
    pub fn new(items: Vec<String>) -> Self {
        Self { items, selected: 0 }
    }

    /// Replace the items, selecting `preselect` when it is in range.
    pub fn set_items(&mut self, items: Vec<String>, preselect: Option<usize>) {
        self.items = items;
        self.selected = preselect.filter(|&i| i < self.items.len()).unwrap_or(0);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn selected(&self) -> Option<usize> {
        (!self.items.is_empty()).then_some(self.selected)
    }

    /// Move the selection. Returns the index on Enter.
    pub fn handle_input(&mut self, key: KeyEvent) -> Option<usize> {
        match (key.code, key.modifiers) {
            (KeyCode::Char('j'), KeyModifiers::NONE) | (KeyCode::Down, _) => {
                if self.selected + 1 < self.items.len() {
                    self.selected += 1;
                }
                None
            }
            (KeyCode::Char('k'), KeyModifiers::NONE) | (KeyCode::Up, _) => {
                self.selected = self.selected.saturating_sub(1);
                None
            }
            (KeyCode::Enter, KeyModifiers::NONE) => self.selected(),
            _ => None,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, loading: bool) {
        if loading && self.items.is_empty() {
            let text = Paragraph::new("Loading...")
                .style(Style::default().fg(Color::Gray))
                .alignment(Alignment::Center);
            frame.render_widget(text, area);
            return;
        }
        if self.items.is_empty() {
            let text = Paragraph::new("Nothing to choose from")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center);
            frame.render_widget(text, area);
            return;
        }

        let items: Vec<ListItem> = self
            .items
            .iter()
            .map(|label| ListItem::new(label.as_str()))
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
        frame.render_stateful_widget(list, area, &mut state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn list() -> SelectList {
        SelectList::new(vec!["Done".into(), "Cancelled".into(), "Blocked".into()])
    }

    #[test]
    fn test_navigation_stays_in_bounds() {
        let mut select = list();
        select.handle_input(key(KeyCode::Char('k')));
        assert_eq!(select.selected(), Some(0));

        for _ in 0..5 {
            select.handle_input(key(KeyCode::Char('j')));
        }
        assert_eq!(select.selected(), Some(2));
    }

    #[test]
    fn test_enter_returns_selection() {
        let mut select = list();
        select.handle_input(key(KeyCode::Down));
        assert_eq!(select.handle_input(key(KeyCode::Enter)), Some(1));
    }

    #[test]
    fn test_enter_on_empty_list() {
        let mut select = SelectList::default();
        assert_eq!(select.handle_input(key(KeyCode::Enter)), None);
    }

    #[test]
    fn test_preselect() {
        let mut select = SelectList::default();
        select.set_items(vec!["High".into(), "Medium".into()], Some(1));
        assert_eq!(select.selected(), Some(1));

        select.set_items(vec!["Low".into()], Some(4));
        assert_eq!(select.selected(), Some(0));
    }
}
