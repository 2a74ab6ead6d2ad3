//! Issue list view.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::api::{Issue, StatusCategory};
use crate::app::{App, Section};
use crate::tasks::EffectKind;
use crate::time::format_duration;

/// Style for a status name, by common workflow words.
pub fn status_style(status: &str) -> Style {
    let status = status.to_lowercase();
    if status.contains("done") || status.contains("closed") || status.contains("resolved") {
        Style::default().fg(Color::Green)
    } else if status.contains("progress") || status.contains("review") {
        Style::default().fg(Color::Yellow)
    } else if status.contains("cancel") || status.contains("blocked") {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Blue)
    }
}

/// One table row: a section header or an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListRow<'a> {
    Header {
        category: StatusCategory,
        count: usize,
        collapsed: bool,
    },
    Issue(&'a Issue),
}

/// Flatten non-empty sections into rows and find the row of the cursor.
fn list_rows<'a>(sections: &[Section<'a>], cursor: usize) -> (Vec<ListRow<'a>>, Option<usize>) {
    let mut rows = Vec::new();
    let mut selected = None;
    let mut index = 0;
    for section in sections.iter().filter(|s| !s.issues.is_empty()) {
        rows.push(ListRow::Header {
            category: section.category,
            count: section.issues.len(),
            collapsed: section.collapsed,
        });
        if section.collapsed {
            continue;
        }
        for &issue in &section.issues {
            if index == cursor {
                selected = Some(rows.len());
            }
            rows.push(ListRow::Issue(issue));
            index += 1;
        }
    }
    (rows, selected)
}

fn header_row(category: StatusCategory, count: usize, collapsed: bool) -> Row<'static> {
    let marker = if collapsed { "▸" } else { "▾" };
    let style = Style::default()
        .fg(Color::Magenta)
        .add_modifier(Modifier::BOLD);
    Row::new(vec![
        Cell::from(format!("{} {}", marker, category.title())),
        Cell::from(format!("({})", count)),
    ])
    .style(style)
}

fn issue_row<'a>(app: &App, issue: &'a Issue) -> Row<'a> {
    let logged = app
        .worklog_total(&issue.id)
        .map(format_duration)
        .unwrap_or_default();
    Row::new(vec![
        Cell::from(issue.key.as_str()).style(Style::default().fg(Color::Cyan)),
        Cell::from(issue.issue_type.as_str()),
        Cell::from(issue.status.as_str()).style(status_style(&issue.status)),
        Cell::from(issue.priority.as_deref().unwrap_or_default()),
        Cell::from(logged),
        Cell::from(issue.summary.as_str()),
    ])
}

/// Render the issue table and, when used, the filter line.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let show_filter = app.is_filtering() || !app.filter().is_empty();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(if show_filter {
            vec![Constraint::Length(1), Constraint::Min(3)]
        } else {
            vec![Constraint::Length(0), Constraint::Min(3)]
        })
        .split(area);

    if show_filter {
        let style = if app.is_filtering() {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let line = Line::from(vec![
            Span::styled("/", Style::default().fg(Color::Cyan)),
            Span::styled(app.filter().to_string(), style),
        ]);
        frame.render_widget(Paragraph::new(line), chunks[0]);
    }

    let sections = app.sections();
    let count: usize = sections.iter().map(|s| s.issues.len()).sum();
    let logged = format_duration(app.total_logged());
    let title = if logged.is_empty() {
        format!(" My Issues ({}) ", count)
    } else {
        format!(" My Issues ({}) · {} logged ", count, logged)
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    if count == 0 {
        let text = if app.loading().is_loading(EffectKind::Issues) {
            "Loading issues..."
        } else if show_filter {
            "No issues match the filter"
        } else {
            "No issues"
        };
        let empty = Paragraph::new(text)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, chunks[1]);
        return;
    }

    let header = Row::new(["Key", "Type", "Status", "Priority", "Logged", "Summary"])
        .style(
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::BOLD),
        );

    let (list, selected) = list_rows(&sections, app.cursor());
    let rows: Vec<Row> = list
        .iter()
        .map(|row| match *row {
            ListRow::Header {
                category,
                count,
                collapsed,
            } => header_row(category, count, collapsed),
            ListRow::Issue(issue) => issue_row(app, issue),
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(14),
            Constraint::Length(10),
            Constraint::Length(16),
            Constraint::Length(10),
            Constraint::Length(8),
            Constraint::Min(20),
        ],
    )
    .header(header)
    .block(block)
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("> ");

    let mut state = TableState::default();
    state.select(selected);
    frame.render_stateful_widget(table, chunks[1], &mut state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::issue;

    fn section(category: StatusCategory, issues: Vec<&Issue>, collapsed: bool) -> Section<'_> {
        Section {
            category,
            issues,
            collapsed,
        }
    }

    #[test]
    fn test_cursor_skips_headers_and_collapsed_sections() {
        let a = issue("DEV-1", "1");
        let b = issue("DEV-2", "2");
        let c = issue("DEV-3", "3");
        let sections = vec![
            section(StatusCategory::InProgress, vec![&a], false),
            section(StatusCategory::ToDo, Vec::new(), false),
            section(StatusCategory::Done, vec![&c], true),
        ];

        let (rows, selected) = list_rows(&sections, 0);
        assert_eq!(rows.len(), 3);
        assert_eq!(selected, Some(1));
        assert_eq!(
            rows[2],
            ListRow::Header {
                category: StatusCategory::Done,
                count: 1,
                collapsed: true
            }
        );

        let sections = vec![
            section(StatusCategory::InProgress, vec![&a], false),
            section(StatusCategory::ToDo, vec![&b], false),
            section(StatusCategory::Done, vec![&c], false),
        ];
        let (rows, selected) = list_rows(&sections, 2);
        assert_eq!(rows.len(), 6);
        assert_eq!(selected, Some(5));
        assert_eq!(rows[5], ListRow::Issue(&c));
    }

    #[test]
    fn test_status_style() {
        assert_eq!(status_style("Done").fg, Some(Color::Green));
        assert_eq!(status_style("In Progress").fg, Some(Color::Yellow));
        assert_eq!(status_style("Cancelado").fg, Some(Color::Red));
        assert_eq!(status_style("To Do").fg, Some(Color::Blue));
    }
}
