//! Issue detail view.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::list::status_style;
use crate::api::types::total_seconds;
use crate::api::{Issue, IssueDetail};
use crate::app::{App, SelectedWorklogs, SidePanel};
use crate::tasks::EffectKind;
use crate::time::{format_duration, time_ago};

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let title = match app.selected_key() {
        Some(key) => format!(" {} ", key),
        None => " Issue ".to_string(),
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let Some(detail) = app.detail() else {
        let loading = Paragraph::new("Loading issue...")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(loading, area);
        return;
    };

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(area);

    let lines = detail_lines(detail, app.selected_worklogs(), app.change_issue_key());
    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.detail_scroll(), 0));
    frame.render_widget(paragraph, columns[0]);

    let (title, lines) = match app.side_panel() {
        SidePanel::Worklogs => (" Work Log ".to_string(), worklog_lines(app.selected_worklogs())),
        SidePanel::EpicChildren => {
            let children = app.epic_children();
            let title = match children {
                Some(children) => format!(" Epic Children ({}) ", children.len()),
                None => " Epic Children ".to_string(),
            };
            let loading = app.loading().is_loading(EffectKind::EpicChildren);
            (title, epic_lines(children, loading))
        }
    };
    let panel = Paragraph::new(lines)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(panel, columns[1]);
}

fn label(name: &str) -> Span<'static> {
    Span::styled(format!("{:<11}", name), Style::default().fg(Color::Gray))
}

fn dimmed(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default().fg(Color::DarkGray),
    ))
}

fn section(name: &str) -> Line<'static> {
    Line::from(Span::styled(
        name.to_string(),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    ))
}

/// Lay out a detail as text lines.
pub fn detail_lines(
    detail: &IssueDetail,
    worklogs: Option<&SelectedWorklogs>,
    change_issue_key: Option<&str>,
) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(
            detail.summary.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(vec![
            label("Status"),
            Span::styled(detail.status.clone(), status_style(&detail.status)),
        ]),
        Line::from(vec![label("Type"), Span::raw(detail.issue_type.clone())]),
        Line::from(vec![
            label("Priority"),
            Span::raw(detail.priority.clone().unwrap_or_else(|| "None".to_string())),
        ]),
        Line::from(vec![label("Assignee"), Span::raw(detail.assignee_name().to_string())]),
        Line::from(vec![
            label("Reporter"),
            Span::raw(detail.reporter.clone().unwrap_or_default()),
        ]),
    ];

    let estimate = match &detail.original_estimate {
        Some(estimate) => Span::raw(estimate.clone()),
        None => Span::styled("not set", Style::default().fg(Color::Red)),
    };
    lines.push(Line::from(vec![label("Estimate"), estimate]));

    let logged = match worklogs {
        Some(w) => Span::raw(non_empty(format_duration(total_seconds(&w.worklogs)), "0m")),
        None => Span::styled("loading...", Style::default().fg(Color::DarkGray)),
    };
    lines.push(Line::from(vec![label("Logged"), logged]));

    if let Some(parent) = &detail.parent {
        lines.push(Line::from(vec![
            label("Parent"),
            Span::styled(parent.key.clone(), Style::default().fg(Color::Cyan)),
            Span::raw(format!(" ({})", parent.issue_type)),
        ]));
    }

    if let Some(change) = change_issue_key {
        let flag = if detail.is_linked_to_change() {
            Span::styled(format!("linked to {}", change), Style::default().fg(Color::Green))
        } else {
            Span::styled(format!("not linked to {}", change), Style::default().fg(Color::Yellow))
        };
        lines.push(Line::from(vec![label("Change"), flag]));
    }

    if let Some(updated) = &detail.updated {
        lines.push(Line::from(vec![label("Updated"), Span::raw(time_ago(updated))]));
    }

    lines.push(Line::default());
    lines.push(section("Description"));
    if detail.description.trim().is_empty() {
        lines.push(Line::from(Span::styled(
            "No description",
            Style::default().fg(Color::DarkGray),
        )));
    } else {
        lines.extend(detail.description.lines().map(|l| Line::from(l.to_string())));
    }

    if !detail.links.is_empty() {
        lines.push(Line::default());
        lines.push(section("Links"));
        for link in &detail.links {
            lines.push(Line::from(vec![
                Span::styled(format!("  {} ", link.relation), Style::default().fg(Color::Gray)),
                Span::styled(link.other_key.clone(), Style::default().fg(Color::Cyan)),
            ]));
        }
    }

    lines.push(Line::default());
    lines.push(section(&format!("Comments ({})", detail.comments.len())));
    for comment in &detail.comments {
        lines.push(Line::from(vec![
            Span::styled(comment.author.clone(), Style::default().fg(Color::Yellow)),
            Span::styled(
                format!(" · {}", time_ago(&comment.created)),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
        lines.extend(comment.body.lines().map(|l| Line::from(format!("  {}", l))));
        lines.push(Line::default());
    }

    lines
}

/// Work-log entries of the shown issue, newest last.
pub fn worklog_lines(worklogs: Option<&SelectedWorklogs>) -> Vec<Line<'static>> {
    let Some(w) = worklogs else {
        return vec![dimmed("Loading work-logs...")];
    };
    if w.worklogs.is_empty() {
        return vec![dimmed("No work logged")];
    }
    w.worklogs
        .iter()
        .map(|entry| {
            let mut spans = vec![
                Span::styled(
                    format!("{:<11}", entry.start_date.clone().unwrap_or_default()),
                    Style::default().fg(Color::Gray),
                ),
                Span::raw(format!("{:<8}", format_duration(entry.seconds))),
            ];
            if !entry.description.is_empty() {
                spans.push(Span::raw(entry.description.clone()));
            }
            Line::from(spans)
        })
        .collect()
}

/// Child issues of an epic with their status.
pub fn epic_lines(children: Option<&[Issue]>, loading: bool) -> Vec<Line<'static>> {
    match children {
        None if loading => vec![dimmed("Loading children...")],
        None => vec![dimmed("Children not loaded")],
        Some([]) => vec![dimmed("No child issues")],
        Some(children) => children
            .iter()
            .map(|child| {
                Line::from(vec![
                    Span::styled(format!("{:<10} ", child.key), Style::default().fg(Color::Cyan)),
                    Span::styled(format!("{:<12} ", child.status), status_style(&child.status)),
                    Span::raw(child.summary.clone()),
                ])
            })
            .collect(),
    }
}

fn non_empty(text: String, fallback: &str) -> String {
    if text.is_empty() {
        fallback.to_string()
    } else {
        text
    }
}
