//! Status-category sections of the issue list.

use std::collections::HashMap;

use crate::api::{Issue, Status, StatusCategory};

/// Display order of the list sections.
pub const SECTION_ORDER: [StatusCategory; 3] = [
    StatusCategory::InProgress,
    StatusCategory::ToDo,
    StatusCategory::Done,
];

/// One group of issues sharing a status category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section<'a> {
    pub category: StatusCategory,
    pub issues: Vec<&'a Issue>,
    pub collapsed: bool,
}

/// Lower-cased status name to category, built from the status catalogue.
#[derive(Debug, Clone, Default)]
pub struct StatusCategories {
    by_name: HashMap<String, StatusCategory>,
}

impl StatusCategories {
    pub fn from_statuses(statuses: &[Status]) -> Self {
        let by_name = statuses
            .iter()
            .filter_map(|s| s.category.map(|c| (s.name.to_lowercase(), c)))
            .collect();
        Self { by_name }
    }

    /// Category of a status name. Unknown statuses count as to-do.
    pub fn of(&self, status: &str) -> StatusCategory {
        self.by_name
            .get(&status.to_lowercase())
            .copied()
            .unwrap_or(StatusCategory::ToDo)
    }
}

/// Sort position of a priority name; unknown and missing priorities go last.
pub fn priority_rank(priority: Option<&str>) -> usize {
    match priority {
        Some("Crítica") => 0,
        Some("Highest") => 1,
        Some("High") => 2,
        Some("Medium") => 3,
        Some("Low") => 4,
        Some("Lowest") => 5,
        _ => 6,
    }
}

/// Group issues into the three sections, each ordered by priority.
///
/// The sort is stable, so issues of equal priority keep the order the
/// search returned them in.
pub fn group<'a>(
    issues: impl IntoIterator<Item = &'a Issue>,
    categories: &StatusCategories,
    show_done: bool,
) -> Vec<Section<'a>> {
    let mut sections: Vec<Section<'a>> = SECTION_ORDER
        .iter()
        .map(|&category| Section {
            category,
            issues: Vec::new(),
            collapsed: category == StatusCategory::Done && !show_done,
        })
        .collect();

    for issue in issues {
        let category = categories.of(&issue.status);
        if let Some(section) = sections.iter_mut().find(|s| s.category == category) {
            section.issues.push(issue);
        }
    }

    for section in &mut sections {
        section
            .issues
            .sort_by_key(|issue| priority_rank(issue.priority.as_deref()));
    }
    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{issue, status};

    fn with(key: &str, status: &str, priority: Option<&str>) -> Issue {
        Issue {
            status: status.to_string(),
            priority: priority.map(str::to_string),
            ..issue(key, key)
        }
    }

    fn categories() -> StatusCategories {
        StatusCategories::from_statuses(&[
            status("To Do", StatusCategory::ToDo),
            status("In Progress", StatusCategory::InProgress),
            status("Done", StatusCategory::Done),
            status("Cancelado", StatusCategory::Done),
        ])
    }

    fn keys(section: &Section<'_>) -> Vec<String> {
        section.issues.iter().map(|i| i.key.clone()).collect()
    }

    #[test]
    fn test_groups_by_category_in_fixed_order() {
        let issues = vec![
            with("DEV-1", "Done", None),
            with("DEV-2", "in progress", None),
            with("DEV-3", "To Do", None),
            with("DEV-4", "CANCELADO", None),
        ];

        let sections = group(&issues, &categories(), false);

        let order: Vec<_> = sections.iter().map(|s| s.category).collect();
        assert_eq!(order, SECTION_ORDER.to_vec());
        assert_eq!(keys(&sections[0]), vec!["DEV-2"]);
        assert_eq!(keys(&sections[1]), vec!["DEV-3"]);
        assert_eq!(keys(&sections[2]), vec!["DEV-1", "DEV-4"]);
    }

    #[test]
    fn test_unknown_status_counts_as_to_do() {
        let issues = vec![with("DEV-1", "Waiting for QA", None)];

        let sections = group(&issues, &StatusCategories::default(), false);

        assert_eq!(keys(&sections[1]), vec!["DEV-1"]);
    }

    #[test]
    fn test_orders_by_priority_and_keeps_ties_stable() {
        let issues = vec![
            with("DEV-1", "To Do", Some("Low")),
            with("DEV-2", "To Do", None),
            with("DEV-3", "To Do", Some("Highest")),
            with("DEV-4", "To Do", Some("Low")),
            with("DEV-5", "To Do", Some("Urgent-ish")),
            with("DEV-6", "To Do", Some("Medium")),
        ];

        let sections = group(&issues, &categories(), false);

        assert_eq!(
            keys(&sections[1]),
            vec!["DEV-3", "DEV-6", "DEV-1", "DEV-4", "DEV-2", "DEV-5"]
        );
    }

    #[test]
    fn test_done_collapsed_until_shown() {
        let issues = vec![with("DEV-1", "Done", None)];

        let hidden = group(&issues, &categories(), false);
        assert!(hidden[2].collapsed);
        assert!(!hidden[0].collapsed);
        assert_eq!(hidden[2].issues.len(), 1);

        let shown = group(&issues, &categories(), true);
        assert!(!shown[2].collapsed);
    }
}
