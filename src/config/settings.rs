//! Application settings configuration.

use serde::{Deserialize, Serialize};

use super::{ConfigError, Result};

/// Default JQL for the "my issues" list.
pub const DEFAULT_JQL: &str =
    "assignee = currentUser() AND resolution = Unresolved ORDER BY status DESC";

/// Application-wide settings, read from the `[settings]` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Query used to load the issue list.
    pub jql: String,
    /// Case-insensitive substrings that mark a target status as a cancellation.
    pub cancel_patterns: Vec<String>,
    /// Key of the issue that link toggling attaches to, e.g. a monthly change ticket.
    pub change_issue_key: Option<String>,
    /// Upper bound on concurrent work-log fetches when totalling the list.
    pub worklog_concurrency: usize,
    /// Event loop tick rate in milliseconds.
    pub tick_rate_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            jql: DEFAULT_JQL.to_string(),
            cancel_patterns: vec!["cancel".to_string()],
            change_issue_key: None,
            worklog_concurrency: 5,
            tick_rate_ms: 100,
        }
    }
}

impl Settings {
    /// Validate these settings.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError::ValidationError` with details if validation fails.
    pub fn validate(&self) -> Result<()> {
        if self.jql.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "settings.jql cannot be empty".to_string(),
            ));
        }

        if self.worklog_concurrency == 0 {
            return Err(ConfigError::ValidationError(
                "settings.worklog_concurrency must be at least 1".to_string(),
            ));
        }

        if self.tick_rate_ms == 0 {
            return Err(ConfigError::ValidationError(
                "settings.tick_rate_ms must be at least 1".to_string(),
            ));
        }

        if self.cancel_patterns.iter().any(|p| p.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "settings.cancel_patterns cannot contain empty patterns".to_string(),
            ));
        }

        Ok(())
    }
}
