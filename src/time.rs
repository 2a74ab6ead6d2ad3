//! Duration and timestamp helpers.
//!
//! Jira and Tempo exchange durations as seconds, while users type and read
//! them as `1h 30m`. Timestamps arrive in Jira's `2025-01-01T10:00:00.000+0000`
//! form and are shown relative to now.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, Utc};

use crate::error::ValidationError;

/// Longest duration accepted from input.
const MAX_DURATION_HOURS: f64 = 10_000.0;

/// Parse a human duration into seconds, rounded to whole minutes.
///
/// Accepts an hour part, a minute part, or both: `2h`, `45m`, `1h 30m`,
/// `1h30m`, `1.5h`. Durations that round to zero minutes, or exceed
/// [`MAX_DURATION_HOURS`], are rejected.
pub fn parse_duration(input: &str) -> Result<u64, ValidationError> {
    let normalized = input.trim().to_lowercase();
    let mut rest = normalized.as_str();
    let mut seconds = 0f64;

    if let Some((hours, tail)) = rest.split_once('h') {
        seconds += parse_amount(hours, "hours")? * 3600.0;
        rest = tail.trim();
    }

    if let Some((minutes, tail)) = rest.split_once('m') {
        seconds += parse_amount(minutes, "minutes")? * 60.0;
        rest = tail.trim();
    }

    if normalized.is_empty() || !rest.is_empty() {
        return Err(ValidationError::new(format!(
            "could not parse time '{}': use a form like 1h 30m",
            input.trim()
        )));
    }

    let minutes = (seconds / 60.0).round();
    if minutes < 1.0 {
        return Err(ValidationError::new("duration must be at least 1m"));
    }
    if minutes > MAX_DURATION_HOURS * 60.0 {
        return Err(ValidationError::new(format!(
            "duration must be at most {}h",
            MAX_DURATION_HOURS
        )));
    }
    Ok(minutes as u64 * 60)
}

fn parse_amount(raw: &str, unit: &str) -> Result<f64, ValidationError> {
    let raw = raw.trim();
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .ok_or_else(|| ValidationError::new(format!("invalid {}: '{}'", unit, raw)))
}

/// Format seconds as `1h 30m`, `2h` or `45m`.
///
/// Durations shorter than a minute format as an empty string.
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    match (hours, minutes) {
        (0, 0) => String::new(),
        (h, 0) => format!("{}h", h),
        (0, m) => format!("{}m", m),
        (h, m) => format!("{}h {}m", h, m),
    }
}

/// Validate a `YYYY-MM-DD` date.
pub fn parse_date(input: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| {
        ValidationError::new(format!("invalid date '{}': expected YYYY-MM-DD", input.trim()))
    })
}

/// Today's local date as `YYYY-MM-DD`.
pub fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

fn parse_timestamp(date: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(date, "%Y-%m-%dT%H:%M:%S%.3f%z")
        .or_else(|_| DateTime::parse_from_rfc3339(date))
        .ok()
}

/// Describe a Jira timestamp relative to now ("3 hours ago").
///
/// Unparsable input yields `NA`.
pub fn time_ago(date: &str) -> String {
    time_ago_from(date, Utc::now())
}

fn time_ago_from(date: &str, now: DateTime<Utc>) -> String {
    let Some(then) = parse_timestamp(date) else {
        return "NA".to_string();
    };

    let diff = now.signed_duration_since(then.with_timezone(&Utc));
    let hours = diff.num_hours();
    const DAY: i64 = 24;
    const WEEK: i64 = DAY * 7;
    const MONTH: i64 = DAY * 30;
    const YEAR: i64 = MONTH * 12;

    if hours >= YEAR {
        then.with_timezone(&Local).format("%Y/%m/%d").to_string()
    } else if hours >= MONTH {
        format!("{} months ago", hours / MONTH)
    } else if hours >= WEEK {
        format!("{} weeks ago", hours / WEEK)
    } else if hours >= DAY {
        format!("{} days ago", hours / DAY)
    } else if hours >= 1 {
        format!("{} hours ago", hours)
    } else {
        format!("{} minutes ago", diff.num_minutes().max(0))
    }
}
