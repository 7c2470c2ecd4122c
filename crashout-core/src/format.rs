//! Formatting helpers for terminal output.

use crate::types::{Entry, Severity};
use chrono::{DateTime, Utc};

/// Format a timestamp relative to `now` (e.g., "2m ago").
pub fn format_relative_time(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let duration = now.signed_duration_since(ts);

    if duration.num_seconds() < 0 {
        "just now".to_string()
    } else if duration.num_seconds() < 60 {
        format!("{}s ago", duration.num_seconds())
    } else if duration.num_minutes() < 60 {
        format!("{}m ago", duration.num_minutes())
    } else if duration.num_hours() < 24 {
        format!("{}h ago", duration.num_hours())
    } else if duration.num_days() < 7 {
        format!("{}d ago", duration.num_days())
    } else {
        ts.format("%b %d").to_string()
    }
}

/// When an entry was logged, relative to now. `?` for unrepresentable times.
pub fn entry_age(entry: &Entry) -> String {
    match entry.created_at() {
        Some(ts) => format_relative_time(ts, Utc::now()),
        None => "?".to_string(),
    }
}

/// Ten-cell bar, filled up to the severity.
pub fn severity_bar(severity: Severity) -> String {
    let filled = usize::from(severity.get());
    let empty = usize::from(Severity::MAX) - filled;
    format!("{}{}", "#".repeat(filled), ".".repeat(empty))
}

/// First `len` characters of an id, for display and prefix lookup.
pub fn short_id(id: &str, len: usize) -> &str {
    match id.char_indices().nth(len) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

/// Truncate to `max` characters, appending `...` when cut.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}
