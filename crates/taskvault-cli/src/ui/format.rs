//! String helpers for table cells.

use chrono::{DateTime, Local, Utc};

/// Cut `text` to `max` characters, marking the cut with `...`.
pub fn truncate(text: &str, max: usize) -> String {
    let count = text.chars().count();
    if count <= max {
        return text.to_string();
    }
    if max <= 3 {
        return text.chars().take(max).collect();
    }
    let kept: String = text.chars().take(max - 3).collect();
    format!("{}...", kept)
}

/// First eight characters of an id; the inbox id stays whole.
pub fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

pub fn format_datetime(value: &DateTime<Utc>) -> String {
    value.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}
