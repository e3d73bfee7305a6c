use chrono::{DateTime, NaiveDateTime};

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format a backend timestamp for display.
/// Accepts RFC 3339 and naive ISO datetimes (as Python's isoformat emits).
pub fn format_timestamp(ts: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        dt.format("%b %d, %Y %H:%M").to_string()
    } else if let Ok(dt) = NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f") {
        dt.format("%b %d, %Y %H:%M").to_string()
    } else {
        ts.to_string()
    }
}
