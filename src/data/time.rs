use chrono::{DateTime, Local, Utc};

const MINUTE_MS: i64 = 60 * 1000;
const HOUR_MS: i64 = 60 * MINUTE_MS;

/// Current wall clock in Unix milliseconds.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// "3h 12m ago" once an hour has passed, otherwise "12m ago".
/// Timestamps in the future are shown as "0m ago".
pub fn format_relative(occurred_at_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(occurred_at_ms).max(0);
    let hours = diff / HOUR_MS;
    let minutes = (diff % HOUR_MS) / MINUTE_MS;
    if hours > 0 {
        format!("{hours}h {minutes}m ago")
    } else {
        format!("{minutes}m ago")
    }
}

/// Local date and time, e.g. `2024-03-01 14:05:09`.
pub fn format_local(occurred_at_ms: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(occurred_at_ms) {
        Some(utc) => utc
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        None => "<invalid time>".to_string(),
    }
}
