//! Server-side timestamps stamped onto every envelope.

use chrono::{DateTime, Local};

/// `yyyy-mm-dd hh:mm:ss` in the server's local time zone
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render the current instant
pub fn now() -> String {
    format(&Local::now())
}

/// Render a given instant
pub fn format(instant: &DateTime<Local>) -> String {
    instant.format(TIMESTAMP_FORMAT).to_string()
}
