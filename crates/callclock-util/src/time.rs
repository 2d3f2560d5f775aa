//! Time utilities for callclock
//!
//! Countdown values are whole seconds; wall-clock time is only used for
//! display and event timestamps.

use chrono::{DateTime, Local};

/// Get the current local time.
pub fn now() -> DateTime<Local> {
    Local::now()
}

/// Format a countdown as `M:SS`.
///
/// Minutes are not zero-padded and are not wrapped into hours, so 1800
/// seconds renders as `30:00`.
pub fn format_countdown(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
