//! Human-readable elapsed-time strings for status documents.
//!
//! Tiers: `"<s>s"` under a minute, `"<m>m <s>s"` under an hour,
//! `"<h>h <m>m <s>s"` under a day, `"<d>d <h>h <m>m <s>s"` beyond. Once a tier
//! is reached every smaller unit is printed, zeros included.

use chrono::{DateTime, Utc};

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

/// Render the interval from `begin` to `end`.
///
/// A negative interval renders as the absolute interval prefixed with `-`.
pub fn format_interval(begin: DateTime<Utc>, end: DateTime<Utc>) -> String {
    if end < begin {
        return format!("-{}", format_interval(end, begin));
    }
    let secs = end.signed_duration_since(begin).num_seconds();
    format_seconds(u64::try_from(secs).unwrap_or_default())
}

/// Render a whole number of seconds.
pub fn format_seconds(total: u64) -> String {
    let seconds = total % MINUTE;
    if total < MINUTE {
        return format!("{seconds}s");
    }
    let minutes = (total % HOUR) / MINUTE;
    if total < HOUR {
        return format!("{minutes}m {seconds}s");
    }
    let hours = (total % DAY) / HOUR;
    if total < DAY {
        return format!("{hours}h {minutes}m {seconds}s");
    }
    let days = total / DAY;
    format!("{days}d {hours}h {minutes}m {seconds}s")
}
