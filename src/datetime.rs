//! Date/time helpers for filegate.

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a timestamp as ISO-8601 UTC with millisecond precision.
///
/// Example: `2024-05-01T12:00:00.000Z`
pub fn to_iso8601_millis(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}
