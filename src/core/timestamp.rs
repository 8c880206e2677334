//! Timestamp rendering for encoded records
//!
//! Records carry ISO 8601 UTC with milliseconds, e.g. `2025-01-08T10:30:45.123Z`.

use chrono::{DateTime, Utc};

const ISO8601_MILLIS: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Render `datetime` as ISO 8601 UTC with milliseconds
///
/// # Examples
///
/// ```
/// use chrono::Utc;
///
/// let timestamp = rivet_log::core::timestamp::iso8601(&Utc::now());
/// assert!(timestamp.ends_with('Z'));
/// ```
#[must_use]
pub fn iso8601(datetime: &DateTime<Utc>) -> String {
    datetime.format(ISO8601_MILLIS).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_milliseconds_are_truncated() {
        // 2025-01-08 10:30:45.123456 UTC
        let datetime = Utc
            .with_ymd_and_hms(2025, 1, 8, 10, 30, 45)
            .single()
            .expect("valid datetime")
            + chrono::Duration::microseconds(123456);

        assert_eq!(iso8601(&datetime), "2025-01-08T10:30:45.123Z");
    }
}
