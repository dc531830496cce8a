use crate::error::{calendar_query_error, BotResult};
use chrono::{DateTime, SecondsFormat, Utc};

/// Convert Unix epoch seconds into a UTC instant
pub fn epoch_to_utc(seconds: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(seconds, 0)
}

/// Format an instant the way event bodies are sent to Google Calendar
/// (RFC 3339, whole seconds, `+00:00` offset)
pub fn to_google_datetime(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Parse a `dateTime` value returned by Google Calendar.
///
/// The service reports instants in the calendar's own offset, so the result
/// is normalised to UTC before any comparison.
pub fn parse_google_datetime(value: &str) -> BotResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| calendar_query_error(&format!("Failed to parse datetime '{}': {}", value, e)))
}
