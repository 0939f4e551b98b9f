//! Timestamp wire formats
//!
//! JSON protocols carry epoch seconds with millisecond precision
//! (`1456833600.250`); XML protocols carry ISO-8601 (`2016-03-01T12:00:00.250Z`)
//! in bodies and HTTP dates in headers.

use chrono::{DateTime, SecondsFormat, Utc};

/// Epoch seconds with exactly three fractional digits
pub fn format_epoch_seconds(value: &DateTime<Utc>) -> String {
    let millis = value.timestamp_millis();
    format!("{}.{:03}", millis.div_euclid(1000), millis.rem_euclid(1000))
}

/// Timestamp from (possibly fractional) epoch seconds, rounded to milliseconds
pub fn from_epoch_seconds(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis((seconds * 1000.0).round() as i64)
}

pub fn format_iso8601(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// RFC 7231 date, as used in HTTP headers
pub fn format_http_date(value: &DateTime<Utc>) -> String {
    value.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

pub fn parse_iso8601(text: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    Ok(DateTime::parse_from_rfc3339(text.trim())?.with_timezone(&Utc))
}
