//! Date coercion for the future-date scan and `DATE_PAST` rules.
//!
//! Two independent paths: number cells are spreadsheet serials, string cells are parsed as
//! calendar dates. Anything else is not a date.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::types::Value;

/// Serial number of 1970-01-01 in the 1900 date system.
pub const UNIX_EPOCH_SERIAL: f64 = 25569.0;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
];

/// Convert a spreadsheet serial to a UTC instant, rounded to the millisecond.
pub fn serial_to_datetime(serial: f64) -> Option<DateTime<Utc>> {
    if !serial.is_finite() {
        return None;
    }
    let millis = ((serial - UNIX_EPOCH_SERIAL) * MILLIS_PER_DAY).round();
    if millis.abs() > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp_millis(millis as i64)
}

/// Parse a calendar date string. Values without an offset are taken as UTC.
pub fn parse_date_str(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }
    None
}

/// Read a cell as a date through whichever path its type selects.
pub fn cell_as_datetime(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) | Value::DateTime(n) => serial_to_datetime(*n),
        Value::Utf8(s) => parse_date_str(s),
        Value::Null | Value::Bool(_) => None,
    }
}

/// Returns `true` if the cell reads as a date strictly after `now`.
///
/// Unparseable values are never flagged.
pub fn is_future_date(value: &Value, now: DateTime<Utc>) -> bool {
    cell_as_datetime(value).is_some_and(|d| d > now)
}
