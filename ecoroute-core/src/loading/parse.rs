//! Field-level parsers shared by the CSV loaders

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Output format of counting timestamps in cleaned files
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parses a decimal value, accepting a comma as decimal separator.
/// Empty strings and non-finite values yield `None`.
pub fn parse_number(value: &str) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let parsed = match value.parse::<f64>() {
        Ok(v) => v,
        Err(_) => value.replace(',', ".").parse::<f64>().ok()?,
    };
    parsed.is_finite().then_some(parsed)
}

/// Parses an integer identifier. Identifiers exported as floats (`1234.0`)
/// are accepted when they carry no fractional part.
pub fn parse_id(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(id) = value.parse::<i64>() {
        return Some(id);
    }
    let float = parse_number(value)?;
    #[allow(clippy::cast_possible_truncation)]
    (float.fract() == 0.0).then_some(float as i64)
}

/// Parses a counting timestamp into naive UTC.
///
/// Raw exports use RFC 3339 with an offset (`2024-01-15T08:00:00+01:00`),
/// cleaned files use [`TIMESTAMP_FORMAT`].
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc).naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(dt.with_timezone(&Utc).naive_utc());
    }
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

/// Parses a compact `YYYYMMDD` date
pub fn parse_compact_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y%m%d").ok()
}
