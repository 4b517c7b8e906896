//! Scalar wire encodings: datetimes and comma-joined sets.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::{BookingError, BookingResult};
use crate::recurrence::DayOfWeek;
use crate::timestamp::{Timestamp, whole_seconds};

/// Canonical outbound datetime layout: ISO 8601, no fraction, no offset.
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub fn format_datetime(ts: Timestamp) -> String {
    ts.format(DATETIME_FORMAT).to_string()
}

/// Parse an ISO 8601 date-time.
///
/// Accepts the canonical form with or without fractional seconds, RFC 3339
/// strings carrying an offset (the wall-clock part is kept), minute
/// precision, and a bare date (midnight).
pub fn parse_datetime(field: &'static str, s: &str) -> BookingResult<Timestamp> {
    let s = s.trim();

    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(whole_seconds(dt));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(whole_seconds(dt.naive_local()));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M") {
        return Ok(dt);
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        && let Some(midnight) = date.and_hms_opt(0, 0, 0)
    {
        return Ok(midnight);
    }

    Err(BookingError::parse(
        field,
        format!("'{}' is not an ISO 8601 date-time", s),
    ))
}

/// Join weekday labels with commas, Monday first. Empty sets have no
/// wire form.
pub fn format_days(days: &BTreeSet<DayOfWeek>) -> Option<String> {
    if days.is_empty() {
        return None;
    }
    let labels: Vec<&str> = days.iter().map(DayOfWeek::label).collect();
    Some(labels.join(","))
}

pub fn parse_days(field: &'static str, s: &str) -> BookingResult<BTreeSet<DayOfWeek>> {
    tokens(s)
        .map(|token| {
            DayOfWeek::from_label(token).map_err(|_| {
                BookingError::parse(field, format!("invalid weekday token '{}' in '{}'", token, s))
            })
        })
        .collect()
}

/// Join integers with commas in ascending order. Empty sets have no wire
/// form.
pub fn format_numbers(values: &BTreeSet<i16>) -> Option<String> {
    if values.is_empty() {
        return None;
    }
    let parts: Vec<String> = values.iter().map(i16::to_string).collect();
    Some(parts.join(","))
}

pub fn parse_numbers(field: &'static str, s: &str) -> BookingResult<BTreeSet<i16>> {
    tokens(s)
        .map(|token| {
            token.parse::<i16>().map_err(|e| {
                BookingError::parse(field, format!("invalid integer '{}' in '{}': {}", token, s, e))
            })
        })
        .collect()
}

// Blank tokens are skipped, so "" and "MO,,WE" are accepted.
fn tokens(s: &str) -> impl Iterator<Item = &str> {
    s.split(',').map(str::trim).filter(|t| !t.is_empty())
}
