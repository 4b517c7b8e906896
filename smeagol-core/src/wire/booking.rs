//! Flat JSON shape of a booking as the server sends and expects it.
//!
//! The server has no nested recurrence object: frequency, interval, until
//! and the selector sets sit next to the booking fields, and sets travel
//! as comma-joined strings.

use std::collections::BTreeSet;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::booking::Booking;
use crate::error::{BookingError, BookingResult};
use crate::recurrence::{Frequency, RecurrenceRule};
use crate::wire::scalar::{
    format_datetime, format_days, format_numbers, parse_datetime, parse_days, parse_numbers,
};

/// A booking as it appears on the wire. Missing and `null` fields are
/// both `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WireBooking {
    pub id: Option<i64>,
    pub id_resource: Option<i64>,
    pub id_event: Option<i64>,
    pub dtstart: Option<String>,
    pub dtend: Option<String>,
    pub frequency: Option<String>,
    pub interval: Option<i64>,
    pub until: Option<String>,
    pub by_day: Option<String>,
    pub by_day_month: Option<String>,
    pub by_month: Option<String>,
}

impl WireBooking {
    /// Build the JSON object. Absent fields are left out unless
    /// `emit_nulls` is set, in which case they are written as `null`.
    pub fn into_json(self, emit_nulls: bool) -> Value {
        let mut map = Map::new();
        put(&mut map, "id", self.id, emit_nulls);
        put(&mut map, "id_resource", self.id_resource, emit_nulls);
        put(&mut map, "id_event", self.id_event, emit_nulls);
        put(&mut map, "dtstart", self.dtstart, emit_nulls);
        put(&mut map, "dtend", self.dtend, emit_nulls);
        put(&mut map, "frequency", self.frequency, emit_nulls);
        put(&mut map, "interval", self.interval, emit_nulls);
        put(&mut map, "until", self.until, emit_nulls);
        put(&mut map, "by_day", self.by_day, emit_nulls);
        put(&mut map, "by_day_month", self.by_day_month, emit_nulls);
        put(&mut map, "by_month", self.by_month, emit_nulls);
        Value::Object(map)
    }
}

fn put<T: Into<Value>>(
    map: &mut Map<String, Value>,
    key: &str,
    value: Option<T>,
    emit_nulls: bool,
) {
    match value {
        Some(v) => {
            map.insert(key.to_string(), v.into());
        }
        None if emit_nulls => {
            map.insert(key.to_string(), Value::Null);
        }
        None => {}
    }
}

impl From<&Booking> for WireBooking {
    fn from(booking: &Booking) -> Self {
        let rule = booking.recurrence();

        WireBooking {
            id: booking.id(),
            id_resource: Some(booking.resource_id()),
            id_event: Some(booking.event_id()),
            dtstart: Some(format_datetime(booking.start())),
            dtend: Some(format_datetime(booking.end())),
            frequency: rule.map(|r| r.frequency().as_str().to_string()),
            interval: rule.map(|r| i64::from(r.interval())),
            until: rule.and_then(RecurrenceRule::until).map(format_datetime),
            by_day: rule.and_then(RecurrenceRule::by_day).and_then(format_days),
            by_day_month: rule
                .and_then(RecurrenceRule::by_day_of_month)
                .and_then(format_numbers),
            by_month: rule.and_then(RecurrenceRule::by_month).and_then(format_numbers),
        }
    }
}

impl TryFrom<WireBooking> for Booking {
    type Error = BookingError;

    fn try_from(wire: WireBooking) -> BookingResult<Self> {
        // Malformed tokens are reported before missing fields.
        let until = wire
            .until
            .as_deref()
            .map(|s| parse_datetime("until", s))
            .transpose()?;
        let by_day = optional_set(wire.by_day.as_deref(), |s| parse_days("by_day", s))?;
        let by_day_month = optional_set(wire.by_day_month.as_deref(), |s| {
            parse_numbers("by_day_month", s)
        })?;
        let by_month = optional_set(wire.by_month.as_deref(), |s| parse_numbers("by_month", s))?;

        let resource_id = required("id_resource", wire.id_resource)?;
        let event_id = required("id_event", wire.id_event)?;
        let start = parse_datetime("dtstart", &required("dtstart", wire.dtstart)?)?;
        let end = parse_datetime("dtend", &required("dtend", wire.dtend)?)?;

        let frequency = wire
            .frequency
            .as_deref()
            .map(|s| s.trim().parse::<Frequency>())
            .transpose()?;

        let Some(frequency) = frequency else {
            // The interval is ignored here: older clients sent `interval: 1`
            // on every booking.
            let stray = [
                ("until", until.is_some()),
                ("by_day", !by_day.is_empty()),
                ("by_day_month", !by_day_month.is_empty()),
                ("by_month", !by_month.is_empty()),
            ];
            if let Some((field, _)) = stray.iter().find(|(_, present)| *present) {
                return Err(BookingError::invalid(format!(
                    "'{}' given for a booking without a frequency",
                    field
                )));
            }
            let booking = Booking::simple(resource_id, event_id, Some(start), Some(end))?;
            return Ok(booking.with_id(wire.id));
        };

        let interval = wire
            .interval
            .map(|n| {
                u16::try_from(n).map_err(|_| {
                    BookingError::invalid(format!("interval {} is out of range", n))
                })
            })
            .transpose()?;

        let rule = match frequency {
            Frequency::Daily => {
                forbid(frequency, "by_day", !by_day.is_empty())?;
                forbid(frequency, "by_day_month", !by_day_month.is_empty())?;
                forbid(frequency, "by_month", !by_month.is_empty())?;
                RecurrenceRule::daily(interval, until)?
            }
            Frequency::Weekly => {
                forbid(frequency, "by_day_month", !by_day_month.is_empty())?;
                forbid(frequency, "by_month", !by_month.is_empty())?;
                RecurrenceRule::weekly(interval, until, by_day)?
            }
            Frequency::Monthly => {
                forbid(frequency, "by_day", !by_day.is_empty())?;
                forbid(frequency, "by_month", !by_month.is_empty())?;
                RecurrenceRule::monthly(interval, until, by_day_month)?
            }
            Frequency::Yearly => {
                forbid(frequency, "by_day", !by_day.is_empty())?;
                RecurrenceRule::yearly(interval, until, by_day_month, by_month)?
            }
        };

        let booking = Booking::recurring(resource_id, event_id, Some(start), Some(end), rule)?;
        Ok(booking.with_id(wire.id))
    }
}

fn required<T>(field: &'static str, value: Option<T>) -> BookingResult<T> {
    value.ok_or_else(|| BookingError::parse(field, "missing required field"))
}

fn optional_set<T: Ord>(
    raw: Option<&str>,
    parse: impl FnOnce(&str) -> BookingResult<BTreeSet<T>>,
) -> BookingResult<BTreeSet<T>> {
    match raw {
        Some(s) => parse(s),
        None => Ok(BTreeSet::new()),
    }
}

fn forbid(frequency: Frequency, field: &str, present: bool) -> BookingResult<()> {
    if present {
        return Err(BookingError::invalid(format!(
            "'{}' is not allowed on a {} recurrence",
            field, frequency
        )));
    }
    Ok(())
}
