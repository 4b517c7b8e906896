//! Wall-clock instants as exchanged with the booking server.

use chrono::{Local, NaiveDateTime, Timelike};

/// A booking instant. The server works in its own wall-clock time and the
/// wire format carries no offset, so instants are offset-naive.
pub type Timestamp = NaiveDateTime;

/// The current local wall-clock time, at whole-second precision.
pub fn now() -> Timestamp {
    whole_seconds(Local::now().naive_local())
}

/// Drop sub-second precision. The wire format has none, so every instant
/// held by a booking is normalized through here.
pub(crate) fn whole_seconds(ts: Timestamp) -> Timestamp {
    ts.with_nanosecond(0).unwrap_or(ts)
}
