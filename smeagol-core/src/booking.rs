//! Bookings: a resource reserved for an event over a time span.
//!
//! A booking is either simple (one `[start, end]` span) or repeats
//! according to a [`RecurrenceRule`]. Bookings are only built through the
//! factory functions here, which validate everything up front; the wire
//! codec goes through the same path.

use std::cmp::Ordering;
use std::fmt;

use chrono::Duration;

use crate::error::{BookingError, BookingResult};
use crate::recurrence::{DayOfWeek, Frequency, RecurrenceRule};
use crate::timestamp::{self, Timestamp, whole_seconds};
use crate::wire::scalar::format_datetime;

/// Length of a booking when no end is given, in hours.
pub const DEFAULT_DURATION_HOURS: i64 = 1;

/// A booking of a resource for an event.
///
/// `PartialEq` compares every field. Use [`Booking::same_booking`] to ask
/// whether two values refer to the same server-side booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Booking {
    id: Option<i64>,
    resource_id: i64,
    event_id: i64,
    start: Timestamp,
    end: Timestamp,
    recurrence: Option<RecurrenceRule>,
}

impl Booking {
    /// A one-off booking. `start` defaults to now and `end` to one hour
    /// after `start`; fails if that default end cannot be represented.
    pub fn simple(
        resource_id: i64,
        event_id: i64,
        start: Option<Timestamp>,
        end: Option<Timestamp>,
    ) -> BookingResult<Self> {
        let (start, end) = resolve_span(start, end)?;
        Ok(Booking {
            id: None,
            resource_id,
            event_id,
            start,
            end,
            recurrence: None,
        })
    }

    /// A one-off booking lasting `duration` from `start`.
    pub fn with_duration(
        resource_id: i64,
        event_id: i64,
        start: Timestamp,
        duration: Duration,
    ) -> BookingResult<Self> {
        let end = start
            .checked_add_signed(duration)
            .ok_or_else(|| BookingError::invalid("booking end is out of the representable range"))?;
        Self::simple(resource_id, event_id, Some(start), Some(end))
    }

    /// Attach an already built rule to a span, checking the rule against it.
    pub fn recurring(
        resource_id: i64,
        event_id: i64,
        start: Option<Timestamp>,
        end: Option<Timestamp>,
        rule: RecurrenceRule,
    ) -> BookingResult<Self> {
        let (start, end) = resolve_span(start, end)?;
        rule.validate_span(start, end)?;

        Ok(Booking {
            id: None,
            resource_id,
            event_id,
            start,
            end,
            recurrence: Some(rule),
        })
    }

    /// Repeats every `interval` days. The span may last at most 24 hours.
    pub fn daily(
        resource_id: i64,
        event_id: i64,
        start: Option<Timestamp>,
        end: Option<Timestamp>,
        interval: Option<u16>,
        until: Option<Timestamp>,
    ) -> BookingResult<Self> {
        let rule = RecurrenceRule::daily(interval, until)?;
        Self::recurring(resource_id, event_id, start, end, rule)
    }

    /// Repeats every `interval` weeks on `by_day`. The span may last at
    /// most 7 days.
    pub fn weekly(
        resource_id: i64,
        event_id: i64,
        start: Option<Timestamp>,
        end: Option<Timestamp>,
        interval: Option<u16>,
        until: Option<Timestamp>,
        by_day: impl IntoIterator<Item = DayOfWeek>,
    ) -> BookingResult<Self> {
        let rule = RecurrenceRule::weekly(interval, until, by_day)?;
        Self::recurring(resource_id, event_id, start, end, rule)
    }

    pub fn monthly(
        resource_id: i64,
        event_id: i64,
        start: Option<Timestamp>,
        end: Option<Timestamp>,
        interval: Option<u16>,
        until: Option<Timestamp>,
        by_day_of_month: impl IntoIterator<Item = i16>,
    ) -> BookingResult<Self> {
        let rule = RecurrenceRule::monthly(interval, until, by_day_of_month)?;
        Self::recurring(resource_id, event_id, start, end, rule)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn yearly(
        resource_id: i64,
        event_id: i64,
        start: Option<Timestamp>,
        end: Option<Timestamp>,
        interval: Option<u16>,
        until: Option<Timestamp>,
        by_day_of_month: impl IntoIterator<Item = i16>,
        by_month: impl IntoIterator<Item = i16>,
    ) -> BookingResult<Self> {
        let rule = RecurrenceRule::yearly(interval, until, by_day_of_month, by_month)?;
        Self::recurring(resource_id, event_id, start, end, rule)
    }

    /// Record the id the server issued for this booking.
    ///
    /// Assigning the same id twice is a no-op; reassigning a different one
    /// is rejected.
    pub fn assign_id(&mut self, id: i64) -> BookingResult<()> {
        match self.id {
            None => {
                self.id = Some(id);
                Ok(())
            }
            Some(current) if current == id => Ok(()),
            Some(current) => Err(BookingError::invalid(format!(
                "booking already has id {}, cannot reassign to {}",
                current, id
            ))),
        }
    }

    pub(crate) fn with_id(mut self, id: Option<i64>) -> Self {
        self.id = id;
        self
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn resource_id(&self) -> i64 {
        self.resource_id
    }

    pub fn event_id(&self) -> i64 {
        self.event_id
    }

    pub fn start(&self) -> Timestamp {
        self.start
    }

    pub fn end(&self) -> Timestamp {
        self.end
    }

    pub fn span(&self) -> Duration {
        self.end - self.start
    }

    pub fn recurrence(&self) -> Option<&RecurrenceRule> {
        self.recurrence.as_ref()
    }

    pub fn frequency(&self) -> Option<Frequency> {
        self.recurrence.as_ref().map(RecurrenceRule::frequency)
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    /// Natural order: by start, then by end.
    pub fn compare(&self, other: &Booking) -> Ordering {
        self.start
            .cmp(&other.start)
            .then_with(|| self.end.cmp(&other.end))
    }

    /// Whether both values denote the same booking. Persisted bookings are
    /// compared by id; if either side has no id yet, all fields must match.
    pub fn same_booking(&self, other: &Booking) -> bool {
        match (self.id, other.id) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }
}

impl fmt::Display for Booking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "Booking #{}", id)?,
            None => write!(f, "Booking (unsaved)")?,
        }
        write!(
            f,
            " resource={} event={} {}..{}",
            self.resource_id,
            self.event_id,
            format_datetime(self.start),
            format_datetime(self.end)
        )?;
        if let Some(freq) = self.frequency() {
            write!(f, " {}", freq)?;
        }
        Ok(())
    }
}

fn resolve_span(
    start: Option<Timestamp>,
    end: Option<Timestamp>,
) -> BookingResult<(Timestamp, Timestamp)> {
    let start = start.map(whole_seconds).unwrap_or_else(timestamp::now);
    let end = match end {
        Some(end) => whole_seconds(end),
        None => start
            .checked_add_signed(Duration::hours(DEFAULT_DURATION_HOURS))
            .ok_or_else(|| {
                tracing::debug!(%start, "no room for the default duration after start");
                BookingError::invalid("default end would be out of the representable range")
            })?,
    };
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    const RESOURCE: i64 = 111;
    const EVENT: i64 = 222;

    fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> Timestamp {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    #[test]
    fn test_simple() {
        let b = Booking::simple(
            RESOURCE,
            EVENT,
            Some(ts(2011, 2, 3, 8, 0)),
            Some(ts(2011, 2, 3, 10, 30)),
        )
        .unwrap();
        assert_eq!(b.resource_id(), RESOURCE);
        assert_eq!(b.event_id(), EVENT);
        assert_eq!(b.start(), ts(2011, 2, 3, 8, 0));
        assert_eq!(b.end(), ts(2011, 2, 3, 10, 30));
        assert_eq!(b.id(), None);
        assert!(!b.is_recurring());
        assert_eq!(b.frequency(), None);
    }

    #[test]
    fn test_with_duration() {
        let b = Booking::with_duration(RESOURCE, EVENT, ts(2011, 2, 3, 8, 0), Duration::minutes(90))
            .unwrap();
        assert_eq!(b.end(), ts(2011, 2, 3, 9, 30));
        assert_eq!(b.span(), Duration::minutes(90));
    }

    #[test]
    fn test_daily() {
        let until = ts(2011, 7, 9, 0, 0);
        let b = Booking::daily(
            RESOURCE,
            EVENT,
            Some(ts(2011, 2, 3, 8, 0)),
            Some(ts(2011, 2, 3, 10, 30)),
            Some(2),
            Some(until),
        )
        .unwrap();
        assert_eq!(b.frequency(), Some(Frequency::Daily));
        assert_eq!(b.resource_id(), RESOURCE);
        assert_eq!(b.event_id(), EVENT);
        let rule = b.recurrence().unwrap();
        assert_eq!(rule.interval(), 2);
        assert_eq!(rule.until(), Some(until));
    }

    #[test]
    fn test_daily_with_default_args() {
        let b = Booking::daily(RESOURCE, EVENT, None, None, None, None).unwrap();
        assert_eq!(b.frequency(), Some(Frequency::Daily));
        assert_eq!(b.end(), b.start() + Duration::hours(1));
        assert_eq!(b.recurrence().unwrap().interval(), 1);
        assert_eq!(b.recurrence().unwrap().until(), None);
    }

    #[test]
    fn test_daily_two_hour_span_accepted() {
        let b = Booking::daily(
            1,
            10,
            Some(ts(2011, 1, 1, 8, 0)),
            Some(ts(2011, 1, 1, 10, 0)),
            Some(1),
            None,
        );
        assert!(b.is_ok());
    }

    #[test]
    fn test_daily_two_day_span_rejected() {
        let err = Booking::daily(
            1,
            10,
            Some(ts(2011, 1, 1, 8, 0)),
            Some(ts(2011, 1, 3, 8, 0)),
            Some(1),
            None,
        )
        .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_daily_span_bound_is_inclusive() {
        let start = ts(2011, 1, 1, 8, 0);
        for minutes in [0, 60, 24 * 60 - 1, 24 * 60] {
            let end = start + Duration::minutes(minutes);
            assert!(
                Booking::daily(1, 10, Some(start), Some(end), None, None).is_ok(),
                "{} minutes should be accepted",
                minutes
            );
        }
        for minutes in [24 * 60 + 1, 48 * 60] {
            let end = start + Duration::minutes(minutes);
            assert!(Booking::daily(1, 10, Some(start), Some(end), None, None).is_err());
        }
    }

    #[test]
    fn test_weekly() {
        let b = Booking::weekly(
            RESOURCE,
            EVENT,
            Some(ts(2011, 2, 3, 8, 0)),
            Some(ts(2011, 2, 3, 10, 30)),
            Some(2),
            Some(ts(2011, 7, 9, 0, 0)),
            [DayOfWeek::Monday, DayOfWeek::Wednesday],
        )
        .unwrap();
        assert_eq!(b.frequency(), Some(Frequency::Weekly));
        let days: Vec<_> = b.recurrence().unwrap().by_day().unwrap().iter().copied().collect();
        assert_eq!(days, vec![DayOfWeek::Monday, DayOfWeek::Wednesday]);
    }

    #[test]
    fn test_weekly_with_default_args() {
        let b = Booking::weekly(RESOURCE, EVENT, None, None, None, None, []).unwrap();
        assert_eq!(b.end(), b.start() + Duration::hours(1));
        assert!(b.recurrence().unwrap().by_day().unwrap().is_empty());
    }

    #[test]
    fn test_weekly_span_bound() {
        let start = ts(2011, 1, 1, 8, 0);
        assert!(
            Booking::weekly(1, 10, Some(start), Some(start + Duration::days(7)), None, None, [])
                .is_ok()
        );
        let err = Booking::weekly(
            1,
            10,
            Some(start),
            Some(start + Duration::days(7) + Duration::seconds(1)),
            None,
            None,
            [],
        )
        .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_monthly_rejects_bad_day() {
        let err = Booking::monthly(1, 10, None, None, None, None, [10, 0]).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_monthly_no_span_bound() {
        let start = ts(2011, 1, 1, 8, 0);
        let b = Booking::monthly(1, 10, Some(start), Some(start + Duration::days(20)), None, None, [-1]);
        assert!(b.is_ok());
    }

    #[test]
    fn test_yearly() {
        let b = Booking::yearly(
            RESOURCE,
            EVENT,
            Some(ts(2011, 2, 3, 8, 0)),
            Some(ts(2011, 2, 3, 10, 30)),
            None,
            None,
            [10, 15, -1],
            [1, 6, 10],
        )
        .unwrap();
        let rule = b.recurrence().unwrap();
        assert_eq!(rule.frequency(), Frequency::Yearly);
        assert_eq!(rule.by_day_of_month().unwrap().len(), 3);
        assert_eq!(rule.by_month().unwrap().len(), 3);
    }

    #[test]
    fn test_yearly_rejects_bad_month() {
        let err = Booking::yearly(1, 10, None, None, None, None, [1], [13]).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_until_before_start_rejected() {
        let err = Booking::daily(
            1,
            10,
            Some(ts(2011, 2, 3, 8, 0)),
            Some(ts(2011, 2, 3, 9, 0)),
            None,
            Some(ts(2011, 2, 2, 0, 0)),
        )
        .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_sub_second_precision_dropped() {
        let start = NaiveDate::from_ymd_opt(2011, 2, 16)
            .unwrap()
            .and_hms_milli_opt(4, 0, 0, 500)
            .unwrap();
        let b = Booking::simple(1, 10, Some(start), None).unwrap();
        assert_eq!(b.start(), ts(2011, 2, 16, 4, 0));
        assert_eq!(b.end(), ts(2011, 2, 16, 5, 0));
    }

    #[test]
    fn test_assign_id_is_one_time() {
        let mut b = Booking::simple(1, 10, Some(ts(2011, 1, 1, 8, 0)), None).unwrap();
        b.assign_id(42).unwrap();
        assert_eq!(b.id(), Some(42));
        b.assign_id(42).unwrap();
        let err = b.assign_id(43).unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(b.id(), Some(42));
    }

    #[test]
    fn test_compare_by_start_then_end() {
        let a = Booking::simple(1, 10, Some(ts(2011, 1, 1, 8, 0)), Some(ts(2011, 1, 1, 9, 0))).unwrap();
        let b = Booking::simple(1, 10, Some(ts(2011, 1, 1, 8, 0)), Some(ts(2011, 1, 1, 10, 0))).unwrap();
        let c = Booking::simple(1, 10, Some(ts(2011, 1, 1, 7, 0)), Some(ts(2011, 1, 1, 12, 0))).unwrap();

        assert_eq!(a.compare(&b), Ordering::Less);
        assert_eq!(b.compare(&a), Ordering::Greater);
        assert_eq!(c.compare(&a), Ordering::Less);
        assert_eq!(a.compare(&a.clone()), Ordering::Equal);

        let mut all = vec![b.clone(), a.clone(), c.clone()];
        all.sort_by(Booking::compare);
        assert_eq!(all, vec![c, a, b]);
    }

    #[test]
    fn test_same_booking_by_id() {
        let mut a = Booking::simple(1, 10, Some(ts(2011, 1, 1, 8, 0)), None).unwrap();
        let mut b = Booking::simple(2, 20, Some(ts(2012, 1, 1, 8, 0)), None).unwrap();
        assert!(!a.same_booking(&b));

        a.assign_id(7).unwrap();
        b.assign_id(7).unwrap();
        assert!(a.same_booking(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_same_booking_without_id_compares_fields() {
        let a = Booking::simple(1, 10, Some(ts(2011, 1, 1, 8, 0)), None).unwrap();
        let b = a.clone();
        assert!(a.same_booking(&b));

        let mut persisted = a.clone();
        persisted.assign_id(1).unwrap();
        assert!(!a.same_booking(&persisted));
    }

    #[test]
    fn test_display() {
        let mut b = Booking::daily(
            111,
            222,
            Some(ts(2011, 2, 3, 8, 0)),
            Some(ts(2011, 2, 3, 10, 30)),
            None,
            None,
        )
        .unwrap();
        b.assign_id(1).unwrap();
        assert_eq!(
            b.to_string(),
            "Booking #1 resource=111 event=222 2011-02-03T08:00:00..2011-02-03T10:30:00 DAILY"
        );
    }

    #[test]
    fn test_default_end_past_max_is_rejected() {
        let err = Booking::simple(1, 10, Some(NaiveDateTime::MAX), None).unwrap_err();
        assert!(err.is_invalid_argument());

        let err = Booking::daily(1, 10, Some(NaiveDateTime::MAX), None, None, None).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_explicit_end_at_max_is_accepted() {
        let b = Booking::simple(
            1,
            10,
            Some(NaiveDateTime::MAX),
            Some(NaiveDateTime::MAX),
        )
        .unwrap();
        assert_eq!(b.start(), whole_seconds(NaiveDateTime::MAX));
        assert_eq!(b.span(), Duration::zero());

        let b = Booking::weekly(
            1,
            10,
            Some(NaiveDateTime::MAX),
            Some(NaiveDateTime::MAX),
            None,
            None,
            [],
        );
        assert!(b.is_ok());
    }

    #[test]
    fn test_with_duration_overflow_is_rejected() {
        let err = Booking::with_duration(1, 10, ts(2011, 1, 1, 8, 0), Duration::MAX).unwrap_err();
        assert!(err.is_invalid_argument());

        let err = Booking::with_duration(1, 10, NaiveDateTime::MAX, Duration::seconds(1))
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }
}
