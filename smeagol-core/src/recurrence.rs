//! Recurrence rules for repeating bookings.
//!
//! The booking server implements a small subset of the RFC 5545 RRULE
//! grammar (section 3.3.10): a frequency, an interval, an optional end and
//! a few selector sets. Each frequency only carries the selectors that are
//! meaningful for it, so a `BYMONTH` on a weekly rule cannot be built.
//!
//! Expanding a rule into concrete occurrences is left to the server.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{Duration, Weekday};

use crate::error::{BookingError, BookingResult};
use crate::timestamp::{Timestamp, whole_seconds};

/// Repeat every period unless told otherwise.
pub const DEFAULT_INTERVAL: u16 = 1;

/// Recurrence frequencies the server accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Monthly => "MONTHLY",
            Frequency::Yearly => "YEARLY",
        }
    }

    /// Longest `[start, end]` span a booking may cover at this frequency.
    /// Monthly and yearly rules are unbounded.
    pub fn max_span(&self) -> Option<Duration> {
        match self {
            Frequency::Daily => Some(Duration::hours(24)),
            Frequency::Weekly => Some(Duration::days(7)),
            Frequency::Monthly | Frequency::Yearly => None,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DAILY" => Ok(Frequency::Daily),
            "WEEKLY" => Ok(Frequency::Weekly),
            "MONTHLY" => Ok(Frequency::Monthly),
            "YEARLY" => Ok(Frequency::Yearly),
            "SECONDLY" | "MINUTELY" | "HOURLY" => Err(BookingError::parse(
                "frequency",
                format!("unsupported frequency '{}'", s),
            )),
            _ => Err(BookingError::parse(
                "frequency",
                format!("unknown frequency '{}'", s),
            )),
        }
    }
}

/// Weekday tokens used by `BYDAY`. Ordered Monday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    /// Two-letter RFC 5545 label (`MO`, `TU`, ...).
    pub fn label(&self) -> &'static str {
        match self {
            DayOfWeek::Monday => "MO",
            DayOfWeek::Tuesday => "TU",
            DayOfWeek::Wednesday => "WE",
            DayOfWeek::Thursday => "TH",
            DayOfWeek::Friday => "FR",
            DayOfWeek::Saturday => "SA",
            DayOfWeek::Sunday => "SU",
        }
    }

    /// Parse a label, ignoring case and surrounding whitespace.
    pub fn from_label(label: &str) -> BookingResult<Self> {
        let wanted = label.trim().to_ascii_uppercase();
        DayOfWeek::ALL
            .into_iter()
            .find(|d| d.label() == wanted)
            .ok_or_else(|| {
                BookingError::parse("by_day", format!("invalid weekday token '{}'", label.trim()))
            })
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(day: Weekday) -> Self {
        match day {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

impl From<DayOfWeek> for Weekday {
    fn from(day: DayOfWeek) -> Self {
        match day {
            DayOfWeek::Monday => Weekday::Mon,
            DayOfWeek::Tuesday => Weekday::Tue,
            DayOfWeek::Wednesday => Weekday::Wed,
            DayOfWeek::Thursday => Weekday::Thu,
            DayOfWeek::Friday => Weekday::Fri,
            DayOfWeek::Saturday => Weekday::Sat,
            DayOfWeek::Sunday => Weekday::Sun,
        }
    }
}

/// How a booking repeats.
///
/// Variants can only be built through the validating constructors below;
/// match on them with `..` to read their fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecurrenceRule {
    #[non_exhaustive]
    Daily {
        interval: u16,
        until: Option<Timestamp>,
    },
    #[non_exhaustive]
    Weekly {
        interval: u16,
        until: Option<Timestamp>,
        by_day: BTreeSet<DayOfWeek>,
    },
    #[non_exhaustive]
    Monthly {
        interval: u16,
        until: Option<Timestamp>,
        /// Days of the month; negative values count back from the last day.
        by_day_of_month: BTreeSet<i16>,
    },
    #[non_exhaustive]
    Yearly {
        interval: u16,
        until: Option<Timestamp>,
        by_day_of_month: BTreeSet<i16>,
        by_month: BTreeSet<i16>,
    },
}

impl RecurrenceRule {
    pub fn daily(interval: Option<u16>, until: Option<Timestamp>) -> BookingResult<Self> {
        Ok(RecurrenceRule::Daily {
            interval: check_interval(interval)?,
            until: until.map(whole_seconds),
        })
    }

    pub fn weekly(
        interval: Option<u16>,
        until: Option<Timestamp>,
        by_day: impl IntoIterator<Item = DayOfWeek>,
    ) -> BookingResult<Self> {
        Ok(RecurrenceRule::Weekly {
            interval: check_interval(interval)?,
            until: until.map(whole_seconds),
            by_day: by_day.into_iter().collect(),
        })
    }

    pub fn monthly(
        interval: Option<u16>,
        until: Option<Timestamp>,
        by_day_of_month: impl IntoIterator<Item = i16>,
    ) -> BookingResult<Self> {
        Ok(RecurrenceRule::Monthly {
            interval: check_interval(interval)?,
            until: until.map(whole_seconds),
            by_day_of_month: check_days_of_month(by_day_of_month)?,
        })
    }

    pub fn yearly(
        interval: Option<u16>,
        until: Option<Timestamp>,
        by_day_of_month: impl IntoIterator<Item = i16>,
        by_month: impl IntoIterator<Item = i16>,
    ) -> BookingResult<Self> {
        Ok(RecurrenceRule::Yearly {
            interval: check_interval(interval)?,
            until: until.map(whole_seconds),
            by_day_of_month: check_days_of_month(by_day_of_month)?,
            by_month: check_months(by_month)?,
        })
    }

    pub fn frequency(&self) -> Frequency {
        match self {
            RecurrenceRule::Daily { .. } => Frequency::Daily,
            RecurrenceRule::Weekly { .. } => Frequency::Weekly,
            RecurrenceRule::Monthly { .. } => Frequency::Monthly,
            RecurrenceRule::Yearly { .. } => Frequency::Yearly,
        }
    }

    pub fn interval(&self) -> u16 {
        match self {
            RecurrenceRule::Daily { interval, .. }
            | RecurrenceRule::Weekly { interval, .. }
            | RecurrenceRule::Monthly { interval, .. }
            | RecurrenceRule::Yearly { interval, .. } => *interval,
        }
    }

    /// Last instant the rule may produce; `None` repeats forever.
    pub fn until(&self) -> Option<Timestamp> {
        match self {
            RecurrenceRule::Daily { until, .. }
            | RecurrenceRule::Weekly { until, .. }
            | RecurrenceRule::Monthly { until, .. }
            | RecurrenceRule::Yearly { until, .. } => *until,
        }
    }

    pub fn by_day(&self) -> Option<&BTreeSet<DayOfWeek>> {
        match self {
            RecurrenceRule::Weekly { by_day, .. } => Some(by_day),
            _ => None,
        }
    }

    pub fn by_day_of_month(&self) -> Option<&BTreeSet<i16>> {
        match self {
            RecurrenceRule::Monthly {
                by_day_of_month, ..
            }
            | RecurrenceRule::Yearly {
                by_day_of_month, ..
            } => Some(by_day_of_month),
            _ => None,
        }
    }

    pub fn by_month(&self) -> Option<&BTreeSet<i16>> {
        match self {
            RecurrenceRule::Yearly { by_month, .. } => Some(by_month),
            _ => None,
        }
    }

    /// Check the rule against the booking span it will be attached to.
    pub fn validate_span(&self, start: Timestamp, end: Timestamp) -> BookingResult<()> {
        if let Some(until) = self.until()
            && until < start
        {
            tracing::debug!(%until, %start, "rejecting recurrence ending before its start");
            return Err(BookingError::invalid(
                "until should not be before the start of the booking",
            ));
        }

        let frequency = self.frequency();
        if let Some(max) = frequency.max_span()
            && end - start > max
        {
            tracing::debug!(%frequency, %start, %end, "rejecting span too wide for frequency");
            return Err(BookingError::invalid(format!(
                "time span defined by [start, end] is too wide: {} recurrences may last at most {}",
                frequency.as_str().to_ascii_lowercase(),
                describe(max)
            )));
        }

        Ok(())
    }
}

fn describe(span: Duration) -> String {
    if span.num_days() >= 1 && span.num_hours() % 24 == 0 && span.num_days() != 1 {
        format!("{} days", span.num_days())
    } else {
        format!("{} hours", span.num_hours())
    }
}

fn check_interval(interval: Option<u16>) -> BookingResult<u16> {
    match interval {
        None => Ok(DEFAULT_INTERVAL),
        Some(0) => {
            tracing::debug!("rejecting recurrence interval 0");
            Err(BookingError::invalid("interval must be at least 1"))
        }
        Some(n) => Ok(n),
    }
}

fn check_days_of_month(days: impl IntoIterator<Item = i16>) -> BookingResult<BTreeSet<i16>> {
    days.into_iter()
        .map(|d| {
            if (-31..=-1).contains(&d) || (1..=31).contains(&d) {
                Ok(d)
            } else {
                tracing::debug!(day = d, "rejecting day of month out of range");
                Err(BookingError::invalid(format!(
                    "illegal day of month {}: only values in [-31, -1] or [1, 31] are valid",
                    d
                )))
            }
        })
        .collect()
}

fn check_months(months: impl IntoIterator<Item = i16>) -> BookingResult<BTreeSet<i16>> {
    months
        .into_iter()
        .map(|m| {
            if (1..=12).contains(&m) {
                Ok(m)
            } else {
                tracing::debug!(month = m, "rejecting month out of range");
                Err(BookingError::invalid(format!(
                    "illegal month {}: only values in [1, 12] are valid",
                    m
                )))
            }
        })
        .collect()
}
