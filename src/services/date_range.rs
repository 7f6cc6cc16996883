//! Resolution of the board's date-range modes into closed timestamp intervals.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Date, Duration, Month, OffsetDateTime, Time, error::ComponentRange};
use utoipa::ToSchema;

/// Date window the statistics are computed over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RangeMode {
    /// From the 1st of the current month to the end of its last day.
    #[default]
    CurrentMonth,
    /// The whole previous calendar month.
    PreviousMonth,
    /// From January 1st of the current year until now.
    YearToDate,
    /// The whole previous calendar year.
    PreviousYear,
    /// Caller-supplied bounds.
    Custom,
}

/// Closed `[start, end]` interval of play timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DateInterval {
    /// Inclusive lower bound.
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub start: OffsetDateTime,
    /// Inclusive upper bound.
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub end: OffsetDateTime,
}

impl DateInterval {
    /// Build an interval, rejecting bounds given in the wrong order.
    pub fn new(start: OffsetDateTime, end: OffsetDateTime) -> Result<Self, RangeError> {
        if start > end {
            return Err(RangeError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    /// Whether a timestamp falls inside the interval, bounds included.
    pub fn contains(&self, instant: OffsetDateTime) -> bool {
        self.start <= instant && instant <= self.end
    }
}

/// Failures while turning a mode into concrete bounds.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeError {
    #[error("custom range requires both a start and an end")]
    MissingCustomBounds,
    #[error("range start {start} is after its end {end}")]
    Inverted {
        start: OffsetDateTime,
        end: OffsetDateTime,
    },
    #[error("calendar arithmetic out of range: {0}")]
    Calendar(#[from] ComponentRange),
}

/// Resolve `mode` relative to `now`. Calendar boundaries use the offset carried by `now`.
pub fn resolve(
    mode: RangeMode,
    now: OffsetDateTime,
    custom: Option<DateInterval>,
) -> Result<DateInterval, RangeError> {
    let offset = now.offset();
    let at_midnight = |date: Date| date.with_time(Time::MIDNIGHT).assume_offset(offset);

    let this_month = Date::from_calendar_date(now.year(), now.month(), 1)?;
    let this_year = Date::from_calendar_date(now.year(), Month::January, 1)?;

    match mode {
        RangeMode::CurrentMonth => {
            let next_month = first_of_next_month(this_month)?;
            Ok(DateInterval {
                start: at_midnight(this_month),
                end: at_midnight(next_month) - Duration::NANOSECOND,
            })
        }
        RangeMode::PreviousMonth => {
            let previous_month = first_of_previous_month(this_month)?;
            Ok(DateInterval {
                start: at_midnight(previous_month),
                end: at_midnight(this_month) - Duration::NANOSECOND,
            })
        }
        RangeMode::YearToDate => Ok(DateInterval {
            start: at_midnight(this_year),
            end: now,
        }),
        RangeMode::PreviousYear => {
            let previous_year = Date::from_calendar_date(now.year() - 1, Month::January, 1)?;
            Ok(DateInterval {
                start: at_midnight(previous_year),
                end: at_midnight(this_year) - Duration::MILLISECOND,
            })
        }
        RangeMode::Custom => {
            let interval = custom.ok_or(RangeError::MissingCustomBounds)?;
            DateInterval::new(interval.start, interval.end)
        }
    }
}

fn first_of_next_month(first: Date) -> Result<Date, ComponentRange> {
    match first.month() {
        Month::December => Date::from_calendar_date(first.year() + 1, Month::January, 1),
        month => Date::from_calendar_date(first.year(), month.next(), 1),
    }
}

fn first_of_previous_month(first: Date) -> Result<Date, ComponentRange> {
    match first.month() {
        Month::January => Date::from_calendar_date(first.year() - 1, Month::December, 1),
        month => Date::from_calendar_date(first.year(), month.previous(), 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn current_month_covers_the_whole_last_day() {
        let interval = resolve(
            RangeMode::CurrentMonth,
            datetime!(2024-02-10 15:00 UTC),
            None,
        )
        .unwrap();
        assert_eq!(interval.start, datetime!(2024-02-01 00:00 UTC));
        assert_eq!(interval.end, datetime!(2024-02-29 23:59:59.999_999_999 UTC));
        assert!(interval.contains(datetime!(2024-02-29 21:00 UTC)));
        assert!(!interval.contains(datetime!(2024-03-01 00:00 UTC)));
    }

    #[test]
    fn previous_month_wraps_into_previous_year() {
        let interval = resolve(
            RangeMode::PreviousMonth,
            datetime!(2025-01-05 08:00 UTC),
            None,
        )
        .unwrap();
        assert_eq!(interval.start, datetime!(2024-12-01 00:00 UTC));
        assert_eq!(interval.end, datetime!(2024-12-31 23:59:59.999_999_999 UTC));
    }

    #[test]
    fn year_to_date_ends_now() {
        let now = datetime!(2025-06-15 12:30 +02:00);
        let interval = resolve(RangeMode::YearToDate, now, None).unwrap();
        assert_eq!(interval.start, datetime!(2025-01-01 00:00 +02:00));
        assert_eq!(interval.end, now);
    }

    #[test]
    fn previous_year_ends_on_last_millisecond() {
        let interval = resolve(
            RangeMode::PreviousYear,
            datetime!(2025-06-15 12:30 UTC),
            None,
        )
        .unwrap();
        assert_eq!(interval.start, datetime!(2024-01-01 00:00 UTC));
        assert_eq!(interval.end, datetime!(2024-12-31 23:59:59.999 UTC));
    }

    #[test]
    fn calendar_boundaries_follow_the_offset_of_now() {
        let interval = resolve(
            RangeMode::CurrentMonth,
            datetime!(2025-03-01 00:30 -05:00),
            None,
        )
        .unwrap();
        assert_eq!(interval.start, datetime!(2025-03-01 00:00 -05:00));
    }

    #[test]
    fn custom_requires_ordered_bounds() {
        let now = datetime!(2025-06-15 12:30 UTC);
        assert_eq!(
            resolve(RangeMode::Custom, now, None),
            Err(RangeError::MissingCustomBounds)
        );

        let inverted = DateInterval {
            start: datetime!(2025-06-02 00:00 UTC),
            end: datetime!(2025-06-01 00:00 UTC),
        };
        assert!(matches!(
            resolve(RangeMode::Custom, now, Some(inverted)),
            Err(RangeError::Inverted { .. })
        ));

        let ok = DateInterval::new(
            datetime!(2025-06-01 00:00 UTC),
            datetime!(2025-06-01 00:00 UTC),
        )
        .unwrap();
        assert_eq!(resolve(RangeMode::Custom, now, Some(ok)), Ok(ok));
    }
}
