//! Time types for stored calendar values.
//!
//! Calendar storage keeps instants as microseconds since the Unix epoch.
//! [`from_micro_epoch`] turns those into UTC instants. Once an instant has been
//! zone-adjusted it becomes a wall-clock value, and every later stage works on
//! wall-clock values: [`Period`] for the span of an occurrence and
//! [`TimeWindow`] for query ranges.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Converts a micro-epoch storage value into a UTC instant.
///
/// The value is truncated to whole seconds. Returns `None` when the value is
/// outside the range chrono can represent.
pub fn from_micro_epoch(micros: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(micros / 1_000_000, 0)
}

/// Returns midnight at the start of `date`.
pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// The wall-clock span of an event or occurrence.
///
/// `end` is exclusive: a one-day all-day event runs from midnight to the
/// following midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period {
    /// Start of the period (inclusive).
    pub start: NaiveDateTime,
    /// End of the period (exclusive).
    pub end: NaiveDateTime,
}

impl Period {
    /// Creates a new period.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Returns the length of this period.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Returns true if the period is longer than a single day.
    pub fn spans_multiple_days(&self) -> bool {
        self.duration() > Duration::days(1)
    }

    /// Returns true if the period started on a day before `day`.
    pub fn starts_before(&self, day: NaiveDate) -> bool {
        self.start.date() < day
    }

    /// Returns true if the period runs past the end of `day`.
    pub fn ends_after(&self, day: NaiveDate) -> bool {
        day.succ_opt()
            .is_some_and(|next| self.end > start_of_day(next))
    }

    /// Checks if this period overlaps a window.
    ///
    /// A period overlaps when it starts no later than the window ends and ends
    /// after the window starts. Zero-length periods count when their start lies
    /// inside the window.
    pub fn overlaps(&self, window: &TimeWindow) -> bool {
        self.start <= window.end && (self.end > window.start || self.start >= window.start)
    }
}

/// A closed wall-clock window `[start, end]` used to query occurrences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Start of the window (inclusive).
    pub start: NaiveDateTime,
    /// End of the window (inclusive).
    pub end: NaiveDateTime,
}

impl TimeWindow {
    /// Creates a new time window.
    ///
    /// # Panics
    ///
    /// Panics if `start` is after `end`.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        assert!(start <= end, "TimeWindow start must be <= end");
        Self { start, end }
    }

    /// Creates the window covering one calendar day, from midnight up to the
    /// last second before the next midnight.
    pub fn for_date(date: NaiveDate) -> Self {
        let start = start_of_day(date);
        Self {
            start,
            end: start + Duration::days(1) - Duration::seconds(1),
        }
    }

    /// Returns the duration of this window.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Checks if a wall-clock value falls within this window.
    pub fn contains(&self, dt: NaiveDateTime) -> bool {
        self.start <= dt && dt <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    mod micro_epoch {
        use super::*;

        #[test]
        fn truncates_to_seconds() {
            // 2024-01-02T03:04:05.999999Z
            let instant = from_micro_epoch(1_704_164_645_999_999).unwrap();
            assert_eq!(instant.naive_utc(), dt(2024, 1, 2, 3, 4) + Duration::seconds(5));
        }

        #[test]
        fn epoch_origin() {
            let instant = from_micro_epoch(0).unwrap();
            assert_eq!(instant, DateTime::<Utc>::UNIX_EPOCH);
        }

        #[test]
        fn out_of_range() {
            assert!(from_micro_epoch(i64::MAX).is_none());
        }
    }

    mod period {
        use super::*;

        #[test]
        fn multi_day_detection() {
            let one_day = Period::new(dt(2024, 1, 1, 0, 0), dt(2024, 1, 2, 0, 0));
            assert!(!one_day.spans_multiple_days());

            let three_days = Period::new(dt(2024, 1, 1, 0, 0), dt(2024, 1, 4, 0, 0));
            assert!(three_days.spans_multiple_days());
        }

        #[test]
        fn continuation_relative_to_day() {
            let period = Period::new(dt(2024, 1, 1, 0, 0), dt(2024, 1, 4, 0, 0));

            assert!(!period.starts_before(date(2024, 1, 1)));
            assert!(period.ends_after(date(2024, 1, 1)));

            assert!(period.starts_before(date(2024, 1, 2)));
            assert!(period.ends_after(date(2024, 1, 2)));

            // Exclusive end: the last covered day is the 3rd
            assert!(period.starts_before(date(2024, 1, 3)));
            assert!(!period.ends_after(date(2024, 1, 3)));
        }

        #[test]
        fn overlaps_day_window() {
            let window = TimeWindow::for_date(date(2024, 1, 2));

            // All-day event on the previous day ends exactly at midnight
            let previous = Period::new(dt(2024, 1, 1, 0, 0), dt(2024, 1, 2, 0, 0));
            assert!(!previous.overlaps(&window));

            // All-day event on the day itself
            let same = Period::new(dt(2024, 1, 2, 0, 0), dt(2024, 1, 3, 0, 0));
            assert!(same.overlaps(&window));

            // Starts the next midnight
            let next = Period::new(dt(2024, 1, 3, 0, 0), dt(2024, 1, 4, 0, 0));
            assert!(!next.overlaps(&window));

            // Spans the whole window
            let long = Period::new(dt(2023, 12, 30, 0, 0), dt(2024, 1, 5, 0, 0));
            assert!(long.overlaps(&window));
        }

        #[test]
        fn zero_length_overlap() {
            let window = TimeWindow::for_date(date(2024, 1, 2));
            let reminder = Period::new(dt(2024, 1, 2, 9, 0), dt(2024, 1, 2, 9, 0));
            assert!(reminder.overlaps(&window));

            let midnight = Period::new(dt(2024, 1, 2, 0, 0), dt(2024, 1, 2, 0, 0));
            assert!(midnight.overlaps(&window));

            let before = Period::new(dt(2024, 1, 1, 23, 0), dt(2024, 1, 1, 23, 0));
            assert!(!before.overlaps(&window));
        }
    }

    mod time_window {
        use super::*;

        #[test]
        fn for_date_bounds() {
            let window = TimeWindow::for_date(date(2024, 2, 29));
            assert_eq!(window.start, dt(2024, 2, 29, 0, 0));
            assert_eq!(window.end, dt(2024, 2, 29, 23, 59) + Duration::seconds(59));
            assert!(window.contains(dt(2024, 2, 29, 12, 0)));
            assert!(!window.contains(dt(2024, 3, 1, 0, 0)));
        }

        #[test]
        #[should_panic(expected = "start must be <= end")]
        fn invalid_window() {
            TimeWindow::new(dt(2024, 1, 2, 0, 0), dt(2024, 1, 1, 0, 0));
        }
    }
}
