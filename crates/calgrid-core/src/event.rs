//! Event types assembled from calendar storage rows.
//!
//! This module provides the core types for representing calendar events:
//! - [`CalendarEvent`]: one event series, or one override of a series occurrence
//! - [`ExceptionPeriod`]: a day excluded from a series' expansion
//! - [`ItemFlags`]: the storage flags bitmask
//! - [`CalendarNames`]: the calendar id to display name mapping

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use rrule::{RRule, Unvalidated};
use serde::{Deserialize, Serialize};

use crate::time::{Period, start_of_day};

/// The flags bitmask stored with every item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ItemFlags(u32);

impl ItemFlags {
    pub const PRIVATE: Self = Self(1);
    pub const HAS_ATTENDEES: Self = Self(2);
    pub const HAS_PROPERTIES: Self = Self(4);
    pub const ALL_DAY: Self = Self(8);
    pub const HAS_RECURRENCE: Self = Self(16);
    pub const HAS_EXCEPTIONS: Self = Self(32);
    pub const HAS_ATTACHMENTS: Self = Self(64);
    pub const HAS_RELATIONS: Self = Self(128);
    pub const HAS_ALARMS: Self = Self(256);
    pub const RECURRENCE_ID_ALL_DAY: Self = Self(512);

    /// Builds flags from the raw storage column.
    ///
    /// Bits above the 32-bit range carry no meaning and are dropped.
    pub fn from_bits(bits: i64) -> Self {
        Self((bits & i64::from(u32::MAX)) as u32)
    }

    /// Returns the raw bits.
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Returns true if every bit of `other` is set.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

/// A day excluded from a recurring series.
///
/// Exclusions are day-granular: any occurrence starting on `date` is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExceptionPeriod {
    /// The excluded day.
    pub date: NaiveDate,
}

impl ExceptionPeriod {
    /// Creates an exclusion for `date`.
    pub fn new(date: NaiveDate) -> Self {
        Self { date }
    }

    /// Returns the whole-day period this exclusion covers.
    pub fn period(&self) -> Period {
        let start = start_of_day(self.date);
        Period::new(start, start + Duration::days(1))
    }

    /// Returns true if an occurrence starting at `start` is excluded.
    pub fn covers(&self, start: NaiveDateTime) -> bool {
        start.date() == self.date
    }
}

/// A calendar event assembled from one group of storage rows.
///
/// Start and end are wall-clock values, already adjusted to the zone the event
/// was written in. An event with a `recurrence_id` is an override: it replaces
/// the occurrence of the series sharing its `uid` that starts at that time.
#[derive(Debug, Clone)]
pub struct CalendarEvent {
    /// Unique identifier of the event (shared by a series and its overrides).
    pub uid: String,
    /// The event title.
    pub title: String,
    /// Display name of the calendar the event belongs to (empty if unknown).
    pub calendar_name: String,
    /// When the event starts.
    pub start: NaiveDateTime,
    /// When the event ends (exclusive).
    pub end: NaiveDateTime,
    /// Whether this is an all-day event.
    pub all_day: bool,
    /// Recurrence rules, in the order they were stored.
    pub recurrence_rules: Vec<RRule<Unvalidated>>,
    /// Excluded days, in the order they were stored.
    pub exception_dates: Vec<ExceptionPeriod>,
    /// Start of the series occurrence this event overrides.
    pub recurrence_id: Option<NaiveDateTime>,
    /// Last modification stamp.
    pub stamp: Option<DateTime<Utc>>,
}

impl CalendarEvent {
    /// Creates a new event with required fields.
    pub fn new(
        uid: impl Into<String>,
        title: impl Into<String>,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Self {
        Self {
            uid: uid.into(),
            title: title.into(),
            calendar_name: String::new(),
            start,
            end,
            all_day: false,
            recurrence_rules: Vec::new(),
            exception_dates: Vec::new(),
            recurrence_id: None,
            stamp: None,
        }
    }

    /// Returns the base period of the event.
    pub fn period(&self) -> Period {
        Period::new(self.start, self.end)
    }

    /// Returns true if the event carries at least one recurrence rule.
    pub fn is_recurring(&self) -> bool {
        !self.recurrence_rules.is_empty()
    }

    /// Returns true if this event overrides one occurrence of a series.
    pub fn is_override(&self) -> bool {
        self.recurrence_id.is_some()
    }

    /// Returns true if an occurrence starting at `start` falls on an excluded day.
    pub fn is_excluded(&self, start: NaiveDateTime) -> bool {
        self.exception_dates.iter().any(|ex| ex.covers(start))
    }

    /// Builder method to set the calendar display name.
    pub fn with_calendar_name(mut self, name: impl Into<String>) -> Self {
        self.calendar_name = name.into();
        self
    }

    /// Builder method to mark as all-day.
    pub fn with_all_day(mut self, all_day: bool) -> Self {
        self.all_day = all_day;
        self
    }

    /// Builder method to add a recurrence rule.
    pub fn with_rule(mut self, rule: RRule<Unvalidated>) -> Self {
        self.recurrence_rules.push(rule);
        self
    }

    /// Builder method to add an excluded day.
    pub fn with_exception(mut self, date: NaiveDate) -> Self {
        self.exception_dates.push(ExceptionPeriod::new(date));
        self
    }

    /// Builder method to mark as an override of the occurrence at `recurrence_id`.
    pub fn with_recurrence_id(mut self, recurrence_id: NaiveDateTime) -> Self {
        self.recurrence_id = Some(recurrence_id);
        self
    }

    /// Builder method to set the modification stamp.
    pub fn with_stamp(mut self, stamp: DateTime<Utc>) -> Self {
        self.stamp = Some(stamp);
        self
    }
}

impl fmt::Display for CalendarEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title, self.uid)
    }
}

/// Maps calendar ids to their display names.
///
/// Ids are compared case-insensitively. The mapping is read-only once the
/// assembler owns it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalendarNames {
    names: HashMap<String, String>,
}

impl CalendarNames {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the name of a calendar.
    pub fn insert(&mut self, id: &str, name: impl Into<String>) {
        self.names.insert(id.to_lowercase(), name.into());
    }

    /// Returns the display name of a calendar.
    pub fn get(&self, id: &str) -> Option<&str> {
        self.names.get(&id.to_lowercase()).map(String::as_str)
    }

    /// Returns the number of known calendars.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if no calendar is known.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for CalendarNames {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut names = Self::new();
        for (id, name) in iter {
            names.insert(id.as_ref(), name);
        }
        names
    }
}
