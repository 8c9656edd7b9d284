//! Raw storage rows and the sources that produce them.
//!
//! A [`RawRow`] mirrors one record of the event/recurrence join, with the
//! columns in their fixed order. Rows are pulled one at a time through
//! [`RowSource`]; they must arrive sorted by event id.

use crate::error::SourceError;
use crate::timezone::FLOATING;

/// One relational record of the event/recurrence join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// Identifier of the calendar holding the event.
    pub calendar_id: String,
    /// The event title; `None` marks a malformed row.
    pub title: Option<String>,
    /// Start instant in microseconds since the Unix epoch.
    pub start: i64,
    /// End instant in microseconds since the Unix epoch.
    pub end: i64,
    /// One recurrence payload line (`RRULE:…`, `EXDATE:…`, …).
    pub recurrence_payload: Option<String>,
    /// The event id rows are grouped by.
    pub event_id: String,
    /// The item flags bitmask.
    pub flags: i64,
    /// Zone name of the start instant.
    pub start_tz: String,
    /// Zone name of the end instant.
    pub end_tz: String,
    /// Present when the row overrides one occurrence of a series (micro-epoch).
    pub recurrence_id: Option<i64>,
    /// Modification stamp (micro-epoch).
    pub stamp: Option<i64>,
}

impl RawRow {
    /// Creates a floating, untimed row for an event in a calendar.
    pub fn new(calendar_id: impl Into<String>, event_id: impl Into<String>) -> Self {
        Self {
            calendar_id: calendar_id.into(),
            title: None,
            start: 0,
            end: 0,
            recurrence_payload: None,
            event_id: event_id.into(),
            flags: 0,
            start_tz: FLOATING.to_string(),
            end_tz: FLOATING.to_string(),
            recurrence_id: None,
            stamp: None,
        }
    }

    /// Builder method to set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Builder method to set start and end (micro-epoch).
    pub fn with_times(mut self, start: i64, end: i64) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    /// Builder method to set the recurrence payload line.
    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.recurrence_payload = Some(payload.into());
        self
    }

    /// Builder method to set the flags bitmask.
    pub fn with_flags(mut self, flags: i64) -> Self {
        self.flags = flags;
        self
    }

    /// Builder method to set both zone names.
    pub fn with_zones(mut self, start_tz: impl Into<String>, end_tz: impl Into<String>) -> Self {
        self.start_tz = start_tz.into();
        self.end_tz = end_tz.into();
        self
    }

    /// Builder method to set the recurrence-instance marker (micro-epoch).
    pub fn with_recurrence_id(mut self, recurrence_id: i64) -> Self {
        self.recurrence_id = Some(recurrence_id);
        self
    }

    /// Builder method to set the stamp (micro-epoch).
    pub fn with_stamp(mut self, stamp: i64) -> Self {
        self.stamp = Some(stamp);
        self
    }
}

/// A forward-only cursor over rows sorted by event id.
pub trait RowSource {
    /// Returns the next row, or `None` once the cursor is exhausted.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] if the backing store fails.
    fn next_row(&mut self) -> Result<Option<RawRow>, SourceError>;
}

impl<S: RowSource + ?Sized> RowSource for Box<S> {
    fn next_row(&mut self) -> Result<Option<RawRow>, SourceError> {
        (**self).next_row()
    }
}

impl<S: RowSource + ?Sized> RowSource for &mut S {
    fn next_row(&mut self) -> Result<Option<RawRow>, SourceError> {
        (**self).next_row()
    }
}

/// A row source over rows already held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryRowSource {
    rows: std::vec::IntoIter<RawRow>,
}

impl MemoryRowSource {
    /// Creates a source yielding `rows` in order.
    pub fn new(rows: Vec<RawRow>) -> Self {
        Self {
            rows: rows.into_iter(),
        }
    }

    /// Returns the number of rows not yet pulled.
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

impl From<Vec<RawRow>> for MemoryRowSource {
    fn from(rows: Vec<RawRow>) -> Self {
        Self::new(rows)
    }
}

impl RowSource for MemoryRowSource {
    fn next_row(&mut self) -> Result<Option<RawRow>, SourceError> {
        Ok(self.rows.next())
    }
}
