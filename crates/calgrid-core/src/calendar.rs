//! A collection of assembled events.
//!
//! [`Calendar`] keeps series and override events apart so that an override
//! replaces the series occurrence it was written for.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::assembler::Assembled;
use crate::error::{AssembleResult, Diagnostic};
use crate::event::CalendarEvent;
use crate::expand::{Occurrence, OccurrenceExpander};
use crate::time::TimeWindow;

/// All events of one or more calendars.
#[derive(Debug, Clone, Default)]
pub struct Calendar {
    series: Vec<Arc<CalendarEvent>>,
    overrides: HashMap<(String, NaiveDateTime), Arc<CalendarEvent>>,
}

impl Calendar {
    /// Creates an empty calendar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a calendar from an assembler's output.
    ///
    /// Returns the calendar together with every diagnostic reported on the way.
    ///
    /// # Errors
    ///
    /// Returns the first fatal assembly error.
    pub fn from_assembled<I>(assembled: I) -> AssembleResult<(Self, Vec<Diagnostic>)>
    where
        I: IntoIterator<Item = AssembleResult<Assembled>>,
    {
        let mut calendar = Self::new();
        let mut diagnostics = Vec::new();
        for item in assembled {
            let Assembled {
                event,
                diagnostics: mut found,
            } = item?;
            diagnostics.append(&mut found);
            calendar.add(event);
        }
        debug!(
            events = calendar.len(),
            diagnostics = diagnostics.len(),
            "Loaded calendar"
        );
        Ok((calendar, diagnostics))
    }

    /// Adds an event. Overrides replace an earlier override of the same
    /// occurrence.
    pub fn add(&mut self, event: CalendarEvent) {
        match event.recurrence_id {
            Some(recurrence_id) => {
                self.overrides
                    .insert((event.uid.clone(), recurrence_id), Arc::new(event));
            }
            None => self.series.push(Arc::new(event)),
        }
    }

    /// Returns the number of events, overrides included.
    pub fn len(&self) -> usize {
        self.series.len() + self.overrides.len()
    }

    /// Returns true if the calendar holds no events.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over all events, series first.
    pub fn events(&self) -> impl Iterator<Item = &Arc<CalendarEvent>> {
        self.series.iter().chain(self.overrides.values())
    }

    /// Returns every occurrence overlapping `window`, in no particular order.
    ///
    /// Series occurrences that have an override are replaced by the override.
    pub fn occurrences<E>(&self, window: &TimeWindow, expander: &E) -> Vec<Occurrence>
    where
        E: OccurrenceExpander + ?Sized,
    {
        let mut found: Vec<Occurrence> = self
            .series
            .iter()
            .flat_map(|event| expander.expand(event, window))
            .filter(|occurrence| !self.is_overridden(occurrence))
            .collect();
        found.extend(
            self.overrides
                .values()
                .flat_map(|event| expander.expand(event, window)),
        );
        found
    }

    /// Returns the occurrences of one day in display order.
    pub fn day_occurrences<E>(&self, date: NaiveDate, expander: &E) -> Vec<Occurrence>
    where
        E: OccurrenceExpander + ?Sized,
    {
        let mut found = self.occurrences(&TimeWindow::for_date(date), expander);
        sort_for_day(&mut found);
        found
    }

    fn is_overridden(&self, occurrence: &Occurrence) -> bool {
        !self.overrides.is_empty()
            && self
                .overrides
                .contains_key(&(occurrence.uid().to_string(), occurrence.period.start))
    }
}

impl FromIterator<CalendarEvent> for Calendar {
    fn from_iter<I: IntoIterator<Item = CalendarEvent>>(iter: I) -> Self {
        let mut calendar = Self::new();
        for event in iter {
            calendar.add(event);
        }
        calendar
    }
}

/// Sorts one day's occurrences for display: all-day first, then by start,
/// then by title (ordinal comparison).
pub fn sort_for_day(occurrences: &mut [Occurrence]) {
    occurrences.sort_by(|a, b| {
        b.is_all_day()
            .cmp(&a.is_all_day())
            .then_with(|| a.period.start.cmp(&b.period.start))
            .then_with(|| a.title().cmp(b.title()))
    });
}
