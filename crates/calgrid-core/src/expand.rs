//! Occurrence expansion.
//!
//! An [`OccurrenceExpander`] turns one [`CalendarEvent`] into the concrete
//! [`Occurrence`]s overlapping a window. [`RRuleExpander`] is the default
//! implementation, backed by the `rrule` crate.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rrule::{RRule, RRuleSet, Tz, Unvalidated};
use tracing::warn;

use crate::event::CalendarEvent;
use crate::time::{Period, TimeWindow};

/// One concrete instance of an event.
#[derive(Debug, Clone)]
pub struct Occurrence {
    /// The event this occurrence was expanded from.
    pub event: Arc<CalendarEvent>,
    /// When this occurrence takes place.
    pub period: Period,
}

impl Occurrence {
    /// Creates an occurrence of `event` over `period`.
    pub fn new(event: Arc<CalendarEvent>, period: Period) -> Self {
        Self { event, period }
    }

    /// Returns the uid of the source event.
    pub fn uid(&self) -> &str {
        &self.event.uid
    }

    /// Returns the title of the source event.
    pub fn title(&self) -> &str {
        &self.event.title
    }

    /// Returns true if the source event is an all-day event.
    pub fn is_all_day(&self) -> bool {
        self.event.all_day
    }

    /// Returns true if this occurrence started on a day before `day`.
    pub fn starts_before(&self, day: NaiveDate) -> bool {
        self.period.starts_before(day)
    }

    /// Returns true if this occurrence runs past the end of `day`.
    pub fn ends_after(&self, day: NaiveDate) -> bool {
        self.period.ends_after(day)
    }
}

/// Expands events into occurrences.
pub trait OccurrenceExpander {
    /// Returns the occurrences of `event` overlapping `window`, honoring its
    /// recurrence rules and exception days.
    fn expand(&self, event: &Arc<CalendarEvent>, window: &TimeWindow) -> Vec<Occurrence>;
}

/// Default cap on the number of series starts computed per expansion.
pub const DEFAULT_OCCURRENCE_LIMIT: u16 = u16::MAX;

/// Expands recurrence rules with `rrule`.
///
/// Wall-clock values are handed to `rrule` as UTC, so expansion never shifts
/// an occurrence across a daylight saving change. Override events and events
/// without rules yield their base period only.
#[derive(Debug, Clone, Copy)]
pub struct RRuleExpander {
    limit: u16,
}

impl Default for RRuleExpander {
    fn default() -> Self {
        Self {
            limit: DEFAULT_OCCURRENCE_LIMIT,
        }
    }
}

impl RRuleExpander {
    /// Creates an expander with the default limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set the maximum number of starts computed per expansion.
    pub fn with_limit(mut self, limit: u16) -> Self {
        self.limit = limit;
        self
    }

    /// Computes series starts that may overlap `window`.
    fn series_starts(
        &self,
        event: &CalendarEvent,
        window: &TimeWindow,
    ) -> Result<Vec<NaiveDateTime>, String> {
        let dt_start = as_rrule_time(event.start);
        let mut set = RRuleSet::new(dt_start);
        for rule in &event.recurrence_rules {
            let rule = wall_clock_until(rule.clone())
                .validate(dt_start)
                .map_err(|e| e.to_string())?;
            set = set.rrule(rule);
        }

        let lookback = event.period().duration() + Duration::seconds(1);
        let set = set
            .after(as_rrule_time(window.start - lookback))
            .before(as_rrule_time(window.end + Duration::seconds(1)));

        Ok(set
            .all(self.limit)
            .dates
            .into_iter()
            .map(|dt| dt.naive_local())
            .collect())
    }
}

impl OccurrenceExpander for RRuleExpander {
    fn expand(&self, event: &Arc<CalendarEvent>, window: &TimeWindow) -> Vec<Occurrence> {
        let base = event.period();
        if !event.is_recurring() || event.is_override() {
            return single(event, base, window);
        }

        let starts = match self.series_starts(event, window) {
            Ok(starts) => starts,
            Err(reason) => {
                warn!(uid = %event.uid, title = %event.title, %reason, "Invalid recurrence, using base period");
                return single(event, base, window);
            }
        };

        let duration = base.duration();
        starts
            .into_iter()
            .filter(|start| !event.is_excluded(*start))
            .map(|start| Period::new(start, start + duration))
            .filter(|period| period.overlaps(window))
            .map(|period| Occurrence::new(Arc::clone(event), period))
            .collect()
    }
}

fn single(event: &Arc<CalendarEvent>, period: Period, window: &TimeWindow) -> Vec<Occurrence> {
    if period.overlaps(window) {
        vec![Occurrence::new(Arc::clone(event), period)]
    } else {
        Vec::new()
    }
}

/// Moves a non-UTC `UNTIL` onto the UTC wall-clock the series starts on.
fn wall_clock_until(rule: RRule<Unvalidated>) -> RRule<Unvalidated> {
    match rule.get_until() {
        Some(until) if until.timezone() != Tz::UTC => {
            let until = as_rrule_time(until.naive_local());
            rule.until(until)
        }
        _ => rule,
    }
}

fn as_rrule_time(dt: NaiveDateTime) -> chrono::DateTime<Tz> {
    dt.and_utc().with_timezone(&Tz::Tz(chrono_tz::UTC))
}
