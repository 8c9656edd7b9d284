//! Text and JSON rendering of month layouts.

use std::fmt::Write as _;

use calgrid_core::{Calendar, DayLayout, Diagnostic, LaneCell, MonthLayout, OccurrenceExpander};
use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// The laid-out days of one month.
#[derive(Debug, Clone)]
pub struct MonthGrid {
    /// First day of the month.
    pub first: NaiveDate,
    /// One entry per day of the month.
    pub days: Vec<DayLayout>,
}

impl MonthGrid {
    /// Lays out the month starting at `first`.
    pub fn build<E>(calendar: &Calendar, expander: &E, first: NaiveDate) -> Self
    where
        E: OccurrenceExpander + ?Sized,
    {
        Self {
            first,
            days: MonthLayout::new(calendar, expander, first).collect(),
        }
    }

    /// Lays out `count` consecutive months starting at the month of `start`.
    pub fn consecutive<E>(calendar: &Calendar, expander: &E, start: NaiveDate, count: u32) -> Vec<Self>
    where
        E: OccurrenceExpander + ?Sized,
    {
        let Some(first) = start.with_day(1) else {
            return Vec::new();
        };
        (0..count)
            .map_while(|offset| first.checked_add_months(Months::new(offset)))
            .map(|month| Self::build(calendar, expander, month))
            .collect()
    }

    /// Returns the month title, e.g. `JANUARY 2024`.
    pub fn title(&self) -> String {
        self.first.format("%B %Y").to_string().to_uppercase()
    }
}

/// Renders month grids as plain text.
///
/// Each day is one line: the day, its all-day lanes, then its timed
/// occurrences. Week rows are separated by a blank line.
pub fn render_text(months: &[MonthGrid], filler: &str) -> String {
    let mut out = String::new();
    for (index, month) in months.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "{}", month.title());

        let mut week_row = None;
        for day in &month.days {
            if week_row != Some(day.week_row) {
                out.push('\n');
                week_row = Some(day.week_row);
            }
            let mut cells = vec![day.date.format("%a %d").to_string()];
            cells.extend(day.lanes.iter().map(|lane| lane.label_with(filler)));
            cells.extend(day.timed_labels());
            let _ = writeln!(out, "{}", cells.join(" | "));
        }
    }
    out
}

/// JSON output format for machine consumption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonOutput {
    /// Laid-out months.
    pub months: Vec<JsonMonth>,
    /// Recoverable issues met while reading the calendar.
    pub diagnostics: Vec<JsonDiagnostic>,
}

/// One month in JSON format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonMonth {
    pub year: i32,
    pub month: u32,
    pub days: Vec<JsonDay>,
}

/// One day in JSON format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonDay {
    /// Date as `YYYY-MM-DD`.
    pub date: String,
    pub week_row: usize,
    /// All-day lanes, top to bottom; `null` is an empty lane.
    pub lanes: Vec<Option<JsonLane>>,
    pub timed: Vec<JsonTimed>,
}

/// An occupied lane.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonLane {
    pub uid: String,
    pub title: String,
    pub continues_left: bool,
    pub continues_right: bool,
}

/// A timed occurrence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonTimed {
    pub uid: String,
    pub title: String,
    /// Wall-clock start in ISO 8601 format, without offset.
    pub start: String,
    /// Wall-clock end in ISO 8601 format, without offset.
    pub end: String,
}

/// A diagnostic in JSON format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonDiagnostic {
    pub kind: String,
    pub event_id: String,
    pub message: String,
}

impl JsonOutput {
    /// Builds the JSON view of `months` and `diagnostics`.
    pub fn new(months: &[MonthGrid], diagnostics: &[Diagnostic]) -> Self {
        Self {
            months: months.iter().map(JsonMonth::from).collect(),
            diagnostics: diagnostics.iter().map(JsonDiagnostic::from).collect(),
        }
    }
}

impl From<&MonthGrid> for JsonMonth {
    fn from(grid: &MonthGrid) -> Self {
        Self {
            year: grid.first.year(),
            month: grid.first.month(),
            days: grid.days.iter().map(JsonDay::from).collect(),
        }
    }
}

impl From<&DayLayout> for JsonDay {
    fn from(day: &DayLayout) -> Self {
        Self {
            date: day.date.format("%Y-%m-%d").to_string(),
            week_row: day.week_row,
            lanes: day.lanes.iter().map(json_lane).collect(),
            timed: day
                .timed
                .iter()
                .map(|occ| JsonTimed {
                    uid: occ.uid().to_string(),
                    title: occ.title().to_string(),
                    start: occ.period.start.format("%Y-%m-%dT%H:%M:%S").to_string(),
                    end: occ.period.end.format("%Y-%m-%dT%H:%M:%S").to_string(),
                })
                .collect(),
        }
    }
}

fn json_lane(cell: &LaneCell) -> Option<JsonLane> {
    match cell {
        LaneCell::Filler => None,
        LaneCell::Event {
            occurrence,
            continues_left,
            continues_right,
        } => Some(JsonLane {
            uid: occurrence.uid().to_string(),
            title: occurrence.title().to_string(),
            continues_left: *continues_left,
            continues_right: *continues_right,
        }),
    }
}

impl From<&Diagnostic> for JsonDiagnostic {
    fn from(diagnostic: &Diagnostic) -> Self {
        Self {
            kind: diagnostic.as_str().to_string(),
            event_id: diagnostic.event_id().to_string(),
            message: diagnostic.to_string(),
        }
    }
}
