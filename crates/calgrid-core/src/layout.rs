//! Lane layout for a month grid.
//!
//! A month is drawn as week rows of seven days. All-day and multi-day events
//! are drawn as horizontal bars at the top of each day cell; to keep a bar
//! continuous, an event must stay in the same vertical slot (lane) on every
//! day of the week row it spans. [`LaneAssignment`] keeps that state while a
//! day cursor advances; [`MonthLayout`] drives it over a month.
//!
//! Lanes never carry over from one week row to the next.

use chrono::{Datelike, NaiveDate, Weekday};

use crate::calendar::Calendar;
use crate::expand::{Occurrence, OccurrenceExpander};

/// Label of an empty lane.
pub const FILLER: &str = "-";

/// Mark drawn before the title of an occurrence that started on an earlier day.
pub const LEFT_CONTINUATION: &str = "< ";

/// Mark drawn after the title of an occurrence that goes on after this day.
pub const RIGHT_CONTINUATION: &str = " >";

/// Calendar whose timed items are drawn with their start time only.
pub const TASKS_CALENDAR: &str = "Tasks";

/// The content of one lane on one day.
#[derive(Debug, Clone)]
pub enum LaneCell {
    /// Placeholder keeping the lanes below it in place.
    Filler,
    /// An occurrence occupying the lane.
    Event {
        occurrence: Occurrence,
        continues_left: bool,
        continues_right: bool,
    },
}

impl LaneCell {
    /// Builds the cell of `occurrence` as seen on `day`.
    ///
    /// Continuation marks only apply to occurrences longer than one day.
    pub fn for_day(occurrence: Occurrence, day: NaiveDate) -> Self {
        let multi_day = occurrence.period.spans_multiple_days();
        Self::Event {
            continues_left: multi_day && occurrence.starts_before(day),
            continues_right: multi_day && occurrence.ends_after(day),
            occurrence,
        }
    }

    /// Returns true if this lane is empty.
    pub fn is_filler(&self) -> bool {
        matches!(self, Self::Filler)
    }

    /// Returns the occurrence in this lane, if any.
    pub fn occurrence(&self) -> Option<&Occurrence> {
        match self {
            Self::Filler => None,
            Self::Event { occurrence, .. } => Some(occurrence),
        }
    }

    /// Renders the lane as text.
    pub fn label(&self) -> String {
        self.label_with(FILLER)
    }

    /// Renders the lane as text, using `filler` for empty lanes.
    pub fn label_with(&self, filler: &str) -> String {
        match self {
            Self::Filler => filler.to_string(),
            Self::Event {
                occurrence,
                continues_left,
                continues_right,
            } => {
                let left = if *continues_left { LEFT_CONTINUATION } else { "" };
                let right = if *continues_right { RIGHT_CONTINUATION } else { "" };
                format!("{left}{}{right}", occurrence.title())
            }
        }
    }
}

/// Persistent lane slots of one week row.
#[derive(Debug, Clone, Default)]
pub struct LaneAssignment {
    lanes: Vec<Option<Occurrence>>,
}

impl LaneAssignment {
    /// Creates an empty assignment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every lane, as at the start of a week row.
    pub fn reset(&mut self) {
        self.lanes.clear();
    }

    /// Returns the number of lanes, empty ones included.
    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    /// Returns true if there are no lanes.
    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// Returns the lane occupied by the event with `uid`.
    pub fn lane_of(&self, uid: &str) -> Option<usize> {
        self.lanes
            .iter()
            .position(|lane| lane.as_ref().is_some_and(|occ| occ.uid() == uid))
    }

    /// Moves the cursor to `day`, given the all-day occurrences active on it
    /// in display order, and returns the day's lanes top to bottom.
    ///
    /// Events no longer active vacate their lane; trailing empty lanes are
    /// dropped while inner ones stay as fillers. Events already placed keep
    /// their lane, new ones take the lowest empty lane or a new one.
    pub fn advance(&mut self, day: NaiveDate, active: &[Occurrence]) -> Vec<LaneCell> {
        for lane in &mut self.lanes {
            let gone = lane
                .as_ref()
                .is_some_and(|occ| !active.iter().any(|a| a.uid() == occ.uid()));
            if gone {
                *lane = None;
            }
        }

        while matches!(self.lanes.last(), Some(None)) {
            self.lanes.pop();
        }

        for occurrence in active {
            if let Some(index) = self.lane_of(occurrence.uid()) {
                self.lanes[index] = Some(occurrence.clone());
                continue;
            }
            match self.lanes.iter().position(Option::is_none) {
                Some(index) => self.lanes[index] = Some(occurrence.clone()),
                None => self.lanes.push(Some(occurrence.clone())),
            }
        }

        self.lanes
            .iter()
            .map(|lane| match lane {
                Some(occurrence) => LaneCell::for_day(occurrence.clone(), day),
                None => LaneCell::Filler,
            })
            .collect()
    }
}

/// Everything drawn in one day cell.
#[derive(Debug, Clone)]
pub struct DayLayout {
    /// The day.
    pub date: NaiveDate,
    /// Index of the week row within the month, starting at 0.
    pub week_row: usize,
    /// All-day lanes, top to bottom.
    pub lanes: Vec<LaneCell>,
    /// Timed occurrences in display order; these bypass lane assignment.
    pub timed: Vec<Occurrence>,
}

impl DayLayout {
    /// Renders the timed occurrences as `HH:MM-HH:MM Title` lines, or
    /// `HH:MM Title` for items of the tasks calendar.
    pub fn timed_labels(&self) -> Vec<String> {
        self.timed.iter().map(timed_label).collect()
    }
}

fn timed_label(occurrence: &Occurrence) -> String {
    let start = occurrence.period.start.format("%H:%M");
    if occurrence.event.calendar_name == TASKS_CALENDAR {
        format!("{start} {}", occurrence.title())
    } else {
        let end = occurrence.period.end.format("%H:%M");
        format!("{start}-{end} {}", occurrence.title())
    }
}

/// Lays out the days of one month, lazily, one day per step.
///
/// Weeks start on Monday; lanes are reset at every new week row.
#[derive(Debug)]
pub struct MonthLayout<'a, E: ?Sized> {
    calendar: &'a Calendar,
    expander: &'a E,
    month: u32,
    cursor: Option<NaiveDate>,
    week_row: usize,
    lanes: LaneAssignment,
}

impl<'a, E: OccurrenceExpander + ?Sized> MonthLayout<'a, E> {
    /// Creates the layout of the month containing `day`.
    pub fn new(calendar: &'a Calendar, expander: &'a E, day: NaiveDate) -> Self {
        Self {
            calendar,
            expander,
            month: day.month(),
            cursor: day.with_day(1),
            week_row: 0,
            lanes: LaneAssignment::new(),
        }
    }

    /// Creates the layout of `month` of `year`; `None` for an invalid month.
    pub fn for_month(calendar: &'a Calendar, expander: &'a E, year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|first| Self::new(calendar, expander, first))
    }
}

impl<E: OccurrenceExpander + ?Sized> Iterator for MonthLayout<'_, E> {
    type Item = DayLayout;

    fn next(&mut self) -> Option<Self::Item> {
        let date = self.cursor.filter(|d| d.month() == self.month)?;

        if date.weekday() == Weekday::Mon && date.day() != 1 {
            self.week_row += 1;
            self.lanes.reset();
        }

        let (all_day, timed): (Vec<_>, Vec<_>) = self
            .calendar
            .day_occurrences(date, self.expander)
            .into_iter()
            .partition(Occurrence::is_all_day);
        let lanes = self.lanes.advance(date, &all_day);

        self.cursor = date.succ_opt();
        Some(DayLayout {
            date,
            week_row: self.week_row,
            lanes,
            timed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::{Duration, NaiveDateTime};

    use crate::event::CalendarEvent;
    use crate::expand::RRuleExpander;
    use crate::time::{Period, start_of_day};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_opt(h, min, 0).unwrap()
    }

    /// An all-day occurrence covering `days` days from `first`.
    fn all_day(uid: &str, first: NaiveDate, days: i64) -> Occurrence {
        let start = start_of_day(first);
        let end = start + Duration::days(days);
        let event = CalendarEvent::new(uid, uid, start, end).with_all_day(true);
        Occurrence::new(Arc::new(event), Period::new(start, end))
    }

    /// Filters `occurrences` to those active on `day`.
    fn active_on(occurrences: &[Occurrence], day: NaiveDate) -> Vec<Occurrence> {
        let window = crate::time::TimeWindow::for_date(day);
        occurrences
            .iter()
            .filter(|o| o.period.overlaps(&window))
            .cloned()
            .collect()
    }

    fn labels(cells: &[LaneCell]) -> Vec<String> {
        cells.iter().map(LaneCell::label).collect()
    }

    mod lanes {
        use super::*;

        #[test]
        fn long_event_keeps_its_lane() {
            let a = all_day("A", date(2024, 1, 1), 5);
            let b = all_day("B", date(2024, 1, 3), 1);
            let events = [a, b];
            let mut lanes = LaneAssignment::new();

            let mut lane_a = Vec::new();
            let mut lane_b = Vec::new();
            let mut sizes = Vec::new();
            for offset in 0..5 {
                let day = date(2024, 1, 1) + Duration::days(offset);
                lanes.advance(day, &active_on(&events, day));
                lane_a.push(lanes.lane_of("A"));
                lane_b.push(lanes.lane_of("B"));
                sizes.push(lanes.len());
            }

            assert_eq!(lane_a, vec![Some(0); 5]);
            assert_eq!(lane_b, vec![None, None, Some(1), None, None]);
            assert_eq!(sizes, vec![1, 1, 2, 1, 1]);
        }

        #[test]
        fn inner_gap_kept_as_filler() {
            let a = all_day("A", date(2024, 1, 1), 1);
            let b = all_day("B", date(2024, 1, 1), 3);
            let mut lanes = LaneAssignment::new();

            let first = lanes.advance(date(2024, 1, 1), &[a, b.clone()]);
            assert_eq!(labels(&first), vec!["A", "B >"]);

            // A is gone, B stays in lane 1 behind a filler
            let second = lanes.advance(date(2024, 1, 2), &[b.clone()]);
            assert_eq!(labels(&second), vec!["-", "< B >"]);
            assert!(second[0].is_filler());
            assert_eq!(lanes.lane_of("B"), Some(1));

            let third = lanes.advance(date(2024, 1, 3), &[b]);
            assert_eq!(labels(&third), vec!["-", "< B"]);

            // Once the last occupant leaves, everything is trimmed
            let fourth = lanes.advance(date(2024, 1, 4), &[]);
            assert!(fourth.is_empty());
            assert!(lanes.is_empty());
        }

        #[test]
        fn trimming_shrinks_to_highest_occupied() {
            let a = all_day("A", date(2024, 1, 1), 3);
            let b = all_day("B", date(2024, 1, 1), 1);
            let c = all_day("C", date(2024, 1, 1), 1);
            let mut lanes = LaneAssignment::new();

            lanes.advance(date(2024, 1, 1), &[a.clone(), b, c]);
            assert_eq!(lanes.len(), 3);

            lanes.advance(date(2024, 1, 2), &[a]);
            assert_eq!(lanes.len(), 1);
            assert_eq!(lanes.lane_of("A"), Some(0));
        }

        #[test]
        fn newcomer_fills_lowest_gap() {
            let a = all_day("A", date(2024, 1, 1), 1);
            let b = all_day("B", date(2024, 1, 1), 2);
            let c = all_day("C", date(2024, 1, 2), 1);
            let d = all_day("D", date(2024, 1, 2), 1);
            let mut lanes = LaneAssignment::new();

            lanes.advance(date(2024, 1, 1), &[a, b.clone()]);
            let cells = lanes.advance(date(2024, 1, 2), &[b, c, d]);

            assert_eq!(labels(&cells), vec!["C", "< B", "D"]);
        }

        #[test]
        fn repeated_uid_shares_one_lane() {
            let first = all_day("A", date(2024, 1, 1), 2);
            let second = all_day("A", date(2024, 1, 2), 2);
            let mut lanes = LaneAssignment::new();

            let cells = lanes.advance(date(2024, 1, 2), &[first, second]);
            assert_eq!(cells.len(), 1);
            // The later occurrence wins the lane
            assert_eq!(cells[0].label(), "A >");
        }

        #[test]
        fn reset_drops_inner_gaps() {
            let a = all_day("A", date(2024, 1, 1), 1);
            let b = all_day("B", date(2024, 1, 1), 3);
            let mut lanes = LaneAssignment::new();

            lanes.advance(date(2024, 1, 1), &[a, b.clone()]);
            lanes.advance(date(2024, 1, 2), &[b.clone()]);
            assert_eq!(lanes.len(), 2);
            assert_eq!(lanes.lane_of("B"), Some(1));

            lanes.reset();
            assert!(lanes.is_empty());
            assert_eq!(lanes.lane_of("B"), None);

            let cells = lanes.advance(date(2024, 1, 3), &[b]);
            assert_eq!(labels(&cells), vec!["< B"]);
        }

        #[test]
        fn single_day_event_has_no_marks() {
            let a = all_day("A", date(2024, 1, 1), 1);
            let cell = LaneCell::for_day(a, date(2024, 1, 1));
            assert_eq!(cell.label(), "A");
            assert_eq!(LaneCell::Filler.label_with("·"), "·");
        }
    }

    mod month {
        use super::*;

        fn sample_calendar() -> Calendar {
            [
                CalendarEvent::new("trip", "Trip", dt(2024, 1, 4, 0, 0), dt(2024, 1, 10, 0, 0))
                    .with_all_day(true),
                CalendarEvent::new("fair", "Fair", dt(2024, 1, 5, 0, 0), dt(2024, 1, 6, 0, 0))
                    .with_all_day(true),
                CalendarEvent::new("bday", "Birthday", dt(2024, 1, 6, 0, 0), dt(2024, 1, 7, 0, 0))
                    .with_all_day(true),
                CalendarEvent::new("call", "Call", dt(2024, 1, 5, 14, 0), dt(2024, 1, 5, 14, 30)),
                CalendarEvent::new("gym", "Gym", dt(2024, 1, 1, 18, 0), dt(2024, 1, 1, 19, 0))
                    .with_rule("FREQ=WEEKLY;COUNT=2".parse().unwrap()),
            ]
            .into_iter()
            .collect()
        }

        fn render(days: &[DayLayout]) -> String {
            days.iter()
                .map(|day| {
                    let mut cell = vec![day.date.format("%a %d").to_string()];
                    cell.extend(day.lanes.iter().map(LaneCell::label));
                    cell.extend(day.timed_labels());
                    cell.join(" | ")
                })
                .collect::<Vec<_>>()
                .join("\n")
        }

        #[test]
        fn covers_every_day_of_month() {
            let calendar = Calendar::new();
            let expander = RRuleExpander::new();
            let days: Vec<_> = MonthLayout::for_month(&calendar, &expander, 2024, 2)
                .unwrap()
                .collect();

            assert_eq!(days.len(), 29);
            assert_eq!(days[0].date, date(2024, 2, 1));
            assert_eq!(days[28].date, date(2024, 2, 29));
        }

        #[test]
        fn week_rows_start_on_monday() {
            let calendar = Calendar::new();
            let expander = RRuleExpander::new();
            // March 2024 starts on a Friday
            let rows: Vec<_> = MonthLayout::for_month(&calendar, &expander, 2024, 3)
                .unwrap()
                .map(|day| (day.date.day(), day.week_row))
                .collect();

            assert_eq!(rows[0], (1, 0));
            assert_eq!(rows[3], (4, 1));
            assert_eq!(rows[30], (31, 4));
        }

        #[test]
        fn tasks_show_start_only() {
            let calendar: Calendar = [
                CalendarEvent::new("t", "Pay rent", dt(2024, 1, 3, 8, 0), dt(2024, 1, 3, 8, 30))
                    .with_calendar_name(TASKS_CALENDAR),
                CalendarEvent::new("m", "Dentist", dt(2024, 1, 3, 9, 0), dt(2024, 1, 3, 9, 45))
                    .with_calendar_name("Home"),
            ]
            .into_iter()
            .collect();
            let expander = RRuleExpander::new();
            let day = MonthLayout::for_month(&calendar, &expander, 2024, 1)
                .unwrap()
                .nth(2)
                .unwrap();

            assert_eq!(day.timed_labels(), vec!["08:00 Pay rent", "09:00-09:45 Dentist"]);
        }

        #[test]
        fn invalid_month() {
            let calendar = Calendar::new();
            assert!(MonthLayout::for_month(&calendar, &RRuleExpander::new(), 2024, 13).is_none());
        }

        #[test]
        fn lanes_reset_each_week() {
            let calendar: Calendar = [
                CalendarEvent::new("fair", "Fair", dt(2024, 1, 5, 0, 0), dt(2024, 1, 7, 0, 0))
                    .with_all_day(true),
                CalendarEvent::new("trip", "Trip", dt(2024, 1, 6, 0, 0), dt(2024, 1, 10, 0, 0))
                    .with_all_day(true),
            ]
            .into_iter()
            .collect();
            let expander = RRuleExpander::new();
            let days: Vec<_> = MonthLayout::for_month(&calendar, &expander, 2024, 1)
                .unwrap()
                .take(9)
                .collect();

            // Sunday: the fair is over, the trip stays in lane 1 behind a filler
            let sunday = &days[6];
            assert_eq!(sunday.week_row, 0);
            assert_eq!(labels(&sunday.lanes), vec!["-", "< Trip >"]);

            // Monday opens a new row: the trip moves up to lane 0
            let monday = &days[7];
            assert_eq!(monday.week_row, 1);
            assert_eq!(labels(&monday.lanes), vec!["< Trip >"]);
            assert_eq!(labels(&days[8].lanes), vec!["< Trip"]);
        }

        #[test]
        fn first_week_snapshot() {
            let calendar = sample_calendar();
            let expander = RRuleExpander::new();
            let days: Vec<_> = MonthLayout::for_month(&calendar, &expander, 2024, 1)
                .unwrap()
                .take(10)
                .collect();

            insta::assert_snapshot!(render(&days), @r"
            Mon 01 | 18:00-19:00 Gym
            Tue 02
            Wed 03
            Thu 04 | Trip >
            Fri 05 | < Trip > | Fair | 14:00-14:30 Call
            Sat 06 | < Trip > | Birthday
            Sun 07 | < Trip >
            Mon 08 | < Trip > | 18:00-19:00 Gym
            Tue 09 | < Trip
            Wed 10
            ");
        }
    }

    mod assembled {
        use super::*;
        use crate::assembler::EventAssembler;
        use crate::event::{CalendarNames, ItemFlags};
        use crate::row::{MemoryRowSource, RawRow};

        fn micros(y: i32, m: u32, d: u32) -> i64 {
            dt(y, m, d, 0, 0).and_utc().timestamp() * 1_000_000
        }

        fn all_day_row(event_id: &str, title: &str, first: u32, last: u32) -> RawRow {
            RawRow::new("cal", event_id)
                .with_title(title)
                .with_times(micros(2024, 1, first), micros(2024, 1, last + 1))
                .with_flags(i64::from(ItemFlags::ALL_DAY.bits()))
        }

        #[test]
        fn recurring_all_day_series_in_lanes() {
            let rows = vec![
                all_day_row("a-retreat", "Retreat", 1, 2).with_payload("RRULE:FREQ=WEEKLY;UNTIL=20240122"),
                all_day_row("a-retreat", "Retreat", 1, 2).with_payload("EXDATE:20240115T000000"),
                all_day_row("b-conf", "Conference", 7, 9),
            ];
            let names: CalendarNames = [("cal", "Home")].into_iter().collect();
            let (calendar, diagnostics) =
                Calendar::from_assembled(EventAssembler::new(MemoryRowSource::new(rows), names)).unwrap();
            assert!(diagnostics.is_empty());
            assert_eq!(calendar.len(), 2);

            let expander = RRuleExpander::new();
            let rendered = MonthLayout::for_month(&calendar, &expander, 2024, 1)
                .unwrap()
                .filter(|day| !day.lanes.is_empty())
                .map(|day| {
                    let mut cell = vec![day.date.format("%a %d").to_string()];
                    cell.extend(day.lanes.iter().map(LaneCell::label));
                    cell.join(" | ")
                })
                .collect::<Vec<_>>()
                .join("\n");

            insta::assert_snapshot!(rendered, @r"
            Mon 01 | Retreat >
            Tue 02 | < Retreat
            Sun 07 | Conference >
            Mon 08 | < Conference > | Retreat >
            Tue 09 | < Conference | < Retreat
            Mon 22 | Retreat >
            Tue 23 | < Retreat
            ");
        }
    }
}
