//! Row-to-event assembly.
//!
//! [`EventAssembler`] pulls rows from a [`RowSource`] sorted by event id and
//! groups them into [`CalendarEvent`]s:
//!
//! 1. The first row of a group supplies the event skeleton (title, calendar
//!    name, zone-adjusted start/end, all-day flag, override marker, stamp).
//! 2. Every following row with the same event id and no override marker only
//!    contributes its payload line (a rule or an exclusion).
//! 3. A row with another id, or with an override marker, ends the group and is
//!    kept as the one-row lookahead for the next event.
//!
//! Rows without a title are skipped wherever a new group could start.
//! Recoverable issues become [`Diagnostic`]s; an unresolvable zone or a
//! failing cursor ends the stream with an [`AssembleError`].

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{debug, trace, warn};

use crate::error::{AssembleError, AssembleResult, Diagnostic};
use crate::event::{CalendarEvent, CalendarNames, ExceptionPeriod, ItemFlags};
use crate::payload::PayloadLine;
use crate::row::{RawRow, RowSource};
use crate::time::from_micro_epoch;
use crate::timezone::TimezoneResolver;

/// One assembled event with the recoverable issues met while building it.
#[derive(Debug, Clone)]
pub struct Assembled {
    /// The finished event.
    pub event: CalendarEvent,
    /// Issues logged while reading the rows of this event, including untitled
    /// rows skipped before or after its group.
    pub diagnostics: Vec<Diagnostic>,
}

/// Lookahead state of the assembler.
#[derive(Debug)]
enum Lookahead {
    /// The next event starts at a row not yet pulled from the source.
    NeedRow,
    /// The first row of the next event has already been pulled.
    HaveRow(RawRow),
}

/// Groups ordered rows into calendar events, lazily.
///
/// The sequence is forward-only; restarting requires a fresh row source.
/// After a fatal error the assembler yields nothing more.
#[derive(Debug)]
pub struct EventAssembler<S> {
    source: S,
    calendars: CalendarNames,
    resolver: TimezoneResolver,
    state: Lookahead,
    pending: Vec<Diagnostic>,
    failed: bool,
}

impl<S: RowSource> EventAssembler<S> {
    /// Creates an assembler over `source`, naming calendars from `calendars`.
    pub fn new(source: S, calendars: CalendarNames) -> Self {
        Self {
            source,
            calendars,
            resolver: TimezoneResolver::new(),
            state: Lookahead::NeedRow,
            pending: Vec::new(),
            failed: false,
        }
    }

    /// Returns true if another event is available.
    ///
    /// Returns immediately when a row is already buffered; otherwise pulls
    /// rows, skipping untitled ones, until a titled row is found or the source
    /// is exhausted.
    ///
    /// # Errors
    ///
    /// Returns an error if the row source fails.
    pub fn read(&mut self) -> AssembleResult<bool> {
        if self.failed {
            return Ok(false);
        }
        if matches!(self.state, Lookahead::NeedRow) {
            self.fill().inspect_err(|_| self.failed = true)?;
        }
        Ok(matches!(self.state, Lookahead::HaveRow(_)))
    }

    /// Assembles and returns the next event, or `None` at the end of the rows.
    ///
    /// # Errors
    ///
    /// Returns an error if a zone cannot be resolved, a timestamp is out of
    /// range, or the row source fails. The assembler is finished afterwards.
    pub fn next_event(&mut self) -> AssembleResult<Option<Assembled>> {
        if !self.read()? {
            return Ok(None);
        }
        self.assemble().inspect_err(|_| self.failed = true)
    }

    /// Consumes the assembler, returning diagnostics not yet attached to an
    /// event (untitled rows at the end of a stream with no further event).
    pub fn into_pending(self) -> Vec<Diagnostic> {
        self.pending
    }

    fn fill(&mut self) -> AssembleResult<()> {
        while let Some(row) = self.source.next_row()? {
            if row.title.is_none() {
                self.skip_untitled(&row);
                continue;
            }
            self.state = Lookahead::HaveRow(row);
            return Ok(());
        }
        Ok(())
    }

    fn assemble(&mut self) -> AssembleResult<Option<Assembled>> {
        let Lookahead::HaveRow(row) = std::mem::replace(&mut self.state, Lookahead::NeedRow) else {
            return Ok(None);
        };

        let mut event = self.skeleton(&row)?;
        attach_payload(&mut event, row.recurrence_payload.as_deref(), &mut self.pending);
        self.consume_group(&mut event)?;

        debug!(
            uid = %event.uid,
            rules = event.recurrence_rules.len(),
            exceptions = event.exception_dates.len(),
            is_override = event.is_override(),
            "Assembled event"
        );

        Ok(Some(Assembled {
            event,
            diagnostics: std::mem::take(&mut self.pending),
        }))
    }

    /// Reads the continuation rows of `event`, stopping at the first row of
    /// the next group.
    fn consume_group(&mut self, event: &mut CalendarEvent) -> AssembleResult<()> {
        while let Some(row) = self.source.next_row()? {
            if row.event_id == event.uid && row.recurrence_id.is_none() {
                attach_payload(event, row.recurrence_payload.as_deref(), &mut self.pending);
                continue;
            }
            if row.title.is_none() {
                self.skip_untitled(&row);
                continue;
            }
            trace!(next = %row.event_id, "Group boundary");
            self.state = Lookahead::HaveRow(row);
            return Ok(());
        }
        Ok(())
    }

    fn skeleton(&mut self, row: &RawRow) -> AssembleResult<CalendarEvent> {
        let calendar_name = match self.calendars.get(&row.calendar_id) {
            Some(name) => name.to_string(),
            None => {
                debug!(event_id = %row.event_id, calendar_id = %row.calendar_id, "No calendar name");
                self.pending.push(Diagnostic::MissingCalendarName {
                    event_id: row.event_id.clone(),
                    calendar_id: row.calendar_id.clone(),
                });
                String::new()
            }
        };

        let start = self.zoned(row, row.start, &row.start_tz)?;
        let end = self.zoned(row, row.end, &row.end_tz)?;
        let flags = ItemFlags::from_bits(row.flags);

        let mut event = CalendarEvent::new(
            &row.event_id,
            row.title.clone().unwrap_or_default(),
            start,
            end,
        )
        .with_calendar_name(calendar_name)
        .with_all_day(flags.contains(ItemFlags::ALL_DAY));

        if let Some(marker) = row.recurrence_id {
            event.recurrence_id = Some(self.zoned(row, marker, &row.start_tz)?);
        }
        if let Some(stamp) = row.stamp {
            event.stamp = Some(instant(row, stamp)?);
        }

        Ok(event)
    }

    fn zoned(&mut self, row: &RawRow, micros: i64, zone: &str) -> AssembleResult<NaiveDateTime> {
        let utc = instant(row, micros)?;
        self.resolver
            .resolve(utc, zone)
            .map_err(|e| AssembleError::UnknownTimezone {
                event_id: row.event_id.clone(),
                zone: e.0,
            })
    }

    fn skip_untitled(&mut self, row: &RawRow) {
        warn!(event_id = %row.event_id, "Skipping row without title");
        self.pending.push(Diagnostic::UntitledRow {
            event_id: row.event_id.clone(),
        });
    }
}

impl<S: RowSource> Iterator for EventAssembler<S> {
    type Item = AssembleResult<Assembled>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event().transpose()
    }
}

fn instant(row: &RawRow, micros: i64) -> AssembleResult<DateTime<Utc>> {
    from_micro_epoch(micros).ok_or_else(|| AssembleError::InvalidTimestamp {
        event_id: row.event_id.clone(),
        value: micros,
    })
}

/// Applies one payload line to `event`. Problems are logged and recorded,
/// never propagated.
fn attach_payload(event: &mut CalendarEvent, line: Option<&str>, diagnostics: &mut Vec<Diagnostic>) {
    let Some(line) = line else {
        return;
    };

    let diagnostic = match PayloadLine::parse(line) {
        PayloadLine::Empty => None,
        PayloadLine::Exclusions(dates) => {
            event
                .exception_dates
                .extend(dates.into_iter().map(ExceptionPeriod::new));
            None
        }
        PayloadLine::Rule(rule) => {
            event.recurrence_rules.push(rule);
            None
        }
        PayloadLine::MalformedRule(reason) => Some(Diagnostic::MalformedRule {
            event_id: event.uid.clone(),
            title: event.title.clone(),
            line: line.trim().to_string(),
            reason,
        }),
        PayloadLine::MalformedExdate => Some(Diagnostic::MalformedExdate {
            event_id: event.uid.clone(),
            line: line.trim().to_string(),
        }),
        PayloadLine::Rdate => Some(Diagnostic::UnhandledRdate {
            event_id: event.uid.clone(),
            line: line.trim().to_string(),
        }),
        PayloadLine::Unrecognized => Some(Diagnostic::UnrecognizedLine {
            event_id: event.uid.clone(),
            line: line.trim().to_string(),
        }),
    };

    if let Some(diagnostic) = diagnostic {
        warn!(event_id = %event.uid, kind = diagnostic.as_str(), "{diagnostic}, skipping");
        diagnostics.push(diagnostic);
    }
}
