//! Core types: event assembly, timezone resolution, recurrence expansion,
//! month lane layout

pub mod assembler;
pub mod calendar;
pub mod error;
pub mod event;
pub mod expand;
pub mod layout;
pub mod logging;
pub mod payload;
pub mod row;
pub mod time;
pub mod timezone;

pub use assembler::{Assembled, EventAssembler};
pub use calendar::{Calendar, sort_for_day};
pub use error::{AssembleError, AssembleResult, Diagnostic, SourceError};
pub use event::{CalendarEvent, CalendarNames, ExceptionPeriod, ItemFlags};
pub use expand::{Occurrence, OccurrenceExpander, RRuleExpander};
pub use layout::{DayLayout, LaneAssignment, LaneCell, MonthLayout};
pub use logging::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
pub use payload::PayloadLine;
pub use row::{MemoryRowSource, RawRow, RowSource};
pub use time::{Period, TimeWindow};
pub use timezone::{TimezoneResolver, UnknownTimezone};
