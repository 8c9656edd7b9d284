//! Error and diagnostic types for event assembly.
//!
//! Assembly distinguishes two kinds of trouble:
//! - [`Diagnostic`]: a recoverable issue. It is logged, returned next to the
//!   event it concerns, and never interrupts the stream.
//! - [`AssembleError`]: a fatal fault that ends the stream.

use std::fmt;

use thiserror::Error;

/// A recoverable issue met while assembling an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// An `RRULE:` line failed to parse; the rule was dropped.
    MalformedRule {
        event_id: String,
        title: String,
        line: String,
        reason: String,
    },
    /// An `EXDATE:` line held a value that is not a timestamp.
    MalformedExdate { event_id: String, line: String },
    /// An `RDATE;` line; these are not supported.
    UnhandledRdate { event_id: String, line: String },
    /// A payload line with an unknown prefix.
    UnrecognizedLine { event_id: String, line: String },
    /// The calendar id has no display name; an empty name was used.
    MissingCalendarName { event_id: String, calendar_id: String },
    /// A row without a title was skipped.
    UntitledRow { event_id: String },
}

impl Diagnostic {
    /// Returns the id of the event the diagnostic concerns.
    pub fn event_id(&self) -> &str {
        match self {
            Self::MalformedRule { event_id, .. }
            | Self::MalformedExdate { event_id, .. }
            | Self::UnhandledRdate { event_id, .. }
            | Self::UnrecognizedLine { event_id, .. }
            | Self::MissingCalendarName { event_id, .. }
            | Self::UntitledRow { event_id } => event_id,
        }
    }

    /// Returns a short machine-readable name for this diagnostic.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedRule { .. } => "malformed_rule",
            Self::MalformedExdate { .. } => "malformed_exdate",
            Self::UnhandledRdate { .. } => "unhandled_rdate",
            Self::UnrecognizedLine { .. } => "unrecognized_line",
            Self::MissingCalendarName { .. } => "missing_calendar_name",
            Self::UntitledRow { .. } => "untitled_row",
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedRule {
                title,
                line,
                reason,
                ..
            } => write!(f, "failed to parse rule {line:?} for event {title:?}: {reason}"),
            Self::MalformedExdate { event_id, line } => {
                write!(f, "invalid exclusion {line:?} for event {event_id}")
            }
            Self::UnhandledRdate { event_id, line } => {
                write!(f, "unhandled RDATE {line:?} for event {event_id}")
            }
            Self::UnrecognizedLine { event_id, line } => {
                write!(f, "unknown rule {line:?} for event {event_id}")
            }
            Self::MissingCalendarName {
                event_id,
                calendar_id,
            } => write!(f, "no name for calendar {calendar_id} of event {event_id}"),
            Self::UntitledRow { event_id } => write!(f, "skipped untitled row of event {event_id}"),
        }
    }
}

/// A failure of the underlying row cursor.
#[derive(Debug, Error)]
#[error("row source failed: {message}")]
pub struct SourceError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl SourceError {
    /// Creates a new source error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Sets the underlying cause of this error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A fatal fault that terminates event assembly.
#[derive(Debug, Error)]
pub enum AssembleError {
    /// A zone column is neither floating, an embedded block, nor a known zone.
    #[error("event {event_id}: unresolvable timezone {zone:?}")]
    UnknownTimezone { event_id: String, zone: String },

    /// A micro-epoch column is outside the representable range.
    #[error("event {event_id}: timestamp {value} out of range")]
    InvalidTimestamp { event_id: String, value: i64 },

    /// The row cursor failed.
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// A specialized Result type for assembly operations.
pub type AssembleResult<T> = Result<T, AssembleError>;
