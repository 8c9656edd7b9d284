//! Recurrence payload lines.
//!
//! Each storage row carries at most one iCalendar line describing the
//! recurrence of its event. Lines are classified by prefix:
//!
//! | Prefix    | Effect                                        |
//! |-----------|-----------------------------------------------|
//! | `EXDATE:` | one day-granular exclusion per listed value   |
//! | `RRULE:`  | one recurrence rule                           |
//! | `RDATE;`  | none (unsupported)                            |
//! | other     | none (unrecognized)                           |
//!
//! Event times are wall-clock values, so a rule's `UNTIL` is read as
//! wall-clock too: a date-only `UNTIL` covers that whole day and a local
//! `UNTIL` is taken as written.

use chrono::{NaiveDate, NaiveDateTime};
use rrule::{RRule, RRuleError, Unvalidated};

const EXDATE_PREFIX: &str = "EXDATE:";
const RRULE_PREFIX: &str = "RRULE:";
const RDATE_PREFIX: &str = "RDATE;";
const EXDATE_FORMAT: &str = "%Y%m%dT%H%M%S";
const UNTIL_KEY: &str = "UNTIL";
const END_OF_DAY: &str = "T235959";

/// The meaning of one payload line.
#[derive(Debug, Clone)]
pub enum PayloadLine {
    /// Blank line.
    Empty,
    /// Days excluded from the series.
    Exclusions(Vec<NaiveDate>),
    /// A recurrence rule.
    Rule(RRule<Unvalidated>),
    /// An `EXDATE:` line whose value is not a timestamp.
    MalformedExdate,
    /// An `RRULE:` line the rule parser rejected.
    MalformedRule(String),
    /// An `RDATE;` line.
    Rdate,
    /// Any other text.
    Unrecognized,
}

impl PayloadLine {
    /// Classifies a payload line. Surrounding whitespace is ignored.
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            Self::Empty
        } else if let Some(value) = line.strip_prefix(EXDATE_PREFIX) {
            match parse_exdate_values(value) {
                Some(dates) => Self::Exclusions(dates),
                None => Self::MalformedExdate,
            }
        } else if let Some(body) = line.strip_prefix(RRULE_PREFIX) {
            match parse_rule(body) {
                Ok(rule) => Self::Rule(rule),
                Err(e) => Self::MalformedRule(e.to_string()),
            }
        } else if line.starts_with(RDATE_PREFIX) {
            Self::Rdate
        } else {
            Self::Unrecognized
        }
    }
}

/// Parses the body of an `RRULE:` line.
///
/// `UNTIL` is rewritten to a UTC wall-clock value first, matching the
/// wall-clock start the rule is expanded from.
///
/// # Errors
///
/// Returns the rule parser's error for malformed text.
pub fn parse_rule(body: &str) -> Result<RRule<Unvalidated>, RRuleError> {
    let body = body
        .split(';')
        .map(wall_clock_until)
        .collect::<Vec<_>>()
        .join(";");
    body.parse()
}

fn wall_clock_until(part: &str) -> String {
    let Some((key, value)) = part.split_once('=') else {
        return part.to_string();
    };
    if !key.trim().eq_ignore_ascii_case(UNTIL_KEY) {
        return part.to_string();
    }
    let value = value.trim();
    if value.ends_with(['Z', 'z']) {
        part.to_string()
    } else if value.len() == 8 && value.bytes().all(|b| b.is_ascii_digit()) {
        format!("{key}={value}{END_OF_DAY}Z")
    } else {
        format!("{key}={value}Z")
    }
}

/// Parses a comma-separated list of `yyyyMMddTHHmmss[Z]` values, truncated
/// to their date. Returns `None` if any value is invalid.
fn parse_exdate_values(value: &str) -> Option<Vec<NaiveDate>> {
    value.split(',').map(parse_exdate_value).collect()
}

fn parse_exdate_value(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let value = value.strip_suffix('Z').unwrap_or(value);
    NaiveDateTime::parse_from_str(value, EXDATE_FORMAT)
        .ok()
        .map(|dt| dt.date())
}
