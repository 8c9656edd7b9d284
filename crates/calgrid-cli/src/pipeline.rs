//! From storage to laid-out months.

use calgrid_core::{Calendar, CalendarNames, Diagnostic, EventAssembler, RRuleExpander};
use calgrid_store::{ThunderbirdStore, load_calendar_names};
use chrono::NaiveDate;
use tracing::{info, warn};

use crate::config::{CalgridConfig, StorePaths};
use crate::error::CliResult;
use crate::render::{JsonOutput, MonthGrid, render_text};

/// Reads and assembles every event of the store.
pub fn load_calendar(paths: &StorePaths) -> CliResult<(Calendar, Vec<Diagnostic>)> {
    let names = match paths.prefs {
        Some(ref prefs) if prefs.exists() => load_calendar_names(prefs)?,
        Some(ref prefs) => {
            warn!(path = %prefs.display(), "Preferences not found, calendars stay unnamed");
            CalendarNames::new()
        }
        None => CalendarNames::new(),
    };

    let store = ThunderbirdStore::open(&paths.database)?;
    let mut query = store.events()?;
    let mut assembler = EventAssembler::new(query.cursor()?, names);
    let (calendar, mut diagnostics) = Calendar::from_assembled(assembler.by_ref())?;
    diagnostics.extend(assembler.into_pending());

    info!(
        events = calendar.len(),
        diagnostics = diagnostics.len(),
        database = %paths.database.display(),
        "Calendar loaded"
    );
    Ok((calendar, diagnostics))
}

/// Lays out the configured months and renders them.
pub fn render(
    config: &CalgridConfig,
    calendar: &Calendar,
    diagnostics: &[Diagnostic],
    start: NaiveDate,
    json: bool,
) -> CliResult<String> {
    let expander = RRuleExpander::new();
    let months = MonthGrid::consecutive(calendar, &expander, start, config.layout.months);
    if json {
        Ok(serde_json::to_string_pretty(&JsonOutput::new(&months, diagnostics))?)
    } else {
        Ok(render_text(&months, &config.layout.filler))
    }
}
