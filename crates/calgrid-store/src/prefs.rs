//! Calendar display names from a preferences file.
//!
//! Names are registered as
//! `user_pref("calendar.registry.<id>.name", "<name>");` lines.

use std::path::Path;
use std::sync::LazyLock;

use calgrid_core::CalendarNames;
use regex::Regex;
use tracing::debug;

use crate::error::{StoreError, StoreResult};

static CALENDAR_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"user_pref\("calendar\.registry\.([a-zA-Z0-9-]+)\.name",\s*"([^"]+)"\)"#)
        .expect("Invalid calendar name regex")
});

/// Extracts the calendar id to name mapping from preferences text.
///
/// Later entries for the same id win.
pub fn calendar_names_from_prefs(text: &str) -> CalendarNames {
    CALENDAR_NAME
        .captures_iter(text)
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
        .collect()
}

/// Reads a preferences file and extracts its calendar names.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn load_calendar_names(path: &Path) -> StoreResult<CalendarNames> {
    let text = std::fs::read_to_string(path).map_err(|e| StoreError::prefs(path, e))?;
    let names = calendar_names_from_prefs(&text);
    debug!(path = %path.display(), calendars = names.len(), "Loaded calendar names");
    Ok(names)
}
