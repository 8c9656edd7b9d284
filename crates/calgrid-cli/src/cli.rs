//! Command-line interface definition.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;

/// calgrid - Month grids from your local calendar
#[derive(Debug, Parser)]
#[command(name = "calgrid")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "CALGRID_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,

    // --- Store flags ---
    /// Profile directory holding the calendar database and preferences
    #[arg(long)]
    pub profile: Option<PathBuf>,

    /// Path to the calendar database (overrides the profile)
    #[arg(long)]
    pub database: Option<PathBuf>,

    /// Path to the preferences file with calendar names (overrides the profile)
    #[arg(long)]
    pub prefs: Option<PathBuf>,

    // --- Layout flags ---
    /// First month to lay out, as YYYY-MM (default: current month)
    #[arg(long, value_parser = parse_month)]
    pub month: Option<NaiveDate>,

    /// Number of consecutive months to lay out
    #[arg(long)]
    pub months: Option<u32>,

    /// Text drawn in empty lanes
    #[arg(long)]
    pub filler: Option<String>,
}

/// Parses `YYYY-MM` into the first day of that month.
pub fn parse_month(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(&format!("{value}-01"), "%Y-%m-%d")
        .map_err(|_| format!("invalid month {value:?}, expected YYYY-MM"))
}
