//! calgrid CLI entry point.

use std::io::Write;
use std::process::ExitCode;

use calgrid_core::{TracingConfig, init_tracing};
use chrono::Local;
use clap::Parser;
use tracing::{debug, error};

use calgrid_cli::cli::Cli;
use calgrid_cli::config::CalgridConfig;
use calgrid_cli::error::CliResult;
use calgrid_cli::pipeline;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "calgrid failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let config = match cli.config {
        Some(ref path) => CalgridConfig::load_from(path)?,
        None => CalgridConfig::load()?,
    }
    .merge_cli(&cli)?;

    init_tracing(TracingConfig::for_debug(config.debug))?;
    debug!(?config, "Effective configuration");

    let paths = config.store.resolve()?;
    let (calendar, diagnostics) = pipeline::load_calendar(&paths)?;

    let start = cli.month.unwrap_or_else(|| Local::now().date_naive());
    let output = pipeline::render(&config, &calendar, &diagnostics, start, cli.json)?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    if !output.ends_with('\n') {
        writeln!(stdout)?;
    }
    Ok(())
}
