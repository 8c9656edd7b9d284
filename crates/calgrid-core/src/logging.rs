//! Tracing bootstrap shared by the calgrid binaries.
//!
//! Logs always go to stderr so that layouts printed on stdout stay clean.
//!
//! ```ignore
//! use calgrid_core::logging::{init_tracing, TracingConfig};
//!
//! init_tracing(TracingConfig::for_debug(cli.debug))?;
//! ```

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Target prefix matching every calgrid crate.
const TARGET_PREFIX: &str = "calgrid";

/// Errors that can occur during tracing initialization
#[derive(Debug, Error)]
pub enum TracingError {
    /// Failed to set global subscriber
    #[error("failed to set global tracing subscriber: {0}")]
    SetGlobalSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    /// Failed to parse env filter directive
    #[error("failed to parse env filter: {0}")]
    EnvFilter(#[from] tracing_subscriber::filter::ParseError),
}

/// Output format for log lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingOutputFormat {
    /// Multi-line human-readable output
    Pretty,
    /// Single-line output (default)
    #[default]
    Compact,
    /// One JSON object per line
    Json,
}

/// Configuration for tracing initialization
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Level applied to calgrid targets when `RUST_LOG` is not set
    pub default_level: Level,
    /// Output format
    pub output_format: TracingOutputFormat,
    /// Include file and line
    pub include_location: bool,
    /// Include the module path
    pub include_target: bool,
    /// Include timestamps
    pub include_timestamp: bool,
    /// Explicit filter directive, overriding both `RUST_LOG` and `default_level`
    pub env_filter: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_level: Level::WARN,
            output_format: TracingOutputFormat::Compact,
            include_location: false,
            include_target: false,
            include_timestamp: false,
            env_filter: None,
        }
    }
}

impl TracingConfig {
    /// Config for an interactive run; `debug` raises the level and adds
    /// source locations.
    #[must_use]
    pub fn for_debug(debug: bool) -> Self {
        if debug {
            Self {
                default_level: Level::DEBUG,
                include_location: true,
                include_target: true,
                ..Self::default()
            }
        } else {
            Self::default()
        }
    }

    /// Set the default log level
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.default_level = level;
        self
    }

    /// Set the output format
    #[must_use]
    pub fn with_format(mut self, format: TracingOutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Set a custom env filter directive
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// The directive used when neither `env_filter` nor `RUST_LOG` is set.
    pub fn default_directive(&self) -> String {
        format!("{TARGET_PREFIX}={}", self.default_level)
    }

    fn build_filter(&self) -> Result<EnvFilter, TracingError> {
        match self.env_filter {
            Some(ref filter) => Ok(EnvFilter::try_new(filter)?),
            None => Ok(EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(self.default_directive()))),
        }
    }
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns an error if a global subscriber is already set or if the filter
/// directive is invalid.
pub fn init_tracing(config: TracingConfig) -> Result<(), TracingError> {
    let filter = config.build_filter()?;

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_target(config.include_target);

    let layer = match (config.output_format, config.include_timestamp) {
        (TracingOutputFormat::Pretty, _) => layer.pretty().boxed(),
        (TracingOutputFormat::Json, _) => layer.json().boxed(),
        (TracingOutputFormat::Compact, true) => layer.compact().boxed(),
        (TracingOutputFormat::Compact, false) => layer.compact().without_time().boxed(),
    };

    let subscriber = tracing_subscriber::registry().with(filter).with(layer);
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
