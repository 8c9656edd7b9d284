//! CLI error types.

use std::path::PathBuf;

use calgrid_core::{AssembleError, TracingError};
use calgrid_store::StoreError;
use thiserror::Error;

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// Errors that end a calgrid run.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration file could not be read or parsed.
    #[error("configuration error in {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    /// Neither a database nor a profile was configured.
    #[error("no calendar database: pass --database or --profile, or set [store] in the config")]
    NoDatabase,

    /// Invalid setting value.
    #[error("invalid setting: {0}")]
    InvalidSetting(String),

    /// Storage error.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Fatal assembly error.
    #[error(transparent)]
    Assemble(#[from] AssembleError),

    /// Logging could not be set up.
    #[error(transparent)]
    Tracing(#[from] TracingError),

    /// JSON output failed.
    #[error("JSON output failed: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
