//! Error types for reading calendar storage.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// The category of a store error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreErrorCode {
    /// The database could not be opened.
    OpenFailed,
    /// The event query failed or returned an unexpected column type.
    QueryFailed,
    /// The preferences file could not be read.
    PrefsUnreadable,
}

impl StoreErrorCode {
    /// Returns a short machine-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenFailed => "open_failed",
            Self::QueryFailed => "query_failed",
            Self::PrefsUnreadable => "prefs_unreadable",
        }
    }
}

impl fmt::Display for StoreErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error raised while reading calendar storage.
#[derive(Debug, Error)]
pub struct StoreError {
    code: StoreErrorCode,
    message: String,
    path: Option<PathBuf>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StoreError {
    /// Creates a new store error.
    pub fn new(code: StoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
            source: None,
        }
    }

    /// Creates an error for a database that failed to open.
    pub fn open(path: &Path, source: rusqlite::Error) -> Self {
        Self::new(StoreErrorCode::OpenFailed, "cannot open calendar database")
            .with_path(path)
            .with_source(source)
    }

    /// Creates an error for a failed query.
    pub fn query(source: rusqlite::Error) -> Self {
        Self::new(StoreErrorCode::QueryFailed, "event query failed").with_source(source)
    }

    /// Creates an error for an unreadable preferences file.
    pub fn prefs(path: &Path, source: std::io::Error) -> Self {
        Self::new(StoreErrorCode::PrefsUnreadable, "cannot read preferences")
            .with_path(path)
            .with_source(source)
    }

    /// Sets the file this error refers to.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets the underlying cause of this error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error code.
    pub fn code(&self) -> StoreErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the file this error refers to, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        if let Some(ref path) = self.path {
            write!(f, " ({})", path.display())?;
        }
        Ok(())
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::query(err)
    }
}

/// A specialized Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn display_includes_path() {
        let err = StoreError::new(StoreErrorCode::OpenFailed, "cannot open calendar database")
            .with_path("/p/calendar-data/local.sqlite");
        assert_eq!(
            err.to_string(),
            "open_failed: cannot open calendar database (/p/calendar-data/local.sqlite)"
        );
        assert_eq!(err.path(), Some(Path::new("/p/calendar-data/local.sqlite")));
    }

    #[test]
    fn display_without_path() {
        let err = StoreError::query(rusqlite::Error::QueryReturnedNoRows);
        assert_eq!(err.code(), StoreErrorCode::QueryFailed);
        assert_eq!(err.to_string(), "query_failed: event query failed");
        assert!(err.source().is_some());
    }

    #[test]
    fn prefs_error_keeps_io_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = StoreError::prefs(Path::new("prefs.js"), io);
        assert_eq!(err.code(), StoreErrorCode::PrefsUnreadable);
        assert_eq!(err.source().map(ToString::to_string).as_deref(), Some("gone"));
    }
}
