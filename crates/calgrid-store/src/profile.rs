//! Mail client profile directories.
//!
//! A profile holds the calendar database under `calendar-data/local.sqlite`
//! and the preferences in `prefs.js`.

use std::path::{Path, PathBuf};

/// Database location relative to the profile directory.
pub const DATABASE_FILE: &str = "calendar-data/local.sqlite";

/// Preferences location relative to the profile directory.
pub const PREFS_FILE: &str = "prefs.js";

/// A profile directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    root: PathBuf,
}

impl Profile {
    /// Wraps an existing profile directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the profile directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the path of the calendar database.
    pub fn database_path(&self) -> PathBuf {
        self.root.join(DATABASE_FILE)
    }

    /// Returns the path of the preferences file.
    pub fn prefs_path(&self) -> PathBuf {
        self.root.join(PREFS_FILE)
    }
}
