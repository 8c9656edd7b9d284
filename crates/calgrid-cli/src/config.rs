//! CLI configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/calgrid/config.toml` by default. Command-line flags override
//! the file.

use std::path::{Path, PathBuf};

use calgrid_core::layout::FILLER;
use calgrid_store::Profile;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cli::Cli;
use crate::error::{CliError, CliResult};

/// Months laid out when nothing else is configured.
pub const DEFAULT_MONTHS: u32 = 6;

/// Configuration for the calgrid CLI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalgridConfig {
    /// Debug mode.
    pub debug: bool,

    /// Where the calendar data is read from.
    pub store: StoreSettings,

    /// Layout settings.
    pub layout: LayoutSettings,
}

/// Location of the calendar data.
///
/// Explicit `database` and `prefs` paths win over the ones derived from
/// `profile`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Profile directory.
    pub profile: Option<PathBuf>,

    /// Calendar database.
    pub database: Option<PathBuf>,

    /// Preferences file holding calendar names.
    pub prefs: Option<PathBuf>,
}

/// Month layout settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    /// Number of consecutive months to lay out.
    pub months: u32,

    /// Text drawn in empty lanes.
    pub filler: String,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            months: DEFAULT_MONTHS,
            filler: FILLER.to_string(),
        }
    }
}

/// Database and preferences paths after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    /// Calendar database.
    pub database: PathBuf,
    /// Preferences file, if one is known.
    pub prefs: Option<PathBuf>,
}

impl CalgridConfig {
    /// Loads configuration from the default path, or defaults if there is
    /// no file.
    pub fn load() -> CliResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            debug!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> CliResult<Self> {
        let config_error = |message: String| CliError::Config {
            path: path.to_path_buf(),
            message,
        };
        let content = std::fs::read_to_string(path)
            .map_err(|e| config_error(format!("failed to read config: {e}")))?;
        let config = Self::parse(&content).map_err(config_error)?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Parses configuration text.
    pub fn parse(content: &str) -> Result<Self, String> {
        let config: Self =
            toml::from_str(content).map_err(|e| format!("failed to parse config: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), String> {
        if self.layout.months == 0 {
            return Err("layout.months must be at least 1".to_string());
        }
        Ok(())
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("calgrid")
    }

    /// Applies command-line overrides.
    pub fn merge_cli(mut self, cli: &Cli) -> CliResult<Self> {
        self.debug |= cli.debug;
        if let Some(ref profile) = cli.profile {
            self.store.profile = Some(profile.clone());
        }
        if let Some(ref database) = cli.database {
            self.store.database = Some(database.clone());
        }
        if let Some(ref prefs) = cli.prefs {
            self.store.prefs = Some(prefs.clone());
        }
        if let Some(months) = cli.months {
            self.layout.months = months;
        }
        if let Some(ref filler) = cli.filler {
            self.layout.filler = filler.clone();
        }
        self.validate().map_err(CliError::InvalidSetting)?;
        Ok(self)
    }
}

impl StoreSettings {
    /// Resolves the database and preferences paths.
    pub fn resolve(&self) -> CliResult<StorePaths> {
        let profile = self.profile.as_ref().map(Profile::new);

        let database = self
            .database
            .clone()
            .or_else(|| profile.as_ref().map(Profile::database_path))
            .ok_or(CliError::NoDatabase)?;
        let prefs = self
            .prefs
            .clone()
            .or_else(|| profile.as_ref().map(Profile::prefs_path));

        Ok(StorePaths { database, prefs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("calgrid").chain(args.iter().copied())).unwrap()
    }

    mod parsing {
        use super::*;

        #[test]
        fn empty_file_gives_defaults() {
            let config = CalgridConfig::parse("").unwrap();
            assert_eq!(config, CalgridConfig::default());
            assert_eq!(config.layout.months, 6);
            assert_eq!(config.layout.filler, "-");
            assert!(!config.debug);
        }

        #[test]
        fn full_file() {
            let config = CalgridConfig::parse(
                r#"
debug = true

[store]
database = "/data/local.sqlite"
prefs = "/data/prefs.js"

[layout]
months = 3
filler = "."
"#,
            )
            .unwrap();

            assert!(config.debug);
            assert_eq!(config.store.database, Some(PathBuf::from("/data/local.sqlite")));
            assert_eq!(config.store.prefs, Some(PathBuf::from("/data/prefs.js")));
            assert_eq!(config.layout.months, 3);
            assert_eq!(config.layout.filler, ".");
        }

        #[test]
        fn partial_section_keeps_defaults() {
            let config = CalgridConfig::parse("[layout]\nmonths = 12\n").unwrap();
            assert_eq!(config.layout.months, 12);
            assert_eq!(config.layout.filler, "-");
        }

        #[test]
        fn zero_months_rejected() {
            let err = CalgridConfig::parse("[layout]\nmonths = 0\n").unwrap_err();
            assert!(err.contains("layout.months"));
        }

        #[test]
        fn bad_type_rejected() {
            let err = CalgridConfig::parse("[layout]\nmonths = \"six\"\n").unwrap_err();
            assert!(err.starts_with("failed to parse config"));
        }

        #[test]
        fn load_from_file() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("config.toml");
            std::fs::write(&path, "[store]\nprofile = \"/p/x.default\"\n").unwrap();

            let config = CalgridConfig::load_from(&path).unwrap();
            assert_eq!(config.store.profile, Some(PathBuf::from("/p/x.default")));
        }

        #[test]
        fn load_from_missing_file() {
            let dir = tempfile::tempdir().unwrap();
            let err = CalgridConfig::load_from(&dir.path().join("nope.toml")).unwrap_err();
            assert!(matches!(err, CliError::Config { .. }));
        }

        #[test]
        fn serialized_config_parses_back() {
            let mut config = CalgridConfig::default();
            config.store.database = Some(PathBuf::from("/db.sqlite"));
            let text = toml::to_string(&config).unwrap();
            assert_eq!(CalgridConfig::parse(&text).unwrap(), config);
        }
    }

    mod overrides {
        use super::*;

        #[test]
        fn flags_win() {
            let config = CalgridConfig::parse("[layout]\nmonths = 3\n[store]\ndatabase = \"/a\"\n")
                .unwrap()
                .merge_cli(&cli(&["--months", "1", "--database", "/b", "--filler", "~", "-v"]))
                .unwrap();

            assert_eq!(config.layout.months, 1);
            assert_eq!(config.layout.filler, "~");
            assert_eq!(config.store.database, Some(PathBuf::from("/b")));
            assert!(config.debug);
        }

        #[test]
        fn absent_flags_keep_file_values() {
            let config = CalgridConfig::parse("debug = true\n[layout]\nmonths = 3\n")
                .unwrap()
                .merge_cli(&cli(&[]))
                .unwrap();
            assert_eq!(config.layout.months, 3);
            assert!(config.debug);
        }

        #[test]
        fn zero_months_flag_rejected() {
            let err = CalgridConfig::default().merge_cli(&cli(&["--months", "0"])).unwrap_err();
            assert!(matches!(err, CliError::InvalidSetting(_)));
        }
    }

    mod store_paths {
        use super::*;

        #[test]
        fn explicit_paths() {
            let settings = StoreSettings {
                profile: Some(PathBuf::from("/p")),
                database: Some(PathBuf::from("/db.sqlite")),
                prefs: None,
            };
            let paths = settings.resolve().unwrap();
            assert_eq!(paths.database, PathBuf::from("/db.sqlite"));
            assert_eq!(paths.prefs, Some(PathBuf::from("/p/prefs.js")));
        }

        #[test]
        fn from_profile() {
            let settings = StoreSettings {
                profile: Some(PathBuf::from("/p")),
                ..StoreSettings::default()
            };
            let paths = settings.resolve().unwrap();
            assert_eq!(paths.database, PathBuf::from("/p/calendar-data/local.sqlite"));
            assert_eq!(paths.prefs, Some(PathBuf::from("/p/prefs.js")));
        }

        #[test]
        fn nothing_configured() {
            let err = StoreSettings::default().resolve().unwrap_err();
            assert!(matches!(err, CliError::NoDatabase));
        }

        #[test]
        fn database_without_prefs() {
            let settings = StoreSettings {
                database: Some(PathBuf::from("/db.sqlite")),
                ..StoreSettings::default()
            };
            let paths = settings.resolve().unwrap();
            assert!(paths.prefs.is_none());
        }
    }
}
