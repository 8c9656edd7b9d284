//! Calendar storage readers.
//!
//! This crate feeds the assembler in `calgrid-core` from a mail client
//! profile:
//!
//! - [`ThunderbirdStore`] - read-only access to the event database
//! - [`calendar_names_from_prefs`] - calendar display names from `prefs.js`
//! - [`Profile`] - derives both paths from a profile directory
//!
//! # Example
//!
//! ```ignore
//! use calgrid_core::{Calendar, EventAssembler};
//! use calgrid_store::{Profile, ThunderbirdStore, load_calendar_names};
//!
//! let profile = Profile::new(profile_dir);
//! let names = load_calendar_names(&profile.prefs_path())?;
//! let store = ThunderbirdStore::open(&profile.database_path())?;
//! let mut query = store.events()?;
//! let assembler = EventAssembler::new(query.cursor()?, names);
//! let (calendar, diagnostics) = Calendar::from_assembled(assembler)?;
//! ```

pub mod error;
pub mod prefs;
pub mod profile;
pub mod sqlite;

pub use error::{StoreError, StoreErrorCode, StoreResult};
pub use prefs::{calendar_names_from_prefs, load_calendar_names};
pub use profile::Profile;
pub use sqlite::{EVENTS_QUERY, EventQuery, RowCursor, ThunderbirdStore};
