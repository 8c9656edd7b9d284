//! CLI, configuration and output rendering
//!
//! This crate provides the `calgrid` command-line interface.

pub mod cli;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod render;

pub use cli::Cli;
pub use config::CalgridConfig;
pub use error::{CliError, CliResult};
