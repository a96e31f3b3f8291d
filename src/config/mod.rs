//! Configuration module for spritelink
//!
//! Provides types and parsing for `spl.toml` configuration.

pub mod loader;
pub mod schema;

pub use loader::{load_config, merge_cli_overrides, CliOverrides, ConfigError};
pub use schema::*;
