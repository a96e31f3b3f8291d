//! Configuration loading and discovery for `spl.toml`
//!
//! Provides functions to find, load, and merge configuration.

use super::schema::SplConfig;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the configuration file looked up by [`find_config`].
pub const CONFIG_FILE: &str = "spl.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse spl.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub budget: Option<usize>,
    pub strict: Option<bool>,
    pub parallel: Option<bool>,
    pub json: Option<bool>,
}

/// Find spl.toml by walking up from the current working directory.
///
/// Search order:
/// 1. Walk up from current directory looking for spl.toml
/// 2. Check XDG_CONFIG_HOME/spritelink/spl.toml (or ~/.config/spritelink/spl.toml)
pub fn find_config() -> Option<PathBuf> {
    if let Ok(cwd) = env::current_dir() {
        if let Some(path) = find_config_from(cwd) {
            return Some(path);
        }
    }

    find_xdg_config()
}

/// Find spl.toml in the XDG config directory.
pub fn find_xdg_config() -> Option<PathBuf> {
    let xdg_config = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|_| env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
        .ok()?;

    let config_path = xdg_config.join("spritelink").join(CONFIG_FILE);
    if config_path.exists() {
        Some(config_path)
    } else {
        None
    }
}

/// Find spl.toml by walking up from a specific directory.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration from a spl.toml file.
///
/// If a path is provided, loads from that file. Otherwise, uses `find_config()`
/// to locate the config file. If no config file is found, returns the default
/// configuration.
pub fn load_config(path: Option<&Path>) -> Result<SplConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => load_config_file(&p),
        None => Ok(SplConfig::default()),
    }
}

fn load_config_file(path: &Path) -> Result<SplConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: SplConfig = toml::from_str(&contents)?;

    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }

    Ok(config)
}

/// Merge CLI overrides into a configuration.
///
/// CLI arguments take precedence over config file values.
pub fn merge_cli_overrides(config: &mut SplConfig, overrides: &CliOverrides) {
    if let Some(budget) = overrides.budget {
        config.connect.budget = budget;
    }
    if let Some(strict) = overrides.strict {
        config.connect.strict = strict;
    }
    if let Some(parallel) = overrides.parallel {
        config.connect.parallel = parallel;
    }
    if let Some(json) = overrides.json {
        config.output.format = if json { "json" } else { "text" }.to_string();
    }
}
