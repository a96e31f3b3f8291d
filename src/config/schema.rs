//! Configuration schema types for `spl.toml`
//!
//! Defines the structure and validation rules for spritelink configuration.

use serde::{Deserialize, Serialize};

use crate::scene::SceneOptions;
use crate::system::ConnectOptions;

/// Output formats accepted by `spl run`.
pub const OUTPUT_FORMATS: &[&str] = &["text", "json"];

/// Connection core tuning
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ConnectConfig {
    /// Max objects recomputed per tick (0 = drain everything)
    #[serde(default)]
    pub budget: usize,
    /// Treat unresolvable positions and unknown references as errors
    #[serde(default)]
    pub strict: bool,
    /// Evaluate drained objects on the rayon pool
    #[serde(default)]
    pub parallel: bool,
}

/// Report output settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    /// "text" or "json"
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { format: default_format() }
    }
}

fn default_format() -> String {
    "text".to_string()
}

/// Scene replay defaults
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SceneConfig {
    /// Snap size for grids declared without one
    #[serde(default = "default_snap")]
    pub default_snap: u32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self { default_snap: default_snap() }
    }
}

fn default_snap() -> u32 {
    1
}

/// Complete `spl.toml` configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SplConfig {
    #[serde(default)]
    pub connect: ConnectConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub scene: SceneConfig,
}

/// A single config validation failure
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "scene.default_snap")
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "spl.toml: '{}' {}", self.field, self.message)
    }
}

impl SplConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if self.scene.default_snap == 0 {
            errors.push(ConfigValidationError {
                field: "scene.default_snap".to_string(),
                message: "must be a positive integer".to_string(),
            });
        }

        if !OUTPUT_FORMATS.contains(&self.output.format.as_str()) {
            errors.push(ConfigValidationError {
                field: "output.format".to_string(),
                message: format!("must be one of: {}", OUTPUT_FORMATS.join(", ")),
            });
        }

        errors
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            budget: (self.connect.budget > 0).then_some(self.connect.budget),
            strict: self.connect.strict,
            parallel: self.connect.parallel,
        }
    }

    pub fn scene_options(&self) -> SceneOptions {
        SceneOptions { connect: self.connect_options(), default_snap: self.scene.default_snap }
    }

    pub fn json_output(&self) -> bool {
        self.output.format == "json"
    }
}
