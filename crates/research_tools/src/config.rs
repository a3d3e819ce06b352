//! Tool configuration loaded from RON.
//!
//! Every field has a default, so an empty `()` file is a valid
//! configuration and a missing `--config` flag means all defaults.
//!
//! # Example RON
//!
//! ```ron
//! ToolConfig(
//!     technology_dir: "common/technology",
//!     localisation_dir: "localisation",
//!     extra_skip_files: ["zz_debug_tech.txt"],
//!     parallel: true,
//!     max_reference_depth: 8,
//! )
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::loader::LoadOptions;

/// Error type for configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File not found.
    #[error("Config file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] ron::error::SpannedError),
}

/// Settings shared by all subcommands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Technology directory, relative to the game directory.
    pub technology_dir: PathBuf,
    /// Localisation directory, relative to the game directory.
    pub localisation_dir: PathBuf,
    /// File names to skip in addition to `00_tier.txt`.
    pub extra_skip_files: Vec<String>,
    /// Parse files on the rayon thread pool.
    pub parallel: bool,
    /// How deep `$key$` references are followed in localised text.
    pub max_reference_depth: usize,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            technology_dir: PathBuf::from("common/technology"),
            localisation_dir: PathBuf::from("localisation"),
            extra_skip_files: Vec::new(),
            parallel: true,
            max_reference_depth: 8,
        }
    }
}

impl ToolConfig {
    /// Load a configuration from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Parse a configuration from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self, ConfigError> {
        let config: ToolConfig = ron::from_str(ron)?;
        Ok(config)
    }

    /// Load from an optional path, falling back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    /// Loader options derived from this configuration.
    #[must_use]
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions::default()
            .with_extra_skip_files(self.extra_skip_files.iter().cloned())
            .with_parallel(self.parallel)
    }
}
