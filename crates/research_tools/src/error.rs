//! Top-level error type for the tools pipeline and CLI.

use thiserror::Error;

use research_core::error::ResearchError;

use crate::config::ConfigError;
use crate::loader::LoadError;
use crate::localisation::LocalisationError;

/// Result type alias using [`ToolError`].
pub type Result<T> = std::result::Result<T, ToolError>;

/// Errors surfaced by the tools pipeline.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The game directory does not exist.
    #[error("Game directory not found: {0}")]
    GameDirectoryNotFound(String),

    /// The game directory has no technology directory.
    #[error("Technology directory not found: {0}")]
    TechnologyDirectoryNotFound(String),

    /// Loading finished but produced nothing to build a tree from.
    #[error("No technologies found in {0}")]
    NoTechnologies(String),

    /// Technology loading failed.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Localisation loading failed.
    #[error(transparent)]
    Localisation(#[from] LocalisationError),

    /// Tool configuration could not be read.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Graph validation failed.
    #[error(transparent)]
    Research(#[from] ResearchError),

    /// JSON serialization failed.
    #[error("Failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing output failed.
    #[error("IO error writing '{path}': {source}")]
    Io {
        /// Path being written.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}
