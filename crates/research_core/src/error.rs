//! Error types for technology parsing and graph queries.

use thiserror::Error;

/// Result type alias using [`ResearchError`].
pub type Result<T> = std::result::Result<T, ResearchError>;

/// Top-level error type for research tree operations.
///
/// Parsing itself never fails: malformed lines are skipped and wrong-typed
/// fields fall back to their defaults. Errors only surface from queries
/// against a built graph and from explicit validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResearchError {
    /// Lookup of a technology key that is not in the graph.
    #[error("Unknown technology: {0}")]
    UnknownTechnology(String),

    /// A prerequisite names a technology that was never defined.
    #[error("Technology '{technology}' has unknown prerequisite '{prerequisite}'")]
    UnresolvedPrerequisite {
        /// Technology declaring the prerequisite.
        technology: String,
        /// The missing prerequisite key.
        prerequisite: String,
    },

    /// Prerequisites form a cycle, so levels cannot be assigned.
    #[error("Prerequisite cycle detected: {}", .0.join(" -> "))]
    PrerequisiteCycle(Vec<String>),
}
