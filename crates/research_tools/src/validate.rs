//! Technology directory validation.
//!
//! Loads a directory the same way `generate` does and reports everything
//! that would make the resulting tree incomplete, without writing output.

use std::path::{Path, PathBuf};

use research_core::catalog::{Override, TechCatalog};
use research_core::error::ResearchError;
use research_core::graph::find_prerequisite_cycle;
use tracing::{info, warn};

use crate::error::Result;
use crate::loader::{load_technology_dir, LoadOptions, LoadedTechnologies};

/// A prerequisite naming a technology that was never defined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedPrerequisite {
    /// Technology declaring the prerequisite.
    pub technology: String,
    /// The missing key.
    pub prerequisite: String,
}

/// Findings of a validation run.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Technologies after merging.
    pub technology_count: usize,
    /// Files parsed.
    pub file_count: usize,
    /// Prerequisites that resolve to nothing.
    pub unresolved_prerequisites: Vec<UnresolvedPrerequisite>,
    /// Keys defined more than once.
    pub overrides: Vec<Override>,
    /// One prerequisite cycle, if any.
    pub cycle: Option<Vec<String>>,
    /// Files that could not be read.
    pub failed_files: Vec<(PathBuf, String)>,
}

impl ValidationReport {
    /// Check a merged catalog.
    #[must_use]
    pub fn from_catalog(catalog: &TechCatalog) -> Self {
        let unresolved_prerequisites = catalog
            .iter()
            .flat_map(|tech| {
                tech.prerequisites
                    .iter()
                    .filter(|p| !catalog.contains(p))
                    .map(|p| UnresolvedPrerequisite {
                        technology: tech.key.clone(),
                        prerequisite: p.clone(),
                    })
            })
            .collect();

        Self {
            technology_count: catalog.len(),
            file_count: 0,
            unresolved_prerequisites,
            overrides: catalog.overrides().to_vec(),
            cycle: find_prerequisite_cycle(catalog),
            failed_files: Vec::new(),
        }
    }

    fn from_loaded(loaded: &LoadedTechnologies) -> Self {
        Self {
            file_count: loaded.parsed_files.len(),
            failed_files: loaded.failed_files.clone(),
            ..Self::from_catalog(&loaded.catalog)
        }
    }

    /// No issues were found. Overrides count as issues.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.unresolved_prerequisites.is_empty()
            && self.overrides.is_empty()
            && self.cycle.is_none()
            && self.failed_files.is_empty()
    }

    /// Graph errors as [`ResearchError`] values.
    #[must_use]
    pub fn errors(&self) -> Vec<ResearchError> {
        let mut errors: Vec<ResearchError> = self
            .unresolved_prerequisites
            .iter()
            .map(|u| ResearchError::UnresolvedPrerequisite {
                technology: u.technology.clone(),
                prerequisite: u.prerequisite.clone(),
            })
            .collect();
        if let Some(cycle) = &self.cycle {
            errors.push(ResearchError::PrerequisiteCycle(cycle.clone()));
        }
        errors
    }

    /// Log every finding.
    pub fn log(&self) {
        for o in &self.overrides {
            warn!(
                technology = %o.key,
                previous = %o.previous_file,
                file = %o.file,
                "Technology overridden"
            );
        }
        for (path, reason) in &self.failed_files {
            warn!(path = %path.display(), error = %reason, "Unreadable technology file");
        }
        for error in self.errors() {
            warn!("{error}");
        }
        info!(
            technologies = self.technology_count,
            files = self.file_count,
            overrides = self.overrides.len(),
            clean = self.is_clean(),
            "Validation finished"
        );
    }
}

/// Load and validate a technology directory.
pub fn validate_technology_dir(dir: &Path, options: &LoadOptions) -> Result<ValidationReport> {
    let loaded = load_technology_dir(dir, options)?;
    Ok(ValidationReport::from_loaded(&loaded))
}
