//! Technology directory loading.
//!
//! Walks a technology directory, reads every `.txt` file, and merges the
//! parsed technologies into a [`TechCatalog`]. Files are always merged in
//! lexical path order, so a later file overrides an earlier one regardless
//! of which finished parsing first.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use research_core::catalog::{parse_technologies, TechCatalog};
use research_core::data::Technology;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Tier metadata file that never contains technologies.
pub const TIER_DEFINITION_FILE: &str = "00_tier.txt";

/// Errors that can occur during technology loading.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Directory not found.
    #[error("Directory not found: {0}")]
    DirectoryNotFound(String),

    /// Failed to read a directory or file.
    #[error("IO error reading '{path}': {source}")]
    Io {
        /// Path that failed.
        path: String,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
}

impl LoadError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Options controlling directory loading.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// File names skipped in addition to [`TIER_DEFINITION_FILE`].
    pub extra_skip_files: Vec<String>,
    /// Parse files in parallel.
    pub parallel: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            extra_skip_files: Vec::new(),
            parallel: true,
        }
    }
}

impl LoadOptions {
    /// Add file names to skip.
    #[must_use]
    pub fn with_extra_skip_files<I: IntoIterator<Item = String>>(mut self, names: I) -> Self {
        self.extra_skip_files.extend(names);
        self
    }

    /// Enable or disable parallel parsing.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Whether a file with this name is skipped.
    #[must_use]
    pub fn is_skipped(&self, file_name: &str) -> bool {
        file_name == TIER_DEFINITION_FILE || self.extra_skip_files.iter().any(|s| s == file_name)
    }
}

/// Result of loading a technology directory.
#[derive(Debug, Default)]
pub struct LoadedTechnologies {
    /// Merged technologies.
    pub catalog: TechCatalog,
    /// Files that were read and parsed, in merge order.
    pub parsed_files: Vec<PathBuf>,
    /// Files that could not be read, with the reason.
    pub failed_files: Vec<(PathBuf, String)>,
}

/// Recursively collect files with `extension`, sorted by path.
pub(crate) fn collect_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, LoadError> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        let entries = fs::read_dir(&current).map_err(|e| LoadError::io(&current, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| LoadError::io(&current, e))?;
            let path = entry.path();
            if path.is_dir() {
                pending.push(path);
            } else if path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
            {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

/// List the technology files a load would parse, in merge order.
pub fn technology_files(dir: &Path, options: &LoadOptions) -> Result<Vec<PathBuf>, LoadError> {
    if !dir.is_dir() {
        return Err(LoadError::DirectoryNotFound(dir.display().to_string()));
    }

    let files = collect_files(dir, "txt")?
        .into_iter()
        .filter(|path| {
            let skipped = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| options.is_skipped(name));
            if skipped {
                debug!(path = %path.display(), "Skipping technology file");
            }
            !skipped
        })
        .collect();
    Ok(files)
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn parse_file(path: &Path) -> Result<Vec<Technology>, LoadError> {
    let bytes = fs::read(path).map_err(|e| LoadError::io(path, e))?;
    let content = String::from_utf8_lossy(&bytes);
    Ok(parse_technologies(&content, &file_label(path)))
}

/// Load every technology under `dir`.
///
/// A missing directory is an error. Files that cannot be read are logged
/// and recorded in [`LoadedTechnologies::failed_files`]; loading continues.
pub fn load_technology_dir(
    dir: &Path,
    options: &LoadOptions,
) -> Result<LoadedTechnologies, LoadError> {
    let files = technology_files(dir, options)?;
    info!(dir = %dir.display(), files = files.len(), "Loading technology files");

    let parsed: Vec<Result<Vec<Technology>, LoadError>> = if options.parallel {
        files.par_iter().map(|path| parse_file(path)).collect()
    } else {
        files.iter().map(|path| parse_file(path)).collect()
    };

    let mut loaded = LoadedTechnologies::default();
    for (path, result) in files.into_iter().zip(parsed) {
        match result {
            Ok(technologies) => {
                debug!(path = %path.display(), count = technologies.len(), "Parsed technology file");
                loaded.catalog.merge(technologies);
                loaded.parsed_files.push(path);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read technology file");
                loaded.failed_files.push((path, e.to_string()));
            }
        }
    }

    info!(
        technologies = loaded.catalog.len(),
        overrides = loaded.catalog.overrides().len(),
        failed = loaded.failed_files.len(),
        "Loaded technologies"
    );
    Ok(loaded)
}
