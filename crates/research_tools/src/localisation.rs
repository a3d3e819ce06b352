//! Localisation loading and lookup.
//!
//! Stellaris ships display strings as `*_l_<language>.yml` files, one
//! `key:<version> "text"` entry per line. Text may embed `$other_key$`
//! references to further entries of the same language.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use research_core::catalog::TechCatalog;
use research_core::data::TechLocalisation;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::loader::{collect_files, LoadError};

/// Default bound on nested `$key$` resolution.
pub const DEFAULT_REFERENCE_DEPTH: usize = 8;

static LANGUAGE_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_l_(\w+)\.yml$").expect("language file pattern is valid"));
static VERSIONED_ENTRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*([a-zA-Z0-9_]+):\d+\s+"(.+)""#).expect("versioned entry pattern is valid")
});
static PLAIN_ENTRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*([a-zA-Z0-9_]+):\s*"(.+)""#).expect("plain entry pattern is valid")
});
static REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$([A-Za-z0-9_]+)\$").expect("reference pattern is valid"));

/// Errors that can occur during localisation loading.
#[derive(Debug, Error)]
pub enum LocalisationError {
    /// Directory not found.
    #[error("Localisation directory not found: {0}")]
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

impl From<LoadError> for LocalisationError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::DirectoryNotFound(path) => Self::DirectoryNotFound(path),
            LoadError::Io { path, source } => Self::Io { path, source },
        }
    }
}

/// Source of localised technology text.
pub trait LocalisationProvider {
    /// Text for `key` in `language`, with references resolved.
    fn lookup(&self, key: &str, language: &str) -> Option<String>;

    /// Display name of a technology.
    fn name(&self, key: &str, language: &str) -> Option<String> {
        self.lookup(key, language)
    }

    /// Description of a technology, stored under `<key>_desc`.
    fn description(&self, key: &str, language: &str) -> Option<String> {
        self.lookup(&format!("{key}_desc"), language)
    }
}

/// Language of a localisation file, from its `_l_<language>.yml` suffix.
#[must_use]
pub fn language_of(file_name: &str) -> Option<&str> {
    LANGUAGE_FILE
        .captures(file_name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn unescape(text: &str) -> String {
    text.replace("\\\"", "\"").replace("\\n", "\n")
}

/// Localised strings for every loaded language.
#[derive(Debug, Clone)]
pub struct Localisation {
    languages: BTreeMap<String, HashMap<String, String>>,
    max_reference_depth: usize,
}

impl Default for Localisation {
    fn default() -> Self {
        Self {
            languages: BTreeMap::new(),
            max_reference_depth: DEFAULT_REFERENCE_DEPTH,
        }
    }
}

impl Localisation {
    /// Create an empty set of localisations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bound on nested reference resolution.
    #[must_use]
    pub fn with_max_reference_depth(mut self, depth: usize) -> Self {
        self.max_reference_depth = depth;
        self
    }

    /// Load every `*_l_<language>.yml` file under `dir`.
    pub fn load_dir(dir: &Path) -> Result<Self, LocalisationError> {
        let mut localisation = Self::new();
        localisation.load_dir_into(dir)?;
        Ok(localisation)
    }

    /// Load a directory into this set. Later files overwrite earlier keys.
    ///
    /// Files that cannot be read are logged and skipped.
    pub fn load_dir_into(&mut self, dir: &Path) -> Result<usize, LocalisationError> {
        if !dir.is_dir() {
            return Err(LocalisationError::DirectoryNotFound(
                dir.display().to_string(),
            ));
        }

        let mut entries = 0;
        for path in collect_files(dir, "yml")? {
            let Some(language) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(language_of)
                .map(str::to_string)
            else {
                continue;
            };

            match fs::read(&path) {
                Ok(bytes) => {
                    let count = self.parse_str(&String::from_utf8_lossy(&bytes), &language);
                    debug!(path = %path.display(), language = %language, count, "Parsed localisation file");
                    entries += count;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to read localisation file");
                }
            }
        }

        info!(
            dir = %dir.display(),
            languages = self.languages.len(),
            entries,
            "Loaded localisation"
        );
        Ok(entries)
    }

    /// Parse one file's content for `language`. Returns the number of entries.
    ///
    /// Blank lines, `#` comments and the `l_<language>:` header are skipped.
    /// Lines match `key:<version> "text"` or `key: "text"`; `\"` and `\n`
    /// escapes are decoded.
    pub fn parse_str(&mut self, content: &str, language: &str) -> usize {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let table = self.languages.entry(language.to_string()).or_default();
        let mut count = 0;

        for line in content.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("l_") {
                continue;
            }
            let Some(caps) = VERSIONED_ENTRY
                .captures(line)
                .or_else(|| PLAIN_ENTRY.captures(line))
            else {
                continue;
            };
            table.insert(caps[1].to_string(), unescape(&caps[2]));
            count += 1;
        }

        count
    }

    /// Add or replace a single entry.
    pub fn insert(&mut self, language: &str, key: &str, text: &str) {
        self.languages
            .entry(language.to_string())
            .or_default()
            .insert(key.to_string(), text.to_string());
    }

    /// Unresolved text of an entry.
    #[must_use]
    pub fn raw(&self, key: &str, language: &str) -> Option<&str> {
        self.languages
            .get(language)
            .and_then(|table| table.get(key))
            .map(String::as_str)
    }

    /// Replace `$key$` references with their text in the same language.
    ///
    /// Resolution recurses up to the configured depth. Unknown references
    /// are left as written.
    #[must_use]
    pub fn resolve(&self, text: &str, language: &str) -> String {
        self.resolve_bounded(text, language, self.max_reference_depth)
    }

    fn resolve_bounded(&self, text: &str, language: &str, depth: usize) -> String {
        if depth == 0 || !text.contains('$') {
            return text.to_string();
        }
        REFERENCE
            .replace_all(text, |caps: &Captures<'_>| match self.raw(&caps[1], language) {
                Some(target) => self.resolve_bounded(target, language, depth - 1),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Loaded languages, sorted.
    #[must_use]
    pub fn languages(&self) -> Vec<&str> {
        self.languages.keys().map(String::as_str).collect()
    }

    /// Total number of entries across languages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.languages.values().map(HashMap::len).sum()
    }

    /// Whether nothing was loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Assign names and descriptions to every technology in the catalog.
    ///
    /// A language is recorded for a technology only if it has a name or a
    /// description there. Returns the number of technologies that received
    /// any text.
    pub fn apply_to(&self, catalog: &mut TechCatalog) -> usize {
        let mut localised = 0;
        for tech in catalog.iter_mut() {
            for &language in &self.languages() {
                let name = self.name(&tech.key, language);
                let description = self.description(&tech.key, language);
                if name.is_none() && description.is_none() {
                    continue;
                }
                tech.localisations.insert(
                    language.to_string(),
                    TechLocalisation {
                        name: name.unwrap_or_default(),
                        description: description.unwrap_or_default(),
                    },
                );
            }
            if !tech.localisations.is_empty() {
                localised += 1;
            }
        }
        localised
    }
}

impl LocalisationProvider for Localisation {
    fn lookup(&self, key: &str, language: &str) -> Option<String> {
        self.raw(key, language).map(|text| self.resolve(text, language))
    }
}
