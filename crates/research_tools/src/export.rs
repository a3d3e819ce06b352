//! JSON export of a built technology tree.
//!
//! Output layout:
//!
//! - `metadata.json` - areas, tiers, categories and the maximum level
//! - `localizations.json` - languages and per-technology names/descriptions
//! - `technologies-<area>.json` - one file per area, technologies sorted by
//!   level then key

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use research_core::graph::{TechNode, TechTree};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Result, ToolError};

/// Area name used for technologies without one.
pub const UNKNOWN_AREA: &str = "unknown";

/// Turn a technology key into a readable title.
///
/// `tech_basic_science` becomes `Basic Science`.
#[must_use]
pub fn format_tech_name(key: &str) -> String {
    let name = key.strip_prefix("tech_").unwrap_or(key).replace('_', " ");
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// File name of an area's technology list.
#[must_use]
pub fn area_file_name(area: &str) -> String {
    format!("technologies-{}.json", area.to_lowercase())
}

/// Contents of `metadata.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Non-empty areas, sorted.
    pub areas: Vec<String>,
    /// Tiers, ascending.
    pub tiers: Vec<i64>,
    /// Categories, sorted.
    pub categories: Vec<String>,
    /// Highest level in the tree.
    pub max_level: u32,
}

/// Name and description in one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalisedText {
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
}

/// Contents of `localizations.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalisationTable {
    /// Every language seen on any technology, sorted.
    pub languages: Vec<String>,
    /// Technology key to language to text.
    pub localizations: BTreeMap<String, BTreeMap<String, LocalisedText>>,
}

/// One technology as written to an area file.
///
/// Fields mirror [`research_core::data::Technology`] plus the computed
/// level, a display name and resolved prerequisite keys.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnologyEntry {
    pub key: String,
    pub name: String,
    pub cost: i64,
    pub area: String,
    pub tier: i64,
    pub level: u32,
    pub category: String,
    pub prerequisites: Vec<String>,
    pub weight: i64,
    pub source_file: String,
    pub icon: String,
    pub is_start_tech: bool,
    pub is_dangerous: bool,
    pub is_rare: bool,
    pub is_event: bool,
    #[serde(rename = "isReverse")]
    pub is_reverse_engineerable: bool,
    pub is_repeatable: bool,
    pub levels: i64,
    pub is_gestalt: bool,
    pub is_megacorp: bool,
}

impl TechnologyEntry {
    fn from_node(tree: &TechTree, node: &TechNode) -> Self {
        let tech = node.technology();
        Self {
            key: tech.key.clone(),
            name: format_tech_name(&tech.key),
            cost: tech.cost,
            area: tech.area.clone(),
            tier: tech.tier,
            level: node.level(),
            category: tech.category.join(", "),
            prerequisites: node
                .dependencies()
                .iter()
                .map(|&id| tree[id].key().to_string())
                .collect(),
            weight: tech.weight,
            source_file: tech.source_file.clone(),
            icon: tech.icon.clone(),
            is_start_tech: tech.is_start_tech,
            is_dangerous: tech.is_dangerous,
            is_rare: tech.is_rare,
            is_event: tech.is_event,
            is_reverse_engineerable: tech.is_reverse_engineerable,
            is_repeatable: tech.is_repeatable,
            levels: tech.levels,
            is_gestalt: tech.is_gestalt,
            is_megacorp: tech.is_megacorp,
        }
    }
}

/// Contents of one `technologies-<area>.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaFile {
    /// Area name, `unknown` for technologies without one.
    pub area: String,
    /// Technologies sorted by level then key.
    pub technologies: Vec<TechnologyEntry>,
}

/// Everything the export writes, before touching the file system.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeExport {
    /// Tree-wide summary.
    pub metadata: Metadata,
    /// Localised text.
    pub localisations: LocalisationTable,
    /// Per-area technology lists keyed by area.
    pub areas: BTreeMap<String, AreaFile>,
}

impl TreeExport {
    /// Collect export data from a tree.
    #[must_use]
    pub fn from_tree(tree: &TechTree) -> Self {
        let metadata = Metadata {
            areas: tree.areas().into_iter().map(str::to_string).collect(),
            tiers: tree.tiers(),
            categories: tree.categories().into_iter().map(str::to_string).collect(),
            max_level: tree.max_level(),
        };

        let mut languages = BTreeSet::new();
        let mut localizations = BTreeMap::new();
        let mut areas: BTreeMap<String, AreaFile> = BTreeMap::new();

        for node in tree.nodes() {
            let tech = node.technology();
            if !tech.localisations.is_empty() {
                let per_language = tech
                    .localisations
                    .iter()
                    .map(|(language, text)| {
                        languages.insert(language.clone());
                        (
                            language.clone(),
                            LocalisedText {
                                name: text.name.clone(),
                                description: text.description.clone(),
                            },
                        )
                    })
                    .collect();
                localizations.insert(tech.key.clone(), per_language);
            }

            let area = if tech.area.is_empty() {
                UNKNOWN_AREA.to_string()
            } else {
                tech.area.clone()
            };
            areas
                .entry(area.clone())
                .or_insert_with(|| AreaFile {
                    area,
                    technologies: Vec::new(),
                })
                .technologies
                .push(TechnologyEntry::from_node(tree, node));
        }

        for file in areas.values_mut() {
            file.technologies
                .sort_by(|a, b| a.level.cmp(&b.level).then_with(|| a.key.cmp(&b.key)));
        }

        Self {
            metadata,
            localisations: LocalisationTable {
                languages: languages.into_iter().collect(),
                localizations,
            },
            areas,
        }
    }

    /// Write all files into `output_dir`, creating it if needed.
    ///
    /// Returns the written paths.
    pub fn write_to(&self, output_dir: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(output_dir).map_err(|source| ToolError::Io {
            path: output_dir.display().to_string(),
            source,
        })?;

        let mut written = Vec::with_capacity(self.areas.len() + 2);
        written.push(write_json(
            &output_dir.join("localizations.json"),
            &self.localisations,
        )?);
        for (area, file) in &self.areas {
            written.push(write_json(&output_dir.join(area_file_name(area)), file)?);
        }
        written.push(write_json(&output_dir.join("metadata.json"), &self.metadata)?);

        info!(
            dir = %output_dir.display(),
            files = written.len(),
            "Wrote JSON export"
        );
        Ok(written)
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<PathBuf> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).map_err(|source| ToolError::Io {
        path: path.display().to_string(),
        source,
    })?;
    debug!(path = %path.display(), "Wrote JSON file");
    Ok(path.to_path_buf())
}

/// Export a tree as JSON files into `output_dir`.
pub fn export_tree(tree: &TechTree, output_dir: &Path) -> Result<Vec<PathBuf>> {
    TreeExport::from_tree(tree).write_to(output_dir)
}
