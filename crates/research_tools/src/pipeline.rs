//! End-to-end pipeline: game directory to leveled technology tree.

use std::path::{Path, PathBuf};

use research_core::catalog::TechCatalog;
use research_core::graph::{check_acyclic, TechTree};
use tracing::{info, warn};

use crate::config::ToolConfig;
use crate::error::{Result, ToolError};
use crate::loader::load_technology_dir;
use crate::localisation::Localisation;

/// Resolved directories of a game installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameLayout {
    /// Game root.
    pub game_dir: PathBuf,
    /// Technology scripts.
    pub technology_dir: PathBuf,
    /// Localisation files. May not exist.
    pub localisation_dir: PathBuf,
}

impl GameLayout {
    /// Resolve directories under `game_dir` using the configured relative paths.
    ///
    /// The game and technology directories must exist.
    pub fn resolve(game_dir: &Path, config: &ToolConfig) -> Result<Self> {
        if !game_dir.is_dir() {
            return Err(ToolError::GameDirectoryNotFound(
                game_dir.display().to_string(),
            ));
        }
        let technology_dir = game_dir.join(&config.technology_dir);
        if !technology_dir.is_dir() {
            return Err(ToolError::TechnologyDirectoryNotFound(
                technology_dir.display().to_string(),
            ));
        }
        Ok(Self {
            game_dir: game_dir.to_path_buf(),
            technology_dir,
            localisation_dir: game_dir.join(&config.localisation_dir),
        })
    }
}

/// Output of [`build_tree`].
#[derive(Debug)]
pub struct BuiltTree {
    /// The leveled tree.
    pub tree: TechTree,
    /// Languages with localisation loaded, sorted.
    pub languages: Vec<String>,
    /// Files parsed.
    pub parsed_files: Vec<PathBuf>,
    /// Files that could not be read.
    pub failed_files: Vec<(PathBuf, String)>,
}

/// Load localisation into `catalog`. A missing or unreadable directory only
/// warns. Returns the loaded languages.
fn localise(catalog: &mut TechCatalog, layout: &GameLayout, config: &ToolConfig) -> Vec<String> {
    if !layout.localisation_dir.is_dir() {
        warn!(
            dir = %layout.localisation_dir.display(),
            "Localisation directory not found, technologies keep their keys only"
        );
        return Vec::new();
    }

    let mut localisation = Localisation::new().with_max_reference_depth(config.max_reference_depth);
    if let Err(e) = localisation.load_dir_into(&layout.localisation_dir) {
        warn!(error = %e, "Failed to load localisation");
        return Vec::new();
    }
    let localised = localisation.apply_to(catalog);
    info!(technologies = localised, "Applied localisation");
    localisation
        .languages()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Load, localise, check and level every technology of a game directory.
pub fn build_tree(game_dir: &Path, config: &ToolConfig) -> Result<BuiltTree> {
    let layout = GameLayout::resolve(game_dir, config)?;
    let loaded = load_technology_dir(&layout.technology_dir, &config.load_options())?;
    if loaded.catalog.is_empty() {
        return Err(ToolError::NoTechnologies(
            layout.technology_dir.display().to_string(),
        ));
    }

    let mut catalog = loaded.catalog;
    let languages = localise(&mut catalog, &layout, config);

    check_acyclic(&catalog)?;
    let tree = TechTree::from_catalog(&catalog);
    info!(
        technologies = tree.len(),
        roots = tree.roots().len(),
        max_level = tree.max_level(),
        "Built technology tree"
    );

    Ok(BuiltTree {
        tree,
        languages,
        parsed_files: loaded.parsed_files,
        failed_files: loaded.failed_files,
    })
}
