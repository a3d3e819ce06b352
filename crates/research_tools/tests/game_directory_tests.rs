//! Tests for loading, validating and exporting a game directory on disk.

use std::fs;
use std::path::Path;

use research_core::error::ResearchError;
use research_test_utils::fixtures::{
    SAMPLE_LOCALISATION_ENGLISH, SAMPLE_LOCALISATION_GERMAN, SAMPLE_OVERRIDE, SAMPLE_PHYSICS,
    SAMPLE_SOCIETY,
};
use research_tools::config::ToolConfig;
use research_tools::error::ToolError;
use research_tools::export::export_tree;
use research_tools::loader::{load_technology_dir, technology_files, LoadOptions};
use research_tools::localisation::{Localisation, LocalisationProvider};
use research_tools::pipeline::build_tree;
use research_tools::validate::validate_technology_dir;
use tempfile::TempDir;

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent directory");
    }
    fs::write(path, content).expect("write fixture file");
}

/// A minimal game directory with physics, society, a tier file and two languages.
fn game_dir() -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    let tech = dir.path().join("common/technology");
    write(&tech.join("00_phys_tech.txt"), SAMPLE_PHYSICS);
    write(&tech.join("00_soc_tech.txt"), SAMPLE_SOCIETY);
    write(
        &tech.join("00_tier.txt"),
        "tech_from_tier_file = { cost = 1 }\n",
    );

    let loc = dir.path().join("localisation");
    write(
        &loc.join("english/technology_l_english.yml"),
        SAMPLE_LOCALISATION_ENGLISH,
    );
    write(
        &loc.join("german/technology_l_german.yml"),
        SAMPLE_LOCALISATION_GERMAN,
    );
    dir
}

fn read_json(path: &Path) -> serde_json::Value {
    let text = fs::read_to_string(path).expect("read exported file");
    serde_json::from_str(&text).expect("exported file is JSON")
}

// ==========================================================================
// Loader Tests
// ==========================================================================

#[test]
fn test_loader_skips_tier_file() {
    let dir = game_dir();
    let tech = dir.path().join("common/technology");

    let files = technology_files(&tech, &LoadOptions::default()).expect("list files");
    let names: Vec<_> = files
        .iter()
        .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
        .collect();
    assert_eq!(names, vec!["00_phys_tech.txt", "00_soc_tech.txt"]);

    let loaded = load_technology_dir(&tech, &LoadOptions::default()).expect("load");
    assert_eq!(loaded.catalog.len(), 7);
    assert!(!loaded.catalog.contains("tech_from_tier_file"));
    assert!(loaded.failed_files.is_empty());
}

#[test]
fn test_later_file_overrides_earlier() {
    let dir = game_dir();
    let tech = dir.path().join("common/technology");
    write(&tech.join("zz_mod_tech.txt"), SAMPLE_OVERRIDE);

    let loaded = load_technology_dir(&tech, &LoadOptions::default()).expect("load");
    let lasers = loaded.catalog.get("tech_lasers_2").expect("overridden tech");
    assert_eq!(lasers.cost, 999);
    assert_eq!(lasers.source_file, "zz_mod_tech.txt");
    assert_eq!(loaded.catalog.overrides().len(), 1);
    assert_eq!(loaded.catalog.overrides()[0].previous_file, "00_phys_tech.txt");
}

#[test]
fn test_nested_directories_merge_in_path_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(&dir.path().join("b.txt"), "tech_a = { cost = 2 }\n");
    write(&dir.path().join("sub/a.txt"), "tech_a = { cost = 1 }\n");

    let loaded = load_technology_dir(dir.path(), &LoadOptions::default()).expect("load");
    let tech = loaded.catalog.get("tech_a").expect("tech_a");
    assert_eq!(tech.cost, 1);
    assert_eq!(tech.source_file, "a.txt");
}

#[test]
fn test_parallel_and_sequential_agree() {
    let dir = game_dir();
    let tech = dir.path().join("common/technology");
    write(&tech.join("zz_mod_tech.txt"), SAMPLE_OVERRIDE);

    let parallel = load_technology_dir(&tech, &LoadOptions::default()).expect("parallel");
    let sequential = load_technology_dir(&tech, &LoadOptions::default().with_parallel(false))
        .expect("sequential");

    let a: Vec<_> = parallel.catalog.iter().collect();
    let b: Vec<_> = sequential.catalog.iter().collect();
    assert_eq!(a, b);
    assert_eq!(parallel.catalog.overrides(), sequential.catalog.overrides());
}

#[test]
fn test_non_utf8_file_is_read_lossily() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut bytes = b"tech_odd = {\n    area = physics\n    # caf".to_vec();
    bytes.push(0xE9);
    bytes.extend_from_slice(b"\n}\n");
    fs::write(dir.path().join("odd.txt"), bytes).expect("write");

    let loaded = load_technology_dir(dir.path(), &LoadOptions::default()).expect("load");
    assert_eq!(loaded.catalog.get("tech_odd").map(|t| t.area.as_str()), Some("physics"));
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_is_skipped_and_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(&dir.path().join("a.txt"), "tech_a = { cost = 1 }\n");
    std::os::unix::fs::symlink(dir.path().join("missing.txt"), dir.path().join("b.txt"))
        .expect("create dangling symlink");

    let loaded = load_technology_dir(dir.path(), &LoadOptions::default()).expect("load");
    assert!(loaded.catalog.contains("tech_a"));
    assert_eq!(loaded.catalog.len(), 1);
    assert_eq!(loaded.parsed_files.len(), 1);
    assert_eq!(loaded.failed_files.len(), 1);
    assert_eq!(
        loaded.failed_files[0].0.file_name().and_then(|n| n.to_str()),
        Some("b.txt")
    );

    let report = validate_technology_dir(dir.path(), &LoadOptions::default()).expect("validate");
    assert!(!report.is_clean());
    assert_eq!(report.failed_files.len(), 1);
    assert!(report.errors().is_empty());
}

// ==========================================================================
// Localisation Tests
// ==========================================================================

#[test]
fn test_localisation_directory() {
    let dir = game_dir();
    let loc = Localisation::load_dir(&dir.path().join("localisation")).expect("load");

    assert_eq!(loc.languages(), vec!["english", "german"]);
    assert_eq!(
        loc.description("tech_basic_science", "english").as_deref(),
        Some("The foundation of Red Lasers research.")
    );
    assert_eq!(
        loc.name("tech_basic_science", "german").as_deref(),
        Some("Grundlagenforschung")
    );
    assert_eq!(loc.name("tech_lasers_1", "german"), None);
}

#[test]
fn test_localisation_directory_missing() {
    let result = Localisation::load_dir(Path::new("/nonexistent/localisation"));
    assert!(result.is_err());
}

// ==========================================================================
// Pipeline Tests
// ==========================================================================

#[test]
fn test_generate_writes_export() {
    let dir = game_dir();
    let out = tempfile::tempdir().expect("output dir");
    let output = out.path().join("json");

    let built = build_tree(dir.path(), &ToolConfig::default()).expect("build");
    assert_eq!(built.tree.len(), 7);
    assert_eq!(built.languages, vec!["english".to_string(), "german".to_string()]);

    let written = export_tree(&built.tree, &output).expect("export");
    assert_eq!(written.len(), 4);

    let metadata = read_json(&output.join("metadata.json"));
    assert_eq!(metadata["maxLevel"], serde_json::json!(2));
    assert_eq!(metadata["areas"], serde_json::json!(["physics", "society"]));
    assert_eq!(metadata["tiers"], serde_json::json!([0, 1, 2]));

    let physics = read_json(&output.join("technologies-physics.json"));
    assert_eq!(physics["area"], "physics");
    let keys: Vec<&str> = physics["technologies"]
        .as_array()
        .expect("technology list")
        .iter()
        .filter_map(|t| t["key"].as_str())
        .collect();
    assert_eq!(keys, vec!["tech_basic_science", "tech_lasers_1", "tech_lasers_2"]);
    assert_eq!(physics["technologies"][1]["name"], "Lasers 1");
    assert_eq!(physics["technologies"][1]["isReverse"], true);
    assert_eq!(
        physics["technologies"][2]["prerequisites"],
        serde_json::json!(["tech_lasers_1"])
    );

    let society = read_json(&output.join("technologies-society.json"));
    assert_eq!(society["technologies"][3]["key"], "tech_gene_tailoring");
    assert_eq!(society["technologies"][3]["level"], 2);

    let localisations = read_json(&output.join("localizations.json"));
    assert_eq!(
        localisations["languages"],
        serde_json::json!(["english", "german"])
    );
    assert_eq!(
        localisations["localizations"]["tech_lasers_1"]["english"]["description"],
        "Focused light.\nVery \"hot\"."
    );
}

#[test]
fn test_generate_without_localisation() {
    let dir = game_dir();
    fs::remove_dir_all(dir.path().join("localisation")).expect("remove localisation");

    let built = build_tree(dir.path(), &ToolConfig::default()).expect("build");
    assert_eq!(built.tree.len(), 7);
    assert!(built.languages.is_empty());
}

#[test]
fn test_generate_rejects_cycle() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(
        &dir.path().join("common/technology/cycle.txt"),
        "tech_a = { prerequisites = { tech_b } }\ntech_b = { prerequisites = { tech_a } }\n",
    );

    let err = build_tree(dir.path(), &ToolConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        ToolError::Research(ResearchError::PrerequisiteCycle(_))
    ));
}

#[test]
fn test_custom_technology_dir_from_config() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(&dir.path().join("mod/tech/a.txt"), SAMPLE_PHYSICS);
    let config = ToolConfig::from_ron_str(r#"(technology_dir: "mod/tech")"#).expect("config");

    let built = build_tree(dir.path(), &config).expect("build");
    assert_eq!(built.tree.len(), 3);
}

// ==========================================================================
// Validation Tests
// ==========================================================================

#[test]
fn test_validate_clean_directory() {
    let dir = game_dir();
    let report = validate_technology_dir(
        &dir.path().join("common/technology"),
        &LoadOptions::default(),
    )
    .expect("validate");
    assert!(report.is_clean());
    assert_eq!(report.technology_count, 7);
    assert_eq!(report.file_count, 2);
}

#[test]
fn test_validate_reports_override_and_missing_prerequisite() {
    let dir = game_dir();
    let tech = dir.path().join("common/technology");
    write(&tech.join("zz_mod_tech.txt"), SAMPLE_OVERRIDE);

    let report = validate_technology_dir(&tech, &LoadOptions::default()).expect("validate");
    assert!(!report.is_clean());
    assert_eq!(report.overrides.len(), 1);
    assert_eq!(report.unresolved_prerequisites.len(), 1);
    assert_eq!(
        report.unresolved_prerequisites[0].prerequisite,
        "tech_unknown_prereq"
    );
    assert!(report.cycle.is_none());
}
