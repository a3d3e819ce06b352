//! Test fixtures and helpers.
//!
//! Small technology files in the game's own script style, matching
//! localisation, and builders for hand-made technologies.

use std::fmt::Write;

use research_core::data::Technology;

/// Three physics technologies forming a chain, with comments and a
/// scripted variable outside any block.
pub const SAMPLE_PHYSICS: &str = r#"
# Physics research
@tier1cost1 = 500

tech_basic_science = {
    cost = 0
    area = physics
    tier = 0
    category = { computing }
    start_tech = yes
    weight = 0
}

tech_lasers_1 = {
    cost = @tier1cost1
    area = physics
    tier = 1
    category = { particles }
    prerequisites = { "tech_basic_science" }
    weight = 100
    is_reverse_engineerable = yes
}

tech_lasers_2 = {
    cost = 1200
    area = physics
    tier = 2
    category = { particles }
    prerequisites = { "tech_lasers_1" }
    weight = 75
    weight_modifiers = {
        factor = 1.5
        modifier = {
            factor = 2
            has_ethic = ethic_materialist
        }
    }
}
"#;

/// Society technologies with a potential block and a diamond dependency.
pub const SAMPLE_SOCIETY: &str = r#"
tech_planetary_unification = {
    cost = 0
    area = society
    tier = 0
    category = { statecraft }
    start_tech = yes
}

tech_genome_mapping = {
    cost = 800
    area = society
    tier = 1
    category = { biology }
    prerequisites = { "tech_planetary_unification" }
}

tech_colonization_1 = {
    cost = 800
    area = society
    tier = 1
    category = { new_worlds }
    prerequisites = { "tech_planetary_unification" }
}

tech_gene_tailoring = {
    cost = 2000
    area = society
    tier = 2
    category = { biology }
    prerequisites = { "tech_genome_mapping" "tech_colonization_1" }
    is_rare = yes
    potential = {
        NOT = { has_authority = auth_machine_intelligence }
    }
}
"#;

/// Redefines `tech_lasers_2` the way a later mod file would.
pub const SAMPLE_OVERRIDE: &str = r#"
tech_lasers_2 = {
    cost = 999
    area = physics
    tier = 2
    category = { particles }
    prerequisites = { "tech_lasers_1" "tech_unknown_prereq" }
}
"#;

/// English localisation for the sample technologies.
pub const SAMPLE_LOCALISATION_ENGLISH: &str = "\u{feff}l_english:
 # names
 tech_basic_science:0 \"Basic Science\"
 tech_basic_science_desc:0 \"The foundation of $tech_lasers_1$ research.\"
 tech_lasers_1:0 \"Red Lasers\"
 tech_lasers_1_desc: \"Focused light.\\nVery \\\"hot\\\".\"
 tech_lasers_2:1 \"Blue Lasers\"
";

/// German localisation with a partial set of keys.
pub const SAMPLE_LOCALISATION_GERMAN: &str = "l_german:
 tech_basic_science:0 \"Grundlagenforschung\"
";

/// Create a technology with prerequisites and default fields.
#[must_use]
pub fn technology(key: &str, prerequisites: &[&str]) -> Technology {
    Technology {
        prerequisites: prerequisites.iter().map(|p| (*p).to_string()).collect(),
        ..Technology::new(key)
    }
}

/// Create a technology in an area and tier.
#[must_use]
pub fn technology_in(key: &str, area: &str, tier: i64, prerequisites: &[&str]) -> Technology {
    Technology {
        area: area.to_string(),
        tier,
        ..technology(key, prerequisites)
    }
}

/// Render a technology back to script text.
///
/// Only the fields a parse can recover are written: cost, area, tier,
/// categories, prerequisites, weight and the common flags.
#[must_use]
pub fn render_technology(tech: &Technology) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} = {{", tech.key);
    let _ = writeln!(out, "    cost = {}", tech.cost);
    if !tech.area.is_empty() {
        let _ = writeln!(out, "    area = {}", tech.area);
    }
    let _ = writeln!(out, "    tier = {}", tech.tier);
    if !tech.category.is_empty() {
        let _ = writeln!(out, "    category = {{ {} }}", tech.category.join(" "));
    }
    if !tech.prerequisites.is_empty() {
        let quoted: Vec<String> = tech
            .prerequisites
            .iter()
            .map(|p| format!("\"{p}\""))
            .collect();
        let _ = writeln!(out, "    prerequisites = {{ {} }}", quoted.join(" "));
    }
    let _ = writeln!(out, "    weight = {}", tech.weight);
    for (flag, set) in [
        ("start_tech", tech.is_start_tech),
        ("is_rare", tech.is_rare),
        ("is_dangerous", tech.is_dangerous),
        ("is_repeatable", tech.is_repeatable),
    ] {
        if set {
            let _ = writeln!(out, "    {flag} = yes");
        }
    }
    out.push_str("}\n");
    out
}

/// Render several technologies as one file.
#[must_use]
pub fn render_file(technologies: &[Technology]) -> String {
    technologies
        .iter()
        .map(render_technology)
        .collect::<Vec<_>>()
        .join("\n")
}
