//! Typed technology records built from parsed script blocks.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::condition::{parse_condition, Condition};
use crate::value::{Block, Value};

/// Display strings for one language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechLocalisation {
    /// Display name.
    pub name: String,
    /// Description text.
    pub description: String,
}

/// One entry of `weight_modifiers`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightModifier {
    /// Multiplicative factor. Zero when absent.
    pub factor: f64,
    /// Additive term. Zero when absent.
    pub add: f64,
    /// Conditions guarding a nested `modifier` block.
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl WeightModifier {
    /// Build from a nested `modifier = { ... }` block.
    ///
    /// `factor` and `add` are read as numbers, every other entry becomes a
    /// condition.
    #[must_use]
    pub fn from_block(block: &Block) -> Self {
        Self {
            factor: block
                .get("factor")
                .and_then(Value::as_number)
                .unwrap_or_default(),
            add: block.get("add").and_then(Value::as_number).unwrap_or_default(),
            conditions: block
                .iter()
                .filter(|(key, _)| !matches!(key.as_str(), "factor" | "add"))
                .map(|(key, value)| Condition::from_entry(key, value))
                .collect(),
        }
    }
}

/// Extract modifiers from a `weight_modifiers` block.
///
/// A top-level `factor` and a top-level `add` each produce a modifier of
/// their own, in that order, followed by a nested `modifier` block if
/// present.
#[must_use]
pub fn parse_weight_modifiers(block: &Block) -> Vec<WeightModifier> {
    let mut modifiers = Vec::new();

    if let Some(factor) = block.get("factor") {
        modifiers.push(WeightModifier {
            factor: factor.as_number().unwrap_or_default(),
            ..WeightModifier::default()
        });
    }
    if let Some(add) = block.get("add") {
        modifiers.push(WeightModifier {
            add: add.as_number().unwrap_or_default(),
            ..WeightModifier::default()
        });
    }
    if let Some(modifier) = block.get("modifier").and_then(Value::as_map) {
        modifiers.push(WeightModifier::from_block(modifier));
    }

    modifiers
}

/// A Stellaris technology.
///
/// Every field has a defined default, so a block with missing or
/// wrong-typed entries still yields a usable record.
///
/// # Example script
///
/// ```text
/// tech_lasers_1 = {
///     cost = 500
///     area = physics
///     tier = 1
///     category = { particles }
///     prerequisites = { "tech_basic_science" }
///     weight = 100
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Technology {
    /// Unique identifier, the block name.
    pub key: String,

    /// Display strings keyed by language.
    #[serde(default)]
    pub localisations: BTreeMap<String, TechLocalisation>,

    /// Research cost.
    #[serde(default)]
    pub cost: i64,

    /// Research area (`physics`, `society`, `engineering`).
    #[serde(default)]
    pub area: String,

    /// Tier number.
    #[serde(default)]
    pub tier: i64,

    /// Category names.
    #[serde(default)]
    pub category: Vec<String>,

    /// Keys of technologies that must be researched first.
    #[serde(default)]
    pub prerequisites: Vec<String>,

    /// Draw weight.
    #[serde(default)]
    pub weight: i64,

    /// Base draw weight. Only float literals are accepted.
    #[serde(default)]
    pub base_weight: f64,

    /// Name of the file that defined this technology.
    #[serde(default)]
    pub source_file: String,

    /// Icon name. Defaults to the key.
    #[serde(default)]
    pub icon: String,

    /// Known from game start.
    #[serde(default)]
    pub is_start_tech: bool,

    /// Dangerous technology.
    #[serde(default)]
    pub is_dangerous: bool,

    /// Rare technology.
    #[serde(default)]
    pub is_rare: bool,

    /// Granted by events only.
    #[serde(default)]
    pub is_event: bool,

    /// Can be gained from debris.
    #[serde(default)]
    pub is_reverse_engineerable: bool,

    /// Repeatable technology.
    #[serde(default)]
    pub is_repeatable: bool,

    /// Number of levels, `-1` for unlimited repeatables.
    #[serde(default)]
    pub levels: i64,

    /// Restricted to gestalt empires.
    #[serde(default)]
    pub is_gestalt: bool,

    /// Restricted to megacorporations.
    #[serde(default)]
    pub is_megacorp: bool,

    /// Restricted to machine empires.
    #[serde(default)]
    pub is_machine_empire: bool,

    /// Restricted to hive minds.
    #[serde(default)]
    pub is_hive_empire: bool,

    /// Restricted to driven assimilators.
    #[serde(default)]
    pub is_drive_assimilator: bool,

    /// Restricted to rogue servitors.
    #[serde(default)]
    pub is_rogue_servitor: bool,

    /// Features unlocked on completion.
    #[serde(default)]
    pub feature_unlocks: Vec<String>,

    /// Draw weight modifiers.
    #[serde(default)]
    pub weight_modifiers: Vec<WeightModifier>,

    /// Availability condition.
    #[serde(default)]
    pub potential: Option<Condition>,

    /// AI update hint.
    #[serde(default)]
    pub ai_update_type: Option<String>,

    /// Gateway technology group.
    #[serde(default)]
    pub gateway: Option<String>,
}

fn string_list(block: &Block, key: &str) -> Vec<String> {
    block
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn flag(block: &Block, key: &str) -> bool {
    match block.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s == "yes" || s == "true",
        _ => false,
    }
}

fn int(block: &Block, key: &str) -> i64 {
    block.get(key).and_then(Value::as_int).unwrap_or_default()
}

fn text(block: &Block, key: &str) -> Option<String> {
    block.get(key).and_then(Value::as_str).map(str::to_string)
}

impl Technology {
    /// Create an empty technology whose icon is its key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            icon: key.clone(),
            key,
            ..Self::default()
        }
    }

    /// Map a parsed block onto a technology.
    ///
    /// Integer fields (`cost`, `tier`, `weight`, `levels`) accept only
    /// integer values and `base_weight` accepts only floats. Flags accept
    /// booleans or the strings `yes`/`true`. Lists keep only their string
    /// elements. Unknown keys are ignored.
    #[must_use]
    pub fn from_block(key: &str, block: &Block) -> Self {
        Self {
            key: key.to_string(),
            icon: text(block, "icon").unwrap_or_else(|| key.to_string()),
            cost: int(block, "cost"),
            area: text(block, "area").unwrap_or_default(),
            tier: int(block, "tier"),
            category: string_list(block, "category"),
            prerequisites: string_list(block, "prerequisites"),
            weight: int(block, "weight"),
            base_weight: block
                .get("base_weight")
                .and_then(Value::as_float)
                .unwrap_or_default(),
            is_start_tech: flag(block, "start_tech"),
            is_dangerous: flag(block, "is_dangerous"),
            is_rare: flag(block, "is_rare"),
            is_event: flag(block, "is_event_tech"),
            is_reverse_engineerable: flag(block, "is_reverse_engineerable"),
            is_repeatable: flag(block, "is_repeatable"),
            levels: int(block, "levels"),
            is_gestalt: flag(block, "is_gestalt"),
            is_megacorp: flag(block, "is_megacorp"),
            is_machine_empire: flag(block, "is_machine_empire"),
            is_hive_empire: flag(block, "is_hive_empire"),
            is_drive_assimilator: flag(block, "is_drive_assimilator"),
            is_rogue_servitor: flag(block, "is_rogue_servitor"),
            feature_unlocks: string_list(block, "feature_unlocks"),
            weight_modifiers: block
                .get("weight_modifiers")
                .and_then(Value::as_map)
                .map(parse_weight_modifiers)
                .unwrap_or_default(),
            potential: block
                .get("potential")
                .and_then(Value::as_map)
                .and_then(parse_condition),
            ai_update_type: text(block, "ai_update_type"),
            gateway: text(block, "gateway"),
            ..Self::default()
        }
    }

    /// Check if this technology has a specific prerequisite.
    #[must_use]
    pub fn requires(&self, key: &str) -> bool {
        self.prerequisites.iter().any(|p| p == key)
    }

    /// Check if this technology belongs to a category.
    #[must_use]
    pub fn in_category(&self, category: &str) -> bool {
        self.category.iter().any(|c| c == category)
    }

    /// Whether any empire-type restriction flag is set.
    #[must_use]
    pub const fn is_restricted(&self) -> bool {
        self.is_gestalt
            || self.is_megacorp
            || self.is_machine_empire
            || self.is_hive_empire
            || self.is_drive_assimilator
            || self.is_rogue_servitor
    }

    /// Display name in a language, if localised.
    #[must_use]
    pub fn name(&self, language: &str) -> Option<&str> {
        self.localisations
            .get(language)
            .map(|l| l.name.as_str())
            .filter(|n| !n.is_empty())
    }

    /// Description in a language, if localised.
    #[must_use]
    pub fn description(&self, language: &str) -> Option<&str> {
        self.localisations
            .get(language)
            .map(|l| l.description.as_str())
            .filter(|d| !d.is_empty())
    }
}
