//! Technology collection with last-write-wins merging.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::Technology;
use crate::script::{parse_block, preprocess, split_top_level};

/// Parse every technology defined in one file's content.
///
/// Technologies are returned in file order and tagged with `source_file`.
/// Duplicate keys within the file are all returned; merging into a
/// [`TechCatalog`] keeps the last one.
#[must_use]
pub fn parse_technologies(source: &str, source_file: &str) -> Vec<Technology> {
    let content = preprocess(source);
    split_top_level(&content)
        .into_iter()
        .map(|block| {
            let mut tech = Technology::from_block(&block.key, &parse_block(&block.body));
            tech.source_file = source_file.to_string();
            tech
        })
        .collect()
}

/// A technology definition replaced by a later one with the same key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Override {
    /// The duplicated key.
    pub key: String,
    /// File of the replaced definition.
    pub previous_file: String,
    /// File of the definition that won.
    pub file: String,
}

/// All known technologies keyed by their identifier.
#[derive(Debug, Clone, Default)]
pub struct TechCatalog {
    technologies: BTreeMap<String, Technology>,
    overrides: Vec<Override>,
}

impl TechCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a technology, replacing any earlier definition with the same
    /// key. The replacement is recorded in [`Self::overrides`].
    pub fn insert(&mut self, tech: Technology) -> Option<Technology> {
        let file = tech.source_file.clone();
        let previous = self.technologies.insert(tech.key.clone(), tech);
        if let Some(prev) = &previous {
            debug!(key = %prev.key, previous = %prev.source_file, file = %file, "Technology overridden");
            self.overrides.push(Override {
                key: prev.key.clone(),
                previous_file: prev.source_file.clone(),
                file,
            });
        }
        previous
    }

    /// Merge a batch of technologies in order.
    pub fn merge<I: IntoIterator<Item = Technology>>(&mut self, technologies: I) {
        for tech in technologies {
            self.insert(tech);
        }
    }

    /// Parse one file's content and merge its technologies.
    ///
    /// Returns the number of technologies the file defined.
    pub fn parse_file(&mut self, source: &str, source_file: &str) -> usize {
        let technologies = parse_technologies(source, source_file);
        let count = technologies.len();
        self.merge(technologies);
        count
    }

    /// Look up a technology by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Technology> {
        self.technologies.get(key)
    }

    /// Mutable lookup by key.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Technology> {
        self.technologies.get_mut(key)
    }

    /// Whether a key is defined.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.technologies.contains_key(key)
    }

    /// Number of distinct technologies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.technologies.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.technologies.is_empty()
    }

    /// Technologies in key order.
    pub fn iter(&self) -> impl Iterator<Item = &Technology> {
        self.technologies.values()
    }

    /// Mutable iteration in key order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Technology> {
        self.technologies.values_mut()
    }

    /// Definitions that replaced an earlier one, in merge order.
    #[must_use]
    pub fn overrides(&self) -> &[Override] {
        &self.overrides
    }
}

impl FromIterator<Technology> for TechCatalog {
    fn from_iter<I: IntoIterator<Item = Technology>>(iter: I) -> Self {
        let mut catalog = Self::new();
        catalog.merge(iter);
        catalog
    }
}

impl Extend<Technology> for TechCatalog {
    fn extend<I: IntoIterator<Item = Technology>>(&mut self, iter: I) {
        self.merge(iter);
    }
}

impl IntoIterator for TechCatalog {
    type Item = Technology;
    type IntoIter = std::collections::btree_map::IntoValues<String, Technology>;

    fn into_iter(self) -> Self::IntoIter {
        self.technologies.into_values()
    }
}

impl<'a> IntoIterator for &'a TechCatalog {
    type Item = &'a Technology;
    type IntoIter = std::collections::btree_map::Values<'a, String, Technology>;

    fn into_iter(self) -> Self::IntoIter {
        self.technologies.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use research_test_utils::fixtures::SAMPLE_PHYSICS;

    #[test]
    fn test_parse_sample_file() {
        let techs = parse_technologies(SAMPLE_PHYSICS, "00_phys_tech.txt");
        assert_eq!(techs.len(), 3);
        assert!(techs.iter().all(|t| t.source_file == "00_phys_tech.txt"));
        assert_eq!(techs[0].key, "tech_basic_science");
    }

    #[test]
    fn test_last_write_wins_across_files() {
        let mut catalog = TechCatalog::new();
        catalog.parse_file("tech_a = { cost = 1 }", "a.txt");
        catalog.parse_file("tech_a = { cost = 2 }", "b.txt");

        assert_eq!(catalog.len(), 1);
        let tech = catalog.get("tech_a").expect("tech_a present");
        assert_eq!(tech.cost, 2);
        assert_eq!(tech.source_file, "b.txt");
        assert_eq!(
            catalog.overrides(),
            &[Override {
                key: "tech_a".to_string(),
                previous_file: "a.txt".to_string(),
                file: "b.txt".to_string(),
            }]
        );
    }

    #[test]
    fn test_get_mut_edits_in_place() {
        let mut catalog = TechCatalog::new();
        catalog.parse_file("tech_a = { cost = 1 }", "a.txt");

        if let Some(tech) = catalog.get_mut("tech_a") {
            tech.area = "physics".to_string();
        }
        assert!(catalog.get_mut("tech_missing").is_none());
        assert_eq!(catalog.get("tech_a").map(|t| t.area.as_str()), Some("physics"));
        assert!(catalog.overrides().is_empty());
    }

    #[test]
    fn test_duplicate_within_file_last_wins() {
        let catalog: TechCatalog =
            parse_technologies("tech_a = { cost = 1 }\ntech_a = { cost = 3 }", "a.txt")
                .into_iter()
                .collect();
        assert_eq!(catalog.get("tech_a").map(|t| t.cost), Some(3));
        assert_eq!(catalog.overrides().len(), 1);
    }

    #[test]
    fn test_iteration_in_key_order() {
        let mut catalog = TechCatalog::new();
        catalog.parse_file("tech_c = { }\ntech_a = { }\ntech_b = { }", "x.txt");
        let keys: Vec<_> = catalog.iter().map(|t| t.key.as_str()).collect();
        assert_eq!(keys, vec!["tech_a", "tech_b", "tech_c"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_technologies("", "empty.txt").is_empty());
        assert!(parse_technologies("# only a comment\n", "c.txt").is_empty());
    }
}
