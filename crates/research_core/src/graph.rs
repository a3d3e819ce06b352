//! Prerequisite graph with level assignment and grouping indices.
//!
//! Nodes live in a single arena and refer to each other by [`NodeId`].
//! Dependency edges point from a technology to its prerequisites, and every
//! edge has a matching dependent edge in the opposite direction.
//!
//! Levels are assigned by a breadth-first pass from the roots: a node is
//! finalized once all of its dependencies are, at one more than the highest
//! dependency level. Roots sit at level 0.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::ops::Index;

use tracing::{debug, warn};

use crate::catalog::TechCatalog;
use crate::data::Technology;
use crate::error::{ResearchError, Result};

/// Index of a node in a [`TechTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in [`TechTree::nodes`].
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A technology together with its resolved edges and level.
#[derive(Debug, Clone)]
pub struct TechNode {
    technology: Technology,
    dependencies: Vec<NodeId>,
    dependents: Vec<NodeId>,
    level: u32,
    finalized: bool,
}

impl TechNode {
    fn new(technology: Technology) -> Self {
        Self {
            technology,
            dependencies: Vec::new(),
            dependents: Vec::new(),
            level: 0,
            finalized: false,
        }
    }

    /// The technology record.
    #[must_use]
    pub const fn technology(&self) -> &Technology {
        &self.technology
    }

    /// Technology key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.technology.key
    }

    /// Depth below the roots.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Whether a level was assigned. Only nodes on a prerequisite cycle
    /// (or downstream of one) stay unassigned.
    #[must_use]
    pub const fn is_leveled(&self) -> bool {
        self.finalized
    }

    /// Resolved prerequisites.
    #[must_use]
    pub fn dependencies(&self) -> &[NodeId] {
        &self.dependencies
    }

    /// Technologies that list this one as a prerequisite.
    #[must_use]
    pub fn dependents(&self) -> &[NodeId] {
        &self.dependents
    }

    /// Whether the node has no resolved prerequisites.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.dependencies.is_empty()
    }
}

/// The built technology graph.
#[derive(Debug, Clone, Default)]
pub struct TechTree {
    nodes: Vec<TechNode>,
    index: HashMap<String, NodeId>,
    roots: Vec<NodeId>,
    max_level: u32,
    by_area: BTreeMap<String, Vec<NodeId>>,
    by_tier: BTreeMap<i64, Vec<NodeId>>,
    by_category: BTreeMap<String, Vec<NodeId>>,
}

impl TechTree {
    /// Build the graph from a set of technologies.
    ///
    /// Prerequisites naming an unknown technology are dropped with a
    /// warning. Duplicate keys keep the last technology. The input is
    /// expected to be acyclic; run [`check_acyclic`] first if it is
    /// untrusted. Leveling stops once no queued node can make progress, so
    /// nodes on a cycle are left without a level.
    pub fn build<I: IntoIterator<Item = Technology>>(technologies: I) -> Self {
        let mut tree = Self::default();
        tree.create_nodes(technologies);
        tree.wire_edges();
        tree.roots = tree
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.is_root())
            .map(|(i, _)| NodeId(i))
            .collect();
        tree.assign_levels();
        tree.build_indices();

        debug!(
            nodes = tree.nodes.len(),
            roots = tree.roots.len(),
            max_level = tree.max_level,
            "Built technology tree"
        );
        tree
    }

    /// Build from a catalog, in key order.
    pub fn from_catalog(catalog: &TechCatalog) -> Self {
        Self::build(catalog.iter().cloned())
    }

    fn create_nodes<I: IntoIterator<Item = Technology>>(&mut self, technologies: I) {
        for tech in technologies {
            match self.index.get(&tech.key) {
                Some(&id) => self.nodes[id.0].technology = tech,
                None => {
                    let id = NodeId(self.nodes.len());
                    self.index.insert(tech.key.clone(), id);
                    self.nodes.push(TechNode::new(tech));
                }
            }
        }
    }

    fn wire_edges(&mut self) {
        let mut edges = Vec::new();
        for (i, node) in self.nodes.iter().enumerate() {
            for prerequisite in &node.technology.prerequisites {
                match self.index.get(prerequisite) {
                    Some(&dep) => edges.push((NodeId(i), dep)),
                    None => warn!(
                        technology = %node.key(),
                        prerequisite = %prerequisite,
                        "Technology has unknown prerequisite"
                    ),
                }
            }
        }

        for (node, dep) in edges {
            self.nodes[node.0].dependencies.push(dep);
            self.nodes[dep.0].dependents.push(node);
        }
    }

    fn assign_levels(&mut self) {
        let mut queue: VecDeque<NodeId> = self.roots.iter().copied().collect();
        let mut deferred = 0usize;
        let mut stalled = 0usize;

        while let Some(id) = queue.pop_front() {
            let node = &self.nodes[id.0];
            if node.finalized {
                continue;
            }

            let ready = node
                .dependencies
                .iter()
                .all(|dep| self.nodes[dep.0].finalized);
            if !ready {
                queue.push_back(id);
                deferred += 1;
                stalled += 1;
                // A full pass over the queue without progress means a cycle.
                if stalled >= queue.len() {
                    warn!(
                        remaining = queue.len(),
                        "Prerequisite cycle blocks leveling; leaving nodes unleveled"
                    );
                    break;
                }
                continue;
            }
            stalled = 0;

            let level = node
                .dependencies
                .iter()
                .map(|dep| self.nodes[dep.0].level + 1)
                .max()
                .unwrap_or(0);

            let node = &mut self.nodes[id.0];
            node.level = level;
            node.finalized = true;
            self.max_level = self.max_level.max(level);
            queue.extend(node.dependents.iter().copied());
        }

        debug!(deferred, max_level = self.max_level, "Assigned technology levels");
    }

    fn build_indices(&mut self) {
        for (i, node) in self.nodes.iter().enumerate() {
            let id = NodeId(i);
            let tech = &node.technology;
            if !tech.area.is_empty() {
                self.by_area.entry(tech.area.clone()).or_default().push(id);
            }
            self.by_tier.entry(tech.tier).or_default().push(id);
            for category in &tech.category {
                self.by_category
                    .entry(category.clone())
                    .or_default()
                    .push(id);
            }
        }
    }

    fn collect(&self, ids: &[NodeId]) -> Vec<&TechNode> {
        ids.iter().map(|id| &self.nodes[id.0]).collect()
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in creation order.
    #[must_use]
    pub fn nodes(&self) -> &[TechNode] {
        &self.nodes
    }

    /// Id of the node with this key.
    #[must_use]
    pub fn id_of(&self, key: &str) -> Option<NodeId> {
        self.index.get(key).copied()
    }

    /// Node with this key.
    #[must_use]
    pub fn node(&self, key: &str) -> Option<&TechNode> {
        self.id_of(key).and_then(|id| self.get(id))
    }

    /// Node by id.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&TechNode> {
        self.nodes.get(id.0)
    }

    /// Nodes without resolved prerequisites.
    #[must_use]
    pub fn roots(&self) -> Vec<&TechNode> {
        self.collect(&self.roots)
    }

    /// Highest assigned level.
    #[must_use]
    pub const fn max_level(&self) -> u32 {
        self.max_level
    }

    /// Nodes in a research area. Technologies with no area are not indexed.
    #[must_use]
    pub fn nodes_by_area(&self, area: &str) -> Vec<&TechNode> {
        self.by_area
            .get(area)
            .map(|ids| self.collect(ids))
            .unwrap_or_default()
    }

    /// Nodes of a tier.
    #[must_use]
    pub fn nodes_by_tier(&self, tier: i64) -> Vec<&TechNode> {
        self.by_tier
            .get(&tier)
            .map(|ids| self.collect(ids))
            .unwrap_or_default()
    }

    /// Nodes listing a category.
    #[must_use]
    pub fn nodes_by_category(&self, category: &str) -> Vec<&TechNode> {
        self.by_category
            .get(category)
            .map(|ids| self.collect(ids))
            .unwrap_or_default()
    }

    /// Distinct non-empty areas, sorted.
    #[must_use]
    pub fn areas(&self) -> Vec<&str> {
        self.by_area.keys().map(String::as_str).collect()
    }

    /// Distinct tiers, ascending.
    #[must_use]
    pub fn tiers(&self) -> Vec<i64> {
        self.by_tier.keys().copied().collect()
    }

    /// Distinct categories, sorted.
    #[must_use]
    pub fn categories(&self) -> Vec<&str> {
        self.by_category.keys().map(String::as_str).collect()
    }

    /// Direct prerequisites of a technology. Empty for unknown keys.
    #[must_use]
    pub fn dependencies(&self, key: &str) -> Vec<&TechNode> {
        self.node(key)
            .map(|node| self.collect(&node.dependencies))
            .unwrap_or_default()
    }

    /// Direct dependents of a technology. Empty for unknown keys.
    #[must_use]
    pub fn dependents(&self, key: &str) -> Vec<&TechNode> {
        self.node(key)
            .map(|node| self.collect(&node.dependents))
            .unwrap_or_default()
    }

    /// Every technology that must be researched before `key`, nearest first.
    pub fn prerequisite_closure(&self, key: &str) -> Result<Vec<&TechNode>> {
        let start = self
            .id_of(key)
            .ok_or_else(|| ResearchError::UnknownTechnology(key.to_string()))?;

        let mut seen = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);
        let mut closure = Vec::new();

        while let Some(id) = queue.pop_front() {
            for &dep in &self.nodes[id.0].dependencies {
                if seen.insert(dep) {
                    closure.push(&self.nodes[dep.0]);
                    queue.push_back(dep);
                }
            }
        }

        Ok(closure)
    }

    /// Nodes with no level because they sit on or behind a cycle.
    #[must_use]
    pub fn unleveled(&self) -> Vec<&TechNode> {
        self.nodes.iter().filter(|n| !n.finalized).collect()
    }
}

impl Index<NodeId> for TechTree {
    type Output = TechNode;

    fn index(&self, id: NodeId) -> &Self::Output {
        &self.nodes[id.0]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    OnPath,
    Done,
}

/// Find one prerequisite cycle among a set of technologies.
///
/// Prerequisites naming unknown technologies are ignored. The returned path
/// starts and ends with the same key, e.g. `[a, b, a]`.
pub fn find_prerequisite_cycle<'a, I>(technologies: I) -> Option<Vec<String>>
where
    I: IntoIterator<Item = &'a Technology>,
{
    let techs: BTreeMap<&str, &Technology> = technologies
        .into_iter()
        .map(|t| (t.key.as_str(), t))
        .collect();
    let mut marks: HashMap<&str, Mark> = HashMap::new();

    for &start in techs.keys() {
        if marks.contains_key(start) {
            continue;
        }
        marks.insert(start, Mark::OnPath);
        let mut path: Vec<(&str, usize)> = vec![(start, 0)];

        while let Some(&(key, next)) = path.last() {
            let prerequisite = techs
                .get(key)
                .and_then(|t| t.prerequisites.get(next))
                .map(String::as_str);

            let Some(prerequisite) = prerequisite else {
                marks.insert(key, Mark::Done);
                path.pop();
                continue;
            };
            if let Some(top) = path.last_mut() {
                top.1 += 1;
            }
            if !techs.contains_key(prerequisite) {
                continue;
            }

            match marks.get(prerequisite) {
                Some(Mark::OnPath) => {
                    let from = path
                        .iter()
                        .position(|&(k, _)| k == prerequisite)
                        .unwrap_or(0);
                    let mut cycle: Vec<String> =
                        path[from..].iter().map(|&(k, _)| k.to_string()).collect();
                    cycle.push(prerequisite.to_string());
                    return Some(cycle);
                }
                Some(Mark::Done) => {}
                None => {
                    marks.insert(prerequisite, Mark::OnPath);
                    path.push((prerequisite, 0));
                }
            }
        }
    }

    None
}

/// Fail with [`ResearchError::PrerequisiteCycle`] if the catalog has one.
pub fn check_acyclic(catalog: &TechCatalog) -> Result<()> {
    match find_prerequisite_cycle(catalog) {
        Some(cycle) => Err(ResearchError::PrerequisiteCycle(cycle)),
        None => Ok(()),
    }
}
