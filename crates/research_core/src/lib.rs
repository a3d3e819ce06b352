//! # Research Core
//!
//! Parser and prerequisite graph for Stellaris technology scripts.
//!
//! This crate contains **only** pure logic:
//! - No file system access
//! - No localisation lookups
//! - No output formats
//!
//! Text goes in, typed records and a leveled graph come out. Loading game
//! directories, localisation and JSON export live in `research_tools`.
//!
//! ## Crate Structure
//!
//! - [`value`] - Dynamic script values and scalar classification
//! - [`script`] - Comment stripping, block extraction and block parsing
//! - [`data`] - Technology records and condition trees
//! - [`catalog`] - Last-write-wins technology collection
//! - [`graph`] - Prerequisite graph, levels and grouping indices
//!
//! ## Example
//!
//! ```
//! use research_core::prelude::*;
//!
//! let mut catalog = TechCatalog::new();
//! catalog.parse_file(
//!     r#"
//!     tech_a = { cost = 100 area = physics }
//!     tech_b = { cost = 200 area = physics prerequisites = { "tech_a" } }
//!     "#,
//!     "00_phys.txt",
//! );
//!
//! let tree = TechTree::from_catalog(&catalog);
//! assert_eq!(tree.node("tech_b").map(TechNode::level), Some(1));
//! assert_eq!(tree.max_level(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod catalog;
pub mod data;
pub mod error;
pub mod graph;
pub mod script;
pub mod value;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::catalog::{parse_technologies, Override, TechCatalog};
    pub use crate::data::{
        parse_condition, Condition, LogicOp, TechLocalisation, Technology, WeightModifier,
    };
    pub use crate::error::{ResearchError, Result};
    pub use crate::graph::{check_acyclic, find_prerequisite_cycle, NodeId, TechNode, TechTree};
    pub use crate::value::{parse_value, Block, CompareOp, Value};
}
