//! Typed technology data.
//!
//! This module maps the dynamic [`Block`](crate::value::Block) values
//! produced by [`crate::script`] onto technology records and condition
//! trees. All structs serialize with serde.
//!
//! **Note:** This module contains no IO - it only defines data types.
//! File loading is handled by `research_tools`.

mod condition;
mod technology;

pub use condition::{parse_condition, Condition, LogicOp};
pub use technology::{parse_weight_modifiers, TechLocalisation, Technology, WeightModifier};
