//! Clausewitz script parsing.
//!
//! The parser is line-oriented. Raw file content goes through three stages:
//!
//! 1. [`preprocess`] strips comments and re-lays the text so that every
//!    entry sits on its own line and every `{` ends a line.
//! 2. [`split_top_level`] cuts the file into named top-level blocks.
//! 3. [`parse_block`] turns each block body into a [`Block`] of typed
//!    values, deciding between map and array for every nested brace pair.
//!
//! None of these stages fail. Unrecognised lines are skipped and
//! unterminated blocks run to the end of the input.
//!
//! [`Block`]: crate::value::Block

mod block;
mod preprocess;
mod splitter;

pub use block::{extract_block, is_array, parse_array, parse_block, Extracted};
pub use preprocess::{normalize_layout, preprocess, strip_comments};
pub use splitter::{split_top_level, TopLevelBlock};
