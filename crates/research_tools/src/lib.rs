//! # Stellaris Research Tools
//!
//! File-system side of the research tree:
//! - Technology directory loading
//! - Localisation lookup with `$key$` resolution
//! - JSON export
//! - Data validation

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod config;
pub mod error;
pub mod export;
pub mod loader;
pub mod localisation;
pub mod pipeline;
pub mod validate;
