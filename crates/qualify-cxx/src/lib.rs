//! C++ namespace qualification for qualify.
//!
//! This crate holds the language-specific half of the tool:
//! - The translation unit tree model and its JSON dump format
//! - Target namespace matching
//! - The reference locator, skip-set builder and qualification engine
//! - Dump discovery and loading
//! - The `qualify` operation tying them to the core patch/apply machinery

pub mod ast;
pub mod engine;
pub mod loader;
pub mod locator;
pub mod matcher;
pub mod ops;
pub mod skip;

// Error bridges - converts crate errors to QualifyError
mod error_bridges;

pub use error_bridges::unclassified_site;
