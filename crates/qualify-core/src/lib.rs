//! Core infrastructure for qualify.
//!
//! This crate provides the language-agnostic half of the tool:
//! - Insertion patches keyed by file, with collision detection
//! - All-or-nothing per-file apply and atomic write-back
//! - Path exclusion filters
//! - Error types and error codes
//! - JSON output types for CLI responses
//! - Text utilities and diff generation

pub mod apply;
pub mod diff;
pub mod error;
pub mod filter;
pub mod output;
pub mod patch;
pub mod text;
pub mod types;
