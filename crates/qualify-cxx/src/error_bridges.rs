//! Error bridge implementations for C++-specific errors.
//!
//! This module provides `impl From<X> for QualifyError` conversions from the
//! errors of this crate to the unified `QualifyError` type. Locator errors
//! need the unit they came from, so they go through [`unclassified_site`].

use std::fs;

use qualify_core::error::{Location, QualifyError};
use qualify_core::text::byte_offset_to_position;

use crate::ast::SourceLocation;
use crate::loader::{LoadError, LoadedUnit};
use crate::locator::LocateError;
use crate::matcher::PatternError;

// ============================================================================
// Bridge: PatternError -> QualifyError
// ============================================================================

impl From<PatternError> for QualifyError {
    fn from(err: PatternError) -> Self {
        match err {
            PatternError::Regex(message) => QualifyError::internal(message),
            other => QualifyError::invalid_args(other.to_string()),
        }
    }
}

// ============================================================================
// Bridge: LoadError -> QualifyError
// ============================================================================

impl From<LoadError> for QualifyError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::MissingInput { path } => QualifyError::invalid_args_with_details(
                format!("input not found: {}", path),
                serde_json::json!({ "path": path }),
            ),
            LoadError::Io { path, source } => QualifyError::parse(path, source.to_string()),
            LoadError::Json { path, source } => QualifyError::parse(path, source.to_string()),
            LoadError::Tree { path, source } => QualifyError::parse(path, source.to_string()),
        }
    }
}

// ============================================================================
// Bridge: LocateError -> QualifyError
// ============================================================================

/// Convert a locator error into an unclassified-site error for `loaded`.
///
/// The file is read to report a line and column; if that fails the position
/// is reported as 0:0 with the byte offset.
pub fn unclassified_site(loaded: &LoadedUnit, err: &LocateError) -> QualifyError {
    QualifyError::UnclassifiedSite {
        unit: loaded.name(),
        message: err.to_string(),
        location: err.location().map(|loc| resolve_location(loaded, loc)),
    }
}

fn resolve_location(loaded: &LoadedUnit, location: SourceLocation) -> Location {
    let path = loaded.resolve(location.file);
    let (line, col) = fs::read(&path)
        .map(|content| byte_offset_to_position(&content, location.offset as usize))
        .unwrap_or((0, 0));
    Location::with_offset(path, line, col, location.offset)
}

// ============================================================================
// Tests
// ============================================================================
