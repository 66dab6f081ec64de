//! Error types and error code constants for qualify.
//!
//! This module provides a unified error type (`QualifyError`) that bridges
//! domain-specific errors from the different subsystems (dump loading, tree
//! validation, site classification, apply) into a common format suitable for
//! JSON output.
//!
//! ## Error Code Mapping
//!
//! - `2`: Invalid arguments (bad input from caller)
//! - `3`: Parse errors (a translation unit dump could not be loaded)
//! - `4`: Apply errors (a file's edits could not be applied or written)
//! - `10`: Internal errors (matcher configuration defects, unexpected state)

use std::fmt;

use thiserror::Error;

pub use crate::types::Location;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Error codes for JSON output.
///
/// These codes map to CLI exit codes and appear in JSON error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments from caller (bad input, malformed request).
    InvalidArguments = 2,
    /// A translation unit failed to load or validate.
    ParseError = 3,
    /// Failed to apply or write a file's edits.
    ApplyError = 4,
    /// Internal errors (bugs, unexpected state).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for CLI output.
#[derive(Debug, Error)]
pub enum QualifyError {
    /// Invalid arguments from caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments {
        message: String,
        details: Option<serde_json::Value>,
    },

    /// A translation unit could not be loaded; it contributes no edits.
    #[error("failed to load translation unit {path}: {message}")]
    ParseError { path: String, message: String },

    /// A matched site could not be classified; processing of the unit stopped.
    #[error("unclassifiable site in {unit}: {message}")]
    UnclassifiedSite {
        unit: String,
        message: String,
        location: Option<Location>,
    },

    /// Failed to apply changes to a file.
    #[error("apply error: {message}")]
    ApplyError {
        message: String,
        file: Option<String>,
    },

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    InternalError { message: String },
}

// ============================================================================
// Error Code Mapping
// ============================================================================

impl From<&QualifyError> for OutputErrorCode {
    fn from(err: &QualifyError) -> Self {
        match err {
            QualifyError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            QualifyError::ParseError { .. } => OutputErrorCode::ParseError,
            QualifyError::UnclassifiedSite { .. } => OutputErrorCode::InternalError,
            QualifyError::ApplyError { .. } => OutputErrorCode::ApplyError,
            QualifyError::InternalError { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl From<QualifyError> for OutputErrorCode {
    fn from(err: QualifyError) -> Self {
        OutputErrorCode::from(&err)
    }
}

impl From<globset::Error> for QualifyError {
    fn from(err: globset::Error) -> Self {
        QualifyError::invalid_args(format!("invalid glob: {}", err))
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl QualifyError {
    /// Create an invalid arguments error.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        QualifyError::InvalidArguments {
            message: message.into(),
            details: None,
        }
    }

    /// Create an invalid arguments error with JSON details.
    pub fn invalid_args_with_details(
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        QualifyError::InvalidArguments {
            message: message.into(),
            details: Some(details),
        }
    }

    /// Create a parse error for a translation unit.
    pub fn parse(path: impl Into<String>, message: impl Into<String>) -> Self {
        QualifyError::ParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an apply error for one file.
    pub fn apply(file: impl Into<String>, message: impl Into<String>) -> Self {
        QualifyError::ApplyError {
            message: message.into(),
            file: Some(file.into()),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        QualifyError::InternalError {
            message: message.into(),
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> OutputErrorCode {
        OutputErrorCode::from(self)
    }

    /// Ordering used to pick the exit code when a run has several failures.
    ///
    /// Internal errors outrank apply errors, which outrank parse errors.
    pub fn severity(&self) -> u8 {
        match self.error_code() {
            OutputErrorCode::InternalError => 3,
            OutputErrorCode::ApplyError => 2,
            OutputErrorCode::ParseError => 1,
            OutputErrorCode::InvalidArguments => 0,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod error_code_mapping {
        use super::*;

        #[test]
        fn invalid_arguments_maps_to_invalid_arguments() {
            let err = QualifyError::invalid_args("namespace must not be empty");
            assert_eq!(
                OutputErrorCode::from(&err),
                OutputErrorCode::InvalidArguments
            );
            assert_eq!(err.error_code().code(), 2);
        }

        #[test]
        fn parse_error_maps_to_parse_error() {
            let err = QualifyError::parse("a.ast.json", "unexpected end of input");
            assert_eq!(err.error_code(), OutputErrorCode::ParseError);
            assert_eq!(err.error_code().code(), 3);
        }

        #[test]
        fn apply_error_maps_to_apply_error() {
            let err = QualifyError::apply("foo.h", "colliding insertions");
            assert_eq!(err.error_code(), OutputErrorCode::ApplyError);
            assert_eq!(err.error_code().code(), 4);
        }

        #[test]
        fn unclassified_site_maps_to_internal_error() {
            let err = QualifyError::UnclassifiedSite {
                unit: "a.cpp".to_string(),
                message: "elaborated type without a named type".to_string(),
                location: None,
            };
            assert_eq!(err.error_code(), OutputErrorCode::InternalError);
            assert_eq!(err.error_code().code(), 10);
        }

        #[test]
        fn invalid_glob_maps_to_invalid_arguments() {
            let glob_err = globset::Glob::new("[").unwrap_err();
            let err = QualifyError::from(glob_err);
            assert_eq!(err.error_code(), OutputErrorCode::InvalidArguments);
        }
    }

    mod severity {
        use super::*;

        #[test]
        fn internal_outranks_apply_outranks_parse() {
            let internal = QualifyError::internal("bug");
            let apply = QualifyError::apply("a.cpp", "collision");
            let parse = QualifyError::parse("a.ast.json", "bad json");
            assert!(internal.severity() > apply.severity());
            assert!(apply.severity() > parse.severity());
        }
    }

    mod error_display {
        use super::*;

        #[test]
        fn invalid_arguments_display() {
            let err = QualifyError::invalid_args("missing namespace");
            assert_eq!(err.to_string(), "invalid arguments: missing namespace");
        }

        #[test]
        fn parse_error_display() {
            let err = QualifyError::parse("a.ast.json", "bad json");
            assert_eq!(
                err.to_string(),
                "failed to load translation unit a.ast.json: bad json"
            );
        }
    }

    mod output_error_code {
        use super::*;

        #[test]
        fn code_values() {
            assert_eq!(OutputErrorCode::InvalidArguments.code(), 2);
            assert_eq!(OutputErrorCode::ParseError.code(), 3);
            assert_eq!(OutputErrorCode::ApplyError.code(), 4);
            assert_eq!(OutputErrorCode::InternalError.code(), 10);
        }

        #[test]
        fn display_shows_code() {
            assert_eq!(format!("{}", OutputErrorCode::InvalidArguments), "2");
            assert_eq!(format!("{}", OutputErrorCode::InternalError), "10");
        }
    }
}
