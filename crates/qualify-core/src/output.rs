//! JSON output types for CLI responses.
//!
//! Every response carries `status` and `schema_version` so consumers can
//! branch on success before touching the payload. Field order and collection
//! order are deterministic: the same run produces identical bytes.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::apply::FileOutcome;
use crate::error::{OutputErrorCode, QualifyError};
use crate::types::Location;

/// Schema version of the JSON responses.
pub const SCHEMA_VERSION: &str = "1";

// ============================================================================
// Shared Pieces
// ============================================================================

/// A non-fatal observation about the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    /// Stable warning code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// File the warning applies to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Warning {
    /// Create a simple warning without a file.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Warning {
            code: code.into(),
            message: message.into(),
            file: None,
        }
    }

    /// Attach the file this warning is about.
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }
}

/// Error details for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Numeric error code.
    pub code: u8,
    /// Human-readable message.
    pub message: String,
    /// Error-specific structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Where the error occurred.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl ErrorInfo {
    /// Create from a QualifyError.
    pub fn from_error(err: &QualifyError) -> Self {
        let code = OutputErrorCode::from(err).code();
        let message = err.to_string();

        let (details, location) = match err {
            QualifyError::InvalidArguments { details, .. } => (details.clone(), None),
            QualifyError::ParseError { path, .. } => {
                (Some(serde_json::json!({ "unit": path })), None)
            }
            QualifyError::UnclassifiedSite { unit, location, .. } => {
                (Some(serde_json::json!({ "unit": unit })), location.clone())
            }
            QualifyError::ApplyError { file, .. } => (
                file.as_ref().map(|f| serde_json::json!({ "file": f })),
                None,
            ),
            QualifyError::InternalError { .. } => (None, None),
        };

        ErrorInfo {
            code,
            message,
            details,
            location,
        }
    }
}

// ============================================================================
// Translation Unit Reports
// ============================================================================

/// Outcome of one translation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    /// Processed; its edits were collected.
    Ok,
    /// Excluded from the run; contributed no edits.
    Failed,
}

/// Per-translation-unit counters and status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitReport {
    /// Path of the AST dump.
    pub path: String,
    /// Main source file of the unit, when the dump loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_file: Option<String>,
    /// Outcome.
    pub status: UnitStatus,
    /// References resolving into the target namespace.
    pub candidates: u32,
    /// Locations in the unit's skip set.
    pub skipped: u32,
    /// Candidates that were already qualified.
    pub already_qualified: u32,
    /// Edits emitted by the unit.
    pub edits: u32,
    /// Why the unit failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl UnitReport {
    /// Report for a unit that failed before producing edits.
    pub fn failed(path: impl Into<String>, err: &QualifyError) -> Self {
        UnitReport {
            path: path.into(),
            main_file: None,
            status: UnitStatus::Failed,
            candidates: 0,
            skipped: 0,
            already_qualified: 0,
            edits: 0,
            error: Some(ErrorInfo::from_error(err)),
        }
    }
}

// ============================================================================
// Responses
// ============================================================================

/// Edit statistics for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Translation units processed successfully.
    pub units_processed: u32,
    /// Translation units excluded because of errors.
    pub units_failed: u32,
    /// Files applied (or planned, in a dry run).
    pub files_changed: u32,
    /// Files left untouched because of conflicts or IO errors.
    pub files_failed: u32,
    /// Edits in applied (or planned) files.
    pub edits_count: u32,
    /// Bytes inserted into changed files.
    pub bytes_added: u64,
    /// Identical edits reported by more than one unit, merged into one.
    pub duplicates_merged: u32,
}

impl Summary {
    /// Compute a summary from unit reports and file outcomes.
    pub fn from_outcomes(
        units: &[UnitReport],
        files: &[FileOutcome],
        duplicates_merged: usize,
    ) -> Self {
        Summary {
            units_processed: units
                .iter()
                .filter(|u| u.status == UnitStatus::Ok)
                .count() as u32,
            units_failed: units
                .iter()
                .filter(|u| u.status == UnitStatus::Failed)
                .count() as u32,
            files_changed: files.iter().filter(|f| !f.is_failure()).count() as u32,
            files_failed: files.iter().filter(|f| f.is_failure()).count() as u32,
            edits_count: files
                .iter()
                .filter(|f| !f.is_failure())
                .map(|f| f.edits.len() as u32)
                .sum(),
            bytes_added: files.iter().map(FileOutcome::bytes_added).sum(),
            duplicates_merged: duplicates_merged as u32,
        }
    }
}

/// Response for a qualify run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualifyResponse {
    /// Status: "ok" when every unit loaded and every file applied, else "error".
    pub status: String,
    /// Schema version for compatibility.
    pub schema_version: String,
    /// Target namespace.
    pub namespace: String,
    /// Write mode: in_place, output_dir or dry_run.
    pub mode: String,
    /// Per-unit reports, in input order.
    pub units: Vec<UnitReport>,
    /// Per-file outcomes, in path order.
    pub files: Vec<FileOutcome>,
    /// Run statistics.
    pub summary: Summary,
    /// Non-fatal observations.
    pub warnings: Vec<Warning>,
}

impl QualifyResponse {
    /// Build a response, deriving status and summary from the outcomes.
    pub fn new(
        namespace: impl Into<String>,
        mode: impl Into<String>,
        units: Vec<UnitReport>,
        files: Vec<FileOutcome>,
        warnings: Vec<Warning>,
        duplicates_merged: usize,
    ) -> Self {
        let summary = Summary::from_outcomes(&units, &files, duplicates_merged);
        let failed = summary.units_failed > 0 || summary.files_failed > 0;
        QualifyResponse {
            status: if failed { "error" } else { "ok" }.to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            namespace: namespace.into(),
            mode: mode.into(),
            units,
            files,
            summary,
            warnings,
        }
    }

    /// True when every unit loaded and every file applied.
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Response for errors that prevent a run from starting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Status: "error".
    pub status: String,
    /// Schema version for compatibility.
    pub schema_version: String,
    /// Error information.
    pub error: ErrorInfo,
}

impl ErrorResponse {
    /// Create an error response from a QualifyError.
    pub fn from_error(err: &QualifyError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo::from_error(err),
        }
    }
}

/// Emit a response as pretty-printed JSON to a writer.
///
/// This is the single JSON output path for the CLI.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}

// ============================================================================
// Tests
// ============================================================================
