//! Human-facing source positions.
//!
//! Translation units address text by file id and byte offset; errors and JSON
//! output report `file:line:col` instead. Shared by `error` and `output`.

use serde::{Deserialize, Serialize};

// ============================================================================
// Location Type
// ============================================================================

/// Location of an insertion point in a source file.
///
/// - `file`: Path as reported by the translation unit (required)
/// - `line`: 1-indexed line number (required)
/// - `col`: 1-indexed column, UTF-8 bytes (required)
/// - `offset`: Byte offset from file start (optional)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Location {
    /// File path.
    pub file: String,
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed, UTF-8 bytes).
    pub col: u32,
    /// Byte offset from file start (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
}

impl Location {
    /// Create a new location without a byte offset.
    pub fn new(file: impl Into<String>, line: u32, col: u32) -> Self {
        Location {
            file: file.into(),
            line,
            col,
            offset: None,
        }
    }

    /// Create a location that also records its byte offset.
    pub fn with_offset(file: impl Into<String>, line: u32, col: u32, offset: u64) -> Self {
        Location {
            file: file.into(),
            line,
            col,
            offset: Some(offset),
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.col)
    }
}

// ============================================================================
// Tests
// ============================================================================
