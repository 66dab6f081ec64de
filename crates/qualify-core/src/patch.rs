//! Patch IR: insertion edits, per-file patches and the cross-unit patch set.
//!
//! This module implements the edit-collection half of the rewriting pipeline:
//! - Zero-width insertion edits with provenance labels
//! - Per-file aggregation with duplicate merging across translation units
//! - Conflict detection (colliding offsets, out-of-bounds offsets, stale content)
//! - All-or-nothing apply against the untouched original text
//!
//! Offsets are always computed against the original file content. Applying
//! insertions in strictly increasing offset order means no offset ever needs
//! to be re-mapped.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::text::{byte_offset_to_position, excerpt};

/// Hash type for content verification (SHA-256, stored as hex string for JSON compatibility).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl ContentHash {
    /// Compute SHA-256 hash of the given bytes, returning hex-encoded string.
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        let result = hasher.finalize();
        ContentHash(hex::encode(result))
    }

    /// Create from an existing hex string without validation.
    pub fn from_hex_unchecked(hex: &str) -> Self {
        ContentHash(hex.to_string())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Edit Operations
// ============================================================================

/// Optional labels for provenance tracking.
///
/// Labels never influence how an edit is applied; they exist for audit output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditLabels {
    /// The rule category that produced this edit (e.g. `value_reference`).
    pub rule: Option<String>,
    /// Fully-qualified name of the declaration the edited reference resolves to.
    pub target: Option<String>,
    /// The translation unit that first reported this edit.
    pub origin: Option<String>,
}

/// A zero-width insertion at a byte offset of one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertEdit {
    /// Byte offset into the original file content.
    pub offset: u64,
    /// The text inserted before the byte at `offset`.
    pub text: String,
    /// Optional provenance labels.
    #[serde(default)]
    pub labels: EditLabels,
}

impl InsertEdit {
    /// Create an insertion edit.
    pub fn new(offset: u64, text: impl Into<String>) -> Self {
        InsertEdit {
            offset,
            text: text.into(),
            labels: EditLabels::default(),
        }
    }

    /// Add labels to this edit.
    pub fn with_labels(mut self, labels: EditLabels) -> Self {
        self.labels = labels;
        self
    }

    /// Two edits are the same edit when they insert the same text at the same offset.
    fn same_insertion(&self, other: &InsertEdit) -> bool {
        self.offset == other.offset && self.text == other.text
    }
}

// ============================================================================
// Conflict Detection
// ============================================================================

/// A detected problem that prevents a file's patch from applying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Conflict {
    /// Two different insertions target the same offset.
    CollidingEdits {
        offset: u64,
        existing: String,
        incoming: String,
    },

    /// An insertion offset lies past the end of the file.
    OffsetOutOfBounds { offset: u64, file_len: u64 },

    /// The file no longer has the content a translation unit was built from.
    StaleContent {
        expected: ContentHash,
        actual: ContentHash,
    },

    /// Another file would be written to the same output path.
    SharedDestination {
        destination: String,
        others: Vec<String>,
    },

    /// IO error while reading or writing the file.
    Io { message: String },
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conflict::CollidingEdits {
                offset,
                existing,
                incoming,
            } => write!(
                f,
                "colliding insertions at offset {}: {:?} vs {:?}",
                offset, existing, incoming
            ),
            Conflict::OffsetOutOfBounds { offset, file_len } => write!(
                f,
                "insertion offset {} is past the end of the file ({} bytes)",
                offset, file_len
            ),
            Conflict::StaleContent { expected, actual } => write!(
                f,
                "file content changed since analysis (expected {}, found {})",
                expected, actual
            ),
            Conflict::SharedDestination {
                destination,
                others,
            } => write!(
                f,
                "output path {} is also the destination of {}",
                destination,
                others.join(", ")
            ),
            Conflict::Io { message } => write!(f, "IO error: {}", message),
        }
    }
}

// ============================================================================
// FilePatch
// ============================================================================

/// Result of attempting to apply a [`FilePatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyResult {
    /// All edits applied; the new file content.
    Success { content: Vec<u8> },

    /// Nothing applied; the conflicts that prevented it.
    Failed { conflicts: Vec<Conflict> },
}

/// All insertions destined for one file, merged across translation units.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilePatch {
    /// File path as reported by the translation units.
    pub path: String,
    /// Content hashes the contributing translation units observed.
    pub expected_hashes: BTreeSet<ContentHash>,
    /// Distinct insertions, in the order they were reported.
    pub edits: Vec<InsertEdit>,
}

impl FilePatch {
    /// Create an empty patch for `path`.
    pub fn new(path: impl Into<String>) -> Self {
        FilePatch {
            path: path.into(),
            expected_hashes: BTreeSet::new(),
            edits: Vec::new(),
        }
    }

    /// Add an edit, merging it into an identical one if already present.
    ///
    /// Returns `false` when the edit was a duplicate.
    pub fn add(&mut self, edit: InsertEdit) -> bool {
        if self.edits.iter().any(|e| e.same_insertion(&edit)) {
            return false;
        }
        self.edits.push(edit);
        true
    }

    /// Record the content hash a translation unit saw for this file.
    pub fn expect_hash(&mut self, hash: ContentHash) {
        self.expected_hashes.insert(hash);
    }

    /// Edits sorted by offset (stable for equal offsets).
    pub fn sorted_edits(&self) -> Vec<&InsertEdit> {
        let mut sorted: Vec<&InsertEdit> = self.edits.iter().collect();
        sorted.sort_by_key(|e| e.offset);
        sorted
    }

    /// Detect everything that would prevent this patch from applying to `content`.
    #[must_use]
    pub fn detect_conflicts(&self, content: &[u8]) -> Vec<Conflict> {
        let mut conflicts = Vec::new();

        if !self.expected_hashes.is_empty() {
            let actual = ContentHash::compute(content);
            for expected in &self.expected_hashes {
                if expected != &actual {
                    conflicts.push(Conflict::StaleContent {
                        expected: expected.clone(),
                        actual: actual.clone(),
                    });
                }
            }
        }

        let file_len = content.len() as u64;
        let sorted = self.sorted_edits();
        for edit in &sorted {
            if edit.offset > file_len {
                conflicts.push(Conflict::OffsetOutOfBounds {
                    offset: edit.offset,
                    file_len,
                });
            }
        }
        for pair in sorted.windows(2) {
            if pair[0].offset == pair[1].offset {
                conflicts.push(Conflict::CollidingEdits {
                    offset: pair[0].offset,
                    existing: pair[0].text.clone(),
                    incoming: pair[1].text.clone(),
                });
            }
        }

        conflicts
    }

    /// Apply this patch to `content`, all or nothing.
    ///
    /// Insertions are applied in strictly increasing offset order; every offset
    /// refers to the original `content`.
    #[must_use]
    pub fn apply(&self, content: &[u8]) -> ApplyResult {
        let conflicts = self.detect_conflicts(content);
        if !conflicts.is_empty() {
            return ApplyResult::Failed { conflicts };
        }

        let added: usize = self.edits.iter().map(|e| e.text.len()).sum();
        let mut output = Vec::with_capacity(content.len() + added);
        let mut cursor = 0usize;
        for edit in self.sorted_edits() {
            let at = edit.offset as usize;
            output.extend_from_slice(&content[cursor..at]);
            output.extend_from_slice(edit.text.as_bytes());
            cursor = at;
        }
        output.extend_from_slice(&content[cursor..]);

        ApplyResult::Success { content: output }
    }

    /// Materialize the edits for output, resolving line/column and excerpts against `content`.
    pub fn materialize(&self, content: &[u8]) -> Vec<OutputEdit> {
        self.sorted_edits()
            .into_iter()
            .map(|edit| {
                let (line, col) = byte_offset_to_position(content, edit.offset as usize);
                OutputEdit {
                    file: self.path.clone(),
                    offset: edit.offset,
                    line,
                    col,
                    text: edit.text.clone(),
                    rule: edit.labels.rule.clone(),
                    target: edit.labels.target.clone(),
                    excerpt: excerpt(content, edit.offset as usize),
                }
            })
            .collect()
    }
}

/// A single insertion as it appears in output (for JSON serialization).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputEdit {
    /// File path.
    pub file: String,
    /// Byte offset of the insertion point.
    pub offset: u64,
    /// 1-indexed line number (for display).
    pub line: u32,
    /// 1-indexed column (for display).
    pub col: u32,
    /// Inserted text.
    pub text: String,
    /// Rule category that produced the edit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
    /// Declaration the edited reference resolves to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Original text at the insertion point.
    pub excerpt: String,
}

// ============================================================================
// PatchSet
// ============================================================================

/// Every file patch produced by a run, keyed by path for deterministic order.
#[derive(Debug, Clone, Default)]
pub struct PatchSet {
    files: BTreeMap<String, FilePatch>,
    duplicates_merged: usize,
}

impl PatchSet {
    /// Create an empty patch set.
    pub fn new() -> Self {
        PatchSet::default()
    }

    /// Add an edit for `path`. Identical edits from several units merge into one.
    ///
    /// Returns `false` when the edit was a duplicate.
    pub fn add_edit(
        &mut self,
        path: &str,
        expected_hash: Option<ContentHash>,
        edit: InsertEdit,
    ) -> bool {
        let patch = self
            .files
            .entry(path.to_string())
            .or_insert_with(|| FilePatch::new(path));
        if let Some(hash) = expected_hash {
            patch.expect_hash(hash);
        }
        let added = patch.add(edit);
        if !added {
            self.duplicates_merged += 1;
        }
        added
    }

    /// Per-file patches in path order.
    pub fn files(&self) -> impl Iterator<Item = &FilePatch> {
        self.files.values()
    }

    /// Patch for one path, if any edit targets it.
    pub fn file(&self, path: &str) -> Option<&FilePatch> {
        self.files.get(path)
    }

    /// Number of files with at least one edit.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Number of distinct edits across all files.
    pub fn edit_count(&self) -> usize {
        self.files.values().map(|f| f.edits.len()).sum()
    }

    /// Number of edits dropped because an identical edit was already present.
    pub fn duplicates_merged(&self) -> usize {
        self.duplicates_merged
    }

    /// Check if this PatchSet contains any edits.
    pub fn has_edits(&self) -> bool {
        self.edit_count() > 0
    }
}

// ============================================================================
// Tests
// ============================================================================
