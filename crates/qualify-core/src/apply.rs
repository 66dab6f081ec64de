//! Apply collected patches to the files on disk.
//!
//! Each file is handled by exactly one worker: patches are grouped by path in
//! the [`PatchSet`] before this module sees them, so parallelism across files
//! needs no further locking.
//!
//! A file whose patch has any conflict is left byte-for-byte unchanged. A file
//! that applies cleanly is replaced atomically (temp file in the same
//! directory, then rename), so readers never observe a partial write.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::diff::generate_unified_diff;
use crate::patch::{ApplyResult, Conflict, FilePatch, OutputEdit, PatchSet};

/// Where rewritten content goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteMode {
    /// Replace each file in place.
    InPlace,
    /// Write each rewritten file under this directory, mirroring its path.
    OutputDir(PathBuf),
    /// Compute and report edits without writing anything.
    DryRun,
}

impl WriteMode {
    /// Stable name used in JSON output.
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteMode::InPlace => "in_place",
            WriteMode::OutputDir(_) => "output_dir",
            WriteMode::DryRun => "dry_run",
        }
    }
}

/// What happened to one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// Edits applied and written.
    Applied,
    /// Edits apply cleanly but nothing was written (dry run).
    Planned,
    /// Conflicts detected; file untouched.
    Conflicted,
    /// Reading or writing the file failed; file untouched.
    Failed,
}

/// Per-file result of the apply step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOutcome {
    /// File path as reported by the translation units.
    pub path: String,
    /// Outcome status.
    pub status: FileStatus,
    /// Edits in offset order.
    pub edits: Vec<OutputEdit>,
    /// Conflicts that prevented apply (empty on success).
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub conflicts: Vec<Conflict>,
    /// Where the rewritten content was written, if anywhere.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub written_to: Option<String>,
    /// Unified diff of the change (absent for failed files).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
}

impl FileOutcome {
    /// True if the file's edits were not applied.
    pub fn is_failure(&self) -> bool {
        matches!(self.status, FileStatus::Conflicted | FileStatus::Failed)
    }

    /// Bytes inserted into this file (zero for failures).
    pub fn bytes_added(&self) -> u64 {
        if self.is_failure() {
            return 0;
        }
        self.edits.iter().map(|e| e.text.len() as u64).sum()
    }

    fn shared_destination(patch: &FilePatch, conflict: Conflict) -> Self {
        warn!(file = %patch.path, %conflict, "file left unmodified");
        FileOutcome {
            path: patch.path.clone(),
            status: FileStatus::Conflicted,
            edits: Vec::new(),
            conflicts: vec![conflict],
            written_to: None,
            diff: None,
        }
    }

    fn io_failure(patch: &FilePatch, edits: Vec<OutputEdit>, err: &io::Error) -> Self {
        warn!(file = %patch.path, error = %err, "file left unmodified");
        FileOutcome {
            path: patch.path.clone(),
            status: FileStatus::Failed,
            edits,
            conflicts: vec![Conflict::Io {
                message: err.to_string(),
            }],
            written_to: None,
            diff: None,
        }
    }
}

/// Apply every file patch in `set`, in parallel across files.
///
/// Outcomes are returned in path order. In [`WriteMode::OutputDir`], files
/// whose mirrored paths coincide are all left unwritten.
pub fn apply_patch_set(set: &PatchSet, mode: &WriteMode) -> Vec<FileOutcome> {
    let patches: Vec<&FilePatch> = set.files().collect();
    let shared = shared_destinations(&patches, mode);
    patches
        .par_iter()
        .map(|patch| match shared.get(patch.path.as_str()) {
            Some(conflict) => FileOutcome::shared_destination(patch, conflict.clone()),
            None => apply_file_patch(patch, mode),
        })
        .collect()
}

/// Conflicts for every patch whose output path another patch also maps to.
fn shared_destinations<'a>(
    patches: &[&'a FilePatch],
    mode: &WriteMode,
) -> BTreeMap<&'a str, Conflict> {
    let WriteMode::OutputDir(dir) = mode else {
        return BTreeMap::new();
    };

    let mut by_destination: BTreeMap<PathBuf, Vec<&'a str>> = BTreeMap::new();
    for patch in patches {
        by_destination
            .entry(mirror_path(dir, Path::new(&patch.path)))
            .or_default()
            .push(patch.path.as_str());
    }

    let mut conflicts = BTreeMap::new();
    for (destination, sources) in by_destination {
        if sources.len() < 2 {
            continue;
        }
        for &source in &sources {
            conflicts.insert(
                source,
                Conflict::SharedDestination {
                    destination: destination.to_string_lossy().into_owned(),
                    others: sources
                        .iter()
                        .filter(|&&other| other != source)
                        .map(|other| other.to_string())
                        .collect(),
                },
            );
        }
    }
    conflicts
}

/// Apply one file's patch, all or nothing.
pub fn apply_file_patch(patch: &FilePatch, mode: &WriteMode) -> FileOutcome {
    let path = Path::new(&patch.path);
    let original = match fs::read(path) {
        Ok(content) => content,
        Err(err) => return FileOutcome::io_failure(patch, Vec::new(), &err),
    };

    let edits = patch.materialize(&original);
    let content = match patch.apply(&original) {
        ApplyResult::Success { content } => content,
        ApplyResult::Failed { conflicts } => {
            for conflict in &conflicts {
                warn!(file = %patch.path, %conflict, "file left unmodified");
            }
            return FileOutcome {
                path: patch.path.clone(),
                status: FileStatus::Conflicted,
                edits,
                conflicts,
                written_to: None,
                diff: None,
            };
        }
    };

    for edit in &edits {
        debug!(
            file = %edit.file,
            line = edit.line,
            col = edit.col,
            rule = edit.rule.as_deref().unwrap_or("-"),
            excerpt = %edit.excerpt,
            "qualify"
        );
    }
    let diff = Some(generate_unified_diff(patch, &original));

    let destination = match mode {
        WriteMode::DryRun => None,
        WriteMode::InPlace => Some(path.to_path_buf()),
        WriteMode::OutputDir(dir) => Some(mirror_path(dir, path)),
    };

    let Some(destination) = destination else {
        return FileOutcome {
            path: patch.path.clone(),
            status: FileStatus::Planned,
            edits,
            conflicts: Vec::new(),
            written_to: None,
            diff,
        };
    };

    if let Err(err) = write_destination(&destination, &content) {
        return FileOutcome::io_failure(patch, edits, &err);
    }
    info!(
        file = %patch.path,
        edits = edits.len(),
        destination = %destination.display(),
        "wrote file"
    );

    FileOutcome {
        path: patch.path.clone(),
        status: FileStatus::Applied,
        edits,
        conflicts: Vec::new(),
        written_to: Some(destination.to_string_lossy().into_owned()),
        diff,
    }
}

fn write_destination(destination: &Path, content: &[u8]) -> io::Result<()> {
    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    atomic_write(destination, content)
}

/// Path of `path` re-rooted under `dir`, dropping root, prefix and `..` components.
pub fn mirror_path(dir: &Path, path: &Path) -> PathBuf {
    let relative: PathBuf = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect();
    dir.join(relative)
}

/// Write content to a file atomically using a temp file in the same directory + rename.
///
/// Readers see either the old or the new content, never a partial write. The
/// original file's permissions are carried over when it exists.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    if let Ok(metadata) = fs::metadata(path) {
        fs::set_permissions(temp.path(), metadata.permissions())?;
    }
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
