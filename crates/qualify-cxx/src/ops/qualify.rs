//! The qualify operation.
//!
//! Inserts `<Namespace>::` before every unqualified reference into the target
//! namespace, across a set of translation units:
//!
//! 1. Load every dump and run the three engine phases, in parallel per unit
//! 2. Merge the units' edits into one patch set keyed by file
//! 3. Drop edits to excluded paths
//! 4. Apply per file, all or nothing, in parallel per file
//!
//! A unit that fails to load or classify contributes nothing; the rest of the
//! run goes on and the failure is reported.

use std::collections::BTreeMap;
use std::path::PathBuf;

use rayon::prelude::*;
use tracing::{debug, info, info_span, warn};

use qualify_core::apply::{apply_patch_set, FileOutcome, WriteMode};
use qualify_core::error::{OutputErrorCode, QualifyError};
use qualify_core::filter::PathFilter;
use qualify_core::output::{QualifyResponse, UnitReport, UnitStatus, Warning};
use qualify_core::patch::{ContentHash, EditLabels, InsertEdit, PatchSet};

use crate::engine::qualify_unit;
use crate::error_bridges::unclassified_site;
use crate::loader::{LoadedUnit, TranslationUnitSource};
use crate::matcher::NamespacePattern;

// ============================================================================
// Options
// ============================================================================

/// Configuration for one run.
#[derive(Debug, Clone)]
pub struct QualifyOptions {
    pub pattern: NamespacePattern,
    pub mode: WriteMode,
    /// Edits to matching paths are dropped.
    pub exclude: PathFilter,
    /// Worker threads; `None` uses rayon's default.
    pub jobs: Option<usize>,
}

impl QualifyOptions {
    /// In-place rewrite with no exclusions.
    pub fn new(pattern: NamespacePattern) -> Self {
        QualifyOptions {
            pattern,
            mode: WriteMode::InPlace,
            exclude: PathFilter::none(),
            jobs: None,
        }
    }

    pub fn with_mode(mut self, mode: WriteMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_exclude(mut self, exclude: PathFilter) -> Self {
        self.exclude = exclude;
        self
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = Some(jobs);
        self
    }
}

// ============================================================================
// Per-Unit Processing
// ============================================================================

/// An edit bound to a resolved file path, ready for the patch set.
#[derive(Debug, Clone)]
pub struct PendingEdit {
    pub path: String,
    /// `path` relative to the unit's base directory, when it lies under it.
    pub relative_path: Option<String>,
    /// Hash of the file content the unit was parsed from.
    pub expected_hash: Option<ContentHash>,
    pub edit: InsertEdit,
}

impl PendingEdit {
    /// True if `filter` matches the resolved path or the base-relative one.
    pub fn is_excluded_by(&self, filter: &PathFilter) -> bool {
        filter.is_excluded(&self.path)
            || self
                .relative_path
                .as_deref()
                .is_some_and(|relative| filter.is_excluded(relative))
    }
}

/// What one unit contributes to a run.
#[derive(Debug, Clone)]
pub struct UnitOutput {
    pub report: UnitReport,
    /// Edits in location order.
    pub edits: Vec<PendingEdit>,
}

/// Locate, skip and qualify one loaded unit.
pub fn process_translation_unit(
    loaded: &LoadedUnit,
    pattern: &NamespacePattern,
) -> Result<UnitOutput, QualifyError> {
    let result =
        qualify_unit(&loaded.unit, pattern).map_err(|err| unclassified_site(loaded, &err))?;

    let origin = loaded.name();
    let edits: Vec<PendingEdit> = result
        .edits
        .iter()
        .map(|edit| PendingEdit {
            path: loaded.resolve(edit.location.file),
            relative_path: loaded.relative(edit.location.file),
            expected_hash: loaded.content_hash(edit.location.file),
            edit: InsertEdit::new(edit.location.offset, edit.text.clone()).with_labels(
                EditLabels {
                    rule: Some(edit.kind.rule().to_string()),
                    target: Some(loaded.unit.decl(edit.target).qualified_name.clone()),
                    origin: Some(origin.clone()),
                },
            ),
        })
        .collect();

    for (rule, count) in result.skip_set.counts_by_rule() {
        debug!(%rule, count, "skipped locations");
    }
    let stats = result.stats;
    info!(
        candidates = stats.candidates,
        skipped = stats.skipped,
        already_qualified = stats.already_qualified,
        edits = stats.edits,
        "processed translation unit"
    );

    Ok(UnitOutput {
        report: UnitReport {
            path: origin,
            main_file: Some(loaded.main_file()),
            status: UnitStatus::Ok,
            candidates: stats.candidates as u32,
            skipped: stats.skipped as u32,
            already_qualified: stats.already_qualified as u32,
            edits: stats.edits as u32,
            error: None,
        },
        edits,
    })
}

// ============================================================================
// Run
// ============================================================================

/// Result of a run.
#[derive(Debug)]
pub struct QualifyRun {
    pub namespace: String,
    pub mode: &'static str,
    /// One report per dump, in input order.
    pub units: Vec<UnitReport>,
    /// One outcome per edited file, in path order.
    pub files: Vec<FileOutcome>,
    pub warnings: Vec<Warning>,
    pub duplicates_merged: usize,
    /// Every unit and file failure.
    pub errors: Vec<QualifyError>,
}

impl QualifyRun {
    /// The failure that decides the exit status.
    pub fn worst_error(&self) -> Option<&QualifyError> {
        self.errors.iter().max_by_key(|e| e.severity())
    }

    /// Exit code of the worst failure, `None` when the run was clean.
    pub fn error_code(&self) -> Option<OutputErrorCode> {
        self.worst_error().map(QualifyError::error_code)
    }

    pub fn into_response(self) -> QualifyResponse {
        QualifyResponse::new(
            self.namespace,
            self.mode,
            self.units,
            self.files,
            self.warnings,
            self.duplicates_merged,
        )
    }
}

/// Qualify every unit in `dumps` and apply the edits.
pub fn run(
    source: &dyn TranslationUnitSource,
    dumps: &[PathBuf],
    options: &QualifyOptions,
) -> Result<QualifyRun, QualifyError> {
    debug!(
        namespace = options.pattern.name(),
        units = dumps.len(),
        exclude = ?options.exclude.patterns(),
        "starting qualify run"
    );
    match options.jobs {
        Some(jobs) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(jobs)
                .build()
                .map_err(|e| QualifyError::internal(format!("failed to start workers: {}", e)))?;
            Ok(pool.install(|| run_units(source, dumps, options)))
        }
        None => Ok(run_units(source, dumps, options)),
    }
}

fn run_units(
    source: &dyn TranslationUnitSource,
    dumps: &[PathBuf],
    options: &QualifyOptions,
) -> QualifyRun {
    let results: Vec<(String, Result<UnitOutput, QualifyError>)> = dumps
        .par_iter()
        .map(|dump| {
            let name = dump.to_string_lossy().into_owned();
            let span = info_span!("translation_unit", path = %name);
            let _guard = span.enter();
            let result = source
                .load(dump)
                .map_err(QualifyError::from)
                .and_then(|loaded| process_translation_unit(&loaded, &options.pattern));
            if let Err(err) = &result {
                warn!(error = %err, "translation unit excluded");
            }
            (name, result)
        })
        .collect();

    let mut units = Vec::with_capacity(results.len());
    let mut errors = Vec::new();
    let mut patches = PatchSet::new();
    let mut excluded: BTreeMap<String, usize> = BTreeMap::new();

    for (name, result) in results {
        match result {
            Ok(output) => {
                for pending in output.edits {
                    if pending.is_excluded_by(&options.exclude) {
                        *excluded.entry(pending.path).or_insert(0) += 1;
                        continue;
                    }
                    patches.add_edit(&pending.path, pending.expected_hash, pending.edit);
                }
                units.push(output.report);
            }
            Err(err) => {
                units.push(UnitReport::failed(name, &err));
                errors.push(err);
            }
        }
    }

    let warnings: Vec<Warning> = excluded
        .into_iter()
        .map(|(path, count)| {
            Warning::new(
                "edits_excluded",
                format!("{} edit(s) dropped by exclusion filter", count),
            )
            .with_file(path)
        })
        .collect();

    info!(
        files = patches.file_count(),
        edits = patches.edit_count(),
        duplicates_merged = patches.duplicates_merged(),
        mode = options.mode.as_str(),
        "applying edits"
    );
    let files = if patches.has_edits() {
        apply_patch_set(&patches, &options.mode)
    } else {
        debug!("nothing to apply");
        Vec::new()
    };
    for outcome in files.iter().filter(|f| f.is_failure()) {
        let message = outcome
            .conflicts
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        errors.push(QualifyError::apply(&outcome.path, message));
    }

    QualifyRun {
        namespace: options.pattern.name().to_string(),
        mode: options.mode.as_str(),
        units,
        files,
        warnings,
        duplicates_merged: patches.duplicates_merged(),
        errors,
    }
}

// ============================================================================
// Tests
// ============================================================================
