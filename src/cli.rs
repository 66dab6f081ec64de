//! CLI front door.
//!
//! Helpers behind the `qualify` binary: turning raw arguments into
//! [`QualifyOptions`], running the operation, and rendering the non-JSON
//! output formats. `main.rs` owns argument parsing and process exit codes.
//!
//! All functions return `Result<T, QualifyError>` so failures map onto stable
//! exit codes.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use qualify_core::apply::{FileStatus, WriteMode};
use qualify_core::error::QualifyError;
use qualify_core::filter::PathFilter;
use qualify_core::output::{QualifyResponse, UnitStatus};
use qualify_cxx::loader::{discover_dumps, JsonDumpSource};
use qualify_cxx::matcher::NamespacePattern;
use qualify_cxx::ops::{run, QualifyOptions, QualifyRun};

/// Pick the write mode from the mutually exclusive flags.
pub fn write_mode(dry_run: bool, output_dir: Option<&Path>) -> Result<WriteMode, QualifyError> {
    match (dry_run, output_dir) {
        (true, Some(_)) => Err(QualifyError::invalid_args(
            "--dry-run and --output-dir cannot be combined",
        )),
        (true, None) => Ok(WriteMode::DryRun),
        (false, Some(dir)) => Ok(WriteMode::OutputDir(dir.to_path_buf())),
        (false, None) => Ok(WriteMode::InPlace),
    }
}

/// Build run options from CLI arguments.
pub fn build_options(
    namespace: &str,
    mode: WriteMode,
    exclude: &[String],
    jobs: Option<usize>,
) -> Result<QualifyOptions, QualifyError> {
    let pattern = NamespacePattern::new(namespace)?;
    let exclude = PathFilter::new(exclude)?;
    let mut options = QualifyOptions::new(pattern)
        .with_mode(mode)
        .with_exclude(exclude);
    if let Some(jobs) = jobs {
        if jobs == 0 {
            return Err(QualifyError::invalid_args("--jobs must be at least 1"));
        }
        options = options.with_jobs(jobs);
    }
    Ok(options)
}

/// Discover dumps under `inputs` and run the qualify operation.
pub fn run_qualify(
    inputs: &[PathBuf],
    options: &QualifyOptions,
) -> Result<QualifyRun, QualifyError> {
    if inputs.is_empty() {
        return Err(QualifyError::invalid_args("no inputs given"));
    }
    let dumps = discover_dumps(inputs)?;
    if dumps.is_empty() {
        return Err(QualifyError::invalid_args_with_details(
            "no AST dumps found",
            serde_json::json!({
                "inputs": inputs
                    .iter()
                    .map(|p| p.to_string_lossy().into_owned())
                    .collect::<Vec<_>>(),
            }),
        ));
    }
    run(&JsonDumpSource, &dumps, options)
}

/// Concatenated unified diffs of every file that applied (or would apply).
pub fn render_diff(response: &QualifyResponse) -> String {
    response
        .files
        .iter()
        .filter_map(|f| f.diff.as_deref())
        .collect()
}

/// One line per file and per failed unit, then a totals line.
pub fn render_summary(response: &QualifyResponse) -> String {
    let mut out = String::new();
    for file in &response.files {
        let status = match file.status {
            FileStatus::Applied => "applied",
            FileStatus::Planned => "planned",
            FileStatus::Conflicted => "conflicted",
            FileStatus::Failed => "failed",
        };
        let _ = write!(out, "{:<10} {} ({} edits)", status, file.path, file.edits.len());
        if let Some(conflict) = file.conflicts.first() {
            let _ = write!(out, ": {}", conflict);
        }
        out.push('\n');
    }
    for unit in response
        .units
        .iter()
        .filter(|u| u.status == UnitStatus::Failed)
    {
        let message = unit.error.as_ref().map(|e| e.message.as_str()).unwrap_or("");
        let _ = writeln!(out, "{:<10} {}: {}", "excluded", unit.path, message);
    }
    let summary = &response.summary;
    let _ = writeln!(
        out,
        "{} file(s) changed, {} edit(s), {} of {} unit(s) failed",
        summary.files_changed,
        summary.edits_count,
        summary.units_failed,
        summary.units_processed + summary.units_failed
    );
    out
}

// ============================================================================
// Tests
// ============================================================================
