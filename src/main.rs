//! Binary entry point for the qualify CLI.
//!
//! ## Usage
//!
//! ```bash
//! # Qualify references into `Foo` across every dump under build/ast
//! qualify --namespace Foo build/ast
//!
//! # Preview as a unified diff without touching the tree
//! qualify --namespace Foo --dry-run --format diff build/ast
//!
//! # Write rewritten files elsewhere, leaving vendored headers alone
//! qualify --namespace Foo --output-dir out --exclude 'third_party/**' build/ast
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use qualify::cli::{build_options, render_diff, render_summary, run_qualify, write_mode};
use qualify::error::{OutputErrorCode, QualifyError};
use qualify::output::{emit_response, ErrorResponse};

// ============================================================================
// CLI Structure
// ============================================================================

/// Insert explicit namespace qualifiers into C++ sources.
///
/// Reads AST dumps produced by a C++ frontend and prefixes every unqualified
/// reference into the target namespace with `<namespace>::`. Each file is
/// rewritten atomically or left untouched.
#[derive(Parser, Debug)]
#[command(
    name = "qualify",
    version,
    about = "Insert explicit namespace qualifiers into C++ sources"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    /// Target namespace, e.g. `Foo` or `outer::inner`.
    #[arg(long, short = 'n')]
    namespace: String,

    /// Compute edits without writing any file.
    #[arg(long)]
    dry_run: bool,

    /// Write rewritten files under this directory instead of in place.
    #[arg(long, conflicts_with = "dry_run")]
    output_dir: Option<PathBuf>,

    /// Never edit files matching this glob (repeatable).
    ///
    /// Matched against the resolved path and against the path relative to
    /// the dump's `directory`, so `third_party/**` works either way.
    #[arg(long, value_name = "GLOB")]
    exclude: Vec<String>,

    /// Worker threads for translation unit processing.
    #[arg(long, short = 'j', value_parser = clap::value_parser!(u16).range(1..))]
    jobs: Option<u16>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::default())]
    format: OutputFormat,

    /// AST dump files or directories containing `*.ast.json` dumps.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

/// Logging arguments.
#[derive(Parser, Debug)]
struct GlobalArgs {
    /// Log level (overridden by RUST_LOG).
    #[arg(long, value_enum, default_value = "warn")]
    log_level: LogLevel,

    /// Log line format.
    #[arg(long, value_enum, default_value_t = LogFormat::default())]
    log_format: LogFormat,
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Log line format on stderr.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Output format on stdout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Full JSON response (default).
    #[default]
    Json,
    /// Unified diff of every rewritten file.
    Diff,
    /// One line per file.
    Summary,
}

// ============================================================================
// Main
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.global.log_level, cli.global.log_format);

    match execute(cli) {
        Ok(None) => ExitCode::SUCCESS,
        Ok(Some(code)) => ExitCode::from(code.code()),
        Err(err) => {
            let error_code = OutputErrorCode::from(&err);
            let response = ErrorResponse::from_error(&err);

            // Errors go to stdout as JSON like every other response
            let _ = emit_response(&response, &mut io::stdout());
            let _ = io::stdout().flush();

            ExitCode::from(error_code.code())
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel, format: LogFormat) {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Run the operation and print the response.
///
/// Per-unit and per-file failures are part of a normal response; they only
/// pick the exit code. `Err` means nothing ran at all.
fn execute(cli: Cli) -> Result<Option<OutputErrorCode>, QualifyError> {
    let mode = write_mode(cli.dry_run, cli.output_dir.as_deref())?;
    let options = build_options(
        &cli.namespace,
        mode,
        &cli.exclude,
        cli.jobs.map(usize::from),
    )?;
    let run = run_qualify(&cli.inputs, &options)?;
    let code = run.error_code();
    let response = run.into_response();

    let mut stdout = io::stdout();
    let written = match cli.format {
        OutputFormat::Json => emit_response(&response, &mut stdout),
        OutputFormat::Diff => stdout.write_all(render_diff(&response).as_bytes()),
        OutputFormat::Summary => stdout.write_all(render_summary(&response).as_bytes()),
    };
    written
        .and_then(|()| stdout.flush())
        .map_err(|e| QualifyError::internal(format!("failed to write output: {}", e)))?;

    Ok(code)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod cli_parsing {
        use super::*;

        #[test]
        fn parse_minimal() {
            let cli = Cli::try_parse_from(["qualify", "--namespace", "Foo", "dumps"]).unwrap();
            assert_eq!(cli.namespace, "Foo");
            assert_eq!(cli.inputs, vec![PathBuf::from("dumps")]);
            assert!(!cli.dry_run);
            assert!(cli.output_dir.is_none());
            assert_eq!(cli.format, OutputFormat::Json);
            assert_eq!(cli.global.log_format, LogFormat::Text);
        }

        #[test]
        fn parse_all_options() {
            let cli = Cli::try_parse_from([
                "qualify",
                "-n",
                "outer::inner",
                "--output-dir",
                "out",
                "--exclude",
                "third_party/**",
                "--exclude",
                "/usr/**",
                "-j",
                "4",
                "--format",
                "summary",
                "--log-level",
                "debug",
                "--log-format",
                "json",
                "a.ast.json",
                "b.ast.json",
            ])
            .unwrap();
            assert_eq!(cli.namespace, "outer::inner");
            assert_eq!(cli.output_dir, Some(PathBuf::from("out")));
            assert_eq!(cli.exclude, vec!["third_party/**", "/usr/**"]);
            assert_eq!(cli.jobs, Some(4));
            assert_eq!(cli.format, OutputFormat::Summary);
            assert!(matches!(cli.global.log_level, LogLevel::Debug));
            assert_eq!(cli.global.log_format, LogFormat::Json);
            assert_eq!(cli.inputs.len(), 2);
        }

        #[test]
        fn namespace_is_required() {
            assert!(Cli::try_parse_from(["qualify", "dumps"]).is_err());
        }

        #[test]
        fn inputs_are_required() {
            assert!(Cli::try_parse_from(["qualify", "--namespace", "Foo"]).is_err());
        }

        #[test]
        fn dry_run_conflicts_with_output_dir() {
            let result = Cli::try_parse_from([
                "qualify",
                "--namespace",
                "Foo",
                "--dry-run",
                "--output-dir",
                "out",
                "dumps",
            ]);
            assert!(result.is_err());
        }

        #[test]
        fn zero_jobs_rejected() {
            let result =
                Cli::try_parse_from(["qualify", "--namespace", "Foo", "-j", "0", "dumps"]);
            assert!(result.is_err());
        }

        #[test]
        fn diff_format() {
            let cli = Cli::try_parse_from([
                "qualify",
                "--namespace",
                "Foo",
                "--dry-run",
                "--format",
                "diff",
                "dumps",
            ])
            .unwrap();
            assert!(cli.dry_run);
            assert_eq!(cli.format, OutputFormat::Diff);
        }
    }
}
