//! Translation unit loading.
//!
//! The C++ frontend runs out of process and serializes each parsed translation
//! unit to a `*.ast.json` dump. This module discovers dumps, loads them through
//! the [`TranslationUnitSource`] seam and resolves file paths the way the
//! frontend saw them.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use qualify_core::patch::ContentHash;
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

use crate::ast::{FileId, TranslationUnit, TranslationUnitDump, TreeError};

/// File name suffix of AST dumps.
pub const DUMP_SUFFIX: &str = ".ast.json";

// ============================================================================
// Error Types
// ============================================================================

/// Errors while finding or loading dumps.
#[derive(Debug, Error)]
pub enum LoadError {
    /// An input path does not exist.
    #[error("input not found: {path}")]
    MissingInput { path: String },

    /// Reading a dump failed.
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    /// A dump is not valid JSON for the dump schema.
    #[error("malformed dump {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// A dump parsed but its tree is inconsistent.
    #[error("invalid tree in {path}: {source}")]
    Tree {
        path: String,
        #[source]
        source: TreeError,
    },
}

impl LoadError {
    /// The dump or input path the error is about.
    pub fn path(&self) -> &str {
        match self {
            LoadError::MissingInput { path }
            | LoadError::Io { path, .. }
            | LoadError::Json { path, .. }
            | LoadError::Tree { path, .. } => path,
        }
    }
}

// ============================================================================
// Loaded Units
// ============================================================================

/// A validated translation unit plus where it came from.
#[derive(Debug, Clone)]
pub struct LoadedUnit {
    /// Path of the dump it was loaded from.
    pub dump_path: PathBuf,
    /// Directory relative file paths resolve against.
    pub base_dir: PathBuf,
    pub unit: TranslationUnit,
}

impl LoadedUnit {
    /// Build from a validated unit, resolving its base directory.
    ///
    /// The unit's own `directory` wins; a relative one is taken relative to the
    /// dump's directory. Without one, the dump's directory is used.
    pub fn new(dump_path: impl Into<PathBuf>, unit: TranslationUnit) -> Self {
        let dump_path = dump_path.into();
        let dump_dir = dump_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let base_dir = match unit.directory() {
            Some(dir) => dump_dir.join(dir),
            None => dump_dir,
        };
        LoadedUnit {
            dump_path,
            base_dir: normalize(&base_dir),
            unit,
        }
    }

    /// Display name of the unit: its dump path.
    pub fn name(&self) -> String {
        self.dump_path.to_string_lossy().into_owned()
    }

    /// Path of `file` as used for patch keys and file IO.
    pub fn resolve(&self, file: FileId) -> String {
        let path = Path::new(&self.unit.file(file).path);
        normalize(&self.base_dir.join(path))
            .to_string_lossy()
            .into_owned()
    }

    /// Path of `file` relative to the base directory, if it lies under it.
    pub fn relative(&self, file: FileId) -> Option<String> {
        let resolved = normalize(&self.base_dir.join(&self.unit.file(file).path));
        resolved
            .strip_prefix(&self.base_dir)
            .ok()
            .filter(|rest| !rest.as_os_str().is_empty())
            .map(|rest| rest.to_string_lossy().into_owned())
    }

    /// Main source file path, resolved.
    pub fn main_file(&self) -> String {
        normalize(&self.base_dir.join(self.unit.main_file()))
            .to_string_lossy()
            .into_owned()
    }

    /// Content hash the frontend recorded for `file`, if any.
    pub fn content_hash(&self, file: FileId) -> Option<ContentHash> {
        self.unit
            .file(file)
            .content_hash
            .as_deref()
            .map(ContentHash::from_hex_unchecked)
    }
}

/// Lexically normalize a path: drop `.` and fold `..` into its parent where possible.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(out.components().next_back(), Some(Component::Normal(_)));
                if can_pop {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

// ============================================================================
// Sources
// ============================================================================

/// Where translation units come from.
///
/// Implementations must be shareable across the worker pool.
pub trait TranslationUnitSource: Send + Sync {
    /// Load and validate one translation unit.
    fn load(&self, path: &Path) -> Result<LoadedUnit, LoadError>;
}

/// Loads `*.ast.json` dumps from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDumpSource;

impl JsonDumpSource {
    /// Parse dump text that was read from `path`.
    pub fn parse(path: &Path, text: &str) -> Result<LoadedUnit, LoadError> {
        let display = path.to_string_lossy().into_owned();
        let dump: TranslationUnitDump =
            serde_json::from_str(text).map_err(|source| LoadError::Json {
                path: display.clone(),
                source,
            })?;
        let unit = TranslationUnit::from_dump(dump).map_err(|source| LoadError::Tree {
            path: display,
            source,
        })?;
        Ok(LoadedUnit::new(path, unit))
    }
}

impl TranslationUnitSource for JsonDumpSource {
    fn load(&self, path: &Path) -> Result<LoadedUnit, LoadError> {
        let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_string_lossy().into_owned(),
            source,
        })?;
        let loaded = Self::parse(path, &text)?;
        debug!(
            dump = %path.display(),
            files = loaded.unit.files().len(),
            decls = loaded.unit.decls().len(),
            nodes = loaded.unit.node_count(),
            "loaded translation unit"
        );
        Ok(loaded)
    }
}

// ============================================================================
// Discovery
// ============================================================================

/// Expand inputs into dump paths.
///
/// Files are taken as given; directories are searched recursively for
/// `*.ast.json`, in sorted order. Duplicates keep their first position.
pub fn discover_dumps(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, LoadError> {
    let mut dumps: Vec<PathBuf> = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(input)
                .follow_links(false)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .filter(|e| e.file_name().to_string_lossy().ends_with(DUMP_SUFFIX))
                .map(|e| e.into_path())
                .collect();
            found.sort();
            dumps.extend(found);
        } else if input.is_file() {
            dumps.push(input.clone());
        } else {
            return Err(LoadError::MissingInput {
                path: input.to_string_lossy().into_owned(),
            });
        }
    }

    let mut seen = std::collections::HashSet::new();
    dumps.retain(|p| seen.insert(p.clone()));
    Ok(dumps)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{DeclKind, TreeBuilder};
    use tempfile::TempDir;

    fn write_dump(dir: &Path, name: &str, builder: TreeBuilder) -> PathBuf {
        let path = dir.join(name);
        let json = serde_json::to_string_pretty(&builder.into_dump()).unwrap();
        fs::write(&path, json).unwrap();
        path
    }

    mod paths {
        use super::*;

        #[test]
        fn normalize_folds_dots() {
            assert_eq!(
                normalize(Path::new("/build/./src/../include/foo.h")),
                PathBuf::from("/build/include/foo.h")
            );
            assert_eq!(normalize(Path::new("../a/./b")), PathBuf::from("../a/b"));
            assert_eq!(normalize(Path::new("/../a")), PathBuf::from("/a"));
        }

        #[test]
        fn relative_files_resolve_against_directory() {
            let mut b = TreeBuilder::new("src/a.cpp").directory("/build");
            let header = b.file("../include/foo.h");
            let loaded = LoadedUnit::new("/dumps/a.ast.json", b.build().unwrap());
            assert_eq!(loaded.main_file(), "/build/src/a.cpp");
            assert_eq!(loaded.resolve(header), "/include/foo.h");
        }

        #[test]
        fn without_directory_files_resolve_against_dump_dir() {
            let b = TreeBuilder::new("a.cpp");
            let loaded = LoadedUnit::new("/dumps/x/a.ast.json", b.build().unwrap());
            assert_eq!(loaded.main_file(), "/dumps/x/a.cpp");
        }

        #[test]
        fn absolute_files_are_kept() {
            let mut b = TreeBuilder::new("a.cpp").directory("/build");
            let sys = b.file("/usr/include/foo.h");
            let loaded = LoadedUnit::new("a.ast.json", b.build().unwrap());
            assert_eq!(loaded.resolve(sys), "/usr/include/foo.h");
        }

        #[test]
        fn relative_path_is_taken_from_the_base_directory() {
            let mut b = TreeBuilder::new("src/a.cpp").directory("/build");
            let vendored = b.file("third_party/zlib/zlib.h");
            let outside = b.file("../include/foo.h");
            let sys = b.file("/usr/include/stdio.h");
            let inside_abs = b.file("/build/gen/config.h");
            let loaded = LoadedUnit::new("/dumps/a.ast.json", b.build().unwrap());

            assert_eq!(
                loaded.relative(vendored).as_deref(),
                Some("third_party/zlib/zlib.h")
            );
            assert_eq!(loaded.relative(inside_abs).as_deref(), Some("gen/config.h"));
            assert_eq!(loaded.relative(outside), None);
            assert_eq!(loaded.relative(sys), None);
        }
    }

    mod loading {
        use super::*;

        #[test]
        fn loads_valid_dump() {
            let dir = TempDir::new().unwrap();
            let mut b = TreeBuilder::new("a.cpp");
            let g = b.decl(DeclKind::Function, "Foo::g");
            b.decl_ref(None, b.loc(b.main(), 0), g);
            let path = write_dump(dir.path(), "a.ast.json", b);

            let loaded = JsonDumpSource.load(&path).unwrap();
            assert_eq!(loaded.unit.node_count(), 1);
            assert_eq!(loaded.base_dir, dir.path());
        }

        #[test]
        fn malformed_json_is_a_json_error() {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("bad.ast.json");
            fs::write(&path, "{ not json").unwrap();
            assert!(matches!(
                JsonDumpSource.load(&path),
                Err(LoadError::Json { .. })
            ));
        }

        #[test]
        fn inconsistent_tree_is_a_tree_error() {
            let mut dump = TreeBuilder::new("a.cpp").into_dump();
            dump.roots.push(crate::ast::NodeId(3));
            let text = serde_json::to_string(&dump).unwrap();
            let err = JsonDumpSource::parse(Path::new("x.ast.json"), &text).unwrap_err();
            assert!(matches!(err, LoadError::Tree { .. }));
            assert_eq!(err.path(), "x.ast.json");
        }

        #[test]
        fn missing_dump_is_an_io_error() {
            let err = JsonDumpSource
                .load(Path::new("/nonexistent/a.ast.json"))
                .unwrap_err();
            assert!(matches!(err, LoadError::Io { .. }));
        }

        #[test]
        fn content_hash_is_exposed() {
            let mut b = TreeBuilder::new("a.cpp");
            let main = b.main();
            b.set_content_hash(main, "abc123");
            let loaded = LoadedUnit::new("a.ast.json", b.build().unwrap());
            assert_eq!(
                loaded.content_hash(main),
                Some(ContentHash::from_hex_unchecked("abc123"))
            );
        }
    }

    mod discovery {
        use super::*;

        #[test]
        fn directories_are_searched_recursively() {
            let dir = TempDir::new().unwrap();
            fs::create_dir_all(dir.path().join("sub")).unwrap();
            write_dump(dir.path(), "b.ast.json", TreeBuilder::new("b.cpp"));
            write_dump(&dir.path().join("sub"), "a.ast.json", TreeBuilder::new("a.cpp"));
            fs::write(dir.path().join("notes.json"), "{}").unwrap();

            let dumps = discover_dumps(&[dir.path().to_path_buf()]).unwrap();

            assert_eq!(dumps.len(), 2);
            assert!(dumps.iter().all(|p| p.to_string_lossy().ends_with(DUMP_SUFFIX)));
        }

        #[test]
        fn duplicates_are_dropped() {
            let dir = TempDir::new().unwrap();
            let path = write_dump(dir.path(), "a.ast.json", TreeBuilder::new("a.cpp"));
            let dumps = discover_dumps(&[path.clone(), dir.path().to_path_buf()]).unwrap();
            assert_eq!(dumps, vec![path]);
        }

        #[test]
        fn missing_input_is_reported() {
            let err = discover_dumps(&[PathBuf::from("/nonexistent/dir")]).unwrap_err();
            assert!(matches!(err, LoadError::MissingInput { .. }));
        }
    }
}
