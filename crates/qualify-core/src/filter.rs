//! Path exclusion filters for edits.
//!
//! Translation units routinely pull in headers that must never be rewritten
//! (system headers, vendored code). Edits whose file matches an exclusion
//! glob are dropped before they reach the patch set.

use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};

/// A set of exclusion globs, matched against file paths.
#[derive(Debug, Clone)]
pub struct PathFilter {
    patterns: Vec<String>,
    set: GlobSet,
}

impl PathFilter {
    /// Build a filter from glob patterns. An empty list excludes nothing.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, globset::Error> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            builder.add(Glob::new(pattern.as_ref())?);
        }
        Ok(PathFilter {
            patterns: patterns.iter().map(|p| p.as_ref().to_string()).collect(),
            set: builder.build()?,
        })
    }

    /// A filter that excludes nothing.
    pub fn none() -> Self {
        PathFilter {
            patterns: Vec::new(),
            set: GlobSet::empty(),
        }
    }

    /// True if edits to `path` must be dropped.
    pub fn is_excluded(&self, path: impl AsRef<Path>) -> bool {
        !self.patterns.is_empty() && self.set.is_match(path)
    }

    /// The glob patterns this filter was built from.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

impl Default for PathFilter {
    fn default() -> Self {
        PathFilter::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_excludes_nothing() {
        let filter = PathFilter::none();
        assert!(!filter.is_excluded("/usr/include/stdio.h"));
    }

    #[test]
    fn glob_excludes_matching_paths() {
        let filter = PathFilter::new(&["/usr/include/**", "**/third_party/**"]).unwrap();
        assert!(filter.is_excluded("/usr/include/c++/vector"));
        assert!(filter.is_excluded("src/third_party/zlib/zlib.h"));
        assert!(!filter.is_excluded("src/main.cpp"));
        assert_eq!(filter.patterns().len(), 2);
    }

    #[test]
    fn invalid_glob_is_an_error() {
        assert!(PathFilter::new(&["["]).is_err());
    }
}
