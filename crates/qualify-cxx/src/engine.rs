//! Qualification engine.
//!
//! Processing of one translation unit runs in three pure phases:
//!
//! 1. [`locate`] splits references into candidates and skip candidates
//! 2. [`build_skip_set`] freezes the skip set
//! 3. [`qualify`] emits one insertion per remaining location
//!
//! The skip set is complete before the first edit is considered, so the
//! result never depends on the order in which sites were found.

use std::collections::BTreeMap;

use tracing::debug;

use crate::ast::{DeclId, NodeId, SourceLocation, TranslationUnit};
use crate::locator::{locate, LocateError, ReferenceKind, ReferenceSite};
use crate::matcher::NamespacePattern;
use crate::skip::{build_skip_set, SkipSet};

/// A pending insertion of the namespace qualifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifyEdit {
    pub location: SourceLocation,
    /// Always `<Namespace>::`.
    pub text: String,
    pub kind: ReferenceKind,
    pub target: DeclId,
    pub node: NodeId,
}

/// Edits of one translation unit, at most one per location.
#[derive(Debug, Clone, Default)]
pub struct EditSet {
    edits: BTreeMap<SourceLocation, QualifyEdit>,
}

impl EditSet {
    /// Insert `edit` unless its location already has one.
    ///
    /// Returns `false` if the location was taken.
    pub fn insert(&mut self, edit: QualifyEdit) -> bool {
        if self.edits.contains_key(&edit.location) {
            return false;
        }
        self.edits.insert(edit.location, edit);
        true
    }

    pub fn get(&self, location: &SourceLocation) -> Option<&QualifyEdit> {
        self.edits.get(location)
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Edits in location order.
    pub fn iter(&self) -> impl Iterator<Item = &QualifyEdit> {
        self.edits.values()
    }
}

/// Counters for one translation unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QualifyStats {
    pub candidates: usize,
    /// Distinct skipped locations.
    pub skipped: usize,
    pub already_qualified: usize,
    pub edits: usize,
    /// Candidates dropped because their location already had an edit.
    pub shared_locations: usize,
}

/// Everything produced for one translation unit.
#[derive(Debug, Clone, Default)]
pub struct UnitEdits {
    pub edits: EditSet,
    pub skip_set: SkipSet,
    pub stats: QualifyStats,
}

/// Emit an edit for every candidate not skipped and not already qualified.
pub fn qualify(
    candidates: &[ReferenceSite],
    skip_set: &SkipSet,
    pattern: &NamespacePattern,
) -> (EditSet, usize) {
    let text = pattern.qualifier_text();
    let mut edits = EditSet::default();
    let mut shared = 0;

    for site in candidates {
        if site.already_qualified {
            continue;
        }
        if let Some(rule) = skip_set.rule(&site.location) {
            debug!(location = %site.location, %rule, "skipped");
            continue;
        }
        let inserted = edits.insert(QualifyEdit {
            location: site.location,
            text: text.clone(),
            kind: site.kind,
            target: site.target,
            node: site.node,
        });
        if !inserted {
            // instantiation copies share locations with their pattern
            shared += 1;
        }
    }

    (edits, shared)
}

/// Run all three phases over one translation unit.
pub fn qualify_unit(
    unit: &TranslationUnit,
    pattern: &NamespacePattern,
) -> Result<UnitEdits, LocateError> {
    let sites = locate(unit, pattern)?;
    let skip_set = build_skip_set(&sites.skips);
    let (edits, shared_locations) = qualify(&sites.candidates, &skip_set, pattern);

    let stats = QualifyStats {
        candidates: sites.candidates.len(),
        skipped: skip_set.len(),
        already_qualified: sites.already_qualified_count(),
        edits: edits.len(),
        shared_locations,
    };
    Ok(UnitEdits {
        edits,
        skip_set,
        stats,
    })
}

// ============================================================================
// Tests
// ============================================================================
