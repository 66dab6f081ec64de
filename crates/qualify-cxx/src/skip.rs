//! Per-translation-unit skip set.
//!
//! Built once from the locator's skip stream, then only read. The result
//! depends on the set of candidates alone, not on their order.

use std::collections::BTreeMap;

use crate::ast::SourceLocation;
use crate::locator::{SkipCandidate, SkipRule};

/// Locations that must never receive an edit, with the rule that excludes each.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkipSet {
    entries: BTreeMap<SourceLocation, SkipRule>,
}

impl SkipSet {
    pub fn contains(&self, location: &SourceLocation) -> bool {
        self.entries.contains_key(location)
    }

    /// The rule reported for `location`.
    pub fn rule(&self, location: &SourceLocation) -> Option<SkipRule> {
        self.entries.get(location).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in location order.
    pub fn iter(&self) -> impl Iterator<Item = (&SourceLocation, &SkipRule)> {
        self.entries.iter()
    }

    /// Number of locations excluded by each rule.
    pub fn counts_by_rule(&self) -> BTreeMap<SkipRule, usize> {
        let mut counts = BTreeMap::new();
        for rule in self.entries.values() {
            *counts.entry(*rule).or_insert(0) += 1;
        }
        counts
    }
}

/// Build the skip set from skip candidates.
///
/// Rules are additive; a location excluded by several rules keeps the
/// lowest-ordered one.
pub fn build_skip_set<'a>(candidates: impl IntoIterator<Item = &'a SkipCandidate>) -> SkipSet {
    let mut entries: BTreeMap<SourceLocation, SkipRule> = BTreeMap::new();
    for candidate in candidates {
        entries
            .entry(candidate.location)
            .and_modify(|rule| *rule = (*rule).min(candidate.rule))
            .or_insert(candidate.rule);
    }
    SkipSet { entries }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{FileId, NodeId};

    fn skip(offset: u64, rule: SkipRule) -> SkipCandidate {
        SkipCandidate {
            location: SourceLocation::new(FileId(0), offset),
            rule,
            node: NodeId(0),
        }
    }

    #[test]
    fn lowest_rule_wins() {
        let candidates = [
            skip(4, SkipRule::AlreadyQualified),
            skip(4, SkipRule::InsideTargetNamespace),
            skip(9, SkipRule::TemplateInstantiation),
        ];
        let set = build_skip_set(&candidates);
        assert_eq!(set.len(), 2);
        assert_eq!(
            set.rule(&SourceLocation::new(FileId(0), 4)),
            Some(SkipRule::InsideTargetNamespace)
        );
    }

    #[test]
    fn order_does_not_matter() {
        let forward = [
            skip(1, SkipRule::ElaboratedQualifier),
            skip(1, SkipRule::AlreadyQualified),
            skip(2, SkipRule::TemplateInstantiation),
        ];
        let mut backward = forward;
        backward.reverse();
        assert_eq!(build_skip_set(&forward), build_skip_set(&backward));
    }

    #[test]
    fn building_twice_is_idempotent() {
        let candidates = [skip(3, SkipRule::AlreadyQualified)];
        let doubled: Vec<SkipCandidate> = candidates
            .iter()
            .chain(candidates.iter())
            .copied()
            .collect();
        assert_eq!(build_skip_set(&candidates), build_skip_set(&doubled));
    }

    #[test]
    fn locations_in_different_files_are_distinct() {
        let a = skip(3, SkipRule::AlreadyQualified);
        let mut b = a;
        b.location.file = FileId(1);
        let set = build_skip_set(&[a, b]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.counts_by_rule()[&SkipRule::AlreadyQualified], 2);
    }

    #[test]
    fn empty_input_gives_empty_set() {
        let none: [SkipCandidate; 0] = [];
        let set = build_skip_set(&none);
        assert!(set.is_empty());
        assert!(!set.contains(&SourceLocation::new(FileId(0), 0)));
    }
}
