//! Reference locator.
//!
//! Walks one translation unit and splits every reference into the target
//! namespace into two streams:
//!
//! - **candidates**: value references and bare type names whose declaration
//!   lives in the target namespace
//! - **skips**: candidate locations that must not be edited, each tagged with
//!   the rule that excludes it
//!
//! The walk is pure. It carries the enclosing-scope facts down the tree
//! instead of searching ancestors for every site.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

use crate::ast::{DeclId, DeclKind, NodeId, NodeKind, Qualifier, SourceLocation, TranslationUnit};
use crate::matcher::NamespacePattern;

// ============================================================================
// Sites
// ============================================================================

/// Whether a reference names a value or a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Value,
    Type,
}

impl ReferenceKind {
    /// Rule category reported for edits of this kind.
    pub fn rule(self) -> &'static str {
        match self {
            ReferenceKind::Value => "value_reference",
            ReferenceKind::Type => "type_reference",
        }
    }

    fn accepts(self, kind: DeclKind) -> bool {
        match self {
            ReferenceKind::Value => kind.is_value() || kind == DeclKind::Other,
            ReferenceKind::Type => kind.is_type() || kind == DeclKind::Other,
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceKind::Value => f.write_str("value"),
            ReferenceKind::Type => f.write_str("type"),
        }
    }
}

/// One occurrence of a name that resolves into the target namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceSite {
    pub node: NodeId,
    /// First token of a value reference; the bare name of a type reference.
    pub location: SourceLocation,
    pub kind: ReferenceKind,
    pub target: DeclId,
    /// An explicit qualifier is already written in front of the name.
    pub already_qualified: bool,
}

/// Why a location is excluded from qualification.
///
/// When several rules exclude the same location, the lowest-ordered one is
/// reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipRule {
    /// Inside a declaration of the target namespace or a namespace nested in it.
    InsideTargetNamespace,
    /// Inside a function or variable instantiation of a template from the target namespace.
    TemplateInstantiation,
    /// A type wrapped in an elaborated qualifier that names the target namespace.
    ElaboratedQualifier,
    /// Already carries an explicit qualifier.
    AlreadyQualified,
}

impl SkipRule {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipRule::InsideTargetNamespace => "inside_target_namespace",
            SkipRule::TemplateInstantiation => "template_instantiation",
            SkipRule::ElaboratedQualifier => "elaborated_qualifier",
            SkipRule::AlreadyQualified => "already_qualified",
        }
    }
}

impl fmt::Display for SkipRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A location that must not receive an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkipCandidate {
    pub location: SourceLocation,
    pub rule: SkipRule,
    pub node: NodeId,
}

/// Output of [`locate`].
#[derive(Debug, Clone, Default)]
pub struct LocatedSites {
    /// Every matching reference, in tree pre-order.
    pub candidates: Vec<ReferenceSite>,
    /// Every exclusion, in tree pre-order.
    pub skips: Vec<SkipCandidate>,
}

impl LocatedSites {
    pub fn already_qualified_count(&self) -> usize {
        self.candidates.iter().filter(|s| s.already_qualified).count()
    }
}

// ============================================================================
// Errors
// ============================================================================

/// A matched node that is neither a usable value reference nor a type name.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LocateError {
    #[error("{kind} reference at {location} resolves to {target} which is a {decl_kind}")]
    KindMismatch {
        node: NodeId,
        location: SourceLocation,
        kind: ReferenceKind,
        target: String,
        decl_kind: DeclKind,
    },

    #[error("elaborated type {node} is qualified by {namespace} but wraps {found} named types")]
    ElaboratedWithoutTypeName {
        node: NodeId,
        namespace: String,
        found: usize,
    },
}

impl LocateError {
    /// Source location of the offending node, when it has one.
    pub fn location(&self) -> Option<SourceLocation> {
        match self {
            LocateError::KindMismatch { location, .. } => Some(*location),
            LocateError::ElaboratedWithoutTypeName { .. } => None,
        }
    }
}

// ============================================================================
// Walk
// ============================================================================

/// Facts about the enclosing declarations, inherited by every descendant.
#[derive(Debug, Clone, Copy, Default)]
struct Scope {
    in_target_namespace: bool,
    in_target_instantiation: bool,
}

/// Find every reference into the target namespace and every exclusion.
pub fn locate(
    unit: &TranslationUnit,
    pattern: &NamespacePattern,
) -> Result<LocatedSites, LocateError> {
    let mut sites = LocatedSites::default();
    let mut stack: Vec<(NodeId, Scope)> = unit
        .roots()
        .iter()
        .rev()
        .map(|&id| (id, Scope::default()))
        .collect();

    while let Some((id, scope)) = stack.pop() {
        let node = unit.node(id);
        let mut inner = scope;

        match &node.kind {
            NodeKind::Decl { decl } => {
                let decl = unit.decl(*decl);
                if pattern.matches_scope(decl) {
                    inner.in_target_namespace = true;
                }
                if pattern.matches_instantiation(unit, decl) {
                    inner.in_target_instantiation = true;
                }
            }
            NodeKind::DeclRef {
                location,
                target,
                qualifier,
            } => {
                if pattern.matches_member(unit.decl(*target)) {
                    let site = classify(
                        unit,
                        id,
                        *location,
                        *target,
                        ReferenceKind::Value,
                        qualifier.is_some(),
                    )?;
                    record(&mut sites, site, scope, false);
                }
            }
            NodeKind::TypeName { location, target } => {
                if pattern.matches_member(unit.decl(*target)) {
                    let elaborated_qualifier = enclosing_qualifier(unit, id);
                    let names_scope = elaborated_qualifier
                        .as_ref()
                        .is_some_and(|q| pattern.qualifier_names_scope(unit, q));
                    let site = classify(
                        unit,
                        id,
                        *location,
                        *target,
                        ReferenceKind::Type,
                        elaborated_qualifier.is_some(),
                    )?;
                    record(&mut sites, site, scope, names_scope);
                }
            }
            NodeKind::Elaborated {
                qualifier: Some(qualifier),
                ..
            } => {
                if pattern.qualifier_names_scope(unit, qualifier) {
                    let found = node
                        .children
                        .iter()
                        .filter(|&&child| {
                            matches!(unit.node(child).kind, NodeKind::TypeName { .. })
                        })
                        .count();
                    if found != 1 {
                        let namespace = qualifier
                            .decl()
                            .map(|d| unit.decl(d).qualified_name.clone())
                            .unwrap_or_default();
                        return Err(LocateError::ElaboratedWithoutTypeName {
                            node: id,
                            namespace,
                            found,
                        });
                    }
                }
            }
            NodeKind::Elaborated { qualifier: None, .. } | NodeKind::Other { .. } => {}
        }

        stack.extend(node.children.iter().rev().map(|&child| (child, inner)));
    }

    Ok(sites)
}

/// Qualifier written on the elaborated type directly wrapping a type name.
fn enclosing_qualifier(unit: &TranslationUnit, id: NodeId) -> Option<Qualifier> {
    let parent = unit.parent(id)?;
    match &unit.node(parent).kind {
        NodeKind::Elaborated { qualifier, .. } => *qualifier,
        _ => None,
    }
}

fn classify(
    unit: &TranslationUnit,
    node: NodeId,
    location: SourceLocation,
    target: DeclId,
    kind: ReferenceKind,
    already_qualified: bool,
) -> Result<ReferenceSite, LocateError> {
    let decl = unit.decl(target);
    if !kind.accepts(decl.kind) {
        return Err(LocateError::KindMismatch {
            node,
            location,
            kind,
            target: decl.qualified_name.clone(),
            decl_kind: decl.kind,
        });
    }
    Ok(ReferenceSite {
        node,
        location,
        kind,
        target,
        already_qualified,
    })
}

fn record(sites: &mut LocatedSites, site: ReferenceSite, scope: Scope, names_scope: bool) {
    let mut rules = Vec::new();
    if scope.in_target_namespace {
        rules.push(SkipRule::InsideTargetNamespace);
    }
    if scope.in_target_instantiation {
        rules.push(SkipRule::TemplateInstantiation);
    }
    if names_scope {
        rules.push(SkipRule::ElaboratedQualifier);
    }
    if site.already_qualified {
        rules.push(SkipRule::AlreadyQualified);
    }

    for rule in rules {
        trace!(node = %site.node, location = %site.location, %rule, "skip candidate");
        sites.skips.push(SkipCandidate {
            location: site.location,
            rule,
            node: site.node,
        });
    }
    sites.candidates.push(site);
}

// ============================================================================
// Tests
// ============================================================================
