//! Target namespace matching.
//!
//! A declaration belongs to the target namespace `Foo` when its root-anchored
//! qualified name starts with `::Foo::`. A namespace declaration is the target
//! scope (or nested under it) when its name matches `::Foo` on a component
//! boundary. `::FooBar` matches neither.

use regex::Regex;
use thiserror::Error;

use crate::ast::{DeclKind, Declaration, Qualifier, TranslationUnit};

/// Errors for invalid namespace names.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("namespace name cannot be empty")]
    Empty,

    #[error("invalid namespace component '{component}' in '{name}'")]
    InvalidComponent { name: String, component: String },

    #[error("failed to compile namespace pattern: {0}")]
    Regex(String),
}

/// The target namespace, compiled into anchored matchers.
#[derive(Debug, Clone)]
pub struct NamespacePattern {
    name: String,
    member: Regex,
    scope: Regex,
}

impl NamespacePattern {
    /// Compile a pattern for `name`, e.g. `Foo` or `Outer::Inner`.
    ///
    /// A leading `::` is accepted and ignored.
    pub fn new(name: &str) -> Result<Self, PatternError> {
        let name = name.trim().trim_start_matches("::");
        if name.is_empty() {
            return Err(PatternError::Empty);
        }
        for component in name.split("::") {
            if !is_identifier(component) {
                return Err(PatternError::InvalidComponent {
                    name: name.to_string(),
                    component: component.to_string(),
                });
            }
        }

        let escaped = regex::escape(name);
        let member = Regex::new(&format!("^::{}::", escaped))
            .map_err(|e| PatternError::Regex(e.to_string()))?;
        let scope = Regex::new(&format!("^::{}(::|$)", escaped))
            .map_err(|e| PatternError::Regex(e.to_string()))?;

        Ok(NamespacePattern {
            name: name.to_string(),
            member,
            scope,
        })
    }

    /// The namespace name without a leading `::`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Text inserted before a reference: `Foo::`.
    pub fn qualifier_text(&self) -> String {
        format!("{}::", self.name)
    }

    /// True if `decl` is declared inside the target namespace.
    pub fn matches_member(&self, decl: &Declaration) -> bool {
        self.member.is_match(&decl.rooted_name())
    }

    /// True if `decl` is the target namespace or a namespace nested under it.
    pub fn matches_scope(&self, decl: &Declaration) -> bool {
        decl.kind == DeclKind::Namespace && self.scope.is_match(&decl.rooted_name())
    }

    /// True if `decl` is a function or variable template instantiation whose
    /// generic pattern lives in the target namespace.
    pub fn matches_instantiation(&self, unit: &TranslationUnit, decl: &Declaration) -> bool {
        if !matches!(decl.kind, DeclKind::Function | DeclKind::Variable) {
            return false;
        }
        match decl.instantiated_from {
            Some(pattern) => self.matches_member(unit.decl(pattern)),
            None => false,
        }
    }

    /// True if `qualifier` names the target namespace or a namespace nested under it.
    pub fn qualifier_names_scope(&self, unit: &TranslationUnit, qualifier: &Qualifier) -> bool {
        match qualifier {
            Qualifier::Namespace { decl } => self.matches_scope(unit.decl(*decl)),
            Qualifier::Global | Qualifier::Type { .. } => false,
        }
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{DeclId, TreeBuilder};

    fn decl(kind: DeclKind, qualified_name: &str) -> Declaration {
        Declaration {
            id: DeclId(0),
            kind,
            qualified_name: qualified_name.to_string(),
            instantiated_from: None,
        }
    }

    mod construction {
        use super::*;

        #[test]
        fn leading_colons_are_stripped() {
            let pattern = NamespacePattern::new("::Foo").unwrap();
            assert_eq!(pattern.name(), "Foo");
            assert_eq!(pattern.qualifier_text(), "Foo::");
        }

        #[test]
        fn nested_name_is_accepted() {
            let pattern = NamespacePattern::new("Outer::Inner").unwrap();
            assert_eq!(pattern.qualifier_text(), "Outer::Inner::");
        }

        #[test]
        fn empty_name_is_rejected() {
            assert_eq!(NamespacePattern::new("").unwrap_err(), PatternError::Empty);
            assert_eq!(NamespacePattern::new("::").unwrap_err(), PatternError::Empty);
        }

        #[test]
        fn malformed_names_are_rejected() {
            for bad in ["Foo::", "1Foo", "Foo Bar", "Foo.*", "Foo::::Bar"] {
                assert!(
                    matches!(
                        NamespacePattern::new(bad),
                        Err(PatternError::InvalidComponent { .. })
                    ),
                    "{bad} should be rejected"
                );
            }
        }
    }

    mod membership {
        use super::*;

        #[test]
        fn members_match_on_component_boundary() {
            let pattern = NamespacePattern::new("Foo").unwrap();
            assert!(pattern.matches_member(&decl(DeclKind::Function, "Foo::g")));
            assert!(pattern.matches_member(&decl(DeclKind::Record, "Foo::Inner::T")));
            assert!(!pattern.matches_member(&decl(DeclKind::Function, "FooBar::g")));
            assert!(!pattern.matches_member(&decl(DeclKind::Function, "g")));
            assert!(!pattern.matches_member(&decl(DeclKind::Function, "Bar::Foo::g")));
        }

        #[test]
        fn namespace_itself_is_not_a_member() {
            let pattern = NamespacePattern::new("Foo").unwrap();
            assert!(!pattern.matches_member(&decl(DeclKind::Namespace, "Foo")));
        }

        #[test]
        fn scope_includes_nested_namespaces() {
            let pattern = NamespacePattern::new("Foo").unwrap();
            assert!(pattern.matches_scope(&decl(DeclKind::Namespace, "Foo")));
            assert!(pattern.matches_scope(&decl(DeclKind::Namespace, "Foo::detail")));
            assert!(!pattern.matches_scope(&decl(DeclKind::Namespace, "FooBar")));
            assert!(!pattern.matches_scope(&decl(DeclKind::Record, "Foo::S")));
        }

        #[test]
        fn qualified_names_with_leading_colons_match() {
            let pattern = NamespacePattern::new("Foo").unwrap();
            assert!(pattern.matches_member(&decl(DeclKind::Function, "::Foo::g")));
        }
    }

    mod tree_predicates {
        use super::*;

        #[test]
        fn instantiation_of_target_template() {
            let mut b = TreeBuilder::new("a.cpp");
            let tf = b.decl(DeclKind::Function, "Foo::tf");
            let inst = b.instantiation(DeclKind::Function, "Foo::tf<int>", tf);
            let other = b.decl(DeclKind::Function, "Bar::tf");
            let other_inst = b.instantiation(DeclKind::Function, "Bar::tf<int>", other);
            let record = b.decl(DeclKind::Record, "Foo::S");
            let record_inst = b.instantiation(DeclKind::Record, "Foo::S<int>", record);
            let unit = b.build().unwrap();
            let pattern = NamespacePattern::new("Foo").unwrap();

            assert!(pattern.matches_instantiation(&unit, unit.decl(inst)));
            assert!(!pattern.matches_instantiation(&unit, unit.decl(tf)));
            assert!(!pattern.matches_instantiation(&unit, unit.decl(other_inst)));
            assert!(!pattern.matches_instantiation(&unit, unit.decl(record_inst)));
        }

        #[test]
        fn qualifier_scope() {
            let mut b = TreeBuilder::new("a.cpp");
            let foo = b.decl(DeclKind::Namespace, "Foo");
            let bar = b.decl(DeclKind::Namespace, "Bar");
            let unit = b.build().unwrap();
            let pattern = NamespacePattern::new("Foo").unwrap();

            assert!(pattern.qualifier_names_scope(&unit, &Qualifier::Namespace { decl: foo }));
            assert!(!pattern.qualifier_names_scope(&unit, &Qualifier::Namespace { decl: bar }));
            assert!(!pattern.qualifier_names_scope(&unit, &Qualifier::Global));
        }
    }
}
