//! Translation unit tree model.
//!
//! A translation unit arrives as a JSON AST dump produced by the C++ frontend:
//! flat tables of files, declarations and nodes, with nodes linked by child
//! lists. [`TranslationUnit::from_dump`] validates the tables and precomputes
//! parent links so the locator can walk the tree without re-checking ids.
//!
//! ## Identity
//!
//! File, declaration and node ids are dense indices into their tables. A
//! [`SourceLocation`] is only meaningful inside the translation unit that
//! produced it; locations are never compared across units.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Ids and Locations
// ============================================================================

/// Index of a file in a translation unit's file table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(pub u32);

/// Index of a declaration in a translation unit's declaration table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeclId(pub u32);

/// Index of a node in a translation unit's node table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file#{}", self.0)
    }
}

impl fmt::Display for DeclId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "decl#{}", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// A byte position in one file of a translation unit.
///
/// Ordered by file, then offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceLocation {
    /// File containing the position.
    pub file: FileId,
    /// Byte offset from the start of the file.
    pub offset: u64,
}

impl SourceLocation {
    pub fn new(file: FileId, offset: u64) -> Self {
        SourceLocation { file, offset }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}", self.file, self.offset)
    }
}

// ============================================================================
// Tables
// ============================================================================

/// A file that contributed text to the translation unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub id: FileId,
    /// Path as the frontend saw it; relative paths resolve against the unit's directory.
    pub path: String,
    /// SHA-256 of the file content the frontend parsed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
}

/// Kind of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclKind {
    Namespace,
    Function,
    Variable,
    Record,
    Enum,
    EnumConstant,
    Typedef,
    Field,
    Other,
}

impl DeclKind {
    /// Declarations a value reference may resolve to.
    pub fn is_value(self) -> bool {
        matches!(
            self,
            DeclKind::Function | DeclKind::Variable | DeclKind::EnumConstant | DeclKind::Field
        )
    }

    /// Declarations a type name may resolve to.
    pub fn is_type(self) -> bool {
        matches!(self, DeclKind::Record | DeclKind::Enum | DeclKind::Typedef)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeclKind::Namespace => "namespace",
            DeclKind::Function => "function",
            DeclKind::Variable => "variable",
            DeclKind::Record => "record",
            DeclKind::Enum => "enum",
            DeclKind::EnumConstant => "enum_constant",
            DeclKind::Typedef => "typedef",
            DeclKind::Field => "field",
            DeclKind::Other => "other",
        }
    }
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    pub id: DeclId,
    pub kind: DeclKind,
    /// Fully-qualified name without the leading `::`, e.g. `Foo::g`.
    pub qualified_name: String,
    /// For template instantiations, the generic declaration they were stamped from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instantiated_from: Option<DeclId>,
}

impl Declaration {
    /// Last component of the qualified name.
    pub fn name(&self) -> &str {
        self.qualified_name
            .rsplit("::")
            .next()
            .unwrap_or(&self.qualified_name)
    }

    /// Fully-qualified name anchored at the root scope, e.g. `::Foo::g`.
    pub fn rooted_name(&self) -> String {
        format!("::{}", self.qualified_name.trim_start_matches("::"))
    }
}

/// Explicit scope written in front of a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Qualifier {
    /// `::name`
    Global,
    /// `Ns::name`
    Namespace { decl: DeclId },
    /// `Record::name`
    Type { decl: DeclId },
}

impl Qualifier {
    /// The declaration the qualifier names, if any.
    pub fn decl(&self) -> Option<DeclId> {
        match self {
            Qualifier::Global => None,
            Qualifier::Namespace { decl } | Qualifier::Type { decl } => Some(*decl),
        }
    }
}

/// What a node represents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    /// A declaration; its children are the declaration's body.
    Decl { decl: DeclId },
    /// A reference to a value, located at its first token.
    DeclRef {
        location: SourceLocation,
        target: DeclId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        qualifier: Option<Qualifier>,
    },
    /// A bare type name, located at the name itself.
    TypeName {
        location: SourceLocation,
        target: DeclId,
    },
    /// A type written with a keyword and/or qualifier; wraps one `TypeName`.
    Elaborated {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        keyword: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        qualifier: Option<Qualifier>,
    },
    /// Anything else (statements, expressions, ...).
    Other {
        #[serde(default)]
        label: String,
    },
}

/// One node of the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeId>,
}

/// On-disk form of a translation unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationUnitDump {
    /// The unit's main source file.
    pub main_file: String,
    /// Directory relative file paths resolve against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
    pub files: Vec<SourceFile>,
    pub decls: Vec<Declaration>,
    pub nodes: Vec<Node>,
    pub roots: Vec<NodeId>,
}

// ============================================================================
// Validation
// ============================================================================

/// A structural defect in a dump.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("{table} entry {index} has id {id}; ids must equal their position")]
    NonDenseId {
        table: &'static str,
        index: usize,
        id: u32,
    },

    #[error("{referrer} refers to missing file {file}")]
    MissingFile { referrer: String, file: FileId },

    #[error("{referrer} refers to missing declaration {decl}")]
    MissingDecl { referrer: String, decl: DeclId },

    #[error("{referrer} refers to missing node {node}")]
    MissingNode { referrer: String, node: NodeId },

    #[error("{node} has more than one parent ({first} and {second})")]
    MultipleParents {
        node: NodeId,
        first: NodeId,
        second: NodeId,
    },

    #[error("root {node} also appears as a child of {parent}")]
    RootHasParent { node: NodeId, parent: NodeId },

    #[error("{node} is listed as a root more than once")]
    DuplicateRoot { node: NodeId },

    #[error("{node} is part of a cycle")]
    Cycle { node: NodeId },

    #[error("{node} has no parent and is not listed as a root")]
    Orphan { node: NodeId },
}

/// A validated translation unit with parent links.
#[derive(Debug, Clone)]
pub struct TranslationUnit {
    main_file: String,
    directory: Option<String>,
    files: Vec<SourceFile>,
    decls: Vec<Declaration>,
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
    parents: Vec<Option<NodeId>>,
}

impl TranslationUnit {
    /// Validate a dump and build the tree.
    pub fn from_dump(dump: TranslationUnitDump) -> Result<Self, TreeError> {
        for (index, file) in dump.files.iter().enumerate() {
            if file.id.0 as usize != index {
                return Err(TreeError::NonDenseId {
                    table: "files",
                    index,
                    id: file.id.0,
                });
            }
        }
        for (index, decl) in dump.decls.iter().enumerate() {
            if decl.id.0 as usize != index {
                return Err(TreeError::NonDenseId {
                    table: "decls",
                    index,
                    id: decl.id.0,
                });
            }
            if let Some(pattern) = decl.instantiated_from {
                check_decl(&dump, pattern, || format!("declaration {}", decl.id))?;
            }
        }

        let mut parents: Vec<Option<NodeId>> = vec![None; dump.nodes.len()];
        for (index, node) in dump.nodes.iter().enumerate() {
            let id = NodeId(index as u32);
            check_node_kind(&dump, id, &node.kind)?;
            for &child in &node.children {
                if child.0 as usize >= dump.nodes.len() {
                    return Err(TreeError::MissingNode {
                        referrer: id.to_string(),
                        node: child,
                    });
                }
                if let Some(first) = parents[child.0 as usize] {
                    return Err(TreeError::MultipleParents {
                        node: child,
                        first,
                        second: id,
                    });
                }
                parents[child.0 as usize] = Some(id);
            }
        }

        let mut is_root = vec![false; dump.nodes.len()];
        for &root in &dump.roots {
            if root.0 as usize >= dump.nodes.len() {
                return Err(TreeError::MissingNode {
                    referrer: "roots".to_string(),
                    node: root,
                });
            }
            if let Some(parent) = parents[root.0 as usize] {
                return Err(TreeError::RootHasParent { node: root, parent });
            }
            if is_root[root.0 as usize] {
                return Err(TreeError::DuplicateRoot { node: root });
            }
            is_root[root.0 as usize] = true;
        }

        // Every node has at most one parent, so anything not reachable from a
        // root is either parentless (orphan) or sits on a parent cycle.
        let mut reached = vec![false; dump.nodes.len()];
        let mut stack: Vec<NodeId> = dump.roots.clone();
        while let Some(id) = stack.pop() {
            reached[id.0 as usize] = true;
            stack.extend(dump.nodes[id.0 as usize].children.iter().copied());
        }
        if let Some(index) = reached.iter().position(|r| !r) {
            let node = NodeId(index as u32);
            return Err(match parents[index] {
                Some(_) => TreeError::Cycle { node },
                None => TreeError::Orphan { node },
            });
        }

        Ok(TranslationUnit {
            main_file: dump.main_file,
            directory: dump.directory,
            files: dump.files,
            decls: dump.decls,
            nodes: dump.nodes,
            roots: dump.roots,
            parents,
        })
    }

    pub fn main_file(&self) -> &str {
        &self.main_file
    }

    pub fn directory(&self) -> Option<&str> {
        self.directory.as_deref()
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn file(&self, id: FileId) -> &SourceFile {
        &self.files[id.0 as usize]
    }

    pub fn decls(&self) -> &[Declaration] {
        &self.decls
    }

    pub fn decl(&self, id: DeclId) -> &Declaration {
        &self.decls[id.0 as usize]
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parents[id.0 as usize]
    }
}

fn check_file(
    dump: &TranslationUnitDump,
    file: FileId,
    referrer: impl FnOnce() -> String,
) -> Result<(), TreeError> {
    if (file.0 as usize) < dump.files.len() {
        Ok(())
    } else {
        Err(TreeError::MissingFile {
            referrer: referrer(),
            file,
        })
    }
}

fn check_decl(
    dump: &TranslationUnitDump,
    decl: DeclId,
    referrer: impl FnOnce() -> String,
) -> Result<(), TreeError> {
    if (decl.0 as usize) < dump.decls.len() {
        Ok(())
    } else {
        Err(TreeError::MissingDecl {
            referrer: referrer(),
            decl,
        })
    }
}

fn check_qualifier(
    dump: &TranslationUnitDump,
    id: NodeId,
    qualifier: Option<&Qualifier>,
) -> Result<(), TreeError> {
    match qualifier.and_then(Qualifier::decl) {
        Some(decl) => check_decl(dump, decl, || format!("qualifier of {}", id)),
        None => Ok(()),
    }
}

fn check_node_kind(
    dump: &TranslationUnitDump,
    id: NodeId,
    kind: &NodeKind,
) -> Result<(), TreeError> {
    match kind {
        NodeKind::Decl { decl } => check_decl(dump, *decl, || id.to_string()),
        NodeKind::DeclRef {
            location,
            target,
            qualifier,
        } => {
            check_file(dump, location.file, || id.to_string())?;
            check_decl(dump, *target, || id.to_string())?;
            check_qualifier(dump, id, qualifier.as_ref())
        }
        NodeKind::TypeName { location, target } => {
            check_file(dump, location.file, || id.to_string())?;
            check_decl(dump, *target, || id.to_string())
        }
        NodeKind::Elaborated { qualifier, .. } => check_qualifier(dump, id, qualifier.as_ref()),
        NodeKind::Other { .. } => Ok(()),
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Incremental construction of a translation unit.
///
/// Used by frontends that emit dumps and by tests. File 0 is always the main
/// file.
///
/// ```
/// use qualify_cxx::ast::{DeclKind, TreeBuilder};
///
/// let mut b = TreeBuilder::new("main.cpp");
/// let main = b.main();
/// let foo = b.decl(DeclKind::Namespace, "Foo");
/// let g = b.decl(DeclKind::Function, "Foo::g");
/// b.decl_node(None, foo);
/// b.decl_ref(None, b.loc(main, 12), g);
/// let unit = b.build().unwrap();
/// assert_eq!(unit.node_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    dump: TranslationUnitDump,
}

impl TreeBuilder {
    pub fn new(main_file: impl Into<String>) -> Self {
        let main_file = main_file.into();
        TreeBuilder {
            dump: TranslationUnitDump {
                main_file: main_file.clone(),
                directory: None,
                files: vec![SourceFile {
                    id: FileId(0),
                    path: main_file,
                    content_hash: None,
                }],
                decls: Vec::new(),
                nodes: Vec::new(),
                roots: Vec::new(),
            },
        }
    }

    pub fn directory(mut self, directory: impl Into<String>) -> Self {
        self.dump.directory = Some(directory.into());
        self
    }

    pub fn main(&self) -> FileId {
        FileId(0)
    }

    /// Add another file (typically a header).
    pub fn file(&mut self, path: impl Into<String>) -> FileId {
        let id = FileId(self.dump.files.len() as u32);
        self.dump.files.push(SourceFile {
            id,
            path: path.into(),
            content_hash: None,
        });
        id
    }

    /// Record the content hash the frontend saw for `file`.
    pub fn set_content_hash(&mut self, file: FileId, hash: impl Into<String>) {
        if let Some(entry) = self.dump.files.get_mut(file.0 as usize) {
            entry.content_hash = Some(hash.into());
        }
    }

    pub fn loc(&self, file: FileId, offset: u64) -> SourceLocation {
        SourceLocation::new(file, offset)
    }

    pub fn decl(&mut self, kind: DeclKind, qualified_name: impl Into<String>) -> DeclId {
        self.push_decl(kind, qualified_name.into(), None)
    }

    /// Add a template instantiation stamped from `pattern`.
    pub fn instantiation(
        &mut self,
        kind: DeclKind,
        qualified_name: impl Into<String>,
        pattern: DeclId,
    ) -> DeclId {
        self.push_decl(kind, qualified_name.into(), Some(pattern))
    }

    fn push_decl(
        &mut self,
        kind: DeclKind,
        qualified_name: String,
        instantiated_from: Option<DeclId>,
    ) -> DeclId {
        let id = DeclId(self.dump.decls.len() as u32);
        self.dump.decls.push(Declaration {
            id,
            kind,
            qualified_name,
            instantiated_from,
        });
        id
    }

    /// Add a node under `parent`, or as a new root.
    pub fn node(&mut self, parent: Option<NodeId>, kind: NodeKind) -> NodeId {
        let id = NodeId(self.dump.nodes.len() as u32);
        self.dump.nodes.push(Node {
            kind,
            children: Vec::new(),
        });
        match parent {
            Some(parent) => self.dump.nodes[parent.0 as usize].children.push(id),
            None => self.dump.roots.push(id),
        }
        id
    }

    pub fn decl_node(&mut self, parent: Option<NodeId>, decl: DeclId) -> NodeId {
        self.node(parent, NodeKind::Decl { decl })
    }

    pub fn other(&mut self, parent: Option<NodeId>, label: &str) -> NodeId {
        self.node(
            parent,
            NodeKind::Other {
                label: label.to_string(),
            },
        )
    }

    pub fn decl_ref(
        &mut self,
        parent: Option<NodeId>,
        location: SourceLocation,
        target: DeclId,
    ) -> NodeId {
        self.node(
            parent,
            NodeKind::DeclRef {
                location,
                target,
                qualifier: None,
            },
        )
    }

    pub fn qualified_ref(
        &mut self,
        parent: Option<NodeId>,
        location: SourceLocation,
        target: DeclId,
        qualifier: Qualifier,
    ) -> NodeId {
        self.node(
            parent,
            NodeKind::DeclRef {
                location,
                target,
                qualifier: Some(qualifier),
            },
        )
    }

    pub fn type_name(
        &mut self,
        parent: Option<NodeId>,
        location: SourceLocation,
        target: DeclId,
    ) -> NodeId {
        self.node(parent, NodeKind::TypeName { location, target })
    }

    pub fn elaborated(
        &mut self,
        parent: Option<NodeId>,
        keyword: Option<&str>,
        qualifier: Option<Qualifier>,
    ) -> NodeId {
        self.node(
            parent,
            NodeKind::Elaborated {
                keyword: keyword.map(str::to_string),
                qualifier,
            },
        )
    }

    pub fn into_dump(self) -> TranslationUnitDump {
        self.dump
    }

    pub fn build(self) -> Result<TranslationUnit, TreeError> {
        TranslationUnit::from_dump(self.dump)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn small_tree() -> TreeBuilder {
        let mut b = TreeBuilder::new("main.cpp");
        let main = b.main();
        let foo = b.decl(DeclKind::Namespace, "Foo");
        let g = b.decl(DeclKind::Function, "Foo::g");
        let ns = b.decl_node(None, foo);
        let f = b.decl_node(Some(ns), g);
        let body = b.other(Some(f), "CompoundStmt");
        b.decl_ref(Some(body), b.loc(main, 30), g);
        b
    }

    mod declarations {
        use super::*;

        #[test]
        fn name_is_last_component() {
            let decl = Declaration {
                id: DeclId(0),
                kind: DeclKind::Function,
                qualified_name: "Foo::Inner::g".to_string(),
                instantiated_from: None,
            };
            assert_eq!(decl.name(), "g");
            assert_eq!(decl.rooted_name(), "::Foo::Inner::g");
        }

        #[test]
        fn kind_families() {
            assert!(DeclKind::Function.is_value());
            assert!(DeclKind::EnumConstant.is_value());
            assert!(DeclKind::Typedef.is_type());
            assert!(!DeclKind::Namespace.is_value());
            assert!(!DeclKind::Namespace.is_type());
            assert!(!DeclKind::Other.is_value());
        }
    }

    mod validation {
        use super::*;

        #[test]
        fn valid_tree_builds_parents() {
            let unit = small_tree().build().unwrap();
            assert_eq!(unit.parent(NodeId(0)), None);
            assert_eq!(unit.parent(NodeId(3)), Some(NodeId(2)));
            assert_eq!(unit.parent(NodeId(2)), Some(NodeId(1)));
        }

        #[test]
        fn missing_target_is_rejected() {
            let mut dump = small_tree().into_dump();
            dump.nodes[3].kind = NodeKind::DeclRef {
                location: SourceLocation::new(FileId(0), 30),
                target: DeclId(42),
                qualifier: None,
            };
            assert!(matches!(
                TranslationUnit::from_dump(dump),
                Err(TreeError::MissingDecl { decl: DeclId(42), .. })
            ));
        }

        #[test]
        fn missing_file_is_rejected() {
            let mut dump = small_tree().into_dump();
            dump.nodes[3].kind = NodeKind::TypeName {
                location: SourceLocation::new(FileId(7), 0),
                target: DeclId(1),
            };
            assert!(matches!(
                TranslationUnit::from_dump(dump),
                Err(TreeError::MissingFile { file: FileId(7), .. })
            ));
        }

        #[test]
        fn second_parent_is_rejected() {
            let mut dump = small_tree().into_dump();
            dump.nodes[0].children.push(NodeId(3));
            assert!(matches!(
                TranslationUnit::from_dump(dump),
                Err(TreeError::MultipleParents { node: NodeId(3), .. })
            ));
        }

        #[test]
        fn root_with_parent_is_rejected() {
            let mut dump = small_tree().into_dump();
            dump.roots.push(NodeId(2));
            assert!(matches!(
                TranslationUnit::from_dump(dump),
                Err(TreeError::RootHasParent { node: NodeId(2), .. })
            ));
        }

        #[test]
        fn cycle_is_rejected() {
            let mut b = TreeBuilder::new("a.cpp");
            b.other(None, "root");
            let mut dump = b.into_dump();
            dump.nodes.push(Node {
                kind: NodeKind::Other {
                    label: "x".to_string(),
                },
                children: vec![NodeId(2)],
            });
            dump.nodes.push(Node {
                kind: NodeKind::Other {
                    label: "y".to_string(),
                },
                children: vec![NodeId(1)],
            });
            assert!(matches!(
                TranslationUnit::from_dump(dump),
                Err(TreeError::Cycle { .. })
            ));
        }

        #[test]
        fn orphan_is_rejected() {
            let mut dump = small_tree().into_dump();
            dump.nodes.push(Node {
                kind: NodeKind::Other {
                    label: "stray".to_string(),
                },
                children: Vec::new(),
            });
            assert_eq!(
                TranslationUnit::from_dump(dump).unwrap_err(),
                TreeError::Orphan { node: NodeId(4) }
            );
        }

        #[test]
        fn bad_instantiation_pattern_is_rejected() {
            let mut dump = small_tree().into_dump();
            dump.decls[1].instantiated_from = Some(DeclId(9));
            assert!(matches!(
                TranslationUnit::from_dump(dump),
                Err(TreeError::MissingDecl { decl: DeclId(9), .. })
            ));
        }

        #[test]
        fn non_dense_ids_are_rejected() {
            let mut dump = small_tree().into_dump();
            dump.decls[1].id = DeclId(5);
            assert!(matches!(
                TranslationUnit::from_dump(dump),
                Err(TreeError::NonDenseId { table: "decls", .. })
            ));
        }
    }

    mod serialization {
        use super::*;

        #[test]
        fn dump_json_shape() {
            let json = r#"{
                "main_file": "a.cpp",
                "files": [{"id": 0, "path": "a.cpp"}],
                "decls": [
                    {"id": 0, "kind": "namespace", "qualified_name": "Foo"},
                    {"id": 1, "kind": "function", "qualified_name": "Foo::g"}
                ],
                "nodes": [
                    {"kind": {"type": "decl", "decl": 0}, "children": [1]},
                    {"kind": {"type": "decl_ref", "location": {"file": 0, "offset": 4},
                              "target": 1, "qualifier": {"type": "namespace", "decl": 0}}},
                    {"kind": {"type": "elaborated", "keyword": "struct"}, "children": [3]},
                    {"kind": {"type": "type_name", "location": {"file": 0, "offset": 9}, "target": 1}}
                ],
                "roots": [0, 2]
            }"#;
            let dump: TranslationUnitDump = serde_json::from_str(json).unwrap();
            assert_eq!(
                dump.nodes[1].kind,
                NodeKind::DeclRef {
                    location: SourceLocation::new(FileId(0), 4),
                    target: DeclId(1),
                    qualifier: Some(Qualifier::Namespace { decl: DeclId(0) }),
                }
            );
            let unit = TranslationUnit::from_dump(dump).unwrap();
            assert_eq!(unit.parent(NodeId(3)), Some(NodeId(2)));
            assert_eq!(unit.decl(DeclId(1)).name(), "g");
        }

        #[test]
        fn builder_dump_survives_json() {
            let dump = small_tree().into_dump();
            let json = serde_json::to_string(&dump).unwrap();
            let back: TranslationUnitDump = serde_json::from_str(&json).unwrap();
            assert_eq!(dump, back);
        }
    }
}
