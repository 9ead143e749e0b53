//! Source Object Tree
//!
//! Hierarchical model of a Python codebase: directories contain modules and
//! subdirectories, modules contain classes and functions, classes contain
//! methods. Nodes live in an arena ([`SourceTree`]) and refer to each other
//! by [`NodeId`].
//!
//! Every node name is the fully dotted path from the root, so names are
//! unique within a tree.
//!
//! @module tree

mod builder;
mod serialize;
mod visitor;

pub use builder::TreeBuilder;
pub use serialize::{NodeRecord, TreeDict};
pub use visitor::{dispatch, PrintTreeVisitor, Visitor};

use crate::core::error::{Error, Result};
use crate::parse::segment::strip_indent;
use crate::parse::syntax::{self, Definition};
use once_cell::unsync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

// =============================================================================
// NODE TYPES
// =============================================================================

/// Discriminant of a [`NodeKind`], used as the serialized type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Directory,
    Module,
    Class,
    Function,
    ClassMethod,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Directory => "directory",
            Self::Module => "module",
            Self::Class => "class",
            Self::Function => "function",
            Self::ClassMethod => "class_method",
        }
    }

    /// Title used in human-readable listings
    pub fn title(&self) -> &'static str {
        match self {
            Self::Directory => "Directory",
            Self::Module => "Module",
            Self::Class => "Class",
            Self::Function => "Function",
            Self::ClassMethod => "ClassMethod",
        }
    }

    pub fn has_code(&self) -> bool {
        !matches!(self, Self::Directory)
    }

    pub const ALL: [NodeType; 5] = [
        Self::Directory,
        Self::Module,
        Self::Class,
        Self::Function,
        Self::ClassMethod,
    ];
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Node variant and its payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Directory,
    Module { code: String },
    Class { code: String },
    Function { code: String },
    ClassMethod { code: String },
}

impl NodeKind {
    /// Rebuild a kind from its type tag and optional code
    pub fn from_parts(node_type: NodeType, code: Option<String>) -> Option<Self> {
        match (node_type, code) {
            (NodeType::Directory, _) => Some(Self::Directory),
            (NodeType::Module, Some(code)) => Some(Self::Module { code }),
            (NodeType::Class, Some(code)) => Some(Self::Class { code }),
            (NodeType::Function, Some(code)) => Some(Self::Function { code }),
            (NodeType::ClassMethod, Some(code)) => Some(Self::ClassMethod { code }),
            (_, None) => None,
        }
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            Self::Directory => NodeType::Directory,
            Self::Module { .. } => NodeType::Module,
            Self::Class { .. } => NodeType::Class,
            Self::Function { .. } => NodeType::Function,
            Self::ClassMethod { .. } => NodeType::ClassMethod,
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Directory => None,
            Self::Module { code }
            | Self::Class { code }
            | Self::Function { code }
            | Self::ClassMethod { code } => Some(code),
        }
    }
}

// =============================================================================
// NODE
// =============================================================================

/// Index of a node within its [`SourceTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Declaration details of a class or function, with the dedented body
#[derive(Debug, Clone)]
struct CompoundInfo {
    definition: Definition,
    inner_code: String,
}

#[derive(Debug)]
pub struct Node {
    name: String,
    kind: NodeKind,
    path: Option<PathBuf>,
    depth: usize,
    parent: Option<NodeId>,
    branches: OnceCell<Vec<NodeId>>,
    syntax_tree: OnceCell<Option<tree_sitter::Tree>>,
    compound: OnceCell<Option<CompoundInfo>>,
}

impl Node {
    fn new(name: String, kind: NodeKind, path: Option<PathBuf>, depth: usize, parent: Option<NodeId>) -> Self {
        Self {
            name,
            kind,
            path,
            depth,
            parent,
            branches: OnceCell::new(),
            syntax_tree: OnceCell::new(),
            compound: OnceCell::new(),
        }
    }

    /// Fully dotted name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Last component of the dotted name
    pub fn local_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    pub fn code(&self) -> Option<&str> {
        self.kind.code()
    }

    /// Filesystem path (directories and modules built from disk)
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Distance from the root, fixed at creation
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Whether children have been attached (possibly none)
    pub fn is_expanded(&self) -> bool {
        self.branches.get().is_some()
    }

    pub fn code_lines(&self) -> Vec<&str> {
        self.code().map(|c| c.split('\n').collect()).unwrap_or_default()
    }

    /// Line count of the code, 0 for directories
    pub fn line_count(&self) -> usize {
        self.code().map(|c| c.split('\n').count()).unwrap_or(0)
    }

    /// Parsed syntax tree of the code, `None` if it doesn't parse
    pub fn syntax_tree(&self) -> Option<&tree_sitter::Tree> {
        self.syntax_tree
            .get_or_init(|| self.code().and_then(syntax::parse))
            .as_ref()
    }

    fn compound(&self) -> Option<&CompoundInfo> {
        self.compound
            .get_or_init(|| {
                if !matches!(
                    self.node_type(),
                    NodeType::Class | NodeType::Function | NodeType::ClassMethod
                ) {
                    return None;
                }
                let code = self.code()?;
                let definition = syntax::definition(self.syntax_tree()?, code)?;
                let inner_code = code
                    .split('\n')
                    .skip(definition.body_line - 1)
                    .map(|line| strip_indent(line, definition.body_column))
                    .collect::<Vec<_>>()
                    .join("\n");
                Some(CompoundInfo {
                    definition,
                    inner_code,
                })
            })
            .as_ref()
    }

    /// Declaration details of a class/function/method node
    pub fn definition(&self) -> Option<&Definition> {
        self.compound().map(|c| &c.definition)
    }

    /// Name given in the declaration
    pub fn declared_name(&self) -> Option<&str> {
        self.definition().map(|d| d.name.as_str())
    }

    /// Line of the declaration keyword within the node's code (1-indexed)
    pub fn definition_line_number(&self) -> Option<usize> {
        self.definition().map(|d| d.line_number)
    }

    /// Text of the declaration line
    pub fn definition_line(&self) -> Option<&str> {
        let line_number = self.definition_line_number()?;
        self.code()?.split('\n').nth(line_number - 1)
    }

    /// Body text from its first statement on, dedented by the body indentation
    pub fn inner_code(&self) -> Option<&str> {
        self.compound().map(|c| c.inner_code.as_str())
    }
}

// =============================================================================
// TREE ARENA
// =============================================================================

/// A node about to be attached under a parent
#[derive(Debug, Clone)]
pub struct NewNode {
    pub name: String,
    pub kind: NodeKind,
    pub path: Option<PathBuf>,
}

impl NewNode {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// Arena holding every node of one analyzed snapshot
#[derive(Debug)]
pub struct SourceTree {
    nodes: Vec<Node>,
}

impl SourceTree {
    /// Create a tree holding only its root
    pub fn with_root(root: NewNode) -> Self {
        Self {
            nodes: vec![Node::new(root.name, root.kind, root.path, 0, None)],
        }
    }

    pub fn root_id(&self) -> NodeId {
        NodeId(0)
    }

    pub fn root(&self) -> NodeRef<'_> {
        self.get(self.root_id())
    }

    /// Node handle by id. Ids are only minted by this tree.
    pub fn get(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { tree: self, id }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look a node up by its dotted name
    pub fn find(&self, name: &str) -> Option<NodeRef<'_>> {
        self.nodes
            .iter()
            .position(|n| n.name == name)
            .map(|idx| self.get(NodeId(idx)))
    }

    /// Every node in pre-order
    pub fn iter(&self) -> impl Iterator<Item = NodeRef<'_>> + '_ {
        let mut stack = vec![self.root_id()];
        std::iter::from_fn(move || {
            let id = stack.pop()?;
            stack.extend(self.nodes[id.0].branch_ids().iter().rev());
            Some(self.get(id))
        })
    }

    /// Set the children of `parent`. Allowed once per node.
    ///
    /// When two children share a name the later definition wins, keeping
    /// the position of the first.
    pub fn attach(&mut self, parent: NodeId, children: Vec<NewNode>) -> Result<Vec<NodeId>> {
        let parent_node = &self.nodes[parent.0];
        if parent_node.is_expanded() {
            return Err(Error::BranchesAlreadySet {
                name: parent_node.name.clone(),
            });
        }
        let depth = parent_node.depth + 1;

        let mut unique: Vec<NewNode> = Vec::with_capacity(children.len());
        let mut positions: HashMap<String, usize> = HashMap::new();
        for child in children {
            match positions.get(&child.name) {
                Some(&idx) => {
                    debug!(name = %child.name, "Redefinition shadows earlier node");
                    unique[idx] = child;
                }
                None => {
                    positions.insert(child.name.clone(), unique.len());
                    unique.push(child);
                }
            }
        }

        let mut ids = Vec::with_capacity(unique.len());
        for child in unique {
            let id = NodeId(self.nodes.len());
            self.nodes
                .push(Node::new(child.name, child.kind, child.path, depth, Some(parent)));
            ids.push(id);
        }

        let parent_node = &self.nodes[parent.0];
        parent_node
            .branches
            .set(ids.clone())
            .map_err(|_| Error::BranchesAlreadySet {
                name: parent_node.name.clone(),
            })?;
        Ok(ids)
    }
}

impl Node {
    fn branch_ids(&self) -> &[NodeId] {
        self.branches.get().map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Borrowed handle to a node together with its tree
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a SourceTree,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &'a SourceTree {
        self.tree
    }

    pub fn node(&self) -> &'a Node {
        &self.tree.nodes[self.id.0]
    }

    /// Children in insertion order
    pub fn branches(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let tree = self.tree;
        self.node()
            .branch_ids()
            .iter()
            .map(move |&id| tree.get(id))
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.node().parent.map(|id| self.tree.get(id))
    }
}

impl<'a> std::ops::Deref for NodeRef<'a> {
    type Target = Node;

    fn deref(&self) -> &Node {
        self.node()
    }
}

impl std::fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRef")
            .field("name", &self.name())
            .field("type", &self.node_type())
            .finish()
    }
}
