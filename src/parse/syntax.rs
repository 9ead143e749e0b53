//! Syntax Offset Extraction
//!
//! Parses Python source with tree-sitter and reports constructs with their
//! line/column boundaries. Nothing here re-derives grammar: the analyzer
//! tokenizes and parses, this module only reads offsets back out of its tree.
//!
//! A parse that contains any error node counts as a failure. Failures are
//! logged and behave as "no constructs found".
//!
//! @module parse/syntax

use tree_sitter::{Language, Node, Parser, Tree, TreeCursor};
use tracing::{debug, warn};

// =============================================================================
// SYNTAX KINDS
// =============================================================================

/// Construct kinds that can be requested from the extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxKind {
    Class,
    Function,
    Import,
    ImportFrom,
}

impl SyntaxKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Function => "function",
            Self::Import => "import",
            Self::ImportFrom => "import_from",
        }
    }

    /// Class and function declarations carry a body and can be segmented
    pub fn is_compound(&self) -> bool {
        matches!(self, Self::Class | Self::Function)
    }

    /// Map a tree-sitter-python node kind
    fn from_node_kind(kind: &str) -> Option<Self> {
        match kind {
            "class_definition" => Some(Self::Class),
            "function_definition" => Some(Self::Function),
            "import_statement" | "future_import_statement" => Some(Self::Import),
            "import_from_statement" => Some(Self::ImportFrom),
            _ => None,
        }
    }
}

impl std::fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// EXTRACTED NODES
// =============================================================================

/// A construct located in a code string. Detached from the parse tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    pub kind: SyntaxKind,
    /// Declared name (compound statements only)
    pub name: Option<String>,
    /// Line of the declaration keyword (1-indexed)
    pub start_line: usize,
    /// Last line of the construct (1-indexed, inclusive)
    pub end_line: usize,
    /// Column of the declaration keyword
    pub start_column: usize,
    /// Lines taken by attached decorators above `start_line`
    pub decorator_lines: usize,
}

/// Declaration and body boundaries of a compound statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    pub kind: SyntaxKind,
    pub name: String,
    /// Line of the declaration keyword (1-indexed)
    pub line_number: usize,
    /// First line of the body's first statement (1-indexed)
    pub body_line: usize,
    /// Indentation of the body's first statement
    pub body_column: usize,
}

/// Shape of a class declaration, as needed by diagram builders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassOutline {
    pub name: String,
    pub bases: Vec<String>,
    pub methods: Vec<String>,
}

// =============================================================================
// PARSING
// =============================================================================

/// tree-sitter grammar for Python
pub fn python_language() -> Language {
    tree_sitter_python::LANGUAGE.into()
}

/// Parse a code string. Returns `None` when it is not syntactically valid.
pub fn parse(code: &str) -> Option<Tree> {
    let mut parser = Parser::new();
    if let Err(e) = parser.set_language(&python_language()) {
        warn!("Failed to load Python grammar: {}", e);
        return None;
    }

    let tree = parser.parse(code, None)?;
    if tree.root_node().has_error() {
        debug!(
            lines = code.split('\n').count(),
            "Unable to analyse the syntax of code segment"
        );
        return None;
    }
    Some(tree)
}

/// Pre-order traversal over a subtree, parent before children
pub struct Preorder<'tree> {
    cursor: TreeCursor<'tree>,
    done: bool,
}

impl<'tree> Preorder<'tree> {
    pub fn new(node: Node<'tree>) -> Self {
        Self {
            cursor: node.walk(),
            done: false,
        }
    }
}

impl<'tree> Iterator for Preorder<'tree> {
    type Item = Node<'tree>;

    fn next(&mut self) -> Option<Node<'tree>> {
        if self.done {
            return None;
        }
        let node = self.cursor.node();
        if self.cursor.goto_first_child() {
            return Some(node);
        }
        loop {
            if self.cursor.goto_next_sibling() {
                return Some(node);
            }
            if !self.cursor.goto_parent() {
                self.done = true;
                return Some(node);
            }
        }
    }
}

// =============================================================================
// EXTRACTION
// =============================================================================

/// Find the first construct of one of `kinds`, in pre-order.
///
/// Parses `code` once; an invalid parse yields `None`.
pub fn find_first(code: &str, kinds: &[SyntaxKind]) -> Option<SyntaxNode> {
    let tree = parse(code)?;
    find_first_in(&tree, code, kinds)
}

/// Same as [`find_first`] against an existing parse of `code`
pub fn find_first_in(tree: &Tree, code: &str, kinds: &[SyntaxKind]) -> Option<SyntaxNode> {
    let source = code.as_bytes();
    Preorder::new(tree.root_node()).find_map(|node| match_node(node, source, kinds))
}

/// Collect every outermost construct of one of `kinds`, in source order.
///
/// A matched construct is not searched further, so nested matches are left
/// inside their enclosing segment.
pub fn find_outermost_in(tree: &Tree, code: &str, kinds: &[SyntaxKind]) -> Vec<SyntaxNode> {
    fn collect(node: Node, source: &[u8], kinds: &[SyntaxKind], out: &mut Vec<SyntaxNode>) {
        if let Some(found) = match_node(node, source, kinds) {
            out.push(found);
            return;
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            collect(child, source, kinds, out);
        }
    }

    let mut found = Vec::new();
    collect(tree.root_node(), code.as_bytes(), kinds, &mut found);
    found
}

fn match_node(node: Node, source: &[u8], kinds: &[SyntaxKind]) -> Option<SyntaxNode> {
    // A decorated definition owns its decorators; report it through the definition
    let (definition, outer) = if node.kind() == "decorated_definition" {
        (node.child_by_field_name("definition")?, node)
    } else {
        (node, node)
    };

    let kind = SyntaxKind::from_node_kind(definition.kind())?;
    if !kinds.contains(&kind) {
        return None;
    }

    let start_line = definition.start_position().row + 1;
    let outer_start_line = outer.start_position().row + 1;
    let name = if kind.is_compound() {
        definition
            .child_by_field_name("name")
            .and_then(|n| n.utf8_text(source).ok())
            .map(|s| s.to_string())
    } else {
        None
    };

    Some(SyntaxNode {
        kind,
        name,
        start_line,
        end_line: end_line(definition),
        start_column: definition.start_position().column,
        decorator_lines: start_line - outer_start_line,
    })
}

/// Last line owned by a node (1-indexed); a node ending at column 0 does not own that line
fn end_line(node: Node) -> usize {
    let end = node.end_position();
    if end.column == 0 && end.row > node.start_position().row {
        end.row
    } else {
        end.row + 1
    }
}

/// First class/function declaration in `tree`, with its body boundaries
pub fn definition(tree: &Tree, code: &str) -> Option<Definition> {
    let source = code.as_bytes();
    let node = first_compound(tree)?;
    let kind = SyntaxKind::from_node_kind(node.kind())?;
    let name = node
        .child_by_field_name("name")
        .and_then(|n| n.utf8_text(source).ok())?
        .to_string();

    let body = node.child_by_field_name("body")?;
    let mut cursor = body.walk();
    let first_statement = body
        .named_children(&mut cursor)
        .find(|child| child.kind() != "comment")
        .unwrap_or(body);

    Some(Definition {
        kind,
        name,
        line_number: node.start_position().row + 1,
        body_line: first_statement.start_position().row + 1,
        body_column: first_statement.start_position().column,
    })
}

fn first_compound(tree: &Tree) -> Option<Node<'_>> {
    Preorder::new(tree.root_node())
        .find(|n| matches!(n.kind(), "class_definition" | "function_definition"))
}

/// Parameter names of the first function declaration in `tree`
pub fn parameter_names(tree: &Tree, code: &str) -> Vec<String> {
    let source = code.as_bytes();
    let Some(function) = Preorder::new(tree.root_node()).find(|n| n.kind() == "function_definition")
    else {
        return Vec::new();
    };
    let Some(parameters) = function.child_by_field_name("parameters") else {
        return Vec::new();
    };

    let mut names = Vec::new();
    let mut cursor = parameters.walk();
    for param in parameters.named_children(&mut cursor) {
        let name_node = match param.kind() {
            "identifier" => Some(param),
            "default_parameter" | "typed_default_parameter" => param.child_by_field_name("name"),
            // typed_parameter, list_splat_pattern, dictionary_splat_pattern
            _ => first_identifier(param),
        };
        if let Some(text) = name_node.and_then(|n| n.utf8_text(source).ok()) {
            names.push(text.to_string());
        }
    }
    names
}

fn first_identifier(node: Node) -> Option<Node> {
    Preorder::new(node).find(|n| n.kind() == "identifier")
}

/// Name, bases and directly declared methods of the first class in `tree`
pub fn class_outline(tree: &Tree, code: &str) -> Option<ClassOutline> {
    let source = code.as_bytes();
    let class = Preorder::new(tree.root_node()).find(|n| n.kind() == "class_definition")?;
    let name = class
        .child_by_field_name("name")?
        .utf8_text(source)
        .ok()?
        .to_string();

    let mut bases = Vec::new();
    if let Some(superclasses) = class.child_by_field_name("superclasses") {
        let mut cursor = superclasses.walk();
        for base in superclasses.named_children(&mut cursor) {
            match base.kind() {
                "keyword_argument" | "comment" => continue,
                _ => bases.push(base_id(base, source)),
            }
        }
    }

    let mut methods = Vec::new();
    if let Some(body) = class.child_by_field_name("body") {
        let mut cursor = body.walk();
        for statement in body.named_children(&mut cursor) {
            let function = match statement.kind() {
                "function_definition" => Some(statement),
                "decorated_definition" => statement
                    .child_by_field_name("definition")
                    .filter(|d| d.kind() == "function_definition"),
                _ => None,
            };
            if let Some(name) = function
                .and_then(|f| f.child_by_field_name("name"))
                .and_then(|n| n.utf8_text(source).ok())
            {
                methods.push(name.to_string());
            }
        }
    }

    Some(ClassOutline {
        name,
        bases,
        methods,
    })
}

/// `a.b.C` becomes `a_b_C`, anything that is not a plain name becomes `UNKNOWN_BASE`
fn base_id(node: Node, source: &[u8]) -> String {
    match node.kind() {
        "identifier" => node.utf8_text(source).unwrap_or("UNKNOWN_BASE").to_string(),
        "attribute" => {
            let object = node
                .child_by_field_name("object")
                .map(|o| base_id(o, source))
                .unwrap_or_else(|| "UNKNOWN_BASE".to_string());
            let attr = node
                .child_by_field_name("attribute")
                .and_then(|a| a.utf8_text(source).ok())
                .unwrap_or("UNKNOWN_BASE");
            format!("{}_{}", object, attr)
        }
        _ => "UNKNOWN_BASE".to_string(),
    }
}

// =============================================================================
// TESTS
// =============================================================================
