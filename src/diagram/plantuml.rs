//! PlantUML documents
//!
//! Text builders for object relation graphs, per-package class diagrams and
//! class inheritance graphs.

use crate::imports::Edge;
use crate::parse::syntax::{self, ClassOutline};
use crate::tree::{NodeRef, Visitor};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// DOCUMENT
// =============================================================================

/// Line-oriented PlantUML writer with tab indentation
#[derive(Debug)]
pub struct PlantUmlDocument {
    text: String,
    indent: usize,
}

impl Default for PlantUmlDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl PlantUmlDocument {
    pub fn new() -> Self {
        let mut doc = Self {
            text: String::new(),
            indent: 0,
        };
        doc.line("@startuml");
        doc.line("left to right direction");
        doc
    }

    fn line(&mut self, line: &str) {
        for _ in 0..self.indent {
            self.text.push('\t');
        }
        self.text.push_str(line);
        self.text.push('\n');
    }

    fn open(&mut self, header: String) {
        self.line(&format!("{}{{", header));
        self.indent += 1;
    }

    fn close(&mut self) {
        self.indent = self.indent.saturating_sub(1);
        self.line("}");
    }

    pub fn add_object(&mut self, name: &str) {
        self.line(&format!("object {}", name));
    }

    pub fn add_relation(&mut self, from: &str, to: &str) {
        self.line(&format!("{} --> {}", from, to));
    }

    pub fn add_class_declaration(&mut self, name: &str, is_abstract: bool) {
        self.line(&format!("{} {}", class_keyword(is_abstract), name));
    }

    pub fn add_inheritance(&mut self, base: &str, subclass: &str) {
        self.line(&format!("{} <|-- {}", base, subclass));
    }

    pub fn add_package(&mut self, package: &str, modules: &BTreeMap<String, Vec<UmlClass>>) {
        self.open(format!("package {} <<Folder>>", package));
        for (module, classes) in modules {
            self.open(format!("package {} <<Rectangle>>", module));
            for class in classes {
                self.add_class(class);
            }
            self.close();
        }
        self.close();
    }

    pub fn add_class(&mut self, class: &UmlClass) {
        self.open(format!(
            "{} {}",
            class_keyword(class.is_abstract()),
            class.name_with_bases()
        ));
        self.line("==");
        for method in class.public_methods() {
            self.line(&format!("{{method}} {}()", method));
        }
        self.close();
        self.line("");
    }

    pub fn finish(mut self) -> String {
        self.indent = 0;
        self.line("@enduml");
        self.text
    }
}

fn class_keyword(is_abstract: bool) -> &'static str {
    if is_abstract {
        "abstract"
    } else {
        "class"
    }
}

/// Objects in sorted order, then one relation per edge in input order
pub fn relation_graph(edges: &[Edge]) -> String {
    let objects: BTreeSet<&str> = edges
        .iter()
        .flat_map(|(a, b)| [a.as_str(), b.as_str()])
        .collect();

    let mut doc = PlantUmlDocument::new();
    for object in objects {
        doc.add_object(object);
    }
    for (from, to) in edges {
        doc.add_relation(from, to);
    }
    doc.finish()
}

// =============================================================================
// CLASS DIAGRAMS
// =============================================================================

/// A class node placed in its package and module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UmlClass {
    pub package: String,
    pub module: String,
    pub outline: ClassOutline,
}

impl UmlClass {
    /// Place a class by its dotted name: `package.module.Class`
    pub fn new(dotted_name: &str, outline: ClassOutline) -> Self {
        let parts: Vec<&str> = dotted_name.split('.').collect();
        let n = parts.len();
        let module = if n > 1 { parts[n - 2].to_string() } else { "unknown_module".to_string() };
        let package = if n > 2 { parts[..n - 2].join(".") } else { "unknown_package".to_string() };
        Self {
            package,
            module,
            outline,
        }
    }

    pub fn is_abstract(&self) -> bool {
        self.outline.bases.iter().any(|b| b.ends_with("ABC"))
    }

    pub fn name_with_bases(&self) -> String {
        if self.outline.bases.is_empty() {
            self.outline.name.clone()
        } else {
            format!("{}({})", self.outline.name, self.outline.bases.join(","))
        }
    }

    pub fn public_methods(&self) -> impl Iterator<Item = &str> + '_ {
        self.outline
            .methods
            .iter()
            .map(String::as_str)
            .filter(|m| !m.starts_with('_'))
    }
}

fn outline_of(node: NodeRef<'_>) -> Option<ClassOutline> {
    syntax::class_outline(node.syntax_tree()?, node.code()?)
}

/// Groups classes package → module, one class diagram per package
#[derive(Debug, Default)]
pub struct ClassDiagramVisitor {
    packages: BTreeMap<String, BTreeMap<String, Vec<UmlClass>>>,
}

impl ClassDiagramVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(package, document)` pairs
    pub fn into_documents(self) -> Vec<(String, String)> {
        self.packages
            .into_iter()
            .map(|(package, modules)| {
                let mut doc = PlantUmlDocument::new();
                doc.add_package(&package, &modules);
                (package, doc.finish())
            })
            .collect()
    }
}

impl Visitor for ClassDiagramVisitor {
    fn on_class(&mut self, node: NodeRef<'_>) {
        let Some(outline) = outline_of(node) else { return };
        let class = UmlClass::new(node.name(), outline);
        self.packages
            .entry(class.package.clone())
            .or_default()
            .entry(class.module.clone())
            .or_default()
            .push(class);
    }
}

/// Builds one inheritance graph over all classes
#[derive(Debug)]
pub struct InheritanceVisitor {
    doc: PlantUmlDocument,
}

impl Default for InheritanceVisitor {
    fn default() -> Self {
        Self::new()
    }
}

impl InheritanceVisitor {
    pub fn new() -> Self {
        Self {
            doc: PlantUmlDocument::new(),
        }
    }

    pub fn into_document(self) -> String {
        self.doc.finish()
    }
}

impl Visitor for InheritanceVisitor {
    fn on_class(&mut self, node: NodeRef<'_>) {
        let Some(outline) = outline_of(node) else { return };
        let class = UmlClass::new(node.name(), outline);
        if class.outline.bases.is_empty() {
            return;
        }
        self.doc
            .add_class_declaration(&class.outline.name, class.is_abstract());
        for base in class.outline.bases.iter().filter(|b| !b.ends_with("ABC")) {
            self.doc.add_inheritance(base, &class.outline.name);
        }
    }
}
