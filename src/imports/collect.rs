//! Raw import collection
//!
//! Walks every module and records one `(module, import_reference)` row per
//! distinct imported target. A module without imports gets a single
//! [`NO_IMPORTS`] row so that every module is represented.

use crate::core::error::Result;
use crate::parse::syntax::python_language;
use crate::tree::{NodeRef, Visitor};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, Query, QueryCursor};
use tracing::debug;

/// Import reference of a module that imports nothing
pub const NO_IMPORTS: &str = "no-imports";

const IMPORT_QUERY: &str = r#"
(import_statement) @import
(future_import_statement) @future
(import_from_statement) @from
"#;

/// One raw relation row
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImportRow {
    pub module: String,
    pub import_reference: String,
}

impl ImportRow {
    pub fn new(module: impl Into<String>, import_reference: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            import_reference: import_reference.into(),
        }
    }

    pub fn is_no_imports(&self) -> bool {
        self.import_reference == NO_IMPORTS
    }
}

/// Visitor collecting [`ImportRow`]s from module nodes
pub struct ImportCollector {
    query: Query,
    rows: Vec<ImportRow>,
}

impl ImportCollector {
    pub fn new() -> Result<Self> {
        let query = Query::new(&python_language(), IMPORT_QUERY)?;
        Ok(Self {
            query,
            rows: Vec::new(),
        })
    }

    pub fn into_rows(self) -> Vec<ImportRow> {
        self.rows
    }

    /// Distinct import references of one module, in source order
    fn references(&self, module: NodeRef<'_>) -> Vec<String> {
        let (Some(tree), Some(code)) = (module.syntax_tree(), module.code()) else {
            return Vec::new();
        };
        let source = code.as_bytes();
        let package = package_parts(module.name());

        let mut references = Vec::new();
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&self.query, tree.root_node(), source);
        while let Some(m) = matches.next() {
            for capture in m.captures {
                let node = capture.node;
                let capture_name = self.query.capture_names()[capture.index as usize];
                match capture_name {
                    "import" => references.extend(imported_names(node, source)),
                    "future" => references.extend(
                        imported_names(node, source)
                            .into_iter()
                            .map(|name| format!("__future__.{}", name)),
                    ),
                    "from" => references.extend(from_import(node, source, &package)),
                    _ => {}
                }
            }
        }

        let mut seen = HashSet::new();
        references.retain(|r| seen.insert(r.clone()));
        references
    }
}

impl Visitor for ImportCollector {
    fn on_module(&mut self, node: NodeRef<'_>) {
        let references = self.references(node);
        debug!(module = %node.name(), imports = references.len(), "Collected imports");
        if references.is_empty() {
            self.rows.push(ImportRow::new(node.name(), NO_IMPORTS));
        } else {
            self.rows.extend(
                references
                    .into_iter()
                    .map(|reference| ImportRow::new(node.name(), reference)),
            );
        }
    }
}

/// Package of a module name; for `pkg.__init__` that is `pkg` itself
fn package_parts(module: &str) -> Vec<&str> {
    let mut parts: Vec<&str> = module.split('.').collect();
    parts.pop();
    parts
}

fn text(node: Node, source: &[u8]) -> String {
    node.utf8_text(source)
        .map(|t| t.chars().filter(|c| !c.is_whitespace()).collect())
        .unwrap_or_default()
}

/// Targets listed under the `name` field, aliases dropped
fn imported_names(statement: Node, source: &[u8]) -> Vec<String> {
    let mut cursor = statement.walk();
    statement
        .children_by_field_name("name", &mut cursor)
        .filter_map(|name| {
            let target = if name.kind() == "aliased_import" {
                name.child_by_field_name("name")?
            } else {
                name
            };
            Some(text(target, source))
        })
        .collect()
}

fn from_import(statement: Node, source: &[u8], package: &[&str]) -> Vec<String> {
    let Some(module_node) = statement.child_by_field_name("module_name") else {
        return Vec::new();
    };
    let module = if module_node.kind() == "relative_import" {
        resolve_relative(module_node, source, package)
    } else {
        text(module_node, source)
    };

    let mut cursor = statement.walk();
    let wildcard = statement
        .children(&mut cursor)
        .any(|child| child.kind() == "wildcard_import");
    if wildcard {
        return vec![join(&module, "*")];
    }

    imported_names(statement, source)
        .into_iter()
        .map(|name| join(&module, &name))
        .collect()
}

fn join(module: &str, name: &str) -> String {
    if module.ends_with('.') {
        format!("{}{}", module, name)
    } else {
        format!("{}.{}", module, name)
    }
}

/// Turn `..sub` into an absolute path against the importing package.
/// Falls back to the raw text when it climbs above the root.
fn resolve_relative(node: Node, source: &[u8], package: &[&str]) -> String {
    let raw = text(node, source);
    let level = raw.chars().take_while(|c| *c == '.').count();
    let rest = &raw[level..];

    let climb = level.saturating_sub(1);
    if climb >= package.len() {
        return raw;
    }

    let mut parts: Vec<&str> = package[..package.len() - climb].to_vec();
    if !rest.is_empty() {
        parts.push(rest);
    }
    parts.join(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{NewNode, NodeKind, SourceTree};

    fn collect(module: &str, code: &str) -> Vec<String> {
        let tree = SourceTree::with_root(NewNode::new(
            module,
            NodeKind::Module {
                code: code.to_string(),
            },
        ));
        let mut collector = ImportCollector::new().unwrap();
        tree.accept(&mut collector);
        collector
            .into_rows()
            .into_iter()
            .map(|row| row.import_reference)
            .collect()
    }

    #[test]
    fn test_import_forms() {
        let code = "from __future__ import annotations
import os
import a.b as c, json
from pkg.mod import x, y as z
from typing import *
import os
";
        assert_eq!(
            collect("pkg.m", code),
            vec![
                "__future__.annotations",
                "os",
                "a.b",
                "json",
                "pkg.mod.x",
                "pkg.mod.y",
                "typing.*",
            ]
        );
    }

    #[test]
    fn test_relative_imports() {
        let code = "from . import sibling\nfrom .b import x\nfrom ..c import y\nfrom .... import far\n";
        assert_eq!(
            collect("pkg.sub.a", code),
            vec!["pkg.sub.sibling", "pkg.sub.b.x", "pkg.c.y", "....far"]
        );
    }

    #[test]
    fn test_relative_import_in_init() {
        assert_eq!(collect("pkg.__init__", "from .core import run\n"), vec!["pkg.core.run"]);
    }

    #[test]
    fn test_nested_imports_are_collected() {
        let code = "def f():\n    import json\n    return json\n\nclass A:\n    from os import path\n";
        assert_eq!(collect("m", code), vec!["json", "os.path"]);
    }

    #[test]
    fn test_no_imports_sentinel() {
        assert_eq!(collect("pkg.b", "X = 1\n"), vec![NO_IMPORTS]);
        assert_eq!(collect("pkg.broken", "def broken(:\n"), vec![NO_IMPORTS]);
    }

    #[test]
    fn test_every_module_is_represented() {
        let mut tree = SourceTree::with_root(NewNode::new("pkg", NodeKind::Directory));
        tree.attach(
            tree.root_id(),
            vec![
                NewNode::new("pkg.a", NodeKind::Module { code: "import pkg.b\n".into() }),
                NewNode::new("pkg.b", NodeKind::Module { code: String::new() }),
            ],
        )
        .unwrap();

        let mut collector = ImportCollector::new().unwrap();
        tree.accept(&mut collector);
        assert_eq!(
            collector.into_rows(),
            vec![ImportRow::new("pkg.a", "pkg.b"), ImportRow::new("pkg.b", NO_IMPORTS)]
        );
    }
}
