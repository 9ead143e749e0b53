//! Tree construction from the filesystem
//!
//! Directories expand into subdirectories and modules, modules into their
//! outermost classes and functions, classes into their methods. Functions
//! and methods are leaves.

use super::{NewNode, NodeId, NodeKind, NodeType, SourceTree};
use crate::core::config::AnalysisConfig;
use crate::core::error::{Error, Result};
use crate::parse::segment::split_all;
use crate::parse::syntax::SyntaxKind;
use crate::parse::{DirectoryLister, Entry};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub struct TreeBuilder<'a> {
    lister: DirectoryLister<'a>,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(config: &'a AnalysisConfig) -> Self {
        Self {
            lister: DirectoryLister::new(config),
        }
    }

    /// Build the full tree for a directory or a single source file
    pub fn build(&self, path: &Path) -> Result<SourceTree> {
        if !path.exists() {
            return Err(Error::SourceNotFound {
                path: path.to_path_buf(),
            });
        }

        let mut tree = if path.is_dir() {
            let name = file_name(path);
            let mut tree =
                SourceTree::with_root(NewNode::new(name, NodeKind::Directory).with_path(path));
            let root = tree.root_id();
            self.expand_directory(&mut tree, root)?;
            tree
        } else {
            let name = file_stem(path);
            let code = read_source(path)?;
            SourceTree::with_root(NewNode::new(name, NodeKind::Module { code }).with_path(path))
        };

        if tree.root().node_type() == NodeType::Module {
            let root = tree.root_id();
            self.expand_module(&mut tree, root)?;
        }

        info!(
            root = %tree.root().name(),
            nodes = tree.len(),
            "Built source tree"
        );
        Ok(tree)
    }

    fn expand_directory(&self, tree: &mut SourceTree, id: NodeId) -> Result<()> {
        let (parent_name, dir) = {
            let node = tree.get(id);
            let dir = node
                .path()
                .map(Path::to_path_buf)
                .ok_or_else(|| Error::SourceNotFound {
                    path: node.name().into(),
                })?;
            (node.name().to_string(), dir)
        };

        let entries = self.lister.list(&dir)?;
        // A package shadows a module of the same name, as on import
        let packages: HashSet<String> = entries
            .iter()
            .filter_map(|entry| match entry {
                Entry::Directory(path) => Some(file_name(path)),
                Entry::SourceFile(_) => None,
            })
            .collect();

        let mut children = Vec::new();
        for entry in entries {
            match entry {
                Entry::Directory(path) => {
                    let name = format!("{}.{}", parent_name, file_name(&path));
                    children.push(NewNode::new(name, NodeKind::Directory).with_path(path));
                }
                Entry::SourceFile(path) => {
                    let name = format!("{}.{}", parent_name, file_stem(&path));
                    if packages.contains(&file_stem(&path)) {
                        warn!(
                            module = %name,
                            path = %path.display(),
                            "Module is shadowed by a package of the same name; skipping it"
                        );
                        continue;
                    }
                    let code = read_source(&path)?;
                    children.push(NewNode::new(name, NodeKind::Module { code }).with_path(path));
                }
            }
        }

        let ids = tree.attach(id, children)?;
        for child in ids {
            match tree.get(child).node_type() {
                NodeType::Directory => self.expand_directory(tree, child)?,
                NodeType::Module => self.expand_module(tree, child)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn expand_module(&self, tree: &mut SourceTree, id: NodeId) -> Result<()> {
        let (parent_name, split) = {
            let node = tree.get(id);
            let code = node.code().unwrap_or_default();
            (
                node.name().to_string(),
                split_all(code, &[SyntaxKind::Class, SyntaxKind::Function])?,
            )
        };
        if !split.parsed {
            warn!(module = %parent_name, "Module does not parse; keeping it without children");
        }

        let children = split
            .segments
            .into_iter()
            .map(|segment| {
                let name = qualified(&parent_name, segment.node.name.as_deref());
                let kind = match segment.node.kind {
                    SyntaxKind::Class => NodeKind::Class { code: segment.text },
                    _ => NodeKind::Function { code: segment.text },
                };
                NewNode::new(name, kind)
            })
            .collect();

        let ids = tree.attach(id, children)?;
        for child in ids {
            if tree.get(child).node_type() == NodeType::Class {
                self.expand_class(tree, child)?;
            }
        }
        Ok(())
    }

    fn expand_class(&self, tree: &mut SourceTree, id: NodeId) -> Result<()> {
        let (parent_name, split) = {
            let node = tree.get(id);
            let name = node.name().to_string();
            match node.inner_code() {
                Some(inner) => (name, split_all(inner, &[SyntaxKind::Function])?),
                None => {
                    warn!(class = %name, "No class body found; keeping it without children");
                    (name, Default::default())
                }
            }
        };
        if !split.parsed && !split.remaining.is_empty() {
            warn!(class = %parent_name, "Class body does not parse; keeping it without children");
        }

        let children = split
            .segments
            .into_iter()
            .map(|segment| {
                NewNode::new(
                    qualified(&parent_name, segment.node.name.as_deref()),
                    NodeKind::ClassMethod { code: segment.text },
                )
            })
            .collect();

        tree.attach(id, children)?;
        Ok(())
    }
}

fn qualified(parent: &str, local: Option<&str>) -> String {
    format!("{}.{}", parent, local.unwrap_or("<anonymous>"))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Read a source file, replacing invalid UTF-8
fn read_source(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
