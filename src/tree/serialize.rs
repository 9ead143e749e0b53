//! Flat dict form of a tree
//!
//! `{name: {type, code, branches}}` with one entry per node. The root is the
//! only name never listed in any `branches`.

use super::visitor::Visitor;
use super::{NewNode, NodeId, NodeKind, NodeRef, NodeType, SourceTree};
use crate::core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub code: Option<String>,
    pub branches: Vec<String>,
}

pub type TreeDict = BTreeMap<String, NodeRecord>;

/// Records every visited node into a [`TreeDict`]
#[derive(Debug, Default)]
struct DictVisitor {
    dict: TreeDict,
}

impl Visitor for DictVisitor {
    fn on_any(&mut self, node: NodeRef<'_>) {
        self.dict.insert(
            node.name().to_string(),
            NodeRecord {
                node_type: node.node_type(),
                code: node.code().map(str::to_string),
                branches: node.branches().map(|b| b.name().to_string()).collect(),
            },
        );
    }
}

impl SourceTree {
    /// Flatten the tree into its dict form
    pub fn to_dict(&self) -> TreeDict {
        let mut visitor = DictVisitor::default();
        self.accept(&mut visitor);
        visitor.dict
    }

    /// Rebuild a tree from its dict form
    pub fn from_dict(dict: &TreeDict) -> Result<SourceTree> {
        let mut parents: HashMap<&str, &str> = HashMap::new();
        for (name, record) in dict {
            for branch in &record.branches {
                if !dict.contains_key(branch) {
                    return Err(invalid(format!("`{}` lists unknown branch `{}`", name, branch)));
                }
                if let Some(other) = parents.insert(branch, name) {
                    return Err(invalid(format!(
                        "`{}` is a branch of both `{}` and `{}`",
                        branch, other, name
                    )));
                }
            }
        }

        let mut roots = dict.keys().filter(|name| !parents.contains_key(name.as_str()));
        let root_name = match (roots.next(), roots.next()) {
            (Some(root), None) => root,
            (None, _) => return Err(invalid("no root node".to_string())),
            (Some(a), Some(b)) => {
                return Err(invalid(format!("more than one root (`{}`, `{}`)", a, b)))
            }
        };

        let mut tree = SourceTree::with_root(new_node(root_name, &dict[root_name])?);
        let mut pending: Vec<(NodeId, &NodeRecord)> = vec![(tree.root_id(), &dict[root_name])];
        while let Some((id, record)) = pending.pop() {
            if !record.node_type.has_code() || !record.branches.is_empty() {
                let children = record
                    .branches
                    .iter()
                    .map(|branch| new_node(branch, &dict[branch]))
                    .collect::<Result<Vec<_>>>()?;
                let ids = tree.attach(id, children)?;
                pending.extend(ids.into_iter().zip(record.branches.iter().map(|b| &dict[b])));
            }
        }

        if tree.len() != dict.len() {
            return Err(invalid(format!(
                "{} of {} nodes reachable from `{}`",
                tree.len(),
                dict.len(),
                root_name
            )));
        }
        Ok(tree)
    }
}

fn new_node(name: &str, record: &NodeRecord) -> Result<NewNode> {
    let kind = NodeKind::from_parts(record.node_type, record.code.clone())
        .ok_or_else(|| invalid(format!("`{}` of type {} has no code", name, record.node_type)))?;
    Ok(NewNode::new(name, kind))
}

fn invalid(message: String) -> Error {
    Error::InvalidTreeDict { message }
}
