//! Connected components of a relation set
//!
//! Edges are treated as undirected. Each component keeps the edges that
//! belong to it, in input order.

use crate::imports::Edge;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Component {
    pub nodes: BTreeSet<String>,
    pub edges: Vec<Edge>,
}

impl Component {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// Union-find over node indices, with path halving
struct DisjointSet {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl DisjointSet {
    fn new() -> Self {
        Self {
            parent: Vec::new(),
            size: Vec::new(),
        }
    }

    fn add(&mut self) -> usize {
        let id = self.parent.len();
        self.parent.push(id);
        self.size.push(1);
        id
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (mut a, mut b) = (self.find(a), self.find(b));
        if a == b {
            return;
        }
        if self.size[a] < self.size[b] {
            std::mem::swap(&mut a, &mut b);
        }
        self.parent[b] = a;
        self.size[a] += self.size[b];
    }
}

/// Partition `edges` into connected components, largest first.
///
/// Components with the same node count are ordered by their smallest node name.
pub fn split_components(edges: &[Edge]) -> Vec<Component> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut names: Vec<&str> = Vec::new();
    let mut sets = DisjointSet::new();

    for (source, target) in edges {
        let a = node_id(source, &mut index, &mut names, &mut sets);
        let b = node_id(target, &mut index, &mut names, &mut sets);
        sets.union(a, b);
    }

    let mut by_root: HashMap<usize, Component> = HashMap::new();
    for (id, name) in names.iter().enumerate() {
        let root = sets.find(id);
        by_root
            .entry(root)
            .or_insert_with(|| Component {
                nodes: BTreeSet::new(),
                edges: Vec::new(),
            })
            .nodes
            .insert(name.to_string());
    }
    for edge in edges {
        let root = sets.find(index[edge.0.as_str()]);
        if let Some(component) = by_root.get_mut(&root) {
            component.edges.push(edge.clone());
        }
    }

    let mut components: Vec<Component> = by_root.into_values().collect();
    components.sort_by(|a, b| {
        b.node_count()
            .cmp(&a.node_count())
            .then_with(|| a.nodes.iter().next().cmp(&b.nodes.iter().next()))
    });
    components
}

fn node_id<'e>(
    name: &'e str,
    index: &mut HashMap<&'e str, usize>,
    names: &mut Vec<&'e str>,
    sets: &mut DisjointSet,
) -> usize {
    *index.entry(name).or_insert_with(|| {
        names.push(name);
        sets.add()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edges(pairs: &[(&str, &str)]) -> Vec<Edge> {
        pairs
            .iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect()
    }

    #[test]
    fn test_two_disjoint_groups_larger_first() {
        let input = edges(&[
            ("x", "y"),
            ("a", "b"),
            ("b", "c"),
            ("d", "c"),
            ("e", "a"),
        ]);
        let components = split_components(&input);

        assert_eq!(components.len(), 2);
        assert_eq!(components[0].node_count(), 5);
        assert_eq!(components[1].node_count(), 2);
        assert_eq!(components[0].edges.len(), 4);
        assert_eq!(components[1].edges, edges(&[("x", "y")]));

        for component in &components {
            for (source, target) in &component.edges {
                assert!(component.nodes.contains(source) && component.nodes.contains(target));
            }
        }
    }

    #[test]
    fn test_edges_keep_input_order_and_duplicates() {
        let input = edges(&[("b", "a"), ("a", "b"), ("b", "a")]);
        let components = split_components(&input);
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].edges, input);
    }

    #[test]
    fn test_equal_sizes_ordered_by_name() {
        let components = split_components(&edges(&[("m", "n"), ("c", "d"), ("self", "self")]));
        let firsts: Vec<_> = components
            .iter()
            .map(|c| c.nodes.iter().next().unwrap().as_str())
            .collect();
        assert_eq!(firsts, vec!["c", "m", "self"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(split_components(&[]).is_empty());
    }
}
