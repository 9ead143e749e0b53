//! Tree visitors
//!
//! A visitor receives every node in pre-order. `on_any` runs first, then the
//! handler for the node's kind. All handlers default to no-ops.

use super::{NodeKind, NodeRef, SourceTree};

pub trait Visitor {
    fn on_any(&mut self, _node: NodeRef<'_>) {}
    fn on_directory(&mut self, _node: NodeRef<'_>) {}
    fn on_module(&mut self, _node: NodeRef<'_>) {}
    fn on_class(&mut self, _node: NodeRef<'_>) {}
    fn on_function(&mut self, _node: NodeRef<'_>) {}
    fn on_class_method(&mut self, _node: NodeRef<'_>) {}
    /// Called once after the last node
    fn on_finish(&mut self) {}
}

/// Deliver one node to a visitor
pub fn dispatch<V: Visitor + ?Sized>(visitor: &mut V, node: NodeRef<'_>) {
    visitor.on_any(node);
    match node.kind() {
        NodeKind::Directory => visitor.on_directory(node),
        NodeKind::Module { .. } => visitor.on_module(node),
        NodeKind::Class { .. } => visitor.on_class(node),
        NodeKind::Function { .. } => visitor.on_function(node),
        NodeKind::ClassMethod { .. } => visitor.on_class_method(node),
    }
}

impl SourceTree {
    /// Walk the whole tree, parents before children
    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) {
        for node in self.iter() {
            dispatch(visitor, node);
        }
        visitor.on_finish();
    }
}

/// Renders the tree as an indented outline
#[derive(Debug, Default)]
pub struct PrintTreeVisitor {
    lines: Vec<String>,
}

impl PrintTreeVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

impl Visitor for PrintTreeVisitor {
    fn on_any(&mut self, node: NodeRef<'_>) {
        let indent = "|    ".repeat(node.depth());
        self.lines.push(format!(
            "{}+--- {} -> {}",
            indent,
            node.node_type().title(),
            node.name()
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{NewNode, NodeType};

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
        finished: bool,
    }

    impl Visitor for Recorder {
        fn on_any(&mut self, node: NodeRef<'_>) {
            self.events.push(format!("any:{}", node.name()));
        }

        fn on_module(&mut self, node: NodeRef<'_>) {
            self.events.push(format!("module:{}", node.name()));
        }

        fn on_class(&mut self, node: NodeRef<'_>) {
            self.events.push(format!("class:{}", node.name()));
        }

        fn on_finish(&mut self) {
            self.finished = true;
        }
    }

    fn sample_tree() -> SourceTree {
        let mut tree = SourceTree::with_root(NewNode::new("pkg", NodeKind::Directory));
        let ids = tree
            .attach(
                tree.root_id(),
                vec![NewNode::new(
                    "pkg.a",
                    NodeKind::Module {
                        code: "class A:\n    pass\n".to_string(),
                    },
                )],
            )
            .unwrap();
        tree.attach(
            ids[0],
            vec![NewNode::new(
                "pkg.a.A",
                NodeKind::Class {
                    code: "class A:\n    pass".to_string(),
                },
            )],
        )
        .unwrap();
        tree
    }

    #[test]
    fn test_generic_handler_runs_before_specific() {
        let tree = sample_tree();
        let mut recorder = Recorder::default();
        tree.accept(&mut recorder);

        assert_eq!(
            recorder.events,
            vec!["any:pkg", "any:pkg.a", "module:pkg.a", "any:pkg.a.A", "class:pkg.a.A"]
        );
        assert!(recorder.finished);
    }

    #[test]
    fn test_print_tree() {
        let tree = sample_tree();
        let mut printer = PrintTreeVisitor::new();
        tree.accept(&mut printer);

        assert_eq!(
            printer.into_lines(),
            vec![
                "+--- Directory -> pkg",
                "|    +--- Module -> pkg.a",
                "|    |    +--- Class -> pkg.a.A",
            ]
        );
        assert_eq!(tree.find("pkg.a.A").unwrap().node_type(), NodeType::Class);
    }
}
