//! Per-node metrics
//!
//! A [`Metric`] computes at most one value per node through the visitor
//! framework. The generic `calculate` runs for every node, then the
//! kind-specific calculation; a later value for the same node replaces the
//! earlier one.
//!
//! @module metrics

use crate::parse::syntax;
use crate::tree::{NodeRef, NodeType, SourceTree, Visitor};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::debug;

static MAIN_GUARD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"if\s*__name__\s*==\s*["']__main__["']\s*:"#).unwrap()
});

/// Whether the code runs as a script (`if __name__ == "__main__":`)
pub fn is_script_source(code: &str) -> bool {
    MAIN_GUARD.is_match(code)
}

// =============================================================================
// METRIC FRAMEWORK
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Flag(bool),
    Count(usize),
    Text(String),
}

impl MetricValue {
    pub fn as_count(&self) -> Option<usize> {
        match self {
            MetricValue::Count(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            MetricValue::Flag(b) => Some(*b),
            _ => None,
        }
    }
}

impl std::fmt::Display for MetricValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricValue::Flag(b) => write!(f, "{}", b),
            MetricValue::Count(n) => write!(f, "{}", n),
            MetricValue::Text(s) => write!(f, "{}", s),
        }
    }
}

pub trait Metric {
    fn name(&self) -> &'static str;

    fn calculate(&self, _node: NodeRef<'_>) -> Option<MetricValue> {
        None
    }
    fn calculate_directory(&self, _node: NodeRef<'_>) -> Option<MetricValue> {
        None
    }
    fn calculate_module(&self, _node: NodeRef<'_>) -> Option<MetricValue> {
        None
    }
    fn calculate_class(&self, _node: NodeRef<'_>) -> Option<MetricValue> {
        None
    }
    fn calculate_function(&self, _node: NodeRef<'_>) -> Option<MetricValue> {
        None
    }
    fn calculate_class_method(&self, _node: NodeRef<'_>) -> Option<MetricValue> {
        None
    }
}

/// Runs a metric over every node of a tree
pub struct MetricVisitor<'m, M: Metric + ?Sized> {
    metric: &'m M,
    values: BTreeMap<String, MetricValue>,
}

impl<'m, M: Metric + ?Sized> MetricVisitor<'m, M> {
    pub fn new(metric: &'m M) -> Self {
        Self {
            metric,
            values: BTreeMap::new(),
        }
    }

    pub fn into_values(self) -> BTreeMap<String, MetricValue> {
        self.values
    }

    fn record(&mut self, node: NodeRef<'_>, value: Option<MetricValue>) {
        let Some(value) = value else { return };
        if let Some(previous) = self.values.insert(node.name().to_string(), value) {
            debug!(
                metric = self.metric.name(),
                node = %node.name(),
                %previous,
                "Metric value replaced"
            );
        }
    }
}

impl<M: Metric + ?Sized> Visitor for MetricVisitor<'_, M> {
    fn on_any(&mut self, node: NodeRef<'_>) {
        let value = self.metric.calculate(node);
        self.record(node, value);
    }

    fn on_directory(&mut self, node: NodeRef<'_>) {
        let value = self.metric.calculate_directory(node);
        self.record(node, value);
    }

    fn on_module(&mut self, node: NodeRef<'_>) {
        let value = self.metric.calculate_module(node);
        self.record(node, value);
    }

    fn on_class(&mut self, node: NodeRef<'_>) {
        let value = self.metric.calculate_class(node);
        self.record(node, value);
    }

    fn on_function(&mut self, node: NodeRef<'_>) {
        let value = self.metric.calculate_function(node);
        self.record(node, value);
    }

    fn on_class_method(&mut self, node: NodeRef<'_>) {
        let value = self.metric.calculate_class_method(node);
        self.record(node, value);
    }
}

/// Metric values keyed by dotted node name
pub fn compute<M: Metric + ?Sized>(tree: &SourceTree, metric: &M) -> BTreeMap<String, MetricValue> {
    let mut visitor = MetricVisitor::new(metric);
    tree.accept(&mut visitor);
    visitor.into_values()
}

// =============================================================================
// BUILT-IN METRICS
// =============================================================================

/// Node type name, for every node
pub struct NodeTypeMetric;

impl Metric for NodeTypeMetric {
    fn name(&self) -> &'static str {
        "type"
    }

    fn calculate(&self, node: NodeRef<'_>) -> Option<MetricValue> {
        Some(MetricValue::Text(node.node_type().to_string()))
    }
}

/// Number of code lines of every code-bearing node
pub struct LineCountMetric;

impl LineCountMetric {
    fn lines(node: NodeRef<'_>) -> Option<MetricValue> {
        Some(MetricValue::Count(node.line_count()))
    }
}

impl Metric for LineCountMetric {
    fn name(&self) -> &'static str {
        "number_of_lines"
    }

    fn calculate_module(&self, node: NodeRef<'_>) -> Option<MetricValue> {
        Self::lines(node)
    }
    fn calculate_class(&self, node: NodeRef<'_>) -> Option<MetricValue> {
        Self::lines(node)
    }
    fn calculate_function(&self, node: NodeRef<'_>) -> Option<MetricValue> {
        Self::lines(node)
    }
    fn calculate_class_method(&self, node: NodeRef<'_>) -> Option<MetricValue> {
        Self::lines(node)
    }
}

/// Parameter count of functions and methods.
///
/// Methods count distinct names without `self`, `args` and `kwargs`.
pub struct ArgumentCountMetric;

impl ArgumentCountMetric {
    fn parameters(node: NodeRef<'_>) -> Option<Vec<String>> {
        let tree = node.syntax_tree()?;
        Some(syntax::parameter_names(tree, node.code()?))
    }
}

impl Metric for ArgumentCountMetric {
    fn name(&self) -> &'static str {
        "number_of_args"
    }

    fn calculate_function(&self, node: NodeRef<'_>) -> Option<MetricValue> {
        Self::parameters(node).map(|p| MetricValue::Count(p.len()))
    }

    fn calculate_class_method(&self, node: NodeRef<'_>) -> Option<MetricValue> {
        let names: HashSet<String> = Self::parameters(node)?
            .into_iter()
            .filter(|p| !matches!(p.as_str(), "self" | "args" | "kwargs"))
            .collect();
        Some(MetricValue::Count(names.len()))
    }
}

/// Whether a module carries a main guard
pub struct ScriptFileMetric;

impl Metric for ScriptFileMetric {
    fn name(&self) -> &'static str {
        "is_script_file"
    }

    fn calculate_module(&self, node: NodeRef<'_>) -> Option<MetricValue> {
        node.code().map(|code| MetricValue::Flag(is_script_source(code)))
    }
}

/// Names of the modules carrying a main guard
pub fn script_modules(tree: &SourceTree) -> BTreeSet<String> {
    compute(tree, &ScriptFileMetric)
        .into_iter()
        .filter(|(_, value)| value.as_flag() == Some(true))
        .map(|(name, _)| name)
        .collect()
}

// =============================================================================
// SUMMARY
// =============================================================================

/// Item count and line statistics of one node type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeSummary {
    pub node_type: NodeType,
    pub items: usize,
    pub total_lines: usize,
    pub min_lines: Option<usize>,
    pub mean_lines: Option<f64>,
    pub max_lines: Option<usize>,
}

/// Per-type summary, fewest items first
pub fn summarize(tree: &SourceTree) -> Vec<TypeSummary> {
    let lines = compute(tree, &LineCountMetric);
    let mut per_type: BTreeMap<NodeType, (usize, Vec<usize>)> = BTreeMap::new();
    for node in tree.iter() {
        let entry = per_type.entry(node.node_type()).or_default();
        entry.0 += 1;
        if let Some(count) = lines.get(node.name()).and_then(MetricValue::as_count) {
            entry.1.push(count);
        }
    }

    let mut summary: Vec<TypeSummary> = per_type
        .into_iter()
        .map(|(node_type, (items, counts))| {
            let total_lines: usize = counts.iter().sum();
            TypeSummary {
                node_type,
                items,
                total_lines,
                min_lines: counts.iter().min().copied(),
                mean_lines: (!counts.is_empty()).then(|| total_lines as f64 / counts.len() as f64),
                max_lines: counts.iter().max().copied(),
            }
        })
        .collect();
    summary.sort_by_key(|s| s.items);
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{NewNode, NodeKind};

    fn sample_tree() -> SourceTree {
        let module_code = "class A:\n    def m(self, x, *args, **kwargs):\n        pass\n\ndef f(a, b=1):\n    return a\n\nif __name__ == '__main__':\n    f(1)\n";
        let mut tree = SourceTree::with_root(NewNode::new("pkg", NodeKind::Directory));
        let ids = tree
            .attach(
                tree.root_id(),
                vec![NewNode::new("pkg.a", NodeKind::Module { code: module_code.into() })],
            )
            .unwrap();
        let ids = tree
            .attach(
                ids[0],
                vec![
                    NewNode::new(
                        "pkg.a.A",
                        NodeKind::Class {
                            code: "class A:\n    def m(self, x, *args, **kwargs):\n        pass".into(),
                        },
                    ),
                    NewNode::new(
                        "pkg.a.f",
                        NodeKind::Function {
                            code: "def f(a, b=1):\n    return a".into(),
                        },
                    ),
                ],
            )
            .unwrap();
        tree.attach(
            ids[0],
            vec![NewNode::new(
                "pkg.a.A.m",
                NodeKind::ClassMethod {
                    code: "def m(self, x, *args, **kwargs):\n    pass".into(),
                },
            )],
        )
        .unwrap();
        tree
    }

    #[test]
    fn test_type_and_lines() {
        let tree = sample_tree();
        let types = compute(&tree, &NodeTypeMetric);
        assert_eq!(types.len(), 5);
        assert_eq!(types["pkg.a.A.m"], MetricValue::Text("class_method".into()));

        let lines = compute(&tree, &LineCountMetric);
        assert!(!lines.contains_key("pkg"), "directories have no lines");
        assert_eq!(lines["pkg.a.f"], MetricValue::Count(2));
        assert_eq!(lines["pkg.a"], MetricValue::Count(10));
    }

    #[test]
    fn test_argument_counts() {
        let tree = sample_tree();
        let args = compute(&tree, &ArgumentCountMetric);
        assert_eq!(args["pkg.a.f"], MetricValue::Count(2));
        assert_eq!(args["pkg.a.A.m"], MetricValue::Count(1));
        assert!(!args.contains_key("pkg.a.A"));
    }

    #[test]
    fn test_script_detection() {
        assert!(is_script_source("if __name__ == \"__main__\":\n    main()\n"));
        assert!(is_script_source("if __name__=='__main__':\n    main()\n"));
        assert!(!is_script_source("name = '__main__'\n"));

        let tree = sample_tree();
        let scripts = script_modules(&tree);
        assert_eq!(scripts.into_iter().collect::<Vec<_>>(), vec!["pkg.a"]);
    }

    #[test]
    fn test_later_value_replaces_earlier() {
        struct Both;
        impl Metric for Both {
            fn name(&self) -> &'static str {
                "both"
            }
            fn calculate(&self, _node: NodeRef<'_>) -> Option<MetricValue> {
                Some(MetricValue::Text("generic".into()))
            }
            fn calculate_class(&self, _node: NodeRef<'_>) -> Option<MetricValue> {
                Some(MetricValue::Text("specific".into()))
            }
        }

        let values = compute(&sample_tree(), &Both);
        assert_eq!(values["pkg.a.A"], MetricValue::Text("specific".into()));
        assert_eq!(values["pkg.a"], MetricValue::Text("generic".into()));
    }

    #[test]
    fn test_summary() {
        let summary = summarize(&sample_tree());
        let directory = summary.iter().find(|s| s.node_type == NodeType::Directory).unwrap();
        assert_eq!(directory.items, 1);
        assert_eq!(directory.min_lines, None);

        let module = summary.iter().find(|s| s.node_type == NodeType::Module).unwrap();
        assert_eq!(module.total_lines, 10);
        assert_eq!(module.mean_lines, Some(10.0));
    }

    #[test]
    fn test_metric_value_json() {
        let values: Vec<MetricValue> = serde_json::from_str(r#"[true, 3, "module"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                MetricValue::Flag(true),
                MetricValue::Count(3),
                MetricValue::Text("module".into())
            ]
        );
    }
}
