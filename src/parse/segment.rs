//! Code segmentation
//!
//! Cuts compound statements out of a code string. The cut text keeps its
//! decorators and loses the statement's indentation; the remaining text is
//! everything before and after it.

use crate::core::error::{Error, Result};
use crate::parse::syntax::{self, SyntaxKind, SyntaxNode};

/// A compound statement cut out of a code string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub node: SyntaxNode,
    pub text: String,
}

/// Result of splitting every outermost compound statement out of a code string
#[derive(Debug, Clone, Default)]
pub struct Split {
    /// Segments in source order
    pub segments: Vec<Segment>,
    /// Text left once all segments are removed
    pub remaining: String,
    /// False when the code could not be parsed (no segments, text untouched)
    pub parsed: bool,
}

/// Separate one compound statement from `code`.
///
/// Returns `(segment, remaining)`. The segment spans the decorators through
/// the last line of the statement, each line stripped of up to
/// `start_column` leading whitespace characters.
pub fn separate(code: &str, node: &SyntaxNode) -> Result<(String, String)> {
    if !node.kind.is_compound() {
        return Err(Error::NotCompoundStatement {
            kind: node.kind.to_string(),
        });
    }

    let lines: Vec<&str> = code.split('\n').collect();
    let start_line = node.start_line.saturating_sub(node.decorator_lines);
    let end_line = node.end_line;
    if start_line == 0 || start_line > end_line || end_line > lines.len() {
        return Err(Error::OffsetMismatch {
            start_line,
            end_line,
            line_count: lines.len(),
        });
    }

    let segment = lines[start_line - 1..end_line]
        .iter()
        .map(|line| strip_indent(line, node.start_column))
        .collect::<Vec<_>>()
        .join("\n");

    let remaining = lines[..start_line - 1]
        .iter()
        .chain(lines[end_line..].iter())
        .copied()
        .collect::<Vec<_>>()
        .join("\n");

    Ok((segment, remaining))
}

/// Drop up to `count` leading whitespace characters of a line.
///
/// Lines indented less than `count` (continuation lines of string literals)
/// keep their text.
pub(crate) fn strip_indent(line: &str, count: usize) -> &str {
    let cut = line
        .char_indices()
        .take(count)
        .find(|(_, c)| !c.is_whitespace())
        .map(|(idx, _)| idx)
        .unwrap_or_else(|| {
            line.char_indices()
                .nth(count)
                .map(|(idx, _)| idx)
                .unwrap_or(line.len())
        });
    &line[cut..]
}

/// Split all outermost statements of `kinds` out of `code` with a single parse.
///
/// Statements are removed bottom-up so earlier line numbers stay valid while
/// later ones are cut.
pub fn split_all(code: &str, kinds: &[SyntaxKind]) -> Result<Split> {
    let Some(tree) = syntax::parse(code) else {
        return Ok(Split {
            segments: Vec::new(),
            remaining: code.to_string(),
            parsed: false,
        });
    };

    let nodes = syntax::find_outermost_in(&tree, code, kinds);
    let mut remaining = code.to_string();
    let mut segments = Vec::with_capacity(nodes.len());
    for node in nodes.into_iter().rev() {
        let (text, rest) = separate(&remaining, &node)?;
        remaining = rest;
        segments.push(Segment { node, text });
    }
    segments.reverse();

    Ok(Split {
        segments,
        remaining,
        parsed: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::syntax::find_first;

    const CODE: &str = "
def test_func_1():
    pass

def test_func_2():
    pass
";

    #[test]
    fn test_strip_indent_only_removes_whitespace() {
        assert_eq!(strip_indent("        return 1", 4), "    return 1");
        assert_eq!(strip_indent("x = 1", 4), "x = 1");
        assert_eq!(strip_indent("  y", 4), "y");
        assert_eq!(strip_indent("", 4), "");
        assert_eq!(strip_indent("\u{3000}\u{3000}ab", 1), "\u{3000}ab");
    }

    #[test]
    fn test_separate_keeps_outdented_string_lines() {
        let code = "class A:\n    def m(self):\n        return \"\"\"\nx\n\"\"\"\n";
        let method = syntax::find_first(code, &[SyntaxKind::Function]).unwrap();
        let (segment, _) = separate(code, &method).unwrap();
        assert_eq!(segment, "def m(self):\n    return \"\"\"\nx\n\"\"\"");
        assert!(syntax::parse(&segment).is_some());
    }

    #[test]
    fn test_separate_statement() {
        let node = find_first(CODE, &[SyntaxKind::Function]).unwrap();
        let (segment, remaining) = separate(CODE, &node).unwrap();
        assert_eq!(segment, "def test_func_1():\n    pass");
        assert_eq!(remaining, "\n\ndef test_func_2():\n    pass\n");
    }

    #[test]
    fn test_separate_rejects_simple_statement() {
        let code = "import os\n";
        let node = find_first(code, &[SyntaxKind::Import]).unwrap();
        assert!(matches!(
            separate(code, &node),
            Err(Error::NotCompoundStatement { .. })
        ));
    }

    #[test]
    fn test_separate_offset_mismatch() {
        let node = find_first(CODE, &[SyntaxKind::Function]).unwrap();
        let err = separate("def short():\n", &SyntaxNode { end_line: 10, ..node }).unwrap_err();
        assert!(matches!(err, Error::OffsetMismatch { end_line: 10, .. }));
    }

    #[test]
    fn test_separate_keeps_decorators_and_dedents() {
        let code = "class Outer:\n    @staticmethod\n    def inner():\n        return 1\n    x = 2\n";
        let tree = syntax::parse(code).unwrap();
        let nodes = syntax::find_outermost_in(&tree, code, &[SyntaxKind::Class]);
        let (outer, rest) = separate(code, &nodes[0]).unwrap();
        assert_eq!(outer, code.trim_end_matches('\n'));
        assert_eq!(rest, "");

        let body = "@staticmethod\ndef inner():\n    return 1\nx = 2\n";
        let node = find_first(body, &[SyntaxKind::Function]).unwrap();
        let (segment, remaining) = separate(body, &node).unwrap();
        assert_eq!(segment, "@staticmethod\ndef inner():\n    return 1");
        assert_eq!(remaining, "x = 2\n");
    }

    #[test]
    fn test_split_all_in_source_order() {
        let code = "import os\n\n@decorator\nclass A:\n    pass\n\nX = 1\n\ndef f():\n    return X\n";
        let split = split_all(code, &[SyntaxKind::Class, SyntaxKind::Function]).unwrap();

        assert!(split.parsed);
        let names: Vec<_> = split
            .segments
            .iter()
            .filter_map(|s| s.node.name.as_deref())
            .collect();
        assert_eq!(names, vec!["A", "f"]);
        assert_eq!(split.segments[0].text, "@decorator\nclass A:\n    pass");
        assert_eq!(split.segments[1].text, "def f():\n    return X");
        assert_eq!(split.remaining, "import os\n\n\nX = 1\n\n");
    }

    #[test]
    fn test_split_all_unparseable() {
        let code = "def broken(:\n    pass\n";
        let split = split_all(code, &[SyntaxKind::Function]).unwrap();
        assert!(!split.parsed);
        assert!(split.segments.is_empty());
        assert_eq!(split.remaining, code);
    }
}
