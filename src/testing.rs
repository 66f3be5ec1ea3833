//! Helpers for tests of phase transformations
//!
//! These helpers panic on failure, so they belong in tests only.

use crate::codegen::rewrite::{LINE_NUMBER, TEST_INDEX};
use crate::pipeline::{Pipeline, PipelineOptions};
use crate::source_map::SourceMapRegistry;
use crate::syntax::{SexpSyntax, Syntax};
use crate::tree::build::int;
use crate::tree::{Child, Node};
use std::collections::HashMap;
use std::sync::Arc;

/// Parses S-expression text, panicking on malformed input.
pub fn parse_sexp(source: &str) -> Node {
    SexpSyntax::new()
        .parse(source, "(test)")
        .unwrap_or_else(|err| panic!("invalid test source: {err}"))
}

/// Runs `source` through the standard pipeline and returns the emitted text.
pub fn transform_sexp(source: &str) -> String {
    Pipeline::standard(
        PipelineOptions::default(),
        Arc::new(SourceMapRegistry::new()),
    )
    .transform(source)
    .unwrap_or_else(|err| panic!("transformation failed: {err}"))
}

/// One iteration of a data-driven test with the row values substituted in.
#[derive(Debug, Clone, PartialEq)]
pub struct Unrolled {
    pub index: usize,
    pub line: Option<i64>,
    pub test: Node,
}

/// Expands a generated `rows.each.with_index do |(..), _test_index_| ... end` loop
/// into one test per row. Returns `None` when `node` is not such a loop.
pub fn unroll_where_loop(node: &Node) -> Option<Vec<Unrolled>> {
    if !node.is("block") {
        return None;
    }
    let iterator = node.node_at(0)?.as_call()?;
    if iterator.method != "with_index" {
        return None;
    }
    let each = iterator.receiver?.as_call()?;
    if each.method != "each" {
        return None;
    }
    let rows = each.receiver.filter(|rows| rows.is("array"))?;

    let params = node.node_at(1)?;
    let names: Vec<&str> = params
        .node_at(0)
        .filter(|mlhs| mlhs.is("mlhs"))?
        .child_nodes()
        .map(|arg| arg.symbol_at(0))
        .collect::<Option<_>>()?;
    if names.last() != Some(&LINE_NUMBER) {
        return None;
    }
    let test = node.node_at(2)?;

    rows.child_nodes()
        .enumerate()
        .map(|(index, row)| {
            let values: Vec<&Node> = row.child_nodes().collect();
            if values.len() != names.len() {
                return None;
            }
            let mut bindings: HashMap<&str, Node> = names
                .iter()
                .copied()
                .zip(values.iter().map(|value| (*value).clone()))
                .collect();
            bindings.insert(TEST_INDEX, int(index as i64));
            let line = values.last().and_then(|value| match value.child(0) {
                Some(Child::Int(line)) => Some(*line),
                _ => None,
            });
            Some(Unrolled {
                index,
                line,
                test: substitute(test, &bindings),
            })
        })
        .collect()
}

fn substitute(node: &Node, bindings: &HashMap<&str, Node>) -> Node {
    if node.is("lvar") {
        if let Some(value) = node.symbol_at(0).and_then(|name| bindings.get(name)) {
            return value.clone();
        }
    }
    let children = node
        .children()
        .iter()
        .map(|child| match child {
            Child::Node(inner) => Child::Node(substitute(inner, bindings)),
            scalar => scalar.clone(),
        })
        .collect();
    node.updated(None, children)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATA_DRIVEN: &str = r#"
(block (send nil :test (str "adds"))
  (args)
  (begin
    (send nil :Expect)
    (send (send (lvar :a) :+ (lvar :b)) :== (lvar :c))
    (send nil :Where)
    (send (send (send nil :a) :| (send nil :b)) :| (send nil :c))
    (send (send (int 1) :| (int 2)) :| (int 3))
    (send (send (int 4) :| (int 5)) :| (int 9))))
"#;

    #[test]
    fn test_unroll_substitutes_row_values() {
        let emitted = transform_sexp(DATA_DRIVEN);
        let tree = parse_sexp(&emitted);
        let unrolled = unroll_where_loop(&tree).expect("where loop");
        assert_eq!(unrolled.len(), 2);
        assert_eq!(unrolled[0].index, 0);
        assert_eq!(unrolled[1].line, Some(10));

        let first = unrolled[0].test.to_string();
        assert!(first.contains("(send (int 1) :+ (int 2))"), "{first}");
        assert!(!first.contains("_test_index_"), "{first}");
    }

    #[test]
    fn test_unroll_rejects_other_nodes() {
        assert_eq!(unroll_where_loop(&parse_sexp("(send nil :foo)")), None);
    }
}
