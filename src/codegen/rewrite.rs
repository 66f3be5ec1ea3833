//! Small tree rewrites applied to generated test methods

use crate::tree::build::{lvar, s, str_lit};
use crate::tree::{Child, Node};

/// Index of the current data row inside a data-driven test.
pub const TEST_INDEX: &str = "_test_index_";
/// Source line of the current data row inside a data-driven test.
pub const LINE_NUMBER: &str = "_line_number_";

/// Replaces zero-argument, receiver-less calls to any of `names` with local variable reads.
pub fn calls_to_locals(node: &Node, names: &[&str]) -> Node {
    if let Some(name) = node.bare_call_name().filter(|name| names.contains(name)) {
        return node.updated(Some("lvar"), vec![Child::sym(name)]);
    }
    let children = node
        .children()
        .iter()
        .map(|child| match child {
            Child::Node(inner) => Child::Node(calls_to_locals(inner, names)),
            scalar => scalar.clone(),
        })
        .collect();
    node.updated(None, children)
}

/// Appends ` <index> line <line>` to the name argument of a `test` call.
pub fn indexed_test_name(test_call: &Node) -> Node {
    let Some(name) = test_call.node_at(2) else {
        return test_call.clone();
    };
    let suffix = || {
        vec![
            Child::from(str_lit(" ")),
            s("begin", vec![lvar(TEST_INDEX).into()]).into(),
            str_lit(" line ").into(),
            s("begin", vec![lvar(LINE_NUMBER).into()]).into(),
        ]
    };
    let indexed = if name.is("str") {
        let mut parts = vec![Child::Node(name.clone())];
        parts.extend(suffix());
        name.updated(Some("dstr"), parts)
    } else if name.is("dstr") {
        let mut parts = name.children().to_vec();
        parts.extend(suffix());
        name.updated(None, parts)
    } else {
        return test_call.clone();
    };

    let mut children = test_call.children().to_vec();
    children[2] = Child::Node(indexed);
    test_call.updated(None, children)
}
