//! Deterministic layout of trees as S-expression text
//!
//! Statement containers break across lines so that every statement of a generated test
//! body gets a line of its own; everything else stays inline. The source map relies on
//! this: one-line nodes are what it can attribute to a source line.

use crate::tree::node::write_scalar;
use crate::tree::{Child, Node};
use std::fmt::Write;

const CONTAINER_TAGS: &[&str] = &[
    "begin", "kwbegin", "block", "ensure", "rescue", "resbody", "class", "module", "sclass",
    "def", "defs", "if", "while", "until", "case", "when",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Printer {
    indent: usize,
}

impl Default for Printer {
    fn default() -> Self {
        Self { indent: 2 }
    }
}

impl Printer {
    pub fn new(indent: usize) -> Self {
        Self { indent }
    }

    pub fn print(&self, tree: &Node) -> String {
        let mut out = String::new();
        self.print_node(tree, 0, &mut out);
        out.push('\n');
        out
    }

    fn print_node(&self, node: &Node, depth: usize, out: &mut String) {
        if !is_multiline(node) {
            // Writing into a String cannot fail.
            let _ = write!(out, "{}", node);
            return;
        }

        out.push('(');
        out.push_str(node.tag());
        let first_node = node
            .children()
            .iter()
            .position(|child| matches!(child, Child::Node(_)))
            .unwrap_or(node.children().len());
        let (head, rest) = node.children().split_at(first_node);
        for scalar in head {
            out.push(' ');
            let _ = write_scalar(out, scalar);
        }
        for child in rest {
            out.push('\n');
            out.extend(std::iter::repeat(' ').take((depth + 1) * self.indent));
            match child {
                Child::Node(inner) => self.print_node(inner, depth + 1, out),
                scalar => {
                    let _ = write_scalar(out, scalar);
                }
            }
        }
        out.push(')');
    }
}

fn is_multiline(node: &Node) -> bool {
    let is_container =
        CONTAINER_TAGS.contains(&node.tag()) && node.child_nodes().next().is_some();
    is_container || node.child_nodes().any(is_multiline)
}
