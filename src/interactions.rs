//! Mock interactions: `cardinality * receiver.message(args) >> outcome`
//!
//! An interaction states how often a collaborator must receive a message, optionally
//! with what arguments and what it answers. The cardinality on the left may be a
//! count, `_` for "any number of times", or a parenthesized range whose bounds may
//! themselves be `_`. Exclusive ranges are turned into inclusive ones while parsing so
//! code generation only ever sees `min..max`.

use crate::error::TransformError;
use crate::tree::build::{array, call, int, s};
use crate::tree::view::{InteractionView, ReturnsView, StubRaisesView};
use crate::tree::{Child, Node};

const BOUND_TAGS: [&str; 3] = ["int", "lvar", "send"];

/// True for `_`, the any-matcher.
pub fn is_wildcard(node: &Node) -> bool {
    node.bare_call_name() == Some("_")
}

#[derive(Debug, Clone, PartialEq)]
pub enum Bound {
    Any,
    Value(Node),
}

impl Bound {
    fn of(node: &Node) -> Bound {
        if is_wildcard(node) {
            Bound::Any
        } else {
            Bound::Value(node.clone())
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cardinality {
    /// `_`
    Any,
    /// A count: literal, variable or call.
    Exact(Node),
    /// An inclusive range.
    Range { min: Bound, max: Bound },
}

impl Cardinality {
    /// Validates an interaction's left-hand side.
    pub fn resolve(node: &Node) -> Result<Cardinality, TransformError> {
        if is_wildcard(node) {
            return Ok(Cardinality::Any);
        }
        if BOUND_TAGS.contains(&node.tag()) {
            return Ok(Cardinality::Exact(node.clone()));
        }
        let range = node
            .is("begin")
            .then(|| node.children())
            .filter(|children| children.len() == 1)
            .and_then(|children| children[0].as_node())
            .filter(|inner| inner.is("irange") || inner.is("erange"));
        let Some(range) = range else {
            return Err(TransformError::InteractionSyntax {
                message: "Unsupported cardinality on the left-hand side of the interaction".to_string(),
                expected: "a count (int, variable or call), `_`, or a parenthesized range".to_string(),
                location: node.location().cloned(),
            });
        };

        let min = range_bound(range, 0, "Minimum")?;
        let max = range_bound(range, 1, "Maximum")?;
        let max = match (range.is("erange"), max) {
            (true, Bound::Value(max)) => {
                Bound::Value(call(Some(max), "-", vec![int(1).into()]))
            }
            (_, max) => max,
        };
        Ok(Cardinality::Range { min, max })
    }

    /// The host form stored in the IR. Ranges are always inclusive.
    pub fn to_node(&self) -> Node {
        match self {
            Cardinality::Any => wildcard(),
            Cardinality::Exact(count) => count.clone(),
            Cardinality::Range { min, max } => {
                let bound = |b: &Bound| match b {
                    Bound::Any => wildcard(),
                    Bound::Value(node) => node.clone(),
                };
                let range = s("irange", vec![bound(min).into(), bound(max).into()]);
                s("begin", vec![range.into()])
            }
        }
    }
}

fn wildcard() -> Node {
    call(None, "_", vec![])
}

fn range_bound(range: &Node, index: usize, which: &str) -> Result<Bound, TransformError> {
    match range.node_at(index) {
        Some(bound) if is_wildcard(bound) || BOUND_TAGS.contains(&bound.tag()) => {
            Ok(Bound::of(bound))
        }
        other => Err(TransformError::InteractionSyntax {
            message: format!("{} of the cardinality range is not supported", which),
            expected: "an int, a variable, a call or `_`".to_string(),
            location: other.and_then(Node::location).or(range.location()).cloned(),
        }),
    }
}

/// Recognizes interaction statements inside Then phases.
pub struct InteractionParser;

impl InteractionParser {
    pub fn is_interaction(node: &Node) -> bool {
        let Some(call) = node.as_call() else {
            return false;
        };
        match (call.method, call.args) {
            ("*", [Child::Node(rhs)]) => {
                call.receiver.is_some() && (rhs.is("send") || rhs.is("block"))
            }
            (">>", [_]) => call.receiver.is_some_and(Self::is_interaction),
            _ => false,
        }
    }

    /// Parses an interaction into IR. Anything that is not an interaction comes back unchanged.
    pub fn parse(node: Node) -> Result<Node, TransformError> {
        if !Self::is_interaction(&node) {
            return Ok(node);
        }
        let location = node.location().cloned();
        let (expectation, outcome) = match node.as_call() {
            Some(call) if call.method == ">>" => (call.receiver, call.args[0].as_node()),
            _ => (Some(&node), None),
        };
        let Some(expectation) = expectation.and_then(Node::as_call) else {
            return Ok(node);
        };
        let (Some(cardinality), Some(rhs)) = (expectation.receiver, expectation.args[0].as_node())
        else {
            return Ok(node);
        };

        if rhs.is("block") {
            return Err(TransformError::InteractionSyntax {
                message: "Inline blocks are not supported in interactions".to_string(),
                expected: "a block argument passed with `&`, e.g. `receiver.message(&handler)`"
                    .to_string(),
                location: rhs.location().cloned(),
            });
        }
        let Some(message) = rhs.as_call() else {
            return Ok(node);
        };
        let Some(receiver) = message.receiver else {
            return Err(TransformError::InteractionSyntax {
                message: "The right-hand side of an interaction must have a receiver".to_string(),
                expected: "`receiver.message(args)`".to_string(),
                location: rhs.location().cloned(),
            });
        };

        let cardinality = Cardinality::resolve(cardinality)?.to_node();
        let mut block_pass = None;
        let mut args = Vec::new();
        for arg in message.arg_nodes() {
            if arg.is("block_pass") && block_pass.is_none() {
                block_pass = Some(arg.clone());
            } else {
                args.push(arg.clone());
            }
        }
        let args = (!args.is_empty()).then(|| array(args));
        let outcome = outcome.map(parse_outcome);

        let interaction = InteractionView::build(
            cardinality,
            receiver.clone(),
            message.method,
            args,
            outcome,
            block_pass,
        );
        Ok(interaction.at(location))
    }
}

fn parse_outcome(node: &Node) -> Node {
    match node.as_call() {
        Some(call) if call.receiver.is_none() && call.method == "raises" => {
            StubRaisesView::build(call.args.to_vec())
        }
        _ => ReturnsView::build(node.clone()),
    }
    .at(node.location().cloned())
}
