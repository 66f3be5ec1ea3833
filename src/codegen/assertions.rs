//! Assertions generated from verification statements

use crate::tree::build::{begin, call, lvasgn, nodes, s, str_lit, sym};
use crate::tree::view::{BinaryStatementView, RaisesView, StatementView};
use crate::tree::{IrView, Node};

/// Assertion for one Then or Expect statement. Statements that are not conditions,
/// such as assignments, are kept as they are.
pub fn assertion(statement: &Node) -> Node {
    let generated = match IrView::of(statement) {
        Some(IrView::BinaryStatement(view)) => binary(&view),
        Some(IrView::Statement(view)) => truthiness(&view),
        _ => return statement.clone(),
    };
    generated.at(statement.location().cloned())
}

fn binary(view: &BinaryStatementView<'_>) -> Node {
    let lhs = view.lhs.clone();
    let rhs = view.rhs.clone();
    let (method, args) = match view.operator {
        "==" => ("assert_equal", vec![rhs, lhs]),
        "!=" => ("refute_equal", vec![rhs, lhs]),
        "=~" => ("assert_match", vec![rhs, lhs]),
        "!~" => ("refute_match", vec![rhs, lhs]),
        operator => ("assert_operator", vec![lhs, sym(operator), rhs]),
    };
    call(None, method, nodes(args))
}

fn truthiness(view: &StatementView<'_>) -> Node {
    let negated = view
        .expression
        .as_call()
        .filter(|call| call.method == "!" && call.args.is_empty())
        .and_then(|call| call.receiver);
    let (expected, actual, word) = match negated {
        Some(inner) => (s("false", vec![]), inner.clone(), "false"),
        None => (s("true", vec![]), view.expression.clone(), "true"),
    };
    let message = str_lit(&format!("Expected \"{}\" to be {}", view.source, word));
    call(
        None,
        "assert_equal",
        vec![expected.into(), actual.into(), message.into()],
    )
}

/// Wraps the action statements in `assert_raises`, optionally capturing the exception.
pub fn assert_raises(raises: &RaisesView<'_>, action: Vec<Node>) -> Node {
    let block = s(
        "block",
        vec![
            call(None, "assert_raises", vec![raises.exception.clone().into()]).into(),
            s("args", vec![]).into(),
            begin(action).into(),
        ],
    );
    match raises.variable {
        Some(variable) => lvasgn(variable, block),
        None => block,
    }
}
