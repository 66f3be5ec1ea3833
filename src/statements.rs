//! Classification of Then and Expect phase statements

use crate::error::TransformError;
use crate::transforms::Context;
use crate::tree::view::{BinaryStatementView, RaisesView, StatementView};
use crate::tree::Node;

pub const BINARY_OPERATORS: [&str; 8] = ["==", "!=", "=~", "!~", ">", "<", ">=", "<="];

/// Assignments run as-is inside verification phases.
pub const ASSIGNMENT_TAGS: [&str; 5] = ["lvasgn", "masgn", "op_asgn", "or_asgn", "and_asgn"];

pub struct StatementParser<'a> {
    context: &'a Context,
    raises_allowed: bool,
}

impl<'a> StatementParser<'a> {
    /// Classifier for Then phases, where `raises(...)` expectations are recognized.
    pub fn then_phase(context: &'a Context) -> Self {
        Self {
            context,
            raises_allowed: true,
        }
    }

    pub fn expect_phase(context: &'a Context) -> Self {
        Self {
            context,
            raises_allowed: false,
        }
    }

    pub fn classify(&self, node: Node) -> Result<Node, TransformError> {
        if self.raises_allowed {
            if let Some(raises) = raises_condition(&node)? {
                return Ok(raises);
            }
        }
        if ASSIGNMENT_TAGS.contains(&node.tag()) {
            return Ok(node);
        }
        if let Some((lhs, operator, rhs)) = binary_parts(&node) {
            let built = BinaryStatementView::build(lhs.clone(), operator, rhs.clone());
            return Ok(built.at(node.location().cloned()));
        }
        let source = self.context.source_text(&node);
        let location = node.location().cloned();
        Ok(StatementView::build(node, &source).at(location))
    }
}

fn binary_parts(node: &Node) -> Option<(&Node, &str, &Node)> {
    let call = node.as_call()?;
    if !BINARY_OPERATORS.contains(&call.method) || call.args.len() != 1 {
        return None;
    }
    Some((call.receiver?, call.method, call.args[0].as_node()?))
}

fn raises_condition(node: &Node) -> Result<Option<Node>, TransformError> {
    let (call_node, variable) = if node.is("lvasgn") {
        match (node.symbol_at(0), node.node_at(1)) {
            (Some(name), Some(value)) => (value, Some(name)),
            _ => return Ok(None),
        }
    } else {
        (node, None)
    };
    let Some(call) = call_node.as_call() else {
        return Ok(None);
    };
    if call.receiver.is_some() || call.method != "raises" {
        return Ok(None);
    }
    let Some(exception) = call.arg_nodes().next() else {
        return Err(TransformError::RaisesCondition {
            message: "raises needs the exception class it expects".to_string(),
            location: node.location().cloned(),
        });
    };
    let built = RaisesView::build(exception.clone(), variable);
    Ok(Some(built.at(node.location().cloned())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::build::{call, constant, int, lvar, lvasgn, s};
    use crate::tree::view::tags;
    use crate::tree::{Child, IrView};
    use rstest::rstest;

    fn context() -> Context {
        Context::detached()
    }

    #[rstest]
    #[case("==")]
    #[case("!=")]
    #[case("=~")]
    #[case("!~")]
    #[case(">")]
    #[case("<")]
    #[case(">=")]
    #[case("<=")]
    fn test_binary_operators(#[case] operator: &str) {
        let ctx = context();
        let node = call(Some(lvar("a")), operator, vec![int(1).into()]);
        let classified = StatementParser::expect_phase(&ctx).classify(node).unwrap();
        let Some(IrView::BinaryStatement(view)) = IrView::of(&classified) else {
            panic!("expected a binary statement, got {classified}");
        };
        assert_eq!(view.lhs, &lvar("a"));
        assert_eq!(view.operator, operator);
        assert_eq!(view.rhs, &int(1));
    }

    #[test]
    fn test_other_calls_become_generic_statements() {
        let ctx = context();
        let node = call(Some(lvar("list")), "empty?", vec![]);
        let classified = StatementParser::expect_phase(&ctx)
            .classify(node.clone())
            .unwrap();
        let Some(IrView::Statement(view)) = IrView::of(&classified) else {
            panic!("expected a statement");
        };
        assert_eq!(view.expression, &node);
        assert_eq!(view.source, "(send (lvar :list) :empty?)");
    }

    #[test]
    fn test_operator_with_two_arguments_is_not_binary() {
        let ctx = context();
        let node = call(Some(lvar("a")), "==", vec![int(1).into(), int(2).into()]);
        let classified = StatementParser::expect_phase(&ctx).classify(node).unwrap();
        assert!(classified.is(tags::STATEMENT));
    }

    #[rstest]
    #[case("lvasgn")]
    #[case("op_asgn")]
    #[case("or_asgn")]
    fn test_assignments_pass_through(#[case] tag: &str) {
        let ctx = context();
        let node = s(tag, vec![Child::sym("x"), int(1).into()]);
        let classified = StatementParser::then_phase(&ctx)
            .classify(node.clone())
            .unwrap();
        assert_eq!(classified, node);
    }

    #[test]
    fn test_raises_in_then_phase() {
        let ctx = context();
        let error = constant(None, "ArgumentError");
        let bare = call(None, "raises", vec![error.clone().into()]);
        let assigned = lvasgn("e", bare.clone());

        let parser = StatementParser::then_phase(&ctx);
        let classified = parser.classify(bare.clone()).unwrap();
        let Some(IrView::Raises(view)) = IrView::of(&classified) else {
            panic!("expected raises");
        };
        assert_eq!(view.exception, &error);
        assert_eq!(view.variable, None);

        let classified = parser.classify(assigned).unwrap();
        let Some(IrView::Raises(view)) = IrView::of(&classified) else {
            panic!("expected raises");
        };
        assert_eq!(view.variable, Some("e"));

        let in_expect = StatementParser::expect_phase(&ctx).classify(bare).unwrap();
        assert!(in_expect.is(tags::STATEMENT));
    }

    #[test]
    fn test_raises_without_exception() {
        let ctx = context();
        let err = StatementParser::then_phase(&ctx)
            .classify(call(None, "raises", vec![]))
            .unwrap_err();
        assert!(matches!(err, TransformError::RaisesCondition { .. }));
    }
}
