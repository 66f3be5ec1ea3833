//! Recognizing test methods and parsing them into IR

use crate::blocks::{parse_blocks, Block, Phase};
use crate::error::TransformError;
use crate::interactions::InteractionParser;
use crate::statements::StatementParser;
use crate::transforms::Context;
use crate::tree::build::nodes;
use crate::tree::view::{BodyView, DefView, TestView};
use crate::tree::{Child, Node};
use crate::where_table;

/// `(block (send _ :test name...) (args) body?)`
pub fn is_test_block(node: &Node) -> bool {
    node.is("block")
        && node
            .node_at(0)
            .and_then(Node::as_call)
            .is_some_and(|call| call.method == "test")
        && node.node_at(1).is_some_and(|args| args.is("args"))
}

/// The statements of a test block's body: none, the children of a `begin`, or the one statement.
pub fn test_statements(node: &Node) -> Vec<Node> {
    match node.node_at(2) {
        None => Vec::new(),
        Some(body) if body.is("begin") => body.child_nodes().cloned().collect(),
        Some(body) => vec![body.clone()],
    }
}

pub struct TestMethodParser<'a> {
    context: &'a Context,
}

impl<'a> TestMethodParser<'a> {
    pub fn new(context: &'a Context) -> Self {
        Self { context }
    }

    pub fn parse(&self, node: &Node) -> Result<Node, TransformError> {
        let (Some(method_call), Some(args)) = (node.node_at(0), node.node_at(1)) else {
            return Err(TransformError::StageFailed {
                stage: "test method".to_string(),
                message: format!("expected a test block, found {}", node.tag()),
            });
        };
        let blocks = parse_blocks(node.location(), test_statements(node))?;

        let mut phases = Vec::new();
        let mut table = None;
        for block in blocks {
            if block.phase == Phase::Where {
                table = Some(where_table::parse_table(&block)?);
            } else {
                phases.push(self.phase_node(block)?);
            }
        }

        let def = DefView::build(method_call.clone(), args.clone());
        Ok(TestView::build(def, BodyView::build(phases), table).at(node.location().cloned()))
    }

    fn phase_node(&self, block: Block) -> Result<Node, TransformError> {
        let location = block.location().cloned();
        let tag = block.phase.ir_tag().unwrap_or_default();
        let statements = match block.phase {
            Phase::Then => {
                let parser = StatementParser::then_phase(self.context);
                block
                    .statements
                    .into_iter()
                    .map(|statement| {
                        if InteractionParser::is_interaction(&statement) {
                            InteractionParser::parse(statement)
                        } else {
                            parser.classify(statement)
                        }
                    })
                    .collect::<Result<Vec<_>, _>>()?
            }
            Phase::Expect => {
                let parser = StatementParser::expect_phase(self.context);
                block
                    .statements
                    .into_iter()
                    .map(|statement| parser.classify(statement))
                    .collect::<Result<Vec<_>, _>>()?
            }
            _ => block.statements,
        };
        Ok(Node::new(tag, nodes(statements)).at(location))
    }
}
