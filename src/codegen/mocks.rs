//! Mock expectations generated from interactions
//!
//! `1 * subscriber.receive("hi") >> :ok` becomes
//! `subscriber.expects(:receive).with("hi").times(1).returns(:ok)`. The expectation
//! must be in place before the action runs, so it is hoisted ahead of the When
//! statements; only forwarded-block checks stay behind in the Then position.

use crate::error::TransformError;
use crate::interactions::{Bound, Cardinality};
use crate::tree::build::{call, constant, int, lvar, lvasgn, sym};
use crate::tree::view::InteractionView;
use crate::tree::{IrView, Node};

/// Prefix of the local holding the block captured for the n-th interaction.
pub const BLOCK_CAPTURE_PREFIX: &str = "__phasespec_blk_";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MockExpectation {
    /// Statements that run before the action.
    pub setup: Vec<Node>,
    /// Statements that stay in the Then position.
    pub verification: Vec<Node>,
}

/// `ordinal` numbers the interactions of one Then phase and keeps capture locals apart.
pub fn expectation(
    view: &InteractionView<'_>,
    ordinal: usize,
) -> Result<MockExpectation, TransformError> {
    let mut chain = call(
        Some(view.receiver.clone()),
        "expects",
        vec![sym(view.message).into()],
    );
    if let Some(args) = view.args {
        chain = call(Some(chain), "with", args.children().to_vec());
    }
    chain = cardinality_chain(chain, &Cardinality::resolve(view.cardinality)?);
    if let Some(outcome) = view.outcome {
        chain = match IrView::of(outcome) {
            Some(IrView::Returns(returns)) => {
                call(Some(chain), "returns", vec![returns.value.clone().into()])
            }
            Some(IrView::StubRaises(raises)) => call(Some(chain), "raises", raises.args.to_vec()),
            _ => chain,
        };
    }

    let mut mock = MockExpectation {
        setup: vec![chain.at(view.node.location().cloned())],
        verification: Vec::new(),
    };
    if let Some(forwarded) = view.block_pass.and_then(|pass| pass.node_at(0)) {
        let capture = format!("{}{}", BLOCK_CAPTURE_PREFIX, ordinal);
        let block_capture = constant(Some(constant(None, "PhaseSpec")), "BlockCapture");
        mock.setup.push(lvasgn(
            &capture,
            call(
                Some(block_capture),
                "capture",
                vec![view.receiver.clone().into(), sym(view.message).into()],
            ),
        ));
        mock.verification.push(call(
            None,
            "assert_same",
            vec![
                forwarded.clone().into(),
                call(Some(lvar(&capture)), "call", vec![]).into(),
            ],
        ));
    }
    Ok(mock)
}

fn chained(receiver: Node, method: &str, arg: Node) -> Node {
    call(Some(receiver), method, vec![arg.into()])
}

fn cardinality_chain(chain: Node, cardinality: &Cardinality) -> Node {
    match cardinality {
        Cardinality::Any => chained(chain, "at_least", int(0)),
        Cardinality::Exact(count) => chained(chain, "times", count.clone()),
        Cardinality::Range { min, max } => match (min, max) {
            (Bound::Any, Bound::Any) => chained(chain, "at_least", int(0)),
            (Bound::Value(min), Bound::Any) => chained(chain, "at_least", min.clone()),
            (Bound::Any, Bound::Value(max)) => {
                chained(chained(chain, "at_least", int(0)), "at_most", max.clone())
            }
            (Bound::Value(min), Bound::Value(max)) => {
                chained(chained(chain, "at_least", min.clone()), "at_most", max.clone())
            }
        },
    }
}
