//! Code generation from phase-test IR back to host test methods
//!
//! The generated method runs, in order: the Given statements, every mock expectation
//! from the Then phase, the When statements (inside `assert_raises` when the Then
//! phase expects an exception), the Then assertions and the Expect assertions. A
//! Cleanup phase turns the whole body into `begin ... ensure <cleanup> end`.
//!
//! With a Where table the method is generated once and iterated over the rows:
//!
//! ```text
//! [[1, 2, 3, 12], ...].each.with_index do |(a, b, c, _line_number_), _test_index_|
//!   test "adds #{_test_index_} line #{_line_number_}" do ... end
//! end
//! ```

pub mod assertions;
pub mod mocks;
pub mod rewrite;

use crate::blocks::Phase;
use crate::error::TransformError;
use crate::tree::build::{arg, array, begin, call, int, nodes, s};
use crate::tree::view::{BodyView, DefView, RaisesView, TestView, WhereView};
use crate::tree::{Child, IrView, Node};
use rewrite::{LINE_NUMBER, TEST_INDEX};

pub struct TestMethodGenerator;

impl TestMethodGenerator {
    pub fn generate(test: &Node) -> Result<Node, TransformError> {
        let view = TestView::of(test).ok_or_else(|| TransformError::StageFailed {
            stage: "codegen".to_string(),
            message: format!("expected a phase test, found {}", test.tag()),
        })?;
        let body = generate_body(&view.body)?;
        Ok(match view.where_table {
            Some(table) => data_driven(&view.def, body, &table),
            None => s(
                "block",
                vec![
                    view.def.method_call.clone().into(),
                    view.def.args.clone().into(),
                    body.into(),
                ],
            ),
        })
    }
}

#[derive(Default)]
struct Sections<'a> {
    given: Vec<Node>,
    setup: Vec<Node>,
    action: Vec<Node>,
    then: Vec<Node>,
    expect: Vec<Node>,
    cleanup: Vec<Node>,
    raises: Option<RaisesView<'a>>,
}

fn generate_body(body: &BodyView<'_>) -> Result<Node, TransformError> {
    let mut sections = Sections::default();
    for phase in body.phases() {
        match phase.phase {
            Phase::Given => sections.given.extend(phase.statements().cloned()),
            Phase::When => sections.action.extend(phase.statements().cloned()),
            Phase::Cleanup => sections.cleanup.extend(phase.statements().cloned()),
            Phase::Expect => sections
                .expect
                .extend(phase.statements().map(assertions::assertion)),
            Phase::Then => {
                let mut ordinal = 0;
                for statement in phase.statements() {
                    match IrView::of(statement) {
                        Some(IrView::Interaction(interaction)) => {
                            let mock = mocks::expectation(&interaction, ordinal)?;
                            ordinal += 1;
                            sections.setup.extend(mock.setup);
                            sections.then.extend(mock.verification);
                        }
                        Some(IrView::Raises(raises)) => {
                            if sections.raises.is_some() {
                                return Err(TransformError::RaisesCondition {
                                    message: "Only one raises condition is allowed per Then block"
                                        .to_string(),
                                    location: statement.location().cloned(),
                                });
                            }
                            sections.raises = Some(raises);
                        }
                        _ => sections.then.push(assertions::assertion(statement)),
                    }
                }
            }
            Phase::Start | Phase::Where | Phase::End => {}
        }
    }

    let action = match &sections.raises {
        Some(raises) => vec![assertions::assert_raises(raises, sections.action)],
        None => sections.action,
    };
    let mut statements = sections.given;
    statements.extend(sections.setup);
    statements.extend(action);
    statements.extend(sections.then);
    statements.extend(sections.expect);

    let mut generated = begin(statements);
    if !sections.cleanup.is_empty() {
        let ensure = s(
            "ensure",
            vec![generated.into(), begin(sections.cleanup).into()],
        );
        generated = s("kwbegin", vec![ensure.into()]);
    }
    Ok(rewrite::calls_to_locals(
        &generated,
        &[TEST_INDEX, LINE_NUMBER],
    ))
}

fn data_driven(def: &DefView<'_>, body: Node, table: &WhereView<'_>) -> Node {
    let header = table.header();
    let test = s(
        "block",
        vec![
            rewrite::indexed_test_name(def.method_call).into(),
            def.args.clone().into(),
            body.into(),
        ],
    );
    let test = rewrite::calls_to_locals(&test, &header);

    let rows = table
        .rows()
        .map(|row| {
            let mut values = row.children().to_vec();
            values.push(match row.line() {
                Some(line) => int(line as i64).into(),
                None => s("nil", vec![]).into(),
            });
            s("array", values)
        })
        .collect();
    let each_with_index = call(
        Some(call(Some(array(rows)), "each", vec![])),
        "with_index",
        vec![],
    );

    let mut params: Vec<Node> = header.iter().map(|name| arg(name)).collect();
    params.push(arg(LINE_NUMBER));
    let args = s(
        "args",
        vec![s("mlhs", nodes(params)).into(), arg(TEST_INDEX).into()],
    );
    s(
        "block",
        vec![each_with_index.into(), args.into(), Child::Node(test)],
    )
}
