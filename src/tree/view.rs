//! Intermediate representation of a parsed phase test
//!
//! The IR reuses [`Node`] with reserved `ps_*` tags. Builders here fix the position of
//! every child; [`IrView::of`] matches a node's tag against the closed set of IR kinds
//! and hands back a typed view whose fields were extracted from those same positions.
//! A node whose shape does not match its tag is simply not an IR node.

use super::build::nodes;
use super::node::{Child, Node};
use crate::blocks::Phase;

pub mod tags {
    pub const TEST: &str = "ps_test";
    pub const DEF: &str = "ps_def";
    pub const BODY: &str = "ps_body";
    pub const GIVEN: &str = "ps_given";
    pub const WHEN: &str = "ps_when";
    pub const THEN: &str = "ps_then";
    pub const EXPECT: &str = "ps_expect";
    pub const CLEANUP: &str = "ps_cleanup";
    pub const WHERE: &str = "ps_where";
    pub const WHERE_HEADER: &str = "ps_where_header";
    pub const INTERACTION: &str = "ps_interaction";
    pub const BINARY_STATEMENT: &str = "ps_binary_statement";
    pub const STATEMENT: &str = "ps_statement";
    pub const RAISES: &str = "ps_raises";
    pub const RETURNS: &str = "ps_returns";
    pub const STUB_RAISES: &str = "ps_stub_raises";
}

/// Typed view over one IR node.
#[derive(Debug, Clone, Copy)]
pub enum IrView<'a> {
    Test(TestView<'a>),
    Def(DefView<'a>),
    Body(BodyView<'a>),
    Phase(PhaseView<'a>),
    Where(WhereView<'a>),
    Interaction(InteractionView<'a>),
    BinaryStatement(BinaryStatementView<'a>),
    Statement(StatementView<'a>),
    Raises(RaisesView<'a>),
    Returns(ReturnsView<'a>),
    StubRaises(StubRaisesView<'a>),
}

impl<'a> IrView<'a> {
    pub fn of(node: &'a Node) -> Option<Self> {
        let view = match node.tag() {
            tags::TEST => IrView::Test(TestView::of(node)?),
            tags::DEF => IrView::Def(DefView::of(node)?),
            tags::BODY => IrView::Body(BodyView { node }),
            tags::WHERE => IrView::Where(WhereView::of(node)?),
            tags::INTERACTION => IrView::Interaction(InteractionView::of(node)?),
            tags::BINARY_STATEMENT => IrView::BinaryStatement(BinaryStatementView::of(node)?),
            tags::STATEMENT => IrView::Statement(StatementView::of(node)?),
            tags::RAISES => IrView::Raises(RaisesView::of(node)?),
            tags::RETURNS => IrView::Returns(ReturnsView {
                value: node.node_at(0)?,
            }),
            tags::STUB_RAISES => IrView::StubRaises(StubRaisesView {
                args: node.children(),
            }),
            tag => IrView::Phase(PhaseView {
                phase: Phase::from_ir_tag(tag)?,
                node,
            }),
        };
        Some(view)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TestView<'a> {
    pub def: DefView<'a>,
    pub body: BodyView<'a>,
    pub where_table: Option<WhereView<'a>>,
}

impl<'a> TestView<'a> {
    pub fn build(def: Node, body: Node, where_table: Option<Node>) -> Node {
        let mut children = vec![Child::Node(def), Child::Node(body)];
        children.extend(where_table.map(Child::Node));
        Node::new(tags::TEST, children)
    }

    pub fn of(node: &'a Node) -> Option<Self> {
        if !node.is(tags::TEST) {
            return None;
        }
        let where_table = match node.node_at(2) {
            Some(table) => Some(WhereView::of(table)?),
            None => None,
        };
        Some(Self {
            def: DefView::of(node.node_at(0)?)?,
            body: BodyView::of(node.node_at(1)?)?,
            where_table,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DefView<'a> {
    pub method_call: &'a Node,
    pub args: &'a Node,
}

impl<'a> DefView<'a> {
    pub fn build(method_call: Node, args: Node) -> Node {
        Node::new(tags::DEF, nodes(vec![method_call, args]))
    }

    fn of(node: &'a Node) -> Option<Self> {
        node.is(tags::DEF).then_some(())?;
        Some(Self {
            method_call: node.node_at(0)?,
            args: node.node_at(1)?,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BodyView<'a> {
    node: &'a Node,
}

impl<'a> BodyView<'a> {
    pub fn build(phases: Vec<Node>) -> Node {
        Node::new(tags::BODY, nodes(phases))
    }

    fn of(node: &'a Node) -> Option<Self> {
        node.is(tags::BODY).then_some(Self { node })
    }

    pub fn phases(&self) -> impl Iterator<Item = PhaseView<'a>> {
        let node: &'a Node = self.node;
        node.child_nodes().filter_map(|child| {
            Phase::from_ir_tag(child.tag()).map(|phase| PhaseView { phase, node: child })
        })
    }
}

/// Given, When, Then, Expect and Cleanup phases: a tagged list of statements.
#[derive(Debug, Clone, Copy)]
pub struct PhaseView<'a> {
    pub phase: Phase,
    pub node: &'a Node,
}

impl<'a> PhaseView<'a> {
    pub fn statements(&self) -> impl Iterator<Item = &'a Node> {
        let node: &'a Node = self.node;
        node.child_nodes()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WhereView<'a> {
    header: &'a Node,
    node: &'a Node,
}

impl<'a> WhereView<'a> {
    pub fn build(header: &[String], rows: Vec<Node>) -> Node {
        let header = Node::new(
            tags::WHERE_HEADER,
            header.iter().map(|name| Child::sym(name.as_str())).collect(),
        );
        let mut children = vec![Child::Node(header)];
        children.extend(rows.into_iter().map(Child::Node));
        Node::new(tags::WHERE, children)
    }

    fn of(node: &'a Node) -> Option<Self> {
        if !node.is(tags::WHERE) {
            return None;
        }
        let header = node.node_at(0).filter(|h| h.is(tags::WHERE_HEADER))?;
        Some(Self { header, node })
    }

    pub fn header(&self) -> Vec<&'a str> {
        let header: &'a Node = self.header;
        header
            .children()
            .iter()
            .filter_map(Child::as_symbol)
            .collect()
    }

    /// One `array` node per data row, located at the row's statement.
    pub fn rows(&self) -> impl Iterator<Item = &'a Node> {
        let node: &'a Node = self.node;
        node.child_nodes().skip(1)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct InteractionView<'a> {
    pub node: &'a Node,
    pub cardinality: &'a Node,
    pub receiver: &'a Node,
    pub message: &'a str,
    pub args: Option<&'a Node>,
    pub outcome: Option<&'a Node>,
    pub block_pass: Option<&'a Node>,
}

impl<'a> InteractionView<'a> {
    pub fn build(
        cardinality: Node,
        receiver: Node,
        message: &str,
        args: Option<Node>,
        outcome: Option<Node>,
        block_pass: Option<Node>,
    ) -> Node {
        Node::new(
            tags::INTERACTION,
            vec![
                cardinality.into(),
                receiver.into(),
                Child::sym(message),
                args.into(),
                outcome.into(),
                block_pass.into(),
            ],
        )
    }

    fn of(node: &'a Node) -> Option<Self> {
        if node.children().len() != 6 {
            return None;
        }
        Some(Self {
            node,
            cardinality: node.node_at(0)?,
            receiver: node.node_at(1)?,
            message: node.symbol_at(2)?,
            args: node.node_at(3),
            outcome: node.node_at(4),
            block_pass: node.node_at(5),
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BinaryStatementView<'a> {
    pub lhs: &'a Node,
    pub operator: &'a str,
    pub rhs: &'a Node,
}

impl<'a> BinaryStatementView<'a> {
    pub fn build(lhs: Node, operator: &str, rhs: Node) -> Node {
        Node::new(
            tags::BINARY_STATEMENT,
            vec![lhs.into(), Child::sym(operator), rhs.into()],
        )
    }

    fn of(node: &'a Node) -> Option<Self> {
        Some(Self {
            lhs: node.node_at(0)?,
            operator: node.symbol_at(1)?,
            rhs: node.node_at(2)?,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StatementView<'a> {
    pub expression: &'a Node,
    pub source: &'a str,
}

impl<'a> StatementView<'a> {
    pub fn build(expression: Node, source: &str) -> Node {
        Node::new(tags::STATEMENT, vec![expression.into(), Child::str(source)])
    }

    fn of(node: &'a Node) -> Option<Self> {
        let source = match node.child(1)? {
            Child::Str(source) => source.as_str(),
            _ => return None,
        };
        Some(Self {
            expression: node.node_at(0)?,
            source,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RaisesView<'a> {
    pub exception: &'a Node,
    pub variable: Option<&'a str>,
}

impl<'a> RaisesView<'a> {
    pub fn build(exception: Node, variable: Option<&str>) -> Node {
        let mut children = vec![Child::Node(exception)];
        children.extend(variable.map(Child::sym));
        Node::new(tags::RAISES, children)
    }

    fn of(node: &'a Node) -> Option<Self> {
        Some(Self {
            exception: node.node_at(0)?,
            variable: node.symbol_at(1),
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReturnsView<'a> {
    pub value: &'a Node,
}

impl ReturnsView<'_> {
    pub fn build(value: Node) -> Node {
        Node::new(tags::RETURNS, vec![value.into()])
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StubRaisesView<'a> {
    pub args: &'a [Child],
}

impl StubRaisesView<'_> {
    pub fn build(args: Vec<Child>) -> Node {
        Node::new(tags::STUB_RAISES, args)
    }
}
