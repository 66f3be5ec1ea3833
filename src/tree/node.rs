//! Tagged tree nodes
//!
//! Host code and the intermediate representation share one shape: a [`Node`] has a
//! string tag, an ordered list of [`Child`]ren and an optional source [`Range`].
//! Equality is structural and ignores locations, which is what lets the source map
//! find a synthesized node's counterpart in another tree.

use super::range::Range;
use std::fmt;

/// One position inside a node: a nested node or a scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum Child {
    Node(Node),
    Symbol(String),
    Str(String),
    Int(i64),
    Float(f64),
    Nil,
}

impl Child {
    pub fn sym(name: impl Into<String>) -> Self {
        Child::Symbol(name.into())
    }

    pub fn str(value: impl Into<String>) -> Self {
        Child::Str(value.into())
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Child::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn into_node(self) -> Option<Node> {
        match self {
            Child::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Child::Symbol(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Child::Nil)
    }
}

impl From<Node> for Child {
    fn from(node: Node) -> Self {
        Child::Node(node)
    }
}

impl From<Option<Node>> for Child {
    fn from(node: Option<Node>) -> Self {
        node.map_or(Child::Nil, Child::Node)
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    tag: String,
    children: Vec<Child>,
    location: Option<Range>,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag && self.children == other.children
    }
}

impl Node {
    pub fn new(tag: impl Into<String>, children: Vec<Child>) -> Self {
        Self {
            tag: tag.into(),
            children,
            location: None,
        }
    }

    pub fn at(mut self, location: Option<Range>) -> Self {
        self.location = location;
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn is(&self, tag: &str) -> bool {
        self.tag == tag
    }

    pub fn children(&self) -> &[Child] {
        &self.children
    }

    pub fn into_children(self) -> Vec<Child> {
        self.children
    }

    pub fn location(&self) -> Option<&Range> {
        self.location.as_ref()
    }

    /// First line of this node in its source, if it was read from one.
    pub fn line(&self) -> Option<usize> {
        self.location.as_ref().map(|range| range.start.line)
    }

    /// A copy with new children (and optionally a new tag) that keeps this node's location.
    pub fn updated(&self, tag: Option<&str>, children: Vec<Child>) -> Node {
        Node {
            tag: tag.map_or_else(|| self.tag.clone(), str::to_string),
            children,
            location: self.location.clone(),
        }
    }

    pub fn child(&self, index: usize) -> Option<&Child> {
        self.children.get(index)
    }

    pub fn node_at(&self, index: usize) -> Option<&Node> {
        self.children.get(index).and_then(Child::as_node)
    }

    pub fn symbol_at(&self, index: usize) -> Option<&str> {
        self.children.get(index).and_then(Child::as_symbol)
    }

    pub fn child_nodes(&self) -> impl Iterator<Item = &Node> {
        self.children.iter().filter_map(Child::as_node)
    }

    /// Follows `path` through node children. Scalars and missing indexes end the walk.
    pub fn dig(&self, path: &[usize]) -> Option<&Node> {
        path.iter()
            .try_fold(self, |node, &index| node.node_at(index))
    }

    /// Views a `(send receiver :method args...)` node as a call.
    pub fn as_call(&self) -> Option<Call<'_>> {
        if !self.is("send") && !self.is("csend") {
            return None;
        }
        let receiver = match self.children.first()? {
            Child::Node(node) => Some(node),
            Child::Nil => None,
            _ => return None,
        };
        let method = self.symbol_at(1)?;
        Some(Call {
            receiver,
            method,
            args: &self.children[2..],
        })
    }

    /// True for a receiver-less, argument-less call such as `(send nil :name)`.
    pub fn is_bare_call(&self) -> bool {
        self.bare_call_name().is_some()
    }

    pub fn bare_call_name(&self) -> Option<&str> {
        self.as_call()
            .filter(|call| call.receiver.is_none() && call.args.is_empty())
            .map(|call| call.method)
    }
}

/// Borrowed view of a host method call.
#[derive(Debug, Clone, Copy)]
pub struct Call<'a> {
    pub receiver: Option<&'a Node>,
    pub method: &'a str,
    pub args: &'a [Child],
}

impl Call<'_> {
    pub fn arg_nodes(&self) -> impl Iterator<Item = &Node> {
        self.args.iter().filter_map(Child::as_node)
    }
}

pub(crate) fn write_scalar(f: &mut impl fmt::Write, child: &Child) -> fmt::Result {
    match child {
        Child::Node(node) => write!(f, "{}", node),
        Child::Symbol(name) if needs_quoting(name) => {
            f.write_char(':')?;
            write_quoted(f, name)
        }
        Child::Symbol(name) => write!(f, ":{}", name),
        Child::Str(value) => write_quoted(f, value),
        Child::Int(value) => write!(f, "{}", value),
        Child::Float(value) => write_float(f, *value),
        Child::Nil => f.write_str("nil"),
    }
}

fn needs_quoting(name: &str) -> bool {
    name.is_empty()
        || name
            .chars()
            .any(|ch| ch.is_whitespace() || matches!(ch, '(' | ')' | '"' | ';'))
}

fn write_quoted(f: &mut impl fmt::Write, value: &str) -> fmt::Result {
    f.write_char('"')?;
    for ch in value.chars() {
        match ch {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            other => f.write_char(other)?,
        }
    }
    f.write_char('"')
}

// Display never uses exponent notation, so finite values only need a decimal point added.
fn write_float(f: &mut impl fmt::Write, value: f64) -> fmt::Result {
    if value.is_nan() {
        return f.write_str("nan");
    }
    if value.is_infinite() {
        return f.write_str(if value > 0.0 { "inf" } else { "-inf" });
    }
    let text = value.to_string();
    f.write_str(&text)?;
    if !text.contains('.') {
        f.write_str(".0")?;
    }
    Ok(())
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.tag)?;
        for child in &self.children {
            f.write_str(" ")?;
            write_scalar(f, child)?;
        }
        f.write_str(")")
    }
}
