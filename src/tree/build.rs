//! Builders for host nodes emitted by code generation. Built nodes carry no location.

use super::node::{Child, Node};

pub fn s(tag: &str, children: Vec<Child>) -> Node {
    Node::new(tag, children)
}

pub fn call(receiver: Option<Node>, method: &str, args: Vec<Child>) -> Node {
    let mut children = Vec::with_capacity(args.len() + 2);
    children.push(Child::from(receiver));
    children.push(Child::sym(method));
    children.extend(args);
    s("send", children)
}

pub fn sym(name: &str) -> Node {
    s("sym", vec![Child::sym(name)])
}

pub fn str_lit(value: &str) -> Node {
    s("str", vec![Child::str(value)])
}

pub fn int(value: i64) -> Node {
    s("int", vec![Child::Int(value)])
}

pub fn lvar(name: &str) -> Node {
    s("lvar", vec![Child::sym(name)])
}

pub fn lvasgn(name: &str, value: Node) -> Node {
    s("lvasgn", vec![Child::sym(name), value.into()])
}

pub fn arg(name: &str) -> Node {
    s("arg", vec![Child::sym(name)])
}

pub fn constant(scope: Option<Node>, name: &str) -> Node {
    s("const", vec![Child::from(scope), Child::sym(name)])
}

pub fn begin(statements: Vec<Node>) -> Node {
    s("begin", nodes(statements))
}

pub fn array(values: Vec<Node>) -> Node {
    s("array", nodes(values))
}

pub fn nodes(list: Vec<Node>) -> Vec<Child> {
    list.into_iter().map(Child::Node).collect()
}
