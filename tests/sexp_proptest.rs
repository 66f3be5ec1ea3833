//! Property-based tests for the S-expression syntax and source maps
//!
//! Generated trees must survive a print and read cycle unchanged, and every source map
//! built from them must only point at lines that exist in the source.

use phasespec::source_map::SourceMap;
use phasespec::tree::{Child, Node};
use phasespec::{SexpSyntax, Syntax};
use proptest::prelude::*;

fn scalar() -> impl Strategy<Value = Child> {
    prop_oneof![
        Just(Child::Nil),
        "[a-z_][a-z0-9_]{0,6}[?!]?".prop_map(Child::Symbol),
        ".{0,8}".prop_map(Child::Symbol),
        ".{0,8}".prop_map(Child::Str),
        any::<i64>().prop_map(Child::Int),
        // NaN never compares equal to itself
        any::<f64>()
            .prop_filter("not NaN", |value| !value.is_nan())
            .prop_map(Child::Float),
    ]
}

fn tag() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "send", "lvar", "int", "str", "begin", "block", "array", "args", "kwbegin",
    ])
    .prop_map(str::to_string)
}

fn tree() -> impl Strategy<Value = Node> {
    let leaf = (tag(), prop::collection::vec(scalar(), 0..3))
        .prop_map(|(tag, children)| Node::new(tag, children));
    leaf.prop_recursive(4, 32, 4, |inner| {
        (
            tag(),
            prop::collection::vec(
                prop_oneof![inner.prop_map(Child::Node), scalar()],
                0..4,
            ),
        )
            .prop_map(|(tag, children)| Node::new(tag, children))
    })
}

proptest! {
    #[test]
    fn printed_trees_read_back_unchanged(node in tree()) {
        let syntax = SexpSyntax::new();
        let text = syntax.serialize(&node);
        let read = syntax.parse(&text, "prop.sexp").unwrap();
        prop_assert_eq!(&read, &node);
        prop_assert_eq!(syntax.serialize(&read), text);
    }

    #[test]
    fn source_maps_stay_within_the_source(node in tree()) {
        let syntax = SexpSyntax::new();
        let source = syntax.serialize(&node);
        let original = syntax.parse(&source, "a.sexp").unwrap();
        let source_lines = source.lines().count();

        let emitted_text = SexpSyntax::with_indent(4).serialize(&original);
        let emitted = syntax.parse(&emitted_text, "b.sexp").unwrap();
        let map = SourceMap::build("a.sexp", "b.sexp", &original, &emitted);

        for line in map.mapping().values().flatten() {
            prop_assert!(*line >= 1 && *line <= source_lines);
        }
    }
}
