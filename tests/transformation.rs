//! End-to-end transformations of phase-structured tests
//!
//! Each test feeds S-expression source through the standard pipeline and checks the
//! generated host code.

use insta::assert_snapshot;
use phasespec::testing::{parse_sexp, transform_sexp, unroll_where_loop};
use phasespec::{Pipeline, PipelineOptions, SourceMapRegistry, TransformError};
use std::sync::Arc;

fn pipeline(strict: bool) -> Pipeline {
    Pipeline::standard(
        PipelineOptions {
            strict,
            ..PipelineOptions::default()
        },
        Arc::new(SourceMapRegistry::new()),
    )
}

fn line_of(text: &str, needle: &str) -> usize {
    text.lines()
        .position(|line| line.contains(needle))
        .unwrap_or_else(|| panic!("`{needle}` not found in:\n{text}"))
}

#[test]
fn test_given_when_then() {
    let source = r#"
(block (send nil :test (str "adds"))
  (args)
  (begin
    (send nil :Given)
    (lvasgn :a (int 1))
    (send nil :When)
    (lvasgn :b (send (lvar :a) :+ (int 1)))
    (send nil :Then)
    (send (lvar :b) :== (int 2))))
"#;
    assert_snapshot!(transform_sexp(source).trim_end(), @r###"
    (block
      (send nil :test (str "adds"))
      (args)
      (begin
        (lvasgn :a (int 1))
        (lvasgn :b (send (lvar :a) :+ (int 1)))
        (send nil :assert_equal (int 2) (lvar :b))))
    "###);
}

#[test]
fn test_interaction_is_hoisted_before_the_action() {
    let source = r#"
(block (send nil :test (str "publishes"))
  (args)
  (begin
    (send nil :Given)
    (lvasgn :subscriber (send (const nil :Subscriber) :new))
    (send nil :When)
    (send (lvar :publisher) :publish (str "hi"))
    (send nil :Then)
    (send (send (int 1) :* (send (lvar :subscriber) :receive (str "hi"))) :>> (sym :ok))))
"#;
    let output = transform_sexp(source);
    let expectation = "(send (send (send (send (lvar :subscriber) :expects (sym :receive)) \
                       :with (str \"hi\")) :times (int 1)) :returns (sym :ok))";
    assert!(output.contains(expectation), "{output}");
    assert!(line_of(&output, ":expects") < line_of(&output, ":publish"));
}

#[test]
fn test_raises_wraps_the_action() {
    let source = r#"
(block (send nil :test (str "pops empty"))
  (args)
  (begin
    (send nil :When)
    (send (lvar :stack) :pop)
    (send nil :Then)
    (lvasgn :error (send nil :raises (const nil :EmptyStackError)))
    (send (send (lvar :error) :message) :== (str "empty"))))
"#;
    let output = transform_sexp(source);
    assert!(output.contains("(lvasgn :error"), "{output}");
    assert!(
        output.contains("(send nil :assert_raises (const nil :EmptyStackError))"),
        "{output}"
    );
    assert!(line_of(&output, ":assert_raises") < line_of(&output, ":pop"));
    assert!(line_of(&output, ":pop") < line_of(&output, ":assert_equal"));
}

#[test]
fn test_cleanup_runs_in_ensure() {
    let source = r#"
(block (send nil :test (str "closes"))
  (args)
  (begin
    (send nil :Given)
    (lvasgn :file (send (const nil :File) :open (str "x")))
    (send nil :Expect)
    (send (send (lvar :file) :read) :== (str ""))
    (send nil :Cleanup)
    (send (lvar :file) :close)))
"#;
    let output = transform_sexp(source);
    let tree = parse_sexp(&output);
    let body = tree.node_at(2).expect("test body");
    assert!(body.is("kwbegin"), "{output}");
    let ensure = body.node_at(0).expect("ensure");
    assert!(ensure.is("ensure"));
    assert_eq!(
        ensure.node_at(1).map(ToString::to_string).as_deref(),
        Some("(begin (send (lvar :file) :close))")
    );
}

#[test]
fn test_where_table_iterates_rows() {
    let source = r#"
(block (send nil :test (str "adds"))
  (args)
  (begin
    (send nil :Expect)
    (send (send (send nil :a) :+ (send nil :b)) :== (send nil :c))
    (send nil :Where)
    (send (send (send nil :a) :| (send nil :b)) :| (send nil :c))
    (send (send (int 1) :| (int 2)) :| (int 3))
    (send (send (int 4) :| (int 5)) :| (int 9))))
"#;
    let output = transform_sexp(source);
    let tree = parse_sexp(&output);
    let unrolled = unroll_where_loop(&tree).expect("a data-driven loop");
    assert_eq!(unrolled.len(), 2);
    assert_eq!(unrolled[0].line, Some(9));
    assert_eq!(unrolled[1].line, Some(10));

    let second = unrolled[1].test.to_string();
    assert!(
        second.contains("(send nil :assert_equal (int 9) (send (int 4) :+ (int 5)))"),
        "{second}"
    );
    assert!(
        second.contains(r#"(dstr (str "adds") (str " ") (begin (int 1)) (str " line ") (begin (int 10)))"#),
        "{second}"
    );
}

#[test]
fn test_plain_tests_pass_through_leniently() {
    let source = r#"(block (send nil :test (str "plain")) (args) (send nil :assert (true)))"#;
    assert_eq!(
        transform_sexp(source).trim_end(),
        r#"(block
  (send nil :test (str "plain"))
  (args)
  (send nil :assert (true)))"#
    );
}

#[test]
fn test_strict_pipeline_rejects_plain_tests() {
    let source = r#"(block (send nil :test (str "plain")) (args) (send nil :assert (true)))"#;
    let err = pipeline(true).transform(source).unwrap_err();
    assert!(matches!(err, TransformError::PhaseOrder(_)));
    assert_eq!(
        err.to_string(),
        "Test method @ 1:1 must start with one of these Blocks: [Given, When, Expect]"
    );
}

#[test]
fn test_then_must_follow_when() {
    let source = r#"(block (send nil :test (str "bad")) (args)
  (begin (send nil :Given) (lvasgn :a (int 1)) (send nil :Then) (send (lvar :a) :== (int 1))))"#;
    let err = pipeline(false).transform(source).unwrap_err();
    assert!(
        err.to_string()
            .starts_with("Block Given @ 2:10 must be followed by one of these Blocks:"),
        "{err}"
    );
}

#[test]
fn test_annotated_class_is_rewritten() {
    let source = include_str!("fixtures/stack_test.sexp");
    let output = transform_sexp(source);
    assert!(!output.contains("transform!"), "{output}");
    assert!(!output.contains(":Expect"), "{output}");

    let tree = parse_sexp(&output);
    assert!(tree.is("begin"));
    assert_eq!(tree.children().len(), 1);
    let class = tree.node_at(0).expect("class");
    assert!(class.is("class"));
    assert!(output.contains("(send nil :assert_operator (send (lvar :stack) :size) (sym :>) (int 0))"));
}

#[test]
fn test_unknown_annotation_is_an_error() {
    let source = "(begin\n  (send nil :transform! (const nil :Nope))\n  (class (const nil :A) nil (int 1)))";
    let err = pipeline(false).transform(source).unwrap_err();
    assert_eq!(err.to_string(), "Unknown transformation `Nope` @ 2:3");
}

#[test]
fn test_strict_pipeline_accepts_annotated_classes() {
    let source = include_str!("fixtures/stack_test.sexp");
    let strict = pipeline(true).transform(source).expect("annotated class rewrites strictly");
    assert_eq!(strict, pipeline(false).transform(source).unwrap());
    assert!(strict.contains("(send nil :assert_equal (int 1) (send (lvar :stack) :top))"));
}

#[test]
fn test_strict_pipeline_still_checks_unannotated_tests() {
    let source = format!(
        "{}\n(block (send nil :test (str \"plain\")) (args) (send nil :assert (true)))",
        include_str!("fixtures/stack_test.sexp")
    );
    let err = pipeline(true).transform(&source).unwrap_err();
    assert!(matches!(err, TransformError::PhaseOrder(_)), "{err}");
}

#[test]
fn test_interactions_keep_source_order_ahead_of_the_action() {
    let source = r#"
(block (send nil :test (str "notifies once"))
  (args)
  (begin
    (send nil :When)
    (send (lvar :service) :run)
    (send nil :Then)
    (send (int 0) :* (send (lvar :dep) :bar))
    (send (int 1) :* (send (lvar :dep) :foo (int 1)))))
"#;
    let output = transform_sexp(source);
    let bar = "(send (send (lvar :dep) :expects (sym :bar)) :times (int 0))";
    let foo = "(send (send (send (lvar :dep) :expects (sym :foo)) :with (int 1)) :times (int 1))";
    assert!(output.contains(bar), "{output}");
    assert!(output.contains(foo), "{output}");
    assert!(line_of(&output, bar) < line_of(&output, foo));
    assert!(line_of(&output, foo) < line_of(&output, ":run"));
}

#[test]
fn test_forwarded_block_is_captured_before_the_action() {
    let source = r#"
(block (send nil :test (str "walks items"))
  (args)
  (begin
    (send nil :Given)
    (lvasgn :handler (send (const nil :Handler) :new))
    (send nil :When)
    (send (lvar :walker) :walk (lvar :items) (block_pass (lvar :handler)))
    (send nil :Then)
    (send (int 1) :* (send (lvar :items) :each (block_pass (lvar :handler))))
    (send (lvar :walker) :done?)))
"#;
    let output = transform_sexp(source);
    let capture = "(lvasgn :__phasespec_blk_0 \
                   (send (const (const nil :PhaseSpec) :BlockCapture) :capture (lvar :items) (sym :each)))";
    let identity = "(send nil :assert_same (lvar :handler) (send (lvar :__phasespec_blk_0) :call))";
    assert!(output.contains(capture), "{output}");
    assert!(output.contains(identity), "{output}");

    let action = line_of(&output, ":walk (lvar :items)");
    assert!(line_of(&output, ":expects (sym :each)") < line_of(&output, capture));
    assert!(line_of(&output, capture) < action);
    assert!(action < line_of(&output, identity));
    assert!(line_of(&output, identity) < line_of(&output, ":done?"));
}
