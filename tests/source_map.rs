//! Source maps registered by the file pipeline, and backtraces translated through them

use phasespec::{BacktraceFilter, Pipeline, PipelineOptions, SourceMapRegistry};
use std::sync::Arc;

const SOURCE: &str = r#"(block (send nil :test (str "adds"))
  (args)
  (begin
    (send nil :Given)
    (lvasgn :a (int 1))
    (send nil :When)
    (lvasgn :b (send (lvar :a) :+ (int 1)))
    (send nil :Then)
    (send (lvar :b) :== (int 2))))
"#;

const SOURCE_PATH: &str = "test/adds_test.sexp";
const ARTIFACT_PATH: &str = "tmp/phasespec/test/adds_test.sexp";

fn transform() -> (String, Arc<SourceMapRegistry>) {
    let registry = Arc::new(SourceMapRegistry::new());
    let pipeline = Pipeline::standard(PipelineOptions::default(), registry.clone());
    let text = pipeline
        .transform_file_source(SOURCE, SOURCE_PATH, ARTIFACT_PATH)
        .unwrap();
    (text, registry)
}

#[test]
fn test_every_emitted_line_is_mapped() {
    let (text, registry) = transform();
    assert_eq!(text.lines().count(), 7);

    let map = registry.for_file_path(ARTIFACT_PATH).expect("registered map");
    assert_eq!(map.source_file_path(), SOURCE_PATH);
    assert_eq!(map.line_count(), 7);

    let lines: Vec<Option<usize>> = (1..=7).map(|line| map.line(line)).collect();
    assert_eq!(
        lines,
        vec![None, Some(1), Some(2), None, Some(5), Some(7), Some(9)]
    );
}

#[test]
fn test_lines_past_the_end_are_unknown() {
    let (_, registry) = transform();
    let map = registry.for_file_path(ARTIFACT_PATH).unwrap();
    assert_eq!(map.line(0), None);
    assert_eq!(map.line(8), None);
}

#[test]
fn test_backtrace_points_at_the_source() {
    let (_, registry) = transform();
    let filter = BacktraceFilter::new(registry);
    let frames = [
        format!("{ARTIFACT_PATH}:7:in `block in <class:AddsTest>'"),
        format!("{ARTIFACT_PATH}:4:in `block in <class:AddsTest>'"),
        "lib/minitest/test.rb:98:in `run'".to_string(),
    ];
    assert_eq!(
        filter.filter_backtrace(&frames),
        vec![
            format!("{SOURCE_PATH}:9:in `block in <class:AddsTest>'"),
            format!("{SOURCE_PATH}:?:in `block in <class:AddsTest>'"),
            "lib/minitest/test.rb:98:in `run'".to_string(),
        ]
    );
}

#[test]
fn test_text_transform_registers_nothing() {
    let registry = Arc::new(SourceMapRegistry::new());
    let pipeline = Pipeline::standard(PipelineOptions::default(), registry.clone());
    pipeline.transform(SOURCE).unwrap();
    assert!(registry.is_empty());
}
