//! Transformation infrastructure
//!
//! Two layers live here.
//!
//! ## Tree transformations
//!
//! A [`Transformation`] rewrites one host tree into another. The crate ships two:
//!
//! - [`AnnotationTransformation`]: finds `transform!(Name)` annotations in front of a
//!   class (or constant assignment) and applies the named transformations to it.
//! - [`PhaseTransformation`]: rewrites every phase-structured test method into plain
//!   assertions and mock expectations.
//!
//! ## Typed stage composition
//!
//! The file driver runs as a chain of typed stages (parse, rewrite, emit, map). Any
//! type implementing [`Runnable<I, O>`] can be chained onto a [`Transform<I, O>`] with
//! `.then()`, and the compiler checks that each stage's input matches the previous
//! stage's output:
//!
//! ```rust,ignore
//! let flow = Transform::from_fn(Ok)
//!     .then(ParseStage::new(syntax.clone()))   // SourceUnit -> Parsed
//!     .then(RewriteStage::new(chain))          // Parsed -> Rewritten
//!     .then(EmitStage::new(syntax.clone()));   // Rewritten -> Emitted
//! ```
//!
//! See [`stages`] for the stages the pipeline uses.

pub mod annotations;
pub mod phases;
pub mod stages;

pub use annotations::AnnotationTransformation;
pub use phases::PhaseTransformation;

use crate::error::TransformError;
use crate::tree::Node;
use dashmap::DashSet;
use std::sync::Arc;

/// What a transformation knows about the tree it is rewriting.
///
/// Clones share the set of annotation targets already rewritten, so later transformations
/// in a chain can leave them alone.
#[derive(Debug, Clone)]
pub struct Context {
    file_path: String,
    source: Option<Arc<str>>,
    rewritten: Arc<DashSet<String>>,
}

impl Context {
    pub fn new(file_path: &str, source: &str) -> Self {
        Self {
            file_path: file_path.to_string(),
            source: Some(Arc::from(source)),
            rewritten: Arc::default(),
        }
    }

    /// Context for trees that did not come from text.
    pub fn detached() -> Self {
        Self {
            file_path: "(ast)".to_string(),
            source: None,
            rewritten: Arc::default(),
        }
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    /// The original text of `node`, or its rendering when no text is available.
    pub fn source_text(&self, node: &Node) -> String {
        self.source
            .as_deref()
            .zip(node.location())
            .and_then(|(source, range)| source.get(range.span.clone()))
            .map_or_else(|| node.to_string(), str::to_string)
    }

    /// Records `node` as the finished output of an annotated transformation.
    pub fn mark_rewritten(&self, node: &Node) {
        self.rewritten.insert(node.to_string());
    }

    /// Whether a node with the same structure was recorded by [`Context::mark_rewritten`].
    pub fn was_rewritten(&self, node: &Node) -> bool {
        !self.rewritten.is_empty() && self.rewritten.contains(&node.to_string())
    }
}

pub trait Transformation: Send + Sync {
    fn name(&self) -> &str;

    fn run(&self, node: Node, context: &Context) -> Result<Node, TransformError>;
}

/// Trait for anything that can transform an input to an output
///
/// This is implemented by individual pipeline stages.
/// The `Transform` struct composes multiple `Runnable` implementations.
pub trait Runnable<I, O> {
    fn run(&self, input: I) -> Result<O, TransformError>;
}

/// A composable chain of stages from `I` to `O`
pub struct Transform<I, O> {
    run_fn: Box<dyn Fn(I) -> Result<O, TransformError> + Send + Sync>,
}

impl<I, O> Transform<I, O> {
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(I) -> Result<O, TransformError> + Send + Sync + 'static,
    {
        Transform {
            run_fn: Box::new(f),
        }
    }

    /// Chains `stage` after this transform, producing a transform from `I` to `O2`.
    pub fn then<O2, S>(self, stage: S) -> Transform<I, O2>
    where
        S: Runnable<O, O2> + Send + Sync + 'static,
        I: 'static,
        O: 'static,
        O2: 'static,
    {
        let prev_run = self.run_fn;
        Transform {
            run_fn: Box::new(move |input| {
                let intermediate = prev_run(input)?;
                stage.run(intermediate)
            }),
        }
    }

    pub fn run(&self, input: I) -> Result<O, TransformError> {
        (self.run_fn)(input)
    }
}

impl<I, O> Runnable<I, O> for Transform<I, O>
where
    I: 'static,
    O: 'static,
{
    fn run(&self, input: I) -> Result<O, TransformError> {
        Transform::run(self, input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::build::{call, lvar};
    use crate::tree::{Position, Range};

    struct DoubleNumber;
    impl Runnable<i32, i32> for DoubleNumber {
        fn run(&self, input: i32) -> Result<i32, TransformError> {
            Ok(input * 2)
        }
    }

    struct IntToString;
    impl Runnable<i32, String> for IntToString {
        fn run(&self, input: i32) -> Result<String, TransformError> {
            Ok(input.to_string())
        }
    }

    struct FailingStage;
    impl Runnable<i32, i32> for FailingStage {
        fn run(&self, _input: i32) -> Result<i32, TransformError> {
            Err(TransformError::StageFailed {
                stage: "failing".to_string(),
                message: "intentional failure".to_string(),
            })
        }
    }

    #[test]
    fn test_type_changing_chain() {
        let transform = Transform::from_fn(|x: i32| Ok(x))
            .then(DoubleNumber)
            .then(DoubleNumber)
            .then(IntToString);
        assert_eq!(transform.run(5).unwrap(), "20");
    }

    #[test]
    fn test_error_stops_the_chain() {
        let transform = Transform::from_fn(|x: i32| Ok(x))
            .then(FailingStage)
            .then(IntToString);
        assert_eq!(
            transform.run(5).unwrap_err().to_string(),
            "Stage 'failing' failed: intentional failure"
        );
    }

    #[test]
    fn test_source_text_prefers_original_text() {
        let source = "(send (lvar :list) :empty?)";
        let node = call(Some(lvar("list")), "empty?", vec![]).at(Some(Range::new(
            0..source.len(),
            Position::new(1, 1),
            Position::new(1, source.len()),
        )));
        let context = Context::new("spec.sexp", &format!("{source}\n"));
        assert_eq!(context.source_text(&node), source);

        let synthesized = call(None, "go", vec![]);
        assert_eq!(context.source_text(&synthesized), "(send nil :go)");
        assert_eq!(Context::detached().source_text(&node), source);
    }

    #[test]
    fn test_rewritten_marks_are_shared_and_ignore_location() {
        let context = Context::detached();
        let node = call(Some(lvar("list")), "empty?", vec![]);
        assert!(!context.was_rewritten(&node));

        context.clone().mark_rewritten(&node);
        let located = node.clone().at(Some(Range::new(
            0..5,
            Position::new(3, 1),
            Position::new(3, 5),
        )));
        assert!(context.was_rewritten(&located));
        assert!(!Context::detached().was_rewritten(&node));
    }
}
