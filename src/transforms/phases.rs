//! Rewrites phase-structured test methods

use super::annotations::TRANSFORMABLE_TAGS;
use super::{Context, Transformation};
use crate::blocks::has_phases;
use crate::codegen::TestMethodGenerator;
use crate::error::TransformError;
use crate::test_method::{is_test_block, test_statements, TestMethodParser};
use crate::tree::{Child, Node};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTransformation {
    strict: bool,
}

impl PhaseTransformation {
    /// Every test method must be phase-structured.
    pub fn strict() -> Self {
        Self { strict: true }
    }

    /// Test methods without any phase introducer are left alone.
    pub fn lenient() -> Self {
        Self { strict: false }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    fn rewrite(&self, node: &Node, context: &Context) -> Result<Node, TransformError> {
        // Targets of `transform!` were rewritten earlier in the chain.
        if TRANSFORMABLE_TAGS.contains(&node.tag()) && context.was_rewritten(node) {
            return Ok(node.clone());
        }
        if is_test_block(node) {
            if !self.strict && !has_phases(&test_statements(node)) {
                return Ok(node.clone());
            }
            let ir = TestMethodParser::new(context).parse(node)?;
            debug!(
                file = context.file_path(),
                line = node.line(),
                "rewriting phase test"
            );
            return TestMethodGenerator::generate(&ir);
        }

        let children = node
            .children()
            .iter()
            .map(|child| match child {
                Child::Node(inner) => self.rewrite(inner, context).map(Child::Node),
                scalar => Ok(scalar.clone()),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(node.updated(None, children))
    }
}

impl Default for PhaseTransformation {
    fn default() -> Self {
        Self::strict()
    }
}

impl Transformation for PhaseTransformation {
    fn name(&self) -> &str {
        "PhaseSpec"
    }

    fn run(&self, node: Node, context: &Context) -> Result<Node, TransformError> {
        self.rewrite(&node, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::parse_sexp;

    const PLAIN_TEST: &str = r#"(block (send nil :test (str "plain")) (args)
        (send nil :assert (true)))"#;

    #[test]
    fn test_lenient_mode_skips_plain_tests() {
        let tree = parse_sexp(PLAIN_TEST);
        let rewritten = PhaseTransformation::lenient()
            .run(tree.clone(), &Context::detached())
            .unwrap();
        assert_eq!(rewritten, tree);
    }

    #[test]
    fn test_strict_mode_rejects_plain_tests() {
        let tree = parse_sexp(PLAIN_TEST);
        let err = PhaseTransformation::strict()
            .run(tree, &Context::detached())
            .unwrap_err();
        assert!(matches!(err, TransformError::PhaseOrder(_)));
    }

    #[test]
    fn test_strict_mode_skips_classes_rewritten_by_annotations() {
        let generated = parse_sexp(
            r#"(class (const nil :DoneTest) nil
                 (block (send nil :test (str "done")) (args)
                   (send nil :assert_equal (int 1) (lvar :a))))"#,
        );
        let context = Context::detached();
        assert!(PhaseTransformation::strict()
            .run(generated.clone(), &context)
            .is_err());

        context.mark_rewritten(&generated);
        let rewritten = PhaseTransformation::strict()
            .run(generated.clone(), &context)
            .unwrap();
        assert_eq!(rewritten, generated);
    }

    #[test]
    fn test_rewrites_nested_tests() {
        let tree = parse_sexp(
            r#"(class (const nil :MathTest) nil
                 (block (send nil :test (str "adds")) (args)
                   (begin (send nil :Expect) (send (int 2) :== (int 2)))))"#,
        );
        let rewritten = PhaseTransformation::lenient()
            .run(tree, &Context::detached())
            .unwrap();
        assert_eq!(
            rewritten.dig(&[2, 2]).unwrap().to_string(),
            "(begin (send nil :assert_equal (int 2) (int 2)))"
        );
    }
}
