//! `transform!` annotations
//!
//! ```text
//! (send nil :transform! (const nil :PhaseSpec))
//! (class (const nil :StackTest) nil ...)
//! ```
//!
//! An annotation statement names one or more registered transformations, either as a
//! constant or as `Constant.new`. When the very next sibling is a class or a constant
//! assignment, those transformations run on it in order. Annotations are always
//! removed from the output, and each rewritten target is recorded on the [`Context`].

use super::{Context, PhaseTransformation, Transformation};
use crate::error::TransformError;
use crate::tree::{Child, Node};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

pub const ANNOTATION: &str = "transform!";

pub(crate) const TRANSFORMABLE_TAGS: [&str; 2] = ["class", "casgn"];

#[derive(Clone, Default)]
pub struct AnnotationTransformation {
    registry: BTreeMap<String, Arc<dyn Transformation>>,
}

impl AnnotationTransformation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the phase rewrite under `PhaseSpec` and `PhaseSpec::Transformation`.
    pub fn standard() -> Self {
        let phases: Arc<dyn Transformation> = Arc::new(PhaseTransformation::strict());
        Self::new()
            .register("PhaseSpec", phases.clone())
            .register("PhaseSpec::Transformation", phases)
    }

    pub fn register(mut self, name: &str, transformation: Arc<dyn Transformation>) -> Self {
        self.registry.insert(name.to_string(), transformation);
        self
    }

    pub fn registered_names(&self) -> impl Iterator<Item = &str> {
        self.registry.keys().map(String::as_str)
    }

    fn rewrite(&self, node: &Node, context: &Context) -> Result<Node, TransformError> {
        let mut children = Vec::with_capacity(node.children().len());
        let mut previous: Option<&Node> = None;
        for child in node.children() {
            let Child::Node(inner) = child else {
                children.push(child.clone());
                previous = None;
                continue;
            };
            if is_annotation(inner) {
                previous = Some(inner);
                continue;
            }
            let mut current = inner.clone();
            let mut annotated = false;
            if let Some(annotation) = previous.take() {
                if TRANSFORMABLE_TAGS.contains(&inner.tag()) {
                    annotated = true;
                    for transformation in self.lookup(annotation)? {
                        debug!(
                            file = context.file_path(),
                            transformation = transformation.name(),
                            "applying annotated transformation"
                        );
                        current = transformation.run(current, context)?;
                    }
                }
            }
            let rewritten = self.rewrite(&current, context)?;
            if annotated {
                context.mark_rewritten(&rewritten);
            }
            children.push(Child::Node(rewritten));
        }
        Ok(node.updated(None, children))
    }

    fn lookup(&self, annotation: &Node) -> Result<Vec<Arc<dyn Transformation>>, TransformError> {
        annotation
            .as_call()
            .map(|call| call.arg_nodes().filter_map(transformation_name).collect::<Vec<_>>())
            .unwrap_or_default()
            .into_iter()
            .map(|name| {
                self.registry.get(&name).cloned().ok_or_else(|| {
                    TransformError::UnknownTransformation {
                        name,
                        location: annotation.location().cloned(),
                    }
                })
            })
            .collect()
    }
}

impl Transformation for AnnotationTransformation {
    fn name(&self) -> &str {
        "Annotations"
    }

    fn run(&self, node: Node, context: &Context) -> Result<Node, TransformError> {
        self.rewrite(&node, context)
    }
}

/// `(send nil :transform! arg...)` with at least one argument.
pub fn is_annotation(node: &Node) -> bool {
    node.as_call().is_some_and(|call| {
        call.receiver.is_none() && call.method == ANNOTATION && !call.args.is_empty()
    })
}

/// `Name`, `Outer::Name` or `Name.new(...)` as a qualified constant name.
fn transformation_name(node: &Node) -> Option<String> {
    match node.as_call() {
        Some(call) if call.method == "new" => call.receiver.and_then(constant_path),
        Some(_) => None,
        None => constant_path(node),
    }
}

fn constant_path(node: &Node) -> Option<String> {
    if !node.is("const") {
        return None;
    }
    let name = node.symbol_at(1)?;
    match node.node_at(0) {
        Some(scope) => Some(format!("{}::{}", constant_path(scope)?, name)),
        None => Some(name.to_string()),
    }
}
