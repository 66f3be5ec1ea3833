//! The transformation driver
//!
//! [`Pipeline`] ties the host syntax, the transformation chain and the source map
//! registry together. It offers three entry points:
//!
//! - [`Pipeline::transform`]: text in, text out, nothing registered.
//! - [`Pipeline::transform_ast`]: tree in, tree out, for callers that parse themselves.
//! - [`Pipeline::transform_file_source`] / [`Pipeline::transform_file`]: the full flow,
//!   which also builds and registers the emitted file's source map.

use crate::error::TransformError;
use crate::source_map::SourceMapRegistry;
use crate::syntax::{SexpSyntax, Syntax};
use crate::transforms::stages::{
    EmitStage, Emitted, MapStage, Mapped, ParseStage, RewriteStage, SourceUnit,
};
use crate::transforms::{
    AnnotationTransformation, Context, PhaseTransformation, Transform, Transformation,
};
use crate::tree::Node;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// File path reported for text given to [`Pipeline::transform`].
pub const ANONYMOUS_FILE: &str = "tmp";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Make the standalone phase stage reject tests that are not phase-structured.
    pub strict: bool,
    pub indent: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            strict: false,
            indent: 2,
        }
    }
}

pub struct Pipeline {
    rewrite: RewriteStage,
    registry: Arc<SourceMapRegistry>,
    text_flow: Transform<SourceUnit, Emitted>,
    file_flow: Transform<SourceUnit, Mapped>,
}

impl Pipeline {
    pub fn new(
        syntax: Arc<dyn Syntax>,
        chain: Vec<Arc<dyn Transformation>>,
        registry: Arc<SourceMapRegistry>,
    ) -> Self {
        let rewrite = RewriteStage::new(chain);
        let text_flow = Transform::from_fn(Ok)
            .then(ParseStage::new(syntax.clone()))
            .then(rewrite.clone())
            .then(EmitStage::new(syntax.clone()));
        let file_flow = Transform::from_fn(Ok)
            .then(ParseStage::new(syntax.clone()))
            .then(rewrite.clone())
            .then(EmitStage::new(syntax.clone()))
            .then(MapStage::new(syntax));
        Self {
            rewrite,
            registry,
            text_flow,
            file_flow,
        }
    }

    /// S-expression syntax with annotations followed by the standalone phase rewrite.
    pub fn standard(options: PipelineOptions, registry: Arc<SourceMapRegistry>) -> Self {
        let phases = if options.strict {
            PhaseTransformation::strict()
        } else {
            PhaseTransformation::lenient()
        };
        let chain: Vec<Arc<dyn Transformation>> = vec![
            Arc::new(AnnotationTransformation::standard()),
            Arc::new(phases),
        ];
        Self::new(
            Arc::new(SexpSyntax::with_indent(options.indent)),
            chain,
            registry,
        )
    }

    pub fn registry(&self) -> &Arc<SourceMapRegistry> {
        &self.registry
    }

    pub fn transform(&self, source: &str) -> Result<String, TransformError> {
        let unit = SourceUnit {
            text: source.to_string(),
            file_path: ANONYMOUS_FILE.to_string(),
            transformed_path: ANONYMOUS_FILE.to_string(),
        };
        Ok(self.text_flow.run(unit)?.text)
    }

    pub fn transform_ast(&self, tree: Node) -> Result<Node, TransformError> {
        self.rewrite.rewrite(tree, &Context::detached())
    }

    /// Rewrites `source` and registers the source map for `transformed_path`.
    pub fn transform_file_source(
        &self,
        source: &str,
        file_path: &str,
        transformed_path: &str,
    ) -> Result<String, TransformError> {
        debug!(file = file_path, bytes = source.len(), "transforming file");
        let unit = SourceUnit {
            text: source.to_string(),
            file_path: file_path.to_string(),
            transformed_path: transformed_path.to_string(),
        };
        let mapped = self.file_flow.run(unit)?;
        info!(
            file = file_path,
            transformed = transformed_path,
            lines = mapped.source_map.line_count(),
            "registered source map"
        );
        self.registry.register(mapped.source_map);
        Ok(mapped.text)
    }

    pub fn transform_file(
        &self,
        path: &Path,
        transformed_path: &str,
    ) -> Result<String, TransformError> {
        let source = fs::read_to_string(path)?;
        self.transform_file_source(&source, &path.to_string_lossy(), transformed_path)
    }
}
