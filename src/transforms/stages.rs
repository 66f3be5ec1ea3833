//! Pipeline stages
//!
//! Each stage is a [`Runnable`] over the value produced by the stage before it:
//!
//! | Stage          | Input        | Output       |
//! |----------------|--------------|--------------|
//! | [`ParseStage`]   | [`SourceUnit`] | [`Parsed`]     |
//! | [`RewriteStage`] | [`Parsed`]     | [`Rewritten`]  |
//! | [`EmitStage`]    | [`Rewritten`]  | [`Emitted`]    |
//! | [`MapStage`]     | [`Emitted`]    | [`Mapped`]     |

use super::{Context, Runnable, Transformation};
use crate::error::TransformError;
use crate::source_map::SourceMap;
use crate::syntax::Syntax;
use crate::tree::Node;
use std::sync::Arc;
use tracing::debug;

/// Host text plus where it came from and where its rewrite will live.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    pub text: String,
    pub file_path: String,
    pub transformed_path: String,
}

#[derive(Debug, Clone)]
pub struct Parsed {
    pub unit: SourceUnit,
    pub tree: Node,
}

/// The rewritten tree. Nodes that came from the source keep their original ranges.
#[derive(Debug, Clone)]
pub struct Rewritten {
    pub unit: SourceUnit,
    pub tree: Node,
}

#[derive(Debug, Clone)]
pub struct Emitted {
    pub unit: SourceUnit,
    pub tree: Node,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct Mapped {
    pub text: String,
    pub source_map: SourceMap,
}

#[derive(Clone)]
pub struct ParseStage {
    syntax: Arc<dyn Syntax>,
}

impl ParseStage {
    pub fn new(syntax: Arc<dyn Syntax>) -> Self {
        Self { syntax }
    }
}

impl Runnable<SourceUnit, Parsed> for ParseStage {
    fn run(&self, unit: SourceUnit) -> Result<Parsed, TransformError> {
        let tree = self.syntax.parse(&unit.text, &unit.file_path)?;
        Ok(Parsed { unit, tree })
    }
}

/// Runs a chain of transformations in order.
#[derive(Clone)]
pub struct RewriteStage {
    chain: Arc<[Arc<dyn Transformation>]>,
}

impl RewriteStage {
    pub fn new(chain: Vec<Arc<dyn Transformation>>) -> Self {
        Self {
            chain: chain.into(),
        }
    }

    pub fn rewrite(&self, tree: Node, context: &Context) -> Result<Node, TransformError> {
        self.chain.iter().try_fold(tree, |tree, transformation| {
            debug!(
                file = context.file_path(),
                transformation = transformation.name(),
                "running transformation"
            );
            transformation.run(tree, context)
        })
    }
}

impl Runnable<Parsed, Rewritten> for RewriteStage {
    fn run(&self, parsed: Parsed) -> Result<Rewritten, TransformError> {
        let context = Context::new(&parsed.unit.file_path, &parsed.unit.text);
        let tree = self.rewrite(parsed.tree, &context)?;
        Ok(Rewritten {
            unit: parsed.unit,
            tree,
        })
    }
}

#[derive(Clone)]
pub struct EmitStage {
    syntax: Arc<dyn Syntax>,
}

impl EmitStage {
    pub fn new(syntax: Arc<dyn Syntax>) -> Self {
        Self { syntax }
    }
}

impl Runnable<Rewritten, Emitted> for EmitStage {
    fn run(&self, rewritten: Rewritten) -> Result<Emitted, TransformError> {
        let text = self.syntax.serialize(&rewritten.tree);
        Ok(Emitted {
            unit: rewritten.unit,
            tree: rewritten.tree,
            text,
        })
    }
}

/// Re-reads the emitted text and builds its source map.
#[derive(Clone)]
pub struct MapStage {
    syntax: Arc<dyn Syntax>,
}

impl MapStage {
    pub fn new(syntax: Arc<dyn Syntax>) -> Self {
        Self { syntax }
    }
}

impl Runnable<Emitted, Mapped> for MapStage {
    fn run(&self, emitted: Emitted) -> Result<Mapped, TransformError> {
        let reparsed = self
            .syntax
            .parse(&emitted.text, &emitted.unit.transformed_path)
            .map_err(|err| TransformError::StageFailed {
                stage: "map".to_string(),
                message: format!("emitted code does not parse: {}", err),
            })?;
        let source_map = SourceMap::build(
            &emitted.unit.file_path,
            &emitted.unit.transformed_path,
            &emitted.tree,
            &reparsed,
        );
        Ok(Mapped {
            text: emitted.text,
            source_map,
        })
    }
}
