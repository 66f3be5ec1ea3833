//! Pre-compile hook
//!
//! The host calls a [`PrecompileHook`] for each source file before compiling it. The
//! bundled [`CompileHook`] only touches files that opt in by containing the annotation
//! marker; those are rewritten, written to a scratch directory mirroring the project
//! layout, and compiled from that artifact so that backtraces point at a real file.

use crate::error::TransformError;
use crate::pipeline::{Pipeline, PipelineOptions};
use crate::source_map::SourceMapRegistry;
use crate::syntax::ParseError;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookOptions {
    /// Files that do not contain this text are left alone.
    pub marker: String,
    pub project_root: PathBuf,
    /// Artifact directory, relative to `project_root` unless absolute.
    pub scratch_dir: PathBuf,
    pub strict: bool,
    pub indent: usize,
}

impl Default for HookOptions {
    fn default() -> Self {
        Self {
            marker: "transform!".to_string(),
            project_root: PathBuf::from("."),
            scratch_dir: PathBuf::from("tmp/phasespec"),
            strict: false,
            indent: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HookOutcome {
    /// Compile the original text.
    Untouched,
    /// Compile `text`, which was also written to `artifact`.
    Rewritten { text: String, artifact: PathBuf },
    /// The file does not parse; compile the original text and let the host report it.
    Uncompilable { error: ParseError },
}

pub trait PrecompileHook {
    fn rewrite(&self, source_path: &Path, source: &str) -> Result<HookOutcome, TransformError>;
}

pub struct CompileHook {
    options: HookOptions,
    pipeline: Pipeline,
}

impl CompileHook {
    pub fn new(options: HookOptions, registry: Arc<SourceMapRegistry>) -> Self {
        let pipeline = Pipeline::standard(
            PipelineOptions {
                strict: options.strict,
                indent: options.indent,
            },
            registry,
        );
        Self { options, pipeline }
    }

    pub fn options(&self) -> &HookOptions {
        &self.options
    }

    pub fn registry(&self) -> &Arc<SourceMapRegistry> {
        self.pipeline.registry()
    }

    /// `project_root / scratch_dir / <source path relative to project_root>`
    pub fn artifact_path(&self, source_path: &Path) -> PathBuf {
        let relative: PathBuf = match source_path.strip_prefix(&self.options.project_root) {
            Ok(relative) => relative.to_path_buf(),
            Err(_) => source_path
                .components()
                .filter(|component| matches!(component, Component::Normal(_)))
                .collect(),
        };
        self.options
            .project_root
            .join(&self.options.scratch_dir)
            .join(relative)
    }

    /// Reads `source_path` and returns the text the host should compile.
    pub fn compile_source(&self, source_path: &Path) -> Result<String, TransformError> {
        let source = fs::read_to_string(source_path)?;
        Ok(match self.rewrite(source_path, &source)? {
            HookOutcome::Rewritten { text, .. } => text,
            HookOutcome::Untouched | HookOutcome::Uncompilable { .. } => source,
        })
    }
}

impl PrecompileHook for CompileHook {
    fn rewrite(&self, source_path: &Path, source: &str) -> Result<HookOutcome, TransformError> {
        if !source.contains(&self.options.marker) {
            info!(file = %source_path.display(), "no transform marker, skipping");
            return Ok(HookOutcome::Untouched);
        }

        let artifact = self.artifact_path(source_path);
        let artifact_name = artifact.to_string_lossy().into_owned();
        let text = match self.pipeline.transform_file_source(
            source,
            &source_path.to_string_lossy(),
            &artifact_name,
        ) {
            Ok(text) => text,
            Err(TransformError::Parse(error)) => {
                warn!(file = %source_path.display(), %error, "source does not parse, compiling it unchanged");
                return Ok(HookOutcome::Uncompilable { error });
            }
            Err(err) => return Err(err),
        };

        if let Some(parent) = artifact.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&artifact, &text)?;
        info!(file = %source_path.display(), artifact = %artifact.display(), "rewrote file");
        Ok(HookOutcome::Rewritten { text, artifact })
    }
}
