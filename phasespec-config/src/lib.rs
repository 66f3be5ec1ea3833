//! Shared configuration loader for the phasespec tools.
//!
//! `defaults/phasespec.default.toml` is embedded into every binary so that docs and
//! runtime behavior stay in sync. Applications layer user-specific files on top
//! of those defaults via [`Loader`] before deserializing into [`PhaseSpecConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use phasespec::HookOptions;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_TOML: &str = include_str!("../defaults/phasespec.default.toml");

/// Top-level configuration consumed by phasespec applications.
#[derive(Debug, Clone, Deserialize)]
pub struct PhaseSpecConfig {
    pub hook: HookConfig,
    pub transform: TransformConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

/// Which files the compile hook rewrites and where it puts them.
#[derive(Debug, Clone, Deserialize)]
pub struct HookConfig {
    pub marker: String,
    pub scratch_dir: PathBuf,
    pub project_root: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransformConfig {
    pub strict: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub indent: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl PhaseSpecConfig {
    pub fn hook_options(&self) -> HookOptions {
        HookOptions {
            marker: self.hook.marker.clone(),
            project_root: self.hook.project_root.clone(),
            scratch_dir: self.hook.scratch_dir.clone(),
            strict: self.transform.strict,
            indent: self.output.indent,
        }
    }
}

/// File name looked up in a project directory by [`Loader::with_project_file`].
pub const PROJECT_FILE: &str = "phasespec.toml";

/// Builds a [`PhaseSpecConfig`] from the embedded defaults plus `phasespec.toml` layers.
///
/// Later layers win, so the usual order is project file, then `--config`, then flags.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layers an explicit `--config` file; building fails if it does not exist.
    pub fn with_file(self, path: impl AsRef<Path>) -> Self {
        self.layer(path.as_ref(), true)
    }

    /// Layers a TOML file that may be missing.
    pub fn with_optional_file(self, path: impl AsRef<Path>) -> Self {
        self.layer(path.as_ref(), false)
    }

    /// Layers `phasespec.toml` from `dir` when a project keeps one there.
    pub fn with_project_file(self, dir: impl AsRef<Path>) -> Self {
        self.with_optional_file(dir.as_ref().join(PROJECT_FILE))
    }

    /// Sets `transform.strict`, so unannotated test methods must be phase-structured.
    pub fn strict(self, strict: bool) -> Result<Self, ConfigError> {
        self.set_override("transform.strict", strict)
    }

    /// Overrides one dotted key such as `output.indent` or `hook.scratch_dir`.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    pub fn build(self) -> Result<PhaseSpecConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }

    fn layer(mut self, path: &Path, required: bool) -> Self {
        let source = File::from(path).format(FileFormat::Toml).required(required);
        self.builder = self.builder.add_source(source);
        self
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// The embedded `phasespec.default.toml` with no project layers.
pub fn load_defaults() -> Result<PhaseSpecConfig, ConfigError> {
    Loader::new().build()
}
