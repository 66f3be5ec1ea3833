//! Rewriting backtrace locations from emitted files back to their sources

use crate::source_map::SourceMapRegistry;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

static LOCATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<file>[^\s:]+):(?P<line>\d+)(?P<rest>.*)$").expect("location pattern is valid")
});

/// A location translated through a source map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocationRef {
    pub file: String,
    /// `None` when the emitted line has no known origin.
    pub line: Option<usize>,
}

pub struct BacktraceFilter {
    registry: Arc<SourceMapRegistry>,
}

impl BacktraceFilter {
    pub fn new(registry: Arc<SourceMapRegistry>) -> Self {
        Self { registry }
    }

    /// `None` when `file` is not an emitted artifact the registry knows about.
    pub fn translate(&self, file: &str, line: usize) -> Option<SourceLocationRef> {
        let map = self.registry.for_file_path(file)?;
        Some(SourceLocationRef {
            file: map.source_file_path().to_string(),
            line: map.line(line),
        })
    }

    /// Rewrites one `file:line[...]` frame. Unknown files are returned unchanged.
    pub fn filter_location(&self, frame: &str) -> String {
        let Some(captures) = LOCATION.captures(frame) else {
            return frame.to_string();
        };
        let line = captures["line"].parse::<usize>().ok();
        match line.and_then(|line| self.translate(&captures["file"], line)) {
            Some(location) => {
                let line = location
                    .line
                    .map_or_else(|| "?".to_string(), |line| line.to_string());
                format!("{}:{}{}", location.file, line, &captures["rest"])
            }
            None => frame.to_string(),
        }
    }

    pub fn filter_backtrace<S: AsRef<str>>(&self, frames: &[S]) -> Vec<String> {
        frames
            .iter()
            .map(|frame| self.filter_location(frame.as_ref()))
            .collect()
    }
}
