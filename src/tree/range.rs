//! Position and location tracking for host source code
//!
//! Every node produced by the host syntax reader carries a [`Range`]: the byte span it
//! was read from plus 1-based line/column start and end positions. Nodes synthesized
//! by code generation carry none.
//!
//! ## Types
//!
//! - [`Position`] - A line:column position in source code
//! - [`Range`] - A source code range with start/end positions and byte span
//! - [`SourceLocation`] - Utility for converting byte offsets to positions

use std::fmt;
use std::ops::Range as ByteRange;

/// A 1-based line and column
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Represents a location in source code (start and end positions)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Range {
    pub span: ByteRange<usize>,
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(span: ByteRange<usize>, start: Position, end: Position) -> Self {
        Self { span, start, end }
    }

    pub fn is_single_line(&self) -> bool {
        self.start.line == self.end.line
    }

    /// Smallest range covering both `self` and `other`.
    pub fn cover(&self, other: &Range) -> Range {
        let (span_start, start) = if other.start < self.start {
            (other.span.start, other.start)
        } else {
            (self.span.start, self.start)
        };
        let (span_end, end) = if other.end > self.end {
            (other.span.end, other.end)
        } else {
            (self.span.end, self.end)
        };
        Range::new(span_start..span_end, start, end)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Renders an optional location as `line:column`, or `?` when unknown.
pub fn describe(location: &Option<Range>) -> String {
    match location {
        Some(range) => range.start.to_string(),
        None => "?".to_string(),
    }
}

/// Provides fast conversion from byte offsets to line/column positions
#[derive(Debug, Clone)]
pub struct SourceLocation {
    /// Byte offsets where each line starts
    line_starts: Vec<usize>,
}

impl SourceLocation {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];

        for (byte_pos, ch) in source.char_indices() {
            if ch == '\n' {
                line_starts.push(byte_pos + 1);
            }
        }

        Self { line_starts }
    }

    /// Convert a byte offset to a 1-based line/column position
    pub fn byte_to_position(&self, byte_offset: usize) -> Position {
        let line = self
            .line_starts
            .binary_search(&byte_offset)
            .unwrap_or_else(|i| i - 1);

        let column = byte_offset - self.line_starts[line];

        Position::new(line + 1, column + 1)
    }

    pub fn byte_range_to_range(&self, range: &ByteRange<usize>) -> Range {
        Range::new(
            range.clone(),
            self.byte_to_position(range.start),
            self.byte_to_position(range.end.saturating_sub(1).max(range.start)),
        )
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}
