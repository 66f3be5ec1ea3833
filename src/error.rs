//! Error types for the transformation pipeline

use crate::blocks::Phase;
use crate::syntax::ParseError;
use crate::tree::range::{describe, Range};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    #[error(transparent)]
    PhaseOrder(#[from] PhaseOrderError),

    #[error("Where block @ {} is malformed: {message}", describe(.location))]
    MalformedTable {
        message: String,
        location: Option<Range>,
    },

    #[error("{message} @ {}. Expected {expected}", describe(.location))]
    InteractionSyntax {
        message: String,
        expected: String,
        location: Option<Range>,
    },

    #[error("{message} @ {}", describe(.location))]
    RaisesCondition {
        message: String,
        location: Option<Range>,
    },

    #[error("Unknown transformation `{name}` @ {}", describe(.location))]
    UnknownTransformation {
        name: String,
        location: Option<Range>,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Stage '{stage}' failed: {message}")]
    StageFailed { stage: String, message: String },

    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for TransformError {
    fn from(err: std::io::Error) -> Self {
        TransformError::Io(err.to_string())
    }
}

/// A phase was followed by a phase it does not allow, or a test started or ended badly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseOrderError {
    /// The offending phase; [`Phase::Start`] when the test did not open with a phase.
    pub phase: Phase,
    pub location: Option<Range>,
    pub expected: Vec<Phase>,
}

impl fmt::Display for PhaseOrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let expected = self
            .expected
            .iter()
            .map(|phase| phase.name())
            .collect::<Vec<_>>()
            .join(", ");
        if self.phase == Phase::Start {
            write!(
                f,
                "Test method @ {} must start with one of these Blocks: [{}]",
                describe(&self.location),
                expected
            )
        } else {
            write!(
                f,
                "Block {} @ {} must be followed by one of these Blocks: [{}]",
                self.phase,
                describe(&self.location),
                expected
            )
        }
    }
}

impl std::error::Error for PhaseOrderError {}
