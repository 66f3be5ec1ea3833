//! # phasespec
//!
//! Phase-structured tests for a Minitest-style host, lowered to plain assertions and
//! mock expectations.
//!
//! A test body is split into labelled phases (`Given`, `When`, `Then`, `Expect`,
//! `Cleanup`, `Where`). The transformation checks the phase order, classifies every
//! statement into a small intermediate representation and generates an ordinary test
//! method from it. Host programs are exchanged as S-expressions (see [`syntax`]).
//!
//! File Layout
//!
//! src/
//!   ├── tree          Nodes, locations, builders and IR views
//!   ├── syntax        S-expression reader and printer
//!   ├── blocks        Phases and their ordering rules
//!   ├── statements, interactions, where_table, test_method
//!   │                 Source tree to IR
//!   ├── codegen       IR to host test methods
//!   ├── transforms    Transformation trait, annotation and phase rewrites, stages
//!   ├── pipeline      Parse, rewrite, emit and map in one flow
//!   ├── source_map    Line mapping from emitted files back to their sources
//!   ├── backtrace     Backtrace translation through the source maps
//!   ├── hook          The load-time compile hook
//!   └── truth_table   Where-table generation helper
//!
//! For unit and integration test helpers, see the [testing module](crate::testing).

pub mod backtrace;
pub mod blocks;
pub mod codegen;
pub mod error;
pub mod hook;
pub mod interactions;
pub mod pipeline;
pub mod source_map;
pub mod statements;
pub mod syntax;
pub mod test_method;
pub mod testing;
pub mod transforms;
pub mod tree;
pub mod truth_table;
pub mod where_table;

pub use backtrace::BacktraceFilter;
pub use error::{PhaseOrderError, TransformError};
pub use hook::{CompileHook, HookOptions, HookOutcome, PrecompileHook};
pub use pipeline::{Pipeline, PipelineOptions};
pub use source_map::{SourceMap, SourceMapRegistry};
pub use syntax::{ParseError, SexpSyntax, Syntax};
pub use transforms::{AnnotationTransformation, Context, PhaseTransformation, Transformation};
pub use tree::{Node, Position, Range};
pub use truth_table::TruthTable;
