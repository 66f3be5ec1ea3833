//! Host syntax boundary
//!
//! The transformation core never reads or writes host text itself. It goes through a
//! [`Syntax`] implementation: `parse` must attach a [`Range`](crate::tree::Range) to
//! every node it produces, and `serialize` must be deterministic so that re-parsing its
//! output yields the same locations every time.
//!
//! [`SexpSyntax`] is the bundled implementation. It reads and writes the tagged tree
//! directly as S-expressions, which makes it usable both as a real front end and as a
//! fixture format for tests.

pub mod lexer;
pub mod printer;
pub mod reader;

use crate::tree::{Node, Position};
use printer::Printer;
use reader::Reader;
use std::fmt;

/// Parse failure in host text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub file_path: String,
    pub position: Option<Position>,
    pub message: String,
}

impl ParseError {
    pub fn new(file_path: &str, position: Option<Position>, message: String) -> Self {
        Self {
            file_path: file_path.to_string(),
            position,
            message,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(position) => write!(f, "{}:{}: {}", self.file_path, position, self.message),
            None => write!(f, "{}: {}", self.file_path, self.message),
        }
    }
}

impl std::error::Error for ParseError {}

pub trait Syntax: Send + Sync {
    fn parse(&self, text: &str, file_path: &str) -> Result<Node, ParseError>;

    fn serialize(&self, tree: &Node) -> String;
}

#[derive(Debug, Clone, Default)]
pub struct SexpSyntax {
    printer: Printer,
}

impl SexpSyntax {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_indent(indent: usize) -> Self {
        Self {
            printer: Printer::new(indent),
        }
    }
}

impl Syntax for SexpSyntax {
    fn parse(&self, text: &str, file_path: &str) -> Result<Node, ParseError> {
        Reader::new(text, file_path)?.read_document()
    }

    fn serialize(&self, tree: &Node) -> String {
        self.printer.print(tree)
    }
}
