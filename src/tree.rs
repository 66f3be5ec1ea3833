//! Tree model shared by host code and the intermediate representation

pub mod build;
pub mod node;
pub mod range;
pub mod view;

pub use node::{Call, Child, Node};
pub use range::{Position, Range, SourceLocation};
pub use view::IrView;
