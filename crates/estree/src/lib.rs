//! Target syntax tree for the Basalt translator.
//!
//! The translator produces module-shaped programs over a small set of
//! ESTree-named nodes. Construction goes through the factory functions
//! in [`builder`]; the serializer downstream turns the tree into JSON
//! for the (external) pretty-printer.

pub mod builder;
pub mod node;

pub use node::{DeclarationKind, LiteralValue, Node};
