//! DOM arena: slotmap-backed node tree with id/class queries and serialization.

pub mod form;
pub mod node;
pub mod query;
pub mod serialize;
pub mod tree;

pub use node::{NodeData, NodeId, NodeKind};
pub use tree::Dom;
