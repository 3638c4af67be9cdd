//! Shared models

mod node;
mod span;
mod value;

pub use node::{EdgeKind, GraphNode, NodeId, NodeKind};
pub use span::Span;
pub use value::ConstValue;
