//! Ports (interfaces to external collaborators)

mod graph;

pub use graph::{GraphAccess, GraphConnection, GraphSource};
