/*
 * Program Graph
 *
 * In-memory implementation of the graph access port, backed by petgraph,
 * plus a builder that lays out functions, declarations and calls along the
 * evaluation order. Embedders with their own graph store implement
 * `GraphAccess` directly.
 */

pub mod infrastructure;

pub use infrastructure::{Arg, InMemoryGraph, ProgramGraphBuilder};
