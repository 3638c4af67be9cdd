//! Common test utilities for codegraph-mark
//!
//! Shared rule models, program graphs, graph sources and assertions for the
//! integration tests.

#![allow(dead_code)]

mod assertions;
mod fixtures;
mod sources;

// Re-export all utilities
pub use assertions::*;
pub use fixtures::*;
pub use sources::*;
