mod builder;
mod in_memory;

pub use builder::{Arg, ProgramGraphBuilder};
pub use in_memory::InMemoryGraph;
