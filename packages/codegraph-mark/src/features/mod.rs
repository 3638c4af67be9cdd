//! Feature modules
//!
//! - rule_model      : Parsed MARK model (entities, operations, rules, expressions)
//! - program_graph   : In-memory implementation of the graph access port
//! - typestate       : Order grammar compilation + DFA / WPDS checking
//! - mark_evaluation : Binding, instance resolution, expression evaluation, findings

pub mod mark_evaluation;
pub mod program_graph;
pub mod rule_model;
pub mod typestate;
