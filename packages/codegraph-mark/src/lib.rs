/*
 * Codegraph MARK - Rule Evaluation Engine
 *
 * Checks that a program's use of an API obeys declarative MARK rules:
 * forbidden calls, required preconditions and legal call orders (typestate).
 *
 * Feature-First Hexagonal Architecture:
 * - shared/      : Common models (NodeId, Span, ConstValue) and ports (GraphAccess)
 * - features/    : rule_model → program_graph → typestate → mark_evaluation
 * - config/      : Evaluation configuration (typestate mode, parallelism)
 *
 * Pipeline (one evaluation pass):
 *   connect graph → bind call sites (barrier) → forbidden calls
 *     → per rule: resolve instances → expand variables → evaluate when/ensure
 *     → aggregate findings
 */

// Crate-level lint configuration
#![allow(clippy::too_many_arguments)] // Evaluation contexts carry many borrowed tables
#![allow(clippy::type_complexity)] // Solver state maps
#![allow(clippy::module_inception)] // Module naming intentional
#![allow(clippy::new_without_default)] // Default impl not always needed

/// Shared models and ports
pub mod shared;

/// Feature modules
pub mod features;

/// Configuration system
pub mod config;

/// Error types
pub mod errors;

// ═══════════════════════════════════════════════════════════════════════════
// Re-exports for Public API
// ═══════════════════════════════════════════════════════════════════════════

pub use config::{EvaluationConfig, TypestateMode};
pub use errors::{MarkError, Result};
pub use features::mark_evaluation::{EvaluationReport, Evaluator, Finding, FindingDetail};
pub use features::program_graph::{InMemoryGraph, ProgramGraphBuilder};
pub use features::rule_model::{Entity, Expression, MarkModel, OrderExpression, Rule};
pub use shared::ports::{GraphAccess, GraphConnection, GraphSource};
