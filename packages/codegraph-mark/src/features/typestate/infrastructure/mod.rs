/*
 * Typestate Infrastructure
 *
 * - order_compiler : order expression → Automaton (+ per-run cache)
 * - aliasing       : must-alias roots and assignment flow
 * - pushdown       : summary-based pushdown reachability solver
 */

mod aliasing;
mod order_compiler;
mod pushdown;

pub use aliasing::{AliasFlow, Assignment};
pub use order_compiler::{AutomatonCache, OrderCompiler};
pub use pushdown::{PushdownProblem, PushdownResult, PushdownSolver, PushdownStats, Transfer};
