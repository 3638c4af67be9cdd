/*
 * Typestate Application Layer
 *
 * - DfaChecker  : per-function walk of the EOG
 * - WpdsChecker : interprocedural pushdown reachability with alias tracking
 */

mod dfa;
mod wpds;

pub use dfa::DfaChecker;
pub use wpds::{TypestateFact, WpdsChecker};

use super::domain::TypestateMode;
use super::ports::TypestateStrategy;
use std::sync::Arc;

/// Strategy implementing `mode`
pub fn strategy_for(mode: TypestateMode) -> Arc<dyn TypestateStrategy> {
    match mode {
        TypestateMode::Dfa => Arc::new(DfaChecker::new()),
        TypestateMode::Wpds => Arc::new(WpdsChecker::new()),
    }
}
