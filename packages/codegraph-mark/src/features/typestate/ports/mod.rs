/*
 * Typestate Ports
 *
 * Strategy seam between rule evaluation and the two checking modes.
 */

use crate::features::typestate::domain::{Automaton, LabelIndex, TypestateMode, TypestateViolation};
use crate::shared::models::NodeId;
use crate::shared::ports::GraphAccess;

/// One (order, instance) check
pub struct TypestateQuery<'a> {
    pub graph: &'a dyn GraphAccess,
    pub automaton: &'a Automaton,

    /// Canonical instance declaration
    pub instance: NodeId,

    /// Bound call sites of the order's alphabet
    pub labels: &'a LabelIndex,
}

/// Verdict of one check; violations sorted by node
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypestateOutcome {
    pub violations: Vec<TypestateViolation>,
}

impl TypestateOutcome {
    pub fn from_violations(violations: impl IntoIterator<Item = TypestateViolation>) -> Self {
        let mut violations: Vec<TypestateViolation> = violations.into_iter().collect();
        violations.sort();
        violations.dedup();
        Self { violations }
    }

    pub fn is_legal(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Typestate checking strategy
pub trait TypestateStrategy: Send + Sync {
    fn mode(&self) -> TypestateMode;

    /// Canonical instance identifier for a receiver declaration
    fn canonicalize(&self, graph: &dyn GraphAccess, declaration: NodeId) -> NodeId;

    /// Whether a canonical instance is checked on its own
    ///
    /// `false` for objects whose calls are already checked as part of
    /// another instance.
    fn is_standalone(&self, _graph: &dyn GraphAccess, _instance: NodeId) -> bool {
        true
    }

    fn check(&self, query: &TypestateQuery<'_>) -> TypestateOutcome;
}
