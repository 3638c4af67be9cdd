/*
 * Typestate Violations
 *
 * A violation is a first-class outcome of checking one instance, not an
 * error. Violations order by node so reports are deterministic.
 */

use super::automaton::{Automaton, StateId};
use crate::shared::models::NodeId;
use serde::{Deserialize, Serialize};

/// Violation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ViolationKind {
    /// Call whose operation has no transition in the current state
    IllegalTransition,

    /// Sequence ends (function exit) in a non-accepting state
    NotTerminated,
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViolationKind::IllegalTransition => write!(f, "Illegal Transition"),
            ViolationKind::NotTerminated => write!(f, "Not Terminated"),
        }
    }
}

/// Typestate violation of one instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypestateViolation {
    /// Offending call, or the last matched call for `NotTerminated`
    pub node: NodeId,

    pub kind: ViolationKind,

    /// Operation seen at `node` (`IllegalTransition` only)
    pub operation: Option<String>,

    /// Labels that would have been legal (`END` when the sequence may stop)
    pub expected: Vec<String>,

    /// Automaton state at the violation
    pub state: StateId,
}

impl TypestateViolation {
    pub fn illegal(
        automaton: &Automaton,
        node: NodeId,
        operation: impl Into<String>,
        state: StateId,
    ) -> Self {
        Self {
            node,
            kind: ViolationKind::IllegalTransition,
            operation: Some(operation.into()),
            expected: automaton.expected_labels(state),
            state,
        }
    }

    /// `None` when the sequence is complete or never started
    pub fn not_terminated(
        automaton: &Automaton,
        last: Option<NodeId>,
        state: StateId,
    ) -> Option<Self> {
        let last = last?;
        if automaton.is_accepting(state) {
            return None;
        }
        Some(Self {
            node: last,
            kind: ViolationKind::NotTerminated,
            operation: None,
            expected: automaton.available_actions(state),
            state,
        })
    }
}

impl std::fmt::Display for TypestateViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.operation {
            Some(op) => write!(
                f,
                "{} at {}: {} (expected {})",
                self.kind,
                self.node,
                op,
                self.expected.join(" | ")
            ),
            None => write!(
                f,
                "{} after {} (expected {})",
                self.kind,
                self.node,
                self.expected.join(" | ")
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_step() -> Automaton {
        let mut a = Automaton::new("a, b");
        let s1 = a.add_state();
        let s2 = a.add_state();
        a.add_transition(0, "a", s1);
        a.add_transition(s1, "b", s2);
        a.set_accepting(s2);
        a
    }

    #[test]
    fn test_illegal_carries_expected() {
        let a = two_step();
        let v = TypestateViolation::illegal(&a, NodeId(5), "b", 0);
        assert_eq!(v.expected, vec!["a"]);
        assert_eq!(v.to_string(), "Illegal Transition at n5: b (expected a)");
    }

    #[test]
    fn test_not_terminated_only_after_a_match() {
        let a = two_step();
        assert!(TypestateViolation::not_terminated(&a, None, 0).is_none());
        assert!(TypestateViolation::not_terminated(&a, Some(NodeId(3)), 2).is_none());

        let v = TypestateViolation::not_terminated(&a, Some(NodeId(3)), 1).unwrap();
        assert_eq!(v.kind, ViolationKind::NotTerminated);
        assert_eq!(v.expected, vec!["b"]);
    }

    #[test]
    fn test_ordering_by_node() {
        let a = two_step();
        let mut vs = vec![
            TypestateViolation::illegal(&a, NodeId(9), "b", 0),
            TypestateViolation::illegal(&a, NodeId(2), "b", 0),
        ];
        vs.sort();
        assert_eq!(vs[0].node, NodeId(2));
    }
}
