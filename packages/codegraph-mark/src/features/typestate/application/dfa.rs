/*
 * DFA Typestate Checker
 *
 * Intraprocedural: for every function containing a call on the instance,
 * walk the EOG from the function entry carrying (automaton state, last
 * matched call).
 *
 * # Algorithm
 * - Relevant call (bound to a grammar label, receiver is the instance):
 *   advance the automaton; no transition → IllegalTransition, path stops
 * - Function exit after at least one match in a non-accepting state
 *   → NotTerminated at the last matched call
 * - Visited (node, state, last) triples bound the walk (loops terminate)
 *
 * Each control-flow path is one attempt; the same violation reached over
 * several paths is reported once.
 */

use crate::features::typestate::domain::{StateId, TypestateMode, TypestateViolation};
use crate::features::typestate::ports::{TypestateOutcome, TypestateQuery, TypestateStrategy};
use crate::shared::models::NodeId;
use crate::shared::ports::GraphAccess;
use rustc_hash::FxHashSet;
use std::collections::{BTreeSet, VecDeque};
use tracing::debug;

/// Intraprocedural automaton matching
#[derive(Debug, Default)]
pub struct DfaChecker;

impl DfaChecker {
    pub fn new() -> Self {
        Self
    }

    fn relevant<'q>(query: &'q TypestateQuery<'_>, node: NodeId) -> Option<&'q BTreeSet<String>> {
        let labels = query.labels.labels(node)?;
        (query.graph.instance_of(node) == Some(query.instance)).then_some(labels)
    }

    fn walk_function(
        query: &TypestateQuery<'_>,
        function: NodeId,
        violations: &mut BTreeSet<TypestateViolation>,
    ) {
        let automaton = query.automaton;
        let mut visited: FxHashSet<(NodeId, StateId, Option<NodeId>)> = FxHashSet::default();
        let mut worklist = VecDeque::from([(function, automaton.initial(), None)]);

        while let Some((node, state, last)) = worklist.pop_front() {
            if !visited.insert((node, state, last)) {
                continue;
            }

            let next: Vec<(StateId, Option<NodeId>)> = match Self::relevant(query, node) {
                Some(labels) if node != function => {
                    let states = automaton.step(state, labels);
                    if states.is_empty() {
                        let seen = labels.iter().next().cloned().unwrap_or_default();
                        violations.insert(TypestateViolation::illegal(automaton, node, seen, state));
                        continue;
                    }
                    states.into_iter().map(|s| (s, Some(node))).collect()
                }
                _ => vec![(state, last)],
            };

            let successors = query.graph.eog_successors(node);
            for (state, last) in next {
                if successors.is_empty() {
                    violations.extend(TypestateViolation::not_terminated(automaton, last, state));
                }
                for &succ in &successors {
                    worklist.push_back((succ, state, last));
                }
            }
        }
    }
}

impl TypestateStrategy for DfaChecker {
    fn mode(&self) -> TypestateMode {
        TypestateMode::Dfa
    }

    fn canonicalize(&self, _graph: &dyn GraphAccess, declaration: NodeId) -> NodeId {
        declaration
    }

    fn check(&self, query: &TypestateQuery<'_>) -> TypestateOutcome {
        let mut functions = BTreeSet::new();
        for call in query.labels.calls() {
            if Self::relevant(query, call).is_none() {
                continue;
            }
            match query.graph.enclosing_function(call) {
                Some(function) => {
                    functions.insert(function);
                }
                None => debug!("Call {} of {} has no enclosing function", call, query.instance),
            }
        }

        let mut violations = BTreeSet::new();
        for function in functions {
            Self::walk_function(query, function, &mut violations);
        }
        TypestateOutcome::from_violations(violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::program_graph::{InMemoryGraph, ProgramGraphBuilder};
    use crate::features::typestate::domain::{Automaton, LabelIndex, ViolationKind};

    /// `create, init, (start, finish)+`
    fn cipher() -> Automaton {
        let mut a = Automaton::new("cipher");
        let s: Vec<StateId> = (0..4).map(|_| a.add_state()).collect();
        a.add_transition(0, "create", s[0]);
        a.add_transition(s[0], "init", s[1]);
        a.add_transition(s[1], "start", s[2]);
        a.add_transition(s[2], "finish", s[3]);
        a.add_transition(s[3], "start", s[2]);
        a.set_accepting(s[3]);
        a
    }

    fn labelled(graph: &InMemoryGraph, ops: &[&str]) -> LabelIndex {
        let mut index = LabelIndex::new();
        for op in ops {
            for call in graph.call_sites_named(op) {
                index.insert(call, *op);
            }
        }
        index
    }

    fn check(graph: &InMemoryGraph, instance: NodeId) -> TypestateOutcome {
        let automaton = cipher();
        let labels = labelled(graph, &["create", "init", "start", "finish"]);
        DfaChecker::new().check(&TypestateQuery {
            graph,
            automaton: &automaton,
            instance,
            labels: &labels,
        })
    }

    #[test]
    fn test_legal_sequence() {
        let mut b = ProgramGraphBuilder::new("Main.java");
        b.function("main", 1);
        let p = b.declare("p", "Botan", 2);
        for (line, op) in ["create", "init", "start", "finish"].iter().enumerate() {
            b.call_on("p", op, None, &[], line as u32 + 3);
        }
        let graph = b.finish();
        assert!(check(&graph, p).is_legal());
    }

    #[test]
    fn test_missing_first_step() {
        let mut b = ProgramGraphBuilder::new("Main.java");
        b.function("main", 1);
        let p = b.declare("p", "Botan", 2);
        let init = b.call_on("p", "init", None, &[], 3);
        let graph = b.finish();

        let outcome = check(&graph, p);
        assert_eq!(outcome.violations.len(), 1);
        let v = &outcome.violations[0];
        assert_eq!(v.node, init);
        assert_eq!(v.kind, ViolationKind::IllegalTransition);
        assert_eq!(v.operation.as_deref(), Some("init"));
        assert_eq!(v.expected, vec!["create"]);
    }

    #[test]
    fn test_not_terminated() {
        let mut b = ProgramGraphBuilder::new("Main.java");
        b.function("main", 1);
        let p = b.declare("p", "Botan", 2);
        b.call_on("p", "create", None, &[], 3);
        b.call_on("p", "init", None, &[], 4);
        let start = b.call_on("p", "start", None, &[], 5);
        let graph = b.finish();

        let outcome = check(&graph, p);
        assert_eq!(outcome.violations.len(), 1);
        assert_eq!(outcome.violations[0].kind, ViolationKind::NotTerminated);
        assert_eq!(outcome.violations[0].node, start);
        assert_eq!(outcome.violations[0].expected, vec!["finish"]);
    }

    #[test]
    fn test_loop_terminates_and_accepts() {
        let mut b = ProgramGraphBuilder::new("Main.java");
        b.function("main", 1);
        let p = b.declare("p", "Botan", 2);
        b.call_on("p", "create", None, &[], 3);
        b.call_on("p", "init", None, &[], 4);
        let start = b.call_on("p", "start", None, &[], 5);
        b.call_on("p", "finish", None, &[], 6);
        let exit = b.cursor();
        b.loop_to(start);
        b.set_cursor(exit);
        b.declare("done", "bool", 7);
        let graph = b.finish();

        assert!(check(&graph, p).is_legal());
    }

    #[test]
    fn test_other_instance_ignored() {
        let mut b = ProgramGraphBuilder::new("Main.java");
        b.function("main", 1);
        let p = b.declare("p", "Botan", 2);
        b.declare("q", "Botan", 3);
        b.call_on("q", "init", None, &[], 4);
        let graph = b.finish();

        assert!(check(&graph, p).is_legal());
    }
}
