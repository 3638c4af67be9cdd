//! Property-based tests for typestate checking
//!
//! Invariants over arbitrary call sequences in straight-line code:
//! - Agreement: DFA and WPDS modes report the same violations
//! - Language: a sequence is legal iff it is empty or a word of the grammar
//! - Locality: an illegal sequence has exactly one violation, at the first
//!   divergence (or at the last call when the word is an unfinished prefix)

mod common;

use codegraph_mark::features::program_graph::{InMemoryGraph, ProgramGraphBuilder};
use codegraph_mark::features::typestate::{
    Automaton, DfaChecker, LabelIndex, OrderCompiler, TypestateOutcome, TypestateQuery,
    TypestateStrategy, ViolationKind, WpdsChecker,
};
use codegraph_mark::shared::models::NodeId;
use codegraph_mark::shared::ports::GraphAccess;
use common::*;
use proptest::prelude::*;

const OPS: &[&str] = &["create", "init", "start", "finish", "reset"];

fn build(word: &[&str]) -> (InMemoryGraph, NodeId, Vec<NodeId>) {
    let mut b = ProgramGraphBuilder::new("Main.java");
    b.function("main", 1);
    let p = b.declare("p", "Botan", 2);
    let calls = straight_line(&mut b, "p", word, 3);
    (b.finish(), p, calls)
}

fn check(
    strategy: &dyn TypestateStrategy,
    automaton: &Automaton,
    graph: &InMemoryGraph,
    p: NodeId,
) -> TypestateOutcome {
    let mut labels = LabelIndex::new();
    for op in OPS {
        for call in graph.call_sites_named(op) {
            labels.insert(call, *op);
        }
    }
    strategy.check(&TypestateQuery {
        graph,
        automaton,
        instance: p,
        labels: &labels,
    })
}

fn word_strategy() -> impl Strategy<Value = Vec<&'static str>> {
    prop::collection::vec(prop::sample::select(OPS), 0..8)
}

proptest! {
    #[test]
    fn prop_dfa_and_wpds_agree(word in word_strategy()) {
        let automaton = OrderCompiler::compile(&cipher_order()).unwrap();
        let (graph, p, _) = build(&word);

        let dfa = check(&DfaChecker::new(), &automaton, &graph, p);
        let wpds = check(&WpdsChecker::new(), &automaton, &graph, p);
        prop_assert_eq!(dfa, wpds);
    }

    #[test]
    fn prop_legal_iff_accepted(word in word_strategy()) {
        let automaton = OrderCompiler::compile(&cipher_order()).unwrap();
        let (graph, p, _) = build(&word);

        let outcome = check(&DfaChecker::new(), &automaton, &graph, p);
        prop_assert_eq!(outcome.is_legal(), word.is_empty() || automaton.accepts(&word));
    }

    #[test]
    fn prop_single_violation_at_divergence(word in word_strategy()) {
        let automaton = OrderCompiler::compile(&cipher_order()).unwrap();
        let (graph, p, calls) = build(&word);
        let outcome = check(&DfaChecker::new(), &automaton, &graph, p);
        prop_assume!(!outcome.is_legal());

        prop_assert_eq!(outcome.violations.len(), 1);
        let violation = &outcome.violations[0];
        match divergence(&automaton, &word) {
            Some(i) => {
                prop_assert_eq!(violation.kind, ViolationKind::IllegalTransition);
                prop_assert_eq!(violation.node, calls[i]);
                prop_assert_eq!(violation.operation.as_deref(), Some(word[i]));
            }
            None => {
                prop_assert_eq!(violation.kind, ViolationKind::NotTerminated);
                prop_assert_eq!(Some(&violation.node), calls.last());
            }
        }
    }
}

/// Index of the first call the automaton rejects
fn divergence(automaton: &Automaton, word: &[&str]) -> Option<usize> {
    let mut state = automaton.initial();
    for (i, op) in word.iter().enumerate() {
        match automaton.next_state(state, op) {
            Some(next) => state = next,
            None => return Some(i),
        }
    }
    None
}

#[test]
fn test_deleting_required_step() {
    let automaton = OrderCompiler::compile(&cipher_order()).unwrap();
    let (graph, p, calls) = build(&["create", "start", "finish"]);
    let outcome = check(&DfaChecker::new(), &automaton, &graph, p);
    assert_eq!(outcome.violations.len(), 1);
    assert_eq!(outcome.violations[0].node, calls[1]);
    assert_eq!(outcome.violations[0].expected, vec!["init"]);
}

#[test]
fn test_swapping_steps() {
    let automaton = OrderCompiler::compile(&cipher_order()).unwrap();
    let (graph, p, calls) = build(&["create", "init", "finish", "start"]);
    let outcome = check(&WpdsChecker::new(), &automaton, &graph, p);
    assert_eq!(outcome.violations.len(), 1);
    assert_eq!(outcome.violations[0].node, calls[2]);
    assert_eq!(outcome.violations[0].expected, vec!["start"]);
}

#[test]
fn test_end_expected_after_complete_word() {
    let automaton = OrderCompiler::compile(&cipher_order()).unwrap();
    let (graph, p, calls) = build(&["create", "init", "start", "finish", "create"]);
    let outcome = check(&DfaChecker::new(), &automaton, &graph, p);
    assert_eq!(outcome.violations.len(), 1);
    assert_eq!(outcome.violations[0].node, calls[4]);
    assert_eq!(outcome.violations[0].expected, vec!["reset", "start", "END"]);
}
