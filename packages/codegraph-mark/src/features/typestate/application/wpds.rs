/*
 * WPDS Typestate Checker
 *
 * Interprocedural, alias-aware checking of one instance. The ICFG induces a
 * pushdown system; weights are transformers over typestate facts
 * (holders, automaton state, last matched call) and reachability is
 * saturated by the summary-based pushdown solver.
 *
 * # Holders
 * Declarations currently holding the instance:
 * - seeded with the instance itself
 * - `q = p` / `Type q = p` with `p` a holder adds `q`; any other value
 *   written to a holder removes it
 * - push: parameters receiving a holder argument become holders; nothing
 *   else is held inside the callee
 * - pop: the caller's holders are restored (callee parameters drop out)
 *
 * Violations follow DFA semantics; non-termination is judged at exits of
 * root functions (no callers) only, so a sequence finished by a caller is
 * legal.
 */

use crate::features::typestate::domain::{StateId, TypestateMode, TypestateViolation};
use crate::features::typestate::infrastructure::{AliasFlow, PushdownProblem, PushdownSolver, Transfer};
use crate::features::typestate::ports::{TypestateOutcome, TypestateQuery, TypestateStrategy};
use crate::shared::models::{NodeId, NodeKind};
use crate::shared::ports::GraphAccess;
use std::collections::{BTreeSet, VecDeque};
use tracing::debug;

/// Typestate fact carried along the pushdown system
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypestateFact {
    pub holders: BTreeSet<NodeId>,
    pub state: StateId,
    pub last: Option<NodeId>,
}

struct TypestateProblem<'q, 'g> {
    query: &'q TypestateQuery<'g>,
    flow: AliasFlow<'g>,
}

impl TypestateProblem<'_, '_> {
    fn holds(&self, fact: &TypestateFact, call: NodeId) -> bool {
        self.query
            .graph
            .instance_of(call)
            .map(|decl| fact.holders.contains(&decl))
            .unwrap_or(false)
    }
}

impl PushdownProblem for TypestateProblem<'_, '_> {
    type Fact = TypestateFact;
    type Report = TypestateViolation;

    fn step(&self, node: NodeId, fact: &TypestateFact) -> Transfer<TypestateFact, TypestateViolation> {
        let mut fact = fact.clone();
        let instance = self.query.instance;

        if let Some(assignment) = self.flow.assignment(node) {
            match assignment.source {
                Some(source) if fact.holders.contains(&source) => {
                    fact.holders.insert(assignment.target);
                }
                None if assignment.target == instance => {
                    fact.holders.insert(instance);
                }
                _ => {
                    fact.holders.remove(&assignment.target);
                }
            }
        }

        let Some(labels) = self.query.labels.labels(node) else {
            return Transfer::identity(fact);
        };
        if !self.holds(&fact, node) {
            return Transfer::identity(fact);
        }

        let automaton = self.query.automaton;
        let states = automaton.step(fact.state, labels);
        if states.is_empty() {
            let seen = labels.iter().next().cloned().unwrap_or_default();
            return Transfer::stop(TypestateViolation::illegal(automaton, node, seen, fact.state));
        }
        Transfer {
            facts: states
                .into_iter()
                .map(|state| TypestateFact {
                    holders: fact.holders.clone(),
                    state,
                    last: Some(node),
                })
                .collect(),
            reports: Vec::new(),
        }
    }

    fn push(&self, call: NodeId, callee: NodeId, fact: &TypestateFact) -> TypestateFact {
        let graph = self.query.graph;
        let mut holders = BTreeSet::new();
        for (arg, param) in graph.arguments(call).into_iter().zip(graph.parameters(callee)) {
            let passes_holder = graph
                .refers_to(arg)
                .map(|decl| fact.holders.contains(&decl))
                .unwrap_or(false);
            if passes_holder {
                holders.insert(param);
            }
        }
        TypestateFact {
            holders,
            state: fact.state,
            last: fact.last,
        }
    }

    fn pop(&self, _call: NodeId, caller: &TypestateFact, exit: &TypestateFact) -> TypestateFact {
        TypestateFact {
            holders: caller.holders.clone(),
            state: exit.state,
            last: exit.last,
        }
    }
}

/// Interprocedural pushdown-reachability checking
#[derive(Debug, Default)]
pub struct WpdsChecker;

impl WpdsChecker {
    pub fn new() -> Self {
        Self
    }

    /// Root functions (no callers) from which a call on the instance is reachable
    fn roots(&self, query: &TypestateQuery<'_>) -> BTreeSet<NodeId> {
        let graph = query.graph;
        let mut relevant = BTreeSet::new();
        for call in query.labels.calls() {
            let on_instance = graph
                .instance_of(call)
                .map(|decl| self.canonicalize(graph, decl) == query.instance)
                .unwrap_or(false);
            if let (true, Some(function)) = (on_instance, graph.enclosing_function(call)) {
                relevant.insert(function);
            }
        }

        let mut reached = relevant.clone();
        let mut queue: VecDeque<NodeId> = relevant.iter().copied().collect();
        let mut roots = BTreeSet::new();
        while let Some(function) = queue.pop_front() {
            let callers = graph.callers_of(function);
            if callers.is_empty() {
                roots.insert(function);
            }
            for caller in callers {
                if let Some(outer) = graph.enclosing_function(caller) {
                    if reached.insert(outer) {
                        queue.push_back(outer);
                    }
                }
            }
        }

        if roots.is_empty() {
            // Every path into the relevant functions is recursive
            relevant
        } else {
            roots
        }
    }
}

impl TypestateStrategy for WpdsChecker {
    fn mode(&self) -> TypestateMode {
        TypestateMode::Wpds
    }

    fn canonicalize(&self, graph: &dyn GraphAccess, declaration: NodeId) -> NodeId {
        AliasFlow::new(graph).canonical_root(declaration)
    }

    /// Parameters of functions with callers are checked through the
    /// caller's object, whichever argument they receive
    fn is_standalone(&self, graph: &dyn GraphAccess, instance: NodeId) -> bool {
        let is_parameter = graph
            .node(instance)
            .map(|n| n.kind == NodeKind::ParameterDeclaration)
            .unwrap_or(false);
        if !is_parameter {
            return true;
        }
        graph
            .enclosing_function(instance)
            .map(|function| graph.callers_of(function).is_empty())
            .unwrap_or(true)
    }

    fn check(&self, query: &TypestateQuery<'_>) -> TypestateOutcome {
        let roots = self.roots(query);
        if roots.is_empty() {
            return TypestateOutcome::default();
        }

        let problem = TypestateProblem {
            query,
            flow: AliasFlow::new(query.graph),
        };
        let seed = TypestateFact {
            holders: BTreeSet::from([query.instance]),
            state: query.automaton.initial(),
            last: None,
        };
        let result = PushdownSolver::new(query.graph, &problem)
            .solve(roots.iter().map(|&root| (root, seed.clone())));

        debug!(
            "WPDS check of {}: {} roots, {} path edges, {} summaries",
            query.instance,
            roots.len(),
            result.stats.path_edges,
            result.stats.summaries
        );

        let mut violations: Vec<TypestateViolation> = result.reports.into_iter().collect();
        violations.extend(result.root_exits.iter().filter_map(|exit| {
            TypestateViolation::not_terminated(query.automaton, exit.last, exit.state)
        }));
        TypestateOutcome::from_violations(violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::program_graph::{Arg, InMemoryGraph, ProgramGraphBuilder};
    use crate::features::typestate::domain::{Automaton, LabelIndex, ViolationKind};
    use crate::features::typestate::infrastructure::OrderCompiler;
    use crate::features::rule_model::OrderExpression;

    fn cipher() -> Automaton {
        let op = |name: &str| OrderExpression::op("cm", name);
        OrderCompiler::compile(&OrderExpression::seq(vec![
            op("create"),
            op("init"),
            OrderExpression::one_or_more(OrderExpression::seq(vec![op("start"), op("finish")])),
        ]))
        .unwrap()
    }

    fn check(graph: &InMemoryGraph, instance: NodeId) -> TypestateOutcome {
        let automaton = cipher();
        let mut labels = LabelIndex::new();
        for op in ["create", "init", "start", "finish"] {
            for call in graph.call_sites_named(op) {
                labels.insert(call, op);
            }
        }
        WpdsChecker::new().check(&TypestateQuery {
            graph,
            automaton: &automaton,
            instance,
            labels: &labels,
        })
    }

    #[test]
    fn test_object_passed_to_helper_is_one_instance() {
        let mut b = ProgramGraphBuilder::new("Main.java");
        let helper = b.function("setup", 20);
        b.param("c", "Botan");
        b.call_on("c", "init", None, &[], 21);
        b.call_on("c", "start", None, &[], 22);

        b.function("main", 1);
        let (p, _) = b.declare_with_call("p", "Botan", "create", None, &[], 2);
        b.call_function(helper, &[Arg::var("p")], 3);
        b.call_on("p", "finish", None, &[], 4);
        let graph = b.finish();

        let outcome = check(&graph, p);
        assert!(outcome.is_legal(), "{:?}", outcome.violations);
    }

    #[test]
    fn test_helper_shared_by_two_objects() {
        let mut b = ProgramGraphBuilder::new("Main.java");
        let helper = b.function("setup", 20);
        let c = b.param("c", "Botan");
        b.call_on("c", "init", None, &[], 21);
        b.call_on("c", "start", None, &[], 22);

        b.function("main", 1);
        let (p, _) = b.declare_with_call("p", "Botan", "create", None, &[], 2);
        b.call_function(helper, &[Arg::var("p")], 3);
        b.call_on("p", "finish", None, &[], 4);
        let (q, _) = b.declare_with_call("q", "Botan", "create", None, &[], 5);
        b.call_function(helper, &[Arg::var("q")], 6);
        b.call_on("q", "finish", None, &[], 7);
        let graph = b.finish();

        let checker = WpdsChecker::new();
        assert_eq!(checker.canonicalize(&graph, c), c);
        assert!(!checker.is_standalone(&graph, c));
        assert!(checker.is_standalone(&graph, p));
        assert!(check(&graph, p).is_legal(), "{:?}", check(&graph, p).violations);
        assert!(check(&graph, q).is_legal(), "{:?}", check(&graph, q).violations);
    }

    #[test]
    fn test_alias_reports_on_alias_call() {
        let mut b = ProgramGraphBuilder::new("Main.java");
        b.function("main", 1);
        let (p, _) = b.declare_with_call("p", "Botan", "create", None, &[], 2);
        b.declare_init("q", "Botan", Arg::var("p"), 3);
        let bad = b.call_on("q", "start", None, &[], 4);
        let graph = b.finish();

        let outcome = check(&graph, p);
        assert_eq!(outcome.violations.len(), 1);
        assert_eq!(outcome.violations[0].node, bad);
        assert_eq!(outcome.violations[0].expected, vec!["init"]);
    }

    #[test]
    fn test_helper_exit_is_not_a_termination_point() {
        let mut b = ProgramGraphBuilder::new("Main.java");
        let helper = b.function("setup", 20);
        b.param("c", "Botan");
        b.call_on("c", "init", None, &[], 21);

        b.function("main", 1);
        let (p, _) = b.declare_with_call("p", "Botan", "create", None, &[], 2);
        b.call_function(helper, &[Arg::var("p")], 3);
        let graph = b.finish();

        let outcome = check(&graph, p);
        assert_eq!(outcome.violations.len(), 1);
        let v = &outcome.violations[0];
        assert_eq!(v.kind, ViolationKind::NotTerminated);
        assert_eq!(v.expected, vec!["start"]);
    }

    #[test]
    fn test_canonicalize_follows_copies() {
        let mut b = ProgramGraphBuilder::new("Main.java");
        b.function("main", 1);
        let (p, _) = b.declare_with_call("p", "Botan", "create", None, &[], 2);
        let q = b.declare_init("q", "Botan", Arg::var("p"), 3);
        let graph = b.finish();

        assert_eq!(WpdsChecker::new().canonicalize(&graph, q), p);
    }
}
