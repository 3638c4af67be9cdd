/*
 * Pushdown Reachability Solver
 *
 * Summary-based post* saturation over the pushdown system induced by the
 * interprocedural control-flow graph:
 * - step : intraprocedural EOG edge, weight = problem transfer at the node
 * - push : call node → callee entry (callee has a body)
 * - pop  : callee exit → return site (successors of the call node)
 *
 * Facts reaching a callee exit for a given entry fact are recorded as
 * summaries, so every (callee, entry fact) pair is explored once no matter
 * how many call sites reach it. This is the tabulation algorithm of Reps,
 * Horwitz and Sagiv specialised to weights that are finite fact transformers.
 *
 * # Algorithm
 * 1. Seed (root, d0) path edges at each root function declaration
 * 2. Pop path edge (f, d0, n, d); apply step(n, d) → {d'}
 * 3. n calls g with a body: push d' into g, register the caller, apply
 *    existing summaries of (g, push(d'))
 * 4. Otherwise propagate d' along EOG successors; no successor = exit of f
 * 5. Exit: new summary (f, d0) → d' resumes every registered caller
 * 6. Repeat until the worklist is empty
 */

use crate::shared::models::NodeId;
use crate::shared::ports::GraphAccess;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::{BTreeSet, VecDeque};
use std::fmt::Debug;
use std::hash::Hash;

/// Result of applying a problem's transfer at one node
#[derive(Debug, Clone)]
pub struct Transfer<F, R> {
    /// Facts after the node; empty stops the path
    pub facts: Vec<F>,
    pub reports: Vec<R>,
}

impl<F, R> Transfer<F, R> {
    pub fn identity(fact: F) -> Self {
        Self {
            facts: vec![fact],
            reports: Vec::new(),
        }
    }

    pub fn stop(report: R) -> Self {
        Self {
            facts: Vec::new(),
            reports: vec![report],
        }
    }
}

/// Dataflow problem solved over the pushdown system
pub trait PushdownProblem {
    type Fact: Clone + Eq + Hash + Ord + Debug;
    type Report: Clone + Ord;

    /// Transfer of the statement at `node`
    fn step(&self, node: NodeId, fact: &Self::Fact) -> Transfer<Self::Fact, Self::Report>;

    /// Entry fact of `callee` when called at `call` with `fact`
    fn push(&self, call: NodeId, callee: NodeId, fact: &Self::Fact) -> Self::Fact;

    /// Fact at the return site, from the caller's fact at the call and the callee exit fact
    fn pop(&self, call: NodeId, caller: &Self::Fact, exit: &Self::Fact) -> Self::Fact;
}

/// Solver statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushdownStats {
    pub iterations: usize,
    pub path_edges: usize,
    pub summaries: usize,
}

/// Saturation result
#[derive(Debug, Clone)]
pub struct PushdownResult<F: Ord, R: Ord> {
    pub reports: BTreeSet<R>,

    /// Facts reaching an exit of a root function
    pub root_exits: BTreeSet<F>,

    pub stats: PushdownStats,
}

type PathEdge<F> = (NodeId, F, NodeId, F);

/// Summary-based pushdown solver
pub struct PushdownSolver<'a, P: PushdownProblem> {
    graph: &'a dyn GraphAccess,
    problem: &'a P,

    /// (function, entry fact, node, fact before node)
    path_edges: FxHashSet<PathEdge<P::Fact>>,
    worklist: VecDeque<PathEdge<P::Fact>>,

    /// (function, entry fact) → exit facts
    summaries: FxHashMap<(NodeId, P::Fact), BTreeSet<P::Fact>>,

    /// (callee, entry fact) → (caller, caller entry fact, call node, fact after call node)
    incoming: FxHashMap<(NodeId, P::Fact), Vec<PathEdge<P::Fact>>>,

    roots: FxHashSet<(NodeId, P::Fact)>,
    root_exits: BTreeSet<P::Fact>,
    reports: BTreeSet<P::Report>,
    stats: PushdownStats,
}

impl<'a, P: PushdownProblem> PushdownSolver<'a, P> {
    pub fn new(graph: &'a dyn GraphAccess, problem: &'a P) -> Self {
        Self {
            graph,
            problem,
            path_edges: FxHashSet::default(),
            worklist: VecDeque::new(),
            summaries: FxHashMap::default(),
            incoming: FxHashMap::default(),
            roots: FxHashSet::default(),
            root_exits: BTreeSet::new(),
            reports: BTreeSet::new(),
            stats: PushdownStats::default(),
        }
    }

    /// Saturate from `(root function, entry fact)` seeds
    pub fn solve(
        mut self,
        seeds: impl IntoIterator<Item = (NodeId, P::Fact)>,
    ) -> PushdownResult<P::Fact, P::Report> {
        for (root, fact) in seeds {
            self.roots.insert((root, fact.clone()));
            self.propagate(root, fact.clone(), root, fact);
        }

        while let Some((function, entry, node, fact)) = self.worklist.pop_front() {
            self.stats.iterations += 1;
            self.process(function, entry, node, fact);
        }

        self.stats.path_edges = self.path_edges.len();
        self.stats.summaries = self.summaries.values().map(|s| s.len()).sum();

        PushdownResult {
            reports: self.reports,
            root_exits: self.root_exits,
            stats: self.stats,
        }
    }

    fn propagate(&mut self, function: NodeId, entry: P::Fact, node: NodeId, fact: P::Fact) {
        let edge = (function, entry, node, fact);
        if self.path_edges.insert(edge.clone()) {
            self.worklist.push_back(edge);
        }
    }

    fn process(&mut self, function: NodeId, entry: P::Fact, node: NodeId, fact: P::Fact) {
        let transfer = self.problem.step(node, &fact);
        self.reports.extend(transfer.reports);

        let callees: Vec<NodeId> = if node == function {
            Vec::new()
        } else {
            self.graph
                .invoked_functions(node)
                .into_iter()
                .filter(|&callee| self.graph.has_body(callee))
                .collect()
        };

        for after in transfer.facts {
            if callees.is_empty() {
                self.continue_after(function, entry.clone(), node, after);
                continue;
            }
            for &callee in &callees {
                let callee_entry = self.problem.push(node, callee, &after);
                let key = (callee, callee_entry.clone());
                self.incoming.entry(key.clone()).or_default().push((
                    function,
                    entry.clone(),
                    node,
                    after.clone(),
                ));

                let exits: Vec<P::Fact> = self
                    .summaries
                    .get(&key)
                    .map(|s| s.iter().cloned().collect())
                    .unwrap_or_default();
                for exit in exits {
                    let ret = self.problem.pop(node, &after, &exit);
                    self.continue_after(function, entry.clone(), node, ret);
                }

                self.propagate(callee, callee_entry.clone(), callee, callee_entry);
            }
        }
    }

    fn continue_after(&mut self, function: NodeId, entry: P::Fact, node: NodeId, fact: P::Fact) {
        let successors = self.graph.eog_successors(node);
        if successors.is_empty() {
            self.end_procedure(function, entry, fact);
            return;
        }
        for succ in successors {
            self.propagate(function, entry.clone(), succ, fact.clone());
        }
    }

    fn end_procedure(&mut self, function: NodeId, entry: P::Fact, exit: P::Fact) {
        let key = (function, entry);
        if self.roots.contains(&key) {
            self.root_exits.insert(exit.clone());
        }
        if !self.summaries.entry(key.clone()).or_default().insert(exit.clone()) {
            return;
        }
        let callers = self.incoming.get(&key).cloned().unwrap_or_default();
        for (caller, caller_entry, call, caller_fact) in callers {
            let ret = self.problem.pop(call, &caller_fact, &exit);
            self.continue_after(caller, caller_entry, call, ret);
        }
    }
}
