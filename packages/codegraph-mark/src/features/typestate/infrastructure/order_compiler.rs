/*
 * Order Compiler
 *
 * Order expression → deterministic automaton:
 * 1. Thompson construction (ε-NFA, one fragment per sub-expression)
 * 2. Subset construction over the sorted alphabet
 *
 * State numbering is deterministic: DFA states are numbered in discovery
 * order of a breadth-first walk with labels visited in sorted order.
 *
 * # Time Complexity
 * O(2^n × |Σ|) worst case, n = NFA states; order grammars are small.
 */

use crate::features::rule_model::{OrderError, OrderExpression, Repetition};
use crate::features::typestate::domain::{Automaton, StateId};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;
use tracing::debug;

#[derive(Default)]
struct Nfa {
    /// state → (label or ε, target)
    edges: Vec<Vec<(Option<String>, usize)>>,
}

impl Nfa {
    fn add_state(&mut self) -> usize {
        self.edges.push(Vec::new());
        self.edges.len() - 1
    }

    fn add_edge(&mut self, from: usize, label: Option<&str>, to: usize) {
        self.edges[from].push((label.map(String::from), to));
    }

    /// Thompson fragment (start, end) for `expr`
    fn fragment(&mut self, expr: &OrderExpression) -> (usize, usize) {
        let start = self.add_state();
        let end = self.add_state();
        match expr {
            OrderExpression::Op { op, .. } => self.add_edge(start, Some(op), end),
            OrderExpression::Sequence(items) => {
                let mut cursor = start;
                for item in items {
                    let (s, e) = self.fragment(item);
                    self.add_edge(cursor, None, s);
                    cursor = e;
                }
                self.add_edge(cursor, None, end);
            }
            OrderExpression::Alternative(items) => {
                if items.is_empty() {
                    self.add_edge(start, None, end);
                }
                for item in items {
                    let (s, e) = self.fragment(item);
                    self.add_edge(start, None, s);
                    self.add_edge(e, None, end);
                }
            }
            OrderExpression::Repeat { inner, repetition } => {
                let (s, e) = self.fragment(inner);
                self.add_edge(start, None, s);
                self.add_edge(e, None, end);
                if matches!(repetition, Repetition::ZeroOrMore | Repetition::OneOrMore) {
                    self.add_edge(e, None, s);
                }
                if matches!(repetition, Repetition::Optional | Repetition::ZeroOrMore) {
                    self.add_edge(start, None, end);
                }
            }
        }
        (start, end)
    }

    fn closure(&self, states: impl IntoIterator<Item = usize>) -> BTreeSet<usize> {
        let mut out = BTreeSet::new();
        let mut stack: Vec<usize> = states.into_iter().collect();
        while let Some(state) = stack.pop() {
            if !out.insert(state) {
                continue;
            }
            for (label, to) in &self.edges[state] {
                if label.is_none() {
                    stack.push(*to);
                }
            }
        }
        out
    }

    fn step(&self, states: &BTreeSet<usize>, label: &str) -> BTreeSet<usize> {
        let targets = states.iter().flat_map(|&s| {
            self.edges[s]
                .iter()
                .filter(|(l, _)| l.as_deref() == Some(label))
                .map(|(_, to)| *to)
        });
        self.closure(targets.collect::<Vec<_>>())
    }
}

/// Order expression compiler
pub struct OrderCompiler;

impl OrderCompiler {
    pub fn compile(order: &OrderExpression) -> Result<Automaton, OrderError> {
        order.base_alias()?;
        let alphabet = order.labels();

        let mut nfa = Nfa::default();
        let (start, end) = nfa.fragment(order);

        let mut automaton = Automaton::new(order.to_string());
        let mut ids: BTreeMap<BTreeSet<usize>, StateId> = BTreeMap::new();
        let mut queue = VecDeque::new();

        let initial = nfa.closure([start]);
        ids.insert(initial.clone(), automaton.initial());
        queue.push_back(initial);

        while let Some(set) = queue.pop_front() {
            let from = ids[&set];
            if set.contains(&end) {
                automaton.set_accepting(from);
            }
            for label in &alphabet {
                let next = nfa.step(&set, label);
                if next.is_empty() {
                    continue;
                }
                let to = match ids.get(&next) {
                    Some(&id) => id,
                    None => {
                        let id = automaton.add_state();
                        ids.insert(next.clone(), id);
                        queue.push_back(next);
                        id
                    }
                };
                automaton.add_transition(from, label.clone(), to);
            }
        }

        debug!(
            "Compiled order '{}' to {} states",
            automaton.name(),
            automaton.state_count()
        );
        Ok(automaton)
    }
}

/// Compiled automata keyed by rendered order expression
#[derive(Default)]
pub struct AutomatonCache {
    compiled: Mutex<FxHashMap<String, Arc<Automaton>>>,
}

impl AutomatonCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compile(&self, order: &OrderExpression) -> Result<Arc<Automaton>, OrderError> {
        let key = order.to_string();
        if let Some(hit) = self.compiled.lock().get(&key) {
            return Ok(Arc::clone(hit));
        }
        let automaton = Arc::new(OrderCompiler::compile(order)?);
        let mut compiled = self.compiled.lock();
        Ok(Arc::clone(compiled.entry(key).or_insert(automaton)))
    }

    pub fn len(&self) -> usize {
        self.compiled.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.compiled.lock().is_empty()
    }
}
