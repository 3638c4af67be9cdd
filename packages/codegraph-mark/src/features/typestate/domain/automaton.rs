/*
 * Order Automaton
 *
 * Deterministic automaton over operation labels, compiled from an order
 * expression.
 *
 * # Example: `create, init, (start, finish)+`
 * ```text
 *   0 --create--> 1 --init--> 2 --start--> 3 --finish--> (4)
 *                                          ^               |
 *                                          +----start------+
 * ```
 *
 * # Time Complexity
 * - next_state: O(log transitions)
 * - available_actions: O(out-degree + log transitions)
 */

use std::collections::{BTreeMap, BTreeSet};

/// Automaton state
pub type StateId = usize;

/// Pseudo label reported when the sequence may end
pub const END_LABEL: &str = "END";

/// Deterministic order automaton
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Automaton {
    /// Rendered order expression
    name: String,

    state_count: usize,
    initial: StateId,
    accepting: BTreeSet<StateId>,

    /// (from, label) → to
    transitions: BTreeMap<(StateId, String), StateId>,
}

impl Automaton {
    /// Automaton with a single non-accepting initial state
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state_count: 1,
            initial: 0,
            accepting: BTreeSet::new(),
            transitions: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_state(&mut self) -> StateId {
        self.state_count += 1;
        self.state_count - 1
    }

    pub fn add_transition(&mut self, from: StateId, label: impl Into<String>, to: StateId) {
        self.transitions.insert((from, label.into()), to);
    }

    pub fn set_accepting(&mut self, state: StateId) {
        self.accepting.insert(state);
    }

    pub fn initial(&self) -> StateId {
        self.initial
    }

    pub fn state_count(&self) -> usize {
        self.state_count
    }

    pub fn is_accepting(&self, state: StateId) -> bool {
        self.accepting.contains(&state)
    }

    pub fn next_state(&self, from: StateId, label: &str) -> Option<StateId> {
        self.transitions.get(&(from, label.to_string())).copied()
    }

    /// Labels with a transition out of `from`, sorted
    pub fn available_actions(&self, from: StateId) -> Vec<String> {
        self.transitions
            .range((from, String::new())..)
            .take_while(|((state, _), _)| *state == from)
            .map(|((_, label), _)| label.clone())
            .collect()
    }

    /// Labels that would be legal in `from`, plus `END` if the sequence may stop
    pub fn expected_labels(&self, from: StateId) -> Vec<String> {
        let mut expected = self.available_actions(from);
        if self.is_accepting(from) {
            expected.push(END_LABEL.to_string());
        }
        expected
    }

    /// Successor states for a call bound to several labels; empty if none is legal
    pub fn step(&self, from: StateId, labels: &BTreeSet<String>) -> Vec<StateId> {
        let mut next: Vec<StateId> = labels
            .iter()
            .filter_map(|label| self.next_state(from, label))
            .collect();
        next.sort_unstable();
        next.dedup();
        next
    }

    /// All labels of the automaton
    pub fn alphabet(&self) -> BTreeSet<String> {
        self.transitions
            .keys()
            .map(|(_, label)| label.clone())
            .collect()
    }

    /// Whether the word is in the language
    pub fn accepts<S: AsRef<str>>(&self, word: &[S]) -> bool {
        let mut state = self.initial;
        for label in word {
            match self.next_state(state, label.as_ref()) {
                Some(next) => state = next,
                None => return false,
            }
        }
        self.is_accepting(state)
    }

    /// Checks:
    /// - Initial and accepting states exist
    /// - All transitions reference existing states
    pub fn validate(&self) -> Result<(), String> {
        if self.initial >= self.state_count {
            return Err(format!("Initial state {} out of range", self.initial));
        }
        if let Some(state) = self.accepting.iter().find(|&&s| s >= self.state_count) {
            return Err(format!("Accepting state {} out of range", state));
        }
        for ((from, label), to) in &self.transitions {
            if *from >= self.state_count || *to >= self.state_count {
                return Err(format!("Transition {} --{}--> {} out of range", from, label, to));
            }
        }
        Ok(())
    }
}
