/*
 * Evaluation Contexts
 *
 * Contexts are immutable values. A wider context is a new value extending a
 * narrower one, never a mutation of it, so contexts can be shared freely
 * between rules evaluated on different threads.
 *
 * - InstanceContext : alias → concrete instance (one per cartesian combination)
 * - VariableContext : markvar → value, layered over a parent context
 */

use super::result::EvalValue;
use crate::shared::models::NodeId;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Interned canonical instance identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId(pub u32);

/// Concrete program object playing an entity role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Instance {
    pub id: InstanceId,

    /// Canonical declaration node
    pub node: NodeId,
}

/// Run-scoped interning of canonical declaration nodes
#[derive(Default)]
pub struct InstanceInterner {
    ids: Mutex<FxHashMap<NodeId, InstanceId>>,
}

impl InstanceInterner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&self, node: NodeId) -> Instance {
        let mut ids = self.ids.lock();
        let next = InstanceId(ids.len() as u32);
        let id = *ids.entry(node).or_insert(next);
        Instance { id, node }
    }

    pub fn len(&self) -> usize {
        self.ids.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.lock().is_empty()
    }
}

/// alias → instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceContext {
    bindings: BTreeMap<String, Instance>,
}

impl InstanceContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of this context with one more binding
    pub fn with(&self, alias: impl Into<String>, instance: Instance) -> Self {
        let mut bindings = self.bindings.clone();
        bindings.insert(alias.into(), instance);
        Self { bindings }
    }

    pub fn get(&self, alias: &str) -> Option<Instance> {
        self.bindings.get(alias).copied()
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    /// One context per combination of one instance per alias
    ///
    /// An alias without instances yields no context at all.
    pub fn cartesian_product(candidates: &[(String, Vec<Instance>)]) -> Vec<InstanceContext> {
        candidates
            .iter()
            .fold(vec![InstanceContext::new()], |partial, (alias, instances)| {
                partial
                    .iter()
                    .flat_map(|ctx| instances.iter().map(move |&i| ctx.with(alias.clone(), i)))
                    .collect()
            })
    }
}

impl std::fmt::Display for InstanceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .bindings
            .iter()
            .map(|(alias, i)| format!("{}={}", alias, i.node))
            .collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}

/// Value bound to a markvar, with the argument nodes it was read from
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub value: EvalValue,
    pub origins: Vec<NodeId>,
}

impl Binding {
    pub fn new(value: EvalValue) -> Self {
        Self {
            value,
            origins: Vec::new(),
        }
    }

    pub fn from_node(value: EvalValue, origin: NodeId) -> Self {
        Self {
            value,
            origins: vec![origin],
        }
    }
}

/// Layered markvar bindings
///
/// A child sees all bindings of its ancestors and only adds new markvars.
#[derive(Debug, Default)]
pub struct VariableContext {
    parent: Option<Arc<VariableContext>>,
    bindings: BTreeMap<String, Binding>,
}

impl VariableContext {
    pub fn root() -> Self {
        Self::default()
    }

    /// Child of `parent` with additional bindings
    pub fn extend(
        parent: &Arc<VariableContext>,
        bindings: BTreeMap<String, Binding>,
    ) -> Arc<VariableContext> {
        if bindings.is_empty() {
            return Arc::clone(parent);
        }
        Arc::new(Self {
            parent: Some(Arc::clone(parent)),
            bindings,
        })
    }

    pub fn get(&self, var: &str) -> Option<&Binding> {
        match self.bindings.get(var) {
            Some(binding) => Some(binding),
            None => self.parent.as_ref().and_then(|p| p.get(var)),
        }
    }

    pub fn value(&self, var: &str) -> Option<&EvalValue> {
        self.get(var).map(|b| &b.value)
    }

    pub fn contains(&self, var: &str) -> bool {
        self.get(var).is_some()
    }

    /// All bound markvars, including inherited ones
    pub fn keys(&self) -> BTreeSet<String> {
        let mut keys = self
            .parent
            .as_ref()
            .map(|p| p.keys())
            .unwrap_or_default();
        keys.extend(self.bindings.keys().cloned());
        keys
    }

    /// Flattened values (nearest binding wins)
    pub fn flatten(&self) -> BTreeMap<String, EvalValue> {
        let mut all = self
            .parent
            .as_ref()
            .map(|p| p.flatten())
            .unwrap_or_default();
        all.extend(
            self.bindings
                .iter()
                .map(|(k, b)| (k.clone(), b.value.clone())),
        );
        all
    }

    /// Children of `parent`, one per combination of candidate bindings
    ///
    /// No candidate list → `[parent]`; any empty candidate list → `[]`.
    pub fn cartesian_product(
        parent: &Arc<VariableContext>,
        candidates: &[(String, Vec<Binding>)],
    ) -> Vec<Arc<VariableContext>> {
        let combinations = candidates.iter().fold(
            vec![BTreeMap::new()],
            |partial: Vec<BTreeMap<String, Binding>>, (var, values)| {
                partial
                    .iter()
                    .flat_map(|bindings| {
                        values.iter().map(move |value| {
                            let mut next = bindings.clone();
                            next.insert(var.clone(), value.clone());
                            next
                        })
                    })
                    .collect()
            },
        );
        combinations
            .into_iter()
            .map(|bindings| Self::extend(parent, bindings))
            .collect()
    }
}

/// Contexts are equal when they bind the same values
impl PartialEq for VariableContext {
    fn eq(&self, other: &Self) -> bool {
        self.flatten() == other.flatten()
    }
}

impl std::fmt::Display for VariableContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .flatten()
            .iter()
            .map(|(var, value)| format!("{}={}", var, value))
            .collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}
