/*
 * Evaluation Values and Results
 */

use super::context::VariableContext;
use crate::shared::models::{ConstValue, NodeId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;

/// Runtime value of an expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvalValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Opaque program node (argument without a known constant)
    Node(NodeId),
    List(Vec<EvalValue>),
}

impl EvalValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            EvalValue::Bool(_) => "bool",
            EvalValue::Int(_) => "int",
            EvalValue::Float(_) => "float",
            EvalValue::Str(_) => "string",
            EvalValue::Node(_) => "node",
            EvalValue::List(_) => "list",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            EvalValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            EvalValue::Int(i) => Some(*i as f64),
            EvalValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Value equality; ints and floats compare numerically, nodes by identity
    pub fn equals(&self, other: &EvalValue) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }

    /// Ordering for `<`, `<=`, `>`, `>=`; `None` if the values are incomparable
    pub fn compare(&self, other: &EvalValue) -> Option<Ordering> {
        match (self, other) {
            (EvalValue::Int(a), EvalValue::Int(b)) => Some(a.cmp(b)),
            (EvalValue::Str(a), EvalValue::Str(b)) => Some(a.cmp(b)),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => None,
            },
        }
    }
}

impl From<&ConstValue> for EvalValue {
    fn from(value: &ConstValue) -> Self {
        match value {
            ConstValue::Bool(b) => EvalValue::Bool(*b),
            ConstValue::Int(i) => EvalValue::Int(*i),
            ConstValue::Float(f) => EvalValue::Float(*f),
            ConstValue::Str(s) => EvalValue::Str(s.clone()),
        }
    }
}

impl std::fmt::Display for EvalValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvalValue::Bool(b) => write!(f, "{}", b),
            EvalValue::Int(i) => write!(f, "{}", i),
            EvalValue::Float(x) => write!(f, "{}", x),
            EvalValue::Str(s) => write!(f, "\"{}\"", s),
            EvalValue::Node(n) => write!(f, "<{}>", n),
            EvalValue::List(items) => {
                let items: Vec<String> = items.iter().map(|i| i.to_string()).collect();
                write!(f, "[{}]", items.join(", "))
            }
        }
    }
}

/// One evaluation outcome under one variable context
#[derive(Debug, Clone)]
pub struct EvalResult {
    pub value: EvalValue,
    pub context: Arc<VariableContext>,

    /// Nodes the value was derived from, reported as finding ranges
    pub responsible: Vec<NodeId>,

    /// A finding was already emitted for this outcome (order violations)
    pub finding_already_added: bool,
}

impl EvalResult {
    pub fn new(value: EvalValue, context: Arc<VariableContext>) -> Self {
        Self {
            value,
            context,
            responsible: Vec::new(),
            finding_already_added: false,
        }
    }

    pub fn with_responsible(mut self, nodes: impl IntoIterator<Item = NodeId>) -> Self {
        self.responsible.extend(nodes);
        self.responsible.sort();
        self.responsible.dedup();
        self
    }

    pub fn with_finding_added(mut self, added: bool) -> Self {
        self.finding_already_added |= added;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_widening() {
        assert!(EvalValue::Int(128).equals(&EvalValue::Float(128.0)));
        assert_eq!(
            EvalValue::Int(1).compare(&EvalValue::Float(1.5)),
            Some(Ordering::Less)
        );
        assert_eq!(EvalValue::Str("a".into()).compare(&EvalValue::Int(1)), None);
    }

    #[test]
    fn test_nodes_compare_by_identity() {
        assert!(EvalValue::Node(NodeId(3)).equals(&EvalValue::Node(NodeId(3))));
        assert!(!EvalValue::Node(NodeId(3)).equals(&EvalValue::Node(NodeId(4))));
        assert!(!EvalValue::Node(NodeId(3)).equals(&EvalValue::Int(3)));
    }

    #[test]
    fn test_responsible_nodes_are_sorted_sets() {
        let result = EvalResult::new(EvalValue::Bool(false), Arc::new(VariableContext::root()))
            .with_responsible([NodeId(9), NodeId(2)])
            .with_responsible([NodeId(2)]);
        assert_eq!(result.responsible, vec![NodeId(2), NodeId(9)]);
    }
}
