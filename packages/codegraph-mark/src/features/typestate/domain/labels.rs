/*
 * Label Index
 *
 * Call site → operation labels it realizes, restricted to one grammar's
 * alphabet. A call bound to several operations carries all their labels.
 */

use crate::shared::models::NodeId;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelIndex {
    by_call: BTreeMap<NodeId, BTreeSet<String>>,
}

impl LabelIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, call: NodeId, label: impl Into<String>) {
        self.by_call.entry(call).or_default().insert(label.into());
    }

    pub fn labels(&self, call: NodeId) -> Option<&BTreeSet<String>> {
        self.by_call.get(&call)
    }

    /// Bound calls in node order
    pub fn calls(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.by_call.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.by_call.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_call.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlapping_labels_are_unioned() {
        let mut index = LabelIndex::new();
        index.insert(NodeId(4), "start");
        index.insert(NodeId(4), "restart");
        index.insert(NodeId(1), "create");

        assert_eq!(index.calls().collect::<Vec<_>>(), vec![NodeId(1), NodeId(4)]);
        assert_eq!(index.labels(NodeId(4)).map(|l| l.len()), Some(2));
        assert!(index.labels(NodeId(9)).is_none());
    }
}
