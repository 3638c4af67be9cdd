/*
 * Call-Site Binder
 *
 * Binds every op statement of every entity to the call sites matching its
 * call pattern. Runs once per pass, before any rule is evaluated.
 *
 * Entities are independent: with parallelism enabled each entity is bound on
 * a rayon worker into its own table, and the tables are merged afterwards.
 * Calls matching a forbidden statement are kept per statement but are not
 * part of the operation's bound set.
 */

use crate::features::rule_model::{Entity, MarkModel};
use crate::features::typestate::LabelIndex;
use crate::shared::models::NodeId;
use crate::shared::ports::GraphAccess;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// (entity, operation)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OpKey {
    pub entity: String,
    pub op: String,
}

impl OpKey {
    pub fn new(entity: impl Into<String>, op: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            op: op.into(),
        }
    }
}

/// Call sites bound to one operation
#[derive(Debug, Clone, Default)]
pub struct BoundOperation {
    /// Matches per op statement, in statement order
    pub by_statement: Vec<BTreeSet<NodeId>>,

    /// Union over the non-forbidden statements
    pub all: BTreeSet<NodeId>,
}

/// Run-scoped binding table
#[derive(Debug, Clone, Default)]
pub struct OpBindings {
    ops: BTreeMap<OpKey, BoundOperation>,
}

impl OpBindings {
    pub fn get(&self, entity: &str, op: &str) -> Option<&BoundOperation> {
        self.ops.get(&OpKey::new(entity, op))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OpKey, &BoundOperation)> {
        self.ops.iter()
    }

    /// Call sites bound to any operation of `entity`
    pub fn calls_of_entity(&self, entity: &str) -> BTreeSet<NodeId> {
        self.ops
            .iter()
            .filter(|(key, _)| key.entity == entity)
            .flat_map(|(_, bound)| bound.all.iter().copied())
            .collect()
    }

    /// Label index of `entity`'s operations named in `labels`
    ///
    /// A call bound to several of these operations carries all their labels.
    pub fn label_index(&self, entity: &str, labels: &BTreeSet<String>) -> LabelIndex {
        let mut index = LabelIndex::new();
        for label in labels {
            if let Some(bound) = self.get(entity, label) {
                for &call in &bound.all {
                    index.insert(call, label.clone());
                }
            }
        }
        index
    }

    /// Total number of bound (non-forbidden) call sites
    pub fn total_call_sites(&self) -> usize {
        self.ops.values().map(|b| b.all.len()).sum()
    }

    fn merge(&mut self, table: Vec<(OpKey, BoundOperation)>) {
        self.ops.extend(table);
    }
}

/// Binds op statements to graph call sites
pub struct CallSiteBinder<'g> {
    graph: &'g dyn GraphAccess,
}

impl<'g> CallSiteBinder<'g> {
    pub fn new(graph: &'g dyn GraphAccess) -> Self {
        Self { graph }
    }

    /// Bind all entities of `model`
    pub fn bind(&self, model: &MarkModel, parallel: bool) -> OpBindings {
        let tables: Vec<Vec<(OpKey, BoundOperation)>> = if parallel {
            model
                .entities()
                .par_iter()
                .map(|entity| self.bind_entity(entity))
                .collect()
        } else {
            model
                .entities()
                .iter()
                .map(|entity| self.bind_entity(entity))
                .collect()
        };

        let mut bindings = OpBindings::default();
        for table in tables {
            bindings.merge(table);
        }
        debug!(
            "Bound {} operations to {} call sites",
            bindings.ops.len(),
            bindings.total_call_sites()
        );
        bindings
    }

    fn bind_entity(&self, entity: &Entity) -> Vec<(OpKey, BoundOperation)> {
        entity
            .ops
            .iter()
            .map(|op| {
                let mut bound = BoundOperation::default();
                for statement in &op.statements {
                    let matches: BTreeSet<NodeId> =
                        self.graph.find_call_sites(&statement.call).into_iter().collect();
                    debug!(
                        "{}.{}: {} matches for {}{}",
                        entity.name,
                        op.name,
                        matches.len(),
                        statement.call,
                        if statement.forbidden { " (forbidden)" } else { "" }
                    );
                    if !statement.forbidden {
                        bound.all.extend(matches.iter().copied());
                    }
                    bound.by_statement.push(matches);
                }
                (OpKey::new(&entity.name, &op.name), bound)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::program_graph::{Arg, ProgramGraphBuilder};
    use crate::features::rule_model::{CallPattern, OpStatement, Operation};

    fn model() -> MarkModel {
        let botan = Entity::new("Botan")
            .with_var("key")
            .with_op(Operation::with_calls(
                "init",
                vec![
                    CallPattern::parse("set_key", &["key"]).unwrap(),
                    CallPattern::parse("init", &["*"]).unwrap(),
                ],
            ))
            .with_op(Operation::new(
                "bad",
                vec![OpStatement::forbidden(
                    CallPattern::parse("set_key", &["_", "_"]).unwrap(),
                )],
            ));
        MarkModel::new(vec![botan], vec![])
    }

    #[test]
    fn test_union_of_patterns_and_forbidden_split() {
        let mut b = ProgramGraphBuilder::new("Main.java");
        b.function("main", 1);
        b.declare("p", "Botan", 2);
        b.declare_literal("k", "int", 7i64, 3);
        let one = b.call_on("p", "set_key", None, &[Arg::var("k")], 4);
        let init = b.call_on("p", "init", None, &[Arg::lit(1i64), Arg::lit(2i64)], 5);
        let two = b.call_on("p", "set_key", None, &[Arg::var("k"), Arg::var("k")], 6);
        let graph = b.finish();

        for parallel in [false, true] {
            let bindings = CallSiteBinder::new(&graph).bind(&model(), parallel);
            let bound = bindings.get("Botan", "init").unwrap();
            assert_eq!(bound.all, BTreeSet::from([one, init]));
            assert_eq!(bound.by_statement.len(), 2);

            let bad = bindings.get("Botan", "bad").unwrap();
            assert!(bad.all.is_empty());
            assert_eq!(bad.by_statement[0], BTreeSet::from([two]));

            assert_eq!(bindings.calls_of_entity("Botan"), BTreeSet::from([one, init]));
        }
    }

    #[test]
    fn test_label_index_only_covers_requested_ops() {
        let mut b = ProgramGraphBuilder::new("Main.java");
        b.function("main", 1);
        b.declare("p", "Botan", 2);
        let init = b.call_on("p", "init", None, &[], 3);
        let graph = b.finish();

        let bindings = CallSiteBinder::new(&graph).bind(&model(), false);
        let index = bindings.label_index("Botan", &BTreeSet::from(["init".to_string()]));
        assert_eq!(index.len(), 1);
        assert!(index.labels(init).unwrap().contains("init"));

        let empty = bindings.label_index("Botan", &BTreeSet::from(["start".to_string()]));
        assert!(empty.is_empty());
    }
}
