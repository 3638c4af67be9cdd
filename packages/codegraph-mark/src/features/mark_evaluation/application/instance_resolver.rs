/*
 * Instance Resolver
 *
 * Rule aliases → concrete program objects. For every alias, the objects
 * that any bound call of the aliased entity is made on, canonicalized by the
 * typestate strategy and interned. The cartesian product over the aliases
 * gives one instance context per combination.
 */

use super::run_context::RunContext;
use crate::features::mark_evaluation::domain::{Instance, InstanceContext};
use crate::features::rule_model::Rule;
use crate::shared::models::NodeId;
use std::collections::BTreeMap;
use tracing::{debug, warn};

pub(crate) struct InstanceResolver<'r, 'g> {
    run: &'r RunContext<'g>,
}

impl<'r, 'g> InstanceResolver<'r, 'g> {
    pub fn new(run: &'r RunContext<'g>) -> Self {
        Self { run }
    }

    /// Instances of `entity`, ordered by declaration node
    pub fn instances_of(&self, entity: &str) -> Vec<Instance> {
        if self.run.model.entity(entity).is_none() {
            warn!("Entity '{}' is not part of the model, no instances", entity);
            return Vec::new();
        }

        let mut instances: BTreeMap<NodeId, Instance> = BTreeMap::new();
        let mut skipped = 0;
        for call in self.run.bindings.calls_of_entity(entity) {
            match self.run.receiver_instance(call) {
                Some(node) if !self.run.strategy.is_standalone(self.run.graph, node) => {
                    debug!(
                        "{} is checked through its callers",
                        self.run.graph.code(call)
                    );
                }
                Some(node) => {
                    instances
                        .entry(node)
                        .or_insert_with(|| self.run.interner.intern(node));
                }
                None => {
                    warn!("Did not find a base for {}", self.run.graph.code(call));
                    skipped += 1;
                }
            }
        }
        self.run.stats.add_skipped_references(skipped);
        instances.into_values().collect()
    }

    /// One instance context per combination of instances of the rule's aliases
    pub fn contexts(&self, rule: &Rule) -> Vec<InstanceContext> {
        let candidates: Vec<(String, Vec<Instance>)> = rule
            .using
            .iter()
            .map(|aliased| (aliased.alias.clone(), self.instances_of(&aliased.entity)))
            .collect();

        for (alias, instances) in &candidates {
            debug!("{}: {} instances for alias '{}'", rule.name, instances.len(), alias);
        }
        InstanceContext::cartesian_product(&candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::mark_evaluation::application::call_site_binder::CallSiteBinder;
    use crate::features::program_graph::{Arg, InMemoryGraph, ProgramGraphBuilder};
    use crate::features::rule_model::{CallPattern, Entity, Expression, MarkModel, Operation};
    use crate::features::typestate::{DfaChecker, TypestateStrategy, WpdsChecker};

    fn model() -> MarkModel {
        let entity = |name: &str, op: &str| {
            Entity::new(name).with_op(Operation::with_calls(
                op,
                vec![CallPattern::parse(op, &["*"]).unwrap()],
            ))
        };
        let rule = Rule::new("R", Expression::literal(true))
            .using("Cipher", "c")
            .using("Key", "k");
        MarkModel::new(vec![entity("Cipher", "start"), entity("Key", "derive")], vec![rule])
    }

    fn graph() -> InMemoryGraph {
        let mut b = ProgramGraphBuilder::new("Main.java");
        b.function("main", 1);
        b.declare("c1", "Cipher", 2);
        b.declare("c2", "Cipher", 3);
        b.declare_init("c3", "Cipher", Arg::var("c1"), 4);
        b.declare("k", "Key", 5);
        b.call_on("c1", "start", None, &[], 6);
        b.call_on("c2", "start", None, &[], 7);
        b.call_on("c3", "start", None, &[], 8);
        b.call_on("k", "derive", None, &[], 9);
        b.finish()
    }

    fn contexts(graph: &InMemoryGraph, strategy: &dyn TypestateStrategy) -> Vec<InstanceContext> {
        let model = model();
        let bindings = CallSiteBinder::new(graph).bind(&model, false);
        let run = RunContext::new(graph, &model, strategy, bindings);
        let rule = &model.rules()[0];
        InstanceResolver::new(&run).contexts(rule)
    }

    #[test]
    fn test_product_over_aliases() {
        let graph = graph();
        // c1, c2, c3 are distinct objects without alias analysis
        assert_eq!(contexts(&graph, &DfaChecker::new()).len(), 3);
        // c3 is a copy of c1
        assert_eq!(contexts(&graph, &WpdsChecker::new()).len(), 2);
    }

    #[test]
    fn test_shared_helper_parameter_is_not_an_instance() {
        let mut b = ProgramGraphBuilder::new("Main.java");
        let helper = b.function("setup", 20);
        let c = b.param("c", "Cipher");
        b.call_on("c", "start", None, &[], 21);
        b.function("main", 1);
        let p = b.declare("p", "Cipher", 2);
        let q = b.declare("q", "Cipher", 3);
        b.call_function(helper, &[Arg::var("p")], 4);
        b.call_function(helper, &[Arg::var("q")], 5);
        b.call_on("p", "start", None, &[], 6);
        b.call_on("q", "start", None, &[], 7);
        let graph = b.finish();

        let model = model();
        let resolve = |strategy: &dyn TypestateStrategy| -> Vec<NodeId> {
            let bindings = CallSiteBinder::new(&graph).bind(&model, false);
            let run = RunContext::new(&graph, &model, strategy, bindings);
            let resolver = InstanceResolver::new(&run);
            resolver.instances_of("Cipher").iter().map(|i| i.node).collect()
        };

        assert_eq!(resolve(&DfaChecker::new()), vec![c, p, q]);
        assert_eq!(resolve(&WpdsChecker::new()), vec![p, q]);
    }

    #[test]
    fn test_unknown_entity_is_vacuous() {
        let graph = graph();
        let model = MarkModel::new(
            vec![],
            vec![Rule::new("R", Expression::literal(true)).using("Nope", "n")],
        );
        let bindings = CallSiteBinder::new(&graph).bind(&model, false);
        let strategy = DfaChecker::new();
        let run = RunContext::new(&graph, &model, &strategy, bindings);
        assert!(InstanceResolver::new(&run).contexts(&model.rules()[0]).is_empty());
    }
}
