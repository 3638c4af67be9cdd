/*
 * Run Context
 *
 * Everything one evaluation pass shares between rules: the graph, the model,
 * the binding table and the run-scoped caches and sinks. Created fresh for
 * every pass and dropped at its end.
 */

use super::aggregator::FindingAggregator;
use super::call_site_binder::OpBindings;
use super::stats::StatsCollector;
use crate::features::mark_evaluation::domain::InstanceInterner;
use crate::features::rule_model::MarkModel;
use crate::features::typestate::{AutomatonCache, TypestateStrategy};
use crate::shared::models::NodeId;
use crate::shared::ports::GraphAccess;

pub(crate) struct RunContext<'g> {
    pub graph: &'g dyn GraphAccess,
    pub model: &'g MarkModel,
    pub strategy: &'g dyn TypestateStrategy,
    pub bindings: OpBindings,
    pub interner: InstanceInterner,
    pub automata: AutomatonCache,
    pub aggregator: FindingAggregator,
    pub stats: StatsCollector,
}

impl<'g> RunContext<'g> {
    pub fn new(
        graph: &'g dyn GraphAccess,
        model: &'g MarkModel,
        strategy: &'g dyn TypestateStrategy,
        bindings: OpBindings,
    ) -> Self {
        Self {
            graph,
            model,
            strategy,
            bindings,
            interner: InstanceInterner::new(),
            automata: AutomatonCache::new(),
            aggregator: FindingAggregator::new(),
            stats: StatsCollector::default(),
        }
    }

    /// Canonical declaration of the object `call` is made on
    pub fn receiver_instance(&self, call: NodeId) -> Option<NodeId> {
        self.graph
            .instance_of(call)
            .map(|decl| self.strategy.canonicalize(self.graph, decl))
    }

    /// File of the first node with a known location
    pub fn file_of(&self, nodes: &[NodeId]) -> String {
        nodes
            .iter()
            .find_map(|&n| self.graph.source_range(n))
            .map(|(file, _)| file)
            .unwrap_or_default()
    }
}
