/*
 * InMemoryGraph - petgraph-backed GraphAccess
 *
 * Node ids are dense petgraph indices (`NodeId(i)` ⇔ `NodeIndex::new(i)`);
 * nodes are never removed, so ids stay stable for the graph's lifetime.
 *
 * # Constant resolution
 * - Literal          : its value
 * - Reference        : constant of the declaration it refers to
 * - anything else    : initializer + data-flow predecessors, if they all
 *                      resolve to the same constant
 */

use crate::errors::Result;
use crate::shared::models::{ConstValue, EdgeKind, GraphNode, NodeId, NodeKind};
use crate::shared::ports::{GraphAccess, GraphConnection, GraphSource};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use rustc_hash::{FxHashMap, FxHashSet};

/// In-memory program graph
pub struct InMemoryGraph {
    graph: DiGraph<GraphNode, EdgeKind>,

    /// Simple and qualified callee name → call sites (sorted)
    calls_by_name: FxHashMap<String, Vec<NodeId>>,

    /// Node → enclosing function declaration
    enclosing: FxHashMap<NodeId, NodeId>,
}

fn idx(id: NodeId) -> NodeIndex {
    NodeIndex::new(id.index())
}

fn id(index: NodeIndex) -> NodeId {
    NodeId(index.index() as u32)
}

impl InMemoryGraph {
    pub(crate) fn from_parts(
        graph: DiGraph<GraphNode, EdgeKind>,
        enclosing: FxHashMap<NodeId, NodeId>,
    ) -> Self {
        let mut calls_by_name: FxHashMap<String, Vec<NodeId>> = FxHashMap::default();
        for node in graph.node_weights().filter(|n| n.is_call()) {
            calls_by_name
                .entry(node.name.clone())
                .or_default()
                .push(node.id);
            if let Some(fqn) = &node.fqn {
                if fqn != &node.name {
                    calls_by_name.entry(fqn.clone()).or_default().push(node.id);
                }
            }
        }
        for sites in calls_by_name.values_mut() {
            sites.sort();
            sites.dedup();
        }

        Self {
            graph,
            calls_by_name,
            enclosing,
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.graph.node_weights()
    }

    /// Neighbours over edges accepted by `select`, sorted by the key it returns
    fn neighbours<K: Ord>(
        &self,
        node: NodeId,
        direction: Direction,
        select: impl Fn(&EdgeKind) -> Option<K>,
    ) -> Vec<NodeId> {
        if node.index() >= self.graph.node_count() {
            return Vec::new();
        }
        let mut found: Vec<(K, NodeId)> = self
            .graph
            .edges_directed(idx(node), direction)
            .filter_map(|edge| {
                let other = match direction {
                    Direction::Outgoing => edge.target(),
                    Direction::Incoming => edge.source(),
                };
                select(edge.weight()).map(|key| (key, id(other)))
            })
            .collect();
        found.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
        let mut out: Vec<NodeId> = found.into_iter().map(|(_, n)| n).collect();
        out.dedup();
        out
    }

    fn outgoing(&self, node: NodeId, kind: EdgeKind) -> Vec<NodeId> {
        self.neighbours(node, Direction::Outgoing, |k| (*k == kind).then_some(()))
    }

    fn incoming(&self, node: NodeId, kind: EdgeKind) -> Vec<NodeId> {
        self.neighbours(node, Direction::Incoming, |k| (*k == kind).then_some(()))
    }

    fn constant_of(&self, node: NodeId, visiting: &mut FxHashSet<NodeId>) -> Option<ConstValue> {
        if !visiting.insert(node) {
            return None;
        }
        let resolved = self.node(node).and_then(|n| match n.kind {
            NodeKind::Literal => n.value.clone(),
            NodeKind::Reference => self
                .refers_to(node)
                .and_then(|decl| self.constant_of(decl, visiting)),
            _ => {
                let mut sources: Vec<NodeId> = self.initializer(node).into_iter().collect();
                sources.extend(self.dfg_predecessors(node));
                sources.sort();
                sources.dedup();
                self.agreeing_constant(&sources, visiting)
            }
        });
        visiting.remove(&node);
        resolved
    }

    fn agreeing_constant(
        &self,
        sources: &[NodeId],
        visiting: &mut FxHashSet<NodeId>,
    ) -> Option<ConstValue> {
        let mut agreed: Option<ConstValue> = None;
        for &source in sources {
            let value = self.constant_of(source, visiting)?;
            match &agreed {
                Some(previous) if previous != &value => return None,
                _ => agreed = Some(value),
            }
        }
        agreed
    }
}

impl GraphAccess for InMemoryGraph {
    fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.graph.node_weight(idx(id))
    }

    fn call_sites_named(&self, name: &str) -> Vec<NodeId> {
        self.calls_by_name.get(name).cloned().unwrap_or_default()
    }

    fn arguments(&self, call: NodeId) -> Vec<NodeId> {
        self.neighbours(call, Direction::Outgoing, |k| match k {
            EdgeKind::Argument(pos) => Some(*pos),
            _ => None,
        })
    }

    fn base_object(&self, call: NodeId) -> Option<NodeId> {
        self.outgoing(call, EdgeKind::Base).into_iter().next()
    }

    fn refers_to(&self, node: NodeId) -> Option<NodeId> {
        self.outgoing(node, EdgeKind::RefersTo).into_iter().next()
    }

    fn initializer(&self, declaration: NodeId) -> Option<NodeId> {
        self.outgoing(declaration, EdgeKind::Initializer)
            .into_iter()
            .next()
    }

    fn assigned_constant(&self, node: NodeId) -> Option<ConstValue> {
        self.constant_of(node, &mut FxHashSet::default())
    }

    fn eog_successors(&self, node: NodeId) -> Vec<NodeId> {
        self.outgoing(node, EdgeKind::Eog)
    }

    fn enclosing_function(&self, node: NodeId) -> Option<NodeId> {
        self.enclosing.get(&node).copied()
    }

    fn functions(&self) -> Vec<NodeId> {
        self.graph
            .node_weights()
            .filter(|n| n.kind == NodeKind::FunctionDeclaration)
            .map(|n| n.id)
            .collect()
    }

    fn invoked_functions(&self, call: NodeId) -> Vec<NodeId> {
        self.outgoing(call, EdgeKind::Invokes)
    }

    fn callers_of(&self, function: NodeId) -> Vec<NodeId> {
        self.incoming(function, EdgeKind::Invokes)
    }

    fn parameters(&self, function: NodeId) -> Vec<NodeId> {
        self.neighbours(function, Direction::Outgoing, |k| match k {
            EdgeKind::Parameter(pos) => Some(*pos),
            _ => None,
        })
    }

    fn dfg_successors(&self, node: NodeId) -> Vec<NodeId> {
        self.outgoing(node, EdgeKind::Dfg)
    }

    fn dfg_predecessors(&self, node: NodeId) -> Vec<NodeId> {
        self.incoming(node, EdgeKind::Dfg)
    }
}

impl GraphSource for InMemoryGraph {
    fn connect(&self) -> Result<GraphConnection<'_>> {
        Ok(GraphConnection::borrowed("in-memory", self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::program_graph::{Arg, ProgramGraphBuilder};
    use crate::features::rule_model::CallPattern;

    #[test]
    fn test_constant_through_reference_and_initializer() {
        let mut b = ProgramGraphBuilder::new("Main.java");
        b.function("main", 1);
        b.declare_literal("mode", "String", "AES/CBC", 2);
        let (p, create) = b.declare_with_call(
            "p",
            "Botan",
            "Botan",
            None,
            &[Arg::var("mode")],
            3,
        );
        let graph = b.finish();

        let arg = graph.arguments(create)[0];
        assert_eq!(graph.assigned_constant(arg), Some(ConstValue::str("AES/CBC")));
        assert_eq!(graph.instance_of(create), Some(p));
    }

    #[test]
    fn test_conflicting_assignments_have_no_constant() {
        let mut b = ProgramGraphBuilder::new("Main.java");
        b.function("main", 1);
        b.declare_literal("n", "int", 16i64, 2);
        b.assign("n", Arg::lit(32i64), 3);
        b.call_on("n", "use", None, &[], 4);
        let n = b.lookup("n").unwrap();
        let graph = b.finish();
        assert_eq!(graph.assigned_constant(n), None);
    }

    #[test]
    fn test_call_sites_by_simple_and_qualified_name() {
        let mut b = ProgramGraphBuilder::new("Main.java");
        b.function("main", 1);
        b.declare("p", "Botan", 2);
        let init = b.call_on("p", "set_key", Some("Botan.set_key"), &[Arg::lit(1i64)], 3);
        let graph = b.finish();

        assert_eq!(graph.call_sites_named("set_key"), vec![init]);
        assert_eq!(graph.call_sites_named("Botan.set_key"), vec![init]);

        let one = CallPattern::parse("Botan.set_key", &["_"]).unwrap();
        let two = CallPattern::parse("Botan.set_key", &["_", "_"]).unwrap();
        let spread = CallPattern::parse("set_key", &["*"]).unwrap();
        let literal = CallPattern::parse("set_key", &["1"]).unwrap();
        let other = CallPattern::parse("set_key", &["2"]).unwrap();
        assert_eq!(graph.find_call_sites(&one), vec![init]);
        assert!(graph.find_call_sites(&two).is_empty());
        assert_eq!(graph.find_call_sites(&spread), vec![init]);
        assert_eq!(graph.find_call_sites(&literal), vec![init]);
        assert!(graph.find_call_sites(&other).is_empty());
    }

    #[test]
    fn test_eog_and_enclosing_function() {
        let mut b = ProgramGraphBuilder::new("Main.java");
        let main = b.function("main", 1);
        let decl = b.declare("p", "Botan", 2);
        let call = b.call_on("p", "start", None, &[], 3);
        let graph = b.finish();

        assert_eq!(graph.eog_successors(main), vec![decl]);
        assert_eq!(graph.eog_successors(decl), vec![call]);
        assert!(graph.eog_successors(call).is_empty());
        assert_eq!(graph.enclosing_function(call), Some(main));
        assert_eq!(graph.functions(), vec![main]);
        assert!(graph.has_body(main));
    }

    #[test]
    fn test_out_of_range_node_is_absent() {
        let graph = ProgramGraphBuilder::new("Empty.java").finish();
        assert!(graph.node(NodeId(42)).is_none());
        assert!(graph.eog_successors(NodeId(42)).is_empty());
        assert!(graph.connect().is_ok());
    }

    #[test]
    fn test_connection_derefs_to_graph_access() {
        let mut b = ProgramGraphBuilder::new("Main.java");
        let main = b.function("main", 1);
        let graph = b.finish();

        let connection = graph.connect().unwrap();
        let access: &dyn GraphAccess = &*connection;
        assert_eq!(access.functions(), vec![main]);
    }
}
