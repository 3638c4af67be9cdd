//! Graph sources with observable connection lifecycles

use codegraph_mark::errors::{MarkError, Result};
use codegraph_mark::features::program_graph::InMemoryGraph;
use codegraph_mark::shared::models::{ConstValue, GraphNode, NodeId};
use codegraph_mark::shared::ports::{GraphAccess, GraphConnection, GraphSource};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Hands out owned connections and counts opens and releases
pub struct TrackedSource {
    graph: Arc<InMemoryGraph>,
    opened: AtomicUsize,
    released: Arc<AtomicUsize>,
}

impl TrackedSource {
    pub fn new(graph: InMemoryGraph) -> Self {
        Self {
            graph: Arc::new(graph),
            opened: AtomicUsize::new(0),
            released: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

impl GraphSource for TrackedSource {
    fn connect(&self) -> Result<GraphConnection<'_>> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        let handle = TrackedGraph {
            inner: Arc::clone(&self.graph),
            released: Arc::clone(&self.released),
        };
        Ok(GraphConnection::owned("tracked", Box::new(handle)))
    }
}

struct TrackedGraph {
    inner: Arc<InMemoryGraph>,
    released: Arc<AtomicUsize>,
}

impl Drop for TrackedGraph {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

impl GraphAccess for TrackedGraph {
    fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.inner.node(id)
    }

    fn call_sites_named(&self, name: &str) -> Vec<NodeId> {
        self.inner.call_sites_named(name)
    }

    fn arguments(&self, call: NodeId) -> Vec<NodeId> {
        self.inner.arguments(call)
    }

    fn base_object(&self, call: NodeId) -> Option<NodeId> {
        self.inner.base_object(call)
    }

    fn refers_to(&self, node: NodeId) -> Option<NodeId> {
        self.inner.refers_to(node)
    }

    fn initializer(&self, declaration: NodeId) -> Option<NodeId> {
        self.inner.initializer(declaration)
    }

    fn assigned_constant(&self, node: NodeId) -> Option<ConstValue> {
        self.inner.assigned_constant(node)
    }

    fn eog_successors(&self, node: NodeId) -> Vec<NodeId> {
        self.inner.eog_successors(node)
    }

    fn enclosing_function(&self, node: NodeId) -> Option<NodeId> {
        self.inner.enclosing_function(node)
    }

    fn functions(&self) -> Vec<NodeId> {
        self.inner.functions()
    }

    fn invoked_functions(&self, call: NodeId) -> Vec<NodeId> {
        self.inner.invoked_functions(call)
    }

    fn callers_of(&self, function: NodeId) -> Vec<NodeId> {
        self.inner.callers_of(function)
    }

    fn parameters(&self, function: NodeId) -> Vec<NodeId> {
        self.inner.parameters(function)
    }

    fn dfg_successors(&self, node: NodeId) -> Vec<NodeId> {
        self.inner.dfg_successors(node)
    }

    fn dfg_predecessors(&self, node: NodeId) -> Vec<NodeId> {
        self.inner.dfg_predecessors(node)
    }
}

/// Source whose backend is unreachable
pub struct UnreachableSource;

impl GraphSource for UnreachableSource {
    fn connect(&self) -> Result<GraphConnection<'_>> {
        Err(MarkError::connection("database unreachable"))
    }
}
