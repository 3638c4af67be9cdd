//! Graph Access Layer
//!
//! Read-only query interface over the program graph. Implementations must be
//! `Send + Sync`: the graph is never mutated during an evaluation pass, which
//! is what lets rules be evaluated in parallel.

use crate::errors::Result;
use crate::features::rule_model::{CallPattern, Param};
use crate::shared::models::{ConstValue, GraphNode, NodeId, Span};
use std::ops::Deref;
use tracing::debug;

/// Program graph query protocol
///
/// Required methods are the primitive edge lookups. Composite queries
/// (pattern matching, instance lookup) are provided on top of them.
/// All returned lists are sorted by `NodeId` unless stated otherwise.
pub trait GraphAccess: Send + Sync {
    /// Fetch a node
    fn node(&self, id: NodeId) -> Option<&GraphNode>;

    /// Call sites whose simple or qualified callee name equals `name`
    fn call_sites_named(&self, name: &str) -> Vec<NodeId>;

    /// Arguments of a call, ordered by position
    fn arguments(&self, call: NodeId) -> Vec<NodeId>;

    /// Receiver expression of a call (`p` in `p.init()`)
    fn base_object(&self, call: NodeId) -> Option<NodeId>;

    /// Declaration a reference resolves to
    fn refers_to(&self, node: NodeId) -> Option<NodeId>;

    /// Initializer expression of a declaration
    fn initializer(&self, declaration: NodeId) -> Option<NodeId>;

    /// Constant value reaching `node`, if one can be determined
    fn assigned_constant(&self, node: NodeId) -> Option<ConstValue>;

    /// Control-flow successors (evaluation order)
    fn eog_successors(&self, node: NodeId) -> Vec<NodeId>;

    /// Function declaration containing `node`
    fn enclosing_function(&self, node: NodeId) -> Option<NodeId>;

    /// All function declarations
    fn functions(&self) -> Vec<NodeId>;

    /// Function declarations a call may invoke
    fn invoked_functions(&self, call: NodeId) -> Vec<NodeId>;

    /// Calls that may invoke `function`
    fn callers_of(&self, function: NodeId) -> Vec<NodeId>;

    /// Parameters of a function, ordered by position
    fn parameters(&self, function: NodeId) -> Vec<NodeId>;

    fn dfg_successors(&self, node: NodeId) -> Vec<NodeId>;

    fn dfg_predecessors(&self, node: NodeId) -> Vec<NodeId>;

    // ─────────────────────────────────────────────────────────────────────

    /// File and span of a node
    fn source_range(&self, node: NodeId) -> Option<(String, Span)> {
        let n = self.node(node)?;
        n.span.map(|span| (n.file.clone(), span))
    }

    /// Source text of a node (empty when unknown)
    fn code(&self, node: NodeId) -> String {
        self.node(node).map(|n| n.code.clone()).unwrap_or_default()
    }

    /// Call sites matching a call pattern (name + parameter shape)
    fn find_call_sites(&self, pattern: &CallPattern) -> Vec<NodeId> {
        self.call_sites_named(&pattern.name)
            .into_iter()
            .filter(|&call| arguments_match(self, &pattern.params, &self.arguments(call)))
            .collect()
    }

    /// Declaration of the object a call is made on
    ///
    /// Constructor calls have no receiver; their object is the declaration
    /// the call's value flows into.
    fn instance_of(&self, call: NodeId) -> Option<NodeId> {
        match self.base_object(call) {
            Some(base) => self.refers_to(base),
            None => self
                .dfg_successors(call)
                .into_iter()
                .find(|&n| self.node(n).map(|n| n.is_declaration()).unwrap_or(false)),
        }
    }

    /// Whether the function has a body in the graph
    fn has_body(&self, function: NodeId) -> bool {
        !self.eog_successors(function).is_empty()
    }
}

/// Match call arguments against a parameter shape
///
/// `*` matches any remaining arguments; without it the arity must agree.
fn arguments_match<G: GraphAccess + ?Sized>(graph: &G, params: &[Param], args: &[NodeId]) -> bool {
    let mut args = args.iter();
    for param in params {
        if matches!(param, Param::Spread) {
            return true;
        }
        let Some(&arg) = args.next() else {
            return false;
        };
        let ok = match param {
            Param::Wildcard | Param::Spread => true,
            Param::Hole { type_name, .. } => match (type_name, graph.node(arg)) {
                (Some(expected), Some(node)) => match node.type_name.as_deref() {
                    Some(actual) => actual == expected.as_str(),
                    // Unknown argument type: accept
                    None => true,
                },
                _ => true,
            },
            Param::Literal(expected) => graph
                .assigned_constant(arg)
                .map(|actual| actual.loosely_equals(expected))
                .unwrap_or(false),
        };
        if !ok {
            return false;
        }
    }
    args.next().is_none()
}

enum Handle<'g> {
    Borrowed(&'g dyn GraphAccess),
    Owned(Box<dyn GraphAccess + 'g>),
}

/// An open connection to a program graph
///
/// Scoped to one evaluation pass and released on drop, including when the
/// pass unwinds with an error.
pub struct GraphConnection<'g> {
    label: String,
    handle: Handle<'g>,
}

impl<'g> GraphConnection<'g> {
    /// Connection over a graph that lives elsewhere
    pub fn borrowed(label: impl Into<String>, graph: &'g dyn GraphAccess) -> Self {
        let label = label.into();
        debug!("Opening graph connection '{}'", label);
        Self {
            label,
            handle: Handle::Borrowed(graph),
        }
    }

    /// Connection owning its backend (released together with it)
    pub fn owned(label: impl Into<String>, graph: Box<dyn GraphAccess + 'g>) -> Self {
        let label = label.into();
        debug!("Opening graph connection '{}'", label);
        Self {
            label,
            handle: Handle::Owned(graph),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl<'g> Deref for GraphConnection<'g> {
    type Target = dyn GraphAccess + 'g;

    fn deref(&self) -> &Self::Target {
        match &self.handle {
            Handle::Borrowed(graph) => *graph,
            Handle::Owned(graph) => graph.as_ref(),
        }
    }
}

impl Drop for GraphConnection<'_> {
    fn drop(&mut self) {
        debug!("Releasing graph connection '{}'", self.label);
    }
}

/// Provider of graph connections
pub trait GraphSource: Sync {
    /// Open a connection; failure aborts the evaluation pass
    fn connect(&self) -> Result<GraphConnection<'_>>;
}
