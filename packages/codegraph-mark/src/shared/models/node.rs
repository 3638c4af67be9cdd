//! Program graph node and edge models
//!
//! The graph front end delivers nodes for declarations, calls, references
//! and literals, connected by the edge kinds below. This is the contract the
//! evaluation engine relies on; how the graph is built is not its concern.

use super::{ConstValue, Span};
use serde::{Deserialize, Serialize};

/// Stable node identifier (dense index into the graph)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Node kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Function or method declaration (its EOG successors form the body)
    FunctionDeclaration,
    /// Local variable or field declaration
    VariableDeclaration,
    /// Formal parameter of a function
    ParameterDeclaration,
    /// Call expression (`p.init(x)`, `helper(p)`)
    CallExpression,
    /// Use of a declared name
    Reference,
    /// Literal constant
    Literal,
    /// Any other statement
    Statement,
}

/// Edge kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Call → receiver expression
    Base,
    /// Reference → declaration it resolves to
    RefersTo,
    /// Call → argument expression at position
    Argument(u32),
    /// Evaluation order (intraprocedural control flow)
    Eog,
    /// Call → invoked function declaration
    Invokes,
    /// Function → parameter declaration at position
    Parameter(u32),
    /// Data flow
    Dfg,
    /// Declaration → initializer expression
    Initializer,
}

/// A node of the program graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: NodeId,
    pub kind: NodeKind,

    /// Simple name (callee name for calls, variable name for declarations)
    pub name: String,

    /// Fully qualified callee name (calls only, e.g. `Botan.init`)
    pub fqn: Option<String>,

    /// Source text of the node
    pub code: String,

    pub file: String,
    pub span: Option<Span>,

    /// Declared or inferred type
    pub type_name: Option<String>,

    /// Literal value (literals only)
    pub value: Option<ConstValue>,
}

impl GraphNode {
    pub fn is_declaration(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::VariableDeclaration | NodeKind::ParameterDeclaration
        )
    }

    pub fn is_call(&self) -> bool {
        self.kind == NodeKind::CallExpression
    }

    /// Whether a call pattern name designates this call (simple or qualified)
    pub fn callee_matches(&self, pattern_name: &str) -> bool {
        self.name == pattern_name || self.fqn.as_deref() == Some(pattern_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, fqn: Option<&str>) -> GraphNode {
        GraphNode {
            id: NodeId(1),
            kind: NodeKind::CallExpression,
            name: name.to_string(),
            fqn: fqn.map(String::from),
            code: format!("p.{}()", name),
            file: "Main.java".to_string(),
            span: None,
            type_name: None,
            value: None,
        }
    }

    #[test]
    fn test_callee_matches_simple_and_qualified() {
        let node = call("init", Some("Botan.init"));
        assert!(node.callee_matches("init"));
        assert!(node.callee_matches("Botan.init"));
        assert!(!node.callee_matches("Botan.start"));
        assert!(node.is_call());
        assert!(!node.is_declaration());
    }

    #[test]
    fn test_node_id_display_and_order() {
        assert_eq!(NodeId(7).to_string(), "n7");
        assert!(NodeId(2) < NodeId(10));
    }
}
