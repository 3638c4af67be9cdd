/*
 * Alias Flow
 *
 * Must-alias information derived from the data-flow edges of the graph:
 * - `Type q = p;` and `q = p;` make `q` an alias of `p`
 * - an argument flowing into a parameter makes the parameter an alias
 * - any other value (constructor call, literal) starts a new object
 *
 * The alias root of a declaration is the declaration all its sources agree
 * on, followed transitively. It is the canonical instance in WPDS mode.
 */

use crate::shared::models::{NodeId, NodeKind};
use crate::shared::ports::GraphAccess;
use rustc_hash::FxHashSet;

/// Value flow of one EOG statement into a declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    pub target: NodeId,

    /// Declaration the value is read from; `None` for fresh values
    pub source: Option<NodeId>,
}

pub struct AliasFlow<'g> {
    graph: &'g dyn GraphAccess,
}

impl<'g> AliasFlow<'g> {
    pub fn new(graph: &'g dyn GraphAccess) -> Self {
        Self { graph }
    }

    fn is_declaration(&self, node: NodeId) -> bool {
        self.graph
            .node(node)
            .map(|n| n.is_declaration())
            .unwrap_or(false)
    }

    /// Declaration an expression reads, if it is a plain reference
    fn read_declaration(&self, expr: NodeId) -> Option<NodeId> {
        match self.graph.node(expr)?.kind {
            NodeKind::Reference => self.graph.refers_to(expr),
            _ => None,
        }
    }

    /// Flow performed by an EOG node (initialized declaration or assignment)
    pub fn assignment(&self, node: NodeId) -> Option<Assignment> {
        match self.graph.node(node)?.kind {
            NodeKind::VariableDeclaration => {
                let init = self.graph.initializer(node)?;
                Some(Assignment {
                    target: node,
                    source: self.read_declaration(init),
                })
            }
            NodeKind::Statement => {
                let target = self
                    .graph
                    .dfg_successors(node)
                    .into_iter()
                    .find(|&n| self.is_declaration(n))?;
                let source = self
                    .graph
                    .dfg_predecessors(node)
                    .into_iter()
                    .next()
                    .and_then(|expr| self.read_declaration(expr));
                Some(Assignment { target, source })
            }
            _ => None,
        }
    }

    /// Declarations flowing into `decl`, one entry per source (`None` = fresh value)
    pub fn alias_sources(&self, decl: NodeId) -> Vec<Option<NodeId>> {
        let mut exprs: Vec<NodeId> = self.graph.initializer(decl).into_iter().collect();
        exprs.extend(self.graph.dfg_predecessors(decl));
        exprs.sort();
        exprs.dedup();

        exprs
            .into_iter()
            .map(|expr| match self.graph.node(expr).map(|n| n.kind) {
                Some(NodeKind::Statement) => self
                    .graph
                    .dfg_predecessors(expr)
                    .into_iter()
                    .next()
                    .and_then(|src| self.read_declaration(src)),
                _ => self.read_declaration(expr),
            })
            .collect()
    }

    /// Canonical declaration `decl` must-aliases
    pub fn canonical_root(&self, decl: NodeId) -> NodeId {
        self.root(decl, &mut FxHashSet::default())
    }

    fn root(&self, decl: NodeId, visiting: &mut FxHashSet<NodeId>) -> NodeId {
        if !visiting.insert(decl) {
            return decl;
        }
        let sources = self.alias_sources(decl);
        let mut agreed: Option<NodeId> = None;
        for source in &sources {
            let Some(source) = source else {
                return decl;
            };
            let root = self.root(*source, visiting);
            match agreed {
                Some(previous) if previous != root => return decl,
                _ => agreed = Some(root),
            }
        }
        agreed.unwrap_or(decl)
    }
}
