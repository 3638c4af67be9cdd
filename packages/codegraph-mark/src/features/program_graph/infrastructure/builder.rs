/*
 * ProgramGraphBuilder
 *
 * Lays out a program graph statement by statement. Statements are appended
 * after the current EOG frontier; branches are expressed by saving and
 * restoring the frontier:
 *
 * ```rust,ignore
 * let mut b = ProgramGraphBuilder::new("Main.java");
 * b.function("main", 1);
 * b.declare_with_call("p", "Botan", "Botan", None, &[Arg::lit("AES/CBC")], 2);
 * b.call_on("p", "start", Some("Botan.start"), &[], 3);
 * let fork = b.cursor();
 * b.call_on("p", "reset", None, &[], 4);   // then-branch
 * b.join(fork);                            // else-branch falls through
 * b.call_on("p", "finish", None, &[], 5);
 * let graph = b.finish();
 * ```
 *
 * Names are resolved against the current function's scope (declarations and
 * parameters). Unknown names produce references without a declaration.
 */

use super::in_memory::InMemoryGraph;
use crate::shared::models::{ConstValue, EdgeKind, GraphNode, NodeId, NodeKind, Span};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use rustc_hash::FxHashMap;

/// Argument expression of a built call or assignment
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// Reference to a variable in scope
    Var(String),
    /// Literal constant
    Lit(ConstValue),
}

impl Arg {
    pub fn var(name: impl Into<String>) -> Self {
        Arg::Var(name.into())
    }

    pub fn lit(value: impl Into<ConstValue>) -> Self {
        Arg::Lit(value.into())
    }
}

impl std::fmt::Display for Arg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Arg::Var(name) => write!(f, "{}", name),
            Arg::Lit(value) => write!(f, "{}", value),
        }
    }
}

/// Builder for `InMemoryGraph`
pub struct ProgramGraphBuilder {
    graph: DiGraph<GraphNode, EdgeKind>,
    enclosing: FxHashMap<NodeId, NodeId>,
    file: String,
    function: Option<NodeId>,

    /// Nodes the next statement is appended after
    frontier: Vec<NodeId>,

    /// Names visible in the current function
    scope: FxHashMap<String, NodeId>,

    /// (argument expression, callee, position), resolved to DFG edges on finish
    pending_params: Vec<(NodeId, NodeId, usize)>,
}

impl ProgramGraphBuilder {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            graph: DiGraph::new(),
            enclosing: FxHashMap::default(),
            file: file.into(),
            function: None,
            frontier: Vec::new(),
            scope: FxHashMap::default(),
            pending_params: Vec::new(),
        }
    }

    fn add(&mut self, kind: NodeKind, name: &str, code: String, line: Option<u32>) -> NodeId {
        let id = NodeId(self.graph.node_count() as u32);
        let span = line.map(|l| Span::line(l, 1, code.len() as u32 + 1));
        self.graph.add_node(GraphNode {
            id,
            kind,
            name: name.to_string(),
            fqn: None,
            code,
            file: self.file.clone(),
            span,
            type_name: None,
            value: None,
        });
        if let Some(function) = self.function {
            self.enclosing.insert(id, function);
        }
        id
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut GraphNode> {
        self.graph.node_weight_mut(NodeIndex::new(id.index()))
    }

    fn edge(&mut self, from: NodeId, to: NodeId, kind: EdgeKind) {
        self.graph
            .add_edge(NodeIndex::new(from.index()), NodeIndex::new(to.index()), kind);
    }

    /// Append a statement after the frontier
    fn append(&mut self, node: NodeId) {
        let frontier = std::mem::take(&mut self.frontier);
        for from in frontier {
            self.edge(from, node, EdgeKind::Eog);
        }
        self.frontier = vec![node];
    }

    /// Expression node for an argument (not part of the EOG)
    fn expression(&mut self, arg: &Arg, line: u32) -> NodeId {
        match arg {
            Arg::Var(name) => self.reference(name, line),
            Arg::Lit(value) => {
                let node = self.add(NodeKind::Literal, "", value.to_string(), Some(line));
                let type_name = value.type_name().to_string();
                if let Some(n) = self.node_mut(node) {
                    n.value = Some(value.clone());
                    n.type_name = Some(type_name);
                }
                node
            }
        }
    }

    fn reference(&mut self, name: &str, line: u32) -> NodeId {
        let node = self.add(NodeKind::Reference, name, name.to_string(), Some(line));
        if let Some(&decl) = self.scope.get(name) {
            let type_name = self.graph[NodeIndex::new(decl.index())].type_name.clone();
            if let Some(n) = self.node_mut(node) {
                n.type_name = type_name;
            }
            self.edge(node, decl, EdgeKind::RefersTo);
        }
        node
    }

    fn render_args(args: &[Arg]) -> String {
        args.iter()
            .map(|a| a.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn call_node(
        &mut self,
        callee: &str,
        fqn: Option<&str>,
        code: String,
        args: &[Arg],
        line: u32,
    ) -> NodeId {
        let arg_nodes: Vec<NodeId> = args.iter().map(|a| self.expression(a, line)).collect();
        let call = self.add(NodeKind::CallExpression, callee, code, Some(line));
        if let Some(n) = self.node_mut(call) {
            n.fqn = fqn.map(String::from);
        }
        for (pos, arg) in arg_nodes.into_iter().enumerate() {
            self.edge(call, arg, EdgeKind::Argument(pos as u32));
        }
        call
    }

    // ─────────────────────────────────────────────────────────────────────

    /// Start a function; following statements form its body
    pub fn function(&mut self, name: &str, line: u32) -> NodeId {
        self.function = None;
        let function = self.add(
            NodeKind::FunctionDeclaration,
            name,
            format!("void {}()", name),
            Some(line),
        );
        self.function = Some(function);
        self.frontier = vec![function];
        self.scope.clear();
        function
    }

    /// Add the next parameter of the current function
    pub fn param(&mut self, name: &str, type_name: &str) -> NodeId {
        let code = format!("{} {}", type_name, name);
        let param = self.add(NodeKind::ParameterDeclaration, name, code, None);
        if let Some(n) = self.node_mut(param) {
            n.type_name = Some(type_name.to_string());
        }
        if let Some(function) = self.function {
            let pos = self
                .graph
                .edges(NodeIndex::new(function.index()))
                .filter(|e| matches!(e.weight(), EdgeKind::Parameter(_)))
                .count();
            self.edge(function, param, EdgeKind::Parameter(pos as u32));
        }
        self.scope.insert(name.to_string(), param);
        param
    }

    /// `Type name;`
    pub fn declare(&mut self, name: &str, type_name: &str, line: u32) -> NodeId {
        let decl = self.add(
            NodeKind::VariableDeclaration,
            name,
            format!("{} {};", type_name, name),
            Some(line),
        );
        if let Some(n) = self.node_mut(decl) {
            n.type_name = Some(type_name.to_string());
        }
        self.append(decl);
        self.scope.insert(name.to_string(), decl);
        decl
    }

    /// `Type name = <expr>;` where the initializer is a variable or literal
    pub fn declare_init(&mut self, name: &str, type_name: &str, init: Arg, line: u32) -> NodeId {
        let init_node = self.expression(&init, line);
        let decl = self.declare(name, type_name, line);
        let code = format!("{} {} = {};", type_name, name, init);
        if let Some(n) = self.node_mut(decl) {
            n.code = code;
        }
        self.edge(decl, init_node, EdgeKind::Initializer);
        self.edge(init_node, decl, EdgeKind::Dfg);
        decl
    }

    /// `Type name = <literal>;`
    pub fn declare_literal(
        &mut self,
        name: &str,
        type_name: &str,
        value: impl Into<ConstValue>,
        line: u32,
    ) -> NodeId {
        self.declare_init(name, type_name, Arg::lit(value), line)
    }

    /// `Type name = new Callee(args);` returning (declaration, constructor call)
    pub fn declare_with_call(
        &mut self,
        name: &str,
        type_name: &str,
        callee: &str,
        fqn: Option<&str>,
        args: &[Arg],
        line: u32,
    ) -> (NodeId, NodeId) {
        let code = format!("{} {} = new {}({});", type_name, name, callee, Self::render_args(args));
        let call = self.call_node(callee, fqn, code.clone(), args, line);
        if let Some(n) = self.node_mut(call) {
            n.type_name = Some(type_name.to_string());
        }
        self.append(call);
        let decl = self.declare(name, type_name, line);
        if let Some(n) = self.node_mut(decl) {
            n.code = code;
        }
        self.edge(decl, call, EdgeKind::Initializer);
        self.edge(call, decl, EdgeKind::Dfg);
        (decl, call)
    }

    /// `receiver.callee(args);`
    pub fn call_on(
        &mut self,
        receiver: &str,
        callee: &str,
        fqn: Option<&str>,
        args: &[Arg],
        line: u32,
    ) -> NodeId {
        let base = self.reference(receiver, line);
        let code = format!("{}.{}({});", receiver, callee, Self::render_args(args));
        let call = self.call_node(callee, fqn, code, args, line);
        self.edge(call, base, EdgeKind::Base);
        self.append(call);
        call
    }

    /// `callee(args);` invoking a function declared in this graph
    pub fn call_function(&mut self, function: NodeId, args: &[Arg], line: u32) -> NodeId {
        let name = self.graph[NodeIndex::new(function.index())].name.clone();
        let code = format!("{}({});", name, Self::render_args(args));
        let call = self.call_node(&name, None, code, args, line);
        self.edge(call, function, EdgeKind::Invokes);
        let arg_nodes: Vec<(usize, NodeId)> = self
            .graph
            .edges(NodeIndex::new(call.index()))
            .filter_map(|e| match e.weight() {
                EdgeKind::Argument(pos) => {
                    Some((*pos as usize, NodeId(e.target().index() as u32)))
                }
                _ => None,
            })
            .collect();
        for (pos, arg) in arg_nodes {
            self.pending_params.push((arg, function, pos));
        }
        self.append(call);
        call
    }

    /// `target = value;`
    pub fn assign(&mut self, target: &str, value: Arg, line: u32) -> NodeId {
        let source = self.expression(&value, line);
        let code = format!("{} = {};", target, value);
        let stmt = self.add(NodeKind::Statement, "=", code, Some(line));
        self.edge(source, stmt, EdgeKind::Dfg);
        if let Some(&decl) = self.scope.get(target) {
            self.edge(stmt, decl, EdgeKind::Dfg);
        }
        self.append(stmt);
        stmt
    }

    /// Declaration or parameter visible under `name`
    pub fn lookup(&self, name: &str) -> Option<NodeId> {
        self.scope.get(name).copied()
    }

    /// Current EOG frontier
    pub fn cursor(&self) -> Vec<NodeId> {
        self.frontier.clone()
    }

    /// Continue after `frontier` (start of another branch)
    pub fn set_cursor(&mut self, frontier: Vec<NodeId>) {
        self.frontier = frontier;
    }

    /// Merge another branch's frontier into the current one
    pub fn join(&mut self, other: Vec<NodeId>) {
        self.frontier.extend(other);
        self.frontier.sort();
        self.frontier.dedup();
    }

    /// Control-flow edge from every frontier node to `target` (loop back edge)
    pub fn loop_to(&mut self, target: NodeId) {
        for from in self.frontier.clone() {
            self.edge(from, target, EdgeKind::Eog);
        }
    }

    pub fn finish(mut self) -> InMemoryGraph {
        let pending = std::mem::take(&mut self.pending_params);
        for (arg, function, pos) in pending {
            let param = self
                .graph
                .edges(NodeIndex::new(function.index()))
                .find(|e| *e.weight() == EdgeKind::Parameter(pos as u32))
                .map(|e| e.target());
            if let Some(param) = param {
                self.edge(arg, NodeId(param.index() as u32), EdgeKind::Dfg);
            }
        }
        InMemoryGraph::from_parts(self.graph, self.enclosing)
    }
}
