//! Rule models and program graphs
//!
//! The `Botan` entity models a block cipher with the lifecycle
//! `create, init, (start, finish)+, reset?`.

use codegraph_mark::features::rule_model::{
    CallPattern, ComparisonOp, Entity, Expression, MarkModel, OpStatement, Operation,
    OrderExpression, Rule,
};
use codegraph_mark::features::program_graph::{Arg, InMemoryGraph, ProgramGraphBuilder};
use codegraph_mark::shared::models::NodeId;
use std::sync::Arc;

/// Operation backed by a single `name(*)` pattern
fn any_args(name: &str) -> Operation {
    Operation::with_calls(name, vec![CallPattern::parse(name, &["*"]).unwrap()])
}

pub fn botan_entity() -> Entity {
    Entity::new("Botan")
        .with_op(any_args("create"))
        .with_op(any_args("init"))
        .with_op(any_args("start"))
        .with_op(any_args("finish"))
        .with_op(any_args("reset"))
        .with_op(Operation::new(
            "set_key",
            vec![
                OpStatement::new(CallPattern::parse("set_key", &["_"]).unwrap()),
                OpStatement::forbidden(CallPattern::parse("set_key", &["_", "_"]).unwrap()),
            ],
        ))
}

/// `cm.create(), cm.init(), (cm.start(), cm.finish())+, cm.reset()?`
pub fn cipher_order() -> OrderExpression {
    let op = |name: &str| OrderExpression::op("cm", name);
    OrderExpression::seq(vec![
        op("create"),
        op("init"),
        OrderExpression::one_or_more(OrderExpression::seq(vec![op("start"), op("finish")])),
        OrderExpression::optional(op("reset")),
    ])
}

pub fn cipher_mode_rule() -> Rule {
    Rule::new("CipherMode", Expression::order(cipher_order()))
        .using("Botan", "cm")
        .fail("WrongUse")
}

pub fn cipher_mode_model() -> Arc<MarkModel> {
    Arc::new(MarkModel::new(vec![botan_entity()], vec![cipher_mode_rule()]))
}

/// Key generator: `init(algorithm, size)`
pub fn keygen_entity() -> Entity {
    Entity::new("KeyGen")
        .with_var("algorithm")
        .with_var("size")
        .with_op(Operation::with_calls(
            "init",
            vec![CallPattern::parse("init", &["algorithm", "size"]).unwrap()],
        ))
}

/// `when kg.algorithm == "AES" ensure kg.size >= 128`
pub fn key_length_model() -> Arc<MarkModel> {
    let rule = Rule::new(
        "KeyLength",
        Expression::compare(
            ComparisonOp::Ge,
            Expression::operand("kg.size"),
            Expression::literal(128i64),
        ),
    )
    .using("KeyGen", "kg")
    .when(Expression::eq(
        Expression::operand("kg.algorithm"),
        Expression::literal("AES"),
    ))
    .fail("ShortKey");
    Arc::new(MarkModel::new(vec![keygen_entity()], vec![rule]))
}

/// Call sequence on `name` in straight-line code, one call per line from `first_line`
pub fn straight_line(builder: &mut ProgramGraphBuilder, name: &str, ops: &[&str], first_line: u32) -> Vec<NodeId> {
    ops.iter()
        .enumerate()
        .map(|(i, op)| builder.call_on(name, op, None, &[], first_line + i as u32))
        .collect()
}

/// `p5.init();` on line 12 without `create`
pub fn p5_graph() -> (InMemoryGraph, NodeId) {
    let mut b = ProgramGraphBuilder::new("Main.java");
    b.function("main", 10);
    b.declare("p5", "Botan", 11);
    let init = b.call_on("p5", "init", None, &[], 12);
    (b.finish(), init)
}

/// `create, init, start`, then `reset()` on one branch, then `create()`
///
/// Returns (graph, reset call, create call after the join).
pub fn p6_graph() -> (InMemoryGraph, NodeId, NodeId) {
    let mut b = ProgramGraphBuilder::new("Main.java");
    b.function("main", 20);
    b.declare("p6", "Botan", 21);
    straight_line(&mut b, "p6", &["create", "init", "start"], 22);
    let fork = b.cursor();
    let reset = b.call_on("p6", "reset", None, &[], 26);
    b.join(fork);
    let create = b.call_on("p6", "create", None, &[], 28);
    (b.finish(), reset, create)
}

/// Complete lifecycle: create, init, start, finish, start, finish, reset
pub fn legal_graph() -> InMemoryGraph {
    let mut b = ProgramGraphBuilder::new("Main.java");
    b.function("main", 1);
    b.declare("p", "Botan", 2);
    straight_line(
        &mut b,
        "p",
        &["create", "init", "start", "finish", "start", "finish", "reset"],
        3,
    );
    b.finish()
}

/// Lifecycle split across `main` and a helper receiving the object
///
/// ```text
/// void setup(Botan c) { c.init(); c.start(); }
/// void main() { Botan p; p.create(); setup(p); p.finish(); }
/// ```
pub fn helper_graph() -> InMemoryGraph {
    let mut b = ProgramGraphBuilder::new("Main.java");
    let helper = b.function("setup", 20);
    b.param("c", "Botan");
    straight_line(&mut b, "c", &["init", "start"], 21);

    b.function("main", 1);
    b.declare("p", "Botan", 2);
    b.call_on("p", "create", None, &[], 3);
    b.call_function(helper, &[Arg::var("p")], 4);
    b.call_on("p", "finish", None, &[], 5);
    b.finish()
}

/// One helper shared by two objects
///
/// ```text
/// void setup(Botan c) { c.init(); c.start(); }
/// void main() {
///     Botan p; p.create(); setup(p); p.finish();
///     Botan q; q.create(); setup(q); q.finish();   // q.finish() only if `finish_q`
/// }
/// ```
pub fn shared_helper_graph(finish_q: bool) -> InMemoryGraph {
    let mut b = ProgramGraphBuilder::new("Main.java");
    let helper = b.function("setup", 20);
    b.param("c", "Botan");
    straight_line(&mut b, "c", &["init", "start"], 21);

    b.function("main", 1);
    b.declare("p", "Botan", 2);
    b.call_on("p", "create", None, &[], 3);
    b.call_function(helper, &[Arg::var("p")], 4);
    b.call_on("p", "finish", None, &[], 5);
    b.declare("q", "Botan", 6);
    b.call_on("q", "create", None, &[], 7);
    b.call_function(helper, &[Arg::var("q")], 8);
    if finish_q {
        b.call_on("q", "finish", None, &[], 9);
    }
    b.finish()
}

/// One object passed through two helpers
///
/// ```text
/// void setup(Botan c) { c.init(); }
/// void run(Botan d) { d.start(); d.finish(); }
/// void main() { Botan p; p.create(); setup(p); run(p); }
/// ```
pub fn two_helpers_graph() -> InMemoryGraph {
    let mut b = ProgramGraphBuilder::new("Main.java");
    let setup = b.function("setup", 20);
    b.param("c", "Botan");
    b.call_on("c", "init", None, &[], 21);

    let run = b.function("run", 30);
    b.param("d", "Botan");
    straight_line(&mut b, "d", &["start", "finish"], 31);

    b.function("main", 1);
    b.declare("p", "Botan", 2);
    b.call_on("p", "create", None, &[], 3);
    b.call_function(setup, &[Arg::var("p")], 4);
    b.call_function(run, &[Arg::var("p")], 5);
    b.finish()
}

/// One key generator initialized twice: algorithms {AES, Blowfish} × sizes {128, 256}
pub fn keygen_fan_out_graph() -> InMemoryGraph {
    let mut b = ProgramGraphBuilder::new("Main.java");
    b.function("main", 1);
    b.declare("kg", "KeyGen", 2);
    b.call_on("kg", "init", None, &[Arg::lit("AES"), Arg::lit(128i64)], 3);
    b.call_on("kg", "init", None, &[Arg::lit("Blowfish"), Arg::lit(256i64)], 4);
    b.finish()
}
