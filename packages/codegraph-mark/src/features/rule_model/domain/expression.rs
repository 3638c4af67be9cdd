/*
 * Rule Expressions
 *
 * Closed expression tree evaluated by an exhaustive match:
 *   literal | list | operand (markvar) | not | and/or | comparison | order
 *
 * Order expressions are regular grammars over operation labels:
 * ```text
 * order cm.create(), cm.init(), (cm.start(), cm.process()*, cm.finish())+, cm.reset()?
 * ```
 */

use crate::shared::models::ConstValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Boolean connective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalOp {
    And,
    Or,
}

/// Relational operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// Membership in a list
    In,
}

impl std::fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ComparisonOp::Eq => "==",
            ComparisonOp::Ne => "!=",
            ComparisonOp::Lt => "<",
            ComparisonOp::Le => "<=",
            ComparisonOp::Gt => ">",
            ComparisonOp::Ge => ">=",
            ComparisonOp::In => "in",
        };
        write!(f, "{}", s)
    }
}

/// Rule expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expression {
    Literal(ConstValue),
    List(Vec<ConstValue>),
    /// Markvar reference `alias.field`
    Operand(String),
    Not(Box<Expression>),
    Logical {
        op: LogicalOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Comparison {
        op: ComparisonOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Order(OrderExpression),
}

impl Expression {
    pub fn literal(value: impl Into<ConstValue>) -> Self {
        Expression::Literal(value.into())
    }

    pub fn list(values: Vec<ConstValue>) -> Self {
        Expression::List(values)
    }

    pub fn operand(markvar: impl Into<String>) -> Self {
        Expression::Operand(markvar.into())
    }

    pub fn not(inner: Expression) -> Self {
        Expression::Not(Box::new(inner))
    }

    pub fn and(left: Expression, right: Expression) -> Self {
        Expression::Logical {
            op: LogicalOp::And,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn or(left: Expression, right: Expression) -> Self {
        Expression::Logical {
            op: LogicalOp::Or,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn compare(op: ComparisonOp, left: Expression, right: Expression) -> Self {
        Expression::Comparison {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn eq(left: Expression, right: Expression) -> Self {
        Self::compare(ComparisonOp::Eq, left, right)
    }

    pub fn order(order: OrderExpression) -> Self {
        Expression::Order(order)
    }

    /// Collect all markvars referenced by this expression
    pub fn collect_vars(&self, out: &mut BTreeSet<String>) {
        match self {
            Expression::Operand(var) => {
                out.insert(var.clone());
            }
            Expression::Not(inner) => inner.collect_vars(out),
            Expression::Logical { left, right, .. } | Expression::Comparison { left, right, .. } => {
                left.collect_vars(out);
                right.collect_vars(out);
            }
            Expression::Literal(_) | Expression::List(_) | Expression::Order(_) => {}
        }
    }

    pub fn vars(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_vars(&mut out);
        out
    }

    /// All order sub-expressions, in pre-order
    pub fn orders(&self) -> Vec<&OrderExpression> {
        let mut out = Vec::new();
        self.collect_orders(&mut out);
        out
    }

    fn collect_orders<'a>(&'a self, out: &mut Vec<&'a OrderExpression>) {
        match self {
            Expression::Order(order) => out.push(order),
            Expression::Not(inner) => inner.collect_orders(out),
            Expression::Logical { left, right, .. } | Expression::Comparison { left, right, .. } => {
                left.collect_orders(out);
                right.collect_orders(out);
            }
            Expression::Literal(_) | Expression::List(_) | Expression::Operand(_) => {}
        }
    }
}

impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expression::Literal(v) => write!(f, "{}", v),
            Expression::List(values) => {
                let items: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", items.join(", "))
            }
            Expression::Operand(var) => write!(f, "{}", var),
            Expression::Not(inner) => write!(f, "!({})", inner),
            Expression::Logical { op, left, right } => {
                let op = match op {
                    LogicalOp::And => "&&",
                    LogicalOp::Or => "||",
                };
                write!(f, "({} {} {})", left, op, right)
            }
            Expression::Comparison { op, left, right } => write!(f, "{} {} {}", left, op, right),
            Expression::Order(order) => write!(f, "order {}", order),
        }
    }
}

/// Repetition operator of an order group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Repetition {
    /// `?`
    Optional,
    /// `*`
    ZeroOrMore,
    /// `+`
    OneOrMore,
}

/// Order grammar over operation labels
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderExpression {
    /// Terminal `alias.op()`
    Op { alias: String, op: String },
    Sequence(Vec<OrderExpression>),
    Alternative(Vec<OrderExpression>),
    Repeat {
        inner: Box<OrderExpression>,
        repetition: Repetition,
    },
}

/// Malformed order grammar
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("order expression contains no operation")]
    Empty,

    #[error("order expression mixes aliases '{first}' and '{other}'")]
    MixedAliases { first: String, other: String },
}

impl OrderExpression {
    pub fn op(alias: impl Into<String>, op: impl Into<String>) -> Self {
        OrderExpression::Op {
            alias: alias.into(),
            op: op.into(),
        }
    }

    pub fn seq(items: Vec<OrderExpression>) -> Self {
        OrderExpression::Sequence(items)
    }

    pub fn alt(items: Vec<OrderExpression>) -> Self {
        OrderExpression::Alternative(items)
    }

    pub fn optional(inner: OrderExpression) -> Self {
        Self::repeat(inner, Repetition::Optional)
    }

    pub fn zero_or_more(inner: OrderExpression) -> Self {
        Self::repeat(inner, Repetition::ZeroOrMore)
    }

    pub fn one_or_more(inner: OrderExpression) -> Self {
        Self::repeat(inner, Repetition::OneOrMore)
    }

    fn repeat(inner: OrderExpression, repetition: Repetition) -> Self {
        OrderExpression::Repeat {
            inner: Box::new(inner),
            repetition,
        }
    }

    fn for_each_terminal<'a>(&'a self, f: &mut impl FnMut(&'a str, &'a str)) {
        match self {
            OrderExpression::Op { alias, op } => f(alias, op),
            OrderExpression::Sequence(items) | OrderExpression::Alternative(items) => {
                for item in items {
                    item.for_each_terminal(f);
                }
            }
            OrderExpression::Repeat { inner, .. } => inner.for_each_terminal(f),
        }
    }

    /// The single alias all terminals are called on
    pub fn base_alias(&self) -> Result<&str, OrderError> {
        let mut base: Option<&str> = None;
        let mut mixed: Option<OrderError> = None;
        self.for_each_terminal(&mut |alias, _| match base {
            None => base = Some(alias),
            Some(first) if first != alias && mixed.is_none() => {
                mixed = Some(OrderError::MixedAliases {
                    first: first.to_string(),
                    other: alias.to_string(),
                })
            }
            _ => {}
        });
        match (mixed, base) {
            (Some(err), _) => Err(err),
            (None, Some(alias)) => Ok(alias),
            (None, None) => Err(OrderError::Empty),
        }
    }

    /// Operation labels appearing in the grammar
    pub fn labels(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.for_each_terminal(&mut |_, op| {
            out.insert(op.to_string());
        });
        out
    }
}

impl std::fmt::Display for OrderExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderExpression::Op { alias, op } => write!(f, "{}.{}()", alias, op),
            OrderExpression::Sequence(items) => {
                let parts: Vec<String> = items.iter().map(|i| i.to_string()).collect();
                write!(f, "{}", parts.join(", "))
            }
            OrderExpression::Alternative(items) => {
                let parts: Vec<String> = items.iter().map(|i| i.to_string()).collect();
                write!(f, "({})", parts.join(" | "))
            }
            OrderExpression::Repeat { inner, repetition } => {
                let suffix = match repetition {
                    Repetition::Optional => "?",
                    Repetition::ZeroOrMore => "*",
                    Repetition::OneOrMore => "+",
                };
                write!(f, "({}){}", inner, suffix)
            }
        }
    }
}
