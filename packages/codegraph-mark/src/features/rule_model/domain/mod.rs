/*
 * Rule Model Domain
 */

mod entity;
mod expression;
mod model;
mod rule;

pub use entity::{CallPattern, Entity, OpStatement, Operation, Param, ParamParseError};
pub use expression::{
    ComparisonOp, Expression, LogicalOp, OrderError, OrderExpression, Repetition,
};
pub use model::MarkModel;
pub use rule::{AliasedEntity, Rule};
