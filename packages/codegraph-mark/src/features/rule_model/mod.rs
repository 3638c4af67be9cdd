/*
 * MARK Rule Model
 *
 * In-memory form of a parsed MARK rule set:
 * - Entities with fields (vars) and operations
 * - Operations backed by call patterns (optionally forbidden)
 * - Rules: using / when / ensure / fail
 * - Expressions: closed enum incl. order grammars
 *
 * The model is immutable once loaded and shared read-only by every rule
 * evaluation of a pass.
 */

pub mod domain;
pub mod infrastructure;

pub use domain::{
    AliasedEntity, CallPattern, ComparisonOp, Entity, Expression, LogicalOp, MarkModel,
    OpStatement, Operation, OrderError, OrderExpression, Param, ParamParseError, Repetition, Rule,
};
pub use infrastructure::MarkModelLoader;
