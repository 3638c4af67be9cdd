//! Recoverable evaluation errors
//!
//! Raised while evaluating one rule; logged with `tracing::error!` and the
//! affected result is excluded. They never abort a pass.

use crate::features::rule_model::OrderError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    #[error("Result is of type {found}, expected {expected} in '{expression}'")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
        expression: String,
    },

    #[error("Cannot compare {left} with {right} using '{op}'")]
    Incomparable {
        op: String,
        left: String,
        right: String,
    },

    #[error("Alias '{0}' is not bound by the rule")]
    UnknownAlias(String),

    #[error("Entity '{0}' is not part of the model")]
    UnknownEntity(String),

    #[error("Markvar '{0}' must have the form alias.field")]
    MalformedMarkvar(String),

    #[error("Invalid order in rule '{rule}': {source}")]
    InvalidOrder {
        rule: String,
        #[source]
        source: OrderError,
    },
}

impl EvaluationError {
    pub fn type_mismatch(expected: &'static str, found: &'static str, expression: impl ToString) -> Self {
        EvaluationError::TypeMismatch {
            expected,
            found,
            expression: expression.to_string(),
        }
    }
}
