/*
 * MARK Evaluation Domain
 *
 * Ephemeral, immutable evaluation values: instance and variable contexts,
 * evaluation results, findings.
 */

mod context;
mod error;
mod finding;
mod result;

pub use context::{Binding, Instance, InstanceContext, InstanceId, InstanceInterner, VariableContext};
pub use error::EvaluationError;
pub use finding::{Finding, FindingDetail};
pub use result::{EvalResult, EvalValue};
