/*
 * MARK Evaluation
 *
 * Evaluates the rules of a MARK model against a program graph and reports
 * findings.
 *
 * Architecture:
 * - Domain: instance/variable contexts, evaluation values, findings, errors
 * - Application: binder → resolver → expression evaluator → aggregator,
 *   driven by `Evaluator`
 *
 * Typestate checking (orders) is delegated to `features::typestate` through
 * the `TypestateStrategy` port.
 */

pub mod application;
pub mod domain;

pub use application::{
    BoundOperation, CallSiteBinder, EvaluationReport, EvaluationStats, Evaluator,
    FindingAggregator, OpBindings, OpKey,
};
pub use domain::{
    Binding, EvalResult, EvalValue, EvaluationError, Finding, FindingDetail, Instance,
    InstanceContext, InstanceId, InstanceInterner, VariableContext,
};
