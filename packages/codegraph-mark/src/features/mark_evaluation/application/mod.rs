/*
 * MARK Evaluation Application Layer
 *
 * - call_site_binder     : op statements → call sites (per-pass barrier)
 * - instance_resolver    : aliases → canonical instances → instance contexts
 * - variable_binder      : markvars → candidate values
 * - expression_evaluator : when/ensure trees, orders via typestate
 * - forbidden            : forbidden op statements
 * - aggregator / stats   : run-scoped sinks
 * - evaluator            : the pass itself
 */

mod aggregator;
mod call_site_binder;
mod evaluator;
mod expression_evaluator;
mod forbidden;
mod instance_resolver;
mod run_context;
mod stats;
mod variable_binder;

pub use aggregator::FindingAggregator;
pub use call_site_binder::{BoundOperation, CallSiteBinder, OpBindings, OpKey};
pub use evaluator::{EvaluationReport, Evaluator};
pub use stats::EvaluationStats;
