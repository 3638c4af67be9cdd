/*
 * Expression Evaluator
 *
 * Evaluates one rule's expressions under an instance context. Every
 * expression yields a set of results, one per variable combination.
 *
 * # Lazy expansion
 * Markvars are bound where they are first needed: a comparison (or a bare
 * operand) expands its own new markvars over the incoming context, so each
 * branch of an and/or only multiplies the combinations it actually uses.
 *
 * # Short-circuit
 * and/or evaluate the right branch once per left result that does not decide
 * the outcome, under that result's context.
 *
 * # Orders
 * Checked by the typestate strategy once per (order, instance) within the
 * rule; violations are reported as findings right away and the results carry
 * `finding_already_added`.
 */

use super::run_context::RunContext;
use super::variable_binder::VariableBinder;
use crate::features::mark_evaluation::domain::{
    EvalResult, EvalValue, EvaluationError, Finding, FindingDetail, Instance, InstanceContext,
    VariableContext,
};
use crate::features::rule_model::{ComparisonOp, Expression, LogicalOp, OrderExpression, Rule};
use crate::features::typestate::{TypestateOutcome, TypestateQuery, TypestateViolation, ViolationKind};
use crate::shared::models::NodeId;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, error};

pub(crate) struct ExpressionEvaluator<'r, 'g> {
    run: &'r RunContext<'g>,
    rule: &'r Rule,
    variables: VariableBinder<'r, 'g>,

    /// (rendered order, instance) → outcome
    verdicts: Mutex<FxHashMap<(String, NodeId), Arc<TypestateOutcome>>>,
}

impl<'r, 'g> ExpressionEvaluator<'r, 'g> {
    pub fn new(run: &'r RunContext<'g>, rule: &'r Rule) -> Self {
        Self {
            run,
            rule,
            variables: VariableBinder::new(run),
            verdicts: Mutex::new(FxHashMap::default()),
        }
    }

    pub fn evaluate(
        &self,
        expr: &Expression,
        instances: &InstanceContext,
        context: &Arc<VariableContext>,
    ) -> Vec<EvalResult> {
        match expr {
            Expression::Not(inner) => self.evaluate_not(inner, instances, context),
            Expression::Logical { op, left, right } => {
                self.evaluate_logical(*op, left, right, instances, context)
            }
            _ => {
                let vars = expr.vars();
                let contexts = match self.variables.expand(self.rule, &vars, instances, context) {
                    Ok(contexts) => contexts,
                    Err(e) => {
                        error!("{}: {}", self.rule.name, e);
                        return Vec::new();
                    }
                };
                contexts
                    .iter()
                    .flat_map(|ctx| self.evaluate_bound(expr, instances, ctx))
                    .collect()
            }
        }
    }

    /// Boolean value of a result; logs and yields `None` otherwise
    pub fn expect_bool(&self, result: &EvalResult, expr: &Expression) -> Option<bool> {
        let value = result.value.as_bool();
        if value.is_none() {
            error!(
                "{}: {}",
                self.rule.name,
                EvaluationError::type_mismatch("boolean", result.value.type_name(), expr)
            );
        }
        value
    }

    /// Evaluation with all markvars of `expr` bound in `context`
    fn evaluate_bound(
        &self,
        expr: &Expression,
        instances: &InstanceContext,
        context: &Arc<VariableContext>,
    ) -> Vec<EvalResult> {
        match expr {
            Expression::Literal(value) => {
                vec![EvalResult::new(EvalValue::from(value), Arc::clone(context))]
            }
            Expression::List(values) => vec![EvalResult::new(
                EvalValue::List(values.iter().map(EvalValue::from).collect()),
                Arc::clone(context),
            )],
            Expression::Operand(var) => match context.get(var) {
                Some(binding) => vec![EvalResult::new(binding.value.clone(), Arc::clone(context))
                    .with_responsible(binding.origins.iter().copied())],
                None => {
                    debug!("{}: {} is unbound", self.rule.name, var);
                    Vec::new()
                }
            },
            Expression::Comparison { op, left, right } => {
                self.evaluate_comparison(*op, left, right, instances, context)
            }
            Expression::Order(order) => self.evaluate_order(order, instances, context),
            Expression::Not(_) | Expression::Logical { .. } => {
                self.evaluate(expr, instances, context)
            }
        }
    }

    fn evaluate_not(
        &self,
        inner: &Expression,
        instances: &InstanceContext,
        context: &Arc<VariableContext>,
    ) -> Vec<EvalResult> {
        self.evaluate(inner, instances, context)
            .into_iter()
            .filter_map(|result| {
                let value = self.expect_bool(&result, inner)?;
                Some(EvalResult {
                    value: EvalValue::Bool(!value),
                    ..result
                })
            })
            .collect()
    }

    fn evaluate_logical(
        &self,
        op: LogicalOp,
        left: &Expression,
        right: &Expression,
        instances: &InstanceContext,
        context: &Arc<VariableContext>,
    ) -> Vec<EvalResult> {
        let mut out = Vec::new();
        for l in self.evaluate(left, instances, context) {
            let Some(lv) = self.expect_bool(&l, left) else {
                continue;
            };
            let decided = match op {
                LogicalOp::And => !lv,
                LogicalOp::Or => lv,
            };
            if decided {
                out.push(l);
                continue;
            }
            for r in self.evaluate(right, instances, &l.context) {
                let Some(rv) = self.expect_bool(&r, right) else {
                    continue;
                };
                let finding_added = l.finding_already_added || r.finding_already_added;
                out.push(
                    EvalResult::new(EvalValue::Bool(rv), Arc::clone(&r.context))
                        .with_responsible(l.responsible.iter().chain(&r.responsible).copied())
                        .with_finding_added(finding_added),
                );
            }
        }
        out
    }

    fn evaluate_comparison(
        &self,
        op: ComparisonOp,
        left: &Expression,
        right: &Expression,
        instances: &InstanceContext,
        context: &Arc<VariableContext>,
    ) -> Vec<EvalResult> {
        let mut out = Vec::new();
        for l in self.evaluate(left, instances, context) {
            for r in self.evaluate(right, instances, &l.context) {
                match compare(op, &l.value, &r.value) {
                    Ok(value) => out.push(
                        EvalResult::new(EvalValue::Bool(value), Arc::clone(&r.context))
                            .with_responsible(l.responsible.iter().chain(&r.responsible).copied()),
                    ),
                    Err(e) => error!("{}: {}", self.rule.name, e),
                }
            }
        }
        out
    }

    fn evaluate_order(
        &self,
        order: &OrderExpression,
        instances: &InstanceContext,
        context: &Arc<VariableContext>,
    ) -> Vec<EvalResult> {
        let alias = match order.base_alias() {
            Ok(alias) => alias,
            Err(source) => {
                error!(
                    "{}",
                    EvaluationError::InvalidOrder {
                        rule: self.rule.name.clone(),
                        source,
                    }
                );
                return Vec::new();
            }
        };
        let Some(instance) = instances.get(alias) else {
            error!("{}: {}", self.rule.name, EvaluationError::UnknownAlias(alias.to_string()));
            return Vec::new();
        };
        let Some(outcome) = self.order_verdict(order, alias, instance) else {
            return Vec::new();
        };

        let legal = outcome.is_legal();
        vec![EvalResult::new(EvalValue::Bool(legal), Arc::clone(context))
            .with_responsible(outcome.violations.iter().map(|v| v.node))
            .with_finding_added(!legal)]
    }

    fn order_verdict(
        &self,
        order: &OrderExpression,
        alias: &str,
        instance: Instance,
    ) -> Option<Arc<TypestateOutcome>> {
        let key = (order.to_string(), instance.node);
        let mut verdicts = self.verdicts.lock();
        if let Some(outcome) = verdicts.get(&key) {
            return Some(Arc::clone(outcome));
        }

        let automaton = match self.run.automata.get_or_compile(order) {
            Ok(automaton) => automaton,
            Err(source) => {
                error!(
                    "{}",
                    EvaluationError::InvalidOrder {
                        rule: self.rule.name.clone(),
                        source,
                    }
                );
                return None;
            }
        };
        let Some(entity) = self.rule.entity_for(alias) else {
            error!("{}: {}", self.rule.name, EvaluationError::UnknownAlias(alias.to_string()));
            return None;
        };

        let labels = self.run.bindings.label_index(entity, &automaton.alphabet());
        let outcome = Arc::new(self.run.strategy.check(&TypestateQuery {
            graph: self.run.graph,
            automaton: &automaton,
            instance: instance.node,
            labels: &labels,
        }));
        debug!(
            "{}: order {} on {}: {} violations",
            self.rule.name,
            key.0,
            instance.node,
            outcome.violations.len()
        );

        for violation in &outcome.violations {
            self.report_violation(violation);
        }
        verdicts.insert(key, Arc::clone(&outcome));
        Some(outcome)
    }

    fn report_violation(&self, violation: &TypestateViolation) {
        let graph = self.run.graph;
        let code = graph.code(violation.node);
        let detail = match violation.kind {
            ViolationKind::IllegalTransition => FindingDetail::OrderViolation {
                code,
                operation: violation.operation.clone().unwrap_or_default(),
                expected: violation.expected.clone(),
            },
            ViolationKind::NotTerminated => FindingDetail::NotTerminated {
                code,
                expected: violation.expected.clone(),
            },
        };
        let (file, ranges) = match graph.source_range(violation.node) {
            Some((file, span)) => (file, vec![span]),
            None => (String::new(), Vec::new()),
        };
        self.run.aggregator.add(Finding::new(
            &self.rule.name,
            detail,
            &self.rule.fail,
            file,
            ranges,
        ));
    }
}

fn compare(op: ComparisonOp, left: &EvalValue, right: &EvalValue) -> Result<bool, EvaluationError> {
    let incomparable = || EvaluationError::Incomparable {
        op: op.to_string(),
        left: left.to_string(),
        right: right.to_string(),
    };
    match op {
        ComparisonOp::Eq => Ok(left.equals(right)),
        ComparisonOp::Ne => Ok(!left.equals(right)),
        ComparisonOp::In => match right {
            EvalValue::List(items) => Ok(items.iter().any(|item| left.equals(item))),
            _ => Err(incomparable()),
        },
        ComparisonOp::Lt | ComparisonOp::Le | ComparisonOp::Gt | ComparisonOp::Ge => {
            let ordering = left.compare(right).ok_or_else(incomparable)?;
            Ok(match op {
                ComparisonOp::Lt => ordering == Ordering::Less,
                ComparisonOp::Le => ordering != Ordering::Greater,
                ComparisonOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            })
        }
    }
}
