/*
 * Evaluator
 *
 * One evaluation pass:
 *   connect → bind call sites (barrier) → forbidden calls
 *     → rules (rayon pool or sequential) → sorted findings + stats
 *
 * The graph connection is held for the whole pass and released when the
 * pass ends, on error paths included.
 */

use super::call_site_binder::CallSiteBinder;
use super::expression_evaluator::ExpressionEvaluator;
use super::forbidden::report_forbidden_calls;
use super::instance_resolver::InstanceResolver;
use super::run_context::RunContext;
use super::stats::EvaluationStats;
use crate::config::EvaluationConfig;
use crate::errors::Result;
use crate::features::mark_evaluation::domain::{Finding, FindingDetail, VariableContext};
use crate::features::rule_model::{MarkModel, Rule};
use crate::features::typestate::{strategy_for, TypestateMode, TypestateStrategy};
use crate::shared::models::NodeId;
use crate::shared::ports::{GraphAccess, GraphSource};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Outcome of one evaluation pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub mode: TypestateMode,

    /// Deduplicated, sorted by file, line and rule
    pub findings: Vec<Finding>,

    pub stats: EvaluationStats,
}

impl EvaluationReport {
    /// Findings of one rule
    pub fn findings_for<'a>(&'a self, rule: &'a str) -> impl Iterator<Item = &'a Finding> + 'a {
        self.findings.iter().filter(move |f| f.rule == rule)
    }

    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// MARK rule evaluator
pub struct Evaluator {
    model: Arc<MarkModel>,
    config: EvaluationConfig,
    strategy: Arc<dyn TypestateStrategy>,
}

impl Evaluator {
    pub fn new(model: Arc<MarkModel>, config: EvaluationConfig) -> Self {
        let strategy = strategy_for(config.typestate_mode);
        Self {
            model,
            config,
            strategy,
        }
    }

    /// Replace the typestate strategy selected by the configuration
    pub fn with_strategy(mut self, strategy: Arc<dyn TypestateStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn model(&self) -> &MarkModel {
        &self.model
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Evaluate all rules against the graph behind `source`
    ///
    /// # Errors
    /// Invalid configuration, failure to connect, or failure to create the
    /// worker pool. Problems inside single rules are logged, never returned.
    pub fn evaluate(&self, source: &dyn GraphSource) -> Result<EvaluationReport> {
        self.config.validate()?;
        let start = Instant::now();

        let connection = source.connect()?;
        info!(
            "Evaluating {} rules on '{}' ({} mode)",
            self.model.rules().len(),
            connection.label(),
            self.strategy.mode()
        );

        let graph: &dyn GraphAccess = &*connection;
        let report = if self.config.parallel {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.effective_threads())
                .build()?;
            pool.install(|| self.run(graph))
        } else {
            self.run(graph)
        };

        info!(
            "Evaluation finished in {:?}: {} findings",
            start.elapsed(),
            report.findings.len()
        );
        Ok(report)
    }

    fn run(&self, graph: &dyn GraphAccess) -> EvaluationReport {
        let parallel = self.config.parallel;
        let bindings = CallSiteBinder::new(graph).bind(&self.model, parallel);
        let run = RunContext::new(graph, &self.model, self.strategy.as_ref(), bindings);

        if self.config.report_forbidden {
            let forbidden = report_forbidden_calls(&run);
            run.stats.add_forbidden_calls(forbidden);
        }

        if parallel {
            self.model
                .rules()
                .par_iter()
                .for_each(|rule| evaluate_rule(&run, rule));
        } else {
            for rule in self.model.rules() {
                evaluate_rule(&run, rule);
            }
        }

        let RunContext {
            aggregator, stats, ..
        } = run;
        let findings = aggregator.into_sorted();
        let stats = stats.snapshot(findings.len());
        info!(
            "{} rules, {} instance contexts, {} results, {} skipped references, {} forbidden calls, {} findings",
            stats.rules_evaluated,
            stats.instance_contexts,
            stats.results,
            stats.skipped_references,
            stats.forbidden_calls,
            stats.findings
        );

        EvaluationReport {
            mode: self.strategy.mode(),
            findings,
            stats,
        }
    }
}

/// Evaluate one rule over all its instance contexts
fn evaluate_rule(run: &RunContext<'_>, rule: &Rule) {
    debug!("Evaluating rule {}", rule.name);
    run.stats.rule_evaluated();

    let contexts = InstanceResolver::new(run).contexts(rule);
    run.stats.add_instance_contexts(contexts.len());
    if contexts.is_empty() {
        debug!("Rule {} has no instances, nothing to check", rule.name);
        return;
    }

    let evaluator = ExpressionEvaluator::new(run, rule);
    let mut results = 0;
    for instances in &contexts {
        let root = Arc::new(VariableContext::root());
        let seeds: Vec<Arc<VariableContext>> = match &rule.when {
            None => vec![root],
            Some(when) => evaluator
                .evaluate(when, instances, &root)
                .into_iter()
                .filter(|r| evaluator.expect_bool(r, when) == Some(true))
                .map(|r| r.context)
                .collect(),
        };

        for seed in &seeds {
            for result in evaluator.evaluate(&rule.ensure, instances, seed) {
                results += 1;
                if evaluator.expect_bool(&result, &rule.ensure) == Some(false)
                    && !result.finding_already_added
                {
                    report_rule_violation(run, rule, &result.responsible);
                }
            }
        }
    }

    if results == 0 {
        warn!("Unable to evaluate rule {}: no results", rule.name);
    }
    run.stats.add_results(results);
    debug!(
        "Rule {}: {} results over {} instance contexts",
        rule.name,
        results,
        contexts.len()
    );
}

fn report_rule_violation(run: &RunContext<'_>, rule: &Rule, responsible: &[NodeId]) {
    let ranges = responsible
        .iter()
        .filter_map(|&n| run.graph.source_range(n).map(|(_, span)| span))
        .collect();
    run.aggregator.add(Finding::new(
        &rule.name,
        FindingDetail::RuleViolation,
        &rule.fail,
        run.file_of(responsible),
        ranges,
    ));
}
