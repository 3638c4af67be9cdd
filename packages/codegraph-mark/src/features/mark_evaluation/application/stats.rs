/*
 * Evaluation Statistics
 *
 * Lock-free counters shared by all rule evaluations of a pass; a snapshot is
 * logged at the end of the pass and returned with the report.
 */

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counter snapshot of one pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationStats {
    pub rules_evaluated: usize,
    pub instance_contexts: usize,
    pub results: usize,

    /// Call sites whose object could not be resolved
    pub skipped_references: usize,

    /// Calls matching a forbidden op statement
    pub forbidden_calls: usize,

    pub findings: usize,
}

#[derive(Debug, Default)]
pub(crate) struct StatsCollector {
    rules_evaluated: AtomicUsize,
    instance_contexts: AtomicUsize,
    results: AtomicUsize,
    skipped_references: AtomicUsize,
    forbidden_calls: AtomicUsize,
}

impl StatsCollector {
    pub fn rule_evaluated(&self) {
        self.rules_evaluated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_instance_contexts(&self, n: usize) {
        self.instance_contexts.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_results(&self, n: usize) {
        self.results.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_skipped_references(&self, n: usize) {
        self.skipped_references.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_forbidden_calls(&self, n: usize) {
        self.forbidden_calls.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self, findings: usize) -> EvaluationStats {
        EvaluationStats {
            rules_evaluated: self.rules_evaluated.load(Ordering::Relaxed),
            instance_contexts: self.instance_contexts.load(Ordering::Relaxed),
            results: self.results.load(Ordering::Relaxed),
            skipped_references: self.skipped_references.load(Ordering::Relaxed),
            forbidden_calls: self.forbidden_calls.load(Ordering::Relaxed),
            findings,
        }
    }
}
