/*
 * Finding Aggregator
 *
 * Append-only, thread-safe collection of findings. Identical findings
 * (same rule, kind, message and ranges) are stored once; the final list is
 * in report order.
 */

use crate::features::mark_evaluation::domain::Finding;
use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use tracing::info;

#[derive(Debug, Default)]
pub struct FindingAggregator {
    findings: Mutex<FxHashSet<Finding>>,
}

impl FindingAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finding; `false` if an identical one is already present
    pub fn add(&self, finding: Finding) -> bool {
        let mut findings = self.findings.lock();
        if findings.contains(&finding) {
            return false;
        }
        info!("{}", finding);
        findings.insert(finding)
    }

    pub fn len(&self) -> usize {
        self.findings.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.lock().is_empty()
    }

    /// Findings sorted by file, line and rule
    pub fn into_sorted(self) -> Vec<Finding> {
        let mut findings: Vec<Finding> = self.findings.into_inner().into_iter().collect();
        findings.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()).then_with(|| a.cmp(b)));
        findings
    }
}
