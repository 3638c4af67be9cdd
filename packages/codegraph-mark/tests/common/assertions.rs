//! Custom assertions over evaluation reports

use codegraph_mark::features::mark_evaluation::{EvaluationReport, Finding, FindingDetail};
use std::collections::BTreeSet;

/// Assert that the report has no findings
pub fn assert_clean(report: &EvaluationReport) {
    assert!(
        report.findings.is_empty(),
        "Expected no findings, got:\n{}",
        render(&report.findings)
    );
}

/// Assert the number of findings of one rule
pub fn assert_finding_count(report: &EvaluationReport, rule: &str, expected: usize) {
    let found: Vec<&Finding> = report.findings_for(rule).collect();
    assert_eq!(
        found.len(),
        expected,
        "Expected {expected} findings for {rule}, got:\n{}",
        render(&report.findings)
    );
}

/// Order violations as (line, operation, expected labels)
pub fn order_violations(report: &EvaluationReport) -> Vec<(i64, String, Vec<String>)> {
    report
        .findings
        .iter()
        .filter_map(|f| match &f.detail {
            FindingDetail::OrderViolation {
                operation,
                expected,
                ..
            } => Some((f.line(), operation.clone(), expected.clone())),
            _ => None,
        })
        .collect()
}

/// Findings as a set of report lines
pub fn finding_set(report: &EvaluationReport) -> BTreeSet<String> {
    report.findings.iter().map(|f| f.to_string()).collect()
}

fn render(findings: &[Finding]) -> String {
    findings
        .iter()
        .map(|f| format!("  {}", f))
        .collect::<Vec<_>>()
        .join("\n")
}
