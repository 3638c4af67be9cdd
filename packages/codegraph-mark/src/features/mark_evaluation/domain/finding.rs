/*
 * Findings
 *
 * Structured rule violations. The `Display` form is the textual report
 * line; the serde form (tagged by `kind`) is the machine-readable one.
 *
 * ```text
 * line 12: Violation against Order: p5.init(); (init) is not allowed. Expected one of: create (CipherMode): WrongUse.
 * line 20: Violation against Order: Base p7.start() is not correctly terminated. Expected one of: finish (CipherMode): WrongUse.
 * MarkRuleEvaluationFinding: Rule KeyLength violated
 * line 31: Violation against forbidden call(s) Botan.set_key(_, _) in entity Botan. Call was p.set_key(k, iv).
 * ```
 */

use crate::shared::models::Span;
use serde::{Deserialize, Serialize};

/// Kind-specific payload of a finding
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FindingDetail {
    /// Illegal transition of an order grammar
    OrderViolation {
        code: String,
        operation: String,
        expected: Vec<String>,
    },

    /// Sequence ended in a non-accepting state
    NotTerminated { code: String, expected: Vec<String> },

    /// Boolean `ensure` evaluated to false
    RuleViolation,

    /// Call matching a forbidden op statement
    ForbiddenCall {
        pattern: String,
        entity: String,
        code: String,
    },
}

/// A rule violation
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Finding {
    pub rule: String,
    pub detail: FindingDetail,

    /// Violation message (the rule's `fail` text)
    pub message: String,

    pub file: String,

    /// Source ranges of the responsible nodes; the unknown span if none is known
    pub ranges: Vec<Span>,
}

impl Finding {
    pub fn new(
        rule: impl Into<String>,
        detail: FindingDetail,
        message: impl Into<String>,
        file: impl Into<String>,
        mut ranges: Vec<Span>,
    ) -> Self {
        if ranges.is_empty() {
            ranges.push(Span::unknown());
        }
        Self {
            rule: rule.into(),
            detail,
            message: message.into(),
            file: file.into(),
            ranges,
        }
    }

    /// First reported line; -1 when the location is unknown
    pub fn line(&self) -> i64 {
        self.ranges
            .iter()
            .find(|r| !r.is_unknown())
            .map(|r| r.start_line as i64)
            .unwrap_or(-1)
    }

    /// Deterministic report order: file, line, rule, then everything else
    pub fn sort_key(&self) -> (&str, i64, &str, &FindingDetail, &[Span]) {
        (&self.file, self.line(), &self.rule, &self.detail, &self.ranges)
    }
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.detail {
            FindingDetail::OrderViolation {
                code,
                operation,
                expected,
            } => write!(
                f,
                "line {}: Violation against Order: {}; ({}) is not allowed. Expected one of: {} ({}): {}.",
                self.line(),
                code.trim_end_matches(';'),
                operation,
                expected.join(", "),
                self.rule,
                self.message
            ),
            FindingDetail::NotTerminated { code, expected } => write!(
                f,
                "line {}: Violation against Order: Base {} is not correctly terminated. Expected one of: {} ({}): {}.",
                self.line(),
                code.trim_end_matches(';'),
                expected.join(", "),
                self.rule,
                self.message
            ),
            FindingDetail::RuleViolation => {
                write!(f, "MarkRuleEvaluationFinding: Rule {} violated", self.rule)
            }
            FindingDetail::ForbiddenCall {
                pattern,
                entity,
                code,
            } => write!(
                f,
                "line {}: Violation against forbidden call(s) {} in entity {}. Call was {}.",
                self.line(),
                pattern,
                entity,
                code.trim_end_matches(';')
            ),
        }
    }
}
