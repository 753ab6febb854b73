//! Base rule trait and types
//!
//! This module defines the core abstractions for model checks:
//! - `Rule` trait that every catalog entry implements
//! - `RuleResult` for capturing one rule execution
//! - `EvaluationSummary` and `Evaluation` for a whole catalog run

use crate::graph::Model;
use crate::models::{Category, IssuesBySeverity, Severity, Violation};
use anyhow::Result;
use serde::Serialize;

/// Result from running a single rule
#[derive(Debug, Clone)]
pub struct RuleResult {
    /// Id of the rule that produced these results
    pub rule_id: String,
    pub violations: Vec<Violation>,
    /// Execution time in milliseconds
    pub duration_ms: u64,
    pub success: bool,
    /// Error message if the rule failed
    pub error: Option<String>,
}

impl RuleResult {
    /// Create a successful result
    pub fn success(rule_id: String, violations: Vec<Violation>, duration_ms: u64) -> Self {
        Self {
            rule_id,
            violations,
            duration_ms,
            success: true,
            error: None,
        }
    }

    /// Create a failed result
    pub fn failure(rule_id: String, error: String, duration_ms: u64) -> Self {
        Self {
            rule_id,
            violations: Vec::new(),
            duration_ms,
            success: false,
            error: Some(error),
        }
    }
}

/// Trait for all model rules
///
/// A rule is a pure check over one immutable [`Model`]. It returns its
/// own violations and never sees another rule's output, so rules can run
/// in any order or in parallel.
///
/// # Example Implementation
///
/// ```ignore
/// pub struct NoHiddenTables;
///
/// impl Rule for NoHiddenTables {
///     fn id(&self) -> &'static str { "NO_HIDDEN_TABLES" }
///     fn description(&self) -> &'static str { "Flags hidden tables" }
///     fn category(&self) -> Category { Category::Design }
///     fn default_severity(&self) -> Severity { Severity::Low }
///
///     fn check(&self, model: &Model) -> Result<Vec<Violation>> {
///         Ok(vec![])
///     }
/// }
/// ```
pub trait Rule: Send + Sync {
    /// Unique identifier, e.g. `AVOID_DUPLICATE_MEASURES`
    fn id(&self) -> &'static str;

    /// Human-readable description of what this rule finds
    fn description(&self) -> &'static str;

    /// Category the rule's violations are scored under
    fn category(&self) -> Category;

    /// Informational: the severity this rule usually reports
    fn default_severity(&self) -> Severity;

    /// Run the check
    ///
    /// An `Err` (or a panic) is recorded by the evaluator and never aborts
    /// the rest of the catalog.
    fn check(&self, model: &Model) -> Result<Vec<Violation>>;
}

/// Signature of a catalog check function
pub type CheckFn = fn(&Model) -> Vec<Violation>;

/// A rule backed by a plain function. Most catalog entries are a single
/// predicate over the model and need no state of their own.
pub struct FnRule {
    id: &'static str,
    description: &'static str,
    category: Category,
    severity: Severity,
    check: CheckFn,
}

impl FnRule {
    pub const fn new(
        id: &'static str,
        description: &'static str,
        category: Category,
        severity: Severity,
        check: CheckFn,
    ) -> Self {
        Self {
            id,
            description,
            category,
            severity,
            check,
        }
    }
}

impl Rule for FnRule {
    fn id(&self) -> &'static str {
        self.id
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn category(&self) -> Category {
        self.category
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn check(&self, model: &Model) -> Result<Vec<Violation>> {
        Ok((self.check)(model))
    }
}

/// A rule that could not complete
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleFailure {
    pub rule_id: String,
    pub error: String,
}

/// Summary statistics from running a catalog
#[derive(Debug, Clone, Default)]
pub struct EvaluationSummary {
    pub rules_run: usize,
    pub rules_succeeded: usize,
    pub rules_failed: usize,
    pub total_violations: usize,
    pub by_severity: IssuesBySeverity,
    pub total_duration_ms: u64,
}

impl EvaluationSummary {
    /// Update summary with a rule result
    pub fn add_result(&mut self, result: &RuleResult) {
        self.rules_run += 1;
        self.total_duration_ms += result.duration_ms;

        if result.success {
            self.rules_succeeded += 1;
            self.total_violations += result.violations.len();
            let counts = IssuesBySeverity::from_violations(&result.violations);
            self.by_severity.critical += counts.critical;
            self.by_severity.high += counts.high;
            self.by_severity.medium += counts.medium;
            self.by_severity.low += counts.low;
            self.by_severity.info += counts.info;
        } else {
            self.rules_failed += 1;
        }
    }
}

/// Everything one catalog run produced, in catalog order
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    pub violations: Vec<Violation>,
    pub failures: Vec<RuleFailure>,
    pub summary: EvaluationSummary,
}

impl Evaluation {
    /// Fold ordered rule results into one evaluation
    pub fn from_results(results: Vec<RuleResult>) -> Self {
        let mut evaluation = Evaluation::default();
        for result in results {
            evaluation.summary.add_result(&result);
            if result.success {
                evaluation.violations.extend(result.violations);
            } else {
                evaluation.failures.push(RuleFailure {
                    rule_id: result.rule_id,
                    error: result.error.unwrap_or_default(),
                });
            }
        }
        evaluation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Location;

    fn violation(severity: Severity) -> Violation {
        Violation::new("R", Category::Design, severity, 1, "t", Location::Model)
    }

    #[test]
    fn test_rule_result_success() {
        let result = RuleResult::success("R".to_string(), vec![], 100);
        assert!(result.success);
        assert!(result.error.is_none());
        assert_eq!(result.duration_ms, 100);
    }

    #[test]
    fn test_rule_result_failure() {
        let result = RuleResult::failure("R".to_string(), "oops".to_string(), 50);
        assert!(!result.success);
        assert_eq!(result.error, Some("oops".to_string()));
    }

    #[test]
    fn test_evaluation_summary() {
        let mut summary = EvaluationSummary::default();

        let ok = RuleResult::success("R1".to_string(), vec![violation(Severity::High)], 100);
        let failed = RuleResult::failure("R2".to_string(), "err".to_string(), 50);

        summary.add_result(&ok);
        summary.add_result(&failed);

        assert_eq!(summary.rules_run, 2);
        assert_eq!(summary.rules_succeeded, 1);
        assert_eq!(summary.rules_failed, 1);
        assert_eq!(summary.by_severity.high, 1);
        assert_eq!(summary.total_duration_ms, 150);
    }

    #[test]
    fn test_evaluation_keeps_order_and_failures() {
        let results = vec![
            RuleResult::success("A".into(), vec![violation(Severity::Low)], 0),
            RuleResult::failure("B".into(), "boom".into(), 0),
            RuleResult::success("C".into(), vec![violation(Severity::High)], 0),
        ];
        let evaluation = Evaluation::from_results(results);
        assert_eq!(evaluation.violations.len(), 2);
        assert_eq!(evaluation.violations[0].severity, Severity::Low);
        assert_eq!(
            evaluation.failures,
            vec![RuleFailure {
                rule_id: "B".into(),
                error: "boom".into()
            }]
        );
    }
}
