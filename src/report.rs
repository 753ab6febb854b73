//! Engine reports and library entry points
//!
//! ```text
//! raw bytes ──normalize──▶ Model ──RuleEngine──▶ Evaluation ──aggregator──▶ Report
//!                                                                             │
//!                          structural Report + query Report ──combiner──▶ UnifiedReport
//! ```

use crate::config::AnalysisConfig;
use crate::graph::Model;
use crate::models::{Category, Grade, GradeScale, IssuesBySeverity, Severity, Violation};
use crate::parsers::{normalize, FormatHint, NormalizeError};
use crate::rules::{
    catalog_for, checklist, query_statistics, readiness_level, ChecklistItem, Engine, Evaluation,
    RuleEngineBuilder, RuleFailure,
};
use crate::scoring::{combine_reports, CategoryScore, ScoringAggregator, UnifiedReport};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

/// One engine's scored result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub engine: Engine,
    pub score: u32,
    pub max_score: u32,
    pub grade: Grade,
    pub grade_description: &'static str,
    pub total_issues: usize,
    pub issues_by_severity: IssuesBySeverity,
    pub issues: Vec<Violation>,
    pub top_recommendations: Vec<String>,
    pub statistics: BTreeMap<String, usize>,
    pub category_scores: BTreeMap<Category, CategoryScore>,
    /// AI-readiness band, AI engine only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readiness_level: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checklist: Option<Vec<ChecklistItem>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rule_failures: Vec<RuleFailure>,
}

impl Report {
    /// Score an evaluation of `model` under `config`'s weights for `engine`
    pub fn from_evaluation(
        engine: Engine,
        model: &Model,
        evaluation: Evaluation,
        config: &AnalysisConfig,
    ) -> Self {
        let weights = config.scoring.weights_for(engine);
        let breakdown =
            ScoringAggregator::new(&weights, config.scoring.max_score).calculate(&evaluation.violations);
        let violations = evaluation.violations;

        let statistics = match engine {
            Engine::Query => query_statistics(model, &violations),
            _ => model.statistics(),
        };
        let (readiness, checklist) = match engine {
            Engine::AiReadiness => (
                Some(readiness_level(breakdown.score)),
                Some(checklist(model)),
            ),
            _ => (None, None),
        };

        Self {
            engine,
            score: breakdown.score,
            max_score: breakdown.max_score,
            grade: breakdown.grade,
            grade_description: GradeScale::Engine.description(breakdown.grade),
            total_issues: violations.len(),
            issues_by_severity: IssuesBySeverity::from_violations(&violations),
            top_recommendations: top_recommendations(&violations),
            issues: violations,
            statistics,
            category_scores: breakdown.category_scores,
            readiness_level: readiness,
            checklist,
            rule_failures: evaluation.failures,
        }
    }

    pub fn has_issue_at_or_above(&self, threshold: Severity) -> bool {
        self.issues_by_severity.any_at_or_above(threshold)
    }
}

/// Recommendations of the first 3 Critical then the first 5 High issues,
/// deduplicated by text and cut to 5
pub fn top_recommendations(violations: &[Violation]) -> Vec<String> {
    let of = |severity: Severity, n: usize| {
        violations
            .iter()
            .filter(move |v| v.severity == severity)
            .take(n)
    };

    let mut recommendations: Vec<String> = Vec::new();
    for violation in of(Severity::Critical, 3).chain(of(Severity::High, 5)) {
        if !recommendations.contains(&violation.recommendation) {
            recommendations.push(violation.recommendation.clone());
        }
    }
    recommendations.truncate(5);
    recommendations
}

/// Run one engine's catalog over an already normalized model
pub fn run_engine(model: &Model, engine: Engine, config: &AnalysisConfig) -> Report {
    let rule_engine = RuleEngineBuilder::new()
        .workers(config.defaults.workers.unwrap_or(1))
        .rules(catalog_for(engine, config))
        .build();
    let evaluation = rule_engine.evaluate(model);
    let report = Report::from_evaluation(engine, model, evaluation, config);
    info!(
        "{} engine: score {} ({}), {} issues",
        engine, report.score, report.grade, report.total_issues
    );
    report
}

/// Structural engine with default configuration
pub fn normalize_and_score(raw: &[u8], hint: FormatHint) -> Result<Report, NormalizeError> {
    normalize_and_score_with(raw, hint, Engine::Model, &AnalysisConfig::default())
}

pub fn normalize_and_score_with(
    raw: &[u8],
    hint: FormatHint,
    engine: Engine,
    config: &AnalysisConfig,
) -> Result<Report, NormalizeError> {
    let model = normalize(raw, hint)?;
    Ok(run_engine(&model, engine, config))
}

/// All three engines over one model, combined
pub fn analyze_model_unified(model: &Model, config: &AnalysisConfig) -> UnifiedReport {
    let structural = run_engine(model, Engine::Model, config);
    let query = run_engine(model, Engine::Query, config);
    let ai = run_engine(model, Engine::AiReadiness, config);
    combine_reports(&structural, &query, &config.scoring.unified_weights()).with_ai_report(ai)
}

pub fn analyze_unified(
    raw: &[u8],
    hint: FormatHint,
    config: &AnalysisConfig,
) -> Result<UnifiedReport, NormalizeError> {
    let model = normalize(raw, hint)?;
    Ok(analyze_model_unified(&model, config))
}

/// A report, or the single error object a failed normalization produces
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnalysisOutcome<T> {
    Report(T),
    Error { error: String },
}

impl<T> AnalysisOutcome<T> {
    pub fn from_result(result: Result<T, NormalizeError>) -> Self {
        match result {
            Ok(report) => AnalysisOutcome::Report(report),
            Err(e) => AnalysisOutcome::Error {
                error: e.to_string(),
            },
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, AnalysisOutcome::Error { .. })
    }
}
