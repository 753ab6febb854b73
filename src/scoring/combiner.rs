//! Unified report
//!
//! Recombines the structural and query engine reports through an outer
//! set of bucket weights. Each bucket reads one category percentage from
//! one engine report; a category the report does not list counts as 100%.

use crate::models::{Category, Grade, GradeScale, IssuesBySeverity, Violation};
use crate::report::Report;
use crate::rules::Engine;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Outer scoring buckets of the unified report
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UnifiedBucket {
    #[serde(rename(serialize = "Model Design", deserialize = "model_design"))]
    ModelDesign,
    #[serde(rename(serialize = "Relationships", deserialize = "relationships"))]
    Relationships,
    #[serde(rename(serialize = "DAX Measures", deserialize = "dax_measures"))]
    DaxMeasures,
    #[serde(rename(serialize = "M-Code Performance", deserialize = "mcode_performance"))]
    McodePerformance,
    #[serde(rename(serialize = "Query Folding", deserialize = "query_folding"))]
    QueryFolding,
    #[serde(rename(serialize = "Documentation", deserialize = "documentation"))]
    Documentation,
    #[serde(rename(serialize = "Naming", deserialize = "naming"))]
    Naming,
    #[serde(rename(serialize = "Security", deserialize = "security"))]
    Security,
}

impl UnifiedBucket {
    pub const ALL: [UnifiedBucket; 8] = [
        UnifiedBucket::ModelDesign,
        UnifiedBucket::Relationships,
        UnifiedBucket::DaxMeasures,
        UnifiedBucket::McodePerformance,
        UnifiedBucket::QueryFolding,
        UnifiedBucket::Documentation,
        UnifiedBucket::Naming,
        UnifiedBucket::Security,
    ];

    pub fn label(self) -> &'static str {
        match self {
            UnifiedBucket::ModelDesign => "Model Design",
            UnifiedBucket::Relationships => "Relationships",
            UnifiedBucket::DaxMeasures => "DAX Measures",
            UnifiedBucket::McodePerformance => "M-Code Performance",
            UnifiedBucket::QueryFolding => "Query Folding",
            UnifiedBucket::Documentation => "Documentation",
            UnifiedBucket::Naming => "Naming",
            UnifiedBucket::Security => "Security",
        }
    }

    /// The engine report and category this bucket reads
    pub fn source(self) -> (Engine, Category) {
        match self {
            UnifiedBucket::ModelDesign => (Engine::Model, Category::Design),
            UnifiedBucket::Relationships => (Engine::Model, Category::Relationships),
            UnifiedBucket::DaxMeasures => (Engine::Model, Category::Measures),
            UnifiedBucket::McodePerformance => (Engine::Query, Category::Performance),
            UnifiedBucket::QueryFolding => (Engine::Query, Category::QueryFolding),
            UnifiedBucket::Documentation => (Engine::Model, Category::Documentation),
            UnifiedBucket::Naming => (Engine::Model, Category::Naming),
            UnifiedBucket::Security => (Engine::Query, Category::Security),
        }
    }

    pub fn default_weight(self) -> f64 {
        match self {
            UnifiedBucket::ModelDesign => 0.15,
            UnifiedBucket::Relationships => 0.15,
            UnifiedBucket::DaxMeasures => 0.15,
            UnifiedBucket::McodePerformance => 0.20,
            UnifiedBucket::QueryFolding => 0.15,
            UnifiedBucket::Documentation => 0.10,
            UnifiedBucket::Naming => 0.05,
            UnifiedBucket::Security => 0.05,
        }
    }
}

/// Outer bucket weights
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnifiedWeights(BTreeMap<UnifiedBucket, f64>);

impl Default for UnifiedWeights {
    fn default() -> Self {
        Self(
            UnifiedBucket::ALL
                .iter()
                .map(|b| (*b, b.default_weight()))
                .collect(),
        )
    }
}

impl UnifiedWeights {
    /// Caller-provided weights; buckets left out carry no weight
    pub fn from_map(weights: BTreeMap<UnifiedBucket, f64>) -> Self {
        Self(weights)
    }

    pub fn set(&mut self, bucket: UnifiedBucket, weight: f64) {
        self.0.insert(bucket, weight);
    }

    pub fn get(&self, bucket: UnifiedBucket) -> f64 {
        self.0.get(&bucket).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (UnifiedBucket, f64)> + '_ {
        self.0.iter().map(|(b, w)| (*b, *w))
    }

    /// Scaled to sum to 1. All-zero weights stay zero.
    pub fn normalized(&self) -> Self {
        let total: f64 = self.0.values().sum();
        Self(
            self.0
                .iter()
                .map(|(b, w)| (*b, if total > 0.0 { w / total } else { 0.0 }))
                .collect(),
        )
    }
}

/// Which engine an issue in the unified report came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IssueSource {
    Model,
    #[serde(rename = "M-Code")]
    MCode,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnifiedIssue {
    pub source: IssueSource,
    #[serde(flatten)]
    pub violation: Violation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnifiedReport {
    pub score: u32,
    pub max_score: u32,
    pub grade: Grade,
    pub grade_description: &'static str,
    /// Bucket percentages
    pub category_scores: BTreeMap<UnifiedBucket, u32>,
    pub total_issues: usize,
    pub issues_by_severity: IssuesBySeverity,
    pub issues: Vec<UnifiedIssue>,
    pub top_recommendations: Vec<String>,
    pub statistics: BTreeMap<String, usize>,
    pub model_report: Report,
    pub query_report: Report,
    /// Informational; never moves the unified score
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_report: Option<Report>,
}

impl UnifiedReport {
    pub fn with_ai_report(mut self, report: Report) -> Self {
        self.ai_report = Some(report);
        self
    }
}

fn bucket_percentage(bucket: UnifiedBucket, model: &Report, query: &Report) -> u32 {
    let (engine, category) = bucket.source();
    let report = match engine {
        Engine::Query => query,
        _ => model,
    };
    report
        .category_scores
        .get(&category)
        .map(|c| c.percentage)
        .unwrap_or(100)
}

/// Weighted unified score over bucket percentages, clamped to [0, 100]
pub fn unified_score(percentages: &BTreeMap<UnifiedBucket, u32>, weights: &UnifiedWeights) -> u32 {
    let total: f64 = weights
        .iter()
        .map(|(bucket, weight)| {
            let pct = percentages.get(&bucket).copied().unwrap_or(100);
            f64::from(pct) / 100.0 * weight * 100.0
        })
        .sum();
    round_half_even(total).clamp(0.0, 100.0) as u32
}

/// Round to the nearest integer, ties to even, after snapping away
/// float noise from the weight products
pub(crate) fn round_half_even(value: f64) -> f64 {
    ((value * 1e9).round() / 1e9).round_ties_even()
}

/// Merge a structural and a query report into one unified report
pub fn combine_reports(model: &Report, query: &Report, weights: &UnifiedWeights) -> UnifiedReport {
    let weights = weights.normalized();
    let category_scores: BTreeMap<UnifiedBucket, u32> = UnifiedBucket::ALL
        .iter()
        .map(|b| (*b, bucket_percentage(*b, model, query)))
        .collect();

    let score = unified_score(&category_scores, &weights);
    let grade = GradeScale::Unified.grade(score);

    let issues: Vec<UnifiedIssue> = model
        .issues
        .iter()
        .map(|v| (IssueSource::Model, v))
        .chain(query.issues.iter().map(|v| (IssueSource::MCode, v)))
        .map(|(source, violation)| UnifiedIssue {
            source,
            violation: violation.clone(),
        })
        .collect();

    let mut top_recommendations: Vec<String> = Vec::new();
    for rec in model.top_recommendations.iter().chain(&query.top_recommendations) {
        if !top_recommendations.contains(rec) {
            top_recommendations.push(rec.clone());
        }
    }
    top_recommendations.truncate(10);

    let mut statistics = model.statistics.clone();
    let query_stat = |key: &str| query.statistics.get(key).copied().unwrap_or(0);
    statistics.insert("mcode_queries".to_string(), query_stat("total_queries"));
    statistics.insert("mcode_steps".to_string(), query_stat("total_steps"));
    statistics.insert(
        "mcode_folding_issues".to_string(),
        query_stat("queries_with_folding_issues"),
    );

    info!("Unified score: {} ({})", score, grade);

    UnifiedReport {
        score,
        max_score: 100,
        grade,
        grade_description: GradeScale::Unified.description(grade),
        category_scores,
        total_issues: issues.len(),
        issues_by_severity: IssuesBySeverity::from_severities(
            issues.iter().map(|i| i.violation.severity),
        ),
        issues,
        top_recommendations,
        statistics,
        model_report: model.clone(),
        query_report: query.clone(),
        ai_report: None,
    }
}
