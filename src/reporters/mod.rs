//! Output reporters for model-health analysis results
//!
//! Supports multiple output formats:
//! - `text` - Terminal output with colors
//! - `json` - Machine-readable JSON
//! - `markdown` - GitHub-flavored Markdown

mod json;
mod markdown;
mod text;

use crate::models::{Grade, IssuesBySeverity, Severity, Violation};
use crate::report::Report;
use crate::scoring::UnifiedReport;
use anyhow::{anyhow, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;

pub use json::{render as render_json, render_compact};

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Markdown,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "terminal" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(anyhow!(
                "Unknown format '{}'. Valid formats: text, json, markdown",
                s
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

/// Either a single engine report or the unified report
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnalysisReport {
    Engine(Report),
    Unified(Box<UnifiedReport>),
}

/// One row of a category score table
pub(crate) struct CategoryRow {
    pub label: &'static str,
    pub percentage: u32,
    pub issues_count: Option<usize>,
}

impl AnalysisReport {
    pub fn title(&self) -> String {
        match self {
            AnalysisReport::Engine(r) => match r.engine {
                crate::rules::Engine::Model => "Model Health Report".to_string(),
                crate::rules::Engine::Query => "M-Code Health Report".to_string(),
                crate::rules::Engine::AiReadiness => "AI Readiness Report".to_string(),
            },
            AnalysisReport::Unified(_) => "Unified Model Health Report".to_string(),
        }
    }

    pub fn score(&self) -> u32 {
        match self {
            AnalysisReport::Engine(r) => r.score,
            AnalysisReport::Unified(u) => u.score,
        }
    }

    pub fn max_score(&self) -> u32 {
        match self {
            AnalysisReport::Engine(r) => r.max_score,
            AnalysisReport::Unified(u) => u.max_score,
        }
    }

    pub fn grade(&self) -> Grade {
        match self {
            AnalysisReport::Engine(r) => r.grade,
            AnalysisReport::Unified(u) => u.grade,
        }
    }

    pub fn grade_description(&self) -> &'static str {
        match self {
            AnalysisReport::Engine(r) => r.grade_description,
            AnalysisReport::Unified(u) => u.grade_description,
        }
    }

    pub fn issues_by_severity(&self) -> &IssuesBySeverity {
        match self {
            AnalysisReport::Engine(r) => &r.issues_by_severity,
            AnalysisReport::Unified(u) => &u.issues_by_severity,
        }
    }

    pub fn top_recommendations(&self) -> &[String] {
        match self {
            AnalysisReport::Engine(r) => &r.top_recommendations,
            AnalysisReport::Unified(u) => &u.top_recommendations,
        }
    }

    pub fn statistics(&self) -> &BTreeMap<String, usize> {
        match self {
            AnalysisReport::Engine(r) => &r.statistics,
            AnalysisReport::Unified(u) => &u.statistics,
        }
    }

    /// Issues in report order, with the source tag unified reports carry
    pub fn issues(&self) -> Vec<(Option<&'static str>, &Violation)> {
        match self {
            AnalysisReport::Engine(r) => r.issues.iter().map(|v| (None, v)).collect(),
            AnalysisReport::Unified(u) => u
                .issues
                .iter()
                .map(|i| {
                    let source = match i.source {
                        crate::scoring::IssueSource::Model => "Model",
                        crate::scoring::IssueSource::MCode => "M-Code",
                    };
                    (Some(source), &i.violation)
                })
                .collect(),
        }
    }

    pub(crate) fn category_rows(&self) -> Vec<CategoryRow> {
        match self {
            AnalysisReport::Engine(r) => r
                .category_scores
                .iter()
                .map(|(category, cs)| CategoryRow {
                    label: category.label(),
                    percentage: cs.percentage,
                    issues_count: Some(cs.issues_count),
                })
                .collect(),
            AnalysisReport::Unified(u) => u
                .category_scores
                .iter()
                .map(|(bucket, pct)| CategoryRow {
                    label: bucket.label(),
                    percentage: *pct,
                    issues_count: None,
                })
                .collect(),
        }
    }

    /// AI readiness band, from the AI report or an attached one
    pub fn readiness_level(&self) -> Option<&'static str> {
        match self {
            AnalysisReport::Engine(r) => r.readiness_level,
            AnalysisReport::Unified(u) => u.ai_report.as_ref().and_then(|r| r.readiness_level),
        }
    }

    pub fn has_issue_at_or_above(&self, threshold: Severity) -> bool {
        self.issues_by_severity().any_at_or_above(threshold)
    }
}

impl From<Report> for AnalysisReport {
    fn from(report: Report) -> Self {
        AnalysisReport::Engine(report)
    }
}

impl From<UnifiedReport> for AnalysisReport {
    fn from(report: UnifiedReport) -> Self {
        AnalysisReport::Unified(Box::new(report))
    }
}

/// Render a report in the specified format
pub fn report(report: &AnalysisReport, format: &str) -> Result<String> {
    let fmt = OutputFormat::from_str(format)?;
    report_with_format(report, fmt)
}

/// Render a report using an OutputFormat enum
pub fn report_with_format(report: &AnalysisReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => text::render(report),
        OutputFormat::Json => json::render(report),
        OutputFormat::Markdown => markdown::render(report),
    }
}

/// Get the recommended file extension for a format
pub fn file_extension(format: OutputFormat) -> &'static str {
    match format {
        OutputFormat::Text => "txt",
        OutputFormat::Json => "json",
        OutputFormat::Markdown => "md",
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::graph::{Column, Model, Table};
    use crate::report::{analyze_model_unified, run_engine};
    use crate::rules::Engine;

    /// A small model with a few structural issues
    pub(crate) fn test_model() -> Model {
        let mut sales = Table::new("Sales");
        sales.columns.push(Column::new("Amount", "double"));
        sales.columns.push(Column::new("Customer Notes", "string"));
        Model {
            tables: vec![sales],
            ..Default::default()
        }
    }

    pub(crate) fn test_report() -> AnalysisReport {
        run_engine(&test_model(), Engine::Model, &AnalysisConfig::default()).into()
    }

    pub(crate) fn test_unified_report() -> AnalysisReport {
        analyze_model_unified(&test_model(), &AnalysisConfig::default()).into()
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!(OutputFormat::from_str("text").unwrap(), OutputFormat::Text);
        assert_eq!(OutputFormat::from_str("JSON").unwrap(), OutputFormat::Json);
        assert_eq!(
            OutputFormat::from_str("md").unwrap(),
            OutputFormat::Markdown
        );
        assert!(OutputFormat::from_str("sarif").is_err());
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension(OutputFormat::Markdown), "md");
        assert_eq!(file_extension(OutputFormat::Json), "json");
    }

    #[test]
    fn test_unified_issue_sources() {
        let report = test_unified_report();
        let issues = report.issues();
        assert!(!issues.is_empty());
        assert!(issues.iter().all(|(source, _)| source.is_some()));
        assert_eq!(issues[0].0, Some("Model"));
        assert!(report.readiness_level().is_some());
    }

    #[test]
    fn test_engine_category_rows() {
        let report = test_report();
        let rows = report.category_rows();
        assert_eq!(rows.len(), 7);
        assert!(rows.iter().all(|r| r.issues_count.is_some()));
    }
}
