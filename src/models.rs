//! Core data models for model-health
//!
//! These types are shared by the rule catalogs, the scoring aggregator,
//! the report combiner and the reporters.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Generate a deterministic violation ID based on content hash.
///
/// The ID is a 16-character hex string derived from hashing:
/// - rule id (which rule produced it)
/// - location (where it was found)
/// - title (what the issue is)
///
/// Two runs over the same definition produce the same IDs, which keeps
/// serialized reports byte-identical.
pub fn deterministic_violation_id(rule_id: &str, location: &str, title: &str) -> String {
    let input = format!("{rule_id}\n{location}\n{title}");
    let digest = md5::compute(input.as_bytes());
    format!("{:x}", digest)[..16].to_string()
}

/// Severity levels for violations
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum Severity {
    #[default]
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Highest first, the order reports list severities in
    pub const ALL: [Severity; 5] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Info,
    ];

    /// Penalty multiplier applied to a violation's impact weight
    pub fn multiplier(self) -> f64 {
        match self {
            Severity::Critical => 1.5,
            Severity::High => 1.0,
            Severity::Medium => 0.7,
            Severity::Low => 0.3,
            Severity::Info => 0.0,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "Info"),
            Severity::Low => write!(f, "Low"),
            Severity::Medium => write!(f, "Medium"),
            Severity::High => write!(f, "High"),
            Severity::Critical => write!(f, "Critical"),
        }
    }
}

impl FromStr for Severity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "critical" => Ok(Severity::Critical),
            "high" => Ok(Severity::High),
            "medium" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            "info" => Ok(Severity::Info),
            _ => Err(anyhow::anyhow!(
                "Unknown severity '{}'. Valid: critical, high, medium, low, info",
                s
            )),
        }
    }
}

/// Rule categories across all three engines.
///
/// Serialized as the human label used in reports, deserialized from the
/// snake_case key used in config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename(serialize = "Performance", deserialize = "performance"))]
    Performance,
    #[serde(rename(serialize = "Model Design", deserialize = "design"))]
    Design,
    #[serde(rename(serialize = "Relationships", deserialize = "relationships"))]
    Relationships,
    #[serde(rename(serialize = "Measures", deserialize = "measures"))]
    Measures,
    #[serde(rename(serialize = "Best Practices", deserialize = "best_practices"))]
    BestPractices,
    #[serde(rename(serialize = "Naming Convention", deserialize = "naming"))]
    Naming,
    #[serde(rename(serialize = "Documentation", deserialize = "documentation"))]
    Documentation,
    #[serde(rename(serialize = "Query Folding", deserialize = "query_folding"))]
    QueryFolding,
    #[serde(rename(serialize = "Data Quality", deserialize = "data_quality"))]
    DataQuality,
    #[serde(rename(serialize = "Error Handling", deserialize = "error_handling"))]
    ErrorHandling,
    #[serde(rename(serialize = "Security", deserialize = "security"))]
    Security,
    #[serde(rename(serialize = "Navigation & Discovery", deserialize = "ai_navigation"))]
    AiNavigation,
    #[serde(rename(
        serialize = "Documentation & Descriptions",
        deserialize = "ai_documentation"
    ))]
    AiDocumentation,
    #[serde(rename(serialize = "Naming Clarity", deserialize = "ai_naming"))]
    AiNaming,
    #[serde(rename(serialize = "Model Complexity", deserialize = "ai_complexity"))]
    AiComplexity,
    #[serde(rename(serialize = "Data Categorization", deserialize = "ai_data_quality"))]
    AiDataQuality,
    #[serde(rename(serialize = "Relationship Clarity", deserialize = "ai_relationships"))]
    AiRelationships,
}

impl Category {
    /// Display label, as used in report keys
    pub fn label(self) -> &'static str {
        match self {
            Category::Performance => "Performance",
            Category::Design => "Model Design",
            Category::Relationships => "Relationships",
            Category::Measures => "Measures",
            Category::BestPractices => "Best Practices",
            Category::Naming => "Naming Convention",
            Category::Documentation => "Documentation",
            Category::QueryFolding => "Query Folding",
            Category::DataQuality => "Data Quality",
            Category::ErrorHandling => "Error Handling",
            Category::Security => "Security",
            Category::AiNavigation => "Navigation & Discovery",
            Category::AiDocumentation => "Documentation & Descriptions",
            Category::AiNaming => "Naming Clarity",
            Category::AiComplexity => "Model Complexity",
            Category::AiDataQuality => "Data Categorization",
            Category::AiRelationships => "Relationship Clarity",
        }
    }

    /// Config key (snake_case)
    pub fn key(self) -> &'static str {
        match self {
            Category::Performance => "performance",
            Category::Design => "design",
            Category::Relationships => "relationships",
            Category::Measures => "measures",
            Category::BestPractices => "best_practices",
            Category::Naming => "naming",
            Category::Documentation => "documentation",
            Category::QueryFolding => "query_folding",
            Category::DataQuality => "data_quality",
            Category::ErrorHandling => "error_handling",
            Category::Security => "security",
            Category::AiNavigation => "ai_navigation",
            Category::AiDocumentation => "ai_documentation",
            Category::AiNaming => "ai_naming",
            Category::AiComplexity => "ai_complexity",
            Category::AiDataQuality => "ai_data_quality",
            Category::AiRelationships => "ai_relationships",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where in the model a violation was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Model,
    Table {
        table: String,
    },
    Column {
        table: String,
        column: String,
    },
    Measure {
        table: String,
        measure: String,
    },
    Relationship {
        name: String,
        from: String,
        to: String,
    },
    Query {
        query: String,
    },
    /// 1-based step position within the query's `let` block
    QueryStep {
        query: String,
        step: usize,
        name: String,
    },
    /// Several objects at once (e.g. "3 inactive relationships")
    Objects(String),
}

impl Location {
    pub fn table(table: &str) -> Self {
        Location::Table {
            table: table.to_string(),
        }
    }

    pub fn column(table: &str, column: &str) -> Self {
        Location::Column {
            table: table.to_string(),
            column: column.to_string(),
        }
    }

    pub fn measure(table: &str, measure: &str) -> Self {
        Location::Measure {
            table: table.to_string(),
            measure: measure.to_string(),
        }
    }

    pub fn objects(summary: impl Into<String>) -> Self {
        Location::Objects(summary.into())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Model => write!(f, "Model"),
            Location::Table { table } => write!(f, "Table: {}", table),
            Location::Column { table, column } => write!(f, "Table: {}, Column: {}", table, column),
            Location::Measure { table, measure } => {
                write!(f, "Table: {}, Measure: {}", table, measure)
            }
            Location::Relationship { name, from, to } => {
                write!(f, "Relationship: {} ({} -> {})", name, from, to)
            }
            Location::Query { query } => write!(f, "Query: {}", query),
            Location::QueryStep { query, step, name } => {
                write!(f, "Query: {}, Step {} ({})", query, step, name)
            }
            Location::Objects(summary) => f.write_str(summary),
        }
    }
}

impl Serialize for Location {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One rule hit. Created by exactly one rule execution and never mutated
/// after the evaluator collects it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub id: String,
    pub rule_id: String,
    pub category: Category,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub recommendation: String,
    /// Fixed impact weight in [0, 10]
    pub impact: u8,
    pub location: Location,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl Violation {
    pub fn new(
        rule_id: &str,
        category: Category,
        severity: Severity,
        impact: u8,
        title: impl Into<String>,
        location: Location,
    ) -> Self {
        let title = title.into();
        Self {
            id: deterministic_violation_id(rule_id, &location.to_string(), &title),
            rule_id: rule_id.to_string(),
            category,
            severity,
            title,
            description: String::new(),
            recommendation: String::new(),
            impact: impact.min(10),
            location,
            details: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = recommendation.into();
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// impact × severity multiplier, before category weighting
    pub fn raw_penalty(&self) -> f64 {
        f64::from(self.impact) * self.severity.multiplier()
    }
}

/// Issue counts by severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuesBySeverity {
    #[serde(rename = "Critical")]
    pub critical: usize,
    #[serde(rename = "High")]
    pub high: usize,
    #[serde(rename = "Medium")]
    pub medium: usize,
    #[serde(rename = "Low")]
    pub low: usize,
    #[serde(rename = "Info")]
    pub info: usize,
}

impl IssuesBySeverity {
    pub fn from_severities(severities: impl IntoIterator<Item = Severity>) -> Self {
        let mut summary = Self::default();
        for severity in severities {
            match severity {
                Severity::Critical => summary.critical += 1,
                Severity::High => summary.high += 1,
                Severity::Medium => summary.medium += 1,
                Severity::Low => summary.low += 1,
                Severity::Info => summary.info += 1,
            }
        }
        summary
    }

    pub fn from_violations(violations: &[Violation]) -> Self {
        Self::from_severities(violations.iter().map(|v| v.severity))
    }

    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low + self.info
    }

    /// Whether any issue sits at or above `threshold`
    pub fn any_at_or_above(&self, threshold: Severity) -> bool {
        Severity::ALL
            .iter()
            .filter(|s| **s >= threshold)
            .any(|s| self.count(*s) > 0)
    }

    pub fn count(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
            Severity::Info => self.info,
        }
    }
}

/// Letter grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        };
        f.write_str(letter)
    }
}

/// The two grade banding tables. Engine reports and the unified report
/// band differently and must never share a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradeScale {
    /// 90 / 80 / 70 / 60
    Engine,
    /// 90 / 75 / 60 / 50
    Unified,
}

impl GradeScale {
    /// Calculate grade from score (inclusive lower bounds)
    pub fn grade(self, score: u32) -> Grade {
        match self {
            GradeScale::Engine => match score {
                s if s >= 90 => Grade::A,
                s if s >= 80 => Grade::B,
                s if s >= 70 => Grade::C,
                s if s >= 60 => Grade::D,
                _ => Grade::F,
            },
            GradeScale::Unified => match score {
                s if s >= 90 => Grade::A,
                s if s >= 75 => Grade::B,
                s if s >= 60 => Grade::C,
                s if s >= 50 => Grade::D,
                _ => Grade::F,
            },
        }
    }

    pub fn description(self, grade: Grade) -> &'static str {
        match (self, grade) {
            (_, Grade::A) => "Excellent",
            (_, Grade::B) => "Good",
            (GradeScale::Engine, Grade::C) => "Average",
            (GradeScale::Engine, Grade::D) => "Below Average",
            (GradeScale::Engine, Grade::F) => "Poor",
            (GradeScale::Unified, Grade::C) => "Fair",
            (GradeScale::Unified, Grade::D) => "Poor",
            (GradeScale::Unified, Grade::F) => "Failing",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_grade_banding() {
        let scores = [90, 89, 80, 79, 70, 69, 60, 59];
        let grades: Vec<Grade> = scores
            .iter()
            .map(|s| GradeScale::Engine.grade(*s))
            .collect();
        assert_eq!(
            grades,
            vec![
                Grade::A,
                Grade::B,
                Grade::B,
                Grade::C,
                Grade::C,
                Grade::D,
                Grade::D,
                Grade::F
            ]
        );
    }

    #[test]
    fn test_unified_grade_banding() {
        let scores = [90, 89, 75, 74, 60, 59, 50, 49];
        let grades: Vec<Grade> = scores
            .iter()
            .map(|s| GradeScale::Unified.grade(*s))
            .collect();
        assert_eq!(
            grades,
            vec![
                Grade::A,
                Grade::B,
                Grade::B,
                Grade::C,
                Grade::C,
                Grade::D,
                Grade::D,
                Grade::F
            ]
        );
        assert_eq!(GradeScale::Unified.description(Grade::F), "Failing");
        assert_eq!(GradeScale::Engine.description(Grade::C), "Average");
    }

    #[test]
    fn test_violation_id_is_stable() {
        let a = Violation::new(
            "RULE",
            Category::Design,
            Severity::High,
            5,
            "Title",
            Location::table("Sales"),
        );
        let b = Violation::new(
            "RULE",
            Category::Design,
            Severity::High,
            5,
            "Title",
            Location::table("Sales"),
        );
        assert_eq!(a.id, b.id);
        assert_eq!(a.id.len(), 16);
    }

    #[test]
    fn test_impact_is_clamped() {
        let v = Violation::new("R", Category::Design, Severity::Low, 42, "t", Location::Model);
        assert_eq!(v.impact, 10);
        assert!((v.raw_penalty() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_location_display() {
        assert_eq!(
            Location::column("Sales", "Amount").to_string(),
            "Table: Sales, Column: Amount"
        );
        let step = Location::QueryStep {
            query: "Sales.Partition".into(),
            step: 3,
            name: "Custom".into(),
        };
        assert_eq!(step.to_string(), "Query: Sales.Partition, Step 3 (Custom)");
    }

    #[test]
    fn test_issues_by_severity() {
        let summary = IssuesBySeverity::from_severities([
            Severity::High,
            Severity::High,
            Severity::Info,
        ]);
        assert_eq!(summary.high, 2);
        assert_eq!(summary.total(), 3);
        assert!(summary.any_at_or_above(Severity::Medium));
        assert!(!summary.any_at_or_above(Severity::Critical));
    }

    #[test]
    fn test_category_serializes_as_label() {
        let json = serde_json::to_string(&Category::Design).unwrap();
        assert_eq!(json, "\"Model Design\"");
        let parsed: Category = serde_json::from_str("\"best_practices\"").unwrap();
        assert_eq!(parsed, Category::BestPractices);
    }
}
