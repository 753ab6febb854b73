//! Model Health Scoring
//!
//! Converts violations into a bounded score and a letter grade, then
//! recombines engine reports into the unified score.
//!
//! # Scoring Formula
//!
//! ```text
//! Engine Score = max(0, round(max_score − Σ min(raw × weight, max_score × 0.30)))
//!
//! Where per category:
//!   raw = Σ impact × multiplier
//!   multiplier: Critical 1.5, High 1.0, Medium 0.7, Low 0.3, Info 0.0
//!
//! Unified Score = round(Σ bucket_percentage / 100 × outer_weight × 100)
//! ```
//!
//! # Grades
//!
//! - Engine reports: 90 / 80 / 70 / 60
//! - Unified report: 90 / 75 / 60 / 50
//!
//! # Example
//!
//! A model with one High Design issue (impact 6) and one Medium Best
//! Practices issue (impact 4) under the default structural weights:
//! 100 − (6 × 1.0 × 0.20 + 4 × 0.7 × 0.10) = 98.52, which rounds to 99 (A).

mod aggregator;
mod combiner;

pub use aggregator::{
    score, CategoryPenalty, CategoryScore, ScoreBreakdown, ScoringAggregator, CATEGORY_CAP,
};
pub use combiner::{
    combine_reports, unified_score, IssueSource, UnifiedBucket, UnifiedIssue, UnifiedReport,
    UnifiedWeights,
};
