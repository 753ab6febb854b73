//! Weighted, capped penalty aggregation
//!
//! ```text
//! raw(category)      = Σ impact × severity multiplier
//! weighted(category) = raw × weight
//! capped(category)   = clamp(weighted, 0, max_score × 0.30)
//! score              = max(0, round(max_score − Σ capped))   (ties to even)
//! ```
//!
//! Category display scores use the raw penalty against the category's
//! share of `max_score`, independent of the cap.

use super::combiner::round_half_even;
use crate::models::{Category, Grade, GradeScale, Violation};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Fraction of `max_score` a single category may remove
pub const CATEGORY_CAP: f64 = 0.30;

/// Display breakdown for one weighted category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryScore {
    pub score: u32,
    pub max_score: u32,
    pub percentage: u32,
    pub issues_count: usize,
}

/// Penalty arithmetic for one category
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CategoryPenalty {
    pub raw: f64,
    pub weighted: f64,
    pub capped: f64,
}

/// Complete score with breakdown
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBreakdown {
    pub score: u32,
    pub max_score: u32,
    pub grade: Grade,
    pub category_scores: BTreeMap<Category, CategoryScore>,
    pub penalties: BTreeMap<Category, CategoryPenalty>,
}

pub struct ScoringAggregator<'a> {
    weights: &'a BTreeMap<Category, f64>,
    max_score: u32,
}

impl<'a> ScoringAggregator<'a> {
    pub fn new(weights: &'a BTreeMap<Category, f64>, max_score: u32) -> Self {
        Self { weights, max_score }
    }

    fn weight(&self, category: Category) -> f64 {
        self.weights.get(&category).copied().unwrap_or(0.0)
    }

    /// Score one engine's violations
    pub fn calculate(&self, violations: &[Violation]) -> ScoreBreakdown {
        let max = f64::from(self.max_score);
        let cap = max * CATEGORY_CAP;

        let mut raw: BTreeMap<Category, (f64, usize)> = BTreeMap::new();
        for violation in violations {
            let entry = raw.entry(violation.category).or_default();
            entry.0 += violation.raw_penalty();
            entry.1 += 1;
        }

        let mut penalties = BTreeMap::new();
        for (category, (raw_penalty, _)) in &raw {
            let weighted = raw_penalty * self.weight(*category);
            let capped = weighted.clamp(0.0, cap);
            debug!(
                "{}: raw={:.2} weighted={:.2} capped={:.2}",
                category, raw_penalty, weighted, capped
            );
            penalties.insert(
                *category,
                CategoryPenalty {
                    raw: *raw_penalty,
                    weighted,
                    capped,
                },
            );
        }

        let total_penalty: f64 = penalties.values().map(|p| p.capped).sum();
        let score = round_half_even(max - total_penalty).max(0.0) as u32;
        let grade = GradeScale::Engine.grade(score);

        let category_scores = self
            .weights
            .iter()
            .map(|(category, weight)| {
                let (raw_penalty, issues_count) = raw.get(category).copied().unwrap_or_default();
                (*category, category_score(max * weight, raw_penalty, issues_count))
            })
            .collect();

        ScoreBreakdown {
            score,
            max_score: self.max_score,
            grade,
            category_scores,
            penalties,
        }
    }
}

fn category_score(category_max: f64, raw_penalty: f64, issues_count: usize) -> CategoryScore {
    let remaining = (category_max - raw_penalty).max(0.0);
    let percentage = if category_max > 0.0 {
        (remaining / category_max * 100.0).floor() as u32
    } else {
        100
    };
    CategoryScore {
        score: remaining.floor() as u32,
        max_score: category_max.floor() as u32,
        percentage,
        issues_count,
    }
}

/// Convenience wrapper over [`ScoringAggregator`]
pub fn score(
    violations: &[Violation],
    weights: &BTreeMap<Category, f64>,
    max_score: u32,
) -> ScoreBreakdown {
    ScoringAggregator::new(weights, max_score).calculate(violations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Location, Severity};
    use crate::rules::Engine;

    fn violation(category: Category, severity: Severity, impact: u8) -> Violation {
        Violation::new("R", category, severity, impact, "t", Location::Model)
    }

    #[test]
    fn test_no_violations_scores_max() {
        let weights = Engine::Model.default_weights();
        let breakdown = score(&[], &weights, 100);
        assert_eq!(breakdown.score, 100);
        assert_eq!(breakdown.grade, Grade::A);
        assert_eq!(breakdown.category_scores.len(), 7);
        assert!(breakdown.category_scores.values().all(|c| c.percentage == 100));
    }

    #[test]
    fn test_weighted_penalty() {
        let weights = Engine::Model.default_weights();
        // 100 - (6 × 1.0 × 0.20 + 4 × 0.7 × 0.10) = 98.52
        let violations = vec![
            violation(Category::Design, Severity::High, 6),
            violation(Category::BestPractices, Severity::Medium, 4),
        ];
        let breakdown = score(&violations, &weights, 100);
        assert_eq!(breakdown.score, 99);

        let design = breakdown.category_scores[&Category::Design];
        assert_eq!(design.max_score, 20);
        assert_eq!(design.score, 14);
        assert_eq!(design.percentage, 70);
        assert_eq!(design.issues_count, 1);
    }

    #[test]
    fn test_category_cap() {
        let mut weights = BTreeMap::new();
        weights.insert(Category::Security, 1.0);
        let violations: Vec<Violation> = (0..10)
            .map(|_| violation(Category::Security, Severity::Critical, 10))
            .collect();
        let breakdown = score(&violations, &weights, 100);
        assert_eq!(breakdown.penalties[&Category::Security].capped, 30.0);
        assert_eq!(breakdown.score, 70);
        assert!(breakdown
            .penalties
            .values()
            .all(|p| p.capped <= 100.0 * CATEGORY_CAP));
    }

    #[test]
    fn test_half_point_score_rounds_to_even() {
        let mut weights = BTreeMap::new();
        weights.insert(Category::Security, 1.0);

        // 100 - 1 × 1.5 = 98.5
        let breakdown = score(
            &[violation(Category::Security, Severity::Critical, 1)],
            &weights,
            100,
        );
        assert_eq!(breakdown.score, 98);

        // 100 - 3 × 1.5 = 95.5
        let breakdown = score(
            &[violation(Category::Security, Severity::Critical, 3)],
            &weights,
            100,
        );
        assert_eq!(breakdown.score, 96);
    }

    #[test]
    fn test_negative_weight_never_raises_score() {
        let mut weights = BTreeMap::new();
        weights.insert(Category::Security, -2.0);
        let breakdown = score(
            &[violation(Category::Security, Severity::High, 8)],
            &weights,
            100,
        );
        assert_eq!(breakdown.penalties[&Category::Security].capped, 0.0);
        assert_eq!(breakdown.score, 100);
    }

    #[test]
    fn test_score_never_negative() {
        let weights: BTreeMap<Category, f64> = [
            Category::Performance,
            Category::Design,
            Category::Relationships,
            Category::Measures,
        ]
        .into_iter()
        .map(|c| (c, 5.0))
        .collect();
        let violations: Vec<Violation> = weights
            .keys()
            .map(|c| violation(*c, Severity::Critical, 10))
            .collect();
        let breakdown = score(&violations, &weights, 100);
        assert_eq!(breakdown.score, 0);
        assert_eq!(breakdown.grade, Grade::F);
    }

    #[test]
    fn test_unweighted_category_costs_nothing() {
        let mut weights = BTreeMap::new();
        weights.insert(Category::Design, 0.5);
        let violations = vec![violation(Category::Security, Severity::Critical, 10)];
        let breakdown = score(&violations, &weights, 100);
        assert_eq!(breakdown.score, 100);
        assert!(!breakdown.category_scores.contains_key(&Category::Security));
    }

    #[test]
    fn test_zero_weight_category_displays_full() {
        let mut weights = BTreeMap::new();
        weights.insert(Category::Design, 0.0);
        let breakdown = score(&[violation(Category::Design, Severity::High, 5)], &weights, 100);
        assert_eq!(breakdown.category_scores[&Category::Design].percentage, 100);
    }
}
