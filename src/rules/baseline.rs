//! Fixed penalties for underspecified models
//!
//! A model with no relationships, no measures or a single table can never
//! score a perfect 100.

use super::base::{FnRule, Rule};
use crate::graph::Model;
use crate::models::{Category, Location, Severity, Violation};
use std::sync::Arc;

const ID: &str = "MODEL_BASELINE";

pub fn rules() -> Vec<Arc<dyn Rule>> {
    vec![Arc::new(FnRule::new(
        ID,
        "Baseline penalties for models without relationships, measures or a second table",
        Category::Design,
        Severity::High,
        check,
    ))]
}

fn check(model: &Model) -> Vec<Violation> {
    let mut violations = Vec::new();

    if model.relationships.is_empty() {
        violations.push(
            Violation::new(
                ID,
                Category::Design,
                Severity::High,
                6,
                "No Relationships Defined",
                Location::Model,
            )
            .with_description(
                "The model has no relationships. This usually indicates insufficient dimensional modeling and may lead to poor report behavior.",
            )
            .with_recommendation(
                "Add relationships between fact and dimension tables to model business logic and enable correct filtering.",
            ),
        );
    }

    if model.all_measures().next().is_none() {
        violations.push(
            Violation::new(
                ID,
                Category::BestPractices,
                Severity::Medium,
                4,
                "No Measures Present",
                Location::Model,
            )
            .with_description("No DAX measures found in the model.")
            .with_recommendation(
                "Create measures for core KPIs rather than relying on implicit measures.",
            ),
        );
    }

    if model.tables.len() <= 1 {
        violations.push(
            Violation::new(
                ID,
                Category::Design,
                Severity::Medium,
                3,
                "Single-Table Model",
                Location::Model,
            )
            .with_description(
                "Model contains only one table. Star schemas with separate dimension and fact tables are generally preferred for performance and clarity.",
            )
            .with_recommendation(
                "Consider splitting the model into a fact table and related dimension tables where appropriate.",
            ),
        );
    }

    violations
}
