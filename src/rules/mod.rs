//! Rule catalogs
//!
//! This module provides the rule framework and the three catalogs that
//! run against a normalized [`Model`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       RuleEngine                            │
//! │  - Registers rules in catalog order                         │
//! │  - Runs them sequentially or on a rayon pool                │
//! │  - Records failing rules, keeps the rest                    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Rule Trait                          │
//! │  - id(): Unique identifier                                  │
//! │  - category(): Scoring bucket                               │
//! │  - check(model): Return own violations                      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!              ┌───────────────┼───────────────┐
//!              ▼               ▼               ▼
//! ┌──────────────────┐ ┌──────────────┐ ┌──────────────────┐
//! │ Structural       │ │ Query (M)    │ │ AI readiness     │
//! │ (baseline,       │ │ (folding,    │ │ (descriptions,   │
//! │  semantic, BPA,  │ │  errors,     │ │  naming,         │
//! │  DAX)            │ │  security)   │ │  complexity)     │
//! └──────────────────┘ └──────────────┘ └──────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use model_health::rules::{catalog_for, Engine, RuleEngineBuilder};
//!
//! let engine = RuleEngineBuilder::new()
//!     .workers(4)
//!     .rules(catalog_for(Engine::Model, &config))
//!     .build();
//! let evaluation = engine.evaluate(&model);
//! ```

mod base;
mod engine;

mod ai_readiness;
mod baseline;
mod bpa;
mod dax;
mod mquery;
mod semantic;

pub use ai_readiness::{checklist, readiness_level, ChecklistItem};
pub use base::{CheckFn, Evaluation, EvaluationSummary, FnRule, Rule, RuleFailure, RuleResult};
pub use engine::{RuleEngine, RuleEngineBuilder};
pub use mquery::query_statistics;

use crate::config::AnalysisConfig;
use crate::graph::{Relationship, Table};
use crate::models::{Category, Location};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// The specialized engines, each with its own catalog and weights
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Engine {
    /// Structural model checks (semantic, BPA and DAX rules)
    Model,
    /// Power Query (M) checks
    Query,
    AiReadiness,
}

impl Engine {
    pub const ALL: [Engine; 3] = [Engine::Model, Engine::Query, Engine::AiReadiness];

    pub fn name(self) -> &'static str {
        match self {
            Engine::Model => "model",
            Engine::Query => "query",
            Engine::AiReadiness => "ai",
        }
    }

    /// Every rule of this engine, in evaluation order
    pub fn catalog(self) -> Vec<Arc<dyn Rule>> {
        match self {
            Engine::Model => {
                let mut rules = baseline::rules();
                rules.extend(semantic::rules());
                rules.extend(bpa::rules());
                rules.extend(dax::rules());
                rules
            }
            Engine::Query => mquery::rules(),
            Engine::AiReadiness => ai_readiness::rules(),
        }
    }

    /// Built-in category weights
    pub fn default_weights(self) -> BTreeMap<Category, f64> {
        let table: &[(Category, f64)] = match self {
            Engine::Model => &[
                (Category::Performance, 0.25),
                (Category::Design, 0.20),
                (Category::Relationships, 0.20),
                (Category::Measures, 0.15),
                (Category::BestPractices, 0.10),
                (Category::Naming, 0.05),
                (Category::Documentation, 0.05),
            ],
            Engine::Query => &[
                (Category::Performance, 0.25),
                (Category::QueryFolding, 0.20),
                (Category::DataQuality, 0.15),
                (Category::ErrorHandling, 0.15),
                (Category::BestPractices, 0.10),
                (Category::Security, 0.10),
                (Category::Naming, 0.03),
                (Category::Documentation, 0.02),
            ],
            Engine::AiReadiness => &[
                (Category::AiNavigation, 1.0),
                (Category::AiDocumentation, 1.0),
                (Category::AiNaming, 1.0),
                (Category::AiComplexity, 1.0),
                (Category::AiDataQuality, 1.0),
                (Category::AiRelationships, 1.0),
            ],
        };
        table.iter().copied().collect()
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Engine {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "model" | "semantic" => Ok(Engine::Model),
            "query" | "mcode" | "m" => Ok(Engine::Query),
            "ai" | "ai_readiness" | "copilot" => Ok(Engine::AiReadiness),
            _ => Err(anyhow::anyhow!(
                "Unknown engine '{}'. Valid: model, query, ai",
                s
            )),
        }
    }
}

/// The engine's catalog minus rules disabled in `config`
pub fn catalog_for(engine: Engine, config: &AnalysisConfig) -> Vec<Arc<dyn Rule>> {
    engine
        .catalog()
        .into_iter()
        .filter(|rule| config.is_rule_enabled(rule.id()))
        .collect()
}

pub(crate) fn relationship_location(rel: &Relationship) -> Location {
    Location::Relationship {
        name: rel.name.clone(),
        from: rel.from_ref(),
        to: rel.to_ref(),
    }
}

/// Lower-cased name contains any of the fragments
pub(crate) fn name_has_any(name: &str, fragments: &[&str]) -> bool {
    let lower = name.to_lowercase();
    fragments.iter().any(|f| lower.contains(f))
}

/// Names joined with ", ", cut to `limit` with a trailing "..."
pub(crate) fn preview(names: &[String], limit: usize) -> String {
    let shown = names
        .iter()
        .take(limit)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if names.len() > limit {
        format!("{shown}...")
    } else {
        shown
    }
}

/// Relationship endpoint tables in first-appearance order:
/// (from-side set, to-side set, tables on both sides)
pub(crate) fn endpoint_tables(relationships: &[Relationship]) -> (Vec<&str>, Vec<&str>, Vec<&str>) {
    let mut from = Vec::new();
    let mut to = Vec::new();
    for rel in relationships {
        if !from.contains(&rel.from_table.as_str()) {
            from.push(rel.from_table.as_str());
        }
        if !to.contains(&rel.to_table.as_str()) {
            to.push(rel.to_table.as_str());
        }
    }

    let mut both = Vec::new();
    for rel in relationships {
        for name in [rel.from_table.as_str(), rel.to_table.as_str()] {
            if from.contains(&name) && to.contains(&name) && !both.contains(&name) {
                both.push(name);
            }
        }
    }
    (from, to, both)
}

pub(crate) fn table_ref(table: &Table, column: &str) -> String {
    format!("{}[{}]", table.name, column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_rule_ids_are_unique_per_engine() {
        for engine in Engine::ALL {
            let catalog = engine.catalog();
            let ids: HashSet<&str> = catalog.iter().map(|r| r.id()).collect();
            assert_eq!(ids.len(), catalog.len(), "duplicate id in {engine}");
        }
    }

    #[test]
    fn test_catalog_sizes() {
        assert_eq!(Engine::Model.catalog().len(), 49);
        assert_eq!(Engine::Query.catalog().len(), 20);
        assert_eq!(Engine::AiReadiness.catalog().len(), 15);
    }

    #[test]
    fn test_baseline_runs_first() {
        assert_eq!(Engine::Model.catalog()[0].id(), "MODEL_BASELINE");
    }

    #[test]
    fn test_rule_categories_carry_weight() {
        for engine in Engine::ALL {
            let weights = engine.default_weights();
            for rule in engine.catalog() {
                assert!(
                    weights.contains_key(&rule.category()),
                    "{} is scored under an unweighted category",
                    rule.id()
                );
            }
        }
    }

    #[test]
    fn test_engine_from_str() {
        assert_eq!("AI".parse::<Engine>().unwrap(), Engine::AiReadiness);
        assert_eq!("query".parse::<Engine>().unwrap(), Engine::Query);
        assert!("bogus".parse::<Engine>().is_err());
    }

    #[test]
    fn test_endpoint_tables_order() {
        let rels = vec![
            Relationship::new(("Sales", "ProductKey"), ("Product", "ProductKey")),
            Relationship::new(("Product", "CategoryKey"), ("Category", "CategoryKey")),
            Relationship::new(("Category", "GroupKey"), ("Group", "GroupKey")),
        ];
        let (from, to, both) = endpoint_tables(&rels);
        assert_eq!(from, vec!["Sales", "Product", "Category"]);
        assert_eq!(to, vec!["Product", "Category", "Group"]);
        assert_eq!(both, vec!["Product", "Category"]);
    }

    #[test]
    fn test_preview() {
        let names: Vec<String> = (1..=7).map(|i| format!("T{i}")).collect();
        assert_eq!(preview(&names, 5), "T1, T2, T3, T4, T5...");
        assert_eq!(preview(&names[..2], 5), "T1, T2");
    }
}
