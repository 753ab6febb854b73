//! Analysis configuration support
//!
//! Loads per-directory configuration from `model-health.toml` or
//! `.modelhealthrc.json`.
//!
//! # Configuration Format
//!
//! ```toml
//! # model-health.toml
//!
//! [scoring]
//! max_score = 100
//! model_weights = { performance = 0.30, design = 0.15 }
//! unified_weights = { query_folding = 0.25 }
//!
//! [rules.AVOID_NOW_TODAY]
//! enabled = false
//!
//! [defaults]
//! format = "json"
//! workers = 4
//! ```

use crate::models::Category;
use crate::rules::Engine;
use crate::scoring::{UnifiedBucket, UnifiedWeights};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::path::Path;
use tracing::{debug, warn};

pub const CONFIG_FILE: &str = "model-health.toml";
pub const JSON_CONFIG_FILE: &str = ".modelhealthrc.json";

/// Configuration threaded through one analysis run
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AnalysisConfig {
    /// Score ceiling and weight overrides
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Per-rule overrides, keyed by normalized rule id
    #[serde(default, deserialize_with = "normalized_rules")]
    pub rules: BTreeMap<String, RuleConfigOverride>,

    /// Default CLI flags
    #[serde(default)]
    pub defaults: CliDefaults,
}

/// Configuration override for a specific rule
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RuleConfigOverride {
    /// Whether the rule runs (default: true)
    #[serde(default)]
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_max_score")]
    pub max_score: u32,

    /// Structural engine category weights
    #[serde(default, deserialize_with = "non_negative_weights")]
    pub model_weights: BTreeMap<Category, f64>,

    /// Query engine category weights
    #[serde(default, deserialize_with = "non_negative_weights")]
    pub query_weights: BTreeMap<Category, f64>,

    /// AI-readiness engine category weights
    #[serde(default, deserialize_with = "non_negative_weights")]
    pub ai_weights: BTreeMap<Category, f64>,

    /// Outer weights of the unified report
    #[serde(default, deserialize_with = "non_negative_weights")]
    pub unified_weights: BTreeMap<UnifiedBucket, f64>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            max_score: default_max_score(),
            model_weights: BTreeMap::new(),
            query_weights: BTreeMap::new(),
            ai_weights: BTreeMap::new(),
            unified_weights: BTreeMap::new(),
        }
    }
}

fn default_max_score() -> u32 {
    100
}

/// Weight maps keep only finite, non-negative entries
fn non_negative_weights<'de, D, K>(deserializer: D) -> Result<BTreeMap<K, f64>, D::Error>
where
    D: Deserializer<'de>,
    K: Deserialize<'de> + Ord + Debug,
{
    let raw = BTreeMap::<K, f64>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter(|(key, weight)| {
            let keep = weight.is_finite() && *weight >= 0.0;
            if !keep {
                warn!("Ignoring invalid weight {} for {:?}", weight, key);
            }
            keep
        })
        .collect())
}

/// Rule overrides keyed by normalized id. When spellings of one id
/// disagree, `enabled = false` wins.
fn normalized_rules<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<String, RuleConfigOverride>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, RuleConfigOverride>::deserialize(deserializer)?;
    let mut rules: BTreeMap<String, RuleConfigOverride> = BTreeMap::new();
    for (key, rule) in raw {
        let id = normalize_rule_id(&key);
        match rules.get_mut(&id) {
            Some(existing) => {
                if existing.enabled.is_some()
                    && rule.enabled.is_some()
                    && existing.enabled != rule.enabled
                {
                    warn!("Conflicting overrides for rule {}, keeping it disabled", id);
                }
                existing.enabled = match (existing.enabled, rule.enabled) {
                    (Some(false), _) | (_, Some(false)) => Some(false),
                    (Some(true), _) | (_, Some(true)) => Some(true),
                    (None, None) => None,
                };
            }
            None => {
                rules.insert(id, rule);
            }
        }
    }
    Ok(rules)
}

impl ScoringConfig {
    /// Engine defaults overlaid with the configured overrides
    pub fn weights_for(&self, engine: Engine) -> BTreeMap<Category, f64> {
        let overrides = match engine {
            Engine::Model => &self.model_weights,
            Engine::Query => &self.query_weights,
            Engine::AiReadiness => &self.ai_weights,
        };
        let mut weights = engine.default_weights();
        weights.extend(overrides.iter().map(|(c, w)| (*c, *w)));
        weights
    }

    /// Outer weights, defaults overlaid with overrides, normalized to 1
    pub fn unified_weights(&self) -> UnifiedWeights {
        let mut weights = UnifiedWeights::default();
        for (bucket, weight) in &self.unified_weights {
            weights.set(*bucket, *weight);
        }
        weights.normalized()
    }
}

/// Default CLI flags that can be set in the config file
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CliDefaults {
    /// Default output format (text, json, markdown)
    #[serde(default)]
    pub format: Option<String>,

    /// Default number of rule workers
    #[serde(default)]
    pub workers: Option<usize>,
}

impl AnalysisConfig {
    /// Check if a rule is enabled (defaults to true if not specified)
    pub fn is_rule_enabled(&self, id: &str) -> bool {
        self.rules
            .get(&normalize_rule_id(id))
            .and_then(|rule| rule.enabled)
            .unwrap_or(true)
    }

    /// Ids explicitly disabled in the config, normalized
    pub fn disabled_rules(&self) -> Vec<String> {
        self.rules
            .iter()
            .filter(|(_, rule)| rule.enabled == Some(false))
            .map(|(id, _)| id.clone())
            .collect()
    }
}

/// Upper-case with `-` folded into `_`
pub fn normalize_rule_id(id: &str) -> String {
    id.trim().to_uppercase().replace('-', "_")
}

/// Load analysis configuration from a directory.
///
/// Searches for configuration files in this order:
/// 1. `model-health.toml`
/// 2. `.modelhealthrc.json`
///
/// Returns default configuration if no config file is found or loadable.
pub fn load_analysis_config(dir: &Path) -> AnalysisConfig {
    let toml_path = dir.join(CONFIG_FILE);
    if toml_path.exists() {
        match load_toml_config(&toml_path) {
            Ok(config) => {
                debug!("Loaded config from {}", toml_path.display());
                return config;
            }
            Err(e) => {
                warn!("Failed to load {}: {}", toml_path.display(), e);
            }
        }
    }

    let json_path = dir.join(JSON_CONFIG_FILE);
    if json_path.exists() {
        match load_json_config(&json_path) {
            Ok(config) => {
                debug!("Loaded config from {}", json_path.display());
                return config;
            }
            Err(e) => {
                warn!("Failed to load {}: {}", json_path.display(), e);
            }
        }
    }

    debug!("No config found in {}, using defaults", dir.display());
    AnalysisConfig::default()
}

fn load_toml_config(path: &Path) -> anyhow::Result<AnalysisConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: AnalysisConfig = toml::from_str(&content)?;
    Ok(config)
}

fn load_json_config(path: &Path) -> anyhow::Result<AnalysisConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: AnalysisConfig = serde_json::from_str(&content)?;
    Ok(config)
}

/// Commented starter file written by `model-health init`
pub const SAMPLE_CONFIG: &str = r#"# model-health configuration

[scoring]
# Score ceiling for every engine report
max_score = 100

# Category weights per engine. Missing categories keep their defaults.
# Keys: performance, design, relationships, measures, best_practices,
# naming, documentation, query_folding, data_quality, error_handling,
# security, ai_navigation, ai_documentation, ai_naming, ai_complexity,
# ai_data_quality, ai_relationships
# model_weights = { performance = 0.25, design = 0.20 }
# query_weights = { query_folding = 0.20 }

# Outer weights of the unified report, normalized to sum to 1.
# Keys: model_design, relationships, dax_measures, mcode_performance,
# query_folding, documentation, naming, security
# unified_weights = { mcode_performance = 0.20 }

# Disable a rule by id
# [rules.AVOID_NOW_TODAY]
# enabled = false

[defaults]
# format = "text"
# workers = 1
"#;
