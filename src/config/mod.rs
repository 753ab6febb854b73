//! Configuration module for model-health
//!
//! This module handles:
//! - Directory-level configuration (model-health.toml)
//! - Rule enable/disable overrides
//! - Scoring weight customization
//! - CLI defaults

mod analysis_config;

pub use analysis_config::{
    AnalysisConfig,
    CliDefaults,
    RuleConfigOverride,
    ScoringConfig,
    CONFIG_FILE,
    JSON_CONFIG_FILE,
    SAMPLE_CONFIG,
    load_analysis_config,
    normalize_rule_id,
};
