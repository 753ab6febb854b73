//! model-health - rule-based health scoring for Power BI semantic models
//!
//! Normalizes a TMDL-like text export or a TMSL-like JSON definition into
//! one [`graph::Model`], runs the structural, Power Query and AI-readiness
//! rule catalogs over it and scores the violations into graded reports.
//!
//! ```no_run
//! use model_health::parsers::FormatHint;
//! use model_health::report::normalize_and_score;
//!
//! let raw = std::fs::read("model.bim")?;
//! let report = normalize_and_score(&raw, FormatHint::Auto)?;
//! println!("{} ({})", report.score, report.grade);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cli;
pub mod config;
pub mod graph;
pub mod models;
pub mod parsers;
pub mod report;
pub mod reporters;
pub mod rules;
pub mod scoring;

pub use parsers::{normalize, FormatHint, NormalizeError};
pub use report::{
    analyze_unified, normalize_and_score, normalize_and_score_with, AnalysisOutcome, Report,
};
pub use scoring::{combine_reports, UnifiedReport, UnifiedWeights};
