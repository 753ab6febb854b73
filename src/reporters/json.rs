//! JSON reporter
//!
//! Outputs the full report as pretty-printed JSON.
//! Useful for machine consumption, piping to jq, or further processing.

use super::AnalysisReport;
use anyhow::Result;
use serde::Serialize;

/// Render any serializable report as JSON
pub fn render<T: Serialize + ?Sized>(report: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Render report as compact JSON (single line)
pub fn render_compact(report: &AnalysisReport) -> Result<String> {
    Ok(serde_json::to_string(report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporters::tests::{test_report, test_unified_report};

    #[test]
    fn test_json_render_engine_report() {
        let report = test_report();
        let json_str = render(&report).expect("render JSON");
        let parsed: serde_json::Value = serde_json::from_str(&json_str).expect("parse JSON");
        assert_eq!(parsed["engine"], "model");
        assert!(parsed["category_scores"]["Model Design"]["percentage"].is_u64());
        assert!(!parsed["issues"].as_array().expect("issues array").is_empty());
    }

    #[test]
    fn test_json_render_unified_report() {
        let report = test_unified_report();
        let json_str = render(&report).expect("render JSON");
        let parsed: serde_json::Value = serde_json::from_str(&json_str).expect("parse JSON");
        assert!(parsed.get("engine").is_none());
        assert!(parsed["category_scores"]["M-Code Performance"].is_u64());
        assert_eq!(parsed["issues"][0]["source"], "Model");
        assert!(parsed["ai_report"].is_object());
    }

    #[test]
    fn test_json_render_compact() {
        let report = test_report();
        let json_str = render_compact(&report).expect("render compact JSON");
        assert!(!json_str.contains('\n'));
        let _: serde_json::Value = serde_json::from_str(&json_str).expect("parse compact JSON");
    }
}
