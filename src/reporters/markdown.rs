//! Markdown reporter for GitHub-flavored Markdown output
//!
//! Generates reports suitable for:
//! - Pull request comments on model repositories
//! - Wikis and model documentation

use super::AnalysisReport;
use crate::models::{Grade, Severity, Violation};
use anyhow::Result;
use chrono::Local;

/// Maximum findings to show per severity level
const MAX_FINDINGS_PER_SEVERITY: usize = 10;

/// Render report as GitHub-flavored Markdown
pub fn render(report: &AnalysisReport) -> Result<String> {
    let mut md = String::new();

    md.push_str(&render_header(report));
    md.push('\n');

    md.push_str(&render_summary(report));
    md.push('\n');

    md.push_str(&render_category_scores(report));
    md.push('\n');

    md.push_str(&render_statistics(report));
    md.push('\n');

    md.push_str(&render_recommendations(report));
    md.push('\n');

    md.push_str(&render_findings_summary(report));
    md.push('\n');

    md.push_str(&render_detailed_findings(report));
    md.push('\n');

    md.push_str("---\n\n*Generated by model-health*\n");

    Ok(md)
}

fn render_header(report: &AnalysisReport) -> String {
    let grade_emoji = match report.grade() {
        Grade::A => "🏆",
        Grade::B => "⭐",
        Grade::C => "⚠️",
        Grade::D => "❌",
        Grade::F => "💀",
    };

    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");

    format!(
        "# {} {}\n\n**Grade: {}** | **Score: {}/{}**\n\nGenerated: {}\n",
        grade_emoji,
        report.title(),
        report.grade(),
        report.score(),
        report.max_score(),
        timestamp
    )
}

fn render_summary(report: &AnalysisReport) -> String {
    let mut md = format!(
        "## Summary\n\n| Metric | Value |\n|--------|-------|\n\
         | **Grade** | {} ({}) |\n| **Score** | {}/{} |\n| **Total Issues** | {} |\n",
        report.grade(),
        report.grade_description(),
        report.score(),
        report.max_score(),
        report.issues_by_severity().total()
    );
    if let Some(level) = report.readiness_level() {
        md.push_str(&format!("| **AI Readiness** | {} |\n", level));
    }
    md
}

fn render_category_scores(report: &AnalysisReport) -> String {
    let rows = report.category_rows();
    let mut md = String::from("## Category Scores\n\n");
    if rows.is_empty() {
        md.push_str("No weighted categories.\n");
        return md;
    }

    md.push_str("| Category | Score | Issues | Status |\n|----------|-------|--------|--------|\n");
    for row in rows {
        let issues = row
            .issues_count
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-".to_string());
        md.push_str(&format!(
            "| {} | {}% | {} | {} |\n",
            row.label,
            row.percentage,
            issues,
            score_indicator(row.percentage)
        ));
    }
    md
}

fn render_statistics(report: &AnalysisReport) -> String {
    let mut md = String::from("## Statistics\n\n| Metric | Value |\n|--------|-------|\n");
    for (key, value) in report.statistics() {
        md.push_str(&format!("| {} | {} |\n", key, value));
    }
    md
}

fn render_recommendations(report: &AnalysisReport) -> String {
    let mut md = String::from("## Top Recommendations\n\n");
    let recommendations = report.top_recommendations();
    if recommendations.is_empty() {
        md.push_str("No critical or high severity recommendations.\n");
    }
    for (i, rec) in recommendations.iter().enumerate() {
        md.push_str(&format!("{}. {}\n", i + 1, rec));
    }
    md
}

fn render_findings_summary(report: &AnalysisReport) -> String {
    let counts = report.issues_by_severity();
    let mut md = String::from("## Findings Summary\n\n| Severity | Count | |\n|----------|-------|---|\n");
    for severity in Severity::ALL {
        md.push_str(&format!(
            "| {} | {} | {} |\n",
            severity,
            counts.count(severity),
            severity_emoji(severity)
        ));
    }
    md.push_str(&format!("| **Total** | **{}** | |\n", counts.total()));
    md
}

fn render_detailed_findings(report: &AnalysisReport) -> String {
    let mut md = String::from("## Detailed Findings\n\n");

    let issues = report.issues();
    if issues.is_empty() {
        md.push_str("✅ No issues found! The model is in great shape.\n");
        return md;
    }

    for severity in Severity::ALL {
        let findings: Vec<_> = issues
            .iter()
            .filter(|(_, v)| v.severity == severity)
            .collect();

        if findings.is_empty() {
            continue;
        }

        md.push_str(&format!(
            "### {} {} Findings ({})\n\n",
            severity_emoji(severity),
            severity,
            findings.len()
        ));

        for (source, violation) in findings.iter().take(MAX_FINDINGS_PER_SEVERITY) {
            md.push_str(&render_finding(*source, violation));
        }

        let hidden = findings.len().saturating_sub(MAX_FINDINGS_PER_SEVERITY);
        if hidden > 0 {
            md.push_str(&format!(
                "*...and {} more {} findings*\n\n",
                hidden,
                severity.to_string().to_lowercase()
            ));
        }
    }

    md
}

fn render_finding(source: Option<&str>, violation: &Violation) -> String {
    let mut md = format!("#### {}\n\n`{}`", violation.title, violation.rule_id);
    if let Some(source) = source {
        md.push_str(&format!(" ({})", source));
    }
    md.push_str(&format!(" at `{}`\n\n", violation.location));

    if !violation.description.is_empty() {
        md.push_str(&format!("{}\n\n", violation.description));
    }
    if !violation.recommendation.is_empty() {
        md.push_str(&format!("> **💡 Fix:** {}\n\n", violation.recommendation));
    }
    md
}

fn score_indicator(percentage: u32) -> &'static str {
    if percentage >= 80 {
        "✅ Good"
    } else if percentage >= 60 {
        "⚠️ Fair"
    } else {
        "❌ Poor"
    }
}

fn severity_emoji(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "🔴",
        Severity::High => "🟠",
        Severity::Medium => "🟡",
        Severity::Low => "🔵",
        Severity::Info => "ℹ️",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporters::tests::{test_report, test_unified_report};

    #[test]
    fn test_markdown_render_has_header() {
        let report = test_report();
        let md = render(&report).unwrap();
        assert!(md.starts_with("# "));
        assert!(md.contains(&format!("Grade: {}", report.grade())));
        assert!(md.contains(&format!("{}/100", report.score())));
    }

    #[test]
    fn test_markdown_render_has_findings() {
        let report = test_report();
        let md = render(&report).unwrap();
        assert!(md.contains("## Detailed Findings"));
        assert!(md.contains("MODEL_BASELINE"));
    }

    #[test]
    fn test_markdown_unified_tags_sources() {
        let report = test_unified_report();
        let md = render(&report).unwrap();
        assert!(md.contains("Query Folding"));
        assert!(md.contains("(Model) at `"));
        assert!(md.contains("| **AI Readiness** |"));
    }

    #[test]
    fn test_score_indicator_bands() {
        assert_eq!(score_indicator(80), "✅ Good");
        assert_eq!(score_indicator(79), "⚠️ Fair");
        assert_eq!(score_indicator(59), "❌ Poor");
    }
}
