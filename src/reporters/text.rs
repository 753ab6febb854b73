//! Text (terminal) reporter with colors and formatting

use super::AnalysisReport;
use crate::models::{Grade, Severity};
use anyhow::Result;
use console::{style, StyledObject};

/// Issues listed before the summary line
const MAX_LISTED_ISSUES: usize = 15;

fn grade_styled(grade: Grade) -> StyledObject<String> {
    let s = style(grade.to_string()).bold();
    match grade {
        Grade::A => s.green(),
        Grade::B => s.green().bright(),
        Grade::C => s.yellow(),
        Grade::D => s.red().bright(),
        Grade::F => s.red(),
    }
}

fn severity_tag(severity: Severity) -> StyledObject<&'static str> {
    match severity {
        Severity::Critical => style("[C]").red(),
        Severity::High => style("[H]").red().bright(),
        Severity::Medium => style("[M]").yellow(),
        Severity::Low => style("[L]").blue(),
        Severity::Info => style("[I]").dim(),
    }
}

fn percentage_bar(percentage: u32) -> String {
    let filled = (percentage.min(100) / 10) as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
}

/// Render report as formatted terminal output
pub fn render(report: &AnalysisReport) -> Result<String> {
    let mut out = String::new();

    // Header
    out.push_str(&format!("\n{}\n", style(report.title()).bold()));
    out.push_str(&format!(
        "{}\n",
        style("──────────────────────────────────────").dim()
    ));
    out.push_str(&format!(
        "Score: {}  Grade: {} ({})",
        style(format!("{}/{}", report.score(), report.max_score())).bold(),
        grade_styled(report.grade()),
        report.grade_description()
    ));
    if let Some(level) = report.readiness_level() {
        out.push_str(&format!("  AI readiness: {}", style(level).cyan()));
    }
    out.push_str("\n\n");

    // Statistics
    let stats = report.statistics();
    if !stats.is_empty() {
        let parts: Vec<String> = stats.iter().map(|(k, v)| format!("{k}: {v}")).collect();
        out.push_str(&format!("{}\n  {}\n\n", style("STATISTICS").bold(), parts.join("  ")));
    }

    // Category scores
    let rows = report.category_rows();
    if !rows.is_empty() {
        out.push_str(&format!("{}\n", style("SCORES").bold()));
        for row in rows {
            let issues = row
                .issues_count
                .map(|n| format!("  {}", style(format!("{n} issues")).dim()))
                .unwrap_or_default();
            out.push_str(&format!(
                "  {:<24} {} {:>3}%{}\n",
                row.label,
                percentage_bar(row.percentage),
                row.percentage,
                issues
            ));
        }
        out.push('\n');
    }

    // Issues summary
    let counts = report.issues_by_severity();
    out.push_str(&format!(
        "{} ({} total)\n",
        style("ISSUES").bold(),
        counts.total()
    ));

    let summary_parts: Vec<String> = Severity::ALL
        .iter()
        .filter(|s| counts.count(**s) > 0)
        .map(|s| {
            let text = format!("{} {}", counts.count(*s), s.to_string().to_lowercase());
            match s {
                Severity::Critical => style(text).red().to_string(),
                Severity::High => style(text).red().bright().to_string(),
                Severity::Medium => style(text).yellow().to_string(),
                Severity::Low => style(text).blue().to_string(),
                Severity::Info => style(text).dim().to_string(),
            }
        })
        .collect();
    if !summary_parts.is_empty() {
        out.push_str(&format!("  {}\n\n", summary_parts.join(" | ")));
    }

    let issues = report.issues();
    if issues.is_empty() {
        out.push_str(&format!("  {}\n\n", style("No issues found.").green()));
    } else {
        out.push_str(&format!(
            "{}\n",
            style("  #   SEV  TITLE                                     LOCATION").dim()
        ));
        out.push_str(&format!(
            "{}\n",
            style("  ───────────────────────────────────────────────────────────────────").dim()
        ));

        for (i, (source, violation)) in issues.iter().take(MAX_LISTED_ISSUES).enumerate() {
            // chars() keeps multi-byte names intact
            let title: String = if violation.title.chars().count() > 40 {
                let head: String = violation.title.chars().take(37).collect();
                format!("{head}...")
            } else {
                violation.title.clone()
            };
            let location = match source {
                Some(src) => format!("{} [{}]", violation.location, src),
                None => violation.location.to_string(),
            };
            out.push_str(&format!(
                "  {:>3}  {}  {:<40}  {}\n",
                style(i + 1).dim(),
                severity_tag(violation.severity),
                title,
                style(location).dim()
            ));
        }

        let remaining = issues.len().saturating_sub(MAX_LISTED_ISSUES);
        if remaining > 0 {
            out.push_str(&format!(
                "\n  {}\n",
                style(format!("...and {remaining} more (use --format json for all)")).dim()
            ));
        }
        out.push('\n');
    }

    // Recommendations
    let recommendations = report.top_recommendations();
    if !recommendations.is_empty() {
        out.push_str(&format!("{}\n", style("TOP RECOMMENDATIONS").bold()));
        for (i, rec) in recommendations.iter().enumerate() {
            out.push_str(&format!("  {}. {}\n", i + 1, rec));
        }
        out.push('\n');
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporters::tests::{test_report, test_unified_report};

    #[test]
    fn test_text_render_engine_report() {
        let report = test_report();
        let text = render(&report).unwrap();
        assert!(text.contains("Model Health Report"));
        assert!(text.contains("Model Design"));
        assert!(text.contains("ISSUES"));
    }

    #[test]
    fn test_text_render_unified_report() {
        let report = test_unified_report();
        let text = render(&report).unwrap();
        assert!(text.contains("Unified Model Health Report"));
        assert!(text.contains("M-Code Performance"));
        assert!(text.contains("[Model]"));
    }

    #[test]
    fn test_percentage_bar() {
        assert_eq!(percentage_bar(100), "██████████");
        assert_eq!(percentage_bar(45), "████░░░░░░");
        assert_eq!(percentage_bar(0), "░░░░░░░░░░");
    }
}
