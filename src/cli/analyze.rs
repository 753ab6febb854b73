//! Analyze command - normalize a model file and report its health

use crate::config::load_analysis_config;
use crate::models::Severity;
use crate::parsers::{normalize, FormatHint, NormalizeError};
use crate::report::{analyze_model_unified, run_engine, AnalysisOutcome, Report};
use crate::reporters::{self, AnalysisReport, OutputFormat};
use crate::rules::Engine;
use anyhow::{Context, Result};
use console::style;
use std::path::Path;
use std::str::FromStr;
use tracing::{error, info};

/// Run the analyze command
#[allow(clippy::too_many_arguments)]
pub fn run(
    file: &Path,
    input_format: &str,
    engine: &str,
    format: Option<&str>,
    output: Option<&Path>,
    fail_on: Option<&str>,
    config_dir: Option<&Path>,
    workers: Option<usize>,
) -> Result<()> {
    let config_dir = match config_dir {
        Some(dir) => dir.to_path_buf(),
        None => file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf(),
    };
    let mut config = load_analysis_config(&config_dir);
    if workers.is_some() {
        config.defaults.workers = workers;
    }

    let format = format
        .or(config.defaults.format.as_deref())
        .unwrap_or("text");
    let output_format = OutputFormat::from_str(format)?;
    let hint = FormatHint::from_str(input_format)?;
    let fail_threshold = fail_on.map(Severity::from_str).transpose()?;

    let raw = std::fs::read(file)
        .with_context(|| format!("Failed to read model file: {}", file.display()))?;
    info!("Read {} bytes from {}", raw.len(), file.display());

    let model = match normalize(&raw, hint) {
        Ok(model) => model,
        Err(e) => {
            report_normalize_error(e, output_format, output)?;
            std::process::exit(1);
        }
    };

    let report: AnalysisReport = if engine.eq_ignore_ascii_case("unified") {
        analyze_model_unified(&model, &config).into()
    } else {
        run_engine(&model, Engine::from_str(engine)?, &config).into()
    };

    let rendered = reporters::report_with_format(&report, output_format)?;
    write_output(&rendered, output)?;

    check_fail_threshold(fail_threshold, &report);
    Ok(())
}

fn report_normalize_error(
    e: NormalizeError,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    error!("{} ({})", e, e.kind());
    match format {
        OutputFormat::Json => {
            let outcome = AnalysisOutcome::<Report>::from_result(Err(e));
            write_output(&reporters::render_json(&outcome)?, output)
        }
        _ => {
            eprintln!("{} {}", style("error:").red().bold(), e);
            Ok(())
        }
    }
}

fn write_output(rendered: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            eprintln!(
                "{} Report written to {}",
                style("✓").green(),
                style(path.display()).cyan()
            );
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

/// Exit with status 1 if any issue meets the threshold
fn check_fail_threshold(threshold: Option<Severity>, report: &AnalysisReport) {
    if let Some(threshold) = threshold {
        if report.has_issue_at_or_above(threshold) {
            eprintln!(
                "Failing due to --fail-on={} threshold",
                threshold.to_string().to_lowercase()
            );
            std::process::exit(1);
        }
    }
}
