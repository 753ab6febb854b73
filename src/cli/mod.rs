//! CLI command definitions and handlers

mod analyze;
mod init;
mod rules;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse and validate workers count (1-64)
fn parse_workers(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n == 0 {
        Err("workers must be at least 1".to_string())
    } else if n > 64 {
        Err("workers cannot exceed 64".to_string())
    } else {
        Ok(n)
    }
}

/// model-health - rule-based health scoring for Power BI semantic models
#[derive(Parser, Debug)]
#[command(name = "model-health")]
#[command(
    version,
    about = "Rule-based health scoring for Power BI semantic models",
    long_about = "model-health normalizes a TMDL-like text export or a TMSL-like JSON \
model definition, runs the structural, Power Query and AI-readiness rule catalogs \
over it and reports weighted scores, grades and prioritized recommendations.",
    after_help = "\
Examples:
  model-health analyze model.tmdl                       Unified report for a text export
  model-health analyze model.bim --format json          JSON output for scripting
  model-health analyze model.bim --engine query         Power Query rules only
  model-health analyze model.bim --fail-on high         Exit code 1 if high+ issues (CI mode)
  model-health rules --engine ai                        List the AI-readiness catalog
  model-health init                                     Write a sample model-health.toml"
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace). RUST_LOG takes precedence.
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Number of parallel rule workers (1-64); overrides the config default
    #[arg(long, global = true, value_parser = parse_workers)]
    pub workers: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a model definition file
    #[command(after_help = "\
Examples:
  model-health analyze model.tmdl
  model-health analyze model.bim --input-format json --engine model
  model-health analyze model.bim --format markdown -o report.md
  model-health analyze model.bim --config ./ci --fail-on critical")]
    Analyze {
        /// Model definition file (TMDL-like text or TMSL-like JSON)
        file: PathBuf,

        /// Input format of FILE
        #[arg(long, default_value = "auto", value_parser = ["auto", "text", "json", "tmdl", "tmsl"])]
        input_format: String,

        /// Engine to run; unified runs all three and combines them
        #[arg(long, short = 'e', default_value = "unified", value_parser = ["model", "query", "ai", "unified"])]
        engine: String,

        /// Output format: text, json, markdown (or md). Defaults to the config value, then text.
        #[arg(long, short = 'f', value_parser = ["text", "json", "markdown", "md"])]
        format: Option<String>,

        /// Output file path (default: stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Exit with code 1 if issues at or above this severity exist
        #[arg(long, value_parser = ["critical", "high", "medium", "low"])]
        fail_on: Option<String>,

        /// Directory holding model-health.toml (default: the directory of FILE)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List rule ids, categories and default severities
    Rules {
        /// Only list one engine's catalog
        #[arg(long, short = 'e', value_parser = ["model", "query", "ai"])]
        engine: Option<String>,
    },

    /// Write a sample model-health.toml
    Init {
        /// Target directory
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Analyze {
            file,
            input_format,
            engine,
            format,
            output,
            fail_on,
            config,
        } => analyze::run(
            &file,
            &input_format,
            &engine,
            format.as_deref(),
            output.as_deref(),
            fail_on.as_deref(),
            config.as_deref(),
            cli.workers,
        ),

        Commands::Rules { engine } => rules::run(engine.as_deref()),

        Commands::Init { dir } => init::run(&dir),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_workers_bounds() {
        assert_eq!(parse_workers("4"), Ok(4));
        assert!(parse_workers("0").is_err());
        assert!(parse_workers("65").is_err());
        assert!(parse_workers("many").is_err());
    }

    #[test]
    fn test_analyze_defaults() {
        let cli = Cli::try_parse_from(["model-health", "analyze", "model.bim"]).unwrap();
        assert_eq!(cli.log_level, "warn");
        assert_eq!(cli.workers, None);
        match cli.command {
            Commands::Analyze {
                engine,
                input_format,
                format,
                ..
            } => {
                assert_eq!(engine, "unified");
                assert_eq!(input_format, "auto");
                assert_eq!(format, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_global_workers_after_subcommand() {
        let cli =
            Cli::try_parse_from(["model-health", "rules", "--workers", "4", "--engine", "ai"])
                .unwrap();
        assert_eq!(cli.workers, Some(4));
    }

    #[test]
    fn test_rejects_unknown_engine() {
        assert!(Cli::try_parse_from(["model-health", "analyze", "m.bim", "--engine", "dax"]).is_err());
    }
}
