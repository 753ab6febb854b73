//! CLI contract tests
//!
//! Runs the model-health binary against the fixture models to verify
//! output formats, engine selection, --fail-on exit codes, config
//! loading and malformed-input handling.

use std::path::{Path, PathBuf};
use std::process::Command;

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_model-health")
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Run the binary and return (exit code, stdout, stderr)
fn run(args: &[&str]) -> (i32, String, String) {
    let output = Command::new(bin())
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run model-health");
    (
        output.status.code().unwrap_or(-1),
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
    )
}

fn analyze_json(file: &Path, extra: &[&str]) -> (i32, serde_json::Value) {
    let file = file.to_str().unwrap();
    let mut args = vec!["analyze", file, "--format", "json"];
    args.extend(extra);
    let (code, stdout, stderr) = run(&args);
    let json = serde_json::from_str(&stdout)
        .unwrap_or_else(|e| panic!("invalid JSON ({e}): {stdout}\nstderr: {stderr}"));
    (code, json)
}

#[test]
fn test_unified_json_by_default() {
    let (code, json) = analyze_json(&fixture("sales.tmdl"), &[]);
    assert_eq!(code, 0);
    assert!(json["score"].as_u64().unwrap() <= 100);
    assert!(json["category_scores"]["Query Folding"].is_u64());
    assert!(json["model_report"].is_object());
    assert!(json["query_report"].is_object());
    assert!(json["ai_report"]["readiness_level"].is_string());
}

#[test]
fn test_engine_selection() {
    let (code, json) = analyze_json(&fixture("sales.json"), &["--engine", "query"]);
    assert_eq!(code, 0);
    assert_eq!(json["engine"], "query");
    assert_eq!(json["statistics"]["total_queries"], 3);

    let (_, json) = analyze_json(&fixture("sales.json"), &["--engine", "ai"]);
    assert_eq!(json["engine"], "ai_readiness");
    assert_eq!(json["checklist"].as_array().unwrap().len(), 8);
}

#[test]
fn test_text_and_json_inputs_report_the_same() {
    let (_, from_text) = analyze_json(&fixture("sales.tmdl"), &["--engine", "model"]);
    let (_, from_json) = analyze_json(&fixture("sales.json"), &["--engine", "model"]);
    assert_eq!(from_text, from_json);
}

#[test]
fn test_text_output() {
    let file = fixture("sales.tmdl");
    let (code, stdout, _) = run(&["analyze", file.to_str().unwrap(), "--engine", "model"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Model Health Report"));
    assert!(stdout.contains("ISSUES"));
}

#[test]
fn test_fail_on_high_exits_nonzero() {
    // The Sales query breaks folding before a filter (High)
    let file = fixture("sales.tmdl");
    let (code, _, stderr) = run(&[
        "analyze",
        file.to_str().unwrap(),
        "--engine",
        "query",
        "--format",
        "json",
        "--fail-on",
        "high",
    ]);
    assert_eq!(code, 1);
    assert!(stderr.contains("--fail-on=high"));
}

#[test]
fn test_fail_on_critical_passes_without_critical_issues() {
    let (_, json) = analyze_json(&fixture("sales.tmdl"), &["--engine", "query"]);
    let critical = json["issues_by_severity"]["Critical"].as_u64().unwrap();
    let (code, _) = analyze_json(
        &fixture("sales.tmdl"),
        &["--engine", "query", "--fail-on", "critical"],
    );
    assert_eq!(code, i32::from(critical > 0));
}

#[test]
fn test_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("report.md");
    let file = fixture("sales.tmdl");
    let (code, stdout, _) = run(&[
        "analyze",
        file.to_str().unwrap(),
        "--format",
        "markdown",
        "--output",
        out.to_str().unwrap(),
    ]);
    assert_eq!(code, 0);
    assert!(stdout.is_empty());
    let md = std::fs::read_to_string(&out).unwrap();
    assert!(md.contains("## Category Scores"));
    assert!(md.contains("Unified Model Health Report"));
}

#[test]
fn test_malformed_json_prints_error_object() {
    let dir = tempfile::tempdir().unwrap();
    let bad = dir.path().join("broken.json");
    std::fs::write(&bad, "{ \"tables\": [ ").unwrap();

    let (code, stdout, _) = run(&["analyze", bad.to_str().unwrap(), "--format", "json"]);
    assert_eq!(code, 1);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(json["error"].as_str().unwrap().starts_with("invalid JSON"));
}

#[test]
fn test_malformed_text_prints_error_line() {
    let dir = tempfile::tempdir().unwrap();
    let bad = dir.path().join("notes.tmdl");
    std::fs::write(&bad, "nothing to see here\n").unwrap();

    let (code, stdout, stderr) = run(&["analyze", bad.to_str().unwrap()]);
    assert_eq!(code, 1);
    assert!(stdout.is_empty());
    assert!(stderr.contains("no model objects found"));
}

#[test]
fn test_config_disables_rule() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("model-health.toml"),
        "[rules.QUERY_FOLDING_BROKEN]\nenabled = false\n",
    )
    .unwrap();

    let (code, json) = analyze_json(
        &fixture("sales.tmdl"),
        &[
            "--engine",
            "query",
            "--fail-on",
            "high",
            "--config",
            dir.path().to_str().unwrap(),
        ],
    );
    assert!(json["issues"]
        .as_array()
        .unwrap()
        .iter()
        .all(|i| i["rule_id"] != "QUERY_FOLDING_BROKEN"));
    let high = json["issues_by_severity"]["High"].as_u64().unwrap()
        + json["issues_by_severity"]["Critical"].as_u64().unwrap();
    assert_eq!(code, i32::from(high > 0));
}

#[test]
fn test_config_default_format() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("model-health.toml"),
        "[defaults]\nformat = \"json\"\n",
    )
    .unwrap();
    let file = fixture("sales.json");
    let (code, stdout, _) = run(&[
        "analyze",
        file.to_str().unwrap(),
        "--config",
        dir.path().to_str().unwrap(),
    ]);
    assert_eq!(code, 0);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(json["score"].is_u64());
}

#[test]
fn test_rules_lists_catalogs() {
    let (code, stdout, _) = run(&["rules"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("model engine (49 rules)"));
    assert!(stdout.contains("query engine (20 rules)"));
    assert!(stdout.contains("ai engine (15 rules)"));
    assert!(stdout.contains("QUERY_FOLDING_BROKEN"));

    let (_, stdout, _) = run(&["rules", "--engine", "query"]);
    assert!(!stdout.contains("model engine"));
}

#[test]
fn test_init_writes_sample_config() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, _) = run(&["init", dir.path().to_str().unwrap()]);
    assert_eq!(code, 0);
    let written = std::fs::read_to_string(dir.path().join("model-health.toml")).unwrap();
    assert!(written.contains("[scoring]"));

    // A second run leaves the file alone
    std::fs::write(dir.path().join("model-health.toml"), "# mine\n").unwrap();
    let (code, _, _) = run(&["init", dir.path().to_str().unwrap()]);
    assert_eq!(code, 0);
    let kept = std::fs::read_to_string(dir.path().join("model-health.toml")).unwrap();
    assert_eq!(kept, "# mine\n");
}
