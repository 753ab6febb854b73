//! Library-level tests over the fixture models
//!
//! The same sales model ships as a TMDL-like text export and as a
//! TMSL-like JSON definition. Both must normalize to the same entity
//! graph and therefore to the same reports.

use anyhow::{bail, Result};
use model_health::config::AnalysisConfig;
use model_health::graph::Model;
use model_health::models::{Category, Location, Severity, Violation};
use model_health::report::{analyze_unified, normalize_and_score, normalize_and_score_with};
use model_health::rules::{Engine, FnRule, Rule, RuleEngineBuilder};
use model_health::scoring::{combine_reports, UnifiedBucket, UnifiedWeights};
use model_health::{normalize, AnalysisOutcome, FormatHint};
use std::path::PathBuf;
use std::sync::Arc;

fn fixture(name: &str) -> Vec<u8> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    std::fs::read(&path).unwrap_or_else(|e| panic!("read {}: {e}", path.display()))
}

fn text_model() -> Model {
    normalize(&fixture("sales.tmdl"), FormatHint::Text).unwrap()
}

fn json_model() -> Model {
    normalize(&fixture("sales.json"), FormatHint::Json).unwrap()
}

#[test]
fn test_text_fixture_normalizes() {
    let model = text_model();
    assert_eq!(model.name, "Model");
    assert_eq!(model.culture, "en-US");

    let names: Vec<&str> = model.tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Sales", "Product", "Date"]);

    let sales = model.table("Sales").unwrap();
    assert_eq!(sales.description, "Sales transactions");
    assert!(sales.column("ProductKey").unwrap().is_hidden);
    assert!(sales.column("Line Total").unwrap().is_calculated());
    assert_eq!(sales.measures[0].format_string.as_deref(), Some("#,0.00"));

    assert_eq!(model.relationships.len(), 2);
    assert!(model.relationships[0].is_bidirectional());
    assert_eq!(model.roles[0].table_permissions[0].filter, "[Amount] > 0");

    let queries: Vec<&str> = model.queries().iter().map(|q| q.name.as_str()).collect();
    assert_eq!(queries, vec!["Sales.Sales", "Product.Product", "Regions"]);
    assert_eq!(model.queries()[0].steps.len(), 4);
}

#[test]
fn test_text_and_json_normalize_equal() {
    assert_eq!(text_model(), json_model());
}

#[test]
fn test_auto_detection_matches_explicit_hints() {
    assert_eq!(
        normalize(&fixture("sales.json"), FormatHint::Auto).unwrap(),
        json_model()
    );
    assert_eq!(
        normalize(&fixture("sales.tmdl"), FormatHint::Auto).unwrap(),
        text_model()
    );
}

#[test]
fn test_text_and_json_reports_equal() {
    let text = normalize_and_score(&fixture("sales.tmdl"), FormatHint::Auto).unwrap();
    let json = normalize_and_score(&fixture("sales.json"), FormatHint::Auto).unwrap();
    assert_eq!(text, json);
    assert!(text.score <= text.max_score);
}

#[test]
fn test_structural_report_statistics() {
    let report = normalize_and_score(&fixture("sales.tmdl"), FormatHint::Text).unwrap();
    assert_eq!(report.engine, Engine::Model);
    assert_eq!(report.statistics["tables"], 3);
    assert_eq!(report.statistics["relationships"], 2);
    assert_eq!(report.statistics["measures"], 2);
    assert_eq!(report.statistics["calculated_columns"], 1);
    assert_eq!(report.statistics["hierarchies"], 1);
    assert_eq!(report.statistics["roles"], 1);
    assert_eq!(report.total_issues, report.issues.len());
    assert_eq!(report.issues_by_severity.total(), report.total_issues);
}

#[test]
fn test_query_engine_flags_folding_before_filter() {
    let report = normalize_and_score_with(
        &fixture("sales.tmdl"),
        FormatHint::Text,
        Engine::Query,
        &AnalysisConfig::default(),
    )
    .unwrap();

    let folding: Vec<&Violation> = report
        .issues
        .iter()
        .filter(|v| v.rule_id == "QUERY_FOLDING_BROKEN")
        .collect();
    assert_eq!(folding.len(), 1);
    assert_eq!(folding[0].severity, Severity::High);
    assert_eq!(
        folding[0].location.to_string(),
        "Query: Sales.Sales, Step 3 (Added)"
    );

    assert!(report.issues.iter().any(|v| v.rule_id == "EXCEL_SOURCE"));
    assert_eq!(report.statistics["total_queries"], 3);
    assert_eq!(report.statistics["queries_with_folding_issues"], 1);
}

#[test]
fn test_disabled_rule_removes_its_violations() {
    let config: AnalysisConfig =
        toml::from_str("[rules.query-folding-broken]\nenabled = false\n").unwrap();
    let report = normalize_and_score_with(
        &fixture("sales.tmdl"),
        FormatHint::Text,
        Engine::Query,
        &config,
    )
    .unwrap();
    assert!(report
        .issues
        .iter()
        .all(|v| v.rule_id != "QUERY_FOLDING_BROKEN"));
}

#[test]
fn test_sequential_and_parallel_evaluation_identical() {
    let model = text_model();
    for engine in Engine::ALL {
        let sequential = RuleEngineBuilder::new()
            .workers(1)
            .rules(engine.catalog())
            .build()
            .evaluate(&model);
        let parallel = RuleEngineBuilder::new()
            .workers(4)
            .rules(engine.catalog())
            .build()
            .evaluate(&model);
        assert_eq!(sequential.violations, parallel.violations, "{engine}");
    }
}

struct BrokenRule;

impl Rule for BrokenRule {
    fn id(&self) -> &'static str {
        "BROKEN"
    }
    fn description(&self) -> &'static str {
        "Always errors"
    }
    fn category(&self) -> Category {
        Category::Design
    }
    fn default_severity(&self) -> Severity {
        Severity::Low
    }
    fn check(&self, _model: &Model) -> Result<Vec<Violation>> {
        bail!("lookup failed")
    }
}

fn panicking_check(_model: &Model) -> Vec<Violation> {
    panic!("rule bug")
}

fn one_violation(_model: &Model) -> Vec<Violation> {
    vec![Violation::new(
        "OK_RULE",
        Category::Design,
        Severity::Medium,
        3,
        "Still reported",
        Location::Model,
    )]
}

#[test]
fn test_failing_rules_are_recorded_not_fatal() {
    for workers in [1, 3] {
        let evaluation = RuleEngineBuilder::new()
            .workers(workers)
            .rule(Arc::new(BrokenRule))
            .rule(Arc::new(FnRule::new(
                "PANICS",
                "Always panics",
                Category::Design,
                Severity::Low,
                panicking_check,
            )))
            .rule(Arc::new(FnRule::new(
                "OK_RULE",
                "Reports one issue",
                Category::Design,
                Severity::Medium,
                one_violation,
            )))
            .build()
            .evaluate(&Model::default());

        let failed: Vec<&str> = evaluation
            .failures
            .iter()
            .map(|f| f.rule_id.as_str())
            .collect();
        assert_eq!(failed, vec!["BROKEN", "PANICS"]);
        assert_eq!(evaluation.violations.len(), 1);
        assert_eq!(evaluation.summary.rules_failed, 2);
        assert_eq!(evaluation.summary.rules_succeeded, 1);
    }
}

#[test]
fn test_unified_report_from_fixture() {
    let config = AnalysisConfig::default();
    let unified = analyze_unified(&fixture("sales.json"), FormatHint::Auto, &config).unwrap();

    assert_eq!(unified.category_scores.len(), UnifiedBucket::ALL.len());
    assert_eq!(
        unified.total_issues,
        unified.model_report.total_issues + unified.query_report.total_issues
    );
    assert!(unified.top_recommendations.len() <= 10);
    assert_eq!(unified.statistics["mcode_queries"], 3);
    assert_eq!(unified.statistics["mcode_folding_issues"], 1);
    assert!(unified.ai_report.is_some());

    // The AI report never moves the unified score
    let recombined = combine_reports(
        &unified.model_report,
        &unified.query_report,
        &UnifiedWeights::default(),
    );
    assert_eq!(recombined.score, unified.score);
    assert_eq!(recombined.grade, unified.grade);
}

#[test]
fn test_dangling_relationships_do_not_fail_rules() {
    let raw = br#"{
        "model": {
            "tables": [
                {
                    "name": "Sales",
                    "columns": [
                        {"name": "GhostKey", "dataType": "int64"},
                        {"name": "Amount", "dataType": "double"}
                    ],
                    "measures": [{"name": "Total", "expression": "SUM(Sales[Amount])"}]
                }
            ],
            "relationships": [
                {
                    "name": "Sales_Ghost",
                    "fromTable": "Sales",
                    "fromColumn": "GhostKey",
                    "toTable": "Ghost",
                    "toColumn": "GhostKey",
                    "fromCardinality": "many",
                    "toCardinality": "many",
                    "crossFilteringBehavior": "bothDirections"
                },
                {
                    "name": "Ghost_Sales",
                    "fromTable": "Ghost",
                    "fromColumn": "GhostKey",
                    "toTable": "Sales",
                    "toColumn": "Nope"
                }
            ]
        }
    }"#;

    let config = AnalysisConfig::default();
    for workers in [1, 4] {
        let mut config = config.clone();
        config.defaults.workers = Some(workers);
        let unified = analyze_unified(raw, FormatHint::Json, &config).unwrap();

        assert!(unified.model_report.rule_failures.is_empty());
        assert!(unified.query_report.rule_failures.is_empty());
        let ai = unified.ai_report.as_ref().unwrap();
        assert!(ai.rule_failures.is_empty());

        assert_eq!(unified.model_report.statistics["relationships"], 2);
        assert!(unified.score <= 100);
    }
}

#[test]
fn test_malformed_inputs_become_error_objects() {
    for (raw, hint) in [
        (&b"{\"tables\": ["[..], FormatHint::Json),
        (&b"[1, 2, 3]"[..], FormatHint::Json),
        (&b"just some notes\nnothing here"[..], FormatHint::Text),
    ] {
        let outcome = AnalysisOutcome::from_result(normalize_and_score(raw, hint));
        assert!(outcome.is_error());
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json.as_object().unwrap().len(), 1);
        assert!(json["error"].is_string());
    }
}
