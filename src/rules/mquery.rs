//! Power Query (M) rules
//!
//! Every rule walks [`Model::queries`] in order: partition queries first,
//! then shared expressions. Step-level findings are located at the step,
//! everything else at the query.

use super::base::{FnRule, Rule};
use crate::graph::{Model, Query, Step};
use crate::models::{Category, Location, Severity, Violation};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

pub fn rules() -> Vec<Arc<dyn Rule>> {
    vec![
        Arc::new(FnRule::new(
            "QUERY_FOLDING_BROKEN",
            "Foldable queries with a folding-breaking step",
            Category::QueryFolding,
            Severity::High,
            query_folding,
        )),
        Arc::new(FnRule::new(
            "EXCESSIVE_ROW_OPERATIONS",
            "More than three row-by-row added columns",
            Category::Performance,
            Severity::High,
            excessive_row_operations,
        )),
        Arc::new(FnRule::new(
            "MULTIPLE_SORTS",
            "More than one sort step",
            Category::Performance,
            Severity::Medium,
            multiple_sorts,
        )),
        Arc::new(FnRule::new(
            "TABLE_CONTAINS_IN_ROW_CONTEXT",
            "Steps using Table.Contains",
            Category::Performance,
            Severity::High,
            table_contains,
        )),
        Arc::new(FnRule::new(
            "MISSING_TYPE_DEFINITIONS",
            "Queries that never set column types",
            Category::Performance,
            Severity::Medium,
            missing_type_definitions,
        )),
        Arc::new(FnRule::new(
            "MISSING_ERROR_HANDLING",
            "Non-trivial queries without try",
            Category::ErrorHandling,
            Severity::Medium,
            missing_error_handling,
        )),
        Arc::new(FnRule::new(
            "UNGUARDED_EXTERNAL_CALL",
            "External calls without try",
            Category::ErrorHandling,
            Severity::High,
            unguarded_external_calls,
        )),
        Arc::new(FnRule::new(
            "NO_NULL_HANDLING",
            "Long queries that never handle nulls",
            Category::DataQuality,
            Severity::Low,
            no_null_handling,
        )),
        Arc::new(FnRule::new(
            "NO_DUPLICATE_HANDLING",
            "Long queries that never remove duplicates",
            Category::DataQuality,
            Severity::Info,
            no_duplicate_handling,
        )),
        Arc::new(FnRule::new(
            "NO_DATA_VALIDATION",
            "Long queries without a comparing row filter",
            Category::DataQuality,
            Severity::Low,
            no_data_validation,
        )),
        Arc::new(FnRule::new(
            "INCONSISTENT_STEP_NAMING",
            "Step names mixing naming styles",
            Category::Naming,
            Severity::Low,
            inconsistent_step_naming,
        )),
        Arc::new(FnRule::new(
            "NON_DESCRIPTIVE_STEP_NAMES",
            "Generated step names like Custom1",
            Category::Naming,
            Severity::Medium,
            non_descriptive_step_names,
        )),
        Arc::new(FnRule::new(
            "UNDOCUMENTED_QUERY",
            "Long queries without comments",
            Category::Documentation,
            Severity::Low,
            undocumented_query,
        )),
        Arc::new(FnRule::new(
            "HARDCODED_CREDENTIALS",
            "Credentials written into the query text",
            Category::Security,
            Severity::Critical,
            hardcoded_credentials,
        )),
        Arc::new(FnRule::new(
            "INSECURE_WEB_REQUEST",
            "Web requests without https",
            Category::Security,
            Severity::High,
            insecure_web_request,
        )),
        Arc::new(FnRule::new(
            "MISSING_BUFFER",
            "Repeated step references without buffering",
            Category::Performance,
            Severity::Medium,
            missing_buffer,
        )),
        Arc::new(FnRule::new(
            "INEFFICIENT_COLUMN_REMOVAL",
            "Repeated column removal instead of selection",
            Category::BestPractices,
            Severity::Medium,
            inefficient_column_removal,
        )),
        Arc::new(FnRule::new(
            "EXCEL_SOURCE",
            "Queries reading from Excel",
            Category::BestPractices,
            Severity::Info,
            excel_source,
        )),
        Arc::new(FnRule::new(
            "MULTIPLE_MERGES",
            "More than two join steps",
            Category::Performance,
            Severity::Medium,
            multiple_merges,
        )),
        Arc::new(FnRule::new(
            "LIST_OPERATION_IN_ROW_CONTEXT",
            "List functions inside added columns",
            Category::Performance,
            Severity::High,
            list_operation_in_row_context,
        )),
    ]
}

fn query_location(query: &Query) -> Location {
    Location::Query {
        query: query.name.clone(),
    }
}

fn step_location(query: &Query, step: &Step) -> Location {
    Location::QueryStep {
        query: query.name.clone(),
        step: step.index,
        name: step.name.clone(),
    }
}

/// One query-level finding per query where `emit` returns one
fn per_query(model: &Model, emit: impl Fn(&Query) -> Option<Violation>) -> Vec<Violation> {
    model.queries().into_iter().filter_map(emit).collect()
}

fn query_folding(model: &Model) -> Vec<Violation> {
    per_query(model, |query| {
        let step = query.folding_break()?;
        let filtered_later = query
            .steps
            .iter()
            .filter(|s| s.index > step.index)
            .any(Step::is_row_filter);

        let violation = if filtered_later {
            Violation::new(
                "QUERY_FOLDING_BROKEN",
                Category::QueryFolding,
                Severity::High,
                8,
                "Query Folding Broken Before Filters",
                step_location(query, step),
            )
            .with_description(format!(
                "Query folding breaks at step '{}' but filters are applied later",
                step.name
            ))
            .with_recommendation(
                "Move filtering operations before operations that break query folding to improve performance.",
            )
        } else {
            Violation::new(
                "QUERY_FOLDING_BROKEN",
                Category::QueryFolding,
                Severity::Medium,
                4,
                "Query Folding Broken",
                step_location(query, step),
            )
            .with_description(format!(
                "Query folding breaks at step '{}' due to {} operation",
                step.name,
                step.kind.label()
            ))
            .with_recommendation(
                "Consider restructuring the query to preserve folding longer, or ensure this is necessary.",
            )
        };
        Some(violation.with_details(json!({ "code_snippet": step.snippet() })))
    })
}

fn excessive_row_operations(model: &Model) -> Vec<Violation> {
    per_query(model, |query| {
        let nested = query
            .steps
            .iter()
            .filter(|s| s.expression.contains("Table.AddColumn") && s.expression.contains("each"))
            .count();
        (nested > 3).then(|| {
            Violation::new(
                "EXCESSIVE_ROW_OPERATIONS",
                Category::Performance,
                Severity::High,
                6,
                "Excessive Nested Operations",
                query_location(query),
            )
            .with_description(format!(
                "Query has {nested} nested operations using 'each'"
            ))
            .with_recommendation(
                "Consider consolidating nested operations or using Table.TransformColumns for better performance.",
            )
        })
    })
}

fn multiple_sorts(model: &Model) -> Vec<Violation> {
    per_query(model, |query| {
        let sorts = query.count_steps("Table.Sort");
        (sorts > 1).then(|| {
            Violation::new(
                "MULTIPLE_SORTS",
                Category::Performance,
                Severity::Medium,
                3,
                "Multiple Sort Operations",
                query_location(query),
            )
            .with_description(format!("Query contains {sorts} sort operations"))
            .with_recommendation("Consolidate sort operations into a single step where possible.")
        })
    })
}

fn table_contains(model: &Model) -> Vec<Violation> {
    let mut violations = Vec::new();
    for query in model.queries() {
        for step in query.steps.iter().filter(|s| s.expression.contains("Table.Contains")) {
            violations.push(
                Violation::new(
                    "TABLE_CONTAINS_IN_ROW_CONTEXT",
                    Category::Performance,
                    Severity::High,
                    6,
                    "Inefficient Table.Contains Usage",
                    step_location(query, step),
                )
                .with_description(format!(
                    "Step '{}' uses Table.Contains which is inefficient",
                    step.name
                ))
                .with_recommendation(
                    "Use Table.Join or List.Contains with Table.SelectRows for better performance.",
                ),
            );
        }
    }
    violations
}

fn missing_type_definitions(model: &Model) -> Vec<Violation> {
    per_query(model, |query| {
        let typed = query.any_step("Table.TransformColumnTypes");
        (!typed && query.steps.len() > 3).then(|| {
            Violation::new(
                "MISSING_TYPE_DEFINITIONS",
                Category::Performance,
                Severity::Medium,
                4,
                "Missing Data Type Definitions",
                query_location(query),
            )
            .with_description("Query doesn't explicitly set data types")
            .with_recommendation(
                "Add Table.TransformColumnTypes early in the query to avoid automatic type detection overhead.",
            )
        })
    })
}

fn has_try(query: &Query) -> bool {
    query.source.to_lowercase().contains("try")
}

fn missing_error_handling(model: &Model) -> Vec<Violation> {
    per_query(model, |query| {
        (!has_try(query) && query.source.len() > 200).then(|| {
            Violation::new(
                "MISSING_ERROR_HANDLING",
                Category::ErrorHandling,
                Severity::Medium,
                3,
                "No Error Handling",
                query_location(query),
            )
            .with_description("Query lacks try...otherwise error handling")
            .with_recommendation("Add try...otherwise blocks to handle potential errors gracefully.")
        })
    })
}

/// Call, operation described, title form
const EXTERNAL_CALLS: &[(&str, &str, &str)] = &[
    ("Web.Contents", "web requests", "Web Requests"),
    ("Sql.Database", "database connections", "Database Connections"),
    ("Value.FromText", "type conversions", "Type Conversions"),
];

fn unguarded_external_calls(model: &Model) -> Vec<Violation> {
    let mut violations = Vec::new();
    for query in model.queries().into_iter().filter(|q| !has_try(q)) {
        for (call, operation, title) in EXTERNAL_CALLS {
            if !query.source.contains(call) {
                continue;
            }
            violations.push(
                Violation::new(
                    "UNGUARDED_EXTERNAL_CALL",
                    Category::ErrorHandling,
                    Severity::High,
                    5,
                    format!("No Error Handling for {title}"),
                    query_location(query),
                )
                .with_description(format!(
                    "Query performs {operation} without error handling"
                ))
                .with_recommendation(format!(
                    "Wrap {operation} in try...otherwise blocks to handle failures."
                )),
            );
        }
    }
    violations
}

const NULL_HANDLERS: &[&str] = &[
    "Table.ReplaceValue",
    "Table.FillDown",
    "Table.FillUp",
    "Table.TransformColumns",
];

fn no_null_handling(model: &Model) -> Vec<Violation> {
    per_query(model, |query| {
        let handled = NULL_HANDLERS.iter().any(|h| query.any_step(h));
        (!handled && query.steps.len() > 5).then(|| {
            Violation::new(
                "NO_NULL_HANDLING",
                Category::DataQuality,
                Severity::Low,
                2,
                "No Explicit Null Handling",
                query_location(query),
            )
            .with_description("Query doesn't explicitly handle null values")
            .with_recommendation(
                "Consider adding null value handling using Table.ReplaceValue or conditional columns.",
            )
        })
    })
}

fn no_duplicate_handling(model: &Model) -> Vec<Violation> {
    per_query(model, |query| {
        let handled = query.any_step("Table.Distinct") || query.any_step("Table.Group");
        (!handled && query.steps.len() > 5).then(|| {
            Violation::new(
                "NO_DUPLICATE_HANDLING",
                Category::DataQuality,
                Severity::Info,
                0,
                "No Duplicate Handling",
                query_location(query),
            )
            .with_description("Query doesn't check for or remove duplicates")
            .with_recommendation("Consider using Table.Distinct if duplicate rows should be removed.")
        })
    })
}

fn no_data_validation(model: &Model) -> Vec<Violation> {
    per_query(model, |query| {
        let validated = query.steps.iter().any(|s| {
            s.expression.contains("Table.SelectRows")
                && s.expression.contains(|c: char| matches!(c, '>' | '<' | '='))
        });
        (!validated && query.steps.len() > 5).then(|| {
            Violation::new(
                "NO_DATA_VALIDATION",
                Category::DataQuality,
                Severity::Low,
                2,
                "No Data Validation",
                query_location(query),
            )
            .with_description("Query doesn't include data validation checks")
            .with_recommendation(
                "Consider adding data validation using Table.SelectRows to filter invalid data.",
            )
        })
    })
}

fn is_camel_case(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(char::is_lowercase) && chars.any(char::is_uppercase)
}

fn inconsistent_step_naming(model: &Model) -> Vec<Violation> {
    per_query(model, |query| {
        let names = || query.steps.iter().map(|s| s.name.as_str());
        let styles = [
            names().any(|n| n.contains(' ')),
            names().any(|n| n.contains('_')),
            names().any(is_camel_case),
        ];
        (styles.iter().filter(|s| **s).count() > 1).then(|| {
            Violation::new(
                "INCONSISTENT_STEP_NAMING",
                Category::Naming,
                Severity::Low,
                1,
                "Inconsistent Step Naming",
                query_location(query),
            )
            .with_description("Query uses mixed naming conventions for steps")
            .with_recommendation("Use consistent naming convention (e.g., PascalCase without spaces).")
        })
    })
}

const GENERIC_STEP_NAMES: &[&str] = &["Custom1", "Custom2", "Step1", "Step2", "Table1", "Table2"];

fn non_descriptive_step_names(model: &Model) -> Vec<Violation> {
    per_query(model, |query| {
        let generic = query
            .steps
            .iter()
            .filter(|s| GENERIC_STEP_NAMES.iter().any(|g| s.name.contains(g)))
            .count();
        (generic > 2).then(|| {
            Violation::new(
                "NON_DESCRIPTIVE_STEP_NAMES",
                Category::Naming,
                Severity::Medium,
                2,
                "Non-Descriptive Step Names",
                query_location(query),
            )
            .with_description(format!("Query contains {generic} generic step names"))
            .with_recommendation(
                "Use descriptive names that indicate the purpose of each transformation step.",
            )
        })
    })
}

fn undocumented_query(model: &Model) -> Vec<Violation> {
    per_query(model, |query| {
        (!query.has_comments() && query.source.len() > 500).then(|| {
            Violation::new(
                "UNDOCUMENTED_QUERY",
                Category::Documentation,
                Severity::Low,
                1,
                "No Documentation",
                query_location(query),
            )
            .with_description("Complex query lacks comments or documentation")
            .with_recommendation("Add comments to explain complex transformations and business logic.")
        })
    })
}

/// Keywords per credential kind; kind, title form
const CREDENTIALS: &[(&[&str], &str, &str)] = &[
    (&["password", "pwd"], "password", "Password"),
    (&["apikey"], "API key", "Api Key"),
    (&["token"], "token", "Token"),
];

/// `keyword\s*=\s*"..."` with non-empty content, on lower-cased text
pub(crate) fn has_string_assignment(lower: &str, keyword: &str) -> bool {
    lower.match_indices(keyword).any(|(pos, _)| {
        let rest = lower[pos + keyword.len()..].trim_start();
        let Some(rest) = rest.strip_prefix('=') else {
            return false;
        };
        let Some(rest) = rest.trim_start().strip_prefix('"') else {
            return false;
        };
        rest.find('"').is_some_and(|end| end > 0)
    })
}

fn hardcoded_credentials(model: &Model) -> Vec<Violation> {
    let mut violations = Vec::new();
    for query in model.queries() {
        let lower = query.source.to_ascii_lowercase();
        for (keywords, kind, title) in CREDENTIALS {
            if !keywords.iter().any(|k| has_string_assignment(&lower, k)) {
                continue;
            }
            violations.push(
                Violation::new(
                    "HARDCODED_CREDENTIALS",
                    Category::Security,
                    Severity::Critical,
                    10,
                    format!("Hardcoded {title}"),
                    query_location(query),
                )
                .with_description(format!("Query contains hardcoded {kind}"))
                .with_recommendation(format!(
                    "Use Power BI parameters or data source settings to store {kind}s securely."
                )),
            );
        }
    }
    violations
}

fn insecure_web_request(model: &Model) -> Vec<Violation> {
    per_query(model, |query| {
        let insecure = query.source.contains("Web.Contents") && !query.source.contains("https://");
        insecure.then(|| {
            Violation::new(
                "INSECURE_WEB_REQUEST",
                Category::Security,
                Severity::High,
                6,
                "Unsecured Web Request",
                query_location(query),
            )
            .with_description("Query makes HTTP requests without SSL/TLS")
            .with_recommendation("Use HTTPS for all web requests to ensure data security.")
        })
    })
}

/// Some step mentions an earlier step's name more than once
fn has_repeated_reference(query: &Query) -> bool {
    query.steps.iter().enumerate().any(|(i, step)| {
        query.steps[..i]
            .iter()
            .filter(|prev| !prev.name.is_empty())
            .any(|prev| step.expression.matches(prev.name.as_str()).count() > 1)
    })
}

fn missing_buffer(model: &Model) -> Vec<Violation> {
    per_query(model, |query| {
        let buffered = query.any_step("Table.Buffer") || query.any_step("List.Buffer");
        (!buffered && has_repeated_reference(query)).then(|| {
            Violation::new(
                "MISSING_BUFFER",
                Category::Performance,
                Severity::Medium,
                3,
                "Missing Buffer for Multiple References",
                query_location(query),
            )
            .with_description("Query references previous steps multiple times without buffering")
            .with_recommendation(
                "Consider using Table.Buffer or List.Buffer for steps that are referenced multiple times.",
            )
        })
    })
}

fn inefficient_column_removal(model: &Model) -> Vec<Violation> {
    per_query(model, |query| {
        let removals = query.count_steps("Table.RemoveColumns");
        (removals > 2 && !query.any_step("Table.SelectColumns")).then(|| {
            Violation::new(
                "INEFFICIENT_COLUMN_REMOVAL",
                Category::BestPractices,
                Severity::Medium,
                3,
                "Inefficient Column Removal",
                query_location(query),
            )
            .with_description(format!(
                "Query uses Table.RemoveColumns {removals} times"
            ))
            .with_recommendation(
                "Consider using Table.SelectColumns once to keep only needed columns instead of multiple removals.",
            )
        })
    })
}

fn excel_source(model: &Model) -> Vec<Violation> {
    per_query(model, |query| {
        let first = query.steps.first()?;
        first.expression.contains("Excel.Workbook").then(|| {
            Violation::new(
                "EXCEL_SOURCE",
                Category::BestPractices,
                Severity::Info,
                0,
                "Excel as Data Source",
                query_location(query),
            )
            .with_description("Query uses Excel as data source")
            .with_recommendation(
                "For production models, consider using a database or data warehouse for better performance and reliability.",
            )
        })
    })
}

fn multiple_merges(model: &Model) -> Vec<Violation> {
    per_query(model, |query| {
        let merges = query
            .steps
            .iter()
            .filter(|s| s.expression.contains("Table.Join") || s.expression.contains("Table.NestedJoin"))
            .count();
        (merges > 2).then(|| {
            Violation::new(
                "MULTIPLE_MERGES",
                Category::Performance,
                Severity::Medium,
                4,
                "Multiple Merge Operations",
                query_location(query),
            )
            .with_description(format!(
                "Query contains {merges} merge/join operations"
            ))
            .with_recommendation(
                "Consider consolidating data at the source or using a star schema to reduce joins.",
            )
        })
    })
}

fn list_operation_in_row_context(model: &Model) -> Vec<Violation> {
    let mut violations = Vec::new();
    for query in model.queries() {
        let hits = query
            .steps
            .iter()
            .filter(|s| s.expression.contains("Table.AddColumn") && s.expression.contains("List."));
        for step in hits {
            violations.push(
                Violation::new(
                    "LIST_OPERATION_IN_ROW_CONTEXT",
                    Category::Performance,
                    Severity::High,
                    5,
                    "List Operation in Row Context",
                    step_location(query, step),
                )
                .with_description(format!(
                    "Step '{}' uses List operations in Table.AddColumn",
                    step.name
                ))
                .with_recommendation(
                    "List operations in row context can be slow. Consider alternative approaches or pre-calculating values.",
                ),
            );
        }
    }
    violations
}

/// Query-engine report statistics
pub fn query_statistics(model: &Model, violations: &[Violation]) -> BTreeMap<String, usize> {
    let queries = model.queries();
    let mut stats = BTreeMap::new();
    stats.insert("total_queries".to_string(), queries.len());
    stats.insert(
        "total_steps".to_string(),
        queries.iter().map(|q| q.steps.len()).sum(),
    );
    stats.insert(
        "queries_with_folding_issues".to_string(),
        violations
            .iter()
            .filter(|v| v.category == Category::QueryFolding)
            .count(),
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Partition, Table};

    fn query(name: &str, steps: &[(&str, &str)]) -> Query {
        let steps: Vec<Step> = steps
            .iter()
            .enumerate()
            .map(|(i, (n, e))| Step::new(i + 1, *n, *e))
            .collect();
        let bindings = steps
            .iter()
            .map(|s| format!("    {} = {}", s.name, s.expression))
            .collect::<Vec<_>>()
            .join(",\n");
        Query {
            name: name.to_string(),
            source: format!("let\n{bindings}\nin\n    Result"),
            result: steps.last().map(|s| s.name.clone()).unwrap_or_default(),
            steps,
        }
    }

    fn model_with(query: Query) -> Model {
        let mut table = Table::new("Sales");
        table.partitions.push(Partition {
            name: "Partition".into(),
            kind: "m".into(),
            query: Some(query),
            ..Default::default()
        });
        Model {
            tables: vec![table],
            ..Default::default()
        }
    }

    #[test]
    fn test_folding_broken_before_filter_is_high() {
        let model = model_with(query(
            "Sales.Partition",
            &[
                ("Source", "Sql.Database(\"srv\", \"db\")"),
                ("Nav", "Source{[Schema=\"dbo\",Item=\"Sales\"]}[Data]"),
                ("Added", "Table.AddIndexColumn(Nav, \"Idx\", 1, 1)"),
                ("Typed", "Table.TransformColumnTypes(Added, {})"),
                ("Filtered", "Table.SelectRows(Typed, each [Amount] > 0)"),
            ],
        ));
        let violations = query_folding(&model);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].severity, Severity::High);
        assert_eq!(
            violations[0].location.to_string(),
            "Query: Sales.Partition, Step 3 (Added)"
        );
    }

    #[test]
    fn test_folding_broken_without_filter_is_medium() {
        let model = model_with(query(
            "Q",
            &[
                ("Source", "OData.Feed(\"https://x\")"),
                ("Upper", "Table.TransformColumns(Source, {{\"A\", Text.Upper}})"),
            ],
        ));
        let violations = query_folding(&model);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].severity, Severity::Medium);
        assert_eq!(
            violations[0].description,
            "Query folding breaks at step 'Upper' due to Transformation operation"
        );
    }

    #[test]
    fn test_non_foldable_source_is_skipped() {
        let model = model_with(query(
            "Q",
            &[
                ("Source", "Csv.Document(File.Contents(\"a.csv\"))"),
                ("Added", "Table.AddColumn(Source, \"X\", each 1)"),
            ],
        ));
        assert!(query_folding(&model).is_empty());
    }

    #[test]
    fn test_credential_assignment() {
        assert!(has_string_assignment("password = \"hunter2\"", "password"));
        assert!(has_string_assignment("pwd=\"x\"", "pwd"));
        assert!(!has_string_assignment("password = \"\"", "password"));
        assert!(!has_string_assignment("password = parameter", "password"));
    }

    #[test]
    fn test_hardcoded_credentials_dedupes_password_spellings() {
        let model = model_with(query(
            "Q",
            &[(
                "Source",
                "Web.Contents(\"https://api\", [Headers=[pwd=\"a\", Password=\"b\", Token=\"c\"]])",
            )],
        ));
        let titles: Vec<String> = hardcoded_credentials(&model)
            .into_iter()
            .map(|v| v.title)
            .collect();
        assert_eq!(titles, vec!["Hardcoded Password", "Hardcoded Token"]);
    }

    #[test]
    fn test_step_naming() {
        assert!(is_camel_case("removedColumns"));
        assert!(!is_camel_case("RemovedColumns"));
        let model = model_with(query(
            "Q",
            &[("Source", "1"), ("Removed Columns", "2"), ("renamedCols", "3")],
        ));
        assert_eq!(inconsistent_step_naming(&model).len(), 1);
    }

    #[test]
    fn test_missing_buffer() {
        let model = model_with(query(
            "Q",
            &[
                ("Source", "Sql.Database(\"s\", \"d\")"),
                ("Joined", "Table.NestedJoin(Source, \"K\", Source, \"K\", \"T\")"),
            ],
        ));
        assert_eq!(missing_buffer(&model).len(), 1);
    }

    #[test]
    fn test_statistics() {
        let model = model_with(query("Q", &[("Source", "1"), ("Next", "2")]));
        let stats = query_statistics(&model, &[]);
        assert_eq!(stats["total_queries"], 1);
        assert_eq!(stats["total_steps"], 2);
        assert_eq!(stats["queries_with_folding_issues"], 0);
    }
}
