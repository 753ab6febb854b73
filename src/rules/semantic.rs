//! Semantic model design checks
//!
//! Structural heuristics over tables, relationships and measures: filter
//! direction, table proliferation, calculated column use, measure
//! complexity, naming consistency and the like.

use super::base::{FnRule, Rule};
use super::{name_has_any, preview, relationship_location};
use crate::graph::{Model, Table};
use crate::models::{Category, Location, Severity, Violation};
use crate::parsers::dax;
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::Arc;

pub fn rules() -> Vec<Arc<dyn Rule>> {
    vec![
        Arc::new(FnRule::new(
            "UNNECESSARY_BIDIRECTIONAL_FILTER",
            "Bidirectional filters between fact/dimension style table pairs",
            Category::Performance,
            Severity::High,
            unnecessary_bidirectional_filter,
        )),
        Arc::new(FnRule::new(
            "TABLE_PROLIFERATION",
            "Groups of period-split tables that share one structure",
            Category::Design,
            Severity::High,
            table_proliferation,
        )),
        Arc::new(FnRule::new(
            "EXCESSIVE_CALCULATED_COLUMNS",
            "Tables with more than 5 calculated columns",
            Category::Performance,
            Severity::Medium,
            excessive_calculated_columns,
        )),
        Arc::new(FnRule::new(
            "AGGREGATION_IN_CALCULATED_COLUMN",
            "Calculated columns that aggregate",
            Category::BestPractices,
            Severity::High,
            aggregation_in_calculated_column,
        )),
        Arc::new(FnRule::new(
            "CALC_COL_USES_RELATED",
            "Calculated columns using RELATED",
            Category::Performance,
            Severity::Medium,
            calc_col_uses_related,
        )),
        Arc::new(FnRule::new(
            "VERY_COMPLEX_MEASURE",
            "Measures with a very high complexity score",
            Category::Measures,
            Severity::Medium,
            very_complex_measure,
        )),
        Arc::new(FnRule::new(
            "ITERATOR_WITHOUT_CALCULATE",
            "Iterator functions used without CALCULATE",
            Category::Measures,
            Severity::Low,
            iterator_without_calculate,
        )),
        Arc::new(FnRule::new(
            "INCONSISTENT_TABLE_NAMING",
            "Table names mixing naming styles",
            Category::Naming,
            Severity::Low,
            inconsistent_table_naming,
        )),
        Arc::new(FnRule::new(
            "TEXT_TYPED_NUMERIC_COLUMN",
            "Numeric-sounding columns stored as text",
            Category::Design,
            Severity::High,
            text_typed_numeric_column,
        )),
        Arc::new(FnRule::new(
            "MISSING_DATE_HIERARCHY",
            "Date tables without any hierarchy in the model",
            Category::BestPractices,
            Severity::Low,
            missing_date_hierarchy,
        )),
        Arc::new(FnRule::new(
            "ROLE_PLAYING_DIMENSION",
            "Dimensions related to one fact table several times",
            Category::Design,
            Severity::Info,
            role_playing_dimension,
        )),
        Arc::new(FnRule::new(
            "NO_DEDICATED_MEASURE_TABLE",
            "Many measures and no measure table",
            Category::BestPractices,
            Severity::Medium,
            no_dedicated_measure_table,
        )),
        Arc::new(FnRule::new(
            "POOR_MEASURE_DOCUMENTATION",
            "Fewer than 30% of measures carry comments",
            Category::Documentation,
            Severity::Low,
            poor_measure_documentation,
        )),
        Arc::new(FnRule::new(
            "RLS_NOT_IMPLEMENTED",
            "Security-related tables and no roles",
            Category::BestPractices,
            Severity::Info,
            rls_not_implemented,
        )),
        Arc::new(FnRule::new(
            "CONSIDER_AGGREGATIONS",
            "Large fact tables and no aggregation table",
            Category::Performance,
            Severity::Info,
            consider_aggregations,
        )),
        Arc::new(FnRule::new(
            "INCREMENTAL_REFRESH_CANDIDATE",
            "Tables with more than 5 partitions",
            Category::Performance,
            Severity::Info,
            incremental_refresh_candidate,
        )),
    ]
}

const UNNECESSARY_BIDI_PAIRS: &[(&str, &str)] = &[
    ("fact", "dimension"),
    ("transaction", "lookup"),
    ("detail", "master"),
];

fn unnecessary_bidirectional_filter(model: &Model) -> Vec<Violation> {
    let mut violations = Vec::new();
    for rel in &model.relationships {
        if !rel.is_bidirectional() || rel.is_many_to_many() {
            continue;
        }
        let from = rel.from_table.to_lowercase();
        let to = rel.to_table.to_lowercase();
        let matches_pair = UNNECESSARY_BIDI_PAIRS.iter().any(|(a, b)| {
            (from.contains(a) && to.contains(b)) || (from.contains(b) && to.contains(a))
        });
        if !matches_pair {
            continue;
        }
        violations.push(
            Violation::new(
                "UNNECESSARY_BIDIRECTIONAL_FILTER",
                Category::Performance,
                Severity::High,
                5,
                "Unnecessary Bidirectional Filter",
                relationship_location(rel),
            )
            .with_description(format!(
                "Relationship '{}' uses bidirectional filtering between {} and {}",
                rel.name, rel.from_table, rel.to_table
            ))
            .with_recommendation(
                "Consider using single direction filtering. Bidirectional filters can impact performance and create ambiguity.",
            ),
        );
    }
    violations
}

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// `19dd` or `20dd`
fn year_token(rest: &[char]) -> Option<usize> {
    let head = rest.get(..4)?;
    let century = matches!((head[0], head[1]), ('1', '9') | ('2', '0'));
    (century && head[2].is_ascii_digit() && head[3].is_ascii_digit()).then_some(4)
}

fn month_token(rest: &[char]) -> Option<usize> {
    MONTHS
        .iter()
        .find(|m| rest.iter().take(3).copied().eq(m.chars()))
        .map(|_| 3)
}

/// `Q1` to `Q4`
fn quarter_token(rest: &[char]) -> Option<usize> {
    match rest.get(..2)? {
        ['Q', '1'..='4'] => Some(2),
        _ => None,
    }
}

/// Remove every token (optionally preceded by `_` or whitespace),
/// scanning left to right
fn strip_tokens(name: &str, token: fn(&[char]) -> Option<usize>) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '_' || c.is_whitespace() {
            if let Some(len) = token(&chars[i + 1..]) {
                i += 1 + len;
                continue;
            }
        }
        if let Some(len) = token(&chars[i..]) {
            i += len;
            continue;
        }
        out.push(c);
        i += 1;
    }
    out
}

/// Table name without year, month and quarter tokens
pub(crate) fn proliferation_base_name(name: &str) -> String {
    let stripped = strip_tokens(name, year_token);
    let stripped = strip_tokens(&stripped, month_token);
    let stripped = strip_tokens(&stripped, quarter_token);
    stripped
        .trim_matches(|c| c == '_' || c == '-' || c == ' ')
        .to_string()
}

/// The first three tables share more than 70% of their column names
fn similar_structure(tables: &[&Table]) -> bool {
    let column_sets: Vec<BTreeSet<&str>> = tables
        .iter()
        .take(3)
        .map(|t| t.columns.iter().map(|c| c.name.as_str()).collect())
        .collect();
    if column_sets.len() < 2 {
        return false;
    }

    let common = column_sets[1..]
        .iter()
        .fold(column_sets[0].clone(), |acc, set| {
            acc.intersection(set).copied().collect()
        });
    let avg = column_sets.iter().map(BTreeSet::len).sum::<usize>() as f64 / column_sets.len() as f64;
    avg > 0.0 && common.len() as f64 / avg > 0.7
}

fn table_proliferation(model: &Model) -> Vec<Violation> {
    let mut groups: Vec<(String, Vec<&Table>)> = Vec::new();
    for table in &model.tables {
        let base = proliferation_base_name(&table.name);
        match groups.iter_mut().find(|(b, _)| *b == base) {
            Some((_, members)) => members.push(table),
            None => groups.push((base, vec![table])),
        }
    }

    groups
        .into_iter()
        .filter(|(_, members)| members.len() > 2 && similar_structure(members))
        .map(|(base, members)| {
            let names: Vec<String> = members.iter().map(|t| t.name.clone()).collect();
            Violation::new(
                "TABLE_PROLIFERATION",
                Category::Design,
                Severity::High,
                8,
                "Table Proliferation Detected",
                Location::objects(format!("Tables: {base}*")),
            )
            .with_description(format!(
                "Found {} similar tables: {}",
                names.len(),
                preview(&names, 5)
            ))
            .with_recommendation(
                "Consider combining these tables into a single table with an additional column for the varying dimension (e.g., Year, Period).",
            )
            .with_details(json!({ "tables": names }))
        })
        .collect()
}

fn excessive_calculated_columns(model: &Model) -> Vec<Violation> {
    model
        .tables
        .iter()
        .filter_map(|table| {
            let count = table.calculated_columns().count();
            (count > 5).then(|| {
                Violation::new(
                    "EXCESSIVE_CALCULATED_COLUMNS",
                    Category::Performance,
                    Severity::Medium,
                    4,
                    "Excessive Calculated Columns",
                    Location::table(&table.name),
                )
                .with_description(format!(
                    "Table '{}' has {} calculated columns",
                    table.name, count
                ))
                .with_recommendation(
                    "Consider converting calculated columns to measures where possible. Calculated columns increase model size and refresh time.",
                )
            })
        })
        .collect()
}

const COLUMN_AGGREGATIONS: &[&str] = &["SUM(", "AVERAGE(", "COUNT(", "MAX(", "MIN("];

fn aggregation_in_calculated_column(model: &Model) -> Vec<Violation> {
    model
        .all_calculated_columns()
        .filter(|(_, column)| {
            let upper = column.expression.as_deref().unwrap_or_default().to_uppercase();
            COLUMN_AGGREGATIONS.iter().any(|agg| upper.contains(agg))
        })
        .map(|(table, column)| {
            Violation::new(
                "AGGREGATION_IN_CALCULATED_COLUMN",
                Category::BestPractices,
                Severity::High,
                6,
                "Aggregation in Calculated Column",
                Location::column(&table.name, &column.name),
            )
            .with_description(format!(
                "Calculated column '{}' in table '{}' uses aggregation functions",
                column.name, table.name
            ))
            .with_recommendation(
                "Move aggregations to measures. Calculated columns with aggregations can cause performance issues.",
            )
        })
        .collect()
}

fn calc_col_uses_related(model: &Model) -> Vec<Violation> {
    model
        .all_calculated_columns()
        .filter(|(_, column)| {
            let tokens = dax::tokenize(column.expression.as_deref().unwrap_or_default());
            dax::has_call(&tokens, "RELATED")
        })
        .map(|(table, column)| {
            Violation::new(
                "CALC_COL_USES_RELATED",
                Category::Performance,
                Severity::Medium,
                3,
                "Calculated column uses RELATED function",
                Location::column(&table.name, &column.name),
            )
            .with_description(
                "Calculated columns with RELATED don't compress well and slow processing.",
            )
            .with_recommendation("Consider moving this logic to the data source or using a measure.")
        })
        .collect()
}

const COMPLEX_FUNCTIONS: &[&str] = &[
    "CALCULATE",
    "CALCULATETABLE",
    "FILTER",
    "ALL",
    "ALLEXCEPT",
    "SUMX",
    "AVERAGEX",
    "COUNTX",
    "MAXX",
    "MINX",
    "EARLIER",
    "EARLIEST",
];

/// Heuristic complexity score of a measure expression.
///
/// Substring counts, so `CALCULATETABLE` also counts as `CALCULATE`.
pub(crate) fn measure_complexity(expression: &str) -> f64 {
    let upper = expression.to_uppercase();
    let parens = expression.matches('(').count() as f64 * 0.5;
    let functions: usize = COMPLEX_FUNCTIONS
        .iter()
        .map(|f| upper.matches(f).count() * 2)
        .sum();
    let vars = upper.matches("VAR ").count() as f64;
    let lines = expression.split('\n').count() as f64 * 0.3;
    parens + functions as f64 + vars + lines
}

fn very_complex_measure(model: &Model) -> Vec<Violation> {
    model
        .all_measures()
        .filter(|(_, measure)| measure_complexity(&measure.expression) >= 30.0)
        .map(|(table, measure)| {
            Violation::new(
                "VERY_COMPLEX_MEASURE",
                Category::Measures,
                Severity::Medium,
                3,
                "Very Complex Measure",
                Location::measure(&table.name, &measure.name),
            )
            .with_description(format!(
                "Measure '{}' has very high complexity",
                measure.name
            ))
            .with_recommendation(
                "Consider breaking down complex measures into smaller, reusable components using variables or helper measures.",
            )
        })
        .collect()
}

const ITERATORS: &[&str] = &["SUMX", "AVERAGEX", "COUNTX", "MAXX", "MINX", "PRODUCTX"];

fn iterator_without_calculate(model: &Model) -> Vec<Violation> {
    model
        .all_measures()
        .filter(|(_, measure)| {
            let upper = measure.expression.to_uppercase();
            ITERATORS.iter().any(|f| upper.contains(f)) && !upper.contains("CALCULATE")
        })
        .map(|(table, measure)| {
            Violation::new(
                "ITERATOR_WITHOUT_CALCULATE",
                Category::Measures,
                Severity::Low,
                2,
                "Iterator Without CALCULATE",
                Location::measure(&table.name, &measure.name),
            )
            .with_description(format!(
                "Measure '{}' uses an iterator function without CALCULATE",
                measure.name
            ))
            .with_recommendation(
                "Consider if context transition is needed. Iterator functions often require CALCULATE for proper context.",
            )
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NamingStyle {
    Pascal,
    Camel,
    Snake,
    Mixed,
}

impl NamingStyle {
    /// Tie-break order for the dominant style
    const ORDER: [NamingStyle; 4] = [
        NamingStyle::Pascal,
        NamingStyle::Camel,
        NamingStyle::Snake,
        NamingStyle::Mixed,
    ];

    fn of(name: &str) -> Self {
        let mut chars = name.chars();
        let first = chars.next();
        let rest: Vec<char> = chars.collect();
        let alnum_tail = !rest.is_empty() && rest.iter().all(|c| c.is_ascii_alphanumeric());
        match first {
            Some(c) if c.is_ascii_uppercase() && alnum_tail => NamingStyle::Pascal,
            Some(c) if c.is_ascii_lowercase() && alnum_tail => NamingStyle::Camel,
            _ if name.contains('_') => NamingStyle::Snake,
            _ => NamingStyle::Mixed,
        }
    }

    fn label(self) -> &'static str {
        match self {
            NamingStyle::Pascal => "PascalCase",
            NamingStyle::Camel => "camelCase",
            NamingStyle::Snake => "snake_case",
            NamingStyle::Mixed => "Mixed",
        }
    }
}

fn inconsistent_table_naming(model: &Model) -> Vec<Violation> {
    if model.tables.is_empty() {
        return Vec::new();
    }

    let styles: Vec<NamingStyle> = model.tables.iter().map(|t| NamingStyle::of(&t.name)).collect();
    let counts: Vec<(NamingStyle, usize)> = NamingStyle::ORDER
        .iter()
        .map(|s| (*s, styles.iter().filter(|x| *x == s).count()))
        .collect();

    // First maximum wins ties
    let mut dominant = counts[0];
    for entry in &counts[1..] {
        if entry.1 > dominant.1 {
            dominant = *entry;
        }
    }

    let inconsistent = styles.len() - dominant.1;
    if inconsistent as f64 <= styles.len() as f64 * 0.2 {
        return Vec::new();
    }

    let found = counts
        .iter()
        .map(|(style, n)| format!("{}: {}", style.label(), n))
        .collect::<Vec<_>>()
        .join(", ");
    let details: serde_json::Map<String, serde_json::Value> = counts
        .iter()
        .map(|(style, n)| (style.label().to_string(), json!(n)))
        .collect();

    vec![Violation::new(
        "INCONSISTENT_TABLE_NAMING",
        Category::Naming,
        Severity::Low,
        2,
        "Inconsistent Table Naming Convention",
        Location::objects("All tables"),
    )
    .with_description(format!("Tables use mixed naming conventions. Found {found}"))
    .with_recommendation(format!(
        "Standardize on {} for all table names.",
        dominant.0.label()
    ))
    .with_details(serde_json::Value::Object(details))]
}

const NUMERIC_NAME_HINTS: &[&str] = &["amount", "quantity", "price", "cost", "revenue"];

fn text_typed_numeric_column(model: &Model) -> Vec<Violation> {
    model
        .all_columns()
        .filter(|(_, column)| {
            let data_type = column.data_type.to_lowercase();
            name_has_any(&column.name, NUMERIC_NAME_HINTS)
                && (data_type.contains("text") || data_type.contains("string"))
        })
        .map(|(table, column)| {
            Violation::new(
                "TEXT_TYPED_NUMERIC_COLUMN",
                Category::Design,
                Severity::High,
                5,
                "Incorrect Data Type",
                Location::column(&table.name, &column.name),
            )
            .with_description(format!(
                "Column '{}' in table '{}' uses text data type for numeric data",
                column.name, table.name
            ))
            .with_recommendation(
                "Change to appropriate numeric data type (Decimal, Integer) for better performance and functionality.",
            )
        })
        .collect()
}

fn missing_date_hierarchy(model: &Model) -> Vec<Violation> {
    let has_hierarchies = model.tables.iter().any(|t| !t.hierarchies.is_empty());
    let has_date_table = model
        .tables
        .iter()
        .any(|t| name_has_any(&t.name, &["date", "calendar"]));
    if has_hierarchies || !has_date_table {
        return Vec::new();
    }

    vec![Violation::new(
        "MISSING_DATE_HIERARCHY",
        Category::BestPractices,
        Severity::Low,
        2,
        "Missing Date Hierarchy",
        Location::Model,
    )
    .with_description("No hierarchies defined in the model despite having date tables")
    .with_recommendation(
        "Consider creating date hierarchies (Year > Quarter > Month > Day) for better user experience.",
    )]
}

fn role_playing_dimension(model: &Model) -> Vec<Violation> {
    let mut by_dimension: Vec<(&str, Vec<&str>)> = Vec::new();
    for rel in &model.relationships {
        match by_dimension.iter_mut().find(|(d, _)| *d == rel.to_table) {
            Some((_, facts)) => facts.push(rel.from_table.as_str()),
            None => by_dimension.push((rel.to_table.as_str(), vec![rel.from_table.as_str()])),
        }
    }

    by_dimension
        .into_iter()
        .filter(|(_, facts)| facts.len() > 1 && facts.iter().all(|f| *f == facts[0]))
        .map(|(dimension, facts)| {
            Violation::new(
                "ROLE_PLAYING_DIMENSION",
                Category::Design,
                Severity::Info,
                0,
                "Role-Playing Dimension Detected",
                Location::table(dimension),
            )
            .with_description(format!(
                "Dimension table '{}' is connected to '{}' multiple times",
                dimension, facts[0]
            ))
            .with_recommendation(
                "This is often valid (e.g., Order Date vs Ship Date). Ensure inactive relationships are properly managed in DAX.",
            )
        })
        .collect()
}

fn no_dedicated_measure_table(model: &Model) -> Vec<Violation> {
    let is_measure_table = |t: &Table| t.name.to_lowercase().contains("measure");
    if model.tables.iter().any(is_measure_table) {
        return Vec::new();
    }
    let scattered = model.all_measures().count();
    if scattered <= 10 {
        return Vec::new();
    }

    vec![Violation::new(
        "NO_DEDICATED_MEASURE_TABLE",
        Category::BestPractices,
        Severity::Medium,
        3,
        "No Dedicated Measure Table",
        Location::Model,
    )
    .with_description(format!(
        "Found {scattered} measures scattered across fact tables"
    ))
    .with_recommendation(
        "Create a dedicated measure table to organize measures centrally for better maintainability.",
    )]
}

fn poor_measure_documentation(model: &Model) -> Vec<Violation> {
    let total = model.all_measures().count();
    let documented = model.all_measures().filter(|(_, m)| m.has_comment()).count();
    if documented as f64 >= total as f64 * 0.3 {
        return Vec::new();
    }

    vec![Violation::new(
        "POOR_MEASURE_DOCUMENTATION",
        Category::Documentation,
        Severity::Low,
        2,
        "Poor Measure Documentation",
        Location::objects("Measures"),
    )
    .with_description(format!(
        "Only {documented} of {total} measures have documentation"
    ))
    .with_recommendation("Add comments to complex measures explaining business logic and calculations.")]
}

fn rls_not_implemented(model: &Model) -> Vec<Violation> {
    let security_tables = model
        .tables
        .iter()
        .any(|t| name_has_any(&t.name, &["user", "security", "access", "permission"]));
    if !model.roles.is_empty() || !security_tables {
        return Vec::new();
    }

    vec![Violation::new(
        "RLS_NOT_IMPLEMENTED",
        Category::BestPractices,
        Severity::Info,
        0,
        "No RLS Implementation",
        Location::Model,
    )
    .with_description("Security-related tables found but no RLS roles defined")
    .with_recommendation(
        "Consider implementing Row-Level Security if data access control is required.",
    )]
}

fn consider_aggregations(model: &Model) -> Vec<Violation> {
    let large: Vec<String> = model
        .tables
        .iter()
        .filter(|t| {
            t.partitions.len() > 1 || name_has_any(&t.name, &["fact", "transaction", "detail"])
        })
        .map(|t| t.name.clone())
        .collect();
    let has_aggregation_table = model
        .tables
        .iter()
        .any(|t| name_has_any(&t.name, &["aggregation"]));
    if large.is_empty() || has_aggregation_table {
        return Vec::new();
    }

    let shown = large.iter().take(3).cloned().collect::<Vec<_>>().join(", ");
    vec![Violation::new(
        "CONSIDER_AGGREGATIONS",
        Category::Performance,
        Severity::Info,
        0,
        "Consider Aggregations",
        Location::Model,
    )
    .with_description(format!("Large fact tables found: {shown}"))
    .with_recommendation(
        "Consider creating aggregation tables for commonly used summaries to improve query performance.",
    )]
}

fn incremental_refresh_candidate(model: &Model) -> Vec<Violation> {
    model
        .tables
        .iter()
        .filter(|t| t.partitions.len() > 5)
        .map(|table| {
            Violation::new(
                "INCREMENTAL_REFRESH_CANDIDATE",
                Category::Performance,
                Severity::Info,
                0,
                "Incremental Refresh Detected",
                Location::table(&table.name),
            )
            .with_description(format!(
                "Table '{}' has {} partitions",
                table.name,
                table.partitions.len()
            ))
            .with_recommendation("Good use of incremental refresh. Ensure refresh windows are optimized.")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Column, CrossFilter, Measure, Relationship};

    fn table_with_columns(name: &str, columns: &[&str]) -> Table {
        let mut table = Table::new(name);
        table.columns = columns.iter().map(|c| Column::new(*c, "int64")).collect();
        table
    }

    #[test]
    fn test_proliferation_base_name() {
        assert_eq!(proliferation_base_name("Budget_2021"), "Budget");
        assert_eq!(proliferation_base_name("Budget 2022"), "Budget");
        assert_eq!(proliferation_base_name("Sales_Jan"), "Sales");
        assert_eq!(proliferation_base_name("Sales Q3"), "Sales");
        assert_eq!(proliferation_base_name("Sales-2023-Q1"), "Sales");
        assert_eq!(proliferation_base_name("Customer"), "Customer");
    }

    #[test]
    fn test_table_proliferation_groups_similar_tables() {
        let cols = ["Date", "Account", "Amount"];
        let model = Model {
            tables: vec![
                table_with_columns("Budget_2021", &cols),
                table_with_columns("Budget_2022", &cols),
                table_with_columns("Budget_2023", &cols),
                table_with_columns("Customer", &["Key"]),
            ],
            ..Default::default()
        };
        let violations = table_proliferation(&model);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].location.to_string(), "Tables: Budget*");
        assert_eq!(
            violations[0].description,
            "Found 3 similar tables: Budget_2021, Budget_2022, Budget_2023"
        );
    }

    #[test]
    fn test_table_proliferation_needs_shared_columns() {
        let model = Model {
            tables: vec![
                table_with_columns("Budget_2021", &["A", "B"]),
                table_with_columns("Budget_2022", &["C", "D"]),
                table_with_columns("Budget_2023", &["E", "F"]),
            ],
            ..Default::default()
        };
        assert!(table_proliferation(&model).is_empty());

        let empty = Model {
            tables: vec![Table::new("T_2021"), Table::new("T_2022"), Table::new("T_2023")],
            ..Default::default()
        };
        assert!(table_proliferation(&empty).is_empty());
    }

    #[test]
    fn test_bidirectional_pattern_either_direction() {
        let mut rel = Relationship::new(("DimensionProduct", "K"), ("FactSales", "K"));
        rel.cross_filter = CrossFilter::Both;
        let model = Model {
            relationships: vec![rel],
            ..Default::default()
        };
        assert_eq!(unnecessary_bidirectional_filter(&model).len(), 1);
    }

    #[test]
    fn test_measure_complexity() {
        assert!(measure_complexity("SUM(Sales[Amount])") < 5.0);
        let nested = "CALCULATE(SUMX(FILTER(ALL(Sales), Sales[Qty] > 0), Sales[Amount]), ALLEXCEPT(Sales, Sales[Region]), FILTER(ALL(Product), Product[Color] = \"Red\"))";
        assert!(measure_complexity(nested) >= 30.0);
    }

    #[test]
    fn test_naming_style_dominance() {
        assert_eq!(NamingStyle::of("Sales"), NamingStyle::Pascal);
        assert_eq!(NamingStyle::of("salesOrders"), NamingStyle::Camel);
        assert_eq!(NamingStyle::of("dim_product"), NamingStyle::Snake);
        assert_eq!(NamingStyle::of("Sales Orders"), NamingStyle::Mixed);

        let model = Model {
            tables: vec![
                Table::new("Sales"),
                Table::new("Product"),
                Table::new("dim_date"),
                Table::new("fact_orders"),
            ],
            ..Default::default()
        };
        let violations = inconsistent_table_naming(&model);
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].recommendation,
            "Standardize on PascalCase for all table names."
        );
    }

    #[test]
    fn test_role_playing_dimension() {
        let mut inactive = Relationship::new(("Sales", "ShipDate"), ("Date", "Date"));
        inactive.is_active = false;
        let model = Model {
            relationships: vec![
                Relationship::new(("Sales", "OrderDate"), ("Date", "Date")),
                inactive,
                Relationship::new(("Sales", "ProductKey"), ("Product", "ProductKey")),
            ],
            ..Default::default()
        };
        let violations = role_playing_dimension(&model);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].location, Location::table("Date"));
    }

    #[test]
    fn test_poor_documentation_ignores_empty_models() {
        assert!(poor_measure_documentation(&Model::default()).is_empty());

        let mut sales = Table::new("Sales");
        sales.measures = vec![
            Measure::new("A", "SUM(Sales[A])"),
            Measure::new("B", "// total\nSUM(Sales[B])"),
        ];
        let model = Model {
            tables: vec![sales],
            ..Default::default()
        };
        assert!(poor_measure_documentation(&model).is_empty());
    }
}
