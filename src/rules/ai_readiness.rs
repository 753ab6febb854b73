//! AI-readiness rules
//!
//! Checks how well a model can be navigated by a natural-language
//! assistant: descriptions, readable names, manageable size and
//! unambiguous relationships. Findings are model-wide summaries located
//! at an object list rather than at a single object.

use super::base::{FnRule, Rule};
use super::{endpoint_tables, preview, table_ref};
use crate::graph::{Cardinality, Model};
use crate::models::{Category, Location, Severity, Violation};
use serde::Serialize;
use std::sync::Arc;

pub fn rules() -> Vec<Arc<dyn Rule>> {
    vec![
        Arc::new(FnRule::new(
            "TABLES_MISSING_DESCRIPTIONS",
            "Visible tables without a meaningful description",
            Category::AiDocumentation,
            Severity::High,
            tables_missing_descriptions,
        )),
        Arc::new(FnRule::new(
            "COLUMNS_MISSING_DESCRIPTIONS",
            "Mostly undocumented visible columns",
            Category::AiDocumentation,
            Severity::High,
            columns_missing_descriptions,
        )),
        Arc::new(FnRule::new(
            "MEASURES_MISSING_DESCRIPTIONS",
            "Measures with neither description nor comment",
            Category::AiDocumentation,
            Severity::Critical,
            measures_missing_descriptions,
        )),
        Arc::new(FnRule::new(
            "UNCLEAR_OBJECT_NAMES",
            "Abbreviated or very short object names",
            Category::AiNaming,
            Severity::Medium,
            unclear_object_names,
        )),
        Arc::new(FnRule::new(
            "LARGE_MODEL",
            "More than 50 tables",
            Category::AiComplexity,
            Severity::High,
            large_model,
        )),
        Arc::new(FnRule::new(
            "EXCESSIVE_MEASURES",
            "More than 200 measures",
            Category::AiComplexity,
            Severity::High,
            excessive_measures,
        )),
        Arc::new(FnRule::new(
            "COMPLEX_SNOWFLAKE",
            "Long dimension chains",
            Category::AiComplexity,
            Severity::Medium,
            complex_snowflake,
        )),
        Arc::new(FnRule::new(
            "INACTIVE_RELATIONSHIPS",
            "Inactive relationships present",
            Category::AiRelationships,
            Severity::Medium,
            inactive_relationships,
        )),
        Arc::new(FnRule::new(
            "MANY_TO_MANY_RELATIONSHIPS",
            "Many-to-many relationships present",
            Category::AiRelationships,
            Severity::High,
            many_to_many_relationships,
        )),
        Arc::new(FnRule::new(
            "EXCESSIVE_BIDIRECTIONAL",
            "More than two bidirectional relationships",
            Category::AiRelationships,
            Severity::Medium,
            excessive_bidirectional,
        )),
        Arc::new(FnRule::new(
            "MEASURES_NOT_IN_FOLDERS",
            "Large measure sets without display folders",
            Category::AiNavigation,
            Severity::Medium,
            measures_not_in_folders,
        )),
        Arc::new(FnRule::new(
            "MISSING_DATA_CATEGORIES",
            "Geographic, URL and image columns without a data category",
            Category::AiDataQuality,
            Severity::Low,
            missing_data_categories,
        )),
        Arc::new(FnRule::new(
            "TECHNICAL_COLUMNS_VISIBLE",
            "Key and id columns left visible",
            Category::AiNavigation,
            Severity::Low,
            technical_columns_visible,
        )),
        Arc::new(FnRule::new(
            "CONSIDER_SYNONYMS",
            "Large measure sets that would benefit from synonyms",
            Category::AiNaming,
            Severity::Info,
            consider_synonyms,
        )),
        Arc::new(FnRule::new(
            "AMBIGUOUS_AGGREGATION_MEASURES",
            "Undocumented measures with generic aggregation names",
            Category::AiDocumentation,
            Severity::Medium,
            ambiguous_aggregation_measures,
        )),
    ]
}

const ABBREVIATIONS: &[&str] = &["qty", "amt", "num", "cnt", "val", "pct", "yr", "mo", "dt"];

const CATEGORY_HINTS: &[&str] = &[
    "city", "country", "state", "postal", "zip", "latitude", "longitude", "address", "url",
    "website", "image", "photo",
];

const TECHNICAL_FRAGMENTS: &[&str] = &["key", "fk", "pk", "_id", "guid", "hash"];

const AGGREGATION_NAMES: &[&str] = &["total", "sum", "count", "average", "avg"];

fn tables_missing_descriptions(model: &Model) -> Vec<Violation> {
    let missing: Vec<String> = model
        .tables
        .iter()
        .filter(|t| !t.is_hidden && t.description.chars().count() < 10)
        .map(|t| t.name.clone())
        .collect();
    if missing.is_empty() {
        return Vec::new();
    }

    let total = model.tables.len();
    let mostly = missing.len() as f64 / total.max(1) as f64 > 0.5;
    let (severity, impact) = if mostly {
        (Severity::High, 6)
    } else {
        (Severity::Medium, 4)
    };
    vec![Violation::new(
        "TABLES_MISSING_DESCRIPTIONS",
        Category::AiDocumentation,
        severity,
        impact,
        "Tables Missing Descriptions",
        Location::objects(format!("Tables: {}", preview(&missing, 5))),
    )
    .with_description(format!(
        "{} of {total} tables lack descriptions. Copilot uses descriptions to understand table purpose.",
        missing.len()
    ))
    .with_recommendation(
        "Add descriptions to all tables explaining what data they contain and how they should be used in business context.",
    )]
}

fn columns_missing_descriptions(model: &Model) -> Vec<Violation> {
    let mut total = 0usize;
    let mut undocumented = 0usize;
    for table in &model.tables {
        for column in table.visible_columns() {
            total += 1;
            if column.description.is_empty() {
                undocumented += 1;
            }
        }
    }
    if undocumented == 0 || total <= 10 || undocumented as f64 / total as f64 <= 0.7 {
        return Vec::new();
    }

    vec![Violation::new(
        "COLUMNS_MISSING_DESCRIPTIONS",
        Category::AiDocumentation,
        Severity::High,
        6,
        "Columns Missing Descriptions",
        Location::objects(format!("Columns: {undocumented} columns")),
    )
    .with_description(format!(
        "{undocumented} visible columns lack descriptions. Copilot needs column descriptions to generate accurate queries."
    ))
    .with_recommendation(
        "Add descriptions to columns explaining what data they contain, valid values, and business meaning.",
    )]
}

fn measures_missing_descriptions(model: &Model) -> Vec<Violation> {
    let total = model.all_measures().count();
    let undocumented: Vec<String> = model
        .all_measures()
        .filter(|(_, m)| m.description.is_empty() && !m.has_comment())
        .map(|(t, m)| table_ref(t, &m.name))
        .collect();
    if undocumented.is_empty() {
        return Vec::new();
    }

    let mostly = undocumented.len() as f64 / total.max(1) as f64 > 0.5;
    let (severity, impact) = if mostly {
        (Severity::Critical, 8)
    } else {
        (Severity::High, 5)
    };
    vec![Violation::new(
        "MEASURES_MISSING_DESCRIPTIONS",
        Category::AiDocumentation,
        severity,
        impact,
        "Measures Missing Descriptions",
        Location::objects(format!("Measures: {}", preview(&undocumented, 5))),
    )
    .with_description(format!(
        "{} of {total} measures lack descriptions. This is CRITICAL for Copilot - it needs to understand what each measure calculates.",
        undocumented.len()
    ))
    .with_recommendation(
        "Add business-friendly descriptions to all measures explaining what they calculate, when to use them, and any important caveats.",
    )]
}

/// Every unclear-name finding, as `name (reason)`
pub(crate) fn unclear_names(model: &Model) -> Vec<String> {
    let mut findings = Vec::new();
    for table in &model.tables {
        let table_lower = table.name.to_lowercase();
        for abbr in ABBREVIATIONS.iter().filter(|a| table_lower.contains(**a)) {
            findings.push(format!("{} (contains abbreviation '{abbr}')", table.name));
        }

        for measure in &table.measures {
            if measure.name.chars().count() < 4 {
                findings.push(format!("{} (name too short)", measure.name));
            }
            let lower = measure.name.to_lowercase();
            for abbr in ABBREVIATIONS.iter().filter(|a| lower.starts_with(**a)) {
                findings.push(format!("{} (uses abbreviation '{abbr}')", measure.name));
            }
        }
    }
    findings
}

fn unclear_object_names(model: &Model) -> Vec<Violation> {
    let findings = unclear_names(model);
    if findings.len() <= 3 {
        return Vec::new();
    }

    let shown = findings.iter().take(5).cloned().collect::<Vec<_>>().join(", ");
    vec![Violation::new(
        "UNCLEAR_OBJECT_NAMES",
        Category::AiNaming,
        Severity::Medium,
        4,
        "Objects With Unclear Names",
        Location::objects(format!("Various: {shown}")),
    )
    .with_description(format!(
        "Found {} objects with abbreviations or technical naming. Copilot works best with natural language names.",
        findings.len()
    ))
    .with_recommendation(
        "Use full, descriptive names: 'Quantity' instead of 'Qty', 'Sales Amount' instead of 'SalesAmt'. Add synonyms for common abbreviations.",
    )]
}

fn large_model(model: &Model) -> Vec<Violation> {
    let tables = model.tables.len();
    if tables <= 50 {
        return Vec::new();
    }
    vec![Violation::new(
        "LARGE_MODEL",
        Category::AiComplexity,
        Severity::High,
        5,
        "Very Large Model",
        Location::Model,
    )
    .with_description(format!(
        "Model has {tables} tables. Large models can overwhelm Copilot's navigation."
    ))
    .with_recommendation(
        "Consider splitting into multiple focused models, or ensure excellent documentation and display folders to help Copilot navigate.",
    )]
}

fn excessive_measures(model: &Model) -> Vec<Violation> {
    let measures = model.all_measures().count();
    if measures <= 200 {
        return Vec::new();
    }
    vec![Violation::new(
        "EXCESSIVE_MEASURES",
        Category::AiComplexity,
        Severity::High,
        5,
        "Very Large Number of Measures",
        Location::Model,
    )
    .with_description(format!(
        "Model has {measures} measures. This can make it hard for Copilot to select the right one."
    ))
    .with_recommendation(
        "Organize measures into display folders by business area. Add clear descriptions to help Copilot differentiate between similar measures.",
    )]
}

fn complex_snowflake(model: &Model) -> Vec<Violation> {
    let (_, _, chained) = endpoint_tables(&model.relationships);
    if chained.len() <= 3 {
        return Vec::new();
    }

    let shown = chained[..5.min(chained.len())].join(", ");
    vec![Violation::new(
        "COMPLEX_SNOWFLAKE",
        Category::AiComplexity,
        Severity::Medium,
        3,
        "Complex Snowflake Schema",
        Location::objects(format!("Relationships: {shown}")),
    )
    .with_description(
        "Model has chained dimension relationships (snowflake). This adds complexity for Copilot's relationship navigation.",
    )
    .with_recommendation(
        "Document the relationship chain clearly. Consider flattening to star schema or add detailed descriptions on how tables relate.",
    )]
}

fn inactive_relationships(model: &Model) -> Vec<Violation> {
    let inactive = model.relationships.iter().filter(|r| !r.is_active).count();
    if inactive == 0 {
        return Vec::new();
    }
    vec![Violation::new(
        "INACTIVE_RELATIONSHIPS",
        Category::AiRelationships,
        Severity::Medium,
        3,
        "Inactive Relationships Present",
        Location::objects(format!("Relationships: {inactive} inactive")),
    )
    .with_description(format!(
        "Model has {inactive} inactive relationships. Copilot may not correctly handle USERELATIONSHIP scenarios."
    ))
    .with_recommendation(
        "Document when to use each inactive relationship. Consider creating separate measures for each date context.",
    )]
}

fn many_to_many_relationships(model: &Model) -> Vec<Violation> {
    let m2m = model
        .relationships
        .iter()
        .filter(|r| r.cardinality == Cardinality::ManyToMany)
        .count();
    if m2m == 0 {
        return Vec::new();
    }
    vec![Violation::new(
        "MANY_TO_MANY_RELATIONSHIPS",
        Category::AiRelationships,
        Severity::High,
        4,
        "Many-to-Many Relationships",
        Location::objects(format!("Relationships: {m2m} M:M relationships")),
    )
    .with_description(format!(
        "Model has {m2m} many-to-many relationships. These can produce unexpected results and confuse Copilot."
    ))
    .with_recommendation(
        "Document the expected behavior clearly. Consider using bridge tables for clearer semantics.",
    )]
}

fn excessive_bidirectional(model: &Model) -> Vec<Violation> {
    let bidi = model
        .relationships
        .iter()
        .filter(|r| r.is_bidirectional())
        .count();
    if bidi <= 2 {
        return Vec::new();
    }
    vec![Violation::new(
        "EXCESSIVE_BIDIRECTIONAL",
        Category::AiRelationships,
        Severity::Medium,
        3,
        "Multiple Bidirectional Relationships",
        Location::objects(format!("Relationships: {bidi} bidirectional")),
    )
    .with_description(format!(
        "Model has {bidi} bidirectional relationships. Bidirectional filtering can produce unexpected results."
    ))
    .with_recommendation(
        "Review if bidirectional filtering is truly needed. Document the expected filter behavior for Copilot.",
    )]
}

fn measures_not_in_folders(model: &Model) -> Vec<Violation> {
    let total = model.all_measures().count();
    let loose = model
        .all_measures()
        .filter(|(_, m)| m.display_folder.as_deref().map_or(true, str::is_empty))
        .count();
    if total <= 20 || loose as f64 <= total as f64 * 0.7 {
        return Vec::new();
    }
    vec![Violation::new(
        "MEASURES_NOT_IN_FOLDERS",
        Category::AiNavigation,
        Severity::Medium,
        3,
        "Measures Not Organized in Folders",
        Location::objects(format!("Measures: {loose} unorganized")),
    )
    .with_description(format!(
        "{loose} of {total} measures lack display folders. Organization helps Copilot understand measure groupings."
    ))
    .with_recommendation(
        "Organize measures into display folders by business area (e.g., 'Sales Metrics', 'Financial KPIs', 'Customer Analytics').",
    )]
}

fn missing_data_categories(model: &Model) -> Vec<Violation> {
    let mut missing = Vec::new();
    for (table, column) in model.all_columns() {
        if column.data_category.as_deref().is_some_and(|c| !c.is_empty()) {
            continue;
        }
        let lower = column.name.to_lowercase();
        for _ in CATEGORY_HINTS.iter().filter(|h| lower.contains(**h)) {
            missing.push(table_ref(table, &column.name));
        }
    }
    if missing.is_empty() {
        return Vec::new();
    }

    let shown = missing.iter().take(3).cloned().collect::<Vec<_>>().join(", ");
    vec![Violation::new(
        "MISSING_DATA_CATEGORIES",
        Category::AiDataQuality,
        Severity::Low,
        2,
        "Missing Data Categories",
        Location::objects(format!("Columns: {shown}")),
    )
    .with_description(format!(
        "{} columns could benefit from data categories. Data categories help Copilot understand column semantics.",
        missing.len()
    ))
    .with_recommendation("Set data categories for geographic, URL, and image columns.")]
}

fn technical_columns_visible(model: &Model) -> Vec<Violation> {
    let visible: Vec<String> = model
        .all_columns()
        .filter(|(_, c)| !c.is_hidden && super::name_has_any(&c.name, TECHNICAL_FRAGMENTS))
        .map(|(t, c)| table_ref(t, &c.name))
        .collect();
    if visible.is_empty() {
        return Vec::new();
    }

    let shown = visible.iter().take(5).cloned().collect::<Vec<_>>().join(", ");
    vec![Violation::new(
        "TECHNICAL_COLUMNS_VISIBLE",
        Category::AiNavigation,
        Severity::Low,
        2,
        "Technical Columns Visible",
        Location::objects(format!("Columns: {shown}")),
    )
    .with_description(format!(
        "{} technical columns (keys, IDs) are visible. These can clutter Copilot's suggestions.",
        visible.len()
    ))
    .with_recommendation(
        "Hide technical columns that end users don't need. This helps Copilot focus on business-relevant fields.",
    )]
}

fn consider_synonyms(model: &Model) -> Vec<Violation> {
    let measures = model.all_measures().count();
    if measures <= 30 {
        return Vec::new();
    }
    vec![Violation::new(
        "CONSIDER_SYNONYMS",
        Category::AiNaming,
        Severity::Info,
        0,
        "Consider Adding Synonyms",
        Location::Model,
    )
    .with_description(format!(
        "With {measures} measures, consider adding Q&A synonyms to help Copilot understand different ways users might ask for data."
    ))
    .with_recommendation(
        "Add synonyms in the Q&A setup for common terms. E.g., 'Revenue' = 'Sales', 'Income'; 'YoY' = 'Year over Year'.",
    )]
}

fn ambiguous_aggregation_measures(model: &Model) -> Vec<Violation> {
    let ambiguous: Vec<String> = model
        .all_measures()
        .filter(|(_, m)| m.description.is_empty() && super::name_has_any(&m.name, AGGREGATION_NAMES))
        .map(|(_, m)| m.name.clone())
        .collect();
    if ambiguous.len() <= 3 {
        return Vec::new();
    }

    let shown = ambiguous.iter().take(5).cloned().collect::<Vec<_>>().join(", ");
    vec![Violation::new(
        "AMBIGUOUS_AGGREGATION_MEASURES",
        Category::AiDocumentation,
        Severity::Medium,
        3,
        "Ambiguous Aggregation Measures",
        Location::objects(format!("Measures: {shown}")),
    )
    .with_description(format!(
        "{} measures have generic aggregation names without descriptions (e.g., 'Total Sales' - total of what? over what period?).",
        ambiguous.len()
    ))
    .with_recommendation(
        "Add descriptions clarifying: What is being aggregated? Over what scope? With what filters?",
    )]
}

/// Readiness band for an AI-readiness score
pub fn readiness_level(score: u32) -> &'static str {
    match score {
        90.. => "Excellent",
        70..=89 => "Good",
        50..=69 => "Fair",
        _ => "Poor",
    }
}

/// One named yes/no check on the AI report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecklistItem {
    pub name: &'static str,
    pub passed: bool,
}

/// The fixed readiness checklist, in display order
pub fn checklist(model: &Model) -> Vec<ChecklistItem> {
    let tables = model.tables.len();
    let measures = model.all_measures().count();
    let has_folders = model
        .all_measures()
        .any(|(_, m)| m.display_folder.as_deref().is_some_and(|f| !f.is_empty()));

    let items = [
        (
            "All tables have descriptions",
            model.tables.iter().all(|t| !t.description.is_empty()),
        ),
        (
            "All measures have descriptions",
            model.all_measures().all(|(_, m)| !m.description.is_empty()),
        ),
        (
            "No inactive relationships",
            model.relationships.iter().all(|r| r.is_active),
        ),
        (
            "No many-to-many relationships",
            !model.relationships.iter().any(|r| r.is_many_to_many()),
        ),
        ("Measures organized in folders", measures < 20 || has_folders),
        (
            "Model has date table",
            model.tables.iter().any(|t| {
                t.data_category.as_deref() == Some("Time") || t.name.to_lowercase().contains("date")
            }),
        ),
        ("Less than 50 tables", tables < 50),
        ("Less than 200 measures", measures < 200),
    ];
    items
        .into_iter()
        .map(|(name, passed)| ChecklistItem { name, passed })
        .collect()
}
