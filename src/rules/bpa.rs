//! Best-practice analyzer rules
//!
//! Modeled on the published BPA catalog: one predicate per attribute of
//! one entity kind. Titles carry the catalog rule name.

use super::base::{FnRule, Rule};
use super::{endpoint_tables, name_has_any, relationship_location};
use crate::graph::{Column, Model, Table};
use crate::models::{Category, Location, Severity, Violation};
use serde_json::json;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

pub fn rules() -> Vec<Arc<dyn Rule>> {
    vec![
        Arc::new(FnRule::new(
            "AVOID_FLOATING_POINT_DATA_TYPES",
            "Columns typed double, float or real",
            Category::Performance,
            Severity::Medium,
            floating_point_types,
        )),
        Arc::new(FnRule::new(
            "REMOVE_AUTO_DATE_TABLE",
            "Auto-generated date tables",
            Category::Performance,
            Severity::Medium,
            auto_date_tables,
        )),
        Arc::new(FnRule::new(
            "MODEL_SHOULD_HAVE_A_DATE_TABLE",
            "Models with more than two tables and no date table",
            Category::Performance,
            Severity::Medium,
            date_table_exists,
        )),
        Arc::new(FnRule::new(
            "DATE_TABLE_SHOULD_BE_MARKED",
            "Date or calendar tables not marked as date tables",
            Category::Performance,
            Severity::Low,
            date_table_marked,
        )),
        Arc::new(FnRule::new(
            "AVOID_EXCESSIVE_BI-DIRECTIONAL_OR_MANY-TO-MANY_RELATIONSHIPS",
            "Share of bidirectional or many-to-many relationships above 30%",
            Category::Relationships,
            Severity::Medium,
            excessive_bidirectional,
        )),
        Arc::new(FnRule::new(
            "REDUCE_NUMBER_OF_CALCULATED_COLUMNS",
            "More than five calculated columns model-wide",
            Category::Performance,
            Severity::Medium,
            calculated_column_count,
        )),
        Arc::new(FnRule::new(
            "SNOWFLAKE_SCHEMA_ARCHITECTURE",
            "Tables on both sides of relationships",
            Category::Design,
            Severity::Medium,
            snowflake_schema,
        )),
        Arc::new(FnRule::new(
            "HIDE_FOREIGN_KEYS",
            "Visible foreign key columns",
            Category::BestPractices,
            Severity::Low,
            foreign_keys_hidden,
        )),
        Arc::new(FnRule::new(
            "AVOID_DUPLICATE_MEASURES",
            "Measures with the same definition",
            Category::Measures,
            Severity::Medium,
            duplicate_measures,
        )),
        Arc::new(FnRule::new(
            "PROVIDE_FORMAT_STRING_FOR_MEASURES",
            "Measures without a format string",
            Category::BestPractices,
            Severity::Low,
            measure_format_strings,
        )),
        Arc::new(FnRule::new(
            "ADD_DATA_CATEGORY_FOR_COLUMNS",
            "Columns whose names suggest a data category",
            Category::BestPractices,
            Severity::Low,
            column_data_categories,
        )),
        Arc::new(FnRule::new(
            "OBJECTS_SHOULD_NOT_START_OR_END_WITH_A_SPACE",
            "Object names with leading or trailing whitespace",
            Category::Naming,
            Severity::Medium,
            object_name_spaces,
        )),
        Arc::new(FnRule::new(
            "PERCENTAGE_FORMATTING",
            "Percentage measures without a percentage format",
            Category::BestPractices,
            Severity::Low,
            percentage_formatting,
        )),
        Arc::new(FnRule::new(
            "DO_NOT_SUMMARIZE_NUMERIC_COLUMNS",
            "Summarized numeric id-like columns",
            Category::BestPractices,
            Severity::Low,
            summarize_by_none,
        )),
        Arc::new(FnRule::new(
            "RELATIONSHIP_COLUMNS_SHOULD_BE_OF_INTEGER_DATA_TYPE",
            "Non-integer relationship columns",
            Category::Relationships,
            Severity::Medium,
            relationship_column_types,
        )),
        Arc::new(FnRule::new(
            "PROVIDE_DESCRIPTION_FOR_MEASURES",
            "Measures without a description",
            Category::Documentation,
            Severity::Low,
            measure_descriptions,
        )),
        Arc::new(FnRule::new(
            "PROVIDE_DESCRIPTION_FOR_COLUMNS",
            "Visible columns without a description",
            Category::Documentation,
            Severity::Low,
            column_descriptions,
        )),
        Arc::new(FnRule::new(
            "PROVIDE_DESCRIPTION_FOR_TABLES",
            "Visible tables without a description",
            Category::Documentation,
            Severity::Low,
            table_descriptions,
        )),
        Arc::new(FnRule::new(
            "MARK_PRIMARY_KEYS",
            "Dimension tables with no key column",
            Category::Relationships,
            Severity::Low,
            primary_keys_marked,
        )),
        Arc::new(FnRule::new(
            "HIDE_FACT_TABLE_COLUMNS",
            "Fact tables with many visible columns",
            Category::BestPractices,
            Severity::Low,
            fact_table_columns_hidden,
        )),
        Arc::new(FnRule::new(
            "FIRST_LETTER_OF_OBJECTS_SHOULD_BE_CAPITALIZED",
            "Table and measure names starting lowercase",
            Category::Naming,
            Severity::Low,
            object_capitalization,
        )),
    ]
}

fn floating_point_types(model: &Model) -> Vec<Violation> {
    model
        .all_columns()
        .filter(|(_, c)| matches!(c.data_type.to_lowercase().as_str(), "double" | "float" | "real"))
        .map(|(table, column)| {
            Violation::new(
                "AVOID_FLOATING_POINT_DATA_TYPES",
                Category::Performance,
                Severity::Medium,
                2,
                "Do not use floating point data types",
                Location::column(&table.name, &column.name),
            )
            .with_description(
                "Double/Float data types can cause roundoff errors and decreased performance.",
            )
            .with_recommendation("Use Int64 or Decimal data types instead.")
        })
        .collect()
}

fn is_auto_date_table(name: &str) -> bool {
    name.starts_with("DateTableTemplate_") || name.starts_with("LocalDateTable_")
}

fn auto_date_tables(model: &Model) -> Vec<Violation> {
    model
        .tables
        .iter()
        .filter(|t| is_auto_date_table(&t.name))
        .map(|table| {
            Violation::new(
                "REMOVE_AUTO_DATE_TABLE",
                Category::Performance,
                Severity::Medium,
                3,
                "Remove auto-date table",
                Location::table(&table.name),
            )
            .with_description(
                "Auto-date tables waste memory. Turn off in Power BI Desktop settings.",
            )
            .with_recommendation(
                "Disable auto date/time in Options > Data Load, then delete these tables.",
            )
        })
        .collect()
}

const DATE_TABLE_NAMES: &[&str] = &["date", "calendar", "dim_date", "dimdate", "dates"];

fn date_table_exists(model: &Model) -> Vec<Violation> {
    let has_date_table = model.tables.iter().any(|t| {
        t.is_marked_date_table() || DATE_TABLE_NAMES.contains(&t.name.to_lowercase().as_str())
    });
    if has_date_table || model.tables.len() <= 2 {
        return Vec::new();
    }

    vec![Violation::new(
        "MODEL_SHOULD_HAVE_A_DATE_TABLE",
        Category::Performance,
        Severity::Medium,
        3,
        "Model should have a date table",
        Location::Model,
    )
    .with_description("Models should have a dedicated date table for time intelligence.")
    .with_recommendation("Create a date table and mark it as a Date Table in Power BI.")]
}

fn date_table_marked(model: &Model) -> Vec<Violation> {
    model
        .tables
        .iter()
        .filter(|t| {
            let lower = t.name.to_lowercase();
            (lower.contains("date") || lower.contains("calendar"))
                && !lower.starts_with("datetabletemplate_")
                && !lower.starts_with("localdatetable_")
                && !t.is_marked_date_table()
        })
        .map(|table| {
            Violation::new(
                "DATE_TABLE_SHOULD_BE_MARKED",
                Category::Performance,
                Severity::Low,
                2,
                "Date/calendar tables should be marked as a date table",
                Location::table(&table.name),
            )
            .with_description(format!(
                "Table '{}' appears to be a date table but isn't marked as one.",
                table.name
            ))
            .with_recommendation("Mark this table as a Date Table in Power BI Desktop.")
        })
        .collect()
}

fn excessive_bidirectional(model: &Model) -> Vec<Violation> {
    let rule_id = "AVOID_EXCESSIVE_BI-DIRECTIONAL_OR_MANY-TO-MANY_RELATIONSHIPS";
    let total = model.relationships.len();
    if total == 0 {
        return Vec::new();
    }

    let mut violations = Vec::new();
    let bidi = model.relationships.iter().filter(|r| r.is_bidirectional()).count();
    let m2m = model.relationships.iter().filter(|r| r.is_many_to_many()).count();
    let problematic = bidi + m2m;
    if problematic as f64 / total as f64 > 0.3 {
        violations.push(
            Violation::new(
                rule_id,
                Category::Relationships,
                Severity::Medium,
                5,
                "Avoid excessive bi-directional or many-to-many relationships",
                Location::Model,
            )
            .with_description(format!(
                "{} of {} relationships ({}%) are bi-directional or many-to-many.",
                problematic,
                total,
                problematic * 100 / total
            ))
            .with_recommendation("Limit bi-directional and many-to-many relationships to under 30% of total.")
            .with_details(json!({ "bidi_count": bidi, "m2m_count": m2m, "total": total })),
        );
    }

    for rel in model
        .relationships
        .iter()
        .filter(|r| r.is_many_to_many() && r.is_bidirectional())
    {
        violations.push(
            Violation::new(
                rule_id,
                Category::Relationships,
                Severity::Critical,
                10,
                "Many-to-Many with Bidirectional Filter",
                relationship_location(rel),
            )
            .with_description(format!(
                "Relationship '{}' uses many-to-many cardinality with bidirectional filtering between {} and {}",
                rel.name, rel.from_table, rel.to_table
            ))
            .with_recommendation(
                "Avoid many-to-many relationships with bidirectional filtering. Consider restructuring the model or using a bridge table.",
            ),
        );
    }
    violations
}

fn calculated_column_count(model: &Model) -> Vec<Violation> {
    let count = model.all_calculated_columns().count();
    if count <= 5 {
        return Vec::new();
    }

    vec![Violation::new(
        "REDUCE_NUMBER_OF_CALCULATED_COLUMNS",
        Category::Performance,
        Severity::Medium,
        3,
        "Reduce number of calculated columns",
        Location::Model,
    )
    .with_description(format!("Model has {count} calculated columns."))
    .with_recommendation(
        "Calculated columns slow processing and increase model size. Move logic to data warehouse.",
    )
    .with_details(json!({ "count": count }))]
}

fn snowflake_schema(model: &Model) -> Vec<Violation> {
    let (_, _, both) = endpoint_tables(&model.relationships);
    both.into_iter()
        .filter(|name| !name.to_lowercase().contains("fact"))
        .map(|name| {
            Violation::new(
                "SNOWFLAKE_SCHEMA_ARCHITECTURE",
                Category::Design,
                Severity::Medium,
                3,
                "Consider a star-schema instead of a snowflake architecture",
                Location::table(name),
            )
            .with_description(format!(
                "Table '{name}' has relationships on both sides, suggesting snowflake schema."
            ))
            .with_recommendation("Consider denormalizing to a star schema for better performance.")
        })
        .collect()
}

fn foreign_keys_hidden(model: &Model) -> Vec<Violation> {
    let foreign_keys: BTreeSet<(&str, &str)> = model
        .relationships
        .iter()
        .map(|r| (r.from_table.as_str(), r.from_column.as_str()))
        .collect();

    model
        .all_columns()
        .filter(|(t, c)| !c.is_hidden && foreign_keys.contains(&(t.name.as_str(), c.name.as_str())))
        .map(|(table, column)| {
            Violation::new(
                "HIDE_FOREIGN_KEYS",
                Category::BestPractices,
                Severity::Low,
                1,
                "Hide foreign keys",
                Location::column(&table.name, &column.name),
            )
            .with_description(format!(
                "Foreign key column '{}' in table '{}' is not hidden.",
                column.name, table.name
            ))
            .with_recommendation("Hide foreign key columns to reduce clutter for end users.")
        })
        .collect()
}

fn duplicate_measures(model: &Model) -> Vec<Violation> {
    let mut seen: HashMap<String, &str> = HashMap::new();
    let mut violations = Vec::new();

    for (table, measure) in model.all_measures() {
        let normalized: String = measure
            .expression
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        match seen.get(&normalized) {
            Some(first) => violations.push(
                Violation::new(
                    "AVOID_DUPLICATE_MEASURES",
                    Category::Measures,
                    Severity::Medium,
                    3,
                    "No two measures should have the same definition",
                    Location::measure(&table.name, &measure.name),
                )
                .with_description(format!(
                    "Measure '{}' has the same definition as '{}'.",
                    measure.name, first
                ))
                .with_recommendation("Remove duplicate measures and use the original."),
            ),
            None => {
                seen.insert(normalized, &measure.name);
            }
        }
    }
    violations
}

fn measure_format_strings(model: &Model) -> Vec<Violation> {
    model
        .all_measures()
        .filter(|(_, m)| m.format_string.as_deref().unwrap_or_default().is_empty())
        .map(|(table, measure)| {
            Violation::new(
                "PROVIDE_FORMAT_STRING_FOR_MEASURES",
                Category::BestPractices,
                Severity::Low,
                1,
                "Provide format string for measures",
                Location::measure(&table.name, &measure.name),
            )
            .with_description(format!("Measure '{}' has no format string.", measure.name))
            .with_recommendation("Add a format string for consistent display.")
        })
        .collect()
}

/// Name fragment to expected data category, first match wins
const DATA_CATEGORY_HINTS: &[(&str, &str)] = &[
    ("url", "WebUrl"),
    ("link", "WebUrl"),
    ("website", "WebUrl"),
    ("image", "ImageUrl"),
    ("photo", "ImageUrl"),
    ("city", "City"),
    ("country", "Country"),
    ("state", "StateOrProvince"),
    ("postal", "PostalCode"),
    ("zip", "PostalCode"),
    ("latitude", "Latitude"),
    ("longitude", "Longitude"),
    ("address", "Address"),
];

pub(crate) fn expected_data_category(column: &Column) -> Option<&'static str> {
    if column.data_category.is_some() {
        return None;
    }
    let lower = column.name.to_lowercase();
    DATA_CATEGORY_HINTS
        .iter()
        .find(|(hint, _)| lower.contains(hint))
        .map(|(_, category)| *category)
}

fn column_data_categories(model: &Model) -> Vec<Violation> {
    model
        .all_columns()
        .filter_map(|(table, column)| {
            let category = expected_data_category(column)?;
            Some(
                Violation::new(
                    "ADD_DATA_CATEGORY_FOR_COLUMNS",
                    Category::BestPractices,
                    Severity::Low,
                    1,
                    "Add data category for columns",
                    Location::column(&table.name, &column.name),
                )
                .with_description(format!(
                    "Column '{}' might benefit from data category '{}'.",
                    column.name, category
                ))
                .with_recommendation(format!(
                    "Set the Data Category to \"{category}\" for enhanced functionality."
                )),
            )
        })
        .collect()
}

fn padded(name: &str) -> bool {
    name != name.trim()
}

fn object_name_spaces(model: &Model) -> Vec<Violation> {
    let hit = |kind: &str, name: &str, location: Location| {
        Violation::new(
            "OBJECTS_SHOULD_NOT_START_OR_END_WITH_A_SPACE",
            Category::Naming,
            Severity::Medium,
            2,
            "Objects should not start or end with a space",
            location,
        )
        .with_description(format!("{kind} '{name}' has leading or trailing spaces."))
        .with_recommendation("Remove spaces from the beginning and end of object names.")
    };

    let mut violations = Vec::new();
    for table in &model.tables {
        if padded(&table.name) {
            violations.push(hit("Table", &table.name, Location::table(&table.name)));
        }
        for column in table.columns.iter().filter(|c| padded(&c.name)) {
            violations.push(hit(
                "Column",
                &column.name,
                Location::column(&table.name, &column.name),
            ));
        }
        for measure in table.measures.iter().filter(|m| padded(&m.name)) {
            violations.push(hit(
                "Measure",
                &measure.name,
                Location::measure(&table.name, &measure.name),
            ));
        }
    }
    violations
}

const PERCENTAGE_HINTS: &[&str] = &["percent", "pct", "%", "rate", "ratio", "margin"];

fn percentage_formatting(model: &Model) -> Vec<Violation> {
    model
        .all_measures()
        .filter(|(_, m)| {
            let format = m.format_string.as_deref().unwrap_or_default();
            let formatted = format.contains('%') || format.to_lowercase().contains("percent");
            name_has_any(&m.name, PERCENTAGE_HINTS) && !formatted
        })
        .map(|(table, measure)| {
            Violation::new(
                "PERCENTAGE_FORMATTING",
                Category::BestPractices,
                Severity::Low,
                1,
                "Percentage formatting",
                Location::measure(&table.name, &measure.name),
            )
            .with_description(format!(
                "Measure '{}' appears to be a percentage but isn't formatted as one.",
                measure.name
            ))
            .with_recommendation("Set format string to \"0.00%\" or similar.")
        })
        .collect()
}

const ID_LIKE_HINTS: &[&str] = &["id", "key", "code", "number", "year", "month", "day", "quarter"];

fn summarize_by_none(model: &Model) -> Vec<Violation> {
    model
        .all_columns()
        .filter(|(_, c)| {
            let numeric = matches!(
                c.data_type.to_lowercase().as_str(),
                "int64" | "integer" | "decimal" | "double" | "currency"
            );
            let summarized = c
                .summarize_by
                .as_deref()
                .is_some_and(|s| !s.eq_ignore_ascii_case("none"));
            numeric && name_has_any(&c.name, ID_LIKE_HINTS) && summarized
        })
        .map(|(table, column)| {
            Violation::new(
                "DO_NOT_SUMMARIZE_NUMERIC_COLUMNS",
                Category::BestPractices,
                Severity::Low,
                1,
                "Do not summarize numeric columns",
                Location::column(&table.name, &column.name),
            )
            .with_description(format!(
                "Column '{}' is numeric but appears to be an ID/key.",
                column.name
            ))
            .with_recommendation("Set Summarize By to \"None\" to prevent accidental aggregation.")
        })
        .collect()
}

fn relationship_column_types(model: &Model) -> Vec<Violation> {
    let endpoints: BTreeSet<(&str, &str)> = model
        .relationships
        .iter()
        .flat_map(|r| {
            [
                (r.from_table.as_str(), r.from_column.as_str()),
                (r.to_table.as_str(), r.to_column.as_str()),
            ]
        })
        .collect();

    model
        .all_columns()
        .filter(|(t, c)| {
            endpoints.contains(&(t.name.as_str(), c.name.as_str()))
                && !matches!(
                    c.data_type.to_lowercase().as_str(),
                    "int64" | "integer" | "int" | "whole number"
                )
        })
        .map(|(table, column)| {
            Violation::new(
                "RELATIONSHIP_COLUMNS_SHOULD_BE_OF_INTEGER_DATA_TYPE",
                Category::Relationships,
                Severity::Medium,
                2,
                "Relationship columns should be of integer data type",
                Location::column(&table.name, &column.name),
            )
            .with_description(format!(
                "Relationship column '{}' is {}, not integer.",
                column.name,
                column.data_type.to_lowercase()
            ))
            .with_recommendation("Integer columns are most efficient for relationships.")
        })
        .collect()
}

fn measure_descriptions(model: &Model) -> Vec<Violation> {
    model
        .all_measures()
        .filter(|(_, m)| m.description.is_empty())
        .map(|(table, measure)| {
            Violation::new(
                "PROVIDE_DESCRIPTION_FOR_MEASURES",
                Category::Documentation,
                Severity::Low,
                1,
                "Provide description for measures",
                Location::measure(&table.name, &measure.name),
            )
            .with_description(format!("Measure '{}' has no description.", measure.name))
            .with_recommendation("Add a description explaining the business logic.")
        })
        .collect()
}

fn column_descriptions(model: &Model) -> Vec<Violation> {
    model
        .all_columns()
        .filter(|(_, c)| !c.is_hidden && c.description.is_empty())
        .map(|(table, column)| {
            Violation::new(
                "PROVIDE_DESCRIPTION_FOR_COLUMNS",
                Category::Documentation,
                Severity::Low,
                1,
                "Provide description for columns",
                Location::column(&table.name, &column.name),
            )
            .with_description(format!("Column '{}' has no description.", column.name))
            .with_recommendation("Add a description for end-user clarity.")
        })
        .collect()
}

fn table_descriptions(model: &Model) -> Vec<Violation> {
    model
        .tables
        .iter()
        .filter(|t| !t.is_hidden && t.description.is_empty())
        .map(|table| {
            Violation::new(
                "PROVIDE_DESCRIPTION_FOR_TABLES",
                Category::Documentation,
                Severity::Low,
                1,
                "Provide description for tables",
                Location::table(&table.name),
            )
            .with_description(format!("Table '{}' has no description.", table.name))
            .with_recommendation("Add a description explaining the table purpose.")
        })
        .collect()
}

fn primary_keys_marked(model: &Model) -> Vec<Violation> {
    let dimensions: BTreeSet<&str> = model
        .relationships
        .iter()
        .map(|r| r.to_table.as_str())
        .collect();

    model
        .tables
        .iter()
        .filter(|t| dimensions.contains(t.name.as_str()) && !t.columns.iter().any(|c| c.is_key))
        .map(|table| {
            Violation::new(
                "MARK_PRIMARY_KEYS",
                Category::Relationships,
                Severity::Low,
                2,
                "Mark primary keys",
                Location::table(&table.name),
            )
            .with_description(format!(
                "Dimension table '{}' has no marked primary key.",
                table.name
            ))
            .with_recommendation("Mark the unique key column as a primary key.")
        })
        .collect()
}

fn fact_table_columns_hidden(model: &Model) -> Vec<Violation> {
    let (from, _, _) = endpoint_tables(&model.relationships);
    let is_fact = |t: &Table| from.contains(&t.name.as_str()) || t.name.to_lowercase().contains("fact");

    model
        .tables
        .iter()
        .filter(|t| is_fact(t))
        .filter_map(|table| {
            let visible = table.visible_columns().count();
            (visible > 5).then(|| {
                Violation::new(
                    "HIDE_FACT_TABLE_COLUMNS",
                    Category::BestPractices,
                    Severity::Low,
                    1,
                    "Hide fact table columns",
                    Location::table(&table.name),
                )
                .with_description(format!(
                    "Fact table '{}' has {} visible columns.",
                    table.name, visible
                ))
                .with_recommendation(
                    "Hide columns in fact tables to reduce clutter. Users should use measures.",
                )
                .with_details(json!({ "visible_columns": visible }))
            })
        })
        .collect()
}

fn starts_lowercase(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_lowercase)
}

fn object_capitalization(model: &Model) -> Vec<Violation> {
    let hit = |kind: &str, name: &str, location: Location| {
        Violation::new(
            "FIRST_LETTER_OF_OBJECTS_SHOULD_BE_CAPITALIZED",
            Category::Naming,
            Severity::Low,
            1,
            "First letter of objects should be capitalized",
            location,
        )
        .with_description(format!("{kind} '{name}' does not start with a capital letter."))
        .with_recommendation("Capitalize the first letter of object names for consistency.")
    };

    let mut violations = Vec::new();
    for table in &model.tables {
        if starts_lowercase(&table.name) {
            violations.push(hit("Table", &table.name, Location::table(&table.name)));
        }
        for measure in table.measures.iter().filter(|m| starts_lowercase(&m.name)) {
            violations.push(hit(
                "Measure",
                &measure.name,
                Location::measure(&table.name, &measure.name),
            ));
        }
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Cardinality, CrossFilter, Measure, Relationship};

    fn model_with_measures(measures: &[(&str, &str)]) -> Model {
        let mut table = Table::new("Sales");
        table.measures = measures
            .iter()
            .map(|(name, expr)| Measure::new(*name, *expr))
            .collect();
        Model {
            tables: vec![table],
            ..Default::default()
        }
    }

    #[test]
    fn test_duplicate_measures_ignore_whitespace() {
        let model = model_with_measures(&[
            ("Total", "SUM([A])"),
            ("Total Copy", "SUM( [A] )"),
            ("Other", "SUM([B])"),
        ]);
        let violations = duplicate_measures(&model);
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].description,
            "Measure 'Total Copy' has the same definition as 'Total'."
        );
        assert_eq!(violations[0].location, Location::measure("Sales", "Total Copy"));
    }

    #[test]
    fn test_excessive_bidirectional_with_critical_pair() {
        let mut both = Relationship::new(("Sales", "K"), ("Bridge", "K"));
        both.cardinality = Cardinality::ManyToMany;
        both.cross_filter = CrossFilter::Both;
        let model = Model {
            relationships: vec![both, Relationship::new(("Sales", "P"), ("Product", "P"))],
            ..Default::default()
        };

        let violations = excessive_bidirectional(&model);
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].severity, Severity::Medium);
        assert_eq!(
            violations[0].description,
            "2 of 2 relationships (100%) are bi-directional or many-to-many."
        );
        assert_eq!(violations[1].severity, Severity::Critical);
        assert_eq!(violations[1].impact, 10);
    }

    #[test]
    fn test_excessive_bidirectional_empty_model() {
        assert!(excessive_bidirectional(&Model::default()).is_empty());
    }

    #[test]
    fn test_snowflake_skips_fact_tables() {
        let model = Model {
            relationships: vec![
                Relationship::new(("FactSales", "P"), ("Product", "P")),
                Relationship::new(("Product", "C"), ("Category", "C")),
                Relationship::new(("FactReturns", "S"), ("FactSales", "S")),
            ],
            ..Default::default()
        };
        let tables: Vec<String> = snowflake_schema(&model)
            .into_iter()
            .map(|v| v.location.to_string())
            .collect();
        assert_eq!(tables, vec!["Table: Product"]);
    }

    #[test]
    fn test_data_category_first_hint_wins() {
        let column = Column::new("Website Link", "string");
        assert_eq!(expected_data_category(&column), Some("WebUrl"));

        let mut tagged = Column::new("City", "string");
        tagged.data_category = Some("City".into());
        assert_eq!(expected_data_category(&tagged), None);
    }

    #[test]
    fn test_primary_keys_only_for_resolvable_dimensions() {
        let mut product = Table::new("Product");
        product.columns.push(Column::new("ProductKey", "int64"));
        let model = Model {
            tables: vec![Table::new("Sales"), product],
            relationships: vec![
                Relationship::new(("Sales", "ProductKey"), ("Product", "ProductKey")),
                Relationship::new(("Sales", "StoreKey"), ("Store", "StoreKey")),
            ],
            ..Default::default()
        };
        let violations = primary_keys_marked(&model);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].location, Location::table("Product"));
    }

    #[test]
    fn test_relationship_columns_must_be_integer() {
        let mut sales = Table::new("Sales");
        sales.columns.push(Column::new("ProductCode", "string"));
        let mut product = Table::new("Product");
        product.columns.push(Column::new("ProductCode", "Int64"));
        let model = Model {
            tables: vec![sales, product],
            relationships: vec![Relationship::new(
                ("Sales", "ProductCode"),
                ("Product", "ProductCode"),
            )],
            ..Default::default()
        };
        let violations = relationship_column_types(&model);
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].description,
            "Relationship column 'ProductCode' is string, not integer."
        );
    }

    #[test]
    fn test_percentage_formatting() {
        let mut model = model_with_measures(&[("Margin Pct", "1"), ("Growth Rate", "2")]);
        model.tables[0].measures[1].format_string = Some("0.0%".into());
        let violations = percentage_formatting(&model);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].location, Location::measure("Sales", "Margin Pct"));
    }

    #[test]
    fn test_spaces_and_capitalization() {
        let model = model_with_measures(&[(" Total", "1"), ("count", "2")]);
        assert_eq!(object_name_spaces(&model).len(), 1);
        let lower = object_capitalization(&model);
        assert_eq!(lower.len(), 1);
        assert_eq!(
            lower[0].description,
            "Measure 'count' does not start with a capital letter."
        );
    }
}
