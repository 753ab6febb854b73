//! TMSL-like JSON format
//!
//! Vendor keys map one-to-one onto the canonical fields. Enumerated
//! values are re-bucketed into the vocabulary the text parser produces.

use super::{clean_expression, mquery, NormalizeError};
use crate::graph::{
    Cardinality, Column, CrossFilter, Hierarchy, LoadMode, Measure, Model, Partition,
    Relationship, Role, SharedExpression, Table, TablePermission,
};
use serde_json::Value;
use tracing::debug;

pub fn parse(text: &str) -> Result<Model, NormalizeError> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Object(_) = &value else {
        return Err(NormalizeError::UnexpectedShape(
            "root must be a JSON object".to_string(),
        ));
    };
    let root = match value.get("model") {
        Some(m @ Value::Object(_)) => m,
        _ => &value,
    };

    let model = Model {
        name: str_field(root, "name")
            .or_else(|| str_field(&value, "name"))
            .unwrap_or_default(),
        culture: str_field(root, "culture")
            .or_else(|| str_field(&value, "culture"))
            .unwrap_or_default(),
        default_mode: str_field(root, "defaultMode")
            .or_else(|| str_field(&value, "defaultMode"))
            .unwrap_or_default(),
        tables: array(root, "tables").iter().map(parse_table).collect(),
        relationships: array(root, "relationships")
            .iter()
            .filter_map(parse_relationship)
            .collect(),
        roles: array(root, "roles").iter().map(parse_role).collect(),
        expressions: array(root, "expressions")
            .iter()
            .map(parse_expression)
            .collect(),
    };

    debug!(
        "JSON normalizer: {} tables, {} relationships, {} roles",
        model.tables.len(),
        model.relationships.len(),
        model.roles.len()
    );
    Ok(model)
}

fn array<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn bool_field(value: &Value, key: &str) -> Option<bool> {
    value.get(key).and_then(Value::as_bool)
}

/// A string, or an array of lines joined with `\n`
fn expression_field(value: &Value, key: &str) -> Option<String> {
    let raw = match value.get(key)? {
        Value::String(s) => s.clone(),
        Value::Array(lines) => lines
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join("\n"),
        _ => return None,
    };
    Some(clean_expression(&raw))
}

fn parse_table(value: &Value) -> Table {
    let name = str_field(value, "name").unwrap_or_default();
    let partitions = array(value, "partitions")
        .iter()
        .map(|p| parse_partition(p, &name))
        .collect();
    Table {
        description: str_field(value, "description").unwrap_or_default(),
        is_hidden: bool_field(value, "isHidden").unwrap_or(false),
        data_category: str_field(value, "dataCategory"),
        columns: array(value, "columns").iter().map(parse_column).collect(),
        measures: array(value, "measures").iter().map(parse_measure).collect(),
        partitions,
        hierarchies: array(value, "hierarchies")
            .iter()
            .map(parse_hierarchy)
            .collect(),
        name,
    }
}

fn parse_column(value: &Value) -> Column {
    let declared_type = str_field(value, "dataType");
    let type_field = str_field(value, "type");
    // `type: calculated` describes the column kind, not its data type
    let data_type = declared_type
        .or_else(|| type_field.filter(|t| !t.eq_ignore_ascii_case("calculated")))
        .unwrap_or_default();
    Column {
        name: str_field(value, "name").unwrap_or_default(),
        data_type,
        is_hidden: bool_field(value, "isHidden").unwrap_or(false),
        is_key: bool_field(value, "isKey").unwrap_or(false),
        data_category: str_field(value, "dataCategory"),
        summarize_by: str_field(value, "summarizeBy"),
        description: str_field(value, "description").unwrap_or_default(),
        expression: expression_field(value, "expression"),
    }
}

fn parse_measure(value: &Value) -> Measure {
    Measure {
        name: str_field(value, "name").unwrap_or_default(),
        expression: expression_field(value, "expression").unwrap_or_default(),
        format_string: str_field(value, "formatString"),
        display_folder: str_field(value, "displayFolder"),
        description: str_field(value, "description").unwrap_or_default(),
    }
}

fn parse_partition(value: &Value, table: &str) -> Partition {
    let name = str_field(value, "name").unwrap_or_default();
    let source_obj = value.get("source");
    let source_type = source_obj
        .and_then(|s| str_field(s, "type"))
        .unwrap_or_default();

    let mode = match str_field(value, "mode") {
        Some(m) => LoadMode::parse(&m),
        None if source_type.to_lowercase().contains("directquery") => LoadMode::DirectQuery,
        None => LoadMode::Import,
    };

    let source = source_obj
        .and_then(|s| expression_field(s, "expression"))
        .unwrap_or_default();
    let query = if source.starts_with("let") {
        mquery::parse_query(&format!("{}.{}", table, name), &source)
    } else {
        None
    };

    Partition {
        name,
        kind: source_type,
        mode,
        source,
        query,
    }
}

fn parse_hierarchy(value: &Value) -> Hierarchy {
    Hierarchy {
        name: str_field(value, "name").unwrap_or_default(),
        levels: array(value, "levels")
            .iter()
            .filter_map(|l| str_field(l, "name"))
            .collect(),
    }
}

fn parse_relationship(value: &Value) -> Option<Relationship> {
    let name = str_field(value, "name").unwrap_or_default();
    let endpoints = (
        str_field(value, "fromTable"),
        str_field(value, "fromColumn"),
        str_field(value, "toTable"),
        str_field(value, "toColumn"),
    );
    let (Some(from_table), Some(from_column), Some(to_table), Some(to_column)) = endpoints else {
        debug!("Dropping relationship {}: missing endpoint", name);
        return None;
    };

    let from_card = str_field(value, "fromCardinality");
    let to_card = str_field(value, "toCardinality");
    let cardinality = if from_card.is_some() || to_card.is_some() {
        Cardinality::from_sides(
            from_card.as_deref().unwrap_or("many"),
            to_card.as_deref().unwrap_or("one"),
        )
    } else {
        str_field(value, "cardinality")
            .map(|c| Cardinality::parse(&c))
            .unwrap_or_default()
    };

    let cross = str_field(value, "crossFilteringBehavior")
        .or_else(|| str_field(value, "crossFilterDirection"))
        .unwrap_or_default();
    let cross_filter = if cross.to_lowercase().contains("both") {
        CrossFilter::Both
    } else {
        CrossFilter::Single
    };

    Some(Relationship {
        name,
        from_table,
        from_column,
        to_table,
        to_column,
        cardinality,
        cross_filter,
        is_active: bool_field(value, "isActive").unwrap_or(true),
    })
}

fn parse_role(value: &Value) -> Role {
    Role {
        name: str_field(value, "name").unwrap_or_default(),
        model_permission: str_field(value, "modelPermission").unwrap_or_default(),
        table_permissions: array(value, "tablePermissions")
            .iter()
            .map(|p| TablePermission {
                table: str_field(p, "name").unwrap_or_default(),
                filter: expression_field(p, "filterExpression").unwrap_or_default(),
            })
            .collect(),
    }
}

fn parse_expression(value: &Value) -> SharedExpression {
    let name = str_field(value, "name").unwrap_or_default();
    let expression = expression_field(value, "expression").unwrap_or_default();
    let query = if expression.starts_with("let") {
        mquery::parse_query(&name, &expression)
    } else {
        None
    };
    SharedExpression {
        name,
        expression,
        query,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maps_vendor_fields() {
        let json = r#"{
            "model": {
                "culture": "en-US",
                "tables": [{
                    "name": "Sales",
                    "isHidden": false,
                    "columns": [
                        {"name": "Amount", "dataType": "decimal"},
                        {"name": "Margin", "type": "calculated", "expression": "[Amount] * 0.1"}
                    ],
                    "measures": [{"name": "Total", "expression": ["SUM(", "  Sales[Amount]", ")"]}],
                    "partitions": [{"name": "P", "source": {"type": "m", "expression": "let\n  A = 1\nin\n  A"}}]
                }],
                "relationships": [
                    {"fromTable": "Sales", "fromColumn": "K", "toTable": "Product", "toColumn": "K",
                     "cardinality": "manyToMany", "crossFilteringBehavior": "bothDirections"},
                    {"fromTable": "Sales", "fromColumn": "K"}
                ]
            }
        }"#;
        let model = parse(json).unwrap();
        let sales = &model.tables[0];
        assert_eq!(sales.columns[1].data_type, "");
        assert!(sales.columns[1].is_calculated());
        assert_eq!(sales.measures[0].expression, "SUM(\nSales[Amount]\n)");
        assert_eq!(sales.partitions[0].query.as_ref().unwrap().name, "Sales.P");

        assert_eq!(model.relationships.len(), 1);
        assert_eq!(model.relationships[0].cardinality, Cardinality::ManyToMany);
        assert_eq!(model.relationships[0].cross_filter, CrossFilter::Both);
        assert!(model.relationships[0].is_active);
    }

    #[test]
    fn test_direct_query_from_source_type() {
        let json = r#"{"tables": [{"name": "T", "partitions": [{"name": "P", "source": {"type": "directQuery"}}]}]}"#;
        let model = parse(json).unwrap();
        assert_eq!(model.tables[0].partitions[0].mode, LoadMode::DirectQuery);
    }

    #[test]
    fn test_rejects_non_object_root() {
        assert!(matches!(
            parse("[1, 2, 3]"),
            Err(NormalizeError::UnexpectedShape(_))
        ));
        assert!(matches!(parse("{oops"), Err(NormalizeError::InvalidJson(_))));
    }
}
