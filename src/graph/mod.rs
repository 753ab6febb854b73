//! Canonical entity graph for one analyzed data model
//!
//! Both input formats (TMDL-like text and TMSL-like JSON) normalize into
//! these types, so rules never branch on where a model came from. A
//! [`Model`] is built once per analysis and never mutated afterwards.

pub mod query;

pub use query::{Query, Step, StepKind};

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Root entity: all tables, relationships, roles and shared expressions
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Model {
    pub name: String,
    pub culture: String,
    pub default_mode: String,
    pub tables: Vec<Table>,
    pub relationships: Vec<Relationship>,
    pub roles: Vec<Role>,
    pub expressions: Vec<SharedExpression>,
}

impl Model {
    /// Look up a table by exact name
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Every measure across every table, in table order
    pub fn all_measures(&self) -> impl Iterator<Item = (&Table, &Measure)> + '_ {
        self.tables
            .iter()
            .flat_map(|t| t.measures.iter().map(move |m| (t, m)))
    }

    /// Every calculated column across every table, in table order
    pub fn all_calculated_columns(&self) -> impl Iterator<Item = (&Table, &Column)> + '_ {
        self.tables
            .iter()
            .flat_map(|t| t.calculated_columns().map(move |c| (t, c)))
    }

    /// Every column across every table
    pub fn all_columns(&self) -> impl Iterator<Item = (&Table, &Column)> + '_ {
        self.tables
            .iter()
            .flat_map(|t| t.columns.iter().map(move |c| (t, c)))
    }

    /// Partition queries in table order, followed by shared expressions
    pub fn queries(&self) -> Vec<&Query> {
        let partitions = self
            .tables
            .iter()
            .flat_map(|t| t.partitions.iter())
            .filter_map(|p| p.query.as_ref());
        let shared = self.expressions.iter().filter_map(|e| e.query.as_ref());
        partitions.chain(shared).collect()
    }

    /// Resolve a `(table, column)` pair. Returns `None` when either side is
    /// missing from the model.
    pub fn resolve_column(&self, table: &str, column: &str) -> Option<(&Table, &Column)> {
        let t = self.table(table)?;
        let c = t.column(column)?;
        Some((t, c))
    }

    /// Resolve both endpoints of a relationship
    pub fn resolve(&self, rel: &Relationship) -> Option<(&Column, &Column)> {
        let (_, from) = self.resolve_column(&rel.from_table, &rel.from_column)?;
        let (_, to) = self.resolve_column(&rel.to_table, &rel.to_column)?;
        Some((from, to))
    }

    /// Object counts for the structural report
    pub fn statistics(&self) -> BTreeMap<String, usize> {
        let mut stats = BTreeMap::new();
        stats.insert("tables".to_string(), self.tables.len());
        stats.insert("relationships".to_string(), self.relationships.len());
        stats.insert("measures".to_string(), self.all_measures().count());
        stats.insert(
            "calculated_columns".to_string(),
            self.all_calculated_columns().count(),
        );
        stats.insert(
            "hierarchies".to_string(),
            self.tables.iter().map(|t| t.hierarchies.len()).sum(),
        );
        stats.insert("roles".to_string(), self.roles.len());
        stats
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub name: String,
    pub description: String,
    pub is_hidden: bool,
    pub data_category: Option<String>,
    pub columns: Vec<Column>,
    pub measures: Vec<Measure>,
    pub partitions: Vec<Partition>,
    pub hierarchies: Vec<Hierarchy>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn calculated_columns(&self) -> impl Iterator<Item = &Column> + '_ {
        self.columns.iter().filter(|c| c.is_calculated())
    }

    pub fn visible_columns(&self) -> impl Iterator<Item = &Column> + '_ {
        self.columns.iter().filter(|c| !c.is_hidden)
    }

    /// Marked as a date table through its data category
    pub fn is_marked_date_table(&self) -> bool {
        self.data_category
            .as_deref()
            .is_some_and(|c| c.eq_ignore_ascii_case("time"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub data_type: String,
    pub is_hidden: bool,
    pub is_key: bool,
    pub data_category: Option<String>,
    pub summarize_by: Option<String>,
    pub description: String,
    /// Present only for calculated columns
    pub expression: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            ..Default::default()
        }
    }

    pub fn is_calculated(&self) -> bool {
        self.expression.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Measure {
    pub name: String,
    pub expression: String,
    pub format_string: Option<String>,
    pub display_folder: Option<String>,
    pub description: String,
}

impl Measure {
    pub fn new(name: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expression: expression.into(),
            ..Default::default()
        }
    }

    /// Carries a `//` or `/*` comment in its expression
    pub fn has_comment(&self) -> bool {
        self.expression.contains("//") || self.expression.contains("/*")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum LoadMode {
    #[default]
    Import,
    DirectQuery,
    Dual,
}

impl LoadMode {
    pub fn parse(s: &str) -> Self {
        let lower = s.trim().to_lowercase();
        if lower.contains("directquery") {
            LoadMode::DirectQuery
        } else if lower == "dual" {
            LoadMode::Dual
        } else {
            LoadMode::Import
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Partition {
    pub name: String,
    /// Source kind from the header (`m`, `calculated`, `entity`)
    pub kind: String,
    pub mode: LoadMode,
    pub source: String,
    pub query: Option<Query>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Hierarchy {
    pub name: String,
    pub levels: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Cardinality {
    #[serde(rename = "one-to-one")]
    OneToOne,
    #[serde(rename = "one-to-many")]
    OneToMany,
    #[default]
    #[serde(rename = "many-to-one")]
    ManyToOne,
    #[serde(rename = "many-to-many")]
    ManyToMany,
}

impl Cardinality {
    /// Build from the two endpoint cardinalities (`many` / `one`)
    pub fn from_sides(from: &str, to: &str) -> Self {
        let many = |s: &str| s.trim().eq_ignore_ascii_case("many");
        match (many(from), many(to)) {
            (true, true) => Cardinality::ManyToMany,
            (true, false) => Cardinality::ManyToOne,
            (false, true) => Cardinality::OneToMany,
            (false, false) => Cardinality::OneToOne,
        }
    }

    /// Map vendor spellings (`oneToMany`, `many-to-many`, ...) onto the
    /// shared vocabulary. Anything unrecognized is many-to-one.
    pub fn parse(s: &str) -> Self {
        let squashed: String = s
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .collect::<String>()
            .to_lowercase();
        match squashed.as_str() {
            "onetoone" => Cardinality::OneToOne,
            "onetomany" => Cardinality::OneToMany,
            "manytomany" => Cardinality::ManyToMany,
            _ => Cardinality::ManyToOne,
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Cardinality::OneToOne => "one-to-one",
            Cardinality::OneToMany => "one-to-many",
            Cardinality::ManyToOne => "many-to-one",
            Cardinality::ManyToMany => "many-to-many",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum CrossFilter {
    #[default]
    Single,
    Both,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Relationship {
    pub name: String,
    pub from_table: String,
    pub from_column: String,
    pub to_table: String,
    pub to_column: String,
    pub cardinality: Cardinality,
    pub cross_filter: CrossFilter,
    pub is_active: bool,
}

impl Relationship {
    pub fn new(from: (&str, &str), to: (&str, &str)) -> Self {
        Self {
            name: String::new(),
            from_table: from.0.to_string(),
            from_column: from.1.to_string(),
            to_table: to.0.to_string(),
            to_column: to.1.to_string(),
            cardinality: Cardinality::default(),
            cross_filter: CrossFilter::default(),
            is_active: true,
        }
    }

    pub fn is_bidirectional(&self) -> bool {
        self.cross_filter == CrossFilter::Both
    }

    pub fn is_many_to_many(&self) -> bool {
        self.cardinality == Cardinality::ManyToMany
    }

    /// `Table[Column]` form of the from endpoint
    pub fn from_ref(&self) -> String {
        format!("{}[{}]", self.from_table, self.from_column)
    }

    pub fn to_ref(&self) -> String {
        format!("{}[{}]", self.to_table, self.to_column)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Role {
    pub name: String,
    pub model_permission: String,
    pub table_permissions: Vec<TablePermission>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TablePermission {
    pub table: String,
    pub filter: String,
}

/// A named query shared at model level (`expression X = ...`)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SharedExpression {
    pub name: String,
    pub expression: String,
    pub query: Option<Query>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Model {
        let mut sales = Table::new("Sales");
        sales.columns.push(Column::new("ProductKey", "int64"));
        let mut margin = Column::new("Margin", "decimal");
        margin.expression = Some("[Amount] - [Cost]".into());
        sales.columns.push(margin);
        sales.measures.push(Measure::new("Total", "SUM(Sales[Amount])"));

        let mut product = Table::new("Product");
        product.columns.push(Column::new("ProductKey", "int64"));

        Model {
            tables: vec![sales, product],
            relationships: vec![
                Relationship::new(("Sales", "ProductKey"), ("Product", "ProductKey")),
                Relationship::new(("Sales", "StoreKey"), ("Store", "StoreKey")),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_derived_collections() {
        let model = sample();
        assert_eq!(model.all_measures().count(), 1);
        let calc: Vec<_> = model
            .all_calculated_columns()
            .map(|(t, c)| (t.name.as_str(), c.name.as_str()))
            .collect();
        assert_eq!(calc, vec![("Sales", "Margin")]);
    }

    #[test]
    fn test_unresolvable_relationship_is_none() {
        let model = sample();
        assert!(model.resolve(&model.relationships[0]).is_some());
        assert!(model.resolve(&model.relationships[1]).is_none());
    }

    #[test]
    fn test_cardinality_vocabulary() {
        assert_eq!(Cardinality::parse("oneToMany"), Cardinality::OneToMany);
        assert_eq!(Cardinality::parse("many-to-many"), Cardinality::ManyToMany);
        assert_eq!(Cardinality::parse("whatever"), Cardinality::ManyToOne);
        assert_eq!(
            Cardinality::from_sides("many", "one"),
            Cardinality::ManyToOne
        );
        assert_eq!(Cardinality::OneToMany.to_string(), "one-to-many");
    }

    #[test]
    fn test_statistics() {
        let stats = sample().statistics();
        assert_eq!(stats["tables"], 2);
        assert_eq!(stats["relationships"], 2);
        assert_eq!(stats["calculated_columns"], 1);
    }
}
