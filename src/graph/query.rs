//! Power Query (M) queries as ordered step sequences

use serde::Serialize;
use std::fmt;

/// Operations known to stop pushdown to the source system
pub const FOLDING_BREAKERS: &[&str] = &[
    "Table.AddColumn",
    "Table.AddIndexColumn",
    "Table.AlternateRows",
    "Table.Combine",
    "Table.FillDown",
    "Table.FillUp",
    "Table.Range",
    "Table.Repeat",
    "Table.ReplaceMatchingRows",
    "Table.ReverseRows",
    "Table.Split",
    "Table.Transpose",
    "List.",
    "Text.",
    "Date.",
];

/// Connectors whose queries can fold
pub const FOLDABLE_SOURCES: &[&str] = &["Sql.Database", "OData.Feed", "SharePoint."];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Query {
    pub name: String,
    /// Full source text, `let ... in ...`
    pub source: String,
    pub steps: Vec<Step>,
    /// Name bound after `in`
    pub result: String,
}

impl Query {
    /// Source connector of the first step when it can fold
    pub fn foldable_source(&self) -> Option<&'static str> {
        let first = self.steps.first()?;
        FOLDABLE_SOURCES
            .iter()
            .copied()
            .find(|s| first.expression.contains(s))
    }

    /// First step that breaks folding, if the query is foldable at all
    pub fn folding_break(&self) -> Option<&Step> {
        self.foldable_source()?;
        self.steps.iter().find(|s| s.breaks_folding())
    }

    pub fn has_comments(&self) -> bool {
        self.source.contains("//") || self.source.contains("/*")
    }

    /// Number of steps whose expression contains `needle`
    pub fn count_steps(&self, needle: &str) -> usize {
        self.steps
            .iter()
            .filter(|s| s.expression.contains(needle))
            .count()
    }

    pub fn any_step(&self, needle: &str) -> bool {
        self.steps.iter().any(|s| s.expression.contains(needle))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Step {
    /// 1-based position in the `let` block
    pub index: usize,
    pub name: String,
    pub expression: String,
    pub kind: StepKind,
}

impl Step {
    pub fn new(index: usize, name: impl Into<String>, expression: impl Into<String>) -> Self {
        let expression = expression.into();
        Self {
            index,
            name: name.into(),
            kind: StepKind::classify(&expression),
            expression,
        }
    }

    pub fn breaks_folding(&self) -> bool {
        FOLDING_BREAKERS.iter().any(|b| self.expression.contains(b))
    }

    pub fn is_row_filter(&self) -> bool {
        self.expression.contains("SelectRows")
    }

    /// Expression cut to 100 characters for report snippets
    pub fn snippet(&self) -> String {
        if self.expression.chars().count() > 100 {
            let head: String = self.expression.chars().take(100).collect();
            format!("{head}...")
        } else {
            self.expression.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StepKind {
    SqlSource,
    ExcelSource,
    CsvSource,
    WebSource,
    ODataSource,
    SharePointSource,
    Filter,
    ColumnSelection,
    TypeChange,
    AddColumn,
    Join,
    GroupBy,
    Sort,
    Rename,
    Transformation,
}

impl StepKind {
    /// Sources match on the expression prefix, the rest on contained text.
    pub fn classify(expression: &str) -> Self {
        let expr = expression.trim_start();
        let prefixed = [
            ("Sql.Database", StepKind::SqlSource),
            ("Excel.Workbook", StepKind::ExcelSource),
            ("Csv.Document", StepKind::CsvSource),
            ("Web.Contents", StepKind::WebSource),
            ("OData.Feed", StepKind::ODataSource),
            ("SharePoint.", StepKind::SharePointSource),
        ];
        if let Some((_, kind)) = prefixed.iter().find(|(p, _)| expr.starts_with(p)) {
            return *kind;
        }

        let contained: [(&[&str], StepKind); 8] = [
            (&["Table.SelectRows"], StepKind::Filter),
            (&["Table.SelectColumns"], StepKind::ColumnSelection),
            (&["Table.TransformColumnTypes"], StepKind::TypeChange),
            (&["Table.AddColumn"], StepKind::AddColumn),
            (&["Table.Join", "Table.NestedJoin"], StepKind::Join),
            (&["Table.Group"], StepKind::GroupBy),
            (&["Table.Sort"], StepKind::Sort),
            (&["Table.RenameColumns"], StepKind::Rename),
        ];
        contained
            .iter()
            .find(|(needles, _)| needles.iter().any(|n| expr.contains(n)))
            .map(|(_, kind)| *kind)
            .unwrap_or(StepKind::Transformation)
    }

    pub fn label(self) -> &'static str {
        match self {
            StepKind::SqlSource => "SQL Source",
            StepKind::ExcelSource => "Excel Source",
            StepKind::CsvSource => "CSV Source",
            StepKind::WebSource => "Web Source",
            StepKind::ODataSource => "OData Source",
            StepKind::SharePointSource => "SharePoint Source",
            StepKind::Filter => "Filter",
            StepKind::ColumnSelection => "Column Selection",
            StepKind::TypeChange => "Type Change",
            StepKind::AddColumn => "Add Column",
            StepKind::Join => "Join",
            StepKind::GroupBy => "Group By",
            StepKind::Sort => "Sort",
            StepKind::Rename => "Rename",
            StepKind::Transformation => "Transformation",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(exprs: &[&str]) -> Query {
        Query {
            name: "Q".into(),
            steps: exprs
                .iter()
                .enumerate()
                .map(|(i, e)| Step::new(i + 1, format!("S{}", i + 1), *e))
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_classify_step_kinds() {
        assert_eq!(StepKind::classify("Sql.Database(\"srv\", \"db\")"), StepKind::SqlSource);
        assert_eq!(StepKind::classify("Table.SelectRows(x, each [A] > 1)"), StepKind::Filter);
        assert_eq!(
            StepKind::classify("Table.NestedJoin(a, {\"k\"}, b, {\"k\"}, \"b\")"),
            StepKind::Join
        );
        assert_eq!(StepKind::classify("x{0}[Data]"), StepKind::Transformation);
    }

    #[test]
    fn test_classify_needs_qualified_table_functions() {
        assert_eq!(StepKind::classify("Record.Field(x, \"SortOrder\")"), StepKind::Transformation);
        assert_eq!(StepKind::classify("List.Sort({3, 1, 2})"), StepKind::Transformation);
        assert_eq!(
            StepKind::classify("Text.Combine({\"Group\", \"Join\"})"),
            StepKind::Transformation
        );
        assert_eq!(
            StepKind::classify("Table.Sort(x, {{\"Date\", Order.Ascending}})"),
            StepKind::Sort
        );
        assert_eq!(
            StepKind::classify("Table.Group(x, {\"K\"}, {{\"N\", each 1}})"),
            StepKind::GroupBy
        );
        assert_eq!(StepKind::classify("Table.Join(a, \"k\", b, \"k\")"), StepKind::Join);
    }

    #[test]
    fn test_folding_break_only_for_foldable_sources() {
        let sql = query(&["Sql.Database(\"s\", \"d\")", "Table.AddColumn(a, \"x\", each 1)"]);
        assert_eq!(sql.foldable_source(), Some("Sql.Database"));
        assert_eq!(sql.folding_break().map(|s| s.index), Some(2));

        let csv = query(&["Csv.Document(File.Contents(\"a\"))", "Table.AddColumn(a, \"x\", each 1)"]);
        assert!(csv.folding_break().is_none());
    }

    #[test]
    fn test_snippet_truncates() {
        let long = "x".repeat(150);
        let step = Step::new(1, "S", long);
        assert_eq!(step.snippet().len(), 103);
        assert!(step.snippet().ends_with("..."));
        assert_eq!(Step::new(1, "S", "short").snippet(), "short");
    }
}
