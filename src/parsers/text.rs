//! TMDL-like textual block format
//!
//! Parsing is line and keyword anchored. Each header line opens a block
//! that runs until the next header of the same or a higher level at the
//! same or a lower indentation. Nested blocks (columns, measures, ...)
//! are extracted the same way from the parent's captured lines. Missing
//! fields fall back to defaults instead of failing.

use super::{clean_expression, mquery, NormalizeError};
use crate::graph::{
    Cardinality, Column, CrossFilter, Hierarchy, LoadMode, Measure, Model, Partition,
    Relationship, Role, SharedExpression, Table, TablePermission,
};
use tracing::debug;

/// Bare-word flags that may follow an expression
const FLAGS: &[&str] = &["isHidden", "isKey", "isNameInferred", "isAvailableInMdx"];

#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    indent: usize,
    text: &'a str,
}

impl<'a> Line<'a> {
    fn is_description(&self) -> bool {
        self.text.starts_with("///")
    }

    fn is_separator(&self) -> bool {
        self.text.chars().count() >= 10 && self.text.chars().all(|c| c == '─' || c == '=')
    }

    /// `key: value` with a single-word key
    fn property(&self) -> Option<(&'a str, &'a str)> {
        let (key, value) = self.text.split_once(':')?;
        let is_key = !key.is_empty() && key.chars().all(|c| c.is_alphanumeric() || c == '_');
        is_key.then(|| (key, value.trim()))
    }

    fn is_flag(&self) -> bool {
        FLAGS.contains(&self.text)
    }

    /// Ends a multi-line expression
    fn ends_expression(&self) -> bool {
        self.property().is_some()
            || self.is_flag()
            || self.is_description()
            || self.text.starts_with("annotation ")
            || self.text.starts_with("changedProperty")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keyword {
    Model,
    Table,
    Relationship,
    Role,
    Expression,
    Column,
    Measure,
    Partition,
    Hierarchy,
    Level,
}

impl Keyword {
    const ALL: [(&'static str, Keyword); 10] = [
        ("model", Keyword::Model),
        ("table", Keyword::Table),
        ("relationship", Keyword::Relationship),
        ("role", Keyword::Role),
        ("expression", Keyword::Expression),
        ("column", Keyword::Column),
        ("measure", Keyword::Measure),
        ("partition", Keyword::Partition),
        ("hierarchy", Keyword::Hierarchy),
        ("level", Keyword::Level),
    ];

    fn rank(self) -> u8 {
        match self {
            Keyword::Model
            | Keyword::Table
            | Keyword::Relationship
            | Keyword::Role
            | Keyword::Expression => 0,
            Keyword::Column | Keyword::Measure | Keyword::Partition | Keyword::Hierarchy => 1,
            Keyword::Level => 2,
        }
    }

    /// Recognize `keyword<whitespace>rest`
    fn header(text: &str) -> Option<(Keyword, &str)> {
        Self::ALL.iter().find_map(|(word, kw)| {
            let rest = text.strip_prefix(word)?;
            rest.starts_with(char::is_whitespace)
                .then(|| (*kw, rest.trim()))
        })
    }
}

#[derive(Debug, Clone)]
struct Block<'a> {
    keyword: Keyword,
    /// Header text after the keyword
    header: &'a str,
    description: String,
    body: Vec<Line<'a>>,
}

impl<'a> Block<'a> {
    fn children(&self) -> Vec<Block<'a>> {
        scan(&self.body).0
    }

    /// Body lines that belong to this block and not to a child
    fn own_lines(&self) -> Vec<Line<'a>> {
        scan(&self.body).1
    }

    fn name_and_expr(&self) -> (String, Option<String>) {
        split_header(self.header)
    }

    /// Block description, `///` lines first, then a `description:` property
    fn description(&self, own: &[Line<'_>]) -> String {
        if !self.description.is_empty() {
            return self.description.clone();
        }
        property(own, "description").unwrap_or_default()
    }
}

fn lines(text: &str) -> Vec<Line<'_>> {
    text.lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| {
            let indent = l
                .chars()
                .take_while(|c| c.is_whitespace())
                .map(|c| if c == '\t' { 4 } else { 1 })
                .sum();
            Line {
                indent,
                text: l.trim(),
            }
        })
        .collect()
}

/// Split `lines` into blocks plus the lines outside any block.
fn scan<'a>(lines: &[Line<'a>]) -> (Vec<Block<'a>>, Vec<Line<'a>>) {
    let mut blocks = Vec::new();
    let mut loose = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let Some((keyword, header)) = Keyword::header(lines[i].text) else {
            loose.push(lines[i]);
            i += 1;
            continue;
        };
        let indent = lines[i].indent;

        let mut end = i + 1;
        while end < lines.len() {
            let line = &lines[end];
            if line.is_separator() {
                break;
            }
            if let Some((next, _)) = Keyword::header(line.text) {
                if next.rank() <= keyword.rank() && line.indent <= indent {
                    break;
                }
            }
            end += 1;
        }

        // Trailing `///` lines describe whatever comes next
        let mut body_end = end;
        while body_end > i + 1 && lines[body_end - 1].is_description() {
            body_end -= 1;
        }

        let description = leading_description(&loose);
        blocks.push(Block {
            keyword,
            header,
            description,
            body: lines[i + 1..body_end].to_vec(),
        });
        // Description lines consumed by this header
        while loose.last().is_some_and(|l| l.is_description()) {
            loose.pop();
        }
        i = body_end.max(i + 1);
    }

    (blocks, loose)
}

/// Contiguous `///` lines at the end of `lines`
fn leading_description(lines: &[Line<'_>]) -> String {
    let start = lines
        .iter()
        .rposition(|l| !l.is_description())
        .map_or(0, |p| p + 1);
    lines[start..]
        .iter()
        .map(|l| l.text.trim_start_matches('/').trim())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse `Name`, `'Quoted Name'` or either followed by `= expression`
fn split_header(header: &str) -> (String, Option<String>) {
    let header = header.trim();
    let (name, rest) = if let Some(stripped) = header.strip_prefix('\'') {
        let (name, consumed) = read_quoted(stripped, '\'');
        (name, &stripped[consumed..])
    } else {
        match header.find('=') {
            Some(eq) => (header[..eq].trim().to_string(), &header[eq..]),
            None => (header.to_string(), ""),
        }
    };
    let expr = rest
        .trim()
        .strip_prefix('=')
        .map(|e| e.trim().to_string());
    (name, expr)
}

/// Read up to the closing `quote` (doubled quote escapes). Returns the
/// value and the byte count consumed including the closing quote.
fn read_quoted(text: &str, quote: char) -> (String, usize) {
    let mut value = String::new();
    let mut chars = text.char_indices().peekable();
    while let Some((i, ch)) = chars.next() {
        if ch == quote {
            if let Some((_, next)) = chars.peek() {
                if *next == quote {
                    value.push(quote);
                    chars.next();
                    continue;
                }
            }
            return (value, i + ch.len_utf8());
        }
        value.push(ch);
    }
    (value, text.len())
}

fn unquote(value: &str) -> String {
    let v = value.trim();
    if v.len() >= 2 && v.starts_with('"') && v.ends_with('"') {
        v[1..v.len() - 1].replace("\"\"", "\"")
    } else {
        v.to_string()
    }
}

fn property(own: &[Line<'_>], key: &str) -> Option<String> {
    own.iter().find_map(|l| match l.property() {
        Some((k, v)) if k == key => Some(unquote(v)),
        _ => None,
    })
}

fn flag(own: &[Line<'_>], name: &str) -> bool {
    own.iter().any(|l| l.text == name)
        || property(own, name).is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

/// Header expression plus continuation lines up to the first property
fn multiline_expression(first: Option<String>, own: &[Line<'_>]) -> Option<String> {
    let continuation: Vec<&str> = own
        .iter()
        .take_while(|l| !l.ends_expression())
        .map(|l| l.text)
        .collect();
    let mut parts: Vec<String> = Vec::new();
    if let Some(first) = first.filter(|f| !f.is_empty()) {
        parts.push(first);
    }
    parts.extend(continuation.iter().map(|s| s.to_string()));
    if parts.is_empty() {
        None
    } else {
        Some(clean_expression(&parts.join("\n")))
    }
}

/// Normalize textual block input
pub fn parse(text: &str) -> Result<Model, NormalizeError> {
    let all = lines(text);
    if !all.iter().any(|l| Keyword::header(l.text).is_some()) {
        return Err(NormalizeError::NoModelObjects);
    }

    let mut model = Model::default();
    let mut top = Vec::new();
    collect_top(&all, &mut top);

    for block in &top {
        match block.keyword {
            Keyword::Model => parse_model_props(block, &mut model),
            Keyword::Table => model.tables.push(parse_table(block)),
            Keyword::Relationship => {
                if let Some(rel) = parse_relationship(block) {
                    model.relationships.push(rel);
                }
            }
            Keyword::Role => model.roles.push(parse_role(block)),
            Keyword::Expression => model.expressions.push(parse_expression(block)),
            _ => {}
        }
    }

    debug!(
        "Text normalizer: {} tables, {} relationships, {} roles, {} expressions",
        model.tables.len(),
        model.relationships.len(),
        model.roles.len(),
        model.expressions.len()
    );
    Ok(model)
}

/// Top-level blocks, looking inside `model` blocks for nested ones
fn collect_top<'a>(lines: &[Line<'a>], out: &mut Vec<Block<'a>>) {
    for block in scan(lines).0 {
        if block.keyword.rank() != 0 {
            continue;
        }
        if block.keyword == Keyword::Model {
            collect_top(&block.body, out);
        }
        out.push(block);
    }
}

fn parse_model_props(block: &Block<'_>, model: &mut Model) {
    let own = block.own_lines();
    let (name, _) = block.name_and_expr();
    model.name = name;
    model.culture = property(&own, "culture").unwrap_or_default();
    model.default_mode = property(&own, "defaultMode").unwrap_or_default();
}

fn parse_table(block: &Block<'_>) -> Table {
    let own = block.own_lines();
    let (name, _) = block.name_and_expr();
    let mut table = Table::new(name);
    table.description = block.description(&own);
    table.is_hidden = flag(&own, "isHidden");
    table.data_category = property(&own, "dataCategory");

    for child in block.children() {
        match child.keyword {
            Keyword::Column => table.columns.push(parse_column(&child)),
            Keyword::Measure => table.measures.push(parse_measure(&child)),
            Keyword::Partition => table.partitions.push(parse_partition(&child, &table.name)),
            Keyword::Hierarchy => table.hierarchies.push(parse_hierarchy(&child)),
            _ => {}
        }
    }
    table
}

fn parse_column(block: &Block<'_>) -> Column {
    let own = block.own_lines();
    let (name, header_expr) = block.name_and_expr();
    let expression = match header_expr {
        Some(first) => multiline_expression(Some(first), &own),
        None => property(&own, "expression").map(|e| clean_expression(&e)),
    };
    Column {
        name,
        data_type: property(&own, "dataType").unwrap_or_default(),
        is_hidden: flag(&own, "isHidden"),
        is_key: flag(&own, "isKey"),
        data_category: property(&own, "dataCategory"),
        summarize_by: property(&own, "summarizeBy"),
        description: block.description(&own),
        expression,
    }
}

fn parse_measure(block: &Block<'_>) -> Measure {
    let own = block.own_lines();
    let (name, header_expr) = block.name_and_expr();
    Measure {
        name,
        expression: multiline_expression(header_expr, &own).unwrap_or_default(),
        format_string: property(&own, "formatString"),
        display_folder: property(&own, "displayFolder"),
        description: block.description(&own),
    }
}

fn parse_partition(block: &Block<'_>, table: &str) -> Partition {
    let own = block.own_lines();
    let (name, kind) = block.name_and_expr();
    let mode = property(&own, "mode")
        .map(|m| LoadMode::parse(&m))
        .unwrap_or_default();

    let source = partition_source(&own);
    let query = if source.trim_start().starts_with("let") {
        mquery::parse_query(&format!("{}.{}", table, name), &source)
    } else {
        None
    };

    Partition {
        name,
        kind: kind.unwrap_or_default(),
        mode,
        source,
        query,
    }
}

/// `source = <text>` plus every deeper-indented line after it
fn partition_source(own: &[Line<'_>]) -> String {
    let Some(pos) = own.iter().position(|l| {
        l.text
            .strip_prefix("source")
            .is_some_and(|r| r.trim_start().starts_with('='))
    }) else {
        return String::new();
    };
    let head = &own[pos];
    let mut parts = Vec::new();
    if let Some((_, inline)) = head.text.split_once('=') {
        if !inline.trim().is_empty() {
            parts.push(inline.trim());
        }
    }
    parts.extend(
        own[pos + 1..]
            .iter()
            .take_while(|l| l.indent > head.indent)
            .map(|l| l.text),
    );
    clean_expression(&parts.join("\n"))
}

fn parse_hierarchy(block: &Block<'_>) -> Hierarchy {
    let (name, _) = block.name_and_expr();
    let levels = block
        .children()
        .iter()
        .filter(|c| c.keyword == Keyword::Level)
        .map(|c| c.name_and_expr().0)
        .collect();
    Hierarchy { name, levels }
}

fn parse_relationship(block: &Block<'_>) -> Option<Relationship> {
    let own = block.own_lines();
    let (name, _) = block.name_and_expr();

    let from = property(&own, "fromColumn")
        .and_then(|v| split_dotted(&v))
        .or_else(|| bracket_endpoint(&own, "from"));
    let to = property(&own, "toColumn")
        .and_then(|v| split_dotted(&v))
        .or_else(|| bracket_endpoint(&own, "to"));

    let (Some(from), Some(to)) = (from, to) else {
        debug!("Dropping relationship {}: missing endpoint", name);
        return None;
    };

    let from_card = property(&own, "fromCardinality");
    let to_card = property(&own, "toCardinality");
    let cardinality = if from_card.is_some() || to_card.is_some() {
        Cardinality::from_sides(
            from_card.as_deref().unwrap_or("many"),
            to_card.as_deref().unwrap_or("one"),
        )
    } else {
        literal_cardinality(&block.body).unwrap_or_default()
    };

    let cross_filter = match property(&own, "crossFilteringBehavior") {
        Some(v) if v.to_lowercase().contains("both") => CrossFilter::Both,
        _ => CrossFilter::Single,
    };
    let is_active = !property(&own, "isActive").is_some_and(|v| v.eq_ignore_ascii_case("false"));

    Some(Relationship {
        name,
        from_table: from.0,
        from_column: from.1,
        to_table: to.0,
        to_column: to.1,
        cardinality,
        cross_filter,
        is_active,
    })
}

fn literal_cardinality(body: &[Line<'_>]) -> Option<Cardinality> {
    let text = body
        .iter()
        .map(|l| l.text.to_lowercase())
        .collect::<Vec<_>>()
        .join("\n");
    [
        ("many-to-many", Cardinality::ManyToMany),
        ("one-to-many", Cardinality::OneToMany),
        ("one-to-one", Cardinality::OneToOne),
        ("many-to-one", Cardinality::ManyToOne),
    ]
    .into_iter()
    .find(|(literal, _)| text.contains(literal))
    .map(|(_, c)| c)
}

/// `Table.Column`, either side optionally single-quoted
fn split_dotted(value: &str) -> Option<(String, String)> {
    let value = value.trim();
    let (table, rest) = if let Some(stripped) = value.strip_prefix('\'') {
        let (name, consumed) = read_quoted(stripped, '\'');
        (name, &stripped[consumed..])
    } else {
        let dot = value.find('.')?;
        (value[..dot].to_string(), &value[dot..])
    };
    let rest = rest.strip_prefix('.')?.trim();
    let column = match rest.strip_prefix('\'') {
        Some(stripped) => read_quoted(stripped, '\'').0,
        None => rest.to_string(),
    };
    (!table.is_empty() && !column.is_empty()).then_some((table, column))
}

/// `from Table[Column]` / `to 'Table'[Column]`
fn bracket_endpoint(own: &[Line<'_>], word: &str) -> Option<(String, String)> {
    own.iter().find_map(|l| {
        let rest = l.text.strip_prefix(word)?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let rest = rest.trim();
        let open = rest.find('[')?;
        let close = rest[open..].find(']')? + open;
        let table = rest[..open].trim().trim_matches('\'').to_string();
        let column = rest[open + 1..close].trim().to_string();
        (!table.is_empty() && !column.is_empty()).then_some((table, column))
    })
}

fn parse_role(block: &Block<'_>) -> Role {
    let own = block.own_lines();
    let (name, _) = block.name_and_expr();
    let table_permissions = own
        .iter()
        .filter_map(|l| {
            let rest = l.text.strip_prefix("tablePermission")?;
            if !rest.starts_with(char::is_whitespace) {
                return None;
            }
            let (table, filter) = split_header(rest);
            Some(TablePermission {
                table,
                filter: filter.unwrap_or_default(),
            })
        })
        .collect();
    Role {
        name,
        model_permission: property(&own, "modelPermission").unwrap_or_default(),
        table_permissions,
    }
}

fn parse_expression(block: &Block<'_>) -> SharedExpression {
    let own = block.own_lines();
    let (name, header_expr) = block.name_and_expr();
    let expression = multiline_expression(header_expr, &own).unwrap_or_default();
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

    const TMDL: &str = r#"
model Model
    culture: en-US

/// Sales transactions
table Sales
    column Amount
        dataType: decimal
        formatString: 0.00
    column ProductKey
        dataType: int64
        isHidden
    column Margin = [Amount] * 0.1
        dataType: decimal

    /// Revenue
    measure 'Total Sales' =
            SUM(Sales[Amount])
        formatString: #,0
        displayFolder: KPIs

    measure Count = COUNTROWS(Sales)

    partition Sales = m
        mode: import
        source =
            let
                Source = Sql.Database("srv", "db"),
                Data = Source{[Schema="dbo",Item="Sales"]}[Data]
            in
                Data

table Product
    column ProductKey
        dataType: int64
        isKey
    hierarchy Categories
        level Category
        level Subcategory

relationship r1
    fromColumn: Sales.ProductKey
    toColumn: Product.ProductKey
    crossFilteringBehavior: bothDirections

relationship r2
    fromColumn: Sales.StoreKey

role Readers
    modelPermission: read
    tablePermission Sales = [Amount] > 0
"#;

    #[test]
    fn test_parses_tables_and_children() {
        let model = parse(TMDL).unwrap();
        assert_eq!(model.culture, "en-US");
        assert_eq!(model.tables.len(), 2);

        let sales = &model.tables[0];
        assert_eq!(sales.description, "Sales transactions");
        assert_eq!(sales.columns.len(), 3);
        assert!(sales.columns[1].is_hidden);
        assert_eq!(
            sales.columns[2].expression.as_deref(),
            Some("[Amount] * 0.1")
        );

        let total = &sales.measures[0];
        assert_eq!(total.name, "Total Sales");
        assert_eq!(total.expression, "SUM(Sales[Amount])");
        assert_eq!(total.format_string.as_deref(), Some("#,0"));
        assert_eq!(total.display_folder.as_deref(), Some("KPIs"));
        assert_eq!(total.description, "Revenue");
        assert_eq!(sales.measures[1].expression, "COUNTROWS(Sales)");
    }

    #[test]
    fn test_partition_query_is_split() {
        let model = parse(TMDL).unwrap();
        let partition = &model.tables[0].partitions[0];
        assert_eq!(partition.mode, LoadMode::Import);
        let query = partition.query.as_ref().unwrap();
        assert_eq!(query.name, "Sales.Sales");
        assert_eq!(query.steps.len(), 2);
        assert_eq!(query.result, "Data");
    }

    #[test]
    fn test_relationships_and_roles() {
        let model = parse(TMDL).unwrap();
        // r2 has no toColumn and is dropped
        assert_eq!(model.relationships.len(), 1);
        let rel = &model.relationships[0];
        assert_eq!(rel.from_ref(), "Sales[ProductKey]");
        assert_eq!(rel.cross_filter, CrossFilter::Both);
        assert_eq!(rel.cardinality, Cardinality::ManyToOne);

        assert_eq!(model.roles[0].table_permissions[0].table, "Sales");
        assert_eq!(model.roles[0].table_permissions[0].filter, "[Amount] > 0");
        assert_eq!(
            model.tables[1].hierarchies[0].levels,
            vec!["Category", "Subcategory"]
        );
    }

    #[test]
    fn test_bracket_endpoints_and_literal_cardinality() {
        let text = "relationship Sales_Date\n    from Sales[DateKey]\n    to 'Date'[DateKey]\n    many-to-many\n    isActive: false\n";
        let model = parse(text).unwrap();
        let rel = &model.relationships[0];
        assert_eq!(rel.to_table, "Date");
        assert_eq!(rel.cardinality, Cardinality::ManyToMany);
        assert!(!rel.is_active);
    }

    #[test]
    fn test_separator_ends_block() {
        let text = "table A\n    column X\n──────────\ncolumn Y\n";
        let model = parse(text).unwrap();
        assert_eq!(model.tables[0].columns.len(), 1);
    }

    #[test]
    fn test_no_headers_is_malformed() {
        assert!(matches!(
            parse("just some words\nand more"),
            Err(NormalizeError::NoModelObjects)
        ));
    }

    #[test]
    fn test_quoted_dotted_endpoint() {
        assert_eq!(
            split_dotted("'Sales Data'.'Product Key'"),
            Some(("Sales Data".into(), "Product Key".into()))
        );
        assert_eq!(split_dotted("NoDot"), None);
    }
}
