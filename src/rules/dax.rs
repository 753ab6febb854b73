//! DAX expression checks
//!
//! Each check looks at the token stream of one measure expression, so
//! text inside comments and string literals never matches. A hit carries
//! a short snippet around the offending tokens.

use super::base::{FnRule, Rule};
use crate::graph::Model;
use crate::models::{Category, Location, Severity, Violation};
use crate::parsers::dax::{self, Token, TokenKind};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;

/// Char offsets of the matched region
type Span = (usize, usize);

type Matcher = fn(&[Token], &[char]) -> Option<Span>;

struct DaxCheck {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    recommendation: &'static str,
    severity: Severity,
    impact: u8,
}

const USE_DIVIDE: DaxCheck = DaxCheck {
    id: "USE_THE_DIVIDE_FUNCTION_FOR_DIVISION",
    title: "Use the DIVIDE function for division",
    description: "Use the DIVIDE function instead of using '/'. DIVIDE handles divide-by-zero cases safely.",
    recommendation: "Replace 'X / Y' with 'DIVIDE(X, Y)' or 'DIVIDE(X, Y, 0)' for safe division.",
    severity: Severity::Medium,
    impact: 3,
};

const AVOID_IFERROR: DaxCheck = DaxCheck {
    id: "AVOID_USING_THE_IFERROR_FUNCTION",
    title: "Avoid using the IFERROR function",
    description: "IFERROR can cause performance degradation. Use DIVIDE for divide-by-zero handling.",
    recommendation: "Replace IFERROR with DIVIDE or proper error handling using IF/ISBLANK.",
    severity: Severity::Medium,
    impact: 3,
};

const FULLY_QUALIFIED: DaxCheck = DaxCheck {
    id: "DAX_COLUMNS_FULLY_QUALIFIED",
    title: "Column references should be fully qualified",
    description: "Column references should include the table name for clarity and to avoid errors.",
    recommendation: "Use 'TableName'[ColumnName] instead of just [ColumnName] for columns.",
    severity: Severity::High,
    impact: 5,
};

const ONE_MINUS: DaxCheck = DaxCheck {
    id: "AVOID_1_MINUS_SYNTAX",
    title: "Avoid using '1-(x/y)' syntax",
    description: "'1-(x/y)' syntax can cause performance issues and may return values when it should be blank.",
    recommendation: "Use DIVIDE and basic arithmetic: DIVIDE(X - Y, X) instead of 1 - (Y/X).",
    severity: Severity::Medium,
    impact: 3,
};

const TREATAS: DaxCheck = DaxCheck {
    id: "USE_TREATAS_INSTEAD_OF_INTERSECT",
    title: "Use TREATAS instead of INTERSECT for virtual relationships",
    description: "TREATAS is more efficient than INTERSECT for virtual relationships.",
    recommendation: "Replace INTERSECT with TREATAS for better performance.",
    severity: Severity::Medium,
    impact: 3,
};

const FILTER_COLUMN_VALUES: DaxCheck = DaxCheck {
    id: "FILTER_COLUMN_VALUES",
    title: "Filter column values with proper syntax",
    description: "Using FILTER('Table', 'Table'[Column] = value) is inefficient.",
    recommendation: "Use 'Table'[Column] = value directly in CALCULATE, or use KEEPFILTERS.",
    severity: Severity::Medium,
    impact: 3,
};

const DIRECT_REFERENCE: DaxCheck = DaxCheck {
    id: "MEASURES_DIRECT_REFERENCE",
    title: "Measure is just a reference to another measure",
    description: "This measure is simply a reference to another measure, which is redundant.",
    recommendation: "Remove duplicate measure or use the original measure directly.",
    severity: Severity::Low,
    impact: 2,
};

const NOW_TODAY: DaxCheck = DaxCheck {
    id: "AVOID_NOW_TODAY",
    title: "Avoid NOW() and TODAY() functions",
    description: "NOW() and TODAY() prevent query caching and can hurt performance.",
    recommendation: "Use a date table with a 'IsToday' flag or pass the date as a parameter.",
    severity: Severity::Low,
    impact: 1,
};

const SELECTEDVALUE: DaxCheck = DaxCheck {
    id: "USE_SELECTEDVALUE",
    title: "Use SELECTEDVALUE instead of IF/HASONEVALUE pattern",
    description: "The HASONEVALUE + VALUES pattern can be simplified with SELECTEDVALUE.",
    recommendation: "Replace IF(HASONEVALUE(...), VALUES(...)) with SELECTEDVALUE(...).",
    severity: Severity::Low,
    impact: 1,
};

const COUNTROWS: DaxCheck = DaxCheck {
    id: "USE_COUNTROWS",
    title: "Consider COUNTROWS instead of COUNT",
    description: "COUNTROWS is generally more efficient and clearer than COUNT.",
    recommendation: "Use COUNTROWS(Table) instead of COUNT(Table[Column]).",
    severity: Severity::Low,
    impact: 1,
};

const VARIABLES: DaxCheck = DaxCheck {
    id: "USE_VARIABLES",
    title: "Consider using variables for repeated expressions",
    description: "Repeated subexpressions could be optimized with VAR statements.",
    recommendation: "Use VAR to store repeated calculations and RETURN the result.",
    severity: Severity::Low,
    impact: 1,
};

macro_rules! dax_rule {
    ($check:ident, $matcher:ident, $summary:literal) => {{
        fn run(model: &Model) -> Vec<Violation> {
            flag_measures(model, &$check, $matcher)
        }
        Arc::new(FnRule::new(
            $check.id,
            $summary,
            Category::Measures,
            $check.severity,
            run,
        )) as Arc<dyn Rule>
    }};
}

pub fn rules() -> Vec<Arc<dyn Rule>> {
    vec![
        dax_rule!(USE_DIVIDE, division_operator, "Bare '/' division"),
        dax_rule!(AVOID_IFERROR, iferror_call, "IFERROR calls"),
        dax_rule!(FULLY_QUALIFIED, unqualified_columns, "Mostly unqualified column references"),
        dax_rule!(ONE_MINUS, one_minus_syntax, "1-(x/y) arithmetic"),
        dax_rule!(TREATAS, intersect_call, "INTERSECT for virtual relationships"),
        dax_rule!(FILTER_COLUMN_VALUES, filter_whole_table, "CALCULATE filtering a whole table"),
        dax_rule!(DIRECT_REFERENCE, direct_measure_reference, "Measures that only alias another measure"),
        dax_rule!(NOW_TODAY, now_or_today, "NOW or TODAY calls"),
        dax_rule!(SELECTEDVALUE, if_hasonevalue, "IF(HASONEVALUE(...)) pattern"),
        dax_rule!(COUNTROWS, count_on_column, "COUNT over a qualified column"),
        dax_rule!(VARIABLES, repeated_without_vars, "Repeated calls without variables"),
    ]
}

fn flag_measures(model: &Model, check: &DaxCheck, matcher: Matcher) -> Vec<Violation> {
    let mut violations = Vec::new();
    for (table, measure) in model.all_measures() {
        let tokens = dax::tokenize(&measure.expression);
        let chars: Vec<char> = measure.expression.chars().collect();
        let Some(span) = matcher(&tokens, &chars) else {
            continue;
        };
        violations.push(
            Violation::new(
                check.id,
                Category::Measures,
                check.severity,
                check.impact,
                check.title,
                Location::measure(&table.name, &measure.name),
            )
            .with_description(check.description)
            .with_recommendation(check.recommendation)
            .with_details(json!({ "snippet": snippet(&chars, span) })),
        );
    }
    violations
}

/// Matched text with up to 30 chars of context on each side
fn snippet(chars: &[char], (start, end): Span) -> String {
    let from = start.saturating_sub(30);
    let to = (end + 30).min(chars.len());
    let mut text: String = chars[from.min(to)..to].iter().collect();
    if from > 0 {
        text.insert_str(0, "...");
    }
    if to < chars.len() {
        text.push_str("...");
    }
    text
}

fn span_of(tokens: &[Token], first: usize, last: usize) -> Span {
    (tokens[first].start, tokens[last].end)
}

fn division_operator(tokens: &[Token], _: &[char]) -> Option<Span> {
    tokens.windows(2).enumerate().find_map(|(i, pair)| {
        let operand = matches!(pair[0].kind, TokenKind::Bracket(_) | TokenKind::RParen);
        (operand && pair[1].is_op("/")).then(|| span_of(tokens, i, i + 1))
    })
}

fn first_call(tokens: &[Token], name: &str) -> Option<Span> {
    dax::calls(tokens, name)
        .next()
        .map(|i| span_of(tokens, i, i + 1))
}

fn iferror_call(tokens: &[Token], _: &[char]) -> Option<Span> {
    first_call(tokens, "IFERROR")
}

fn intersect_call(tokens: &[Token], _: &[char]) -> Option<Span> {
    first_call(tokens, "INTERSECT")
}

fn now_or_today(tokens: &[Token], _: &[char]) -> Option<Span> {
    first_call(tokens, "NOW").or_else(|| first_call(tokens, "TODAY"))
}

fn unqualified_columns(tokens: &[Token], chars: &[char]) -> Option<Span> {
    let (qualified, standalone) = dax::bracket_references(tokens);
    (qualified + standalone > 3 && standalone > qualified).then_some((0, chars.len()))
}

fn one_minus_syntax(tokens: &[Token], _: &[char]) -> Option<Span> {
    tokens.windows(3).enumerate().find_map(|(i, w)| {
        let one = matches!(&w[0].kind, TokenKind::Number(n) if n == "1");
        let sign = w[1].is_op("-") || w[1].is_op("+");
        (one && sign && w[2].kind == TokenKind::LParen).then(|| span_of(tokens, i, i + 2))
    })
}

/// `CALCULATE(<expr>, FILTER('Table', ...))`
fn filter_whole_table(tokens: &[Token], _: &[char]) -> Option<Span> {
    dax::calls(tokens, "CALCULATE").find_map(|i| {
        let args = dax::call_args(tokens, i);
        let filter = args.get(1)?;
        let hit = filter.len() >= 4
            && filter[0].is_ident("FILTER")
            && filter[1].kind == TokenKind::LParen
            && matches!(filter[2].kind, TokenKind::QuotedTable(_))
            && filter[3].kind == TokenKind::Comma;
        hit.then(|| (tokens[i].start, filter[3].end))
    })
}

fn direct_measure_reference(tokens: &[Token], _: &[char]) -> Option<Span> {
    match tokens {
        [only] if matches!(only.kind, TokenKind::Bracket(_)) => Some((only.start, only.end)),
        _ => None,
    }
}

fn if_hasonevalue(tokens: &[Token], _: &[char]) -> Option<Span> {
    tokens.windows(4).enumerate().find_map(|(i, w)| {
        let hit = w[0].is_ident("IF")
            && w[1].kind == TokenKind::LParen
            && w[2].is_ident("HASONEVALUE")
            && w[3].kind == TokenKind::LParen;
        hit.then(|| span_of(tokens, i, i + 3))
    })
}

/// `COUNT('Table'[Column])`
fn count_on_column(tokens: &[Token], _: &[char]) -> Option<Span> {
    tokens.windows(5).enumerate().find_map(|(i, w)| {
        let hit = w[0].is_ident("COUNT")
            && w[1].kind == TokenKind::LParen
            && matches!(w[2].kind, TokenKind::QuotedTable(_))
            && matches!(w[3].kind, TokenKind::Bracket(_))
            && w[4].kind == TokenKind::RParen;
        hit.then(|| span_of(tokens, i, i + 4))
    })
}

/// A leaf call longer than 10 normalized chars that appears twice,
/// in an expression with no VAR
fn repeated_without_vars(tokens: &[Token], chars: &[char]) -> Option<Span> {
    if tokens.iter().any(|t| t.is_ident("VAR")) {
        return None;
    }

    let mut seen = HashSet::new();
    for (name, close) in dax::leaf_calls(tokens) {
        let (start, end) = span_of(tokens, name, close);
        let normalized = dax::normalized_span(chars, start, end);
        if normalized.chars().count() > 10 && !seen.insert(normalized) {
            return Some((start, end));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Measure, Table};

    fn hit(matcher: Matcher, expression: &str) -> bool {
        let chars: Vec<char> = expression.chars().collect();
        matcher(&dax::tokenize(expression), &chars).is_some()
    }

    #[test]
    fn test_division_operator() {
        assert!(hit(division_operator, "SUM(Sales[A]) / SUM(Sales[B])"));
        assert!(hit(division_operator, "[Margin] / [Revenue]"));
        assert!(!hit(division_operator, "DIVIDE([Margin], [Revenue]) // a / b"));
        assert!(!hit(division_operator, "\"a / b\""));
    }

    #[test]
    fn test_unqualified_columns() {
        assert!(hit(unqualified_columns, "[A] + [B] + [C] + [D]"));
        assert!(!hit(unqualified_columns, "'T'[A] + 'T'[B] + 'T'[C] + [D]"));
        assert!(!hit(unqualified_columns, "[A] + [B]"));
    }

    #[test]
    fn test_one_minus_and_filter_syntax() {
        assert!(hit(one_minus_syntax, "1 - ([Cost] / [Sales])"));
        assert!(!hit(one_minus_syntax, "11 - [Cost]"));
        assert!(hit(
            filter_whole_table,
            "CALCULATE([Sales], FILTER('Product', 'Product'[Color] = \"Red\"))"
        ));
        assert!(!hit(
            filter_whole_table,
            "CALCULATE([Sales], 'Product'[Color] = \"Red\")"
        ));
    }

    #[test]
    fn test_direct_reference_and_patterns() {
        assert!(hit(direct_measure_reference, "  [Total Sales] "));
        assert!(!hit(direct_measure_reference, "[Total Sales] * 2"));
        assert!(hit(if_hasonevalue, "IF ( HASONEVALUE(T[C]), VALUES(T[C]) )"));
        assert!(hit(count_on_column, "COUNT('Sales'[OrderId])"));
        assert!(!hit(count_on_column, "COUNTROWS('Sales')"));
        assert!(hit(now_or_today, "TODAY() - 1"));
    }

    #[test]
    fn test_repeated_without_vars() {
        let repeated = "SUM(Sales[Amount]) + SUM( Sales[Amount] )";
        assert!(hit(repeated_without_vars, repeated));
        assert!(!hit(
            repeated_without_vars,
            "VAR x = SUM(Sales[Amount]) RETURN SUM(Sales[Amount]) + x"
        ));
        assert!(!hit(repeated_without_vars, "MAX(T[A]) + MAX(T[A])"));
    }

    #[test]
    fn test_flag_measures_locates_and_snips() {
        let mut sales = Table::new("Sales");
        sales.measures.push(Measure::new("Ratio", "[A] / [B]"));
        sales.measures.push(Measure::new("Safe", "DIVIDE([A], [B])"));
        let model = Model {
            tables: vec![sales],
            ..Default::default()
        };

        let violations = flag_measures(&model, &USE_DIVIDE, division_operator);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].location, Location::measure("Sales", "Ratio"));
        assert_eq!(violations[0].details, Some(json!({ "snippet": "[A] / [B]" })));
    }

    #[test]
    fn test_snippet_marks_truncation() {
        let chars: Vec<char> = "x".repeat(100).chars().collect();
        let text = snippet(&chars, (50, 51));
        assert!(text.starts_with("..."));
        assert!(text.ends_with("..."));
    }
}
