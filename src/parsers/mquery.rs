//! Power Query (M) `let ... in` splitter
//!
//! Only the top-level structure matters here: step names, step bodies and
//! the result binding. Expressions themselves are kept as text.

use crate::graph::{Query, Step};
use tracing::debug;

/// Split an M source into steps. Returns `None` when the source has no
/// top-level `let` block.
pub fn parse_query(name: &str, source: &str) -> Option<Query> {
    let trimmed = source.trim();
    let chars: Vec<char> = trimmed.chars().collect();
    if !starts_with_word(&chars, 0, "let") {
        return None;
    }

    let mut scanner = Scanner::new(&chars, 3);
    let (bindings, result) = scanner.split_bindings();

    let steps: Vec<Step> = bindings
        .iter()
        .filter_map(|b| split_binding(b))
        .enumerate()
        .map(|(i, (step_name, expr))| Step::new(i + 1, step_name, expr))
        .collect();

    debug!("Query {} split into {} steps", name, steps.len());

    Some(Query {
        name: name.to_string(),
        source: trimmed.to_string(),
        steps,
        result,
    })
}

struct Scanner<'a> {
    chars: &'a [char],
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(chars: &'a [char], pos: usize) -> Self {
        Self { chars, pos }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    /// Walk the `let` body, returning raw binding texts and the `in` result.
    fn split_bindings(&mut self) -> (Vec<String>, String) {
        let mut bindings = Vec::new();
        let mut current = String::new();
        let mut depth = 0usize;
        let mut nested_lets = 0usize;

        while let Some(ch) = self.peek() {
            match ch {
                '"' => current.push_str(&self.read_string()),
                '/' if self.peek_next() == Some('/') => current.push_str(&self.read_line_comment()),
                '/' if self.peek_next() == Some('*') => {
                    current.push_str(&self.read_block_comment())
                }
                '(' | '[' | '{' => {
                    depth += 1;
                    current.push(ch);
                    self.pos += 1;
                }
                ')' | ']' | '}' => {
                    depth = depth.saturating_sub(1);
                    current.push(ch);
                    self.pos += 1;
                }
                ',' if depth == 0 && nested_lets == 0 => {
                    bindings.push(std::mem::take(&mut current));
                    self.pos += 1;
                }
                _ if depth == 0 && self.at_word("let") => {
                    nested_lets += 1;
                    current.push_str("let");
                    self.pos += 3;
                }
                _ if depth == 0 && self.at_word("in") => {
                    if nested_lets == 0 {
                        self.pos += 2;
                        bindings.push(current);
                        let result: String = self.chars[self.pos..].iter().collect();
                        return (bindings, result.trim().to_string());
                    }
                    nested_lets -= 1;
                    current.push_str("in");
                    self.pos += 2;
                }
                _ => {
                    current.push(ch);
                    self.pos += 1;
                }
            }
        }

        // No `in`: keep whatever was bound
        bindings.push(current);
        (bindings, String::new())
    }

    fn at_word(&self, word: &str) -> bool {
        starts_with_word(self.chars, self.pos, word)
    }

    fn read_string(&mut self) -> String {
        let mut buf = String::from('"');
        self.pos += 1;
        while let Some(ch) = self.peek() {
            buf.push(ch);
            self.pos += 1;
            if ch == '"' {
                if self.peek() == Some('"') {
                    buf.push('"');
                    self.pos += 1;
                    continue;
                }
                break;
            }
        }
        buf
    }

    fn read_line_comment(&mut self) -> String {
        let mut buf = String::new();
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            buf.push(ch);
            self.pos += 1;
        }
        buf
    }

    fn read_block_comment(&mut self) -> String {
        let mut buf = String::from("/*");
        self.pos += 2;
        while let Some(ch) = self.peek() {
            buf.push(ch);
            self.pos += 1;
            if ch == '*' && self.peek() == Some('/') {
                buf.push('/');
                self.pos += 1;
                break;
            }
        }
        buf
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.' || c == '#'
}

fn starts_with_word(chars: &[char], pos: usize, word: &str) -> bool {
    let len = word.chars().count();
    if pos + len > chars.len() {
        return false;
    }
    let matches = chars[pos..pos + len].iter().copied().eq(word.chars());
    let before_ok = pos == 0 || !is_word_char(chars[pos - 1]);
    let after_ok = chars.get(pos + len).map_or(true, |c| !is_word_char(*c));
    matches && before_ok && after_ok
}

/// Split `Name = expr` / `#"Quoted Name" = expr`
fn split_binding(binding: &str) -> Option<(String, String)> {
    let text = strip_leading_comments(binding.trim());
    if text.is_empty() {
        return None;
    }

    if let Some(rest) = text.strip_prefix("#\"") {
        let mut name = String::new();
        let mut chars = rest.char_indices().peekable();
        while let Some((i, ch)) = chars.next() {
            if ch == '"' {
                if let Some((_, '"')) = chars.peek() {
                    chars.next();
                    name.push('"');
                    continue;
                }
                let after = rest[i + 1..].trim_start();
                let expr = after.strip_prefix('=')?;
                return Some((name, expr.trim().to_string()));
            }
            name.push(ch);
        }
        return None;
    }

    let eq = text.find('=')?;
    let name = text[..eq].trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return None;
    }
    Some((name.to_string(), text[eq + 1..].trim().to_string()))
}

fn strip_leading_comments(mut text: &str) -> &str {
    loop {
        if text.starts_with("//") {
            text = text.find('\n').map_or("", |i| &text[i + 1..]).trim_start();
        } else if text.starts_with("/*") {
            text = text.find("*/").map_or("", |i| &text[i + 2..]).trim_start();
        } else {
            return text;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::StepKind;

    const SOURCE: &str = r#"let
    Source = Sql.Database("server", "db"),
    Sales = Source{[Schema="dbo", Item="Sales"]}[Data],
    #"Added Custom" = Table.AddColumn(Sales, "Label", each Text.Upper([Name]), type text),
    Typed = Table.TransformColumnTypes(#"Added Custom", {{"Amount", type number}}),
    Filtered = Table.SelectRows(Typed, each [Amount] > 0)
in
    Filtered"#;

    #[test]
    fn test_splits_top_level_steps() {
        let query = parse_query("Sales.Partition", SOURCE).unwrap();
        let names: Vec<&str> = query.steps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Source", "Sales", "Added Custom", "Typed", "Filtered"]
        );
        assert_eq!(query.result, "Filtered");
        assert_eq!(query.steps[0].kind, StepKind::SqlSource);
        assert_eq!(query.steps[4].kind, StepKind::Filter);
        assert_eq!(query.steps[2].index, 3);
    }

    #[test]
    fn test_commas_in_strings_and_comments_do_not_split() {
        let src = "let\n  // a, b\n  A = \"x, \"\"y\"\", z\",\n  B = Text.Combine({A, \"q\"}, \",\")\nin\n  B";
        let query = parse_query("Q", src).unwrap();
        assert_eq!(query.steps.len(), 2);
        assert_eq!(query.steps[0].name, "A");
        assert_eq!(query.steps[1].expression, "Text.Combine({A, \"q\"}, \",\")");
    }

    #[test]
    fn test_nested_let_stays_in_one_step() {
        let src = "let\n  Fn = let x = 1, y = 2 in x + y,\n  Out = Fn\nin\n  Out";
        let query = parse_query("Q", src).unwrap();
        assert_eq!(query.steps.len(), 2);
        assert_eq!(query.steps[0].expression, "let x = 1, y = 2 in x + y");
    }

    #[test]
    fn test_not_a_let_block() {
        assert!(parse_query("Q", "Sql.Database(\"a\", \"b\")").is_none());
        assert!(parse_query("Q", "letter = 1").is_none());
    }
}
