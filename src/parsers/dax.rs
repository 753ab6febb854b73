//! Tolerant DAX tokenizer
//!
//! Expression checks look at token shapes instead of raw text, so comments
//! and string literals never produce false hits. The lexer never fails:
//! unterminated literals run to the end of input and unknown characters
//! become [`TokenKind::Other`].

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Function name, keyword or bare table name (original case)
    Ident(String),
    /// `'Table Name'`
    QuotedTable(String),
    /// `[Column]` or `[Measure]`
    Bracket(String),
    Str(String),
    Number(String),
    LParen,
    RParen,
    Comma,
    Op(String),
    Other(char),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Char offsets into the source
    pub start: usize,
    pub end: usize,
}

impl Token {
    /// Identifier comparison, case-insensitive
    pub fn is_ident(&self, name: &str) -> bool {
        matches!(&self.kind, TokenKind::Ident(s) if s.eq_ignore_ascii_case(name))
    }

    pub fn is_table_ref(&self) -> bool {
        matches!(self.kind, TokenKind::Ident(_) | TokenKind::QuotedTable(_))
    }

    pub fn is_op(&self, op: &str) -> bool {
        matches!(&self.kind, TokenKind::Op(s) if s == op)
    }
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
}

impl Lexer {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while matches!(self.peek(), Some(ch) if ch.is_whitespace()) {
                self.advance();
            }

            match (self.peek(), self.peek_next()) {
                (Some('/'), Some('/')) | (Some('-'), Some('-')) => {
                    while let Some(ch) = self.advance() {
                        if ch == '\n' || ch == '\r' {
                            break;
                        }
                    }
                }
                (Some('/'), Some('*')) => {
                    self.advance();
                    self.advance();
                    while let Some(ch) = self.advance() {
                        if ch == '*' && self.peek() == Some('/') {
                            self.advance();
                            break;
                        }
                    }
                }
                _ => break,
            }
        }
    }

    fn next_token(&mut self) -> Option<Token> {
        self.skip_whitespace_and_comments();
        let start = self.pos;
        let ch = self.peek()?;

        let kind = match ch {
            '(' => {
                self.advance();
                TokenKind::LParen
            }
            ')' => {
                self.advance();
                TokenKind::RParen
            }
            ',' => {
                self.advance();
                TokenKind::Comma
            }
            '[' => TokenKind::Bracket(self.read_delimited(']')),
            '\'' => TokenKind::QuotedTable(self.read_delimited('\'')),
            '"' => TokenKind::Str(self.read_delimited('"')),
            '+' | '-' | '*' | '/' | '^' | '=' => {
                self.advance();
                TokenKind::Op(ch.to_string())
            }
            '&' | '|' | '<' | '>' => {
                self.advance();
                let mut op = ch.to_string();
                if let Some(next) = self.peek() {
                    if matches!((ch, next), ('&', '&') | ('|', '|') | ('<', '=') | ('<', '>') | ('>', '='))
                    {
                        self.advance();
                        op.push(next);
                    }
                }
                TokenKind::Op(op)
            }
            _ if ch.is_ascii_digit()
                || (ch == '.' && self.peek_next().is_some_and(|n| n.is_ascii_digit())) =>
            {
                TokenKind::Number(self.read_while(|c| c.is_ascii_digit() || c == '.'))
            }
            _ if ch.is_alphabetic() || ch == '_' => {
                TokenKind::Ident(self.read_while(|c| c.is_alphanumeric() || c == '_' || c == '.'))
            }
            _ => {
                self.advance();
                TokenKind::Other(ch)
            }
        };

        Some(Token {
            kind,
            start,
            end: self.pos,
        })
    }

    fn read_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut buf = String::new();
        while let Some(ch) = self.peek() {
            if !pred(ch) {
                break;
            }
            buf.push(ch);
            self.advance();
        }
        buf
    }

    /// Read a literal closed by `close`, where a doubled `close` escapes it.
    fn read_delimited(&mut self, close: char) -> String {
        let mut buf = String::new();
        self.advance();
        while let Some(ch) = self.advance() {
            if ch == close {
                if self.peek() == Some(close) {
                    self.advance();
                    buf.push(close);
                    continue;
                }
                break;
            }
            buf.push(ch);
        }
        buf
    }
}

/// Tokenize a DAX expression
pub fn tokenize(expression: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(expression);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token() {
        tokens.push(token);
    }
    tokens
}

/// Index of the `)` closing the `(` at `open`, if balanced
pub fn matching_paren(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        match token.kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Positions of every `NAME(` call, pointing at the name token
pub fn calls<'a>(tokens: &'a [Token], name: &'a str) -> impl Iterator<Item = usize> + 'a {
    tokens.windows(2).enumerate().filter_map(move |(i, pair)| {
        (pair[0].is_ident(name) && pair[1].kind == TokenKind::LParen).then_some(i)
    })
}

pub fn has_call(tokens: &[Token], name: &str) -> bool {
    calls(tokens, name).next().is_some()
}

/// Argument token slices of the call whose name sits at `name_idx`.
/// An unclosed call takes everything up to the end.
pub fn call_args(tokens: &[Token], name_idx: usize) -> Vec<&[Token]> {
    let open = name_idx + 1;
    let close = matching_paren(tokens, open).unwrap_or(tokens.len());
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut arg_start = open + 1;
    for i in (open + 1)..close {
        match tokens[i].kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => depth = depth.saturating_sub(1),
            TokenKind::Comma if depth == 0 => {
                args.push(&tokens[arg_start..i]);
                arg_start = i + 1;
            }
            _ => {}
        }
    }
    if arg_start < close {
        args.push(&tokens[arg_start..close]);
    }
    args
}

/// Bracket references split into (table-qualified, standalone)
pub fn bracket_references(tokens: &[Token]) -> (usize, usize) {
    let mut qualified = 0;
    let mut standalone = 0;
    for (i, token) in tokens.iter().enumerate() {
        if !matches!(token.kind, TokenKind::Bracket(_)) {
            continue;
        }
        // `Sales[A]` must be adjacent, `'Sales' [A]` may be spaced
        let qualifies = i > 0
            && match &tokens[i - 1].kind {
                TokenKind::QuotedTable(_) => true,
                TokenKind::Ident(_) => tokens[i - 1].end == token.start,
                _ => false,
            };
        if qualifies {
            qualified += 1;
        } else {
            standalone += 1;
        }
    }
    (qualified, standalone)
}

/// Calls with no nested parentheses, as (name index, close index)
pub fn leaf_calls(tokens: &[Token]) -> Vec<(usize, usize)> {
    let mut leaves = Vec::new();
    for (i, pair) in tokens.windows(2).enumerate() {
        if !(matches!(pair[0].kind, TokenKind::Ident(_)) && pair[1].kind == TokenKind::LParen) {
            continue;
        }
        let Some(close) = matching_paren(tokens, i + 1) else {
            continue;
        };
        let nested = tokens[i + 2..close]
            .iter()
            .any(|t| t.kind == TokenKind::LParen);
        if !nested {
            leaves.push((i, close));
        }
    }
    leaves
}

/// Source text between two char offsets, whitespace removed and upper-cased
pub fn normalized_span(source: &[char], start: usize, end: usize) -> String {
    source[start.min(source.len())..end.min(source.len())]
        .iter()
        .filter(|c| !c.is_whitespace())
        .flat_map(|c| c.to_uppercase())
        .collect()
}
