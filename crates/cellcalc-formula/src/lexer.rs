//! Formula tokenizer
//!
//! Turns formula text into a flat token list. Positions are 1-based
//! line/column pairs in the original text, including a skipped leading `=`.

use crate::error::{FormulaError, LexError};
use cellcalc_core::{CellAddress, CellRange, MAX_COLS, MAX_ROWS};

/// Token types
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Number(f64),
    Text(String),
    Boolean(bool),
    Error(FormulaError),

    // Identifiers and references
    /// Function name (followed by `(`) or defined name
    Ident(String),
    /// Cell reference like A1, $A$1
    Cell(CellAddress),
    /// Whole-column or whole-row area like A:C, 1:3
    Area(CellRange),
    /// Sheet prefix like Sheet1! or 'My Sheet'!
    Sheet(String),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Percent,
    Ampersand,
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    Colon,
    Comma,
    Semicolon,

    // Delimiters
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,

    // End of input
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: usize,
    pub column: usize,
    /// Whitespace preceded this token; the parser uses it for intersection
    pub space_before: bool,
}

/// Tokenize a formula, stopping at the first error
pub fn tokenize(formula: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(formula).run()
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn run(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        self.skip_whitespace();
        if self.peek_char() == Some('=') {
            self.advance();
        }
        loop {
            let space_before = self.skip_whitespace();
            let (start, line, column) = (self.pos, self.line, self.column);
            let kind = self.scan_token()?;
            let done = kind == TokenKind::Eof;
            tokens.push(Token {
                kind,
                lexeme: self.input[start..self.pos].to_string(),
                line,
                column,
                space_before,
            });
            if done {
                return Ok(tokens);
            }
        }
    }

    // === Token scanning ===

    fn scan_token(&mut self) -> Result<TokenKind, LexError> {
        let Some(c) = self.peek_char() else {
            return Ok(TokenKind::Eof);
        };

        let single = match c {
            '+' => Some(TokenKind::Plus),
            '-' => Some(TokenKind::Minus),
            '*' => Some(TokenKind::Star),
            '/' => Some(TokenKind::Slash),
            '^' => Some(TokenKind::Caret),
            '%' => Some(TokenKind::Percent),
            '&' => Some(TokenKind::Ampersand),
            '=' => Some(TokenKind::Equal),
            ':' => Some(TokenKind::Colon),
            ',' => Some(TokenKind::Comma),
            ';' => Some(TokenKind::Semicolon),
            '(' => Some(TokenKind::LeftParen),
            ')' => Some(TokenKind::RightParen),
            '{' => Some(TokenKind::LeftBrace),
            '}' => Some(TokenKind::RightBrace),
            _ => None,
        };
        if let Some(kind) = single {
            self.advance();
            return Ok(kind);
        }

        match c {
            '<' => {
                self.advance();
                Ok(match self.peek_char() {
                    Some('=') => {
                        self.advance();
                        TokenKind::LessEqual
                    }
                    Some('>') => {
                        self.advance();
                        TokenKind::NotEqual
                    }
                    _ => TokenKind::LessThan,
                })
            }
            '>' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    return Ok(TokenKind::GreaterEqual);
                }
                Ok(TokenKind::GreaterThan)
            }
            '"' => self.scan_string(),
            '\'' => self.scan_quoted_sheet(),
            '#' => self.scan_error(),
            '$' if self.peek_char_at(1).is_some_and(|c| c.is_ascii_digit()) => self.scan_row_area(),
            c if c.is_ascii_digit() => {
                if let Some(area) = self.try_row_area() {
                    return Ok(area);
                }
                self.scan_number()
            }
            '.' if self.peek_char_at(1).is_some_and(|c| c.is_ascii_digit()) => self.scan_number(),
            c if c.is_alphabetic() || c == '_' || c == '\\' || c == '$' => {
                self.scan_identifier_or_ref()
            }
            other => Err(self.error(format!("Unexpected character '{other}'"))),
        }
    }

    fn scan_string(&mut self) -> Result<TokenKind, LexError> {
        let (line, column) = (self.line, self.column);
        self.advance(); // Skip opening quote

        let mut s = String::new();
        loop {
            match self.peek_char() {
                Some('"') if self.peek_char_at(1) == Some('"') => {
                    s.push('"');
                    self.advance();
                    self.advance();
                }
                Some('"') => {
                    self.advance();
                    return Ok(TokenKind::Text(s));
                }
                Some(c) => {
                    s.push(c);
                    self.advance();
                }
                None => {
                    return Err(LexError {
                        line,
                        column,
                        message: "Unterminated string literal".into(),
                    })
                }
            }
        }
    }

    fn scan_quoted_sheet(&mut self) -> Result<TokenKind, LexError> {
        let (line, column) = (self.line, self.column);
        self.advance();

        let mut name = String::new();
        loop {
            match self.peek_char() {
                Some('\'') if self.peek_char_at(1) == Some('\'') => {
                    name.push('\'');
                    self.advance();
                    self.advance();
                }
                Some('\'') => {
                    self.advance();
                    break;
                }
                Some(c) => {
                    name.push(c);
                    self.advance();
                }
                None => {
                    return Err(LexError {
                        line,
                        column,
                        message: "Unterminated sheet name".into(),
                    })
                }
            }
        }

        if self.peek_char() != Some('!') {
            return Err(self.error("Expected '!' after sheet name"));
        }
        self.advance();
        Ok(TokenKind::Sheet(name))
    }

    fn scan_error(&mut self) -> Result<TokenKind, LexError> {
        let rest = &self.input[self.pos..];
        let matched = FormulaError::LITERALS.iter().find(|lit| {
            rest.get(..lit.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(lit))
        });
        match matched.and_then(|lit| FormulaError::from_literal(lit).map(|e| (lit.len(), e))) {
            Some((len, err)) => {
                for _ in 0..len {
                    self.advance();
                }
                Ok(TokenKind::Error(err))
            }
            None => Err(self.error("Unknown error literal")),
        }
    }

    fn scan_number(&mut self) -> Result<TokenKind, LexError> {
        let start = self.pos;

        // Integer part
        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        // Decimal part
        if self.peek_char() == Some('.') {
            self.advance();
            while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        // Exponent part, only when digits follow
        if self.peek_char().is_some_and(|c| c == 'e' || c == 'E') {
            let signed = self.peek_char_at(1).is_some_and(|c| c == '+' || c == '-');
            let digit_at = if signed { 2 } else { 1 };
            if self.peek_char_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                for _ in 0..digit_at {
                    self.advance();
                }
                while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                    self.advance();
                }
            }
        }

        let text = &self.input[start..self.pos];
        text.parse::<f64>()
            .map(TokenKind::Number)
            .map_err(|_| self.error(format!("Invalid number '{text}'")))
    }

    /// `1:3`, `$2:$5`; backtracks when the text is not a row area
    fn try_row_area(&mut self) -> Option<TokenKind> {
        let input = self.input;
        let rest = &input[self.pos..];
        let caps = lazy_regex::regex_captures!(r"^(\$?)(\d+):(\$?)(\d+)", rest)?;
        let (whole, abs1, first, abs2, last) = caps;
        let after = rest[whole.len()..].chars().next();
        if after.is_some_and(|c| c.is_alphanumeric() || c == '.' || c == '_' || c == '(') {
            return None;
        }
        let first: u32 = first.parse().ok()?;
        let last: u32 = last.parse().ok()?;
        if first == 0 || last == 0 || first > MAX_ROWS || last > MAX_ROWS {
            return None;
        }
        for _ in 0..whole.chars().count() {
            self.advance();
        }
        Some(TokenKind::Area(CellRange::new(
            CellAddress::with_absolute(first, 1, !abs1.is_empty(), true),
            CellAddress::with_absolute(last, MAX_COLS, !abs2.is_empty(), true),
        )))
    }

    fn scan_row_area(&mut self) -> Result<TokenKind, LexError> {
        self.try_row_area()
            .ok_or_else(|| self.error("Invalid row reference"))
    }

    fn scan_identifier_or_ref(&mut self) -> Result<TokenKind, LexError> {
        let start = self.pos;

        while self
            .peek_char()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$' || c == '.' || c == '\\')
        {
            self.advance();
        }

        let input = self.input;
        let text = &input[start..self.pos];
        let next = self.peek_char();

        // Function call
        if next == Some('(') {
            if text.contains('$') {
                return Err(self.error(format!("Invalid function name '{text}'")));
            }
            return Ok(TokenKind::Ident(text.to_string()));
        }

        // Sheet prefix
        if next == Some('!') {
            self.advance();
            return Ok(TokenKind::Sheet(text.to_string()));
        }

        // Whole-column area
        if next == Some(':') {
            if let Some(area) = self.try_column_area(text) {
                return Ok(area);
            }
        }

        if lazy_regex::regex_is_match!(r"^\$?[A-Za-z]{1,3}\$?[0-9]+$", text) {
            if let Ok(addr) = CellAddress::parse(text) {
                return Ok(TokenKind::Cell(addr));
            }
        }

        if text.eq_ignore_ascii_case("TRUE") {
            return Ok(TokenKind::Boolean(true));
        }
        if text.eq_ignore_ascii_case("FALSE") {
            return Ok(TokenKind::Boolean(false));
        }

        if text.contains('$') {
            return Err(self.error(format!("Invalid reference '{text}'")));
        }

        Ok(TokenKind::Ident(text.to_string()))
    }

    /// `A:C`, `$A:$C` given the already scanned left side
    fn try_column_area(&mut self, left: &str) -> Option<TokenKind> {
        let (abs1, first) = match left.strip_prefix('$') {
            Some(letters) => (true, letters),
            None => (false, left),
        };
        if !lazy_regex::regex_is_match!(r"^[A-Za-z]{1,3}$", first) {
            return None;
        }
        let input = self.input;
        let rest = &input[self.pos + 1..];
        let (whole, abs2, last) = lazy_regex::regex_captures!(r"^(\$?)([A-Za-z]{1,3})", rest)?;
        let after = rest[whole.len()..].chars().next();
        if after.is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$' || c == '(' || c == '!') {
            return None;
        }
        let first = CellAddress::letters_to_column(first).ok()?;
        let last = CellAddress::letters_to_column(last).ok()?;
        if first > MAX_COLS || last > MAX_COLS {
            return None;
        }
        for _ in 0..=whole.len() {
            self.advance();
        }
        Some(TokenKind::Area(CellRange::new(
            CellAddress::with_absolute(1, first, true, abs1),
            CellAddress::with_absolute(MAX_ROWS, last, true, !abs2.is_empty()),
        )))
    }

    // === Helper methods ===

    fn error(&self, message: impl Into<String>) -> LexError {
        LexError {
            line: self.line,
            column: self.column,
            message: message.into(),
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    /// Returns whether anything was skipped
    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek_char().is_some_and(|c| c.is_whitespace()) {
            self.advance();
        }
        self.pos != start
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(formula: &str) -> Vec<TokenKind> {
        tokenize(formula)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_tokenize_arithmetic() {
        assert_eq!(
            kinds("=1+2.5*3e2"),
            vec![
                TokenKind::Number(1.0),
                TokenKind::Plus,
                TokenKind::Number(2.5),
                TokenKind::Star,
                TokenKind::Number(300.0),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_tokenize_string_escape() {
        assert_eq!(
            kinds(r#""say ""hi""""#),
            vec![TokenKind::Text(r#"say "hi""#.into()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_tokenize_references() {
        assert_eq!(
            kinds("Sheet1!$A$1:B2"),
            vec![
                TokenKind::Sheet("Sheet1".into()),
                TokenKind::Cell(CellAddress::absolute(1, 1)),
                TokenKind::Colon,
                TokenKind::Cell(CellAddress::new(2, 2)),
                TokenKind::Eof,
            ]
        );
        assert_eq!(
            kinds("'It''s'!A1"),
            vec![
                TokenKind::Sheet("It's".into()),
                TokenKind::Cell(CellAddress::new(1, 1)),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_tokenize_areas() {
        assert_eq!(
            kinds("A:C"),
            vec![
                TokenKind::Area(CellRange::new(
                    CellAddress::with_absolute(1, 1, true, false),
                    CellAddress::with_absolute(MAX_ROWS, 3, true, false),
                )),
                TokenKind::Eof,
            ]
        );
        assert_eq!(
            kinds("2:$4"),
            vec![
                TokenKind::Area(CellRange::new(
                    CellAddress::with_absolute(2, 1, false, true),
                    CellAddress::with_absolute(4, MAX_COLS, true, true),
                )),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_tokenize_functions_and_names() {
        assert_eq!(
            kinds("LOG10(x)"),
            vec![
                TokenKind::Ident("LOG10".into()),
                TokenKind::LeftParen,
                TokenKind::Ident("x".into()),
                TokenKind::RightParen,
                TokenKind::Eof,
            ]
        );
        assert_eq!(kinds("true")[0], TokenKind::Boolean(true));
        assert_eq!(kinds("ABCD1")[0], TokenKind::Ident("ABCD1".into()));
    }

    #[test]
    fn test_tokenize_errors_and_operators() {
        assert_eq!(
            kinds("#N/A<>#div/0!"),
            vec![
                TokenKind::Error(FormulaError::NotAvailable),
                TokenKind::NotEqual,
                TokenKind::Error(FormulaError::Div0),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_positions_and_spacing() {
        let tokens = tokenize("=A1 +\n  B2").unwrap();
        assert_eq!((tokens[0].line, tokens[0].column), (1, 2));
        assert!(tokens[1].space_before);
        assert_eq!((tokens[2].line, tokens[2].column), (2, 3));
        assert_eq!(tokens[2].lexeme, "B2");
    }

    #[test]
    fn test_lex_errors() {
        let err = tokenize("1 + \"open").unwrap_err();
        assert_eq!((err.line, err.column), (1, 5));
        assert_eq!(err.message, "Unterminated string literal");

        let err = tokenize("1 @ 2").unwrap_err();
        assert_eq!(err.column, 3);

        assert!(tokenize("#WHAT").is_err());
        assert!(tokenize("'Sheet 1'A1").is_err());
    }
}
