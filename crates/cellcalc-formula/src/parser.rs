//! Formula parser
//!
//! A recursive descent parser over the token stream with the usual
//! spreadsheet precedence, loosest first:
//!
//! comparison, `&`, `+ -`, `* /`, `^` (right-associative), unary `+ -`,
//! postfix `%`, space intersection, `:`.
//!
//! Unions only appear inside parentheses: `(A1:B2,C3)`.

use crate::ast::{BinaryOperator, CellRef, Expr, RangeRef, UnaryOperator};
use crate::error::ParseError;
use crate::lexer::{tokenize, Token, TokenKind};
use cellcalc_core::CellRange;

/// Parse a formula string into an AST
///
/// A leading `=` is optional.
///
/// # Example
/// ```rust
/// use cellcalc_formula::parse_formula;
///
/// let ast = parse_formula("=1+2").unwrap();
/// let ast = parse_formula("SUM(A1:A10)").unwrap();
/// let ast = parse_formula("=IF(A1>0,\"Yes\",\"No\")").unwrap();
/// ```
pub fn parse_formula(formula: &str) -> Result<Expr, ParseError> {
    let tokens = tokenize(formula)?;
    let mut parser = FormulaParser { tokens, pos: 0 };
    let expr = parser.parse_expression()?;

    // Make sure we consumed all input
    if parser.current().kind != TokenKind::Eof {
        return Err(parser.unexpected());
    }
    Ok(expr)
}

struct FormulaParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl FormulaParser {
    // === Token helpers ===

    fn current(&self) -> &Token {
        // The lexer always terminates the stream with Eof
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn consume(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.current().kind == kind
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.consume())
        } else {
            let token = self.current();
            let found = match token.kind {
                TokenKind::Eof => "end of formula".to_string(),
                _ => format!("'{}'", token.lexeme),
            };
            Err(self.error_at(token, format!("Expected {what} but found {found}")))
        }
    }

    fn error_at(&self, token: &Token, message: impl Into<String>) -> ParseError {
        ParseError::new(token.line, token.column, message)
    }

    fn unexpected(&self) -> ParseError {
        let token = self.current();
        match token.kind {
            TokenKind::Eof => self.error_at(token, "Unexpected end of formula"),
            _ => self.error_at(token, format!("Unexpected token '{}'", token.lexeme)),
        }
    }

    // === Grammar ===

    fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_concatenation()?;

        loop {
            let op = match self.current().kind {
                TokenKind::Equal => BinaryOperator::Equal,
                TokenKind::NotEqual => BinaryOperator::NotEqual,
                TokenKind::LessThan => BinaryOperator::LessThan,
                TokenKind::LessEqual => BinaryOperator::LessEqual,
                TokenKind::GreaterThan => BinaryOperator::GreaterThan,
                TokenKind::GreaterEqual => BinaryOperator::GreaterEqual,
                _ => break,
            };
            self.consume();
            let right = self.parse_concatenation()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_concatenation(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_additive()?;

        while self.check(&TokenKind::Ampersand) {
            self.consume();
            let right = self.parse_additive()?;
            left = binary(BinaryOperator::Concat, left, right);
        }

        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current().kind {
                TokenKind::Plus => BinaryOperator::Add,
                TokenKind::Minus => BinaryOperator::Subtract,
                _ => break,
            };
            self.consume();
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_exponent()?;

        loop {
            let op = match self.current().kind {
                TokenKind::Star => BinaryOperator::Multiply,
                TokenKind::Slash => BinaryOperator::Divide,
                _ => break,
            };
            self.consume();
            let right = self.parse_exponent()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_exponent(&mut self) -> Result<Expr, ParseError> {
        let base = self.parse_unary()?;

        if self.check(&TokenKind::Caret) {
            self.consume();
            let exponent = self.parse_exponent()?;
            return Ok(binary(BinaryOperator::Power, base, exponent));
        }

        Ok(base)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.current().kind {
            TokenKind::Minus => UnaryOperator::Negate,
            TokenKind::Plus => UnaryOperator::Plus,
            _ => return self.parse_percent(),
        };
        self.consume();
        let operand = self.parse_unary()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_percent(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_intersection()?;
        while self.check(&TokenKind::Percent) {
            self.consume();
            expr = Expr::Percent(Box::new(expr));
        }
        Ok(expr)
    }

    fn parse_intersection(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_range()?;

        while is_reference_expr(&left) && self.current().space_before && self.starts_reference() {
            let right = self.parse_range()?;
            left = binary(BinaryOperator::Intersect, left, right);
        }

        Ok(left)
    }

    fn starts_reference(&self) -> bool {
        match self.current().kind {
            TokenKind::Cell(_) | TokenKind::Area(_) | TokenKind::Sheet(_) => true,
            TokenKind::Ident(_) | TokenKind::LeftParen => true,
            _ => false,
        }
    }

    fn parse_range(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_primary()?;

        while self.check(&TokenKind::Colon) {
            let colon = self.consume();
            let right = self.parse_primary()?;
            left = match (left, right) {
                (Expr::Cell(l), Expr::Cell(r)) => {
                    if let (Some(a), Some(b)) = (&l.sheet, &r.sheet) {
                        if !a.eq_ignore_ascii_case(b) {
                            return Err(self.error_at(&colon, "Range cannot span sheets"));
                        }
                    }
                    Expr::Range(RangeRef {
                        sheet: l.sheet.or(r.sheet),
                        range: CellRange::new(l.address, r.address),
                    })
                }
                (l, r) if is_reference_expr(&l) && is_reference_expr(&r) => {
                    binary(BinaryOperator::Range, l, r)
                }
                _ => return Err(self.error_at(&colon, "Range operands must be references")),
            };
        }

        Ok(left)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let token = self.current().clone();

        match token.kind {
            TokenKind::Number(n) => {
                self.consume();
                Ok(Expr::Number(n))
            }
            TokenKind::Text(s) => {
                self.consume();
                Ok(Expr::Text(s))
            }
            TokenKind::Boolean(b) => {
                self.consume();
                Ok(Expr::Boolean(b))
            }
            TokenKind::Error(e) => {
                self.consume();
                Ok(Expr::Error(e))
            }
            TokenKind::Cell(address) => {
                self.consume();
                Ok(Expr::Cell(CellRef::new(address)))
            }
            TokenKind::Area(range) => {
                self.consume();
                Ok(Expr::Range(RangeRef::new(range)))
            }
            TokenKind::Sheet(sheet) => {
                self.consume();
                self.parse_sheet_reference(sheet)
            }
            TokenKind::Ident(name) => {
                self.consume();
                if self.check(&TokenKind::LeftParen) {
                    self.parse_function_call(name)
                } else {
                    Ok(Expr::Name(name))
                }
            }
            TokenKind::LeftParen => {
                self.consume();
                self.parse_parenthesized()
            }
            TokenKind::LeftBrace => {
                self.consume();
                self.parse_array(&token)
            }
            _ => Err(self.unexpected()),
        }
    }

    fn parse_parenthesized(&mut self) -> Result<Expr, ParseError> {
        let first = self.parse_expression()?;
        if !self.check(&TokenKind::Comma) {
            self.expect(&TokenKind::RightParen, "')'")?;
            return Ok(first);
        }

        let mut parts = vec![first];
        while self.check(&TokenKind::Comma) {
            let comma = self.consume();
            let part = self.parse_expression()?;
            if !is_reference_expr(&part) {
                return Err(self.error_at(&comma, "Union operands must be references"));
            }
            parts.push(part);
        }
        if !is_reference_expr(&parts[0]) {
            return Err(self.error_at(self.current(), "Union operands must be references"));
        }
        self.expect(&TokenKind::RightParen, "')'")?;
        Ok(Expr::Union(parts))
    }

    fn parse_sheet_reference(&mut self, sheet: String) -> Result<Expr, ParseError> {
        match self.current().kind.clone() {
            TokenKind::Cell(address) => {
                self.consume();
                Ok(Expr::Cell(CellRef::on_sheet(sheet, address)))
            }
            TokenKind::Area(range) => {
                self.consume();
                Ok(Expr::Range(RangeRef::on_sheet(sheet, range)))
            }
            _ => Err(self.error_at(self.current(), "Expected a cell reference after sheet name")),
        }
    }

    fn parse_function_call(&mut self, name: String) -> Result<Expr, ParseError> {
        self.expect(&TokenKind::LeftParen, "'('")?;
        let name = name.to_uppercase();

        let mut args = Vec::new();
        if self.check(&TokenKind::RightParen) {
            self.consume();
            return Ok(Expr::Call { name, args });
        }

        loop {
            let arg = match self.current().kind {
                TokenKind::Comma | TokenKind::RightParen => Expr::Omitted,
                _ => self.parse_expression()?,
            };
            args.push(arg);

            match self.current().kind {
                TokenKind::Comma => {
                    self.consume();
                }
                TokenKind::RightParen => {
                    self.consume();
                    break;
                }
                _ => return Err(self.unexpected()),
            }
        }

        Ok(Expr::Call { name, args })
    }

    fn parse_array(&mut self, open: &Token) -> Result<Expr, ParseError> {
        let mut rows: Vec<Vec<Expr>> = vec![Vec::new()];

        loop {
            let element = self.parse_array_element()?;
            if let Some(row) = rows.last_mut() {
                row.push(element);
            }

            match self.current().kind {
                TokenKind::Comma => {
                    self.consume();
                }
                TokenKind::Semicolon => {
                    self.consume();
                    rows.push(Vec::new());
                }
                TokenKind::RightBrace => {
                    self.consume();
                    break;
                }
                _ => return Err(self.unexpected()),
            }
        }

        let width = rows[0].len();
        if rows.iter().any(|r| r.len() != width) {
            return Err(self.error_at(open, "Array rows must all have the same length"));
        }
        Ok(Expr::Array(rows))
    }

    fn parse_array_element(&mut self) -> Result<Expr, ParseError> {
        let negate = match self.current().kind {
            TokenKind::Minus => {
                self.consume();
                true
            }
            TokenKind::Plus => {
                self.consume();
                false
            }
            _ => false,
        };
        let token = self.current().clone();
        let expr = match token.kind {
            TokenKind::Number(n) => Expr::Number(if negate { -n } else { n }),
            TokenKind::Text(s) if !negate => Expr::Text(s),
            TokenKind::Boolean(b) if !negate => Expr::Boolean(b),
            TokenKind::Error(e) if !negate => Expr::Error(e),
            _ => return Err(self.error_at(&token, "Array constants may only contain literals")),
        };
        self.consume();
        Ok(expr)
    }
}

fn binary(op: BinaryOperator, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

/// Expressions that may evaluate to a reference
fn is_reference_expr(expr: &Expr) -> bool {
    match expr {
        Expr::Cell(_) | Expr::Range(_) | Expr::Union(_) | Expr::Name(_) | Expr::Call { .. } => true,
        Expr::Binary { op, .. } => matches!(op, BinaryOperator::Range | BinaryOperator::Intersect),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FormulaError;
    use cellcalc_core::CellAddress;
    use pretty_assertions::assert_eq;

    fn num(n: f64) -> Expr {
        Expr::Number(n)
    }

    fn cell(s: &str) -> Expr {
        Expr::Cell(CellRef::new(CellAddress::parse(s).unwrap()))
    }

    #[test]
    fn test_parse_literals() {
        assert_eq!(parse_formula("=42").unwrap(), num(42.0));
        assert_eq!(parse_formula("\"hi\"").unwrap(), Expr::Text("hi".into()));
        assert_eq!(parse_formula("=FALSE").unwrap(), Expr::Boolean(false));
        assert_eq!(
            parse_formula("=#REF!").unwrap(),
            Expr::Error(FormulaError::Ref)
        );
    }

    #[test]
    fn test_parse_precedence() {
        // 1+2*3 => 1+(2*3)
        assert_eq!(
            parse_formula("=1+2*3").unwrap(),
            binary(
                BinaryOperator::Add,
                num(1.0),
                binary(BinaryOperator::Multiply, num(2.0), num(3.0))
            )
        );

        // 2^3^2 => 2^(3^2)
        assert_eq!(
            parse_formula("=2^3^2").unwrap(),
            binary(
                BinaryOperator::Power,
                num(2.0),
                binary(BinaryOperator::Power, num(3.0), num(2.0))
            )
        );

        // "a"&1+1 => "a"&(1+1)
        assert_eq!(
            parse_formula("=\"a\"&1+1").unwrap(),
            binary(
                BinaryOperator::Concat,
                Expr::Text("a".into()),
                binary(BinaryOperator::Add, num(1.0), num(1.0))
            )
        );
    }

    #[test]
    fn test_parse_unary_binds_tighter_than_power() {
        assert_eq!(
            parse_formula("=-2^2").unwrap(),
            binary(
                BinaryOperator::Power,
                Expr::Unary {
                    op: UnaryOperator::Negate,
                    operand: Box::new(num(2.0)),
                },
                num(2.0)
            )
        );
    }

    #[test]
    fn test_parse_percent() {
        assert_eq!(
            parse_formula("=50%").unwrap(),
            Expr::Percent(Box::new(num(50.0)))
        );
    }

    #[test]
    fn test_parse_references() {
        assert_eq!(
            parse_formula("=Sheet2!A1:B3").unwrap(),
            Expr::Range(RangeRef::on_sheet(
                "Sheet2",
                CellRange::parse("A1:B3").unwrap()
            ))
        );
        assert_eq!(
            parse_formula("=A:A").unwrap(),
            Expr::Range(RangeRef::new(CellRange::new(
                CellAddress::with_absolute(1, 1, true, false),
                CellAddress::with_absolute(cellcalc_core::MAX_ROWS, 1, true, false),
            )))
        );
    }

    #[test]
    fn test_parse_union_and_intersection() {
        assert_eq!(
            parse_formula("=SUM((A1,B2))").unwrap(),
            Expr::Call {
                name: "SUM".into(),
                args: vec![Expr::Union(vec![cell("A1"), cell("B2")])],
            }
        );
        assert_eq!(
            parse_formula("=A1:C3 B2").unwrap(),
            binary(
                BinaryOperator::Intersect,
                Expr::Range(RangeRef::new(CellRange::parse("A1:C3").unwrap())),
                cell("B2")
            )
        );
        assert_eq!(
            parse_formula("=A1 (A1)").unwrap(),
            binary(BinaryOperator::Intersect, cell("A1"), cell("A1"))
        );
        assert_eq!(
            parse_formula("=A1:C3 (B2,C3)").unwrap(),
            binary(
                BinaryOperator::Intersect,
                Expr::Range(RangeRef::new(CellRange::parse("A1:C3").unwrap())),
                Expr::Union(vec![cell("B2"), cell("C3")])
            )
        );
        // A name followed by a parenthesis stays a function call
        assert_eq!(
            parse_formula("=SUM (A1)").unwrap(),
            Expr::Call {
                name: "SUM".into(),
                args: vec![cell("A1")],
            }
        );
        assert!(parse_formula("=1 (2)").is_err());
    }

    #[test]
    fn test_parse_function_arguments() {
        assert_eq!(
            parse_formula("=pi()").unwrap(),
            Expr::Call {
                name: "PI".into(),
                args: vec![],
            }
        );
        assert_eq!(
            parse_formula("=F(,)").unwrap(),
            Expr::Call {
                name: "F".into(),
                args: vec![Expr::Omitted, Expr::Omitted],
            }
        );
        assert_eq!(
            parse_formula("=F(1,)").unwrap(),
            Expr::Call {
                name: "F".into(),
                args: vec![num(1.0), Expr::Omitted],
            }
        );
    }

    #[test]
    fn test_parse_array() {
        assert_eq!(
            parse_formula("={1,-2;\"a\",TRUE}").unwrap(),
            Expr::Array(vec![
                vec![num(1.0), num(-2.0)],
                vec![Expr::Text("a".into()), Expr::Boolean(true)],
            ])
        );
        let err = parse_formula("={1,2;3}").unwrap_err();
        assert_eq!(err.message, "Array rows must all have the same length");
    }

    #[test]
    fn test_parse_errors() {
        let err = parse_formula("=SUM(1,2").unwrap_err();
        assert_eq!(err.message, "Unexpected end of formula");
        assert_eq!((err.line, err.column), (1, 9));

        let err = parse_formula("=1+").unwrap_err();
        assert_eq!(err.message, "Unexpected end of formula");

        let err = parse_formula("=(1+2").unwrap_err();
        assert_eq!(err.message, "Expected ')' but found end of formula");

        let err = parse_formula("=1 2").unwrap_err();
        assert_eq!(err.message, "Unexpected token '2'");
        assert_eq!(err.column, 4);

        assert!(parse_formula("=").is_err());
    }
}
