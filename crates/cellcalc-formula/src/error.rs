//! Formula error types
//!
//! Two families live here. [`FormulaError`] is a spreadsheet error *value*
//! (`#DIV/0!`, `#N/A`, ...): functions return it through [`FormulaResult`] and the
//! evaluator turns it into data at the call boundary. The remaining types are
//! Rust errors that abort an engine call: syntax diagnostics and accessor failures.

use std::fmt;
use thiserror::Error;

/// Result type returned by function implementations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Error raised by a cell or range accessor; propagated to the caller as-is
pub type AccessError = Box<dyn std::error::Error + Send + Sync>;

/// Spreadsheet error values
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FormulaError {
    /// #NULL! - Empty intersection
    #[error("#NULL!")]
    Null,
    /// #DIV/0! - Division by zero
    #[error("#DIV/0!")]
    Div0,
    /// #VALUE! - Wrong type of argument or operand
    #[error("#VALUE!")]
    Value,
    /// #REF! - Invalid cell reference
    #[error("#REF!")]
    Ref,
    /// #NAME? - Unrecognized name
    #[error("#NAME?")]
    Name,
    /// #NUM! - Invalid numeric value
    #[error("#NUM!")]
    Num,
    /// #N/A - Value not available
    #[error("#N/A")]
    NotAvailable,
    /// A known function whose behaviour is not provided; displays as #NAME?
    #[error("#NAME?")]
    NotImplemented(String),
}

impl FormulaError {
    /// Every error literal the lexer accepts, longest first per prefix
    pub const LITERALS: [&'static str; 7] = [
        "#NULL!", "#DIV/0!", "#VALUE!", "#REF!", "#NAME?", "#NUM!", "#N/A",
    ];

    /// Get the display token for this error
    pub fn as_str(&self) -> &'static str {
        match self {
            FormulaError::Null => "#NULL!",
            FormulaError::Div0 => "#DIV/0!",
            FormulaError::Value => "#VALUE!",
            FormulaError::Ref => "#REF!",
            FormulaError::Name | FormulaError::NotImplemented(_) => "#NAME?",
            FormulaError::Num => "#NUM!",
            FormulaError::NotAvailable => "#N/A",
        }
    }

    /// Parse an error literal (case-insensitive)
    pub fn from_literal(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "#NULL!" => Some(FormulaError::Null),
            "#DIV/0!" => Some(FormulaError::Div0),
            "#VALUE!" => Some(FormulaError::Value),
            "#REF!" => Some(FormulaError::Ref),
            "#NAME?" => Some(FormulaError::Name),
            "#NUM!" => Some(FormulaError::Num),
            "#N/A" => Some(FormulaError::NotAvailable),
            _ => None,
        }
    }

    /// Number reported by ERROR.TYPE
    pub fn type_number(&self) -> u8 {
        match self {
            FormulaError::Null => 1,
            FormulaError::Div0 => 2,
            FormulaError::Value => 3,
            FormulaError::Ref => 4,
            FormulaError::Name | FormulaError::NotImplemented(_) => 5,
            FormulaError::Num => 6,
            FormulaError::NotAvailable => 7,
        }
    }

    /// Human-readable detail, empty for the plain error kinds
    pub fn detail(&self) -> String {
        match self {
            FormulaError::NotImplemented(name) => format!("Function {name} is not implemented."),
            _ => String::new(),
        }
    }
}

/// Tokenizer failure, 1-based position of the offending character
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct LexError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// Grammar violation, 1-based position of the offending token
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            column,
            message: message.into(),
        }
    }
}

impl From<LexError> for ParseError {
    fn from(e: LexError) -> Self {
        Self {
            line: e.line,
            column: e.column,
            message: e.message,
        }
    }
}

/// A syntax error rendered against its source text
///
/// Displays as the offending source line, a caret under the column, the position
/// and the raw message:
///
/// ```text
///
/// SUM(1,,
///        ^
/// Error at position 1:8
/// Unexpected end of formula
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: usize,
    pub column: usize,
    pub source_line: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(source: &str, error: &ParseError) -> Self {
        let source_line = source
            .split('\n')
            .nth(error.line.saturating_sub(1))
            .unwrap_or_default()
            .trim_end_matches('\r')
            .to_string();
        Self {
            line: error.line,
            column: error.column,
            source_line,
            message: error.message.clone(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let indent = " ".repeat(self.column.saturating_sub(1));
        write!(
            f,
            "\n{}\n{}^\nError at position {}:{}\n{}",
            self.source_line, indent, self.line, self.column, self.message
        )
    }
}

impl std::error::Error for Diagnostic {}

/// Errors that abort an engine call
#[derive(Debug, Error)]
pub enum EngineError {
    /// The formula text could not be tokenized or parsed
    #[error("{0}")]
    Syntax(Diagnostic),

    /// A cell or range accessor failed
    #[error("{0}")]
    Access(AccessError),

    /// A spreadsheet error raised inside a call; converted to a value before
    /// it can leave the evaluator
    #[error(transparent)]
    Formula(#[from] FormulaError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_error_display() {
        assert_eq!(FormulaError::Div0.to_string(), "#DIV/0!");
        assert_eq!(FormulaError::NotAvailable.to_string(), "#N/A");
        assert_eq!(
            FormulaError::NotImplemented("AGGREGATE".into()).to_string(),
            "#NAME?"
        );
    }

    #[test]
    fn test_error_literal_parse() {
        for literal in FormulaError::LITERALS {
            let parsed = FormulaError::from_literal(literal).unwrap();
            assert_eq!(parsed.as_str(), literal);
        }
        assert_eq!(FormulaError::from_literal("#n/a"), Some(FormulaError::NotAvailable));
        assert_eq!(FormulaError::from_literal("#BOGUS!"), None);
    }

    #[test]
    fn test_not_implemented_detail() {
        let e = FormulaError::NotImplemented("BAHTTEXT".into());
        assert_eq!(e.detail(), "Function BAHTTEXT is not implemented.");
        assert_eq!(FormulaError::Num.detail(), "");
    }

    #[test]
    fn test_diagnostic_rendering() {
        let err = ParseError::new(2, 4, "Unexpected token ')'");
        let diag = Diagnostic::new("SUM(1,\n2,3))", &err);
        assert_eq!(
            diag.to_string(),
            "\n2,3))\n   ^\nError at position 2:4\nUnexpected token ')'"
        );
    }
}
