//! Formula Abstract Syntax Tree types

use crate::error::FormulaError;
use cellcalc_core::{CellAddress, CellRange};
use std::fmt;

/// Formula expression AST
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // === Literals ===
    /// Numeric literal
    Number(f64),
    /// String literal
    Text(String),
    /// Boolean literal
    Boolean(bool),
    /// Error literal
    Error(FormulaError),
    /// Array constant, always rectangular
    Array(Vec<Vec<Expr>>),

    // === References ===
    /// Single cell reference
    Cell(CellRef),
    /// Static range reference (`A1:B2`, `A:C`, `1:3`)
    Range(RangeRef),
    /// Parenthesized union `(A1:B2,C3)`
    Union(Vec<Expr>),
    /// Variable or defined name
    Name(String),

    // === Operators ===
    /// Unary operation
    Unary {
        op: UnaryOperator,
        operand: Box<Expr>,
    },
    /// Binary operation
    Binary {
        op: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Postfix percent
    Percent(Box<Expr>),

    // === Function call ===
    Call {
        name: String,
        args: Vec<Expr>,
    },
    /// Empty argument slot, as in `F(1,,3)`
    Omitted,
}

/// Cell reference with optional sheet
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellRef {
    pub sheet: Option<String>,
    pub address: CellAddress,
}

impl CellRef {
    pub fn new(address: CellAddress) -> Self {
        Self {
            sheet: None,
            address,
        }
    }

    pub fn on_sheet(sheet: impl Into<String>, address: CellAddress) -> Self {
        Self {
            sheet: Some(sheet.into()),
            address,
        }
    }
}

/// Range reference with optional sheet
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RangeRef {
    pub sheet: Option<String>,
    pub range: CellRange,
}

impl RangeRef {
    pub fn new(range: CellRange) -> Self {
        Self { sheet: None, range }
    }

    pub fn on_sheet(sheet: impl Into<String>, range: CellRange) -> Self {
        Self {
            sheet: Some(sheet.into()),
            range,
        }
    }
}

/// A resolved reference, as carried by values and by the dependency table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Reference {
    Cell(CellRef),
    Range(RangeRef),
    Union(Vec<Reference>),
}

impl Reference {
    /// Sheet named by the reference; unions report their first member's sheet
    pub fn sheet(&self) -> Option<&str> {
        match self {
            Reference::Cell(c) => c.sheet.as_deref(),
            Reference::Range(r) => r.sheet.as_deref(),
            Reference::Union(parts) => parts.first().and_then(|p| p.sheet()),
        }
    }

    /// Bounding area of a cell or range reference
    pub fn area(&self) -> Option<CellRange> {
        match self {
            Reference::Cell(c) => Some(CellRange::single(c.address)),
            Reference::Range(r) => Some(r.range),
            Reference::Union(_) => None,
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,

    // Comparison
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,

    // Text
    Concat,

    // Reference
    Range,
    Intersect,
}

impl BinaryOperator {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOperator::Equal
                | BinaryOperator::NotEqual
                | BinaryOperator::LessThan
                | BinaryOperator::LessEqual
                | BinaryOperator::GreaterThan
                | BinaryOperator::GreaterEqual
        )
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Power => "^",
            BinaryOperator::Equal => "=",
            BinaryOperator::NotEqual => "<>",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::Concat => "&",
            BinaryOperator::Range => ":",
            BinaryOperator::Intersect => " ",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Plus,
    Negate,
}

/// Quote a sheet name when it isn't a plain identifier
fn write_sheet(f: &mut fmt::Formatter<'_>, sheet: &Option<String>) -> fmt::Result {
    match sheet {
        None => Ok(()),
        Some(name)
            if !name.is_empty()
                && name.chars().all(|c| c.is_alphanumeric() || c == '_')
                && !name.starts_with(|c: char| c.is_ascii_digit()) =>
        {
            write!(f, "{name}!")
        }
        Some(name) => write!(f, "'{}'!", name.replace('\'', "''")),
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_sheet(f, &self.sheet)?;
        write!(f, "{}", self.address)
    }
}

impl fmt::Display for RangeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_sheet(f, &self.sheet)?;
        let CellRange { start, end } = self.range;
        let dollar = |abs: bool| if abs { "$" } else { "" };
        if start.row == 1 && end.row == cellcalc_core::MAX_ROWS {
            let letters = CellAddress::column_to_letters;
            write!(
                f,
                "{}{}:{}{}",
                dollar(start.col_absolute),
                letters(start.col),
                dollar(end.col_absolute),
                letters(end.col)
            )
        } else if start.col == 1 && end.col == cellcalc_core::MAX_COLS {
            write!(
                f,
                "{}{}:{}{}",
                dollar(start.row_absolute),
                start.row,
                dollar(end.row_absolute),
                end.row
            )
        } else {
            write!(f, "{start}:{end}")
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::Cell(c) => c.fmt(f),
            Reference::Range(r) => r.fmt(f),
            Reference::Union(parts) => {
                write!(f, "(")?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    part.fmt(f)?;
                }
                write!(f, ")")
            }
        }
    }
}
