//! Runtime values and coercions

use crate::ast::Reference;
use crate::error::{FormulaError, FormulaResult};
use lazy_regex::regex_is_match;
use std::cmp::Ordering;
use std::fmt;

/// Value types during formula evaluation
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    Number(f64),
    Text(String),
    Boolean(bool),
    Error(FormulaError),
    /// Row-major, rectangular
    Array(Vec<Vec<Value>>),
    /// Unresolved reference; only seen by reference-preserving functions and
    /// by the evaluator itself
    Reference(Reference),
    Empty,
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// Check if this is an error
    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// Get the error if this is one
    pub fn error(&self) -> Option<&FormulaError> {
        match self {
            Value::Error(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// Top-left element of an array, the value itself otherwise
    pub fn scalar(&self) -> &Value {
        match self {
            Value::Array(rows) => rows
                .first()
                .and_then(|r| r.first())
                .map(Value::scalar)
                .unwrap_or(&Value::Empty),
            other => other,
        }
    }

    /// Numeric coercion: booleans are 1/0, numeric text is parsed, empty is 0
    pub fn to_number(&self) -> FormulaResult<f64> {
        match self.scalar() {
            Value::Number(n) => Ok(*n),
            Value::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Value::Empty => Ok(0.0),
            Value::Text(s) => parse_number(s).ok_or(FormulaError::Value),
            Value::Error(e) => Err(e.clone()),
            Value::Array(_) | Value::Reference(_) => Err(FormulaError::Value),
        }
    }

    /// Numeric coercion that refuses booleans
    pub fn to_number_strict(&self) -> FormulaResult<f64> {
        match self.scalar() {
            Value::Boolean(_) => Err(FormulaError::Value),
            other => other.to_number(),
        }
    }

    /// Text coercion: numbers use the shortest round-trip form
    pub fn to_text(&self) -> FormulaResult<String> {
        match self.scalar() {
            Value::Number(n) => Ok(format_number(*n)),
            Value::Text(s) => Ok(s.clone()),
            Value::Boolean(b) => Ok(bool_text(*b).to_string()),
            Value::Empty => Ok(String::new()),
            Value::Error(e) => Err(e.clone()),
            Value::Array(_) | Value::Reference(_) => Err(FormulaError::Value),
        }
    }

    /// Boolean coercion: non-zero numbers are true, "TRUE"/"FALSE" text is accepted
    pub fn to_bool(&self) -> FormulaResult<bool> {
        match self.scalar() {
            Value::Boolean(b) => Ok(*b),
            Value::Number(n) => Ok(*n != 0.0),
            Value::Empty => Ok(false),
            Value::Text(s) if s.eq_ignore_ascii_case("TRUE") => Ok(true),
            Value::Text(s) if s.eq_ignore_ascii_case("FALSE") => Ok(false),
            Value::Text(_) => Err(FormulaError::Value),
            Value::Error(e) => Err(e.clone()),
            Value::Array(_) | Value::Reference(_) => Err(FormulaError::Value),
        }
    }

    /// Rows of an array; a scalar becomes a 1x1 array
    pub fn to_rows(&self) -> Vec<Vec<Value>> {
        match self {
            Value::Array(rows) => rows.clone(),
            other => vec![vec![other.clone()]],
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::Boolean(_) => "boolean",
            Value::Error(_) => "error",
            Value::Array(_) => "array",
            Value::Reference(_) => "reference",
            Value::Empty => "empty",
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<FormulaError> for Value {
    fn from(e: FormulaError) -> Self {
        Value::Error(e)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::Text(s) => f.write_str(s),
            Value::Boolean(b) => f.write_str(bool_text(*b)),
            Value::Error(e) => f.write_str(e.as_str()),
            Value::Array(rows) => {
                write!(f, "{{")?;
                for (i, row) in rows.iter().enumerate() {
                    if i > 0 {
                        write!(f, ";")?;
                    }
                    for (j, v) in row.iter().enumerate() {
                        if j > 0 {
                            write!(f, ",")?;
                        }
                        match v {
                            Value::Text(s) => write!(f, "\"{}\"", s.replace('"', "\"\""))?,
                            other => write!(f, "{other}")?,
                        }
                    }
                }
                write!(f, "}}")
            }
            Value::Reference(r) => write!(f, "{r}"),
            Value::Empty => Ok(()),
        }
    }
}

pub(crate) fn bool_text(b: bool) -> &'static str {
    if b {
        "TRUE"
    } else {
        "FALSE"
    }
}

/// Parse numeric text (`"12"`, `" -1.5e3 "`, `"50%"`)
pub fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if !regex_is_match!(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?%?$", s) {
        return None;
    }
    match s.strip_suffix('%') {
        Some(body) => body.parse::<f64>().ok().map(|n| n / 100.0),
        None => s.parse::<f64>().ok(),
    }
}

/// Format a number the way it prints in a cell: shortest round-trip digits,
/// exponent form outside `[1e-6, 1e21)`
pub fn format_number(n: f64) -> String {
    if n == 0.0 {
        return "0".to_string();
    }
    if !n.is_finite() {
        return n.to_string();
    }
    let abs = n.abs();
    if (1e-6..1e21).contains(&abs) {
        return n.to_string();
    }
    let s = format!("{n:e}");
    match s.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
        _ => s,
    }
}

fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Number(_) => 0,
        Value::Text(_) => 1,
        Value::Boolean(_) => 2,
        _ => 3,
    }
}

/// Total order used by comparison operators: numbers < text < booleans,
/// text compares case-insensitively, empty takes the other side's zero value
pub fn compare_values(left: &Value, right: &Value) -> Ordering {
    let left = left.scalar();
    let right = right.scalar();
    match (left, right) {
        (Value::Empty, Value::Empty) => Ordering::Equal,
        (Value::Empty, other) => compare_values(&zero_like(other), other),
        (other, Value::Empty) => compare_values(other, &zero_like(other)),
        (Value::Number(a), Value::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
        (Value::Text(a), Value::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
        (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
        (a, b) => type_rank(a).cmp(&type_rank(b)),
    }
}

fn zero_like(v: &Value) -> Value {
    match v {
        Value::Text(_) => Value::Text(String::new()),
        Value::Boolean(_) => Value::Boolean(false),
        _ => Value::Number(0.0),
    }
}
