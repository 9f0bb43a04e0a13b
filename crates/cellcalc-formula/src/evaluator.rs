//! Formula evaluator
//!
//! Walks an [`Expr`] tree. References stay unresolved until an operator or a
//! function needs their contents, at which point the cell and range accessors
//! are called. Spreadsheet errors are ordinary values here: a function's
//! `Err(FormulaError)` becomes that call's result and flows upward as data.

use crate::ast::{BinaryOperator, CellRef, Expr, RangeRef, Reference, UnaryOperator};
use crate::error::{AccessError, EngineError, FormulaError};
use crate::functions::{Arg, FunctionDef, FunctionRegistry, Implementation};
use crate::value::{compare_values, Value};
use ahash::AHashMap;
use std::cmp::Ordering;

/// Cell accessor as seen by the evaluator
pub type CellLookup<'a> = dyn Fn(&CellRef) -> Result<Value, AccessError> + 'a;

/// Range accessor as seen by the evaluator; rows of values, top to bottom
pub type RangeLookup<'a> = dyn Fn(&RangeRef) -> Result<Vec<Vec<Value>>, AccessError> + 'a;

/// The cell a formula is evaluated in, 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub row: u32,
    pub col: u32,
}

impl Position {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

/// State for one evaluation
pub struct Evaluator<'a> {
    registry: &'a FunctionRegistry,
    variables: &'a AHashMap<String, Value>,
    on_cell: &'a CellLookup<'a>,
    on_range: &'a RangeLookup<'a>,
    position: Option<Position>,
    /// Names called without a registered function, in call order
    unknown: Vec<String>,
}

impl<'a> Evaluator<'a> {
    pub fn new(
        registry: &'a FunctionRegistry,
        variables: &'a AHashMap<String, Value>,
        on_cell: &'a CellLookup<'a>,
        on_range: &'a RangeLookup<'a>,
        position: Option<Position>,
    ) -> Self {
        Self {
            registry,
            variables,
            on_cell,
            on_range,
            position,
            unknown: Vec::new(),
        }
    }

    pub fn position(&self) -> Option<Position> {
        self.position
    }

    pub fn registry(&self) -> &'a FunctionRegistry {
        self.registry
    }

    /// Unknown function names seen so far, each once
    pub fn take_unknown(&mut self) -> Vec<String> {
        std::mem::take(&mut self.unknown)
    }

    /// Evaluate an expression to its final, scalar result
    ///
    /// A single-cell reference is read, a larger reference or a union is
    /// `#VALUE!`, an array gives its top-left element and a blank gives 0.
    /// Booleans come back as the text `TRUE`/`FALSE`.
    pub fn evaluate_formula(&mut self, expr: &Expr) -> Result<Value, EngineError> {
        let value = match self.evaluate(expr)? {
            Value::Reference(Reference::Cell(cell)) => self.fetch_cell(&cell)?,
            Value::Reference(Reference::Range(range)) if range.range.is_single_cell() => {
                self.fetch_range(&range)?
                    .into_iter()
                    .next()
                    .and_then(|row| row.into_iter().next())
                    .unwrap_or(Value::Empty)
            }
            Value::Reference(_) => Value::Error(FormulaError::Value),
            value => value,
        };
        Ok(normalize(value.scalar().clone()))
    }

    /// Evaluate an expression, leaving references unresolved
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value, EngineError> {
        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Text(s) => Ok(Value::Text(s.clone())),
            Expr::Boolean(b) => Ok(Value::Boolean(*b)),
            Expr::Error(e) => Ok(Value::Error(e.clone())),
            Expr::Omitted => Ok(Value::Empty),

            Expr::Array(rows) => {
                let mut out = Vec::with_capacity(rows.len());
                for row in rows {
                    let mut values = Vec::with_capacity(row.len());
                    for item in row {
                        values.push(self.evaluate_value(item)?.scalar().clone());
                    }
                    out.push(values);
                }
                Ok(Value::Array(out))
            }

            Expr::Cell(cell) => Ok(Value::Reference(Reference::Cell(cell.clone()))),
            Expr::Range(range) => Ok(Value::Reference(Reference::Range(range.clone()))),
            Expr::Union(parts) => {
                let mut refs = Vec::with_capacity(parts.len());
                for part in parts {
                    match self.evaluate(part)? {
                        Value::Reference(Reference::Union(inner)) => refs.extend(inner),
                        Value::Reference(r) => refs.push(r),
                        Value::Error(e) => return Ok(Value::Error(e)),
                        _ => return Ok(Value::Error(FormulaError::Value)),
                    }
                }
                Ok(Value::Reference(Reference::Union(refs)))
            }
            Expr::Name(name) => Ok(self
                .variables
                .get(&name.to_uppercase())
                .cloned()
                .unwrap_or(Value::Error(FormulaError::Name))),

            Expr::Unary { op, operand } => {
                let value = self.evaluate_value(operand)?;
                Ok(match op {
                    UnaryOperator::Plus => value,
                    UnaryOperator::Negate => map_numbers(value, |n| -n),
                })
            }
            Expr::Percent(operand) => {
                let value = self.evaluate_value(operand)?;
                Ok(map_numbers(value, |n| n / 100.0))
            }
            Expr::Binary { op, left, right } => match op {
                BinaryOperator::Range | BinaryOperator::Intersect => {
                    self.reference_operation(*op, left, right)
                }
                op => {
                    let left = self.evaluate_value(left)?;
                    let right = self.evaluate_value(right)?;
                    Ok(broadcast(left, right, |l, r| scalar_operation(*op, l, r)))
                }
            },

            Expr::Call { name, args } => self.call(name, args),
        }
    }

    /// Evaluate an expression and read any reference it produces
    pub fn evaluate_value(&mut self, expr: &Expr) -> Result<Value, EngineError> {
        let value = self.evaluate(expr)?;
        self.dereference(value)
    }

    /// Read a reference value; other values pass through
    ///
    /// A cell gives its value, a range its rows, and a union a single row
    /// holding every area's values in order.
    pub fn dereference(&self, value: Value) -> Result<Value, EngineError> {
        match value {
            Value::Reference(Reference::Cell(cell)) => self.fetch_cell(&cell),
            Value::Reference(Reference::Range(range)) => Ok(Value::Array(self.fetch_range(&range)?)),
            Value::Reference(Reference::Union(parts)) => {
                let mut row = Vec::new();
                for part in parts {
                    match self.dereference(Value::Reference(part))? {
                        Value::Array(rows) => row.extend(rows.into_iter().flatten()),
                        value => row.push(value),
                    }
                }
                Ok(Value::Array(vec![row]))
            }
            other => Ok(other),
        }
    }

    pub fn fetch_cell(&self, cell: &CellRef) -> Result<Value, EngineError> {
        log::trace!("reading cell {cell}");
        (self.on_cell)(cell).map_err(EngineError::Access)
    }

    /// Rows of a range, padded with blanks to a rectangle of at least 1x1
    pub fn fetch_range(&self, range: &RangeRef) -> Result<Vec<Vec<Value>>, EngineError> {
        log::trace!("reading range {range}");
        let mut rows = (self.on_range)(range).map_err(EngineError::Access)?;
        let width = rows.iter().map(Vec::len).max().unwrap_or(0).max(1);
        if rows.is_empty() {
            rows.push(Vec::new());
        }
        for row in &mut rows {
            row.resize(width, Value::Empty);
        }
        Ok(rows)
    }

    fn reference_operation(
        &mut self,
        op: BinaryOperator,
        left: &Expr,
        right: &Expr,
    ) -> Result<Value, EngineError> {
        let (left, right) = match (self.evaluate(left)?, self.evaluate(right)?) {
            (Value::Error(e), _) | (_, Value::Error(e)) => return Ok(Value::Error(e)),
            (Value::Reference(l), Value::Reference(r)) => (l, r),
            _ => return Ok(Value::Error(FormulaError::Value)),
        };
        let (Some(l_area), Some(r_area)) = (left.area(), right.area()) else {
            return Ok(Value::Error(FormulaError::Value));
        };
        let sheet = match (left.sheet(), right.sheet()) {
            (Some(a), Some(b)) if !a.eq_ignore_ascii_case(b) => {
                return Ok(Value::Error(FormulaError::Ref))
            }
            (a, b) => a.or(b).map(str::to_string),
        };

        let area = match op {
            BinaryOperator::Intersect => match l_area.intersect(&r_area) {
                Some(area) => area,
                None => return Ok(Value::Error(FormulaError::Null)),
            },
            _ => l_area.union_bounds(&r_area),
        };
        let reference = if area.is_single_cell() {
            Reference::Cell(CellRef {
                sheet,
                address: area.start,
            })
        } else {
            Reference::Range(RangeRef { sheet, range: area })
        };
        Ok(Value::Reference(reference))
    }

    fn call(&mut self, name: &str, args: &[Expr]) -> Result<Value, EngineError> {
        let registry = self.registry;
        let Some(def) = registry.get(name) else {
            let name = name.to_uppercase();
            if !self.unknown.contains(&name) {
                self.unknown.push(name);
            }
            return Ok(Value::Number(0.0));
        };
        if !def.accepts_arg_count(args.len()) {
            return Ok(Value::Error(FormulaError::Value));
        }

        let result = match &def.implementation {
            Implementation::Context(f) => match f(args, self) {
                Ok(value) => value,
                Err(EngineError::Formula(e)) => Value::Error(e),
                Err(e) => return Err(e),
            },
            Implementation::Values(f) => {
                let args = self.resolve_args(def, args)?;
                match first_error(def, &args) {
                    Some(e) => Value::Error(e),
                    None => f(&args, self).unwrap_or_else(Value::Error),
                }
            }
            Implementation::Custom(f) => {
                let args = self.resolve_args(def, args)?;
                match first_error(def, &args) {
                    Some(e) => Value::Error(e),
                    None => f(&args, self).unwrap_or_else(Value::Error),
                }
            }
        };

        Ok(match result {
            Value::Number(n) if !n.is_finite() => Value::Error(FormulaError::Num),
            value => value,
        })
    }

    /// Evaluate call arguments, applying the callee's null value to omitted
    /// arguments and to single blank cells
    fn resolve_args(&mut self, def: &FunctionDef, args: &[Expr]) -> Result<Vec<Arg>, EngineError> {
        let mut out = Vec::with_capacity(args.len());
        for expr in args {
            if let Expr::Omitted = expr {
                out.push(Arg::omitted(def.null_value()));
                continue;
            }
            let arg = match self.evaluate(expr)? {
                Value::Reference(reference) => {
                    let value = match self.dereference(Value::Reference(reference.clone()))? {
                        Value::Empty if !def.preserves_reference() => def.null_value(),
                        value => value,
                    };
                    Arg {
                        value,
                        reference: def.preserves_reference().then_some(reference),
                        omitted: false,
                        literal: false,
                    }
                }
                value => Arg::new(value),
            };
            out.push(arg);
        }
        Ok(out)
    }
}

impl std::fmt::Debug for Evaluator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evaluator")
            .field("position", &self.position)
            .field("variables", &self.variables.len())
            .field("unknown", &self.unknown)
            .finish()
    }
}

/// The error a call short-circuits on, if the callee doesn't take errors
fn first_error(def: &FunctionDef, args: &[Arg]) -> Option<FormulaError> {
    if def.accepts_errors {
        return None;
    }
    args.iter().find_map(|a| a.value.error().cloned())
}

/// Final shape of a formula result
fn normalize(value: Value) -> Value {
    match value {
        Value::Number(n) if n.is_nan() => Value::Error(FormulaError::Value),
        Value::Number(n) if n.is_infinite() => Value::Error(FormulaError::Num),
        Value::Number(n) if n == 0.0 => Value::Number(0.0),
        Value::Boolean(b) => Value::text(crate::value::bool_text(b)),
        Value::Empty => Value::Number(0.0),
        value => value,
    }
}

/// Apply a numeric function to a value or to every element of an array
fn map_numbers(value: Value, f: impl Fn(f64) -> f64 + Copy) -> Value {
    match value {
        Value::Array(rows) => Value::Array(
            rows.into_iter()
                .map(|row| row.into_iter().map(|v| map_numbers(v, f)).collect())
                .collect(),
        ),
        value => match value.to_number() {
            Ok(n) => Value::Number(f(n)),
            Err(e) => Value::Error(e),
        },
    }
}

/// Element of `rows` at (i, j), repeating a single row or column
fn element(rows: &[Vec<Value>], i: usize, j: usize) -> Value {
    let i = if rows.len() == 1 { 0 } else { i };
    rows.get(i)
        .and_then(|row| row.get(if row.len() == 1 { 0 } else { j }))
        .cloned()
        .unwrap_or(Value::Error(FormulaError::NotAvailable))
}

/// Apply a scalar operation element-wise; mismatched sizes give `#N/A` cells
fn broadcast(left: Value, right: Value, f: impl Fn(&Value, &Value) -> Value) -> Value {
    match (&left, &right) {
        (Value::Array(l), Value::Array(r)) => {
            let height = l.len().max(r.len());
            let width = l
                .iter()
                .chain(r.iter())
                .map(Vec::len)
                .max()
                .unwrap_or(0);
            Value::Array(
                (0..height)
                    .map(|i| (0..width).map(|j| f(&element(l, i, j), &element(r, i, j))).collect())
                    .collect(),
            )
        }
        (Value::Array(l), r) => Value::Array(
            l.iter()
                .map(|row| row.iter().map(|v| f(v, r)).collect())
                .collect(),
        ),
        (l, Value::Array(r)) => Value::Array(
            r.iter()
                .map(|row| row.iter().map(|v| f(l, v)).collect())
                .collect(),
        ),
        (l, r) => f(l, r),
    }
}

fn scalar_operation(op: BinaryOperator, left: &Value, right: &Value) -> Value {
    if let Value::Error(e) = left {
        return Value::Error(e.clone());
    }
    if let Value::Error(e) = right {
        return Value::Error(e.clone());
    }

    if op.is_comparison() {
        let ordering = compare_values(left, right);
        let result = match op {
            BinaryOperator::Equal => ordering == Ordering::Equal,
            BinaryOperator::NotEqual => ordering != Ordering::Equal,
            BinaryOperator::LessThan => ordering == Ordering::Less,
            BinaryOperator::LessEqual => ordering != Ordering::Greater,
            BinaryOperator::GreaterThan => ordering == Ordering::Greater,
            _ => ordering != Ordering::Less,
        };
        return Value::Boolean(result);
    }

    if op == BinaryOperator::Concat {
        return match (left.to_text(), right.to_text()) {
            (Ok(l), Ok(r)) => Value::Text(l + &r),
            (Err(e), _) | (_, Err(e)) => Value::Error(e),
        };
    }

    let (a, b) = match (left.to_number(), right.to_number()) {
        (Ok(a), Ok(b)) => (a, b),
        (Err(e), _) | (_, Err(e)) => return Value::Error(e),
    };
    let result = match op {
        BinaryOperator::Add => a + b,
        BinaryOperator::Subtract => a - b,
        BinaryOperator::Multiply => a * b,
        BinaryOperator::Divide if b == 0.0 => return Value::Error(FormulaError::Div0),
        BinaryOperator::Divide => a / b,
        BinaryOperator::Power if a == 0.0 && b == 0.0 => return Value::Error(FormulaError::Num),
        BinaryOperator::Power if a == 0.0 && b < 0.0 => return Value::Error(FormulaError::Div0),
        BinaryOperator::Power => a.powf(b),
        _ => return Value::Error(FormulaError::Value),
    };
    if result.is_finite() {
        Value::Number(result)
    } else {
        Value::Error(FormulaError::Num)
    }
}
