//! Reference and lookup functions

use super::{optional, required, Arg};
use crate::ast::{Expr, Reference};
use crate::criteria::wildcard_regex;
use crate::error::{EngineError, FormulaError, FormulaResult};
use crate::evaluator::Evaluator;
use crate::value::{compare_values, Value};
use std::cmp::Ordering;

/// Reference or value of the only argument, `None` when it was left out
fn single_argument(args: &[Expr], ev: &mut Evaluator<'_>) -> Result<Option<Value>, EngineError> {
    match args.first() {
        None | Some(Expr::Omitted) => Ok(None),
        Some(expr) => ev.evaluate(expr).map(Some),
    }
}

fn position_of(
    args: &[Expr],
    ev: &mut Evaluator<'_>,
    pick: fn(&Reference) -> Option<u32>,
    current: fn(&Evaluator<'_>) -> Option<u32>,
) -> Result<Value, EngineError> {
    let index = match single_argument(args, ev)? {
        None => current(ev),
        Some(Value::Reference(r)) => pick(&r),
        Some(Value::Error(e)) => return Ok(Value::Error(e)),
        Some(_) => None,
    };
    Ok(index.map_or(Value::Error(FormulaError::Value), |i| Value::Number(i as f64)))
}

/// ROW function - the row of a reference, or of the formula's own cell
pub fn fn_row(args: &[Expr], ev: &mut Evaluator<'_>) -> Result<Value, EngineError> {
    position_of(
        args,
        ev,
        |r| r.area().map(|a| a.start.row),
        |ev| ev.position().map(|p| p.row),
    )
}

/// COLUMN function - the column of a reference, or of the formula's own cell
pub fn fn_column(args: &[Expr], ev: &mut Evaluator<'_>) -> Result<Value, EngineError> {
    position_of(
        args,
        ev,
        |r| r.area().map(|a| a.start.col),
        |ev| ev.position().map(|p| p.col),
    )
}

fn extent(
    args: &[Expr],
    ev: &mut Evaluator<'_>,
    of_area: fn(&cellcalc_core::CellRange) -> u32,
    of_rows: fn(&[Vec<Value>]) -> usize,
) -> Result<Value, EngineError> {
    let n = match single_argument(args, ev)? {
        None => return Ok(Value::Error(FormulaError::Value)),
        Some(Value::Reference(r @ Reference::Union(_))) => {
            return Ok(Value::Error(if r.area().is_some() {
                FormulaError::Value
            } else {
                FormulaError::Ref
            }))
        }
        Some(Value::Reference(r)) => match r.area() {
            Some(area) => of_area(&area) as usize,
            None => return Ok(Value::Error(FormulaError::Ref)),
        },
        Some(Value::Error(e)) => return Ok(Value::Error(e)),
        Some(Value::Array(rows)) => of_rows(&rows),
        Some(_) => 1,
    };
    Ok(Value::Number(n as f64))
}

/// ROWS function
pub fn fn_rows(args: &[Expr], ev: &mut Evaluator<'_>) -> Result<Value, EngineError> {
    extent(args, ev, |a| a.row_count(), |rows| rows.len())
}

/// COLUMNS function
pub fn fn_columns(args: &[Expr], ev: &mut Evaluator<'_>) -> Result<Value, EngineError> {
    extent(args, ev, |a| a.col_count(), |rows| rows.first().map_or(0, Vec::len))
}

fn index_arg(arg: Option<&Arg>) -> FormulaResult<Option<usize>> {
    match arg {
        None => Ok(None),
        Some(arg) => {
            let n = arg.number()?.trunc();
            if n < 0.0 {
                return Err(FormulaError::Value);
            }
            Ok(Some(n as usize))
        }
    }
}

/// INDEX function
///
/// A zero row (or column) selects the whole column (or row). With a single
/// row of data the second argument picks the column.
pub fn fn_index(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let rows = required(args, 0)?.array();
    let height = rows.len();
    let width = rows.first().map_or(0, Vec::len);

    let first = index_arg(optional(args, 1))?.unwrap_or(0);
    let second = index_arg(optional(args, 2))?;
    let (row, col) = match second {
        Some(col) => (first, col),
        None if height == 1 => (1, first),
        None if width == 1 => (first, 1),
        None => (first, 0),
    };
    if row > height || col > width {
        return Err(FormulaError::Ref);
    }

    match (row, col) {
        (0, 0) => Ok(Value::Array(rows)),
        (0, c) => Ok(Value::Array(rows.iter().map(|r| vec![r[c - 1].clone()]).collect())),
        (r, 0) => Ok(Value::Array(vec![rows[r - 1].clone()])),
        (r, c) => Ok(rows[r - 1][c - 1].clone()),
    }
}

/// Values of a single row or column
fn vector(rows: Vec<Vec<Value>>) -> Option<Vec<Value>> {
    if rows.len() == 1 {
        rows.into_iter().next()
    } else if rows.iter().all(|r| r.len() == 1) {
        Some(rows.into_iter().flatten().collect())
    } else {
        None
    }
}

fn same_kind(a: &Value, b: &Value) -> bool {
    matches!(
        (a, b),
        (Value::Number(_), Value::Number(_))
            | (Value::Text(_), Value::Text(_))
            | (Value::Boolean(_), Value::Boolean(_))
    )
}

/// MATCH function
///
/// Match type 0 is an exact, case-insensitive match (wildcards allowed for
/// text); 1 finds the largest value not above the lookup value and -1 the
/// smallest value not below it, both expecting sorted data.
pub fn fn_match(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let lookup = required(args, 0)?.value.scalar().clone();
    let values = vector(required(args, 1)?.array()).ok_or(FormulaError::NotAvailable)?;
    let match_type = optional(args, 2).map_or(Ok(1.0), Arg::number)?;

    let found = if match_type == 0.0 {
        match &lookup {
            Value::Text(pattern) => {
                let re = wildcard_regex(pattern).map_err(|_| FormulaError::Value)?;
                values
                    .iter()
                    .position(|v| matches!(v, Value::Text(s) if re.is_match(s)))
            }
            _ => values
                .iter()
                .position(|v| same_kind(v, &lookup) && compare_values(v, &lookup) == Ordering::Equal),
        }
    } else {
        let wanted = if match_type > 0.0 {
            Ordering::Greater
        } else {
            Ordering::Less
        };
        let mut best = None;
        for (i, v) in values.iter().enumerate() {
            if !same_kind(v, &lookup) {
                continue;
            }
            if compare_values(v, &lookup) == wanted {
                break;
            }
            best = Some(i);
        }
        best
    };

    found
        .map(|i| Value::Number((i + 1) as f64))
        .ok_or(FormulaError::NotAvailable)
}

/// TRANSPOSE function
pub fn fn_transpose(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let rows = required(args, 0)?.array();
    let width = rows.first().map_or(0, Vec::len);
    let transposed = (0..width)
        .map(|c| rows.iter().map(|r| r[c].clone()).collect())
        .collect();
    Ok(Value::Array(transposed))
}
