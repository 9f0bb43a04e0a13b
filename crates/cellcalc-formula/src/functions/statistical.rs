//! Statistical functions

use super::{collect_numbers, flatten, Arg};
use crate::ast::Expr;
use crate::criteria::Criteria;
use crate::error::{EngineError, FormulaError, FormulaResult};
use crate::evaluator::Evaluator;
use crate::value::{parse_number, Value};

/// AVERAGE function
pub fn fn_average(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let numbers = collect_numbers(args)?;
    if numbers.is_empty() {
        return Err(FormulaError::Div0);
    }
    Ok(Value::Number(numbers.iter().sum::<f64>() / numbers.len() as f64))
}

/// AVERAGEA function - text counts as 0, TRUE as 1
pub fn fn_averagea(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for (value, literal) in flatten(args) {
        let n = match value {
            Value::Number(n) => *n,
            Value::Boolean(b) => f64::from(u8::from(*b)),
            Value::Text(s) if literal => parse_number(s).ok_or(FormulaError::Value)?,
            Value::Text(_) => 0.0,
            Value::Error(e) => return Err(e.clone()),
            _ => continue,
        };
        sum += n;
        count += 1;
    }
    if count == 0 {
        return Err(FormulaError::Div0);
    }
    Ok(Value::Number(sum / count as f64))
}

/// COUNT function
///
/// A value typed into the call counts if it reads as a number; values from
/// cells or arrays count only if they are numbers.
pub fn fn_count(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let count = flatten(args)
        .into_iter()
        .filter(|(value, literal)| match value {
            Value::Number(_) => true,
            Value::Boolean(_) => *literal,
            Value::Text(s) => *literal && parse_number(s).is_some(),
            _ => false,
        })
        .count();
    Ok(Value::Number(count as f64))
}

/// COUNTA function - everything that isn't blank, errors included
pub fn fn_counta(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let count = args
        .iter()
        .filter(|a| !a.omitted)
        .flat_map(|a| match &a.value {
            Value::Array(rows) => rows.iter().flatten().collect::<Vec<_>>(),
            v if !a.literal && matches!(v, Value::Text(s) if s.is_empty()) => vec![],
            v => vec![v],
        })
        .filter(|v| !v.is_empty())
        .count();
    Ok(Value::Number(count as f64))
}

/// COUNTBLANK function - empty cells and empty text
pub fn fn_countblank(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let count = flatten(args)
        .into_iter()
        .filter(|(value, _)| match value {
            Value::Empty => true,
            Value::Text(s) => s.is_empty(),
            _ => false,
        })
        .count();
    Ok(Value::Number(count as f64))
}

/// COUNTIF function
///
/// The range is read as-is so blank cells stay blank, even when it is a
/// single cell.
pub fn fn_countif(args: &[Expr], ev: &mut Evaluator<'_>) -> Result<Value, EngineError> {
    let [range_expr, criteria_expr] = args else {
        return Ok(Value::Error(FormulaError::Value));
    };

    let range = match ev.evaluate(range_expr)? {
        Value::Error(e) => return Ok(Value::Error(e)),
        value => ev.dereference(value)?.to_rows(),
    };
    let criteria = match ev.evaluate_value(criteria_expr)? {
        Value::Error(e) => return Ok(Value::Error(e)),
        value => Criteria::parse(value.scalar()),
    };

    let count = range
        .iter()
        .flatten()
        .filter(|value| criteria.matches(value))
        .count();
    Ok(Value::Number(count as f64))
}

/// MAX function - 0 when there are no numbers
pub fn fn_max(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let max = collect_numbers(args)?.into_iter().reduce(f64::max);
    Ok(Value::Number(max.unwrap_or(0.0)))
}

/// MIN function - 0 when there are no numbers
pub fn fn_min(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let min = collect_numbers(args)?.into_iter().reduce(f64::min);
    Ok(Value::Number(min.unwrap_or(0.0)))
}
