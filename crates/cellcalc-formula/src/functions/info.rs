//! Information functions
//!
//! These see their argument as-is: blank cells stay blank, errors are
//! delivered instead of short-circuiting, and the reference is kept.

use super::{required, Arg};
use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::Evaluator;
use crate::value::Value;

fn test(args: &[Arg], predicate: fn(&Value) -> bool) -> FormulaResult<Value> {
    let arg = required(args, 0)?;
    Ok(Value::Boolean(predicate(arg.value.scalar())))
}

/// ISBLANK(value)
pub fn fn_isblank(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    test(args, |v| matches!(v, Value::Empty))
}

/// ISERR(value) - any error except #N/A
pub fn fn_iserr(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    test(args, |v| matches!(v, Value::Error(e) if *e != FormulaError::NotAvailable))
}

/// ISERROR(value)
pub fn fn_iserror(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    test(args, Value::is_error)
}

/// ISLOGICAL(value)
pub fn fn_islogical(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    test(args, |v| matches!(v, Value::Boolean(_)))
}

/// ISNA(value)
pub fn fn_isna(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    test(args, |v| matches!(v, Value::Error(FormulaError::NotAvailable)))
}

/// ISNONTEXT(value) - blanks count as non-text
pub fn fn_isnontext(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    test(args, |v| !matches!(v, Value::Text(_)))
}

/// ISNUMBER(value)
pub fn fn_isnumber(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    test(args, |v| matches!(v, Value::Number(_)))
}

/// ISREF(value)
pub fn fn_isref(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let arg = required(args, 0)?;
    Ok(Value::Boolean(arg.reference.is_some()))
}

/// ISTEXT(value)
pub fn fn_istext(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    test(args, |v| matches!(v, Value::Text(_)))
}

/// NA()
pub fn fn_na(_args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    Err(FormulaError::NotAvailable)
}

/// TYPE(value) - 1 number, 2 text, 4 logical, 16 error, 64 array
pub fn fn_type(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let arg = required(args, 0)?;
    let code = match &arg.value {
        Value::Array(rows)
            if arg.reference.is_none() || rows.iter().map(Vec::len).sum::<usize>() > 1 =>
        {
            64.0
        }
        value => match value.scalar() {
            Value::Number(_) | Value::Empty => 1.0,
            Value::Text(_) => 2.0,
            Value::Boolean(_) => 4.0,
            Value::Error(_) => 16.0,
            Value::Array(_) | Value::Reference(_) => 64.0,
        },
    };
    Ok(Value::Number(code))
}

/// ERROR.TYPE(value) - `#N/A` for anything that isn't an error
pub fn fn_error_type(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    match required(args, 0)?.value.scalar() {
        Value::Error(e) => Ok(Value::Number(f64::from(e.type_number()))),
        _ => Err(FormulaError::NotAvailable),
    }
}
