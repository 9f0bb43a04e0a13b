//! Logical functions

use super::{required, Arg};
use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::Evaluator;
use crate::value::Value;

/// Truth values of every argument for AND/OR/XOR
///
/// Literal text must read as TRUE/FALSE; text read from cells or arrays is
/// skipped. With nothing left to test the result is `#VALUE!`.
fn truth_values(args: &[Arg]) -> FormulaResult<Vec<bool>> {
    let mut out = Vec::new();
    for arg in args {
        if arg.omitted {
            continue;
        }
        match &arg.value {
            Value::Array(rows) => {
                for value in rows.iter().flatten() {
                    match value {
                        Value::Boolean(b) => out.push(*b),
                        Value::Number(n) => out.push(*n != 0.0),
                        Value::Error(e) => return Err(e.clone()),
                        _ => {}
                    }
                }
            }
            Value::Text(_) if !arg.literal => {}
            Value::Empty => {}
            value => out.push(value.to_bool()?),
        }
    }
    if out.is_empty() {
        return Err(FormulaError::Value);
    }
    Ok(out)
}

/// AND function
pub fn fn_and(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    Ok(Value::Boolean(truth_values(args)?.into_iter().all(|b| b)))
}

/// OR function
pub fn fn_or(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    Ok(Value::Boolean(truth_values(args)?.into_iter().any(|b| b)))
}

/// XOR function - TRUE when an odd number of arguments are TRUE
pub fn fn_xor(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let count = truth_values(args)?.into_iter().filter(|b| *b).count();
    Ok(Value::Boolean(count % 2 == 1))
}

/// NOT function
pub fn fn_not(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    Ok(Value::Boolean(!required(args, 0)?.boolean()?))
}

/// TRUE function
pub fn fn_true(_args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    Ok(Value::Boolean(true))
}

/// FALSE function
pub fn fn_false(_args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    Ok(Value::Boolean(false))
}

/// IF function
///
/// Errors in the branch that isn't taken don't matter; an error condition is
/// returned as-is.
pub fn fn_if(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let condition = required(args, 0)?.value.scalar().to_bool()?;
    if condition {
        Ok(required(args, 1)?.value.clone())
    } else {
        Ok(args
            .get(2)
            .map(|a| a.value.clone())
            .unwrap_or(Value::Boolean(false)))
    }
}

/// IFERROR function
pub fn fn_iferror(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let value = required(args, 0)?;
    if value.value.scalar().is_error() {
        return Ok(required(args, 1)?.value.clone());
    }
    Ok(value.value.clone())
}

/// IFNA function - like IFERROR, but only `#N/A` is caught
pub fn fn_ifna(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let value = required(args, 0)?;
    if value.value.scalar().error() == Some(&FormulaError::NotAvailable) {
        return Ok(required(args, 1)?.value.clone());
    }
    Ok(value.value.clone())
}

#[cfg(test)]
mod tests {
    use crate::test_util::{eval, grid_engine};
    use crate::{FormulaError, Value};
    use pretty_assertions::assert_eq;

    fn t() -> Value {
        Value::text("TRUE")
    }

    fn f() -> Value {
        Value::text("FALSE")
    }

    #[test]
    fn test_and_or_xor() {
        assert_eq!(eval("=AND(TRUE,1,\"true\")"), t());
        assert_eq!(eval("=AND(TRUE,0)"), f());
        assert_eq!(eval("=OR(FALSE,0,{0,1})"), t());
        assert_eq!(eval("=OR(FALSE,0)"), f());
        assert_eq!(eval("=XOR(TRUE,TRUE,TRUE)"), t());
        assert_eq!(eval("=XOR(TRUE,1)"), f());
    }

    #[test]
    fn test_logical_argument_errors() {
        assert_eq!(eval("=AND(\"yes\")"), Value::Error(FormulaError::Value));
        assert_eq!(eval("=OR({\"a\",\"b\"})"), Value::Error(FormulaError::Value));
        assert_eq!(eval("=AND(TRUE,1/0)"), Value::Error(FormulaError::Div0));
    }

    #[test]
    fn test_not_true_false() {
        assert_eq!(eval("=NOT(0)"), t());
        assert_eq!(eval("=NOT(TRUE())"), f());
        assert_eq!(eval("=FALSE()"), f());
        assert_eq!(eval("=NOT(\"abc\")"), Value::Error(FormulaError::Value));
    }

    #[test]
    fn test_if() {
        assert_eq!(eval("=IF(1>0,\"yes\",\"no\")"), Value::text("yes"));
        assert_eq!(eval("=IF(1<0,\"yes\",\"no\")"), Value::text("no"));
        assert_eq!(eval("=IF(1<0,\"yes\")"), f());
        assert_eq!(eval("=IF(FALSE,1,)"), Value::Number(0.0));
        assert_eq!(eval("=IF(TRUE,1,1/0)"), Value::Number(1.0));
        assert_eq!(eval("=IF(1/0,1,2)"), Value::Error(FormulaError::Div0));
        assert_eq!(eval("=IF(\"maybe\",1,2)"), Value::Error(FormulaError::Value));
    }

    #[test]
    fn test_iferror_ifna() {
        assert_eq!(eval("=IFERROR(1/0,\"oops\")"), Value::text("oops"));
        assert_eq!(eval("=IFERROR(7,\"oops\")"), Value::Number(7.0));
        assert_eq!(eval("=IFNA(NA(),\"missing\")"), Value::text("missing"));
        assert_eq!(eval("=IFNA(1/0,\"missing\")"), Value::Error(FormulaError::Div0));
    }

    #[test]
    fn test_logical_over_references() {
        let mut engine = grid_engine(&[
            ("A1", Value::Boolean(true)),
            ("A2", Value::text("note")),
            ("A3", Value::Number(2.0)),
        ]);
        assert_eq!(engine.parse("=AND(A1:A3)", None).unwrap().result, t());
        assert_eq!(engine.parse("=IFERROR(A2*1,-1)", None).unwrap().result, Value::Number(-1.0));
    }
}
