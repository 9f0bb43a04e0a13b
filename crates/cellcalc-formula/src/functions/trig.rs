//! Trigonometric functions

use super::{required, Arg};
use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::Evaluator;
use crate::value::Value;

fn unary(args: &[Arg], f: fn(f64) -> f64) -> FormulaResult<Value> {
    Ok(Value::Number(f(required(args, 0)?.number()?)))
}

/// SIN function
pub fn fn_sin(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    unary(args, f64::sin)
}

/// COS function
pub fn fn_cos(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    unary(args, f64::cos)
}

/// TAN function
pub fn fn_tan(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    unary(args, f64::tan)
}

/// ASIN function
pub fn fn_asin(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let n = required(args, 0)?.number()?;
    if !(-1.0..=1.0).contains(&n) {
        return Err(FormulaError::Num);
    }
    Ok(Value::Number(n.asin()))
}

/// ACOS function
pub fn fn_acos(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let n = required(args, 0)?.number()?;
    if !(-1.0..=1.0).contains(&n) {
        return Err(FormulaError::Num);
    }
    Ok(Value::Number(n.acos()))
}

/// ATAN function
pub fn fn_atan(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    unary(args, f64::atan)
}

/// ATAN2(x, y) function - note the x-first argument order
pub fn fn_atan2(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let x = required(args, 0)?.number()?;
    let y = required(args, 1)?.number()?;
    if x == 0.0 && y == 0.0 {
        return Err(FormulaError::Div0);
    }
    Ok(Value::Number(y.atan2(x)))
}

/// SINH function
pub fn fn_sinh(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    unary(args, f64::sinh)
}

/// COSH function
pub fn fn_cosh(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    unary(args, f64::cosh)
}

/// TANH function
pub fn fn_tanh(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    unary(args, f64::tanh)
}

#[cfg(test)]
mod tests {
    use crate::test_util::{assert_approx, eval, eval_num};
    use crate::{FormulaError, Value};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_basic_trig() {
        assert_approx(eval_num("=SIN(PI()/2)"), 1.0);
        assert_approx(eval_num("=COS(0)"), 1.0);
        assert_approx(eval_num("=TAN(PI()/4)"), 1.0);
        assert_approx(eval_num("=ASIN(1)"), std::f64::consts::FRAC_PI_2);
        assert_approx(eval_num("=ACOS(-1)"), std::f64::consts::PI);
        assert_approx(eval_num("=ATAN(1)"), std::f64::consts::FRAC_PI_4);
    }

    #[test]
    fn test_inverse_domain() {
        assert_eq!(eval("=ASIN(2)"), Value::Error(FormulaError::Num));
        assert_eq!(eval("=ACOS(-1.5)"), Value::Error(FormulaError::Num));
    }

    #[test]
    fn test_atan2() {
        assert_approx(eval_num("=ATAN2(1,1)"), std::f64::consts::FRAC_PI_4);
        assert_approx(eval_num("=ATAN2(-1,0.5)"), 0.5f64.atan2(-1.0));
        assert_eq!(eval("=ATAN2(0,0)"), Value::Error(FormulaError::Div0));
    }

    #[test]
    fn test_hyperbolic() {
        assert_approx(eval_num("=SINH(0)"), 0.0);
        assert_approx(eval_num("=COSH(0)"), 1.0);
        assert_approx(eval_num("=TANH(100)"), 1.0);
    }

    #[test]
    fn test_boolean_and_text_arguments() {
        assert_approx(eval_num("=COS(FALSE)"), 1.0);
        assert_approx(eval_num("=SIN(\"0\")"), 0.0);
        assert_eq!(eval("=SIN(\"zero\")"), Value::Error(FormulaError::Value));
    }
}
