//! Math functions

use super::{collect_numbers, number_or, required, Arg, FactorialTable};
use crate::ast::{Expr, RangeRef, Reference};
use crate::criteria::Criteria;
use crate::error::{EngineError, FormulaError, FormulaResult};
use crate::evaluator::Evaluator;
use crate::value::{parse_number, Value};
use cellcalc_core::{CellAddress, CellRange, MAX_COLS, MAX_ROWS};
use lazy_regex::regex;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

/// Inputs outside this band are rejected by the rounding-to-multiple functions
const MAX_MAGNITUDE: f64 = 9.99e307;

/// Longest zero-padded BASE result
const MAX_BASE_LENGTH: f64 = 255.0;

/// 2^53 - 2, the largest GCD/LCM operand
const MAX_GCD_OPERAND: f64 = 9_007_199_254_740_990.0;

fn num(args: &[Arg], index: usize) -> FormulaResult<f64> {
    required(args, index)?.number()
}

/// ABS function
pub fn fn_abs(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    Ok(Value::Number(num(args, 0)?.abs()))
}

/// ARABIC function - Roman numeral to number
pub fn fn_arabic(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let text = required(args, 0)?.text()?.to_uppercase();
    if !regex!(r"^M*(?:D?C{0,3}|C[MD])(?:L?X{0,3}|X[CL])(?:V?I{0,3}|I[XV])$").is_match(&text) {
        return Err(FormulaError::Value);
    }
    let total: u32 = regex!(r"[MDLV]|C[MD]?|X[CL]?|I[XV]?")
        .find_iter(&text)
        .map(|m| match m.as_str() {
            "M" => 1000,
            "CM" => 900,
            "D" => 500,
            "CD" => 400,
            "C" => 100,
            "XC" => 90,
            "L" => 50,
            "XL" => 40,
            "X" => 10,
            "IX" => 9,
            "V" => 5,
            "IV" => 4,
            _ => 1,
        })
        .sum();
    Ok(Value::Number(total as f64))
}

/// Digits of a non-negative integer in the given radix, upper case
pub(crate) fn to_radix(mut n: u64, radix: u32) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        let d = (n % radix as u64) as u32;
        digits.push(std::char::from_digit(d, radix).unwrap_or('0').to_ascii_uppercase());
        n /= radix as u64;
    }
    digits.iter().rev().collect()
}

/// BASE function
pub fn fn_base(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let number = num(args, 0)?.trunc();
    if !(0.0..=2f64.powi(53)).contains(&number) {
        return Err(FormulaError::Num);
    }
    let radix = num(args, 1)?.trunc();
    if !(2.0..=36.0).contains(&radix) {
        return Err(FormulaError::Num);
    }
    let min_length = number_or(args, 2, 0.0)?.trunc();
    if !(0.0..=MAX_BASE_LENGTH).contains(&min_length) {
        return Err(FormulaError::Num);
    }

    let digits = to_radix(number as u64, radix as u32);
    let pad = (min_length as usize).saturating_sub(digits.len());
    Ok(Value::Text(format!("{}{}", "0".repeat(pad), digits)))
}

fn check_magnitude(number: f64) -> FormulaResult<()> {
    if number >= MAX_MAGNITUDE {
        return Err(FormulaError::Num);
    }
    Ok(())
}

/// Round up to a multiple of `significance`; negative numbers round toward
/// zero unless the significance is negative too
pub(crate) fn ceiling(number: f64, significance: f64) -> FormulaResult<f64> {
    check_magnitude(number)?;
    if significance == 0.0 {
        return Ok(0.0);
    }
    if (number / significance) % 1.0 == 0.0 {
        return Ok(number);
    }
    let abs_significance = significance.abs();
    let times = (number.abs() / abs_significance).floor();
    if number < 0.0 {
        if significance < 0.0 {
            Ok(-abs_significance * (times + 1.0))
        } else {
            Ok(-abs_significance * times)
        }
    } else {
        Ok((times + 1.0) * abs_significance)
    }
}

/// Round down to a multiple of `significance`; a positive number with a
/// negative significance is `#NUM!`
pub(crate) fn floor(number: f64, significance: f64) -> FormulaResult<f64> {
    check_magnitude(number)?;
    if significance == 0.0 {
        return Ok(0.0);
    }
    if number > 0.0 && significance < 0.0 {
        return Err(FormulaError::Num);
    }
    if (number / significance) % 1.0 == 0.0 {
        return Ok(number);
    }
    let abs_significance = significance.abs();
    let times = (number.abs() / abs_significance).floor();
    if number < 0.0 {
        if significance < 0.0 {
            Ok(-abs_significance * times)
        } else {
            Ok(-abs_significance * (times + 1.0))
        }
    } else {
        Ok(times * abs_significance)
    }
}

/// CEILING function
pub fn fn_ceiling(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    Ok(Value::Number(ceiling(num(args, 0)?, num(args, 1)?)?))
}

/// CEILING.MATH function
///
/// Mode only matters for negative numbers: non-zero rounds away from zero.
pub fn fn_ceiling_math(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let number = num(args, 0)?;
    check_magnitude(number)?;
    let significance = number_or(args, 1, if number > 0.0 { 1.0 } else { -1.0 })?;
    let mode = number_or(args, 2, 0.0)?;
    if number >= 0.0 {
        return Ok(Value::Number(ceiling(number, significance)?));
    }
    let offset = if mode != 0.0 { significance } else { 0.0 };
    Ok(Value::Number(ceiling(number, significance)? - offset))
}

/// CEILING.PRECISE / ISO.CEILING function
pub fn fn_ceiling_precise(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let number = num(args, 0)?;
    let significance = number_or(args, 1, 1.0)?;
    Ok(Value::Number(ceiling(number, significance.abs())?))
}

/// Binomial coefficient, exact for results below 2^53
fn binomial(n: f64, k: f64) -> f64 {
    let k = k.min(n - k);
    let mut result = 1.0;
    let mut i = 1.0;
    while i <= k {
        result = result * (n - k + i) / i;
        i += 1.0;
    }
    result.round()
}

/// COMBIN function
pub fn fn_combin(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let n = num(args, 0)?.trunc();
    let k = num(args, 1)?.trunc();
    if n < 0.0 || k < 0.0 || n < k {
        return Err(FormulaError::Num);
    }
    Ok(Value::Number(binomial(n, k)))
}

/// COMBINA function - combinations with repetition
pub fn fn_combina(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let n = num(args, 0)?.trunc();
    let k = num(args, 1)?.trunc();
    if (n == 0.0 || n == 1.0) && k == 0.0 {
        return Ok(Value::Number(1.0));
    }
    if n < 0.0 || k < 0.0 {
        return Err(FormulaError::Num);
    }
    let total = n + k - 1.0;
    let chosen = n - 1.0;
    if chosen < 0.0 || total < chosen {
        return Err(FormulaError::Num);
    }
    Ok(Value::Number(binomial(total, chosen)))
}

/// DECIMAL function - text in the given radix to number
pub fn fn_decimal(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let text = required(args, 0)?.text()?;
    let radix = num(args, 1)?.trunc();
    if !(2.0..=36.0).contains(&radix) {
        return Err(FormulaError::Num);
    }
    let text = text.trim();
    if text.is_empty() {
        return Err(FormulaError::Num);
    }
    let mut result = 0.0;
    for c in text.chars() {
        let digit = c.to_digit(radix as u32).ok_or(FormulaError::Num)?;
        result = result * radix + digit as f64;
    }
    Ok(Value::Number(result))
}

/// DEGREES function
pub fn fn_degrees(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    Ok(Value::Number(num(args, 0)?.to_degrees()))
}

/// EVEN function
pub fn fn_even(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    Ok(Value::Number(ceiling(num(args, 0)?, -2.0)?))
}

/// EXP function
pub fn fn_exp(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    Ok(Value::Number(num(args, 0)?.exp()))
}

/// FACT function
pub fn fn_fact(args: &[Arg], ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let n = num(args, 0)?;
    if !(0.0..=FactorialTable::MAX_FACT as f64).contains(&n) {
        return Err(FormulaError::Num);
    }
    let table = ev.registry().factorials();
    table
        .factorial(n.trunc() as usize)
        .map(Value::Number)
        .ok_or(FormulaError::Num)
}

/// FACTDOUBLE function
pub fn fn_factdouble(args: &[Arg], ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let n = num(args, 0)?;
    if n < -1.0 {
        return Err(FormulaError::Num);
    }
    if n < 0.0 {
        return Ok(Value::Number(1.0));
    }
    if n > FactorialTable::MAX_FACTDOUBLE as f64 {
        return Err(FormulaError::Num);
    }
    let table = ev.registry().factorials();
    table
        .double_factorial(n.trunc() as usize)
        .map(Value::Number)
        .ok_or(FormulaError::Num)
}

/// FLOOR function
pub fn fn_floor(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    Ok(Value::Number(floor(num(args, 0)?, num(args, 1)?)?))
}

/// FLOOR.MATH function
///
/// Mode only matters for negative numbers: non-zero rounds toward zero.
pub fn fn_floor_math(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let number = num(args, 0)?;
    check_magnitude(number)?;
    let significance = number_or(args, 1, if number > 0.0 { 1.0 } else { -1.0 })?;
    let mode = number_or(args, 2, 0.0)?;
    if mode == 0.0 || number >= 0.0 {
        return Ok(Value::Number(floor(number, significance.abs())?));
    }
    Ok(Value::Number(floor(number, significance)? + significance))
}

/// FLOOR.PRECISE function
pub fn fn_floor_precise(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let number = num(args, 0)?;
    let significance = number_or(args, 1, 1.0)?;
    Ok(Value::Number(floor(number, significance.abs())?))
}

/// Integer operands for GCD/LCM; `blank` stands in for omitted arguments and
/// empty cells
fn integer_operands(args: &[Arg], blank: f64) -> FormulaResult<Vec<u64>> {
    let mut out = Vec::new();
    for arg in args {
        if arg.omitted {
            out.push(blank as u64);
            continue;
        }
        let values: Vec<&Value> = match &arg.value {
            Value::Array(rows) => rows.iter().flatten().collect(),
            v => vec![v],
        };
        for value in values {
            let n = match value {
                Value::Number(n) => *n,
                Value::Empty => blank,
                Value::Text(s) if s.is_empty() => blank,
                Value::Text(s) => parse_number(s).ok_or(FormulaError::Value)?,
                Value::Error(e) => return Err(e.clone()),
                _ => return Err(FormulaError::Value),
            };
            if !(0.0..=MAX_GCD_OPERAND).contains(&n) {
                return Err(FormulaError::Num);
            }
            out.push(n.trunc() as u64);
        }
    }
    Ok(out)
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// GCD function
pub fn fn_gcd(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let operands = integer_operands(args, 0.0)?;
    let result = operands.into_iter().fold(0, gcd);
    Ok(Value::Number(result as f64))
}

/// LCM function
pub fn fn_lcm(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let operands = integer_operands(args, 1.0)?;
    let mut result: f64 = 1.0;
    for n in operands {
        if n == 0 {
            return Ok(Value::Number(0.0));
        }
        let r = result as u64;
        result = (r / gcd(r, n)) as f64 * n as f64;
    }
    Ok(Value::Number(result))
}

/// INT function
pub fn fn_int(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    Ok(Value::Number(num(args, 0)?.floor()))
}

/// LN function
pub fn fn_ln(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let n = num(args, 0)?;
    if n <= 0.0 {
        return Err(FormulaError::Num);
    }
    Ok(Value::Number(n.ln()))
}

/// LOG function
pub fn fn_log(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let n = num(args, 0)?;
    let base = number_or(args, 1, 10.0)?;
    if n <= 0.0 || base <= 0.0 {
        return Err(FormulaError::Num);
    }
    if base == 1.0 {
        return Err(FormulaError::Div0);
    }
    Ok(Value::Number(n.ln() / base.ln()))
}

/// LOG10 function
pub fn fn_log10(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let n = num(args, 0)?;
    if n <= 0.0 {
        return Err(FormulaError::Num);
    }
    Ok(Value::Number(n.log10()))
}

/// MDETERM function
///
/// Gaussian elimination with partial pivoting.
pub fn fn_mdeterm(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let mut m = numeric_matrix(required(args, 0)?)?;
    let n = m.len();
    if m.iter().any(|r| r.len() != n) {
        return Err(FormulaError::Value);
    }

    let mut det = 1.0;
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&a, &b| m[a][col].abs().total_cmp(&m[b][col].abs()))
            .unwrap_or(col);
        if m[pivot][col] == 0.0 {
            return Ok(Value::Number(0.0));
        }
        if pivot != col {
            m.swap(pivot, col);
            det = -det;
        }
        det *= m[col][col];
        for row in col + 1..n {
            let factor = m[row][col] / m[col][col];
            for k in col..n {
                m[row][k] -= factor * m[col][k];
            }
        }
    }
    Ok(Value::Number(det))
}

/// Rows of a non-empty, all-numeric array argument
fn numeric_matrix(arg: &Arg) -> FormulaResult<Vec<Vec<f64>>> {
    let rows = arg.array();
    if rows.is_empty() || rows[0].is_empty() {
        return Err(FormulaError::Value);
    }
    rows.iter()
        .map(|row| {
            row.iter()
                .map(|v| match v {
                    Value::Number(x) => Ok(*x),
                    Value::Error(e) => Err(e.clone()),
                    _ => Err(FormulaError::Value),
                })
                .collect()
        })
        .collect()
}

/// MMULT function
///
/// The column count of the first array must equal the row count of the second.
pub fn fn_mmult(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let a = numeric_matrix(required(args, 0)?)?;
    let b = numeric_matrix(required(args, 1)?)?;
    let inner = a[0].len();
    if b.len() != inner {
        return Err(FormulaError::Value);
    }
    let width = b[0].len();

    let product = a
        .iter()
        .map(|row| {
            (0..width)
                .map(|j| Value::Number(row.iter().zip(&b).map(|(x, b_row)| x * b_row[j]).sum()))
                .collect()
        })
        .collect();
    Ok(Value::Array(product))
}

/// MOD function
///
/// Result takes the sign of the divisor.
pub fn fn_mod(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let n = num(args, 0)?;
    let d = num(args, 1)?;
    if d == 0.0 {
        return Err(FormulaError::Div0);
    }
    Ok(Value::Number(n - d * (n / d).floor()))
}

/// PI function
pub fn fn_pi(_args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    Ok(Value::Number(std::f64::consts::PI))
}

/// POWER function
pub fn fn_power(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let base = num(args, 0)?;
    let exponent = num(args, 1)?;
    if base == 0.0 && exponent < 0.0 {
        return Err(FormulaError::Div0);
    }
    Ok(Value::Number(base.powf(exponent)))
}

/// PRODUCT function
pub fn fn_product(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let numbers = collect_numbers(args)?;
    if numbers.is_empty() {
        return Ok(Value::Number(0.0));
    }
    Ok(Value::Number(numbers.iter().product()))
}

/// RADIANS function
pub fn fn_radians(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    Ok(Value::Number(num(args, 0)?.to_radians()))
}

/// Round in decimal so that 2.675 rounds like it reads
fn round_decimal(number: f64, digits: f64, strategy: RoundingStrategy) -> FormulaResult<f64> {
    let digits = digits.trunc().clamp(-400.0, 400.0) as i32;
    let Some(d) = Decimal::from_f64(number) else {
        // Beyond decimal range every such value is already an integer
        if digits >= 0 {
            return Ok(number);
        }
        let scale = 10f64.powi(-digits);
        let scaled = number / scale;
        let rounded = match strategy {
            RoundingStrategy::ToZero => scaled.trunc(),
            RoundingStrategy::AwayFromZero => scaled.abs().ceil().copysign(scaled),
            _ => scaled.round(),
        };
        return Ok(rounded * scale);
    };

    let rounded = if digits >= 0 {
        d.round_dp_with_strategy(digits.min(28) as u32, strategy)
    } else if -digits > 28 {
        return match strategy {
            RoundingStrategy::AwayFromZero if number != 0.0 => Err(FormulaError::Num),
            _ => Ok(0.0),
        };
    } else {
        let scale = Decimal::from_i128(10i128.pow((-digits) as u32)).ok_or(FormulaError::Num)?;
        let scaled = d.checked_div(scale).ok_or(FormulaError::Num)?;
        scaled
            .round_dp_with_strategy(0, strategy)
            .checked_mul(scale)
            .ok_or(FormulaError::Num)?
    };
    rounded.to_f64().ok_or(FormulaError::Num)
}

/// ROUND function
pub fn fn_round(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let value = round_decimal(num(args, 0)?, num(args, 1)?, RoundingStrategy::MidpointAwayFromZero)?;
    Ok(Value::Number(value))
}

/// ROUNDDOWN function - toward zero
pub fn fn_rounddown(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let value = round_decimal(num(args, 0)?, num(args, 1)?, RoundingStrategy::ToZero)?;
    Ok(Value::Number(value))
}

/// ROUNDUP function - away from zero
pub fn fn_roundup(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let value = round_decimal(num(args, 0)?, num(args, 1)?, RoundingStrategy::AwayFromZero)?;
    Ok(Value::Number(value))
}

/// SIGN function
pub fn fn_sign(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let n = num(args, 0)?;
    let sign = if n > 0.0 {
        1.0
    } else if n < 0.0 {
        -1.0
    } else {
        0.0
    };
    Ok(Value::Number(sign))
}

/// SQRT function
pub fn fn_sqrt(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let n = num(args, 0)?;
    if n < 0.0 {
        return Err(FormulaError::Num);
    }
    Ok(Value::Number(n.sqrt()))
}

/// SUM function
///
/// Literal text and booleans are coerced; the same values read from cells are
/// ignored.
pub fn fn_sum(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    Ok(Value::Number(collect_numbers(args)?.iter().sum()))
}

/// SUMPRODUCT function
pub fn fn_sumproduct(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let arrays: Vec<Vec<Vec<Value>>> = args.iter().map(Arg::array).collect();
    let Some(first) = arrays.first() else {
        return Err(FormulaError::Value);
    };
    let height = first.len();
    let width = first.first().map_or(0, Vec::len);
    if arrays
        .iter()
        .any(|a| a.len() != height || a.iter().any(|r| r.len() != width))
    {
        return Err(FormulaError::Value);
    }

    let mut total = 0.0;
    for i in 0..height {
        for j in 0..width {
            let mut product = 1.0;
            for array in &arrays {
                product *= match &array[i][j] {
                    Value::Number(n) => *n,
                    Value::Error(e) => return Err(e.clone()),
                    _ => 0.0,
                };
            }
            total += product;
        }
    }
    Ok(Value::Number(total))
}

/// Area of `rows` x `cols` anchored at the top-left of `reference`
fn anchored_area(reference: &Reference, rows: u32, cols: u32) -> Option<RangeRef> {
    let start = reference.area()?.start;
    let end_row = (start.row + rows.saturating_sub(1)).min(MAX_ROWS);
    let end_col = (start.col + cols.saturating_sub(1)).min(MAX_COLS);
    Some(RangeRef {
        sheet: reference.sheet().map(str::to_string),
        range: CellRange::new(start, CellAddress::new(end_row, end_col)),
    })
}

/// SUMIF function
///
/// The sum range is resized to the shape of the criteria range, anchored at
/// its own top-left cell. Only numeric cells of the sum range contribute.
pub fn fn_sumif(args: &[Expr], ev: &mut Evaluator<'_>) -> Result<Value, EngineError> {
    let [range_expr, criteria_expr, rest @ ..] = args else {
        return Ok(Value::Error(FormulaError::Value));
    };

    let range_value = ev.evaluate(range_expr)?;
    let range_area = match &range_value {
        Value::Reference(r) => r.area(),
        _ => None,
    };
    let range = ev.dereference(range_value)?.to_rows();

    let criteria_value = ev.evaluate_value(criteria_expr)?;
    let criteria = Criteria::parse(criteria_value.scalar());

    let sum_range = match rest.first() {
        None | Some(Expr::Omitted) => range.clone(),
        Some(expr) => {
            let value = ev.evaluate(expr)?;
            match (&value, range_area) {
                (Value::Reference(r), Some(area)) => {
                    match anchored_area(r, area.row_count(), area.col_count()) {
                        Some(resized) => ev.fetch_range(&resized)?,
                        None => ev.dereference(value)?.to_rows(),
                    }
                }
                _ => ev.dereference(value)?.to_rows(),
            }
        }
    };

    let mut sum = 0.0;
    for (i, row) in range.iter().enumerate() {
        for (j, cell) in row.iter().enumerate() {
            let Some(Value::Number(n)) = sum_range.get(i).and_then(|r| r.get(j)) else {
                continue;
            };
            if criteria.matches(cell) {
                sum += n;
            }
        }
    }
    Ok(Value::Number(sum))
}

/// AGGREGATE function
pub fn fn_aggregate(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    num(args, 0)?;
    Err(FormulaError::NotImplemented("AGGREGATE".into()))
}

#[cfg(test)]
mod tests {
    use crate::test_util::{assert_approx, eval, eval_num, grid_engine};
    use crate::value::Value;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sum() {
        assert_eq!(eval_num("=SUM(1,2,3)"), 6.0);
        assert_eq!(eval_num("=SUM({1,2;3,4})"), 10.0);
        assert_eq!(eval_num("=SUM(\"2\",TRUE)"), 3.0);
        assert_eq!(eval("=SUM(\"x\")"), Value::Error(crate::FormulaError::Value));
    }

    #[test]
    fn test_sum_skips_text_in_references() {
        let mut engine = grid_engine(&[("A1", Value::Number(1.0)), ("A2", Value::text("5")), ("A3", Value::Boolean(true))]);
        let out = engine.parse("=SUM(A1:A3)", None).unwrap();
        assert_eq!(out.result, Value::Number(1.0));
    }

    #[test]
    fn test_abs_sign_int() {
        assert_eq!(eval_num("=ABS(-3.5)"), 3.5);
        assert_eq!(eval_num("=SIGN(-2)"), -1.0);
        assert_eq!(eval_num("=INT(-1.5)"), -2.0);
    }

    #[test]
    fn test_arabic_and_base() {
        assert_eq!(eval_num("=ARABIC(\"MCMXCIV\")"), 1994.0);
        assert_eq!(eval("=ARABIC(\"IIII\")"), Value::Error(crate::FormulaError::Value));
        assert_eq!(eval("=BASE(255,16)"), Value::text("FF"));
        assert_eq!(eval("=BASE(7,2,6)"), Value::text("000111"));
        assert_eq!(eval("=BASE(7,1)"), Value::Error(crate::FormulaError::Num));
        assert_eq!(eval_num("=LEN(BASE(1,2,255))"), 255.0);
        assert_eq!(eval("=BASE(1,2,256)"), Value::Error(crate::FormulaError::Num));
        assert_eq!(eval("=BASE(1,2,1e300)"), Value::Error(crate::FormulaError::Num));
        assert_eq!(eval("=BASE(1,2,-1)"), Value::Error(crate::FormulaError::Num));
        assert_eq!(eval_num("=DECIMAL(\"FF\",16)"), 255.0);
        assert_eq!(eval("=DECIMAL(\"FG\",16)"), Value::Error(crate::FormulaError::Num));
    }

    #[test]
    fn test_ceiling_family() {
        assert_eq!(eval_num("=CEILING(2.5,1)"), 3.0);
        assert_eq!(eval_num("=CEILING(-2.5,-2)"), -4.0);
        assert_eq!(eval_num("=CEILING(-2.5,2)"), -2.0);
        assert_eq!(eval_num("=CEILING(1.5,0)"), 0.0);
        assert_eq!(eval_num("=CEILING(-1e300,2)"), -1e300);
        assert_eq!(eval_num("=FLOOR(-1e300,2)"), -1e300);
        assert_eq!(eval("=CEILING(1e308,1)"), Value::Error(crate::FormulaError::Num));
        assert_eq!(eval_num("=CEILING.MATH(-5.5,2,-1)"), -6.0);
        assert_eq!(eval_num("=CEILING.MATH(24.3,5)"), 25.0);
        assert_eq!(eval_num("=CEILING.MATH(-8.1,2)"), -8.0);
        assert_eq!(eval_num("=CEILING.PRECISE(4.3,-2)"), 6.0);
        assert_eq!(eval_num("=ISO.CEILING(-4.3,2)"), -4.0);
        assert_eq!(eval_num("=EVEN(3)"), 4.0);
        assert_eq!(eval_num("=EVEN(-1)"), -2.0);
    }

    #[test]
    fn test_floor_family() {
        assert_eq!(eval_num("=FLOOR(3.7,2)"), 2.0);
        assert_eq!(eval_num("=FLOOR(-2.5,-2)"), -2.0);
        assert_eq!(eval("=FLOOR(2.5,-2)"), Value::Error(crate::FormulaError::Num));
        assert_eq!(eval_num("=FLOOR.MATH(-5.5,2,)"), -6.0);
        assert_eq!(eval_num("=FLOOR.MATH(-5.5,2,-1)"), -4.0);
        assert_eq!(eval_num("=FLOOR.MATH(24.3,5)"), 20.0);
        assert_eq!(eval_num("=FLOOR.PRECISE(-3.2,-1)"), -4.0);
    }

    #[test]
    fn test_combinatorics() {
        assert_eq!(eval_num("=COMBIN(8,2)"), 28.0);
        assert_eq!(eval("=COMBIN(2,3)"), Value::Error(crate::FormulaError::Num));
        assert_eq!(eval_num("=COMBINA(4,3)"), 20.0);
        assert_eq!(eval_num("=COMBINA(0,0)"), 1.0);
        assert_eq!(eval_num("=FACT(5)"), 120.0);
        assert_eq!(eval_num("=FACT(5.9)"), 120.0);
        assert_eq!(eval("=FACT(171)"), Value::Error(crate::FormulaError::Num));
        assert_eq!(eval_num("=FACTDOUBLE(7)"), 105.0);
        assert_eq!(eval_num("=FACTDOUBLE(-1)"), 1.0);
    }

    #[test]
    fn test_gcd_lcm() {
        assert_eq!(eval_num("=GCD(24,36)"), 12.0);
        assert_eq!(eval_num("=GCD(5,0)"), 5.0);
        assert_eq!(eval_num("=GCD(128,80,44,)"), 4.0);
        assert_eq!(eval_num("=GCD(\"12\",18)"), 6.0);
        assert_eq!(eval("=GCD(-1,2)"), Value::Error(crate::FormulaError::Num));
        assert_eq!(eval("=GCD(TRUE,2)"), Value::Error(crate::FormulaError::Value));
        assert_eq!(eval("=GCD(9007199254740993,1)"), Value::Error(crate::FormulaError::Num));
        assert_eq!(eval_num("=LCM(4,6)"), 12.0);
        assert_eq!(eval_num("=LCM(4,)"), 4.0);
        assert_eq!(eval_num("=LCM(0,5)"), 0.0);
    }

    #[test]
    fn test_logs_and_powers() {
        assert_approx(eval_num("=LN(EXP(2))"), 2.0);
        assert_approx(eval_num("=LOG(8,2)"), 3.0);
        assert_approx(eval_num("=LOG(100)"), 2.0);
        assert_eq!(eval("=LOG10(0)"), Value::Error(crate::FormulaError::Num));
        assert_eq!(eval_num("=POWER(2,10)"), 1024.0);
        assert_eq!(eval("=POWER(0,-1)"), Value::Error(crate::FormulaError::Div0));
        assert_eq!(eval("=SQRT(-1)"), Value::Error(crate::FormulaError::Num));
        assert_approx(eval_num("=DEGREES(PI())"), 180.0);
        assert_approx(eval_num("=RADIANS(180)"), std::f64::consts::PI);
    }

    #[test]
    fn test_mod() {
        assert_eq!(eval_num("=MOD(3,2)"), 1.0);
        assert_eq!(eval_num("=MOD(-3,2)"), 1.0);
        assert_eq!(eval_num("=MOD(3,-2)"), -1.0);
        assert_eq!(eval("=MOD(3,0)"), Value::Error(crate::FormulaError::Div0));
    }

    #[test]
    fn test_rounding() {
        assert_eq!(eval_num("=ROUND(2.675,2)"), 2.68);
        assert_eq!(eval_num("=ROUND(-2.5,0)"), -3.0);
        assert_eq!(eval_num("=ROUND(1234.567,-2)"), 1200.0);
        assert_eq!(eval_num("=ROUNDUP(3.14159,3)"), 3.142);
        assert_eq!(eval_num("=ROUNDUP(-3.14159,1)"), -3.2);
        assert_eq!(eval_num("=ROUNDUP(31415.92654,-2)"), 31500.0);
        assert_eq!(eval_num("=ROUNDDOWN(3.14159,3)"), 3.141);
        assert_eq!(eval_num("=ROUNDDOWN(-3.14159,1)"), -3.1);
        assert_eq!(eval_num("=ROUNDDOWN(31415.92654,-2)"), 31400.0);
    }

    #[test]
    fn test_product_and_sumproduct() {
        assert_eq!(eval_num("=PRODUCT(2,3,4)"), 24.0);
        assert_eq!(eval_num("=SUMPRODUCT({1,2;3,4},{5,6;7,8})"), 70.0);
        assert_eq!(eval("=SUMPRODUCT({1,2},{1;2})"), Value::Error(crate::FormulaError::Value));
        assert_eq!(eval_num("=SUMPRODUCT({1,\"a\"},{3,4})"), 3.0);
    }

    #[test]
    fn test_mdeterm() {
        assert_approx(eval_num("=MDETERM({3,6;1,1})"), -3.0);
        assert_approx(eval_num("=MDETERM({3,6,1;1,1,0;3,10,2})"), 1.0);
        assert_approx(eval_num("=MDETERM({1,3,8,5;1,3,6,1;1,1,1,0;7,3,10,2})"), 88.0);
        assert_eq!(eval("=MDETERM({1,2})"), Value::Error(crate::FormulaError::Value));
    }

    #[test]
    fn test_mmult() {
        assert_eq!(eval_num("=MMULT({1,2;3,4},{5;6})"), 17.0);
        assert_eq!(eval_num("=INDEX(MMULT({1,2;3,4},{5;6}),2,1)"), 39.0);
        assert_eq!(eval_num("=INDEX(MMULT({1,2;3,4},{5,6;7,8}),1,2)"), 22.0);
        assert_eq!(eval_num("=COLUMNS(MMULT({1;2;3},{4,5}))"), 2.0);
        assert_eq!(eval_num("=SUM(MMULT({1,2;3,4},{1,0;0,1}))"), 10.0);
        assert_eq!(eval_num("=MMULT({1,2,3},{4;5;6})"), 32.0);
        assert_eq!(eval_num("=ROWS(MMULT({1;2;3},{4,5}))"), 3.0);
        assert_eq!(eval("=MMULT({1,2},{3,4})"), Value::Error(crate::FormulaError::Value));
        assert_eq!(eval("=MMULT({1,\"a\"},{1;2})"), Value::Error(crate::FormulaError::Value));
        assert_eq!(eval("=MMULT({1,#N/A},{1;2})"), Value::Error(crate::FormulaError::NotAvailable));
    }

    #[test]
    fn test_sumif() {
        let mut engine = grid_engine(&[
            ("A1", Value::Number(1.0)),
            ("A2", Value::Number(5.0)),
            ("A3", Value::Number(10.0)),
            ("B1", Value::Number(100.0)),
            ("B2", Value::Number(200.0)),
            ("B3", Value::Number(300.0)),
        ]);
        let sum = |engine: &mut crate::Engine, f: &str| engine.parse(f, None).unwrap().result;
        assert_eq!(sum(&mut engine, "=SUMIF(A1:A3,\">4\")"), Value::Number(15.0));
        assert_eq!(sum(&mut engine, "=SUMIF(A1:A3,\">4\",B1:B3)"), Value::Number(500.0));
        // Sum range resized from its top-left cell
        assert_eq!(sum(&mut engine, "=SUMIF(A1:A3,\"<>5\",B1)"), Value::Number(400.0));
    }

    #[test]
    fn test_not_implemented() {
        assert_eq!(
            eval("=AGGREGATE(1,4,1)"),
            Value::Error(crate::FormulaError::NotImplemented("AGGREGATE".into()))
        );
    }
}
