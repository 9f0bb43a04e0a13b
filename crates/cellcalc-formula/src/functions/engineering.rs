//! Engineering functions: radix conversion, bit operations, error function
//! and complex numbers
//!
//! Signed radix values use ten-digit two's complement: `1111111111` is -1 in
//! binary, `FFFFFFFFFF` is -1 in hex.

use super::{flatten, optional, required, Arg};
use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::Evaluator;
use crate::value::{format_number, Value};
use lazy_regex::regex_is_match;
use num_complex::Complex64;

pub const MAX_BIN: i64 = 511;
pub const MIN_BIN: i64 = -512;
pub const MAX_OCT: i64 = 536_870_911;
pub const MIN_OCT: i64 = -536_870_912;
pub const MAX_HEX: i64 = 549_755_813_887;
pub const MIN_HEX: i64 = -549_755_813_888;

/// Largest operand accepted by the BIT* functions (2^48 - 1)
const MAX_BIT_OPERAND: f64 = 281_474_976_710_655.0;
const MAX_SHIFT: f64 = 53.0;

/// Digits in a signed radix number
const RADIX_DIGITS: u32 = 10;

/// Widest `places` argument of the radix conversions
const MAX_PLACES: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Radix {
    Bin,
    Oct,
    Hex,
}

impl Radix {
    fn base(self) -> u32 {
        match self {
            Radix::Bin => 2,
            Radix::Oct => 8,
            Radix::Hex => 16,
        }
    }

    /// base^10, the modulus of the two's complement form
    fn modulus(self) -> i64 {
        (self.base() as i64).pow(RADIX_DIGITS)
    }

    fn bounds(self) -> (i64, i64) {
        match self {
            Radix::Bin => (MIN_BIN, MAX_BIN),
            Radix::Oct => (MIN_OCT, MAX_OCT),
            Radix::Hex => (MIN_HEX, MAX_HEX),
        }
    }
}

/// Radix text argument; numbers are read through their decimal digits
fn radix_text(arg: &Arg) -> FormulaResult<String> {
    match arg.value.scalar() {
        Value::Boolean(_) => Err(FormulaError::Value),
        Value::Number(n) => Ok(format_number(*n)),
        other => other.to_text(),
    }
}

/// Signed value of up to ten radix digits
fn decode(text: &str, radix: Radix) -> FormulaResult<i64> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(0);
    }
    if text.chars().count() > RADIX_DIGITS as usize {
        return Err(FormulaError::Num);
    }
    let unsigned = i64::from_str_radix(text, radix.base()).map_err(|_| FormulaError::Num)?;
    if text.starts_with(['+', '-']) {
        return Err(FormulaError::Num);
    }
    let modulus = radix.modulus();
    if unsigned >= modulus / 2 {
        Ok(unsigned - modulus)
    } else {
        Ok(unsigned)
    }
}

/// Radix digits for `n`; negative values ignore `places` and always use ten digits
fn encode(n: i64, radix: Radix, places: Option<f64>) -> FormulaResult<Value> {
    let (min, max) = radix.bounds();
    if n < min || n > max {
        return Err(FormulaError::Num);
    }
    if n < 0 {
        let digits = super::math::to_radix((radix.modulus() + n) as u64, radix.base());
        return Ok(Value::Text(digits));
    }
    let digits = super::math::to_radix(n as u64, radix.base());
    match places {
        None => Ok(Value::Text(digits)),
        Some(p) => {
            let p = p.trunc();
            if !(0.0..=MAX_PLACES).contains(&p) || p < digits.len() as f64 {
                return Err(FormulaError::Num);
            }
            Ok(Value::Text(format!("{:0>width$}", digits, width = p as usize)))
        }
    }
}

fn places(args: &[Arg]) -> FormulaResult<Option<f64>> {
    optional(args, 1).map(Arg::number).transpose()
}

fn convert(args: &[Arg], from: Radix, to: Radix) -> FormulaResult<Value> {
    let n = decode(&radix_text(required(args, 0)?)?, from)?;
    encode(n, to, places(args)?)
}

fn from_decimal(args: &[Arg], to: Radix) -> FormulaResult<Value> {
    let n = required(args, 0)?.number()?.trunc();
    let (min, max) = to.bounds();
    if n < min as f64 || n > max as f64 {
        return Err(FormulaError::Num);
    }
    encode(n as i64, to, places(args)?)
}

fn to_decimal(args: &[Arg], from: Radix) -> FormulaResult<Value> {
    let n = decode(&radix_text(required(args, 0)?)?, from)?;
    Ok(Value::Number(n as f64))
}

/// BIN2DEC function
pub fn fn_bin2dec(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    to_decimal(args, Radix::Bin)
}

/// BIN2HEX function
pub fn fn_bin2hex(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    convert(args, Radix::Bin, Radix::Hex)
}

/// BIN2OCT function
pub fn fn_bin2oct(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    convert(args, Radix::Bin, Radix::Oct)
}

/// DEC2BIN function
pub fn fn_dec2bin(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    from_decimal(args, Radix::Bin)
}

/// DEC2HEX function
pub fn fn_dec2hex(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    from_decimal(args, Radix::Hex)
}

/// DEC2OCT function
pub fn fn_dec2oct(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    from_decimal(args, Radix::Oct)
}

/// HEX2BIN function
pub fn fn_hex2bin(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    convert(args, Radix::Hex, Radix::Bin)
}

/// HEX2DEC function
pub fn fn_hex2dec(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    to_decimal(args, Radix::Hex)
}

/// HEX2OCT function
pub fn fn_hex2oct(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    convert(args, Radix::Hex, Radix::Oct)
}

/// OCT2BIN function
pub fn fn_oct2bin(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    convert(args, Radix::Oct, Radix::Bin)
}

/// OCT2DEC function
pub fn fn_oct2dec(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    to_decimal(args, Radix::Oct)
}

/// OCT2HEX function
pub fn fn_oct2hex(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    convert(args, Radix::Oct, Radix::Hex)
}

fn bit_operand(arg: &Arg) -> FormulaResult<u64> {
    let n = arg.number()?;
    if n < 0.0 || n.fract() != 0.0 || n > MAX_BIT_OPERAND {
        return Err(FormulaError::Num);
    }
    Ok(n as u64)
}

fn bitwise(args: &[Arg], op: fn(u64, u64) -> u64) -> FormulaResult<Value> {
    let a = bit_operand(required(args, 0)?)?;
    let b = bit_operand(required(args, 1)?)?;
    Ok(Value::Number(op(a, b) as f64))
}

/// BITAND function
pub fn fn_bitand(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    bitwise(args, |a, b| a & b)
}

/// BITOR function
pub fn fn_bitor(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    bitwise(args, |a, b| a | b)
}

/// BITXOR function
pub fn fn_bitxor(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    bitwise(args, |a, b| a ^ b)
}

fn shift_left(number: &Arg, shift: f64) -> FormulaResult<Value> {
    let shift = shift.trunc();
    if shift.abs() > MAX_SHIFT {
        return Err(FormulaError::Num);
    }
    let n = bit_operand(number)? as f64;
    let result = if shift >= 0.0 {
        n * 2f64.powf(shift)
    } else {
        (n / 2f64.powf(-shift)).trunc()
    };
    if result > MAX_BIT_OPERAND {
        return Err(FormulaError::Num);
    }
    Ok(Value::Number(result))
}

/// BITLSHIFT function - a negative shift moves right
pub fn fn_bitlshift(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    shift_left(required(args, 0)?, required(args, 1)?.number()?)
}

/// BITRSHIFT function
pub fn fn_bitrshift(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    shift_left(required(args, 0)?, -required(args, 1)?.number()?)
}

fn strict_or(args: &[Arg], index: usize, default: f64) -> FormulaResult<f64> {
    optional(args, index).map_or(Ok(default), Arg::number_strict)
}

/// DELTA function - 1 when both numbers are equal
pub fn fn_delta(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let a = required(args, 0)?.number_strict()?;
    let b = strict_or(args, 1, 0.0)?;
    Ok(Value::Number(if a == b { 1.0 } else { 0.0 }))
}

/// GESTEP function - 1 when the number is at least the step
pub fn fn_gestep(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let n = required(args, 0)?.number_strict()?;
    let step = strict_or(args, 1, 0.0)?;
    Ok(Value::Number(if n >= step { 1.0 } else { 0.0 }))
}

/// ERF function
///
/// With one argument integrates from 0; with two, between the limits.
pub fn fn_erf(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let lower = required(args, 0)?.number_strict()?;
    match optional(args, 1) {
        None => Ok(Value::Number(libm::erf(lower))),
        Some(upper) => {
            let upper = upper.number_strict()?;
            Ok(Value::Number(libm::erf(upper) - libm::erf(lower)))
        }
    }
}

/// ERFC function
pub fn fn_erfc(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    Ok(Value::Number(libm::erfc(required(args, 0)?.number_strict()?)))
}

/// A complex number read from text, with the unit it was written with
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ParsedComplex {
    pub value: Complex64,
    pub suffix: Option<char>,
}

impl ParsedComplex {
    fn real(re: f64) -> Self {
        Self {
            value: Complex64::new(re, 0.0),
            suffix: None,
        }
    }

    fn unit(&self) -> char {
        self.suffix.unwrap_or('i')
    }
}

fn parse_component(text: &str) -> FormulaResult<f64> {
    if !regex_is_match!(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?$", text) {
        return Err(FormulaError::Num);
    }
    text.parse::<f64>().map_err(|_| FormulaError::Num)
}

/// Parse `3+4i`, `-2.5j`, `i`, `1e3-i`, `7`
///
/// The unit must be the last character. Text without a unit is a real number;
/// if it doesn't read as one it is `#NUM!` when it carries a sign and
/// `#VALUE!` otherwise.
pub(crate) fn parse_complex(text: &str) -> FormulaResult<ParsedComplex> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(ParsedComplex::real(0.0));
    }

    let (core, suffix) = match text.chars().last() {
        Some(c @ ('i' | 'j')) => (&text[..text.len() - 1], c),
        _ => {
            return match parse_component(text) {
                Ok(re) => Ok(ParsedComplex::real(re)),
                Err(_) if text.contains(['+', '-']) => Err(FormulaError::Num),
                Err(_) => Err(FormulaError::Value),
            };
        }
    };
    if core.contains(['i', 'j']) {
        return Err(FormulaError::Num);
    }

    let (re, im) = match core {
        "" | "+" => (0.0, 1.0),
        "-" => (0.0, -1.0),
        _ if core.ends_with('+') => (parse_component(&core[..core.len() - 1])?, 1.0),
        _ if core.ends_with('-') => (parse_component(&core[..core.len() - 1])?, -1.0),
        _ => match parse_component(core) {
            Ok(im) => (0.0, im),
            Err(_) => {
                let split = core
                    .char_indices()
                    .rev()
                    .find(|&(i, c)| {
                        i > 0 && (c == '+' || c == '-') && !core[..i].ends_with(['e', 'E'])
                    })
                    .map(|(i, _)| i)
                    .ok_or(FormulaError::Num)?;
                let (re, im) = core.split_at(split);
                (parse_component(re)?, parse_component(im)?)
            }
        },
    };
    Ok(ParsedComplex {
        value: Complex64::new(re, im),
        suffix: Some(suffix),
    })
}

/// Complex operand; booleans are `#NUM!`
fn complex_arg(arg: &Arg) -> FormulaResult<ParsedComplex> {
    match arg.value.scalar() {
        Value::Boolean(_) => Err(FormulaError::Num),
        Value::Number(n) => Ok(ParsedComplex::real(*n)),
        Value::Empty => Ok(ParsedComplex::real(0.0)),
        Value::Text(s) => parse_complex(s),
        Value::Error(e) => Err(e.clone()),
        Value::Array(_) | Value::Reference(_) => Err(FormulaError::Value),
    }
}

fn coefficient(n: f64) -> String {
    if n == 1.0 {
        String::new()
    } else if n == -1.0 {
        "-".to_string()
    } else {
        format_number(n)
    }
}

/// Render a complex number; zero stays numeric, anything else is text
pub(crate) fn format_complex(z: Complex64, unit: char) -> FormulaResult<Value> {
    if !z.re.is_finite() || !z.im.is_finite() {
        return Err(FormulaError::Num);
    }
    // + 0.0 folds -0 into 0
    let (re, im) = (z.re + 0.0, z.im + 0.0);
    let text = match (re == 0.0, im == 0.0) {
        (true, true) => return Ok(Value::Number(0.0)),
        (false, true) => format_number(re),
        (true, false) => format!("{}{unit}", coefficient(im)),
        (false, false) => {
            let sign = if im > 0.0 { "+" } else { "" };
            format!("{}{sign}{}{unit}", format_number(re), coefficient(im))
        }
    };
    Ok(Value::Text(text))
}

/// COMPLEX function
pub fn fn_complex(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let re = required(args, 0)?.number_strict()?;
    let im = required(args, 1)?.number_strict()?;
    let unit = match optional(args, 2) {
        None => 'i',
        Some(arg) => match arg.text()?.as_str() {
            "i" => 'i',
            "j" => 'j',
            _ => return Err(FormulaError::Value),
        },
    };
    format_complex(Complex64::new(re, im), unit)
}

fn complex_unary(args: &[Arg], f: fn(Complex64) -> Complex64) -> FormulaResult<Value> {
    let z = complex_arg(required(args, 0)?)?;
    format_complex(f(z.value), z.unit())
}

/// IMABS function
pub fn fn_imabs(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    Ok(Value::Number(complex_arg(required(args, 0)?)?.value.norm()))
}

/// IMAGINARY function
pub fn fn_imaginary(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    Ok(Value::Number(complex_arg(required(args, 0)?)?.value.im))
}

/// IMREAL function
pub fn fn_imreal(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    Ok(Value::Number(complex_arg(required(args, 0)?)?.value.re))
}

/// IMARGUMENT function - the angle in radians
pub fn fn_imargument(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let z = complex_arg(required(args, 0)?)?.value;
    if z.re == 0.0 && z.im == 0.0 {
        return Err(FormulaError::Div0);
    }
    Ok(Value::Number(z.arg()))
}

/// IMCONJUGATE function
pub fn fn_imconjugate(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    complex_unary(args, |z| z.conj())
}

/// IMCOS function
pub fn fn_imcos(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    complex_unary(args, Complex64::cos)
}

/// IMSIN function
pub fn fn_imsin(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    complex_unary(args, Complex64::sin)
}

/// IMSINH function
pub fn fn_imsinh(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    complex_unary(args, Complex64::sinh)
}

/// IMCOSH function
pub fn fn_imcosh(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    complex_unary(args, Complex64::cosh)
}

/// IMTAN function
pub fn fn_imtan(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    complex_unary(args, Complex64::tan)
}

// Reciprocals of a zero denominator come out non-finite, which formats as #NUM!

/// IMSEC function
pub fn fn_imsec(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    complex_unary(args, |z| z.cos().inv())
}

/// IMSECH function
pub fn fn_imsech(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    complex_unary(args, |z| z.cosh().inv())
}

/// IMCSC function
pub fn fn_imcsc(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    complex_unary(args, |z| z.sin().inv())
}

/// IMCSCH function
pub fn fn_imcsch(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    complex_unary(args, |z| z.sinh().inv())
}

/// IMCOT function
pub fn fn_imcot(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    complex_unary(args, |z| z.cos() / z.sin())
}

/// IMEXP function
pub fn fn_imexp(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    complex_unary(args, Complex64::exp)
}

/// IMLN function
pub fn fn_imln(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    complex_unary(args, Complex64::ln)
}

/// IMLOG10 function
pub fn fn_imlog10(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    complex_unary(args, |z| z.ln() / std::f64::consts::LN_10)
}

/// IMLOG2 function
pub fn fn_imlog2(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    complex_unary(args, |z| z.ln() / std::f64::consts::LN_2)
}

/// IMSQRT function
pub fn fn_imsqrt(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    complex_unary(args, Complex64::sqrt)
}

/// IMPOWER function
pub fn fn_impower(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let z = complex_arg(required(args, 0)?)?;
    let n = required(args, 1)?.number_strict()?;
    format_complex(z.value.powf(n), z.unit())
}

/// IMDIV function
///
/// The result uses `j` if either operand does.
pub fn fn_imdiv(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let a = complex_arg(required(args, 0)?)?;
    let b = complex_arg(required(args, 1)?)?;
    if b.value.re == 0.0 && b.value.im == 0.0 {
        return Err(FormulaError::Num);
    }
    let unit = if a.suffix == Some('j') || b.suffix == Some('j') {
        'j'
    } else {
        'i'
    };
    format_complex(a.value / b.value, unit)
}

/// IMSUB function
pub fn fn_imsub(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let a = complex_arg(required(args, 0)?)?;
    let b = complex_arg(required(args, 1)?)?;
    let unit = shared_unit([a, b].iter(), FormulaError::Num)?;
    format_complex(a.value - b.value, unit)
}

/// Unit shared by all operands that have one
fn shared_unit<'a>(
    operands: impl Iterator<Item = &'a ParsedComplex>,
    mismatch: FormulaError,
) -> FormulaResult<char> {
    let mut unit = None;
    for suffix in operands.filter_map(|z| z.suffix) {
        match unit {
            Some(u) if u != suffix => return Err(mismatch),
            _ => unit = Some(suffix),
        }
    }
    Ok(unit.unwrap_or('i'))
}

/// Every complex operand in the arguments, arrays expanded; booleans are `#VALUE!`
fn complex_operands(args: &[Arg]) -> FormulaResult<Vec<ParsedComplex>> {
    flatten(args)
        .into_iter()
        .map(|(value, _)| match value {
            Value::Boolean(_) => Err(FormulaError::Value),
            Value::Number(n) => Ok(ParsedComplex::real(*n)),
            Value::Empty => Ok(ParsedComplex::real(0.0)),
            Value::Text(s) => parse_complex(s),
            Value::Error(e) => Err(e.clone()),
            _ => Err(FormulaError::Value),
        })
        .collect()
}

/// IMPRODUCT function
pub fn fn_improduct(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let operands = complex_operands(args)?;
    let unit = shared_unit(operands.iter(), FormulaError::Value)?;
    let product = operands
        .iter()
        .fold(Complex64::new(1.0, 0.0), |acc, z| acc * z.value);
    format_complex(product, unit)
}

/// IMSUM function
pub fn fn_imsum(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let operands = complex_operands(args)?;
    let unit = shared_unit(operands.iter(), FormulaError::Value)?;
    let sum = operands
        .iter()
        .fold(Complex64::new(0.0, 0.0), |acc, z| acc + z.value);
    format_complex(sum, unit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{assert_approx, eval, eval_num};
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> Value {
        Value::text(s)
    }

    #[test]
    fn test_to_decimal() {
        assert_eq!(eval_num("=BIN2DEC(1100100)"), 100.0);
        assert_eq!(eval_num("=BIN2DEC(\"1111111111\")"), -1.0);
        assert_eq!(eval_num("=BIN2DEC(\"1000000000\")"), MIN_BIN as f64);
        assert_eq!(eval("=BIN2DEC(\"10000000000\")"), Value::Error(FormulaError::Num));
        assert_eq!(eval("=BIN2DEC(\"102\")"), Value::Error(FormulaError::Num));
        assert_eq!(eval("=BIN2DEC(TRUE)"), Value::Error(FormulaError::Value));
        assert_eq!(eval_num("=HEX2DEC(\"A5\")"), 165.0);
        assert_eq!(eval_num("=HEX2DEC(\"FFFFFFFF5B\")"), -165.0);
        assert_eq!(eval_num("=OCT2DEC(\"7777777533\")"), -165.0);
        assert_eq!(eval_num("=OCT2DEC(54)"), 44.0);
    }

    #[test]
    fn test_from_decimal() {
        assert_eq!(eval("=DEC2BIN(9,4)"), text("1001"));
        assert_eq!(eval("=DEC2BIN(-100)"), text("1110011100"));
        assert_eq!(eval("=DEC2BIN(512)"), Value::Error(FormulaError::Num));
        assert_eq!(eval("=DEC2BIN(9,3)"), Value::Error(FormulaError::Num));
        assert_eq!(eval("=DEC2HEX(100,4)"), text("0064"));
        assert_eq!(eval("=DEC2HEX(-54)"), text("FFFFFFFFCA"));
        assert_eq!(eval("=DEC2OCT(58,3)"), text("072"));
        assert_eq!(eval("=DEC2OCT(-100)"), text("7777777634"));
    }

    #[test]
    fn test_places_limits() {
        assert_eq!(eval("=DEC2BIN(5,10)"), text("0000000101"));
        assert_eq!(eval("=DEC2BIN(5,11)"), Value::Error(FormulaError::Num));
        assert_eq!(eval("=DEC2BIN(1,1e12)"), Value::Error(FormulaError::Num));
        assert_eq!(eval("=DEC2HEX(1,-1)"), Value::Error(FormulaError::Num));
        assert_eq!(eval("=DEC2OCT(1,11)"), Value::Error(FormulaError::Num));
        assert_eq!(eval("=BIN2HEX(1,11)"), Value::Error(FormulaError::Num));
        assert_eq!(eval("=HEX2OCT(\"F\",1e300)"), Value::Error(FormulaError::Num));
    }

    #[test]
    fn test_cross_radix() {
        assert_eq!(eval("=BIN2HEX(11111011,4)"), text("00FB"));
        assert_eq!(eval("=BIN2HEX(1110)"), text("E"));
        assert_eq!(eval("=BIN2HEX(\"1111111111\")"), text("FFFFFFFFFF"));
        assert_eq!(eval("=BIN2OCT(1001,3)"), text("011"));
        assert_eq!(eval("=BIN2OCT(\"1100100\")"), text("144"));
        assert_eq!(eval("=HEX2BIN(\"F\",8)"), text("00001111"));
        assert_eq!(eval("=HEX2BIN(\"FFFFFFFE00\")"), text("1000000000"));
        assert_eq!(eval("=HEX2BIN(\"200\")"), Value::Error(FormulaError::Num));
        assert_eq!(eval("=HEX2OCT(\"FFFFFFFF00\")"), text("7777777400"));
        assert_eq!(eval("=OCT2BIN(3,3)"), text("011"));
        assert_eq!(eval("=OCT2BIN(\"7777777000\")"), text("1000000000"));
        assert_eq!(eval("=OCT2HEX(100,4)"), text("0040"));
        assert_eq!(eval("=OCT2HEX(\"7777777533\")"), text("FFFFFFFF5B"));
        assert_eq!(eval("=HEX2DEC(\"XYZ\")"), Value::Error(FormulaError::Num));
    }

    #[test]
    fn test_bitwise() {
        assert_eq!(eval_num("=BITAND(13,25)"), 9.0);
        assert_eq!(eval_num("=BITOR(23,10)"), 31.0);
        assert_eq!(eval_num("=BITXOR(5,3)"), 6.0);
        assert_eq!(eval("=BITAND(-1,5)"), Value::Error(FormulaError::Num));
        assert_eq!(eval("=BITOR(1.5,1)"), Value::Error(FormulaError::Num));
        assert_eq!(eval("=BITXOR(281474976710656,1)"), Value::Error(FormulaError::Num));
        assert_eq!(eval_num("=BITLSHIFT(4,2)"), 16.0);
        assert_eq!(eval_num("=BITLSHIFT(4,-2)"), 1.0);
        assert_eq!(eval_num("=BITRSHIFT(13,2)"), 3.0);
        assert_eq!(eval("=BITLSHIFT(1,54)"), Value::Error(FormulaError::Num));
        assert_eq!(eval("=BITLSHIFT(281474976710655,1)"), Value::Error(FormulaError::Num));
    }

    #[test]
    fn test_delta_gestep_erf() {
        assert_eq!(eval_num("=DELTA(5,4)"), 0.0);
        assert_eq!(eval_num("=DELTA(5,5)"), 1.0);
        assert_eq!(eval_num("=DELTA(0.5,0.5)"), 1.0);
        assert_eq!(eval_num("=DELTA(0)"), 1.0);
        assert_eq!(eval("=DELTA(TRUE,1)"), Value::Error(FormulaError::Value));
        assert_eq!(eval_num("=GESTEP(5,4)"), 1.0);
        assert_eq!(eval_num("=GESTEP(-4)"), 0.0);
        assert_approx(eval_num("=ERF(0.745)"), 0.707_928_920_095_737_7);
        assert_approx(eval_num("=ERF(0,1)"), 0.842_700_792_949_714_9);
        assert_approx(eval_num("=ERFC(1)"), 0.157_299_207_050_285_1);
    }

    #[test]
    fn test_parse_complex() {
        let z = |s: &str| parse_complex(s).map(|p| (p.value.re, p.value.im, p.suffix));
        assert_eq!(z("3+4i"), Ok((3.0, 4.0, Some('i'))));
        assert_eq!(z("-2.5j"), Ok((0.0, -2.5, Some('j'))));
        assert_eq!(z("i"), Ok((0.0, 1.0, Some('i'))));
        assert_eq!(z("-i"), Ok((0.0, -1.0, Some('i'))));
        assert_eq!(z("5-i"), Ok((5.0, -1.0, Some('i'))));
        assert_eq!(z("1e3-2e-1i"), Ok((1000.0, -0.2, Some('i'))));
        assert_eq!(z("7"), Ok((7.0, 0.0, None)));
        assert_eq!(z("3+4k"), Err(FormulaError::Num));
        assert_eq!(z("3i+4i"), Err(FormulaError::Num));
        assert_eq!(z("abc"), Err(FormulaError::Value));
    }

    #[test]
    fn test_complex_formatting() {
        assert_eq!(eval("=COMPLEX(3,4)"), text("3+4i"));
        assert_eq!(eval("=COMPLEX(3,4,\"j\")"), text("3+4j"));
        assert_eq!(eval("=COMPLEX(52,1)"), text("52+i"));
        assert_eq!(eval("=COMPLEX(0,-1)"), text("-i"));
        assert_eq!(eval("=COMPLEX(0,1)"), text("i"));
        assert_eq!(eval("=COMPLEX(1,0)"), text("1"));
        assert_eq!(eval("=COMPLEX(0,4)"), text("4i"));
        assert_eq!(eval("=COMPLEX(2,-3)"), text("2-3i"));
        assert_eq!(eval("=COMPLEX(0,0)"), Value::Number(0.0));
        assert_eq!(eval("=COMPLEX(1,1,\"k\")"), Value::Error(FormulaError::Value));
        assert_eq!(eval("=COMPLEX(TRUE,1)"), Value::Error(FormulaError::Value));
    }

    #[test]
    fn test_complex_parts() {
        assert_eq!(eval_num("=IMABS(\"5+12i\")"), 13.0);
        assert_eq!(eval_num("=IMREAL(\"6-9i\")"), 6.0);
        assert_eq!(eval_num("=IMAGINARY(\"3+4i\")"), 4.0);
        assert_eq!(eval_num("=IMAGINARY(\"-j\")"), -1.0);
        assert_eq!(eval_num("=IMAGINARY(4)"), 0.0);
        assert_approx(eval_num("=IMARGUMENT(\"3+4i\")"), 0.927_295_218_001_612_2);
        assert_eq!(eval("=IMARGUMENT(0)"), Value::Error(FormulaError::Div0));
        assert_eq!(eval("=IMCONJUGATE(\"3+4i\")"), text("3-4i"));
    }

    #[test]
    fn test_complex_arithmetic() {
        assert_eq!(eval("=IMDIV(\"-238+240i\",\"10+24i\")"), text("5+12i"));
        assert_eq!(eval("=IMDIV(\"-238+240j\",\"10+24i\")"), text("5+12j"));
        assert_eq!(eval("=IMDIV(\"1+i\",0)"), Value::Error(FormulaError::Num));
        assert_eq!(eval("=IMPRODUCT(\"3+4i\",\"5-3i\")"), text("27+11i"));
        assert_eq!(eval("=IMPRODUCT(\"1+2i\",30)"), text("30+60i"));
        assert_eq!(eval("=IMPRODUCT(\"1+2i\",TRUE)"), Value::Error(FormulaError::Value));
        assert_eq!(eval("=IMSUB(\"13+4i\",\"5+3i\")"), text("8+i"));
        assert_eq!(eval("=IMSUB(\"13+4i\",\"5+3j\")"), Value::Error(FormulaError::Num));
        assert_eq!(eval("=IMSUM(\"3+4i\",\"5-3i\")"), text("8+i"));
        assert_eq!(eval("=IMPOWER(\"2+3i\",0)"), text("1"));
        assert_eq!(eval("=IMDIV(TRUE,\"1+i\")"), Value::Error(FormulaError::Num));
    }

    #[test]
    fn test_complex_transcendental() {
        assert_approx(eval_num("=IMREAL(IMEXP(\"1+i\"))"), 1.468_693_939_915_885);
        assert_approx(eval_num("=IMAGINARY(IMEXP(\"1+i\"))"), 2.287_355_287_178_842);
        assert_approx(eval_num("=IMREAL(IMLN(\"3+4i\"))"), 1.609_437_912_434_1);
        assert_approx(eval_num("=IMAGINARY(IMLN(\"3+4i\"))"), 0.927_295_218_001_612);
        assert_approx(eval_num("=IMREAL(IMLOG10(\"3+4i\"))"), 0.698_970_004_336_019);
        assert_approx(eval_num("=IMREAL(IMLOG2(\"3+4i\"))"), 2.321_928_094_887_36);
        assert_approx(eval_num("=IMREAL(IMSQRT(\"-4\"))"), 0.0);
        assert_approx(eval_num("=IMAGINARY(IMSQRT(\"-4\"))"), 2.0);
        assert_approx(eval_num("=IMREAL(IMCOS(\"1+i\"))"), 0.833_730_025_131_149);
        assert_approx(eval_num("=IMAGINARY(IMSIN(\"3+4i\"))"), -27.016_813_258_003_9);
        assert_approx(eval_num("=IMREAL(IMPOWER(\"2+3i\",3))"), -46.0);
        assert_eq!(eval("=IMCOS(TRUE)"), Value::Error(FormulaError::Num));
        assert_eq!(eval("=IMLN(0)"), Value::Error(FormulaError::Num));
    }

    #[test]
    fn test_complex_trig() {
        assert_approx(eval_num("=IMREAL(IMSINH(\"4+3i\"))"), -27.016_813_258_003_932);
        assert_approx(eval_num("=IMAGINARY(IMSINH(\"4+3i\"))"), 3.853_738_037_919_377);
        assert_approx(eval_num("=IMREAL(IMCOSH(\"4+3i\"))"), -27.034_945_603_074_224);
        assert_approx(eval_num("=IMAGINARY(IMCOSH(\"4+3i\"))"), 3.851_153_334_811_777);
        assert_approx(eval_num("=IMREAL(IMTAN(\"4+3i\"))"), 0.004_908_258_067_496_06);
        assert_approx(eval_num("=IMAGINARY(IMTAN(\"4+3i\"))"), 1.000_709_536_067_233);
        assert_approx(eval_num("=IMREAL(IMSEC(\"4+3i\"))"), -0.065_294_027_857_947);
        assert_approx(eval_num("=IMAGINARY(IMSEC(\"4+3i\"))"), -0.075_224_960_302_773);
        assert_approx(eval_num("=IMREAL(IMCSC(\"4+3i\"))"), -0.075_489_832_915_864);
        assert_approx(eval_num("=IMAGINARY(IMCSC(\"4+3i\"))"), 0.064_877_471_370_636);
        assert_approx(eval_num("=IMREAL(IMCOT(\"4+3i\"))"), 0.004_901_182_394_304);
        assert_approx(eval_num("=IMAGINARY(IMCOT(\"4+3i\"))"), -0.999_266_927_805_902);
        assert_approx(eval_num("=IMREAL(IMSECH(1))"), 0.648_054_273_663_886);
        assert_approx(eval_num("=IMREAL(IMCSCH(1))"), 0.850_918_128_239_322);
        assert_eq!(eval("=IMSEC(0)"), text("1"));
        assert_eq!(eval("=IMCOT(0)"), Value::Error(FormulaError::Num));
        assert_eq!(eval("=IMCSCH(0)"), Value::Error(FormulaError::Num));
        assert_eq!(eval("=IMTAN(TRUE)"), Value::Error(FormulaError::Num));
        assert_eq!(eval("=IMSINH(\"2j\")"), eval("=COMPLEX(0,SIN(2),\"j\")"));
    }
}
