//! Text functions
//!
//! Lengths and positions count characters, not bytes.

use super::{flatten, optional, required, Arg};
use crate::criteria::wildcard_pattern;
use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::Evaluator;
use crate::value::Value;
use regex::RegexBuilder;

/// Longest string REPT will build
const MAX_TEXT_LENGTH: usize = 32_767;

fn text(args: &[Arg], index: usize) -> FormulaResult<String> {
    required(args, index)?.text()
}

/// Count-like argument; a blank cell reads as 0
fn count_arg(args: &[Arg], index: usize, default: f64) -> FormulaResult<f64> {
    match optional(args, index) {
        None => Ok(default),
        Some(arg) => match &arg.value {
            Value::Text(s) if s.is_empty() => Ok(0.0),
            _ => Ok(arg.number()?.trunc()),
        },
    }
}

fn take_left(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

fn take_right(s: &str, n: usize) -> String {
    let len = s.chars().count();
    s.chars().skip(len.saturating_sub(n)).collect()
}

/// ASC function - full-width ASCII forms to half-width
pub fn fn_asc(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let converted = text(args, 0)?
        .chars()
        .map(|c| match c {
            '\u{ff01}'..='\u{ff5e}' => char::from_u32(c as u32 - 0xfee0).unwrap_or(c),
            _ => c,
        })
        .collect::<String>();
    Ok(Value::Text(converted))
}

/// BAHTTEXT function
pub fn fn_bahttext(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    required(args, 0)?.number()?;
    Err(FormulaError::NotImplemented("BAHTTEXT".into()))
}

/// CHAR function
pub fn fn_char(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let n = required(args, 0)?.number()?.trunc();
    if !(1.0..=255.0).contains(&n) {
        return Err(FormulaError::Value);
    }
    let c = char::from_u32(n as u32).ok_or(FormulaError::Value)?;
    Ok(Value::Text(c.to_string()))
}

/// CLEAN function - strips control characters
pub fn fn_clean(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let cleaned = text(args, 0)?
        .chars()
        .filter(|c| (*c as u32) >= 0x20)
        .collect::<String>();
    Ok(Value::Text(cleaned))
}

/// CODE function
pub fn fn_code(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let first = text(args, 0)?.chars().next().ok_or(FormulaError::Value)?;
    Ok(Value::Number(first as u32 as f64))
}

fn join(args: &[Arg]) -> FormulaResult<String> {
    let mut out = String::new();
    for (value, _) in flatten(args) {
        out.push_str(&value.to_text()?);
    }
    Ok(out)
}

/// CONCAT function
pub fn fn_concat(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    Ok(Value::Text(join(args)?))
}

/// CONCATENATE function - arrays contribute their top-left element
pub fn fn_concatenate(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let mut out = String::new();
    for arg in args {
        out.push_str(&arg.text()?);
    }
    Ok(Value::Text(out))
}

/// EXACT function - case-sensitive comparison
pub fn fn_exact(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    Ok(Value::Boolean(text(args, 0)? == text(args, 1)?))
}

/// Start position (1-based) as a char index into `within`
fn start_index(args: &[Arg], index: usize, within: &str) -> FormulaResult<usize> {
    let start = count_arg(args, index, 1.0)?;
    let len = within.chars().count();
    if start < 1.0 || start > len.max(1) as f64 {
        return Err(FormulaError::Value);
    }
    Ok(start as usize - 1)
}

fn char_position(s: &str, byte_offset: usize) -> usize {
    s[..byte_offset].chars().count()
}

fn byte_offset(s: &str, char_index: usize) -> usize {
    s.char_indices().nth(char_index).map_or(s.len(), |(i, _)| i)
}

/// FIND function - case-sensitive, no wildcards
pub fn fn_find(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let needle = text(args, 0)?;
    let within = text(args, 1)?;
    let start = start_index(args, 2, &within)?;
    let from = byte_offset(&within, start);
    let found = within[from..].find(&needle).ok_or(FormulaError::Value)?;
    Ok(Value::Number((char_position(&within, from + found) + 1) as f64))
}

/// SEARCH function - case-insensitive, `*` and `?` wildcards with `~` escapes
pub fn fn_search(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let needle = text(args, 0)?;
    let within = text(args, 1)?;
    let start = start_index(args, 2, &within)?;
    let from = byte_offset(&within, start);
    let pattern = RegexBuilder::new(&wildcard_pattern(&needle))
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
        .map_err(|_| FormulaError::Value)?;
    let found = pattern.find(&within[from..]).ok_or(FormulaError::Value)?;
    Ok(Value::Number((char_position(&within, from + found.start()) + 1) as f64))
}

/// LEFT function
pub fn fn_left(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let s = text(args, 0)?;
    let n = count_arg(args, 1, 1.0)?;
    if n < 0.0 {
        return Err(FormulaError::Value);
    }
    Ok(Value::Text(take_left(&s, n as usize)))
}

/// RIGHT function
pub fn fn_right(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let s = text(args, 0)?;
    let n = count_arg(args, 1, 1.0)?;
    if n < 0.0 {
        return Err(FormulaError::Value);
    }
    Ok(Value::Text(take_right(&s, n as usize)))
}

/// LEN function
pub fn fn_len(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    Ok(Value::Number(text(args, 0)?.chars().count() as f64))
}

/// LOWER function
pub fn fn_lower(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    Ok(Value::Text(text(args, 0)?.to_lowercase()))
}

/// UPPER function
pub fn fn_upper(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    Ok(Value::Text(text(args, 0)?.to_uppercase()))
}

/// MID function
pub fn fn_mid(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let s = text(args, 0)?;
    let start = count_arg(args, 1, 1.0)?;
    let n = count_arg(args, 2, 0.0)?;
    if start < 1.0 || n < 0.0 {
        return Err(FormulaError::Value);
    }
    let out = s.chars().skip(start as usize - 1).take(n as usize).collect();
    Ok(Value::Text(out))
}

/// PROPER function - capitalize the first letter of each word
pub fn fn_proper(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let s = text(args, 0)?;
    let mut out = String::with_capacity(s.len());
    let mut after_letter = false;
    for c in s.chars() {
        if after_letter {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        after_letter = c.is_alphabetic();
    }
    Ok(Value::Text(out))
}

/// REPLACE function
pub fn fn_replace(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let old = text(args, 0)?;
    let start = count_arg(args, 1, 1.0)?;
    let n = count_arg(args, 2, 0.0)?;
    let new = text(args, 3)?;
    if start < 1.0 || n < 0.0 {
        return Err(FormulaError::Value);
    }
    let chars: Vec<char> = old.chars().collect();
    let from = (start as usize - 1).min(chars.len());
    let to = from.saturating_add(n as usize).min(chars.len());

    let mut out: String = chars[..from].iter().collect();
    out.push_str(&new);
    out.extend(&chars[to..]);
    Ok(Value::Text(out))
}

/// REPT function
pub fn fn_rept(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let s = text(args, 0)?;
    let times = count_arg(args, 1, 0.0)?;
    if times < 0.0 || s.chars().count() as f64 * times > MAX_TEXT_LENGTH as f64 {
        return Err(FormulaError::Value);
    }
    Ok(Value::Text(s.repeat(times as usize)))
}

/// T function - text passes through, anything else is ""
pub fn fn_t(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    match required(args, 0)?.value.scalar() {
        Value::Text(s) => Ok(Value::Text(s.clone())),
        Value::Error(e) => Err(e.clone()),
        _ => Ok(Value::Text(String::new())),
    }
}

/// TRIM function
pub fn fn_trim(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    Ok(Value::Text(text(args, 0)?.trim().to_string()))
}

/// UNICHAR function
pub fn fn_unichar(args: &[Arg], _ev: &Evaluator<'_>) -> FormulaResult<Value> {
    let n = required(args, 0)?.number()?.trunc();
    if n < 1.0 || n > u32::MAX as f64 {
        return Err(FormulaError::Value);
    }
    let c = char::from_u32(n as u32).ok_or(FormulaError::Value)?;
    Ok(Value::Text(c.to_string()))
}

/// UNICODE function
pub fn fn_unicode(args: &[Arg], ev: &Evaluator<'_>) -> FormulaResult<Value> {
    fn_code(args, ev)
}

#[cfg(test)]
mod tests {
    use crate::test_util::{eval, grid_engine};
    use crate::{FormulaError, Value};
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> Value {
        Value::text(s)
    }

    #[test]
    fn test_left_right_mid() {
        assert_eq!(eval("=LEFT(\"Hello\",2)"), text("He"));
        assert_eq!(eval("=LEFT(\"Hello\")"), text("H"));
        assert_eq!(eval("=LEFT(\"Hi\",10)"), text("Hi"));
        assert_eq!(eval("=LEFT(\"Hi\",-1)"), Value::Error(FormulaError::Value));
        assert_eq!(eval("=RIGHT(\"Hello\",3)"), text("llo"));
        assert_eq!(eval("=RIGHT(\"Hello\")"), text("o"));
        assert_eq!(eval("=MID(\"Fluid Flow\",7,20)"), text("Flow"));
        assert_eq!(eval("=MID(\"abc\",0,1)"), Value::Error(FormulaError::Value));
    }

    #[test]
    fn test_find_and_search() {
        assert_eq!(eval("=FIND(\"M\",\"Miriam McGovern\")"), Value::Number(1.0));
        assert_eq!(eval("=FIND(\"M\",\"Miriam McGovern\",3)"), Value::Number(8.0));
        assert_eq!(eval("=FIND(\"m\",\"ABC\")"), Value::Error(FormulaError::Value));
        assert_eq!(eval("=FIND(\"a\",\"abc\",5)"), Value::Error(FormulaError::Value));
        assert_eq!(eval("=SEARCH(\"e\",\"Statements\",6)"), Value::Number(7.0));
        assert_eq!(eval("=SEARCH(\"MARGIN\",\"Profit Margin\")"), Value::Number(8.0));
        assert_eq!(eval("=SEARCH(\"p?o\",\"the promo\")"), Value::Number(5.0));
        assert_eq!(eval("=SEARCH(\"~?\",\"why? because\")"), Value::Number(4.0));
        assert_eq!(eval("=SEARCH(\"(\",\"f(x)\")"), Value::Number(2.0));
    }

    #[test]
    fn test_case_functions() {
        assert_eq!(eval("=UPPER(\"total\")"), text("TOTAL"));
        assert_eq!(eval("=LOWER(\"E. E. Cummings\")"), text("e. e. cummings"));
        assert_eq!(eval("=PROPER(\"this is a TITLE\")"), text("This Is A Title"));
        assert_eq!(eval("=PROPER(\"2-way street\")"), text("2-Way Street"));
        assert_eq!(eval("=EXACT(\"word\",\"Word\")"), text("FALSE"));
        assert_eq!(eval("=EXACT(\"word\",\"word\")"), text("TRUE"));
    }

    #[test]
    fn test_concat() {
        assert_eq!(eval("=CONCAT(\"a\",1,TRUE)"), text("a1TRUE"));
        assert_eq!(eval("=CONCAT({\"x\",\"y\";\"z\",2})"), text("xyz2"));
        assert_eq!(eval("=CONCATENATE(\"Stream \",\"population\")"), text("Stream population"));
    }

    #[test]
    fn test_character_codes() {
        assert_eq!(eval("=CHAR(65)"), text("A"));
        assert_eq!(eval("=CHAR(0)"), Value::Error(FormulaError::Value));
        assert_eq!(eval("=CODE(\"Alphabet\")"), Value::Number(65.0));
        assert_eq!(eval("=CODE(\"\")"), Value::Error(FormulaError::Value));
        assert_eq!(eval("=UNICHAR(8364)"), text("\u{20ac}"));
        assert_eq!(eval("=UNICODE(\"\u{20ac}uro\")"), Value::Number(8364.0));
        assert_eq!(eval("=ASC(\"\u{ff21}\u{ff22}1\")"), text("AB1"));
    }

    #[test]
    fn test_replace_rept_trim_clean() {
        assert_eq!(eval("=REPLACE(\"abcdefghijk\",6,5,\"*\")"), text("abcde*k"));
        assert_eq!(eval("=REPLACE(\"2009\",3,2,\"10\")"), text("2010"));
        assert_eq!(eval("=REPLACE(\"abc\",2,1e300,\"x\")"), text("ax"));
        assert_eq!(eval("=REPLACE(\"abc\",1e300,1e300,\"x\")"), text("abcx"));
        assert_eq!(eval("=REPT(\"-\",3)"), text("---"));
        assert_eq!(eval("=REPT(\"-\",-1)"), Value::Error(FormulaError::Value));
        assert_eq!(eval("=TRIM(\"  padded  \")"), text("padded"));
        assert_eq!(eval("=CLEAN(CHAR(9)&\"report\"&CHAR(10))"), text("report"));
        assert_eq!(eval("=LEN(\"four\")"), Value::Number(4.0));
    }

    #[test]
    fn test_t() {
        assert_eq!(eval("=T(\"Rainfall\")"), text("Rainfall"));
        assert_eq!(eval("=T(19)"), text(""));
    }

    #[test]
    fn test_blank_cells_read_as_empty_text() {
        let mut engine = grid_engine(&[("A1", Value::text("abc"))]);
        let result = engine.parse("=LEN(B1)&LEFT(A1,B1)", None).unwrap().result;
        assert_eq!(result, text("0"));
    }

    #[test]
    fn test_bahttext_not_implemented() {
        assert_eq!(
            eval("=BAHTTEXT(1234)"),
            Value::Error(FormulaError::NotImplemented("BAHTTEXT".into()))
        );
    }
}
