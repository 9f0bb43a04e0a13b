//! Criteria for conditional aggregates (COUNTIF, SUMIF)
//!
//! A criteria operand is either a comparison, written with an optional
//! leading operator (`">=55"`, `"<>"&A1`, `42`, `"TRUE"`), or a wildcard
//! pattern where `*` matches any run of characters, `?` a single character
//! and `~` escapes the next one (`"*es"`, `"~*"`).

use crate::value::{compare_values, parse_number, Value};
use regex::{Regex, RegexBuilder};
use std::cmp::Ordering;

/// Comparison operator of a criteria operand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CriteriaOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CriteriaOp {
    /// Operators in match order, two-character forms first
    const PREFIXES: [(&'static str, CriteriaOp); 6] = [
        (">=", CriteriaOp::Ge),
        ("<=", CriteriaOp::Le),
        ("<>", CriteriaOp::Ne),
        (">", CriteriaOp::Gt),
        ("<", CriteriaOp::Lt),
        ("=", CriteriaOp::Eq),
    ];

    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            CriteriaOp::Eq => ordering == Ordering::Equal,
            CriteriaOp::Ne => ordering != Ordering::Equal,
            CriteriaOp::Lt => ordering == Ordering::Less,
            CriteriaOp::Le => ordering != Ordering::Greater,
            CriteriaOp::Gt => ordering == Ordering::Greater,
            CriteriaOp::Ge => ordering != Ordering::Less,
        }
    }
}

/// A parsed criteria operand
#[derive(Debug, Clone)]
pub enum Criteria {
    Comparison { op: CriteriaOp, operand: Value },
    /// Case-insensitive whole-string match against text cells
    Wildcard(Regex),
}

impl Criteria {
    pub fn parse(raw: &Value) -> Self {
        let text = match raw.scalar() {
            Value::Text(s) => s,
            Value::Empty => return Self::equal_to(Value::text("")),
            other => return Self::equal_to(other.clone()),
        };

        for (prefix, op) in CriteriaOp::PREFIXES {
            if let Some(rest) = text.strip_prefix(prefix) {
                if op == CriteriaOp::Eq {
                    return Self::equal_to_text(rest);
                }
                return Criteria::Comparison {
                    op,
                    operand: retype(rest),
                };
            }
        }
        Self::equal_to_text(text)
    }

    /// Equality with operand text; non-empty text that stays text is a wildcard pattern
    fn equal_to_text(text: &str) -> Self {
        let operand = retype(text);
        if !matches!(operand, Value::Text(_)) || text.is_empty() {
            return Self::equal_to(operand);
        }
        match wildcard_regex(text) {
            Ok(re) => Criteria::Wildcard(re),
            Err(_) => Self::equal_to(operand),
        }
    }

    fn equal_to(operand: Value) -> Self {
        Criteria::Comparison {
            op: CriteriaOp::Eq,
            operand,
        }
    }

    /// Does a cell value satisfy the criteria
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Criteria::Wildcard(re) => matches!(value, Value::Text(s) if re.is_match(s)),
            Criteria::Comparison { op, operand } => match (value, operand) {
                (Value::Empty, _) => {
                    let blank_operand = matches!(operand, Value::Text(s) if s.is_empty());
                    match op {
                        CriteriaOp::Eq => blank_operand,
                        CriteriaOp::Ne => !blank_operand,
                        _ => false,
                    }
                }
                (Value::Error(e), Value::Error(wanted)) => match op {
                    CriteriaOp::Eq => e == wanted,
                    CriteriaOp::Ne => e != wanted,
                    _ => false,
                },
                (Value::Error(_), _) | (_, Value::Error(_)) => *op == CriteriaOp::Ne,
                _ => op.accepts(compare_values(value, operand)),
            },
        }
    }
}

/// Operand text as the value it reads as
fn retype(s: &str) -> Value {
    if s.eq_ignore_ascii_case("TRUE") {
        Value::Boolean(true)
    } else if s.eq_ignore_ascii_case("FALSE") {
        Value::Boolean(false)
    } else if let Some(n) = parse_number(s) {
        Value::Number(n)
    } else {
        Value::text(s)
    }
}

/// Regex body for a wildcard pattern, unanchored
pub(crate) fn wildcard_pattern(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '~' => match chars.next() {
                Some(escaped) => out.push_str(&regex::escape(&escaped.to_string())),
                None => out.push('~'),
            },
            c => out.push_str(&regex::escape(&c.to_string())),
        }
    }
    out
}

/// Whole-string, case-insensitive regex for a wildcard pattern
pub(crate) fn wildcard_regex(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(&format!("^(?:{})$", wildcard_pattern(pattern)))
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FormulaError;
    use pretty_assertions::assert_eq;

    fn criteria(s: &str) -> Criteria {
        Criteria::parse(&Value::text(s))
    }

    #[test]
    fn test_comparison_operators() {
        let ge = criteria(">=55");
        assert!(ge.matches(&Value::Number(55.0)));
        assert!(ge.matches(&Value::Number(90.0)));
        assert!(!ge.matches(&Value::Number(40.0)));

        let lt = criteria("<10");
        assert!(lt.matches(&Value::Number(-3.0)));
        assert!(!lt.matches(&Value::Empty));

        // Mixed types follow the comparison order: numbers < text < booleans
        assert!(!lt.matches(&Value::text("5")));
        assert!(criteria(">10").matches(&Value::text("abc")));
        assert!(criteria(">zzz").matches(&Value::Boolean(false)));

        let ne = criteria("<>5");
        assert!(ne.matches(&Value::Number(6.0)));
        assert!(ne.matches(&Value::text("five")));
        assert!(ne.matches(&Value::Empty));
        assert!(!ne.matches(&Value::Number(5.0)));
    }

    #[test]
    fn test_operand_retyping() {
        match criteria(">=1e3") {
            Criteria::Comparison { op, operand } => {
                assert_eq!(op, CriteriaOp::Ge);
                assert_eq!(operand, Value::Number(1000.0));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(criteria("=TRUE").matches(&Value::Boolean(true)));
        assert!(!criteria("=TRUE").matches(&Value::text("TRUE")));
        assert!(criteria("true").matches(&Value::Boolean(true)));
        assert!(criteria("=apple").matches(&Value::text("APPLE")));
        assert!(criteria(">b").matches(&Value::text("carrot")));
    }

    #[test]
    fn test_scalar_operands() {
        let five = Criteria::parse(&Value::Number(5.0));
        assert!(five.matches(&Value::Number(5.0)));
        assert!(!five.matches(&Value::text("5")));
        assert!(!five.matches(&Value::Boolean(true)));

        assert!(criteria("5").matches(&Value::Number(5.0)));

        let err = Criteria::parse(&Value::Error(FormulaError::Div0));
        assert!(err.matches(&Value::Error(FormulaError::Div0)));
        assert!(!err.matches(&Value::Error(FormulaError::NotAvailable)));
    }

    #[test]
    fn test_wildcards() {
        let es = criteria("*es");
        assert!(es.matches(&Value::text("apples")));
        assert!(es.matches(&Value::text("PEACHES")));
        assert!(!es.matches(&Value::text("apple")));
        assert!(!es.matches(&Value::Number(5.0)));

        let q = criteria("a?ple");
        assert!(q.matches(&Value::text("apple")));
        assert!(!q.matches(&Value::text("aple")));

        let escaped = criteria("what~?");
        assert!(escaped.matches(&Value::text("what?")));
        assert!(!escaped.matches(&Value::text("whatsup")));

        let meta = criteria("1+1 (sum)");
        assert!(meta.matches(&Value::text("1+1 (SUM)")));
    }

    #[test]
    fn test_blank_criteria() {
        let blank = criteria("");
        assert!(blank.matches(&Value::Empty));
        assert!(blank.matches(&Value::text("")));
        assert!(!blank.matches(&Value::Number(0.0)));

        let not_blank = criteria("<>");
        assert!(!not_blank.matches(&Value::Empty));
        assert!(not_blank.matches(&Value::Number(0.0)));

        assert!(criteria("=").matches(&Value::Empty));
    }

    #[test]
    fn test_equals_prefix_wildcards() {
        let ap = criteria("=ap*");
        assert!(ap.matches(&Value::text("apple")));
        assert!(ap.matches(&Value::text("APRICOT")));
        assert!(!ap.matches(&Value::text("bob")));

        assert!(criteria("=b?b").matches(&Value::text("bob")));
        assert!(criteria("=~*").matches(&Value::text("*")));
        assert!(!criteria("=~*").matches(&Value::text("x")));
        assert!(criteria("=5").matches(&Value::Number(5.0)));
    }

    #[test]
    fn test_wildcard_pattern() {
        assert_eq!(wildcard_pattern("a*b?"), "a.*b.");
        assert_eq!(wildcard_pattern("~*x.y"), r"\*x\.y");
        assert_eq!(wildcard_pattern("~"), "~");
    }
}
