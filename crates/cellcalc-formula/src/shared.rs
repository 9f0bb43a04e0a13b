//! Shared formula expansion
//!
//! A shared formula is stored once for its anchor cell; every other cell of
//! the block uses the same text with its relative references moved by the
//! cell's offset from the anchor.

use cellcalc_core::{CellAddress, MAX_ROWS};
use lazy_regex::{regex, Captures};

/// Re-anchor a formula by a row and column offset
///
/// References without `$` move; absolute axes stay. Text inside string
/// literals and quoted sheet names, function names such as `LOG10(`, sheet
/// prefixes and reference-shaped parts of longer identifiers are left as
/// they are. A reference pushed off the sheet becomes `#REF!`.
///
/// ```rust
/// use cellcalc_formula::expand_shared_formula;
///
/// assert_eq!(expand_shared_formula("=A1+$B$2*B$3", 2, 1), "=B3+$B$2*C$3");
/// ```
pub fn expand_shared_formula(formula: &str, row_offset: i64, col_offset: i64) -> String {
    if row_offset == 0 && col_offset == 0 {
        return formula.to_string();
    }

    let bytes = formula.as_bytes();
    let mut out = String::with_capacity(formula.len() + 8);
    let mut plain_start = 0;
    let mut i = 0;
    while i < bytes.len() {
        let quote = bytes[i];
        if quote != b'"' && quote != b'\'' {
            i += 1;
            continue;
        }
        out.push_str(&shift_references(&formula[plain_start..i], row_offset, col_offset));
        let end = closing_quote(bytes, i);
        out.push_str(&formula[i..end]);
        i = end;
        plain_start = end;
    }
    out.push_str(&shift_references(&formula[plain_start..], row_offset, col_offset));
    out
}

/// Index just past the quote that closes the one at `open`; doubled quotes
/// are escapes
fn closing_quote(bytes: &[u8], open: usize) -> usize {
    let quote = bytes[open];
    let mut j = open + 1;
    while j < bytes.len() {
        if bytes[j] == quote {
            if bytes.get(j + 1) == Some(&quote) {
                j += 2;
                continue;
            }
            return j + 1;
        }
        j += 1;
    }
    bytes.len()
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

fn shift_references(text: &str, rows: i64, cols: i64) -> String {
    let pattern = regex!(r"(\$)?([A-Z]+)(\$)?([0-9]+)(\()?");
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in pattern.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let before = text[..whole.start()].chars().next_back();
        let after = text[whole.end()..].chars().next();
        let glued = before.is_some_and(is_identifier_char)
            || after.is_some_and(|c| is_identifier_char(c) || c == '!');
        if caps.get(5).is_some() || glued {
            continue;
        }
        let Some(address) = reference_address(&caps) else {
            continue;
        };

        out.push_str(&text[last..whole.start()]);
        match address.offset(rows, cols) {
            Some(moved) => out.push_str(&moved.to_a1_string()),
            None => out.push_str("#REF!"),
        }
        last = whole.end();
    }
    out.push_str(&text[last..]);
    out
}

/// The address a reference match names, if it is inside the sheet
fn reference_address(caps: &Captures<'_>) -> Option<CellAddress> {
    let letters = caps.get(2)?.as_str();
    if letters.len() > 3 {
        return None;
    }
    let col = CellAddress::letters_to_column(letters).ok()?;
    let row: u32 = caps.get(4)?.as_str().parse().ok()?;
    if row == 0 || row > MAX_ROWS {
        return None;
    }
    Some(CellAddress::with_absolute(
        row,
        col,
        caps.get(3).is_some(),
        caps.get(1).is_some(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_relative_and_absolute_axes() {
        assert_eq!(expand_shared_formula("=A1", 1, 0), "=A2");
        assert_eq!(expand_shared_formula("=A1", 0, 2), "=C1");
        assert_eq!(expand_shared_formula("=$A1+A$1+$A$1", 3, 3), "=$A4+D$1+$A$1");
        assert_eq!(expand_shared_formula("=SUM(B2:C5)*2", -1, 1), "=SUM(C1:D4)*2");
    }

    #[test]
    fn test_zero_offset_is_identity() {
        let text = "=IF(A1>0,\"B2\",LOG10(C3))";
        assert_eq!(expand_shared_formula(text, 0, 0), text);
    }

    #[test]
    fn test_function_names_untouched() {
        assert_eq!(expand_shared_formula("=LOG10(A1)+ATAN2(B1,C1)", 1, 0), "=LOG10(A2)+ATAN2(B2,C2)");
        assert_eq!(expand_shared_formula("=DEC2BIN(A1)", 0, 1), "=DEC2BIN(B1)");
    }

    #[test]
    fn test_strings_and_sheets_untouched() {
        assert_eq!(
            expand_shared_formula("=\"A1\"&A1&\"say \"\"B2\"\"\"", 1, 0),
            "=\"A1\"&A2&\"say \"\"B2\"\"\""
        );
        assert_eq!(expand_shared_formula("=SHEET1!A1+'Q1 2024'!B2", 1, 1), "=SHEET1!B2+'Q1 2024'!C3");
    }

    #[test]
    fn test_identifiers_untouched() {
        assert_eq!(expand_shared_formula("=TAXES2024*A1", 1, 0), "=TAXES2024*A2");
        assert_eq!(expand_shared_formula("=my_A1+A1", 1, 0), "=my_A1+A2");
        assert_eq!(expand_shared_formula("=1.5E10+A1", 1, 0), "=1.5E10+A2");
    }

    #[test]
    fn test_out_of_sheet_is_ref_error() {
        assert_eq!(expand_shared_formula("=A1+B5", -2, 0), "=#REF!+B3");
        assert_eq!(expand_shared_formula("=XFD1", 0, 1), "=#REF!");
        assert_eq!(expand_shared_formula("=A1048576", 1, 0), "=#REF!");
        // Not a cell reference at all: too many column letters
        assert_eq!(expand_shared_formula("=ABCD1", 1, 0), "=ABCD1");
    }

    fn reference() -> impl Strategy<Value = String> {
        (100u32..5000, 100u32..2000, any::<bool>(), any::<bool>()).prop_map(|(row, col, ra, ca)| {
            CellAddress::with_absolute(row, col, ra, ca).to_a1_string()
        })
    }

    proptest! {
        #[test]
        fn prop_expansion_round_trips(
            a in reference(),
            b in reference(),
            dr in -99i64..99,
            dc in -99i64..99,
        ) {
            let formula = format!("=SUM({a}:{b})+LOG10({a})&\"{b}\"");
            let there = expand_shared_formula(&formula, dr, dc);
            let back = expand_shared_formula(&there, -dr, -dc);
            prop_assert_eq!(back, formula);
        }

        #[test]
        fn prop_absolute_references_never_move(
            row in 1u32..MAX_ROWS,
            col in 1u32..16_384,
            dr in -1000i64..1000,
            dc in -1000i64..1000,
        ) {
            let text = format!("={}", CellAddress::absolute(row, col));
            prop_assert_eq!(expand_shared_formula(&text, dr, dc), text);
        }
    }
}
