//! Cell address and range types
//!
//! Rows and columns are 1-based everywhere in this crate: `A1` is row 1, column 1.
//! That is the coordinate system formulas are written in and the one handed to
//! cell/range accessors, so no off-by-one translation happens at the boundary.

use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};
use std::fmt;

/// A cell address (e.g., "A1", "$B$2")
///
/// The optional `$` prefix makes an axis absolute (it doesn't move when the
/// formula containing it is re-anchored).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellAddress {
    /// Row number (1-based)
    pub row: u32,
    /// Column number (1-based, A=1, B=2, ..., XFD=16384)
    pub col: u32,
    /// Whether the row reference is absolute ($)
    pub row_absolute: bool,
    /// Whether the column reference is absolute ($)
    pub col_absolute: bool,
}

impl CellAddress {
    /// Create a new cell address with relative references
    pub fn new(row: u32, col: u32) -> Self {
        Self {
            row,
            col,
            row_absolute: false,
            col_absolute: false,
        }
    }

    /// Create a new cell address with specified absolute/relative flags
    pub fn with_absolute(row: u32, col: u32, row_absolute: bool, col_absolute: bool) -> Self {
        Self {
            row,
            col,
            row_absolute,
            col_absolute,
        }
    }

    /// Create an absolute cell address ($A$1 style)
    pub fn absolute(row: u32, col: u32) -> Self {
        Self::with_absolute(row, col, true, true)
    }

    /// Parse a cell address from A1-style notation
    ///
    /// # Examples
    /// ```
    /// use cellcalc_core::CellAddress;
    ///
    /// let addr = CellAddress::parse("A1").unwrap();
    /// assert_eq!(addr.row, 1);
    /// assert_eq!(addr.col, 1);
    ///
    /// let addr = CellAddress::parse("$B$2").unwrap();
    /// assert_eq!(addr.row, 2);
    /// assert_eq!(addr.col, 2);
    /// assert!(addr.row_absolute);
    /// assert!(addr.col_absolute);
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidAddress("empty address".into()));
        }

        let bytes = s.as_bytes();
        let mut pos = 0;

        let col_absolute = if bytes.get(pos) == Some(&b'$') {
            pos += 1;
            true
        } else {
            false
        };

        let col_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_alphabetic() {
            pos += 1;
        }
        if pos == col_start {
            return Err(Error::InvalidAddress(format!("no column letters in '{s}'")));
        }
        let col = Self::letters_to_column(&s[col_start..pos])?;

        let row_absolute = if bytes.get(pos) == Some(&b'$') {
            pos += 1;
            true
        } else {
            false
        };

        let row_str = &s[pos..];
        if row_str.is_empty() {
            return Err(Error::InvalidAddress(format!("no row number in '{s}'")));
        }
        if !row_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidAddress(format!("invalid row number in '{s}'")));
        }
        let row: u32 = row_str
            .parse()
            .map_err(|_| Error::RowOutOfBounds(u32::MAX, MAX_ROWS))?;
        if row == 0 {
            return Err(Error::InvalidAddress(format!(
                "row number must be >= 1 in '{s}'"
            )));
        }
        if row > MAX_ROWS {
            return Err(Error::RowOutOfBounds(row, MAX_ROWS));
        }

        Ok(Self {
            row,
            col,
            row_absolute,
            col_absolute,
        })
    }

    /// Convert a column number to letters (1 = A, 26 = Z, 27 = AA, etc.)
    pub fn column_to_letters(col: u32) -> String {
        let mut result = String::new();
        let mut n = col;

        while n > 0 {
            n -= 1;
            let c = ((n % 26) as u8 + b'A') as char;
            result.insert(0, c);
            n /= 26;
        }

        result
    }

    /// Convert column letters to a column number (A = 1, Z = 26, AA = 27, etc.)
    pub fn letters_to_column(letters: &str) -> Result<u32> {
        if letters.is_empty() {
            return Err(Error::InvalidAddress("empty column letters".into()));
        }
        // XFD is three letters; anything longer is out of bounds even before overflow
        if letters.len() > 3 {
            return Err(Error::ColumnOutOfBounds(u32::MAX, MAX_COLS));
        }

        let mut col: u32 = 0;
        for c in letters.chars() {
            if !c.is_ascii_alphabetic() {
                return Err(Error::InvalidAddress(format!("invalid column letter '{c}'")));
            }
            col = col * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
        }

        if col > MAX_COLS {
            return Err(Error::ColumnOutOfBounds(col, MAX_COLS));
        }

        Ok(col)
    }

    /// Move this address by a row/column delta, leaving absolute axes untouched.
    ///
    /// Returns `None` when the moved address falls outside the sheet.
    pub fn offset(&self, rows: i64, cols: i64) -> Option<Self> {
        let row = if self.row_absolute {
            self.row as i64
        } else {
            self.row as i64 + rows
        };
        let col = if self.col_absolute {
            self.col as i64
        } else {
            self.col as i64 + cols
        };

        if row < 1 || row > MAX_ROWS as i64 || col < 1 || col > MAX_COLS as i64 {
            return None;
        }

        Some(Self {
            row: row as u32,
            col: col as u32,
            ..*self
        })
    }

    /// Same cell, ignoring the `$` flags
    pub fn same_cell(&self, other: &CellAddress) -> bool {
        self.row == other.row && self.col == other.col
    }

    /// Format as A1-style string
    pub fn to_a1_string(&self) -> String {
        let mut result = String::new();

        if self.col_absolute {
            result.push('$');
        }
        result.push_str(&Self::column_to_letters(self.col));

        if self.row_absolute {
            result.push('$');
        }
        result.push_str(&self.row.to_string());

        result
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

/// A rectangular range of cells (e.g., "A1:B10")
///
/// Always normalized: `start` is the top-left corner and `end` the bottom-right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellRange {
    /// Start address (top-left)
    pub start: CellAddress,
    /// End address (bottom-right)
    pub end: CellAddress,
}

impl CellRange {
    /// Create a new cell range
    pub fn new(start: CellAddress, end: CellAddress) -> Self {
        let (start_row, start_row_abs, end_row, end_row_abs) = if start.row <= end.row {
            (start.row, start.row_absolute, end.row, end.row_absolute)
        } else {
            (end.row, end.row_absolute, start.row, start.row_absolute)
        };
        let (start_col, start_col_abs, end_col, end_col_abs) = if start.col <= end.col {
            (start.col, start.col_absolute, end.col, end.col_absolute)
        } else {
            (end.col, end.col_absolute, start.col, start.col_absolute)
        };

        Self {
            start: CellAddress::with_absolute(start_row, start_col, start_row_abs, start_col_abs),
            end: CellAddress::with_absolute(end_row, end_col, end_row_abs, end_col_abs),
        }
    }

    /// Create a range from 1-based row/column numbers
    pub fn from_indices(start_row: u32, start_col: u32, end_row: u32, end_col: u32) -> Self {
        Self::new(
            CellAddress::new(start_row, start_col),
            CellAddress::new(end_row, end_col),
        )
    }

    /// Create a single-cell range
    pub fn single(addr: CellAddress) -> Self {
        Self {
            start: addr,
            end: addr,
        }
    }

    /// Whole columns, e.g. `A:C`
    pub fn columns(first: u32, last: u32) -> Self {
        Self::from_indices(1, first, MAX_ROWS, last)
    }

    /// Whole rows, e.g. `1:3`
    pub fn rows(first: u32, last: u32) -> Self {
        Self::from_indices(first, 1, last, MAX_COLS)
    }

    /// Parse a range from A1:B10 notation
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        if let Some((left, right)) = s.split_once(':') {
            let start = CellAddress::parse(left)?;
            let end = CellAddress::parse(right)?;
            Ok(Self::new(start, end))
        } else {
            let addr = CellAddress::parse(s)?;
            Ok(Self::single(addr))
        }
    }

    /// Check if a cell is within this range
    pub fn contains(&self, addr: &CellAddress) -> bool {
        addr.row >= self.start.row
            && addr.row <= self.end.row
            && addr.col >= self.start.col
            && addr.col <= self.end.col
    }

    /// Get the number of rows in the range
    pub fn row_count(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    /// Get the number of columns in the range
    pub fn col_count(&self) -> u32 {
        self.end.col - self.start.col + 1
    }

    /// Get the total number of cells in the range
    pub fn cell_count(&self) -> u64 {
        self.row_count() as u64 * self.col_count() as u64
    }

    /// True if the range covers exactly one cell
    pub fn is_single_cell(&self) -> bool {
        self.start.same_cell(&self.end)
    }

    /// Check if this range overlaps with another
    pub fn overlaps(&self, other: &CellRange) -> bool {
        self.start.row <= other.end.row
            && self.end.row >= other.start.row
            && self.start.col <= other.end.col
            && self.end.col >= other.start.col
    }

    /// Get the intersection of two ranges, if any
    pub fn intersect(&self, other: &CellRange) -> Option<CellRange> {
        if !self.overlaps(other) {
            return None;
        }

        Some(CellRange::from_indices(
            self.start.row.max(other.start.row),
            self.start.col.max(other.start.col),
            self.end.row.min(other.end.row),
            self.end.col.min(other.end.col),
        ))
    }

    /// Smallest range covering both
    pub fn union_bounds(&self, other: &CellRange) -> CellRange {
        CellRange::from_indices(
            self.start.row.min(other.start.row),
            self.start.col.min(other.start.col),
            self.end.row.max(other.end.row),
            self.end.col.max(other.end.col),
        )
    }

    /// Format as A1:B10 string
    pub fn to_a1_string(&self) -> String {
        if self.start == self.end {
            self.start.to_a1_string()
        } else {
            format!("{}:{}", self.start.to_a1_string(), self.end.to_a1_string())
        }
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_column_to_letters() {
        assert_eq!(CellAddress::column_to_letters(1), "A");
        assert_eq!(CellAddress::column_to_letters(2), "B");
        assert_eq!(CellAddress::column_to_letters(26), "Z");
        assert_eq!(CellAddress::column_to_letters(27), "AA");
        assert_eq!(CellAddress::column_to_letters(28), "AB");
        assert_eq!(CellAddress::column_to_letters(702), "ZZ");
        assert_eq!(CellAddress::column_to_letters(703), "AAA");
        assert_eq!(CellAddress::column_to_letters(16384), "XFD");
    }

    #[test]
    fn test_letters_to_column() {
        assert_eq!(CellAddress::letters_to_column("A").unwrap(), 1);
        assert_eq!(CellAddress::letters_to_column("Z").unwrap(), 26);
        assert_eq!(CellAddress::letters_to_column("AA").unwrap(), 27);
        assert_eq!(CellAddress::letters_to_column("ZZ").unwrap(), 702);
        assert_eq!(CellAddress::letters_to_column("XFD").unwrap(), 16384);
        assert_eq!(CellAddress::letters_to_column("aa").unwrap(), 27);

        assert!(CellAddress::letters_to_column("XFE").is_err());
        assert!(CellAddress::letters_to_column("ABCD").is_err());
    }

    #[test]
    fn test_cell_address_parse() {
        let addr = CellAddress::parse("A1").unwrap();
        assert_eq!(addr, CellAddress::new(1, 1));

        let addr = CellAddress::parse("$A$1").unwrap();
        assert_eq!(addr, CellAddress::absolute(1, 1));

        let addr = CellAddress::parse("$A1").unwrap();
        assert!(addr.col_absolute);
        assert!(!addr.row_absolute);

        let addr = CellAddress::parse("A$1").unwrap();
        assert!(!addr.col_absolute);
        assert!(addr.row_absolute);

        let addr = CellAddress::parse("XFD1048576").unwrap();
        assert_eq!(addr.row, 1_048_576);
        assert_eq!(addr.col, 16_384);
    }

    #[test]
    fn test_cell_address_parse_errors() {
        assert!(CellAddress::parse("").is_err());
        assert!(CellAddress::parse("A").is_err());
        assert!(CellAddress::parse("1").is_err());
        assert!(CellAddress::parse("A0").is_err());
        assert!(CellAddress::parse("A1048577").is_err());
        assert!(CellAddress::parse("XFE1").is_err());
        assert!(CellAddress::parse("A1B").is_err());
    }

    #[test]
    fn test_cell_address_display() {
        assert_eq!(CellAddress::new(1, 1).to_string(), "A1");
        assert_eq!(CellAddress::new(100, 3).to_string(), "C100");
        assert_eq!(CellAddress::absolute(1, 1).to_string(), "$A$1");
        assert_eq!(CellAddress::with_absolute(4, 2, true, false).to_string(), "B$4");
    }

    #[test]
    fn test_offset_respects_absolute_axes() {
        let addr = CellAddress::parse("B$2").unwrap();
        assert_eq!(addr.offset(3, 2).unwrap().to_string(), "D$2");

        let addr = CellAddress::parse("$B2").unwrap();
        assert_eq!(addr.offset(3, 2).unwrap().to_string(), "$B5");

        assert_eq!(CellAddress::parse("A1").unwrap().offset(-1, 0), None);
        assert_eq!(CellAddress::parse("XFD1").unwrap().offset(0, 1), None);
    }

    #[test]
    fn test_cell_range_parse_normalizes() {
        let range = CellRange::parse("B2:A1").unwrap();
        assert_eq!(range.start, CellAddress::new(1, 1));
        assert_eq!(range.end, CellAddress::new(2, 2));

        let range = CellRange::parse("C3").unwrap();
        assert!(range.is_single_cell());
    }

    #[test]
    fn test_cell_range_contains_and_intersect() {
        let range = CellRange::parse("B2:D4").unwrap();
        assert!(range.contains(&CellAddress::new(2, 2)));
        assert!(range.contains(&CellAddress::new(4, 4)));
        assert!(!range.contains(&CellAddress::new(1, 1)));

        let other = CellRange::parse("C3:F9").unwrap();
        assert_eq!(range.intersect(&other), Some(CellRange::parse("C3:D4").unwrap()));
        assert_eq!(range.intersect(&CellRange::parse("E5").unwrap()), None);
    }

    #[test]
    fn test_whole_rows_and_columns() {
        let cols = CellRange::columns(1, 3);
        assert_eq!(cols.row_count(), MAX_ROWS);
        assert_eq!(cols.col_count(), 3);

        let rows = CellRange::rows(2, 2);
        assert_eq!(rows.col_count(), MAX_COLS);
    }
}
