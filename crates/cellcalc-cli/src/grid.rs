//! JSON cell grids
//!
//! A grid file maps sheet names to row-major arrays of scalars; `""` names
//! the sheet unqualified references read from.
//!
//! ```json
//! { "": [[1, 2], ["x", true]], "Rates": [[0.2]] }
//! ```

use anyhow::{bail, Context, Result};
use cellcalc_core::{MAX_COLS, MAX_ROWS};
use cellcalc_formula::error::AccessError;
use cellcalc_formula::{CellRef, FormulaError, RangeRef, Value};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Default)]
pub struct Grid {
    sheets: HashMap<String, Vec<Vec<Value>>>,
}

impl Grid {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read grid '{}'", path.display()))?;
        Self::from_json(&text).with_context(|| format!("Invalid grid '{}'", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let doc: serde_json::Value = serde_json::from_str(text)?;
        let serde_json::Value::Object(sheets) = doc else {
            bail!("expected an object mapping sheet names to rows");
        };

        let mut grid = Grid::default();
        for (name, rows) in sheets {
            let serde_json::Value::Array(rows) = rows else {
                bail!("sheet '{name}' is not an array of rows");
            };
            let mut values = Vec::with_capacity(rows.len());
            for (i, row) in rows.into_iter().enumerate() {
                let serde_json::Value::Array(cells) = row else {
                    bail!("row {} of sheet '{name}' is not an array", i + 1);
                };
                let row = cells
                    .into_iter()
                    .map(scalar)
                    .collect::<Result<Vec<_>>>()
                    .with_context(|| format!("row {} of sheet '{name}'", i + 1))?;
                values.push(row);
            }
            grid.sheets.insert(name, values);
        }
        Ok(grid)
    }

    fn sheet(&self, name: Option<&str>) -> Result<&[Vec<Value>], AccessError> {
        let key = name.unwrap_or("");
        match self.sheets.get(key) {
            Some(rows) => Ok(rows.as_slice()),
            None if key.is_empty() => Ok(&[]),
            None => Err(format!("unknown sheet '{key}'").into()),
        }
    }

    pub fn cell(&self, cell: &CellRef) -> Result<Value, AccessError> {
        let rows = self.sheet(cell.sheet.as_deref())?;
        Ok(lookup(rows, cell.address.row, cell.address.col))
    }

    /// Values of a range; whole rows and columns stop at the sheet's data
    pub fn range(&self, area: &RangeRef) -> Result<Vec<Vec<Value>>, AccessError> {
        let rows = self.sheet(area.sheet.as_deref())?;
        let start = area.range.start;
        let mut end = area.range.end;
        if end.row == MAX_ROWS {
            end.row = (rows.len() as u32).max(start.row);
        }
        if end.col == MAX_COLS {
            let width = rows.iter().map(Vec::len).max().unwrap_or(0) as u32;
            end.col = width.max(start.col);
        }

        Ok((start.row..=end.row)
            .map(|r| (start.col..=end.col).map(|c| lookup(rows, r, c)).collect())
            .collect())
    }
}

fn lookup(rows: &[Vec<Value>], row: u32, col: u32) -> Value {
    rows.get(row as usize - 1)
        .and_then(|cells| cells.get(col as usize - 1))
        .cloned()
        .unwrap_or(Value::Empty)
}

fn scalar(json: serde_json::Value) -> Result<Value> {
    Ok(match json {
        serde_json::Value::Null => Value::Empty,
        serde_json::Value::Bool(b) => Value::Boolean(b),
        serde_json::Value::Number(n) => match n.as_f64() {
            Some(n) => Value::Number(n),
            None => bail!("number {n} is out of range"),
        },
        serde_json::Value::String(s) => match FormulaError::from_literal(&s) {
            Some(e) => Value::Error(e),
            None => Value::Text(s),
        },
        other => bail!("cells must be scalars, got {other}"),
    })
}
