//! Helpers shared by the unit tests

use crate::engine::{Engine, EngineConfig};
use crate::value::Value;
use ahash::AHashMap;
use cellcalc_core::{CellAddress, MAX_COLS, MAX_ROWS};
use std::rc::Rc;

/// Evaluate with default accessors
pub fn eval(formula: &str) -> Value {
    Engine::default()
        .parse(formula, None)
        .unwrap_or_else(|e| panic!("{formula}: {e}"))
        .result
}

pub fn eval_num(formula: &str) -> f64 {
    match eval(formula) {
        Value::Number(n) => n,
        other => panic!("{formula}: expected a number, got {other:?}"),
    }
}

pub fn assert_approx(actual: f64, expected: f64) {
    let tolerance = 1e-9 * expected.abs().max(1.0);
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected}, got {actual}"
    );
}

/// Engine reading from a sparse grid; missing cells are blank
///
/// Whole-row and whole-column ranges are clipped to the populated area.
pub fn grid_engine(cells: &[(&str, Value)]) -> Engine {
    let mut grid = AHashMap::new();
    for (name, value) in cells {
        let address = CellAddress::parse(name).unwrap_or_else(|e| panic!("{name}: {e}"));
        grid.insert((address.row, address.col), value.clone());
    }
    let max_row = grid.keys().map(|&(r, _)| r).max().unwrap_or(1);
    let max_col = grid.keys().map(|&(_, c)| c).max().unwrap_or(1);
    let grid = Rc::new(grid);

    let cell_grid = Rc::clone(&grid);
    let config = EngineConfig::default()
        .with_cell_accessor(move |cell| {
            let key = (cell.address.row, cell.address.col);
            Ok(cell_grid.get(&key).cloned().unwrap_or(Value::Empty))
        })
        .with_range_accessor(move |area| {
            let range = &area.range;
            let mut last_row = range.end.row;
            let mut last_col = range.end.col;
            if last_row == MAX_ROWS {
                last_row = max_row.max(range.start.row);
            }
            if last_col == MAX_COLS {
                last_col = max_col.max(range.start.col);
            }
            let rows = (range.start.row..=last_row)
                .map(|r| {
                    (range.start.col..=last_col)
                        .map(|c| grid.get(&(r, c)).cloned().unwrap_or(Value::Empty))
                        .collect()
                })
                .collect();
            Ok(rows)
        });
    Engine::new(config)
}
