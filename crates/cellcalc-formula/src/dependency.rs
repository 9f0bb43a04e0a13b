//! Dependency tracking for recalculation
//!
//! [`references`] lists what a formula reads. [`ReferenceTable`] records, per
//! precedent area, which formula cells read it. Only direct edges are stored;
//! walking them transitively and ordering recalculation is up to the caller.

use crate::ast::{Expr, Reference};
use ahash::{AHashMap, AHashSet};
use cellcalc_core::{CellAddress, CellRange, Error, Result};

/// Every reference in a formula, in source order
///
/// Unions are flattened and defined names skipped. Both operands of a
/// dynamic range or intersection are listed.
pub fn references(expr: &Expr) -> Vec<Reference> {
    let mut out = Vec::new();
    collect(expr, &mut out);
    out
}

fn collect(expr: &Expr, out: &mut Vec<Reference>) {
    match expr {
        Expr::Cell(cell) => out.push(Reference::Cell(cell.clone())),
        Expr::Range(range) => out.push(Reference::Range(range.clone())),
        Expr::Union(parts) => parts.iter().for_each(|p| collect(p, out)),
        Expr::Array(rows) => rows.iter().flatten().for_each(|e| collect(e, out)),
        Expr::Unary { operand, .. } | Expr::Percent(operand) => collect(operand, out),
        Expr::Binary { left, right, .. } => {
            collect(left, out);
            collect(right, out);
        }
        Expr::Call { args, .. } => args.iter().for_each(|a| collect(a, out)),
        Expr::Number(_)
        | Expr::Text(_)
        | Expr::Boolean(_)
        | Expr::Error(_)
        | Expr::Name(_)
        | Expr::Omitted => {}
    }
}

/// A cell on a sheet, row and column folded into one integer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellKey {
    pub sheet: usize,
    pub key: u64,
}

impl CellKey {
    const ROW_STRIDE: u64 = 100_000;

    pub fn new(sheet: usize, row: u32, col: u32) -> Self {
        Self {
            sheet,
            key: fold(row, col),
        }
    }

    pub fn from_address(sheet: usize, address: &CellAddress) -> Self {
        Self::new(sheet, address.row, address.col)
    }

    pub fn row(&self) -> u32 {
        (self.key / Self::ROW_STRIDE) as u32
    }

    pub fn col(&self) -> u32 {
        (self.key % Self::ROW_STRIDE) as u32
    }
}

fn fold(row: u32, col: u32) -> u64 {
    u64::from(row) * CellKey::ROW_STRIDE + u64::from(col)
}

/// A precedent area: sheet plus folded top-left and bottom-right corners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct AreaKey {
    sheet: usize,
    from: u64,
    to: u64,
}

impl AreaKey {
    fn new(sheet: usize, range: &CellRange) -> Self {
        Self {
            sheet,
            from: fold(range.start.row, range.start.col),
            to: fold(range.end.row, range.end.col),
        }
    }

    fn range(&self) -> CellRange {
        let corner = |key: u64| CellKey { sheet: self.sheet, key };
        let (from, to) = (corner(self.from), corner(self.to));
        CellRange::from_indices(from.row(), from.col(), to.row(), to.col())
    }
}

/// Precedent area -> dependent cells
#[derive(Debug, Default)]
pub struct ReferenceTable {
    sheets: Vec<String>,
    dependents: AHashMap<AreaKey, Vec<CellKey>>,
    /// Dependent -> the areas it was recorded against
    precedents: AHashMap<CellKey, AHashSet<AreaKey>>,
}

impl ReferenceTable {
    /// A table over the given sheets; sheet indexes follow their order
    pub fn new<I, S>(sheet_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sheets: sheet_names.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Index of a sheet name (case-insensitive)
    pub fn sheet_index(&self, name: &str) -> Result<usize> {
        self.sheets
            .iter()
            .position(|s| s.eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::SheetNotFound(name.to_string()))
    }

    /// Areas of a reference; unqualified parts land on `default_sheet`
    fn areas(&self, reference: &Reference, default_sheet: usize) -> Result<Vec<AreaKey>> {
        match reference {
            Reference::Union(parts) => {
                let mut out = Vec::with_capacity(parts.len());
                for part in parts {
                    out.extend(self.areas(part, default_sheet)?);
                }
                Ok(out)
            }
            single => {
                let sheet = match single.sheet() {
                    Some(name) => self.sheet_index(name)?,
                    None => default_sheet,
                };
                Ok(single
                    .area()
                    .map(|range| AreaKey::new(sheet, &range))
                    .into_iter()
                    .collect())
            }
        }
    }

    /// Record that `dependent` reads `precedent`
    ///
    /// An unqualified precedent is taken to be on the dependent's sheet.
    pub fn add(&mut self, precedent: &Reference, dependent: CellKey) -> Result<()> {
        for area in self.areas(precedent, dependent.sheet)? {
            self.link(area, dependent);
        }
        log::debug!("{precedent} -> sheet {} cell {}", dependent.sheet, dependent.key);
        Ok(())
    }

    fn link(&mut self, area: AreaKey, dependent: CellKey) {
        let cells = self.dependents.entry(area).or_default();
        if !cells.contains(&dependent) {
            cells.push(dependent);
        }
        self.precedents.entry(dependent).or_default().insert(area);
    }

    /// Record every reference of a formula; returns how many were found
    ///
    /// All sheets are resolved first, so an unknown sheet records nothing.
    pub fn register(&mut self, expr: &Expr, dependent: CellKey) -> Result<usize> {
        let refs = references(expr);
        let mut areas = Vec::with_capacity(refs.len());
        for reference in &refs {
            areas.extend(self.areas(reference, dependent.sheet)?);
        }
        for area in areas {
            self.link(area, dependent);
        }
        log::debug!("{} references -> sheet {} cell {}", refs.len(), dependent.sheet, dependent.key);
        Ok(refs.len())
    }

    /// Cells that read any part of `reference`, sorted and de-duplicated
    pub fn get(&self, reference: &Reference, default_sheet: usize) -> Result<Vec<CellKey>> {
        let wanted = self.areas(reference, default_sheet)?;
        let mut out: Vec<CellKey> = self
            .dependents
            .iter()
            .filter(|(area, _)| {
                wanted
                    .iter()
                    .any(|w| w.sheet == area.sheet && w.range().overlaps(&area.range()))
            })
            .flat_map(|(_, cells)| cells.iter().copied())
            .collect();
        out.sort_unstable();
        out.dedup();
        Ok(out)
    }

    /// Cells that read the given cell
    pub fn dependents_of(&self, cell: CellKey) -> Vec<CellKey> {
        let target = AreaKey {
            sheet: cell.sheet,
            from: cell.key,
            to: cell.key,
        }
        .range();
        let mut out: Vec<CellKey> = self
            .dependents
            .iter()
            .filter(|(area, _)| area.sheet == cell.sheet && area.range().overlaps(&target))
            .flat_map(|(_, cells)| cells.iter().copied())
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Drop every edge whose precedent is exactly `reference`; returns the
    /// number of edges removed
    pub fn remove(&mut self, reference: &Reference, default_sheet: usize) -> Result<usize> {
        let mut removed = 0;
        for area in self.areas(reference, default_sheet)? {
            let Some(cells) = self.dependents.remove(&area) else {
                continue;
            };
            for cell in &cells {
                if let Some(areas) = self.precedents.get_mut(cell) {
                    areas.remove(&area);
                    if areas.is_empty() {
                        self.precedents.remove(cell);
                    }
                }
            }
            removed += cells.len();
        }
        log::debug!("removed {removed} edges for {reference}");
        Ok(removed)
    }

    /// Drop every edge into `dependent`, for a formula that was cleared or
    /// replaced; returns the number of edges removed
    pub fn remove_dependent(&mut self, dependent: CellKey) -> usize {
        let Some(areas) = self.precedents.remove(&dependent) else {
            return 0;
        };
        for area in &areas {
            if let Some(cells) = self.dependents.get_mut(area) {
                cells.retain(|c| *c != dependent);
                if cells.is_empty() {
                    self.dependents.remove(area);
                }
            }
        }
        log::debug!("removed {} edges into sheet {} cell {}", areas.len(), dependent.sheet, dependent.key);
        areas.len()
    }

    /// Number of edges
    pub fn len(&self) -> usize {
        self.dependents.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.dependents.is_empty()
    }

    pub fn clear(&mut self) {
        self.dependents.clear();
        self.precedents.clear();
    }
}
