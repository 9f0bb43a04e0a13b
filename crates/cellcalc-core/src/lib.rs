//! # cellcalc-core
//!
//! Addressing primitives shared by the cellcalc crates.
//!
//! - [`CellAddress`] - A cell's location (e.g., "A1", "$B$2"), 1-based
//! - [`CellRange`] - A normalized rectangle of cells (e.g., "A1:B10")
//!
//! ## Example
//!
//! ```rust
//! use cellcalc_core::{CellAddress, CellRange};
//!
//! let addr = CellAddress::parse("$C7").unwrap();
//! assert_eq!((addr.row, addr.col), (7, 3));
//! assert_eq!(addr.offset(2, 5).unwrap().to_string(), "$C9");
//!
//! let range = CellRange::parse("A1:B3").unwrap();
//! assert_eq!(range.cell_count(), 6);
//! ```

pub mod address;
pub mod error;

pub use address::{CellAddress, CellRange};
pub use error::{Error, Result};

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u32 = 16_384;
