//! Error types for cellcalc-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading A1-style addresses
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Invalid cell address format
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    /// Invalid cell range format
    #[error("Invalid cell range: {0}")]
    InvalidRange(String),

    /// Row number out of bounds
    #[error("Row {0} out of bounds (max: {1})")]
    RowOutOfBounds(u32, u32),

    /// Column number out of bounds
    #[error("Column {0} out of bounds (max: {1})")]
    ColumnOutOfBounds(u32, u32),

    /// Sheet not found by name
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),
}
