//! Error types for kpi-sheets-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in kpi-sheets-core
#[derive(Debug, Error)]
pub enum Error {
    /// Row index out of bounds
    #[error("Row index {0} out of bounds (valid: 1..={1})")]
    RowOutOfBounds(u32, u32),

    /// Column index out of bounds
    #[error("Column index {0} out of bounds (valid: 1..={1})")]
    ColumnOutOfBounds(u32, u32),

    /// Worksheet not found by title
    #[error("Worksheet not found: {0}")]
    SheetNotFound(String),

    /// Duplicate worksheet title
    #[error("Worksheet title already exists: {0}")]
    DuplicateSheetName(String),

    /// A table column that was looked up by name does not exist
    #[error("Column '{0}' not found in table")]
    ColumnNotFound(String),

    /// A table row has a different number of cells than the table has columns
    #[error("Row {row} has {actual} cells, expected {expected}")]
    RowWidthMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },
}
