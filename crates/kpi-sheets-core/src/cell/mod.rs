//! Cell-related types and utilities
//!
//! This module contains:
//! - [`CellValue`] - The value stored in a cell
//! - [`GridAddress`] - A cell's location (e.g., "B3"), 1-indexed
//! - [`GridRange`] - A rectangle of cells (e.g., "B3:F11")
//! - [`GridRegion`] - A report region whose column extent is discovered at use time
//! - [`CellData`] - Complete cell data including value and style

mod address;
mod value;

pub use address::{GridAddress, GridRange, GridRangeIterator, GridRegion};
pub use value::{CellData, CellValue};
