//! # kpi-sheets-core
//!
//! Core data structures for the kpi-sheets report pipeline.
//!
//! This crate provides the fundamental types used throughout kpi-sheets:
//! - [`GridAddress`], [`GridRange`] and [`GridRegion`] - 1-indexed sheet coordinates
//! - [`CellValue`] - Values stored in a sheet cell
//! - [`Table`] and [`MetricTable`] - Tabular data read from and written to a sheet
//! - [`ReportBlockDescriptor`] - Static placement and row classes of one report block
//! - [`Style`] - Cell formatting (fonts, fills, borders, etc.)
//! - [`Workbook`], [`Worksheet`] - An in-memory grid document
//!
//! ## Example
//!
//! ```rust
//! use kpi_sheets_core::{CellValue, GridAddress, Worksheet};
//!
//! let mut sheet = Worksheet::new("Week Summary");
//! sheet.set_value(GridAddress::new(3, 2), "Active Users");
//! sheet.set_value(GridAddress::new(3, 3), "01-Mar to 07-Mar");
//!
//! assert_eq!(sheet.last_used_col(3), 3);
//! assert_eq!(sheet.value(GridAddress::new(3, 2)), CellValue::text("Active Users"));
//! ```

pub mod cell;
pub mod descriptor;
pub mod error;
pub mod style;
pub mod table;
pub mod workbook;
pub mod worksheet;

// Re-exports for convenience
pub use cell::{CellData, CellValue, GridAddress, GridRange, GridRegion};
pub use descriptor::{BlockLayout, RegionSpans, ReportBlockDescriptor};
pub use error::{Error, Result};
pub use table::{MetricRow, MetricTable, Table, REGION_COLUMN};
pub use workbook::Workbook;
pub use worksheet::Worksheet;

// Re-export all style types for convenience
pub use style::{
    Alignment, BorderEdge, BorderLineStyle, BorderStyle, Color, FillStyle, FontStyle,
    HorizontalAlignment, NumberFormat, RangeBorders, Style, StylePool, VerticalAlignment,
};

/// Maximum number of rows in a worksheet
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet
pub const MAX_COLS: u32 = 18_278;
