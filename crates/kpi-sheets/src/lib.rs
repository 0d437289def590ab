//! # kpi-sheets
//!
//! Computes KPI report blocks from warehouse datasets and reconciles them
//! into a live spreadsheet, one time bucket at a time.
//!
//! Each report block owns a fixed region of a worksheet. The first column
//! holds row labels and every further column is one historical bucket (a
//! day, an ISO week or a calendar month). A run computes the newest bucket,
//! merges it into the region without disturbing history, and re-applies the
//! block's formatting over the region's live width.
//!
//! ## Features
//!
//! - Region reconciliation: append a new bucket column or overwrite the
//!   current one, matching rows by label
//! - Block formatting over dynamically sized ranges, including the merged
//!   macro-region cells of city blocks
//! - City aggregation into a fixed North/South/West layout with subtotals
//! - Parameterized segment breakdowns and membership cohorts
//! - CSV export warehouse with an on-disk extract cache
//! - JSON workbook documents as the concrete sheet backend
//!
//! ## Example
//!
//! ```rust
//! use kpi_sheets::prelude::*;
//!
//! let mut sheet = Worksheet::new("Week Summary");
//! let block = ReportBlockDescriptor::new("Active Users", GridAddress::new(3, 2), 5);
//! let table = MetricTable::new("Active Users", "04-Mar to 10-Mar")
//!     .with_row(MetricRow::new("Users", 120.0))
//!     .with_row(MetricRow::new("DP members", 30.0));
//!
//! let reconciled = RegionReconciler::update(&mut sheet, &block, &table).unwrap();
//! assert_eq!(reconciled.placement, Placement::Initialized);
//! assert_eq!(sheet.value(GridAddress::new(4, 3)), CellValue::Number(120.0));
//! ```

pub mod catalog;
pub mod config;
pub mod document;
pub mod error;
pub mod format;
pub mod membership;
pub mod metrics;
pub mod period;
pub mod pipeline;
pub mod prelude;
pub mod reconcile;
pub mod regional;
pub mod sheet;
pub mod source;

pub use catalog::{CatalogKind, MetricSource, ReportBlock, ReportCatalog, CITY_COLUMN};
pub use config::{Config, WorksheetTitles};
pub use document::WorkbookDocumentIo;
pub use error::{Error, Result};
pub use format::{plan, FormatKind, FormatStep, SheetFormats, TableFormatter};
pub use membership::{Cohort, MembershipClassifier};
pub use metrics::{Aggregation, BucketInputs, Breakdown, Filter, Line};
pub use period::{BucketWindow, Period};
pub use pipeline::{clear, BucketSummary, Pipeline, RunSummary};
pub use reconcile::{Placement, Reconciled, RegionReconciler};
pub use regional::{CityTaxonomy, MacroRegion, RegionalAggregator, GRAND_TOTAL, OTHERS};
pub use sheet::RemoteSheet;
pub use source::{CachedSource, CsvExportWarehouse, DataSource, Dataset};

// Re-export core types
pub use kpi_sheets_core::{
    BlockLayout, CellData, CellValue, Color, GridAddress, GridRange, GridRegion, MetricRow,
    MetricTable, RangeBorders, RegionSpans, ReportBlockDescriptor, Style, StylePool, Table,
    Workbook, Worksheet,
};

// Re-export I/O types
pub use kpi_sheets_csv::{
    CsvError, CsvReadOptions, CsvReader, CsvWriteOptions, CsvWriter, ExtractCache, ExtractKind,
};

use std::path::Path;

/// Extension trait for Workbook to add file I/O
pub trait WorkbookExt {
    /// Open a workbook from a file
    fn open<P: AsRef<Path>>(path: P) -> Result<Workbook>;

    /// Save the workbook to a file
    fn save<P: AsRef<Path>>(&self, path: P) -> Result<()>;
}

impl WorkbookExt for Workbook {
    fn open<P: AsRef<Path>>(path: P) -> Result<Workbook> {
        let path = path.as_ref();
        match extension(path).as_deref() {
            Some("json") => WorkbookDocumentIo::read_file(path),
            Some("csv") => {
                let table = CsvReader::read_file(path, &CsvReadOptions::default())?;
                let title = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("Sheet1");
                let mut workbook = Workbook::new();
                workbook
                    .worksheet_or_insert(title)
                    .write_grid(GridAddress::new(1, 1), &table.to_grid())?;
                Ok(workbook)
            }
            _ => Err(Error::config(format!(
                "Unsupported file format: {}",
                path.display()
            ))),
        }
    }

    fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        match extension(path).as_deref() {
            Some("json") => WorkbookDocumentIo::write_file(self, path),
            Some("csv") => match self.worksheets().next() {
                Some(sheet) => Ok(CsvWriter::write_worksheet_file(
                    sheet,
                    path,
                    &CsvWriteOptions::default(),
                )?),
                None => Err(Error::config("No worksheets to save")),
            },
            _ => Err(Error::config(format!(
                "Unsupported file format: {}",
                path.display()
            ))),
        }
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_open_save_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let mut workbook = Workbook::new();
        workbook
            .worksheet_or_insert("Month Summary")
            .set_value(GridAddress::new(2, 2), "Active Users");

        let json = dir.path().join("report.json");
        workbook.save(&json).unwrap();
        let reopened = Workbook::open(&json).unwrap();
        assert_eq!(
            reopened
                .require_worksheet("Month Summary")
                .unwrap()
                .value(GridAddress::new(2, 2)),
            CellValue::text("Active Users")
        );

        let csv = dir.path().join("report.csv");
        workbook.save(&csv).unwrap();
        let from_csv = Workbook::open(&csv).unwrap();
        assert!(from_csv.worksheet("report").is_some());

        assert!(matches!(
            Workbook::open(dir.path().join("report.xlsx")),
            Err(Error::Configuration(_))
        ));
    }
}
