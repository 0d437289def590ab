//! Prelude module - common imports for kpi-sheets users
//!
//! ```rust
//! use kpi_sheets::prelude::*;
//! ```

pub use crate::{
    // Cell and grid types
    CellValue,
    GridAddress,
    GridRange,
    GridRegion,

    // Tables and blocks
    MetricRow,
    MetricTable,
    RegionSpans,
    ReportBlockDescriptor,
    Table,

    // Main types
    Workbook,
    Worksheet,

    // Reconciliation and formatting
    Placement,
    RegionReconciler,
    RemoteSheet,
    TableFormatter,

    // Metrics
    Breakdown,
    CityTaxonomy,
    Filter,
    RegionalAggregator,

    // Driving a run
    Config,
    CsvExportWarehouse,
    DataSource,
    Dataset,
    Period,
    Pipeline,
    ReportCatalog,

    // Error types
    Error,
    Result,

    // Extension traits
    WorkbookExt,
};
