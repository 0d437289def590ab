//! # kpi-sheets-csv
//!
//! CSV reader and writer for kpi-sheets tables and worksheets, plus the
//! on-disk extract cache used by data sources.

mod cache;
mod error;
mod options;
mod reader;
mod writer;

pub use cache::{CachedExtract, ExtractCache, ExtractKind};
pub use error::{CsvError, CsvResult};
pub use options::{CsvReadOptions, CsvWriteOptions, LineTerminator};
pub use reader::CsvReader;
pub use writer::CsvWriter;
