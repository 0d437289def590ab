//! CSV reader

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::CsvResult;
use crate::options::CsvReadOptions;
use kpi_sheets_core::{CellValue, Table};

/// CSV file reader
pub struct CsvReader;

impl CsvReader {
    /// Read a CSV file with a header row into a table
    pub fn read_file<P: AsRef<Path>>(path: P, options: &CsvReadOptions) -> CsvResult<Table> {
        let file = File::open(path)?;
        Self::read(file, options)
    }

    /// Read CSV with a header row from a reader into a table
    pub fn read<R: Read>(reader: R, options: &CsvReadOptions) -> CsvResult<Table> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();
        let width = headers.len();
        let mut table = Table::new(headers);

        for result in csv_reader.records() {
            let record = result?;

            // Short records are padded, long ones truncated to the header width
            let mut row: Vec<CellValue> = record
                .iter()
                .take(width)
                .map(|field| {
                    if options.auto_detect_types {
                        Self::detect_type(field)
                    } else {
                        CellValue::text(field)
                    }
                })
                .collect();
            row.resize(width, CellValue::Empty);

            table.push_row(row)?;
        }

        Ok(table)
    }

    /// Detect the type of a field value
    fn detect_type(field: &str) -> CellValue {
        let field = field.trim();

        if field.is_empty() {
            return CellValue::Empty;
        }

        if let Ok(n) = field.parse::<f64>() {
            if n.is_finite() {
                return CellValue::Number(n);
            }
        }

        CellValue::text(field)
    }
}
