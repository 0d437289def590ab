//! CSV writer

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::CsvResult;
use crate::options::{CsvWriteOptions, LineTerminator};
use kpi_sheets_core::{Table, Worksheet};

/// CSV file writer
pub struct CsvWriter;

impl CsvWriter {
    /// Write a table to a CSV file
    pub fn write_table_file<P: AsRef<Path>>(
        table: &Table,
        path: P,
        options: &CsvWriteOptions,
    ) -> CsvResult<()> {
        let file = File::create(path)?;
        Self::write_table(table, file, options)
    }

    /// Write a table to a writer
    pub fn write_table<W: Write>(
        table: &Table,
        writer: W,
        options: &CsvWriteOptions,
    ) -> CsvResult<()> {
        let mut csv_writer = Self::builder(options).from_writer(writer);

        if options.write_header {
            csv_writer.write_record(table.columns())?;
        }
        for row in table.rows() {
            csv_writer.write_record(row.iter().map(|v| v.to_string()))?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Write the used range of a worksheet to a CSV file
    pub fn write_worksheet_file<P: AsRef<Path>>(
        worksheet: &Worksheet,
        path: P,
        options: &CsvWriteOptions,
    ) -> CsvResult<()> {
        let file = File::create(path)?;
        Self::write_worksheet(worksheet, file, options)
    }

    /// Write the used range of a worksheet to a writer.
    ///
    /// Every row is written as-is; `write_header` does not apply since a
    /// worksheet has no distinguished header row.
    pub fn write_worksheet<W: Write>(
        worksheet: &Worksheet,
        writer: W,
        options: &CsvWriteOptions,
    ) -> CsvResult<()> {
        let mut csv_writer = Self::builder(options).from_writer(writer);

        if let Some(range) = worksheet.used_range() {
            for row in worksheet.read_range(&range) {
                csv_writer.write_record(row.iter().map(|v| v.to_string()))?;
            }
        }

        csv_writer.flush()?;
        Ok(())
    }

    fn builder(options: &CsvWriteOptions) -> csv::WriterBuilder {
        let terminator = match options.line_terminator {
            LineTerminator::LF => csv::Terminator::Any(b'\n'),
            LineTerminator::CRLF => csv::Terminator::CRLF,
        };

        let mut builder = csv::WriterBuilder::new();
        builder
            .delimiter(options.delimiter)
            .quote(options.quote)
            .terminator(terminator);
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kpi_sheets_core::{CellValue, GridAddress};

    #[test]
    fn test_write_table() {
        let table = Table::from_rows(
            ["Active Users", "Mar'24"],
            vec![vec![CellValue::text("Total"), CellValue::Number(120.0)]],
        )
        .unwrap();

        let mut out = Vec::new();
        CsvWriter::write_table(&table, &mut out, &CsvWriteOptions::default()).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Active Users,Mar'24\nTotal,120\n");
    }

    #[test]
    fn test_write_worksheet_used_range() {
        let mut ws = Worksheet::new("Week Summary");
        ws.set_value(GridAddress::new(2, 2), "Key");
        ws.set_value(GridAddress::new(3, 3), 5.0);

        let mut out = Vec::new();
        CsvWriter::write_worksheet(&ws, &mut out, &CsvWriteOptions::default()).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Key,\n,5\n");
    }
}
