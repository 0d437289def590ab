//! JSON workbook documents
//!
//! The report workbook is persisted as one JSON document holding every
//! worksheet's cells, style pool, border edges and merges. Merges are
//! restored before cells since merging clears non-anchor values.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use kpi_sheets_core::{
    BorderStyle, CellData, CellValue, GridAddress, GridRange, Style, StylePool, Workbook, Worksheet,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Current document format version
pub const DOCUMENT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CellEntry {
    row: u32,
    col: u32,
    value: CellValue,
    #[serde(default, skip_serializing_if = "is_default_style")]
    style: u32,
}

fn is_default_style(index: &u32) -> bool {
    *index == 0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct BorderEntry {
    row: u32,
    col: u32,
    borders: BorderStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SheetDocument {
    title: String,
    styles: Vec<Style>,
    cells: Vec<CellEntry>,
    #[serde(default)]
    borders: Vec<BorderEntry>,
    #[serde(default)]
    merges: Vec<GridRange>,
}

impl SheetDocument {
    fn capture(sheet: &Worksheet) -> Self {
        Self {
            title: sheet.title().to_string(),
            styles: sheet.style_pool().styles().to_vec(),
            cells: sheet
                .iter_cells()
                .map(|(addr, cell)| CellEntry {
                    row: addr.row,
                    col: addr.col,
                    value: cell.value.clone(),
                    style: cell.style_index,
                })
                .collect(),
            borders: sheet
                .iter_borders()
                .map(|(addr, borders)| BorderEntry {
                    row: addr.row,
                    col: addr.col,
                    borders: borders.clone(),
                })
                .collect(),
            merges: sheet.merged_regions().to_vec(),
        }
    }

    fn restore(self) -> Result<Worksheet> {
        let pool = StylePool::from_styles(self.styles);
        let style_count = pool.len() as u32;
        let mut sheet = Worksheet::with_styles(self.title, pool);

        for range in &self.merges {
            sheet.merge_cells(range);
        }
        for entry in self.cells {
            let addr = GridAddress::new(entry.row, entry.col);
            if entry.style >= style_count {
                return Err(Error::shape(format!(
                    "cell {} on '{}' refers to style {} of {}",
                    addr,
                    sheet.title(),
                    entry.style,
                    style_count
                )));
            }
            sheet.set_cell_data(
                addr,
                CellData {
                    value: entry.value,
                    style_index: entry.style,
                },
            );
        }
        for entry in self.borders {
            sheet.set_cell_borders(GridAddress::new(entry.row, entry.col), entry.borders);
        }
        Ok(sheet)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct WorkbookDocument {
    version: u32,
    sheets: Vec<SheetDocument>,
}

/// Reads and writes workbooks as JSON documents
pub struct WorkbookDocumentIo;

impl WorkbookDocumentIo {
    /// Read a workbook document
    pub fn read<R: Read>(reader: R) -> Result<Workbook> {
        let document: WorkbookDocument = serde_json::from_reader(reader)?;
        if document.version != DOCUMENT_VERSION {
            return Err(Error::config(format!(
                "unsupported workbook document version {}",
                document.version
            )));
        }

        let mut workbook = Workbook::new();
        for sheet in document.sheets {
            workbook.add_existing_worksheet(sheet.restore()?)?;
        }
        Ok(workbook)
    }

    /// Write a workbook document
    pub fn write<W: Write>(workbook: &Workbook, writer: W) -> Result<()> {
        let document = WorkbookDocument {
            version: DOCUMENT_VERSION,
            sheets: workbook.worksheets().map(SheetDocument::capture).collect(),
        };
        serde_json::to_writer_pretty(writer, &document)?;
        Ok(())
    }

    pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Workbook> {
        let path = path.as_ref();
        let workbook = Self::read(BufReader::new(File::open(path)?))?;
        debug!(path = %path.display(), sheets = workbook.sheet_count(), "Read workbook document");
        Ok(workbook)
    }

    pub fn write_file<P: AsRef<Path>>(workbook: &Workbook, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        Self::write(workbook, &mut writer)?;
        writer.flush()?;
        debug!(path = %path.display(), sheets = workbook.sheet_count(), "Wrote workbook document");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kpi_sheets_core::{BorderEdge, BorderLineStyle, Color};
    use pretty_assertions::assert_eq;

    fn sample() -> Workbook {
        let mut workbook = Workbook::new();
        let sheet = workbook.worksheet_or_insert("Week Summary");
        sheet.set_value(GridAddress::new(1, 1), "North");
        sheet.set_value(GridAddress::new(1, 2), 12.5);
        sheet.merge_cells(&GridRange::from_indices(1, 1, 3, 1));

        sheet.apply_style(&GridRange::from_indices(1, 2, 1, 2), &Style::new().bold(true));
        sheet.set_cell_borders(
            GridAddress::new(1, 2),
            BorderStyle {
                top: Some(BorderEdge::new(BorderLineStyle::Solid, Color::rgb(164, 194, 244))),
                ..BorderStyle::default()
            },
        );
        workbook
    }

    #[test]
    fn test_round_trip_keeps_styles_and_merges() {
        let workbook = sample();
        let mut buf = Vec::new();
        WorkbookDocumentIo::write(&workbook, &mut buf).unwrap();
        let restored = WorkbookDocumentIo::read(buf.as_slice()).unwrap();

        let sheet = restored.require_worksheet("Week Summary").unwrap();
        assert_eq!(sheet.value(GridAddress::new(1, 1)), CellValue::text("North"));
        assert_eq!(sheet.value(GridAddress::new(1, 2)), CellValue::Number(12.5));
        assert!(sheet.style(GridAddress::new(1, 2)).font.bold);
        assert!(sheet.borders(GridAddress::new(1, 2)).is_some());
        assert_eq!(
            sheet.merged_regions(),
            &[GridRange::from_indices(1, 1, 3, 1)]
        );
    }

    #[test]
    fn test_rejects_dangling_style_index() {
        let json = r#"{"version": 1, "sheets": [{"title": "T", "styles": [],
            "cells": [{"row": 1, "col": 1, "value": {"Number": 1.0}, "style": 4}]}]}"#;
        assert!(matches!(
            WorkbookDocumentIo::read(json.as_bytes()),
            Err(Error::SheetShape(_))
        ));
    }

    #[test]
    fn test_rejects_unknown_version() {
        let json = r#"{"version": 9, "sheets": []}"#;
        assert!(matches!(
            WorkbookDocumentIo::read(json.as_bytes()),
            Err(Error::Configuration(_))
        ));
    }
}
