//! Tabular data exchanged with a sheet
//!
//! [`Table`] is a plain header + rows rectangle, the shape of anything read
//! from or written to a sheet region. [`MetricTable`] is one computed metric
//! block for exactly one time bucket.

use crate::cell::CellValue;
use crate::error::{Error, Result};

/// Name of the macro-region grouping column carried by city tables
pub const REGION_COLUMN: &str = "Region";

/// A header row plus data rows, all of the same width
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Table {
    /// Create an empty table with the given header
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Create a table from a header and rows, checking every row's width
    pub fn from_rows<I, S>(columns: I, rows: Vec<Vec<CellValue>>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Append a row
    pub fn push_row(&mut self, row: Vec<CellValue>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(Error::RowWidthMismatch {
                row: self.rows.len(),
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Header names, left to right
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Data rows, top to bottom
    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// Mutable access to the data rows
    pub fn rows_mut(&mut self) -> &mut [Vec<CellValue>] {
        &mut self.rows
    }

    /// Number of data rows (header excluded)
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns
    pub fn col_count(&self) -> usize {
        self.columns.len()
    }

    /// Check whether the table has neither columns nor rows
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.rows.is_empty()
    }

    /// Index of the first column with the given header
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Index of a column, failing when it does not exist
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }

    /// All values of one column
    pub fn column_values(&self, name: &str) -> Result<Vec<&CellValue>> {
        let idx = self.require_column(name)?;
        Ok(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// A single cell, or `None` when out of range
    pub fn cell(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Append a column, filling existing rows with `fill`
    pub fn push_column<S: Into<String>>(&mut self, name: S, fill: CellValue) {
        self.columns.push(name.into());
        for row in &mut self.rows {
            row.push(fill.clone());
        }
    }

    /// Remove the rightmost column, returning its header
    pub fn pop_column(&mut self) -> Option<String> {
        let name = self.columns.pop()?;
        for row in &mut self.rows {
            row.pop();
        }
        Some(name)
    }

    /// Header plus rows as one grid, the shape written to a sheet
    pub fn to_grid(&self) -> Vec<Vec<CellValue>> {
        let mut grid = Vec::with_capacity(self.rows.len() + 1);
        grid.push(self.columns.iter().map(|c| CellValue::text(c.as_str())).collect());
        grid.extend(self.rows.iter().cloned());
        grid
    }
}

/// One row of a [`MetricTable`]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetricRow {
    /// Macro-region, only set on city tables (blank for the grand total)
    pub region: Option<String>,
    /// Row label
    pub label: String,
    /// Metric value, `None` for spacer rows
    pub value: Option<f64>,
}

impl MetricRow {
    /// A labelled value row
    pub fn new<S: Into<String>>(label: S, value: f64) -> Self {
        Self {
            region: None,
            label: label.into(),
            value: Some(value),
        }
    }

    /// A labelled value row under a macro-region
    pub fn regional<R: Into<String>, S: Into<String>>(region: R, label: S, value: f64) -> Self {
        Self {
            region: Some(region.into()),
            label: label.into(),
            value: Some(value),
        }
    }

    /// A blank row separating two sections of a block
    pub fn spacer() -> Self {
        Self {
            region: None,
            label: String::new(),
            value: None,
        }
    }

    /// Check whether this is a spacer row
    pub fn is_spacer(&self) -> bool {
        self.label.is_empty() && self.value.is_none()
    }
}

/// A computed metric block for exactly one time bucket.
///
/// The first row is the headline aggregate, later rows are breakdowns. The
/// bucket label travels with the table so nothing has to remember which
/// bucket was last computed.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetricTable {
    /// Header of the label column (the report block key)
    pub key: String,
    /// Header of the value column, e.g. `"01-Mar to 07-Mar"`
    pub bucket_label: String,
    /// Whether the table carries a leading [`REGION_COLUMN`]
    pub has_region: bool,
    /// Rows in output order
    pub rows: Vec<MetricRow>,
}

impl MetricTable {
    /// Create an empty table
    pub fn new<K: Into<String>, B: Into<String>>(key: K, bucket_label: B) -> Self {
        Self {
            key: key.into(),
            bucket_label: bucket_label.into(),
            has_region: false,
            rows: Vec::new(),
        }
    }

    /// Create an empty city table (with a region column)
    pub fn regional<K: Into<String>, B: Into<String>>(key: K, bucket_label: B) -> Self {
        Self {
            has_region: true,
            ..Self::new(key, bucket_label)
        }
    }

    /// Append a row
    pub fn push(&mut self, row: MetricRow) {
        self.rows.push(row);
    }

    /// Builder-style row append
    pub fn with_row(mut self, row: MetricRow) -> Self {
        self.rows.push(row);
        self
    }

    /// Value of the first row with the given label
    pub fn value_of(&self, label: &str) -> Option<f64> {
        self.rows
            .iter()
            .find(|r| r.label == label)
            .and_then(|r| r.value)
    }

    /// First row with the given label
    pub fn row(&self, label: &str) -> Option<&MetricRow> {
        self.rows.iter().find(|r| r.label == label)
    }

    /// Header names of the sheet rendering of this table
    pub fn column_names(&self) -> Vec<String> {
        let mut columns = Vec::with_capacity(3);
        if self.has_region {
            columns.push(REGION_COLUMN.to_string());
        }
        columns.push(self.key.clone());
        columns.push(self.bucket_label.clone());
        columns
    }

    /// Render as a plain [`Table`]
    pub fn to_table(&self) -> Table {
        let rows = self
            .rows
            .iter()
            .map(|r| {
                let mut cells = Vec::with_capacity(3);
                if self.has_region {
                    cells.push(CellValue::text(r.region.clone().unwrap_or_default()));
                }
                cells.push(CellValue::text(r.label.as_str()));
                cells.push(CellValue::from(r.value));
                cells
            })
            .collect();

        Table {
            columns: self.column_names(),
            rows,
        }
    }
}
