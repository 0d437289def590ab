//! Worksheet type
//!
//! An in-memory grid that behaves the way a hosted spreadsheet tab does for
//! the operations a report needs: values, per-cell formats, per-cell border
//! edges and merged ranges. Merging a range keeps only the top-left value.

use std::collections::BTreeMap;

use crate::cell::{CellData, CellValue, GridAddress, GridRange};
use crate::error::Result;
use crate::style::{BorderStyle, RangeBorders, Style, StylePool};

/// A worksheet (single tab in a workbook)
#[derive(Debug, Clone)]
pub struct Worksheet {
    /// Tab title
    title: String,
    /// Cell storage keyed by (row, col)
    cells: BTreeMap<(u32, u32), CellData>,
    /// Border edges keyed by (row, col)
    borders: BTreeMap<(u32, u32), BorderStyle>,
    /// Merged ranges, no two overlapping
    merges: Vec<GridRange>,
    /// Deduplicated cell formats
    styles: StylePool,
}

impl Worksheet {
    /// Create a new worksheet with the given title
    pub fn new<S: Into<String>>(title: S) -> Self {
        Self::with_styles(title, StylePool::new())
    }

    /// Create a worksheet that reuses an existing style pool
    pub fn with_styles<S: Into<String>>(title: S, styles: StylePool) -> Self {
        Self {
            title: title.into(),
            cells: BTreeMap::new(),
            borders: BTreeMap::new(),
            merges: Vec::new(),
            styles,
        }
    }

    /// Get the tab title
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Set the tab title
    pub fn set_title<S: Into<String>>(&mut self, title: S) {
        self.title = title.into();
    }

    // === Cell Access ===

    /// Get a cell by address
    pub fn cell(&self, addr: GridAddress) -> Option<&CellData> {
        self.cells.get(&(addr.row, addr.col))
    }

    /// Get a cell value, `Empty` for cells never written
    pub fn value(&self, addr: GridAddress) -> CellValue {
        self.cell(addr).map(|c| c.value.clone()).unwrap_or_default()
    }

    /// Get the format of a cell (the default style when none was applied)
    pub fn style(&self, addr: GridAddress) -> &Style {
        let idx = self.cell(addr).map(|c| c.style_index).unwrap_or(0);
        self.styles
            .get(idx)
            .or_else(|| self.styles.get(0))
            .unwrap_or_else(|| default_style())
    }

    /// Get the border edges of a cell
    pub fn borders(&self, addr: GridAddress) -> Option<&BorderStyle> {
        self.borders.get(&(addr.row, addr.col))
    }

    /// Get the style pool
    pub fn style_pool(&self) -> &StylePool {
        &self.styles
    }

    // === Cell Modification ===

    /// Set a cell value, keeping its format
    pub fn set_value<V: Into<CellValue>>(&mut self, addr: GridAddress, value: V) {
        let value = value.into();
        let key = (addr.row, addr.col);
        match self.cells.get_mut(&key) {
            Some(cell) => {
                cell.value = value;
                if cell.is_blank() {
                    self.cells.remove(&key);
                }
            }
            None if value.is_empty() => {}
            None => {
                self.cells.insert(key, CellData::new(value));
            }
        }
    }

    /// Store complete cell data; the style index must come from this sheet's pool
    pub fn set_cell_data(&mut self, addr: GridAddress, data: CellData) {
        if data.is_blank() {
            self.cells.remove(&(addr.row, addr.col));
        } else {
            self.cells.insert((addr.row, addr.col), data);
        }
    }

    /// Replace the border edges of a cell
    pub fn set_cell_borders(&mut self, addr: GridAddress, borders: BorderStyle) {
        if borders.is_empty() {
            self.borders.remove(&(addr.row, addr.col));
        } else {
            self.borders.insert((addr.row, addr.col), borders);
        }
    }

    /// Write a grid of values with its top-left corner at `anchor`.
    ///
    /// Returns the range written. Fails without writing anything when the
    /// grid would run past the sheet bounds.
    pub fn write_grid(&mut self, anchor: GridAddress, grid: &[Vec<CellValue>]) -> Result<GridRange> {
        let width = grid.iter().map(Vec::len).max().unwrap_or(0) as u32;
        let height = grid.len() as u32;
        let last = GridAddress::checked(
            anchor.row + height.saturating_sub(1),
            anchor.col + width.saturating_sub(1),
        )?;
        GridAddress::checked(anchor.row, anchor.col)?;

        for (r, row) in grid.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                self.set_value(anchor.offset(r as u32, c as u32), value.clone());
            }
        }

        Ok(GridRange::new(anchor, last))
    }

    /// Apply a format to every cell of a range, replacing the previous format.
    ///
    /// Border edges are untouched.
    pub fn apply_style(&mut self, range: &GridRange, style: &Style) {
        let idx = self.styles.get_or_insert(style.clone());
        for addr in range.cells() {
            let key = (addr.row, addr.col);
            let cell = self.cells.entry(key).or_default();
            cell.style_index = idx;
            if cell.is_blank() {
                self.cells.remove(&key);
            }
        }
    }

    /// Draw borders over a range, keeping edges the new borders do not set
    pub fn apply_borders(&mut self, range: &GridRange, borders: &RangeBorders) {
        for addr in range.cells() {
            let edges = borders.cell_edges(range, addr);
            if edges.is_empty() {
                continue;
            }
            self.borders
                .entry((addr.row, addr.col))
                .or_default()
                .merge(&edges);
        }
    }

    // === Range Operations ===

    /// Values of a row from column 1 up to its last non-empty cell
    pub fn row_values(&self, row: u32) -> Vec<CellValue> {
        let last = self.last_used_col(row);
        (1..=last)
            .map(|col| self.value(GridAddress::new(row, col)))
            .collect()
    }

    /// Column index of the last non-empty cell of a row, 0 when the row is empty
    pub fn last_used_col(&self, row: u32) -> u32 {
        self.cells
            .range((row, 0)..=(row, u32::MAX))
            .rev()
            .find(|(_, c)| !c.value.is_empty())
            .map(|((_, col), _)| *col)
            .unwrap_or(0)
    }

    /// Values of a range, row by row
    pub fn read_range(&self, range: &GridRange) -> Vec<Vec<CellValue>> {
        (range.start.row..=range.end.row)
            .map(|row| {
                (range.start.col..=range.end.col)
                    .map(|col| self.value(GridAddress::new(row, col)))
                    .collect()
            })
            .collect()
    }

    /// Clear the values of a range, keeping formats, borders and merges
    pub fn clear_values(&mut self, range: &GridRange) {
        for addr in range.cells() {
            self.set_value(addr, CellValue::Empty);
        }
    }

    /// Get the used range (bounds of all cells with a value)
    pub fn used_range(&self) -> Option<GridRange> {
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for ((row, col), cell) in &self.cells {
            if cell.value.is_empty() {
                continue;
            }
            bounds = Some(match bounds {
                None => (*row, *col, *row, *col),
                Some((r1, c1, r2, c2)) => (r1.min(*row), c1.min(*col), r2.max(*row), c2.max(*col)),
            });
        }
        bounds.map(|(r1, c1, r2, c2)| GridRange::from_indices(r1, c1, r2, c2))
    }

    // === Merged Cells ===

    /// Get merged ranges
    pub fn merged_regions(&self) -> &[GridRange] {
        &self.merges
    }

    /// The merged range covering a cell, if any
    pub fn merge_at(&self, addr: GridAddress) -> Option<&GridRange> {
        self.merges.iter().find(|m| m.contains(&addr))
    }

    /// Merge a range.
    ///
    /// Existing merges that overlap the range are dropped first, and every
    /// value except the top-left one is cleared.
    pub fn merge_cells(&mut self, range: &GridRange) {
        self.merges.retain(|existing| !existing.overlaps(range));
        for addr in range.cells().skip(1) {
            self.set_value(addr, CellValue::Empty);
        }
        self.merges.push(*range);
    }

    /// Get the number of stored cells
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Check if the worksheet has no cells, borders or merges
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty() && self.borders.is_empty() && self.merges.is_empty()
    }

    /// Iterate over all stored cells
    pub fn iter_cells(&self) -> impl Iterator<Item = (GridAddress, &CellData)> {
        self.cells
            .iter()
            .map(|((row, col), cell)| (GridAddress::new(*row, *col), cell))
    }

    /// Iterate over all cells that carry border edges
    pub fn iter_borders(&self) -> impl Iterator<Item = (GridAddress, &BorderStyle)> {
        self.borders
            .iter()
            .map(|((row, col), b)| (GridAddress::new(*row, *col), b))
    }
}

fn default_style() -> &'static Style {
    static DEFAULT: std::sync::OnceLock<Style> = std::sync::OnceLock::new();
    DEFAULT.get_or_init(Style::default)
}
