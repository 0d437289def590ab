//! The sheet collaborator interface
//!
//! Everything the reconciler and formatter need from a spreadsheet tab:
//! reading a header row, reading a rectangle as a table, writing a table at
//! an anchor, and writing formats, borders and merges over ranges. The
//! in-memory [`Worksheet`] implements it; a hosted backend would implement
//! it over its remote API.

use kpi_sheets_core::{
    CellValue, GridAddress, GridRange, RangeBorders, Style, Table, Worksheet,
};

use crate::error::Result;

/// A 2-D grid-addressable document tab
pub trait RemoteSheet {
    /// Tab title
    fn title(&self) -> &str;

    /// Values of `row` from column 1 up to its last non-empty cell
    fn header_row(&self, row: u32) -> Result<Vec<CellValue>>;

    /// Read a rectangle as a table; its first row becomes the header
    fn read_region(&self, range: &GridRange) -> Result<Table>;

    /// Write a table (header included) with its top-left cell at `anchor`
    fn write_table(&mut self, table: &Table, anchor: GridAddress) -> Result<GridRange>;

    /// Replace the cell format of every cell in `range`
    fn apply_format(&mut self, range: &GridRange, style: &Style) -> Result<()>;

    /// Draw borders over `range`
    fn set_borders(&mut self, range: &GridRange, borders: &RangeBorders) -> Result<()>;

    /// Merge `range` into one cell
    fn merge_cells(&mut self, range: &GridRange) -> Result<()>;

    /// Clear the values of `range`
    fn clear_region(&mut self, range: &GridRange) -> Result<()>;

    /// Absolute index of the last non-empty cell of `row`, 0 when empty
    fn last_column(&self, row: u32) -> Result<u32> {
        Ok(self.header_row(row)?.len() as u32)
    }
}

impl RemoteSheet for Worksheet {
    fn title(&self) -> &str {
        Worksheet::title(self)
    }

    fn header_row(&self, row: u32) -> Result<Vec<CellValue>> {
        Ok(self.row_values(row))
    }

    fn read_region(&self, range: &GridRange) -> Result<Table> {
        let mut grid = self.read_range(range).into_iter();
        let columns: Vec<String> = grid
            .next()
            .unwrap_or_default()
            .iter()
            .map(CellValue::as_key)
            .collect();
        Ok(Table::from_rows(columns, grid.collect())?)
    }

    fn write_table(&mut self, table: &Table, anchor: GridAddress) -> Result<GridRange> {
        Ok(self.write_grid(anchor, &table.to_grid())?)
    }

    fn apply_format(&mut self, range: &GridRange, style: &Style) -> Result<()> {
        self.apply_style(range, style);
        Ok(())
    }

    fn set_borders(&mut self, range: &GridRange, borders: &RangeBorders) -> Result<()> {
        self.apply_borders(range, borders);
        Ok(())
    }

    fn merge_cells(&mut self, range: &GridRange) -> Result<()> {
        Worksheet::merge_cells(self, range);
        Ok(())
    }

    fn clear_region(&mut self, range: &GridRange) -> Result<()> {
        self.clear_values(range);
        Ok(())
    }

    fn last_column(&self, row: u32) -> Result<u32> {
        Ok(self.last_used_col(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_read_region_uses_first_row_as_header() {
        let mut ws = Worksheet::new("Week Summary");
        ws.set_value(GridAddress::new(3, 2), "Active Users");
        ws.set_value(GridAddress::new(3, 3), "04-Mar to 10-Mar");
        ws.set_value(GridAddress::new(4, 2), "Total");
        ws.set_value(GridAddress::new(4, 3), 120);

        let table = ws
            .read_region(&GridRange::from_indices(3, 2, 4, 3))
            .unwrap();
        assert_eq!(table.columns(), ["Active Users", "04-Mar to 10-Mar"]);
        assert_eq!(table.rows()[0], vec![CellValue::text("Total"), CellValue::Number(120.0)]);
    }

    #[test]
    fn test_last_column_counts_from_column_one() {
        let mut ws = Worksheet::new("Week Summary");
        ws.set_value(GridAddress::new(3, 2), "Active Users");
        ws.set_value(GridAddress::new(3, 5), "Mar'24");

        assert_eq!(RemoteSheet::last_column(&ws, 3).unwrap(), 5);
        assert_eq!(ws.header_row(3).unwrap().len(), 5);
        assert_eq!(RemoteSheet::last_column(&ws, 4).unwrap(), 0);
    }

    #[test]
    fn test_write_table_at_anchor() {
        let mut ws = Worksheet::new("Daily Summary");
        let table = Table::from_rows(
            ["Active Users", "04-Mar-2024"],
            vec![vec![CellValue::text("Total"), CellValue::Number(7.0)]],
        )
        .unwrap();

        let written = ws.write_table(&table, GridAddress::new(3, 2)).unwrap();
        assert_eq!(written, GridRange::from_indices(3, 2, 4, 3));
        assert_eq!(ws.value(GridAddress::new(4, 3)), CellValue::Number(7.0));
    }
}
