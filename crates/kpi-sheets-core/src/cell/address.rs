//! Grid address, range and region types
//!
//! All coordinates are 1-indexed to match spreadsheet convention: row 1 is the
//! first sheet row and column 1 is column `A`.

use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};
use std::fmt;

/// A cell address (e.g., "A1", "C100")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridAddress {
    /// Row index (1-based)
    pub row: u32,
    /// Column index (1-based, A=1, B=2, ...)
    pub col: u32,
}

impl GridAddress {
    /// Create a new grid address
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Create an address, validating both coordinates
    pub fn checked(row: u32, col: u32) -> Result<Self> {
        if row == 0 || row > MAX_ROWS {
            return Err(Error::RowOutOfBounds(row, MAX_ROWS));
        }
        if col == 0 || col > MAX_COLS {
            return Err(Error::ColumnOutOfBounds(col, MAX_COLS));
        }
        Ok(Self { row, col })
    }

    /// Convert a 1-based column index to letters (1 = A, 26 = Z, 27 = AA, etc.)
    pub fn column_to_letters(col: u32) -> String {
        let mut result = String::new();
        let mut n = col;

        while n > 0 {
            n -= 1;
            let c = ((n % 26) as u8 + b'A') as char;
            result.insert(0, c);
            n /= 26;
        }

        result
    }

    /// Format as A1-style string
    pub fn to_a1_string(&self) -> String {
        format!("{}{}", Self::column_to_letters(self.col), self.row)
    }

    /// Address shifted by the given number of rows and columns
    pub fn offset(&self, rows: u32, cols: u32) -> Self {
        Self::new(self.row + rows, self.col + cols)
    }
}

impl fmt::Display for GridAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

/// A rectangle of cells (e.g., "B3:F11")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridRange {
    /// Start address (top-left)
    pub start: GridAddress,
    /// End address (bottom-right)
    pub end: GridAddress,
}

impl GridRange {
    /// Create a new range
    pub fn new(start: GridAddress, end: GridAddress) -> Self {
        // Normalize so start is top-left and end is bottom-right
        Self {
            start: GridAddress::new(start.row.min(end.row), start.col.min(end.col)),
            end: GridAddress::new(start.row.max(end.row), start.col.max(end.col)),
        }
    }

    /// Create a range from row/column indices
    pub fn from_indices(start_row: u32, start_col: u32, end_row: u32, end_col: u32) -> Self {
        Self::new(
            GridAddress::new(start_row, start_col),
            GridAddress::new(end_row, end_col),
        )
    }

    /// Create a single-cell range
    pub fn single(addr: GridAddress) -> Self {
        Self {
            start: addr,
            end: addr,
        }
    }

    /// Check if a cell is within this range
    pub fn contains(&self, addr: &GridAddress) -> bool {
        addr.row >= self.start.row
            && addr.row <= self.end.row
            && addr.col >= self.start.col
            && addr.col <= self.end.col
    }

    /// Get the number of rows in the range
    pub fn row_count(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    /// Get the number of columns in the range
    pub fn col_count(&self) -> u32 {
        self.end.col - self.start.col + 1
    }

    /// Get the total number of cells in the range
    pub fn cell_count(&self) -> u64 {
        self.row_count() as u64 * self.col_count() as u64
    }

    /// Check if this range overlaps with another
    pub fn overlaps(&self, other: &GridRange) -> bool {
        self.start.row <= other.end.row
            && self.end.row >= other.start.row
            && self.start.col <= other.end.col
            && self.end.col >= other.start.col
    }

    /// Iterate over all cell addresses in the range (row by row)
    pub fn cells(&self) -> GridRangeIterator {
        GridRangeIterator {
            range: *self,
            current_row: self.start.row,
            current_col: self.start.col,
            remaining: self.cell_count() as usize,
        }
    }

    /// Format as A1:B10 string
    pub fn to_a1_string(&self) -> String {
        if self.start == self.end {
            self.start.to_a1_string()
        } else {
            format!("{}:{}", self.start.to_a1_string(), self.end.to_a1_string())
        }
    }
}

impl fmt::Display for GridRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

/// Iterator over cells in a range
pub struct GridRangeIterator {
    range: GridRange,
    current_row: u32,
    current_col: u32,
    remaining: usize,
}

impl Iterator for GridRangeIterator {
    type Item = GridAddress;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_row > self.range.end.row {
            return None;
        }

        let addr = GridAddress::new(self.current_row, self.current_col);

        // Move to next cell
        self.current_col += 1;
        if self.current_col > self.range.end.col {
            self.current_col = self.range.start.col;
            self.current_row += 1;
        }
        self.remaining -= 1;

        Some(addr)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for GridRangeIterator {}

/// A report region: an anchor and a last row.
///
/// The column extent is not part of the region. It grows every time a new
/// bucket column is appended, so it is discovered from the live header row
/// whenever the region is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridRegion {
    /// Top-left cell (the header cell of the label column)
    pub start: GridAddress,
    /// Last row of the region (inclusive)
    pub end_row: u32,
}

impl GridRegion {
    /// Create a new region
    pub const fn new(start: GridAddress, end_row: u32) -> Self {
        Self { start, end_row }
    }

    /// Translate a row offset relative to the region into an absolute row.
    ///
    /// Offset 1 is the header row at `start.row`.
    ///
    /// ```
    /// use kpi_sheets_core::{GridAddress, GridRegion};
    ///
    /// let region = GridRegion::new(GridAddress::new(50, 2), 60);
    /// assert_eq!(region.absolute_row(3), 52);
    /// assert_eq!(region.absolute_row(5), 54);
    /// ```
    pub fn absolute_row(&self, offset: u32) -> u32 {
        offset + self.start.row - 1
    }

    /// Number of rows covered, header included
    pub fn row_count(&self) -> u32 {
        self.end_row.saturating_sub(self.start.row) + 1
    }

    /// The full rectangle up to a discovered last column
    pub fn to_range(&self, last_col: u32) -> GridRange {
        GridRange::from_indices(
            self.start.row,
            self.start.col,
            self.end_row,
            last_col.max(self.start.col),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_to_letters() {
        assert_eq!(GridAddress::column_to_letters(1), "A");
        assert_eq!(GridAddress::column_to_letters(2), "B");
        assert_eq!(GridAddress::column_to_letters(26), "Z");
        assert_eq!(GridAddress::column_to_letters(27), "AA");
        assert_eq!(GridAddress::column_to_letters(28), "AB");
        assert_eq!(GridAddress::column_to_letters(702), "ZZ");
        assert_eq!(GridAddress::column_to_letters(703), "AAA");
    }

    #[test]
    fn test_checked_bounds() {
        assert_eq!(GridAddress::checked(146, 3).unwrap(), GridAddress::new(146, 3));
        assert!(GridAddress::checked(0, 1).is_err());
        assert!(GridAddress::checked(MAX_ROWS + 1, 1).is_err());
        assert!(GridAddress::checked(1, MAX_COLS + 1).is_err());
    }

    #[test]
    fn test_address_display() {
        assert_eq!(GridAddress::new(1, 1).to_string(), "A1");
        assert_eq!(GridAddress::new(100, 3).to_string(), "C100");
    }

    #[test]
    fn test_range_normalizes() {
        let range = GridRange::new(GridAddress::new(5, 4), GridAddress::new(2, 1));
        assert_eq!(range.start, GridAddress::new(2, 1));
        assert_eq!(range.end, GridAddress::new(5, 4));

        let range = GridRange::from_indices(3, 2, 11, 6);
        assert_eq!(range.row_count(), 9);
        assert_eq!(range.col_count(), 5);
        assert_eq!(range.to_string(), "B3:F11");
    }

    #[test]
    fn test_range_iterator() {
        let range = GridRange::from_indices(1, 1, 2, 2);
        let cells: Vec<_> = range.cells().collect();

        assert_eq!(
            cells,
            vec![
                GridAddress::new(1, 1),
                GridAddress::new(1, 2),
                GridAddress::new(2, 1),
                GridAddress::new(2, 2),
            ]
        );
        assert_eq!(range.cells().len(), 4);
    }

    #[test]
    fn test_range_overlap() {
        let a = GridRange::from_indices(2, 2, 4, 4);
        let b = GridRange::from_indices(4, 4, 5, 5);
        let c = GridRange::from_indices(1, 5, 3, 5);

        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        assert!(a.contains(&GridAddress::new(4, 4)));
        assert!(!a.contains(&GridAddress::new(5, 4)));
    }

    #[test]
    fn test_region_offsets() {
        let region = GridRegion::new(GridAddress::new(50, 2), 55);

        let rows: Vec<u32> = [3, 5].iter().map(|o| region.absolute_row(*o)).collect();
        assert_eq!(rows, vec![52, 54]);
        assert_eq!(region.absolute_row(1), 50);
        assert_eq!(region.row_count(), 6);
        assert_eq!(region.to_range(7).to_string(), "B50:G55");
    }
}
