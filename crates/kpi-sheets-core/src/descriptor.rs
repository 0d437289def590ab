//! Report block descriptors
//!
//! A descriptor is the static placement of one report block on a worksheet:
//! where it is anchored, where it ends and which of its rows need special
//! styling. Row offsets are relative to the anchor row, with offset 1 being
//! the anchor (header) row itself, and are translated with
//! [`GridRegion::absolute_row`].

use crate::cell::{GridAddress, GridRegion};

/// Row counts of the three merged macro-region cells of a city block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegionSpans {
    /// Rows covered by the North merge
    pub north: u32,
    /// Rows covered by the South merge
    pub south: u32,
    /// Rows covered by the West merge
    pub west: u32,
}

impl RegionSpans {
    /// Spans for blocks that carry a subtotal row per macro-region (8/7/8)
    pub const WITH_SUBTOTALS: RegionSpans = RegionSpans {
        north: 8,
        south: 7,
        west: 8,
    };

    /// Spans for blocks with rate or subsection rows and no subtotals (7/6/7)
    pub const WITHOUT_SUBTOTALS: RegionSpans = RegionSpans {
        north: 7,
        south: 6,
        west: 7,
    };

    /// Absolute `(first, last)` rows of each merge, North first.
    ///
    /// The North merge starts on the row right below `header_row`.
    pub fn merge_rows(&self, header_row: u32) -> [(u32, u32); 3] {
        let north = (header_row + 1, header_row + self.north);
        let south = (north.1 + 1, north.1 + self.south);
        let west = (south.1 + 1, south.1 + self.west);
        [north, south, west]
    }
}

/// Layout variant of a report block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BlockLayout {
    /// Label column at `start.col`, values from `start.col + 1`
    #[default]
    Regular,
    /// Region column at `start.col`, city labels at `start.col + 1`,
    /// values from `start.col + 2`
    City {
        /// Row spans of the merged region cells
        spans: RegionSpans,
    },
}

/// Static per-report configuration of one block
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReportBlockDescriptor {
    /// Block key, also the header of its label column
    pub key: String,
    /// Anchor (header cell of the first column)
    pub start: GridAddress,
    /// Last row of the block
    pub end_row: u32,
    /// Percentage rows (relative offsets)
    pub subsection_rows: Vec<u32>,
    /// Whole-number rate rows (relative offsets)
    pub rate_rows: Vec<u32>,
    /// One-decimal average rate rows (relative offsets)
    pub avg_rate_rows: Vec<u32>,
    /// Grand-total style rows (relative offsets)
    pub header_rows: Vec<u32>,
    /// Muted italic rows (relative offsets)
    pub light_rows: Vec<u32>,
    /// Regular or city layout
    pub layout: BlockLayout,
}

impl ReportBlockDescriptor {
    /// A regular block with no special rows
    pub fn new<S: Into<String>>(key: S, start: GridAddress, end_row: u32) -> Self {
        Self {
            key: key.into(),
            start,
            end_row,
            subsection_rows: Vec::new(),
            rate_rows: Vec::new(),
            avg_rate_rows: Vec::new(),
            header_rows: Vec::new(),
            light_rows: Vec::new(),
            layout: BlockLayout::Regular,
        }
    }

    /// A city block with the given merge spans
    pub fn city<S: Into<String>>(
        key: S,
        start: GridAddress,
        end_row: u32,
        spans: RegionSpans,
    ) -> Self {
        Self {
            layout: BlockLayout::City { spans },
            ..Self::new(key, start, end_row)
        }
    }

    /// Set the subsection rows
    pub fn subsections(mut self, rows: impl Into<Vec<u32>>) -> Self {
        self.subsection_rows = rows.into();
        self
    }

    /// Set the rate rows
    pub fn rates(mut self, rows: impl Into<Vec<u32>>) -> Self {
        self.rate_rows = rows.into();
        self
    }

    /// Set the average rate rows
    pub fn avg_rates(mut self, rows: impl Into<Vec<u32>>) -> Self {
        self.avg_rate_rows = rows.into();
        self
    }

    /// Set the header rows
    pub fn headers(mut self, rows: impl Into<Vec<u32>>) -> Self {
        self.header_rows = rows.into();
        self
    }

    /// Set the light rows
    pub fn light(mut self, rows: impl Into<Vec<u32>>) -> Self {
        self.light_rows = rows.into();
        self
    }

    /// The block's region
    pub fn region(&self) -> GridRegion {
        GridRegion::new(self.start, self.end_row)
    }

    /// Check whether this is a city block
    pub fn is_city(&self) -> bool {
        matches!(self.layout, BlockLayout::City { .. })
    }

    /// Check whether any rate, average rate or subsection rows are configured
    pub fn has_rate_rows(&self) -> bool {
        !self.subsection_rows.is_empty()
            || !self.rate_rows.is_empty()
            || !self.avg_rate_rows.is_empty()
    }

    /// Anchor of the label table: `start` for regular blocks, one column to
    /// the right of the region column for city blocks
    pub fn table_start(&self) -> GridAddress {
        match self.layout {
            BlockLayout::Regular => self.start,
            BlockLayout::City { .. } => self.start.offset(0, 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_offsets() {
        let block = ReportBlockDescriptor::new("Dineout Pay Transacted Users", GridAddress::new(50, 2), 55)
            .subsections([3, 5]);

        let region = block.region();
        let rows: Vec<u32> = block
            .subsection_rows
            .iter()
            .map(|o| region.absolute_row(*o))
            .collect();
        assert_eq!(rows, vec![52, 54]);
    }

    #[test]
    fn test_merge_rows_with_subtotals() {
        let spans = RegionSpans::WITH_SUBTOTALS;
        assert_eq!(spans.merge_rows(146), [(147, 154), (155, 161), (162, 169)]);
    }

    #[test]
    fn test_merge_rows_without_subtotals() {
        let spans = RegionSpans::WITHOUT_SUBTOTALS;
        assert_eq!(spans.merge_rows(10), [(11, 17), (18, 23), (24, 30)]);
    }

    #[test]
    fn test_city_table_start() {
        let block = ReportBlockDescriptor::city(
            "Citywise Active Users (Overall)",
            GridAddress::new(146, 1),
            171,
            RegionSpans::WITH_SUBTOTALS,
        );
        assert!(block.is_city());
        assert!(!block.has_rate_rows());
        assert_eq!(block.table_start(), GridAddress::new(146, 2));
    }
}
