//! Visual formatting of report blocks
//!
//! A block's format is a pure function of its descriptor and the live column
//! count, so [`plan`] computes the full list of steps up front and
//! [`TableFormatter`] only executes it. Running the same plan twice leaves
//! the sheet unchanged.

use kpi_sheets_core::{
    BlockLayout, BorderEdge, BorderLineStyle, Color, GridRange, HorizontalAlignment,
    NumberFormat, RangeBorders, ReportBlockDescriptor, Style, VerticalAlignment,
};
use tracing::debug;

use crate::error::{Error, Result};
use crate::sheet::RemoteSheet;

const FONT: &str = "Cambria";

/// Named cell formats of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatKind {
    /// Header row of a table
    TableColumns,
    /// Merged region cells of a city table
    MergedHeader,
    /// Label column
    TableIndex,
    /// Label of a headline row
    TableIndexHeader,
    /// Muted secondary row
    TableIndexLight,
    /// Values of a headline row
    TableIndexHeaderValue,
    /// Values of a macro-region subtotal row
    RegionSubTotal,
    /// Label of a macro-region subtotal row
    RegionSubIndex,
    /// Plain values
    TableValues,
    /// Percentage rows
    TableSubSection,
    /// One-decimal average rows
    TableAvgRates,
    /// Whole-number rate rows
    TableValueRates,
}

/// The style palette used for every report block
#[derive(Debug, Clone, PartialEq)]
pub struct SheetFormats {
    pub table_columns: Style,
    pub merged_header: Style,
    pub table_index: Style,
    pub table_index_header: Style,
    pub table_index_light: Style,
    pub table_index_header_value: Style,
    pub region_sub_total: Style,
    pub region_sub_index: Style,
    pub table_values: Style,
    pub table_sub_section: Style,
    pub table_avg_rates: Style,
    pub table_value_rates: Style,
    /// Inner and outer table borders
    pub borders: RangeBorders,
}

impl SheetFormats {
    /// The report palette: Cambria throughout, light blue headers and borders
    pub fn standard() -> Self {
        let base = |size: f64| Style::new().font_name(FONT).font_size(size);
        let rate = || {
            base(8.0)
                .bold(true)
                .italic(true)
                .font_color(Color::BLUE)
                .horizontal_alignment(HorizontalAlignment::Right)
        };

        Self {
            table_columns: base(10.0)
                .bold(true)
                .fill_color(Color::HEADER_BLUE)
                .wrap_text(true)
                .horizontal_alignment(HorizontalAlignment::Center)
                .vertical_alignment(VerticalAlignment::Middle)
                .number_format(NumberFormat::long_date()),
            merged_header: base(10.0)
                .bold(true)
                .fill_color(Color::LIGHT_GRAY)
                .wrap_text(true)
                .horizontal_alignment(HorizontalAlignment::Center)
                .vertical_alignment(VerticalAlignment::Middle),
            table_index: base(9.0).horizontal_alignment(HorizontalAlignment::Right),
            table_index_header: base(9.0)
                .bold(true)
                .horizontal_alignment(HorizontalAlignment::Left)
                .number_format(NumberFormat::thousands()),
            table_index_light: base(8.0)
                .italic(true)
                .font_color(Color::DARK_GRAY)
                .horizontal_alignment(HorizontalAlignment::Right)
                .number_format(NumberFormat::thousands()),
            table_index_header_value: base(9.0)
                .bold(true)
                .horizontal_alignment(HorizontalAlignment::Right)
                .number_format(NumberFormat::thousands()),
            region_sub_total: base(9.0)
                .bold(true)
                .fill_color(Color::LIGHT_GRAY)
                .horizontal_alignment(HorizontalAlignment::Right)
                .number_format(NumberFormat::thousands()),
            region_sub_index: base(9.0)
                .bold(true)
                .fill_color(Color::LIGHT_GRAY)
                .horizontal_alignment(HorizontalAlignment::Left)
                .number_format(NumberFormat::thousands()),
            table_values: base(9.0)
                .horizontal_alignment(HorizontalAlignment::Right)
                .number_format(NumberFormat::thousands()),
            table_sub_section: rate().number_format(NumberFormat::percent_one_decimal()),
            table_avg_rates: rate().number_format(NumberFormat::thousands_one_decimal()),
            table_value_rates: rate().number_format(NumberFormat::thousands()),
            borders: RangeBorders::all(BorderEdge::new(BorderLineStyle::Solid, Color::HEADER_BLUE)),
        }
    }

    /// The style for a format kind
    pub fn style(&self, kind: FormatKind) -> &Style {
        match kind {
            FormatKind::TableColumns => &self.table_columns,
            FormatKind::MergedHeader => &self.merged_header,
            FormatKind::TableIndex => &self.table_index,
            FormatKind::TableIndexHeader => &self.table_index_header,
            FormatKind::TableIndexLight => &self.table_index_light,
            FormatKind::TableIndexHeaderValue => &self.table_index_header_value,
            FormatKind::RegionSubTotal => &self.region_sub_total,
            FormatKind::RegionSubIndex => &self.region_sub_index,
            FormatKind::TableValues => &self.table_values,
            FormatKind::TableSubSection => &self.table_sub_section,
            FormatKind::TableAvgRates => &self.table_avg_rates,
            FormatKind::TableValueRates => &self.table_value_rates,
        }
    }
}

impl Default for SheetFormats {
    fn default() -> Self {
        Self::standard()
    }
}

/// One formatting operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatStep {
    /// Replace the cell format of a range
    Style { range: GridRange, kind: FormatKind },
    /// Draw the table borders over a range
    Borders { range: GridRange },
    /// Merge a range
    Merge { range: GridRange },
}

impl FormatStep {
    /// The range the step touches
    pub fn range(&self) -> &GridRange {
        match self {
            FormatStep::Style { range, .. }
            | FormatStep::Borders { range }
            | FormatStep::Merge { range } => range,
        }
    }
}

/// Collects steps, skipping ranges that fall left of their first column
struct Planner {
    steps: Vec<FormatStep>,
    width: u32,
}

impl Planner {
    fn style(&mut self, row: u32, end_row: u32, col: u32, end_col: u32, kind: FormatKind) {
        if col <= end_col && row <= end_row {
            self.steps.push(FormatStep::Style {
                range: GridRange::from_indices(row, col, end_row, end_col),
                kind,
            });
        }
    }

    /// Style from `col` to the live width
    fn style_to_width(&mut self, row: u32, end_row: u32, col: u32, kind: FormatKind) {
        self.style(row, end_row, col, self.width, kind);
    }
}

/// Compute every formatting step for `block` given the live column count.
///
/// `width` is the absolute index of the last non-empty header cell.
pub fn plan(block: &ReportBlockDescriptor, width: u32) -> Vec<FormatStep> {
    let region = block.region();
    let r = block.start.row;
    let end = block.end_row;
    let c = block.table_start().col;
    let abs = |offsets: &[u32]| -> Vec<u32> {
        offsets.iter().map(|o| region.absolute_row(*o)).collect()
    };

    // City blocks without rate rows carry subtotal rows and a grand total
    let (header_rows, subtotal_rows) = match block.layout {
        BlockLayout::City { .. } if !block.has_rate_rows() => {
            (vec![end], vec![r + 8, r + 15, r + 23, end - 1])
        }
        BlockLayout::City { .. } => (Vec::new(), Vec::new()),
        BlockLayout::Regular => (abs(&block.header_rows), Vec::new()),
    };

    let mut p = Planner {
        steps: Vec::new(),
        width,
    };

    p.style_to_width(r + 1, end, c + 1, FormatKind::TableValues);
    p.style(r, end, c, c, FormatKind::TableIndex);
    for row in &header_rows {
        p.style_to_width(*row, *row, c, FormatKind::TableIndexHeader);
        p.style_to_width(*row, *row, c + 1, FormatKind::TableIndexHeaderValue);
    }
    if block.is_city() {
        for row in &subtotal_rows {
            p.style_to_width(*row, *row, c + 1, FormatKind::RegionSubTotal);
            p.style(*row, *row, c, c, FormatKind::RegionSubIndex);
        }
    } else {
        for row in abs(&block.light_rows) {
            p.style_to_width(row, row, c, FormatKind::TableIndexLight);
        }
    }
    p.style_to_width(r, r, c, FormatKind::TableColumns);
    for row in abs(&block.subsection_rows) {
        p.style_to_width(row, row, c, FormatKind::TableSubSection);
    }
    for row in abs(&block.avg_rate_rows) {
        p.style_to_width(row, row, c + 1, FormatKind::TableAvgRates);
        p.style(row, row, c, c, FormatKind::TableSubSection);
    }
    for row in abs(&block.rate_rows) {
        p.style_to_width(row, row, c + 1, FormatKind::TableValueRates);
        p.style(row, row, c, c, FormatKind::TableSubSection);
    }

    if let BlockLayout::City { spans } = block.layout {
        let rc = block.start.col;
        p.style(r, end, rc, rc, FormatKind::MergedHeader);
        p.style(r, r, rc, rc, FormatKind::TableColumns);
        p.steps.push(FormatStep::Borders {
            range: GridRange::from_indices(r, rc, end, rc),
        });
        for (first, last) in spans.merge_rows(r) {
            p.steps.push(FormatStep::Merge {
                range: GridRange::from_indices(first, rc, last, rc),
            });
        }
    }

    if c <= width {
        p.steps.push(FormatStep::Borders {
            range: GridRange::from_indices(r, c, end, width),
        });
    }
    p.steps
}

/// Applies the report palette to blocks on a sheet
#[derive(Debug, Clone, Default)]
pub struct TableFormatter {
    formats: SheetFormats,
}

impl TableFormatter {
    pub fn new(formats: SheetFormats) -> Self {
        Self { formats }
    }

    /// The palette in use
    pub fn formats(&self) -> &SheetFormats {
        &self.formats
    }

    /// Format one block, discovering the column count from its header row
    pub fn format<S: RemoteSheet + ?Sized>(
        &self,
        sheet: &mut S,
        block: &ReportBlockDescriptor,
    ) -> Result<()> {
        let width = sheet.last_column(block.start.row)?;
        if width < block.table_start().col {
            return Err(Error::shape(format!(
                "block '{}' on '{}' has an empty header row at {}, nothing to format",
                block.key,
                sheet.title(),
                block.start.row
            )));
        }

        debug!(block = %block.key, width, "Formatting block");
        for step in plan(block, width) {
            match step {
                FormatStep::Style { range, kind } => {
                    debug!(?kind, range = %range, "Applying format");
                    sheet.apply_format(&range, self.formats.style(kind))?;
                }
                FormatStep::Borders { range } => {
                    debug!(range = %range, "Drawing borders");
                    sheet.set_borders(&range, &self.formats.borders)?;
                }
                FormatStep::Merge { range } => {
                    debug!(range = %range, "Merging cells");
                    sheet.merge_cells(&range)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kpi_sheets_core::{GridAddress, RegionSpans, Worksheet};
    use pretty_assertions::assert_eq;

    fn styled_rows(steps: &[FormatStep], wanted: FormatKind) -> Vec<GridRange> {
        steps
            .iter()
            .filter_map(|s| match s {
                FormatStep::Style { range, kind } if *kind == wanted => Some(*range),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_subsection_offsets_translate() {
        let block = ReportBlockDescriptor::new("Dineout Pay Transacted Users", GridAddress::new(50, 2), 55)
            .subsections([3, 5]);
        let ranges = styled_rows(&plan(&block, 6), FormatKind::TableSubSection);
        assert_eq!(
            ranges,
            vec![
                GridRange::from_indices(52, 2, 52, 6),
                GridRange::from_indices(54, 2, 54, 6)
            ]
        );
    }

    #[test]
    fn test_regular_order_and_extent() {
        let block = ReportBlockDescriptor::new("Active Users", GridAddress::new(3, 2), 11).rates([5, 6]);
        let steps = plan(&block, 7);

        assert_eq!(
            steps[0],
            FormatStep::Style {
                range: GridRange::from_indices(4, 3, 11, 7),
                kind: FormatKind::TableValues
            }
        );
        assert_eq!(
            steps[1],
            FormatStep::Style {
                range: GridRange::from_indices(3, 2, 11, 2),
                kind: FormatKind::TableIndex
            }
        );
        assert_eq!(
            steps.last(),
            Some(&FormatStep::Borders {
                range: GridRange::from_indices(3, 2, 11, 7)
            })
        );
        assert_eq!(
            styled_rows(&steps, FormatKind::TableValueRates),
            vec![GridRange::from_indices(7, 3, 7, 7), GridRange::from_indices(8, 3, 8, 7)]
        );
    }

    #[test]
    fn test_city_subtotals_and_merges() {
        let block = ReportBlockDescriptor::city(
            "Citywise Active Users (Overall)",
            GridAddress::new(146, 1),
            171,
            RegionSpans::WITH_SUBTOTALS,
        );
        let steps = plan(&block, 4);

        let subtotal_rows: Vec<u32> = styled_rows(&steps, FormatKind::RegionSubTotal)
            .iter()
            .map(|r| r.start.row)
            .collect();
        assert_eq!(subtotal_rows, vec![154, 161, 169, 170]);
        assert_eq!(
            styled_rows(&steps, FormatKind::TableIndexHeader),
            vec![GridRange::from_indices(171, 2, 171, 4)]
        );

        let merges: Vec<GridRange> = steps
            .iter()
            .filter_map(|s| match s {
                FormatStep::Merge { range } => Some(*range),
                _ => None,
            })
            .collect();
        assert_eq!(
            merges,
            vec![
                GridRange::from_indices(147, 1, 154, 1),
                GridRange::from_indices(155, 1, 161, 1),
                GridRange::from_indices(162, 1, 169, 1)
            ]
        );
    }

    #[test]
    fn test_city_with_rates_has_no_subtotals() {
        let block = ReportBlockDescriptor::city("Citywise", GridAddress::new(10, 1), 30, RegionSpans::WITHOUT_SUBTOTALS)
            .rates([3]);
        let steps = plan(&block, 5);
        assert!(styled_rows(&steps, FormatKind::RegionSubTotal).is_empty());
        assert!(styled_rows(&steps, FormatKind::TableIndexHeader).is_empty());
    }

    #[test]
    fn test_format_uses_live_width() {
        let block = ReportBlockDescriptor::new("Active Users", GridAddress::new(3, 2), 5);
        let mut ws = Worksheet::new("Week Summary");
        for col in 2..=6 {
            ws.set_value(GridAddress::new(3, col), format!("h{}", col));
        }
        let formatter = TableFormatter::default();
        formatter.format(&mut ws, &block).unwrap();
        assert!(ws.borders(GridAddress::new(5, 6)).is_some());
        assert!(ws.borders(GridAddress::new(5, 7)).is_none());

        ws.set_value(GridAddress::new(3, 7), "h7");
        formatter.format(&mut ws, &block).unwrap();
        assert!(ws.borders(GridAddress::new(5, 7)).is_some());
        assert_eq!(ws.style(GridAddress::new(3, 7)), &formatter.formats().table_columns);
    }

    #[test]
    fn test_formatting_twice_looks_the_same() {
        let block = ReportBlockDescriptor::city(
            "Citywise Active Users (Overall)",
            GridAddress::new(146, 1),
            171,
            RegionSpans::WITH_SUBTOTALS,
        );
        let mut ws = Worksheet::new("Week Summary");
        ws.set_value(GridAddress::new(146, 1), "Region");
        ws.set_value(GridAddress::new(146, 2), "Citywise Active Users (Overall)");
        ws.set_value(GridAddress::new(146, 3), "26-Feb to 03-Mar");
        ws.set_value(GridAddress::new(146, 4), "04-Mar to 10-Mar");
        for (row, region) in [(147, "North"), (155, "South"), (162, "West")] {
            ws.set_value(GridAddress::new(row, 1), region);
        }
        for row in 147..=171 {
            ws.set_value(GridAddress::new(row, 2), format!("city {}", row));
            ws.set_value(GridAddress::new(row, 4), row as f64);
        }

        let snapshot = |ws: &Worksheet| {
            GridRange::from_indices(146, 1, 171, 4)
                .cells()
                .map(|addr| (ws.value(addr), ws.style(addr).clone(), ws.borders(addr).cloned()))
                .collect::<Vec<_>>()
        };

        let formatter = TableFormatter::default();
        formatter.format(&mut ws, &block).unwrap();
        let once = snapshot(&ws);
        let merges = ws.merged_regions().to_vec();
        assert_eq!(merges.len(), 3);

        formatter.format(&mut ws, &block).unwrap();
        assert_eq!(snapshot(&ws), once);
        assert_eq!(ws.merged_regions(), merges.as_slice());
    }

    #[test]
    fn test_empty_header_is_shape_error() {
        let block = ReportBlockDescriptor::new("Active Users", GridAddress::new(3, 2), 5);
        let mut ws = Worksheet::new("Week Summary");
        let err = TableFormatter::default().format(&mut ws, &block).unwrap_err();
        assert!(matches!(err, Error::SheetShape(_)));
    }
}
