//! Property tests for merging buckets into a live region

use kpi_sheets::prelude::*;
use proptest::prelude::*;

const LABELS: [&str; 5] = ["Users", "DP members", "New Users", "Returning Users", "Others"];

fn block() -> ReportBlockDescriptor {
    ReportBlockDescriptor::new("Active Users", GridAddress::new(3, 2), 20)
}

fn table(bucket: &str, rows: &[(usize, u32)]) -> MetricTable {
    rows.iter().fold(MetricTable::new("Active Users", bucket), |t, (label, value)| {
        t.with_row(MetricRow::new(LABELS[*label], *value as f64))
    })
}

fn snapshot(sheet: &Worksheet) -> Vec<Vec<CellValue>> {
    sheet
        .used_range()
        .map(|range| sheet.read_range(&range))
        .unwrap_or_default()
}

fn data_columns(sheet: &Worksheet) -> u32 {
    let block = block();
    sheet.last_used_col(block.start.row) - block.start.col
}

fn rows_strategy() -> impl Strategy<Value = Vec<(usize, u32)>> {
    prop::collection::vec((0..LABELS.len(), 0u32..1_000_000), 1..8)
}

proptest! {
    /// Test writing the same bucket twice leaves the sheet as it was after the first write
    #[test]
    fn test_reconcile_is_idempotent(
        history in rows_strategy(),
        current in rows_strategy(),
    ) {
        let mut sheet = Worksheet::new("Week Summary");
        RegionReconciler::update(&mut sheet, &block(), &table("26-Feb to 03-Mar", &history)).unwrap();
        RegionReconciler::update(&mut sheet, &block(), &table("04-Mar to 10-Mar", &current)).unwrap();
        let once = snapshot(&sheet);

        let again = RegionReconciler::update(&mut sheet, &block(), &table("04-Mar to 10-Mar", &current)).unwrap();
        prop_assert!(
            matches!(again.placement, Placement::Replaced { column: 4 }),
            "unexpected placement {:?}",
            again.placement
        );
        prop_assert_eq!(snapshot(&sheet), once);
    }

    /// Test a new bucket adds one column and leaves earlier columns untouched
    #[test]
    fn test_history_is_preserved(
        first in rows_strategy(),
        second in rows_strategy(),
    ) {
        let mut sheet = Worksheet::new("Week Summary");
        RegionReconciler::update(&mut sheet, &block(), &table("Feb'24", &first)).unwrap();
        let before = data_columns(&sheet);
        let history: Vec<CellValue> = (3..=20).map(|row| sheet.value(GridAddress::new(row, 3))).collect();

        RegionReconciler::update(&mut sheet, &block(), &table("Mar'24", &second)).unwrap();
        prop_assert_eq!(data_columns(&sheet), before + 1);

        let after: Vec<CellValue> = (3..=20).map(|row| sheet.value(GridAddress::new(row, 3))).collect();
        prop_assert_eq!(after, history);

        RegionReconciler::update(&mut sheet, &block(), &table("Mar'24", &second)).unwrap();
        prop_assert_eq!(data_columns(&sheet), before + 1);
    }
}
