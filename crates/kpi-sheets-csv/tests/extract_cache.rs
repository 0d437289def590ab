//! Tests for the on-disk extract cache

use chrono::NaiveDate;
use kpi_sheets_core::{CellValue, Table};
use kpi_sheets_csv::{ExtractCache, ExtractKind};
use pretty_assertions::assert_eq;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn sample() -> Table {
    Table::from_rows(
        ["diner_id", "city"],
        vec![
            vec![CellValue::Number(1.0), CellValue::text("Mumbai")],
            vec![CellValue::Number(2.0), CellValue::text("Pune")],
        ],
    )
    .unwrap()
}

/// Test a window extract is only reused for the exact same window
#[test]
fn test_window_extract_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ExtractCache::new(dir.path(), 5);
    let (start, end) = (date("2024-03-04"), date("2024-03-10"));

    assert!(cache
        .lookup("doPayData", ExtractKind::Window, start, end)
        .unwrap()
        .is_none());

    cache
        .store("doPayData", ExtractKind::Window, start, end, &sample())
        .unwrap();

    let hit = cache
        .lookup("doPayData", ExtractKind::Window, start, end)
        .unwrap()
        .expect("window extract should be found");
    assert_eq!(cache.load(&hit).unwrap(), sample());

    let other_window = cache
        .lookup("doPayData", ExtractKind::Window, start, date("2024-03-11"))
        .unwrap();
    assert!(other_window.is_none(), "different end date must miss");
}

/// Test rolling extracts are reused only while within the recency window
#[test]
fn test_rolling_extract_recency() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ExtractCache::new(dir.path(), 5);
    let snapshot = date("2024-03-10");

    cache
        .store("signUpData", ExtractKind::Rolling, snapshot, snapshot, &sample())
        .unwrap();

    // 2024-03-10 > 2024-03-14 - 5 days
    let hit = cache
        .lookup("signUpData", ExtractKind::Rolling, snapshot, date("2024-03-14"))
        .unwrap();
    assert_eq!(hit.map(|h| h.till), Some(snapshot));

    // 2024-03-10 is not after 2024-03-15 - 5 days
    let miss = cache
        .lookup("signUpData", ExtractKind::Rolling, snapshot, date("2024-03-15"))
        .unwrap();
    assert!(miss.is_none(), "stale snapshot must not be reused");
}

/// Test the newest rolling snapshot wins and other datasets are ignored
#[test]
fn test_rolling_extract_picks_newest_of_same_name() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ExtractCache::new(dir.path(), 5);

    for till in ["2024-03-01", "2024-03-09", "2024-03-05"] {
        cache
            .store("newDinersDoPay", ExtractKind::Rolling, date(till), date(till), &sample())
            .unwrap();
    }
    cache
        .store("newDinersReserve", ExtractKind::Rolling, date("2024-03-12"), date("2024-03-12"), &sample())
        .unwrap();

    let hit = cache
        .find_rolling("newDinersDoPay", date("2024-03-12"))
        .unwrap()
        .expect("recent snapshot should be found");
    assert_eq!(hit.till, date("2024-03-09"));
    assert!(hit.path.ends_with("newDinersDoPay_till_2024-03-09.csv"));
}
