//! Data sources
//!
//! [`DataSource`] is the warehouse seam: given a dataset and a bucket window
//! it returns the rows for that window. [`CsvExportWarehouse`] answers from
//! one CSV export per dataset, and [`CachedSource`] puts the on-disk extract
//! cache in front of any source.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use kpi_sheets_core::{CellValue, Table};
use kpi_sheets_csv::{CsvReadOptions, CsvReader, ExtractCache, ExtractKind};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::period::{parse_date, BucketWindow, Period};

/// A dataset the reports are computed from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    /// Per-bucket, per-segment activity aggregates
    Mau(Period),
    /// Membership records
    Memberships,
}

impl Dataset {
    /// Name used for export files and cached extracts
    pub fn name(&self) -> &'static str {
        match self {
            Dataset::Mau(period) => period.mau_dataset(),
            Dataset::Memberships => "memberships",
        }
    }

    /// How extracts of this dataset are cached
    pub fn extract_kind(&self) -> ExtractKind {
        match self {
            Dataset::Mau(_) => ExtractKind::Window,
            Dataset::Memberships => ExtractKind::Rolling,
        }
    }

    /// Keep the rows of `data` that belong to `window`.
    ///
    /// MAU rows are matched on their bucket column; memberships on being
    /// active at some point of the window.
    pub fn restrict(&self, data: &Table, window: BucketWindow) -> Result<Table> {
        let name = self.name();
        let date_at = |row: &[CellValue], idx: usize, column: &str| {
            parse_date(&row[idx]).ok_or_else(|| {
                Error::upstream(name, format!("'{}' in '{}' is not a date", row[idx], column))
            })
        };
        let column = |c: &str| {
            data.column_index(c)
                .ok_or_else(|| Error::upstream(name, format!("missing column '{}'", c)))
        };

        let mut rows = Vec::new();
        match self {
            Dataset::Mau(period) => {
                let bucket_column = match period {
                    Period::Day => "date",
                    Period::Week => "week_start_date",
                    Period::Month => "month",
                };
                let idx = column(bucket_column)?;
                for row in data.rows() {
                    let date = date_at(row, idx, bucket_column)?;
                    let keep = match period {
                        Period::Day => date == window.end,
                        Period::Week | Period::Month => window.contains(date),
                    };
                    if keep {
                        rows.push(row.clone());
                    }
                }
            }
            Dataset::Memberships => {
                let end_idx = column("end_date")?;
                let created_idx = column("created_at")?;
                for row in data.rows() {
                    let ends = date_at(row, end_idx, "end_date")?;
                    let created = date_at(row, created_idx, "created_at")?;
                    if ends >= window.start && created <= window.end {
                        rows.push(row.clone());
                    }
                }
            }
        }
        Ok(Table::from_rows(data.columns().to_vec(), rows)?)
    }
}

/// Parameterized query execution
pub trait DataSource {
    /// Rows of `dataset` for `window`
    fn fetch(&mut self, dataset: Dataset, window: BucketWindow) -> Result<Table>;
}

/// Answers queries from `<dir>/<dataset>.csv` warehouse exports
#[derive(Debug, Clone)]
pub struct CsvExportWarehouse {
    dir: PathBuf,
    options: CsvReadOptions,
}

impl CsvExportWarehouse {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self {
            dir: dir.into(),
            options: CsvReadOptions::default(),
        }
    }

    /// Path of the export holding `dataset`
    pub fn export_path(&self, dataset: Dataset) -> PathBuf {
        self.dir.join(format!("{}.csv", dataset.name()))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DataSource for CsvExportWarehouse {
    fn fetch(&mut self, dataset: Dataset, window: BucketWindow) -> Result<Table> {
        let path = self.export_path(dataset);
        if !path.is_file() {
            return Err(Error::upstream(
                dataset.name(),
                format!("export {} not found", path.display()),
            ));
        }
        info!(dataset = dataset.name(), %window, "Querying export");
        let all = CsvReader::read_file(&path, &self.options)
            .map_err(|e| Error::upstream(dataset.name(), e.to_string()))?;
        let rows = dataset.restrict(&all, window)?;
        debug!(dataset = dataset.name(), total = all.row_count(), kept = rows.row_count(), "Filtered export");
        Ok(rows)
    }
}

/// Serves cached extracts when available, querying and caching otherwise
#[derive(Debug, Clone)]
pub struct CachedSource<S> {
    inner: S,
    cache: ExtractCache,
}

impl<S: DataSource> CachedSource<S> {
    pub fn new(inner: S, cache: ExtractCache) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &ExtractCache {
        &self.cache
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: DataSource> DataSource for CachedSource<S> {
    fn fetch(&mut self, dataset: Dataset, window: BucketWindow) -> Result<Table> {
        let name = dataset.name();
        let kind = dataset.extract_kind();

        if let Some(hit) = self.cache.lookup(name, kind, window.start, window.end)? {
            info!(dataset = name, path = %hit.path.display(), "Using extract");
            let cached = self.cache.load(&hit)?;
            return match kind {
                ExtractKind::Window => Ok(cached),
                // Rolling snapshots cover all time and still need the window applied
                ExtractKind::Rolling => dataset.restrict(&cached, window),
            };
        }

        match kind {
            ExtractKind::Window => {
                let rows = self.inner.fetch(dataset, window)?;
                self.cache.store(name, kind, window.start, window.end, &rows)?;
                Ok(rows)
            }
            ExtractKind::Rolling => {
                let snapshot_window = BucketWindow {
                    start: NaiveDate::MIN,
                    end: window.end,
                };
                let snapshot = self.inner.fetch(dataset, snapshot_window)?;
                self.cache.store(name, kind, window.start, window.end, &snapshot)?;
                dataset.restrict(&snapshot, window)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_restrict_week_by_start_date() {
        let data = Table::from_rows(
            ["week_start_date", "users"],
            vec![
                vec![CellValue::text("2024-02-26"), CellValue::Number(1.0)],
                vec![CellValue::text("2024-03-04"), CellValue::Number(2.0)],
            ],
        )
        .unwrap();
        let window = Period::Week.window(date("2024-03-10"));
        let rows = Dataset::Mau(Period::Week).restrict(&data, window).unwrap();
        assert_eq!(rows.row_count(), 1);
        assert_eq!(rows.rows()[0][1], CellValue::Number(2.0));
    }

    #[test]
    fn test_restrict_memberships_active_in_window() {
        let data = Table::from_rows(
            ["diner_id", "end_date", "created_at"],
            vec![
                vec![1.into(), "2024-02-20".into(), "2023-02-20".into()],
                vec![2.into(), "2024-03-05".into(), "2024-01-01".into()],
                vec![3.into(), "2025-01-01".into(), "2024-04-01".into()],
            ],
        )
        .unwrap();
        let window = Period::Month.window(date("2024-03-31"));
        let rows = Dataset::Memberships.restrict(&data, window).unwrap();
        assert_eq!(rows.column_values("diner_id").unwrap(), vec![&CellValue::Number(2.0)]);
    }

    #[test]
    fn test_bad_date_is_upstream_error() {
        let data = Table::from_rows(["date"], vec![vec!["yesterday".into()]]).unwrap();
        let err = Dataset::Mau(Period::Day)
            .restrict(&data, Period::Day.window(date("2024-03-05")))
            .unwrap_err();
        assert!(matches!(err, Error::UpstreamQuery { .. }));
    }

    #[test]
    fn test_missing_export() {
        let dir = tempfile::tempdir().unwrap();
        let mut warehouse = CsvExportWarehouse::new(dir.path());
        let err = warehouse
            .fetch(Dataset::Memberships, Period::Day.window(date("2024-03-05")))
            .unwrap_err();
        assert!(matches!(err, Error::UpstreamQuery { ref dataset, .. } if dataset == "memberships"));
    }
}
