//! On-disk extract cache
//!
//! Query results are saved as CSV files in a cache directory and reused on
//! later runs. Two naming schemes exist:
//!
//! - window extracts, `<name>_<start>_to_<end>.csv`, reused only for the
//!   exact same date window;
//! - rolling extracts, `<name>_till_<date>.csv`, snapshots of an all-time
//!   dataset, reused while the snapshot date is within the recency window of
//!   the requested end date.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::error::CsvResult;
use crate::options::{CsvReadOptions, CsvWriteOptions};
use crate::reader::CsvReader;
use crate::writer::CsvWriter;
use kpi_sheets_core::Table;

const DATE_FORMAT: &str = "%Y-%m-%d";

static ROLLING_FILE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<name>.+)_till_(?P<date>\d{4}-\d{2}-\d{2})\.csv$")
        .expect("valid rolling extract pattern")
});

/// How a dataset's extracts are keyed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractKind {
    /// Keyed by the exact start and end date
    Window,
    /// Keyed by the snapshot date, reused while recent enough
    Rolling,
}

/// A cache hit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedExtract {
    /// File holding the extract
    pub path: PathBuf,
    /// Naming scheme the file was found under
    pub kind: ExtractKind,
    /// Last date covered by the extract
    pub till: NaiveDate,
}

/// Directory of cached extracts
#[derive(Debug, Clone)]
pub struct ExtractCache {
    dir: PathBuf,
    recency_days: i64,
}

impl ExtractCache {
    /// Create a cache rooted at `dir`.
    ///
    /// Rolling extracts dated after `end - recency_days` are reused.
    pub fn new<P: Into<PathBuf>>(dir: P, recency_days: i64) -> Self {
        Self {
            dir: dir.into(),
            recency_days,
        }
    }

    /// The cache directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the window extract for `name` over `start..=end`
    pub fn window_path(&self, name: &str, start: NaiveDate, end: NaiveDate) -> PathBuf {
        self.dir.join(format!(
            "{}_{}_to_{}.csv",
            name,
            start.format(DATE_FORMAT),
            end.format(DATE_FORMAT)
        ))
    }

    /// Path of the rolling extract for `name` taken on `till`
    pub fn rolling_path(&self, name: &str, till: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("{}_till_{}.csv", name, till.format(DATE_FORMAT)))
    }

    /// Look up a usable extract for `name`
    pub fn lookup(
        &self,
        name: &str,
        kind: ExtractKind,
        start: NaiveDate,
        end: NaiveDate,
    ) -> CsvResult<Option<CachedExtract>> {
        match kind {
            ExtractKind::Window => {
                let path = self.window_path(name, start, end);
                Ok(path.is_file().then(|| CachedExtract {
                    path,
                    kind,
                    till: end,
                }))
            }
            ExtractKind::Rolling => self.find_rolling(name, end),
        }
    }

    /// Newest rolling extract for `name`, if it is fresh enough for `end`
    pub fn find_rolling(&self, name: &str, end: NaiveDate) -> CsvResult<Option<CachedExtract>> {
        if !self.dir.is_dir() {
            return Ok(None);
        }

        let mut newest: Option<(NaiveDate, PathBuf)> = None;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let Some(file_name) = path.file_name().and_then(|f| f.to_str()) else {
                continue;
            };
            let Some(caps) = ROLLING_FILE.captures(file_name) else {
                continue;
            };
            if &caps["name"] != name {
                continue;
            }
            let till = match NaiveDate::parse_from_str(&caps["date"], DATE_FORMAT) {
                Ok(d) => d,
                Err(e) => {
                    warn!(file = file_name, error = %e, "Skipping extract with unparseable date");
                    continue;
                }
            };
            if newest.as_ref().map_or(true, |(d, _)| till > *d) {
                newest = Some((till, path));
            }
        }

        let cutoff = end - Duration::days(self.recency_days);
        Ok(match newest {
            Some((till, path)) if till > cutoff => {
                debug!(name, %till, "Rolling extract is fresh");
                Some(CachedExtract {
                    path,
                    kind: ExtractKind::Rolling,
                    till,
                })
            }
            Some((till, _)) => {
                debug!(name, %till, %cutoff, "Rolling extract is stale");
                None
            }
            None => None,
        })
    }

    /// Load a cached extract
    pub fn load(&self, extract: &CachedExtract) -> CsvResult<Table> {
        CsvReader::read_file(&extract.path, &CsvReadOptions::default())
    }

    /// Save an extract under the naming scheme of `kind`, returning its path
    pub fn store(
        &self,
        name: &str,
        kind: ExtractKind,
        start: NaiveDate,
        end: NaiveDate,
        table: &Table,
    ) -> CsvResult<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = match kind {
            ExtractKind::Window => self.window_path(name, start, end),
            ExtractKind::Rolling => self.rolling_path(name, end),
        };
        CsvWriter::write_table_file(table, &path, &CsvWriteOptions::default())?;
        debug!(path = %path.display(), rows = table.row_count(), "Saved extract");
        Ok(path)
    }
}
