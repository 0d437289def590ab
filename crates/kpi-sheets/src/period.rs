//! Reporting periods, bucket windows and bucket labels

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use kpi_sheets_core::{CellValue, Table};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d-%m-%Y"];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a date out of a cell, accepting a date-time as well
pub fn parse_date(value: &CellValue) -> Option<NaiveDate> {
    let text = value.as_text()?.trim();
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(text, f).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(text, f).ok())
                .map(|dt| dt.date())
        })
}

/// Reporting granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    Week,
    Month,
}

/// Dates covered by one bucket, both ends inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BucketWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl BucketWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for BucketWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

impl Period {
    /// Default title of the worksheet holding this period's report
    pub fn sheet_title(&self) -> &'static str {
        match self {
            Period::Day => "Daily Summary",
            Period::Week => "Week Summary",
            Period::Month => "Month Summary",
        }
    }

    /// Name of the MAU dataset for this period
    pub fn mau_dataset(&self) -> &'static str {
        match self {
            Period::Day => "mauDataDay",
            Period::Week => "mauDataWeek",
            Period::Month => "mauDataMonth",
        }
    }

    /// The bucket ending on `date`: the day itself, Monday to `date`, or
    /// the first of the month to `date`
    pub fn window(&self, date: NaiveDate) -> BucketWindow {
        let start = match self {
            Period::Day => date,
            Period::Week => date - Duration::days(date.weekday().num_days_from_monday() as i64),
            Period::Month => date.with_day(1).unwrap_or(date),
        };
        BucketWindow { start, end: date }
    }

    /// Bucket end dates to run for a backfill between `start` and `end`.
    ///
    /// Months yield month-end dates, weeks yield the Sunday closing each
    /// week, days yield every date. Dates outside the range are dropped.
    pub fn dates_between(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        let mut dates = BTreeSet::new();
        for date in start.iter_days().take_while(|d| *d <= end) {
            let candidate = match self {
                Period::Day => date,
                Period::Week => {
                    date - Duration::days(date.weekday().num_days_from_monday() as i64 + 1)
                }
                Period::Month => month_end(date),
            };
            if candidate >= start && candidate <= end {
                dates.insert(candidate);
            }
        }
        dates.into_iter().collect()
    }

    /// Bucket label read from the dataset's own bucket columns.
    ///
    /// `None` when the dataset has no rows.
    pub fn bucket_label(&self, data: &Table, dataset: &str) -> Result<Option<String>> {
        let first = |column: &str| -> Result<Option<NaiveDate>> {
            let values = data.column_values(column).map_err(|_| {
                Error::upstream(dataset, format!("missing bucket column '{}'", column))
            })?;
            match values.first() {
                None => Ok(None),
                Some(v) => parse_date(v).map(Some).ok_or_else(|| {
                    Error::upstream(dataset, format!("'{}' in '{}' is not a date", v, column))
                }),
            }
        };

        Ok(match self {
            Period::Week => match (first("week_start_date")?, first("week_end_date")?) {
                (Some(s), Some(e)) => Some(week_label(s, e)),
                _ => None,
            },
            Period::Month => first("month")?.map(month_label),
            Period::Day => first("date")?.map(day_label),
        })
    }

    /// Bucket label derived from the window alone
    pub fn window_label(&self, window: BucketWindow) -> String {
        match self {
            Period::Week => week_label(window.start, window.start + Duration::days(6)),
            Period::Month => month_label(window.start),
            Period::Day => day_label(window.end),
        }
    }
}

fn week_label(start: NaiveDate, end: NaiveDate) -> String {
    format!("{} to {}", start.format("%d-%b"), end.format("%d-%b"))
}

fn month_label(date: NaiveDate) -> String {
    date.format("%b'%y").to_string()
}

fn day_label(date: NaiveDate) -> String {
    date.format("%d-%b-%Y").to_string()
}

fn month_end(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|d| d.pred_opt())
        .unwrap_or(date)
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
        })
    }
}

impl FromStr for Period {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "day" => Ok(Period::Day),
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            other => Err(Error::config(format!(
                "unknown period '{}', expected day, week or month",
                other
            ))),
        }
    }
}
