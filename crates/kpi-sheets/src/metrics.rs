//! Breakdown metrics
//!
//! Every regular report block is the same computation with different
//! parameters: a list of labelled lines, each aggregating one value column
//! over the rows that pass a filter. [`Breakdown`] is that computation.

use ahash::AHashSet;
use kpi_sheets_core::{CellValue, MetricRow, MetricTable, Table};

use crate::error::{Error, Result};

/// Row predicate over named columns.
///
/// Values are compared by their text rendering, so `Number(1.0)` equals `"1"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Every row
    All,
    /// Column equals value
    Eq { column: String, value: String },
    /// Column differs from value
    Ne { column: String, value: String },
    /// All inner filters hold
    And(Vec<Filter>),
}

impl Filter {
    pub fn eq<C: Into<String>, V: Into<String>>(column: C, value: V) -> Self {
        Filter::Eq {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn ne<C: Into<String>, V: Into<String>>(column: C, value: V) -> Self {
        Filter::Ne {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Combine with another filter
    pub fn and(self, other: Filter) -> Self {
        match (self, other) {
            (Filter::All, f) | (f, Filter::All) => f,
            (Filter::And(mut a), Filter::And(b)) => {
                a.extend(b);
                Filter::And(a)
            }
            (Filter::And(mut a), f) => {
                a.push(f);
                Filter::And(a)
            }
            (f, g) => Filter::And(vec![f, g]),
        }
    }

    /// Resolve column names against a table
    fn bind(&self, table: &Table, dataset: &str) -> Result<BoundFilter> {
        let index = |column: &str| {
            table.column_index(column).ok_or_else(|| {
                Error::upstream(dataset, format!("missing column '{}'", column))
            })
        };
        Ok(match self {
            Filter::All => BoundFilter::All,
            Filter::Eq { column, value } => BoundFilter::Eq(index(column)?, value.clone()),
            Filter::Ne { column, value } => BoundFilter::Ne(index(column)?, value.clone()),
            Filter::And(inner) => BoundFilter::And(
                inner
                    .iter()
                    .map(|f| f.bind(table, dataset))
                    .collect::<Result<_>>()?,
            ),
        })
    }

    /// Copy of `table` holding only the rows that pass
    pub fn select(&self, table: &Table, dataset: &str) -> Result<Table> {
        let bound = self.bind(table, dataset)?;
        let rows = table
            .rows()
            .iter()
            .filter(|r| bound.matches(r))
            .cloned()
            .collect();
        Ok(Table::from_rows(table.columns().to_vec(), rows)?)
    }
}

enum BoundFilter {
    All,
    Eq(usize, String),
    Ne(usize, String),
    And(Vec<BoundFilter>),
}

impl BoundFilter {
    fn matches(&self, row: &[CellValue]) -> bool {
        match self {
            BoundFilter::All => true,
            BoundFilter::Eq(idx, value) => row[*idx].as_key() == *value,
            BoundFilter::Ne(idx, value) => row[*idx].as_key() != *value,
            BoundFilter::And(inner) => inner.iter().all(|f| f.matches(row)),
        }
    }
}

/// How one line reduces its rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Aggregation {
    /// Sum of a numeric column; empty cells count as zero
    Sum(String),
    /// Number of distinct non-empty values of a column
    DistinctCount(String),
}

impl Aggregation {
    fn column(&self) -> &str {
        match self {
            Aggregation::Sum(c) | Aggregation::DistinctCount(c) => c,
        }
    }
}

/// One output row of a breakdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// A computed value row
    Value {
        label: String,
        aggregation: Aggregation,
        filter: Filter,
    },
    /// An empty separator row
    Spacer,
}

/// A parameterized breakdown over one dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breakdown {
    /// Block key (label column header)
    pub key: String,
    /// Output rows, in order
    pub lines: Vec<Line>,
}

impl Breakdown {
    pub fn new<K: Into<String>>(key: K) -> Self {
        Self {
            key: key.into(),
            lines: Vec::new(),
        }
    }

    /// Add a row summing `column` over rows passing `filter`
    pub fn sum<L: Into<String>, C: Into<String>>(mut self, label: L, column: C, filter: Filter) -> Self {
        self.lines.push(Line::Value {
            label: label.into(),
            aggregation: Aggregation::Sum(column.into()),
            filter,
        });
        self
    }

    /// Add a row counting distinct values of `column` over rows passing `filter`
    pub fn distinct<L: Into<String>, C: Into<String>>(
        mut self,
        label: L,
        column: C,
        filter: Filter,
    ) -> Self {
        self.lines.push(Line::Value {
            label: label.into(),
            aggregation: Aggregation::DistinctCount(column.into()),
            filter,
        });
        self
    }

    /// Add an empty separator row
    pub fn spacer(mut self) -> Self {
        self.lines.push(Line::Spacer);
        self
    }

    /// Compute the breakdown over `data` for one bucket
    pub fn compute(&self, data: &Table, dataset: &str, bucket_label: &str) -> Result<MetricTable> {
        let mut table = MetricTable::new(self.key.as_str(), bucket_label);
        for line in &self.lines {
            let row = match line {
                Line::Spacer => MetricRow::spacer(),
                Line::Value {
                    label,
                    aggregation,
                    filter,
                } => {
                    let bound = filter.bind(data, dataset)?;
                    let idx = data.column_index(aggregation.column()).ok_or_else(|| {
                        Error::upstream(
                            dataset,
                            format!("missing column '{}'", aggregation.column()),
                        )
                    })?;
                    let rows = data.rows().iter().filter(|r| bound.matches(r));
                    let value = match aggregation {
                        Aggregation::Sum(column) => {
                            let mut total = 0.0;
                            for row in rows {
                                total += numeric(&row[idx], dataset, column)?;
                            }
                            total
                        }
                        Aggregation::DistinctCount(_) => rows
                            .filter(|r| !r[idx].is_empty())
                            .map(|r| r[idx].as_key())
                            .collect::<AHashSet<_>>()
                            .len() as f64,
                    };
                    MetricRow::new(label.as_str(), value)
                }
            };
            table.push(row);
        }
        Ok(table)
    }
}

/// Numeric cell value, empty counting as zero
pub(crate) fn numeric(value: &CellValue, dataset: &str, column: &str) -> Result<f64> {
    if value.is_empty() {
        return Ok(0.0);
    }
    value.as_number().ok_or_else(|| {
        Error::upstream(
            dataset,
            format!("column '{}' holds non-numeric value '{}'", column, value),
        )
    })
}

/// Filters over the MAU dataset's user segment columns
pub mod segment {
    use super::Filter;

    pub const SUBSCRIPTION_TYPE: &str = "subscription_type";
    pub const LOGIN_STATUS: &str = "login_status";
    pub const NEW_VISITOR_FLAG: &str = "new_visitor_flag";
    pub const NON_DP_MEMBERS: &str = "non_dp_members";
    pub const ACTIVE: &str = "active";

    /// Members of the premium program, any cohort
    pub fn dp_members() -> Filter {
        Filter::ne(SUBSCRIPTION_TYPE, NON_DP_MEMBERS)
    }

    pub fn non_dp() -> Filter {
        Filter::eq(SUBSCRIPTION_TYPE, NON_DP_MEMBERS)
    }

    /// Logged-in users outside the program
    pub fn logged_in() -> Filter {
        non_dp().and(Filter::eq(LOGIN_STATUS, ACTIVE))
    }

    /// Anonymous users outside the program
    pub fn logged_out() -> Filter {
        non_dp().and(Filter::ne(LOGIN_STATUS, ACTIVE))
    }

    pub fn new_visitors(base: Filter) -> Filter {
        base.and(Filter::eq(NEW_VISITOR_FLAG, "1"))
    }

    pub fn returning_visitors(base: Filter) -> Filter {
        base.and(Filter::eq(NEW_VISITOR_FLAG, "0"))
    }

    /// One membership cohort (`paid`, `prime`, `hdfc`, `migration`, `others`)
    pub fn cohort(name: &str) -> Filter {
        Filter::eq(SUBSCRIPTION_TYPE, name)
    }
}

/// Datasets available for one bucket
#[derive(Debug, Clone, Default)]
pub struct BucketInputs {
    /// Per-segment activity aggregates
    pub mau: Option<Table>,
    /// Membership records active in the window
    pub memberships: Option<Table>,
}

impl BucketInputs {
    /// The MAU dataset, failing when it was not supplied
    pub fn require_mau(&self, metric: &str) -> Result<&Table> {
        self.mau.as_ref().ok_or_else(|| {
            Error::MissingInput(format!("'{}' needs the MAU dataset", metric))
        })
    }

    /// The membership dataset, failing when it was not supplied
    pub fn require_memberships(&self, metric: &str) -> Result<&Table> {
        self.memberships.as_ref().ok_or_else(|| {
            Error::MissingInput(format!("'{}' needs the membership dataset", metric))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn mau() -> Table {
        let row = |sub: &str, login: &str, new: i32, users: f64| {
            vec![
                CellValue::text(sub),
                CellValue::text(login),
                CellValue::from(new),
                CellValue::Number(users),
            ]
        };
        Table::from_rows(
            ["subscription_type", "login_status", "new_visitor_flag", "users"],
            vec![
                row("paid", "active", 0, 10.0),
                row("non_dp_members", "active", 1, 4.0),
                row("non_dp_members", "active", 0, 6.0),
                row("non_dp_members", "inactive", 1, 3.0),
                row("prime", "active", 0, 2.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_segment_sums() {
        let breakdown = Breakdown::new("Active Users")
            .sum("Total", "users", Filter::All)
            .sum("DP members", "users", segment::dp_members())
            .sum("Non DP (Logged in users)", "users", segment::logged_in())
            .sum("New Users", "users", segment::new_visitors(segment::logged_in()))
            .sum("Non Logged in users", "users", segment::logged_out());

        let table = breakdown.compute(&mau(), "mauDataWeek", "w1").unwrap();
        let values: Vec<Option<f64>> = table.rows.iter().map(|r| r.value).collect();
        assert_eq!(values, vec![Some(25.0), Some(12.0), Some(10.0), Some(4.0), Some(3.0)]);
        assert_eq!(table.bucket_label, "w1");
    }

    #[test]
    fn test_spacer_and_distinct() {
        let data = Table::from_rows(
            ["diner_id", "subscription_type"],
            vec![
                vec![CellValue::Number(1.0), CellValue::text("paid")],
                vec![CellValue::Number(1.0), CellValue::text("paid")],
                vec![CellValue::Number(2.0), CellValue::text("prime")],
                vec![CellValue::Empty, CellValue::text("paid")],
            ],
        )
        .unwrap();
        let table = Breakdown::new("Members")
            .distinct("Total", "diner_id", Filter::All)
            .spacer()
            .distinct("Paid", "diner_id", segment::cohort("paid"))
            .compute(&data, "memberships", "Mar'24")
            .unwrap();

        assert_eq!(table.rows[0].value, Some(2.0));
        assert!(table.rows[1].is_spacer());
        assert_eq!(table.rows[2].value, Some(1.0));
    }

    #[test]
    fn test_missing_column_is_upstream_error() {
        let err = Breakdown::new("RDP")
            .sum("Total", "restaurants_visited_users", Filter::All)
            .compute(&mau(), "mauDataWeek", "w1")
            .unwrap_err();
        assert!(matches!(err, Error::UpstreamQuery { ref dataset, .. } if dataset == "mauDataWeek"));
    }

    #[test]
    fn test_filter_select() {
        let dp = segment::dp_members().select(&mau(), "mauDataWeek").unwrap();
        assert_eq!(dp.row_count(), 2);
    }

    #[test]
    fn test_missing_input() {
        let inputs = BucketInputs::default();
        assert!(matches!(
            inputs.require_mau("Active Users"),
            Err(Error::MissingInput(_))
        ));
    }
}
