//! Report catalogs: every block of the regular and the city report
//!
//! A block pairs its fixed sheet placement with the metric that fills it.

use kpi_sheets_core::{GridAddress, MetricTable, RegionSpans, ReportBlockDescriptor};

use crate::error::Result;
use crate::membership::{Cohort, MembershipClassifier};
use crate::metrics::{segment, BucketInputs, Breakdown, Filter};
use crate::period::Period;
use crate::regional::{CityTaxonomy, RegionalAggregator};
use crate::source::Dataset;

/// MAU column holding the user's city
pub const CITY_COLUMN: &str = "custom_dimension_city";

/// What fills a block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricSource {
    /// A breakdown over the MAU dataset
    Breakdown(Breakdown),
    /// Cohort counts over the membership dataset
    Memberships { total_label: String },
    /// Per-city sums over the MAU rows passing `filter`
    City { value_column: String, filter: Filter },
}

/// One block of a report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportBlock {
    pub descriptor: ReportBlockDescriptor,
    pub source: MetricSource,
}

impl ReportBlock {
    /// Block key
    pub fn key(&self) -> &str {
        &self.descriptor.key
    }

    /// Dataset the metric reads
    pub fn dataset(&self, period: Period) -> Dataset {
        match self.source {
            MetricSource::Memberships { .. } => Dataset::Memberships,
            _ => Dataset::Mau(period),
        }
    }

    /// Compute the block's table for one bucket
    pub fn compute(
        &self,
        inputs: &BucketInputs,
        period: Period,
        taxonomy: &CityTaxonomy,
        bucket_label: &str,
    ) -> Result<MetricTable> {
        let key = self.key();
        match &self.source {
            MetricSource::Breakdown(breakdown) => {
                breakdown.compute(inputs.require_mau(key)?, period.mau_dataset(), bucket_label)
            }
            MetricSource::Memberships { total_label } => MembershipClassifier::count(
                inputs.require_memberships(key)?,
                key,
                total_label,
                bucket_label,
            ),
            MetricSource::City {
                value_column,
                filter,
            } => {
                let rows = filter.select(inputs.require_mau(key)?, period.mau_dataset())?;
                RegionalAggregator::new(taxonomy).aggregate(
                    &rows,
                    value_column,
                    CITY_COLUMN,
                    key,
                    bucket_label,
                )
            }
        }
    }
}

/// Which report a catalog describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogKind {
    Regular,
    City,
}

/// The ordered blocks of one report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportCatalog {
    kind: CatalogKind,
    blocks: Vec<ReportBlock>,
}

impl ReportCatalog {
    pub fn new(kind: CatalogKind, blocks: Vec<ReportBlock>) -> Self {
        Self { kind, blocks }
    }

    /// The catalog of the given kind
    pub fn standard(kind: CatalogKind) -> Self {
        match kind {
            CatalogKind::Regular => Self::regular(),
            CatalogKind::City => Self::city(),
        }
    }

    /// The eight segment and membership blocks
    pub fn regular() -> Self {
        let dp_rates = [3, 4, 5, 6, 7];
        let blocks = vec![
            regular_block(
                "Active Users",
                3,
                11,
                [5, 6, 8, 9],
                segments("Active Users", "No. of Users who launched the App (A)", "users", true),
            ),
            regular_block(
                "RDP Viewed Users",
                31,
                39,
                [5, 6, 8, 9],
                segments(
                    "RDP Viewed Users",
                    "No. of Users who Viewed RDP (B)",
                    "restaurants_visited_users",
                    true,
                ),
            ),
            regular_block(
                "Dineout Pay Transacted Users",
                50,
                55,
                [5, 6],
                segments(
                    "Dineout Pay Transacted Users",
                    "No. of Users who Transacted via Dineout Pay",
                    "do_pay_transacted_users",
                    false,
                ),
            ),
            regular_block(
                "Dineout Pay Transactions and GMV",
                57,
                68,
                [5, 6, 11, 12],
                pay_transactions(),
            ),
            ReportBlock {
                descriptor: ReportBlockDescriptor::new(
                    "Users with Active DP Subscription",
                    GridAddress::new(88, 2),
                    94,
                )
                .rates(dp_rates),
                source: MetricSource::Memberships {
                    total_label: "Total Users with Active DP Subscription".to_string(),
                },
            },
            regular_block(
                "DP Users who launched App",
                96,
                102,
                dp_rates,
                cohorts("DP Users who launched App", "Total DP Users Active on App", "users"),
            ),
            regular_block(
                "DP Users who redeemed",
                112,
                118,
                dp_rates,
                cohorts("DP Users who redeemed", "Total DP Users who redeemed", "dp_redeemed_users"),
            ),
            regular_block(
                "Total Redemptions by DP Users",
                128,
                134,
                dp_rates,
                cohorts("Total Redemptions by DP Users", "Total Redemptions", "redemptions"),
            ),
        ];
        Self::new(CatalogKind::Regular, blocks)
    }

    /// The five city blocks
    pub fn city() -> Self {
        let block = |key: &str, start_row: u32, end_row: u32, value_column: &str, filter: Filter| ReportBlock {
            descriptor: ReportBlockDescriptor::city(
                key,
                GridAddress::new(start_row, 1),
                end_row,
                RegionSpans::WITH_SUBTOTALS,
            ),
            source: MetricSource::City {
                value_column: value_column.to_string(),
                filter,
            },
        };
        let blocks = vec![
            block("Citywise Active Users (Overall)", 146, 171, "users", Filter::All),
            block("DP Users who launched App", 175, 200, "users", segment::dp_members()),
            block(
                "Logged In Users who launched App (Non DP members)",
                205,
                230,
                "users",
                segment::logged_in(),
            ),
            block(
                "Non Logged In Users who launched App",
                235,
                260,
                "users",
                segment::logged_out(),
            ),
            block(
                "Users who viewed RDP (Overall)",
                265,
                290,
                "restaurants_visited_users",
                Filter::All,
            ),
        ];
        Self::new(CatalogKind::City, blocks)
    }

    pub fn kind(&self) -> CatalogKind {
        self.kind
    }

    pub fn blocks(&self) -> &[ReportBlock] {
        &self.blocks
    }

    /// Block by key
    pub fn block(&self, key: &str) -> Option<&ReportBlock> {
        self.blocks.iter().find(|b| b.key() == key)
    }

    /// Whether any block reads `dataset`
    pub fn needs(&self, dataset: Dataset, period: Period) -> bool {
        self.blocks.iter().any(|b| b.dataset(period) == dataset)
    }
}

fn regular_block(
    key: &str,
    start_row: u32,
    end_row: u32,
    rates: impl Into<Vec<u32>>,
    breakdown: Breakdown,
) -> ReportBlock {
    ReportBlock {
        descriptor: ReportBlockDescriptor::new(key, GridAddress::new(start_row, 2), end_row)
            .rates(rates),
        source: MetricSource::Breakdown(breakdown),
    }
}

/// Headline, DP members, logged-in split by visitor type, and optionally
/// the logged-out split
fn segments(key: &str, headline: &str, column: &str, with_logged_out: bool) -> Breakdown {
    let mut breakdown = Breakdown::new(key)
        .sum(headline, column, Filter::All)
        .sum("DP members", column, segment::dp_members())
        .sum("Non DP (Logged in users)", column, segment::logged_in())
        .sum("New Users", column, segment::new_visitors(segment::logged_in()))
        .sum("Returning Users", column, segment::returning_visitors(segment::logged_in()));
    if with_logged_out {
        breakdown = breakdown
            .sum("Non Logged in users", column, segment::logged_out())
            .sum("New Users", column, segment::new_visitors(segment::logged_out()))
            .sum("Returning Users", column, segment::returning_visitors(segment::logged_out()));
    }
    breakdown
}

fn pay_transactions() -> Breakdown {
    let logged_in = segment::logged_in;
    let mut breakdown = Breakdown::new("Dineout Pay Transactions and GMV");
    for (i, (headline, column)) in [
        ("Total Dineout Pay Transactions", "do_pay_transactions"),
        ("Total Dineout Pay GMV", "do_pay_gmv"),
    ]
    .into_iter()
    .enumerate()
    {
        if i > 0 {
            breakdown = breakdown.spacer();
        }
        breakdown = breakdown
            .sum(headline, column, Filter::All)
            .sum("DP members", column, segment::dp_members())
            .sum("Non DP (Logged in users)", column, logged_in())
            .sum("New Users", column, segment::new_visitors(logged_in()))
            .sum("Returning Users", column, segment::returning_visitors(logged_in()));
    }
    breakdown
}

/// Headline over all members, then one row per cohort
fn cohorts(key: &str, headline: &str, column: &str) -> Breakdown {
    Cohort::ALL.iter().fold(
        Breakdown::new(key).sum(headline, column, segment::dp_members()),
        |b, cohort| b.sum(cohort.label(), column, segment::cohort(cohort.segment())),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_regular_blocks_fill_their_regions() {
        for block in ReportCatalog::regular().blocks() {
            let MetricSource::Breakdown(breakdown) = &block.source else {
                continue;
            };
            let region = block.descriptor.region();
            assert_eq!(
                breakdown.lines.len() as u32 + 1,
                region.row_count(),
                "{}",
                block.key()
            );
        }
    }

    #[test]
    fn test_city_blocks_span_fixed_layout() {
        let catalog = ReportCatalog::city();
        assert_eq!(catalog.blocks().len(), 5);
        for block in catalog.blocks() {
            assert_eq!(block.descriptor.region().row_count(), 26);
            assert!(block.descriptor.is_city());
        }
    }

    #[test]
    fn test_dataset_needs() {
        let regular = ReportCatalog::regular();
        assert!(regular.needs(Dataset::Memberships, Period::Week));
        assert!(!ReportCatalog::city().needs(Dataset::Memberships, Period::Week));
        assert_eq!(
            regular.block("Users with Active DP Subscription").map(|b| b.dataset(Period::Day)),
            Some(Dataset::Memberships)
        );
    }
}
