//! The report driver
//!
//! For every bucket date the pipeline fetches the datasets the catalog needs,
//! computes each block and reconciles it into the sheet. Formatting is only
//! applied after the last bucket of a run, since every bucket re-writes the
//! same regions.

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::catalog::ReportCatalog;
use crate::error::Result;
use crate::format::TableFormatter;
use crate::metrics::BucketInputs;
use crate::period::{BucketWindow, Period};
use crate::reconcile::{Placement, RegionReconciler};
use crate::regional::CityTaxonomy;
use crate::sheet::RemoteSheet;
use crate::source::{DataSource, Dataset};

/// Outcome of one bucket
#[derive(Debug, Clone, PartialEq)]
pub struct BucketSummary {
    /// Bucket end date
    pub date: NaiveDate,
    pub window: BucketWindow,
    /// Header the bucket's column was written under
    pub bucket_label: String,
    /// Placement per block key, in catalog order
    pub blocks: Vec<(String, Placement)>,
    /// Whether the blocks were formatted after writing
    pub formatted: bool,
}

/// Outcome of a run over a date range
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub buckets: Vec<BucketSummary>,
}

impl RunSummary {
    /// Number of block updates written
    pub fn block_updates(&self) -> usize {
        self.buckets.iter().map(|b| b.blocks.len()).sum()
    }
}

/// Computes report catalogs from a data source and writes them to a sheet
#[derive(Debug)]
pub struct Pipeline<D> {
    source: D,
    taxonomy: CityTaxonomy,
    formatter: TableFormatter,
}

impl<D: DataSource> Pipeline<D> {
    /// A pipeline with the standard city taxonomy and palette
    pub fn new(source: D) -> Self {
        Self {
            source,
            taxonomy: CityTaxonomy::standard(),
            formatter: TableFormatter::default(),
        }
    }

    /// Use a different city taxonomy
    pub fn with_taxonomy(mut self, taxonomy: CityTaxonomy) -> Self {
        self.taxonomy = taxonomy;
        self
    }

    /// Use a different formatter
    pub fn with_formatter(mut self, formatter: TableFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn source(&self) -> &D {
        &self.source
    }

    pub fn into_source(self) -> D {
        self.source
    }

    /// Run `catalog` for every date, formatting after the last one.
    ///
    /// The first failure aborts the remaining buckets; buckets already
    /// written stay written.
    pub fn run<S: RemoteSheet + ?Sized>(
        &mut self,
        sheet: &mut S,
        catalog: &ReportCatalog,
        period: Period,
        dates: &[NaiveDate],
    ) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        if dates.is_empty() {
            warn!(%period, "No bucket dates to run");
            return Ok(summary);
        }

        for (i, date) in dates.iter().enumerate() {
            let last = i + 1 == dates.len();
            summary
                .buckets
                .push(self.run_bucket(sheet, catalog, period, *date, last)?);
        }
        info!(
            sheet = sheet.title(),
            buckets = summary.buckets.len(),
            updates = summary.block_updates(),
            "Run complete"
        );
        Ok(summary)
    }

    /// Compute and write every block of `catalog` for the bucket ending on `date`
    pub fn run_bucket<S: RemoteSheet + ?Sized>(
        &mut self,
        sheet: &mut S,
        catalog: &ReportCatalog,
        period: Period,
        date: NaiveDate,
        format: bool,
    ) -> Result<BucketSummary> {
        let window = period.window(date);
        info!(%period, %window, "Running bucket");

        let inputs = self.fetch_inputs(catalog, period, window)?;
        let bucket_label = match &inputs.mau {
            Some(mau) => period.bucket_label(mau, period.mau_dataset())?,
            None => None,
        }
        .unwrap_or_else(|| {
            let label = period.window_label(window);
            warn!(%window, label = %label, "No MAU rows for bucket, labelling from window");
            label
        });

        let mut blocks = Vec::with_capacity(catalog.blocks().len());
        for block in catalog.blocks() {
            let table = block.compute(&inputs, period, &self.taxonomy, &bucket_label)?;
            let reconciled = RegionReconciler::update(sheet, &block.descriptor, &table)?;
            blocks.push((block.key().to_string(), reconciled.placement));
        }

        if format {
            for block in catalog.blocks() {
                self.formatter.format(sheet, &block.descriptor)?;
            }
        }

        Ok(BucketSummary {
            date,
            window,
            bucket_label,
            blocks,
            formatted: format,
        })
    }

    fn fetch_inputs(
        &mut self,
        catalog: &ReportCatalog,
        period: Period,
        window: BucketWindow,
    ) -> Result<BucketInputs> {
        let mut inputs = BucketInputs::default();
        let mau = Dataset::Mau(period);
        if catalog.needs(mau, period) {
            inputs.mau = Some(self.source.fetch(mau, window)?);
        }
        if catalog.needs(Dataset::Memberships, period) {
            inputs.memberships = Some(self.source.fetch(Dataset::Memberships, window)?);
        }
        Ok(inputs)
    }
}

/// Clear the values of every block of `catalog`, up to each block's live width.
///
/// Returns the number of blocks cleared; blocks with an empty header row are
/// skipped.
pub fn clear<S: RemoteSheet + ?Sized>(sheet: &mut S, catalog: &ReportCatalog) -> Result<usize> {
    let mut cleared = 0;
    for block in catalog.blocks() {
        let descriptor = &block.descriptor;
        let width = sheet.last_column(descriptor.start.row)?;
        if width < descriptor.start.col {
            continue;
        }
        let range = descriptor.region().to_range(width);
        sheet.clear_region(&range)?;
        info!(sheet = sheet.title(), block = %descriptor.key, range = %range, "Cleared block");
        cleared += 1;
    }
    Ok(cleared)
}
