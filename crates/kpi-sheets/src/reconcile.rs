//! Merging a freshly computed bucket into a live sheet region
//!
//! The live region is the only durable state of a report: every column right
//! of the label column is one historical bucket. Reconciling reads that
//! region back, drops the column for the incoming bucket if it is already
//! there, left-joins the incoming values on the row key and returns the full
//! rectangle to write back at the block anchor.
//!
//! Row keys are `(region, label, occurrence)`. The occurrence index keeps
//! repeated labels apart, e.g. the two "New Users" rows that sit under
//! different parents in the same block.

use ahash::AHashMap;
use kpi_sheets_core::{
    CellValue, GridAddress, GridRange, MetricTable, ReportBlockDescriptor, Table, REGION_COLUMN,
};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::regional::GRAND_TOTAL;
use crate::sheet::RemoteSheet;

/// Where the incoming bucket ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// The region was empty; the incoming table is written as is
    Initialized,
    /// A new rightmost column was added
    Appended,
    /// An existing column with the same bucket label was overwritten
    Replaced {
        /// Absolute sheet column of the bucket
        column: u32,
    },
}

/// Result of reconciling one block
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    /// Full rectangle to write, header row included
    pub table: Table,
    /// Top-left cell to write it at
    pub anchor: GridAddress,
    /// How the incoming bucket was placed
    pub placement: Placement,
}

type RowKey = (String, String, usize);

/// The region merge algorithm
#[derive(Debug, Clone, Copy, Default)]
pub struct RegionReconciler;

impl RegionReconciler {
    /// Compute what `block` should contain once `incoming` is merged in.
    ///
    /// Nothing is written. An empty header row means the block was never
    /// written and yields the incoming table unchanged.
    pub fn reconcile<S: RemoteSheet + ?Sized>(
        sheet: &S,
        block: &ReportBlockDescriptor,
        incoming: &MetricTable,
    ) -> Result<Reconciled> {
        let start = block.start;
        let header = sheet.header_row(start.row)?;
        let initialized = header
            .iter()
            .skip(start.col as usize - 1)
            .any(|v| !v.is_empty());

        if !initialized {
            debug!(block = %block.key, anchor = %start, "Region is empty, initializing");
            let table = incoming.to_table();
            check_fits(sheet, block, &table, &incoming.bucket_label)?;
            return Ok(Reconciled {
                table,
                anchor: start,
                placement: Placement::Initialized,
            });
        }

        let width = header.len() as u32;
        let mut last_col = width;
        let mut placement = Placement::Appended;
        if header.last().map(CellValue::as_key).as_deref() == Some(incoming.bucket_label.as_str()) {
            placement = Placement::Replaced { column: width };
            last_col -= 1;
        }
        if last_col < start.col {
            return Err(Error::shape(format!(
                "block '{}' on '{}' has no label column left of bucket '{}'",
                block.key,
                sheet.title(),
                incoming.bucket_label
            )));
        }

        let range = GridRange::from_indices(start.row, start.col, block.end_row, last_col);
        debug!(block = %block.key, range = %range, "Reading live region");
        let live = sheet.read_region(&range)?;

        let key_idx = live.column_index(&incoming.key).ok_or_else(|| {
            Error::shape(format!(
                "block at {} on '{}' has no '{}' column",
                start,
                sheet.title(),
                incoming.key
            ))
        })?;
        let region_idx = if incoming.has_region {
            Some(live.column_index(REGION_COLUMN).ok_or_else(|| {
                Error::shape(format!(
                    "city block '{}' on '{}' has no '{}' column",
                    incoming.key,
                    sheet.title(),
                    REGION_COLUMN
                ))
            })?)
        } else {
            None
        };

        let mut columns = live.columns().to_vec();
        let mut rows = live.rows().to_vec();
        while rows
            .last()
            .map_or(false, |r| r.iter().all(CellValue::is_empty))
        {
            rows.pop();
        }
        if let Some(region_idx) = region_idx {
            forward_fill_regions(&mut rows, region_idx, key_idx);
        }

        // An earlier column already carrying this bucket is reused in place
        let existing = match placement {
            Placement::Appended => columns
                .iter()
                .enumerate()
                .skip(key_idx + 1)
                .find(|(_, c)| **c == incoming.bucket_label)
                .map(|(idx, _)| idx),
            _ => None,
        };
        let value_idx = match existing {
            Some(idx) => {
                placement = Placement::Replaced {
                    column: start.col + idx as u32,
                };
                for row in &mut rows {
                    row[idx] = CellValue::Empty;
                }
                idx
            }
            None => {
                columns.push(incoming.bucket_label.clone());
                for row in &mut rows {
                    row.push(CellValue::Empty);
                }
                columns.len() - 1
            }
        };

        let incoming_keys = row_keys(incoming.rows.iter().map(|r| {
            let region = if incoming.has_region {
                r.region.clone().unwrap_or_default()
            } else {
                String::new()
            };
            (region, r.label.clone())
        }));
        let mut pending: AHashMap<&RowKey, usize> = incoming_keys
            .iter()
            .enumerate()
            .map(|(idx, key)| (key, idx))
            .collect();

        let live_keys = row_keys(rows.iter().map(|r| {
            let region = region_idx.map(|i| r[i].as_key()).unwrap_or_default();
            (region, r[key_idx].as_key())
        }));
        for (row, key) in rows.iter_mut().zip(&live_keys) {
            if let Some(idx) = pending.remove(key) {
                row[value_idx] = CellValue::from(incoming.rows[idx].value);
            }
        }

        let mut unmatched: Vec<usize> = pending.into_iter().map(|(_, idx)| idx).collect();
        unmatched.sort_unstable();
        for idx in unmatched {
            let source = &incoming.rows[idx];
            let mut row = vec![CellValue::Empty; columns.len()];
            if let Some(region_idx) = region_idx {
                row[region_idx] = CellValue::text(source.region.clone().unwrap_or_default());
            }
            row[key_idx] = CellValue::text(source.label.as_str());
            row[value_idx] = CellValue::from(source.value);
            rows.push(row);
        }

        let table = Table::from_rows(columns, rows)?;
        check_fits(sheet, block, &table, &incoming.bucket_label)?;
        Ok(Reconciled {
            table,
            anchor: start,
            placement,
        })
    }

    /// Reconcile `block` and write the result back to the sheet
    pub fn update<S: RemoteSheet + ?Sized>(
        sheet: &mut S,
        block: &ReportBlockDescriptor,
        incoming: &MetricTable,
    ) -> Result<Reconciled> {
        let reconciled = Self::reconcile(&*sheet, block, incoming)?;
        let written = sheet.write_table(&reconciled.table, reconciled.anchor)?;
        info!(
            sheet = sheet.title(),
            block = %block.key,
            bucket = %incoming.bucket_label,
            range = %written,
            placement = ?reconciled.placement,
            "Updated block"
        );
        Ok(reconciled)
    }
}

/// Rows below `end_row` are never read back, so writing there would lose history
fn check_fits<S: RemoteSheet + ?Sized>(
    sheet: &S,
    block: &ReportBlockDescriptor,
    table: &Table,
    bucket: &str,
) -> Result<()> {
    let last_row = block.start.row + table.row_count() as u32;
    if last_row > block.end_row {
        return Err(Error::shape(format!(
            "block '{}' on '{}' needs rows {}..={} for bucket '{}' but ends at row {}",
            block.key,
            sheet.title(),
            block.start.row,
            last_row,
            bucket,
            block.end_row
        )));
    }
    Ok(())
}

/// Number every `(region, label)` pair by how often it was seen before
fn row_keys(pairs: impl Iterator<Item = (String, String)>) -> Vec<RowKey> {
    let mut seen: AHashMap<(String, String), usize> = AHashMap::new();
    pairs
        .map(|pair| {
            let count = seen.entry(pair.clone()).or_insert(0);
            let key = (pair.0, pair.1, *count);
            *count += 1;
            key
        })
        .collect()
}

/// Merged region cells only hold a value in their first row
fn forward_fill_regions(rows: &mut [Vec<CellValue>], region_idx: usize, key_idx: usize) {
    let mut current = CellValue::Empty;
    for row in rows.iter_mut() {
        if row[key_idx].as_key() == GRAND_TOTAL {
            row[region_idx] = CellValue::Empty;
        } else if row[region_idx].is_empty() {
            row[region_idx] = current.clone();
        } else {
            current = row[region_idx].clone();
        }
    }
}
