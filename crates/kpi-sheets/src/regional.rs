//! City grouping under a fixed taxonomy
//!
//! Every city block has the same 25 data rows whatever the data contains:
//! the configured cities of each macro-region followed by that region's
//! subtotal, then `Others` (every unlisted city) and the `Grand Total`.

use std::fmt;

use ahash::AHashMap;
use kpi_sheets_core::{MetricRow, MetricTable, Table};
use once_cell::sync::Lazy;
use tracing::debug;

use crate::error::{Error, Result};

/// Label and region of the row holding every unlisted city
pub const OTHERS: &str = "Others";

/// Label of the last row of a city block
pub const GRAND_TOTAL: &str = "Grand Total";

/// A macro-region, in output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MacroRegion {
    North,
    South,
    West,
}

impl MacroRegion {
    /// All macro-regions in output order
    pub const ALL: [MacroRegion; 3] = [MacroRegion::North, MacroRegion::South, MacroRegion::West];

    /// Region name as written to the sheet
    pub fn as_str(&self) -> &'static str {
        match self {
            MacroRegion::North => "North",
            MacroRegion::South => "South",
            MacroRegion::West => "West",
        }
    }

    /// Label of the region's subtotal row
    pub fn total_label(&self) -> String {
        format!("{} Total", self.as_str())
    }
}

impl fmt::Display for MacroRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static STANDARD: Lazy<CityTaxonomy> = Lazy::new(|| {
    use MacroRegion::*;
    CityTaxonomy::new([
        ("Agra", North),
        ("Chandigarh", North),
        ("Delhi", North),
        ("Jaipur", North),
        ("Lucknow", North),
        ("Ludhiana", North),
        ("Udaipur", North),
        ("Bangalore", South),
        ("Chennai", South),
        ("Hyderabad", South),
        ("Indore", South),
        ("Kochi", South),
        ("Kolkata", South),
        ("Ahmedabad", West),
        ("Goa", West),
        ("Mumbai", West),
        ("Nagpur", West),
        ("Pune", West),
        ("Surat", West),
        ("Vadodara", West),
    ])
});

/// Ordered `city -> macro-region` mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityTaxonomy {
    cities: Vec<(String, MacroRegion)>,
}

impl CityTaxonomy {
    /// Build a taxonomy; output order within a region follows input order
    pub fn new<I, S>(cities: I) -> Self
    where
        I: IntoIterator<Item = (S, MacroRegion)>,
        S: Into<String>,
    {
        Self {
            cities: cities.into_iter().map(|(c, r)| (c.into(), r)).collect(),
        }
    }

    /// The 20 cities every city report is laid out for
    pub fn standard() -> Self {
        STANDARD.clone()
    }

    /// Region of a listed city
    pub fn region_of(&self, city: &str) -> Option<MacroRegion> {
        self.cities
            .iter()
            .find(|(c, _)| c == city)
            .map(|(_, r)| *r)
    }

    /// The city itself when listed, [`OTHERS`] otherwise
    pub fn fold<'a>(&'a self, city: &'a str) -> &'a str {
        if self.region_of(city).is_some() {
            city
        } else {
            OTHERS
        }
    }

    /// Listed cities of one region, in order
    pub fn cities_in(&self, region: MacroRegion) -> impl Iterator<Item = &str> {
        self.cities
            .iter()
            .filter(move |(_, r)| *r == region)
            .map(|(c, _)| c.as_str())
    }

    /// Number of listed cities
    pub fn len(&self) -> usize {
        self.cities.len()
    }

    /// Check whether no city is listed
    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }
}

impl Default for CityTaxonomy {
    fn default() -> Self {
        Self::standard()
    }
}

/// Groups raw rows by city into a city report table
#[derive(Debug, Clone, Copy)]
pub struct RegionalAggregator<'a> {
    taxonomy: &'a CityTaxonomy,
}

impl<'a> RegionalAggregator<'a> {
    pub fn new(taxonomy: &'a CityTaxonomy) -> Self {
        Self { taxonomy }
    }

    /// Sum `value_column` per folded city and lay the result out in the
    /// fixed city block order.
    ///
    /// Empty values count as zero; any other non-numeric value fails.
    pub fn aggregate(
        &self,
        data: &Table,
        value_column: &str,
        city_column: &str,
        key: &str,
        bucket_label: &str,
    ) -> Result<MetricTable> {
        let column = |name: &str| {
            data.column_index(name)
                .ok_or_else(|| Error::upstream(key, format!("missing column '{}'", name)))
        };
        let value_idx = column(value_column)?;
        let city_idx = column(city_column)?;

        let mut sums: AHashMap<String, f64> = AHashMap::new();
        for (row_no, row) in data.rows().iter().enumerate() {
            let value = &row[value_idx];
            let amount = if value.is_empty() {
                0.0
            } else {
                value.as_number().ok_or_else(|| {
                    Error::upstream(
                        value_column,
                        format!("row {}: '{}' is not a number", row_no + 1, value),
                    )
                })?
            };
            let city = row[city_idx].as_key();
            *sums
                .entry(self.taxonomy.fold(&city).to_string())
                .or_insert(0.0) += amount;
        }
        debug!(key, value_column, groups = sums.len(), "Grouped rows by city");

        let mut table = MetricTable::regional(key, bucket_label);
        let mut grand_total = 0.0;
        for region in MacroRegion::ALL {
            let mut subtotal = 0.0;
            for city in self.taxonomy.cities_in(region) {
                let value = sums.get(city).copied().unwrap_or(0.0);
                subtotal += value;
                table.push(MetricRow::regional(region.as_str(), city, value));
            }
            table.push(MetricRow::regional(region.as_str(), region.total_label(), subtotal));
            grand_total += subtotal;
        }

        let others = sums.get(OTHERS).copied().unwrap_or(0.0);
        table.push(MetricRow::regional(OTHERS, OTHERS, others));
        grand_total += others;

        table.push(MetricRow {
            region: None,
            label: GRAND_TOTAL.to_string(),
            value: Some(grand_total),
        });
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kpi_sheets_core::CellValue;
    use pretty_assertions::assert_eq;

    fn raw(rows: &[(&str, f64)]) -> Table {
        Table::from_rows(
            ["custom_dimension_city", "users"],
            rows.iter()
                .map(|(c, v)| vec![CellValue::text(*c), CellValue::Number(*v)])
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_fold_unlisted_city() {
        let taxonomy = CityTaxonomy::standard();
        assert_eq!(taxonomy.fold("Nashik"), OTHERS);
        assert_eq!(taxonomy.fold("Mumbai"), "Mumbai");
        assert_eq!(taxonomy.region_of("Mumbai"), Some(MacroRegion::West));
        assert_eq!(taxonomy.len(), 20);
    }

    #[test]
    fn test_fixed_layout_is_zero_filled() {
        let taxonomy = CityTaxonomy::standard();
        let table = RegionalAggregator::new(&taxonomy)
            .aggregate(&raw(&[]), "users", "custom_dimension_city", "Citywise", "Mar'24")
            .unwrap();

        assert_eq!(table.rows.len(), 25);
        assert_eq!(table.rows[7].label, "North Total");
        assert_eq!(table.rows[14].label, "South Total");
        assert_eq!(table.rows[22].label, "West Total");
        assert_eq!(table.rows[23].label, OTHERS);
        assert_eq!(table.rows[24].label, GRAND_TOTAL);
        assert!(table.rows.iter().all(|r| r.value == Some(0.0)));
    }

    #[test]
    fn test_subtotal_arithmetic() {
        let taxonomy = CityTaxonomy::standard();
        let data = raw(&[("Mumbai", 10.0), ("Pune", 20.0), ("Goa", 5.0)]);
        let table = RegionalAggregator::new(&taxonomy)
            .aggregate(&data, "users", "custom_dimension_city", "Citywise", "Mar'24")
            .unwrap();

        let west = table.row("West Total").unwrap();
        assert_eq!(west.value, Some(35.0));
        assert_eq!(west.region.as_deref(), Some("West"));
    }

    #[test]
    fn test_grand_total_excludes_subtotals() {
        let taxonomy = CityTaxonomy::standard();
        let data = raw(&[
            ("Delhi", 3.0),
            ("Delhi", 4.0),
            ("Chennai", 2.0),
            ("Mumbai", 1.0),
            ("Nashik", 6.0),
        ]);
        let table = RegionalAggregator::new(&taxonomy)
            .aggregate(&data, "users", "custom_dimension_city", "Citywise", "Mar'24")
            .unwrap();

        assert_eq!(table.value_of("Delhi"), Some(7.0));
        assert_eq!(table.value_of(OTHERS), Some(6.0));
        let grand = table.row(GRAND_TOTAL).unwrap();
        assert_eq!(grand.value, Some(16.0));
        assert_eq!(grand.region, None);
    }

    #[test]
    fn test_non_numeric_value_fails() {
        let taxonomy = CityTaxonomy::standard();
        let data = Table::from_rows(
            ["custom_dimension_city", "users"],
            vec![vec![CellValue::text("Pune"), CellValue::text("n/a")]],
        )
        .unwrap();
        let err = RegionalAggregator::new(&taxonomy)
            .aggregate(&data, "users", "custom_dimension_city", "Citywise", "Mar'24")
            .unwrap_err();
        assert!(matches!(err, Error::UpstreamQuery { .. }));
    }
}
