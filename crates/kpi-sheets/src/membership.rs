//! Membership cohort classification
//!
//! A diner can hold several memberships over time. Each diner is put in
//! exactly one cohort by looking at all memberships active in the window.

use std::fmt;

use ahash::AHashMap;
use kpi_sheets_core::{CellValue, MetricRow, MetricTable, Table};

use crate::error::{Error, Result};
use crate::period::parse_date;

const MIGRATION_PLANS: [&str; 3] = ["dopass_migration", "doplus_migration", "gp_migration"];
const NULL_MARKERS: [&str; 3] = ["null", "NA", "nan"];

/// Membership cohort of a diner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Cohort {
    Paid,
    Prime,
    Hdfc,
    Migration,
    Others,
}

impl Cohort {
    /// All cohorts in report order
    pub const ALL: [Cohort; 5] = [
        Cohort::Paid,
        Cohort::Prime,
        Cohort::Hdfc,
        Cohort::Migration,
        Cohort::Others,
    ];

    /// Row label in report blocks
    pub fn label(&self) -> &'static str {
        match self {
            Cohort::Paid => "Paid",
            Cohort::Prime => "Prime",
            Cohort::Hdfc => "HDFC",
            Cohort::Migration => "Migration",
            Cohort::Others => "Others/Unpaid",
        }
    }

    /// Value of the `subscription_type` column in the MAU dataset
    pub fn segment(&self) -> &'static str {
        match self {
            Cohort::Paid => "paid",
            Cohort::Prime => "prime",
            Cohort::Hdfc => "hdfc",
            Cohort::Migration => "migration",
            Cohort::Others => "others",
        }
    }

    /// Cohort from a diner's plan types, before the card check.
    ///
    /// A paid plan wins over prime, prime over any migration plan.
    pub fn from_plans<'a>(plans: impl IntoIterator<Item = &'a str> + Clone) -> Cohort {
        let has = |wanted: &str| plans.clone().into_iter().any(|p| p == wanted);
        if has("Paid") {
            Cohort::Paid
        } else if has("prime") {
            Cohort::Prime
        } else if MIGRATION_PLANS.iter().any(|m| has(*m)) {
            Cohort::Migration
        } else {
            Cohort::Others
        }
    }
}

impl fmt::Display for Cohort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Default)]
struct DinerMemberships {
    /// (end date, plan, card) per membership
    entries: Vec<(Option<chrono::NaiveDate>, String, Option<String>)>,
}

impl DinerMemberships {
    fn cohort(&mut self) -> Cohort {
        // Newest membership first, so ties in the card count go to it
        self.entries.sort_by(|a, b| b.0.cmp(&a.0));
        let cohort = Cohort::from_plans(self.entries.iter().map(|(_, plan, _)| plan.as_str()));
        if cohort != Cohort::Others {
            return cohort;
        }
        match self.most_common_card() {
            Some(card) if card.to_lowercase().contains("hdfc") => Cohort::Hdfc,
            _ => Cohort::Others,
        }
    }

    fn most_common_card(&self) -> Option<&str> {
        let mut counts: Vec<(&str, usize)> = Vec::new();
        for card in self.entries.iter().filter_map(|(_, _, c)| c.as_deref()) {
            match counts.iter_mut().find(|(c, _)| *c == card) {
                Some((_, n)) => *n += 1,
                None => counts.push((card, 1)),
            }
        }
        let best = counts.iter().map(|(_, n)| *n).max()?;
        counts.into_iter().find(|(_, n)| *n == best).map(|(c, _)| c)
    }
}

/// Classifies membership records into per-diner cohorts
#[derive(Debug, Clone, Copy, Default)]
pub struct MembershipClassifier;

impl MembershipClassifier {
    /// Cohort of every diner in `data`.
    ///
    /// Needs `diner_id`, `subscription_type`, `end_date` and `card_name`
    /// columns. Null-like card names are ignored.
    pub fn classify(data: &Table) -> Result<AHashMap<String, Cohort>> {
        let column = |name: &str| {
            data.column_index(name).ok_or_else(|| {
                Error::upstream("memberships", format!("missing column '{}'", name))
            })
        };
        let diner_idx = column("diner_id")?;
        let plan_idx = column("subscription_type")?;
        let end_idx = column("end_date")?;
        let card_idx = column("card_name")?;

        let mut diners: AHashMap<String, DinerMemberships> = AHashMap::new();
        for row in data.rows() {
            if row[diner_idx].is_empty() {
                continue;
            }
            let card = match &row[card_idx] {
                CellValue::Text(s) if !s.is_empty() && !NULL_MARKERS.contains(&s.as_str()) => {
                    Some(s.clone())
                }
                _ => None,
            };
            diners
                .entry(row[diner_idx].as_key())
                .or_default()
                .entries
                .push((parse_date(&row[end_idx]), row[plan_idx].as_key(), card));
        }

        Ok(diners
            .into_iter()
            .map(|(diner, mut memberships)| {
                let cohort = memberships.cohort();
                (diner, cohort)
            })
            .collect())
    }

    /// Distinct diners per cohort, headed by the total
    pub fn count(data: &Table, key: &str, total_label: &str, bucket_label: &str) -> Result<MetricTable> {
        let cohorts = Self::classify(data)?;
        let mut table = MetricTable::new(key, bucket_label)
            .with_row(MetricRow::new(total_label, cohorts.len() as f64));
        for cohort in Cohort::ALL {
            let n = cohorts.values().filter(|c| **c == cohort).count();
            table.push(MetricRow::new(cohort.label(), n as f64));
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn memberships(rows: &[(i32, &str, &str, &str)]) -> Table {
        Table::from_rows(
            ["diner_id", "subscription_type", "end_date", "card_name"],
            rows.iter()
                .map(|(id, plan, end, card)| {
                    vec![
                        CellValue::from(*id),
                        CellValue::text(*plan),
                        CellValue::text(*end),
                        CellValue::text(*card),
                    ]
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_plan_precedence() {
        assert_eq!(Cohort::from_plans(["prime", "Paid"]), Cohort::Paid);
        assert_eq!(Cohort::from_plans(["gp_migration", "prime"]), Cohort::Prime);
        assert_eq!(Cohort::from_plans(["doplus_migration"]), Cohort::Migration);
        assert_eq!(Cohort::from_plans(["trial"]), Cohort::Others);
    }

    #[test]
    fn test_hdfc_by_most_common_card() {
        let data = memberships(&[
            (1, "trial", "2024-03-01", "HDFC Regalia"),
            (1, "trial", "2024-02-01", "HDFC Regalia"),
            (1, "trial", "2024-01-01", "Amex"),
            (2, "trial", "2024-03-01", "Amex"),
            (3, "prime", "2024-03-01", "HDFC Millennia"),
            (4, "trial", "2024-03-01", "null"),
        ]);
        let cohorts = MembershipClassifier::classify(&data).unwrap();
        assert_eq!(cohorts["1"], Cohort::Hdfc);
        assert_eq!(cohorts["2"], Cohort::Others);
        assert_eq!(cohorts["3"], Cohort::Prime);
        assert_eq!(cohorts["4"], Cohort::Others);
    }

    #[test]
    fn test_counts_distinct_diners() {
        let data = memberships(&[
            (1, "Paid", "2024-03-01", ""),
            (1, "prime", "2024-02-01", ""),
            (2, "prime", "2024-03-01", ""),
            (3, "gp_migration", "2024-03-01", ""),
        ]);
        let table = MembershipClassifier::count(
            &data,
            "Users with Active DP Subscription",
            "Total Users with Active DP Subscription",
            "Mar'24",
        )
        .unwrap();

        let values: Vec<(String, Option<f64>)> =
            table.rows.iter().map(|r| (r.label.clone(), r.value)).collect();
        assert_eq!(
            values,
            vec![
                ("Total Users with Active DP Subscription".to_string(), Some(3.0)),
                ("Paid".to_string(), Some(1.0)),
                ("Prime".to_string(), Some(1.0)),
                ("HDFC".to_string(), Some(0.0)),
                ("Migration".to_string(), Some(1.0)),
                ("Others/Unpaid".to_string(), Some(0.0)),
            ]
        );
    }
}
