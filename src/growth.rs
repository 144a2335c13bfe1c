//! # Growth Engine
//!
//! Yearly totals per category and per manufacturer with year-over-year
//! change, and quarterly figures per category with quarter-over-quarter
//! change. The exports carry one figure per year, so quarters are
//! synthesized from the yearly total with [`SEASONAL_WEIGHTS`] and marked
//! [`Basis::Estimated`].

use crate::model::FactRecord;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Share of a quarter in `year_total / 4`, for quarters 1 to 4.
pub const SEASONAL_WEIGHTS: [f64; 4] = [0.9, 1.1, 1.0, 1.0];

#[derive(Error, Debug)]
pub enum GrowthError {
    /// A fact row lacks a required field or holds one of the wrong type.
    #[error("Invalid fact table input at row {row}, column '{column}'")]
    GrowthInputInvalid { row: usize, column: String },
}

/// Time bucket of a growth row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Period {
    Year(i32),
    Quarter { year: i32, quarter: u8 },
}

impl Period {
    pub fn year(&self) -> i32 {
        match self {
            Period::Year(year) | Period::Quarter { year, .. } => *year,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Year(year) => write!(f, "{year}"),
            Period::Quarter { year, quarter } => write!(f, "{year}-Q{quarter}"),
        }
    }
}

/// Whether a figure was aggregated from the data or synthesized.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Basis {
    Measured,
    Estimated,
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Basis::Measured => f.write_str("measured"),
            Basis::Estimated => f.write_str("estimated"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GrowthRow {
    pub period: Period,
    /// Category or manufacturer
    pub group: String,
    pub total: f64,
    /// Total of the previous period present for the same group
    pub prior_total: Option<f64>,
    pub percent_change: Option<f64>,
    pub basis: Basis,
}

/// The three growth tables, each ordered by group and then period.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GrowthReport {
    pub yearly_by_category: Vec<GrowthRow>,
    pub quarterly_by_category: Vec<GrowthRow>,
    pub yearly_by_manufacturer: Vec<GrowthRow>,
}

/// `(curr - prev) / prev * 100`; there is no change relative to zero.
pub fn percent_change(prev: f64, curr: f64) -> Option<f64> {
    if prev == 0.0 {
        None
    } else {
        Some((curr - prev) / prev * 100.0)
    }
}

/// Computes all three growth tables. An empty table gives empty tables.
pub fn compute_growth(table: &[FactRecord]) -> GrowthReport {
    let by_category = yearly_totals(table, |record| &record.vehicle_category);
    let by_manufacturer = yearly_totals(table, |record| &record.manufacturer);
    GrowthReport {
        quarterly_by_category: with_changes(synthesize_quarters(&by_category), Basis::Estimated),
        yearly_by_category: with_changes(by_category, Basis::Measured),
        yearly_by_manufacturer: with_changes(by_manufacturer, Basis::Measured),
    }
}

/// Sum of registrations per `(group, year)`.
fn yearly_totals<F>(table: &[FactRecord], group: F) -> BTreeMap<(String, Period), f64>
where
    F: Fn(&FactRecord) -> &String,
{
    let mut totals = BTreeMap::<(String, Period), f64>::new();
    for record in table {
        *totals
            .entry((group(record).to_owned(), Period::Year(record.year())))
            .or_default() += record.registrations_count as f64;
    }
    totals
}

/// Spreads each yearly total over four weighted quarters.
fn synthesize_quarters(yearly: &BTreeMap<(String, Period), f64>) -> BTreeMap<(String, Period), f64> {
    let mut quarters = BTreeMap::new();
    for ((group, period), total) in yearly {
        let base = total / 4.0;
        for (quarter, weight) in (1u8..).zip(SEASONAL_WEIGHTS) {
            let period = Period::Quarter { year: period.year(), quarter };
            quarters.insert((group.to_owned(), period), base * weight);
        }
    }
    quarters
}

/// Rows in key order; within a group each period is compared with the
/// previous period present, whether or not the two are adjacent in time.
fn with_changes(totals: BTreeMap<(String, Period), f64>, basis: Basis) -> Vec<GrowthRow> {
    let mut rows = Vec::<GrowthRow>::with_capacity(totals.len());
    for ((group, period), total) in totals {
        let prior_total = rows
            .last()
            .filter(|previous| previous.group == group)
            .map(|previous| previous.total);
        rows.push(GrowthRow {
            period,
            group,
            total,
            prior_total,
            percent_change: prior_total.and_then(|prior| percent_change(prior, total)),
            basis,
        });
    }
    rows
}
