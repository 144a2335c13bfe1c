use crate::model::FactRecord;
use std::collections::BTreeMap;
use std::collections::BTreeSet;

/// Default number of manufacturers preselected by the dashboard.
pub const DEFAULT_TOP_MANUFACTURERS: usize = 15;

/// Narrows a fact table. Each unset dimension accepts everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FactFilter {
    pub years: Option<BTreeSet<i32>>,
    pub categories: Option<BTreeSet<String>>,
    pub manufacturers: Option<BTreeSet<String>>,
}

impl FactFilter {
    pub fn with_years<I: IntoIterator<Item = i32>>(mut self, years: I) -> Self {
        self.years = Some(years.into_iter().collect());
        self
    }

    pub fn with_categories<I: IntoIterator<Item = S>, S: Into<String>>(mut self, categories: I) -> Self {
        self.categories = Some(categories.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_manufacturers<I: IntoIterator<Item = S>, S: Into<String>>(mut self, manufacturers: I) -> Self {
        self.manufacturers = Some(manufacturers.into_iter().map(Into::into).collect());
        self
    }

    pub fn accept(&self, record: &FactRecord) -> bool {
        self.years.as_ref().map_or(true, |years| years.contains(&record.year()))
            && self
                .categories
                .as_ref()
                .map_or(true, |categories| categories.contains(&record.vehicle_category))
            && self
                .manufacturers
                .as_ref()
                .map_or(true, |manufacturers| manufacturers.contains(&record.manufacturer))
    }

    pub fn apply(&self, table: &[FactRecord]) -> Vec<FactRecord> {
        table.iter().filter(|record| self.accept(record)).cloned().collect()
    }
}

/// Years present in the table, ascending.
pub fn available_years(table: &[FactRecord]) -> Vec<i32> {
    table.iter().map(FactRecord::year).collect::<BTreeSet<_>>().into_iter().collect()
}

/// Categories present in the table, sorted.
pub fn available_categories(table: &[FactRecord]) -> Vec<String> {
    table
        .iter()
        .map(|record| record.vehicle_category.to_owned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Summed registrations per manufacturer.
pub(crate) fn manufacturer_totals(table: &[FactRecord]) -> BTreeMap<&str, i64> {
    let mut totals = BTreeMap::<&str, i64>::new();
    for record in table {
        *totals.entry(record.manufacturer.as_str()).or_default() += record.registrations_count;
    }
    totals
}

/// The `n` manufacturers with the most registrations, largest first; equal
/// totals are ordered by name.
pub fn top_manufacturers(table: &[FactRecord], n: usize) -> Vec<(String, i64)> {
    let mut ranked = manufacturer_totals(table)
        .into_iter()
        .map(|(name, total)| (name.to_owned(), total))
        .collect::<Vec<_>>();
    ranked.sort_by(|(left_name, left), (right_name, right)| right.cmp(left).then_with(|| left_name.cmp(right_name)));
    ranked.truncate(n);
    ranked
}
