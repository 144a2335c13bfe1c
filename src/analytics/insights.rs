use crate::analytics::filter::manufacturer_totals;
use crate::growth::percent_change;
use crate::model::FactRecord;
use std::collections::BTreeMap;
use std::collections::BTreeSet;

/// Headline figures of a (filtered) fact table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Kpis {
    pub total_registrations: i64,
    /// Distinct `manufacturer` labels
    pub vehicle_types: usize,
    pub categories: usize,
    /// `None` for an empty table
    pub average_per_record: Option<f64>,
}

impl Kpis {
    pub fn compute(table: &[FactRecord]) -> Self {
        let total_registrations = table.iter().map(|record| record.registrations_count).sum::<i64>();
        Kpis {
            total_registrations,
            vehicle_types: table.iter().map(|record| &record.manufacturer).collect::<BTreeSet<_>>().len(),
            categories: table.iter().map(|record| &record.vehicle_category).collect::<BTreeSet<_>>().len(),
            average_per_record: (!table.is_empty()).then(|| total_registrations as f64 / table.len() as f64),
        }
    }
}

/// A label together with its registrations and its percentage of the total.
#[derive(Clone, Debug, PartialEq)]
pub struct Share {
    pub label: String,
    pub registrations: i64,
    pub percent: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MarketInsights {
    /// Manufacturer with the most registrations
    pub market_leader: Option<Share>,
    /// Category with the most registrations
    pub segment_leader: Option<Share>,
    /// Percentage of registrations under electric vehicle labels
    pub electric_share: Option<f64>,
    /// Percentage held by the three largest manufacturers
    pub top_three_concentration: Option<f64>,
    /// Change between the two latest years present
    pub latest_growth: Option<f64>,
}

/// Substrings marking an electric vehicle label, matched case-insensitively
/// anywhere in the label (so `Seven Seater` counts through `EV`).
const ELECTRIC_KEYWORDS: [&str; 3] = ["E-RICKSHAW", "ELECTRIC", "EV"];

pub fn is_electric(label: &str) -> bool {
    let upper = label.to_uppercase();
    ELECTRIC_KEYWORDS.iter().any(|keyword| upper.contains(keyword))
}

fn percent_of(part: i64, total: i64) -> f64 {
    part as f64 / total as f64 * 100.0
}

/// Largest entry; equal totals go to the first name in order.
fn leader<'a>(totals: &BTreeMap<&'a str, i64>) -> Option<(&'a str, i64)> {
    totals
        .iter()
        .fold(None, |best: Option<(&'a str, i64)>, (name, total)| match best {
            Some((_, best_total)) if best_total >= *total => best,
            _ => Some((*name, *total)),
        })
}

impl MarketInsights {
    pub fn compute(table: &[FactRecord]) -> Self {
        let total = table.iter().map(|record| record.registrations_count).sum::<i64>();
        if total <= 0 {
            return MarketInsights::default();
        }
        let share = |(label, registrations): (&str, i64)| Share {
            label: label.to_owned(),
            registrations,
            percent: percent_of(registrations, total),
        };

        let manufacturers = manufacturer_totals(table);
        let mut categories = BTreeMap::<&str, i64>::new();
        let mut years = BTreeMap::<i32, i64>::new();
        let mut electric = 0i64;
        for record in table {
            *categories.entry(record.vehicle_category.as_str()).or_default() += record.registrations_count;
            *years.entry(record.year()).or_default() += record.registrations_count;
            if is_electric(&record.manufacturer) {
                electric += record.registrations_count;
            }
        }

        let top_three_concentration = (manufacturers.len() >= 3).then(|| {
            let mut totals = manufacturers.values().copied().collect::<Vec<_>>();
            totals.sort_unstable_by(|left, right| right.cmp(left));
            percent_of(totals.iter().take(3).sum(), total)
        });
        let latest_growth = if years.len() >= 2 {
            let mut latest = years.values().rev();
            match (latest.next(), latest.next()) {
                (Some(current), Some(previous)) => percent_change(*previous as f64, *current as f64),
                _ => None,
            }
        } else {
            None
        };

        MarketInsights {
            market_leader: leader(&manufacturers).map(share),
            segment_leader: leader(&categories).map(share),
            electric_share: (electric > 0).then(|| percent_of(electric, total)),
            top_three_concentration,
            latest_growth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(year: i32, category: &str, manufacturer: &str, count: i64) -> FactRecord {
        FactRecord::national(NaiveDate::from_ymd_opt(year, 6, 15).unwrap(), category, manufacturer, count)
    }

    fn close(actual: f64, expected: f64) -> bool {
        (actual - expected).abs() < 1e-9
    }

    #[test]
    fn kpis_summarise_the_table() {
        let table = vec![
            record(2023, "2W", "Moped", 10),
            record(2023, "2W", "Motor Cycle", 30),
            record(2022, "3W", "Moped", 20),
        ];
        let kpis = Kpis::compute(&table);
        assert_eq!(kpis.total_registrations, 60);
        assert_eq!(kpis.vehicle_types, 2);
        assert_eq!(kpis.categories, 2);
        assert!(close(kpis.average_per_record.unwrap(), 20.0));
        assert_eq!(Kpis::compute(&[]).average_per_record, None);
    }

    #[test]
    fn electric_labels() {
        assert!(is_electric("E-Rickshaw(P)"));
        assert!(is_electric("Battery Electric Car"));
        assert!(is_electric("Ev Scooter"));
        assert!(is_electric("Two Wheeler (EV)"));
        assert!(is_electric("Seven Seater"));
        assert!(!is_electric("Heavy Goods Vehicle"));
        assert!(is_electric("Levy Exempt Cart"));
        assert!(!is_electric("Motor Car"));
        assert!(!is_electric("Goods Carrier"));
    }

    #[test]
    fn market_insights() {
        let table = vec![
            record(2022, "2W", "Motor Cycle", 100),
            record(2023, "2W", "Motor Cycle", 150),
            record(2023, "3W", "E-Rickshaw(P)", 100),
            record(2023, "4W", "Motor Car", 50),
        ];
        let insights = MarketInsights::compute(&table);

        let leader = insights.market_leader.unwrap();
        assert_eq!(leader.label, "Motor Cycle");
        assert_eq!(leader.registrations, 250);
        assert!(close(leader.percent, 62.5));
        let segment = insights.segment_leader.unwrap();
        assert_eq!(segment.label, "2W");
        assert!(close(segment.percent, 62.5));
        assert!(close(insights.electric_share.unwrap(), 25.0));
        assert!(close(insights.top_three_concentration.unwrap(), 100.0));
        assert!(close(insights.latest_growth.unwrap(), 200.0));
    }

    #[test]
    fn insights_need_enough_data() {
        assert_eq!(MarketInsights::compute(&[]), MarketInsights::default());
        let insights = MarketInsights::compute(&[record(2023, "2W", "Moped", 5)]);
        assert!(insights.market_leader.is_some());
        assert_eq!(insights.electric_share, None);
        assert_eq!(insights.top_three_concentration, None);
        assert_eq!(insights.latest_growth, None);
    }

    #[test]
    fn ties_go_to_the_first_name() {
        let table = vec![record(2023, "2W", "Zeta", 10), record(2023, "2W", "Alpha", 10)];
        assert_eq!(MarketInsights::compute(&table).market_leader.unwrap().label, "Alpha");
    }
}
