//! Normalized registration facts.

use chrono::Datelike;
use chrono::NaiveDate;

/// `state` of nationally aggregated records.
pub const ALL_STATES: &str = "ALL INDIA";
/// `district` of nationally aggregated records.
pub const ALL_DISTRICTS: &str = "ALL DISTRICTS";
/// `rto_code` of nationally aggregated records.
pub const ALL_RTOS: &str = "ALL_RTO";

/// Month and day every record of a source year is dated at.
pub const ANCHOR_MONTH: u32 = 6;
pub const ANCHOR_DAY: u32 = 15;

/// Mid-year anchor date for a source year, `None` when the year is not a
/// calendar year chrono can represent.
pub fn anchor_date(year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, ANCHOR_MONTH, ANCHOR_DAY)
}

/// One normalized vehicle-registration observation.
///
/// `manufacturer` holds the row label of the source sheet, which for the
/// national exports is a vehicle type rather than a maker. The column keeps
/// its name because the growth-by-manufacturer figures are keyed on it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FactRecord {
    pub registration_date: NaiveDate,
    pub vehicle_category: String,
    pub manufacturer: String,
    pub state: String,
    pub district: String,
    pub rto_code: String,
    /// Always positive for extracted records
    pub registrations_count: i64,
}

impl FactRecord {
    /// A nationally aggregated record carrying the sentinel location fields.
    pub fn national(
        registration_date: NaiveDate,
        vehicle_category: &str,
        manufacturer: &str,
        registrations_count: i64,
    ) -> Self {
        FactRecord {
            registration_date,
            vehicle_category: vehicle_category.to_owned(),
            manufacturer: manufacturer.to_owned(),
            state: ALL_STATES.to_owned(),
            district: ALL_DISTRICTS.to_owned(),
            rto_code: ALL_RTOS.to_owned(),
            registrations_count,
        }
    }

    pub fn year(&self) -> i32 {
        self.registration_date.year()
    }
}

/// Ordered collection of facts exchanged between ingestion, storage and the
/// growth computations.
pub type FactTable = Vec<FactRecord>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchors_mid_year() {
        assert_eq!(anchor_date(2023), NaiveDate::from_ymd_opt(2023, 6, 15));
        assert_eq!(anchor_date(i32::MAX), None);
    }

    #[test]
    fn national_records_use_sentinels() {
        let record = FactRecord::national(anchor_date(2022).unwrap(), "2W", "Motor Cycle", 12);
        assert_eq!(record.state, "ALL INDIA");
        assert_eq!(record.district, "ALL DISTRICTS");
        assert_eq!(record.rto_code, "ALL_RTO");
        assert_eq!(record.year(), 2022);
    }
}
