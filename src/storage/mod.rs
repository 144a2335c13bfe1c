//! # Storage Gateway
//!
//! The persistence boundary of the pipeline: one bulk append per ingestion
//! run and tabular queries for the growth and dashboard computations.
//! [`duck::DuckDbGateway`] is the DuckDB-backed implementation.

pub mod duck;

use crate::error::RegistrationError;
use crate::growth::GrowthError;
use crate::model::FactRecord;
use crate::model::FactTable;
use chrono::NaiveDate;
use regex::Regex;
use std::fmt;
use thiserror::Error;

pub use duck::DuckDbGateway;

/// Table the ingestion run appends to unless configured otherwise.
pub const DEFAULT_TABLE: &str = "vehicle_registrations";

#[derive(Error, Debug)]
pub enum StorageError {
    /// The database rejected a statement; nothing of the batch was kept.
    #[error("Persistence failed: {0}")]
    Persistence(#[from] duckdb::Error),

    #[error("Invalid table name '{0}'")]
    InvalidTableName(String),
}

/// A value of a query result cell.
#[derive(Clone, Debug, PartialEq)]
pub enum SqlValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    Text(String),
    Date(NaiveDate),
}

impl SqlValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            SqlValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            SqlValue::Date(date) => Some(*date),
            SqlValue::Text(text) => NaiveDate::parse_from_str(text, "%Y-%m-%d").ok(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Integer(value) => Some(*value),
            SqlValue::Double(value) if value.fract() == 0.0 => Some(*value as i64),
            _ => None,
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => f.write_str("NULL"),
            SqlValue::Boolean(value) => write!(f, "{value}"),
            SqlValue::Integer(value) => write!(f, "{value}"),
            SqlValue::Double(value) => write!(f, "{value}"),
            SqlValue::Text(value) => f.write_str(value),
            SqlValue::Date(value) => write!(f, "{}", value.format("%Y-%m-%d")),
        }
    }
}

/// Tabular query executor and bulk-insert sink.
pub trait StorageGateway {
    /// Appends all records to `table` as one unit; either every record lands
    /// or none does. Returns the number of rows written.
    fn bulk_insert(&mut self, table: &str, records: &[FactRecord]) -> Result<usize, RegistrationError>;

    /// Runs `sql` and returns its rows.
    fn run_query(&mut self, sql: &str) -> Result<Vec<Vec<SqlValue>>, RegistrationError>;
}

/// Accepts plain SQL identifiers only, since table names are spliced into
/// statement text.
pub fn validate_table_name(table: &str) -> Result<&str, StorageError> {
    let pattern = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("Hardcode regex pattern");
    if pattern.is_match(table) {
        Ok(table)
    } else {
        Err(StorageError::InvalidTableName(table.to_owned()))
    }
}

const FACT_COLUMNS: [&str; 7] = [
    "registration_date",
    "vehicle_category",
    "manufacturer",
    "state",
    "district",
    "rto_code",
    "registrations_count",
];

/// The dashboard's view of the stored facts: rows grouped on date, category,
/// manufacturer, state and district with their counts summed, newest first.
pub fn fact_table_query(table: &str) -> Result<String, StorageError> {
    let table = validate_table_name(table)?;
    Ok(format!(
        "SELECT registration_date, vehicle_category, manufacturer, state, district, \
         MIN(rto_code) AS rto_code, CAST(SUM(registrations_count) AS BIGINT) AS registrations_count \
         FROM {table} \
         GROUP BY registration_date, vehicle_category, manufacturer, state, district \
         ORDER BY registration_date DESC, vehicle_category, manufacturer, state, district"
    ))
}

/// Materializes the fact table through `gateway`.
pub fn load_fact_table<G: StorageGateway + ?Sized>(gateway: &mut G, table: &str) -> Result<FactTable, RegistrationError> {
    let rows = gateway.run_query(&fact_table_query(table)?)?;
    rows.iter()
        .enumerate()
        .map(|(index, row)| fact_from_row(index, row))
        .collect()
}

fn fact_from_row(index: usize, row: &[SqlValue]) -> Result<FactRecord, RegistrationError> {
    let invalid = |column: usize| GrowthError::GrowthInputInvalid {
        row: index,
        column: FACT_COLUMNS[column].to_owned(),
    };
    let text = |column: usize| {
        row.get(column)
            .and_then(SqlValue::as_text)
            .map(str::to_owned)
            .ok_or_else(|| invalid(column))
    };
    Ok(FactRecord {
        registration_date: row.first().and_then(SqlValue::as_date).ok_or_else(|| invalid(0))?,
        vehicle_category: text(1)?,
        manufacturer: text(2)?,
        state: text(3)?,
        district: text(4)?,
        rto_code: text(5)?,
        registrations_count: row.get(6).and_then(SqlValue::as_i64).ok_or_else(|| invalid(6))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_names_must_be_identifiers() {
        assert!(validate_table_name("vehicle_registrations").is_ok());
        assert!(validate_table_name("_staging2").is_ok());
        assert!(validate_table_name("2023").is_err());
        assert!(validate_table_name("facts; DROP TABLE x").is_err());
        assert!(validate_table_name("").is_err());
    }

    #[test]
    fn converts_rows_into_records() {
        let row = vec![
            SqlValue::Date(NaiveDate::from_ymd_opt(2023, 6, 15).unwrap()),
            SqlValue::Text("2W".into()),
            SqlValue::Text("Motor Cycle".into()),
            SqlValue::Text("ALL INDIA".into()),
            SqlValue::Text("ALL DISTRICTS".into()),
            SqlValue::Text("ALL_RTO".into()),
            SqlValue::Integer(42),
        ];
        let record = fact_from_row(0, &row).unwrap();
        assert_eq!(record.manufacturer, "Motor Cycle");
        assert_eq!(record.registrations_count, 42);
    }

    #[test]
    fn null_fields_are_invalid_growth_input() {
        let row = vec![
            SqlValue::Text("2023-06-15".into()),
            SqlValue::Text("2W".into()),
            SqlValue::Null,
        ];
        let error = fact_from_row(3, &row).unwrap_err();
        assert!(matches!(
            error,
            RegistrationError::GrowthError(GrowthError::GrowthInputInvalid { row: 3, ref column }) if column == "manufacturer"
        ));
    }
}
