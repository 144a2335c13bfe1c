use crate::error::RegistrationError;
use crate::model::FactRecord;
use crate::storage::validate_table_name;
use crate::storage::SqlValue;
use crate::storage::StorageError;
use crate::storage::StorageGateway;
use chrono::Duration;
use chrono::NaiveDate;
use duckdb::params;
use duckdb::types::Value;
use duckdb::Connection;
use std::path::Path;
use tracing::debug;
use tracing::info;

/// [`StorageGateway`] over a DuckDB database.
pub struct DuckDbGateway {
    connection: Connection,
}

impl DuckDbGateway {
    /// Opens a DuckDB database on disk at `path`, creating the file if it doesn't exist.
    pub fn open(path: &Path) -> Result<Self, RegistrationError> {
        let connection = Connection::open(path).map_err(StorageError::from)?;
        info!(database = %path.display(), "Opened DuckDB database");
        Ok(DuckDbGateway { connection })
    }

    /// Opens a DuckDB in-memory database.
    pub fn open_in_memory() -> Result<Self, RegistrationError> {
        let connection = Connection::open_in_memory().map_err(StorageError::from)?;
        Ok(DuckDbGateway { connection })
    }

    /// Creates the fact table when it does not exist yet.
    pub fn ensure_schema(&self, table: &str) -> Result<(), RegistrationError> {
        let table = validate_table_name(table)?;
        self.connection
            .execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    registration_date DATE,
                    vehicle_category VARCHAR,
                    manufacturer VARCHAR,
                    state VARCHAR,
                    district VARCHAR,
                    rto_code VARCHAR,
                    registrations_count BIGINT
                );"
            ))
            .map_err(StorageError::from)?;
        debug!(table, "Schema ready");
        Ok(())
    }
}

impl StorageGateway for DuckDbGateway {
    fn bulk_insert(&mut self, table: &str, records: &[FactRecord]) -> Result<usize, RegistrationError> {
        let table = validate_table_name(table)?;
        let transaction = self.connection.transaction().map_err(StorageError::from)?;
        {
            let mut statement = transaction
                .prepare(&format!(
                    "INSERT INTO {table} (registration_date, vehicle_category, manufacturer, state, district, rto_code, registrations_count) \
                     VALUES (CAST(? AS DATE), ?, ?, ?, ?, ?, ?)"
                ))
                .map_err(StorageError::from)?;
            for record in records {
                statement
                    .execute(params![
                        record.registration_date.format("%Y-%m-%d").to_string(),
                        record.vehicle_category,
                        record.manufacturer,
                        record.state,
                        record.district,
                        record.rto_code,
                        record.registrations_count,
                    ])
                    .map_err(StorageError::from)?;
            }
        }
        // Dropping an uncommitted transaction rolls the whole batch back.
        transaction.commit().map_err(StorageError::from)?;
        info!(table, rows = records.len(), "Bulk insert committed");
        Ok(records.len())
    }

    fn run_query(&mut self, sql: &str) -> Result<Vec<Vec<SqlValue>>, RegistrationError> {
        let mut statement = self.connection.prepare(sql).map_err(StorageError::from)?;
        let mut rows = statement.query([]).map_err(StorageError::from)?;
        let mut result = Vec::new();
        while let Some(row) = rows.next().map_err(StorageError::from)? {
            let column_count = row.as_ref().column_count();
            let mut values = Vec::with_capacity(column_count);
            for index in 0..column_count {
                let value: Value = row.get(index).map_err(StorageError::from)?;
                values.push(SqlValue::from(value));
            }
            result.push(values);
        }
        debug!(rows = result.len(), "Query finished");
        Ok(result)
    }
}

impl From<Value> for SqlValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => SqlValue::Null,
            Value::Boolean(value) => SqlValue::Boolean(value),
            Value::TinyInt(value) => SqlValue::Integer(value.into()),
            Value::SmallInt(value) => SqlValue::Integer(value.into()),
            Value::Int(value) => SqlValue::Integer(value.into()),
            Value::BigInt(value) => SqlValue::Integer(value),
            Value::UTinyInt(value) => SqlValue::Integer(value.into()),
            Value::USmallInt(value) => SqlValue::Integer(value.into()),
            Value::UInt(value) => SqlValue::Integer(value.into()),
            Value::UBigInt(value) => i64::try_from(value)
                .map(SqlValue::Integer)
                .unwrap_or(SqlValue::Double(value as f64)),
            Value::HugeInt(value) => i64::try_from(value)
                .map(SqlValue::Integer)
                .unwrap_or(SqlValue::Double(value as f64)),
            Value::Float(value) => SqlValue::Double(value.into()),
            Value::Double(value) => SqlValue::Double(value),
            Value::Text(value) => SqlValue::Text(value),
            Value::Date32(days) => NaiveDate::from_ymd_opt(1970, 1, 1)
                .and_then(|epoch| epoch.checked_add_signed(Duration::days(days.into())))
                .map(SqlValue::Date)
                .unwrap_or(SqlValue::Null),
            other => SqlValue::Text(format!("{other:?}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FactRecord;
    use crate::storage::load_fact_table;

    fn record(year: i32, category: &str, manufacturer: &str, count: i64) -> FactRecord {
        FactRecord::national(NaiveDate::from_ymd_opt(year, 6, 15).unwrap(), category, manufacturer, count)
    }

    #[test]
    fn bulk_insert_then_load_fact_table() {
        let mut gateway = DuckDbGateway::open_in_memory().unwrap();
        gateway.ensure_schema("vehicle_registrations").unwrap();
        let records = vec![
            record(2022, "2W", "Motor Cycle", 100),
            record(2023, "2W", "Motor Cycle", 150),
            record(2023, "2W", "Motor Cycle", 50),
            record(2023, "4W", "Motor Car", 70),
        ];
        assert_eq!(gateway.bulk_insert("vehicle_registrations", &records).unwrap(), 4);

        let table = load_fact_table(&mut gateway, "vehicle_registrations").unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table[0], record(2023, "2W", "Motor Cycle", 200));
        assert_eq!(table[1], record(2023, "4W", "Motor Car", 70));
        assert_eq!(table[2], record(2022, "2W", "Motor Cycle", 100));
    }

    #[test]
    fn run_query_converts_values() {
        let mut gateway = DuckDbGateway::open_in_memory().unwrap();
        let rows = gateway
            .run_query("SELECT 1::INTEGER, 2.5::DOUBLE, 'x', NULL, true, DATE '2023-06-15', SUM(x) FROM (SELECT 7::BIGINT AS x)")
            .unwrap();
        assert_eq!(
            rows,
            vec![vec![
                SqlValue::Integer(1),
                SqlValue::Double(2.5),
                SqlValue::Text("x".into()),
                SqlValue::Null,
                SqlValue::Boolean(true),
                SqlValue::Date(NaiveDate::from_ymd_opt(2023, 6, 15).unwrap()),
                SqlValue::Integer(7),
            ]]
        );
    }

    #[test]
    fn failed_batch_leaves_table_untouched() {
        let mut gateway = DuckDbGateway::open_in_memory().unwrap();
        gateway
            .connection
            .execute_batch(
                "CREATE TABLE strict_facts (
                    registration_date DATE, vehicle_category VARCHAR, manufacturer VARCHAR,
                    state VARCHAR, district VARCHAR, rto_code VARCHAR,
                    registrations_count BIGINT CHECK (registrations_count < 100)
                );",
            )
            .unwrap();
        let records = vec![record(2023, "2W", "Moped", 10), record(2023, "2W", "Motor Cycle", 500)];

        let error = gateway.bulk_insert("strict_facts", &records).unwrap_err();
        assert!(matches!(error, RegistrationError::StorageError(StorageError::Persistence(_))));
        let count = gateway.run_query("SELECT COUNT(*) FROM strict_facts").unwrap();
        assert_eq!(count, vec![vec![SqlValue::Integer(0)]]);
    }

    #[test]
    fn rejects_unsafe_table_names() {
        let mut gateway = DuckDbGateway::open_in_memory().unwrap();
        let error = gateway.bulk_insert("facts; DROP TABLE x", &[]).unwrap_err();
        assert!(matches!(error, RegistrationError::StorageError(StorageError::InvalidTableName(_))));
        assert!(gateway.ensure_schema("1facts").is_err());
    }
}
