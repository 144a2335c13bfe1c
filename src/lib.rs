//! # Vehicle Registration Analytics
//!
//! Ingests national vehicle-registration spreadsheet exports into DuckDB and
//! derives growth trends from the stored facts.
//!
//! ## Pipeline
//!
//! - **Spreadsheet reading**: `.xlsx`, `.xlsm`, `.xlam` and `.ods` workbooks
//!   are read into a [`RawGrid`] of text and numbers
//! - **Record extraction**: rows are classified by shape (digit-only serial,
//!   rightmost numeric count) since the exports carry no reliable headers
//! - **Ingestion**: every file of a folder is extracted, unusable files are
//!   reported in [`Diagnostics`], and the merged records are written with a
//!   single bulk insert
//! - **Growth**: yearly and estimated quarterly changes per category, yearly
//!   changes per manufacturer
//! - **Analytics**: filters, top manufacturers, KPIs and market insights for
//!   the dashboard views
//!
//! ## Example
//!
//! ```no_run
//! use registration_analytics::{compute_growth, load_fact_table, DuckDbGateway, Ingestor};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), registration_analytics::RegistrationError> {
//! let mut gateway = DuckDbGateway::open(Path::new("vehicle_dashboard.duckdb"))?;
//! gateway.ensure_schema("vehicle_registrations")?;
//! let report = Ingestor::default().ingest_all(Path::new("data/raw"), &mut gateway)?;
//! println!("Successfully processed and loaded {} records", report.records.len());
//!
//! let table = load_fact_table(&mut gateway, "vehicle_registrations")?;
//! let growth = compute_growth(&table);
//! # Ok(())
//! # }
//! ```

pub mod analytics;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod extract;
pub mod growth;
pub(crate) mod helpers;
pub mod ingest;
pub mod model;
pub mod spreadsheet;
pub mod storage;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use diagnostics::Diagnostics;
pub use diagnostics::SkipReason;
pub use error::RegistrationError;
pub use extract::RecordExtractor;
pub use growth::compute_growth;
pub use growth::GrowthReport;
pub use ingest::IngestReport;
pub use ingest::Ingestor;
pub use model::FactRecord;
pub use model::FactTable;
pub use spreadsheet::RawGrid;
pub use storage::load_fact_table;
pub use storage::DuckDbGateway;
pub use storage::StorageGateway;
