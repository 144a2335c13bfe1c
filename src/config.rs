use crate::error::RegistrationError;
use crate::extract::RecordExtractor;
use crate::extract::DEFAULT_HEADER_ROWS;
use crate::ingest::Ingestor;
use crate::spreadsheet::SheetSelector;
use crate::storage::DEFAULT_TABLE;
use std::path::PathBuf;

pub const DEFAULT_DATA_DIR: &str = "data/raw";
pub const DEFAULT_DATABASE: &str = "vehicle_dashboard.duckdb";

/// Runtime settings of the pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Folder scanned for `<year>_<category>` exports
    pub data_dir: PathBuf,
    /// DuckDB database file
    pub database: PathBuf,
    pub table: String,
    /// Sheet rows above the data: the column header row and the banner rows
    pub header_rows: usize,
    /// Sheet name glob; the first sheet when unset
    pub sheet_pattern: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            database: PathBuf::from(DEFAULT_DATABASE),
            table: DEFAULT_TABLE.to_owned(),
            header_rows: DEFAULT_HEADER_ROWS,
            sheet_pattern: None,
        }
    }
}

impl Config {
    pub fn sheet_selector(&self) -> Result<SheetSelector, RegistrationError> {
        SheetSelector::new(self.sheet_pattern.as_deref())
    }

    /// Ingestor wired with the configured extractor, sheet and table.
    pub fn ingestor(&self) -> Result<Ingestor, RegistrationError> {
        Ok(Ingestor::new(
            RecordExtractor::new(self.header_rows),
            self.sheet_selector()?,
            &self.table,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.data_dir, PathBuf::from("data/raw"));
        assert_eq!(config.database, PathBuf::from("vehicle_dashboard.duckdb"));
        assert_eq!(config.table, "vehicle_registrations");
        assert_eq!(config.header_rows, 5);
        assert_eq!(config.sheet_selector().unwrap().describe(), "*");
    }

    #[test]
    fn builds_ingestor_from_settings() {
        let config = Config {
            table: "staging".to_owned(),
            sheet_pattern: Some("Report*".to_owned()),
            ..Config::default()
        };
        assert_eq!(config.ingestor().unwrap().table(), "staging");

        let config = Config {
            sheet_pattern: Some("[".to_owned()),
            ..Config::default()
        };
        assert!(config.ingestor().is_err());
    }
}
