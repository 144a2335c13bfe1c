//! # Record Extraction
//!
//! Turns the grid of one national registration export into [`FactRecord`]s.
//! The file name supplies the year and category ([`metadata`]); each row
//! below the banner block is classified by shape ([`rules`]).

pub mod metadata;
pub mod rules;

use crate::error::RegistrationError;
use crate::model::FactRecord;
use crate::spreadsheet::read_grid;
use crate::spreadsheet::RawGrid;
use crate::spreadsheet::SheetSelector;
use std::path::Path;
use thiserror::Error;
use tracing::debug;
use tracing::info;

pub use metadata::FileMetadata;
pub use rules::classify_row;
pub use rules::title_case;
pub use rules::RowRejection;

/// Sheet rows above the data in the national exports: the column header
/// row followed by four banner rows.
pub const DEFAULT_HEADER_ROWS: usize = 5;

#[derive(Error, Debug)]
pub enum ExtractError {
    /// The file name does not carry a usable year and category.
    #[error("Unexpected file name format: {0}")]
    FileFormat(String),

    /// Not a single row classified as data.
    #[error("No valid records extracted from '{0}'")]
    ExtractionEmpty(String),
}

/// Extracts fact records from registration grids.
#[derive(Clone, Debug)]
pub struct RecordExtractor {
    header_rows: usize,
}

impl Default for RecordExtractor {
    fn default() -> Self {
        RecordExtractor::new(DEFAULT_HEADER_ROWS)
    }
}

impl RecordExtractor {
    pub fn new(header_rows: usize) -> Self {
        RecordExtractor { header_rows }
    }

    pub fn header_rows(&self) -> usize {
        self.header_rows
    }

    /// Records of every data row below the banner block, in sheet order.
    /// An empty result means the grid held no recognisable data.
    pub fn extract(&self, grid: &RawGrid, metadata: &FileMetadata, source_name: &str) -> Vec<FactRecord> {
        let mut records = Vec::new();
        for (index, cells) in grid.rows().iter().enumerate().skip(self.header_rows) {
            match classify_row(cells) {
                Ok(row) => records.push(FactRecord::national(
                    metadata.registration_date,
                    &metadata.category,
                    &title_case(&row.label),
                    row.count,
                )),
                Err(RowRejection::BlankRow) => (),
                Err(rejection) => {
                    debug!(source = source_name, row = index + 1, %rejection, "Row skipped");
                }
            }
        }
        records
    }

    /// Reads `path` and extracts its records. File name problems surface as
    /// [`ExtractError::FileFormat`] before the workbook is opened, and a
    /// workbook without data rows as [`ExtractError::ExtractionEmpty`].
    pub fn extract_file(&self, path: &Path, selector: &SheetSelector) -> Result<Vec<FactRecord>, RegistrationError> {
        let metadata = FileMetadata::from_path(path)?;
        let source_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let grid = read_grid(path, selector)?;
        debug!(source = %source_name, rows = grid.row_count(), "Loaded grid");

        let records = self.extract(&grid, &metadata, &source_name);
        if records.is_empty() {
            return Err(ExtractError::ExtractionEmpty(source_name).into());
        }
        info!(source = %source_name, records = records.len(), "Extracted records");
        Ok(records)
    }
}
