//! # Ingestion Coordinator
//!
//! Runs the extractor over every spreadsheet of a folder and appends the
//! merged records to storage in a single bulk insert. A file that cannot be
//! used is recorded in [`Diagnostics`] and skipped; only run-level problems
//! fail the call.

use crate::diagnostics::Diagnostics;
use crate::diagnostics::SkipReason;
use crate::error::RegistrationError;
use crate::error::ResultMessage;
use crate::extract::ExtractError;
use crate::extract::RecordExtractor;
use crate::model::FactTable;
use crate::spreadsheet::is_supported;
use crate::spreadsheet::SheetSelector;
use crate::storage::StorageGateway;
use crate::storage::DEFAULT_TABLE;
use glob::glob;
use glob::Pattern;
use std::path::Path;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

/// Name prefix of the lock files office suites leave next to open workbooks.
const LOCK_FILE_PREFIX: &str = "~$";

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Input folder '{0}' does not exist or is not a directory")]
    InvalidFolder(String),

    #[error("No spreadsheet files found in '{0}'")]
    NoInputFiles(String),

    /// Every input file was skipped; the diagnostics tell why.
    #[error("No records extracted from any input file ({0})")]
    NoRecordsExtracted(Diagnostics),
}

/// Outcome of a successful ingestion run.
#[derive(Clone, Debug, PartialEq)]
pub struct IngestReport {
    /// Merged records of all loaded files, file by file in name order
    pub records: FactTable,
    pub files_seen: usize,
    pub files_loaded: usize,
    pub diagnostics: Diagnostics,
}

#[derive(Clone, Debug)]
pub struct Ingestor {
    extractor: RecordExtractor,
    selector: SheetSelector,
    table: String,
}

impl Default for Ingestor {
    fn default() -> Self {
        Ingestor::new(RecordExtractor::default(), SheetSelector::default(), DEFAULT_TABLE)
    }
}

impl Ingestor {
    pub fn new(extractor: RecordExtractor, selector: SheetSelector, table: &str) -> Self {
        Ingestor {
            extractor,
            selector,
            table: table.to_owned(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Ingests every spreadsheet directly inside `folder` and hands the
    /// merged records to `gateway` in one bulk insert.
    pub fn ingest_all<G>(&self, folder: &Path, gateway: &mut G) -> Result<IngestReport, RegistrationError>
    where
        G: StorageGateway + ?Sized,
    {
        let files = discover_inputs(folder)?;
        if files.is_empty() {
            return Err(IngestError::NoInputFiles(folder.display().to_string()).into());
        }
        info!(folder = %folder.display(), files = files.len(), "Starting ingestion");

        let mut records = FactTable::new();
        let mut diagnostics = Diagnostics::new();
        let mut files_loaded = 0;
        for path in &files {
            match self.extractor.extract_file(path, &self.selector) {
                Ok(file_records) => {
                    files_loaded += 1;
                    records.extend(file_records);
                }
                Err(error) => diagnostics.skip(path, skip_reason(error)),
            }
        }

        if records.is_empty() {
            return Err(IngestError::NoRecordsExtracted(diagnostics).into());
        }
        gateway.bulk_insert(&self.table, &records)?;
        info!(
            records = records.len(),
            files_loaded,
            files_skipped = diagnostics.len(),
            "Ingestion finished"
        );
        Ok(IngestReport {
            records,
            files_seen: files.len(),
            files_loaded,
            diagnostics,
        })
    }
}

/// Spreadsheet files directly inside `folder`, sorted by path.
pub fn discover_inputs(folder: &Path) -> Result<Vec<PathBuf>, RegistrationError> {
    if !folder.is_dir() {
        return Err(IngestError::InvalidFolder(folder.display().to_string()).into());
    }
    let pattern = format!("{}/*", Pattern::escape(&folder.to_string_lossy()));
    let prefix = folder.display().to_string();
    let mut files = Vec::new();
    for entry in glob(&pattern).map_err(RegistrationError::from).with_prefix(&prefix)? {
        let path = entry
            .map_err(|e| RegistrationError::from(std::io::Error::from(e)))
            .with_prefix(&prefix)?;
        let is_lock_file = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(LOCK_FILE_PREFIX));
        if path.is_file() && is_supported(&path) && !is_lock_file {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn skip_reason(error: RegistrationError) -> SkipReason {
    match error {
        RegistrationError::ExtractError(ExtractError::FileFormat(message)) => SkipReason::FileFormat(message),
        RegistrationError::ExtractError(ExtractError::ExtractionEmpty(_)) => SkipReason::ExtractionEmpty,
        other => SkipReason::ReadFailed(other.to_string()),
    }
}
