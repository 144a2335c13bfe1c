//! Per-file outcomes of an ingestion run, returned to the caller instead of
//! only being written to the log.

use std::fmt;
use std::path::Path;
use std::path::PathBuf;
use tracing::warn;

/// Why an input file contributed no records.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// File name does not follow `<year>_<category>.<ext>`
    FileFormat(String),
    /// No row of the sheet classified as a data row
    ExtractionEmpty,
    /// The workbook could not be opened or read
    ReadFailed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::FileFormat(message) => write!(f, "file format: {message}"),
            SkipReason::ExtractionEmpty => f.write_str("no valid data rows"),
            SkipReason::ReadFailed(message) => write!(f, "read failed: {message}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// Collector of skipped files.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Diagnostics {
    skipped: Vec<SkippedFile>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a skip and logs it at warn level.
    pub fn skip(&mut self, path: &Path, reason: SkipReason) {
        warn!(file = %path.display(), reason = %reason, "Skipping input file");
        self.skipped.push(SkippedFile {
            path: path.to_owned(),
            reason,
        });
    }

    pub fn skipped(&self) -> &[SkippedFile] {
        &self.skipped
    }

    pub fn is_empty(&self) -> bool {
        self.skipped.is_empty()
    }

    pub fn len(&self) -> usize {
        self.skipped.len()
    }

    /// Reason recorded for `path`, if it was skipped.
    pub fn reason_for(&self, path: &Path) -> Option<&SkipReason> {
        self.skipped
            .iter()
            .find(|skipped| skipped.path == path)
            .map(|skipped| &skipped.reason)
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, skipped) in self.skipped.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", skipped.path.display(), skipped.reason)?;
        }
        Ok(())
    }
}
