//! # Spreadsheet Reading
//!
//! Turns one workbook file into a [`RawGrid`]. Office Open XML workbooks
//! (.xlsx, .xlsm, .xlam) and OpenDocument spreadsheets (.ods) are read
//! directly from their zip containers with a streaming XML parser.

pub(crate) mod cell;
pub mod grid;
pub(crate) mod ods;
pub(crate) mod reference;
pub mod selector;
pub(crate) mod xlsx;

use crate::error::RegistrationError;
use crate::spreadsheet::ods::OdsSpreadsheet;
use crate::spreadsheet::xlsx::XlsxSpreadsheet;
use std::path::Path;
use thiserror::Error;

pub use grid::CellValue;
pub use grid::RawGrid;
pub use selector::SheetSelector;

/// Errors raised while opening or reading a workbook.
#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("Cannot detect file format for '{0}'")]
    InvalidFileFormat(String),

    #[error("Missing part '{0}' in workbook container")]
    FileError(String),

    #[error("Spreadsheet '{0}' contains no sheets")]
    SpreadsheetEmpty(String),

    #[error("Spreadsheet '{0}' is password protected")]
    PasswordProtected(String),

    #[error("Invalid OpenDocument MIME type in '{0}'")]
    MimeType(String),

    #[error("No sheet matching '{pattern}' in '{file}' (available: {available})")]
    SheetNotFound {
        file: String,
        pattern: String,
        available: String,
    },

    #[error("Shared string index {index} out of range at {reference}")]
    SharedStringIndex { reference: String, index: usize },

    #[error("Date serial '{0}' is out of range")]
    DateOutOfRange(String),

    #[error("Cell at row {row}, column {col} (0-based) lies outside the sheet limits")]
    CellOutOfBounds { row: usize, col: usize },

    #[error("Sheet holds more than {limit} populated cells")]
    TooManyCells { limit: usize },
}

/// A workbook opened for reading.
pub trait Spreadsheet {
    /// Source file name
    fn name(&self) -> &str;

    /// Sheet names in workbook order.
    fn sheet_names(&mut self) -> Result<Vec<String>, RegistrationError>;

    /// Reads the first sheet accepted by `selector` into a grid.
    fn read_grid(&mut self, selector: &SheetSelector) -> Result<RawGrid, RegistrationError>;

    /// Error for a selector that matched none of the sheets, listing the
    /// sheets the workbook does have.
    fn sheet_not_found(&mut self, selector: &SheetSelector) -> RegistrationError {
        let available = match self.sheet_names() {
            Ok(names) => names.join(", "),
            Err(error) => return error,
        };
        SpreadsheetError::SheetNotFound {
            file: self.name().to_owned(),
            pattern: selector.describe().to_owned(),
            available,
        }
        .into()
    }
}

/// Lowercased extensions accepted as workbooks.
pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["xlsx", "xlsm", "xlam", "ods"];

/// True when the path carries one of the [`SUPPORTED_EXTENSIONS`].
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| extension.eq_ignore_ascii_case(supported))
        })
        .unwrap_or(false)
}

/// Opens a workbook, choosing the reader from the file extension.
pub fn open_spreadsheet(path: &Path) -> Result<Box<dyn Spreadsheet>, RegistrationError> {
    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "xlsx" | "xlsm" | "xlam" => Ok(Box::new(XlsxSpreadsheet::open(path)?)),
        "ods" => Ok(Box::new(OdsSpreadsheet::open(path)?)),
        _ => Err(SpreadsheetError::InvalidFileFormat(path.display().to_string()))?,
    }
}

/// Opens `path` and reads the selected sheet in one step.
pub fn read_grid(path: &Path, selector: &SheetSelector) -> Result<RawGrid, RegistrationError> {
    open_spreadsheet(path)?.read_grid(selector)
}
