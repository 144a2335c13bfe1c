//! Row classification by shape.
//!
//! The exports carry no usable header row, so a data row is recognised by
//! its cells alone: a digit-only serial in column 0, a label in column 1 and
//! a count in the right-most cell that reads as a whole number. The rules run
//! in a fixed order and the first failing rule names the rejection.

use crate::spreadsheet::CellValue;
use std::fmt;

/// Why a row was not turned into a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowRejection {
    BlankRow,
    MissingSerial,
    NonNumericSerial,
    MissingLabel,
    MissingCount,
    NonPositiveCount,
}

impl fmt::Display for RowRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RowRejection::BlankRow => "blank row",
            RowRejection::MissingSerial => "no serial number",
            RowRejection::NonNumericSerial => "serial number is not all digits",
            RowRejection::MissingLabel => "no label",
            RowRejection::MissingCount => "no whole-number count",
            RowRejection::NonPositiveCount => "count is not positive",
        };
        f.write_str(text)
    }
}

/// Label and count of a row that passed every rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataRow {
    /// Trimmed label, not yet title-cased
    pub label: String,
    pub count: i64,
}

fn is_ascii_digits(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|byte| byte.is_ascii_digit())
}

pub fn check_blank(cells: &[CellValue]) -> Result<(), RowRejection> {
    if cells.iter().all(CellValue::is_empty) {
        Err(RowRejection::BlankRow)
    } else {
        Ok(())
    }
}

/// Column 0 must be present and consist of decimal digits only.
pub fn check_serial(cells: &[CellValue]) -> Result<(), RowRejection> {
    let serial = cells.first().filter(|cell| !cell.is_empty()).ok_or(RowRejection::MissingSerial)?;
    if is_ascii_digits(serial.as_text().trim()) {
        Ok(())
    } else {
        Err(RowRejection::NonNumericSerial)
    }
}

/// Column 1, trimmed, is the label.
pub fn find_label(cells: &[CellValue]) -> Result<String, RowRejection> {
    cells
        .get(1)
        .map(|cell| cell.as_text().trim().to_owned())
        .filter(|label| !label.is_empty())
        .ok_or(RowRejection::MissingLabel)
}

/// Scans right to left, over every column including the serial and label,
/// for the first cell whose text without thousands separators is all digits.
pub fn find_count(cells: &[CellValue]) -> Result<i64, RowRejection> {
    let digits = cells
        .iter()
        .rev()
        .filter(|cell| !cell.is_empty())
        .map(|cell| cell.as_text().replace(',', "").trim().to_owned())
        .find(|text| is_ascii_digits(text))
        .ok_or(RowRejection::MissingCount)?;
    let count = digits.parse::<i64>().map_err(|_| RowRejection::MissingCount)?;
    if count > 0 {
        Ok(count)
    } else {
        Err(RowRejection::NonPositiveCount)
    }
}

/// Runs every rule in order.
pub fn classify_row(cells: &[CellValue]) -> Result<DataRow, RowRejection> {
    check_blank(cells)?;
    check_serial(cells)?;
    let label = find_label(cells)?;
    let count = find_count(cells)?;
    Ok(DataRow { label, count })
}

/// Capitalises the first letter of every word and lowercases the rest, where
/// a word starts at any letter not preceded by a letter (`two-wheeler (nt)`
/// becomes `Two-Wheeler (Nt)`). Applying it twice changes nothing.
pub fn title_case(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut previous_is_letter = false;
    for character in text.chars() {
        if character.is_alphabetic() {
            if previous_is_letter {
                result.extend(character.to_lowercase());
            } else {
                let mut upper = character.to_uppercase();
                if let Some(first) = upper.next() {
                    result.push(first);
                }
                for rest in upper {
                    result.extend(rest.to_lowercase());
                }
            }
            previous_is_letter = true;
        } else {
            result.push(character);
            previous_is_letter = false;
        }
    }
    result
}
