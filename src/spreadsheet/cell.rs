use crate::error::RegistrationError;
use crate::spreadsheet::grid::CellValue;
use crate::spreadsheet::reference::index_to_reference;
use crate::spreadsheet::SpreadsheetError;
use chrono::Duration;
use chrono::NaiveDate;
use iso8601_duration::Duration as IsoDuration;

/// Storage type of a cell as declared by the workbook.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) enum CellType {
    #[default]
    Empty,
    Boolean,
    Number,
    /// Serial date-time counted from the 1900 epoch
    NumberDateTime1900,
    NumberDate1900,
    NumberTime1900,
    /// Serial date-time counted from the 1904 epoch
    NumberDateTime1904,
    NumberDate1904,
    NumberTime1904,
    /// ISO 8601 date/time text (OpenDocument `date` cells)
    IsoDateTime,
    /// ISO 8601 duration text (OpenDocument `time` cells)
    IsoDuration,
    InlineString,
    /// Index into the workbook shared string table
    SharedString,
    Error,
}

impl CellType {
    /// Cell type implied by one of the built-in Office number format ids.
    pub(crate) fn parse_builtin_number_format_id(id: &str, is_1904: bool) -> Option<Self> {
        match id {
            "22" => Some(Self::date_time(is_1904)),
            "14" | "15" | "16" | "17" => Some(Self::date(is_1904)),
            "18" | "19" | "20" | "21" | "45" | "46" | "47" => Some(Self::time(is_1904)),
            _ => None,
        }
    }

    /// Cell type implied by a custom format code such as `dd/mm/yyyy hh:mm`.
    /// Quoted literals, escaped characters and bracketed sections (colours,
    /// locales) are not date/time tokens.
    pub(crate) fn parse_custom_number_format(format: &str, is_1904: bool) -> Self {
        let mut escaped = false;
        let mut literal = false;
        let mut bracket = false;
        let mut has_date = false;
        let mut has_time = false;
        for character in format.chars() {
            match character {
                _ if escaped => escaped = false,
                '_' | '\\' => escaped = true,
                '"' if !bracket => literal = !literal,
                '[' if !literal => bracket = true,
                ']' if bracket => bracket = false,
                _ if literal || bracket => (),
                'Y' | 'y' | 'D' | 'd' => has_date = true,
                'H' | 'h' | 'S' | 's' => has_time = true,
                _ => (),
            }
        }
        match (has_date, has_time) {
            (true, true) => Self::date_time(is_1904),
            (true, false) => Self::date(is_1904),
            (false, true) => Self::time(is_1904),
            (false, false) => Self::Number,
        }
    }

    fn date_time(is_1904: bool) -> Self {
        if is_1904 { Self::NumberDateTime1904 } else { Self::NumberDateTime1900 }
    }

    fn date(is_1904: bool) -> Self {
        if is_1904 { Self::NumberDate1904 } else { Self::NumberDate1900 }
    }

    fn time(is_1904: bool) -> Self {
        if is_1904 { Self::NumberTime1904 } else { Self::NumberTime1900 }
    }
}

/// One populated cell as streamed out of a worksheet.
#[derive(Clone, Debug)]
pub(crate) struct Cell {
    /// Row index (0-based)
    pub(crate) row: usize,
    /// Column index (0-based)
    pub(crate) col: usize,
    pub(crate) kind: CellType,
    /// Raw value text as stored in the workbook
    pub(crate) value: String,
}

impl Cell {
    /// Excel-style reference such as `B7`.
    pub(crate) fn reference(&self) -> String {
        index_to_reference(self.row, self.col)
    }

    /// Resolves the raw value into a grid value. Dates and times become ISO
    /// text so a serial date can never be mistaken for a count; error cells
    /// become empty.
    pub(crate) fn to_value(&self, shared_strings: &[String]) -> Result<CellValue, RegistrationError> {
        let value = match self.kind {
            CellType::Empty | CellType::Error => CellValue::Empty,
            CellType::Boolean => CellValue::Text(
                if self.value == "1" || self.value == "true" { "true" } else { "false" }.to_owned(),
            ),
            CellType::Number => match self.value.trim().parse::<f64>() {
                Ok(number) => CellValue::Number(number),
                Err(_) => CellValue::Text(self.value.to_owned()),
            },
            CellType::NumberDate1900 => CellValue::Text(to_date_string(&self.value, false)?),
            CellType::NumberDate1904 => CellValue::Text(to_date_string(&self.value, true)?),
            CellType::NumberDateTime1900 => CellValue::Text(to_datetime_string(&self.value, false)?),
            CellType::NumberDateTime1904 => CellValue::Text(to_datetime_string(&self.value, true)?),
            CellType::NumberTime1900 | CellType::NumberTime1904 => {
                CellValue::Text(to_time_string(&self.value)?)
            }
            CellType::IsoDateTime => CellValue::Text(self.value.replace('T', " ")),
            CellType::IsoDuration => CellValue::Text(to_duration_string(&self.value)),
            CellType::InlineString => CellValue::Text(self.value.to_owned()),
            CellType::SharedString => {
                let index = self.value.trim().parse::<usize>()?;
                let text = shared_strings.get(index).ok_or_else(|| {
                    SpreadsheetError::SharedStringIndex {
                        reference: self.reference(),
                        index,
                    }
                })?;
                CellValue::Text(text.to_owned())
            }
        };
        Ok(value)
    }
}

/// Serial day number to `YYYY-MM-DD`, reproducing the Lotus 1-2-3 leap year
/// bug of the 1900 system (serial 60 is the fictitious 1900-02-29).
fn to_date_string(value: &str, is_1904: bool) -> Result<String, RegistrationError> {
    let days = value.trim().parse::<f64>()?.trunc() as i64;
    let offset = if is_1904 {
        1462
    } else if days < 60 {
        1
    } else {
        0
    };
    let date = NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|epoch| epoch.checked_add_signed(Duration::days(days + offset)))
        .ok_or_else(|| SpreadsheetError::DateOutOfRange(value.to_owned()))?;
    Ok(date.format("%Y-%m-%d").to_string())
}

/// Fraction of a day to `HH:MM:SS`, with milliseconds when present.
fn to_time_string(value: &str) -> Result<String, RegistrationError> {
    let fraction = value.trim().parse::<f64>()?.fract();
    let mut millis = (fraction * 86_400_000f64).round() as i64;
    let milliseconds = millis % 1_000;
    millis /= 1_000;
    let seconds = millis % 60;
    millis /= 60;
    let minutes = millis % 60;
    let hours = millis / 60;
    if milliseconds > 0 {
        Ok(format!("{hours:02}:{minutes:02}:{seconds:02}.{milliseconds:03}"))
    } else {
        Ok(format!("{hours:02}:{minutes:02}:{seconds:02}"))
    }
}

fn to_datetime_string(value: &str, is_1904: bool) -> Result<String, RegistrationError> {
    let date = to_date_string(value, is_1904)?;
    let time = to_time_string(value)?;
    Ok(format!("{date} {time}"))
}

/// `PT10H30M05S` to `10:30:05`; unparseable text is kept verbatim.
fn to_duration_string(value: &str) -> String {
    match value.parse::<IsoDuration>() {
        Ok(duration) => format!(
            "{:02}:{:02}:{:02}",
            duration.hour as i64,
            duration.minute as i64,
            duration.second as i64
        ),
        Err(_) => value.to_owned(),
    }
}
