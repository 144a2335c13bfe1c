use crate::each_xml_event;
use crate::error::RegistrationError;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlTextContextHelper;
use crate::helpers::zip::ZipHelper;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::grid::RawGrid;
use crate::spreadsheet::grid::Sheet;
use crate::spreadsheet::selector::SheetSelector;
use crate::spreadsheet::Spreadsheet;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use std::path::Path;
use tracing::debug;
use zip::ZipArchive;

const MIME_TYPE: &[u8] = b"application/vnd.oasis.opendocument.spreadsheet";
const SPREADSHEET: QName = QName(b"office:spreadsheet");
const TABLE: QName = QName(b"table:table");
const TABLE_ROW: QName = QName(b"table:table-row");
const TABLE_CELL: QName = QName(b"table:table-cell");
/// Cell hidden under a merged range
const TABLE_COVERED_CELL: QName = QName(b"table:covered-table-cell");
const ANNOTATION: QName = QName(b"office:annotation");
const PARAGRAPH: QName = QName(b"text:p");
/// Run of `text:c` spaces
const SPACES: QName = QName(b"text:s");
const FILE_ENTRY: QName = QName(b"manifest:file-entry");
const ENCRYPTION_DATA: QName = QName(b"manifest:encryption-data");

/// Repeat counts above this only describe formatting padding to the end of
/// the sheet; such cells and rows never carry values worth expanding.
const MAX_REPEAT: usize = 1 << 14;

/// An OpenDocument spreadsheet (.ods).
pub(crate) struct OdsSpreadsheet {
    name: String,
    zip: ZipArchive<BufReader<File>>,
}

impl OdsSpreadsheet {
    pub(crate) fn open(path: &Path) -> Result<Self, RegistrationError> {
        let name = path.display().to_string();
        let file = File::open(path)?;
        let mut zip = ZipArchive::new(BufReader::new(file))?;
        check_mime(&mut zip, &name)?;
        if is_password_protected(&mut zip)? {
            Err(SpreadsheetError::PasswordProtected(name.to_owned()))?;
        }
        Ok(OdsSpreadsheet { name, zip })
    }
}

impl Spreadsheet for OdsSpreadsheet {
    fn name(&self) -> &str {
        &self.name
    }

    fn sheet_names(&mut self) -> Result<Vec<String>, RegistrationError> {
        let mut names = Vec::new();
        let mut reader = self
            .zip
            .xml_reader("content.xml")?
            .ok_or_else(|| SpreadsheetError::FileError("content.xml".to_owned()))?;
        each_xml_event!(reader => {
            Event::End(event) if event.name() == SPREADSHEET => break,
            Event::Start(event) if event.name() == TABLE => {
                if let Some(name) = event.get_attribute_value("table:name")? {
                    names.push(name.into_owned());
                }
            }
        });
        Ok(names)
    }

    fn read_grid(&mut self, selector: &SheetSelector) -> Result<RawGrid, RegistrationError> {
        let mut reader = self
            .zip
            .xml_reader("content.xml")?
            .ok_or_else(|| SpreadsheetError::FileError("content.xml".to_owned()))?;

        let mut found = None::<String>;
        each_xml_event!(reader => {
            Event::End(event) if event.name() == SPREADSHEET => break,
            Event::Start(event) if event.name() == TABLE => {
                let table_name = event.get_attribute_value("table:name")?.unwrap_or_default();
                if selector.accept(&table_name) {
                    found = Some(table_name.into_owned());
                    break;
                }
            }
        });
        let Some(sheet_name) = found else {
            drop(reader);
            return Err(self.sheet_not_found(selector));
        };

        let mut sheet = Sheet::new();
        let mut row = 0usize;
        let mut col = 0usize;
        let mut row_count = 1usize;
        let mut col_count = 1usize;
        let mut cell = Cell {
            row: 0,
            col: 0,
            kind: CellType::default(),
            value: String::new(),
        };
        let mut text_context = false;
        let mut comment_context = false;
        let mut paragraph_context = false;
        each_xml_event!(reader => {
            Event::End(event) if event.name() == TABLE => break,
            Event::Start(event) if event.name() == TABLE_ROW => {
                row_count = event.parse_attribute_value("table:number-rows-repeated")?.unwrap_or(1);
                col = 0;
            }
            Event::End(event) if event.name() == TABLE_ROW => row = row.saturating_add(row_count),
            Event::Start(event) if event.name() == TABLE_CELL || event.name() == TABLE_COVERED_CELL => {
                cell.value.clear();
                (cell.row, cell.col) = (row, col);
                col_count = event.parse_attribute_value("table:number-columns-repeated")?.unwrap_or(1);
                let value_type = event.get_attribute_value("office:value-type")?;
                let is_error = event
                    .get_attribute_value("calcext:value-type")?
                    .map(|kind| kind == "error")
                    .unwrap_or(false);
                cell.kind = match value_type.as_deref() {
                    None => CellType::Empty,
                    Some(_) if is_error => CellType::Error,
                    Some("string") => CellType::InlineString,
                    Some("boolean") => CellType::Boolean,
                    Some("date") => CellType::IsoDateTime,
                    Some("time") => CellType::IsoDuration,
                    Some(_) => CellType::Number,
                };
                let attribute = match cell.kind {
                    CellType::Boolean => Some("office:boolean-value"),
                    CellType::IsoDateTime => Some("office:date-value"),
                    CellType::IsoDuration => Some("office:time-value"),
                    CellType::Number => Some("office:value"),
                    _ => None,
                };
                if let Some(attribute) = attribute {
                    if let Some(data) = event.get_attribute_value(attribute)? {
                        cell.value.push_str(&data);
                    }
                }
                text_context = cell.kind == CellType::InlineString;
            }
            Event::End(event) if event.name() == TABLE_CELL || event.name() == TABLE_COVERED_CELL => {
                if cell.kind != CellType::Empty && !cell.value.is_empty() {
                    let value = cell.to_value(&[])?;
                    let repeats = row_count
                        .min(MAX_REPEAT)
                        .checked_mul(col_count.min(MAX_REPEAT))
                        .unwrap_or(usize::MAX);
                    sheet.reserve(repeats)?;
                    for row_offset in 0..row_count.min(MAX_REPEAT) {
                        for col_offset in 0..col_count.min(MAX_REPEAT) {
                            sheet.push(row.saturating_add(row_offset), col.saturating_add(col_offset), value.clone())?;
                        }
                    }
                }
                col = col.saturating_add(col_count);
                text_context = false;
                comment_context = false;
                paragraph_context = false;
            }
            Event::Start(event) if text_context && event.name() == ANNOTATION => comment_context = true,
            Event::End(event) if text_context && event.name() == ANNOTATION => comment_context = false,
            Event::Start(event) if text_context && !comment_context && event.name() == PARAGRAPH => {
                if !cell.value.is_empty() {
                    cell.value.push('\n');
                }
                paragraph_context = true;
            }
            Event::End(event) if paragraph_context && event.name() == PARAGRAPH => paragraph_context = false,
            Event::Start(event) if paragraph_context && event.name() == SPACES => {
                let count = event.parse_attribute_value("text:c")?.unwrap_or(1usize);
                cell.value.push_str(&" ".repeat(count));
            }
            Event::Text(event) if paragraph_context => cell.value.push_bytes_text(&event)?,
            Event::GeneralRef(event) if paragraph_context => cell.value.push_bytes_ref(&event)?,
        });

        let grid = sheet.finish();
        debug!(file = %self.name, sheet = %sheet_name, rows = grid.row_count(), "Read ods table");
        Ok(grid)
    }
}

/// The `mimetype` part, when present, must name an OpenDocument spreadsheet.
fn check_mime<RS: Read + Seek>(zip: &mut ZipArchive<RS>, name: &str) -> Result<(), RegistrationError> {
    if let Some(file) = &mut zip.file("mimetype")? {
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;
        if buffer.trim_ascii() != MIME_TYPE {
            Err(SpreadsheetError::MimeType(name.to_owned()))?;
        }
    }
    Ok(())
}

fn is_password_protected<RS: Read + Seek>(zip: &mut ZipArchive<RS>) -> Result<bool, RegistrationError> {
    let Some(mut reader) = zip.xml_reader("META-INF/manifest.xml")? else {
        return Ok(false);
    };
    let mut in_file_entry = false;
    each_xml_event!(reader => {
        Event::Start(event) if event.name() == FILE_ENTRY => in_file_entry = true,
        Event::End(event) if event.name() == FILE_ENTRY => in_file_entry = false,
        Event::Start(event) if in_file_entry && event.name() == ENCRYPTION_DATA => return Ok(true),
    });
    Ok(false)
}
