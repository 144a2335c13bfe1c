//! Workbook fixtures written on the fly for tests.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Writes a zip container with the given `(part, body)` entries.
pub(crate) fn write_zip(dir: &Path, name: &str, parts: &[(String, String)]) -> PathBuf {
    let path = dir.join(name);
    let mut writer = ZipWriter::new(File::create(&path).unwrap());
    for (part, body) in parts {
        writer.start_file(part.as_str(), SimpleFileOptions::default()).unwrap();
        writer.write_all(body.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
    path
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Workbook, relationship and worksheet parts for `(sheet name, sheet xml)`
/// pairs. Styles and shared strings are left to the caller.
pub(crate) fn xlsx_parts(sheets: &[(&str, &str)]) -> Vec<(String, String)> {
    let mut workbook = String::from("<workbook><workbookPr/><sheets>");
    let mut relationships = String::from("<Relationships>");
    let mut parts = Vec::new();
    for (index, (name, xml)) in sheets.iter().enumerate() {
        let id = index + 1;
        workbook.push_str(&format!(r#"<sheet name="{}" sheetId="{id}" r:id="rId{id}"/>"#, escape(name)));
        relationships.push_str(&format!(
            r#"<Relationship Id="rId{id}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{id}.xml"/>"#
        ));
        parts.push((format!("xl/worksheets/sheet{id}.xml"), xml.to_string()));
    }
    workbook.push_str("</sheets></workbook>");
    relationships.push_str("</Relationships>");
    parts.push(("xl/workbook.xml".to_owned(), workbook));
    parts.push(("xl/_rels/workbook.xml.rels".to_owned(), relationships));
    parts
}

/// Single-sheet xlsx whose cells are all inline strings; `""` leaves the
/// cell out.
pub(crate) fn write_xlsx<S: AsRef<str>>(dir: &Path, name: &str, rows: &[Vec<S>]) -> PathBuf {
    let mut sheet = String::from("<worksheet><sheetData>");
    for (row, cells) in rows.iter().enumerate() {
        sheet.push_str(&format!(r#"<row r="{}">"#, row + 1));
        for (col, text) in cells.iter().enumerate() {
            let text = text.as_ref();
            if !text.is_empty() {
                let reference = crate::spreadsheet::reference::index_to_reference(row, col);
                sheet.push_str(&format!(
                    r#"<c r="{reference}" t="inlineStr"><is><t>{}</t></is></c>"#,
                    escape(text)
                ));
            }
        }
        sheet.push_str("</row>");
    }
    sheet.push_str("</sheetData></worksheet>");
    write_zip(dir, name, &xlsx_parts(&[("Sheet1", &sheet)]))
}

/// `content.xml` wrapping the given table elements.
pub(crate) fn ods_content(tables: &str) -> String {
    format!(
        "<office:document-content><office:body><office:spreadsheet>{tables}</office:spreadsheet></office:body></office:document-content>"
    )
}

/// Single-table ods whose cells are all strings.
pub(crate) fn write_ods<S: AsRef<str>>(dir: &Path, name: &str, rows: &[Vec<S>]) -> PathBuf {
    let mut table = String::from(r#"<table:table table:name="Sheet1">"#);
    for cells in rows {
        table.push_str("<table:table-row>");
        for text in cells {
            let text = text.as_ref();
            if text.is_empty() {
                table.push_str("<table:table-cell/>");
            } else {
                table.push_str(&format!(
                    r#"<table:table-cell office:value-type="string"><text:p>{}</text:p></table:table-cell>"#,
                    escape(text)
                ));
            }
        }
        table.push_str("</table:table-row>");
    }
    table.push_str("</table:table>");
    write_zip(
        dir,
        name,
        &[
            ("mimetype".to_owned(), "application/vnd.oasis.opendocument.spreadsheet".to_owned()),
            ("content.xml".to_owned(), ods_content(&table)),
        ],
    )
}
