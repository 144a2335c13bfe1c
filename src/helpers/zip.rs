//! Lookup of parts inside workbook zip containers.

use crate::error::RegistrationError;
use crate::helpers::xml::XmlReader;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use zip::read::ZipFile;
use zip::result::ZipError;
use zip::ZipArchive;

pub(crate) trait ZipHelper<RS: Read + Seek> {
    /// Part by name; matching ignores ASCII case and accepts `\` separators
    /// written by some producers.
    fn file(&'_ mut self, name: &str) -> Result<Option<ZipFile<'_, RS>>, RegistrationError>;

    fn xml_reader(
        &'_ mut self,
        name: &str,
    ) -> Result<Option<XmlReader<BufReader<ZipFile<'_, RS>>>>, RegistrationError>;
}

impl<RS: Read + Seek> ZipHelper<RS> for ZipArchive<RS> {
    fn file(&'_ mut self, name: &str) -> Result<Option<ZipFile<'_, RS>>, RegistrationError> {
        let wanted = name.replace('\\', "/");
        let stored = self
            .file_names()
            .find(|candidate| candidate.replace('\\', "/").eq_ignore_ascii_case(&wanted))
            .map(str::to_owned);
        let Some(stored) = stored else {
            return Ok(None);
        };
        match self.by_name(&stored) {
            Ok(file) => Ok(Some(file)),
            Err(ZipError::FileNotFound) => Ok(None),
            Err(error) => Err(error)?,
        }
    }

    fn xml_reader(
        &'_ mut self,
        name: &str,
    ) -> Result<Option<XmlReader<BufReader<ZipFile<'_, RS>>>>, RegistrationError> {
        Ok(self
            .file(name)?
            .map(|file| XmlReader::new(BufReader::new(file))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn archive(entries: &[(&str, &str)]) -> ZipArchive<Cursor<Vec<u8>>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        let cursor = writer.finish().unwrap();
        ZipArchive::new(Cursor::new(cursor.into_inner())).unwrap()
    }

    #[test]
    fn finds_parts_ignoring_case_and_separator() {
        let mut zip = archive(&[("xl\\Workbook.xml", "<workbook/>")]);
        let mut body = String::new();
        zip.file("xl/workbook.xml").unwrap().unwrap().read_to_string(&mut body).unwrap();
        assert_eq!(body, "<workbook/>");
    }

    #[test]
    fn missing_part_is_none() {
        let mut zip = archive(&[("content.xml", "<x/>")]);
        assert!(zip.file("mimetype").unwrap().is_none());
        assert!(zip.xml_reader("styles.xml").unwrap().is_none());
    }
}
