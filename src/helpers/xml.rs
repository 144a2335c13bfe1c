//! Streaming XML access for the XML parts of workbook containers
//! (`xl/*.xml` in Office Open XML, `content.xml` in OpenDocument).

use crate::error::RegistrationError;
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::BytesRef;
use quick_xml::events::BytesStart;
use quick_xml::events::BytesText;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::borrow::Cow;
use std::io::BufRead;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while decoding XML content.
#[derive(Error, Debug)]
pub enum XmlError {
    #[error("Unknown XML entity '&{0};'")]
    UnknownEntity(String),

    #[error("Cannot parse attribute value '{0}'")]
    AttributeValue(String),
}

/// Pull reader over one XML part, reusing a single event buffer.
pub(crate) struct XmlReader<R: BufRead> {
    reader: Reader<R>,
    buffer: Vec<u8>,
}

impl<R: BufRead> XmlReader<R> {
    pub(crate) fn new(source: R) -> XmlReader<R> {
        let mut reader = Reader::from_reader(source);
        let config = reader.config_mut();
        config.check_comments = false;
        config.check_end_names = false;
        // `<c r="A1"/>` must produce Start + End so cell state resets uniformly
        config.expand_empty_elements = true;
        config.trim_text(false);
        XmlReader {
            reader,
            buffer: Vec::with_capacity(1024),
        }
    }

    /// Next event, or `None` at end of document.
    pub(crate) fn next(&'_ mut self) -> Result<Option<Event<'_>>, RegistrationError> {
        self.buffer.clear();
        match self.reader.read_event_into(&mut self.buffer)? {
            Event::Eof => Ok(None),
            event => Ok(Some(event)),
        }
    }
}

pub(crate) trait XmlAttributeHelper<'a> {
    fn get_value(&self) -> Result<Cow<'a, str>, RegistrationError>;

    fn parse_value<T: FromStr>(&self) -> Result<T, RegistrationError>;
}

impl<'a> XmlAttributeHelper<'a> for Attribute<'a> {
    fn get_value(&self) -> Result<Cow<'a, str>, RegistrationError> {
        Ok(self.unescape_value()?)
    }

    fn parse_value<T: FromStr>(&self) -> Result<T, RegistrationError> {
        let value = self.get_value()?;
        value
            .parse()
            .map_err(|_| XmlError::AttributeValue(value.to_string()).into())
    }
}

/// Attribute lookup on start tags.
pub(crate) trait XmlNodeHelper<'a> {
    fn get_attribute_value(&'a self, name: &str) -> Result<Option<Cow<'a, str>>, RegistrationError>;

    fn parse_attribute_value<T: FromStr>(&self, name: &str) -> Result<Option<T>, RegistrationError>;
}

impl<'a> XmlNodeHelper<'a> for BytesStart<'a> {
    fn get_attribute_value(&'a self, name: &str) -> Result<Option<Cow<'a, str>>, RegistrationError> {
        self.try_get_attribute(name)?
            .map(|attribute| attribute.get_value())
            .transpose()
    }

    fn parse_attribute_value<T: FromStr>(&self, name: &str) -> Result<Option<T>, RegistrationError> {
        self.try_get_attribute(name)?
            .map(|attribute| attribute.parse_value())
            .transpose()
    }
}

/// Accumulates character data split across text and reference events.
pub(crate) trait XmlTextContextHelper {
    fn push_bytes_text(&mut self, text: &BytesText) -> Result<(), RegistrationError>;

    fn push_bytes_ref(&mut self, bytes: &BytesRef) -> Result<(), RegistrationError>;
}

impl XmlTextContextHelper for String {
    fn push_bytes_text(&mut self, text: &BytesText) -> Result<(), RegistrationError> {
        self.push_str(&text.xml_content()?);
        Ok(())
    }

    /// Resolves `&#NN;`, `&#xNN;` and the predefined named entities.
    fn push_bytes_ref(&mut self, bytes: &BytesRef) -> Result<(), RegistrationError> {
        let raw = bytes.xml_content()?;
        let resolved = match raw.strip_prefix('#') {
            Some(hex) if hex.starts_with('x') || hex.starts_with('X') => {
                char::from_u32(u32::from_str_radix(&hex[1..], 16)?)
            }
            Some(decimal) => char::from_u32(decimal.parse::<u32>()?),
            None => match resolve_xml_entity(&raw) {
                Some(entity) => {
                    self.push_str(entity);
                    return Ok(());
                }
                None => Err(XmlError::UnknownEntity(raw.to_string()))?,
            },
        };
        if let Some(character) = resolved {
            self.push(character);
        }
        Ok(())
    }
}

/// Drives an [`XmlReader`] to the end of its document, dispatching each event
/// to the given match arms. Unmatched events are ignored; `break` stops early.
#[macro_export]
macro_rules! each_xml_event {
    ($reader:expr => { $($arms:tt)* }) => {
        while let Some(event) = $reader.next()? {
            match event {
                $($arms)*
                _ => (),
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn collect_text(xml: &str) -> Result<String, RegistrationError> {
        let mut reader = XmlReader::new(Cursor::new(xml.as_bytes().to_vec()));
        let mut text = String::new();
        each_xml_event!(reader => {
            Event::Text(event) => text.push_bytes_text(&event)?,
            Event::GeneralRef(event) => text.push_bytes_ref(&event)?,
        });
        Ok(text)
    }

    #[test]
    fn resolves_entities_and_character_references() {
        let text = collect_text("<t>Goods &amp; Passenger &#65;&#x42;</t>").unwrap();
        assert_eq!(text, "Goods & Passenger AB");
    }

    #[test]
    fn rejects_unknown_entities() {
        assert!(collect_text("<t>&bogus;</t>").is_err());
    }

    #[test]
    fn parses_typed_attribute_values() -> Result<(), RegistrationError> {
        let mut reader = XmlReader::new(Cursor::new(b"<row spans=\"3\" r=\"x\"/>".to_vec()));
        let mut spans = None;
        let mut invalid = false;
        each_xml_event!(reader => {
            Event::Start(event) => {
                spans = event.parse_attribute_value::<usize>("spans")?;
                invalid = event.parse_attribute_value::<usize>("r").is_err();
            }
        });
        assert_eq!(spans, Some(3));
        assert!(invalid);
        Ok(())
    }
}
