//! Parsing of the `/library/sections` listing.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::types::{CollectionId, Section};

use super::RefreshError;

/// Extract every `<Directory key=".." title="..">` from a section listing.
///
/// Directories missing either attribute are skipped; a non-numeric key is
/// an error.
pub fn parse_sections(xml: &str) -> Result<Vec<Section>, RefreshError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut sections = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e) | Event::Empty(ref e)) if e.name().as_ref() == b"Directory" => {
                if let Some(section) = section_from(e)? {
                    sections.push(section);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(RefreshError::Parse(format!(
                    "at byte {}: {e}",
                    reader.error_position()
                )));
            }
            _ => {}
        }
    }

    Ok(sections)
}

fn section_from(element: &BytesStart<'_>) -> Result<Option<Section>, RefreshError> {
    let mut key = None;
    let mut title = None;

    for attr in element.attributes() {
        let attr = attr.map_err(|e| RefreshError::Parse(e.to_string()))?;
        let value = attr
            .unescape_value()
            .map_err(|e| RefreshError::Parse(e.to_string()))?;

        match attr.key.as_ref() {
            b"key" => key = Some(value.into_owned()),
            b"title" => title = Some(value.into_owned()),
            _ => {}
        }
    }

    let (Some(key), Some(title)) = (key, title) else {
        return Ok(None);
    };

    let key = key
        .parse::<CollectionId>()
        .map_err(|_| RefreshError::Parse(format!("section '{title}' has non-numeric key '{key}'")))?;

    Ok(Some(Section { key, title }))
}
