//! One-level field-map flattening for catalog XML responses.
//!
//! Every response the catalog serves has the same shape: a document root
//! whose children are records (`<Series>`, `<Episode>`, `<Banner>`, ...) and
//! whose grandchildren are scalar fields. The parser flattens exactly that:
//! each record becomes a map of lower-cased tag name to trimmed text, and
//! anything nested deeper is ignored.

use std::collections::HashMap;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::CatalogError;

/// Flattened fields of one record element. Empty and whitespace-only
/// elements are treated as absent.
#[derive(Debug, Clone, Default)]
pub struct FieldMap {
    fields: HashMap<String, String>,
}

impl FieldMap {
    pub fn text(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn string(&self, key: &str) -> Option<String> {
        self.text(key).map(str::to_owned)
    }

    pub fn int(&self, key: &str) -> Option<i64> {
        self.text(key).and_then(|v| v.parse().ok())
    }

    pub fn float(&self, key: &str) -> Option<f64> {
        self.text(key).and_then(|v| v.parse().ok())
    }

    #[cfg(test)]
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self {
            fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

/// Parse a response body into `(record tag, fields)` pairs, one per child
/// of the document root, in document order. Tag names are lower-cased.
///
/// A well-formed document with no records returns an empty vec; callers
/// decide whether that means "not found". Syntactically broken input is a
/// malformed-response error.
pub fn child_field_maps(body: &[u8]) -> Result<Vec<(String, FieldMap)>, CatalogError> {
    let mut reader = Reader::from_reader(body);
    let mut buf = Vec::new();

    let mut depth = 0usize;
    let mut saw_root = false;
    let mut records: Vec<(String, FieldMap)> = Vec::new();
    let mut field_tag: Option<String> = None;
    let mut field_value = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                depth += 1;
                match depth {
                    1 => saw_root = true,
                    2 => records.push((tag_name(e.name().as_ref()), FieldMap::default())),
                    3 => {
                        field_tag = Some(tag_name(e.name().as_ref()));
                        field_value.clear();
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => match depth {
                0 => saw_root = true,
                1 => records.push((tag_name(e.name().as_ref()), FieldMap::default())),
                // An empty field element carries no text: the field stays
                // absent. Deeper empties are ignored like other nesting.
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if depth == 3 && field_tag.is_some() {
                    let text = e
                        .unescape()
                        .map_err(|err| CatalogError::Malformed(err.to_string()))?;
                    field_value.push_str(&text);
                }
            }
            Ok(Event::CData(e)) => {
                if depth == 3 && field_tag.is_some() {
                    field_value.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::End(_)) => {
                if depth == 3 {
                    if let (Some(tag), Some((_, fields))) = (field_tag.take(), records.last_mut())
                    {
                        let value = field_value.trim();
                        if !value.is_empty() {
                            fields.fields.insert(tag, value.to_string());
                        }
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => return Err(CatalogError::Malformed(err.to_string())),
        }
        buf.clear();
    }

    if !saw_root || depth != 0 {
        return Err(CatalogError::Malformed("truncated document".to_string()));
    }

    Ok(records)
}

fn tag_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_ascii_lowercase()
}
