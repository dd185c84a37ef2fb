use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Shape of a single field as delivered by a bibliographic source.
///
/// Sources like DBLP emit the same field as a plain element, as an element
/// carrying attributes or nested markup, or repeated several times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawField {
    Text(String),
    Structured {
        text: String,
        attributes: BTreeMap<String, String>,
    },
    List(Vec<RawField>),
}

impl RawField {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Text content of the field; for a list, of its first element.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawField::Text(s) => Some(s),
            RawField::Structured { text, .. } => Some(text),
            RawField::List(items) => items.first().and_then(RawField::as_text),
        }
    }

    /// Text of every element, flattening nested lists.
    pub fn texts(&self) -> Vec<&str> {
        match self {
            RawField::Text(s) => vec![s.as_str()],
            RawField::Structured { text, .. } => vec![text.as_str()],
            RawField::List(items) => items.iter().flat_map(RawField::texts).collect(),
        }
    }

    fn append(self, next: RawField) -> RawField {
        match self {
            RawField::List(mut items) => {
                items.push(next);
                RawField::List(items)
            }
            single => RawField::List(vec![single, next]),
        }
    }
}

/// A parsed, not yet normalized bibliographic record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Record element name, e.g. `article` or `inproceedings`.
    pub kind: String,
    pub fields: BTreeMap<String, RawField>,
}

impl RawRecord {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Adds a field occurrence; repeated names accumulate into a list.
    pub fn insert(&mut self, name: impl Into<String>, value: RawField) {
        let name = name.into();
        let merged = match self.fields.remove(&name) {
            Some(existing) => existing.append(value),
            None => value,
        };
        self.fields.insert(name, merged);
    }

    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.insert(name, RawField::text(value));
        self
    }

    pub fn get(&self, name: &str) -> Option<&RawField> {
        self.fields.get(name)
    }

    fn text_of(&self, name: &str) -> Option<String> {
        self.get(name)
            .and_then(RawField::as_text)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VenueField {
    Journal { name: String, number: Option<String> },
    Proceedings(String),
    Missing,
}

/// One publication of one researcher, normalized once at ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BibliographicEntry {
    pub kind: String,
    pub venue: VenueField,
    pub year: Option<i32>,
    pub title: String,
    pub authors: Vec<String>,
    pub pages: Option<String>,
    pub doi: Option<String>,
    /// Stable per-paper identifier; the aggregation key.
    pub url: Option<String>,
}

/// Record kinds that always carry a journal or book title.
const VENUE_BEARING_KINDS: &[&str] = &["article", "inproceedings", "incollection"];

impl BibliographicEntry {
    pub fn from_raw(raw: &RawRecord) -> Self {
        let venue = if let Some(name) = raw.text_of("journal") {
            VenueField::Journal {
                name,
                number: raw.text_of("number"),
            }
        } else if let Some(booktitle) = raw.text_of("booktitle") {
            VenueField::Proceedings(booktitle)
        } else {
            VenueField::Missing
        };

        Self {
            kind: raw.kind.clone(),
            venue,
            year: raw.text_of("year").and_then(|y| y.parse().ok()),
            title: normalize_title(raw.get("title")),
            authors: normalize_authors(raw.get("author")),
            pages: raw.text_of("pages"),
            doi: normalize_doi(raw.get("ee")),
            url: raw.text_of("url"),
        }
    }

    pub fn expects_venue(&self) -> bool {
        VENUE_BEARING_KINDS.contains(&self.kind.as_str())
    }
}

impl From<&RawRecord> for BibliographicEntry {
    fn from(raw: &RawRecord) -> Self {
        Self::from_raw(raw)
    }
}

pub fn normalize_authors(field: Option<&RawField>) -> Vec<String> {
    field
        .map(|f| {
            f.texts()
                .into_iter()
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

pub fn normalize_title(field: Option<&RawField>) -> String {
    field
        .and_then(RawField::as_text)
        .map(|t| t.replace('"', "").trim().to_string())
        .unwrap_or_default()
}

pub fn normalize_doi(field: Option<&RawField>) -> Option<String> {
    field
        .and_then(RawField::as_text)
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}
