use serde::{Deserialize, Serialize};

use super::venue::{Tier, VenueType};

/// Sentinel stored for papers without an open-access counterpart.
pub const NO_LINK: &str = "none";

/// Cross-reference to the open-access (arXiv) version of a paper.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum XrefLink {
    Found(String),
    NotFound,
}

impl XrefLink {
    pub fn as_str(&self) -> &str {
        match self {
            XrefLink::Found(url) => url,
            XrefLink::NotFound => NO_LINK,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, XrefLink::Found(_))
    }
}

impl From<String> for XrefLink {
    fn from(value: String) -> Self {
        if value.is_empty() || value == NO_LINK {
            XrefLink::NotFound
        } else {
            XrefLink::Found(value)
        }
    }
}

impl From<XrefLink> for String {
    fn from(value: XrefLink) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for XrefLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The aggregation unit: one paper, however many researchers list it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalPaper {
    pub identifier: String,
    pub year: i32,
    pub venue: String,
    pub title: String,
    pub departments: Vec<String>,
    pub authors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    pub tier: Tier,
    pub venue_type: VenueType,
    pub xref: XrefLink,
    /// Carried through for reporting; never populated by the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citations: Option<u32>,
}

impl CanonicalPaper {
    pub fn has_department(&self, department: &str) -> bool {
        let wanted = department.replace(' ', "");
        self.departments.iter().any(|d| d.replace(' ', "") == wanted)
    }

    /// Departments as the `;`-separated attribution string.
    pub fn department_attribution(&self) -> String {
        self.departments.join("; ")
    }

    /// Title as rendered in exported tables; the stored title has no `"`.
    pub fn quoted_title(&self) -> String {
        format!("\"{}\"", self.title)
    }
}

/// One line of the researcher roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Researcher {
    pub name: String,
    pub department: String,
    /// DBLP person identifier, e.g. `123/4567`.
    pub pid: String,
}

impl Researcher {
    pub fn new(name: impl Into<String>, department: impl Into<String>, pid: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            department: department.into(),
            pid: pid.into(),
        }
    }

    /// File-name form of the researcher's name (`Ana Maria` → `Ana-Maria`).
    pub fn file_stem(&self) -> String {
        self.name.replace(' ', "-")
    }
}
