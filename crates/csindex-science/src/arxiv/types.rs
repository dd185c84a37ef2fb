use serde::{Deserialize, Serialize};

/// One page of an arXiv query, reduced to what link resolution needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArxivFeed {
    /// Total hits reported by the API, not the number of entries returned.
    pub total_results: u32,
    pub entries: Vec<ArxivEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArxivEntry {
    /// Abstract page URL, e.g. `http://arxiv.org/abs/2101.00001v2`.
    pub id: String,
    pub title: String,
}

impl ArxivFeed {
    /// The single entry of an unambiguous answer.
    pub fn unique_entry(&self) -> Option<&ArxivEntry> {
        if self.total_results == 1 {
            self.entries.first()
        } else {
            None
        }
    }
}
