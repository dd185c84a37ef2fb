//! Papers in multi-area venues that nobody has assigned to an area yet.
//!
//! Cases are kept in memory for the run, deduplicated by identifier, and
//! appended to the triage CSV on flush. Each row starts with an empty area
//! column so a curator can fill it in and move the row into
//! `manual-classification.csv` unchanged.

use std::collections::HashSet;
use std::fs::OpenOptions;
use std::path::PathBuf;

use serde::Serialize;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedCase {
    pub year: i32,
    pub venue: String,
    pub title: String,
    pub identifier: String,
}

#[derive(Debug, Default)]
pub struct TriageLog {
    seen: HashSet<String>,
    cases: Vec<UnresolvedCase>,
    path: Option<PathBuf>,
    flushed: usize,
}

impl TriageLog {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Records a case; returns `false` if the identifier was already logged.
    pub fn record(&mut self, case: UnresolvedCase) -> bool {
        if !self.seen.insert(case.identifier.clone()) {
            return false;
        }
        self.cases.push(case);
        true
    }

    pub fn cases(&self) -> &[UnresolvedCase] {
        &self.cases
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Appends cases recorded since the last flush. Returns how many were written.
    pub fn flush(&mut self) -> Result<usize> {
        let Some(path) = &self.path else {
            return Ok(0);
        };
        let pending = &self.cases[self.flushed..];
        if pending.is_empty() {
            return Ok(0);
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        for case in pending {
            let year = case.year.to_string();
            writer.write_record([
                "",
                year.as_str(),
                case.venue.as_str(),
                case.title.as_str(),
                case.identifier.as_str(),
            ])?;
        }
        writer.flush()?;

        let written = pending.len();
        self.flushed = self.cases.len();
        Ok(written)
    }
}
