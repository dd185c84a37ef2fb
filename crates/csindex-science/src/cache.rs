use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use csindex_core::XrefLink;
use tracing::debug;

use crate::error::Result;

// ─── LinkCache ────────────────────────────────────────────────────────────────

/// DOI → preprint link memo, persisted as a headerless two-column
/// `doi,link` CSV.
///
/// Negative answers are cached too (as `none`), so a DOI is looked up at
/// most once across runs.
#[derive(Debug, Default)]
pub struct LinkCache {
    entries: BTreeMap<String, XrefLink>,
    path: Option<PathBuf>,
    dirty: bool,
}

impl LinkCache {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Loads the cache at `path`; a missing file starts an empty cache
    /// that will be written there on flush. A leading `doi,link` header
    /// row is skipped.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut entries = BTreeMap::new();
        if path.exists() {
            let mut reader = csv::ReaderBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_path(&path)?;
            for (i, row) in reader.records().enumerate() {
                let row = row?;
                let doi = row.get(0).unwrap_or_default().trim();
                if doi.is_empty() || (i == 0 && doi == "doi" && row.get(1) == Some("link")) {
                    continue;
                }
                let link = row.get(1).unwrap_or_default().trim();
                entries.insert(doi.to_string(), XrefLink::from(link.to_string()));
            }
            debug!("loaded {} cached links from {}", entries.len(), path.display());
        }
        Ok(Self {
            entries,
            path: Some(path),
            dirty: false,
        })
    }

    pub fn get(&self, doi: &str) -> Option<&XrefLink> {
        self.entries.get(doi)
    }

    pub fn insert(&mut self, doi: impl Into<String>, link: XrefLink) {
        self.entries.insert(doi.into(), link);
        self.dirty = true;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes the whole cache back when it changed. An empty cache is never
    /// written, so a failed first run does not leave a header-only file.
    pub fn flush(&mut self) -> Result<bool> {
        let Some(path) = &self.path else {
            return Ok(false);
        };
        if !self.dirty || self.entries.is_empty() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
        for (doi, link) in &self.entries {
            writer.write_record([doi.as_str(), link.as_str()])?;
        }
        writer.flush()?;
        self.dirty = false;
        debug!("wrote {} cached links to {}", self.entries.len(), path.display());
        Ok(true)
    }
}
