use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::{IndexError, Result};
use crate::models::{RawRecord, Researcher};

/// Supplies the raw publication records of one researcher at a time.
#[async_trait]
pub trait BibliographySource: Send {
    async fn records(&mut self, researcher: &Researcher) -> Result<Vec<RawRecord>>;
}

/// Records held in memory, keyed by researcher pid.
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    records: HashMap<String, Vec<RawRecord>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pid: impl Into<String>, records: Vec<RawRecord>) {
        self.records.insert(pid.into(), records);
    }
}

#[async_trait]
impl BibliographySource for MemorySource {
    async fn records(&mut self, researcher: &Researcher) -> Result<Vec<RawRecord>> {
        self.records
            .get(&researcher.pid)
            .cloned()
            .ok_or_else(|| IndexError::SourceUnavailable {
                researcher: researcher.name.clone(),
                reason: format!("no records for pid {}", researcher.pid),
            })
    }
}
