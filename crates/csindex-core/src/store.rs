//! The run's single mutable catalogue of accepted papers.
//!
//! Papers are keyed by their stable identifier. Department scores are
//! tracked per (paper, department) pair: every department that contributes a
//! paper is credited with the venue's base score exactly once.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::trace;

use crate::error::{IndexError, Result};
use crate::models::{BibliographicEntry, CanonicalPaper, Researcher, Weight};
use crate::policy::Classification;
use crate::xref::LinkResolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribution {
    Created,
    Merged,
    AlreadyAttributed,
}

#[derive(Debug, Default)]
pub struct PaperStore {
    papers: HashMap<String, CanonicalPaper>,
    scores: BTreeMap<String, f64>,
    professor_counts: BTreeMap<String, u32>,
    professors: Vec<Researcher>,
}

impl PaperStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the score and professor-count slots of a department.
    pub fn ensure_department(&mut self, department: &str) {
        self.scores.entry(department.to_string()).or_insert(0.0);
        self.professor_counts
            .entry(department.to_string())
            .or_insert(0);
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.papers.contains_key(identifier)
    }

    pub fn get(&self, identifier: &str) -> Option<&CanonicalPaper> {
        self.papers.get(identifier)
    }

    pub fn papers(&self) -> impl Iterator<Item = &CanonicalPaper> {
        self.papers.values()
    }

    pub fn len(&self) -> usize {
        self.papers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.papers.is_empty()
    }

    pub fn score(&self, department: &str) -> f64 {
        self.scores.get(department).copied().unwrap_or(0.0)
    }

    pub fn scores(&self) -> &BTreeMap<String, f64> {
        &self.scores
    }

    pub fn professor_counts(&self) -> &BTreeMap<String, u32> {
        &self.professor_counts
    }

    pub fn professors(&self) -> &[Researcher] {
        &self.professors
    }

    /// Records the first sighting of a paper and credits `department`.
    ///
    /// The cross-reference link is resolved here, once per paper. A paper
    /// that is already stored is merged instead.
    pub async fn add_new_paper<R>(
        &mut self,
        classification: &Classification,
        entry: &BibliographicEntry,
        department: &str,
        resolver: &mut R,
    ) -> Result<Attribution>
    where
        R: LinkResolver + ?Sized,
    {
        if self.contains(&classification.identifier) {
            return self.merge(&classification.identifier, department, classification.weight);
        }

        let xref = resolver.resolve(entry.doi.as_deref(), &entry.title).await;
        let paper = CanonicalPaper {
            identifier: classification.identifier.clone(),
            year: classification.year,
            venue: classification.venue.clone(),
            title: entry.title.clone(),
            departments: vec![department.to_string()],
            authors: entry.authors.clone(),
            doi: entry.doi.clone(),
            tier: classification.tier,
            venue_type: classification.venue_type,
            xref,
            citations: None,
        };
        trace!("new paper {} ({})", paper.identifier, paper.venue);
        self.papers.insert(paper.identifier.clone(), paper);
        self.credit(department, classification.weight);
        Ok(Attribution::Created)
    }

    /// Attributes a stored paper to one more department.
    ///
    /// Idempotent: a department already on the paper is neither appended
    /// again nor credited again.
    pub fn merge(&mut self, identifier: &str, department: &str, weight: Weight) -> Result<Attribution> {
        let paper = self
            .papers
            .get_mut(identifier)
            .ok_or_else(|| IndexError::PaperNotFound(identifier.to_string()))?;
        if paper.has_department(department) {
            return Ok(Attribution::AlreadyAttributed);
        }
        paper.departments.push(department.to_string());
        self.credit(department, weight);
        Ok(Attribution::Merged)
    }

    /// Registers a researcher with at least one accepted paper.
    pub fn register_professor(&mut self, researcher: &Researcher) {
        *self
            .professor_counts
            .entry(researcher.department.clone())
            .or_insert(0) += 1;
        self.professors.push(researcher.clone());
    }

    fn credit(&mut self, department: &str, weight: Weight) {
        *self.scores.entry(department.to_string()).or_insert(0.0) += weight.base_score();
    }
}
