//! End-of-run read model over the paper store, in reporting order.

use crate::models::{CanonicalPaper, Researcher, VenueType};
use crate::store::PaperStore;
use crate::tables::VenueRegistry;

impl PaperStore {
    /// Papers by year (newest first), then venue and title.
    pub fn papers_sorted(&self) -> Vec<&CanonicalPaper> {
        let mut papers: Vec<&CanonicalPaper> = self.papers().collect();
        papers.sort_by(|a, b| {
            (&a.venue, &a.title, &a.identifier).cmp(&(&b.venue, &b.title, &b.identifier))
        });
        papers.sort_by(|a, b| b.year.cmp(&a.year));
        papers
    }

    /// Departments with a positive score, best first; ties by name.
    pub fn department_scores(&self) -> Vec<(&str, f64)> {
        let mut scores: Vec<(&str, f64)> = self
            .scores()
            .iter()
            .filter(|(_, s)| **s > 0.0)
            .map(|(d, s)| (d.as_str(), *s))
            .collect();
        scores.sort_by(|a, b| b.1.total_cmp(&a.1));
        scores
    }

    /// Departments by number of active professors, largest first.
    pub fn department_professor_counts(&self, limit: Option<usize>) -> Vec<(&str, u32)> {
        let mut counts: Vec<(&str, u32)> = self
            .professor_counts()
            .iter()
            .filter(|(_, c)| **c > 0)
            .map(|(d, c)| (d.as_str(), *c))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        if let Some(limit) = limit {
            counts.truncate(limit);
        }
        counts
    }

    /// Active professors sorted by name.
    pub fn professors_sorted(&self) -> Vec<&Researcher> {
        let mut profs: Vec<&Researcher> = self.professors().iter().collect();
        profs.sort_by(|a, b| a.name.cmp(&b.name));
        profs
    }

    /// Stored papers per registry venue of `venue_type`, busiest first.
    ///
    /// Every registry venue is listed, including those without papers.
    pub fn venue_counts<'r>(
        &self,
        registry: &'r VenueRegistry,
        venue_type: VenueType,
    ) -> Vec<(&'r str, usize)> {
        let mut counts: Vec<(&str, usize)> = registry
            .names_of_type(venue_type)
            .into_iter()
            .map(|name| {
                let n = self
                    .papers()
                    .filter(|p| p.venue_type == venue_type && p.venue == name)
                    .count();
                (name, n)
            })
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
    }
}
