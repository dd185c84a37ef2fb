//! Decides whether a bibliographic entry counts toward the index.
//!
//! Gates run in a fixed order and the first failing gate rejects the entry:
//! venue presence, year window, venue registry, black list, manual area
//! classification, page count.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::config::RunConfig;
use crate::error::{IndexError, Result};
use crate::models::{BibliographicEntry, Tier, VenueField, VenueType, Weight};
use crate::tables::PolicyTables;
use crate::triage::{TriageLog, UnresolvedCase};

static PAGE_DELIMITER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-:]").unwrap());

/// Read-only inputs of the policy for one research area.
#[derive(Debug, Clone)]
pub struct PolicyContext {
    pub area: String,
    pub first_year: i32,
    pub last_year: i32,
    pub tables: PolicyTables,
    pub umbrella_journals: HashSet<String>,
    pub unpaged_venues: HashSet<String>,
    pub nominal_pages: i32,
}

impl PolicyContext {
    pub fn new(config: &RunConfig, tables: PolicyTables) -> Self {
        Self {
            area: config.run.area.clone(),
            first_year: config.run.first_year,
            last_year: config.run.last_year,
            tables,
            umbrella_journals: config.policy.umbrella_journals.iter().cloned().collect(),
            unpaged_venues: config.policy.unpaged_venues.iter().cloned().collect(),
            nominal_pages: config.policy.nominal_pages,
        }
    }
}

/// Outcome for an indexable entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub identifier: String,
    pub year: i32,
    /// Registry key the venue was resolved to.
    pub venue_key: String,
    /// Canonical venue name from the registry.
    pub venue: String,
    pub weight: Weight,
    pub tier: Tier,
    pub venue_type: VenueType,
    pub pages: i32,
    pub min_pages: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Rejection {
    NoVenue,
    OutOfWindow { year: Option<i32> },
    UnknownVenue { venue: String },
    BlackListed,
    OtherArea { area: String },
    AwaitingClassification,
    TooShort { pages: i32, min_pages: i32 },
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Rejection::NoVenue => "no venue".to_string(),
            Rejection::OutOfWindow { year: Some(y) } => format!("year {y} outside window"),
            Rejection::OutOfWindow { year: None } => "no usable year".to_string(),
            Rejection::UnknownVenue { venue } => format!("venue {venue:?} not indexed"),
            Rejection::BlackListed => "black-listed".to_string(),
            Rejection::OtherArea { area } => format!("classified to area {area}"),
            Rejection::AwaitingClassification => "awaiting manual classification".to_string(),
            Rejection::TooShort { pages, min_pages } => {
                format!("{pages} pages, {min_pages} required")
            }
        };
        f.pad(&text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Accepted(Classification),
    Rejected(Rejection),
}

impl Decision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Decision::Accepted(_))
    }
}

pub struct ClassificationPolicy<'a> {
    ctx: &'a PolicyContext,
}

impl<'a> ClassificationPolicy<'a> {
    pub fn new(ctx: &'a PolicyContext) -> Self {
        Self { ctx }
    }

    /// Runs every gate over `entry`.
    ///
    /// Unclassified entries in multi-area venues are recorded in `triage`.
    /// Errors only for records the source should never have produced.
    pub fn evaluate(&self, entry: &BibliographicEntry, triage: &mut TriageLog) -> Result<Decision> {
        let Some(venue_key) = self.venue_key(entry) else {
            if entry.expects_venue() {
                return Err(IndexError::MalformedSource(format!(
                    "{} record without journal or booktitle: {:?}",
                    entry.kind, entry.title
                )));
            }
            return Ok(Decision::Rejected(Rejection::NoVenue));
        };

        let year = match entry.year {
            Some(y) if (self.ctx.first_year..=self.ctx.last_year).contains(&y) => y,
            other => return Ok(Decision::Rejected(Rejection::OutOfWindow { year: other })),
        };

        let Some(info) = self.ctx.tables.registry.get(&venue_key) else {
            return Ok(Decision::Rejected(Rejection::UnknownVenue { venue: venue_key }));
        };

        let Some(identifier) = entry.url.clone() else {
            return Err(IndexError::MalformedSource(format!(
                "indexable record without url: {:?}",
                entry.title
            )));
        };

        if self.ctx.tables.black_list.contains(&identifier) {
            return Ok(Decision::Rejected(Rejection::BlackListed));
        }

        if self.ctx.tables.manual_journals.contains(&venue_key) {
            match self.ctx.tables.manual_classification.get(&identifier) {
                Some(area) if *area != self.ctx.area => {
                    return Ok(Decision::Rejected(Rejection::OtherArea { area: area.clone() }));
                }
                Some(_) => {}
                None => {
                    triage.record(UnresolvedCase {
                        year,
                        venue: venue_key,
                        title: entry.title.clone(),
                        identifier,
                    });
                    return Ok(Decision::Rejected(Rejection::AwaitingClassification));
                }
            }
        }

        let weight = info.weight;
        let pages = self.paper_size(&identifier, entry, &venue_key);
        let min_pages = weight.min_pages(self.ctx.tables.default_min_pages);
        if pages < min_pages {
            return Ok(Decision::Rejected(Rejection::TooShort { pages, min_pages }));
        }

        Ok(Decision::Accepted(Classification {
            identifier,
            year,
            venue: info.name.clone(),
            venue_key,
            weight,
            tier: weight.tier(),
            venue_type: weight.venue_type(),
            pages,
            min_pages,
        }))
    }

    pub fn is_indexable(&self, entry: &BibliographicEntry, triage: &mut TriageLog) -> Result<bool> {
        Ok(self.evaluate(entry, triage)?.is_accepted())
    }

    pub fn classify(
        &self,
        entry: &BibliographicEntry,
        triage: &mut TriageLog,
    ) -> Result<Option<Classification>> {
        Ok(match self.evaluate(entry, triage)? {
            Decision::Accepted(c) => Some(c),
            Decision::Rejected(_) => None,
        })
    }

    /// Registry key of the entry's venue.
    ///
    /// Umbrella journals are keyed by their numbered sub-venue when present.
    pub fn venue_key(&self, entry: &BibliographicEntry) -> Option<String> {
        match &entry.venue {
            VenueField::Journal {
                name,
                number: Some(number),
            } if self.ctx.umbrella_journals.contains(name) => Some(number.clone()),
            VenueField::Journal { name, .. } => Some(name.clone()),
            VenueField::Proceedings(booktitle) => Some(booktitle.clone()),
            VenueField::Missing => None,
        }
    }

    /// Effective page count used by the page gate.
    pub fn paper_size(&self, identifier: &str, entry: &BibliographicEntry, venue_key: &str) -> i32 {
        if self.ctx.tables.white_list.contains(identifier) {
            return self.ctx.nominal_pages;
        }
        if let Some(pages) = &entry.pages {
            return parse_paper_size(pages);
        }
        if self.ctx.unpaged_venues.contains(venue_key) {
            return self.ctx.nominal_pages;
        }
        0
    }
}

/// Inclusive page count of a DBLP `pages` field.
///
/// `start-end` counts both ends. Three- and four-token forms such as
/// `12:1-14` or `12:1-12:14` (article number, then pages) use the second
/// token as start and the last as end. Other shapes count as 0; tokens that
/// are not integers read as 0.
pub fn parse_paper_size(pages: &str) -> i32 {
    let tokens: Vec<&str> = PAGE_DELIMITER.split(pages).collect();
    let (start, end) = match tokens.as_slice() {
        [start, end] => (start, end),
        [_, start, end] => (start, end),
        [_, start, _, end] => (start, end),
        _ => return 0,
    };
    as_int(end)
        .checked_sub(as_int(start))
        .and_then(|n| n.checked_add(1))
        .unwrap_or(0)
}

fn as_int(token: &str) -> i32 {
    token.trim().parse().unwrap_or(0)
}
