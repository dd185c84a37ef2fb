//! csindex core: venue policy, paper aggregation and the run driver.

pub mod config;
pub mod driver;
pub mod error;
pub mod models;
pub mod policy;
pub mod report;
pub mod source;
pub mod store;
pub mod tables;
pub mod triage;
pub mod xref;

pub use config::{MalformedPolicy, RunConfig};
pub use driver::{ResearcherExtract, RunDriver, RunOutcome, RunStats};
pub use error::{IndexError, Result};
pub use models::*;
pub use policy::{
    parse_paper_size, Classification, ClassificationPolicy, Decision, PolicyContext, Rejection,
};
pub use source::{BibliographySource, MemorySource};
pub use store::{Attribution, PaperStore};
pub use tables::{PolicyTables, VenueRegistry};
pub use triage::{TriageLog, UnresolvedCase};
pub use xref::{LinkResolver, NoLinkResolver};
