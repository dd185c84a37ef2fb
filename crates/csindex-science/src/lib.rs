//! csindex science: DBLP records and arXiv cross-references.

pub mod arxiv;
pub mod cache;
pub mod dblp;
pub mod error;
pub mod http;
pub mod similarity;

pub use arxiv::{ArxivClient, ArxivLinkResolver};
pub use cache::LinkCache;
pub use dblp::{parse_person_records, DblpSource};
pub use error::{Result, ScienceError};
pub use http::RateLimitedClient;
