use async_trait::async_trait;
use csindex_core::{IndexError, LinkResolver, XrefLink};
use tracing::{debug, warn};

use crate::arxiv::client::ArxivClient;
use crate::cache::LinkCache;
use crate::error::Result;
use crate::similarity::title_ratio;

pub const DEFAULT_SIMILARITY: f64 = 0.9;

/// Finds the arXiv version of a paper by exact title search.
///
/// A hit counts only when arXiv reports exactly one result and its title is
/// close enough to the query. Answers are memoized per DOI in a
/// [`LinkCache`]; papers without a DOI are looked up every time and never
/// cached.
pub struct ArxivLinkResolver {
    client: ArxivClient,
    cache: LinkCache,
    threshold: f64,
}

impl ArxivLinkResolver {
    pub fn new(client: ArxivClient, cache: LinkCache) -> Self {
        Self {
            client,
            cache,
            threshold: DEFAULT_SIMILARITY,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn cache(&self) -> &LinkCache {
        &self.cache
    }

    async fn lookup(&self, title: &str) -> Result<XrefLink> {
        let query = strip_trailing_punctuation(title);
        if query.is_empty() {
            return Ok(XrefLink::NotFound);
        }

        let feed = self.client.search_title(query, 1).await?;
        let Some(entry) = feed.unique_entry() else {
            debug!("arXiv: {} results for {query:?}", feed.total_results);
            return Ok(XrefLink::NotFound);
        };

        let similarity = title_ratio(&entry.title, query);
        if similarity >= self.threshold {
            Ok(XrefLink::Found(entry.id.clone()))
        } else {
            debug!("arXiv: {:?} too far from {query:?} ({similarity:.2})", entry.title);
            Ok(XrefLink::NotFound)
        }
    }
}

#[async_trait]
impl LinkResolver for ArxivLinkResolver {
    async fn resolve(&mut self, doi: Option<&str>, title: &str) -> XrefLink {
        let Some(doi) = doi.filter(|d| !d.trim().is_empty()) else {
            return XrefLink::NotFound;
        };
        if let Some(link) = self.cache.get(doi) {
            return link.clone();
        }

        let link = match self.lookup(title).await {
            Ok(link) => link,
            Err(e) => {
                warn!("arXiv lookup failed for {doi}: {e}");
                XrefLink::NotFound
            }
        };
        self.cache.insert(doi, link.clone());
        link
    }

    async fn persist(&mut self) -> csindex_core::Result<()> {
        self.cache
            .flush()
            .map(|_| ())
            .map_err(|e| IndexError::Cache(e.to_string()))
    }
}

/// Drops the final sentence mark bibliographies append to titles.
fn strip_trailing_punctuation(title: &str) -> &str {
    let title = title.trim();
    match title.chars().last() {
        Some(c) if c.is_ascii_punctuation() => &title[..title.len() - 1],
        _ => title,
    }
}
