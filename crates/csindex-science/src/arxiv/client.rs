use std::time::Duration;

use crate::arxiv::parser::parse_atom_response;
use crate::arxiv::types::ArxivFeed;
use crate::error::Result;
use crate::http::RateLimitedClient;

pub const DEFAULT_BASE_URL: &str = "http://export.arxiv.org/api/query";

pub struct ArxivClient {
    client: RateLimitedClient,
    base_url: String,
}

impl ArxivClient {
    pub fn new() -> Result<Self> {
        Self::with_params(DEFAULT_BASE_URL, Duration::from_secs(3), Duration::from_secs(30))
    }

    /// A failed lookup is final for the run, so requests are never retried.
    pub fn with_params(base_url: &str, min_interval: Duration, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: RateLimitedClient::new(min_interval, timeout, 0, "csindex/0.1")?,
            base_url: base_url.to_string(),
        })
    }

    /// Exact-phrase title search.
    pub async fn search_title(&self, title: &str, max_results: u32) -> Result<ArxivFeed> {
        let phrase = format!("\"{title}\"");
        let separator = if self.base_url.contains('?') { '&' } else { '?' };
        let url = format!(
            "{}{separator}search_query={}&start=0&max_results={max_results}",
            self.base_url,
            urlencoding::encode(&phrase)
        );

        let xml = self.client.get(&url).await?;
        parse_atom_response(&xml)
    }
}
