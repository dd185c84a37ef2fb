use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use csindex_core::{BibliographySource, IndexError, RawRecord, Researcher};
use tracing::{debug, info};

use crate::dblp::parser::parse_person_records;
use crate::error::{Result, ScienceError};
use crate::http::RateLimitedClient;

pub const DEFAULT_BASE_URL: &str = "https://dblp.org/pid";

/// Researcher records from DBLP, one person document per pid.
///
/// Documents are cached as `<cache_dir>/<Name-With-Dashes>.xml` and reused
/// on later runs. An offline source only reads the cache.
pub struct DblpSource {
    client: Option<RateLimitedClient>,
    base_url: String,
    cache_dir: PathBuf,
}

impl DblpSource {
    pub fn new(
        base_url: &str,
        cache_dir: impl Into<PathBuf>,
        min_interval: Duration,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: Some(RateLimitedClient::new(min_interval, timeout, 3, "csindex/0.1")?),
            base_url: base_url.trim_end_matches('/').to_string(),
            cache_dir: cache_dir.into(),
        })
    }

    pub fn offline(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            client: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn cache_path(&self, researcher: &Researcher) -> PathBuf {
        self.cache_dir.join(format!("{}.xml", researcher.file_stem()))
    }

    /// Cached person document, fetching and storing it on a miss.
    pub async fn fetch_xml(&self, researcher: &Researcher) -> Result<String> {
        let path = self.cache_path(researcher);
        if path.exists() {
            debug!("dblp cache hit for {}", researcher.name);
            return Ok(fs::read_to_string(&path)?);
        }

        let Some(client) = &self.client else {
            return Err(ScienceError::SourceUnavailable(format!(
                "{} is not cached and the source is offline",
                path.display()
            )));
        };

        let url = format!("{}/{}.xml", self.base_url, researcher.pid);
        info!("fetching {url}");
        let xml = client.get(&url).await?;

        fs::create_dir_all(&self.cache_dir)?;
        fs::write(&path, &xml)?;
        Ok(xml)
    }
}

#[async_trait]
impl BibliographySource for DblpSource {
    async fn records(&mut self, researcher: &Researcher) -> csindex_core::Result<Vec<RawRecord>> {
        let xml = self
            .fetch_xml(researcher)
            .await
            .map_err(|e| IndexError::SourceUnavailable {
                researcher: researcher.name.clone(),
                reason: e.to_string(),
            })?;
        parse_person_records(&xml).map_err(|e| {
            IndexError::MalformedSource(format!("{}: {e}", self.cache_path(researcher).display()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use tempfile::TempDir;

    const XML: &str = r#"<dblpperson name="Ana Silva" pid="12/345" n="1">
<r><inproceedings key="conf/icse/Silva23">
<author>Ana Silva</author><title>T.</title><booktitle>ICSE</booktitle><year>2023</year>
<url>db/conf/icse/icse2023.html#Silva23</url>
</inproceedings></r>
</dblpperson>"#;

    fn ana() -> Researcher {
        Researcher::new("Ana Maria Silva", "UFMG", "12/345")
    }

    #[tokio::test]
    async fn fetches_once_then_reads_cache() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/pid/12/345.xml")
            .with_status(200)
            .with_body(XML)
            .expect(1)
            .create_async()
            .await;

        let tmp = TempDir::new().unwrap();
        let mut source = DblpSource::new(
            &format!("{}/pid", server.url()),
            tmp.path().join("dblp"),
            Duration::ZERO,
            Duration::from_secs(5),
        )
        .unwrap();

        let first = source.records(&ana()).await.unwrap();
        let second = source.records(&ana()).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first, second);
        assert!(tmp.path().join("dblp/Ana-Maria-Silva.xml").exists());
        m.assert_async().await;
    }

    #[tokio::test]
    async fn offline_miss_is_unavailable() {
        let tmp = TempDir::new().unwrap();
        let mut source = DblpSource::offline(tmp.path());
        let err = source.records(&ana()).await.unwrap_err();
        assert!(matches!(err, IndexError::SourceUnavailable { .. }));
    }

    #[tokio::test]
    async fn offline_reads_existing_document() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("Ana-Maria-Silva.xml"), XML).unwrap();
        let mut source = DblpSource::offline(tmp.path());
        let records = source.records(&ana()).await.unwrap();
        assert_eq!(records[0].kind, "inproceedings");
    }

    #[tokio::test]
    async fn broken_cached_document_is_malformed() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("Ana-Maria-Silva.xml"), "<dblpperson><r><article>").unwrap();
        let mut source = DblpSource::offline(tmp.path());
        let err = source.records(&ana()).await.unwrap_err();
        assert!(err.is_malformed_source());
    }

    #[tokio::test]
    async fn server_error_is_unavailable() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/pid/12/345.xml")
            .with_status(404)
            .create_async()
            .await;

        let tmp = TempDir::new().unwrap();
        let mut source = DblpSource::new(
            &format!("{}/pid", server.url()),
            tmp.path(),
            Duration::ZERO,
            Duration::from_secs(5),
        )
        .unwrap();
        let err = source.records(&ana()).await.unwrap_err();
        assert!(matches!(err, IndexError::SourceUnavailable { .. }));
        assert!(!tmp.path().join("Ana-Maria-Silva.xml").exists());
    }
}
