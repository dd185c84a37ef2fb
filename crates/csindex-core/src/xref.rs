use async_trait::async_trait;

use crate::error::Result;
use crate::models::XrefLink;

/// Looks up the open-access counterpart of a paper.
///
/// Implementations cache by DOI and never fail: any lookup problem yields
/// [`XrefLink::NotFound`]. Calls are awaited one at a time by the driver.
#[async_trait]
pub trait LinkResolver: Send {
    async fn resolve(&mut self, doi: Option<&str>, title: &str) -> XrefLink;

    /// Writes the cache to durable storage. Called once at the end of a run.
    async fn persist(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Resolver used when cross-reference lookup is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLinkResolver;

#[async_trait]
impl LinkResolver for NoLinkResolver {
    async fn resolve(&mut self, _doi: Option<&str>, _title: &str) -> XrefLink {
        XrefLink::NotFound
    }
}
