//! Fetch-site-feed stage — auto-discovers a site's first feed and emits its
//! entries.
//!
//! A source stage: the interesting work (discovery, fetching, parsing) is
//! the reference fetch, delegated to the [`FeedDiscovery`] collaborator, and
//! both collaborator calls may suspend under the suspendable strategy. The
//! per-item transform just emits the fetched entries, or forwards the
//! original item when the pass flag is set. Typically driven with a single
//! trigger item.
//!
//! Config: `url` (required literal), optional `pass`.

use crate::domain::{Item, StageConfig};
use crate::engine::{BlockingStage, SplitPair, SplitSpec, StageError, StageKernel, SuspendableStage};
use crate::services::{AsyncFeedDiscovery, FeedDiscovery};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

pub struct FetchSiteFeed<D> {
    config: StageConfig,
    discovery: Arc<D>,
}

impl<D> FetchSiteFeed<D> {
    pub fn new(config: StageConfig, discovery: Arc<D>) -> Self {
        Self { config, discovery }
    }

    fn url(&self) -> Result<String, StageError> {
        Ok(self.config.require_str("url")?)
    }
}

impl<D: Send + Sync> StageKernel for FetchSiteFeed<D> {
    type Reference = Vec<Item>;
    type Out = Vec<Item>;

    fn name(&self) -> &str {
        "fetch_site_feed"
    }

    fn dispatch_spec(&self) -> SplitSpec {
        // Item content is irrelevant to a source stage; only the pass flag
        // is dispatched.
        let mut spec = SplitSpec::new(crate::domain::FieldSpec::Literal(Value::Null));
        if let Some(pass) = self.config.spec("pass") {
            spec = spec.with_pass(pass.clone());
        }
        spec
    }

    fn transform(
        &self,
        item: &Item,
        pair: SplitPair,
        entries: &Vec<Item>,
    ) -> Result<Vec<Item>, StageError> {
        if pair.pass_through {
            return Ok(vec![item.clone()]);
        }
        Ok(entries.clone())
    }
}

impl<D: FeedDiscovery> BlockingStage for FetchSiteFeed<D> {
    fn fetch_reference(&self) -> Result<Vec<Item>, StageError> {
        let url = self.url()?;
        let link = self.discovery.discover(&url)?;
        debug!(stage = self.name(), url = %url, link = %link, "feed link resolved");
        let entries = self.discovery.fetch_entries(&link)?;
        Ok(entries.into_iter().map(|e| e.into_item()).collect())
    }
}

#[async_trait]
impl<D: AsyncFeedDiscovery> SuspendableStage for FetchSiteFeed<D> {
    async fn fetch_reference(&self) -> Result<Vec<Item>, StageError> {
        let url = self.url()?;
        let link = self.discovery.discover(&url).await?;
        debug!(stage = self.name(), url = %url, link = %link, "feed link resolved");
        let entries = self.discovery.fetch_entries(&link).await?;
        Ok(entries.into_iter().map(|e| e.into_item()).collect())
    }
}
