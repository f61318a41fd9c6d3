//! Collaborator seams — services the stages consume but do not implement.
//!
//! Locale-aware currency formatting and feed discovery/parsing live outside
//! this crate; stages talk to them through these traits so implementations
//! can be swapped and mocked.

use crate::domain::Item;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("feed discovery failed for {url}: {reason}")]
    Discovery { url: String, reason: String },

    #[error("feed fetch failed for {link}: {reason}")]
    Feed { link: String, reason: String },
}

/// Formats a numeric amount as a locale-correct currency string.
pub trait LocaleFormatter: Send + Sync {
    fn format(&self, amount: f64, currency: &str) -> String;
}

/// Bare-bones formatter stub — `"EUR 10.00"` style, no locale rules.
/// Used by tests; real deployments wire a locale service instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainFormatter;

impl LocaleFormatter for PlainFormatter {
    fn format(&self, amount: f64, currency: &str) -> String {
        format!("{currency} {amount:.2}")
    }
}

/// One entry of a discovered feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub published: Option<NaiveDateTime>,
    pub summary: Option<String>,
}

impl FeedEntry {
    /// Flatten into a pipeline item.
    pub fn into_item(self) -> Item {
        let mut item = Item::new().with("title", self.title).with("link", self.link);
        if let Some(published) = self.published {
            item.insert(
                "published",
                published.format("%Y-%m-%dT%H:%M:%S").to_string(),
            );
        }
        if let Some(summary) = self.summary {
            item.insert("summary", summary);
        }
        item
    }
}

/// Site auto-discovery plus feed fetching, blocking strategy.
pub trait FeedDiscovery: Send + Sync {
    /// Resolve a site URL to its first advertised feed link.
    fn discover(&self, url: &str) -> Result<String, ServiceError>;

    /// Fetch and parse the feed behind a link.
    fn fetch_entries(&self, link: &str) -> Result<Vec<FeedEntry>, ServiceError>;
}

/// Suspendable counterpart of [`FeedDiscovery`]; both calls may suspend.
#[async_trait]
pub trait AsyncFeedDiscovery: Send + Sync {
    async fn discover(&self, url: &str) -> Result<String, ServiceError>;

    async fn fetch_entries(&self, link: &str) -> Result<Vec<FeedEntry>, ServiceError>;
}
