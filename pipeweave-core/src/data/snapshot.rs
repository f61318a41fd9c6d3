//! Offline snapshot source — bundled or on-disk quote payload.
//!
//! The snapshot has the exact schema of the remote response and goes through
//! the same parser. The bundled copy is compiled into the binary, so the
//! two-tier degrade always has a last resort that does not touch the
//! filesystem.

use super::quote::{parse_quote_json, RateTable};
use super::source::{FetchError, QuoteSource};
use async_trait::async_trait;
use std::path::PathBuf;

/// Quote payload compiled into the crate.
pub const BUNDLED_QUOTES: &str = include_str!("../../data/quote.json");

/// Local snapshot of the rate table.
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    path: Option<PathBuf>,
}

impl SnapshotSource {
    /// The compiled-in snapshot.
    pub fn bundled() -> Self {
        Self { path: None }
    }

    /// A snapshot file on local storage.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }
}

#[async_trait]
impl QuoteSource for SnapshotSource {
    fn name(&self) -> &str {
        "snapshot_quotes"
    }

    fn fetch_blocking(&self) -> Result<RateTable, FetchError> {
        let raw = match &self.path {
            Some(path) => std::fs::read_to_string(path)
                .map_err(|e| FetchError::Snapshot(format!("{}: {e}", path.display())))?,
            None => BUNDLED_QUOTES.to_string(),
        };
        parse_quote_json(&raw)
    }

    async fn fetch(&self) -> Result<RateTable, FetchError> {
        let raw = match &self.path {
            Some(path) => tokio::fs::read_to_string(path)
                .await
                .map_err(|e| FetchError::Snapshot(format!("{}: {e}", path.display())))?,
            None => BUNDLED_QUOTES.to_string(),
        };
        parse_quote_json(&raw)
    }
}
