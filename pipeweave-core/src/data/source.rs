//! Quote source trait and structured fetch errors.
//!
//! A `QuoteSource` abstracts over where a rate table comes from (remote
//! service, bundled snapshot, test stubs) and exposes both execution
//! strategies: a blocking fetch for the synchronous path and an async fetch
//! for the suspendable path. The fallback and cache layers sit above this
//! trait — sources don't know about either.

use super::quote::RateTable;
use async_trait::async_trait;
use thiserror::Error;

/// Structured errors for reference-data fetches.
///
/// Surfaced to a stage only when the fetch failed *and* neither a cached
/// value nor the snapshot fallback could stand in.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network unreachable: {0}")]
    Network(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("malformed quote payload: {0}")]
    Parse(String),

    #[error("quote payload contained no usable rates")]
    Empty,

    #[error("snapshot unavailable: {0}")]
    Snapshot(String),
}

/// A source of exchange-rate tables, fetchable under either strategy.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Fetch on the caller's thread.
    fn fetch_blocking(&self) -> Result<RateTable, FetchError>;

    /// Fetch as a suspendable task.
    async fn fetch(&self) -> Result<RateTable, FetchError>;
}
