//! Rate service — the memoized fetcher stages actually hold.
//!
//! Bundles the cache, the fallback fetcher, and the validity window behind
//! one handle. Constructed once at process start and shared by `Arc`; there
//! is no hidden global.

use super::cache::{DataCache, HALF_DAY};
use super::clock::Clock;
use super::fallback::FallbackFetcher;
use super::quote::RateTable;
use super::source::FetchError;
use std::sync::Arc;
use std::time::Duration;

/// Cache key for the remote-first fetch path.
pub const REMOTE_RATES_KEY: &str = "rates/remote";
/// Cache key for the deliberate offline path. Distinct from the remote key
/// so the two memoize independently, like two distinct fetch functions.
pub const OFFLINE_RATES_KEY: &str = "rates/offline";

pub struct RateService {
    cache: DataCache<RateTable>,
    fetcher: FallbackFetcher,
    ttl: Duration,
}

impl RateService {
    pub fn new(fetcher: FallbackFetcher, ttl: Duration) -> Self {
        Self {
            cache: DataCache::new(),
            fetcher,
            ttl,
        }
    }

    /// Production wiring: HTTP remote, bundled snapshot, half-day window.
    pub fn with_defaults() -> Self {
        Self::new(FallbackFetcher::with_defaults(), HALF_DAY)
    }

    /// Inject a clock for TTL tests.
    pub fn with_clock(fetcher: FallbackFetcher, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            cache: DataCache::with_clock(clock),
            fetcher,
            ttl,
        }
    }

    /// The current rate table, blocking strategy.
    pub fn table_blocking(&self, offline: bool) -> Result<RateTable, FetchError> {
        if offline {
            self.cache.get_or_fetch(OFFLINE_RATES_KEY, self.ttl, || {
                self.fetcher.offline_blocking().map(|f| f.table)
            })
        } else {
            self.cache.get_or_fetch(REMOTE_RATES_KEY, self.ttl, || {
                self.fetcher.fetch_blocking().map(|f| f.table)
            })
        }
    }

    /// The current rate table, suspendable strategy.
    pub async fn table(&self, offline: bool) -> Result<RateTable, FetchError> {
        if offline {
            self.cache
                .get_or_fetch_async(OFFLINE_RATES_KEY, self.ttl, || async {
                    self.fetcher.offline().await.map(|f| f.table)
                })
                .await
        } else {
            self.cache
                .get_or_fetch_async(REMOTE_RATES_KEY, self.ttl, || async {
                    self.fetcher.fetch().await.map(|f| f.table)
                })
                .await
        }
    }
}
