//! Two-tier fetch: remote first, bundled snapshot on failure or emptiness.
//!
//! This is the whole degrade policy — no retries, no backoff. A remote
//! failure logs at error level, an empty remote table at warn level, and the
//! deliberate offline path at debug only, so alerting can tell the three
//! apart. The returned [`TableFetch`] records which tier actually served.

use super::quote::RateTable;
use super::remote::RemoteQuoteSource;
use super::snapshot::SnapshotSource;
use super::source::{FetchError, QuoteSource};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

/// Which tier a rate table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateOrigin {
    Remote,
    Snapshot,
}

/// A fetched table plus the tier that produced it.
#[derive(Debug, Clone)]
pub struct TableFetch {
    pub table: RateTable,
    pub origin: RateOrigin,
}

/// Remote fetch wrapped with a snapshot fallback.
pub struct FallbackFetcher {
    remote: Box<dyn QuoteSource>,
    snapshot: Box<dyn QuoteSource>,
}

impl FallbackFetcher {
    pub fn new(remote: Box<dyn QuoteSource>, snapshot: Box<dyn QuoteSource>) -> Self {
        Self { remote, snapshot }
    }

    /// The production pair: HTTP remote + bundled snapshot.
    pub fn with_defaults() -> Self {
        Self::new(
            Box::new(RemoteQuoteSource::new()),
            Box::new(SnapshotSource::bundled()),
        )
    }

    /// Fetch on the caller's thread, degrading to the snapshot.
    pub fn fetch_blocking(&self) -> Result<TableFetch, FetchError> {
        match self.remote.fetch_blocking() {
            Ok(table) if table.is_empty() => {
                warn!(
                    source = self.remote.name(),
                    "rate table from remote was empty, falling back to snapshot"
                );
                self.snapshot_table(self.snapshot.fetch_blocking())
            }
            Ok(table) => Ok(TableFetch {
                table,
                origin: RateOrigin::Remote,
            }),
            Err(e) => {
                error!(
                    source = self.remote.name(),
                    error = %e,
                    "error loading exchange rate data, falling back to snapshot"
                );
                self.snapshot_table(self.snapshot.fetch_blocking())
            }
        }
    }

    /// Suspendable fetch, degrading to the snapshot.
    pub async fn fetch(&self) -> Result<TableFetch, FetchError> {
        match self.remote.fetch().await {
            Ok(table) if table.is_empty() => {
                warn!(
                    source = self.remote.name(),
                    "rate table from remote was empty, falling back to snapshot"
                );
                self.snapshot_table(self.snapshot.fetch().await)
            }
            Ok(table) => Ok(TableFetch {
                table,
                origin: RateOrigin::Remote,
            }),
            Err(e) => {
                error!(
                    source = self.remote.name(),
                    error = %e,
                    "error loading exchange rate data, falling back to snapshot"
                );
                self.snapshot_table(self.snapshot.fetch().await)
            }
        }
    }

    /// Deliberate offline mode: the snapshot only, without touching the
    /// remote and without an error/warn diagnostic.
    pub fn offline_blocking(&self) -> Result<TableFetch, FetchError> {
        debug!("loading offline rate data");
        self.snapshot_table(self.snapshot.fetch_blocking())
    }

    /// Suspendable variant of [`Self::offline_blocking`].
    pub async fn offline(&self) -> Result<TableFetch, FetchError> {
        debug!("loading offline rate data");
        self.snapshot_table(self.snapshot.fetch().await)
    }

    fn snapshot_table(
        &self,
        fetched: Result<RateTable, FetchError>,
    ) -> Result<TableFetch, FetchError> {
        let table = fetched?;
        if table.is_empty() {
            return Err(FetchError::Empty);
        }
        Ok(TableFetch {
            table,
            origin: RateOrigin::Snapshot,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FailingRemote;

    #[async_trait]
    impl QuoteSource for FailingRemote {
        fn name(&self) -> &str {
            "failing_remote"
        }

        fn fetch_blocking(&self) -> Result<RateTable, FetchError> {
            Err(FetchError::Network("connection refused".into()))
        }

        async fn fetch(&self) -> Result<RateTable, FetchError> {
            Err(FetchError::Network("connection refused".into()))
        }
    }

    struct EmptyRemote;

    #[async_trait]
    impl QuoteSource for EmptyRemote {
        fn name(&self) -> &str {
            "empty_remote"
        }

        fn fetch_blocking(&self) -> Result<RateTable, FetchError> {
            Ok(RateTable::new())
        }

        async fn fetch(&self) -> Result<RateTable, FetchError> {
            Ok(RateTable::new())
        }
    }

    struct StaticRemote(RateTable);

    #[async_trait]
    impl QuoteSource for StaticRemote {
        fn name(&self) -> &str {
            "static_remote"
        }

        fn fetch_blocking(&self) -> Result<RateTable, FetchError> {
            Ok(self.0.clone())
        }

        async fn fetch(&self) -> Result<RateTable, FetchError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn remote_success_is_served_as_remote() {
        let table: RateTable = [("USD/EUR".to_string(), 0.8234)].into_iter().collect();
        let fetcher = FallbackFetcher::new(
            Box::new(StaticRemote(table)),
            Box::new(SnapshotSource::bundled()),
        );

        let fetched = fetcher.fetch_blocking().unwrap();
        assert_eq!(fetched.origin, RateOrigin::Remote);
        assert_eq!(fetched.table.get("USD/EUR"), Some(0.8234));
    }

    #[test]
    fn remote_failure_degrades_to_snapshot() {
        let fetcher = FallbackFetcher::new(
            Box::new(FailingRemote),
            Box::new(SnapshotSource::bundled()),
        );

        let fetched = fetcher.fetch_blocking().unwrap();
        assert_eq!(fetched.origin, RateOrigin::Snapshot);
        assert!(!fetched.table.is_empty());
    }

    #[test]
    fn empty_remote_degrades_to_snapshot() {
        let fetcher = FallbackFetcher::new(
            Box::new(EmptyRemote),
            Box::new(SnapshotSource::bundled()),
        );

        let fetched = fetcher.fetch_blocking().unwrap();
        assert_eq!(fetched.origin, RateOrigin::Snapshot);
    }

    #[test]
    fn offline_skips_the_remote_entirely() {
        // A remote that would fail loudly is never consulted.
        let fetcher = FallbackFetcher::new(
            Box::new(FailingRemote),
            Box::new(SnapshotSource::bundled()),
        );

        let fetched = fetcher.offline_blocking().unwrap();
        assert_eq!(fetched.origin, RateOrigin::Snapshot);
        assert_eq!(fetched.table.get("USD/USD"), Some(1.0));
    }

    #[tokio::test]
    async fn async_path_degrades_identically() {
        let fetcher = FallbackFetcher::new(
            Box::new(FailingRemote),
            Box::new(SnapshotSource::bundled()),
        );

        let fetched = fetcher.fetch().await.unwrap();
        assert_eq!(fetched.origin, RateOrigin::Snapshot);
        assert!(!fetched.table.is_empty());
    }
}
