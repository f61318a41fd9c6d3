//! Time-boxed memoizing cache with serve-stale-on-error.
//!
//! Shared, process-wide mutable state: one instance is constructed at
//! startup and handed by `Arc` to every stage that needs reference data.
//! Guarantees per key:
//!
//! - at most one fresh fetch per validity window;
//! - a single in-flight fetch at any time — concurrent callers for the same
//!   key wait on the per-key slot lock and then read the fresh entry instead
//!   of issuing a duplicate fetch;
//! - on fetch failure, the previous good value is served if one exists
//!   (serve-stale-on-error); the fetch error propagates only when the key
//!   has never been populated.
//!
//! The per-key slot is a tokio mutex so both strategies share it: the
//! blocking path takes it via `blocking_lock` and therefore must not run on
//! an async runtime worker.

use super::clock::{Clock, SystemClock};
use super::source::FetchError;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, warn};

/// Validity window used for reference-rate data.
pub const HALF_DAY: Duration = Duration::from_secs(12 * 60 * 60);

#[derive(Debug, Clone)]
struct CacheEntry<T> {
    value: T,
    fetched_at: Instant,
}

type Slot<T> = Arc<AsyncMutex<Option<CacheEntry<T>>>>;

/// Memoizing cache around arbitrary fetch closures, keyed by caller-chosen
/// strings (conventionally `"<function identity>/<args>"`).
pub struct DataCache<T> {
    slots: StdMutex<HashMap<String, Slot<T>>>,
    clock: Arc<dyn Clock>,
}

impl<T: Clone> DataCache<T> {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            slots: StdMutex::new(HashMap::new()),
            clock,
        }
    }

    /// Blocking lookup-or-fetch.
    ///
    /// Must not be called from an async runtime worker; the suspendable path
    /// is [`Self::get_or_fetch_async`].
    pub fn get_or_fetch<F>(&self, key: &str, ttl: Duration, fetch: F) -> Result<T, FetchError>
    where
        F: FnOnce() -> Result<T, FetchError>,
    {
        let slot = self.slot(key);
        let mut entry = slot.blocking_lock();
        if let Some(value) = self.live_value(&entry, ttl) {
            return Ok(value);
        }
        let outcome = fetch();
        self.settle(key, &mut entry, outcome)
    }

    /// Suspendable lookup-or-fetch; the fetch future is the only await.
    pub async fn get_or_fetch_async<F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        fetch: F,
    ) -> Result<T, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let slot = self.slot(key);
        let mut entry = slot.lock().await;
        if let Some(value) = self.live_value(&entry, ttl) {
            return Ok(value);
        }
        let outcome = fetch().await;
        self.settle(key, &mut entry, outcome)
    }

    /// Drop the entry for a key, forcing the next call to fetch.
    pub fn invalidate(&self, key: &str) {
        self.slots.lock().unwrap().remove(key);
    }

    fn slot(&self, key: &str) -> Slot<T> {
        self.slots
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_default()
            .clone()
    }

    fn live_value(&self, entry: &Option<CacheEntry<T>>, ttl: Duration) -> Option<T> {
        entry
            .as_ref()
            .filter(|e| self.clock.now().duration_since(e.fetched_at) < ttl)
            .map(|e| e.value.clone())
    }

    fn settle(
        &self,
        key: &str,
        entry: &mut Option<CacheEntry<T>>,
        outcome: Result<T, FetchError>,
    ) -> Result<T, FetchError> {
        match outcome {
            Ok(value) => {
                debug!(key, "cache entry refreshed");
                *entry = Some(CacheEntry {
                    value: value.clone(),
                    fetched_at: self.clock.now(),
                });
                Ok(value)
            }
            // The entry is retained whole on failure, never partially updated.
            Err(e) => match entry.as_ref() {
                Some(stale) => {
                    warn!(key, error = %e, "refresh failed, serving stale cached value");
                    Ok(stale.value.clone())
                }
                None => Err(e),
            },
        }
    }
}

impl<T: Clone> Default for DataCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::clock::ManualClock;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn counting_fetch(
        counter: &AtomicU32,
        result: Result<u64, FetchError>,
    ) -> impl FnOnce() -> Result<u64, FetchError> + '_ {
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            result
        }
    }

    #[test]
    fn two_calls_inside_ttl_issue_one_fetch() {
        let cache: DataCache<u64> = DataCache::new();
        let fetches = AtomicU32::new(0);

        let a = cache
            .get_or_fetch("k", HALF_DAY, counting_fetch(&fetches, Ok(7)))
            .unwrap();
        let b = cache
            .get_or_fetch("k", HALF_DAY, counting_fetch(&fetches, Ok(8)))
            .unwrap();

        assert_eq!((a, b), (7, 7));
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn expiry_triggers_a_refetch() {
        let clock = Arc::new(ManualClock::new());
        let cache: DataCache<u64> = DataCache::with_clock(clock.clone());
        let fetches = AtomicU32::new(0);
        let ttl = Duration::from_secs(60);

        cache
            .get_or_fetch("k", ttl, counting_fetch(&fetches, Ok(1)))
            .unwrap();
        clock.advance(Duration::from_secs(61));
        let v = cache
            .get_or_fetch("k", ttl, counting_fetch(&fetches, Ok(2)))
            .unwrap();

        assert_eq!(v, 2);
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn stale_value_served_when_refetch_fails() {
        let clock = Arc::new(ManualClock::new());
        let cache: DataCache<u64> = DataCache::with_clock(clock.clone());
        let ttl = Duration::from_secs(60);

        cache.get_or_fetch("k", ttl, || Ok(42)).unwrap();
        clock.advance(Duration::from_secs(120));

        let v = cache
            .get_or_fetch("k", ttl, || Err(FetchError::Network("down".into())))
            .unwrap();
        assert_eq!(v, 42);
    }

    #[test]
    fn error_propagates_when_nothing_cached() {
        let cache: DataCache<u64> = DataCache::new();
        let result = cache.get_or_fetch("k", HALF_DAY, || {
            Err(FetchError::Network("down".into()))
        });
        assert!(matches!(result, Err(FetchError::Network(_))));
    }

    #[test]
    fn keys_are_independent() {
        let cache: DataCache<u64> = DataCache::new();
        cache.get_or_fetch("a", HALF_DAY, || Ok(1)).unwrap();
        let b = cache.get_or_fetch("b", HALF_DAY, || Ok(2)).unwrap();
        assert_eq!(b, 2);
    }

    #[test]
    fn invalidate_forces_refetch() {
        let cache: DataCache<u64> = DataCache::new();
        let fetches = AtomicU32::new(0);

        cache
            .get_or_fetch("k", HALF_DAY, counting_fetch(&fetches, Ok(1)))
            .unwrap();
        cache.invalidate("k");
        cache
            .get_or_fetch("k", HALF_DAY, counting_fetch(&fetches, Ok(2)))
            .unwrap();

        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn concurrent_callers_share_one_inflight_fetch() {
        let cache: Arc<DataCache<u64>> = Arc::new(DataCache::new());
        let fetches = Arc::new(AtomicU32::new(0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = cache.clone();
                let fetches = fetches.clone();
                std::thread::spawn(move || {
                    cache.get_or_fetch("k", HALF_DAY, || {
                        fetches.fetch_add(1, Ordering::SeqCst);
                        std::thread::sleep(Duration::from_millis(50));
                        Ok(99)
                    })
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap().unwrap(), 99);
        }
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn async_path_memoizes_like_the_blocking_one() {
        let cache: DataCache<u64> = DataCache::new();
        let fetches = AtomicU32::new(0);

        let a = cache
            .get_or_fetch_async("k", HALF_DAY, || async {
                fetches.fetch_add(1, Ordering::SeqCst);
                Ok(5)
            })
            .await
            .unwrap();
        let b = cache
            .get_or_fetch_async("k", HALF_DAY, || async {
                fetches.fetch_add(1, Ordering::SeqCst);
                Ok(6)
            })
            .await
            .unwrap();

        assert_eq!((a, b), (5, 5));
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }
}
