//! Time-bounded memoization in front of a [`MarketDataSource`].
//!
//! The cache is itself a source, so callers never know whether it is there.
//! Only successful responses are stored; a failure is retried on the next
//! call. A stored "no value" is returned as "no value".

use crate::error::FetchError;
use crate::models::RawSnapshot;
use crate::source::{MarketDataSource, SharedSource};
use async_trait::async_trait;
use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::debug;

struct Entry<T> {
    value: T,
    fetched_at: Instant,
}

impl<T> Entry<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            fetched_at: Instant::now(),
        }
    }

    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }
}

pub struct CachedSource {
    inner: SharedSource,
    ttl: Duration,
    snapshots: DashMap<String, Entry<RawSnapshot>>,
    caps: DashMap<String, Entry<Option<f64>>>,
}

impl CachedSource {
    pub fn new(inner: SharedSource, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            snapshots: DashMap::new(),
            caps: DashMap::new(),
        }
    }

    /// Number of stored entries, fresh or not.
    pub fn len(&self) -> usize {
        self.snapshots.len() + self.caps.len()
    }

    /// Drop every entry older than the TTL.
    pub fn purge_expired(&self) {
        let ttl = self.ttl;
        self.snapshots.retain(|_, e| e.is_fresh(ttl));
        self.caps.retain(|_, e| e.is_fresh(ttl));
    }
}

#[async_trait]
impl MarketDataSource for CachedSource {
    async fn fetch_snapshot(&self, ticker: &str) -> Result<RawSnapshot, FetchError> {
        let cached = self
            .snapshots
            .get(ticker)
            .filter(|e| e.is_fresh(self.ttl))
            .map(|e| e.value.clone());
        if let Some(snap) = cached {
            debug!("{}: snapshot served from cache", ticker);
            return Ok(snap);
        }

        let snap = self.inner.fetch_snapshot(ticker).await?;
        self.snapshots
            .insert(ticker.to_string(), Entry::new(snap.clone()));
        Ok(snap)
    }

    async fn fetch_market_cap(&self, ticker: &str) -> Result<Option<f64>, FetchError> {
        let cached = self
            .caps
            .get(ticker)
            .filter(|e| e.is_fresh(self.ttl))
            .map(|e| e.value);
        if let Some(cap) = cached {
            debug!("{}: market cap served from cache", ticker);
            return Ok(cap);
        }

        let cap = self.inner.fetch_market_cap(ticker).await?;
        self.caps.insert(ticker.to_string(), Entry::new(cap));
        Ok(cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::testing::{snapshot, MockSource};
    use std::sync::Arc;

    fn mock() -> Arc<MockSource> {
        Arc::new(
            MockSource::default()
                .with_snapshot("BHP.AX", snapshot("Basic Materials", None, Some(2.0), None, None, None))
                .with_cap("BHP.AX", Some(2.2e11))
                .with_cap("NEW.AX", None),
        )
    }

    #[tokio::test]
    async fn test_second_call_within_ttl_hits_cache() {
        let inner = mock();
        let cache = CachedSource::new(inner.clone(), Duration::from_secs(3600));

        let a = cache.fetch_snapshot("BHP.AX").await.unwrap();
        let b = cache.fetch_snapshot("BHP.AX").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(inner.snapshot_calls(), 1);
        // missing PE stays missing through the cache
        assert_eq!(b.trailing_pe, None);
    }

    #[tokio::test]
    async fn test_zero_ttl_always_refetches() {
        let inner = mock();
        let cache = CachedSource::new(inner.clone(), Duration::ZERO);

        cache.fetch_market_cap("BHP.AX").await.unwrap();
        cache.fetch_market_cap("BHP.AX").await.unwrap();
        assert_eq!(inner.cap_calls(), 2);

        cache.purge_expired();
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test]
    async fn test_missing_cap_is_cached_as_missing() {
        let inner = mock();
        let cache = CachedSource::new(inner.clone(), Duration::from_secs(60));

        assert_eq!(cache.fetch_market_cap("NEW.AX").await.unwrap(), None);
        assert_eq!(cache.fetch_market_cap("NEW.AX").await.unwrap(), None);
        assert_eq!(inner.cap_calls(), 1);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let inner = mock();
        let cache = CachedSource::new(inner.clone(), Duration::from_secs(60));

        assert!(cache.fetch_snapshot("GONE.AX").await.is_err());
        assert!(cache.fetch_snapshot("GONE.AX").await.is_err());
        assert_eq!(inner.snapshot_calls(), 2);
        assert_eq!(cache.len(), 0);
    }
}
