//! Per-symbol TTL cache of price readings.
//!
//! Entries are created or overwritten only after a successful fetch and are
//! never evicted. An expired entry is still returned by [`PriceCache::latest`]
//! so the service can fall back to it when every source fails.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::core::types::PriceReading;

/// A cached reading and the time it was fetched
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Cached reading
    pub reading: PriceReading,
    /// Fetch time (ms since epoch)
    pub fetched_at_ms: i64,
}

impl CacheEntry {
    /// Check whether the entry is younger than `ttl_ms` at `now_ms`
    pub fn is_fresh(&self, now_ms: i64, ttl_ms: u64) -> bool {
        let ttl_ms = i64::try_from(ttl_ms).unwrap_or(i64::MAX);
        now_ms.saturating_sub(self.fetched_at_ms) < ttl_ms
    }

    /// Age of the entry at `now_ms`
    pub fn age_ms(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(self.fetched_at_ms).max(0)
    }
}

/// Symbol-keyed reading cache
#[derive(Debug)]
pub struct PriceCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl_ms: u64,
}

impl PriceCache {
    /// Create an empty cache with the given freshness window
    pub fn new(ttl_ms: u64) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl_ms,
        }
    }

    /// Reading for `symbol` if it is still fresh at `now_ms`
    pub async fn fresh(&self, symbol: &str, now_ms: i64) -> Option<PriceReading> {
        let entries = self.entries.read().await;
        entries
            .get(symbol)
            .filter(|entry| entry.is_fresh(now_ms, self.ttl_ms))
            .map(|entry| entry.reading.clone())
    }

    /// Last stored entry for `symbol`, fresh or not
    pub async fn latest(&self, symbol: &str) -> Option<CacheEntry> {
        self.entries.read().await.get(symbol).cloned()
    }

    /// Store a reading fetched at `now_ms`
    pub async fn insert(&self, symbol: impl Into<String>, reading: PriceReading, now_ms: i64) {
        let entry = CacheEntry {
            reading,
            fetched_at_ms: now_ms,
        };
        self.entries.write().await.insert(symbol.into(), entry);
    }

    /// Number of symbols ever cached
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Check if nothing has been cached yet
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::TradingPair;

    fn reading(price: f64) -> PriceReading {
        let pair: TradingPair = "BTC/USD".parse().unwrap();
        PriceReading::new(&pair, price).unwrap()
    }

    #[test]
    fn test_entry_freshness_boundary() {
        let entry = CacheEntry {
            reading: reading(1.0),
            fetched_at_ms: 1_000,
        };
        assert!(entry.is_fresh(1_000, 5_000));
        assert!(entry.is_fresh(5_999, 5_000));
        assert!(!entry.is_fresh(6_000, 5_000));
        assert_eq!(entry.age_ms(6_000), 5_000);
    }

    #[tokio::test]
    async fn test_fresh_and_latest() {
        let cache = PriceCache::new(5_000);
        assert!(cache.is_empty().await);
        assert!(cache.fresh("BTC/USD", 0).await.is_none());

        cache.insert("BTC/USD", reading(100.0), 0).await;
        assert_eq!(cache.fresh("BTC/USD", 4_999).await.unwrap().price, 100.0);
        assert!(cache.fresh("BTC/USD", 6_000).await.is_none());

        let stale = cache.latest("BTC/USD").await.unwrap();
        assert_eq!(stale.reading.price, 100.0);
        assert_eq!(stale.fetched_at_ms, 0);
    }

    #[tokio::test]
    async fn test_insert_overwrites() {
        let cache = PriceCache::new(5_000);
        cache.insert("BTC/USD", reading(100.0), 0).await;
        cache.insert("BTC/USD", reading(101.0), 7_000).await;

        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.fresh("BTC/USD", 8_000).await.unwrap().price, 101.0);
    }

    #[test]
    fn test_huge_ttl_never_expires() {
        let entry = CacheEntry {
            reading: reading(1.0),
            fetched_at_ms: 0,
        };
        assert!(entry.is_fresh(1_000, u64::MAX));
        assert!(entry.is_fresh(1_000, i64::MAX as u64 + 1));
    }

    #[tokio::test]
    async fn test_huge_ttl_serves_from_cache() {
        let cache = PriceCache::new(u64::MAX);
        cache.insert("BTC/USD", reading(100.0), 0).await;
        assert_eq!(cache.fresh("BTC/USD", 86_400_000).await.unwrap().price, 100.0);
    }
}
