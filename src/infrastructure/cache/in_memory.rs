//! In-memory cache implementation using moka
//!
//! Expiry is decided per entry from its own `expires_at`, checked on read
//! against the injected clock. Expired entries are removed when they are
//! next read. There is no background sweep; the capacity bound is the only
//! other eviction.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache as MokaCache;

use crate::domain::cache::{Cache, DEFAULT_CACHE_TTL};
use crate::domain::{Clock, DomainError, SystemClock};

/// Configuration for in-memory cache
#[derive(Debug, Clone)]
pub struct InMemoryCacheConfig {
    /// Maximum number of entries
    pub max_capacity: u64,
    /// TTL used when callers do not pick one
    pub default_ttl: Duration,
}

impl Default for InMemoryCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            default_ttl: DEFAULT_CACHE_TTL,
        }
    }
}

impl InMemoryCacheConfig {
    pub fn with_max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = capacity;
        self
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }
}

/// Cache entry stored in moka
#[derive(Debug, Clone)]
struct CacheEntry {
    /// Serialized JSON value
    data: String,
    /// Expiration timestamp (millis since epoch)
    expires_at: u64,
}

/// Thread-safe in-memory TTL cache
#[derive(Debug)]
pub struct InMemoryCache {
    cache: MokaCache<String, CacheEntry>,
    config: InMemoryCacheConfig,
    clock: Arc<dyn Clock>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::with_config(InMemoryCacheConfig::default())
    }

    pub fn with_config(config: InMemoryCacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: InMemoryCacheConfig, clock: Arc<dyn Clock>) -> Self {
        let cache = MokaCache::builder()
            .max_capacity(config.max_capacity)
            .build();

        Self {
            cache,
            config,
            clock,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.config.default_ttl
    }

    fn is_expired(&self, entry: &CacheEntry) -> bool {
        self.clock.now_millis() > entry.expires_at
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
        match self.cache.get(key).await {
            Some(entry) => {
                if self.is_expired(&entry) {
                    self.cache.remove(key).await;
                    return Ok(None);
                }

                Ok(Some(entry.data))
            }
            None => Ok(None),
        }
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
        let expires_at = self
            .clock
            .now_millis()
            .saturating_add(ttl.as_millis() as u64);
        let entry = CacheEntry {
            data: value.to_string(),
            expires_at,
        };

        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn size(&self) -> Result<usize, DomainError> {
        self.cache.run_pending_tasks().await;
        Ok(self.cache.entry_count() as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::CacheExt;
    use crate::domain::clock::mock::ManualClock;

    fn cache_with_clock() -> (InMemoryCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let cache = InMemoryCache::with_clock(InMemoryCacheConfig::default(), clock.clone());
        (cache, clock)
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = InMemoryCache::new();

        cache
            .set("key1", &"value1", Duration::from_secs(60))
            .await
            .unwrap();

        let result: Option<String> = cache.get("key1").await.unwrap();
        assert_eq!(result, Some("value1".to_string()));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let cache = InMemoryCache::new();

        let result: Option<String> = cache.get("missing").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_hit_just_before_ttl_and_miss_just_after() {
        let (cache, clock) = cache_with_clock();

        cache.set("k", &"v", DEFAULT_CACHE_TTL).await.unwrap();

        clock.advance(Duration::from_secs(4 * 60 + 59));
        let result: Option<String> = cache.get("k").await.unwrap();
        assert_eq!(result.as_deref(), Some("v"));

        clock.advance(Duration::from_secs(2));
        let result: Option<String> = cache.get("k").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_removed_on_access() {
        let (cache, clock) = cache_with_clock();

        cache.set("k", &"v", Duration::from_millis(10)).await.unwrap();
        assert_eq!(cache.size().await.unwrap(), 1);

        clock.advance(Duration::from_millis(11));
        let _: Option<String> = cache.get("k").await.unwrap();

        assert_eq!(cache.size().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_expired_entry_stays_until_touched() {
        let (cache, clock) = cache_with_clock();

        cache.set("idle", &"v", Duration::from_millis(10)).await.unwrap();
        clock.advance(Duration::from_secs(60));

        assert_eq!(cache.size().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_set_overwrites_and_refreshes_ttl() {
        let (cache, clock) = cache_with_clock();

        cache.set("k", &"old", Duration::from_secs(1)).await.unwrap();
        clock.advance(Duration::from_millis(900));
        cache.set("k", &"new", Duration::from_secs(1)).await.unwrap();
        clock.advance(Duration::from_millis(900));

        let result: Option<String> = cache.get("k").await.unwrap();
        assert_eq!(result.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_complex_types() {
        let cache = InMemoryCache::new();

        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        struct TestData {
            name: String,
            values: Vec<i32>,
        }

        let data = TestData {
            name: "test".to_string(),
            values: vec![1, 2, 3],
        };

        cache
            .set("complex", &data, Duration::from_secs(60))
            .await
            .unwrap();

        let result: Option<TestData> = cache.get("complex").await.unwrap();
        assert_eq!(result, Some(data));
    }

    #[tokio::test]
    async fn test_config() {
        let config = InMemoryCacheConfig::default()
            .with_max_capacity(100)
            .with_default_ttl(Duration::from_secs(30));

        let cache = InMemoryCache::with_config(config);

        assert_eq!(cache.config.max_capacity, 100);
        assert_eq!(cache.default_ttl(), Duration::from_secs(30));
    }
}
