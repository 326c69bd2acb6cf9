//! Derived-result cache using moka
//!
//! Holds results computed from model descriptors (query answers, planned
//! layouts). Any rollback of a descriptor write invalidates every entry,
//! since the results may have been computed from the discarded state.

use mdc_model::CacheInvalidator;
use moka::future::Cache;
use serde_json::Value;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Key of a derived result: the model it was computed from plus the request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DerivedKey {
    /// Model name
    pub model: String,

    /// Request text the result answers
    pub query: String,
}

impl DerivedKey {
    /// Create new key
    #[inline]
    #[must_use]
    pub fn new(model: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            query: query.into(),
        }
    }
}

/// Statistics for cache monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of entries in cache
    pub entry_count: u64,

    /// Number of full wipes so far
    pub wipes: u64,
}

/// Cache of derived results
#[derive(Debug, Clone)]
pub struct DerivedCache {
    inner: Cache<DerivedKey, Arc<Value>>,
    wipes: Arc<AtomicU64>,
}

impl DerivedCache {
    /// Create new cache with max capacity
    #[inline]
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: Cache::new(max_capacity),
            wipes: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Create cache with time-based expiration
    #[inline]
    #[must_use]
    pub fn with_ttl(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
            wipes: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Create cache from capacity and optional time-to-live
    #[must_use]
    pub fn configured(max_capacity: u64, ttl: Option<Duration>) -> Self {
        match ttl {
            Some(ttl) => Self::with_ttl(max_capacity, ttl),
            None => Self::new(max_capacity),
        }
    }

    /// Insert a result
    #[inline]
    pub async fn insert(&self, key: DerivedKey, value: Value) {
        self.inner.insert(key, Arc::new(value)).await;
    }

    /// Get a result
    #[inline]
    pub async fn get(&self, key: &DerivedKey) -> Option<Arc<Value>> {
        self.inner.get(key).await
    }

    /// Get or compute a result
    pub async fn get_or_insert_with<F, Fut>(&self, key: DerivedKey, f: F) -> Arc<Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Value>,
    {
        if let Some(cached) = self.get(&key).await {
            return cached;
        }

        let value = Arc::new(f().await);
        self.inner.insert(key, Arc::clone(&value)).await;
        value
    }

    /// Check if cache holds a key
    #[inline]
    pub async fn contains(&self, key: &DerivedKey) -> bool {
        self.inner.get(key).await.is_some()
    }

    /// Number of full wipes so far
    #[inline]
    #[must_use]
    pub fn wipe_count(&self) -> u64 {
        self.wipes.load(Ordering::Acquire)
    }

    /// Get cache statistics
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.inner.entry_count(),
            wipes: self.wipe_count(),
        }
    }
}

impl Default for DerivedCache {
    /// Create cache with default capacity (10,000 entries)
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl CacheInvalidator for DerivedCache {
    fn invalidate_derived_caches(&self) {
        self.inner.invalidate_all();
        let wipes = self.wipes.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::info!(wipes, "invalidated derived caches");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn insert_and_get() {
        let cache = DerivedCache::new(100);
        let key = DerivedKey::new("sales", "select count(*)");

        cache.insert(key.clone(), json!({"rows": 42})).await;
        assert_eq!(cache.get(&key).await.map(|v| v["rows"].clone()), Some(json!(42)));
    }

    #[tokio::test]
    async fn get_or_insert_computes_once() {
        let cache = DerivedCache::new(100);
        let key = DerivedKey::new("sales", "q");
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let calls = Arc::clone(&calls);
            cache
                .get_or_insert_with(key.clone(), || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    json!(1)
                })
                .await;
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidation_wipes_and_counts() {
        let cache = DerivedCache::default();
        let key = DerivedKey::new("sales", "q");
        cache.insert(key.clone(), json!(1)).await;

        cache.invalidate_derived_caches();

        assert!(!cache.contains(&key).await);
        assert_eq!(cache.wipe_count(), 1);
    }

    #[tokio::test]
    async fn clones_share_wipe_counter() {
        let cache = DerivedCache::with_ttl(10, Duration::from_secs(60));
        let clone = cache.clone();

        clone.invalidate_derived_caches();
        assert_eq!(cache.stats().wipes, 1);
    }

    #[tokio::test]
    async fn configured_without_ttl_keeps_entries() {
        let cache = DerivedCache::configured(10, None);
        let key = DerivedKey::new("sales", "q");
        cache.insert(key.clone(), json!(1)).await;

        assert!(cache.contains(&key).await);
        assert_eq!(cache.stats().wipes, 0);
    }
}
