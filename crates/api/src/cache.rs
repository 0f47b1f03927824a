//! Read-through query cache.
//!
//! Values are handler results serialized to JSON, keyed by strings the
//! queries build from their own filter/sort/page fields. Writes purge
//! entries either by exact key or by a plain substring sweep over stored
//! keys; keys embed the tenant id so entries never cross tenants.

use std::time::{Duration, Instant};

use moka::Expiry;
use moka::future::Cache;

/// Maximum number of cached query results.
const MAX_ENTRIES: u64 = 10_000;

/// A cached serialized query result plus its declared lifetime.
#[derive(Debug, Clone)]
struct CachedEntry {
    payload: String,
    ttl: Option<Duration>,
}

/// Expiry policy honoring each entry's declared TTL, with a fallback.
struct DeclaredTtl {
    default_ttl: Duration,
}

impl Expiry<String, CachedEntry> for DeclaredTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl.unwrap_or(self.default_ttl))
    }
}

/// Query result cache shared across all handlers.
///
/// Cheap to clone; the underlying moka cache is internally shared.
#[derive(Clone)]
pub struct QueryCache {
    inner: Cache<String, CachedEntry>,
}

impl QueryCache {
    /// Create a cache with the given default TTL for entries that declare none.
    #[must_use]
    pub fn new(default_ttl: Duration) -> Self {
        let inner = Cache::builder()
            .max_capacity(MAX_ENTRIES)
            .expire_after(DeclaredTtl { default_ttl })
            .support_invalidation_closures()
            .build();

        Self { inner }
    }

    /// Look up a serialized result by exact key.
    pub async fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key).await.map(|entry| entry.payload)
    }

    /// Store a serialized result under `key` with an optional declared TTL.
    pub async fn insert(&self, key: String, payload: String, ttl: Option<Duration>) {
        self.inner.insert(key, CachedEntry { payload, ttl }).await;
    }

    /// Remove a single entry by exact key.
    pub async fn remove(&self, key: &str) {
        self.inner.invalidate(key).await;
    }

    /// Remove every entry whose key contains `pattern` as a substring.
    ///
    /// Patterns are plain strings (e.g. `customers_list_t<tenant>`), not
    /// globs. The sweep is applied lazily by moka; reads observe it
    /// immediately.
    pub fn remove_matching(&self, pattern: &str) {
        let pattern = pattern.to_owned();
        if let Err(error) = self
            .inner
            .invalidate_entries_if(move |key, _| key.contains(&pattern))
        {
            tracing::warn!(%error, "cache pattern invalidation failed");
        }
    }

    /// Number of live entries (approximate, for diagnostics).
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn cache() -> QueryCache {
        QueryCache::new(Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_get_after_insert() {
        let cache = cache();
        cache
            .insert("customers_list_t1_p1".into(), "[]".into(), None)
            .await;
        assert_eq!(cache.get("customers_list_t1_p1").await.as_deref(), Some("[]"));
        assert_eq!(cache.get("customers_list_t1_p2").await, None);
    }

    #[tokio::test]
    async fn test_remove_exact_key() {
        let cache = cache();
        cache.insert("settings_t1".into(), "{}".into(), None).await;
        cache.remove("settings_t1").await;
        assert_eq!(cache.get("settings_t1").await, None);
    }

    #[tokio::test]
    async fn test_remove_matching_substring() {
        let cache = cache();
        cache
            .insert("customers_list_t1_p1".into(), "a".into(), None)
            .await;
        cache
            .insert("customers_list_t1_p2".into(), "b".into(), None)
            .await;
        cache
            .insert("services_list_t1_p1".into(), "c".into(), None)
            .await;
        cache.inner.run_pending_tasks().await;

        cache.remove_matching("customers_list_t1");
        cache.inner.run_pending_tasks().await;

        assert_eq!(cache.get("customers_list_t1_p1").await, None);
        assert_eq!(cache.get("customers_list_t1_p2").await, None);
        assert_eq!(cache.get("services_list_t1_p1").await.as_deref(), Some("c"));
    }

    #[tokio::test]
    async fn test_declared_ttl_expires() {
        let cache = cache();
        cache
            .insert(
                "slots_t1_e1".into(),
                "x".into(),
                Some(Duration::from_millis(20)),
            )
            .await;
        assert!(cache.get("slots_t1_e1").await.is_some());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(cache.get("slots_t1_e1").await, None);
    }
}
