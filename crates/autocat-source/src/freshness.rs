//! Cross-request staleness budgets for upstream reads.
//!
//! Every read carries a [`Freshness`] window. [`ResponseCache`] keeps raw
//! response bodies keyed by request URL and serves them while they are younger
//! than the window the caller asked for. Turning the cache off only costs
//! upstream round-trips; results are identical.

use std::sync::Arc;
use std::time::{Duration, Instant};

use cached::{Cached, TimedSizedCache};
use tokio::sync::Mutex;

/// Maximum staleness tolerated for one cached upstream read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Freshness(Duration);

impl Freshness {
    /// Taxonomy trees and category lists change rarely.
    pub const TAXONOMY: Freshness = Freshness(Duration::from_secs(900));
    /// Listings carry price and availability, so they go stale sooner.
    pub const LISTING: Freshness = Freshness(Duration::from_secs(300));
    /// Always refetch.
    pub const NONE: Freshness = Freshness(Duration::ZERO);

    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self(window)
    }

    #[must_use]
    pub const fn window(self) -> Duration {
        self.0
    }
}

/// Entries kept when no explicit capacity is configured.
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
struct CachedBody {
    fetched_at: Instant,
    body: Arc<str>,
}

/// URL-keyed cache for upstream response bodies.
///
/// Bounded in both directions: at most `capacity` entries (least recently used
/// go first) and nothing outlives `lifespan`, the longest window any reader
/// asks for. Shorter windows are checked per read against the fetch time.
#[derive(Clone)]
pub struct ResponseCache {
    enabled: bool,
    entries: Arc<Mutex<TimedSizedCache<String, CachedBody>>>,
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

impl ResponseCache {
    /// A cache sized for the default taxonomy window.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self::bounded(enabled, DEFAULT_CACHE_CAPACITY, Freshness::TAXONOMY.window())
    }

    /// `capacity` is clamped to at least one entry and `lifespan` to at least
    /// one second.
    #[must_use]
    pub fn bounded(enabled: bool, capacity: usize, lifespan: Duration) -> Self {
        let store =
            TimedSizedCache::with_size_and_lifespan(capacity.max(1), lifespan.as_secs().max(1));
        Self {
            enabled,
            entries: Arc::new(Mutex::new(store)),
        }
    }

    #[must_use]
    pub fn disabled() -> Self {
        Self::new(false)
    }

    /// Returns the cached body for `key` if it is younger than `freshness`.
    pub async fn get(&self, key: &str, freshness: Freshness) -> Option<Arc<str>> {
        if !self.enabled || freshness.window().is_zero() {
            return None;
        }
        let mut entries = self.entries.lock().await;
        let entry = entries.cache_get(&key.to_string())?;
        if entry.fetched_at.elapsed() < freshness.window() {
            tracing::debug!(key, "upstream cache hit");
            Some(Arc::clone(&entry.body))
        } else {
            None
        }
    }

    pub async fn put(&self, key: &str, body: Arc<str>) {
        if !self.enabled {
            return;
        }
        let mut entries = self.entries.lock().await;
        entries.cache_set(
            key.to_string(),
            CachedBody {
                fetched_at: Instant::now(),
                body,
            },
        );
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_entry_within_window() {
        let cache = ResponseCache::new(true);
        cache.put("k", Arc::from("body")).await;
        let hit = cache.get("k", Freshness::TAXONOMY).await;
        assert_eq!(hit.as_deref(), Some("body"));
    }

    #[tokio::test]
    async fn zero_window_always_misses() {
        let cache = ResponseCache::new(true);
        cache.put("k", Arc::from("body")).await;
        assert!(cache.get("k", Freshness::NONE).await.is_none());
    }

    #[tokio::test]
    async fn expired_entry_misses() {
        let cache = ResponseCache::new(true);
        cache.put("k", Arc::from("body")).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(cache
            .get("k", Freshness::new(Duration::from_millis(5)))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn disabled_cache_never_stores() {
        let cache = ResponseCache::disabled();
        cache.put("k", Arc::from("body")).await;
        assert!(cache.get("k", Freshness::TAXONOMY).await.is_none());
    }

    #[tokio::test]
    async fn capacity_evicts_least_recently_used() {
        let cache = ResponseCache::bounded(true, 2, Duration::from_secs(60));
        for page in 1..=100 {
            cache
                .put(&format!("/products?page={page}"), Arc::from("[]"))
                .await;
        }
        assert!(cache.entries.lock().await.cache_size() <= 2);
        assert!(cache.get("/products?page=1", Freshness::LISTING).await.is_none());
        assert!(cache.get("/products?page=100", Freshness::LISTING).await.is_some());
    }

    #[test]
    fn listing_window_is_shorter_than_taxonomy_window() {
        assert!(Freshness::LISTING.window() < Freshness::TAXONOMY.window());
    }
}
