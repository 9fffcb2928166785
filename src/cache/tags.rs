//! Bounded TTL cache of resource tags with single-flight lookups.
//!
//! # Per-key lifecycle
//!
//! `absent → pending → present (until TTL) → expired | evicted → absent`
//!
//! - A present, unexpired entry is returned without calling the fetcher.
//! - A miss starts a lookup through [`SingleFlight`], or joins the one
//!   already pending for that identifier, so concurrent resolves of one
//!   key cause exactly one fetch and all share its outcome.
//! - Successful lookups are stored with a fresh insertion time before the
//!   flight is released. Failures are never stored; the next resolve
//!   fetches again.
//! - Capacity is enforced by moka with the LRU eviction policy: reads and
//!   inserts both refresh recency. Expired entries are never served.
//!
//! moka applies eviction bookkeeping in batches. The cache settles it
//! after every insert and removal, so the capacity bound and [`TagCache::len`]
//! hold at once; only expired entries linger in the count until the next
//! housekeeping pass (they are never served).

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use tracing::debug;

use super::singleflight::SingleFlight;
use crate::error::FetchError;
use crate::fetcher::TagFetcher;
use crate::telemetry;
use crate::types::{Ocid, TagSet};

type Lookup = Result<TagSet, FetchError>;

/// Longest TTL the backing store accepts (1000 years).
pub const MAX_TTL: Duration = Duration::from_secs(1000 * 365 * 24 * 3600);

/// Configuration for the tag cache.
///
/// ```rust
/// # use huginn::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new()
///     .max_entries(1_024)
///     .ttl(Duration::from_secs(600));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of cached identifiers. Default: 512.
    pub max_entries: u64,
    /// Time-to-live for cached tag sets. Zero disables retention.
    /// Values above [`MAX_TTL`] are clamped. Default: 8 hours.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 512,
            ttl: Duration::from_secs(8 * 3600),
        }
    }
}

impl CacheConfig {
    /// Create a new config with the default capacity and TTL.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of cached entries.
    pub fn max_entries(mut self, n: u64) -> Self {
        self.max_entries = n;
        self
    }

    /// Set the time-to-live for cached entries.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// Process-wide cache of raw tag sets keyed by OCID.
///
/// Share one instance (behind an `Arc`) across all concurrent requests.
pub struct TagCache {
    entries: Cache<Ocid, TagSet>,
    flights: SingleFlight<Ocid, Lookup>,
    retain: bool,
}

impl TagCache {
    /// Create an empty cache.
    pub fn new(config: &CacheConfig) -> Self {
        let retain = !config.ttl.is_zero();
        let mut builder = Cache::builder()
            .max_capacity(config.max_entries)
            .eviction_policy(EvictionPolicy::lru());
        if retain {
            builder = builder.time_to_live(config.ttl.min(MAX_TTL));
        }
        Self {
            entries: builder.build(),
            flights: SingleFlight::new(),
            retain,
        }
    }

    /// Return the tags for `id`, calling `fetch` only on a miss.
    ///
    /// `fetch` is not called when another resolve for the same identifier
    /// is already pending; that caller's outcome is returned instead.
    pub async fn resolve<F, Fut>(&self, id: &Ocid, fetch: F) -> Lookup
    where
        F: FnOnce(Ocid) -> Fut + Send + 'static,
        Fut: Future<Output = Lookup> + Send + 'static,
    {
        if let Some(tags) = self.entries.get(id) {
            metrics::counter!(telemetry::CACHE_HITS_TOTAL).increment(1);
            debug!(ocid = %id, "tag cache hit");
            return Ok(tags);
        }
        metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);

        let entries = self.entries.clone();
        let retain = self.retain;
        let key = id.clone();
        self.flights
            .run(id.clone(), move || async move {
                // A flight that finished just before this one was registered
                // has already stored its result.
                if let Some(tags) = entries.get(&key) {
                    return Ok(tags);
                }
                let started = Instant::now();
                let result = fetch(key.clone()).await;
                metrics::histogram!(telemetry::FETCH_DURATION_SECONDS)
                    .record(started.elapsed().as_secs_f64());
                match &result {
                    Ok(tags) => {
                        metrics::counter!(telemetry::FETCHES_TOTAL, "status" => "ok").increment(1);
                        debug!(ocid = %key, "fetched tags");
                        if retain {
                            entries.insert(key, tags.clone());
                            // Settle eviction now so capacity holds on every insert.
                            entries.run_pending_tasks();
                        }
                    }
                    Err(e) => {
                        metrics::counter!(telemetry::FETCHES_TOTAL, "status" => "error")
                            .increment(1);
                        debug!(ocid = %key, error = %e, "tag fetch failed");
                    }
                }
                result
            })
            .await
    }

    /// [`resolve`](Self::resolve) using a shared [`TagFetcher`].
    pub async fn resolve_with(&self, id: &Ocid, fetcher: &Arc<dyn TagFetcher>) -> Lookup {
        let fetcher = Arc::clone(fetcher);
        self.resolve(id, move |id| async move { fetcher.fetch(&id).await })
            .await
    }

    /// Whether an unexpired entry exists for `id` (does not touch recency).
    pub fn contains(&self, id: &Ocid) -> bool {
        self.entries.contains_key(id)
    }

    /// Whether a lookup for `id` is currently in flight.
    pub fn is_pending(&self, id: &Ocid) -> bool {
        self.flights.is_pending(id)
    }

    /// Drop the entry for `id`, if any.
    pub fn invalidate(&self, id: &Ocid) {
        self.entries.invalidate(id);
        self.entries.run_pending_tasks();
    }

    /// Drop all entries.
    pub fn clear(&self) {
        self.entries.invalidate_all();
        self.entries.run_pending_tasks();
    }

    /// Apply pending eviction and expiry bookkeeping.
    pub fn run_pending_tasks(&self) {
        self.entries.run_pending_tasks();
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> u64 {
        self.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TagCache {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_match_function_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.max_entries, 512);
        assert_eq!(config.ttl, Duration::from_secs(28_800));
    }

    #[test]
    fn config_builder_pattern() {
        let config = CacheConfig::new()
            .max_entries(10)
            .ttl(Duration::from_secs(5));
        assert_eq!(config.max_entries, 10);
        assert_eq!(config.ttl, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn miss_then_hit() {
        let cache = TagCache::default();
        let id: Ocid = "ocid1.tenancy.oc1..aaaa".parse().unwrap();

        let first = cache
            .resolve(&id, |_| async { Ok::<_, FetchError>(TagSet::new()) })
            .await;
        assert_eq!(first, Ok(TagSet::new()));
        assert!(cache.contains(&id));

        let second = cache
            .resolve(&id, |_| async {
                Err(FetchError::Transient("should not be called".into()))
            })
            .await;
        assert_eq!(second, Ok(TagSet::new()));
    }

    #[tokio::test]
    async fn zero_ttl_never_retains() {
        let cache = TagCache::new(&CacheConfig::new().ttl(Duration::ZERO));
        let id: Ocid = "ocid1.tenancy.oc1..aaaa".parse().unwrap();
        cache
            .resolve(&id, |_| async { Ok::<_, FetchError>(TagSet::new()) })
            .await
            .unwrap();
        assert!(!cache.contains(&id));
    }

    #[tokio::test]
    async fn oversized_ttl_is_clamped() {
        let cache = TagCache::new(&CacheConfig::new().ttl(Duration::from_secs(u64::MAX)));
        let id: Ocid = "ocid1.tenancy.oc1..aaaa".parse().unwrap();
        cache
            .resolve(&id, |_| async { Ok::<_, FetchError>(TagSet::new()) })
            .await
            .unwrap();
        assert!(cache.contains(&id));
    }
}
