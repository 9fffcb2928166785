//! Integration tests for [`TagCache`]: TTL expiry, LRU capacity eviction
//! and single-flight coalescing.

use std::future::Ready;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::json;

use huginn::{CacheConfig, FetchError, Ocid, TagCache, TagCategory, TagSet, Tags};

type Lookup = Result<TagSet, FetchError>;

fn ocid(n: usize) -> Ocid {
    format!("ocid1.instance.oc1.phx.aaaa{n}").parse().unwrap()
}

fn tags(value: &str) -> TagSet {
    let mut freeform = Tags::new();
    freeform.insert("env".into(), json!(value));
    TagSet::new().with(TagCategory::Freeform, freeform)
}

/// Counts calls and returns `tags("v<call number>")`.
fn counting(calls: &Arc<AtomicUsize>) -> impl FnOnce(Ocid) -> Ready<Lookup> + Send + 'static {
    let calls = Arc::clone(calls);
    move |_id| {
        let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
        std::future::ready(Ok(tags(&format!("v{n}"))))
    }
}

// =============================================================================
// Hits, misses and TTL
// =============================================================================

#[tokio::test]
async fn hit_does_not_refetch() {
    let cache = TagCache::default();
    let calls = Arc::new(AtomicUsize::new(0));
    let id = ocid(1);

    let first = cache.resolve(&id, counting(&calls)).await.unwrap();
    let second = cache.resolve(&id, counting(&calls)).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(cache.contains(&id));
}

#[tokio::test]
async fn expired_entry_is_refetched() {
    let cache = TagCache::new(&CacheConfig::new().ttl(Duration::from_millis(100)));
    let calls = Arc::new(AtomicUsize::new(0));
    let id = ocid(1);

    let first = cache.resolve(&id, counting(&calls)).await.unwrap();
    assert_eq!(first, tags("v1"));

    // moka uses its own clock; a real sleep is needed.
    std::thread::sleep(Duration::from_millis(250));

    assert!(!cache.contains(&id));
    let second = cache.resolve(&id, counting(&calls)).await.unwrap();
    assert_eq!(second, tags("v2"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn zero_ttl_never_serves_from_cache() {
    let cache = TagCache::new(&CacheConfig::new().ttl(Duration::ZERO));
    let calls = Arc::new(AtomicUsize::new(0));
    let id = ocid(1);

    cache.resolve(&id, counting(&calls)).await.unwrap();
    cache.resolve(&id, counting(&calls)).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(!cache.contains(&id));
}

// =============================================================================
// Capacity
// =============================================================================

#[tokio::test]
async fn inserting_past_capacity_evicts_the_oldest_key() {
    let cache = TagCache::new(&CacheConfig::new().max_entries(2));
    let calls = Arc::new(AtomicUsize::new(0));

    for n in 1..=3 {
        cache.resolve(&ocid(n), counting(&calls)).await.unwrap();
    }
    assert_eq!(cache.len(), 2);
    assert!(!cache.contains(&ocid(1)));
    assert!(cache.contains(&ocid(2)));
    assert!(cache.contains(&ocid(3)));

    cache.resolve(&ocid(1), counting(&calls)).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn hit_refreshes_recency() {
    let cache = TagCache::new(&CacheConfig::new().max_entries(2));
    let calls = Arc::new(AtomicUsize::new(0));

    cache.resolve(&ocid(1), counting(&calls)).await.unwrap();
    cache.resolve(&ocid(2), counting(&calls)).await.unwrap();

    // Touch 1 so that 2 becomes least recently used.
    cache.resolve(&ocid(1), counting(&calls)).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    cache.resolve(&ocid(3), counting(&calls)).await.unwrap();

    assert_eq!(cache.len(), 2);
    assert!(cache.contains(&ocid(1)));
    assert!(!cache.contains(&ocid(2)));
    assert!(cache.contains(&ocid(3)));
}

#[tokio::test]
async fn invalidate_and_clear() {
    let cache = TagCache::default();
    let calls = Arc::new(AtomicUsize::new(0));

    for n in 0..3 {
        cache.resolve(&ocid(n), counting(&calls)).await.unwrap();
    }
    cache.invalidate(&ocid(0));
    assert!(!cache.contains(&ocid(0)));
    assert!(cache.contains(&ocid(1)));

    cache.clear();
    assert!(cache.is_empty());
}

// =============================================================================
// Single flight
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_resolves_fetch_once() {
    let cache = Arc::new(TagCache::default());
    let calls = Arc::new(AtomicUsize::new(0));
    let id = ocid(7);

    let mut handles = Vec::new();
    for _ in 0..16 {
        let cache = Arc::clone(&cache);
        let calls = Arc::clone(&calls);
        let id = id.clone();
        handles.push(tokio::spawn(async move {
            cache
                .resolve(&id, move |_| async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    Ok(tags("shared"))
                })
                .await
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), tags("shared"));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!cache.is_pending(&id));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn waiters_share_a_failure_and_it_is_not_cached() {
    let cache = Arc::new(TagCache::default());
    let calls = Arc::new(AtomicUsize::new(0));
    let id = ocid(9);

    let mut handles = Vec::new();
    for _ in 0..4 {
        let cache = Arc::clone(&cache);
        let calls = Arc::clone(&calls);
        let id = id.clone();
        handles.push(tokio::spawn(async move {
            cache
                .resolve(&id, move |id| async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    Err(FetchError::NotFound(id.to_string()))
                })
                .await
        }));
    }
    for handle in handles {
        assert!(matches!(handle.await.unwrap(), Err(FetchError::NotFound(_))));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!cache.contains(&id));

    // The next resolve starts a fresh lookup.
    let recovered = cache.resolve(&id, counting(&calls)).await.unwrap();
    assert_eq!(recovered, tags("v2"));
    assert!(cache.contains(&id));
}

#[tokio::test]
async fn distinct_identifiers_fetch_independently() {
    let cache = TagCache::default();
    let calls = Arc::new(AtomicUsize::new(0));

    let (id1, id2) = (ocid(1), ocid(2));
    let (a, b) = tokio::join!(
        cache.resolve(&id1, counting(&calls)),
        cache.resolve(&id2, counting(&calls)),
    );
    assert!(a.is_ok() && b.is_ok());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
