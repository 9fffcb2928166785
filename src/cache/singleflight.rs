//! Per-key deduplication of in-flight async work.
//!
//! [`SingleFlight`] keeps a registry of pending operations keyed by `K`.
//! The first caller for a key starts the work; callers arriving while it
//! is pending await the same [`Shared`] future and receive a clone of its
//! output. The registry entry is removed by the flight itself when the
//! work completes, so whichever caller polls it to completion also cleans
//! up, even if the starting caller was dropped.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};

use crate::telemetry;

type Flight<V> = Shared<BoxFuture<'static, V>>;
type Registry<K, V> = Arc<Mutex<HashMap<K, Flight<V>>>>;

/// Registry of pending operations, at most one per key.
pub struct SingleFlight<K, V> {
    pending: Registry<K, V>,
}

impl<K, V> SingleFlight<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Run `work` for `key`, or join the flight already pending for it.
    ///
    /// `work` is only invoked when this call starts a new flight. It is
    /// called with the registry lock held and must only construct the
    /// future, not drive it.
    pub async fn run<F, Fut>(&self, key: K, work: F) -> V
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = V> + Send + 'static,
    {
        let flight = {
            let mut pending = lock(&self.pending);
            match pending.get(&key) {
                Some(flight) => {
                    metrics::counter!(telemetry::COALESCED_TOTAL).increment(1);
                    flight.clone()
                }
                None => {
                    let registry = Arc::clone(&self.pending);
                    let owned_key = key.clone();
                    let fut = work();
                    let flight = async move {
                        let value = fut.await;
                        lock(&registry).remove(&owned_key);
                        value
                    }
                    .boxed()
                    .shared();
                    pending.insert(key, flight.clone());
                    flight
                }
            }
        };
        flight.await
    }

    /// Whether a flight is pending for `key`.
    pub fn is_pending(&self, key: &K) -> bool {
        lock(&self.pending).contains_key(key)
    }

    /// Number of keys with a pending flight.
    pub fn in_flight(&self) -> usize {
        lock(&self.pending).len()
    }
}

impl<K, V> Default for SingleFlight<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
