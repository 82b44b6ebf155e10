//! Short-lived in-memory cache with single-flight fetches.
//!
//! Concurrent callers asking for the same key while a fetch is running await that one fetch
//! instead of starting their own. Completed values are reused until the TTL runs out. Failed
//! fetches are never stored, so the next caller tries again.
//!
//! Each fetch runs on its own task and settles its slot itself, so a fetch finishes (and releases
//! whatever it holds, such as an upstream permit) even when every caller waiting on it went away.

pub mod key;

use crate::error::MeteoHubError;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use log::debug;
use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

type SharedFetch<V> = Shared<BoxFuture<'static, Result<V, MeteoHubError>>>;
type Slots<K, V> = Arc<Mutex<HashMap<K, Slot<V>>>>;

enum Slot<V: Clone> {
    Ready { value: V, fetched_at: Instant },
    Pending { fetch_id: u64, fetch: SharedFetch<V> },
}

/// A keyed cache whose values expire `ttl` after they were fetched.
pub struct TtlCache<K, V: Clone> {
    ttl: Duration,
    slots: Slots<K, V>,
    next_fetch_id: AtomicU64,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// A TTL of zero disables reuse of completed values; in-flight fetches are still shared.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: Arc::new(Mutex::new(HashMap::new())),
            next_fetch_id: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached value for `key`, or runs `fetch` to produce it.
    ///
    /// `fetch` is only invoked when there is neither a fresh value nor a fetch in flight. The
    /// fetch is spawned, so dropping the returned future does not cancel it.
    pub async fn get_or_fetch<F, Fut>(&self, key: K, fetch: F) -> Result<V, MeteoHubError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, MeteoHubError>> + Send + 'static,
    {
        let shared = {
            let mut slots = self.slots.lock().await;
            match slots.get(&key) {
                Some(Slot::Ready { value, fetched_at }) if fetched_at.elapsed() < self.ttl => {
                    debug!("Cache hit for {:?}", key);
                    return Ok(value.clone());
                }
                Some(Slot::Pending { fetch, .. }) => {
                    debug!("Joining in-flight fetch for {:?}", key);
                    fetch.clone()
                }
                _ => {
                    debug!("Cache miss for {:?}", key);
                    let fetch_id = self.next_fetch_id.fetch_add(1, Ordering::Relaxed);
                    let in_flight = self.spawn_fetch(key.clone(), fetch_id, fetch());
                    slots.insert(
                        key,
                        Slot::Pending {
                            fetch_id,
                            fetch: in_flight.clone(),
                        },
                    );
                    in_flight
                }
            }
        };
        shared.await
    }

    /// Runs `fetch` on its own task. The task replaces its pending slot with the outcome before
    /// handing the outcome to the waiters.
    fn spawn_fetch<Fut>(&self, key: K, fetch_id: u64, fetch: Fut) -> SharedFetch<V>
    where
        Fut: Future<Output = Result<V, MeteoHubError>> + Send + 'static,
    {
        let slots = self.slots.clone();
        let ttl = self.ttl;
        let task = tokio::spawn(async move {
            let result = fetch.await;
            settle(&slots, &key, fetch_id, ttl, &result).await;
            result
        });
        async move {
            task.await.unwrap_or_else(|e| {
                Err(MeteoHubError::Internal(format!("cache fetch task failed: {}", e)))
            })
        }
        .boxed()
        .shared()
    }

    /// Number of stored entries, including in-flight fetches and expired values not yet purged.
    pub async fn len(&self) -> usize {
        self.slots.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.slots.lock().await.is_empty()
    }

    /// Drops every completed value. In-flight fetches keep running for their current waiters.
    pub async fn clear(&self) {
        self.slots
            .lock()
            .await
            .retain(|_, slot| matches!(slot, Slot::Pending { .. }));
    }

    /// Removes expired values, returning how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        let ttl = self.ttl;
        let mut slots = self.slots.lock().await;
        let before = slots.len();
        slots.retain(|_, slot| match slot {
            Slot::Ready { fetched_at, .. } => fetched_at.elapsed() < ttl,
            Slot::Pending { .. } => true,
        });
        before - slots.len()
    }
}

/// Stores the outcome of fetch `fetch_id`, provided its pending slot has not been replaced.
async fn settle<K, V>(
    slots: &Mutex<HashMap<K, Slot<V>>>,
    key: &K,
    fetch_id: u64,
    ttl: Duration,
    result: &Result<V, MeteoHubError>,
) where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    let mut slots = slots.lock().await;
    let owns_slot = matches!(
        slots.get(key),
        Some(Slot::Pending { fetch_id: current, .. }) if *current == fetch_id
    );
    if !owns_slot {
        return;
    }
    match result {
        Ok(value) if !ttl.is_zero() => {
            slots.insert(
                key.clone(),
                Slot::Ready {
                    value: value.clone(),
                    fetched_at: Instant::now(),
                },
            );
        }
        Ok(_) => {
            slots.remove(key);
        }
        Err(e) => {
            debug!("Not caching failed fetch for {:?}: {}", key, e);
            slots.remove(key);
        }
    }
}
