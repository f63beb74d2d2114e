//! Bounded, recency-evicting memoization with single-flight loading
//!
//! Each cache holds at most `capacity` computed values keyed by `K`. On a
//! miss the first caller becomes the loader for that key; callers arriving
//! while the load is running subscribe to a per-key broadcast channel and
//! receive the same result instead of starting duplicate work.
//!
//! The structural lock only guards the LRU map, the in-flight table and the
//! counters. It is never held across an `.await`, so slow loads (dataset
//! reads, image decoding) do not block lookups of other keys.

use lru::LruCache;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::errors::{LoadError, LoadResult};

/// Snapshot of cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub capacity: usize,
    pub len: usize,
    pub hits: u64,
    pub misses: u64,
    /// Loader invocations that ran to completion
    pub loads: u64,
    pub evictions: u64,
    /// Requests that joined a load already in flight
    pub coalesced: u64,
}

struct MemoState<K, V> {
    entries: LruCache<K, V>,
    in_flight: HashMap<K, broadcast::Sender<LoadResult<V>>>,
    stats: CacheStats,
}

/// Capacity-bounded LRU memo shared between request handlers
pub struct MemoCache<K, V> {
    name: &'static str,
    state: Arc<Mutex<MemoState<K, V>>>,
}

impl<K, V> Clone for MemoCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            state: Arc::clone(&self.state),
        }
    }
}

enum Role<V> {
    Loader(broadcast::Sender<LoadResult<V>>),
    Waiter(broadcast::Receiver<LoadResult<V>>),
}

/// Clears the in-flight marker if the loading future is dropped before it
/// finishes, so waiters are released and the next caller retries.
struct InFlightGuard<'a, K: Eq + Hash, V> {
    state: &'a Mutex<MemoState<K, V>>,
    key: Option<K>,
}

impl<K: Eq + Hash, V> InFlightGuard<'_, K, V> {
    fn disarm(mut self) {
        self.key = None;
    }
}

impl<K: Eq + Hash, V> Drop for InFlightGuard<'_, K, V> {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            state.in_flight.remove(&key);
        }
    }
}

impl<K, V> MemoCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Display + Send + 'static,
    V: Clone + Send + 'static,
{
    pub fn new(name: &'static str, capacity: NonZeroUsize) -> Self {
        let stats = CacheStats {
            capacity: capacity.get(),
            ..CacheStats::default()
        };
        Self {
            name,
            state: Arc::new(Mutex::new(MemoState {
                entries: LruCache::new(capacity),
                in_flight: HashMap::new(),
                stats,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoState<K, V>> {
        // Counters and map stay consistent even if a holder panicked
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Cached value for `key`, marking it most recently used
    pub fn get(&self, key: &K) -> Option<V> {
        let mut state = self.lock();
        let value = state.entries.get(key).cloned();
        if value.is_some() {
            state.stats.hits += 1;
        }
        value
    }

    /// Whether `key` is cached, without touching its recency
    pub fn contains(&self, key: &K) -> bool {
        self.lock().entries.contains(key)
    }

    fn store(name: &str, state: &mut MemoState<K, V>, key: K, value: V) {
        if let Some((evicted, _)) = state.entries.push(key.clone(), value) {
            if evicted != key {
                state.stats.evictions += 1;
                debug!("{} cache evicted {} to make room for {}", name, evicted, key);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        CacheStats {
            len: state.entries.len(),
            ..state.stats
        }
    }

    /// Return the cached value for `key` or run `load` to produce it.
    ///
    /// Successful results are cached; errors are handed to every waiter but
    /// not cached, so a later call retries.
    pub async fn get_or_load<F, Fut>(&self, key: K, load: F) -> LoadResult<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = LoadResult<V>>,
    {
        let sender = loop {
            let role = {
                let mut state = self.lock();
                if let Some(value) = state.entries.get(&key).cloned() {
                    state.stats.hits += 1;
                    trace!("{} cache hit for {}", self.name, key);
                    return Ok(value);
                }

                match state.in_flight.get(&key) {
                    Some(sender) => {
                        let receiver = sender.subscribe();
                        state.stats.coalesced += 1;
                        Role::Waiter(receiver)
                    }
                    None => {
                        let (sender, _) = broadcast::channel(1);
                        state.in_flight.insert(key.clone(), sender.clone());
                        state.stats.misses += 1;
                        Role::Loader(sender)
                    }
                }
            };

            match role {
                Role::Loader(sender) => break sender,
                Role::Waiter(mut receiver) => {
                    debug!("{} cache joining in-flight load for {}", self.name, key);
                    match receiver.recv().await {
                        Ok(result) => return result,
                        // Loader was cancelled; race for the key again
                        Err(_) => continue,
                    }
                }
            }
        };

        let guard = InFlightGuard {
            state: &self.state,
            key: Some(key.clone()),
        };

        let result = load().await;

        {
            let mut state = self.lock();
            state.stats.loads += 1;
            if let Ok(value) = &result {
                Self::store(self.name, &mut state, key.clone(), value.clone());
            }
            state.in_flight.remove(&key);
        }
        guard.disarm();

        // No receivers is fine: nobody else asked for this key
        let _ = sender.send(result.clone());
        result
    }
}

/// Run a blocking loader (dataset reads, image decoding) on the blocking pool
pub async fn run_blocking<T, F>(task: F) -> LoadResult<T>
where
    F: FnOnce() -> LoadResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| LoadError::internal(format!("blocking load task failed: {e}")))?
}
