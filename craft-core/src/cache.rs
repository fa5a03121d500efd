//! Memo stores and per-key in-flight locks.
//!
//! The dispatcher never owns a hidden global: it is handed a [`MemoStore`] per
//! operation. [`UnboundedStore`] keeps everything for the life of the process;
//! [`LruStore`] is the bounded alternative.

use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Arc;

use dashmap::DashMap;
use lru::LruCache;
use parking_lot::Mutex;
use tokio::sync::OwnedMutexGuard;

/// Key-value store for finished results. Writes are idempotent: a key always maps to the
/// same value, so a duplicate insert is harmless.
pub trait MemoStore<K, V>: Send + Sync {
    /// Cached value for `key`, if any.
    fn get(&self, key: &K) -> Option<V>;
    /// Remember `value` under `key`.
    fn insert(&self, key: K, value: V);
    /// Number of cached entries.
    fn len(&self) -> usize;
    /// Drop every entry.
    fn clear(&self);

    /// Whether nothing is cached.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Thread-safe map with no eviction and no expiry.
pub struct UnboundedStore<K, V> {
    entries: DashMap<K, V>,
}

impl<K: Eq + Hash, V> UnboundedStore<K, V> {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl<K: Eq + Hash, V> Default for UnboundedStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> MemoStore<K, V> for UnboundedStore<K, V>
where
    K: Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    fn get(&self, key: &K) -> Option<V> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn insert(&self, key: K, value: V) {
        self.entries.insert(key, value);
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn clear(&self) {
        self.entries.clear();
    }
}

/// Bounded store that evicts the least recently used entry once full.
pub struct LruStore<K: Eq + Hash, V> {
    entries: Mutex<LruCache<K, V>>,
}

impl<K: Eq + Hash, V> LruStore<K, V> {
    /// Create a store holding at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }
}

impl<K, V> MemoStore<K, V> for LruStore<K, V>
where
    K: Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    fn get(&self, key: &K) -> Option<V> {
        self.entries.lock().get(key).cloned()
    }

    fn insert(&self, key: K, value: V) {
        self.entries.lock().put(key, value);
    }

    fn len(&self) -> usize {
        self.entries.lock().len()
    }

    fn clear(&self) {
        self.entries.lock().clear();
    }
}

/// Build the store selected by configuration: bounded when `max_entries` is set.
#[must_use]
pub fn store_for<K, V>(max_entries: Option<NonZeroUsize>) -> Arc<dyn MemoStore<K, V>>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    match max_entries {
        Some(capacity) => Arc::new(LruStore::new(capacity)),
        None => Arc::new(UnboundedStore::new()),
    }
}

/// Per-key async locks so only one caller computes a missing key at a time.
///
/// A lock entry lives only while someone holds or waits on it.
pub struct InFlight<K> {
    locks: DashMap<K, Arc<tokio::sync::Mutex<()>>>,
}

impl<K: Eq + Hash + Clone> InFlight<K> {
    /// Create an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Wait for exclusive use of `key`.
    ///
    /// Dropping the returned future while it waits leaves the table as if the
    /// caller had never asked.
    pub async fn acquire(&self, key: &K) -> FlightGuard<'_, K> {
        let lock = Arc::clone(self.locks.entry(key.clone()).or_default().value());
        // Built before waiting so a cancelled waiter still runs the cleanup in `Drop`.
        let mut flight = FlightGuard {
            table: self,
            key: key.clone(),
            lock,
            guard: None,
        };
        let guard = Arc::clone(&flight.lock).lock_owned().await;
        flight.guard = Some(guard);
        flight
    }

    /// Number of keys currently locked or awaited.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Whether no key is in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl<K: Eq + Hash + Clone> Default for InFlight<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Held while computing a key; releasing it wakes the next waiter.
///
/// Also stands in for a caller still queued on the key, with `guard` unset.
pub struct FlightGuard<'a, K: Eq + Hash + Clone> {
    table: &'a InFlight<K>,
    key: K,
    lock: Arc<tokio::sync::Mutex<()>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl<K: Eq + Hash + Clone> Drop for FlightGuard<'_, K> {
    fn drop(&mut self) {
        // Unlock before counting holders: `guard` holds its own clone of the Arc.
        self.guard.take();
        // Remaining references: the table's and ours. Anyone else is still waiting.
        self.table.locks.remove_if(&self.key, |_, lock| {
            Arc::ptr_eq(lock, &self.lock) && Arc::strong_count(lock) <= 2
        });
    }
}
