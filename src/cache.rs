//! Bounded time-to-live cache shared across concurrent requests.
//!
//! Reads use `peek`, so they never refresh an entry's position: the entry
//! evicted at capacity is always the one written longest ago. Entries are
//! immutable once stored; a racing write to the same key simply replaces the
//! value (both writers computed an equally valid answer).

use lru::LruCache;
use parking_lot::Mutex;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::time::Duration;
use tokio::time::Instant;

struct CacheEntry<V> {
    timestamp: Instant,
    value: V,
}

pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<LruCache<K, CacheEntry<V>>>,
}

impl<K: Hash + Eq, V: Clone> TtlCache<K, V> {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            ttl,
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Fresh value for `key`, dropping it if it has outlived the TTL.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock();
        let expired = match entries.peek(key) {
            Some(entry) if entry.timestamp.elapsed() < self.ttl => {
                return Some(entry.value.clone())
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(key);
        }
        None
    }

    pub fn insert(&self, key: K, value: V) {
        self.entries.lock().push(
            key,
            CacheEntry {
                timestamp: Instant::now(),
                value,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}
