use dashmap::DashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
}

impl<V> CacheEntry<V> {
    fn new(value: V) -> Self {
        Self {
            value,
            stored_at: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() >= ttl
    }
}

type Slot<V> = Arc<Mutex<Option<CacheEntry<V>>>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Memoizes an async keyed lookup for a fixed time-to-live.
///
/// Each key owns its own async lock, held while the loader runs, so callers
/// racing on the same key wait for the first load instead of issuing their
/// own. Failed loads store nothing. Expired entries stay in place until the
/// next read of that key replaces them.
pub struct TtlCache<K, V> {
    name: &'static str,
    ttl: Duration,
    slots: DashMap<K, Slot<V>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self {
            name,
            ttl,
            slots: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns the cached value for `key`, or runs `loader` and stores its result.
    pub async fn get<F, Fut, E>(&self, key: K, loader: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        // The shard guard must be released before awaiting.
        let slot = Arc::clone(&*self.slots.entry(key.clone()).or_default());
        let mut entry = slot.lock().await;

        if let Some(cached) = entry.as_ref() {
            if !cached.is_expired(self.ttl) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!("{} cache hit for {:?}", self.name, key);
                return Ok(cached.value.clone());
            }
            debug!("{} cache entry for {:?} expired", self.name, key);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!("{} cache miss for {:?}", self.name, key);

        match loader().await {
            Ok(value) => {
                *entry = Some(CacheEntry::new(value.clone()));
                Ok(value)
            }
            Err(err) => {
                let never_loaded = entry.is_none();
                drop(entry);
                if never_loaded {
                    self.release_empty_slot(&key, &slot);
                }
                Err(err)
            }
        }
    }

    /// Drops a slot that never held a value, unless another caller is
    /// still waiting on it. The map holds one reference and `slot` the other.
    fn release_empty_slot(&self, key: &K, slot: &Slot<V>) {
        let removed = self.slots.remove_if(key, |_, current| {
            Arc::ptr_eq(current, slot)
                && Arc::strong_count(current) == 2
                && current.try_lock().map(|e| e.is_none()).unwrap_or(false)
        });
        if removed.is_some() {
            debug!("{} cache released empty slot for {:?}", self.name, key);
        }
    }

    pub fn invalidate(&self, key: &K) {
        if self.slots.remove(key).is_some() {
            debug!("{} cache invalidated {:?}", self.name, key);
        }
    }

    pub fn clear(&self) {
        self.slots.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.slots.len(),
        }
    }
}

impl<K, V> Debug for TtlCache<K, V>
where
    K: Eq + Hash,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("name", &self.name)
            .field("ttl", &self.ttl)
            .field("entries", &self.slots.len())
            .field("hits", &self.hits.load(Ordering::Relaxed))
            .field("misses", &self.misses.load(Ordering::Relaxed))
            .finish()
    }
}
