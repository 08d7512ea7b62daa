use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use tracing::debug;

/// Default cap on stored entries.
pub const DEFAULT_MAX_ENTRIES: usize = 100;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

/// Memoises results by their literal input key.
///
/// Entries never expire when `ttl` is `None`. Inserting a new key into a full
/// cache drops expired entries and then, if still full, the oldest entry.
/// Callers pass `now` so expiry is deterministic in tests.
#[derive(Debug, Clone)]
pub struct TtlCache<K, V> {
    ttl: Option<Duration>,
    max_entries: usize,
    entries: HashMap<K, CacheEntry<V>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            ttl,
            max_entries: DEFAULT_MAX_ENTRIES,
            entries: HashMap::new(),
        }
    }

    /// Caps the number of stored entries; a cap of zero is treated as one.
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.max(1);
        self
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    fn is_expired(&self, entry: &CacheEntry<V>, now: Instant) -> bool {
        match self.ttl {
            Some(ttl) => now.saturating_duration_since(entry.inserted_at) >= ttl,
            None => false,
        }
    }

    /// Returns a fresh entry, evicting it first if it has expired.
    pub fn get(&mut self, key: &K, now: Instant) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some(entry) if self.is_expired(entry, now) => true,
            Some(entry) => return Some(entry.value.clone()),
            None => return None,
        };
        if expired {
            debug!("evicting expired cache entry");
            self.entries.remove(key);
        }
        None
    }

    pub fn insert(&mut self, key: K, value: V, now: Instant) {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            self.make_room(now);
        }
        self.entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: now,
            },
        );
    }

    /// Returns the cached value or computes, stores and returns a new one.
    /// Failed computations are not cached.
    pub fn get_or_try_insert_with<E>(
        &mut self,
        key: K,
        now: Instant,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(value) = self.get(&key, now) {
            return Ok(value);
        }
        let value = compute()?;
        self.insert(key, value.clone(), now);
        Ok(value)
    }

    fn make_room(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.entries.retain(|_, entry| match ttl {
            Some(ttl) => now.saturating_duration_since(entry.inserted_at) < ttl,
            None => true,
        });
        while self.entries.len() >= self.max_entries {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.inserted_at)
                .map(|(key, _)| key.clone());
            let Some(oldest) = oldest else {
                break;
            };
            debug!(max_entries = self.max_entries, "cache full, evicting oldest entry");
            self.entries.remove(&oldest);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
