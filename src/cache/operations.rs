use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

use super::keys::KeyPattern;
use super::models::{CacheEntry, CacheStats};

/// In-process key/value cache with a per-entry TTL.
///
/// Expired entries are never returned: `get` and `stats` test expiry on
/// every read, and [`TtlCache::cleanup`] reclaims the entries nobody reads
/// again. `get` hands out clones, so callers cannot mutate a cached value.
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.insert(key.into(), entry);
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        match self.entries.get(key) {
            None => return None,
            Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
            Some(_) => {}
        }
        // A concurrent `set` may have replaced the entry since the read.
        self.entries.remove_if(key, |_, entry| entry.is_expired(now));
        None
    }

    pub fn delete(&self, key: &str) {
        self.entries.remove(key);
    }

    pub fn clear(&self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        removed
    }

    /// Removes every expired entry and returns how many were dropped.
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        self.retain_counting(|_, entry| !entry.is_expired(now))
    }

    /// Live entries only; does not remove anything.
    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| !entry.value().is_expired(now))
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();
        CacheStats {
            size: keys.len(),
            keys,
        }
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn invalidate(&self, pattern: &KeyPattern) -> usize {
        match pattern {
            KeyPattern::Exact(key) => usize::from(self.entries.remove(key).is_some()),
            KeyPattern::Prefix(_) => self.invalidate_matching(|key| pattern.matches(key)),
        }
    }

    pub fn invalidate_matching<F>(&self, predicate: F) -> usize
    where
        F: Fn(&str) -> bool,
    {
        self.retain_counting(|key, _| !predicate(key))
    }

    fn retain_counting<F>(&self, mut keep: F) -> usize
    where
        F: FnMut(&str, &CacheEntry<V>) -> bool,
    {
        let mut removed = 0;
        self.entries.retain(|key, entry| {
            let kept = keep(key, entry);
            if !kept {
                removed += 1;
            }
            kept
        });
        removed
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
