//! Time-bounded cache of rendered PDFs keyed by marksheet id

use axum::body::Bytes;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

pub const DEFAULT_TTL: Duration = Duration::from_secs(300);
pub const DEFAULT_MAX_ENTRIES: usize = 50;

#[derive(Debug)]
struct CacheEntry {
    bytes: Bytes,
    created: Instant,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    /// Ids in insertion order, oldest first
    order: VecDeque<String>,
}

/// Rendered documents with a TTL and a capacity bound
///
/// Expired entries are not swept; a lookup simply treats them as absent and
/// they stay until overwritten or evicted. Capacity eviction drops the oldest
/// inserted id regardless of how recently it was read.
#[derive(Debug)]
pub struct RenderCache {
    ttl: Duration,
    max_entries: usize,
    inner: Mutex<CacheInner>,
}

impl Default for RenderCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_MAX_ENTRIES)
    }
}

impl RenderCache {
    /// A `max_entries` of zero disables caching
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            ttl,
            max_entries,
            inner: Mutex::new(CacheInner::default()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        // The map is always left consistent, so a poisoned lock is still usable
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, id: &str) -> Option<Bytes> {
        self.get_at(id, Instant::now())
    }

    pub fn get_at(&self, id: &str, now: Instant) -> Option<Bytes> {
        let inner = self.lock();
        let entry = inner.entries.get(id)?;
        (now.saturating_duration_since(entry.created) < self.ttl).then(|| entry.bytes.clone())
    }

    pub fn put(&self, id: &str, bytes: Bytes) {
        self.put_at(id, bytes, Instant::now());
    }

    pub fn put_at(&self, id: &str, bytes: Bytes, now: Instant) {
        if self.max_entries == 0 {
            return;
        }
        let mut inner = self.lock();
        if let Some(entry) = inner.entries.get_mut(id) {
            entry.bytes = bytes;
            entry.created = now;
            return;
        }
        while inner.entries.len() >= self.max_entries {
            let Some(oldest) = inner.order.pop_front() else {
                break;
            };
            inner.entries.remove(&oldest);
        }
        inner.order.push_back(id.to_string());
        inner.entries.insert(id.to_string(), CacheEntry { bytes, created: now });
    }

    /// Number of held entries, expired ones included
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().entries.contains_key(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pdf(tag: &str) -> Bytes {
        Bytes::from(format!("%PDF-{tag}"))
    }

    #[test]
    fn test_hit_within_ttl() {
        let cache = RenderCache::new(Duration::from_secs(300), 50);
        let t0 = Instant::now();
        cache.put_at("m1", pdf("a"), t0);

        assert_eq!(cache.get_at("m1", t0 + Duration::from_secs(299)), Some(pdf("a")));
        assert_eq!(cache.get_at("m2", t0), None);
    }

    #[test]
    fn test_expired_entry_is_a_miss_but_kept() {
        let cache = RenderCache::new(Duration::from_secs(300), 50);
        let t0 = Instant::now();
        cache.put_at("m1", pdf("a"), t0);

        assert_eq!(cache.get_at("m1", t0 + Duration::from_secs(300)), None);
        assert!(cache.contains("m1"));
    }

    #[test]
    fn test_capacity_evicts_oldest_inserted() {
        let cache = RenderCache::new(Duration::from_secs(300), 3);
        let t0 = Instant::now();
        for id in ["a", "b", "c"] {
            cache.put_at(id, pdf(id), t0);
        }
        // Reading "a" does not protect it
        assert!(cache.get_at("a", t0).is_some());

        cache.put_at("d", pdf("d"), t0);
        assert_eq!(cache.len(), 3);
        assert!(!cache.contains("a"));
        assert!(cache.contains("b") && cache.contains("c") && cache.contains("d"));
    }

    #[test]
    fn test_reput_keeps_position() {
        let cache = RenderCache::new(Duration::from_secs(300), 2);
        let t0 = Instant::now();
        cache.put_at("a", pdf("a1"), t0);
        cache.put_at("b", pdf("b"), t0);
        cache.put_at("a", pdf("a2"), t0 + Duration::from_secs(10));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get_at("a", t0 + Duration::from_secs(305)), Some(pdf("a2")));

        // "a" was inserted first, so it still goes first
        cache.put_at("c", pdf("c"), t0);
        assert!(!cache.contains("a"));
        assert!(cache.contains("b"));
    }

    #[test]
    fn test_zero_capacity_disables() {
        let cache = RenderCache::new(Duration::from_secs(300), 0);
        cache.put("a", pdf("a"));
        assert!(cache.is_empty());
        assert_eq!(cache.get("a"), None);
    }
}
