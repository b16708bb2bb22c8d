//! Bounded in-memory cache for weather records.
//!
//! LRU eviction caps the number of cities held; a per-entry TTL bounds
//! how long a record may be served. Reads share a lock; any structural
//! change (stale removal, MRU promotion, insert, evict) takes it
//! exclusively and re-checks the entry first, so a concurrent refresh is
//! never clobbered by a stale-read removal.

use std::collections::HashSet;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use lru::LruCache;

use common::{Error, WeatherReport};

/// A cached weather record with its storage time.
///
/// Immutable once created; `put` replaces the whole entry. Staleness is
/// recomputed from `stored_at` on every read, never cached.
#[derive(Debug, Clone)]
struct CacheEntry {
    report: WeatherReport,
    stored_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() >= ttl
    }
}

/// Thread-safe TTL + LRU cache keyed by normalized city name.
pub struct WeatherCache {
    max_entries: usize,
    ttl: Duration,
    entries: RwLock<LruCache<String, CacheEntry>>,
}

fn normalize_key(city: &str) -> String {
    city.trim().to_lowercase()
}

impl WeatherCache {
    /// Creates a cache holding at most `max_entries` cities, each served
    /// for at most `ttl` after storage.
    pub fn new(max_entries: usize, ttl: Duration) -> Result<Self, Error> {
        if max_entries == 0 || ttl.is_zero() {
            return Err(Error::InvalidArgument(
                "cache size and TTL must be positive".to_string(),
            ));
        }
        Ok(Self {
            max_entries,
            ttl,
            entries: RwLock::new(LruCache::unbounded()),
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, LruCache<String, CacheEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, LruCache<String, CacheEntry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the cached record for `city` if present and fresh, and
    /// promotes it to most-recently-used. A stale entry is removed and
    /// reported as a miss.
    pub fn get(&self, city: &str) -> Option<WeatherReport> {
        let key = normalize_key(city);

        // Fast path under the shared lock: absent keys never escalate.
        {
            let entries = self.read();
            entries.peek(&key)?;
        }

        // Promotion and stale removal both mutate, so re-check the entry
        // under the exclusive lock: another thread may have refreshed or
        // removed it since the shared-lock check.
        let mut entries = self.write();
        match entries.peek(&key) {
            None => None,
            Some(entry) if entry.is_expired(self.ttl) => {
                entries.pop(&key);
                None
            }
            // `LruCache::get` moves the key to the MRU position.
            Some(_) => entries.get(&key).map(|entry| entry.report.clone()),
        }
    }

    /// Inserts or replaces the record for `city` with a fresh timestamp,
    /// evicting the least-recently-used entry on overflow.
    pub fn put(&self, city: &str, report: WeatherReport) {
        let key = normalize_key(city);
        let entry = CacheEntry {
            report,
            stored_at: Instant::now(),
        };

        let mut entries = self.write();
        entries.push(key, entry);
        while entries.len() > self.max_entries {
            entries.pop_lru();
        }
    }

    /// Removes every currently stale entry in one pass. Survivors keep
    /// their recency order.
    pub fn purge_expired(&self) {
        let mut entries = self.write();
        let stale: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(self.ttl))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &stale {
            entries.pop(key);
        }
    }

    /// Point-in-time snapshot of the cached city keys. May include
    /// entries about to expire; consumers re-check staleness.
    pub fn cached_cities(&self) -> HashSet<String> {
        self.read().iter().map(|(key, _)| key.clone()).collect()
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::test_support::sample_report;

    fn cache(max_entries: usize, ttl_ms: u64) -> WeatherCache {
        WeatherCache::new(max_entries, Duration::from_millis(ttl_ms)).expect("valid cache params")
    }

    #[test]
    fn test_rejects_invalid_parameters() {
        assert!(WeatherCache::new(0, Duration::from_millis(100)).is_err());
        assert!(WeatherCache::new(5, Duration::ZERO).is_err());
    }

    #[test]
    fn test_stores_and_retrieves_fresh_entry() {
        let cache = cache(3, 60_000);
        cache.put("London", sample_report("London"));

        let hit = cache.get("London").expect("fresh entry should be served");
        assert_eq!(hit.name, "London");
    }

    #[test]
    fn test_miss_for_unknown_city() {
        let cache = cache(3, 60_000);
        assert!(cache.get("Paris").is_none());
    }

    #[test]
    fn test_expired_entry_is_removed_on_read() {
        let cache = cache(5, 50);
        cache.put("Tokyo", sample_report("Tokyo"));

        thread::sleep(Duration::from_millis(80));

        assert!(cache.get("Tokyo").is_none());
        assert_eq!(cache.len(), 0, "stale entry must be gone after the read");
    }

    #[test]
    fn test_overwrite_replaces_entry() {
        let cache = cache(3, 60_000);
        cache.put("London", sample_report("London"));

        let mut updated = sample_report("London");
        updated.weather.main = "Clear".into();
        cache.put("London", updated);

        let hit = cache.get("London").expect("entry should be present");
        assert_eq!(hit.weather.main, "Clear");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_evicts_least_recently_used_on_overflow() {
        let cache = cache(3, 60_000);
        cache.put("City1", sample_report("City1"));
        cache.put("City2", sample_report("City2"));
        cache.put("City3", sample_report("City3"));
        cache.put("City4", sample_report("City4"));

        assert_eq!(cache.len(), 3);
        assert!(!cache.cached_cities().contains("city1"));
    }

    #[test]
    fn test_read_promotion_changes_eviction_victim() {
        let cache = cache(3, 60_000);
        cache.put("A", sample_report("A"));
        cache.put("B", sample_report("B"));
        cache.put("C", sample_report("C"));

        // Reading A makes B the least recently used entry.
        assert!(cache.get("A").is_some());
        cache.put("D", sample_report("D"));

        let cities = cache.cached_cities();
        assert!(cities.contains("a"));
        assert!(cities.contains("c"));
        assert!(cities.contains("d"));
        assert!(!cities.contains("b"));
    }

    // Capacity 3: put A,B,C,D evicts A; reading B then lets the next
    // overflow evict C while B survives.
    #[test]
    fn test_end_to_end_eviction_scenario() {
        let cache = cache(3, 200);
        cache.put("A", sample_report("A"));
        cache.put("B", sample_report("B"));
        cache.put("C", sample_report("C"));
        cache.put("D", sample_report("D"));
        assert_eq!(cache.len(), 3);
        assert!(!cache.cached_cities().contains("a"));

        // Order is B < C < D; reading B leaves C the eviction victim.
        assert!(cache.get("B").is_some());
        cache.put("E", sample_report("E"));

        let cities = cache.cached_cities();
        assert_eq!(cache.len(), 3);
        assert!(!cities.contains("c"));
        assert!(cities.contains("b"));
        assert!(cities.contains("d"));
        assert!(cities.contains("e"));
    }

    #[test]
    fn test_capacity_invariant_under_put_sequence() {
        let cache = cache(4, 60_000);
        for i in 0..50 {
            cache.put(&format!("City{i}"), sample_report("X"));
            assert!(cache.len() <= 4);
        }
    }

    #[test]
    fn test_purge_removes_only_expired_entries() {
        let cache = cache(5, 100);
        cache.put("Old1", sample_report("Old1"));
        cache.put("Old2", sample_report("Old2"));

        thread::sleep(Duration::from_millis(150));

        cache.put("Fresh", sample_report("Fresh"));
        cache.purge_expired();

        let cities = cache.cached_cities();
        assert_eq!(cities.len(), 1);
        assert!(cities.contains("fresh"));
    }

    #[test]
    fn test_clear_empties_cache() {
        let cache = cache(3, 60_000);
        cache.put("London", sample_report("London"));
        cache.put("Paris", sample_report("Paris"));

        cache.clear();

        assert!(cache.is_empty());
        assert!(cache.cached_cities().is_empty());
    }

    #[test]
    fn test_city_keys_are_case_insensitive() {
        let cache = cache(3, 60_000);
        cache.put("LoNdOn", sample_report("London"));

        assert!(cache.get("london").is_some());
        assert!(cache.get("LONDON").is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_concurrent_readers_and_writers_keep_invariants() {
        let cache = Arc::new(cache(4, 60_000));
        let mut handles = Vec::new();

        for t in 0..4 {
            let cache = Arc::clone(&cache);
            handles.push(thread::spawn(move || {
                for i in 0..200 {
                    let city = format!("City{}", (t * 7 + i) % 9);
                    cache.put(&city, sample_report(&city));
                    let _ = cache.get(&city);
                    if i % 17 == 0 {
                        cache.purge_expired();
                    }
                }
            }));
        }
        for handle in handles {
            handle.join().expect("worker should not panic");
        }

        assert!(cache.len() <= 4);
        for city in cache.cached_cities() {
            let hit = cache.get(&city).expect("snapshot keys should be fresh");
            assert_eq!(normalize_key(&hit.name), city);
        }
    }
}
