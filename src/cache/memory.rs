//! In-memory translation cache

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use tracing::debug;

use crate::cache::entry::CacheEntry;
use crate::cache::{CacheStats, TranslationCache};

/// Bounded in-memory cache with TTL enforced at read time
#[derive(Debug)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    max_size: usize,
    ttl_hours: i64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryCache {
    pub fn new(max_size: usize, ttl_hours: i64) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_size: max_size.max(1),
            ttl_hours,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn remove(&self, fingerprint: &str) {
        if let Ok(mut entries) = self.entries.write() {
            entries.remove(fingerprint);
        }
    }
}

impl TranslationCache for MemoryCache {
    fn get(&self, fingerprint: &str) -> Option<CacheEntry> {
        let found = self
            .entries
            .read()
            .ok()
            .and_then(|entries| entries.get(fingerprint).cloned());

        match found {
            Some(entry) if !entry.is_expired(self.ttl_hours) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry)
            }
            Some(_) => {
                debug!("Memory cache entry expired: {}", fingerprint);
                self.remove(fingerprint);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    fn set(&self, fingerprint: &str, entry: CacheEntry) {
        let Ok(mut entries) = self.entries.write() else {
            return;
        };

        if entries.len() >= self.max_size && !entries.contains_key(fingerprint) {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.timestamp)
                .map(|(key, _)| key.clone());
            if let Some(key) = oldest {
                debug!("Memory cache full, evicting oldest entry");
                entries.remove(&key);
            }
        }

        entries.insert(fingerprint.to_string(), entry);
    }

    fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            size: self.entries.read().map(|e| e.len()).unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::TranslationRequest;
    use chrono::{Duration, Utc};

    fn entry(text: &str, translated: &str) -> CacheEntry {
        let request = TranslationRequest::new(text, "en-US", "de-DE");
        CacheEntry::new(&request, translated)
    }

    #[test]
    fn test_get_set_roundtrip() {
        let cache = MemoryCache::new(10, 24);
        assert!(cache.get("fp1").is_none());

        cache.set("fp1", entry("one", "eins"));
        assert_eq!(cache.get("fp1").unwrap().translated_text, "eins");

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_expired_entry_treated_as_absent() {
        let cache = MemoryCache::new(10, 24);
        let mut stale = entry("one", "eins");
        stale.timestamp = Utc::now() - Duration::hours(48);
        cache.set("fp1", stale);

        assert!(cache.get("fp1").is_none());
        assert_eq!(cache.stats().size, 0);
    }

    #[test]
    fn test_full_cache_evicts_oldest() {
        let cache = MemoryCache::new(2, 24);
        let mut oldest = entry("one", "eins");
        oldest.timestamp = Utc::now() - Duration::hours(2);
        cache.set("fp1", oldest);
        cache.set("fp2", entry("two", "zwei"));
        cache.set("fp3", entry("three", "drei"));

        assert!(cache.get("fp1").is_none());
        assert!(cache.get("fp2").is_some());
        assert!(cache.get("fp3").is_some());
    }

    #[test]
    fn test_clear_resets_everything() {
        let cache = MemoryCache::new(10, 24);
        cache.set("fp1", entry("one", "eins"));
        cache.get("fp1");
        cache.clear();

        let stats = cache.stats();
        assert_eq!(stats.size, 0);
        assert_eq!(stats.hits, 0);
    }
}
