//! Hybrid cache layering memory over persistent storage

use tracing::debug;

use crate::cache::entry::CacheEntry;
use crate::cache::memory::MemoryCache;
use crate::cache::{CacheStats, TranslationCache};

/// Memory cache for hot entries in front of a persistent store.
///
/// Lookups hit memory first; a persistent hit is promoted into memory
/// so subsequent lookups stay off the disk. Writes go through to both
/// layers.
#[derive(Debug)]
pub struct HybridCache<P: TranslationCache> {
    memory: MemoryCache,
    persistent: P,
}

impl<P: TranslationCache> HybridCache<P> {
    pub fn new(memory: MemoryCache, persistent: P) -> Self {
        Self { memory, persistent }
    }
}

impl<P: TranslationCache> TranslationCache for HybridCache<P> {
    fn get(&self, fingerprint: &str) -> Option<CacheEntry> {
        if let Some(entry) = self.memory.get(fingerprint) {
            debug!("Hybrid cache hit (memory): {}", fingerprint);
            return Some(entry);
        }

        if let Some(entry) = self.persistent.get(fingerprint) {
            debug!("Hybrid cache hit (persistent): {}", fingerprint);
            self.memory.set(fingerprint, entry.clone());
            return Some(entry);
        }

        None
    }

    fn set(&self, fingerprint: &str, entry: CacheEntry) {
        self.memory.set(fingerprint, entry.clone());
        self.persistent.set(fingerprint, entry);
    }

    fn clear(&self) {
        self.memory.clear();
        self.persistent.clear();
    }

    fn stats(&self) -> CacheStats {
        let memory = self.memory.stats();
        let persistent = self.persistent.stats();

        // Misses counted by the memory layer that the persistent layer
        // satisfied are hits for the hybrid as a whole. Every write goes
        // to both layers and memory only ever holds entries the
        // persistent store has seen, so the persistent entry count is
        // the distinct total; memory covers the rare case of an entry
        // surviving only the in-memory write.
        CacheStats {
            hits: memory.hits + persistent.hits,
            misses: persistent.misses,
            size: persistent.size.max(memory.size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::sqlite::SqliteCache;
    use crate::core::models::TranslationRequest;
    use tempfile::TempDir;

    fn hybrid(dir: &TempDir) -> HybridCache<SqliteCache> {
        HybridCache::new(
            MemoryCache::new(100, 24),
            SqliteCache::new(dir.path().join("translations.db"), 24).unwrap(),
        )
    }

    fn entry(text: &str, translated: &str) -> CacheEntry {
        let request = TranslationRequest::new(text, "en-US", "de-DE");
        CacheEntry::new(&request, translated)
    }

    #[test]
    fn test_set_writes_both_layers() {
        let dir = TempDir::new().unwrap();
        let cache = hybrid(&dir);
        cache.set("fp1", entry("Hello", "Hallo"));

        assert!(cache.memory.get("fp1").is_some());
        assert!(cache.persistent.get("fp1").is_some());
    }

    #[test]
    fn test_persistent_hit_is_promoted_to_memory() {
        let dir = TempDir::new().unwrap();
        let cache = hybrid(&dir);
        cache.persistent.set("fp1", entry("Hello", "Hallo"));

        assert!(cache.memory.get("fp1").is_none());
        assert_eq!(cache.get("fp1").unwrap().translated_text, "Hallo");
        assert!(cache.memory.get("fp1").is_some());
    }

    #[test]
    fn test_total_miss_returns_none() {
        let dir = TempDir::new().unwrap();
        let cache = hybrid(&dir);
        assert!(cache.get("fp1").is_none());
    }

    #[test]
    fn test_clear_empties_both_layers() {
        let dir = TempDir::new().unwrap();
        let cache = hybrid(&dir);
        cache.set("fp1", entry("Hello", "Hallo"));
        cache.clear();

        assert!(cache.get("fp1").is_none());
        assert_eq!(cache.stats().size, 0);
    }

    #[test]
    fn test_size_counts_distinct_entries_once() {
        let dir = TempDir::new().unwrap();
        let cache = hybrid(&dir);
        cache.set("fp1", entry("one", "eins"));
        cache.set("fp2", entry("two", "zwei"));

        // Both layers hold both entries; the stats must not double count
        assert_eq!(cache.stats().size, 2);
    }

    #[test]
    fn test_size_follows_persistent_store_after_memory_eviction() {
        let dir = TempDir::new().unwrap();
        let cache = HybridCache::new(
            MemoryCache::new(1, 24),
            SqliteCache::new(dir.path().join("translations.db"), 24).unwrap(),
        );
        cache.set("fp1", entry("one", "eins"));
        cache.set("fp2", entry("two", "zwei"));
        cache.set("fp3", entry("three", "drei"));

        // Memory evicted down to one entry, the persistent layer kept all
        assert_eq!(cache.stats().size, 3);
    }
}
