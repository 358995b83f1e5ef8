//! Translation cache backends
//!
//! The cache maps a request fingerprint to a previous translation so
//! repeated runs skip redundant provider calls. All backends share the
//! same contract: concurrent reads are safe, writes are best-effort,
//! TTL is enforced at read time.

pub mod entry;
pub mod file;
pub mod hybrid;
pub mod memory;
pub mod sqlite;

use std::sync::Arc;

use tracing::warn;

pub use entry::CacheEntry;
pub use file::FileCache;
pub use hybrid::HybridCache;
pub use memory::MemoryCache;
pub use sqlite::SqliteCache;

use crate::core::config::{CacheKind, TranslatorConfig};
use crate::core::errors::Result;

/// Key-value store for translation results
pub trait TranslationCache: Send + Sync {
    /// Look up a fingerprint; expired entries are treated as absent
    fn get(&self, fingerprint: &str) -> Option<CacheEntry>;

    /// Store a translation; a lost write on a race is acceptable
    fn set(&self, fingerprint: &str, entry: CacheEntry);

    /// Drop every entry
    fn clear(&self);

    /// Counters for the `--cache-stats` report
    fn stats(&self) -> CacheStats;
}

/// Hit/miss counters and current entry count
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        self.hits as f64 / total as f64 * 100.0
    }
}

/// Build the configured cache backend, or `None` when caching is off
pub fn build_cache(config: &TranslatorConfig) -> Result<Option<Arc<dyn TranslationCache>>> {
    // The memory layer of a hybrid cache stays small; persistent
    // storage holds the long tail.
    const HYBRID_MEMORY_SIZE: usize = 1000;

    let cache: Arc<dyn TranslationCache> = match config.cache_kind {
        CacheKind::None => return Ok(None),
        CacheKind::Memory => Arc::new(MemoryCache::new(
            config.cache_max_memory_size,
            config.cache_ttl_hours,
        )),
        CacheKind::File => Arc::new(FileCache::new(&config.cache_dir, config.cache_ttl_hours)?),
        CacheKind::Sqlite => Arc::new(open_sqlite(config)?),
        CacheKind::Hybrid => Arc::new(HybridCache::new(
            MemoryCache::new(HYBRID_MEMORY_SIZE, config.cache_ttl_hours),
            open_sqlite(config)?,
        )),
    };

    Ok(Some(cache))
}

/// Open the SQLite store and sweep expired rows at startup
fn open_sqlite(config: &TranslatorConfig) -> Result<SqliteCache> {
    let cache = SqliteCache::new(
        config.cache_dir.join("translations.db"),
        config.cache_ttl_hours,
    )?;
    if let Err(e) = cache.cleanup_expired() {
        warn!("Expired cache sweep failed: {}", e);
    }
    Ok(cache)
}
