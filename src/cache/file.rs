//! Persistent file-based translation cache
//!
//! One JSON document per fingerprint under the cache directory. Writes
//! are best-effort: the cache is an optimization, never the source of
//! truth, so a failed or lost write is logged and swallowed.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

use crate::cache::entry::CacheEntry;
use crate::cache::{CacheStats, TranslationCache};
use crate::core::errors::{Result, TranslationError};

/// JSON-file cache surviving across runs until TTL eviction
#[derive(Debug)]
pub struct FileCache {
    cache_dir: PathBuf,
    ttl_hours: i64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl FileCache {
    pub fn new(cache_dir: impl Into<PathBuf>, ttl_hours: i64) -> Result<Self> {
        let cache_dir = cache_dir.into();
        fs::create_dir_all(&cache_dir).map_err(|e| TranslationError::FileError {
            path: cache_dir.display().to_string(),
            message: e.to_string(),
        })?;
        debug!("File cache initialized: {}", cache_dir.display());

        Ok(Self {
            cache_dir,
            ttl_hours,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }

    fn entry_path(&self, fingerprint: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", fingerprint))
    }

    fn load_entry(&self, path: &Path) -> Option<CacheEntry> {
        let content = fs::read_to_string(path).ok()?;
        match serde_json::from_str::<CacheEntry>(&content) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Corrupted cache file {}: {}", path.display(), e);
                let _ = fs::remove_file(path);
                None
            }
        }
    }
}

impl TranslationCache for FileCache {
    fn get(&self, fingerprint: &str) -> Option<CacheEntry> {
        let path = self.entry_path(fingerprint);
        if let Some(entry) = self.load_entry(&path) {
            if !entry.is_expired(self.ttl_hours) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry);
            }
            debug!("File cache entry expired: {}", fingerprint);
            let _ = fs::remove_file(&path);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    fn set(&self, fingerprint: &str, entry: CacheEntry) {
        let path = self.entry_path(fingerprint);
        let serialized = match serde_json::to_string_pretty(&entry) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize cache entry: {}", e);
                return;
            }
        };

        if let Err(e) = fs::write(&path, serialized) {
            warn!("Failed to write cache file {}: {}", path.display(), e);
        }
    }

    fn clear(&self) {
        if let Ok(dir) = fs::read_dir(&self.cache_dir) {
            for entry in dir.flatten() {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "json") {
                    let _ = fs::remove_file(path);
                }
            }
        }
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    fn stats(&self) -> CacheStats {
        let size = fs::read_dir(&self.cache_dir)
            .map(|dir| {
                dir.flatten()
                    .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "json"))
                    .count()
            })
            .unwrap_or(0);

        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            size,
        }
    }
}
