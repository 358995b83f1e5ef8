//! SQLite-backed persistent translation cache
//!
//! A single `translations` table keyed by fingerprint, with the entry
//! timestamp stored as RFC 3339 text so expired rows can be swept with
//! one indexed DELETE. Connections are opened per operation; SQLite
//! serializes writers itself.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use crate::cache::entry::CacheEntry;
use crate::cache::{CacheStats, TranslationCache};
use crate::core::errors::{Result, TranslationError};

/// Persistent cache in a single SQLite database file
#[derive(Debug)]
pub struct SqliteCache {
    db_path: PathBuf,
    ttl_hours: i64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl SqliteCache {
    pub fn new(db_path: impl Into<PathBuf>, ttl_hours: i64) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| TranslationError::FileError {
                path: parent.display().to_string(),
                message: e.to_string(),
            })?;
        }

        let cache = Self {
            db_path,
            ttl_hours,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        };
        cache.init_db()?;
        info!("SQLite cache initialized: {}", cache.db_path.display());
        Ok(cache)
    }

    fn init_db(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS translations (
                hash_key TEXT PRIMARY KEY,
                source_text TEXT NOT NULL,
                translated_text TEXT NOT NULL,
                source_language TEXT NOT NULL,
                target_language TEXT NOT NULL,
                timestamp TEXT NOT NULL
            )",
            [],
        )
        .map_err(sql_error)?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_timestamp ON translations(timestamp)",
            [],
        )
        .map_err(sql_error)?;
        Ok(())
    }

    fn connect(&self) -> Result<Connection> {
        Connection::open(&self.db_path).map_err(|e| TranslationError::FileError {
            path: self.db_path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Delete every entry past its TTL, returning how many were removed
    pub fn cleanup_expired(&self) -> Result<usize> {
        let cutoff = format_timestamp(Utc::now() - chrono::Duration::hours(self.ttl_hours));
        let conn = self.connect()?;
        let removed = conn
            .execute(
                "DELETE FROM translations WHERE timestamp < ?1",
                params![cutoff],
            )
            .map_err(sql_error)?;
        if removed > 0 {
            info!("Removed {} expired cache entries", removed);
        }
        Ok(removed)
    }

    fn load(&self, fingerprint: &str) -> Result<Option<CacheEntry>> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(
                "SELECT source_text, translated_text, source_language, target_language, timestamp
                 FROM translations WHERE hash_key = ?1",
            )
            .map_err(sql_error)?;

        let row = stmt
            .query_row(params![fingerprint], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .optional()
            .map_err(sql_error)?;

        Ok(row.and_then(
            |(source_text, translated_text, source_lang, target_lang, timestamp)| {
                let timestamp = DateTime::parse_from_rfc3339(&timestamp)
                    .ok()?
                    .with_timezone(&Utc);
                Some(CacheEntry {
                    source_text,
                    translated_text,
                    source_lang,
                    target_lang,
                    timestamp,
                })
            },
        ))
    }

    fn remove(&self, fingerprint: &str) {
        let result = self.connect().and_then(|conn| {
            conn.execute(
                "DELETE FROM translations WHERE hash_key = ?1",
                params![fingerprint],
            )
            .map_err(sql_error)
        });
        if let Err(e) = result {
            warn!("Failed to remove cache entry {}: {}", fingerprint, e);
        }
    }
}

/// Stored with a fixed precision so rows order lexicographically
fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn sql_error(e: rusqlite::Error) -> TranslationError {
    TranslationError::InternalError(format!("sqlite: {}", e))
}

impl TranslationCache for SqliteCache {
    fn get(&self, fingerprint: &str) -> Option<CacheEntry> {
        match self.load(fingerprint) {
            Ok(Some(entry)) if !entry.is_expired(self.ttl_hours) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry)
            }
            Ok(Some(_)) => {
                debug!("SQLite cache entry expired: {}", fingerprint);
                self.remove(fingerprint);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            Ok(None) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            Err(e) => {
                warn!("Failed to read cache entry {}: {}", fingerprint, e);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    fn set(&self, fingerprint: &str, entry: CacheEntry) {
        let result = self.connect().and_then(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO translations
                 (hash_key, source_text, translated_text, source_language, target_language, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    fingerprint,
                    entry.source_text,
                    entry.translated_text,
                    entry.source_lang,
                    entry.target_lang,
                    format_timestamp(entry.timestamp),
                ],
            )
            .map_err(sql_error)
        });
        if let Err(e) = result {
            warn!("Failed to write cache entry {}: {}", fingerprint, e);
        }
    }

    fn clear(&self) {
        let result = self
            .connect()
            .and_then(|conn| conn.execute("DELETE FROM translations", []).map_err(sql_error));
        if let Err(e) = result {
            warn!("Failed to clear cache: {}", e);
        }
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    fn stats(&self) -> CacheStats {
        let size = self
            .connect()
            .and_then(|conn| {
                conn.query_row("SELECT COUNT(*) FROM translations", [], |row| {
                    row.get::<_, i64>(0)
                })
                .map_err(sql_error)
            })
            .map(|count| count as usize)
            .unwrap_or(0);

        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            size,
        }
    }
}
