//! Cached translation entry

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::core::models::TranslationRequest;

/// One cached translation, keyed externally by its fingerprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub source_text: String,
    pub translated_text: String,
    pub source_lang: String,
    pub target_lang: String,
    pub timestamp: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(request: &TranslationRequest, translated_text: impl Into<String>) -> Self {
        Self {
            source_text: request.text.clone(),
            translated_text: translated_text.into(),
            source_lang: request.source_lang.clone(),
            target_lang: request.target_lang.clone(),
            timestamp: Utc::now(),
        }
    }

    /// Entries older than the TTL are treated as absent at read time
    pub fn is_expired(&self, ttl_hours: i64) -> bool {
        Utc::now() - self.timestamp > Duration::hours(ttl_hours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_aged(hours: i64) -> CacheEntry {
        let request = TranslationRequest::new("Hello", "en-US", "de-DE");
        let mut entry = CacheEntry::new(&request, "Hallo");
        entry.timestamp = Utc::now() - Duration::hours(hours);
        entry
    }

    #[test]
    fn test_fresh_entry_is_not_expired() {
        assert!(!entry_aged(0).is_expired(24));
    }

    #[test]
    fn test_old_entry_is_expired() {
        assert!(entry_aged(25).is_expired(24));
    }

    #[test]
    fn test_entry_roundtrips_through_json() {
        let entry = entry_aged(1);
        let json = serde_json::to_string(&entry).unwrap();
        let parsed: CacheEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.translated_text, "Hallo");
        assert_eq!(parsed.timestamp, entry.timestamp);
    }
}
