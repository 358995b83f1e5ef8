//! Core data models for the translation pipeline

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A single source row read from the worksheet.
///
/// `row_num` is the 1-based spreadsheet row; data rows start at 2
/// because row 1 carries the language column headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub row_num: usize,
    pub text: String,
}

impl Row {
    pub fn new(row_num: usize, text: impl Into<String>) -> Self {
        Self {
            row_num,
            text: text.into(),
        }
    }

    /// Rows with no translatable content are skipped, not dispatched
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Translation request identifying one unit of provider work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub text: String,
    pub source_lang: String,
    pub target_lang: String,
}

impl TranslationRequest {
    pub fn new(
        text: impl Into<String>,
        source_lang: impl Into<String>,
        target_lang: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
        }
    }

    /// Cache key derived from (text, source_lang, target_lang)
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.text.as_bytes());
        hasher.update(b"|");
        hasher.update(self.source_lang.as_bytes());
        hasher.update(b"|");
        hasher.update(self.target_lang.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Final outcome for one row, flowing to the writer and the report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowResult {
    pub row_num: usize,
    pub source_text: String,
    pub translated_text: String,
    pub error: Option<String>,
}

impl RowResult {
    pub fn ok(row_num: usize, source_text: String, translated_text: String) -> Self {
        Self {
            row_num,
            source_text,
            translated_text,
            error: None,
        }
    }

    pub fn failed(row_num: usize, source_text: String, error: impl Into<String>) -> Self {
        Self {
            row_num,
            source_text,
            translated_text: String::new(),
            error: Some(error.into()),
        }
    }

    /// Skipped rows carry their (blank) source through unchanged
    pub fn is_skipped(&self) -> bool {
        self.error.is_none() && self.source_text.trim().is_empty()
    }
}

/// Aggregate counts for the end-of-run summary log
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub translated: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn from_results(results: &[RowResult]) -> Self {
        let mut summary = Self {
            total: results.len(),
            ..Self::default()
        };
        for result in results {
            if result.error.is_some() {
                summary.failed += 1;
            } else if result.is_skipped() {
                summary.skipped += 1;
            } else {
                summary.translated += 1;
            }
        }
        summary
    }
}
