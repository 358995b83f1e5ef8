//! Configuration management

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Translation backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum ServiceKind {
    /// LLM-chat-style API (OpenAI-compatible), one request per item
    Openai,
    /// Batch-native cloud API, one request per chunk
    Deepl,
    /// Free endpoint, no API key, one request per item
    GoogleFree,
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceKind::Openai => write!(f, "openai"),
            ServiceKind::Deepl => write!(f, "deepl"),
            ServiceKind::GoogleFree => write!(f, "google-free"),
        }
    }
}

/// Cache backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum CacheKind {
    /// In-memory only, lost at process exit
    Memory,
    /// JSON files under the cache directory
    File,
    /// SQLite database under the cache directory
    Sqlite,
    /// Memory in front of the SQLite store
    Hybrid,
    /// Caching disabled
    None,
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKind::Memory => write!(f, "memory"),
            CacheKind::File => write!(f, "file"),
            CacheKind::Sqlite => write!(f, "sqlite"),
            CacheKind::Hybrid => write!(f, "hybrid"),
            CacheKind::None => write!(f, "none"),
        }
    }
}

/// Configuration for a translation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatorConfig {
    pub service: ServiceKind,
    pub source_lang: String,
    pub target_lang: String,
    pub input_file: PathBuf,
    pub output_file: PathBuf,
    pub sheet_name: String,
    pub chunk_size: usize,
    pub max_concurrent: usize,
    pub max_rps: f64,
    pub request_delay_ms: u64,
    pub max_retries: u32,
    pub timeout_ms: u64,
    pub fail_fast: bool,
    pub skip_formulas: bool,
    pub preserve_line_lengths: bool,
    pub line_length_tolerance: f64,
    pub cache_kind: CacheKind,
    pub cache_ttl_hours: i64,
    pub cache_max_memory_size: usize,
    pub cache_dir: PathBuf,
    pub report_path: Option<PathBuf>,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            service: ServiceKind::GoogleFree,
            source_lang: "en-US".to_string(),
            target_lang: "de-DE".to_string(),
            input_file: PathBuf::from("TIAProjectTexts.csv"),
            output_file: PathBuf::from("TIAProjectTexts_translated.csv"),
            sheet_name: "User Texts".to_string(),
            chunk_size: 100,
            max_concurrent: 10,
            max_rps: 10.0,
            request_delay_ms: 100,
            max_retries: 3,
            timeout_ms: 30000,
            fail_fast: false,
            skip_formulas: false,
            preserve_line_lengths: false,
            line_length_tolerance: 1.2,
            cache_kind: CacheKind::Hybrid,
            cache_ttl_hours: 24 * 7,
            cache_max_memory_size: 10000,
            cache_dir: default_cache_dir(),
            report_path: None,
        }
    }
}

/// Cache location, overridable with SHEET_TRANSLATOR_CACHE_DIR
fn default_cache_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("SHEET_TRANSLATOR_CACHE_DIR") {
        return PathBuf::from(dir);
    }
    std::env::temp_dir().join("sheet-translator-cache")
}

impl TranslatorConfig {
    /// Derive the output path from the input path when none is given
    pub fn derived_output_file(input_file: &std::path::Path) -> PathBuf {
        let stem = input_file
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "output".to_string());
        let extension = input_file
            .extension()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "csv".to_string());
        input_file.with_file_name(format!("{}_translated.{}", stem, extension))
    }

    /// Validate configuration before the pipeline starts
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.source_lang.is_empty() || self.target_lang.is_empty() {
            anyhow::bail!("source and target languages are required");
        }

        if self.source_lang == self.target_lang {
            anyhow::bail!("source and target languages must differ");
        }

        if self.chunk_size == 0 {
            anyhow::bail!("chunk_size must be greater than 0");
        }

        if self.max_concurrent == 0 {
            anyhow::bail!("max_concurrent must be greater than 0");
        }

        if self.max_rps <= 0.0 {
            anyhow::bail!("max_rps must be greater than 0");
        }

        if self.max_retries == 0 {
            anyhow::bail!("max_retries must be greater than 0");
        }

        if self.line_length_tolerance <= 0.0 {
            anyhow::bail!("line_length_tolerance must be greater than 0");
        }

        Ok(())
    }

    /// Target language code without the region suffix (de-DE -> de)
    pub fn target_lang_code(&self) -> &str {
        self.target_lang.split('-').next().unwrap_or(&self.target_lang)
    }

    /// Source language code without the region suffix
    pub fn source_lang_code(&self) -> &str {
        self.source_lang.split('-').next().unwrap_or(&self.source_lang)
    }
}
