//! Custom error types for translation operations

use thiserror::Error;

/// Translation-related errors
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Provider request failed
    #[error("Provider error: {message}")]
    ProviderError {
        message: String,
    },

    /// Rate limit exceeded
    #[error("Rate limit exceeded. Retry after {retry_after:?} seconds")]
    RateLimitError {
        retry_after: Option<u64>,
    },

    /// Provider returned a batch of the wrong size
    #[error("Batch size mismatch: expected {expected}, got {actual}")]
    BatchSizeMismatch {
        expected: usize,
        actual: usize,
    },

    /// Invalid response from provider
    #[error("Invalid response: {message}")]
    InvalidResponseError {
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
    },

    /// File operation error
    #[error("File error: {path} - {message}")]
    FileError {
        path: String,
        message: String,
    },

    /// Output or report write failure
    #[error("Write error: {path} - {message}")]
    WriteError {
        path: String,
        message: String,
    },

    /// Wrapper for anyhow errors
    #[error("Internal error: {0}")]
    InternalError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Reqwest error
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl TranslationError {
    /// Transient errors worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TranslationError::ProviderError { .. }
                | TranslationError::RateLimitError { .. }
                | TranslationError::BatchSizeMismatch { .. }
                | TranslationError::InvalidResponseError { .. }
                | TranslationError::HttpError(_)
        )
    }
}

impl From<anyhow::Error> for TranslationError {
    fn from(err: anyhow::Error) -> Self {
        TranslationError::InternalError(err.to_string())
    }
}

/// Result type for translation operations
pub type Result<T> = std::result::Result<T, TranslationError>;
