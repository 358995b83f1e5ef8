//! Per-item fan-out wrapper for providers without a batch endpoint

use async_trait::async_trait;
use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

use crate::core::config::TranslatorConfig;
use crate::core::errors::{Result, TranslationError};
use crate::core::rate_limit::RateLimiter;
use crate::services::{ItemOutcome, TranslationService};

/// Backoff never sleeps longer than this between attempts
const MAX_BACKOFF_SECS: u64 = 30;

/// A provider that translates one text per call
#[async_trait]
pub trait SingleTranslator: Send + Sync {
    fn name(&self) -> &'static str;

    async fn translate_one(&self, text: &str) -> Result<String>;
}

/// Fans a batch out into one call per item.
///
/// Concurrency is bounded by the configured semaphore, requests pass
/// the shared rate limiter plus the per-request delay, and transient
/// failures are retried with capped exponential backoff. An item that
/// exhausts its retries becomes an item-level error; the batch itself
/// always comes back complete and in order.
pub struct FanOut<P: SingleTranslator> {
    provider: P,
    semaphore: Semaphore,
    limiter: RateLimiter,
    request_delay: Duration,
    max_retries: u32,
}

impl<P: SingleTranslator> FanOut<P> {
    pub fn new(provider: P, config: &TranslatorConfig) -> Self {
        Self {
            provider,
            semaphore: Semaphore::new(config.max_concurrent),
            limiter: RateLimiter::new(config.max_rps),
            request_delay: Duration::from_millis(config.request_delay_ms),
            max_retries: config.max_retries.max(1),
        }
    }

    async fn translate_item(&self, text: &str) -> ItemOutcome {
        if text.trim().is_empty() {
            return Ok(String::new());
        }

        let mut last_error = None;

        for attempt in 1..=self.max_retries {
            if attempt > 1 {
                let backoff = backoff_delay(attempt - 1, last_error.as_ref());
                debug!(
                    "Provider {} retrying in {:?} (attempt {}/{})",
                    self.provider.name(),
                    backoff,
                    attempt,
                    self.max_retries
                );
                sleep(backoff).await;
            }

            // Permit is released during the backoff sleep so other
            // items keep flowing while this one waits.
            let result = {
                let _permit = self.semaphore.acquire().await.map_err(|e| {
                    TranslationError::InternalError(format!("semaphore closed: {}", e))
                })?;

                if !self.request_delay.is_zero() {
                    sleep(self.request_delay).await;
                }
                self.limiter.acquire().await;

                self.provider.translate_one(text).await
            };

            match result {
                Ok(translated) => return Ok(translated),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    warn!(
                        "Provider {} attempt {}/{} failed: {}",
                        self.provider.name(),
                        attempt,
                        self.max_retries,
                        e
                    );
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| TranslationError::ProviderError {
            message: "translation failed without attempts".to_string(),
        }))
    }
}

/// Capped exponential backoff, honoring an explicit Retry-After
fn backoff_delay(failed_attempts: u32, error: Option<&TranslationError>) -> Duration {
    if let Some(TranslationError::RateLimitError {
        retry_after: Some(seconds),
    }) = error
    {
        return Duration::from_secs((*seconds).min(MAX_BACKOFF_SECS));
    }
    Duration::from_secs(2u64.pow(failed_attempts).min(MAX_BACKOFF_SECS))
}

#[async_trait]
impl<P: SingleTranslator> TranslationService for FanOut<P> {
    fn name(&self) -> &'static str {
        self.provider.name()
    }

    async fn translate_batch(&self, texts: &[String]) -> Result<Vec<ItemOutcome>> {
        let items = texts.iter().map(|text| self.translate_item(text));
        Ok(join_all(items).await)
    }
}
