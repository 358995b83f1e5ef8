//! DeepL batch-native provider
//!
//! DeepL accepts the whole batch in a single request, so the call is
//! atomic: an unrecovered failure marks every item in the batch failed
//! with a shared error. Blank texts are filtered out locally and
//! restored as empty translations when reassembling.

use async_trait::async_trait;
use serde::Deserialize;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

use crate::core::config::TranslatorConfig;
use crate::core::errors::{Result, TranslationError};
use crate::core::rate_limit::RateLimiter;
use crate::services::{build_http_client, retry_after_seconds, ItemOutcome, TranslationService};

const API_URL: &str = "https://api-free.deepl.com/v2/translate";
const MAX_BACKOFF_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct DeepLResponse {
    translations: Vec<DeepLTranslation>,
}

#[derive(Debug, Deserialize)]
struct DeepLTranslation {
    text: String,
}

/// Batch-native cloud API provider
pub struct DeepLService {
    client: reqwest::Client,
    api_key: String,
    api_url: String,
    source_lang: String,
    target_lang: String,
    limiter: RateLimiter,
    request_delay: Duration,
    max_retries: u32,
}

impl DeepLService {
    pub fn new(config: &TranslatorConfig, api_key: String) -> Result<Self> {
        Ok(Self {
            client: build_http_client(config)?,
            api_key,
            api_url: std::env::var("DEEPL_API_URL").unwrap_or_else(|_| API_URL.to_string()),
            source_lang: config.source_lang_code().to_uppercase(),
            target_lang: config.target_lang_code().to_uppercase(),
            limiter: RateLimiter::new(config.max_rps),
            request_delay: Duration::from_millis(config.request_delay_ms),
            max_retries: config.max_retries.max(1),
        })
    }

    async fn request_batch(&self, texts: &[&str]) -> Result<Vec<String>> {
        let mut params: Vec<(&str, &str)> = vec![
            ("auth_key", self.api_key.as_str()),
            ("target_lang", self.target_lang.as_str()),
        ];
        if self.source_lang != "AUTO" {
            params.push(("source_lang", self.source_lang.as_str()));
        }
        for text in texts {
            params.push(("text", text));
        }

        let response = self
            .client
            .post(&self.api_url)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(TranslationError::RateLimitError {
                retry_after: retry_after_seconds(&response),
            });
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TranslationError::ProviderError {
                message: format!("{} - {}", status, message),
            });
        }

        let parsed: DeepLResponse = response.json().await?;
        if parsed.translations.len() != texts.len() {
            return Err(TranslationError::BatchSizeMismatch {
                expected: texts.len(),
                actual: parsed.translations.len(),
            });
        }

        Ok(parsed
            .translations
            .into_iter()
            .map(|translation| translation.text)
            .collect())
    }

    async fn request_with_retry(&self, texts: &[&str]) -> Result<Vec<String>> {
        let mut last_error = None;

        for attempt in 1..=self.max_retries {
            if attempt > 1 {
                let backoff = Duration::from_secs(2u64.pow(attempt - 1).min(MAX_BACKOFF_SECS));
                debug!(
                    "DeepL retrying batch in {:?} (attempt {}/{})",
                    backoff, attempt, self.max_retries
                );
                sleep(backoff).await;
            }

            if !self.request_delay.is_zero() {
                sleep(self.request_delay).await;
            }
            self.limiter.acquire().await;

            match self.request_batch(texts).await {
                Ok(translations) => return Ok(translations),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    warn!(
                        "DeepL batch attempt {}/{} failed: {}",
                        attempt, self.max_retries, e
                    );
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| TranslationError::ProviderError {
            message: "batch failed without attempts".to_string(),
        }))
    }
}

#[async_trait]
impl TranslationService for DeepLService {
    fn name(&self) -> &'static str {
        "deepl"
    }

    async fn translate_batch(&self, texts: &[String]) -> Result<Vec<ItemOutcome>> {
        let to_translate: Vec<(usize, &str)> = texts
            .iter()
            .enumerate()
            .filter(|(_, text)| !text.trim().is_empty())
            .map(|(index, text)| (index, text.as_str()))
            .collect();

        let mut outcomes: Vec<ItemOutcome> = texts.iter().map(|_| Ok(String::new())).collect();
        if to_translate.is_empty() {
            return Ok(outcomes);
        }

        let batch: Vec<&str> = to_translate.iter().map(|(_, text)| *text).collect();
        let translations = self.request_with_retry(&batch).await?;

        for ((index, _), translated) in to_translate.iter().zip(translations) {
            outcomes[*index] = Ok(translated);
        }

        Ok(outcomes)
    }
}
