//! Free Google Translate endpoint, no API key required

use async_trait::async_trait;

use crate::core::config::TranslatorConfig;
use crate::core::errors::{Result, TranslationError};
use crate::services::fanout::SingleTranslator;
use crate::services::{build_http_client, retry_after_seconds};

const API_URL: &str = "https://translate.googleapis.com/translate_a/single";

/// Unofficial per-item endpoint; useful without credentials, but
/// aggressive about rate limiting
pub struct GoogleFreeTranslator {
    client: reqwest::Client,
    source_lang: String,
    target_lang: String,
}

impl GoogleFreeTranslator {
    pub fn new(config: &TranslatorConfig) -> Result<Self> {
        Ok(Self {
            client: build_http_client(config)?,
            source_lang: config.source_lang_code().to_string(),
            target_lang: config.target_lang_code().to_string(),
        })
    }

    /// The endpoint answers with nested arrays; segment texts sit at
    /// `[0][i][0]` and concatenate to the full translation.
    fn parse_segments(json: &serde_json::Value) -> Option<String> {
        let segments = json.get(0)?.as_array()?;
        let mut translated = String::new();
        for segment in segments {
            if let Some(text) = segment.get(0).and_then(|value| value.as_str()) {
                translated.push_str(text);
            }
        }
        Some(translated)
    }
}

#[async_trait]
impl SingleTranslator for GoogleFreeTranslator {
    fn name(&self) -> &'static str {
        "google-free"
    }

    async fn translate_one(&self, text: &str) -> Result<String> {
        let response = self
            .client
            .get(API_URL)
            .query(&[
                ("client", "gtx"),
                ("sl", self.source_lang.as_str()),
                ("tl", self.target_lang.as_str()),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(TranslationError::RateLimitError {
                retry_after: retry_after_seconds(&response),
            });
        }
        if !status.is_success() {
            return Err(TranslationError::ProviderError {
                message: format!("google-free returned {}", status),
            });
        }

        let json: serde_json::Value = response.json().await?;
        Self::parse_segments(&json).ok_or_else(|| TranslationError::InvalidResponseError {
            message: "unexpected response shape from google-free".to_string(),
        })
    }
}
