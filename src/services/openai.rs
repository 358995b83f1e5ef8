//! OpenAI-compatible chat-completions provider

use async_trait::async_trait;

use crate::core::config::TranslatorConfig;
use crate::core::errors::{Result, TranslationError};
use crate::services::fanout::SingleTranslator;
use crate::services::{build_http_client, retry_after_seconds};

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// LLM-chat-style translation, one completion request per item
pub struct OpenAiTranslator {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
    target_lang: String,
}

impl OpenAiTranslator {
    pub fn new(config: &TranslatorConfig, api_key: String) -> Result<Self> {
        Ok(Self {
            client: build_http_client(config)?,
            api_key,
            api_base: std::env::var("OPENAI_API_BASE")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            target_lang: config.target_lang_code().to_string(),
        })
    }

    fn system_prompt(&self) -> String {
        format!(
            "You are a professional translator. \
             Translate the following text to {}. \
             Preserve formatting, line breaks, and technical terminology. \
             Return only the translation without explanations.",
            self.target_lang
        )
    }
}

#[async_trait]
impl SingleTranslator for OpenAiTranslator {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn translate_one(&self, text: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": self.system_prompt() },
                { "role": "user", "content": text }
            ]
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
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

        let json: serde_json::Value = response.json().await?;
        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .map(str::trim)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| TranslationError::InvalidResponseError {
                message: "completion returned no content".to_string(),
            })?;

        Ok(content.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_names_target_language() {
        let config = TranslatorConfig {
            target_lang: "fr-FR".to_string(),
            ..Default::default()
        };
        let translator = OpenAiTranslator::new(&config, "key".to_string()).unwrap();
        assert!(translator.system_prompt().contains("to fr."));
    }
}
