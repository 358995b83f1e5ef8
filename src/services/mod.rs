//! Translation service abstraction and provider implementations
//!
//! Every backend exposes the same length-preserving `translate_batch`
//! capability; callers never branch on provider type. Per-item fan-out
//! providers wrap their single-call client in [`FanOut`], batch-native
//! providers implement the trait directly.

pub mod deepl;
pub mod fanout;
pub mod google_free;
pub mod openai;

use std::sync::Arc;

use async_trait::async_trait;

pub use deepl::DeepLService;
pub use fanout::{FanOut, SingleTranslator};
pub use google_free::GoogleFreeTranslator;
pub use openai::OpenAiTranslator;

use crate::core::config::{ServiceKind, TranslatorConfig};
use crate::core::errors::{Result, TranslationError};

/// Per-item result inside a successfully dispatched batch
pub type ItemOutcome = std::result::Result<String, TranslationError>;

/// Uniform interface over heterogeneous translation providers.
///
/// `translate_batch` must return exactly one outcome per input text in
/// input order; the pipeline treats any other shape as a batch-level
/// failure. A top-level `Err` means the whole batch failed atomically.
#[async_trait]
pub trait TranslationService: Send + Sync {
    /// Short provider name for logs
    fn name(&self) -> &'static str;

    /// Translate an ordered batch of texts
    async fn translate_batch(&self, texts: &[String]) -> Result<Vec<ItemOutcome>>;
}

/// Build the configured provider.
///
/// Fails before the pipeline starts when a required credential is
/// missing from the environment.
pub fn create_service(config: &TranslatorConfig) -> Result<Arc<dyn TranslationService>> {
    match config.service {
        ServiceKind::Openai => {
            let api_key = require_env("OPENAI_API_KEY", config.service)?;
            let translator = OpenAiTranslator::new(config, api_key)?;
            Ok(Arc::new(FanOut::new(translator, config)))
        }
        ServiceKind::Deepl => {
            let api_key = require_env("DEEPL_API_KEY", config.service)?;
            Ok(Arc::new(DeepLService::new(config, api_key)?))
        }
        ServiceKind::GoogleFree => {
            let translator = GoogleFreeTranslator::new(config)?;
            Ok(Arc::new(FanOut::new(translator, config)))
        }
    }
}

fn require_env(var: &str, service: ServiceKind) -> Result<String> {
    std::env::var(var)
        .ok()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| TranslationError::ConfigError {
            message: format!(
                "{} translation requires the {} environment variable",
                service, var
            ),
        })
}

/// Shared HTTP client construction with the configured timeout
pub(crate) fn build_http_client(config: &TranslatorConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_millis(config.timeout_ms))
        .pool_idle_timeout(Some(std::time::Duration::from_secs(30)))
        .pool_max_idle_per_host(10)
        .build()?;
    Ok(client)
}

/// Parse a Retry-After header when the provider sends one
pub(crate) fn retry_after_seconds(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credential_is_fatal() {
        std::env::remove_var("DEEPL_API_KEY");
        let config = TranslatorConfig {
            service: ServiceKind::Deepl,
            ..Default::default()
        };

        let err = create_service(&config).err().unwrap();
        assert!(matches!(err, TranslationError::ConfigError { .. }));
        assert!(err.to_string().contains("DEEPL_API_KEY"));
    }

    #[test]
    fn test_google_free_needs_no_credential() {
        let config = TranslatorConfig {
            service: ServiceKind::GoogleFree,
            ..Default::default()
        };
        assert!(create_service(&config).is_ok());
    }
}
