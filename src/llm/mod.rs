//! Language model access and the two model-backed stages.

pub mod client;
pub mod composer;
pub mod extract;
pub mod scripted;
pub mod synthesizer;

pub use client::{GenerationOptions, LanguageModel, LlmClient, ProviderKind};
pub use composer::ResponseComposer;
pub use extract::ExtractionPolicy;
pub use scripted::ScriptedModel;
pub use synthesizer::QuerySynthesizer;

use crate::config::Config;
use crate::types::Result;
use std::sync::Arc;

/// Build the model client a configuration describes.
///
/// The `mock` provider answers every call with `base_url` (or `SELECT 1;`),
/// for offline smoke runs.
///
/// # Errors
///
/// Returns `AskError::Config` if the provider needs an API key that is not set
pub fn from_config(config: &Config) -> Result<Arc<dyn LanguageModel>> {
    let provider = config.provider_kind();
    if provider == ProviderKind::Mock {
        let canned = config.base_url.clone().unwrap_or_else(|| "SELECT 1;".to_string());
        return Ok(Arc::new(ScriptedModel::repeating(canned)));
    }

    let api_key = config.api_key()?.unwrap_or_default();
    let mut client = LlmClient::new(provider, config.model.clone(), api_key);
    if let Some(url) = &config.base_url {
        client = client.with_base_url(url.clone());
    }

    tracing::debug!(provider = ?provider, model = %config.model, "Model client created");
    Ok(Arc::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_provider_needs_no_key() {
        let config = Config {
            provider: Some(ProviderKind::Mock),
            base_url: Some("SELECT name FROM customers;".to_string()),
            ..Config::default()
        };
        let model = from_config(&config).unwrap();
        let text = model.complete("q", &GenerationOptions::default()).await.unwrap();
        assert_eq!(text, "SELECT name FROM customers;");
        assert_eq!(model.model_name(), "mock");
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let config = Config {
            provider: Some(ProviderKind::OpenAI),
            api_key_env: Some("SQLASK_TEST_KEY_THAT_IS_NEVER_SET".to_string()),
            ..Config::default()
        };
        assert!(matches!(
            from_config(&config),
            Err(crate::types::AskError::Config(_))
        ));
    }
}
