use std::sync::Arc;

use chat_provider::{ChatProvider, ProviderInitError};
use chat_provider_completions_api::{
    CompletionsProvider, CompletionsProviderConfig, COMPLETIONS_PROVIDER_ID, DEFAULT_MODEL_ID,
};
use chat_provider_mock::{MockProvider, MOCK_PROVIDER_ID};

use crate::config::EnvConfig;

pub const DEFAULT_PROVIDER_ID: &str = COMPLETIONS_PROVIDER_ID;

pub fn provider_from_config(config: &EnvConfig) -> Result<Arc<dyn ChatProvider>, ProviderInitError> {
    provider_for_id(
        config.provider_id.as_deref().unwrap_or(DEFAULT_PROVIDER_ID),
        config,
    )
}

pub fn provider_for_id(
    provider_id: &str,
    config: &EnvConfig,
) -> Result<Arc<dyn ChatProvider>, ProviderInitError> {
    match provider_id {
        COMPLETIONS_PROVIDER_ID => {
            let mut provider_config = CompletionsProviderConfig::new(
                config.model_id.as_deref().unwrap_or(DEFAULT_MODEL_ID),
            );
            if let Some(base_url) = &config.api_url {
                provider_config = provider_config.with_base_url(base_url);
            }
            if let Some(api_key) = &config.api_key {
                provider_config = provider_config.with_api_key(api_key);
            }
            if let Some(timeout) = config.timeout {
                provider_config = provider_config.with_timeout(timeout);
            }
            Ok(Arc::new(CompletionsProvider::new(provider_config)?))
        }
        MOCK_PROVIDER_ID => Ok(Arc::new(MockProvider::default())),
        unknown => Err(ProviderInitError::new(format!(
            "Unsupported provider '{unknown}'. Available providers: {COMPLETIONS_PROVIDER_ID}, {MOCK_PROVIDER_ID}"
        ))),
    }
}
