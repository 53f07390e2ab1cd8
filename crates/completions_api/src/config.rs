use std::time::Duration;

use crate::url::DEFAULT_COMPLETIONS_BASE_URL;

/// Transport configuration for chat-completions requests.
#[derive(Debug, Clone)]
pub struct CompletionsApiConfig {
    /// Optional bearer token passed to `Authorization`.
    pub api_key: Option<String>,
    /// Base URL or full endpoint URL.
    pub base_url: String,
    /// Optional request timeout.
    pub timeout: Option<Duration>,
}

impl Default for CompletionsApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_COMPLETIONS_BASE_URL.to_string(),
            timeout: None,
        }
    }
}

impl CompletionsApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
