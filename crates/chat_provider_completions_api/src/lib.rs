//! Chat-completions-backed implementation of the shared `chat_provider` contract.
//!
//! This adapter sends the whole conversation in one blocking request and turns
//! the response's candidate list into exactly one reply turn, or an error.

use std::sync::Arc;
use std::time::Duration;

use chat_provider::{
    ChatProvider, Conversation, ExchangeError, Message, ProviderInitError, ProviderProfile,
    ASSISTANT_ROLE,
};
use completions_api::{
    CompletionRequest, CompletionResponse, CompletionsApiClient, CompletionsApiConfig,
    CompletionsApiError, WireMessage,
};
use tracing::debug;

/// Stable provider identifier used by startup selection.
pub const COMPLETIONS_PROVIDER_ID: &str = "completions";

/// Model used when none is configured.
pub const DEFAULT_MODEL_ID: &str = "gpt-4o-mini";

/// Runtime configuration for the completions provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionsProviderConfig {
    pub model_id: String,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout: Option<Duration>,
}

impl CompletionsProviderConfig {
    #[must_use]
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            base_url: None,
            api_key: None,
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn into_api_config(self) -> CompletionsApiConfig {
        let mut config = CompletionsApiConfig::default();

        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }

        if let Some(api_key) = self.api_key {
            config = config.with_api_key(api_key);
        }

        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }

        config
    }
}

trait CompletionClient: Send + Sync {
    fn complete(&self, request: &CompletionRequest)
        -> Result<CompletionResponse, CompletionsApiError>;
}

#[derive(Debug)]
struct DefaultCompletionClient {
    client: CompletionsApiClient,
}

impl CompletionClient for DefaultCompletionClient {
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, CompletionsApiError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|error| {
                CompletionsApiError::Runtime(format!("failed to initialize tokio runtime: {error}"))
            })?;

        runtime.block_on(self.client.complete(request))
    }
}

/// `ChatProvider` adapter backed by `completions_api` transport primitives.
pub struct CompletionsProvider {
    model_id: String,
    client: Arc<dyn CompletionClient>,
}

impl CompletionsProvider {
    /// Creates a provider using real HTTP transport.
    pub fn new(config: CompletionsProviderConfig) -> Result<Self, ProviderInitError> {
        let model_id = sanitize_model_id(&config.model_id);
        let client = Arc::new(DefaultCompletionClient {
            client: CompletionsApiClient::new(config.into_api_config()).map_err(map_init_error)?,
        });

        Ok(Self { model_id, client })
    }

    fn request_for(&self, conversation: &Conversation) -> CompletionRequest {
        let messages = conversation
            .messages()
            .iter()
            .map(|message| WireMessage::new(message.role(), message.content()))
            .collect();
        CompletionRequest::new(self.model_id.clone(), messages)
    }

    #[cfg(test)]
    fn with_client_for_tests(model_id: &str, client: Arc<dyn CompletionClient>) -> Self {
        Self {
            model_id: sanitize_model_id(model_id),
            client,
        }
    }
}

impl ChatProvider for CompletionsProvider {
    fn profile(&self) -> ProviderProfile {
        ProviderProfile {
            provider_id: COMPLETIONS_PROVIDER_ID.to_string(),
            model_id: self.model_id.clone(),
        }
    }

    fn reply(&self, conversation: &Conversation) -> Result<Message, ExchangeError> {
        let request = self.request_for(conversation);
        debug!(
            model = %self.model_id,
            turns = request.messages.len(),
            "sending completion request"
        );

        let response = self.client.complete(&request).map_err(map_exchange_error)?;
        single_reply(response)
    }
}

fn single_reply(response: CompletionResponse) -> Result<Message, ExchangeError> {
    let mut choices = response.choices;
    match choices.len() {
        0 => Err(ExchangeError::NoCandidates),
        1 => {
            let message = choices.remove(0).message;
            let role = message
                .role
                .filter(|role| !role.trim().is_empty())
                .unwrap_or_else(|| ASSISTANT_ROLE.to_string());
            Ok(Message::now(role, message.content.unwrap_or_default()))
        }
        count => Err(ExchangeError::AmbiguousCandidates { count }),
    }
}

fn map_exchange_error(error: CompletionsApiError) -> ExchangeError {
    match error {
        CompletionsApiError::MalformedResponse(error) => {
            ExchangeError::MalformedResponse(error.to_string())
        }
        other => ExchangeError::Transport(other.to_string()),
    }
}

fn sanitize_model_id(model_id: &str) -> String {
    let trimmed = model_id.trim();
    if trimmed.is_empty() {
        DEFAULT_MODEL_ID.to_string()
    } else {
        trimmed.to_string()
    }
}

fn map_init_error(error: CompletionsApiError) -> ProviderInitError {
    ProviderInitError::new(format!("Failed to initialize completions provider: {error}"))
}

#[cfg(test)]
mod tests {
    use std::sync::{Mutex, MutexGuard};

    use chat_provider::USER_ROLE;
    use completions_api::{Choice, ChoiceMessage};

    use super::*;

    struct FakeCompletionClient {
        observed: Mutex<Option<CompletionRequest>>,
        outcome: Mutex<Option<Result<CompletionResponse, CompletionsApiError>>>,
    }

    impl FakeCompletionClient {
        fn returning(outcome: Result<CompletionResponse, CompletionsApiError>) -> Arc<Self> {
            Arc::new(Self {
                observed: Mutex::new(None),
                outcome: Mutex::new(Some(outcome)),
            })
        }

        fn observed(&self) -> Option<CompletionRequest> {
            lock_unpoisoned(&self.observed).clone()
        }
    }

    impl CompletionClient for FakeCompletionClient {
        fn complete(
            &self,
            request: &CompletionRequest,
        ) -> Result<CompletionResponse, CompletionsApiError> {
            *lock_unpoisoned(&self.observed) = Some(request.clone());
            lock_unpoisoned(&self.outcome)
                .take()
                .expect("fake outcome should be consumed exactly once")
        }
    }

    fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        match mutex.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn choice(role: Option<&str>, content: Option<&str>) -> Choice {
        Choice {
            message: ChoiceMessage {
                role: role.map(str::to_string),
                content: content.map(str::to_string),
            },
        }
    }

    fn response(choices: Vec<Choice>) -> CompletionResponse {
        CompletionResponse { choices }
    }

    fn hello() -> Conversation {
        let mut conversation = Conversation::new("test");
        conversation.push(Message::user_now("hello"));
        conversation
    }

    fn provider_with(
        outcome: Result<CompletionResponse, CompletionsApiError>,
    ) -> (CompletionsProvider, Arc<FakeCompletionClient>) {
        let client = FakeCompletionClient::returning(outcome);
        let provider = CompletionsProvider::with_client_for_tests(
            "gpt-test",
            Arc::clone(&client) as Arc<dyn CompletionClient>,
        );
        (provider, client)
    }

    #[test]
    fn single_candidate_becomes_reply_turn() {
        let (provider, client) =
            provider_with(Ok(response(vec![choice(Some("assistant"), Some("hi there"))])));
        let conversation = hello();

        let reply = provider.reply(&conversation).expect("one candidate should reply");

        assert_eq!(reply.role(), ASSISTANT_ROLE);
        assert_eq!(reply.content(), "hi there");
        assert!(reply.timestamp() >= conversation.messages()[0].timestamp());

        let sent = client.observed().expect("request should be observed");
        assert_eq!(sent.model, "gpt-test");
        assert_eq!(sent.messages, vec![WireMessage::new(USER_ROLE, "hello")]);
    }

    #[test]
    fn zero_candidates_is_an_error() {
        let (provider, _) = provider_with(Ok(response(Vec::new())));
        assert_eq!(provider.reply(&hello()), Err(ExchangeError::NoCandidates));
    }

    #[test]
    fn multiple_candidates_is_a_protocol_violation() {
        let (provider, _) = provider_with(Ok(response(vec![
            choice(Some("assistant"), Some("a")),
            choice(Some("assistant"), Some("b")),
        ])));
        assert_eq!(
            provider.reply(&hello()),
            Err(ExchangeError::AmbiguousCandidates { count: 2 })
        );
    }

    #[test]
    fn missing_role_and_null_content_default_to_empty_assistant_turn() {
        let (provider, _) = provider_with(Ok(response(vec![choice(None, None)])));
        let reply = provider.reply(&hello()).expect("one candidate should reply");

        assert_eq!(reply.role(), ASSISTANT_ROLE);
        assert_eq!(reply.content(), "");
    }

    #[test]
    fn transport_failure_maps_to_transport_error() {
        let (provider, _) =
            provider_with(Err(CompletionsApiError::Runtime("connection refused".to_string())));

        let error = provider.reply(&hello()).expect_err("transport failure must fail");
        assert!(matches!(error, ExchangeError::Transport(message) if message.contains("connection refused")));
    }

    #[test]
    fn malformed_body_maps_to_malformed_response() {
        let parse_error = serde_json::from_str::<serde_json::Value>("not json")
            .expect_err("garbage should not parse");
        let (provider, _) = provider_with(Err(CompletionsApiError::MalformedResponse(parse_error)));

        let error = provider.reply(&hello()).expect_err("malformed body must fail");
        assert!(matches!(error, ExchangeError::MalformedResponse(_)));
    }

    #[test]
    fn blank_model_defaults_to_safe_model() {
        let (_, client) = provider_with(Ok(response(Vec::new())));
        let provider = CompletionsProvider::with_client_for_tests("  ", client);

        assert_eq!(provider.profile().model_id, DEFAULT_MODEL_ID);
        assert_eq!(provider.profile().provider_id, COMPLETIONS_PROVIDER_ID);
    }

    #[test]
    fn provider_constructs_with_real_transport() {
        let provider = CompletionsProvider::new(
            CompletionsProviderConfig::new("gpt-test")
                .with_base_url("http://127.0.0.1:9/v1")
                .with_timeout(Duration::from_secs(5)),
        )
        .expect("provider should construct");

        assert_eq!(provider.profile().model_id, "gpt-test");
    }
}
