use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;

use crate::config::CompletionsApiConfig;
use crate::error::{parse_error_message, CompletionsApiError};
use crate::headers::build_headers;
use crate::payload::{CompletionRequest, CompletionResponse};
use crate::url::normalize_completions_url;

#[derive(Debug)]
pub struct CompletionsApiClient {
    http: Client,
    config: CompletionsApiConfig,
}

impl CompletionsApiClient {
    pub fn new(config: CompletionsApiConfig) -> Result<Self, CompletionsApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(CompletionsApiError::from)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &CompletionsApiConfig {
        &self.config
    }

    pub fn normalized_endpoint(&self) -> String {
        normalize_completions_url(&self.config.base_url)
    }

    pub fn build_headers(&self) -> Result<HeaderMap, CompletionsApiError> {
        let mut out = HeaderMap::new();
        for (key, value) in build_headers(&self.config) {
            out.insert(
                HeaderName::from_bytes(key.as_bytes()).map_err(|_| {
                    CompletionsApiError::InvalidHeader(format!("invalid header key: {key}"))
                })?,
                HeaderValue::from_str(&value).map_err(|_| {
                    CompletionsApiError::InvalidHeader(format!("invalid header value for {key}"))
                })?,
            );
        }
        Ok(out)
    }

    pub fn build_request(
        &self,
        request: &CompletionRequest,
    ) -> Result<reqwest::RequestBuilder, CompletionsApiError> {
        let headers = self.build_headers()?;
        Ok(self
            .http
            .post(self.normalized_endpoint())
            .headers(headers)
            .json(request))
    }

    /// Sends one request and parses the candidate list. No retries.
    pub async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, CompletionsApiError> {
        let response = self.build_request(request)?.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(CompletionsApiError::Status(
                status,
                parse_error_message(status, &body),
            ));
        }

        serde_json::from_str(&body).map_err(CompletionsApiError::MalformedResponse)
    }
}
