use std::collections::BTreeMap;

use crate::config::CompletionsApiConfig;

pub const HEADER_ACCEPT: &str = "accept";
pub const HEADER_CONTENT_TYPE: &str = "content-type";
pub const HEADER_AUTHORIZATION: &str = "authorization";
pub const HEADER_USER_AGENT: &str = "User-Agent";

/// Build a deterministic header map for chat-completions requests.
pub fn build_headers(config: &CompletionsApiConfig) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();

    if let Some(api_key) = config.api_key.as_deref().and_then(sanitize_nonempty) {
        headers.insert(HEADER_AUTHORIZATION.to_owned(), format!("Bearer {api_key}"));
    }
    headers.insert(HEADER_ACCEPT.to_owned(), "application/json".to_owned());
    headers.insert(
        HEADER_CONTENT_TYPE.to_owned(),
        "application/json".to_owned(),
    );

    headers.insert(HEADER_USER_AGENT.to_owned(), default_user_agent());

    headers
}

fn sanitize_nonempty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

fn default_user_agent() -> String {
    format!("shllm/{} ({})", env!("CARGO_PKG_VERSION"), std::env::consts::OS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_header_is_omitted_without_key() {
        let headers = build_headers(&CompletionsApiConfig::default());
        assert!(!headers.contains_key(HEADER_AUTHORIZATION));
        assert_eq!(headers[HEADER_CONTENT_TYPE], "application/json");
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let headers = build_headers(&CompletionsApiConfig::default().with_api_key("   "));
        assert!(!headers.contains_key(HEADER_AUTHORIZATION));
    }

    #[test]
    fn trimmed_key_and_program_user_agent_are_sent() {
        let config = CompletionsApiConfig::default().with_api_key(" sk-test ");

        let headers = build_headers(&config);
        assert_eq!(headers[HEADER_AUTHORIZATION], "Bearer sk-test");
        assert!(headers[HEADER_USER_AGENT].starts_with("shllm/"));
        assert_eq!(
            headers.keys().map(String::as_str).collect::<Vec<_>>(),
            vec![HEADER_USER_AGENT, HEADER_ACCEPT, HEADER_AUTHORIZATION, HEADER_CONTENT_TYPE]
        );
    }
}
