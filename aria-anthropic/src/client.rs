use tracing::{debug, instrument};

use crate::convert::{build_request_body, error_message, parse_response};
use crate::error::AnthropicError;
use crate::types::{Completion, MessagesRequest};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

/// Client for the Anthropic messages API.
#[derive(Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl AnthropicClient {
    /// Creates a new client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Creates a new client with a custom base URL (e.g. a local proxy).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Executes a messages request.
    #[instrument(skip(self, request), fields(model = %request.model, max_tokens = request.max_tokens))]
    pub async fn complete(&self, request: &MessagesRequest) -> Result<Completion, AnthropicError> {
        let body = build_request_body(request);

        debug!("Sending request to messages endpoint");

        let response = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let response_body: serde_json::Value = response.json().await?;

        if !status.is_success() {
            return Err(AnthropicError::Api {
                status: status.as_u16(),
                message: error_message(&response_body),
            });
        }

        debug!("Received successful response");

        parse_response(&response_body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Message;

    #[test]
    fn test_client_creation() {
        let client = AnthropicClient::new("test-key");
        assert_eq!(client.api_key, "test-key");
        assert_eq!(client.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_client_custom_base_url() {
        let client = AnthropicClient::with_base_url("test-key", "http://localhost:8787/");
        assert_eq!(client.base_url(), "http://localhost:8787");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_http_error() {
        let client = AnthropicClient::with_base_url("test-key", "http://127.0.0.1:9");
        let request = MessagesRequest {
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 16,
            system: None,
            messages: vec![Message::user_text("ping")],
        };

        let result = client.complete(&request).await;
        assert!(matches!(result, Err(AnthropicError::Http(_))));
    }

    #[tokio::test]
    #[ignore = "requires ANTHROPIC_API_KEY env var"]
    async fn test_live_api() {
        let api_key = std::env::var("ANTHROPIC_API_KEY").expect("ANTHROPIC_API_KEY not set");
        let client = AnthropicClient::new(api_key);

        let request = MessagesRequest {
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 64,
            system: Some("Reply with the JSON object {\"action\":\"query\"} and nothing else.".to_string()),
            messages: vec![Message::user_text("hello")],
        };

        let completion = client.complete(&request).await.unwrap();
        assert!(completion.text.is_some());
    }
}
