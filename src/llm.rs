//! Client for OpenAI-compatible chat completion endpoints.
//!
//! One [`ChatClient::complete`] call is exactly one `POST
//! {base_url}/chat/completions`. Failures are reported, never retried.

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::LlmConfig;
use crate::error::{DigestError, Result};
use crate::models::{ChatTurn, CompletionRequest};

pub struct ChatClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

impl ChatClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| DigestError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            model: config.model.clone(),
        })
    }

    /// Builds a request for the configured model.
    pub fn request(&self, messages: Vec<ChatTurn>, temperature: f32, max_tokens: Option<u32>) -> CompletionRequest {
        CompletionRequest {
            model: self.model.clone(),
            messages,
            temperature,
            max_tokens,
        }
    }

    /// Sends one completion request and returns the first choice, trimmed.
    pub async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            DigestError::Configuration("OpenAI API key not configured".to_string())
        })?;

        debug!(
            model = %request.model,
            messages = request.messages.len(),
            temperature = request.temperature,
            "sending completion request"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(request)
            .send()
            .await
            .map_err(|e| DigestError::CompletionService(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            warn!(%status, "completion endpoint returned an error");
            return Err(DigestError::CompletionService(format!(
                "API error {}: {}",
                status, body_text
            )));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| DigestError::CompletionService(format!("invalid response body: {}", e)))?;
        parse_completion_response(&json)
    }
}

/// Extracts `choices[0].message.content` from a completion response.
fn parse_completion_response(json: &Value) -> Result<String> {
    let content = json
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.pointer("/message/content"))
        .and_then(|content| content.as_str())
        .ok_or_else(|| {
            DigestError::CompletionService("response has no choices with message content".to_string())
        })?;
    Ok(content.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_first_choice() {
        let json = json!({
            "choices": [
                { "message": { "role": "assistant", "content": "  First answer \n" } },
                { "message": { "role": "assistant", "content": "Second" } }
            ]
        });
        assert_eq!(parse_completion_response(&json).unwrap(), "First answer");
    }

    #[test]
    fn empty_choices_are_service_errors() {
        let err = parse_completion_response(&json!({ "choices": [] })).unwrap_err();
        assert!(matches!(err, DigestError::CompletionService(_)));
        let err = parse_completion_response(&json!({ "error": "nope" })).unwrap_err();
        assert!(matches!(err, DigestError::CompletionService(_)));
    }

    #[test]
    fn endpoint_joins_base_url() {
        let client = ChatClient::new(&LlmConfig {
            base_url: "http://localhost:8080/v1/".into(),
            ..LlmConfig::default()
        })
        .unwrap();
        assert_eq!(client.endpoint, "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn request_serializes_without_empty_max_tokens() {
        let client = ChatClient::new(&LlmConfig::default()).unwrap();
        let request = client.request(vec![ChatTurn::user("hi")], 0.7, None);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-3.5-turbo");
        assert_eq!(json["messages"][0]["role"], "user");
        assert!(json.get("max_tokens").is_none());
    }

    #[tokio::test]
    async fn missing_api_key_fails_before_any_request() {
        // Unroutable endpoint: reaching the network would surface as CompletionService.
        let client = ChatClient::new(&LlmConfig {
            base_url: "http://192.0.2.1:9".into(),
            api_key: None,
            ..LlmConfig::default()
        })
        .unwrap();
        let request = client.request(vec![ChatTurn::user("hi")], 0.5, Some(10));
        let err = client.complete(&request).await.unwrap_err();
        assert!(matches!(err, DigestError::Configuration(_)));
    }
}
