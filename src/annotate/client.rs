//! The generation endpoint: request/response types and the HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ReaderConfig;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Body of a chat-completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
}

impl GenerationRequest {
    /// A single user message.
    pub fn prompt(model: &str, content: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![ChatMessage::user(content)],
            max_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Extract `choices[0].message.content` from a response body.
///
/// Anything else is a [`Error::MalformedResponse`]: the call itself succeeded.
pub fn parse_generation_response(body: &str) -> Result<String> {
    let response: GenerationResponse = serde_json::from_str(body)
        .map_err(|e| Error::MalformedResponse(format!("invalid JSON: {e}")))?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .ok_or_else(|| Error::MalformedResponse("no choices[0].message.content".into()))
}

/// Something that turns a prompt into generated text.
///
/// Transport failures and error statuses are [`Error::GenerationFailure`];
/// a successful call with a body that cannot be read is
/// [`Error::MalformedResponse`].
#[async_trait(?Send)]
pub trait GenerationClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}

/// Chat-completion client over HTTPS with bearer authentication.
pub struct HttpGenerationClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpGenerationClient {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| Error::Config(format!("HTTP client: {e}")))?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            api_key,
        })
    }

    pub fn from_config(config: &ReaderConfig) -> Result<Self> {
        Self::new(config.endpoint.clone(), config.resolved_api_key())
    }
}

#[async_trait(?Send)]
impl GenerationClient for HttpGenerationClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let mut builder = self.http.post(&self.endpoint).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::GenerationFailure(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::GenerationFailure(format!("endpoint returned {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::GenerationFailure(e.to_string()))?;
        debug!(model = %request.model, bytes = body.len(), "generation response");
        parse_generation_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let request = GenerationRequest::prompt("mistral-tiny", "hi", 150);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model": "mistral-tiny",
                "messages": [{"role": "user", "content": "hi"}],
                "max_tokens": 150
            })
        );
    }

    #[test]
    fn test_parse_response_content() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"Definition: big"}}]}"#;
        assert_eq!(parse_generation_response(body).unwrap(), "Definition: big");
    }

    #[test]
    fn test_parse_response_errors_are_malformed() {
        for body in ["not json", r#"{"choices":[]}"#, r#"{"choices":[{"message":{}}]}"#] {
            assert!(matches!(
                parse_generation_response(body),
                Err(Error::MalformedResponse(_))
            ));
        }
    }
}
