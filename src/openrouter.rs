use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::ModelConfig;

const API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

// OpenRouter attribution headers, shown on their usage dashboard.
const REFERER: &str = "https://github.com/arena-cli/arena";
const APP_TITLE: &str = "Model Arena";

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("OpenRouter API key is missing")]
    MissingCredential,
    #[error("request timed out after {}s", REQUEST_TIMEOUT.as_secs())]
    Timeout,
    #[error("provider returned {status}")]
    Api { status: StatusCode, body: String },
    #[error("malformed provider response: {0}")]
    Provider(String),
    #[error("request failed: {0}")]
    Request(reqwest::Error),
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

impl<'a> ChatRequest<'a> {
    /// System message first (may be empty), then the user prompt.
    fn new(prompt: &'a str, model: &'a ModelConfig) -> Self {
        Self {
            model: &model.id,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &model.system_message,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        }
    }
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

/// Chat-completion client. One attempt per call, no retries; a failed call
/// renders inline where the answer would have been, and never blocks the
/// other contestant's call.
#[derive(Clone)]
pub struct OpenRouterClient {
    client: Client,
    api_key: String,
}

impl OpenRouterClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
        }
    }

    /// Returns the first choice's message content verbatim. No
    /// post-processing: whatever markup the model produced is the caller's
    /// problem to display.
    pub async fn complete(
        &self,
        prompt: &str,
        model: &ModelConfig,
    ) -> Result<String, CompletionError> {
        let request = ChatRequest::new(prompt, model);

        debug!(model = %model.id, "requesting completion");

        let response = self
            .client
            .post(API_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("HTTP-Referer", REFERER)
            .header("X-Title", APP_TITLE)
            .timeout(REQUEST_TIMEOUT)
            .json(&request)
            .send()
            .await
            .map_err(classify_transport)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(model = %model.id, %status, "completion request failed");
            return Err(CompletionError::Api { status, body });
        }

        let chat: ChatResponse = response.json().await.map_err(classify_transport)?;
        chat.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| CompletionError::Provider("response contained no choices".to_string()))
    }
}

fn classify_transport(err: reqwest::Error) -> CompletionError {
    if err.is_timeout() {
        CompletionError::Timeout
    } else {
        CompletionError::Request(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> ModelConfig {
        ModelConfig {
            id: "openai/gpt-4o-mini".to_string(),
            system_message: "Be terse.".to_string(),
            display_name: "Model B".to_string(),
        }
    }

    #[test]
    fn test_request_body_shape() {
        let model = model();
        let request = ChatRequest::new("Explain gravity", &model);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "openai/gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][0]["content"], "Be terse.");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "Explain gravity");
    }

    #[test]
    fn test_empty_system_message_is_sent() {
        let model = ModelConfig {
            system_message: String::new(),
            ..model()
        };
        let request = ChatRequest::new("hi", &model);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"].as_array().unwrap().len(), 2);
        assert_eq!(json["messages"][0]["content"], "");
    }

    #[test]
    fn test_response_content_extraction() {
        let body = r#"{"choices": [{"message": {"role": "assistant", "content": "hello"}}]}"#;
        let chat: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(chat.choices[0].message.content, "hello");
    }

    #[test]
    fn test_api_error_uses_reason_phrase() {
        let err = CompletionError::Api {
            status: StatusCode::TOO_MANY_REQUESTS,
            body: "{\"error\": \"rate limited\"}".to_string(),
        };
        assert_eq!(err.to_string(), "provider returned 429 Too Many Requests");
    }

    #[test]
    fn test_missing_credential_message() {
        assert_eq!(
            CompletionError::MissingCredential.to_string(),
            "OpenRouter API key is missing"
        );
    }
}
