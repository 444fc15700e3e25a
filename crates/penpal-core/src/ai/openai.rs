use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{CompletionBackend, CompletionRequest};
use crate::error::LlmError;

pub const DEFAULT_API_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Serialize)]
struct OpenAIMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

/// Where and how long to talk to an OpenAI-compatible endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

#[derive(Clone)]
pub struct OpenAIClient {
    client: Client,
    api_key: String,
    completions_url: String,
}

impl OpenAIClient {
    pub fn new(api_key: &str, settings: &ClientSettings) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(settings.timeout).build()?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            completions_url: format!(
                "{}/chat/completions",
                settings.base_url.trim_end_matches('/')
            ),
        })
    }
}

#[async_trait]
impl CompletionBackend for OpenAIClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let body = OpenAIRequest {
            model: &request.model,
            messages: vec![
                OpenAIMessage {
                    role: "system",
                    content: &request.system,
                },
                OpenAIMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        debug!(model = %request.model, max_tokens = request.max_tokens, "sending chat completion");

        let response = self
            .client
            .post(&self.completions_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api { status, body });
        }

        let openai_response: OpenAIResponse = response.json().await?;
        openai_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(LlmError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_system_and_user_messages() {
        let body = OpenAIRequest {
            model: "gpt-4o-mini",
            messages: vec![
                OpenAIMessage { role: "system", content: "be brief" },
                OpenAIMessage { role: "user", content: "hello" },
            ],
            temperature: 0.7,
            max_tokens: 20,
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["max_tokens"], 20);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hello");
    }

    #[test]
    fn null_content_parses_as_missing() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        let parsed: OpenAIResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }

    #[test]
    fn base_url_trailing_slash_is_normalised() {
        let settings = ClientSettings {
            base_url: "http://localhost:8080/v1/".to_string(),
            ..ClientSettings::default()
        };
        let client = OpenAIClient::new("sk-test", &settings).unwrap();
        assert_eq!(client.completions_url, "http://localhost:8080/v1/chat/completions");
    }
}
