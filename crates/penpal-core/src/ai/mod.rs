pub mod openai;

pub use openai::{ClientSettings, OpenAIClient};

use async_trait::async_trait;

use crate::error::LlmError;

/// A single system + user exchange sent to a chat-completion model.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Anything that can turn a [`CompletionRequest`] into generated text.
///
/// [`OpenAIClient`] is the production implementation; tests script their own.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;
}
