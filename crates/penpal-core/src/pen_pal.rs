//! The AI correspondent: subject lines and letter replies with textual fallbacks.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::ai::{ClientSettings, CompletionBackend, CompletionRequest, OpenAIClient};
use crate::error::LlmError;
use crate::prompts;

/// Model and sampling parameters for one kind of request.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PenPalSettings {
    pub subject: ModelSettings,
    pub reply: ModelSettings,
    pub client: ClientSettings,
}

impl Default for PenPalSettings {
    fn default() -> Self {
        Self {
            subject: ModelSettings {
                model: "gpt-4o-mini".to_string(),
                temperature: 0.7,
                max_tokens: 20,
            },
            reply: ModelSettings {
                model: "gpt-4o".to_string(),
                temperature: 0.8,
                max_tokens: 2000,
            },
            client: ClientSettings::default(),
        }
    }
}

/// Front door to the language model for the correspondence controller.
///
/// Cloning is cheap; clones share the backend that was configured at the
/// time of cloning, so an in-flight send keeps its credential even if the
/// key is replaced meanwhile.
#[derive(Clone)]
pub struct PenPal {
    backend: Option<Arc<dyn CompletionBackend>>,
    settings: PenPalSettings,
}

impl PenPal {
    /// A pen pal with no credential. Replies short-circuit to a warning.
    pub fn new(settings: PenPalSettings) -> Self {
        Self {
            backend: None,
            settings,
        }
    }

    pub fn with_backend(backend: Arc<dyn CompletionBackend>, settings: PenPalSettings) -> Self {
        Self {
            backend: Some(backend),
            settings,
        }
    }

    /// Builds an OpenAI-backed pen pal when `api_key` holds a usable key.
    pub fn from_api_key(api_key: Option<&str>, settings: PenPalSettings) -> Self {
        let mut pen_pal = Self::new(settings);
        if let Some(key) = api_key {
            let status = pen_pal.set_api_key(key);
            info!(%status, "initial API key");
        }
        pen_pal
    }

    pub fn settings(&self) -> &PenPalSettings {
        &self.settings
    }

    pub fn has_credential(&self) -> bool {
        self.backend.is_some()
    }

    /// Installs a new OpenAI credential and returns a status message for the view.
    /// A blank key leaves the current credential untouched.
    pub fn set_api_key(&mut self, key: &str) -> String {
        let key = key.trim();
        if key.is_empty() {
            return prompts::INVALID_KEY_MESSAGE.to_string();
        }

        match OpenAIClient::new(key, &self.settings.client) {
            Ok(client) => {
                self.backend = Some(Arc::new(client));
                prompts::KEY_SET_MESSAGE.to_string()
            }
            Err(e) => {
                warn!(error = %e, "could not build OpenAI client");
                format!("Failed to configure API key: {}", e)
            }
        }
    }

    /// Short subject line for the first letter of a thread. Never fails:
    /// any problem yields [`prompts::SUBJECT_FALLBACK`].
    #[instrument(skip_all)]
    pub async fn generate_subject(&self, letter_body: &str) -> String {
        let request = CompletionRequest {
            model: self.settings.subject.model.clone(),
            system: prompts::SUBJECT_SYSTEM_PROMPT.to_string(),
            user: prompts::subject_request(letter_body),
            temperature: self.settings.subject.temperature,
            max_tokens: self.settings.subject.max_tokens,
        };

        match self.complete(&request).await.map(|raw| clean_subject(&raw)) {
            Ok(subject) if !subject.is_empty() => subject,
            Ok(_) => {
                warn!("model returned an empty subject line");
                prompts::SUBJECT_FALLBACK.to_string()
            }
            Err(e) => {
                warn!(error = %e, "subject generation failed");
                prompts::SUBJECT_FALLBACK.to_string()
            }
        }
    }

    /// The pen pal's letter in reply to `letter_body`. Failures come back as
    /// a warning string that stands in for the letter.
    #[instrument(skip(self, letter_body))]
    pub async fn generate_reply(&self, letter_body: &str, subject: &str) -> String {
        if self.backend.is_none() {
            return prompts::MISSING_KEY_WARNING.to_string();
        }

        let request = CompletionRequest {
            model: self.settings.reply.model.clone(),
            system: prompts::REPLY_SYSTEM_PROMPT.to_string(),
            user: letter_body.to_string(),
            temperature: self.settings.reply.temperature,
            max_tokens: self.settings.reply.max_tokens,
        };

        match self.complete(&request).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "reply generation failed");
                prompts::reply_error(&e)
            }
        }
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let backend = self.backend.as_ref().ok_or(LlmError::MissingCredential)?;
        backend.complete(request).await
    }
}

fn clean_subject(raw: &str) -> String {
    raw.trim()
        .trim_matches('"')
        .trim_matches('\'')
        .to_string()
}
