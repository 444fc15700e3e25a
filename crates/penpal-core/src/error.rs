use reqwest::StatusCode;
use thiserror::Error;

/// Failures talking to the language-model provider.
///
/// None of these reach the view: [`crate::PenPal`] turns every variant into a
/// textual fallback before returning.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("OpenAI API key not configured")]
    MissingCredential,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI API error {status}: {body}")]
    Api { status: StatusCode, body: String },

    #[error("response contained no message content")]
    EmptyResponse,
}
