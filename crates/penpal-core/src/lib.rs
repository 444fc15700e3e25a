pub mod ai;
pub mod config;
pub mod controller;
pub mod dictation;
pub mod error;
pub mod format;
pub mod pen_pal;
pub mod prompts;
pub mod state;

// Re-export main types for convenience
pub use ai::{ClientSettings, CompletionBackend, CompletionRequest, OpenAIClient};
pub use config::Config;
pub use controller::{
    download_letter, new_conversation, send_letter, ComposeLabels, Download, Outcome, ViewData,
};
pub use dictation::{Dictation, DictationState, TranscriptEvent};
pub use error::LlmError;
pub use format::{format_header, render_thread};
pub use pen_pal::{ModelSettings, PenPal, PenPalSettings};
pub use state::{ConversationState, Letter, Role};
