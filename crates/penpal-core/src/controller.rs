//! Correspondence controller
//!
//! Every operation takes the current [`ConversationState`] by value and hands
//! back the next one together with plain view data. The view layer decides
//! how to show it.

use chrono::Local;
use tracing::{debug, info};

use crate::format::{render_thread, EMPTY_THREAD_PLACEHOLDER};
use crate::pen_pal::PenPal;
use crate::state::{ConversationState, Role};

pub const EMPTY_INPUT_MESSAGE: &str = "Please write a letter before sending.";
pub const USER_LETTER_PLACEHOLDER: &str = "*Your letter will appear here after sending*";
pub const AI_REPLY_PLACEHOLDER: &str = "*Waiting for your letter...*";
pub const NOTHING_TO_DOWNLOAD: &str = "# No letter to download\n\nPlease send a letter first.";

/// Compose-pane wording. Switches to reply phrasing once a thread exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeLabels {
    pub section_title: &'static str,
    pub input_label: &'static str,
    pub input_placeholder: &'static str,
    pub send_button: &'static str,
}

impl ComposeLabels {
    pub fn first_letter() -> Self {
        Self {
            section_title: "Compose Your Letter",
            input_label: "Your Letter",
            input_placeholder: "Dear AI Pen Pal,\n\nI've been thinking about...",
            send_button: "Send Letter",
        }
    }

    pub fn reply() -> Self {
        Self {
            section_title: "Compose Your Reply",
            input_label: "Your Reply",
            input_placeholder: "Dear AI Pen Pal,\n\nThank you for your letter. In response...",
            send_button: "Send Reply",
        }
    }

    pub fn for_state(state: &ConversationState) -> Self {
        if state.is_first_letter() {
            Self::first_letter()
        } else {
            Self::reply()
        }
    }
}

/// What the panes should show after an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewData {
    /// New content of the compose input.
    pub input: String,
    /// AI reply pane.
    pub ai_letter: String,
    /// Thread history pane.
    pub thread_display: String,
    /// "Your last letter" pane.
    pub user_letter: String,
    pub labels: ComposeLabels,
}

#[derive(Debug, Clone)]
pub struct Outcome {
    pub state: ConversationState,
    pub view: ViewData,
}

/// Sends the user's letter and collects the pen pal's reply.
///
/// Blank input leaves the state untouched and makes no API call. Otherwise
/// exactly one user letter and one AI letter are appended, even when the
/// reply request fails: its warning text becomes the reply body.
pub async fn send_letter(input_text: &str, mut state: ConversationState, pen_pal: &PenPal) -> Outcome {
    if input_text.trim().is_empty() {
        debug!("ignoring blank letter");
        let view = ViewData {
            input: String::new(),
            ai_letter: EMPTY_INPUT_MESSAGE.to_string(),
            thread_display: render_thread(state.thread()),
            user_letter: state
                .last_letter(Role::User)
                .map(|letter| letter.formatted_content().to_string())
                .unwrap_or_default(),
            labels: ComposeLabels::for_state(&state),
        };
        return Outcome { state, view };
    }

    if state.is_first_letter() {
        let subject = pen_pal.generate_subject(input_text).await;
        info!(%subject, "starting new thread");
        state.begin_thread(subject);
    }
    let subject = state.subject().unwrap_or_default().to_string();

    let user_letter = state.append_letter(Role::User, input_text);
    let reply = pen_pal.generate_reply(input_text, &subject).await;
    let ai_letter = state.append_letter(Role::Ai, &reply);

    info!(
        user_turn = state.user_turn(),
        ai_turn = state.ai_turn(),
        letters = state.thread().len(),
        "letter exchanged"
    );

    let view = ViewData {
        input: String::new(),
        ai_letter: ai_letter.formatted_content().to_string(),
        thread_display: render_thread(state.thread()),
        user_letter: user_letter.formatted_content().to_string(),
        labels: ComposeLabels::reply(),
    };
    Outcome { state, view }
}

/// Discards the current thread.
pub fn new_conversation() -> Outcome {
    info!("new conversation");
    Outcome {
        state: ConversationState::new(),
        view: ViewData {
            input: String::new(),
            ai_letter: String::new(),
            thread_display: EMPTY_THREAD_PLACEHOLDER.to_string(),
            user_letter: String::new(),
            labels: ComposeLabels::first_letter(),
        },
    }
}

/// Result of asking for a letter as a markdown file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Download {
    Letter { file_name: String, content: String },
    Nothing { message: &'static str },
}

impl Download {
    /// The downloadable text, or the "nothing to download" notice.
    pub fn text(&self) -> &str {
        match self {
            Download::Letter { content, .. } => content,
            Download::Nothing { message } => message,
        }
    }
}

/// Prepares `content` for download as markdown. Empty panes and pane
/// placeholders have nothing to offer.
pub fn download_letter(content: &str, kind: Role) -> Download {
    let is_placeholder = [
        USER_LETTER_PLACEHOLDER,
        AI_REPLY_PLACEHOLDER,
        EMPTY_THREAD_PLACEHOLDER,
        EMPTY_INPUT_MESSAGE,
    ]
    .contains(&content.trim());

    if content.trim().is_empty() || is_placeholder {
        return Download::Nothing {
            message: NOTHING_TO_DOWNLOAD,
        };
    }

    Download::Letter {
        file_name: format!("penpal-{}-{}.md", kind.slug(), Local::now().format("%Y%m%d-%H%M%S")),
        content: content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_follow_thread_phase() {
        let state = ConversationState::new();
        assert_eq!(ComposeLabels::for_state(&state), ComposeLabels::first_letter());
        assert_eq!(ComposeLabels::first_letter().send_button, "Send Letter");
        assert_eq!(ComposeLabels::reply().input_label, "Your Reply");
    }

    #[test]
    fn reset_view_restores_placeholders() {
        let outcome = new_conversation();
        assert_eq!(outcome.view.thread_display, EMPTY_THREAD_PLACEHOLDER);
        assert_eq!(outcome.view.labels, ComposeLabels::first_letter());
        assert!(outcome.view.input.is_empty());
        assert!(outcome.state.thread().is_empty());
    }

    #[test]
    fn placeholder_downloads_nothing() {
        for content in ["", "   ", USER_LETTER_PLACEHOLDER, AI_REPLY_PLACEHOLDER] {
            let download = download_letter(content, Role::Ai);
            assert_eq!(download.text(), NOTHING_TO_DOWNLOAD);
        }
    }

    #[test]
    fn letter_download_is_literal() {
        let content = "**Re: Autumn (AI Reply 1)**\n\nDear Friend,";
        match download_letter(content, Role::Ai) {
            Download::Letter { file_name, content: text } => {
                assert!(file_name.starts_with("penpal-ai-reply-"));
                assert!(file_name.ends_with(".md"));
                assert_eq!(text, content);
            }
            other => panic!("expected a letter, got {:?}", other),
        }
    }
}
