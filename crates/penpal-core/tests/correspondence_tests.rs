use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use penpal_core::controller::{ComposeLabels, EMPTY_INPUT_MESSAGE, NOTHING_TO_DOWNLOAD};
use penpal_core::format::EMPTY_THREAD_PLACEHOLDER;
use penpal_core::prompts::{MISSING_KEY_WARNING, SUBJECT_FALLBACK};
use penpal_core::{
    download_letter, new_conversation, send_letter, CompletionBackend, CompletionRequest,
    ConversationState, LlmError, PenPal, PenPalSettings, Role,
};

/// Replays canned answers in order and records every request it sees.
#[derive(Default)]
struct ScriptedBackend {
    answers: Mutex<VecDeque<Option<String>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedBackend {
    fn new(answers: &[Option<&str>]) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(answers.iter().map(|a| a.map(str::to_string)).collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        match self.answers.lock().unwrap().pop_front() {
            Some(Some(answer)) => Ok(answer),
            _ => Err(LlmError::EmptyResponse),
        }
    }
}

fn pen_pal_with(backend: &Arc<ScriptedBackend>) -> PenPal {
    PenPal::with_backend(backend.clone(), PenPalSettings::default())
}

#[tokio::test]
async fn first_send_opens_thread_with_subject() {
    let backend = ScriptedBackend::new(&[Some("\"Autumn Musings\""), Some("Dear Friend,\n\nYour AI Pen Pal")]);
    let pen_pal = pen_pal_with(&backend);

    let outcome = send_letter("Dear AI Pen Pal, I love autumn.", ConversationState::new(), &pen_pal).await;
    let state = &outcome.state;

    assert_eq!(state.subject(), Some("Autumn Musings"));
    assert_eq!((state.user_turn(), state.ai_turn()), (1, 1));
    assert_eq!(state.thread().len(), 2);
    assert_eq!(state.thread()[0].role(), Role::User);
    assert_eq!(state.thread()[1].role(), Role::Ai);
    assert!(state.thread()[0].formatted_content().contains("(User Prompt 1)"));
    assert!(state.thread()[1].formatted_content().contains("(AI Reply 1)"));

    assert!(outcome.view.input.is_empty());
    assert_eq!(outcome.view.ai_letter, state.thread()[1].formatted_content());
    assert_eq!(outcome.view.user_letter, state.thread()[0].formatted_content());
    assert!(outcome.view.thread_display.starts_with("# Letter Thread"));
    assert_eq!(outcome.view.labels, ComposeLabels::reply());
}

#[tokio::test]
async fn requests_use_subject_then_reply_settings() {
    let backend = ScriptedBackend::new(&[Some("Autumn"), Some("reply")]);
    let pen_pal = pen_pal_with(&backend);

    send_letter("I love autumn.", ConversationState::new(), &pen_pal).await;
    let requests = backend.requests();

    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].model, "gpt-4o-mini");
    assert_eq!(requests[0].max_tokens, 20);
    assert!(requests[0].user.ends_with("I love autumn."));
    assert_eq!(requests[1].model, "gpt-4o");
    assert_eq!(requests[1].max_tokens, 2000);
    assert_eq!(requests[1].user, "I love autumn.");
    assert!(requests[1].system.contains("Your AI Pen Pal"));
}

#[tokio::test]
async fn second_send_keeps_subject_and_numbers_turns() {
    let backend = ScriptedBackend::new(&[Some("Autumn"), Some("first reply"), Some("second reply")]);
    let pen_pal = pen_pal_with(&backend);

    let first = send_letter("Dear AI Pen Pal, I love autumn.", ConversationState::new(), &pen_pal).await;
    let second = send_letter("Tell me more.", first.state, &pen_pal).await;
    let state = &second.state;

    assert_eq!(state.thread().len(), 4);
    assert_eq!(state.subject(), Some("Autumn"));
    assert_eq!((state.user_turn(), state.ai_turn()), (2, 2));
    assert!(state.thread()[2].formatted_content().contains("(User Prompt 2)"));
    assert!(state.thread()[3].formatted_content().contains("(AI Reply 2)"));
    assert!(state.thread()[3].formatted_content().ends_with("second reply"));
    // Only one subject request for the whole thread.
    assert_eq!(backend.requests().len(), 3);
}

#[tokio::test]
async fn blank_input_changes_nothing() {
    let backend = ScriptedBackend::new(&[Some("Autumn"), Some("reply")]);
    let pen_pal = pen_pal_with(&backend);
    let first = send_letter("Hello", ConversationState::new(), &pen_pal).await;

    for blank in ["", "   ", "\n\t "] {
        let outcome = send_letter(blank, first.state.clone(), &pen_pal).await;
        assert_eq!(outcome.state.thread().len(), 2);
        assert_eq!(outcome.state.subject(), Some("Autumn"));
        assert_eq!((outcome.state.user_turn(), outcome.state.ai_turn()), (1, 1));
        assert_eq!(outcome.view.ai_letter, EMPTY_INPUT_MESSAGE);
        assert_eq!(outcome.view.labels, ComposeLabels::reply());
    }
    assert_eq!(backend.requests().len(), 2);
}

#[tokio::test]
async fn blank_first_letter_keeps_first_letter_labels() {
    let backend = ScriptedBackend::new(&[]);
    let outcome = send_letter("  ", ConversationState::new(), &pen_pal_with(&backend)).await;

    assert!(outcome.state.subject().is_none());
    assert_eq!(outcome.view.thread_display, EMPTY_THREAD_PLACEHOLDER);
    assert_eq!(outcome.view.labels, ComposeLabels::first_letter());
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn missing_credential_still_appends_both_letters() {
    let pen_pal = PenPal::new(PenPalSettings::default());

    let outcome = send_letter("Anyone there?", ConversationState::new(), &pen_pal).await;
    let state = &outcome.state;

    assert_eq!(state.subject(), Some(SUBJECT_FALLBACK));
    assert_eq!(state.thread().len(), 2);
    assert_eq!(state.thread()[1].body(), MISSING_KEY_WARNING);
    assert!(outcome.view.ai_letter.contains("OpenAI API key not found"));
}

#[tokio::test]
async fn failed_reply_still_consumes_a_turn() {
    let backend = ScriptedBackend::new(&[Some("Autumn"), None]);
    let pen_pal = pen_pal_with(&backend);

    let outcome = send_letter("Hello", ConversationState::new(), &pen_pal).await;
    let reply = outcome.state.thread()[1].body();

    assert!(reply.starts_with("⚠️ Error generating response:"));
    assert_eq!((outcome.state.user_turn(), outcome.state.ai_turn()), (1, 1));
}

#[tokio::test]
async fn failed_or_blank_subject_falls_back() {
    for answer in [None, Some("  \"\"  ")] {
        let backend = ScriptedBackend::new(&[answer, Some("reply")]);
        let outcome = send_letter("Hello", ConversationState::new(), &pen_pal_with(&backend)).await;
        assert_eq!(outcome.state.subject(), Some(SUBJECT_FALLBACK));
        assert!(outcome.state.thread()[0]
            .formatted_content()
            .contains("Re: General Correspondence (User Prompt 1)"));
    }
}

#[tokio::test]
async fn new_conversation_discards_any_thread() {
    let backend = ScriptedBackend::new(&[Some("Autumn"), Some("reply")]);
    let first = send_letter("Hello", ConversationState::new(), &pen_pal_with(&backend)).await;
    assert!(!first.state.thread().is_empty());

    let reset = new_conversation();
    assert!(reset.state.subject().is_none());
    assert!(reset.state.thread().is_empty());
    assert_eq!((reset.state.user_turn(), reset.state.ai_turn()), (0, 0));
    assert_eq!(reset.view.thread_display, EMPTY_THREAD_PLACEHOLDER);
    assert_eq!(reset.view.labels, ComposeLabels::first_letter());
}

#[tokio::test]
async fn sent_letters_download_verbatim() {
    let backend = ScriptedBackend::new(&[Some("Autumn"), Some("reply")]);
    let outcome = send_letter("Hello", ConversationState::new(), &pen_pal_with(&backend)).await;

    let download = download_letter(&outcome.view.user_letter, Role::User);
    assert_eq!(download.text(), outcome.view.user_letter);

    let reset = new_conversation();
    assert_eq!(download_letter(&reset.view.ai_letter, Role::Ai).text(), NOTHING_TO_DOWNLOAD);
}
