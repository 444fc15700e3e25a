//! Speech-to-text dictation for the compose box.
//!
//! A small idle/capturing state machine. It only ever produces the text that
//! the compose input should show; it knows nothing about the conversation.

use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DictationState {
    #[default]
    Idle,
    Capturing,
}

/// One fragment reported by a speech recognizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEvent {
    /// Unfinished hypothesis; previewed, never committed.
    Interim(String),
    /// Finalized segment.
    Final(String),
    Error(String),
    /// Recognizer stopped producing results.
    Ended,
}

#[derive(Debug, Clone, Default)]
pub struct Dictation {
    state: DictationState,
    committed: String,
}

impl Dictation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DictationState {
        self.state
    }

    pub fn is_capturing(&self) -> bool {
        self.state == DictationState::Capturing
    }

    pub fn button_label(&self) -> &'static str {
        match self.state {
            DictationState::Idle => "Start Dictation",
            DictationState::Capturing => "Stop Dictation",
        }
    }

    /// Starts capturing on top of `current_text`, or stops and drops any
    /// interim preview. The return value is what the input should show.
    pub fn toggle(&mut self, current_text: &str) -> String {
        match self.state {
            DictationState::Idle => {
                self.committed = current_text.to_string();
                self.state = DictationState::Capturing;
                debug!("dictation started");
                self.committed.clone()
            }
            DictationState::Capturing => {
                self.state = DictationState::Idle;
                debug!("dictation stopped");
                self.committed.clone()
            }
        }
    }

    /// Folds a recognizer fragment in. Returns the text to display, or `None`
    /// when the event does not change the input.
    pub fn apply(&mut self, event: TranscriptEvent) -> Option<String> {
        if !self.is_capturing() {
            return None;
        }

        match event {
            TranscriptEvent::Final(segment) => {
                let segment = segment.trim();
                if !segment.is_empty() {
                    if !self.committed.is_empty() {
                        self.committed.push(' ');
                    }
                    self.committed.push_str(segment);
                }
                Some(self.committed.clone())
            }
            TranscriptEvent::Interim(partial) => {
                let partial = partial.trim();
                if partial.is_empty() {
                    Some(self.committed.clone())
                } else if self.committed.is_empty() {
                    Some(partial.to_string())
                } else {
                    Some(format!("{} {}", self.committed, partial))
                }
            }
            TranscriptEvent::Error(reason) => Some(self.fail(&reason)),
            TranscriptEvent::Ended => None,
        }
    }

    /// Recognition failed: stop and keep only finalized text.
    pub fn fail(&mut self, reason: &str) -> String {
        warn!(%reason, "dictation error");
        self.state = DictationState::Idle;
        self.committed.clone()
    }

    /// The recognizer ended on its own. Returns true when it should be
    /// restarted because the user has not stopped dictation.
    pub fn ended(&self) -> bool {
        self.is_capturing()
    }

    /// Text with all interim previews dropped.
    pub fn committed(&self) -> &str {
        &self.committed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finals_are_space_joined_onto_existing_text() {
        let mut dictation = Dictation::new();
        assert_eq!(dictation.toggle("Dear AI Pen Pal,"), "Dear AI Pen Pal,");
        assert_eq!(dictation.button_label(), "Stop Dictation");

        dictation.apply(TranscriptEvent::Final("I went walking".into()));
        let shown = dictation.apply(TranscriptEvent::Final("today".into()));
        assert_eq!(shown.as_deref(), Some("Dear AI Pen Pal, I went walking today"));
    }

    #[test]
    fn first_final_on_empty_text_has_no_leading_space() {
        let mut dictation = Dictation::new();
        dictation.toggle("");
        let shown = dictation.apply(TranscriptEvent::Final("hello".into()));
        assert_eq!(shown.as_deref(), Some("hello"));
    }

    #[test]
    fn interim_is_previewed_but_not_committed() {
        let mut dictation = Dictation::new();
        dictation.toggle("Hi");
        let preview = dictation.apply(TranscriptEvent::Interim("there fr".into()));
        assert_eq!(preview.as_deref(), Some("Hi there fr"));
        assert_eq!(dictation.committed(), "Hi");

        let shown = dictation.toggle(preview.as_deref().unwrap());
        assert_eq!(dictation.state(), DictationState::Idle);
        assert_eq!(shown, "Hi");
    }

    #[test]
    fn error_stops_and_keeps_finals_only() {
        let mut dictation = Dictation::new();
        dictation.toggle("");
        dictation.apply(TranscriptEvent::Final("kept".into()));
        dictation.apply(TranscriptEvent::Interim("dropped".into()));
        let shown = dictation.apply(TranscriptEvent::Error("no-speech".into()));
        assert_eq!(shown.as_deref(), Some("kept"));
        assert!(!dictation.is_capturing());
        assert_eq!(dictation.button_label(), "Start Dictation");
    }

    #[test]
    fn idle_ignores_events_and_does_not_restart() {
        let mut dictation = Dictation::new();
        assert_eq!(dictation.apply(TranscriptEvent::Final("stray".into())), None);
        assert!(!dictation.ended());

        dictation.toggle("");
        assert!(dictation.ended());
    }
}
