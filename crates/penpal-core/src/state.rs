//! UI-agnostic conversation state
//!
//! The state is owned by whichever front end drives the session and is
//! threaded by value through the controller; nothing in this crate keeps a
//! global copy.

use chrono::{DateTime, Local};

use crate::format::format_header_on;
use crate::prompts::SUBJECT_FALLBACK;

/// Who wrote a letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Ai,
}

impl Role {
    /// Label used in letter headers, e.g. `(User Prompt 2)`.
    pub fn turn_type(&self) -> &'static str {
        match self {
            Role::User => "User Prompt",
            Role::Ai => "AI Reply",
        }
    }

    pub fn sender(&self) -> &'static str {
        match self {
            Role::User => "You",
            Role::Ai => "AI Pen Pal",
        }
    }

    pub fn avatar(&self) -> &'static str {
        match self {
            Role::User => "🧑",
            Role::Ai => "🤖",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Role::User => "user-letter",
            Role::Ai => "ai-reply",
        }
    }
}

/// One letter in the thread. Immutable once written.
#[derive(Debug, Clone)]
pub struct Letter {
    role: Role,
    body: String,
    formatted_content: String,
    timestamp: DateTime<Local>,
}

impl Letter {
    pub fn new(role: Role, subject: &str, turn: u32, body: &str) -> Self {
        let timestamp = Local::now();
        let header = format_header_on(subject, role.turn_type(), turn, timestamp.date_naive());

        Self {
            role,
            body: body.to_string(),
            formatted_content: format!("{}{}", header, body),
            timestamp,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Header plus body, as displayed and downloaded.
    pub fn formatted_content(&self) -> &str {
        &self.formatted_content
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }
}

/// The current thread: letters, subject and per-party turn counters.
///
/// `subject` is set exactly when the thread holds letters, and each counter
/// equals the number of letters written by that party.
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    thread: Vec<Letter>,
    subject: Option<String>,
    user_turn: u32,
    ai_turn: u32,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn thread(&self) -> &[Letter] {
        &self.thread
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn user_turn(&self) -> u32 {
        self.user_turn
    }

    pub fn ai_turn(&self) -> u32 {
        self.ai_turn
    }

    /// True until the first letter has been sent.
    pub fn is_first_letter(&self) -> bool {
        self.subject.is_none()
    }

    /// Most recent letter written by `role`.
    pub fn last_letter(&self, role: Role) -> Option<&Letter> {
        self.thread.iter().rev().find(|letter| letter.role == role)
    }

    /// Starts a thread under `subject`, zeroing both counters.
    pub(crate) fn begin_thread(&mut self, subject: String) {
        self.user_turn = 0;
        self.ai_turn = 0;
        self.subject = Some(subject);
    }

    /// Advances the writer's counter and appends their letter.
    pub(crate) fn append_letter(&mut self, role: Role, body: &str) -> Letter {
        let turn = match role {
            Role::User => {
                self.user_turn += 1;
                self.user_turn
            }
            Role::Ai => {
                self.ai_turn += 1;
                self.ai_turn
            }
        };
        let subject = self.subject.as_deref().unwrap_or(SUBJECT_FALLBACK);
        let letter = Letter::new(role, subject, turn, body);
        self.thread.push(letter.clone());
        letter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_is_empty() {
        let state = ConversationState::new();
        assert!(state.thread().is_empty());
        assert!(state.subject().is_none());
        assert_eq!((state.user_turn(), state.ai_turn()), (0, 0));
        assert!(state.is_first_letter());
    }

    #[test]
    fn counters_stay_within_one_turn() {
        let mut state = ConversationState::new();
        state.begin_thread("Autumn".to_string());

        for round in 1..=3 {
            state.append_letter(Role::User, "hello");
            assert_eq!(state.user_turn() - state.ai_turn(), 1);
            state.append_letter(Role::Ai, "hi back");
            assert_eq!(state.user_turn(), round);
            assert_eq!(state.ai_turn(), round);
        }
        assert_eq!(state.thread().len(), 6);
    }

    #[test]
    fn appended_letter_is_numbered_per_role() {
        let mut state = ConversationState::new();
        state.begin_thread("Autumn".to_string());
        state.append_letter(Role::User, "one");
        state.append_letter(Role::Ai, "two");
        let letter = state.append_letter(Role::User, "three");

        assert!(letter.formatted_content().contains("**Re: Autumn (User Prompt 2)**"));
        assert!(letter.formatted_content().ends_with("three"));
        assert_eq!(letter.body(), "three");
        assert_eq!(state.last_letter(Role::Ai).map(Letter::body), Some("two"));
    }

    #[test]
    fn begin_thread_resets_counters() {
        let mut state = ConversationState::new();
        state.user_turn = 4;
        state.ai_turn = 3;
        state.begin_thread("Fresh".to_string());
        assert_eq!((state.user_turn(), state.ai_turn()), (0, 0));
        assert_eq!(state.subject(), Some("Fresh"));
    }
}
