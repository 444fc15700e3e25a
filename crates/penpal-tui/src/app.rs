use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use penpal_core::controller::{AI_REPLY_PLACEHOLDER, USER_LETTER_PLACEHOLDER};
use penpal_core::{
    download_letter, new_conversation, send_letter, ComposeLabels, Config, ConversationState,
    Dictation, Download, Outcome, PenPal, Role, TranscriptEvent, ViewData,
};
use ratatui::layout::Rect;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::recognizer::Recognizer;
use crate::tui::AppEvent;

pub const DICTATION_UNAVAILABLE: &str =
    "Speech recognition is not available. Configure dictation_command to enable it.";

/// Consecutive recognizer exits without any output before dictation gives up.
const MAX_SILENT_RESTARTS: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Compose,
    LastLetter,
    Reply,
    Thread,
}

impl FocusPane {
    pub fn next(self) -> Self {
        match self {
            FocusPane::Compose => FocusPane::LastLetter,
            FocusPane::LastLetter => FocusPane::Reply,
            FocusPane::Reply => FocusPane::Thread,
            FocusPane::Thread => FocusPane::Compose,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            FocusPane::Compose => FocusPane::Thread,
            FocusPane::LastLetter => FocusPane::Compose,
            FocusPane::Reply => FocusPane::LastLetter,
            FocusPane::Thread => FocusPane::Reply,
        }
    }
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub focus: FocusPane,
    pub config: Config,
    pub pen_pal: PenPal,
    pub conversation: ConversationState,

    // Compose state
    pub compose_input: String,
    pub compose_cursor: usize,
    pub labels: ComposeLabels,

    // Letter panes
    pub ai_letter: String,
    pub user_letter: String,
    pub thread_display: String,
    pub last_letter_scroll: u16,
    pub reply_scroll: u16,
    pub thread_scroll: u16,

    // In-flight send; the UI refuses a second one until it finishes
    pub send_task: Option<JoinHandle<Outcome>>,
    pub animation_frame: u8,

    // Dictation
    pub dictation: Dictation,
    recognizer: Option<Recognizer>,
    silent_restarts: u8,

    // API key input state
    pub show_api_key_input: bool,
    pub api_key_input: String,
    pub api_key_input_cursor: usize,

    pub status: Option<String>,

    // Panel areas for mouse hit-testing (updated during render)
    pub compose_area: Option<Rect>,
    pub last_letter_area: Option<Rect>,
    pub reply_area: Option<Rect>,
    pub thread_area: Option<Rect>,

    events: UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(config: Config, pen_pal: PenPal, events: UnboundedSender<AppEvent>) -> Self {
        let Outcome { state, view } = new_conversation();

        let status = if pen_pal.has_credential() {
            None
        } else {
            Some("No OpenAI API key configured. Press Ctrl+K to set one.".to_string())
        };

        let mut app = Self {
            should_quit: false,
            focus: FocusPane::Compose,
            config,
            pen_pal,
            conversation: state,

            compose_input: String::new(),
            compose_cursor: 0,
            labels: ComposeLabels::first_letter(),

            ai_letter: String::new(),
            user_letter: String::new(),
            thread_display: String::new(),
            last_letter_scroll: 0,
            reply_scroll: 0,
            thread_scroll: 0,

            send_task: None,
            animation_frame: 0,

            dictation: Dictation::new(),
            recognizer: None,
            silent_restarts: 0,

            show_api_key_input: false,
            api_key_input: String::new(),
            api_key_input_cursor: 0,

            status,

            compose_area: None,
            last_letter_area: None,
            reply_area: None,
            thread_area: None,

            events,
        };
        app.apply_view(view);
        app
    }

    pub fn is_sending(&self) -> bool {
        self.send_task.is_some()
    }

    /// Text for the "Your Last Letter" pane.
    pub fn user_letter_display(&self) -> &str {
        if self.user_letter.is_empty() {
            USER_LETTER_PLACEHOLDER
        } else {
            &self.user_letter
        }
    }

    /// Text for the AI reply pane.
    pub fn ai_letter_display(&self) -> &str {
        if self.ai_letter.is_empty() {
            AI_REPLY_PLACEHOLDER
        } else {
            &self.ai_letter
        }
    }

    /// Hands the compose text to the controller on a background task.
    pub fn send(&mut self) {
        if self.is_sending() {
            self.status = Some("Your pen pal is still writing...".to_string());
            return;
        }
        if self.dictation.is_capturing() {
            self.stop_dictation();
        }

        let input = self.compose_input.clone();
        let state = self.conversation.clone();
        let pen_pal = self.pen_pal.clone();

        self.status = None;
        self.animation_frame = 0;
        self.send_task = Some(tokio::spawn(async move {
            send_letter(&input, state, &pen_pal).await
        }));
    }

    /// Picks up the result of a finished send, if any.
    pub async fn collect_finished_send(&mut self) {
        let finished = self.send_task.as_ref().is_some_and(|task| task.is_finished());
        if !finished {
            return;
        }

        if let Some(task) = self.send_task.take() {
            match task.await {
                Ok(outcome) => {
                    self.conversation = outcome.state;
                    self.apply_view(outcome.view);
                }
                Err(e) => {
                    error!(error = %e, "send task failed");
                    self.status = Some(format!("Sending failed: {}", e));
                }
            }
        }
    }

    pub fn new_conversation(&mut self) {
        if self.is_sending() {
            self.status = Some("Wait for the reply before starting over.".to_string());
            return;
        }
        if self.dictation.is_capturing() {
            self.stop_dictation();
        }

        let Outcome { state, view } = new_conversation();
        self.conversation = state;
        self.apply_view(view);
        self.status = Some("Started a new conversation.".to_string());
    }

    fn apply_view(&mut self, view: ViewData) {
        self.set_compose(view.input);
        self.ai_letter = view.ai_letter;
        self.user_letter = view.user_letter;
        self.thread_display = view.thread_display;
        self.labels = view.labels;
        self.last_letter_scroll = 0;
        self.reply_scroll = 0;
        self.thread_scroll = 0;
    }

    fn set_compose(&mut self, text: String) {
        self.compose_cursor = text.chars().count();
        self.compose_input = text;
    }

    // Compose editing

    /// Whether keystrokes may change the compose text right now.
    pub fn compose_editable(&self) -> bool {
        !self.is_sending() && !self.dictation.is_capturing()
    }

    pub fn compose_insert(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.compose_input, self.compose_cursor);
        self.compose_input.insert(byte_pos, c);
        self.compose_cursor += 1;
    }

    pub fn compose_backspace(&mut self) {
        if self.compose_cursor > 0 {
            self.compose_cursor -= 1;
            let byte_pos = char_to_byte_index(&self.compose_input, self.compose_cursor);
            self.compose_input.remove(byte_pos);
        }
    }

    pub fn compose_delete(&mut self) {
        if self.compose_cursor < self.compose_input.chars().count() {
            let byte_pos = char_to_byte_index(&self.compose_input, self.compose_cursor);
            self.compose_input.remove(byte_pos);
        }
    }

    pub fn compose_left(&mut self) {
        self.compose_cursor = self.compose_cursor.saturating_sub(1);
    }

    pub fn compose_right(&mut self) {
        let char_count = self.compose_input.chars().count();
        self.compose_cursor = (self.compose_cursor + 1).min(char_count);
    }

    pub fn compose_line_start(&mut self) {
        let (_, col) = self.compose_cursor_position();
        self.compose_cursor -= col;
    }

    pub fn compose_line_end(&mut self) {
        let rest = self.compose_input.chars().skip(self.compose_cursor);
        self.compose_cursor += rest.take_while(|&c| c != '\n').count();
    }

    /// Moves the cursor `delta` lines up (negative) or down, keeping the column
    /// where the target line is long enough.
    pub fn compose_vertical(&mut self, delta: i32) {
        let (row, col) = self.compose_cursor_position();
        let lines: Vec<usize> = self.compose_input.split('\n').map(|l| l.chars().count()).collect();
        let target = (row as i32 + delta).clamp(0, lines.len() as i32 - 1) as usize;
        if target == row {
            return;
        }
        let line_start: usize = lines[..target].iter().map(|len| len + 1).sum();
        self.compose_cursor = line_start + col.min(lines[target]);
    }

    /// Cursor as (line, column), both in characters.
    pub fn compose_cursor_position(&self) -> (usize, usize) {
        let mut row = 0;
        let mut col = 0;
        for c in self.compose_input.chars().take(self.compose_cursor) {
            if c == '\n' {
                row += 1;
                col = 0;
            } else {
                col += 1;
            }
        }
        (row, col)
    }

    pub fn tick_animation(&mut self) {
        if self.is_sending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Dictation

    pub fn toggle_dictation(&mut self) {
        if self.dictation.is_capturing() {
            self.stop_dictation();
            return;
        }
        if self.is_sending() {
            self.status = Some("Wait for the reply before dictating.".to_string());
            return;
        }

        match self.start_recognizer() {
            Ok(recognizer) => {
                self.recognizer = Some(recognizer);
                self.silent_restarts = 0;
                let text = self.dictation.toggle(&self.compose_input);
                self.set_compose(text);
                self.status = Some("Listening... press Ctrl+D to stop.".to_string());
            }
            Err(e) => {
                warn!(error = %e, "dictation unavailable");
                self.status = Some(format!("{:#}", e));
            }
        }
    }

    fn stop_dictation(&mut self) {
        self.recognizer = None;
        let text = self.dictation.toggle(&self.compose_input);
        self.set_compose(text);
        self.status = None;
    }

    fn start_recognizer(&self) -> Result<Recognizer> {
        let command = self
            .config
            .dictation_command
            .as_deref()
            .filter(|command| !command.is_empty())
            .ok_or_else(|| anyhow::anyhow!(DICTATION_UNAVAILABLE))?;
        Recognizer::spawn(command, &self.config.dictation_language, self.events.clone())
    }

    pub fn handle_transcript(&mut self, event: TranscriptEvent) {
        match event {
            TranscriptEvent::Ended => {
                if !self.dictation.ended() {
                    return;
                }
                self.silent_restarts += 1;
                let restarted = if self.silent_restarts > MAX_SILENT_RESTARTS {
                    Err(anyhow::anyhow!("speech recognizer keeps exiting"))
                } else {
                    self.start_recognizer()
                };
                match restarted {
                    Ok(recognizer) => self.recognizer = Some(recognizer),
                    Err(e) => {
                        self.recognizer = None;
                        let text = self.dictation.fail(&format!("{:#}", e));
                        self.set_compose(text);
                        self.status = Some(format!("Dictation stopped: {:#}", e));
                    }
                }
            }
            TranscriptEvent::Error(reason) => {
                self.recognizer = None;
                let text = self.dictation.apply(TranscriptEvent::Error(reason.clone()));
                if let Some(text) = text {
                    self.set_compose(text);
                    self.status = Some(format!("Dictation stopped: {}", reason));
                }
            }
            fragment => {
                self.silent_restarts = 0;
                if let Some(text) = self.dictation.apply(fragment) {
                    self.set_compose(text);
                }
            }
        }
    }

    // Downloads

    pub fn download(&mut self, role: Role) {
        let content = match role {
            Role::User => self.user_letter_display(),
            Role::Ai => self.ai_letter_display(),
        };

        self.status = Some(match download_letter(content, role) {
            Download::Letter { file_name, content } => {
                match write_download(&self.config.download_dir(), &file_name, &content) {
                    Ok(path) => {
                        info!(path = %path.display(), "letter downloaded");
                        format!("Saved {}", path.display())
                    }
                    Err(e) => {
                        warn!(error = %e, "download failed");
                        format!("Download failed: {:#}", e)
                    }
                }
            }
            Download::Nothing { message } => message.trim_start_matches("# ").replace("\n\n", ". "),
        });
    }

    // API key

    pub fn open_api_key_input(&mut self) {
        self.show_api_key_input = true;
        self.api_key_input.clear();
        self.api_key_input_cursor = 0;
    }

    pub fn close_api_key_input(&mut self) {
        self.show_api_key_input = false;
        self.api_key_input.clear();
        self.api_key_input_cursor = 0;
    }

    pub fn submit_api_key(&mut self) {
        let status = self.pen_pal.set_api_key(&self.api_key_input);
        info!(configured = self.pen_pal.has_credential(), "API key submitted");
        self.status = Some(status);
        self.close_api_key_input();
    }

    // Scrolling

    pub fn scroll_focused(&mut self, delta: i32) {
        let scroll = match self.focus {
            FocusPane::Compose => return,
            FocusPane::LastLetter => &mut self.last_letter_scroll,
            FocusPane::Reply => &mut self.reply_scroll,
            FocusPane::Thread => &mut self.thread_scroll,
        };
        *scroll = if delta < 0 {
            scroll.saturating_sub(delta.unsigned_abs() as u16)
        } else {
            scroll.saturating_add(delta as u16)
        };
    }
}

/// Convert a character index to a byte index for UTF-8 safe string operations
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

fn write_download(dir: &Path, file_name: &str, content: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(file_name);
    fs::write(&path, content).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}
