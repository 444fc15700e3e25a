//! External speech recognizer feeding the dictation state machine.
//!
//! The configured command runs continuously and prints one fragment per line
//! on stdout: `partial:<text>` for an interim hypothesis, `final:<text>` (or a
//! bare line) for a finalized segment. The recognition language is passed in
//! `PENPAL_DICTATION_LANG`.

use std::process::Stdio;

use anyhow::{anyhow, Context, Result};
use penpal_core::TranscriptEvent;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::tui::AppEvent;

pub struct Recognizer {
    // Killed on drop
    _child: Child,
    reader: JoinHandle<()>,
}

impl Recognizer {
    pub fn spawn(command: &[String], language: &str, tx: UnboundedSender<AppEvent>) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| anyhow!("dictation_command is empty"))?;

        let mut child = Command::new(program)
            .args(args)
            .env("PENPAL_DICTATION_LANG", language)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("starting speech recognizer `{}`", program))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("speech recognizer has no stdout"))?;

        info!(%program, %language, "speech recognizer started");

        let reader = tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                let event = match lines.next_line().await {
                    Ok(Some(line)) => match parse_fragment(&line) {
                        Some(event) => event,
                        None => continue,
                    },
                    Ok(None) => TranscriptEvent::Ended,
                    Err(e) => TranscriptEvent::Error(e.to_string()),
                };
                let done = matches!(event, TranscriptEvent::Ended | TranscriptEvent::Error(_));
                if tx.send(AppEvent::Transcript(event)).is_err() || done {
                    break;
                }
            }
        });

        Ok(Self { _child: child, reader })
    }
}

impl Drop for Recognizer {
    fn drop(&mut self) {
        debug!("stopping speech recognizer");
        self.reader.abort();
    }
}

fn parse_fragment(line: &str) -> Option<TranscriptEvent> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return None;
    }

    if let Some(partial) = line.strip_prefix("partial:") {
        Some(TranscriptEvent::Interim(partial.trim().to_string()))
    } else if let Some(done) = line.strip_prefix("final:") {
        Some(TranscriptEvent::Final(done.trim().to_string()))
    } else {
        Some(TranscriptEvent::Final(line.trim().to_string()))
    }
}
