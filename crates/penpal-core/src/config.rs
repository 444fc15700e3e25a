use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::ai::openai::DEFAULT_API_BASE_URL;
use crate::ai::ClientSettings;
use crate::pen_pal::PenPalSettings;

/// Settings read from `config.json`. The API key is deliberately absent:
/// it comes from the environment or is entered at runtime, and is never
/// written to disk.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub reply_model: String,
    pub subject_model: String,
    pub request_timeout_secs: u64,
    /// Program (and arguments) that prints recognized speech on stdout.
    pub dictation_command: Option<Vec<String>>,
    pub dictation_language: String,
    pub download_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        let models = PenPalSettings::default();
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            reply_model: models.reply.model,
            subject_model: models.subject.model,
            request_timeout_secs: 120,
            dictation_command: None,
            dictation_language: "en-US".to_string(),
            download_dir: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the config from the default location, or defaults if absent.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Config = serde_json::from_str(&config_content)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("penpal"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Models and endpoint for the pen pal, with the fixed sampling settings.
    pub fn pen_pal_settings(&self) -> PenPalSettings {
        let mut settings = PenPalSettings::default();
        settings.subject.model = self.subject_model.clone();
        settings.reply.model = self.reply_model.clone();
        settings.client = ClientSettings {
            base_url: self.api_base_url.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs),
        };
        settings
    }

    /// Where downloaded letters go: configured dir, else the OS downloads
    /// folder, else the working directory.
    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
