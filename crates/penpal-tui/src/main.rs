mod app;
mod handler;
mod logging;
mod recognizer;
mod tui;
mod ui;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use penpal_core::{Config, PenPal};
use tracing::info;

use app::App;
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "penpal")]
#[command(about = "Exchange long-form letters with an AI pen pal", version)]
struct Cli {
    /// Config file to read instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Model that writes the replies
    #[arg(long)]
    reply_model: Option<String>,

    /// Model that names the conversation
    #[arg(long)]
    subject_model: Option<String>,

    /// OpenAI-compatible API base URL
    #[arg(long)]
    api_base_url: Option<String>,

    /// Speech recognizer command, e.g. --dictation-command "my-stt --stream"
    #[arg(long, value_delimiter = ' ', num_args = 1..)]
    dictation_command: Option<Vec<String>>,

    /// Directory downloaded letters are written to
    #[arg(long)]
    download_dir: Option<PathBuf>,

    /// Log file (verbosity follows RUST_LOG)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };

        if let Some(model) = &self.reply_model {
            config.reply_model = model.clone();
        }
        if let Some(model) = &self.subject_model {
            config.subject_model = model.clone();
        }
        if let Some(url) = &self.api_base_url {
            config.api_base_url = url.clone();
        }
        if let Some(command) = &self.dictation_command {
            config.dictation_command = Some(command.clone());
        }
        if let Some(dir) = &self.download_dir {
            config.download_dir = Some(dir.clone());
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // A local .env may carry OPENAI_API_KEY
    dotenvy::dotenv().ok();

    let config = cli.load_config()?;
    let log_file = match &cli.log_file {
        Some(path) => path.clone(),
        None => Config::config_dir()?.join("penpal.log"),
    };
    logging::setup(&log_file)?;

    let api_key = std::env::var("OPENAI_API_KEY").ok();
    let pen_pal = PenPal::from_api_key(api_key.as_deref(), config.pen_pal_settings());
    info!(
        reply_model = %config.reply_model,
        subject_model = %config.subject_model,
        credential = pen_pal.has_credential(),
        "starting pen pal"
    );

    let mut events = EventHandler::new();
    let mut app = App::new(config, pen_pal, events.sender());

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await?,
            None => break,
        }
    }
    Ok(())
}
