use std::path::PathBuf;
use anyhow::{Result, bail};
use clap::Parser;
use sparkchat_core::{build_generator, Config, GeneratorKind, TurnController};

mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[derive(Parser, Debug)]
#[command(name = "sparkchat")]
#[command(about = "Terminal chat with a simulated (or local Ollama) assistant")]
#[command(version)]
struct Cli {
    /// Response generator: "canned" or "ollama"
    #[arg(short, long)]
    generator: Option<String>,

    /// Ollama model to use
    #[arg(short, long)]
    model: Option<String>,

    /// Ollama server URL
    #[arg(long)]
    ollama_url: Option<String>,

    /// Minimum simulated thinking delay for canned responses
    #[arg(long)]
    min_delay_ms: Option<u64>,

    /// Maximum simulated thinking delay for canned responses
    #[arg(long)]
    max_delay_ms: Option<u64>,

    /// Log file (defaults to the platform data directory)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log filter when RUST_LOG is unset, e.g. "debug"
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    /// Layer command-line flags over the loaded config
    fn apply(&self, mut config: Config) -> Result<Config> {
        if let Some(generator) = &self.generator {
            let Some(kind) = GeneratorKind::from_str(generator) else {
                let known: Vec<&str> = GeneratorKind::all().iter().map(|k| k.as_str()).collect();
                bail!("Unknown generator '{}' (expected one of: {})", generator, known.join(", "));
            };
            config.generator = Some(kind.as_str().to_string());
        }
        if let Some(model) = &self.model {
            config.model = Some(model.clone());
        }
        if let Some(url) = &self.ollama_url {
            config.ollama_url = Some(url.clone());
        }
        if let Some(ms) = self.min_delay_ms {
            config.min_delay_ms = Some(ms);
        }
        if let Some(ms) = self.max_delay_ms {
            config.max_delay_ms = Some(ms);
        }
        if let Some(level) = &self.log_level {
            config.log_level = Some(level.clone());
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: {}. Using default settings.", e);
            Config::new()
        }
    };
    let config = cli.apply(config.with_env())?;

    let log_path = cli.log_file.clone().unwrap_or_else(logging::default_log_path);
    logging::init(&log_path, &config.log_level())?;
    tracing::info!(
        generator = config.generator_kind().as_str(),
        log = %log_path.display(),
        "starting sparkchat"
    );

    let controller = TurnController::new(build_generator(&config));
    let mut app = App::new(controller);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app).await;
    tui::restore()?;

    if let Err(e) = &result {
        tracing::error!(error = %e, "sparkchat exited with an error");
    }
    result
}

async fn run(terminal: &mut Tui, app: &mut App) -> Result<()> {
    let mut events = EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await?,
            None => break,
        }
    }

    Ok(())
}
