//! hanzi-board-rs: local stroke-order practice board for Chinese characters.

mod audio;
mod config;
mod gemini;
mod server;
mod shell;
mod speech;
mod widget;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use clap::Parser;
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hanzi-board-rs", about = "Stroke-order practice board")]
struct Args {
    /// Path to config.yaml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listen port
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("debug,hyper=info,reqwest=info")
    } else {
        EnvFilter::new("info,hyper=warn,reqwest=warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("hanzi-board-rs starting");

    let config = config::Config::load(args.config.as_deref());
    if config.api.resolved_key().is_empty() {
        tracing::warn!(
            "No API key configured (api.key / GEMINI_API_KEY) — lookups and speech will fail"
        );
    }

    let gemini = Arc::new(gemini::GeminiClient::new(&config.api));
    let output = Arc::new(audio::AudioOutput::new());
    let speech = Arc::new(speech::SpeechPlayer::new(
        gemini.clone(),
        output,
        config.speech.voice.clone(),
        config.speech.enabled,
    ));

    // Widget commands fan out to every connected page.
    let (widget_tx, _) = broadcast::channel(32);
    let factory = widget::SseWidgetFactory::new(widget_tx.clone());
    let shell = Arc::new(Mutex::new(shell::AppShell::new(
        Box::new(factory),
        config.writer.size,
    )));

    let state = server::AppState {
        shell,
        gemini,
        speech,
        widget_tx,
    };

    // The board should never start empty.
    server::submit_initial(&state, &config.writer.default_character);

    let port = args.port.unwrap_or(config.server.port);
    server::serve(state, &config.server.bind, port).await?;

    Ok(())
}
