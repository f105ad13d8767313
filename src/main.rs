#![deny(clippy::all)]

mod api;
mod audio;
mod chat;
mod config;
mod conversation;
mod error;
mod language;
mod location;
mod orchestrator;
mod terminal;
mod transcription;

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Log filter used when `RUST_LOG` is not set
const DEFAULT_LOG_FILTER: &str = "weather_chat=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Pick up WEATHER_CHAT_API_URL and RUST_LOG from a local .env, if any
    let _ = dotenvy::dotenv();

    // Logs go to stderr so the conversation on stdout stays readable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = config::CliArgs::parse();
    let config = config::Config::load(&args).context("Failed to load configuration")?;
    info!(
        base_url = %config.api.base_url,
        language = %config.session.language,
        bootstrap = %config.session.bootstrap_mode,
        "Configuration loaded"
    );

    let backend = api::Backend::new(&config.api)?;
    let conversation = Arc::new(conversation::ConversationClient::new(backend.clone()));
    let transcriber = Arc::new(transcription::TranscriptionClient::new(backend));
    let capture = audio::AudioCaptureController::new(
        Arc::new(audio::CpalMicrophone),
        config.audio.sample_rate,
    );

    let orchestrator = orchestrator::SessionOrchestrator::new(
        conversation,
        transcriber,
        capture,
        config.session.bootstrap_mode,
        config.session.language,
    );

    terminal::Terminal::new(orchestrator).run().await
}
