// src/main.rs

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use recipe_chat::config::{AppConfig, CliArgs, FileConfig};
use recipe_chat::server;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env from the current directory if present
    let _ = dotenvy::dotenv();

    // Initialize logging
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = CliArgs::parse();

    let file = match args.config.take() {
        Some(path) => FileConfig::load_from(&path),
        None => FileConfig::load(),
    };

    // Strict mode aborts here when API_KEY is missing
    let config = AppConfig::resolve(args, file)?;

    info!("Starting recipe-chat {}", env!("CARGO_PKG_VERSION"));
    info!("Provider: {} ({})", config.provider, config.model_name);

    server::run(config).await
}
