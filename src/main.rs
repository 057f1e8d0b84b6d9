//! Diskwala Bot - Main Entry Point
//!
//! A Telegram bot that answers Diskwala links with the video behind them,
//! one per day for free users and unlimited for premium users.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use teloxide::prelude::*;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use diskwala_bot::commands::BotHandler;
use diskwala_bot::config::{BotSettings, TelegramConfig};
use diskwala_bot::resolver::HttpResolver;
use diskwala_bot::telegram::{TelegramGateway, schema};

/// Telegram bot that fetches videos from Diskwala links.
#[derive(Parser, Debug)]
#[command(name = "diskwala_bot")]
#[command(about = "Answer Diskwala links with the video behind them")]
#[command(version)]
struct Args {
    /// Path to the .env file for environment variables.
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level);

    if let Err(e) = dotenvy::from_filename(&args.env_file) {
        debug!("Could not load .env file ({}): {}", args.env_file, e);
    }

    let tg_config = TelegramConfig::from_env()
        .context("Failed to load Telegram configuration from environment")?;
    let settings = BotSettings::from_env().context("Failed to load bot settings from environment")?;

    info!(
        "Stores: premium={}, usage={} (free cooldown {}h)",
        settings.premium_path.display(),
        settings.usage_path.display(),
        settings.free_cooldown_hours
    );

    let gateway = TelegramGateway::from_token(&tg_config.token);
    gateway
        .verify()
        .await
        .context("Telegram rejected BOT_TOKEN")?;

    let resolver = HttpResolver::from_secs(settings.fetch_timeout_secs)
        .context("Failed to build HTTP client")?;
    let handler = Arc::new(BotHandler::new(&tg_config, settings, resolver));

    info!("Bot is running. Use Ctrl+C to stop.");

    Dispatcher::builder(gateway.inner().clone(), schema::<HttpResolver>())
        .dependencies(dptree::deps![handler])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Shutting down...");
    Ok(())
}

/// Initializes the logging subsystem.
fn init_logging(level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
