pub mod bot;
pub mod core;
pub mod providers;
pub mod rates;

use crate::bot::RatesBot;
use crate::bot::telegram::{TelegramTransport, run_polling};
use crate::core::config::{AppConfig, Secrets};
use crate::providers::CurrencyApiFeed;
use anyhow::{Context, Result};
use std::future::Future;
use tracing::{debug, error, info};

pub enum AppCommand {
    /// Serve the Telegram bot until interrupted
    Run,
    /// Print today's rates once
    Rates,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    let config = load_config(config_path)?;
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Run => {
            let secrets = Secrets::from_env()?;
            run_bot(&config, &secrets, shutdown_signal()).await
        }
        AppCommand::Rates => {
            let reply = fetch_today_rates(&config).await?;
            println!("{reply}");
            Ok(())
        }
    }
}

pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    Ok(config)
}

fn build_feed(config: &AppConfig) -> Result<CurrencyApiFeed> {
    let client = CurrencyApiFeed::build_client().context("Failed to create HTTP client")?;
    info!("HTTP client started");
    Ok(CurrencyApiFeed::new(&config.feed.base_url, client))
}

/// Fetches and assembles the reply the bot would send for today's rates.
pub async fn fetch_today_rates(config: &AppConfig) -> Result<String> {
    let table = config.rate_table()?;
    let feed = build_feed(config)?;
    let reply = rates::today_rates(&feed, &table, config.feed.request_timeout()).await?;
    Ok(reply)
}

/// Serves the bot until `shutdown` resolves. The HTTP client lives exactly as long as this call.
pub async fn run_bot<S>(config: &AppConfig, secrets: &Secrets, shutdown: S) -> Result<()>
where
    S: Future<Output = ()>,
{
    info!("Rates bot starting...");
    let table = config.rate_table()?;
    let feed = build_feed(config)?;
    let transport = TelegramTransport::new(&secrets.telegram_token);
    let bot = RatesBot::new(feed, table, transport, config.feed.request_timeout());

    let result = run_polling(&bot, shutdown).await;
    drop(bot);
    info!("HTTP client stopped");
    result
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
