mod app;
mod cli;
mod config;

use clap::Parser;

use cli::{Cli, Command};
use common::logger::init_logger;
use config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let is_production = std::env::var("APP_ENV").unwrap_or_default() == "production";
    init_logger("folio", is_production);

    let cfg = AppConfig::from_env();
    tracing::debug!(?cfg, "configuration loaded");

    match cli.command {
        Command::Watch { every_secs } => app::watch(&cfg, every_secs).await,
        Command::Chart {
            symbol,
            class,
            period,
            wait_secs,
        } => app::chart(&cfg, &symbol, class.into(), period.into(), wait_secs).await,
        Command::Add {
            symbol,
            class,
            amount,
            avg_price,
        } => app::add(&cfg, &symbol, class.into(), amount, avg_price),
        Command::Remove { symbol, class } => app::remove(&cfg, &symbol, class.into()).await,
    }
}
