use std::path::PathBuf;
use std::time::Duration;

use market::{coingecko, yahoo};

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// SQLite connection string for the chart cache.
    pub database_url: String,

    /// JSON file holding the wallet (`{"crypto": [...], "stocks": [...]}`).
    pub wallet_path: PathBuf,

    /// Ticker → CoinGecko coin id table. Missing file falls back to the
    /// built-in table.
    pub crypto_mapping_path: PathBuf,

    // =========================
    // Upstream providers
    // =========================
    pub coingecko_url: String,
    pub yahoo_url: String,

    /// Per-request timeout for both providers.
    ///
    /// This is also the only bound on how long one refresh can hold the
    /// worker.
    pub http_timeout: Duration,

    // =========================
    // Refresh worker
    // =========================
    /// Cooldown after each refresh attempt.
    ///
    /// Purpose:
    /// - keep calls under the free-tier rate limits
    /// - one upstream call in flight at a time
    pub refresh_interval: Duration,
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_num(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: env_or("DATABASE_URL", "sqlite://cache.db"),
            wallet_path: env_or("WALLET_PATH", "wallet.json").into(),
            crypto_mapping_path: env_or("CRYPTO_MAPPING_PATH", "crypto_mapping.json").into(),

            coingecko_url: env_or("COINGECKO_URL", coingecko::client::DEFAULT_URL),
            yahoo_url: env_or("YAHOO_URL", yahoo::client::DEFAULT_URL),
            http_timeout: Duration::from_secs(env_num("HTTP_TIMEOUT_SECS", 10)),

            refresh_interval: Duration::from_millis(env_num(
                "REFRESH_INTERVAL_MS",
                cache::WORKER_INTERVAL.as_millis() as u64,
            )),
        }
    }
}
