//! Ticker symbol → CoinGecko coin id.
//!
//! CoinGecko addresses coins by id ("bitcoin"), wallets hold tickers
//! ("BTC"). The map is loaded from a JSON object file; keys are lowercased.

use std::collections::HashMap;
use std::path::Path;

use tracing::{info, warn};

use crate::errors::FetchError;

const BUILTIN: &[(&str, &str)] = &[
    ("btc", "bitcoin"),
    ("eth", "ethereum"),
    ("sol", "solana"),
    ("bnb", "binancecoin"),
    ("xrp", "ripple"),
    ("ada", "cardano"),
    ("doge", "dogecoin"),
    ("dot", "polkadot"),
    ("ltc", "litecoin"),
    ("usdt", "tether"),
    ("usdc", "usd-coin"),
    ("ton", "the-open-network"),
];

#[derive(Debug, Clone, Default)]
pub struct SymbolMap {
    ids: HashMap<String, String>,
}

impl SymbolMap {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let ids = pairs
            .into_iter()
            .map(|(k, v)| (k.as_ref().trim().to_lowercase(), v.into()))
            .collect();
        Self { ids }
    }

    pub fn builtin() -> Self {
        Self::from_pairs(BUILTIN.iter().copied())
    }

    /// Parses a JSON object of `"TICKER": "coin-id"` entries.
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        let raw: HashMap<String, String> = serde_json::from_str(body)?;
        Ok(Self::from_pairs(raw))
    }

    /// Loads the file at `path`, falling back to the built-in table when the
    /// file is missing or unreadable.
    pub fn load_or_builtin(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(body) => match Self::from_json(&body) {
                Ok(map) => {
                    info!(path = %path.display(), entries = map.len(), "crypto symbol map loaded");
                    map
                }
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "invalid crypto symbol map; using built-in"
                    );
                    Self::builtin()
                }
            },
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "crypto symbol map unavailable; using built-in"
                );
                Self::builtin()
            }
        }
    }

    pub fn coin_id(&self, symbol: &str) -> Result<&str, FetchError> {
        self.ids
            .get(&symbol.trim().to_lowercase())
            .map(String::as_str)
            .ok_or_else(|| FetchError::NotFound(format!("no coin id mapped for symbol '{symbol}'")))
    }

    /// Reverse lookup used when mapping `/coins/markets` rows back to tickers.
    pub fn symbol_for(&self, coin_id: &str) -> Option<&str> {
        self.ids
            .iter()
            .find(|(_, id)| id.as_str() == coin_id)
            .map(|(sym, _)| sym.as_str())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
