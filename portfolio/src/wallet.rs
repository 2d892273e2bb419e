use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use market::AssetClass;

use crate::holding::Holding;

#[derive(Error, Debug)]
pub enum WalletError {
    #[error("wallet io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed wallet file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// On-disk shape: two flat lists.
#[derive(Debug, Default, Serialize, Deserialize)]
struct WalletFile {
    #[serde(default)]
    crypto: Vec<Holding>,
    #[serde(default)]
    stocks: Vec<Holding>,
}

/// Holdings split by class, keyed by upper-cased name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Wallet {
    crypto: BTreeMap<String, Holding>,
    stocks: BTreeMap<String, Holding>,
}

fn wallet_key(name: &str) -> String {
    name.trim().to_uppercase()
}

impl Wallet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the wallet at `path`. A missing file is an empty wallet.
    pub fn load(path: &Path) -> Result<Self, WalletError> {
        let body = match std::fs::read_to_string(path) {
            Ok(body) => body,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no wallet file; starting empty");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(WalletError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let file: WalletFile = serde_json::from_str(&body).map_err(|source| WalletError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;

        // Each holding's own `asset_type` decides its bucket, whichever
        // list it was filed under.
        let mut wallet = Self::default();
        for h in file.crypto.into_iter().chain(file.stocks) {
            wallet.upsert(h);
        }
        info!(path = %path.display(), holdings = wallet.len(), "wallet loaded");
        Ok(wallet)
    }

    /// Writes pretty JSON, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), WalletError> {
        let io_err = |source| WalletError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let file = WalletFile {
            crypto: self.crypto.values().cloned().collect(),
            stocks: self.stocks.values().cloned().collect(),
        };
        let body = serde_json::to_string_pretty(&file).map_err(|source| WalletError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, body).map_err(io_err)?;
        Ok(())
    }

    fn bucket(&self, class: AssetClass) -> &BTreeMap<String, Holding> {
        match class {
            AssetClass::Crypto => &self.crypto,
            AssetClass::Stock => &self.stocks,
        }
    }

    fn bucket_mut(&mut self, class: AssetClass) -> &mut BTreeMap<String, Holding> {
        match class {
            AssetClass::Crypto => &mut self.crypto,
            AssetClass::Stock => &mut self.stocks,
        }
    }

    /// Inserts or replaces the holding with the same class and name.
    /// Returns the previous holding, if any.
    pub fn upsert(&mut self, holding: Holding) -> Option<Holding> {
        let key = wallet_key(&holding.name);
        self.bucket_mut(holding.asset_type).insert(key, holding)
    }

    pub fn remove(&mut self, class: AssetClass, name: &str) -> Option<Holding> {
        self.bucket_mut(class).remove(&wallet_key(name))
    }

    pub fn get(&self, class: AssetClass, name: &str) -> Option<&Holding> {
        self.bucket(class).get(&wallet_key(name))
    }

    /// Crypto holdings first, then stocks, each in name order.
    pub fn holdings(&self) -> impl Iterator<Item = &Holding> {
        self.crypto.values().chain(self.stocks.values())
    }

    /// Lowercase symbols of one class, as quote sources expect them.
    pub fn symbols(&self, class: AssetClass) -> Vec<String> {
        self.bucket(class).values().map(Holding::quote_symbol).collect()
    }

    pub fn len(&self) -> usize {
        self.crypto.len() + self.stocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.crypto.is_empty() && self.stocks.is_empty()
    }
}
