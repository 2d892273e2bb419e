use serde::{Deserialize, Serialize};

use market::{AssetClass, AssetKey};

/// One position in the wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub asset_type: AssetClass,
    pub name: String,
    pub amount: f64,
    /// Average entry price in USD.
    pub avg_price: f64,
}

impl Holding {
    pub fn new(
        asset_type: AssetClass,
        name: impl Into<String>,
        amount: f64,
        avg_price: f64,
    ) -> Self {
        Self {
            asset_type,
            name: name.into(),
            amount,
            avg_price,
        }
    }

    /// Cache key of the holding's chart.
    pub fn key(&self) -> AssetKey {
        AssetKey::new(&self.name, self.asset_type)
    }

    /// Symbol as upstream quote maps key it.
    pub fn quote_symbol(&self) -> String {
        self.name.trim().to_lowercase()
    }
}
