use std::collections::HashMap;

use serde::Serialize;
use tracing::warn;

use market::{AssetClass, Quote};

use crate::holding::Holding;
use crate::wallet::Wallet;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetStat {
    pub holding: Holding,
    pub price: f64,
    pub value: f64,
    pub pl_today: f64,
    pub pl_total: f64,
}

impl AssetStat {
    pub fn from_quote(holding: &Holding, quote: Quote) -> Self {
        Self {
            holding: holding.clone(),
            price: quote.price,
            value: holding.amount * quote.price,
            pl_today: holding.amount * quote.change_24h,
            pl_total: holding.amount * (quote.price - holding.avg_price),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TotalStat {
    pub total_value: f64,
    pub pl_total: f64,
    pub pl_today: f64,
    pub asset_stats: Vec<AssetStat>,
}

impl TotalStat {
    fn push(&mut self, stat: AssetStat) {
        self.total_value += stat.value;
        self.pl_total += stat.pl_total;
        self.pl_today += stat.pl_today;
        self.asset_stats.push(stat);
    }
}

/// Values every holding that has a quote. Holdings without one are left
/// out of the totals.
pub fn valuate(
    wallet: &Wallet,
    crypto_quotes: &HashMap<String, Quote>,
    stock_quotes: &HashMap<String, Quote>,
) -> TotalStat {
    let mut total = TotalStat::default();

    for holding in wallet.holdings() {
        let quotes = match holding.asset_type {
            AssetClass::Crypto => crypto_quotes,
            AssetClass::Stock => stock_quotes,
        };
        match quotes.get(&holding.quote_symbol()) {
            Some(q) => total.push(AssetStat::from_quote(holding, *q)),
            None => warn!(
                asset = %holding.key(),
                "no quote for holding; left out of totals"
            ),
        }
    }

    total
}
