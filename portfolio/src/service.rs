use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, instrument, warn};

use market::{AssetClass, FetchError, Quote, QuoteSource};

use crate::valuation::{TotalStat, valuate};
use crate::wallet::Wallet;

/// Live valuation of a wallet against the two quote sources.
pub struct PortfolioService {
    crypto: Arc<dyn QuoteSource>,
    stock: Arc<dyn QuoteSource>,
}

impl PortfolioService {
    pub fn new(crypto: Arc<dyn QuoteSource>, stock: Arc<dyn QuoteSource>) -> Self {
        Self { crypto, stock }
    }

    /// Fetches both quote sets concurrently and valuates the wallet.
    ///
    /// A failed quote source empties that class' quotes rather than failing
    /// the whole call; the affected holdings are skipped by [`valuate`].
    #[instrument(skip_all, fields(holdings = wallet.len()))]
    pub async fn total_stat(&self, wallet: &Wallet) -> TotalStat {
        let crypto_syms = wallet.symbols(AssetClass::Crypto);
        let stock_syms = wallet.symbols(AssetClass::Stock);

        let (crypto, stock) = tokio::join!(
            fetch_quotes(self.crypto.as_ref(), &crypto_syms, AssetClass::Crypto),
            fetch_quotes(self.stock.as_ref(), &stock_syms, AssetClass::Stock),
        );

        let total = valuate(wallet, &crypto, &stock);
        info!(
            total_value = total.total_value,
            pl_today = total.pl_today,
            pl_total = total.pl_total,
            valued = total.asset_stats.len(),
            "portfolio valued"
        );
        total
    }
}

async fn fetch_quotes(
    source: &dyn QuoteSource,
    symbols: &[String],
    class: AssetClass,
) -> HashMap<String, Quote> {
    if symbols.is_empty() {
        return HashMap::new();
    }
    match source.quotes(symbols).await {
        Ok(q) => q,
        Err(e) => {
            log_quote_failure(class, &e);
            HashMap::new()
        }
    }
}

fn log_quote_failure(class: AssetClass, e: &FetchError) {
    warn!(%class, error = %e, "quote fetch failed");
}
