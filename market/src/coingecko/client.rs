use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use crate::adapter::{FetchAdapter, QuoteSource};
use crate::coingecko::symbol_map::SymbolMap;
use crate::coingecko::types::{CoinMarket, MarketChart};
use crate::errors::FetchError;
use crate::types::{ChartPeriod, PriceSeries, Quote};

pub const DEFAULT_URL: &str = "https://api.coingecko.com/api/v3";

/// Crypto price history and quotes from the public CoinGecko API.
#[derive(Clone)]
pub struct CoinGeckoClient {
    http: Client,
    url: String,
    symbols: Arc<SymbolMap>,
}

impl CoinGeckoClient {
    pub fn new(url: String, symbols: SymbolMap, timeout: Duration) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            url: url.trim_end_matches('/').to_string(),
            symbols: Arc::new(symbols),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let resp = self.http.get(url).send().await?.error_for_status()?;
        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl FetchAdapter for CoinGeckoClient {
    fn name(&self) -> &'static str {
        "coingecko"
    }

    #[instrument(skip(self), fields(symbol = %symbol, period = %period), level = "debug")]
    async fn fetch(&self, symbol: &str, period: ChartPeriod) -> Result<PriceSeries, FetchError> {
        let coin_id = self.symbols.coin_id(symbol)?;
        let url = format!(
            "{}/coins/{}/market_chart?vs_currency=usd&days={}&interval=daily",
            self.url,
            coin_id,
            period.days()
        );

        let chart: MarketChart = self.get_json(&url).await?;
        let series = chart.into_series();

        debug!(coin_id, points = series.len(), "coingecko chart fetched");
        Ok(series)
    }
}

#[async_trait]
impl QuoteSource for CoinGeckoClient {
    #[instrument(skip(self), fields(count = symbols.len()), level = "debug")]
    async fn quotes(&self, symbols: &[String]) -> Result<HashMap<String, Quote>, FetchError> {
        let ids: Vec<&str> = symbols
            .iter()
            .filter_map(|s| self.symbols.coin_id(s).ok())
            .collect();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let url = format!(
            "{}/coins/markets?vs_currency=usd&ids={}&per_page=250&page=1",
            self.url,
            ids.join(",")
        );
        let markets: Vec<CoinMarket> = self.get_json(&url).await?;

        let mut out = HashMap::with_capacity(markets.len());
        for m in &markets {
            let Some(quote) = m.quote() else {
                continue;
            };
            let symbol = self
                .symbols
                .symbol_for(&m.id)
                .map(str::to_string)
                .unwrap_or_else(|| m.symbol.to_lowercase());
            out.insert(symbol, quote);
        }

        debug!(quoted = out.len(), "coingecko quotes fetched");
        Ok(out)
    }
}
