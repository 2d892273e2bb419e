use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use tracing::{debug, instrument, warn};

use crate::adapter::{FetchAdapter, QuoteSource};
use crate::errors::FetchError;
use crate::types::{ChartPeriod, PriceSeries, Quote};
use crate::yahoo::types::{ChartEnvelope, ChartResult};

pub const DEFAULT_URL: &str = "https://query1.finance.yahoo.com";

// Yahoo rejects requests without a browser-like agent.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko)";

/// Equity price history and quotes from Yahoo Finance's chart endpoint.
#[derive(Clone)]
pub struct YahooClient {
    http: Client,
    url: String,
}

fn range_for(period: ChartPeriod) -> &'static str {
    match period {
        ChartPeriod::Month => "1mo",
        ChartPeriod::HalfYear => "6mo",
        ChartPeriod::Year => "1y",
    }
}

impl YahooClient {
    pub fn new(url: String, timeout: Duration) -> Result<Self, FetchError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            url: url.trim_end_matches('/').to_string(),
        })
    }

    async fn chart(&self, symbol: &str, range: &str) -> Result<ChartResult, FetchError> {
        let ticker = symbol.to_uppercase();
        let url = format!(
            "{}/v8/finance/chart/{}?range={}&interval=1d",
            self.url, ticker, range
        );

        let resp = self.http.get(&url).send().await?.error_for_status()?;
        let body = resp.text().await?;
        let envelope: ChartEnvelope = serde_json::from_str(&body)?;
        envelope.into_result(symbol)
    }
}

#[async_trait]
impl FetchAdapter for YahooClient {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    #[instrument(skip(self), fields(symbol = %symbol, period = %period), level = "debug")]
    async fn fetch(&self, symbol: &str, period: ChartPeriod) -> Result<PriceSeries, FetchError> {
        let series = self.chart(symbol, range_for(period)).await?.into_series();
        debug!(points = series.len(), "yahoo chart fetched");
        Ok(series)
    }
}

#[async_trait]
impl QuoteSource for YahooClient {
    #[instrument(skip(self), fields(count = symbols.len()), level = "debug")]
    async fn quotes(&self, symbols: &[String]) -> Result<HashMap<String, Quote>, FetchError> {
        let calls = symbols.iter().map(|s| async move {
            let res = self.chart(s, "1d").await;
            (s.to_lowercase(), res)
        });

        let mut out = HashMap::with_capacity(symbols.len());
        let mut last_err = None;
        for (symbol, res) in join_all(calls).await {
            match res {
                Ok(chart) => match chart.quote() {
                    Some(q) => {
                        out.insert(symbol, q);
                    }
                    None => warn!(%symbol, "yahoo chart carries no market price"),
                },
                Err(e) => {
                    warn!(%symbol, error = %e, "yahoo quote failed");
                    last_err = Some(e);
                }
            }
        }

        // All calls failing is an outage, not a set of unknown tickers.
        if out.is_empty() {
            if let Some(e) = last_err.filter(FetchError::is_transient) {
                return Err(e);
            }
        }

        Ok(out)
    }
}
