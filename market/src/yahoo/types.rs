use serde::Deserialize;

use crate::errors::FetchError;
use crate::types::{PricePoint, PriceSeries, Quote};

/// Envelope of `/v8/finance/chart/{symbol}`.
#[derive(Debug, Deserialize)]
pub struct ChartEnvelope {
    pub chart: Chart,
}

#[derive(Debug, Deserialize)]
pub struct Chart {
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
    #[serde(default)]
    pub error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
pub struct ChartError {
    pub code: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartResult {
    pub meta: ChartMeta,
    #[serde(default)]
    pub timestamp: Vec<i64>,
    #[serde(default)]
    pub indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    pub symbol: String,
    pub regular_market_price: Option<f64>,
    pub chart_previous_close: Option<f64>,
    pub previous_close: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<QuoteIndicator>,
}

#[derive(Debug, Default, Deserialize)]
pub struct QuoteIndicator {
    #[serde(default)]
    pub close: Vec<Option<f64>>,
}

impl ChartEnvelope {
    /// First result, or `NotFound` when Yahoo reports an error or nothing.
    pub fn into_result(self, symbol: &str) -> Result<ChartResult, FetchError> {
        if let Some(err) = self.chart.error {
            return Err(FetchError::NotFound(format!(
                "{symbol}: {} {}",
                err.code, err.description
            )));
        }
        self.chart
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| FetchError::NotFound(format!("{symbol}: empty chart result")))
    }
}

impl ChartResult {
    /// Daily closes; timestamps arrive in seconds, null closes are dropped.
    pub fn into_series(self) -> PriceSeries {
        let closes = self
            .indicators
            .quote
            .into_iter()
            .next()
            .map(|q| q.close)
            .unwrap_or_default();

        self.timestamp
            .into_iter()
            .zip(closes)
            .filter_map(|(ts, close)| {
                let price = close.filter(|p| p.is_finite())?;
                Some(PricePoint::new(ts.checked_mul(1000)?, price))
            })
            .collect()
    }

    pub fn quote(&self) -> Option<Quote> {
        let price = self.meta.regular_market_price?;
        let prev = self
            .meta
            .chart_previous_close
            .or(self.meta.previous_close)
            .unwrap_or(price);
        Some(Quote {
            price,
            change_24h: price - prev,
        })
    }
}
