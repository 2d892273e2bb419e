use serde::Deserialize;

use crate::types::{PricePoint, PriceSeries, Quote};

/// Body of `/coins/{id}/market_chart`.
#[derive(Debug, Deserialize)]
pub struct MarketChart {
    #[serde(default)]
    pub prices: Vec<(f64, f64)>,
}

impl MarketChart {
    /// CoinGecko sends millisecond timestamps as JSON numbers.
    pub fn into_series(self) -> PriceSeries {
        self.prices
            .into_iter()
            .filter(|(_, price)| price.is_finite())
            .map(|(ts, price)| PricePoint::new(ts as i64, price))
            .collect()
    }
}

/// One element of `/coins/markets`.
#[derive(Debug, Deserialize)]
pub struct CoinMarket {
    pub id: String,
    pub symbol: String,
    pub current_price: Option<f64>,
    pub price_change_24h: Option<f64>,
}

impl CoinMarket {
    pub fn quote(&self) -> Option<Quote> {
        Some(Quote {
            price: self.current_price?,
            change_24h: self.price_change_24h.unwrap_or(0.0),
        })
    }
}
