use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::FetchError;
use crate::types::{AssetClass, ChartPeriod, PriceSeries, Quote};

/// Source of historical prices for one asset class.
///
/// Implementations may be slow and may fail, but must be all-or-nothing:
/// either the whole series or an error.
#[async_trait]
pub trait FetchAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    /// `symbol` is already normalized (lowercase).
    async fn fetch(&self, symbol: &str, period: ChartPeriod) -> Result<PriceSeries, FetchError>;
}

/// Source of live quotes, keyed by lowercase symbol in the result.
/// Symbols the upstream does not know are absent from the map.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn quotes(&self, symbols: &[String]) -> Result<HashMap<String, Quote>, FetchError>;
}

/// One adapter per asset class.
#[derive(Clone)]
pub struct AdapterSet {
    crypto: Arc<dyn FetchAdapter>,
    stock: Arc<dyn FetchAdapter>,
}

impl AdapterSet {
    pub fn new(crypto: Arc<dyn FetchAdapter>, stock: Arc<dyn FetchAdapter>) -> Self {
        Self { crypto, stock }
    }

    pub fn for_class(&self, class: AssetClass) -> &Arc<dyn FetchAdapter> {
        match class {
            AssetClass::Crypto => &self.crypto,
            AssetClass::Stock => &self.stock,
        }
    }
}
