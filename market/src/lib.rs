pub mod adapter;
pub mod coingecko;
pub mod errors;
pub mod types;
pub mod yahoo;

pub use adapter::{AdapterSet, FetchAdapter, QuoteSource};
pub use errors::FetchError;
pub use types::{AssetClass, AssetKey, ChartPeriod, DAY_MS, PricePoint, PriceSeries, Quote};
