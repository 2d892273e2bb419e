use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const DAY_MS: i64 = 86_400_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    Crypto,
    Stock,
}

impl AssetClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetClass::Crypto => "crypto",
            AssetClass::Stock => "stock",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "crypto" => Ok(AssetClass::Crypto),
            "stock" => Ok(AssetClass::Stock),
            other => Err(format!("invalid asset class: {other}")),
        }
    }
}

/// Cache and queue identity of an asset.
///
/// The symbol is trimmed and lowercased on construction, so "BTC" and
/// "btc" name the same key. Fields are private to keep that the only way in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetKey {
    symbol: String,
    class: AssetClass,
}

impl AssetKey {
    pub fn new(symbol: impl AsRef<str>, class: AssetClass) -> Self {
        Self {
            symbol: symbol.as_ref().trim().to_lowercase(),
            class,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn class(&self) -> AssetClass {
        self.class
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.class, self.symbol)
    }
}

/// One sample of a price series. `ts_ms` is absolute Unix milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub ts_ms: i64,
    pub price: f64,
}

impl PricePoint {
    pub fn new(ts_ms: i64, price: f64) -> Self {
        Self { ts_ms, price }
    }
}

impl From<(i64, f64)> for PricePoint {
    fn from((ts_ms, price): (i64, f64)) -> Self {
        Self { ts_ms, price }
    }
}

pub type PriceSeries = Vec<PricePoint>;

/// Chart window requested by a reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChartPeriod {
    #[default]
    Month,
    HalfYear,
    Year,
}

impl ChartPeriod {
    pub fn days(&self) -> i64 {
        match self {
            ChartPeriod::Month => 30,
            ChartPeriod::HalfYear => 182,
            ChartPeriod::Year => 365,
        }
    }

    /// The window every refresh fetches, so any narrower read can be served
    /// from the same stored series.
    pub fn widest() -> Self {
        ChartPeriod::Year
    }

    /// Lower bound (inclusive) of the window ending at `now_ms`.
    pub fn since_ms(&self, now_ms: u64) -> i64 {
        let now = i64::try_from(now_ms).unwrap_or(i64::MAX);
        now.saturating_sub(self.days() * DAY_MS).max(0)
    }
}

impl fmt::Display for ChartPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChartPeriod::Month => "month",
            ChartPeriod::HalfYear => "half-year",
            ChartPeriod::Year => "year",
        };
        f.write_str(s)
    }
}

impl FromStr for ChartPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "month" | "1mo" => Ok(ChartPeriod::Month),
            "half-year" | "half_year" | "6mo" => Ok(ChartPeriod::HalfYear),
            "year" | "1y" => Ok(ChartPeriod::Year),
            other => Err(format!("invalid chart period: {other}")),
        }
    }
}

/// Live market quote used for valuation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Quote {
    /// Last traded price in USD.
    pub price: f64,
    /// Absolute price change over the last 24h (or since previous close).
    pub change_24h: f64,
}
