#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use market::{ChartPeriod, FetchAdapter, FetchError, PriceSeries};

/// Adapter that replays canned responses per symbol and records every call.
#[derive(Default)]
pub struct ScriptedAdapter {
    pub responses: Mutex<HashMap<String, Result<PriceSeries, FetchError>>>,
    pub calls: Mutex<Vec<(String, ChartPeriod, Instant)>>,
    pub delay: Option<Duration>,
}

impl ScriptedAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn respond(&self, symbol: &str, response: Result<PriceSeries, FetchError>) {
        self.responses.lock().insert(symbol.to_string(), response);
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn calls_for(&self, symbol: &str) -> usize {
        self.calls.lock().iter().filter(|(s, _, _)| s == symbol).count()
    }
}

#[async_trait]
impl FetchAdapter for ScriptedAdapter {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn fetch(&self, symbol: &str, period: ChartPeriod) -> Result<PriceSeries, FetchError> {
        self.calls
            .lock()
            .push((symbol.to_string(), period, Instant::now()));

        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }

        self.responses
            .lock()
            .get(symbol)
            .cloned()
            .unwrap_or_else(|| Err(FetchError::NotFound(symbol.to_string())))
    }
}
