use std::sync::Arc;

use common::time::Clock;
use market::{AssetClass, AssetKey, ChartPeriod, PriceSeries};
use tracing::{debug, info, instrument, warn};

use crate::error::StoreError;
use crate::queue::RefreshQueue;
use crate::staleness::is_fresh;
use crate::store::PriceStore;

/// Read path of the chart cache.
///
/// Answers from the store while the asset is fresh; otherwise queues a
/// refresh and answers `Ok(None)` ("ask again later"). Never waits on an
/// upstream fetch.
pub struct ChartCache {
    store: Arc<dyn PriceStore>,
    queue: Arc<RefreshQueue>,
    clock: Arc<dyn Clock>,
}

impl ChartCache {
    pub fn new(
        store: Arc<dyn PriceStore>,
        queue: Arc<RefreshQueue>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            queue,
            clock,
        }
    }

    pub fn queue(&self) -> &Arc<RefreshQueue> {
        &self.queue
    }

    /// Chart data for `symbol` over `period`, or `None` while a refresh is
    /// outstanding. Store faults are returned as errors, never as `None`.
    pub async fn request_series(
        &self,
        symbol: &str,
        class: AssetClass,
        period: ChartPeriod,
    ) -> Result<Option<PriceSeries>, StoreError> {
        self.request(&AssetKey::new(symbol, class), period).await
    }

    #[instrument(skip(self), fields(asset = %key, period = %period), level = "debug")]
    pub async fn request(
        &self,
        key: &AssetKey,
        period: ChartPeriod,
    ) -> Result<Option<PriceSeries>, StoreError> {
        let last = self.store.last_refreshed(key).await?;
        let now = self.clock.now_ms();

        if !is_fresh(last, now) {
            let queued = self.queue.enqueue(key.clone());
            debug!(last_refreshed_ms = last, queued, "chart stale; refresh requested");
            return Ok(None);
        }

        let series = self.store.read_series(key, period.since_ms(now)).await?;
        debug!(points = series.len(), "chart served from cache");
        Ok(Some(series))
    }

    /// Staleness check for every holding so refreshes are queued before the
    /// first real read. Returns the number of keys pending afterwards.
    pub async fn prewarm<I, S>(&self, holdings: I) -> usize
    where
        I: IntoIterator<Item = (S, AssetClass)>,
        S: AsRef<str>,
    {
        let mut checked = 0usize;
        let mut pending = 0usize;

        for (symbol, class) in holdings {
            let key = AssetKey::new(symbol, class);
            checked += 1;
            match self.request(&key, ChartPeriod::default()).await {
                Ok(Some(_)) => {}
                Ok(None) => pending += 1,
                Err(e) => warn!(asset = %key, error = %e, "pre-warm lookup failed"),
            }
        }

        info!(checked, pending, "pre-warm pass complete");
        pending
    }

    /// Drops the cached record and series for an asset.
    #[instrument(skip(self))]
    pub async fn forget(&self, symbol: &str, class: AssetClass) -> Result<bool, StoreError> {
        self.store.remove_asset(&AssetKey::new(symbol, class)).await
    }
}
