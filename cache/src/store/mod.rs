pub mod schema;
pub mod sqlite_store;

use async_trait::async_trait;
use market::{AssetKey, PricePoint, PriceSeries};

use crate::error::StoreError;

pub use sqlite_store::SqlitePriceStore;

/// Durable per-asset price series plus last-refresh stamps.
///
/// The refresh worker is the only writer; any number of readers may call
/// in concurrently.
#[async_trait]
pub trait PriceStore: Send + Sync {
    /// Last successful refresh in Unix ms, 0 when never refreshed.
    /// Registers the key on first sight so later writes have a row to hit.
    async fn last_refreshed(&self, key: &AssetKey) -> Result<u64, StoreError>;

    /// Stored points with `ts_ms >= since_ms`, oldest first. Empty when
    /// nothing has been stored yet.
    async fn read_series(&self, key: &AssetKey, since_ms: i64) -> Result<PriceSeries, StoreError>;

    /// Replaces the whole series for `key` and stamps it with
    /// `refreshed_at_ms`, as one atomic step: readers see either the old
    /// series or the new one, never a mix.
    async fn replace_series(
        &self,
        key: &AssetKey,
        series: &[PricePoint],
        refreshed_at_ms: u64,
    ) -> Result<(), StoreError>;

    /// Drops the asset's record and its series. Returns whether it existed.
    async fn remove_asset(&self, key: &AssetKey) -> Result<bool, StoreError>;
}
