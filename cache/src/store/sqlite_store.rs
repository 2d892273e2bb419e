//! SqlitePriceStore
//! ----------------
//! SQLite-backed implementation of [`PriceStore`]. Two tables:
//!
//!  - `assets(id, symbol, class, last_refreshed_ms)`, unique on (symbol, class)
//!  - `prices(asset_id -> assets.id, ts_ms, price)`, cascading on asset removal
//!
//! The database runs in WAL mode so readers keep reading the last committed
//! series while the worker's replace transaction is open.
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use common::logger::warn_if_slow;
use market::{AssetKey, PricePoint, PriceSeries};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info, instrument};

use super::{PriceStore, schema};
use crate::error::StoreError;

const SLOW_READ: Duration = Duration::from_millis(100);
const SLOW_WRITE: Duration = Duration::from_millis(500);

pub struct SqlitePriceStore {
    pool: SqlitePool,
}

impl SqlitePriceStore {
    /// Opens (creating if needed) the database at `url` and migrates it.
    pub async fn open(url: &str) -> Result<Self, StoreError> {
        let opts = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        // Every connection to a private in-memory database is its own
        // database, so those get exactly one.
        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let max_connections = if in_memory { 1 } else { 8 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(opts)
            .await?;

        schema::migrate(&pool).await?;
        info!(url, max_connections, "price store ready");

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl PriceStore for SqlitePriceStore {
    #[instrument(skip(self), fields(asset = %key), level = "debug")]
    async fn last_refreshed(&self, key: &AssetKey) -> Result<u64, StoreError> {
        warn_if_slow("db_last_refreshed", SLOW_READ, async {
            if let Some(v) = select_last_refreshed(&self.pool, key).await? {
                return i64_to_u64(v);
            }

            // First sight of this asset. A racing reader may insert the same
            // row first; the unique constraint makes that a no-op here.
            sqlx::query(
                r#"
INSERT INTO assets (symbol, class, last_refreshed_ms)
VALUES (?, ?, 0)
ON CONFLICT (symbol, class) DO NOTHING;
"#,
            )
            .bind(key.symbol())
            .bind(key.class().as_str())
            .execute(&self.pool)
            .await?;
            debug!("asset registered");

            let v = select_last_refreshed(&self.pool, key)
                .await?
                .ok_or_else(|| StoreError::Corrupt(format!("asset row for {key} vanished")))?;
            i64_to_u64(v)
        })
        .await
    }

    #[instrument(skip(self), fields(asset = %key), level = "debug")]
    async fn read_series(&self, key: &AssetKey, since_ms: i64) -> Result<PriceSeries, StoreError> {
        let rows = warn_if_slow("db_read_series", SLOW_READ, async {
            sqlx::query(
                r#"
SELECT p.ts_ms, p.price
FROM prices p
JOIN assets a ON a.id = p.asset_id
WHERE a.symbol = ? AND a.class = ? AND p.ts_ms >= ?
ORDER BY p.ts_ms;
"#,
            )
            .bind(key.symbol())
            .bind(key.class().as_str())
            .bind(since_ms)
            .fetch_all(&self.pool)
            .await
        })
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for r in rows {
            out.push(PricePoint {
                ts_ms: r.try_get("ts_ms")?,
                price: r.try_get("price")?,
            });
        }
        Ok(out)
    }

    #[instrument(skip(self, series), fields(asset = %key, points = series.len()))]
    async fn replace_series(
        &self,
        key: &AssetKey,
        series: &[PricePoint],
        refreshed_at_ms: u64,
    ) -> Result<(), StoreError> {
        let stamp = u64_to_i64(refreshed_at_ms)?;

        warn_if_slow("db_replace_series", SLOW_WRITE, async {
            // Dropping `tx` on any early return rolls everything back.
            let mut tx = self.pool.begin().await?;

            sqlx::query(
                r#"
INSERT INTO assets (symbol, class, last_refreshed_ms)
VALUES (?, ?, 0)
ON CONFLICT (symbol, class) DO NOTHING;
"#,
            )
            .bind(key.symbol())
            .bind(key.class().as_str())
            .execute(&mut *tx)
            .await?;

            let asset_id: i64 =
                sqlx::query_scalar("SELECT id FROM assets WHERE symbol = ? AND class = ?;")
                    .bind(key.symbol())
                    .bind(key.class().as_str())
                    .fetch_one(&mut *tx)
                    .await?;

            sqlx::query("DELETE FROM prices WHERE asset_id = ?;")
                .bind(asset_id)
                .execute(&mut *tx)
                .await?;

            for p in series {
                sqlx::query("INSERT INTO prices (asset_id, ts_ms, price) VALUES (?, ?, ?);")
                    .bind(asset_id)
                    .bind(p.ts_ms)
                    .bind(p.price)
                    .execute(&mut *tx)
                    .await?;
            }

            sqlx::query("UPDATE assets SET last_refreshed_ms = ? WHERE id = ?;")
                .bind(stamp)
                .bind(asset_id)
                .execute(&mut *tx)
                .await?;

            tx.commit().await?;
            Ok::<(), StoreError>(())
        })
        .await?;

        debug!("series replaced");
        Ok(())
    }

    #[instrument(skip(self), fields(asset = %key))]
    async fn remove_asset(&self, key: &AssetKey) -> Result<bool, StoreError> {
        let res = sqlx::query("DELETE FROM assets WHERE symbol = ? AND class = ?;")
            .bind(key.symbol())
            .bind(key.class().as_str())
            .execute(&self.pool)
            .await?;

        let removed = res.rows_affected() > 0;
        info!(removed, "asset removed from price store");
        Ok(removed)
    }
}

async fn select_last_refreshed(
    pool: &SqlitePool,
    key: &AssetKey,
) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar("SELECT last_refreshed_ms FROM assets WHERE symbol = ? AND class = ?;")
        .bind(key.symbol())
        .bind(key.class().as_str())
        .fetch_optional(pool)
        .await
}

/* =========================
Numeric safety helpers
========================= */

fn i64_to_u64(v: i64) -> Result<u64, StoreError> {
    u64::try_from(v).map_err(|_| StoreError::Corrupt(format!("negative timestamp: {v}")))
}

fn u64_to_i64(v: u64) -> Result<i64, StoreError> {
    i64::try_from(v).map_err(|_| StoreError::Corrupt(format!("timestamp too large for i64: {v}")))
}
