use sqlx::SqlitePool;

pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // Assets: one row per (symbol, class), created lazily on first lookup.
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS assets (
  id INTEGER PRIMARY KEY,
  symbol TEXT NOT NULL,
  class TEXT NOT NULL CHECK (class IN ('crypto','stock')),
  last_refreshed_ms INTEGER NOT NULL DEFAULT 0,
  UNIQUE (symbol, class)
);
"#,
    )
    .execute(pool)
    .await?;

    // Prices
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS prices (
  id INTEGER PRIMARY KEY,
  asset_id INTEGER NOT NULL,
  ts_ms INTEGER NOT NULL,
  price REAL NOT NULL,
  FOREIGN KEY (asset_id) REFERENCES assets(id) ON DELETE CASCADE
);
"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(r#"CREATE INDEX IF NOT EXISTS idx_prices_asset_ts ON prices(asset_id, ts_ms);"#)
        .execute(pool)
        .await?;

    Ok(())
}
