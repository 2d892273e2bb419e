use std::collections::HashSet;
use std::sync::Arc;

use tempfile::TempDir;
use tokio::task::JoinSet;

use cache::PriceStore;
use cache::store::SqlitePriceStore;
use market::{AssetClass, AssetKey, PricePoint, PriceSeries};

///
/// Test suite for SqlitePriceStore
///
/// This suite verifies:
///   · lazy registration on first lookup (and under races)
///   · replace + read round trip and window filtering
///   · atomicity of replace against concurrent readers
///   · cascade on asset removal
///
/// Every test runs against its own on-disk database in a temp dir.
///
async fn open_store() -> anyhow::Result<(TempDir, SqlitePriceStore)> {
    let dir = tempfile::tempdir()?;
    let url = format!("sqlite://{}", dir.path().join("cache.db").display());
    let store = SqlitePriceStore::open(&url).await?;
    Ok((dir, store))
}

fn btc() -> AssetKey {
    AssetKey::new("btc", AssetClass::Crypto)
}

fn as_set(series: &[PricePoint]) -> HashSet<(i64, u64)> {
    series.iter().map(|p| (p.ts_ms, p.price.to_bits())).collect()
}

async fn count(store: &SqlitePriceStore, sql: &str) -> anyhow::Result<i64> {
    Ok(sqlx::query_scalar(sql).fetch_one(store.pool()).await?)
}

/// First lookup of an unseen asset reports "never" and creates its row
#[tokio::test]
async fn test_last_refreshed_registers_unknown_asset() -> anyhow::Result<()> {
    let (_dir, store) = open_store().await?;

    assert_eq!(store.last_refreshed(&btc()).await?, 0);
    assert_eq!(count(&store, "SELECT COUNT(*) FROM assets").await?, 1);

    // Second lookup hits the same row
    assert_eq!(store.last_refreshed(&btc()).await?, 0);
    assert_eq!(count(&store, "SELECT COUNT(*) FROM assets").await?, 1);

    Ok(())
}

/// Racing first lookups all succeed and leave one row
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_registration_is_single_row() -> anyhow::Result<()> {
    let (_dir, store) = open_store().await?;
    let store = Arc::new(store);

    let mut set = JoinSet::new();
    for _ in 0..16 {
        let s = Arc::clone(&store);
        set.spawn(async move { s.last_refreshed(&AssetKey::new("ETH", AssetClass::Crypto)).await });
    }
    while let Some(res) = set.join_next().await {
        assert_eq!(res??, 0);
    }

    assert_eq!(count(&store, "SELECT COUNT(*) FROM assets").await?, 1);
    Ok(())
}

/// Replace then read returns exactly what was written
#[tokio::test]
async fn test_replace_and_read_round_trip() -> anyhow::Result<()> {
    let (_dir, store) = open_store().await?;

    // Adapters need not sort; the store orders on read.
    let series = vec![
        PricePoint::new(1_700_086_400_000, 66_000.0),
        PricePoint::new(1_700_000_000_000, 65_000.0),
        PricePoint::new(1_700_172_800_000, 65_500.25),
    ];
    store.replace_series(&btc(), &series, 1_700_200_000_000).await?;

    let read = store.read_series(&btc(), 0).await?;
    assert_eq!(as_set(&read), as_set(&series));
    assert!(read.windows(2).all(|w| w[0].ts_ms <= w[1].ts_ms));
    assert_eq!(store.last_refreshed(&btc()).await?, 1_700_200_000_000);

    Ok(())
}

/// The minimum timestamp is inclusive
#[tokio::test]
async fn test_read_filters_by_since() -> anyhow::Result<()> {
    let (_dir, store) = open_store().await?;

    let series: PriceSeries = (0..10).map(|i| PricePoint::new(i * 1_000, i as f64)).collect();
    store.replace_series(&btc(), &series, 42).await?;

    let read = store.read_series(&btc(), 5_000).await?;
    assert_eq!(read.len(), 5);
    assert_eq!(read[0], PricePoint::new(5_000, 5.0));

    Ok(())
}

/// Nothing stored is an empty series, not an error
#[tokio::test]
async fn test_read_unknown_asset_is_empty() -> anyhow::Result<()> {
    let (_dir, store) = open_store().await?;
    assert!(store.read_series(&btc(), 0).await?.is_empty());
    Ok(())
}

/// A second replace fully supersedes the first
#[tokio::test]
async fn test_replace_discards_previous_points() -> anyhow::Result<()> {
    let (_dir, store) = open_store().await?;

    store
        .replace_series(&btc(), &[PricePoint::new(1, 1.0), PricePoint::new(2, 2.0)], 10)
        .await?;
    store.replace_series(&btc(), &[PricePoint::new(3, 3.0)], 20).await?;

    assert_eq!(store.read_series(&btc(), 0).await?, vec![PricePoint::new(3, 3.0)]);
    assert_eq!(store.last_refreshed(&btc()).await?, 20);
    assert_eq!(count(&store, "SELECT COUNT(*) FROM prices").await?, 1);

    Ok(())
}

/// Same symbol in a different class is a different asset
#[tokio::test]
async fn test_class_separates_assets() -> anyhow::Result<()> {
    let (_dir, store) = open_store().await?;
    let stock = AssetKey::new("BTC", AssetClass::Stock);

    store.replace_series(&btc(), &[PricePoint::new(1, 1.0)], 10).await?;

    assert_eq!(store.last_refreshed(&stock).await?, 0);
    assert!(store.read_series(&stock, 0).await?.is_empty());
    Ok(())
}

/// Removing an asset drops its prices and resets its record
#[tokio::test]
async fn test_remove_asset_cascades() -> anyhow::Result<()> {
    let (_dir, store) = open_store().await?;

    store
        .replace_series(&btc(), &[PricePoint::new(1, 1.0), PricePoint::new(2, 2.0)], 10)
        .await?;

    assert!(store.remove_asset(&btc()).await?);
    assert_eq!(count(&store, "SELECT COUNT(*) FROM prices").await?, 0);
    assert_eq!(store.last_refreshed(&btc()).await?, 0);

    assert!(!store.remove_asset(&AssetKey::new("nope", AssetClass::Stock)).await?);
    Ok(())
}

/// Readers racing a writer see either the old or the new series, whole
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_replace_is_atomic_for_readers() -> anyhow::Result<()> {
    let (_dir, store) = open_store().await?;
    let store = Arc::new(store);

    let old: PriceSeries = (0..200).map(|i| PricePoint::new(i, 1.0)).collect();
    let new: PriceSeries = (1_000..1_200).map(|i| PricePoint::new(i, 2.0)).collect();
    store.replace_series(&btc(), &old, 100).await?;

    let writer = {
        let store = Arc::clone(&store);
        let (old, new) = (old.clone(), new.clone());
        tokio::spawn(async move {
            for round in 0..20u64 {
                let (series, stamp) = if round % 2 == 0 { (&new, 200) } else { (&old, 100) };
                store.replace_series(&btc(), series, stamp).await?;
            }
            Ok::<_, cache::StoreError>(())
        })
    };

    let mut readers = JoinSet::new();
    for _ in 0..4 {
        let store = Arc::clone(&store);
        let (old, new) = (as_set(&old), as_set(&new));
        readers.spawn(async move {
            for _ in 0..50 {
                let seen = as_set(&store.read_series(&btc(), 0).await?);
                assert!(
                    seen == old || seen == new,
                    "observed a partial series of {} points",
                    seen.len()
                );

                let stamp = store.last_refreshed(&btc()).await?;
                assert!(stamp == 100 || stamp == 200, "unexpected stamp {stamp}");
            }
            Ok::<_, cache::StoreError>(())
        });
    }

    while let Some(res) = readers.join_next().await {
        res??;
    }
    writer.await??;

    Ok(())
}
