use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{Instrument, info, warn};

use cache::store::SqlitePriceStore;
use cache::{ChartCache, Engine, RefreshQueue, StoreError, build_engine};
use common::logger::{TraceId, root_span};
use common::time::SystemClock;
use market::coingecko::{CoinGeckoClient, SymbolMap};
use market::yahoo::YahooClient;
use market::{AdapterSet, AssetClass, AssetKey, ChartPeriod, PriceSeries};
use portfolio::{Holding, PortfolioService, TotalStat, Wallet};

use crate::config::AppConfig;

struct Clients {
    crypto: Arc<CoinGeckoClient>,
    stock: Arc<YahooClient>,
}

impl Clients {
    fn build(cfg: &AppConfig) -> anyhow::Result<Self> {
        let symbols = SymbolMap::load_or_builtin(&cfg.crypto_mapping_path);
        let crypto = CoinGeckoClient::new(cfg.coingecko_url.clone(), symbols, cfg.http_timeout)
            .context("building CoinGecko client")?;
        let stock = YahooClient::new(cfg.yahoo_url.clone(), cfg.http_timeout)
            .context("building Yahoo client")?;

        Ok(Self {
            crypto: Arc::new(crypto),
            stock: Arc::new(stock),
        })
    }

    fn adapters(&self) -> AdapterSet {
        AdapterSet::new(self.crypto.clone(), self.stock.clone())
    }
}

async fn open_store(cfg: &AppConfig) -> anyhow::Result<Arc<SqlitePriceStore>> {
    let store = SqlitePriceStore::open(&cfg.database_url)
        .await
        .with_context(|| format!("opening chart cache at {}", cfg.database_url))?;
    Ok(Arc::new(store))
}

fn load_wallet(cfg: &AppConfig) -> anyhow::Result<Wallet> {
    Wallet::load(&cfg.wallet_path).context("loading wallet")
}

/// Pre-warms every holding, runs the refresh worker in the background and
/// reports on a fixed cadence until Ctrl-C.
pub async fn watch(cfg: &AppConfig, every_secs: u64) -> anyhow::Result<()> {
    let wallet = load_wallet(cfg)?;
    let store = open_store(cfg).await?;
    let clients = Clients::build(cfg)?;

    let Engine { cache, worker } = build_engine(
        store,
        clients.adapters(),
        Arc::new(SystemClock),
        cfg.refresh_interval,
    );
    let portfolio = PortfolioService::new(clients.crypto.clone(), clients.stock.clone());

    let queued = cache
        .prewarm(wallet.holdings().map(|h| (h.name.as_str(), h.asset_type)))
        .await;
    info!(holdings = wallet.len(), queued, "starting refresh worker");
    let worker = worker.spawn();

    let mut ticker = tokio::time::interval(Duration::from_secs(every_secs.max(1)));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let span = root_span("report", &TraceId::new());
                report(&cache, &portfolio, &wallet).instrument(span).await;
            }
            res = tokio::signal::ctrl_c() => {
                res?;
                info!("Shutdown signal received");
                break;
            }
        }
    }

    worker.abort();
    Ok(())
}

async fn report(cache: &ChartCache, portfolio: &PortfolioService, wallet: &Wallet) {
    let total = portfolio.total_stat(wallet).await;
    print_totals(&total);

    for holding in wallet.holdings() {
        let key = holding.key();
        match cache.request(&key, ChartPeriod::Month).await {
            Ok(Some(series)) => println!("  chart {key}: {} points", series.len()),
            Ok(None) => println!("  chart {key}: pending"),
            Err(e) => warn!(asset = %key, error = %e, "chart lookup failed"),
        }
    }
}

fn print_totals(total: &TotalStat) {
    println!(
        "value {:.2}  today {:+.2}  total {:+.2}",
        total.total_value, total.pl_today, total.pl_total
    );
    for s in &total.asset_stats {
        println!(
            "  {:<8} {:>10.4} @ {:>12.4}  value {:>12.2}  today {:+.2}  total {:+.2}",
            s.holding.name, s.holding.amount, s.price, s.value, s.pl_today, s.pl_total
        );
    }
}

/// One facade request. With `wait_secs` the worker runs until the chart
/// turns fresh or the wait runs out.
pub async fn chart(
    cfg: &AppConfig,
    symbol: &str,
    class: AssetClass,
    period: ChartPeriod,
    wait_secs: Option<u64>,
) -> anyhow::Result<()> {
    let store = open_store(cfg).await?;
    let clients = Clients::build(cfg)?;
    let Engine { cache, worker } = build_engine(
        store,
        clients.adapters(),
        Arc::new(SystemClock),
        cfg.refresh_interval,
    );
    let key = AssetKey::new(symbol, class);

    let mut series = cache.request(&key, period).await?;

    if let (true, Some(secs)) = (series.is_none(), wait_secs) {
        let handle = worker.spawn();
        let waited =
            tokio::time::timeout(Duration::from_secs(secs), wait_fresh(&cache, &key, period))
                .await;
        handle.abort();

        match waited {
            Ok(res) => series = Some(res?),
            Err(_) => warn!(asset = %key, secs, "chart still pending after wait"),
        }
    }

    match series {
        Some(s) => print_series(&s),
        None => println!("pending"),
    }
    Ok(())
}

async fn wait_fresh(
    cache: &ChartCache,
    key: &AssetKey,
    period: ChartPeriod,
) -> Result<PriceSeries, StoreError> {
    loop {
        tokio::time::sleep(Duration::from_millis(500)).await;
        if let Some(series) = cache.request(key, period).await? {
            return Ok(series);
        }
    }
}

fn print_series(series: &PriceSeries) {
    for p in series {
        let day = chrono::DateTime::from_timestamp_millis(p.ts_ms)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| p.ts_ms.to_string());
        println!("{day}  {:.4}", p.price);
    }
}

pub fn add(
    cfg: &AppConfig,
    symbol: &str,
    class: AssetClass,
    amount: f64,
    avg_price: f64,
) -> anyhow::Result<()> {
    let mut wallet = load_wallet(cfg)?;
    let holding = Holding::new(class, symbol.trim().to_uppercase(), amount, avg_price);

    match wallet.upsert(holding) {
        Some(prev) => info!(
            asset = %prev.key(),
            prev_amount = prev.amount,
            amount,
            "holding replaced"
        ),
        None => info!(asset = %AssetKey::new(symbol, class), amount, "holding added"),
    }
    wallet
        .save(&cfg.wallet_path)
        .context("saving wallet")?;
    Ok(())
}

pub async fn remove(cfg: &AppConfig, symbol: &str, class: AssetClass) -> anyhow::Result<()> {
    let mut wallet = load_wallet(cfg)?;
    if wallet.remove(class, symbol).is_none() {
        warn!(%symbol, %class, "no such holding in wallet");
        return Ok(());
    }
    wallet
        .save(&cfg.wallet_path)
        .context("saving wallet")?;

    let store = open_store(cfg).await?;
    let cache = ChartCache::new(store, Arc::new(RefreshQueue::new()), Arc::new(SystemClock));
    let dropped = cache.forget(symbol, class).await?;
    info!(%symbol, %class, dropped, "holding removed");
    Ok(())
}
