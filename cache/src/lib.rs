//! Staleness-aware chart cache.
//!
//! Readers go through [`ChartCache`], which serves stored series while they
//! are fresh and otherwise queues a refresh and answers "pending". A single
//! [`RefreshWorker`] drains the [`RefreshQueue`], fetches through the
//! class-specific adapter and replaces the stored series atomically.

pub mod error;
pub mod facade;
pub mod queue;
pub mod staleness;
pub mod store;
pub mod worker;

use std::sync::Arc;
use std::time::Duration;

use common::time::Clock;
use market::AdapterSet;

pub use error::StoreError;
pub use facade::ChartCache;
pub use queue::RefreshQueue;
pub use staleness::{STALE_THRESHOLD_MS, is_fresh};
pub use store::PriceStore;
pub use worker::{RefreshOutcome, RefreshWorker, WORKER_INTERVAL, WorkerState};

/// Facade and worker wired to one shared queue.
pub struct Engine {
    pub cache: Arc<ChartCache>,
    pub worker: RefreshWorker,
}

/// Builds the process-wide engine objects. The caller decides when to
/// spawn the worker (usually after a pre-warm pass).
pub fn build_engine(
    store: Arc<dyn PriceStore>,
    adapters: AdapterSet,
    clock: Arc<dyn Clock>,
    interval: Duration,
) -> Engine {
    let queue = Arc::new(RefreshQueue::new());

    let cache = Arc::new(ChartCache::new(
        Arc::clone(&store),
        Arc::clone(&queue),
        Arc::clone(&clock),
    ));
    let worker = RefreshWorker::new(store, queue, adapters, clock, interval);

    Engine { cache, worker }
}
