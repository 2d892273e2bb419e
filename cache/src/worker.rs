//! Background refresh loop.
//!
//! One worker per process drains the [`RefreshQueue`] serially:
//!
//! ```text
//! IDLE --dequeue--> FETCHING --non-empty--> WRITING --> COOLDOWN --> IDLE
//!                       |                                  ^
//!                       +-------- empty / error -----------+
//! ```
//!
//! The pending slot is released after every cycle, whatever its outcome,
//! and the cooldown paces upstream calls to at most one asset per interval.
//! An in-flight fetch has no timeout of its own: a hung upstream call
//! stalls the worker until the adapter's HTTP timeout fires.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use common::logger::{TraceId, child_span, root_span};
use common::time::Clock;
use futures::FutureExt;
use market::{AdapterSet, AssetKey, ChartPeriod, FetchError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{Instrument, error, field, info, info_span, warn};

use crate::error::StoreError;
use crate::queue::RefreshQueue;
use crate::store::PriceStore;

/// Pause between two refresh cycles.
pub const WORKER_INTERVAL: Duration = Duration::from_millis(60_000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Fetching,
    Writing,
    Cooldown,
}

/// Result of one refresh cycle.
#[derive(Debug)]
pub enum RefreshOutcome {
    Written { points: usize },
    /// Upstream answered with no points; nothing was written.
    Empty,
    FetchFailed(FetchError),
    StoreFailed(StoreError),
    /// The adapter or store panicked; the cycle was abandoned.
    Panicked,
}

impl RefreshOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, RefreshOutcome::Written { .. })
    }
}

pub struct RefreshWorker {
    store: Arc<dyn PriceStore>,
    queue: Arc<RefreshQueue>,
    adapters: AdapterSet,
    clock: Arc<dyn Clock>,
    interval: Duration,
    state: watch::Sender<WorkerState>,
}

impl RefreshWorker {
    pub fn new(
        store: Arc<dyn PriceStore>,
        queue: Arc<RefreshQueue>,
        adapters: AdapterSet,
        clock: Arc<dyn Clock>,
        interval: Duration,
    ) -> Self {
        let (state, _) = watch::channel(WorkerState::Idle);
        Self {
            store,
            queue,
            adapters,
            clock,
            interval,
            state,
        }
    }

    /// Observes state transitions.
    pub fn subscribe(&self) -> watch::Receiver<WorkerState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    fn set_state(&self, s: WorkerState) {
        self.state.send_replace(s);
    }

    /// Runs one cycle without the cooldown: waits for a key, refreshes it
    /// and releases its pending slot.
    pub async fn process_next(&self) -> RefreshOutcome {
        self.set_state(WorkerState::Idle);
        let key = self.queue.dequeue().await;

        let trace_id = TraceId::new();
        let span = root_span("refresh_cycle", &trace_id);
        span.record("asset", field::display(&key));

        let outcome = AssertUnwindSafe(self.refresh(&key).instrument(span.clone()))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| {
                span.in_scope(|| error!("refresh cycle panicked"));
                RefreshOutcome::Panicked
            });

        // Released on every path, and only once the write (if any) is done.
        self.queue.complete(&key);
        outcome
    }

    async fn refresh(&self, key: &AssetKey) -> RefreshOutcome {
        self.set_state(WorkerState::Fetching);
        let adapter = self.adapters.for_class(key.class());

        let fetch_span = child_span("fetch");
        let fetched = adapter
            .fetch(key.symbol(), ChartPeriod::widest())
            .instrument(fetch_span.clone())
            .await;

        let series = match fetched {
            Ok(series) => series,
            Err(e) => {
                fetch_span.in_scope(|| {
                    warn!(adapter = adapter.name(), error = %e, "fetch failed; skipping write")
                });
                return RefreshOutcome::FetchFailed(e);
            }
        };

        if series.is_empty() {
            fetch_span.in_scope(|| {
                warn!(adapter = adapter.name(), "fetch returned no points; skipping write")
            });
            return RefreshOutcome::Empty;
        }

        self.set_state(WorkerState::Writing);
        let write_span = child_span("write");
        let points = series.len();
        let written = self
            .store
            .replace_series(key, &series, self.clock.now_ms())
            .instrument(write_span.clone())
            .await;

        write_span.in_scope(|| match written {
            Ok(()) => {
                info!(adapter = adapter.name(), points, "series refreshed");
                RefreshOutcome::Written { points }
            }
            Err(e) => {
                error!(error = %e, "failed to persist refreshed series");
                RefreshOutcome::StoreFailed(e)
            }
        })
    }

    /// Loops forever. Failures are logged by `process_next` and never end
    /// the loop; a failed asset is retried only when a reader re-queues it.
    pub async fn run(self) {
        info!(
            interval_ms = self.interval.as_millis() as u64,
            "refresh worker started"
        );

        loop {
            let _ = self.process_next().await;

            self.set_state(WorkerState::Cooldown);
            tokio::time::sleep(self.interval).await;
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        let span = info_span!("refresh_worker");
        tokio::spawn(self.run().instrument(span))
    }
}
