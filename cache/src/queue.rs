use std::collections::{HashSet, VecDeque};

use market::AssetKey;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::debug;

/// Deduplicating FIFO of assets awaiting a refresh.
///
/// A key is *pending* from the moment it is enqueued until the consumer
/// calls [`RefreshQueue::complete`] for it, which happens after the
/// refresh has finished (dequeueing alone does not release it). While
/// pending, further `enqueue` calls for the same key are no-ops, so the
/// queue never holds two entries for one key.
#[derive(Debug, Default)]
pub struct RefreshQueue {
    inner: Mutex<QueueState>,
    available: Notify,
}

#[derive(Debug, Default)]
struct QueueState {
    order: VecDeque<AssetKey>,
    pending: HashSet<AssetKey>,
}

impl RefreshQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `key` unless it is already pending. Returns `true` when the
    /// key was newly queued. Never blocks on the consumer.
    pub fn enqueue(&self, key: AssetKey) -> bool {
        let mut state = self.inner.lock();
        if !state.pending.insert(key.clone()) {
            debug!(asset = %key, "refresh already pending");
            return false;
        }
        debug!(asset = %key, depth = state.order.len() + 1, "refresh queued");
        state.order.push_back(key);
        drop(state);

        self.available.notify_one();
        true
    }

    /// Pops the oldest entry, waiting as long as it takes for one.
    pub async fn dequeue(&self) -> AssetKey {
        loop {
            // notify_one leaves a permit when nobody is waiting, so an
            // enqueue landing between the check and the await still wakes us.
            let notified = self.available.notified();
            if let Some(key) = self.inner.lock().order.pop_front() {
                return key;
            }
            notified.await;
        }
    }

    /// Releases the pending mark for `key`; it may be queued again.
    pub fn complete(&self, key: &AssetKey) {
        if !self.inner.lock().pending.remove(key) {
            debug!(asset = %key, "complete called for a key that was not pending");
        }
    }

    pub fn is_pending(&self, key: &AssetKey) -> bool {
        self.inner.lock().pending.contains(key)
    }

    /// Entries waiting to be dequeued.
    pub fn len(&self) -> usize {
        self.inner.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use market::AssetClass;
    use proptest::prelude::*;

    use super::*;

    fn btc() -> AssetKey {
        AssetKey::new("btc", AssetClass::Crypto)
    }

    #[test]
    fn duplicate_enqueue_is_noop() {
        let q = RefreshQueue::new();
        assert!(q.enqueue(btc()));
        assert!(!q.enqueue(AssetKey::new("BTC", AssetClass::Crypto)));
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn same_symbol_in_other_class_is_distinct() {
        let q = RefreshQueue::new();
        assert!(q.enqueue(btc()));
        assert!(q.enqueue(AssetKey::new("btc", AssetClass::Stock)));
        assert_eq!(q.len(), 2);
    }

    #[tokio::test]
    async fn dequeue_is_fifo() {
        let q = RefreshQueue::new();
        let keys = ["aapl", "msft", "tsla"].map(|s| AssetKey::new(s, AssetClass::Stock));
        for k in &keys {
            q.enqueue(k.clone());
        }
        for k in &keys {
            assert_eq!(&q.dequeue().await, k);
        }
        assert!(q.is_empty());
    }

    #[tokio::test]
    async fn key_stays_pending_until_complete() {
        let q = RefreshQueue::new();
        q.enqueue(btc());

        let key = q.dequeue().await;
        assert!(q.is_pending(&key));
        assert!(!q.enqueue(btc()), "dequeued but unfinished key must not requeue");

        q.complete(&key);
        assert!(!q.is_pending(&key));
        assert!(q.enqueue(btc()));
    }

    #[tokio::test]
    async fn dequeue_waits_for_enqueue() {
        let q = Arc::new(RefreshQueue::new());

        let consumer = {
            let q = Arc::clone(&q);
            tokio::spawn(async move { q.dequeue().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!consumer.is_finished());

        q.enqueue(btc());
        let got = tokio::time::timeout(Duration::from_secs(1), consumer)
            .await
            .expect("consumer woke")
            .expect("consumer task");
        assert_eq!(got, btc());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_enqueue_of_same_key_yields_one_entry() {
        let q = Arc::new(RefreshQueue::new());
        let mut set = tokio::task::JoinSet::new();
        for _ in 0..64 {
            let q = Arc::clone(&q);
            set.spawn(async move { q.enqueue(AssetKey::new("ETH", AssetClass::Crypto)) });
        }

        let mut accepted = 0;
        while let Some(res) = set.join_next().await {
            if res.expect("task panicked") {
                accepted += 1;
            }
        }

        assert_eq!(accepted, 1);
        assert_eq!(q.len(), 1);
    }

    proptest! {
        #[test]
        fn never_more_than_one_entry_per_key(
            ops in proptest::collection::vec((0usize..4, any::<bool>()), 1..200)
        ) {
            let symbols = ["btc", "eth", "sol", "ada"];
            let q = RefreshQueue::new();

            for (idx, upper) in ops {
                let sym = if upper {
                    symbols[idx].to_uppercase()
                } else {
                    symbols[idx].to_string()
                };
                q.enqueue(AssetKey::new(sym, AssetClass::Crypto));

                let state = q.inner.lock();
                let unique: HashSet<_> = state.order.iter().collect();
                prop_assert_eq!(unique.len(), state.order.len());
                prop_assert!(state.order.len() <= symbols.len());
            }
        }
    }
}
