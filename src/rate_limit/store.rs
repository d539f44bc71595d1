//! Per-key sliding-window counter store.
//!
//! The window is split into `ceil(window_ms / 1000)` one-second buckets.
//! Events land in the newest bucket; the running total per key is the sum
//! over all buckets, memoized until the next rotation. A background task
//! rotates the buckets once per second. The task holds only a `Weak`
//! reference to the shared state, so it cannot keep the store or the process
//! alive, and it is aborted when the store is dropped.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use super::policy::ClientKey;

pub struct RateWindowStore {
    state: Arc<Mutex<WindowState>>,
    rotation: JoinHandle<()>,
}

struct WindowState {
    /// Newest bucket at the back.
    buckets: VecDeque<HashMap<ClientKey, u64>>,
    /// Memoized running totals, cleared on every rotation.
    totals: HashMap<ClientKey, u64>,
    bucket_count: usize,
}

impl RateWindowStore {
    /// Create a store covering `window` and start its rotation task.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        let bucket_count = usize::try_from(window.as_millis().div_ceil(1000))
            .unwrap_or(1)
            .max(1);
        let state = Arc::new(Mutex::new(WindowState::new(bucket_count)));
        let rotation = Self::spawn_rotation(Arc::downgrade(&state));
        Self { state, rotation }
    }

    fn spawn_rotation(state: Weak<Mutex<WindowState>>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(1));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick of an interval completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(state) = state.upgrade() else {
                    debug!("rate window store dropped; stopping rotation");
                    break;
                };
                state
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .rotate();
            }
        })
    }

    fn state(&self) -> MutexGuard<'_, WindowState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count one event for `key` and return the running total in the window.
    pub fn increment(&self, key: &ClientKey) -> u64 {
        self.state().increment(key)
    }

    /// Undo one counted event for `key` (credit back from the newest bucket).
    pub fn decrement(&self, key: &ClientKey) {
        self.state().decrement(key);
    }

    /// Running total for `key` without counting an event.
    pub fn total(&self, key: &ClientKey) -> u64 {
        self.state().total(key)
    }

    /// Administrative clear for one key.
    pub fn reset_key(&self, key: &ClientKey) {
        self.state().reset_key(key);
    }

    /// Administrative clear for all keys.
    pub fn reset_all(&self) {
        self.state().reset_all();
    }
}

impl Drop for RateWindowStore {
    fn drop(&mut self) {
        self.rotation.abort();
    }
}

impl WindowState {
    fn new(bucket_count: usize) -> Self {
        let mut buckets = VecDeque::with_capacity(bucket_count);
        buckets.push_back(HashMap::new());
        Self {
            buckets,
            totals: HashMap::new(),
            bucket_count,
        }
    }

    fn rotate(&mut self) {
        self.buckets.push_back(HashMap::new());
        while self.buckets.len() > self.bucket_count {
            self.buckets.pop_front();
        }
        self.totals.clear();
    }

    fn increment(&mut self, key: &ClientKey) -> u64 {
        if let Some(bucket) = self.buckets.back_mut() {
            *bucket.entry(key.clone()).or_insert(0) += 1;
        }
        if let Some(total) = self.totals.get_mut(key) {
            *total += 1;
            return *total;
        }
        self.total(key)
    }

    fn decrement(&mut self, key: &ClientKey) {
        let newest = self.buckets.back_mut().and_then(|bucket| bucket.get_mut(key));
        if let Some(count) = newest {
            *count = count.saturating_sub(1);
            if let Some(total) = self.totals.get_mut(key) {
                *total = total.saturating_sub(1);
            }
        }
    }

    fn total(&mut self, key: &ClientKey) -> u64 {
        if let Some(total) = self.totals.get(key) {
            return *total;
        }
        let total = self
            .buckets
            .iter()
            .map(|bucket| bucket.get(key).copied().unwrap_or(0))
            .sum();
        self.totals.insert(key.clone(), total);
        total
    }

    fn reset_key(&mut self, key: &ClientKey) {
        for bucket in &mut self.buckets {
            bucket.remove(key);
        }
        self.totals.remove(key);
    }

    fn reset_all(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.totals.clear();
    }
}
