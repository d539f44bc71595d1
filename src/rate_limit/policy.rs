//! Throttling policies built on the window store.

use std::time::Duration;

use tracing::debug;
use uuid::Uuid;

use super::store::RateWindowStore;

/// Client identity for rate accounting: instance id when the caller is a
/// registered instance, source IP otherwise.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum ClientKey {
    Instance(Uuid),
    Ip(String),
}

impl ClientKey {
    /// Resolve the accounting key for a request.
    #[must_use]
    pub fn from_request(instance_id: Option<Uuid>, ip: Option<&str>) -> Option<Self> {
        match (instance_id, ip) {
            (Some(instance_id), _) => Some(Self::Instance(instance_id)),
            (None, Some(ip)) => Some(Self::Ip(ip.to_string())),
            (None, None) => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    /// Allowed, but the boundary should hold the response for the delay.
    Delayed(Duration),
    Limited,
}

impl RateDecision {
    #[must_use]
    pub fn is_limited(self) -> bool {
        matches!(self, Self::Limited)
    }
}

/// Counts every matching request; rejects over the ceiling and slows down
/// above a lower threshold.
pub struct VolumeLimiter {
    store: RateWindowStore,
    ceiling: u64,
    slowdown_threshold: u64,
    delay: Duration,
}

impl VolumeLimiter {
    /// Must be called from within a tokio runtime; the backing store starts
    /// its rotation task immediately.
    #[must_use]
    pub fn new(window: Duration, ceiling: u64, slowdown_threshold: u64, delay: Duration) -> Self {
        Self {
            store: RateWindowStore::new(window),
            ceiling,
            slowdown_threshold,
            delay,
        }
    }

    /// Count the request and decide before it is processed.
    pub fn register(&self, key: &ClientKey) -> RateDecision {
        let total = self.store.increment(key);
        if total > self.ceiling {
            debug!(?key, total, "request volume over ceiling");
            RateDecision::Limited
        } else if total > self.slowdown_threshold {
            RateDecision::Delayed(self.delay)
        } else {
            RateDecision::Allowed
        }
    }

    pub fn reset_key(&self, key: &ClientKey) {
        self.store.reset_key(key);
    }

    pub fn reset_all(&self) {
        self.store.reset_all();
    }
}

/// Brute-force protection: attempts are counted pessimistically and credited
/// back when the outcome turns out successful, so only failures accumulate.
pub struct FailureLimiter {
    store: RateWindowStore,
    ceiling: u64,
}

impl FailureLimiter {
    /// Must be called from within a tokio runtime; the backing store starts
    /// its rotation task immediately.
    #[must_use]
    pub fn new(window: Duration, ceiling: u64) -> Self {
        Self {
            store: RateWindowStore::new(window),
            ceiling,
        }
    }

    /// Count an attempt before it is processed.
    pub fn register(&self, key: &ClientKey) -> RateDecision {
        let total = self.store.increment(key);
        if total > self.ceiling {
            debug!(?key, total, "failed attempts over ceiling");
            RateDecision::Limited
        } else {
            RateDecision::Allowed
        }
    }

    /// Credit the attempt back once the response carried a success flag.
    pub fn report_success(&self, key: &ClientKey) {
        self.store.decrement(key);
    }

    pub fn reset_key(&self, key: &ClientKey) {
        self.store.reset_key(key);
    }

    pub fn reset_all(&self) {
        self.store.reset_all();
    }
}
