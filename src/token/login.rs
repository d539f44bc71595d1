//! Login session records and the retired-token bookkeeping behind replay
//! detection.

use std::time::Instant;

use uuid::Uuid;

/// A live API session, keyed by its opaque token in the manager's table.
///
/// An instance may hold several concurrent sessions (multi-device). The
/// session is valid while `now < expires_at` and the presented use count
/// matches exactly, unless the caller asks for [`CountCheck::Any`].
#[derive(Clone, Debug)]
pub struct LoginSession {
    pub account_id: Uuid,
    pub instance_id: Uuid,
    pub(crate) expires_at: Instant,
    /// Starts at 0 and only increases; advanced on every counted
    /// verification so a stale token+count pair cannot be replayed.
    pub use_count: u64,
}

impl LoginSession {
    pub(crate) fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Use-count expectation for a verification call.
///
/// `Exact` is the mutating path: on success the stored count advances.
/// `Any` is for read-only verifications that must not consume a count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CountCheck {
    Exact(u64),
    Any,
}

/// A session that was superseded by rotation or found time-expired.
///
/// Retired entries are what makes replay detection work: presenting one of
/// these tokens again is treated as compromise evidence. Each entry carries
/// its own prune deadline (the session's remaining lifetime plus the grace
/// window) so the set stays bounded instead of growing forever.
#[derive(Clone, Debug)]
pub(crate) struct RetiredSession {
    pub(crate) account_id: Uuid,
    pub(crate) prune_at: Instant,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn expiry_is_inclusive_of_the_deadline() {
        let now = Instant::now();
        let session = LoginSession {
            account_id: Uuid::new_v4(),
            instance_id: Uuid::new_v4(),
            expires_at: now + Duration::from_secs(1),
            use_count: 0,
        };
        assert!(!session.is_expired(now));
        assert!(session.is_expired(now + Duration::from_secs(1)));
        assert!(session.is_expired(now + Duration::from_secs(2)));
    }
}
