//! Approximate sliding-window rate limiting.
//!
//! [`RateWindowStore`] is the counting primitive: per-key per-second buckets
//! summed over the window. Two policies sit on top of it: [`VolumeLimiter`]
//! counts every request, [`FailureLimiter`] only lets failed attempts
//! accumulate (brute-force protection).

pub mod policy;
pub mod store;

pub use policy::{ClientKey, FailureLimiter, RateDecision, VolumeLimiter};
pub use store::RateWindowStore;
