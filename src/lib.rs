//! # Custos (Trust & Session Core)
//!
//! `custos` is the trust layer of an end-to-end encrypted account service.
//! It owns three concerns and nothing else:
//!
//! - **Crypto engine** ([`crypto`]): symmetric envelope encryption, salted
//!   encryption for low-entropy values, and RSA/hybrid encryption for
//!   public-key-addressed payloads. Pure functions; the only error a decrypt
//!   call can produce is the [`InvalidDecrypt`] sentinel.
//! - **Rate limiting** ([`rate_limit`]): an approximate sliding-window
//!   counter store plus two policies built on it, a volume limiter for plain
//!   request throttling and a failure limiter for brute-force protection.
//! - **Token lifecycle** ([`token`]): opaque bearer tokens for rolling API
//!   sessions, single-use two-factor and U2F challenges, and dashboard
//!   bootstrap channels, with replay detection on token rotation.
//!
//! ## Boundaries
//!
//! The crate is consumed in-process. HTTP routing and persistence are
//! collaborators: handlers call into the managers here and translate the
//! typed outcomes into responses, and encrypted records cross the
//! [`store::RecordStore`] seam. Authentication failures are deliberately
//! reported to external callers as a single generic credentials error; the
//! internal reason is only distinguished through `tracing` events.
//!
//! ## Concurrency
//!
//! Token-table and counter mutations are synchronous with no internal await,
//! so a verify-then-mutate sequence cannot be interleaved by another request.
//! The one background task is the rate store's one-second bucket rotation,
//! which is cancellable and never keeps the process alive on its own.

pub mod crypto;
pub mod error;
pub mod rate_limit;
pub mod store;
pub mod token;

pub use crypto::{Algorithm, InvalidDecrypt, RsaKeypair};
pub use error::Error;
pub use rate_limit::{ClientKey, FailureLimiter, RateDecision, RateWindowStore, VolumeLimiter};
pub use token::{CountCheck, ExtendError, TokenConfig, TokenManager, U2fFlow};
