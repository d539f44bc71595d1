//! Token lifecycle: rolling login sessions, single-use second-factor
//! challenges, and dashboard bootstrap channels.
//!
//! One [`TokenManager`] exists per process and owns every token table.
//! Expiry is lazy: stale entries are swept at the start of each verification
//! call, never by a background pass.

pub mod challenge;
pub mod config;
pub mod dashboard;
pub(crate) mod generate;
pub mod login;
pub mod manager;

pub use challenge::{TwofactorChallenge, U2fChallenge, U2fFlow, U2fVerification};
pub use config::TokenConfig;
pub use dashboard::{DashboardComm, DashboardCommSession};
pub use login::{CountCheck, LoginSession};
pub use manager::{ExtendError, TokenManager};
