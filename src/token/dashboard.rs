//! Dashboard bootstrap sessions.
//!
//! Before any instance exists, an untrusted browser needs a one-time RSA
//! channel to talk to the server. Each bootstrap mints a fresh keypair that
//! lives only as long as the comm session.

use std::time::Instant;

/// Stored key material for one dashboard bootstrap channel.
#[derive(Clone, Debug)]
pub struct DashboardCommSession {
    pub public_key: String,
    pub private_key: String,
    pub(crate) expires_at: Instant,
}

/// What the caller gets back from a bootstrap: the opaque token plus the
/// key material it will hand to the browser.
#[derive(Clone, Debug)]
pub struct DashboardComm {
    pub token: String,
    pub public_key: String,
    pub private_key: String,
}
