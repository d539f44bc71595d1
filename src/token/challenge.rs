//! Single-use second-factor challenges.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A pending two-factor challenge, issued after the password verified but
/// before the second factor did. Deleted on the first verification attempt
/// that finds it.
#[derive(Clone, Debug)]
pub struct TwofactorChallenge {
    pub account_id: Uuid,
    pub instance_id: Uuid,
    pub(crate) expires_at: Instant,
}

/// Which U2F flow a challenge belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum U2fFlow {
    Enable,
    Disable,
    Verify,
}

/// A pending U2F challenge carrying the signed request handed to the
/// authenticator. Consumed at lookup; the cryptographic signature check on
/// the returned request is the collaborator's step.
#[derive(Clone, Debug)]
pub struct U2fChallenge {
    pub account_id: Uuid,
    pub instance_id: Uuid,
    pub flow: U2fFlow,
    pub request: Value,
    pub(crate) expires_at: Instant,
}

/// Result of a successful U2F token lookup.
#[derive(Clone, Debug)]
pub struct U2fVerification {
    pub flow: U2fFlow,
    pub request: Value,
}
