//! The token state machine.
//!
//! Flow Overview:
//! 1) Every verification call sweeps expired entries first (lazy expiry).
//! 2) Login sessions rotate: the client exchanges token+count for a fresh
//!    token, and the old token moves to the retired set.
//! 3) A retired token presented again is replay evidence; every session for
//!    the account is invalidated, forcing re-authentication everywhere.
//! 4) Two-factor and U2F challenges are single-use at lookup.
//!
//! All methods are synchronous with no suspension point, so a
//! verify-then-mutate sequence cannot be interleaved by another request.

use std::collections::HashMap;
use std::time::Instant;

use anyhow::Result;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::crypto::gen_rsa_keypair;

use super::challenge::{TwofactorChallenge, U2fChallenge, U2fFlow, U2fVerification};
use super::config::TokenConfig;
use super::dashboard::{DashboardComm, DashboardCommSession};
use super::generate;
use super::login::{CountCheck, LoginSession, RetiredSession};

/// Why a token rotation was refused. The wording is part of the contract:
/// the boundary surfaces stronger warning text on the replay reason.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ExtendError {
    #[error("attempt to extend expired token")]
    ReplayedToken,
    #[error("attempt to extend invalid token")]
    InvalidToken,
}

/// Owns every token table. One instance per process; request handlers share
/// it by reference and all mutation goes through these methods.
#[derive(Debug, Default)]
pub struct TokenManager {
    config: TokenConfig,
    sessions: HashMap<String, LoginSession>,
    retired: HashMap<String, RetiredSession>,
    twofactor: HashMap<String, TwofactorChallenge>,
    u2f: HashMap<String, U2fChallenge>,
    dashboard: HashMap<String, DashboardCommSession>,
}

impl TokenManager {
    #[must_use]
    pub fn new(config: TokenConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Issue a fresh login session for an instance.
    pub fn gen_login_token(&mut self, instance_id: Uuid, account_id: Uuid) -> String {
        let token = generate::unique_token(|candidate| {
            self.sessions.contains_key(candidate) || self.retired.contains_key(candidate)
        });
        self.sessions.insert(
            token.clone(),
            LoginSession {
                account_id,
                instance_id,
                expires_at: Instant::now() + self.config.login_lifetime(),
                use_count: 0,
            },
        );
        token
    }

    /// Verify a presented API token.
    ///
    /// Fails if the token is unknown, the instance does not match, or an
    /// exact count does not equal the stored count. Instance or count
    /// mismatch drops the session outright (fail closed). On success with an
    /// exact count the stored count advances; the caller must present the
    /// advanced count on its next rotation.
    pub fn verify_api_token(&mut self, token: &str, count: CountCheck, instance_id: Uuid) -> bool {
        self.sweep();
        match self.sessions.get_mut(token) {
            None => false,
            Some(session) => {
                let instance_ok = session.instance_id == instance_id;
                let count_ok = match count {
                    CountCheck::Any => true,
                    CountCheck::Exact(expected) => session.use_count == expected,
                };
                if instance_ok && count_ok {
                    if matches!(count, CountCheck::Exact(_)) {
                        session.use_count += 1;
                    }
                    true
                } else {
                    debug!(
                        account_id = %session.account_id,
                        instance_ok, "session mismatch; dropping session"
                    );
                    self.sessions.remove(token);
                    false
                }
            }
        }
    }

    /// Exchange a current token+count for a fresh token.
    ///
    /// A token found in the retired set is a replay of a credential the
    /// legitimate client already rotated away from. The safe response is to
    /// invalidate every session for the account, at the cost of forcing
    /// re-authentication on every device.
    ///
    /// # Errors
    /// [`ExtendError::ReplayedToken`] on replay, [`ExtendError::InvalidToken`]
    /// when verification fails.
    pub fn extend_login_token(
        &mut self,
        old_token: &str,
        count: u64,
        instance_id: Uuid,
        account_id: Uuid,
    ) -> Result<String, ExtendError> {
        self.sweep();
        if self.retired.contains_key(old_token) {
            warn!(
                %account_id,
                "retired token replayed; invalidating every session for the account"
            );
            self.invalidate_account(account_id);
            return Err(ExtendError::ReplayedToken);
        }
        if !self.verify_api_token(old_token, CountCheck::Exact(count), instance_id) {
            return Err(ExtendError::InvalidToken);
        }
        let Some(session) = self.sessions.remove(old_token) else {
            return Err(ExtendError::InvalidToken);
        };
        self.retired.insert(
            old_token.to_string(),
            RetiredSession {
                account_id: session.account_id,
                prune_at: session.expires_at + self.config.login_grace(),
            },
        );
        Ok(self.gen_login_token(instance_id, account_id))
    }

    /// Explicit logout. Succeeds only if the token currently validates for
    /// the instance; the session is deleted without entering the retired set,
    /// since a deliberate logout is not a replay signal.
    pub fn invalidate_token(&mut self, token: &str, instance_id: Uuid) -> bool {
        if self.verify_api_token(token, CountCheck::Any, instance_id) {
            self.sessions.remove(token);
            true
        } else {
            false
        }
    }

    /// Read-only lookup of a live session, for callers that need the account
    /// or instance behind a token they have already verified.
    #[must_use]
    pub fn session(&self, token: &str) -> Option<&LoginSession> {
        self.sessions.get(token)
    }

    /// Issue a two-factor challenge for a password-verified login.
    pub fn gen_twofactor_token(&mut self, instance_id: Uuid, account_id: Uuid) -> String {
        let token = generate::unique_token(|candidate| self.twofactor.contains_key(candidate));
        self.twofactor.insert(
            token.clone(),
            TwofactorChallenge {
                account_id,
                instance_id,
                expires_at: Instant::now() + self.config.twofactor_ttl(),
            },
        );
        token
    }

    /// Consume a two-factor challenge. The entry is deleted on the first
    /// attempt that finds it, whatever the outcome; true only on an instance
    /// match.
    pub fn verify_twofactor_token(&mut self, token: &str, instance_id: Uuid) -> bool {
        self.sweep();
        match self.twofactor.remove(token) {
            Some(challenge) => challenge.instance_id == instance_id,
            None => false,
        }
    }

    /// Issue a U2F challenge carrying the signed request for the
    /// authenticator.
    pub fn gen_u2f_token(
        &mut self,
        instance_id: Uuid,
        account_id: Uuid,
        flow: U2fFlow,
        request: Value,
    ) -> String {
        let token = generate::unique_token(|candidate| self.u2f.contains_key(candidate));
        self.u2f.insert(
            token.clone(),
            U2fChallenge {
                account_id,
                instance_id,
                flow,
                request,
                expires_at: Instant::now() + self.config.u2f_ttl(),
            },
        );
        token
    }

    /// Consume a U2F challenge at lookup. The signature check on the returned
    /// request is the caller's next step and does not resurrect the token.
    pub fn verify_u2f_token(&mut self, token: &str, instance_id: Uuid) -> Option<U2fVerification> {
        self.sweep();
        let challenge = self.u2f.remove(token)?;
        if challenge.instance_id != instance_id {
            return None;
        }
        Some(U2fVerification {
            flow: challenge.flow,
            request: challenge.request,
        })
    }

    /// Open a dashboard bootstrap channel with a fresh RSA keypair.
    ///
    /// # Errors
    /// Returns an error if keypair generation fails.
    pub fn gen_dashboard_comm_token(&mut self) -> Result<DashboardComm> {
        let keypair = gen_rsa_keypair()?;
        let token = generate::unique_token(|candidate| self.dashboard.contains_key(candidate));
        self.dashboard.insert(
            token.clone(),
            DashboardCommSession {
                public_key: keypair.public_key.clone(),
                private_key: keypair.private_key.clone(),
                expires_at: Instant::now() + self.config.dashboard_ttl(),
            },
        );
        Ok(DashboardComm {
            token,
            public_key: keypair.public_key,
            private_key: keypair.private_key,
        })
    }

    /// Hand the bootstrap key material back to the flow that opened it.
    pub fn verify_dashboard_comm_token(&mut self, token: &str) -> Option<&DashboardCommSession> {
        self.sweep();
        self.dashboard.get(token)
    }

    /// Move every live session for an account into the retired set.
    fn invalidate_account(&mut self, account_id: Uuid) {
        let now = Instant::now();
        let grace = self.config.login_grace();
        let doomed: Vec<String> = self
            .sessions
            .iter()
            .filter(|(_, session)| session.account_id == account_id)
            .map(|(token, _)| token.clone())
            .collect();
        for token in doomed {
            if let Some(session) = self.sessions.remove(&token) {
                self.retired.insert(
                    token,
                    RetiredSession {
                        account_id: session.account_id,
                        prune_at: session.expires_at.max(now) + grace,
                    },
                );
            }
        }
    }

    /// Lazy expiry: retire time-expired sessions, prune stale retired
    /// entries, and drop expired challenges. Runs at the head of every
    /// verification call.
    fn sweep(&mut self) {
        let now = Instant::now();
        let grace = self.config.login_grace();
        let expired: Vec<String> = self
            .sessions
            .iter()
            .filter(|(_, session)| session.is_expired(now))
            .map(|(token, _)| token.clone())
            .collect();
        for token in expired {
            if let Some(session) = self.sessions.remove(&token) {
                debug!(account_id = %session.account_id, "retiring expired session");
                self.retired.insert(
                    token,
                    RetiredSession {
                        account_id: session.account_id,
                        prune_at: now + grace,
                    },
                );
            }
        }
        self.retired.retain(|_, retired| retired.prune_at > now);
        self.twofactor.retain(|_, challenge| challenge.expires_at > now);
        self.u2f.retain(|_, challenge| challenge.expires_at > now);
        self.dashboard.retain(|_, session| session.expires_at > now);
    }
}
