//! Crate-wide error taxonomy.
//!
//! Every public operation is total: it returns a typed result or a sentinel
//! value instead of panicking across the boundary. The HTTP collaborator maps
//! [`Error`] onto its response taxonomy via [`Error::status`] and
//! [`Error::identifier`]; anything authentication-adjacent is surfaced with
//! the same generic identifier so callers cannot distinguish *why* a
//! credential failed.

use thiserror::Error as ThisError;

use crate::crypto::InvalidDecrypt;
use crate::token::ExtendError;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("invalid decrypt")]
    InvalidDecrypt(#[from] InvalidDecrypt),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("too many requests")]
    TooManyRequests,
}

impl Error {
    /// HTTP status class the boundary should answer with.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Self::InvalidDecrypt(_) => 400,
            Self::InvalidCredentials => 401,
            Self::TooManyRequests => 429,
        }
    }

    /// Stable machine-readable identifier for response bodies.
    #[must_use]
    pub fn identifier(&self) -> &'static str {
        match self {
            Self::InvalidDecrypt(_) => "invalid_decrypt",
            Self::InvalidCredentials => "invalid_credentials",
            Self::TooManyRequests => "too_many_requests",
        }
    }
}

// Replay detection is a flavor of invalid credentials externally; the
// distinct reason only reaches logs and the caller that matched ExtendError.
impl From<ExtendError> for Error {
    fn from(_: ExtendError) -> Self {
        Self::InvalidCredentials
    }
}
