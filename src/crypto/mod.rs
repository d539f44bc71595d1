//! Crypto engine: hashing, envelope encryption, salted encryption, and
//! RSA/hybrid public-key encryption.
//!
//! All functions are pure and hold no state; the symmetric key used for
//! persistence-layer encryption is supplied by the caller on every call.
//! Every decrypt-family function resolves any failure (parse, wrong key,
//! corrupted payload) to the [`InvalidDecrypt`] sentinel instead of an
//! exception, so call sites branch on a plain two-variant result.

pub mod asymmetric;
pub mod symmetric;

use thiserror::Error;

pub use asymmetric::{
    decrypt_with_private_key, encrypt_with_public_key, gen_rsa_keypair, RsaKeypair,
    DIRECT_RSA_MAX_BYTES,
};
pub use symmetric::{
    decrypt, decrypt_with_salt, encrypt, encrypt_with_salt, hash, hash_with, Algorithm,
    HashAlgorithm,
};

/// The single error kind of the decrypt family, returned as a value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("invalid decrypt")]
pub struct InvalidDecrypt;
