//! Hashing and symmetric envelope encryption.
//!
//! Envelope layout: the plaintext is JSON-serialized, encrypted under a key
//! derived from the caller's secret, and wrapped as
//! `{"data": base64(IV || ciphertext), "algorithm": "<name>"}`. Every call
//! draws a fresh random 16-byte IV; reusing an IV under the same key would
//! void the confidentiality of both messages, so nothing here caches IVs.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, StreamCipher};
use aes::Aes256;
use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::{Rng, RngCore};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};

use super::InvalidDecrypt;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;
pub(crate) type Aes256Ctr = ctr::Ctr128BE<Aes256>;

pub(crate) const IV_LENGTH: usize = 16;
pub(crate) const KEY_LENGTH: usize = 32;

const MIN_SALT_LENGTH: usize = 8;
const MAX_SALT_LENGTH: usize = 40;

/// Symmetric cipher selection, serialized under its wire name.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Algorithm {
    #[default]
    #[serde(rename = "aes-256-cbc")]
    Aes256Cbc,
    #[serde(rename = "aes-256-ctr")]
    Aes256Ctr,
}

/// Digest selection for [`hash_with`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HashAlgorithm {
    #[default]
    Sha512,
    Sha256,
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    data: String,
    algorithm: Algorithm,
}

#[derive(Serialize, Deserialize)]
struct SaltedEnvelope {
    data: String,
    salt: usize,
}

/// Hex digest of `data`, SHA-512 by default.
///
/// Deterministic; used for key derivation and password verification. Raw
/// secret digests should be compared with a constant-time routine by callers
/// on those paths.
#[must_use]
pub fn hash(data: &[u8]) -> String {
    hash_with(HashAlgorithm::Sha512, data)
}

/// Hex digest of `data` under the selected algorithm.
#[must_use]
pub fn hash_with(algorithm: HashAlgorithm, data: &[u8]) -> String {
    match algorithm {
        HashAlgorithm::Sha512 => hex::encode(Sha512::digest(data)),
        HashAlgorithm::Sha256 => hex::encode(Sha256::digest(data)),
    }
}

// Key bytes are the first 32 characters of the hex SHA-512 of the secret,
// matching the envelope format of existing encrypted records.
fn derive_key(key: &str) -> [u8; KEY_LENGTH] {
    let digest = hash(key.as_bytes());
    let mut out = [0u8; KEY_LENGTH];
    out.copy_from_slice(&digest.as_bytes()[..KEY_LENGTH]);
    out
}

/// Encrypt `data` under `key`, producing a serialized envelope string.
///
/// # Errors
/// Returns an error if serialization or cipher setup fails.
pub fn encrypt<T: Serialize>(data: &T, key: &str, algorithm: Algorithm) -> Result<String> {
    let plaintext = serde_json::to_vec(data).context("failed to serialize plaintext")?;
    let key = derive_key(key);
    let mut iv = [0u8; IV_LENGTH];
    OsRng.fill_bytes(&mut iv);

    let ciphertext = match algorithm {
        Algorithm::Aes256Cbc => Aes256CbcEnc::new_from_slices(&key, &iv)
            .map_err(|e| anyhow::anyhow!("cipher init failed: {e}"))?
            .encrypt_padded_vec_mut::<Pkcs7>(&plaintext),
        Algorithm::Aes256Ctr => {
            let mut buf = plaintext;
            Aes256Ctr::new_from_slices(&key, &iv)
                .map_err(|e| anyhow::anyhow!("cipher init failed: {e}"))?
                .apply_keystream(&mut buf);
            buf
        }
    };

    let mut raw = Vec::with_capacity(IV_LENGTH + ciphertext.len());
    raw.extend_from_slice(&iv);
    raw.extend_from_slice(&ciphertext);

    let envelope = Envelope {
        data: STANDARD.encode(raw),
        algorithm,
    };
    serde_json::to_string(&envelope).context("failed to serialize envelope")
}

/// Decrypt an envelope produced by [`encrypt`].
///
/// # Errors
/// Any parse failure, wrong key, or corrupt payload resolves to
/// [`InvalidDecrypt`]; this function never panics on malformed input.
pub fn decrypt<T: DeserializeOwned>(envelope: &str, key: &str) -> Result<T, InvalidDecrypt> {
    let plaintext = decrypt_raw(envelope, key)?;
    serde_json::from_slice(&plaintext).map_err(|_| InvalidDecrypt)
}

fn decrypt_raw(envelope: &str, key: &str) -> Result<Vec<u8>, InvalidDecrypt> {
    let parsed: Envelope = serde_json::from_str(envelope).map_err(|_| InvalidDecrypt)?;
    let raw = STANDARD.decode(parsed.data).map_err(|_| InvalidDecrypt)?;
    if raw.len() < IV_LENGTH {
        return Err(InvalidDecrypt);
    }
    let (iv, ciphertext) = raw.split_at(IV_LENGTH);
    let key = derive_key(key);

    match parsed.algorithm {
        Algorithm::Aes256Cbc => Aes256CbcDec::new_from_slices(&key, iv)
            .map_err(|_| InvalidDecrypt)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| InvalidDecrypt),
        Algorithm::Aes256Ctr => {
            let mut buf = ciphertext.to_vec();
            Aes256Ctr::new_from_slices(&key, iv)
                .map_err(|_| InvalidDecrypt)?
                .apply_keystream(&mut buf);
            Ok(buf)
        }
    }
}

/// Encrypt `data` padded with a random-length random salt.
///
/// Repeated encryptions of the same low-entropy value (a boolean, a flag)
/// under the same key must not produce correlatable ciphertexts; the salt
/// randomizes both content and length. The outer envelope records the salt
/// length so [`decrypt_with_salt`] can strip it again.
///
/// # Errors
/// Returns an error if serialization or cipher setup fails.
pub fn encrypt_with_salt<T: Serialize>(data: &T, key: &str, algorithm: Algorithm) -> Result<String> {
    let salt = random_salt();
    let mut plaintext = serde_json::to_string(data).context("failed to serialize plaintext")?;
    plaintext.push_str(&salt);

    let inner = encrypt(&plaintext, key, algorithm)?;
    serde_json::to_string(&SaltedEnvelope {
        data: inner,
        salt: salt.len(),
    })
    .context("failed to serialize salted envelope")
}

/// Decrypt an envelope produced by [`encrypt_with_salt`].
///
/// # Errors
/// Resolves every failure to [`InvalidDecrypt`].
pub fn decrypt_with_salt<T: DeserializeOwned>(
    envelope: &str,
    key: &str,
) -> Result<T, InvalidDecrypt> {
    let parsed: SaltedEnvelope = serde_json::from_str(envelope).map_err(|_| InvalidDecrypt)?;
    let combined: String = decrypt(&parsed.data, key)?;
    // A tampered salt length can land off a char boundary; `get` keeps the
    // failure a sentinel instead of a panic.
    let json = combined
        .len()
        .checked_sub(parsed.salt)
        .and_then(|end| combined.get(..end))
        .ok_or(InvalidDecrypt)?;
    serde_json::from_str(json).map_err(|_| InvalidDecrypt)
}

fn random_salt() -> String {
    let length = OsRng.gen_range(MIN_SALT_LENGTH..=MAX_SALT_LENGTH);
    OsRng
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}
