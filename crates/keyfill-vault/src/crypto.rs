//! AES-256-GCM encryption and the vault blob codec, built on `ring`.
//!
//! This module provides the vault's cryptographic core:
//!
//! - **Blob codec**: [`encrypt_blob`] / [`decrypt_blob`] turn a plaintext and
//!   a passphrase into a single printable string (and back), carrying the
//!   salt and nonce alongside the ciphertext.
//! - **Key derivation**: PBKDF2-HMAC-SHA256 derives a 256-bit key from the
//!   passphrase and a fresh random salt on every write.
//! - **Fail closed**: a wrong passphrase or a tampered blob produces an
//!   explicit [`VaultError::DecryptionFailed`], never garbage plaintext.
//!
//! # Blob layout
//!
//! ```text
//! base64( [32 bytes: PBKDF2 salt][12 bytes: nonce][ciphertext + 16-byte tag] )
//! ```
//!
//! # Security Notes
//!
//! - Nonces are generated randomly per encryption. With a 96-bit nonce the
//!   collision probability is negligible for up to ~2^32 encryptions under
//!   the same key.
//! - PBKDF2 iteration count is 600,000 per the OWASP 2023 recommendation for
//!   HMAC-SHA256.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use ring::aead::{self, Aad, BoundKey, NONCE_LEN, Nonce, NonceSequence, SealingKey, UnboundKey};
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};

use crate::error::{Result, VaultError};

/// Length of the AES-256-GCM key in bytes.
pub const KEY_LEN: usize = 32;

/// Length of the AES-256-GCM nonce in bytes (96 bits).
pub const NONCE_LEN_BYTES: usize = NONCE_LEN;

/// Length of the PBKDF2 salt in bytes.
pub const SALT_LEN: usize = 32;

/// Length of the GCM authentication tag in bytes.
const TAG_LEN: usize = 16;

/// PBKDF2 iteration count.
pub const PBKDF2_ITERATIONS: u32 = 600_000;

/// PBKDF2 algorithm: HMAC-SHA256.
static PBKDF2_ALG: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;

/// AES-256-GCM algorithm from `ring`.
static AEAD_ALG: &aead::Algorithm = &aead::AES_256_GCM;

// ---------------------------------------------------------------------------
// Nonce handling
// ---------------------------------------------------------------------------

/// A single-use nonce sequence that yields exactly one nonce and then errors.
///
/// `ring` requires a [`NonceSequence`] for sealing operations. Since we
/// generate a fresh random nonce per encryption call, this wrapper ensures
/// each sealing key is used exactly once.
struct SingleNonce(Option<[u8; NONCE_LEN_BYTES]>);

impl SingleNonce {
    fn new(bytes: [u8; NONCE_LEN_BYTES]) -> Self {
        Self(Some(bytes))
    }
}

impl NonceSequence for SingleNonce {
    fn advance(&mut self) -> std::result::Result<Nonce, ring::error::Unspecified> {
        self.0
            .take()
            .map(Nonce::assume_unique_for_key)
            .ok_or(ring::error::Unspecified)
    }
}

// ---------------------------------------------------------------------------
// Blob codec (passphrase-keyed)
// ---------------------------------------------------------------------------

/// Encrypt `plaintext` under `passphrase` into a self-contained printable
/// blob.
///
/// A fresh random salt and nonce are generated on every call, so encrypting
/// the same plaintext twice yields different blobs.
///
/// # Errors
///
/// Returns [`VaultError::KeyDerivationFailed`] if the CSPRNG fails, or
/// [`VaultError::EncryptionFailed`] if `ring` reports a sealing failure.
pub fn encrypt_blob(plaintext: &[u8], passphrase: &str) -> Result<String> {
    let rng = SystemRandom::new();

    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt)
        .map_err(|_| VaultError::KeyDerivationFailed {
            reason: "failed to generate random salt".into(),
        })?;

    let mut key = [0u8; KEY_LEN];
    derive_key_with_salt(passphrase.as_bytes(), &salt, &mut key);

    let (nonce, ciphertext) = encrypt(plaintext, &key)?;

    let mut raw = Vec::with_capacity(SALT_LEN + NONCE_LEN_BYTES + ciphertext.len());
    raw.extend_from_slice(&salt);
    raw.extend_from_slice(&nonce);
    raw.extend_from_slice(&ciphertext);

    tracing::trace!(
        plaintext_len = plaintext.len(),
        blob_len = raw.len(),
        "sealed vault blob"
    );

    Ok(BASE64.encode(raw))
}

/// Decrypt a blob produced by [`encrypt_blob`].
///
/// # Errors
///
/// Returns [`VaultError::DecryptionFailed`] if the blob is not valid base64,
/// is too short to carry a salt/nonce/tag, or fails GCM authentication
/// (wrong passphrase or tampered data).
pub fn decrypt_blob(blob: &str, passphrase: &str) -> Result<Vec<u8>> {
    let raw = BASE64
        .decode(blob.trim())
        .map_err(|e| VaultError::DecryptionFailed {
            reason: format!("blob is not valid base64: {e}"),
        })?;

    // Minimum size: salt (32) + nonce (12) + tag (16).
    if raw.len() < SALT_LEN + NONCE_LEN_BYTES + TAG_LEN {
        return Err(VaultError::DecryptionFailed {
            reason: format!("blob is too small ({} bytes)", raw.len()),
        });
    }

    let (salt, rest) = raw.split_at(SALT_LEN);
    let (nonce_bytes, ciphertext) = rest.split_at(NONCE_LEN_BYTES);

    let mut key = [0u8; KEY_LEN];
    derive_key_with_salt(passphrase.as_bytes(), salt, &mut key);

    let mut nonce = [0u8; NONCE_LEN_BYTES];
    nonce.copy_from_slice(nonce_bytes);

    decrypt(&nonce, ciphertext, &key)
}

// ---------------------------------------------------------------------------
// Raw AEAD primitives
// ---------------------------------------------------------------------------

/// Encrypt `plaintext` with AES-256-GCM using the given 256-bit `key`.
///
/// Returns `(nonce, ciphertext)` where `nonce` is a randomly generated 96-bit
/// value and `ciphertext` includes the 128-bit authentication tag appended by
/// `ring`.
///
/// # Errors
///
/// Returns [`VaultError::EncryptionFailed`] if the key length is wrong or
/// `ring` reports a failure.
pub fn encrypt(plaintext: &[u8], key: &[u8]) -> Result<([u8; NONCE_LEN_BYTES], Vec<u8>)> {
    if key.len() != KEY_LEN {
        return Err(VaultError::EncryptionFailed {
            reason: format!("key must be {} bytes, got {}", KEY_LEN, key.len()),
        });
    }

    let rng = SystemRandom::new();

    let mut nonce_bytes = [0u8; NONCE_LEN_BYTES];
    rng.fill(&mut nonce_bytes)
        .map_err(|_| VaultError::EncryptionFailed {
            reason: "failed to generate random nonce".into(),
        })?;

    let unbound_key = UnboundKey::new(AEAD_ALG, key).map_err(|_| VaultError::EncryptionFailed {
        reason: "failed to create AES-256-GCM key".into(),
    })?;

    let mut sealing_key = SealingKey::new(unbound_key, SingleNonce::new(nonce_bytes));

    // `ring` encrypts in-place and appends the authentication tag.
    let mut in_out = plaintext.to_vec();
    sealing_key
        .seal_in_place_append_tag(Aad::empty(), &mut in_out)
        .map_err(|_| VaultError::EncryptionFailed {
            reason: "seal_in_place failed".into(),
        })?;

    Ok((nonce_bytes, in_out))
}

/// Decrypt `ciphertext` (which includes the GCM tag) using the given `nonce`
/// and 256-bit `key`.
///
/// # Errors
///
/// Returns [`VaultError::DecryptionFailed`] if the key is wrong, the
/// ciphertext has been tampered with, or the nonce does not match.
pub fn decrypt(nonce: &[u8; NONCE_LEN_BYTES], ciphertext: &[u8], key: &[u8]) -> Result<Vec<u8>> {
    if key.len() != KEY_LEN {
        return Err(VaultError::DecryptionFailed {
            reason: format!("key must be {} bytes, got {}", KEY_LEN, key.len()),
        });
    }

    let unbound_key = UnboundKey::new(AEAD_ALG, key).map_err(|_| VaultError::DecryptionFailed {
        reason: "failed to create AES-256-GCM key".into(),
    })?;

    let mut opening_key = aead::OpeningKey::new(unbound_key, SingleNonce::new(*nonce));

    let mut in_out = ciphertext.to_vec();
    let plaintext = opening_key
        .open_in_place(Aad::empty(), &mut in_out)
        .map_err(|_| VaultError::DecryptionFailed {
            reason: "authentication failed — wrong passphrase or corrupted data".into(),
        })?;

    Ok(plaintext.to_vec())
}

// ---------------------------------------------------------------------------
// Key derivation
// ---------------------------------------------------------------------------

/// Derive a 256-bit key from `secret` and a known `salt` via
/// PBKDF2-HMAC-SHA256.
pub fn derive_key_with_salt(secret: &[u8], salt: &[u8], out: &mut [u8; KEY_LEN]) {
    let iterations =
        std::num::NonZeroU32::new(PBKDF2_ITERATIONS).expect("PBKDF2_ITERATIONS is non-zero");
    pbkdf2::derive(PBKDF2_ALG, iterations, salt, secret, out);
}

/// Verify that `secret` re-derives `expected` under `salt`.
///
/// Uses `ring`'s constant-time comparison; the result does not leak how many
/// leading bytes matched.
pub fn verify_derived_key(secret: &[u8], salt: &[u8], expected: &[u8]) -> bool {
    let iterations =
        std::num::NonZeroU32::new(PBKDF2_ITERATIONS).expect("PBKDF2_ITERATIONS is non-zero");
    pbkdf2::verify(PBKDF2_ALG, iterations, salt, secret, expected).is_ok()
}

// ---------------------------------------------------------------------------
// Random bytes
// ---------------------------------------------------------------------------

/// Generate `len` cryptographically secure random bytes.
///
/// # Errors
///
/// Returns [`VaultError::Internal`] if the system CSPRNG fails.
pub fn random_bytes(len: usize) -> Result<Vec<u8>> {
    let rng = SystemRandom::new();
    let mut buf = vec![0u8; len];
    rng.fill(&mut buf)
        .map_err(|_| VaultError::Internal("failed to generate random bytes".into()))?;
    Ok(buf)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
