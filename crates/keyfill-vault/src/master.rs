//! Master passphrase fingerprinting.
//!
//! The master passphrase is never persisted. What the vault stores instead is
//! a [`MasterKeyRecord`]: a random salt plus the PBKDF2 digest of the
//! passphrase under that salt. A candidate passphrase is checked by
//! re-deriving and comparing in constant time.
//!
//! The salt makes the record resistant to precomputed-table attacks, and the
//! PBKDF2 work factor slows offline guessing.

use serde::{Deserialize, Serialize};

use crate::crypto;
use crate::error::{Result, VaultError};

/// Salted, verifiable one-way fingerprint of the master passphrase.
///
/// Serialized to JSON (base64 fields) and stored as a plain record; it
/// contains nothing that allows recovering the passphrase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterKeyRecord {
    /// Base64 of the random PBKDF2 salt.
    pub salt: String,
    /// Base64 of the 256-bit PBKDF2 digest.
    pub digest: String,
    /// Iteration count the digest was derived with.
    pub iterations: u32,
}

impl MasterKeyRecord {
    /// Derive a fresh fingerprint record for `passphrase`.
    ///
    /// Each call uses a new random salt, so two records for the same
    /// passphrase are distinct.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::KeyDerivationFailed`] if salt generation fails.
    pub fn derive(passphrase: &str) -> Result<Self> {
        let salt = crypto::random_bytes(crypto::SALT_LEN)?;

        let mut digest = [0u8; crypto::KEY_LEN];
        crypto::derive_key_with_salt(passphrase.as_bytes(), &salt, &mut digest);

        tracing::debug!("derived master passphrase fingerprint");

        use base64::Engine;
        let b64 = base64::engine::general_purpose::STANDARD;
        Ok(Self {
            salt: b64.encode(&salt),
            digest: b64.encode(digest),
            iterations: crypto::PBKDF2_ITERATIONS,
        })
    }

    /// Check whether `passphrase` matches this record.
    ///
    /// Re-derives the digest under the stored salt and compares with `ring`'s
    /// constant-time verify; no timing signal proportional to matching bytes.
    ///
    /// A record with undecodable salt or digest fields never verifies.
    pub fn verify(&self, passphrase: &str) -> bool {
        use base64::Engine;
        let b64 = base64::engine::general_purpose::STANDARD;

        let (Ok(salt), Ok(digest)) = (b64.decode(&self.salt), b64.decode(&self.digest)) else {
            return false;
        };

        crypto::verify_derived_key(passphrase.as_bytes(), &salt, &digest)
    }
}

// Avoid leaking digest material through debug/log output of the raw JSON.
impl std::fmt::Display for MasterKeyRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MasterKeyRecord(iterations={})", self.iterations)
    }
}

/// Parse a stored master record from its JSON form.
///
/// # Errors
///
/// Returns [`VaultError::Serialization`] if the JSON is malformed — a
/// corrupted master record is a fatal condition, unlike a corrupted
/// credential blob.
pub fn parse_record(json: &str) -> Result<MasterKeyRecord> {
    serde_json::from_str(json).map_err(VaultError::Serialization)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
