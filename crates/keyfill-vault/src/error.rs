//! Vault error types.
//!
//! All vault subsystems surface errors through [`VaultError`], which is the
//! single error type returned by every public API in this crate.  Each variant
//! carries enough context for callers to decide how to handle the failure
//! without inspecting opaque strings.

/// Unified error type for the keyfill credential vault.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    // -- Crypto errors ------------------------------------------------------
    /// Encryption failed (e.g. invalid key length, ring internal error).
    #[error("encryption failed: {reason}")]
    EncryptionFailed { reason: String },

    /// Decryption failed (wrong passphrase, corrupted blob, bad layout).
    #[error("decryption failed: {reason}")]
    DecryptionFailed { reason: String },

    /// Key derivation failed (e.g. random salt generation failed).
    #[error("key derivation failed: {reason}")]
    KeyDerivationFailed { reason: String },

    /// The passphrase does not authenticate the stored credential blob.
    #[error("passphrase does not match the stored vault")]
    InvalidPassphrase,

    // -- Master record errors -----------------------------------------------
    /// No master passphrase has been configured yet.
    #[error("no master passphrase is set")]
    MasterNotSet,

    /// A URL passed to a lookup could not be parsed.
    #[error("invalid url: {url}")]
    InvalidUrl { url: String },

    // -- Storage errors -----------------------------------------------------
    /// The injected key-value backend failed a read or write.
    #[error("storage backend error: {reason}")]
    Storage { reason: String },

    // -- Underlying errors --------------------------------------------------
    /// JSON serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Generic ------------------------------------------------------------
    /// Catch-all for unexpected internal errors that don't fit a specific
    /// variant.  Prefer a typed variant whenever possible.
    #[error("internal vault error: {0}")]
    Internal(String),
}

impl From<rusqlite::Error> for VaultError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage {
            reason: err.to_string(),
        }
    }
}

/// Convenience alias used throughout the vault crate.
pub type Result<T> = std::result::Result<T, VaultError>;
