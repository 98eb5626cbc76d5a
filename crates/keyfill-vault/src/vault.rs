//! The credential vault: encrypted CRUD over a single collection blob.
//!
//! All credentials live in one JSON array that is encrypted as a whole and
//! stored under a fixed key in the injected [`StorageBackend`]. Every
//! mutation is a read-modify-write of the full collection; the vault
//! serializes those sequences through an internal mutex, so two overlapping
//! saves cannot clobber each other — one completes before the next reloads.
//!
//! Three logical records are persisted:
//!
//! | key                   | contents                                   |
//! |-----------------------|--------------------------------------------|
//! | `keyfill_credentials` | encrypted blob of the credential array     |
//! | `keyfill_settings`    | plain JSON [`AppSettings`]                 |
//! | `keyfill_master`      | plain JSON [`MasterKeyRecord`] fingerprint |

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use url::Url;

use crate::crypto;
use crate::error::{Result, VaultError};
use crate::master::{self, MasterKeyRecord};
use crate::storage::StorageBackend;

/// Storage key for the encrypted credential collection.
pub const CREDENTIALS_KEY: &str = "keyfill_credentials";

/// Storage key for the plain settings record.
pub const SETTINGS_KEY: &str = "keyfill_settings";

/// Storage key for the master passphrase fingerprint.
pub const MASTER_KEY: &str = "keyfill_master";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A stored login for one site.
///
/// Identity is `id`; saving a credential with an existing id replaces it.
/// Wire names are camelCase, matching the JSON the extension glue exchanges
/// with the popup.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginCredential {
    /// Opaque unique id (UUID v7 when created through [`LoginCredential::new`]).
    pub id: String,
    /// The page URL this login belongs to.
    pub url: String,
    pub username: String,
    pub password: String,
    /// Human-readable label shown in the UI.
    pub name: String,
    /// Creation time, epoch milliseconds.
    pub created_at: i64,
    /// Last time this credential was filled, epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used: Option<i64>,
}

impl LoginCredential {
    /// Create a new credential with a fresh UUID v7 id and the current
    /// timestamp.
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            url: url.into(),
            username: username.into(),
            password: password.into(),
            name: name.into(),
            created_at: Utc::now().timestamp_millis(),
            last_used: None,
        }
    }

    /// Hostname of the credential's URL, if it parses.
    fn hostname(&self) -> Option<String> {
        Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
    }
}

// Keep passwords out of debug/log output.
impl std::fmt::Debug for LoginCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginCredential")
            .field("id", &self.id)
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .field("created_at", &self.created_at)
            .field("last_used", &self.last_used)
            .finish()
    }
}

/// Per-installation settings, created with defaults on first access and
/// overwritten wholesale on save. Stored as plain JSON (nothing secret here).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub auto_fill_enabled: bool,
    pub lock_after_minutes: u32,
    pub password_length: usize,
    pub use_symbols: bool,
    pub use_numbers: bool,
    pub use_lowercase: bool,
    pub use_uppercase: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            auto_fill_enabled: true,
            lock_after_minutes: 5,
            password_length: 16,
            use_symbols: true,
            use_numbers: true,
            use_lowercase: true,
            use_uppercase: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Vault
// ---------------------------------------------------------------------------

/// Encrypted credential vault over an injected key-value backend.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use keyfill_vault::storage::MemoryStore;
/// use keyfill_vault::vault::{CredentialVault, LoginCredential};
///
/// # async fn example() -> keyfill_vault::error::Result<()> {
/// let vault = CredentialVault::new(Arc::new(MemoryStore::new()));
///
/// vault.set_master_password("correct horse").await?;
///
/// let login = LoginCredential::new(
///     "https://mail.example.com/login",
///     "alice",
///     "s3cret",
///     "Example mail",
/// );
/// vault.save_credential(login, "correct horse").await?;
///
/// let found = vault
///     .find_credentials_for_url("https://mail.example.com/inbox", "correct horse")
///     .await?;
/// assert_eq!(found.len(), 1);
/// # Ok(())
/// # }
/// ```
pub struct CredentialVault {
    store: Arc<dyn StorageBackend>,
    /// Serializes read-modify-write mutations of the credential blob.
    write_lock: Mutex<()>,
}

impl CredentialVault {
    /// Create a vault over the given storage backend.
    pub fn new(store: Arc<dyn StorageBackend>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    // -- Credential CRUD ----------------------------------------------------

    /// Save `credential`, replacing any stored credential with the same id.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidPassphrase`] if an existing blob does not
    /// authenticate under `passphrase`, or [`VaultError::Storage`] if the
    /// backend fails.
    pub async fn save_credential(
        &self,
        credential: LoginCredential,
        passphrase: &str,
    ) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut credentials = self.load_collection(passphrase).await?;
        credentials.retain(|c| c.id != credential.id);
        tracing::info!(id = %credential.id, "saving credential");
        credentials.push(credential);

        self.store_collection(&credentials, passphrase).await
    }

    /// Decrypt and return every stored credential.
    ///
    /// An absent blob yields an empty list. Malformed JSON inside a
    /// successfully decrypted blob also yields an empty list — the collection
    /// is unrecoverable either way and the vault stays usable.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidPassphrase`] if the blob exists but does
    /// not authenticate under `passphrase`. Callers showing an empty result
    /// should still gate on [`verify_master_password`](Self::verify_master_password).
    pub async fn get_credentials(&self, passphrase: &str) -> Result<Vec<LoginCredential>> {
        self.load_collection(passphrase).await
    }

    /// Delete the credential with `id`. Deleting an unknown id is a no-op.
    pub async fn delete_credential(&self, id: &str, passphrase: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut credentials = self.load_collection(passphrase).await?;
        let before = credentials.len();
        credentials.retain(|c| c.id != id);

        if credentials.len() == before {
            tracing::debug!(id, "delete of unknown credential id, nothing to do");
            return Ok(());
        }

        tracing::info!(id, "deleted credential");
        self.store_collection(&credentials, passphrase).await
    }

    /// Return the credentials whose URL hostname exactly matches the
    /// hostname of `page_url`.
    ///
    /// A stored credential whose URL does not parse falls back to substring
    /// containment of the query hostname.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidUrl`] if `page_url` itself does not
    /// parse.
    pub async fn find_credentials_for_url(
        &self,
        page_url: &str,
        passphrase: &str,
    ) -> Result<Vec<LoginCredential>> {
        let parsed = Url::parse(page_url).map_err(|_| VaultError::InvalidUrl {
            url: page_url.to_string(),
        })?;
        let hostname = parsed
            .host_str()
            .ok_or_else(|| VaultError::InvalidUrl {
                url: page_url.to_string(),
            })?
            .to_string();

        let credentials = self.load_collection(passphrase).await?;
        let matches: Vec<LoginCredential> = credentials
            .into_iter()
            .filter(|c| match c.hostname() {
                Some(h) => h == hostname,
                None => c.url.contains(&hostname),
            })
            .collect();

        tracing::debug!(hostname = %hostname, count = matches.len(), "looked up credentials for page");
        Ok(matches)
    }

    /// Stamp `last_used` on the credential with `id`. Unknown ids are a
    /// no-op.
    pub async fn touch_last_used(&self, id: &str, passphrase: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut credentials = self.load_collection(passphrase).await?;
        let Some(credential) = credentials.iter_mut().find(|c| c.id == id) else {
            return Ok(());
        };
        credential.last_used = Some(Utc::now().timestamp_millis());

        self.store_collection(&credentials, passphrase).await
    }

    // -- Master passphrase --------------------------------------------------

    /// Whether a master passphrase fingerprint has been stored.
    ///
    /// `false` signals the first-time setup flow.
    pub async fn has_master_password(&self) -> Result<bool> {
        Ok(self.store.get(MASTER_KEY).await?.is_some())
    }

    /// Derive and store the fingerprint for `passphrase`.
    ///
    /// The passphrase itself is never persisted.
    pub async fn set_master_password(&self, passphrase: &str) -> Result<()> {
        let record = MasterKeyRecord::derive(passphrase)?;
        let json = serde_json::to_string(&record)?;
        self.store.set(MASTER_KEY, &json).await?;
        tracing::info!("stored master passphrase fingerprint");
        Ok(())
    }

    /// Check `passphrase` against the stored fingerprint.
    ///
    /// Returns `false` when no fingerprint exists.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Serialization`] if the stored record is
    /// malformed.
    pub async fn verify_master_password(&self, passphrase: &str) -> Result<bool> {
        let Some(json) = self.store.get(MASTER_KEY).await? else {
            return Ok(false);
        };
        let record = master::parse_record(&json)?;
        Ok(record.verify(passphrase))
    }

    // -- Settings -----------------------------------------------------------

    /// Load settings, falling back to defaults when absent or unparsable.
    pub async fn get_settings(&self) -> Result<AppSettings> {
        let Some(json) = self.store.get(SETTINGS_KEY).await? else {
            return Ok(AppSettings::default());
        };

        match serde_json::from_str(&json) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                tracing::warn!(error = %e, "stored settings are malformed, using defaults");
                Ok(AppSettings::default())
            }
        }
    }

    /// Overwrite the settings record wholesale.
    pub async fn save_settings(&self, settings: &AppSettings) -> Result<()> {
        let json = serde_json::to_string(settings)?;
        self.store.set(SETTINGS_KEY, &json).await
    }

    // -- Reset --------------------------------------------------------------

    /// Erase everything: credentials, settings, and the master fingerprint.
    pub async fn clear_all_data(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        tracing::warn!("clearing all vault data");
        self.store.clear().await
    }

    // -- Internal helpers ---------------------------------------------------

    /// Decrypt the stored collection under `passphrase`.
    async fn load_collection(&self, passphrase: &str) -> Result<Vec<LoginCredential>> {
        let Some(blob) = self.store.get(CREDENTIALS_KEY).await? else {
            return Ok(Vec::new());
        };

        let plaintext = match crypto::decrypt_blob(&blob, passphrase) {
            Ok(bytes) => bytes,
            Err(VaultError::DecryptionFailed { reason }) => {
                tracing::debug!(reason = %reason, "credential blob failed authentication");
                return Err(VaultError::InvalidPassphrase);
            }
            Err(e) => return Err(e),
        };

        match serde_json::from_slice(&plaintext) {
            Ok(credentials) => Ok(credentials),
            Err(e) => {
                tracing::warn!(error = %e, "decrypted credential blob is not valid JSON, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    /// Encrypt and persist the full collection.
    async fn store_collection(
        &self,
        credentials: &[LoginCredential],
        passphrase: &str,
    ) -> Result<()> {
        let plaintext = serde_json::to_vec(credentials)?;
        let blob = crypto::encrypt_blob(&plaintext, passphrase)?;
        self.store.set(CREDENTIALS_KEY, &blob).await?;
        tracing::debug!(count = credentials.len(), "persisted credential collection");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
