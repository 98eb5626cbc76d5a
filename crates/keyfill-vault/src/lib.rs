//! Encrypted credential vault for keyfill.
//!
//! This crate is the storage half of keyfill: login credentials encrypted at
//! rest with AES-256-GCM under a key derived from the master passphrase, a
//! salted fingerprint to verify that passphrase without storing it, and a
//! policy-driven password generator. The key-value backend is injected, so
//! the same vault runs against browser extension storage glue, SQLite on a
//! native host, or memory in tests.
//!
//! # Modules
//!
//! - [`crypto`] — AES-256-GCM blob codec, PBKDF2 key derivation.
//! - [`master`] — master passphrase fingerprint record.
//! - [`generator`] — password generation from a character-class policy.
//! - [`storage`] — the [`StorageBackend`] trait and its implementations.
//! - [`vault`] — credential CRUD over one encrypted collection blob.
//! - [`error`] — unified error types.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use keyfill_vault::{CredentialVault, LoginCredential, MemoryStore};
//! use keyfill_vault::generator::{self, PasswordPolicy};
//!
//! # async fn example() -> keyfill_vault::Result<()> {
//! let vault = CredentialVault::new(Arc::new(MemoryStore::new()));
//!
//! // First-time setup.
//! if !vault.has_master_password().await? {
//!     vault.set_master_password("correct horse").await?;
//! }
//!
//! // Generate and store a login.
//! let password = generator::generate_password(&PasswordPolicy::default())?;
//! let login = LoginCredential::new("https://example.com/login", "alice", password, "Example");
//! vault.save_credential(login, "correct horse").await?;
//! # Ok(())
//! # }
//! ```

pub mod crypto;
pub mod error;
pub mod generator;
pub mod master;
pub mod storage;
pub mod vault;

// Re-export the most commonly used types at the crate root for convenience.
pub use error::{Result, VaultError};
pub use generator::{PasswordPolicy, generate_password};
pub use master::MasterKeyRecord;
pub use storage::{MemoryStore, SqliteStore, StorageBackend};
pub use vault::{AppSettings, CredentialVault, LoginCredential};
