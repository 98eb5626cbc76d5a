//! Random password generation from a character-class policy.
//!
//! The alphabet is the concatenation of the enabled classes in a fixed order
//! (lowercase, uppercase, digits, symbols). Characters are drawn
//! independently and uniformly from the alphabet using the system CSPRNG,
//! with rejection sampling so no character is favored by modulo bias.

use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};

use crate::error::{Result, VaultError};
use crate::vault::AppSettings;

const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const NUMBERS: &str = "0123456789";
const SYMBOLS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

/// Shortest password the generator will produce.
pub const MIN_LENGTH: usize = 8;

/// Longest password the generator will produce.
pub const MAX_LENGTH: usize = 64;

/// Which character classes a generated password may draw from, and how long
/// it should be.
///
/// `length` outside `[8, 64]` is clamped, not rejected. Disabling every class
/// falls back to lowercase-only rather than an empty alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordPolicy {
    pub length: usize,
    pub use_lowercase: bool,
    pub use_uppercase: bool,
    pub use_numbers: bool,
    pub use_symbols: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            length: 16,
            use_lowercase: true,
            use_uppercase: true,
            use_numbers: true,
            use_symbols: true,
        }
    }
}

impl From<&AppSettings> for PasswordPolicy {
    fn from(settings: &AppSettings) -> Self {
        Self {
            length: settings.password_length,
            use_lowercase: settings.use_lowercase,
            use_uppercase: settings.use_uppercase,
            use_numbers: settings.use_numbers,
            use_symbols: settings.use_symbols,
        }
    }
}

impl PasswordPolicy {
    /// The alphabet this policy draws from, classes concatenated in fixed
    /// order. Never empty: all-disabled degrades to lowercase.
    pub fn alphabet(&self) -> String {
        let mut charset = String::new();
        if self.use_lowercase {
            charset.push_str(LOWERCASE);
        }
        if self.use_uppercase {
            charset.push_str(UPPERCASE);
        }
        if self.use_numbers {
            charset.push_str(NUMBERS);
        }
        if self.use_symbols {
            charset.push_str(SYMBOLS);
        }

        if charset.is_empty() {
            // Documented fallback: an all-disabled policy still generates.
            charset.push_str(LOWERCASE);
        }
        charset
    }

    fn clamped_length(&self) -> usize {
        self.length.clamp(MIN_LENGTH, MAX_LENGTH)
    }
}

/// Generate a random password according to `policy`.
///
/// The output length always equals the clamped policy length, and every
/// character is a member of the policy's alphabet.
///
/// # Errors
///
/// Returns [`VaultError::Internal`] if the system CSPRNG fails.
pub fn generate_password(policy: &PasswordPolicy) -> Result<String> {
    let charset: Vec<char> = policy.alphabet().chars().collect();
    let length = policy.clamped_length();

    let rng = SystemRandom::new();
    let mut password = String::with_capacity(length);

    // Rejection sampling: discard bytes that would wrap unevenly around the
    // alphabet size.
    let limit = (256 / charset.len()) * charset.len();
    let mut buf = [0u8; 1];
    while password.len() < length {
        rng.fill(&mut buf)
            .map_err(|_| VaultError::Internal("failed to generate random bytes".into()))?;
        let byte = buf[0] as usize;
        if byte < limit {
            password.push(charset[byte % charset.len()]);
        }
    }

    tracing::debug!(length, "generated password");
    Ok(password)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
