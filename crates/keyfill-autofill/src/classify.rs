//! Field role classification.
//!
//! Assigns a semantic role to a single form control from its declared type
//! and textual metadata. The ordering is deliberate policy: an explicit
//! `type="password"` always outranks the keyword heuristics, so a field named
//! `user_password_hint` can never be mistaken for a username field. The
//! `autocomplete` token participates as ordinary metadata rather than as an
//! authoritative signal — real pages misuse it too often to trust it alone.

use crate::dom::{NodeId, PageDocument};

/// Semantic role of a classified form control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    Username,
    Email,
    Password,
    Unknown,
}

impl FieldRole {
    /// Username-shaped roles: a plain username or an email address both
    /// receive the credential's username on fill.
    pub fn is_username_like(self) -> bool {
        matches!(self, Self::Username | Self::Email)
    }
}

/// Keywords that mark a field as holding a password.
const PASSWORD_KEYWORDS: &[&str] = &["pass", "pwd", "secret"];

/// Keywords that mark a field as holding a username or account identifier.
const USERNAME_KEYWORDS: &[&str] = &[
    "user",
    "email",
    "login",
    "id",
    "identifier",
    "account",
    "customer",
    "phone",
    "mail",
];

/// Attributes whose text participates in keyword matching.
const METADATA_ATTRS: &[&str] = &["id", "name", "placeholder", "class", "aria-label", "autocomplete"];

/// Classify one form control. First match wins:
///
/// 1. `type="password"` → [`FieldRole::Password`]
/// 2. `type="email"` → [`FieldRole::Email`]
/// 3. password keyword in any metadata attribute → [`FieldRole::Password`]
/// 4. username keyword in any metadata attribute → [`FieldRole::Username`]
/// 5. otherwise → [`FieldRole::Unknown`]
///
/// Matching is case-insensitive substring containment. Non-element node ids
/// classify as [`FieldRole::Unknown`].
pub fn classify_field(doc: &PageDocument, node: NodeId) -> FieldRole {
    let declared_type = doc
        .attr(node, "type")
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    if declared_type == "password" {
        return FieldRole::Password;
    }
    if declared_type == "email" {
        return FieldRole::Email;
    }

    let metadata: Vec<String> = METADATA_ATTRS
        .iter()
        .filter_map(|&attr| doc.attr(node, attr))
        .map(str::to_ascii_lowercase)
        .collect();

    let matches_any =
        |keywords: &[&str]| metadata.iter().any(|m| keywords.iter().any(|k| m.contains(k)));

    if matches_any(PASSWORD_KEYWORDS) {
        return FieldRole::Password;
    }
    if matches_any(USERNAME_KEYWORDS) {
        return FieldRole::Username;
    }

    FieldRole::Unknown
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
