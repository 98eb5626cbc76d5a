//! Login form detection and autofill for keyfill.
//!
//! This crate is the page half of keyfill: given an HTML snapshot, find the
//! login forms on it and write a stored credential into them. Detection is
//! heuristic — it has to work on arbitrary, unknown pages — and runs field
//! classification (type attribute plus keyword metadata), structural form
//! discovery with a password-anchored fallback, and an executor that mutates
//! control values and raises the notifications reactive pages listen for.
//!
//! # Modules
//!
//! - [`dom`] — arena page snapshot parsed with html5ever, value state, event log.
//! - [`classify`] — per-field semantic role assignment.
//! - [`detect`] — two-phase login form discovery.
//! - [`fill`] — fill/submit execution and submitted-credential capture.
//! - [`error`] — unified error types.
//!
//! # Quick Start
//!
//! ```rust
//! use keyfill_autofill::{AutofillExecutor, FormDetector, PageDocument};
//! use keyfill_vault::LoginCredential;
//!
//! let mut page = PageDocument::parse(
//!     r#"<form><input name="user"><input type="password"></form>"#,
//! );
//!
//! let forms = FormDetector::new().detect_forms(&page);
//! assert_eq!(forms.len(), 1);
//!
//! let credential = LoginCredential::new("https://example.com", "alice", "pw", "Example");
//! let filled = AutofillExecutor::new()
//!     .fill_and_submit(&mut page, &forms[0], &credential, false)
//!     .unwrap();
//! assert!(filled);
//! ```

pub mod classify;
pub mod detect;
pub mod dom;
pub mod error;
pub mod fill;

// Re-export the most commonly used types at the crate root for convenience.
pub use classify::{FieldRole, classify_field};
pub use detect::{ClassifiedField, DetectedForm, FormDetector};
pub use dom::{DispatchedEvent, EventKind, NodeId, PageDocument};
pub use error::{AutofillError, Result};
pub use fill::{AutofillExecutor, CapturedLogin};
