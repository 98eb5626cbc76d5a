//! Autofill error types.
//!
//! "Nothing found" is never an error in this crate — an empty scan result or
//! an unfilled form is expressed as empty collections and `false`. Errors are
//! reserved for genuinely exceptional conditions, chiefly a node reference
//! that no longer belongs to the document being filled.

use crate::dom::NodeId;

/// Unified error type for the keyfill autofill engine.
#[derive(Debug, thiserror::Error)]
pub enum AutofillError {
    /// A node reference does not belong to this document (stale scan result
    /// or a reference from a different document).
    #[error("node {node:?} is not attached to this document")]
    DetachedNode { node: NodeId },

    /// The referenced node exists but is not a form control, so it cannot
    /// hold a value.
    #[error("node {node:?} is not a form control")]
    NotAControl { node: NodeId },
}

/// Convenience alias used throughout the autofill crate.
pub type Result<T> = std::result::Result<T, AutofillError>;
