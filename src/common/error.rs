//! Fatal Simulation Errors.
//!
//! Both variants indicate a broken protocol invariant rather than a
//! transient condition, so they halt the whole simulation immediately:
//! there is no retry and no isolation between agents.

use thiserror::Error;

/// Unrecoverable protocol or memory violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SimError {
    /// A data-phase response carried a tag with no matching entry in the
    /// outstanding-request table for its direction.
    #[error("response tag {tag} has no matching outstanding request")]
    UnknownTag { tag: u32 },

    /// A memory command touched cells outside the backing store.
    #[error("address {addr:#010x} out of bounds (row {row}, col {col}, burst {burst})")]
    AddressOutOfBounds {
        addr: u32,
        row: u32,
        col: u32,
        burst: u32,
    },
}
