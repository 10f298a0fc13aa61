//! Evaluation errors

use thiserror::Error;

use fieldcast_foundation::{AlignmentPath, DeviceUid, Reference};

/// Engine result type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort the current round for one device.
///
/// A failed round leaves the device's last successful export in place and
/// withholds publication; it never affects other devices, and it is never
/// used for control flow.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unbound variable: {0}")]
    UnboundVariable(Reference),

    /// Pop below the mandatory base scope. Indicates a bug in a node
    /// implementation, not a program error.
    #[error("scope underflow: attempted to pop the base scope")]
    ScopeUnderflow,

    #[error("{op} expects {expected} arguments, got {found}")]
    ArityMismatch {
        op: String,
        expected: usize,
        found: usize,
    },

    #[error("{op}: expected {expected}, got {found}")]
    TypeMismatch {
        op: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Two evaluated sub-expressions produced the same alignment path in one
    /// round. Indicates a missing branch-distinguishing slot.
    #[error("alignment collision at {0}")]
    AlignmentCollision(AlignmentPath),

    #[error("publication from unknown device {0}")]
    InvalidPublication(DeviceUid),

    #[error("nondeterminism source failed: {0}")]
    Nondeterminism(String),
}
