//! Error types shared by every Mond layer.
//!
//! One enum covers the runtime failures (allocation, handle validity,
//! transfer, fence) and the validation failures raised by the typed layer
//! before any runtime call is made (index, argument, state).

use std::error::Error;
use std::fmt;

use crate::handle::GlobalHandle;

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, GlobalError>;

/// Errors from global-memory operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GlobalError {
    /// The runtime could not satisfy an allocation: space exhausted,
    /// request above the per-allocation limit, or a zero-byte request.
    Allocation {
        /// Number of bytes requested.
        requested: usize,
        /// Why the request was refused.
        reason: String,
    },
    /// A NULL handle, or one whose allocation has already been freed.
    InvalidHandle {
        /// The offending handle.
        handle: GlobalHandle,
    },
    /// A get or put failed inside the runtime.
    Transfer {
        /// Start of the transfer.
        handle: GlobalHandle,
        /// Number of bytes in the transfer.
        len: usize,
        /// Runtime-supplied description.
        reason: String,
    },
    /// The runtime could not establish an ordering point. Fatal: callers
    /// must not retry, since silently reordered transfers are worse than
    /// stopping.
    Fence {
        /// Runtime-supplied description.
        reason: String,
    },
    /// An array index at or past the array length.
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// The array length.
        len: usize,
    },
    /// An argument that can never succeed (e.g. a zero-length array).
    InvalidArgument {
        /// Description of the rejected argument.
        reason: String,
    },
    /// An operation on an owner whose allocation was moved out.
    InvalidState {
        /// Description of the state violation.
        reason: String,
    },
}

impl GlobalError {
    /// Whether the error leaves the context unusable.
    ///
    /// Only [`GlobalError::Fence`] is fatal.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fence { .. })
    }

    /// Shorthand for an [`GlobalError::InvalidState`] about a moved-out owner.
    pub fn moved_out() -> Self {
        Self::InvalidState {
            reason: "owner no longer holds an allocation".into(),
        }
    }
}

impl fmt::Display for GlobalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allocation { requested, reason } => {
                write!(f, "allocation of {requested} bytes failed: {reason}")
            }
            Self::InvalidHandle { handle } => {
                write!(f, "invalid handle {handle}: null or already freed")
            }
            Self::Transfer {
                handle,
                len,
                reason,
            } => {
                write!(f, "transfer of {len} bytes at {handle} failed: {reason}")
            }
            Self::Fence { reason } => write!(f, "fence failed: {reason}"),
            Self::IndexOutOfRange { index, len } => {
                write!(f, "index {index} out of range for length {len}")
            }
            Self::InvalidArgument { reason } => write!(f, "invalid argument: {reason}"),
            Self::InvalidState { reason } => write!(f, "invalid state: {reason}"),
        }
    }
}

impl Error for GlobalError {}
