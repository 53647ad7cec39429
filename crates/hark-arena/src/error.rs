//! Arena-specific error types.

use std::error::Error;
use std::fmt;

/// Errors that can occur while allocating table storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// The requested element count overflows the addressable byte size.
    SizeOverflow {
        /// Number of elements requested.
        elements: usize,
        /// Size of one element in bytes.
        element_bytes: usize,
    },
    /// The allocator could not satisfy the request.
    AllocationFailed {
        /// Number of bytes requested.
        requested: usize,
    },
}

impl ArenaError {
    /// Bytes the failed request asked for (saturating on overflow).
    pub fn requested_bytes(&self) -> usize {
        match self {
            Self::SizeOverflow {
                elements,
                element_bytes,
            } => elements.saturating_mul(*element_bytes),
            Self::AllocationFailed { requested } => *requested,
        }
    }
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SizeOverflow {
                elements,
                element_bytes,
            } => {
                write!(
                    f,
                    "allocation size overflow: {elements} elements of {element_bytes} bytes"
                )
            }
            Self::AllocationFailed { requested } => {
                write!(f, "allocation of {requested} bytes failed")
            }
        }
    }
}

impl Error for ArenaError {}
