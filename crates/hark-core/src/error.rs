//! Error type shared by the graph and table builders.

use std::error::Error;
use std::fmt;

/// Errors that abort a graph or table build.
///
/// Builders absorb recoverable failures themselves (sampling failures,
/// single tasks that could not be started); what reaches the caller is
/// either a hard failure or an allocation failure the engine degrades on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BuildError {
    /// Not a single parallel task could be created.
    NoTasks,
    /// A table allocation could not be satisfied.
    AllocationFailed {
        /// Number of bytes requested.
        requested: usize,
    },
    /// The map reported a leaf count the builder cannot handle.
    InvalidLeafCount {
        /// The reported leaf count.
        num_leafs: usize,
        /// Human-readable description of the limit.
        reason: String,
    },
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoTasks => write!(f, "no parallel task could be created"),
            Self::AllocationFailed { requested } => {
                write!(f, "allocation of {requested} bytes failed")
            }
            Self::InvalidLeafCount { num_leafs, reason } => {
                write!(f, "invalid leaf count {num_leafs}: {reason}")
            }
        }
    }
}

impl Error for BuildError {}
