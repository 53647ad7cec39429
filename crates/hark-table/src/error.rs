//! Errors from decoding or validating a propagation table.

use std::error::Error;
use std::fmt;

use hark_arena::ArenaError;

/// Problems with propagation table contents.
#[derive(Clone, Debug, PartialEq)]
pub enum TableError {
    /// A packed entry claims both a direct and an indirect path.
    ConflictingFlags {
        /// The offending packed word.
        bits: u32,
    },
    /// The entry count is not `N²`.
    SizeMismatch {
        /// Expected number of entries.
        expected: usize,
        /// Actual number of entries.
        actual: usize,
    },
    /// `(from, to)` and `(to, from)` disagree on flags or distance.
    Asymmetric {
        /// Source leaf.
        from: u32,
        /// Destination leaf.
        to: u32,
    },
    /// An entry has both flags set.
    NotExclusive {
        /// Source leaf.
        from: u32,
        /// Destination leaf.
        to: u32,
    },
    /// An indirect entry's stored direction is far from unit length.
    DirectionMagnitude {
        /// Source leaf.
        from: u32,
        /// Destination leaf.
        to: u32,
        /// Length of the stored direction.
        length: f32,
    },
    /// Leaves connected in the graph have no path in the table.
    MissingPath {
        /// Source leaf.
        from: u32,
        /// Destination leaf.
        to: u32,
    },
    /// The table's path flags disagree with the graph: a direct entry
    /// without an edge, or an indirect entry for an edge or an unreachable
    /// pair.
    UnexpectedPath {
        /// Source leaf.
        from: u32,
        /// Destination leaf.
        to: u32,
    },
    /// Table storage could not be allocated.
    Allocation(ArenaError),
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConflictingFlags { bits } => {
                write!(f, "packed props {bits:#010x} set both path flags")
            }
            Self::SizeMismatch { expected, actual } => {
                write!(f, "table has {actual} entries, expected {expected}")
            }
            Self::Asymmetric { from, to } => {
                write!(f, "entries ({from}, {to}) and ({to}, {from}) disagree")
            }
            Self::NotExclusive { from, to } => {
                write!(f, "entry ({from}, {to}) is both direct and indirect")
            }
            Self::DirectionMagnitude { from, to, length } => {
                write!(f, "entry ({from}, {to}) direction has length {length}")
            }
            Self::MissingPath { from, to } => {
                write!(f, "leaves {from} and {to} are connected but have no path")
            }
            Self::UnexpectedPath { from, to } => {
                write!(f, "entry ({from}, {to}) does not match the graph")
            }
            Self::Allocation(e) => write!(f, "table allocation failed: {e}"),
        }
    }
}

impl Error for TableError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Allocation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ArenaError> for TableError {
    fn from(e: ArenaError) -> Self {
        Self::Allocation(e)
    }
}
