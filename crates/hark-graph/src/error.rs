//! Errors from assembling or validating a leaf graph.

use std::error::Error;
use std::fmt;

use hark_arena::ArenaError;

/// Structural problems with leaf-graph tables.
#[derive(Clone, Debug, PartialEq)]
pub enum GraphError {
    /// A graph needs at least the reserved leaf 0.
    NoLeafs,
    /// A table does not have the length implied by the leaf count.
    SizeMismatch {
        /// Which table (`"distances"`, `"directions"`, `"offsets"`).
        table: &'static str,
        /// Expected number of entries.
        expected: usize,
        /// Actual number of entries.
        actual: usize,
    },
    /// `distance[i][j] != distance[j][i]`.
    AsymmetricDistance {
        /// Row.
        i: usize,
        /// Column.
        j: usize,
    },
    /// A distance is negative or NaN.
    InvalidDistance {
        /// Row.
        i: usize,
        /// Column.
        j: usize,
    },
    /// A direction is neither the invalid marker nor close to unit length.
    InvalidDirection {
        /// Row.
        i: usize,
        /// Column.
        j: usize,
        /// Length of the stored vector.
        length: f32,
    },
    /// An adjacency offset does not point at the end of the previous list.
    InvalidOffset {
        /// Leaf whose offset is wrong.
        leaf: usize,
        /// Stored offset.
        offset: usize,
    },
    /// An adjacency list entry lies outside `[1, N)`.
    InvalidListEntry {
        /// Leaf whose list holds the entry.
        leaf: usize,
        /// The out-of-range entry.
        entry: usize,
    },
    /// An adjacency list is not strictly increasing.
    UnsortedList {
        /// Leaf whose list holds the entry.
        leaf: usize,
        /// The entry that is not above its predecessor.
        entry: usize,
    },
    /// An adjacency list does not hold every finite-distance neighbour.
    IncompleteList {
        /// Leaf whose list is wrong.
        leaf: usize,
        /// Number of finite-distance neighbours.
        expected: usize,
        /// Stored list length.
        actual: usize,
    },
    /// The list buffer is longer or shorter than its lists.
    ListSizeMismatch {
        /// Size implied by walking the lists.
        expected: usize,
        /// Size of the buffer.
        actual: usize,
    },
    /// A value does not fit the graph's index type.
    IndexOverflow {
        /// The value that did not fit.
        value: usize,
        /// Name of the index type.
        index_type: &'static str,
    },
    /// Table storage could not be allocated.
    Allocation(ArenaError),
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoLeafs => write!(f, "leaf graph needs at least one leaf"),
            Self::SizeMismatch {
                table,
                expected,
                actual,
            } => write!(f, "{table} table has {actual} entries, expected {expected}"),
            Self::AsymmetricDistance { i, j } => {
                write!(f, "distance ({i}, {j}) differs from ({j}, {i})")
            }
            Self::InvalidDistance { i, j } => write!(f, "distance ({i}, {j}) is negative or NaN"),
            Self::InvalidDirection { i, j, length } => {
                write!(f, "direction ({i}, {j}) has length {length}")
            }
            Self::InvalidOffset { leaf, offset } => {
                write!(f, "adjacency offset {offset} of leaf {leaf} is inconsistent")
            }
            Self::InvalidListEntry { leaf, entry } => {
                write!(f, "adjacency list of leaf {leaf} holds invalid leaf {entry}")
            }
            Self::UnsortedList { leaf, entry } => {
                write!(f, "adjacency list of leaf {leaf} is out of order at {entry}")
            }
            Self::IncompleteList {
                leaf,
                expected,
                actual,
            } => write!(
                f,
                "adjacency list of leaf {leaf} has {actual} entries, expected {expected}"
            ),
            Self::ListSizeMismatch { expected, actual } => {
                write!(f, "list buffer has {actual} entries, lists need {expected}")
            }
            Self::IndexOverflow { value, index_type } => {
                write!(f, "value {value} does not fit index type {index_type}")
            }
            Self::Allocation(e) => write!(f, "graph allocation failed: {e}"),
        }
    }
}

impl Error for GraphError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Allocation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ArenaError> for GraphError {
    fn from(e: ArenaError) -> Self {
        Self::Allocation(e)
    }
}
