//! Strongly-typed leaf identifier.

use std::fmt;

/// Identifies a leaf (atomic spatial partition) of the loaded map.
///
/// Valid leaves lie in `[1, N)` where `N` is the map's leaf count.
/// `LeafId(0)` is reserved: it is what point lookups return for points in
/// solid space, and its adjacency list is always empty.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LeafId(pub u32);

impl LeafId {
    /// The reserved invalid leaf.
    pub const INVALID: LeafId = LeafId(0);

    /// Index of this leaf in flat tables.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Whether this leaf is a real leaf of a map with `num_leafs` leaves.
    #[inline]
    pub fn is_valid_for(self, num_leafs: usize) -> bool {
        self.0 != 0 && (self.0 as usize) < num_leafs
    }
}

impl fmt::Display for LeafId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for LeafId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}
