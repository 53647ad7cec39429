//! Map identity and cache keys.
//!
//! A cached propagation artifact is reusable only for the exact map it
//! was computed for. The identity is the triple `(name, checksum, leaf
//! count)`; any difference invalidates the cache.

use std::fmt;

/// FNV-1a offset basis for 64-bit.
const FNV_OFFSET: u64 = 0xcbf29ce484222325;
/// FNV-1a prime for 64-bit.
const FNV_PRIME: u64 = 0x00000100000001B3;

/// Name and content checksum of a loaded map.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MapIdentity {
    /// Map name as given by the loader (may include a path and extension).
    pub name: String,
    /// Checksum of the map file contents.
    pub checksum: u32,
}

impl MapIdentity {
    /// Create a map identity.
    pub fn new(name: impl Into<String>, checksum: u32) -> Self {
        Self {
            name: name.into(),
            checksum,
        }
    }
}

/// Key deciding whether an on-disk or in-memory artifact is reusable.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Map name.
    pub map_name: String,
    /// Map content checksum.
    pub checksum: u32,
    /// Leaf count of the map.
    pub num_leafs: u32,
}

impl CacheKey {
    /// Build a key for `map` with `num_leafs` leaves.
    pub fn new(map: &MapIdentity, num_leafs: u32) -> Self {
        Self {
            map_name: map.name.clone(),
            checksum: map.checksum,
            num_leafs,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (checksum={:#010x}, leafs={})",
            self.map_name, self.checksum, self.num_leafs
        )
    }
}

/// Compute a 32-bit content checksum for map data.
///
/// FNV-1a over the bytes, with the 64-bit state folded to 32 bits.
/// Not cryptographic; only used to notice that a map file changed.
pub fn map_checksum(bytes: &[u8]) -> u32 {
    let mut hash = FNV_OFFSET;
    for &b in bytes {
        hash = (hash ^ b as u64).wrapping_mul(FNV_PRIME);
    }
    ((hash >> 32) ^ hash) as u32
}
