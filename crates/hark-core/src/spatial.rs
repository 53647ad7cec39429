//! The boundary to the map collision/visibility system.
//!
//! [`SpatialQuery`] is consumed, never implemented, by the engine crates.
//! Production code implements it over the loaded map's BSP; tests use the
//! grid mock from `hark-test-utils`.

use crate::id::LeafId;
use crate::math::{Aabb, Vec3};

/// Outcome of a solid-world raycast.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TraceResult {
    /// Fraction of the segment travelled before hitting solid, in `[0, 1]`.
    /// `1.0` means the segment is unobstructed.
    pub fraction: f32,
    /// Point where the trace stopped.
    pub end_pos: Vec3,
    /// Surface normal at the hit point (zero when nothing was hit).
    pub normal: Vec3,
}

impl TraceResult {
    /// An unobstructed trace ending at `end`.
    pub fn clear(end: Vec3) -> Self {
        Self {
            fraction: 1.0,
            end_pos: end,
            normal: Vec3::ZERO,
        }
    }

    /// Whether the trace reached its destination.
    #[inline]
    pub fn is_clear(&self) -> bool {
        self.fraction >= 1.0
    }
}

/// Read-only spatial queries against the loaded map.
///
/// `Send + Sync` is required because graph construction samples raycasts
/// from several worker threads at once.
pub trait SpatialQuery: Send + Sync {
    /// Total leaf count `N`, including the reserved leaf 0.
    fn num_leafs(&self) -> usize;

    /// Bounds of a leaf.
    fn leaf_bounds(&self, leaf: LeafId) -> Aabb;

    /// Leaf containing `point`, or [`LeafId::INVALID`] for solid space.
    fn point_leaf(&self, point: Vec3) -> LeafId;

    /// Potentially-visible-set test between two leaves.
    fn leafs_in_pvs(&self, a: LeafId, b: LeafId) -> bool;

    /// Trace a segment against solid world geometry.
    fn trace_solid(&self, from: Vec3, to: Vec3) -> TraceResult;
}
