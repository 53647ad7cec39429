//! Influx directions: where sound arrives from at the end of a path.
//!
//! A chain `c0, c1, .., cm` rooted at a listener leaf `c0` contributes the
//! weighted sum of the edge directions `c_k → c_{k+1}`, with weights
//! `1/(k+1)² + 0.25`. Edges close to the listener dominate, but the far end
//! of the path still pulls the direction slightly.

use hark_core::{GraphIndex, GraphScalar, LeafId, Vec3};
use hark_graph::LeafGraph;

/// Contributions an accumulator accepts before ignoring further ones.
pub const MAX_INFLUX_CONTRIBUTIONS: usize = 5;

/// Floor of the per-edge weight.
const WEIGHT_FLOOR: f32 = 0.25;

/// Weight of the `k`-th edge from the listener.
pub fn edge_weight(k: usize) -> f32 {
    let r = (k + 1) as f32;
    1.0 / (r * r) + WEIGHT_FLOOR
}

/// Unit influx direction of `chain`, or `None` if it has no usable edge.
pub fn chain_influx<D: GraphScalar, O: GraphIndex>(
    graph: &LeafGraph<D, O>,
    chain: &[LeafId],
) -> Option<Vec3> {
    let mut sum = Vec3::ZERO;
    for (k, edge) in chain.windows(2).enumerate() {
        let dir = graph.direction(edge[0].index(), edge[1].index());
        if dir.is_finite() {
            sum += dir * edge_weight(k);
        }
    }
    sum.try_normalize()
}

/// Sum of at most [`MAX_INFLUX_CONTRIBUTIONS`] unit directions.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InfluxAccumulator {
    sum: Vec3,
    count: usize,
}

impl InfluxAccumulator {
    /// Add a direction. Returns `false` if it was ignored because the
    /// accumulator is full or the direction is not finite.
    pub fn add(&mut self, direction: Vec3) -> bool {
        if self.count >= MAX_INFLUX_CONTRIBUTIONS || !direction.is_finite() {
            return false;
        }
        self.sum += direction;
        self.count += 1;
        true
    }

    /// Contributions accepted so far.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Averaged unit direction, if any contribution was accepted and they
    /// did not cancel out.
    pub fn direction(&self) -> Option<Vec3> {
        if self.count == 0 {
            return None;
        }
        self.sum.try_normalize()
    }
}
