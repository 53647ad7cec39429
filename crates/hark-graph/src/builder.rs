//! Leaf graph construction from spatial queries.
//!
//! For every ordered leaf pair the builder decides whether sound travels
//! directly from one to the other. Pairs outside each other's PVS are
//! rejected without tracing. Otherwise a center-to-center ray (weight 3) and
//! a number of rays between random interior points (weight 1 each) are
//! traced; the clear ones vote on the averaged travel direction. Both
//! directions of a pair are sampled separately, so `direction[j][i]` is
//! only roughly the negation of `direction[i][j]`. A pair with no clear ray
//! either way has no edge; the distance is the symmetric center-to-center
//! distance.
//!
//! Rows are split across parallel tasks by workload. Row `i` draws its
//! samples from two generators, one for `(i, j)` seeded with `seed ^ i` and
//! one for `(j, i)` seeded with `seed ^ i ^ REVERSE_SALT`, so the graph does
//! not depend on how rows were partitioned.

use std::ops::Range;
use std::sync::Arc;
use std::time::Instant;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use hark_arena::try_vec;
use hark_core::{Aabb, BuildError, GraphIndex, GraphScalar, LeafId, SpatialQuery, Vec3};
use hark_exec::{
    pair_workload, partition_triangular, run_partitioned, ParallelHost, ProgressCounter,
    ProgressReporter,
};

use crate::config::GraphBuildConfig;
use crate::error::GraphError;
use crate::graph::LeafGraph;

/// Weight of the center-to-center ray in the direction vote.
const CENTER_RAY_WEIGHT: f32 = 3.0;

/// Attempts to draw a random point that lies inside its own leaf.
const POINT_ATTEMPTS: usize = 6;

/// Separates the seeds of the reverse-direction generators from the
/// forward ones.
const REVERSE_SALT: u64 = 1 << 63;

/// A sampled direct edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge {
    /// Center-to-center distance.
    pub distance: f32,
    /// Averaged unit direction from the first leaf toward the second, or
    /// [`Vec3::INVALID`] if the clear rays cancelled out.
    pub direction: Vec3,
}

/// A freshly built graph and how it was built.
#[derive(Debug)]
pub struct GraphBuild<D: GraphScalar, O: GraphIndex> {
    /// The graph.
    pub graph: LeafGraph<D, O>,
    /// Parallel tasks that sampled edges.
    pub tasks: usize,
    /// Leaf pairs examined.
    pub pairs: u64,
}

/// Both sampled directions of one unordered pair `i < j`.
#[derive(Clone, Copy, Debug, PartialEq)]
struct PairEdge {
    distance: f32,
    forward: Vec3,
    backward: Vec3,
}

type EdgeBlock = Vec<(u32, u32, PairEdge)>;

/// Builds [`LeafGraph`]s from a [`SpatialQuery`].
pub struct GraphBuilder {
    spatial: Arc<dyn SpatialQuery>,
    config: GraphBuildConfig,
}

impl GraphBuilder {
    /// Builder over `spatial`.
    pub fn new(spatial: Arc<dyn SpatialQuery>, config: GraphBuildConfig) -> Self {
        Self { spatial, config }
    }

    /// The configuration in use.
    pub fn config(&self) -> &GraphBuildConfig {
        &self.config
    }

    /// Sample the edge from leaf `i` toward leaf `j`.
    pub fn compute_edge(&self, i: LeafId, j: LeafId, rng: &mut ChaCha8Rng) -> Option<Edge> {
        let samples = self.config.samples_for(self.spatial.num_leafs());
        sample_edge(
            self.spatial.as_ref(),
            (i, self.spatial.leaf_bounds(i)),
            (j, self.spatial.leaf_bounds(j)),
            samples,
            rng,
        )
    }

    /// Reuse a graph already built at another precision.
    pub fn try_reuse<D, O, D2, O2>(source: &LeafGraph<D2, O2>) -> Option<LeafGraph<D, O>>
    where
        D: GraphScalar,
        O: GraphIndex,
        D2: GraphScalar,
        O2: GraphIndex,
    {
        LeafGraph::try_adopt(source)
    }

    /// Sample all pairs and assemble the graph, adjacency lists included.
    pub fn build<D: GraphScalar, O: GraphIndex>(&self) -> Result<GraphBuild<D, O>, BuildError> {
        let started = Instant::now();
        let n = self.spatial.num_leafs();
        let (distances, directions, tasks) = self.build_distance_table::<D>()?;
        let graph = LeafGraph::from_tables(n, distances, directions)
            .map_err(|e| graph_failure(n, e))?;

        tracing::info!(
            num_leafs = n,
            edges = graph.edge_count(),
            tasks,
            scalar = D::NAME,
            index = O::NAME,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "leaf graph built"
        );
        Ok(GraphBuild {
            graph,
            tasks,
            pairs: pair_workload(1, n, n),
        })
    }

    /// Sample every ordered pair and return the distance and direction
    /// tables together with the number of tasks used.
    ///
    /// Distances are mirrored. A direction whose own rays cancelled out or
    /// were all blocked falls back to the negated opposite direction.
    pub fn build_distance_table<D: GraphScalar>(
        &self,
    ) -> Result<(Vec<D>, Vec<Vec3>, usize), BuildError> {
        let n = self.spatial.num_leafs();
        if n == 0 || u32::try_from(n).is_err() {
            return Err(BuildError::InvalidLeafCount {
                num_leafs: n,
                reason: "leaf count must lie in [1, u32::MAX]".to_string(),
            });
        }
        let cells = n.checked_mul(n).ok_or(BuildError::InvalidLeafCount {
            num_leafs: n,
            reason: "pair table size overflows".to_string(),
        })?;
        let mut distances = try_vec(cells, D::INFINITY).map_err(alloc_failure)?;
        let mut directions = try_vec(cells, Vec3::INVALID).map_err(alloc_failure)?;

        let task_count = self
            .config
            .task_count
            .unwrap_or_else(ParallelHost::<()>::suggest_task_count);
        let ranges = partition_triangular(1, n, task_count);
        if ranges.is_empty() {
            return Ok((distances, directions, 0));
        }
        let tasks = ranges.len();

        let bounds: Arc<[Aabb]> = (0..n)
            .map(|i| self.spatial.leaf_bounds(LeafId(i as u32)))
            .collect();
        let samples = self.config.samples_for(n);
        let seed = self.config.seed;
        let progress = ProgressCounter::new("graph", pair_workload(1, n, n));

        let blocks = run_partitioned("hark-graph", ranges, |rows| {
            let spatial = Arc::clone(&self.spatial);
            let bounds = Arc::clone(&bounds);
            let reporter = progress.reporter();
            move || sample_rows(spatial.as_ref(), &bounds, rows, samples, seed, reporter)
        })?;

        for (_, block) in blocks {
            for (i, j, edge) in block {
                let (i, j) = (i as usize, j as usize);
                let d = D::from_f64(f64::from(edge.distance));
                distances[i * n + j] = d;
                distances[j * n + i] = d;
                directions[i * n + j] = edge.forward;
                directions[j * n + i] = edge.backward;
            }
        }
        Ok((distances, directions, tasks))
    }
}

fn sample_rows(
    spatial: &dyn SpatialQuery,
    bounds: &[Aabb],
    rows: Range<usize>,
    samples: usize,
    seed: u64,
    mut progress: ProgressReporter,
) -> EdgeBlock {
    let n = bounds.len();
    let mut block = EdgeBlock::new();
    for i in rows {
        let mut forward_rng = ChaCha8Rng::seed_from_u64(seed ^ i as u64);
        let mut backward_rng = ChaCha8Rng::seed_from_u64(seed ^ i as u64 ^ REVERSE_SALT);
        let a = (LeafId(i as u32), bounds[i]);
        for j in i + 1..n {
            let b = (LeafId(j as u32), bounds[j]);
            let forward = sample_edge(spatial, a, b, samples, &mut forward_rng);
            let backward = sample_edge(spatial, b, a, samples, &mut backward_rng);
            if let Some(edge) = pair_edge(forward, backward) {
                block.push((i as u32, j as u32, edge));
            }
        }
        progress.advance((n - 1 - i) as u64);
    }
    block
}

/// Combine the two sampled directions of a pair. A direction that is
/// missing or invalid borrows the negation of the other one.
fn pair_edge(forward: Option<Edge>, backward: Option<Edge>) -> Option<PairEdge> {
    let valid = |e: Option<Edge>| e.map(|e| e.direction).filter(|d| !d.is_invalid_marker());
    let distance = forward.or(backward)?.distance;
    let (f, b) = (valid(forward), valid(backward));
    Some(PairEdge {
        distance,
        forward: f.or(b.map(|d| -d)).unwrap_or(Vec3::INVALID),
        backward: b.or(f.map(|d| -d)).unwrap_or(Vec3::INVALID),
    })
}

fn sample_edge(
    spatial: &dyn SpatialQuery,
    (a, bounds_a): (LeafId, Aabb),
    (b, bounds_b): (LeafId, Aabb),
    samples: usize,
    rng: &mut ChaCha8Rng,
) -> Option<Edge> {
    if !spatial.leafs_in_pvs(a, b) {
        return None;
    }

    let center_a = bounds_a.center();
    let center_b = bounds_b.center();
    let mut sum = Vec3::ZERO;
    let mut clear_rays = 0usize;

    if spatial.trace_solid(center_a, center_b).is_clear() {
        clear_rays += 1;
        if let Some(dir) = (center_b - center_a).try_normalize() {
            sum += dir * CENTER_RAY_WEIGHT;
        }
    }

    for _ in 0..samples {
        let (Some(from), Some(to)) = (
            interior_point(spatial, a, bounds_a, rng),
            interior_point(spatial, b, bounds_b, rng),
        ) else {
            continue;
        };
        if spatial.trace_solid(from, to).is_clear() {
            clear_rays += 1;
            if let Some(dir) = (to - from).try_normalize() {
                sum += dir;
            }
        }
    }

    if clear_rays == 0 {
        return None;
    }
    Some(Edge {
        distance: center_a.distance(center_b),
        direction: sum.try_normalize().unwrap_or(Vec3::INVALID),
    })
}

/// A uniformly drawn point of `bounds` that lies in `leaf`, if one turns
/// up within a few attempts.
fn interior_point(
    spatial: &dyn SpatialQuery,
    leaf: LeafId,
    bounds: Aabb,
    rng: &mut ChaCha8Rng,
) -> Option<Vec3> {
    (0..POINT_ATTEMPTS).find_map(|_| {
        let p = bounds.lerp([rng.random(), rng.random(), rng.random()]);
        (spatial.point_leaf(p) == leaf).then_some(p)
    })
}

fn alloc_failure(e: hark_arena::ArenaError) -> BuildError {
    tracing::warn!(error = %e, "leaf graph allocation failed");
    BuildError::AllocationFailed {
        requested: e.requested_bytes(),
    }
}

fn graph_failure(num_leafs: usize, e: GraphError) -> BuildError {
    match e {
        GraphError::Allocation(a) => alloc_failure(a),
        other => BuildError::InvalidLeafCount {
            num_leafs,
            reason: other.to_string(),
        },
    }
}
