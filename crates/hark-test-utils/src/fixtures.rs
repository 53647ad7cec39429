//! Reusable leaf-graph fixtures.
//!
//! - [`graph_from_points`]: edges between positioned leaves, with true
//!   distances and directions.
//! - [`chain_graph`]: leaves `1..=len` on a line along +x.
//! - [`random_graph`]: seeded random sparse graph for property tests and
//!   benchmarks.
//! - [`floyd_warshall`]: all-pairs reference distances.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use hark_core::{GraphIndex, GraphScalar, Vec3};
use hark_graph::LeafGraph;

/// Graph over leaves placed at `points` (index 0 is the reserved leaf and
/// its position is ignored) with the given undirected edges.
pub fn graph_from_points(points: &[Vec3], edges: &[(u32, u32)]) -> LeafGraph<f32, u32> {
    let n = points.len();
    let mut dist = vec![f32::INFINITY; n * n];
    let mut dir = vec![Vec3::INVALID; n * n];
    for &(i, j) in edges {
        let (i, j) = (i as usize, j as usize);
        let d = points[i].distance(points[j]);
        dist[i * n + j] = d;
        dist[j * n + i] = d;
        if let Some(u) = (points[j] - points[i]).try_normalize() {
            dir[i * n + j] = u;
            dir[j * n + i] = -u;
        }
    }
    LeafGraph::from_tables(n, dist, dir).expect("fixture tables are consistent")
}

/// Leaves `1..=len` at `x = i * spacing`, each linked to the next.
pub fn chain_graph(len: usize, spacing: f32) -> LeafGraph<f32, u32> {
    let points: Vec<Vec3> = (0..=len)
        .map(|i| Vec3::new(i as f32 * spacing, 0.0, 0.0))
        .collect();
    let edges: Vec<(u32, u32)> = (1..len as u32).map(|i| (i, i + 1)).collect();
    graph_from_points(&points, &edges)
}

/// `n` leaves at random positions in a 1000-unit cube, each pair linked
/// with probability `density`.
pub fn random_graph(n: usize, density: f64, seed: u64) -> LeafGraph<f32, u32> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let points: Vec<Vec3> = (0..n)
        .map(|_| {
            Vec3::new(
                rng.random::<f32>() * 1000.0,
                rng.random::<f32>() * 1000.0,
                rng.random::<f32>() * 1000.0,
            )
        })
        .collect();
    let mut edges = Vec::new();
    for i in 1..n as u32 {
        for j in i + 1..n as u32 {
            if rng.random_bool(density) {
                edges.push((i, j));
            }
        }
    }
    graph_from_points(&points, &edges)
}

/// All-pairs shortest distances, row-major. Unreachable pairs are infinite,
/// the diagonal is zero.
pub fn floyd_warshall<D: GraphScalar, O: GraphIndex>(graph: &LeafGraph<D, O>) -> Vec<f64> {
    let n = graph.num_leafs();
    let mut d: Vec<f64> = graph.distances().iter().map(|v| v.to_f64()).collect();
    for i in 0..n {
        d[i * n + i] = 0.0;
    }
    for k in 1..n {
        for i in 1..n {
            let dik = d[i * n + k];
            if dik.is_infinite() {
                continue;
            }
            for j in 1..n {
                let via = dik + d[k * n + j];
                if via < d[i * n + j] {
                    d[i * n + j] = via;
                }
            }
        }
    }
    d
}
