//! Task-local edge weights over a shared graph.
//!
//! The table builder steers repeated searches away from routes it already
//! found by scaling the weights of their edges. [`WeightedView`] keeps those
//! adjusted weights in a small per-task overlay instead of copying the
//! `N × N` distance table; the underlying [`LeafGraph`] stays shared and
//! untouched.

use indexmap::IndexMap;

use hark_core::{GraphIndex, GraphScalar};

use crate::graph::LeafGraph;

/// A graph handle plus overridden edge weights.
#[derive(Clone, Debug)]
pub struct WeightedView<D: GraphScalar = f64, O: GraphIndex = u32> {
    graph: LeafGraph<D, O>,
    overlay: IndexMap<(u32, u32), f64>,
}

impl<D: GraphScalar, O: GraphIndex> WeightedView<D, O> {
    /// View `graph` with its original weights.
    pub fn new(graph: LeafGraph<D, O>) -> Self {
        Self {
            graph,
            overlay: IndexMap::new(),
        }
    }

    /// The underlying graph.
    #[inline]
    pub fn graph(&self) -> &LeafGraph<D, O> {
        &self.graph
    }

    /// Current weight of the edge between `i` and `j`.
    #[inline]
    pub fn weight(&self, i: usize, j: usize) -> f64 {
        match self.overlay.get(&edge_key(i, j)) {
            Some(&w) => w,
            None => self.graph.distance(i, j).to_f64(),
        }
    }

    /// Multiply the current weight of edge `(i, j)` by `factor`. Both
    /// directions of the edge are affected.
    pub fn scale_edge(&mut self, i: usize, j: usize, factor: f64) {
        let scaled = self.weight(i, j) * factor;
        self.overlay.insert(edge_key(i, j), scaled);
    }

    /// Restore all original weights.
    pub fn clear(&mut self) {
        self.overlay.clear();
    }

    /// Number of edges with overridden weights.
    pub fn overridden(&self) -> usize {
        self.overlay.len()
    }
}

fn edge_key(i: usize, j: usize) -> (u32, u32) {
    let (lo, hi) = if i <= j { (i, j) } else { (j, i) };
    (lo as u32, hi as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hark_core::Vec3;

    fn pair_graph() -> LeafGraph<f64, u32> {
        let n = 3;
        let mut dist = vec![f64::INFINITY; n * n];
        dist[n + 2] = 7.0;
        dist[2 * n + 1] = 7.0;
        let mut dir = vec![Vec3::INVALID; n * n];
        dir[n + 2] = Vec3::new(1.0, 0.0, 0.0);
        dir[2 * n + 1] = Vec3::new(-1.0, 0.0, 0.0);
        LeafGraph::from_tables(n, dist, dir).unwrap()
    }

    #[test]
    fn unscaled_weight_is_graph_distance() {
        let view = WeightedView::new(pair_graph());
        assert_eq!(view.weight(1, 2), 7.0);
        assert_eq!(view.weight(2, 1), 7.0);
        assert!(view.weight(0, 1).is_infinite());
    }

    #[test]
    fn scaling_compounds_and_is_symmetric() {
        let mut view = WeightedView::new(pair_graph());
        view.scale_edge(1, 2, 3.0);
        assert_eq!(view.weight(2, 1), 21.0);
        view.scale_edge(2, 1, 3.0);
        assert_eq!(view.weight(1, 2), 63.0);
        assert_eq!(view.overridden(), 1);
    }

    #[test]
    fn clear_restores_and_leaves_graph_untouched() {
        let graph = pair_graph();
        let mut view = WeightedView::new(graph.clone());
        view.scale_edge(1, 2, 3.0);
        view.clear();
        assert_eq!(view.weight(1, 2), 7.0);
        assert_eq!(graph.distance(1, 2), 7.0);
    }
}
