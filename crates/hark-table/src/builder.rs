//! Parallel propagation table construction.
//!
//! Pairs joined by a graph edge are marked direct without searching. Every
//! other pair gets up to `max_rounds` bidirectional searches. After each
//! round the edges of the found route are made more expensive in the task's
//! private [`WeightedView`], so the next round tends to find a different
//! route; a round is kept only while it stays close to the previous one.
//! Each kept round votes on the arrival direction at both ends. A reachable
//! pair always gets an indirect entry: when the votes yield no direction,
//! the first hop of the shortest route is used, then the negated direction
//! of the other end, then [`UNKNOWN_INFLUX`].
//!
//! Rows `[1, N)` are split into ranges of equal pair workload, one task per
//! range. A task owns all pairs `(i, j)` with `i` in its range and `j > i`,
//! and returns them as a block the builder copies into the table.

use std::time::Instant;

use hark_core::{BuildError, GraphIndex, GraphScalar, LeafId, Vec3};
use hark_exec::{pair_workload, partition_triangular, run_partitioned, ParallelHost, ProgressCounter};
use hark_graph::{LeafGraph, PathFinder, PathResult, WeightedView};

use crate::config::TableBuildConfig;
use crate::influx::{chain_influx, InfluxAccumulator};
use crate::props::PropagationProps;
use crate::table::PropagationTable;

/// Arrival direction stored at the first end of a reachable pair whose
/// route carries no usable direction at all. The other end gets its
/// negation.
pub const UNKNOWN_INFLUX: Vec3 = Vec3::new(0.0, 0.0, 1.0);

/// A finished table and how it was built.
#[derive(Debug)]
pub struct TableBuild {
    /// The table.
    pub table: PropagationTable,
    /// Parallel tasks used.
    pub tasks: usize,
    /// Path searches run.
    pub searches: u64,
    /// Whether allocation failed and the table is the placeholder.
    pub degraded: bool,
}

/// Properties of both directions of one resolved pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PairProps {
    /// Entry `(a, b)`: sound heard at `a` coming from `b`.
    pub forward: PropagationProps,
    /// Entry `(b, a)`.
    pub backward: PropagationProps,
}

struct TableBlock {
    entries: Vec<(u32, u32, PairProps)>,
    searches: u64,
}

/// Builds [`PropagationTable`]s from leaf graphs.
#[derive(Clone, Debug, Default)]
pub struct TableBuilder {
    config: TableBuildConfig,
}

impl TableBuilder {
    /// Builder with `config`.
    pub fn new(config: TableBuildConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    pub fn config(&self) -> &TableBuildConfig {
        &self.config
    }

    /// Fill a table for every leaf pair of `graph`.
    ///
    /// Allocation failure is not an error: the placeholder table is
    /// returned with `degraded` set.
    pub fn build<O: GraphIndex>(&self, graph: &LeafGraph<f64, O>) -> Result<TableBuild, BuildError> {
        let started = Instant::now();
        let n = graph.num_leafs();

        let mut table = match PropagationTable::new(n) {
            Ok(table) => table,
            Err(e) => {
                tracing::warn!(num_leafs = n, error = %e, "propagation table allocation failed, using placeholder");
                return Ok(TableBuild {
                    table: PropagationTable::dummy(),
                    tasks: 0,
                    searches: 0,
                    degraded: true,
                });
            }
        };

        let task_count = self
            .config
            .task_count
            .unwrap_or_else(ParallelHost::<()>::suggest_task_count);
        let ranges = partition_triangular(1, n, task_count);
        let tasks = ranges.len();
        let mut searches = 0;

        if !ranges.is_empty() {
            let progress = ProgressCounter::new("table", pair_workload(1, n, n));
            let blocks = run_partitioned("hark-table", ranges, |rows| {
                let view = WeightedView::new(graph.clone());
                let config = self.config.clone();
                let mut reporter = progress.reporter();
                move || {
                    let mut finder = PathFinder::new(n);
                    let mut view = view;
                    let mut entries = Vec::new();
                    for i in rows {
                        for j in i + 1..n {
                            let (a, b) = (LeafId(i as u32), LeafId(j as u32));
                            if let Some(pair) = resolve_pair(&config, &mut view, &mut finder, a, b) {
                                entries.push((a.0, b.0, pair));
                            }
                        }
                        reporter.advance((n - 1 - i) as u64);
                    }
                    TableBlock {
                        entries,
                        searches: finder.searches(),
                    }
                }
            })?;

            for (_, block) in blocks {
                searches += block.searches;
                for (i, j, pair) in block.entries {
                    table.set(i as usize, j as usize, pair.forward);
                    table.set(j as usize, i as usize, pair.backward);
                }
            }
        }

        debug_assert!(table.validate().is_ok(), "{:?}", table.validate());
        debug_assert!(
            table.validate_reachability(graph).is_ok(),
            "{:?}",
            table.validate_reachability(graph)
        );

        let (direct, indirect) = table.path_counts();
        tracing::info!(
            num_leafs = n,
            direct,
            indirect,
            tasks,
            searches,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "propagation table built"
        );
        Ok(TableBuild {
            table,
            tasks,
            searches,
            degraded: false,
        })
    }
}

/// Resolve one unordered pair `a < b`.
///
/// Returns `None` when neither a direct edge nor any route connects them.
pub fn resolve_pair<O: GraphIndex>(
    config: &TableBuildConfig,
    view: &mut WeightedView<f64, O>,
    finder: &mut PathFinder,
    a: LeafId,
    b: LeafId,
) -> Option<PairProps> {
    if view.graph().has_edge(a.index(), b.index()) {
        return Some(PairProps {
            forward: PropagationProps::DIRECT,
            backward: PropagationProps::DIRECT,
        });
    }

    let mut at_a = InfluxAccumulator::default();
    let mut at_b = InfluxAccumulator::default();
    let mut previous: Option<f64> = None;
    let mut shortest = f64::INFINITY;
    let mut first_chains: Option<(Vec<LeafId>, Vec<LeafId>)> = None;

    for round in 0..config.max_rounds {
        let Some(path) = finder.search(view, a, b) else {
            break;
        };
        let distance = path.distance();
        if previous.is_some_and(|p| !config.accepts(p, distance)) {
            break;
        }
        previous = Some(distance);
        shortest = shortest.min(distance);

        let (from_a, from_b) = endpoint_chains(&path);
        if let Some(dir) = chain_influx(view.graph(), &from_a) {
            at_a.add(dir);
        }
        if let Some(dir) = chain_influx(view.graph(), &from_b) {
            at_b.add(dir);
        }
        first_chains.get_or_insert((from_a, from_b));

        if round + 1 < config.max_rounds {
            for chain in [path.direct_chain(), path.reverse_chain()] {
                for edge in chain.windows(2) {
                    view.scale_edge(edge[0].index(), edge[1].index(), config.detour_factor);
                }
            }
        }
    }
    view.clear();

    let (Some((from_a, from_b)), true) = (first_chains, shortest.is_finite()) else {
        return None;
    };
    let graph = view.graph();
    let dir_a = at_a.direction().or_else(|| hop_direction(graph, &from_a));
    let dir_b = at_b.direction().or_else(|| hop_direction(graph, &from_b));
    let (dir_a, dir_b) = match (dir_a, dir_b) {
        (Some(da), Some(db)) => (da, db),
        (Some(da), None) => (da, -da),
        (None, Some(db)) => (-db, db),
        (None, None) => {
            tracing::debug!(%a, %b, "no usable influx direction, using fallback");
            (UNKNOWN_INFLUX, -UNKNOWN_INFLUX)
        }
    };
    let distance = shortest as f32;
    Some(PairProps {
        forward: PropagationProps::indirect(dir_a, distance),
        backward: PropagationProps::indirect(dir_b, distance),
    })
}

/// Direction of the first hop of `chain`, taken from the edge itself or
/// else from the negated reverse edge.
fn hop_direction<D: GraphScalar, O: GraphIndex>(
    graph: &LeafGraph<D, O>,
    chain: &[LeafId],
) -> Option<Vec3> {
    let [from, to, ..] = chain else {
        return None;
    };
    let (i, j) = (from.index(), to.index());
    graph
        .direction(i, j)
        .try_normalize()
        .or_else(|| graph.direction(j, i).try_normalize().map(|d| -d))
}

/// Chains rooted at each endpoint. A half that is only its root borrows
/// the full path from that endpoint.
fn endpoint_chains(path: &PathResult) -> (Vec<LeafId>, Vec<LeafId>) {
    let full = path.path();
    let from_a = if path.direct_chain().len() > 1 {
        path.direct_chain().to_vec()
    } else {
        full.clone()
    };
    let from_b = if path.reverse_chain().len() > 1 {
        path.reverse_chain().to_vec()
    } else {
        full.into_iter().rev().collect()
    };
    (from_a, from_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::DIRECTION_LENGTH_RANGE;
    use hark_test_utils::fixtures::{chain_graph, graph_from_points, random_graph};

    fn wide<O: GraphIndex>(g: &LeafGraph<f32, O>) -> LeafGraph<f64, O> {
        LeafGraph::try_adopt(g).unwrap()
    }

    fn builder(tasks: usize) -> TableBuilder {
        TableBuilder::new(TableBuildConfig {
            task_count: Some(tasks),
            ..Default::default()
        })
    }

    // ── Single pairs ─────────────────────────────────────────

    #[test]
    fn direct_edge_needs_no_search() {
        let g = wide(&chain_graph(3, 10.0));
        let mut view = WeightedView::new(g);
        let mut finder = PathFinder::new(4);
        let cfg = TableBuildConfig::default();
        let pair = resolve_pair(&cfg, &mut view, &mut finder, LeafId(1), LeafId(2)).unwrap();
        assert!(pair.forward.has_direct_path());
        assert!(pair.backward.has_direct_path());
        assert_eq!(finder.searches(), 0);
    }

    #[test]
    fn chain_ends_hear_each_other_indirectly() {
        let g = wide(&chain_graph(5, 10.0));
        let mut view = WeightedView::new(g);
        let mut finder = PathFinder::new(6);
        let cfg = TableBuildConfig::default();
        let pair = resolve_pair(&cfg, &mut view, &mut finder, LeafId(1), LeafId(5)).unwrap();

        assert!(pair.forward.has_indirect_path());
        assert!(!pair.forward.has_direct_path());
        // 40 units, quantized to the nearest 16.
        assert_eq!(pair.forward.distance(), 48.0);
        assert_eq!(pair.forward.quantized_distance(), pair.backward.quantized_distance());
        // At leaf 1 sound arrives from leaf 2 (+x); at leaf 5 from leaf 4 (-x).
        assert!(pair.forward.direction().x > 0.99);
        assert!(pair.backward.direction().x < -0.99);
        assert_eq!(view.overridden(), 0);
    }

    #[test]
    fn later_rounds_on_a_chain_are_rejected() {
        // Scaling the only route triples it, so only round one is kept,
        // and the second search is the last.
        let g = wide(&chain_graph(4, 10.0));
        let mut view = WeightedView::new(g);
        let mut finder = PathFinder::new(5);
        let cfg = TableBuildConfig::default();
        resolve_pair(&cfg, &mut view, &mut finder, LeafId(1), LeafId(4)).unwrap();
        assert_eq!(finder.searches(), 2);
    }

    #[test]
    fn near_equal_routes_both_vote() {
        // Square 1-2-4 / 1-3-4 with 2 above and 3 beside: both routes are
        // equally long, so both rounds are accepted and the direction at
        // leaf 1 lies between them.
        let points = [
            Vec3::ZERO,
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 100.0, 0.0),
            Vec3::new(100.0, 0.0, 0.0),
            Vec3::new(100.0, 100.0, 0.0),
        ];
        let g = wide(&graph_from_points(&points, &[(1, 2), (2, 4), (1, 3), (3, 4)]));
        let mut view = WeightedView::new(g);
        let mut finder = PathFinder::new(5);
        let cfg = TableBuildConfig::default();
        let pair = resolve_pair(&cfg, &mut view, &mut finder, LeafId(1), LeafId(4)).unwrap();
        let d = pair.forward.direction();
        assert!(d.x > 0.5 && d.y > 0.5, "{d:?}");
        assert_eq!(pair.forward.distance(), 208.0);
    }

    #[test]
    fn route_without_directions_still_connects() {
        // Chain 1-2-3 whose edges carry no direction at all.
        let n = 4;
        let mut dist = vec![f64::INFINITY; n * n];
        for (i, j) in [(1, 2), (2, 3)] {
            dist[i * n + j] = 10.0;
            dist[j * n + i] = 10.0;
        }
        let g = LeafGraph::<f64, u32>::from_tables(n, dist, vec![Vec3::INVALID; n * n]).unwrap();
        let built = builder(1).build(&g).unwrap();
        let t = &built.table;

        assert!(t.has_indirect_path(LeafId(1), LeafId(3)));
        assert!(t.has_indirect_path(LeafId(3), LeafId(1)));
        let forward = t.indirect_path_props(LeafId(1), LeafId(3)).unwrap();
        let backward = t.indirect_path_props(LeafId(3), LeafId(1)).unwrap();
        assert!(DIRECTION_LENGTH_RANGE.contains(&forward.direction.length()));
        assert_eq!(forward.direction, UNKNOWN_INFLUX);
        assert_eq!(backward.direction, -UNKNOWN_INFLUX);
        assert_eq!(forward.distance, 16.0);
        assert!(t.validate().is_ok());
        assert_eq!(t.validate_reachability(&g), Ok(()));
    }

    #[test]
    fn one_sided_directions_fill_the_other_end() {
        // Only 2 → 1 carries a direction; leaf 1 hears along its negation
        // and leaf 3 along the opposite.
        let n = 4;
        let mut dist = vec![f64::INFINITY; n * n];
        for (i, j) in [(1, 2), (2, 3)] {
            dist[i * n + j] = 10.0;
            dist[j * n + i] = 10.0;
        }
        let mut dir = vec![Vec3::INVALID; n * n];
        dir[2 * n + 1] = Vec3::new(-1.0, 0.0, 0.0);
        let g = LeafGraph::<f64, u32>::from_tables(n, dist, dir).unwrap();
        let mut view = WeightedView::new(g);
        let mut finder = PathFinder::new(n);
        let cfg = TableBuildConfig::default();
        let pair = resolve_pair(&cfg, &mut view, &mut finder, LeafId(1), LeafId(3)).unwrap();
        assert_eq!(pair.forward.direction().x.signum(), 1.0);
        assert_eq!(pair.backward.direction().x.signum(), -1.0);
    }

    #[test]
    fn disconnected_pair_is_unresolved() {
        let points = [Vec3::ZERO, Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), Vec3::new(50.0, 0.0, 0.0)];
        let g = wide(&graph_from_points(&points, &[(1, 2)]));
        let mut view = WeightedView::new(g);
        let mut finder = PathFinder::new(4);
        let cfg = TableBuildConfig::default();
        assert!(resolve_pair(&cfg, &mut view, &mut finder, LeafId(1), LeafId(3)).is_none());
    }

    // ── Full build ───────────────────────────────────────────

    #[test]
    fn build_chain_table() {
        let g = wide(&chain_graph(5, 10.0));
        let built = builder(2).build(&g).unwrap();
        let t = &built.table;
        assert!(!built.degraded);
        assert!(t.validate().is_ok());
        assert!(t.has_direct_path(LeafId(2), LeafId(3)));
        assert!(t.has_indirect_path(LeafId(1), LeafId(3)));
        let p = t.indirect_path_props(LeafId(1), LeafId(5)).unwrap();
        assert_eq!(p.distance, 48.0);
        assert!(p.direction.x > 0.99);
        // 4 direct edges and 6 indirect pairs, both directions.
        assert_eq!(t.path_counts(), (8, 12));
    }

    #[test]
    fn table_is_independent_of_task_count() {
        let g = wide(&random_graph(24, 0.12, 3));
        let one = builder(1).build(&g).unwrap();
        let many = builder(5).build(&g).unwrap();
        assert_eq!(one.table, many.table);
        assert_eq!(one.searches, many.searches);
        assert!(many.tasks > 1);
    }

    #[test]
    fn tiny_maps_build_empty_tables() {
        let g = LeafGraph::<f64, u32>::try_adopt(&chain_graph(1, 10.0)).unwrap();
        let built = builder(2).build(&g).unwrap();
        assert_eq!(built.table.num_leafs(), 2);
        assert_eq!(built.table.path_counts(), (0, 0));
        assert_eq!(built.tasks, 1);
    }
}
