//! Table construction over fixture graphs and grid maps.

use std::sync::Arc;

use hark_core::{LeafId, SpatialQuery};
use hark_graph::{GraphBuildConfig, GraphBuilder, LeafGraph};
use hark_table::table::DIRECTION_LENGTH_RANGE;
use hark_table::{PropagationTable, TableBuildConfig, TableBuilder};
use hark_test_utils::fixtures::{chain_graph, floyd_warshall, random_graph};
use hark_test_utils::GridWorld;

fn table_for(graph: &LeafGraph<f32, u32>, tasks: usize) -> PropagationTable {
    let wide = LeafGraph::<f64, u32>::try_adopt(graph).unwrap();
    let config = TableBuildConfig {
        task_count: Some(tasks),
        ..Default::default()
    };
    TableBuilder::new(config).build(&wide).unwrap().table
}

fn grid_table(rows: &[&str]) -> (Arc<GridWorld>, PropagationTable) {
    let world = Arc::new(GridWorld::from_rows(rows, 64.0));
    let spatial: Arc<dyn SpatialQuery> = world.clone();
    let config = GraphBuildConfig {
        task_count: Some(2),
        ..Default::default()
    };
    let graph = GraphBuilder::new(spatial, config)
        .build::<f32, u32>()
        .unwrap()
        .graph;
    (world, table_for(&graph, 2))
}

// ── Chain ────────────────────────────────────────────────────

#[test]
fn chain_of_five() {
    let t = table_for(&chain_graph(5, 10.0), 2);
    for i in 1..5u32 {
        assert!(t.has_direct_path(LeafId(i), LeafId(i + 1)));
        assert!(t.has_direct_path(LeafId(i + 1), LeafId(i)));
    }
    let far = t.indirect_path_props(LeafId(1), LeafId(5)).unwrap();
    assert_eq!(far.distance, 48.0);
    assert!(far.direction.x > 0.99);
    let back = t.indirect_path_props(LeafId(5), LeafId(1)).unwrap();
    assert!(back.direction.x < -0.99);

    let near = t.indirect_path_props(LeafId(1), LeafId(3)).unwrap();
    assert_eq!(near.distance, 16.0);
}

// ── Table invariants ─────────────────────────────────────────

#[test]
fn random_tables_are_consistent() {
    for seed in 0..3 {
        let g = random_graph(30, 0.1, seed);
        let n = g.num_leafs();
        let t = table_for(&g, 4);
        assert!(t.validate().is_ok(), "seed {seed}");
        assert_eq!(t.validate_reachability(&g), Ok(()), "seed {seed}");
        let reference = floyd_warshall(&g);

        for i in 1..n {
            for j in 1..n {
                if i == j {
                    continue;
                }
                let (a, b) = (LeafId(i as u32), LeafId(j as u32));
                let direct = t.has_direct_path(a, b);
                let indirect = t.has_indirect_path(a, b);
                assert!(!(direct && indirect));
                assert_eq!(direct, g.has_edge(i, j));
                if !direct {
                    // Reachable pairs get an indirect path.
                    assert_eq!(indirect, reference[i * n + j].is_finite(), "{i} {j}");
                }
                if let Some(props) = t.get(a, b).filter(|p| p.has_indirect_path()) {
                    let length = props.raw_direction().length();
                    assert!(DIRECTION_LENGTH_RANGE.contains(&length));
                    // The first round is the shortest path.
                    let shortest = reference[i * n + j] as f32;
                    assert!((props.distance() - shortest).abs() <= 8.0, "{i} {j}");
                }
            }
        }
    }
}

#[test]
fn task_count_does_not_change_table() {
    let g = random_graph(40, 0.08, 11);
    let one = table_for(&g, 1);
    for tasks in [2, 3, 7] {
        assert_eq!(table_for(&g, tasks), one, "{tasks} tasks");
    }
}

// ── Grid maps ────────────────────────────────────────────────

#[test]
fn open_room_is_all_direct() {
    let (_, t) = grid_table(&["...", "..."]);
    assert_eq!(t.num_leafs(), 7);
    let (direct, indirect) = t.path_counts();
    assert_eq!(direct, 6 * 5);
    assert_eq!(indirect, 0);
}

#[test]
fn sound_comes_around_the_corner() {
    let (world, t) = grid_table(&["....", "###.", "...."]);
    let top_left = world.leaf_at(0, 0);
    let bottom_left = world.leaf_at(0, 2);

    assert!(!t.has_direct_path(top_left, bottom_left));
    let p = t.indirect_path_props(top_left, bottom_left).unwrap();
    assert!(p.distance > 128.0);
    // Heard from the right, where the doorway is.
    assert!(p.direction.x > 0.0, "{:?}", p.direction);
    let q = t.indirect_path_props(bottom_left, top_left).unwrap();
    assert!(q.direction.x > 0.0, "{:?}", q.direction);
    assert_eq!(p.distance, q.distance);
}

#[test]
fn sealed_rooms_stay_silent() {
    let (world, t) = grid_table(&["..", "##", ".."]);
    let a = world.leaf_at(0, 0);
    let b = world.leaf_at(1, 2);
    assert!(!t.has_direct_path(a, b));
    assert!(!t.has_indirect_path(a, b));
    assert!(t.has_direct_path(a, world.leaf_at(1, 0)));
}
