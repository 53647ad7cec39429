//! Saving and reloading built artifacts through the store.

use std::fs;

use hark_cache::{CacheError, CacheStore};
use hark_core::{CacheKey, LeafId, MapIdentity};
use hark_graph::LeafGraph;
use hark_table::{TableBuildConfig, TableBuilder};
use hark_test_utils::fixtures::random_graph;
use proptest::prelude::*;

fn key(checksum: u32, num_leafs: usize) -> CacheKey {
    CacheKey::new(&MapIdentity::new("maps/arena.bsp", checksum), num_leafs as u32)
}

#[test]
fn graph_and_table_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let graph = random_graph(25, 0.12, 8);
    let n = graph.num_leafs();
    let wide = LeafGraph::<f64, u32>::try_adopt(&graph).unwrap();
    let table = TableBuilder::new(TableBuildConfig {
        task_count: Some(2),
        ..Default::default()
    })
    .build(&wide)
    .unwrap()
    .table;

    let k = key(0xfeed, n);
    {
        let store = CacheStore::new(dir.path());
        store.save_graph(&k, &graph).unwrap();
        store.save_table(&k, &table).unwrap();
    }

    let store = CacheStore::new(dir.path());
    let graph2 = store.load_graph(&k).unwrap();
    let table2 = store.load_table(&k).unwrap();
    assert_eq!(graph2.list_data(), graph.list_data());
    assert_eq!(table2, table);
    for i in 1..n as u32 {
        for j in 1..n as u32 {
            let (a, b) = (LeafId(i), LeafId(j));
            assert_eq!(table2.has_direct_path(a, b), table.has_direct_path(a, b));
            assert_eq!(
                table2.indirect_path_props(a, b).map(|p| p.distance),
                table.indirect_path_props(a, b).map(|p| p.distance)
            );
        }
    }
}

#[test]
fn leaf_count_change_invalidates_both_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = CacheStore::new(dir.path());
    let graph = random_graph(10, 0.3, 1);
    let n = graph.num_leafs();
    store.save_graph(&key(1, n), &graph).unwrap();

    assert!(matches!(
        store.load_graph(&key(1, n + 1)),
        Err(CacheError::LeafCountMismatch { .. })
    ));
}

#[test]
fn garbage_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let store = CacheStore::new(dir.path());
    let path = store.paths().table_file("maps/arena.bsp");
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, b"not a table").unwrap();
    let err = store.load_table(&key(1, 4)).unwrap_err();
    assert!(!err.is_not_found());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn truncation_anywhere_is_rejected(cut in 1usize..200) {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let graph = random_graph(6, 0.5, 2);
        let n = graph.num_leafs();
        let path = store.save_graph(&key(9, n), &graph).unwrap();

        let bytes = fs::read(&path).unwrap();
        let keep = bytes.len().saturating_sub(cut);
        fs::write(&path, &bytes[..keep]).unwrap();
        prop_assert!(store.load_graph(&key(9, n)).is_err());
    }
}
