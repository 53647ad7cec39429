//! Benchmark profiles for the Hark sound-propagation engine.
//!
//! - [`rooms_profile`]: a grid of rooms joined by doorways, as a
//!   [`GridWorld`] for graph construction
//! - [`reference_graph`]: seeded sparse graph for search and table builds

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use hark_graph::LeafGraph;
use hark_test_utils::fixtures::random_graph;
use hark_test_utils::GridWorld;

/// Cell size of the benchmark grids, in world units.
pub const CELL_SIZE: f32 = 64.0;

/// `rooms × rooms` square rooms of `room_size` open cells, separated by
/// one-cell walls. Every wall between neighbouring rooms has one doorway
/// at a seeded position.
pub fn rooms_profile(rooms: usize, room_size: usize, seed: u64) -> GridWorld {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let side = rooms * (room_size + 1) - 1;
    let mut cells = vec![vec![b'.'; side]; side];

    for k in 1..rooms {
        let wall = k * (room_size + 1) - 1;
        for row in cells.iter_mut() {
            row[wall] = b'#';
        }
        for cell in cells[wall].iter_mut() {
            *cell = b'#';
        }
    }
    for k in 1..rooms {
        let wall = k * (room_size + 1) - 1;
        for r in 0..rooms {
            let base = r * (room_size + 1);
            let vertical = base + rng.random_range(0..room_size);
            cells[vertical][wall] = b'.';
            let horizontal = base + rng.random_range(0..room_size);
            cells[wall][horizontal] = b'.';
        }
    }

    let rows: Vec<String> = cells
        .into_iter()
        .map(|row| row.into_iter().map(char::from).collect())
        .collect();
    let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
    GridWorld::from_rows(&rows, CELL_SIZE)
}

/// Seeded sparse graph of `n` leaves at `f64` precision.
pub fn reference_graph(n: usize, seed: u64) -> LeafGraph<f64, u32> {
    let density = (6.0 / n as f64).min(1.0);
    let graph = random_graph(n, density, seed);
    match LeafGraph::try_adopt(&graph) {
        Some(wide) => wide,
        None => LeafGraph::dummy(),
    }
}
