//! Graph file layout.
//!
//! ```text
//! checksum    u32
//! num_leafs   u32
//! lists_size  u32
//! distance    f32[N²]     row-major, +inf where there is no edge
//! direction   f32[3·N²]   x, y, z per pair, NaN marker where undefined
//! offsets     u32[N]
//! lists       u32[lists_size]   [len, e1 .. e_len] per leaf
//! ```
//!
//! Everything is little-endian. Graphs are always stored at `f32`/`u32`
//! precision; other precisions are produced with `LeafGraph::try_adopt`.

use std::io::{Read, Write};

use hark_core::Vec3;
use hark_graph::graph::DIRECTION_TOLERANCE;
use hark_graph::LeafGraph;

use crate::codec::{
    expect_end, read_f32_vec, read_u32_vec, write_f32_slice, write_u32_slice, FileHeader,
};
use crate::error::CacheError;

/// Encode `graph` for a map with `checksum`.
pub fn write_graph(
    w: &mut dyn Write,
    checksum: u32,
    graph: &LeafGraph<f32, u32>,
) -> Result<(), CacheError> {
    let num_leafs = u32::try_from(graph.num_leafs()).map_err(|_| CacheError::BadHeader {
        detail: format!("{} leaves do not fit the header", graph.num_leafs()),
    })?;
    let lists_size = u32::try_from(graph.list_data().len()).map_err(|_| CacheError::BadHeader {
        detail: format!("{} list words do not fit the header", graph.list_data().len()),
    })?;
    FileHeader {
        checksum,
        num_leafs,
        section_len: lists_size,
    }
    .encode(w)?;

    write_f32_slice(w, graph.distances())?;
    let directions: Vec<f32> = graph.directions().iter().flat_map(|d| d.to_array()).collect();
    write_f32_slice(w, &directions)?;
    write_u32_slice(w, graph.list_offsets())?;
    write_u32_slice(w, graph.list_data())?;
    Ok(())
}

/// Decode a graph, accepting it only for a map with `checksum` and
/// `num_leafs` leaves and only if every table is consistent.
pub fn read_graph(
    r: &mut dyn Read,
    checksum: u32,
    num_leafs: u32,
) -> Result<LeafGraph<f32, u32>, CacheError> {
    let header = FileHeader::decode(r)?;
    header.check(checksum, num_leafs)?;

    let n = num_leafs as usize;
    let cells = n.checked_mul(n).ok_or_else(|| CacheError::BadHeader {
        detail: format!("{n} leaves overflow the table size"),
    })?;
    // Every leaf has a length word and at most N - 2 entries.
    let max_lists = n.saturating_mul(n.saturating_sub(1));
    let lists_size = header.section_len as usize;
    if lists_size < n || lists_size > max_lists.max(n) {
        return Err(CacheError::BadHeader {
            detail: format!("lists_size {lists_size} impossible for {n} leaves"),
        });
    }

    let distances = read_f32_vec(r, cells)?;
    let raw = read_f32_vec(r, cells * 3)?;
    let directions = raw
        .chunks_exact(3)
        .map(|c| normalize_stored(Vec3::from_array([c[0], c[1], c[2]])))
        .collect();
    let offsets = read_u32_vec(r, n)?;
    let lists = read_u32_vec(r, lists_size)?;
    expect_end(r)?;

    Ok(LeafGraph::from_parts(n, distances, directions, offsets, lists)?)
}

/// Renormalise a stored direction that is within tolerance of unit length.
/// Anything else is returned unchanged for validation to judge.
fn normalize_stored(dir: Vec3) -> Vec3 {
    if dir.is_invalid_marker() {
        return dir;
    }
    if (dir.length() - 1.0).abs() <= DIRECTION_TOLERANCE {
        dir.try_normalize().unwrap_or(dir)
    } else {
        dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hark_graph::GraphError;
    use hark_test_utils::fixtures::{chain_graph, random_graph};
    use std::io::Cursor;

    fn encoded(graph: &LeafGraph<f32, u32>, checksum: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        write_graph(&mut buf, checksum, graph).unwrap();
        buf
    }

    /// Byte offset of the first direction value.
    fn direction_offset(n: usize) -> usize {
        12 + n * n * 4
    }

    // ── Round trip ──────────────────────────────────────────────

    #[test]
    fn round_trip_preserves_tables() {
        let g = random_graph(15, 0.3, 4);
        let n = g.num_leafs() as u32;
        let back = read_graph(&mut Cursor::new(encoded(&g, 99)), 99, n).unwrap();
        assert_eq!(back.num_leafs(), g.num_leafs());
        assert_eq!(back.distances(), g.distances());
        assert_eq!(back.list_offsets(), g.list_offsets());
        assert_eq!(back.list_data(), g.list_data());
        for (a, b) in back.directions().iter().zip(g.directions()) {
            assert!(a.is_invalid_marker() == b.is_invalid_marker());
            if !a.is_invalid_marker() {
                assert!((*a - *b).length() < 1e-6);
            }
        }
    }

    #[test]
    fn file_size_matches_layout() {
        let g = chain_graph(4, 10.0);
        let n = 5;
        let lists = g.list_data().len();
        assert_eq!(encoded(&g, 0).len(), 12 + 4 * (n * n * 4 + n + lists));
    }

    #[test]
    fn slightly_off_directions_are_renormalised() {
        let g = chain_graph(3, 10.0);
        let mut bytes = encoded(&g, 1);
        // direction[1][2].x is 1.0; store 1.05 instead.
        let at = direction_offset(4) + (4 + 2) * 12;
        bytes[at..at + 4].copy_from_slice(&1.05f32.to_le_bytes());
        let back = read_graph(&mut Cursor::new(bytes), 1, 4).unwrap();
        let dir = back.direction(1, 2);
        assert!((dir - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-6, "{dir:?}");
    }

    // ── Rejection ───────────────────────────────────────────────

    #[test]
    fn wrong_map_is_rejected() {
        let g = chain_graph(3, 10.0);
        let bytes = encoded(&g, 5);
        assert!(matches!(
            read_graph(&mut Cursor::new(bytes.clone()), 6, 4),
            Err(CacheError::ChecksumMismatch { .. })
        ));
        assert!(matches!(
            read_graph(&mut Cursor::new(bytes), 5, 5),
            Err(CacheError::LeafCountMismatch {
                expected: 5,
                found: 4
            })
        ));
    }

    #[test]
    fn truncated_file_is_rejected() {
        let g = chain_graph(3, 10.0);
        let mut bytes = encoded(&g, 5);
        bytes.truncate(bytes.len() - 2);
        assert!(matches!(
            read_graph(&mut Cursor::new(bytes), 5, 4),
            Err(CacheError::Io(_))
        ));
    }

    #[test]
    fn trailing_data_is_rejected() {
        let g = chain_graph(3, 10.0);
        let mut bytes = encoded(&g, 5);
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        assert!(matches!(
            read_graph(&mut Cursor::new(bytes), 5, 4),
            Err(CacheError::TrailingData)
        ));
    }

    #[test]
    fn impossible_lists_size_is_rejected_before_reading() {
        let g = chain_graph(3, 10.0);
        let mut bytes = encoded(&g, 5);
        bytes[8..12].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            read_graph(&mut Cursor::new(bytes), 5, 4),
            Err(CacheError::BadHeader { .. })
        ));
    }

    #[test]
    fn long_direction_is_rejected() {
        let g = chain_graph(3, 10.0);
        let mut bytes = encoded(&g, 1);
        let at = direction_offset(4) + (4 + 2) * 12;
        bytes[at..at + 4].copy_from_slice(&2.0f32.to_le_bytes());
        assert!(matches!(
            read_graph(&mut Cursor::new(bytes), 1, 4),
            Err(CacheError::Graph(GraphError::InvalidDirection { i: 1, j: 2, .. }))
        ));
    }

    #[test]
    fn negative_distance_is_rejected() {
        let g = chain_graph(3, 10.0);
        let mut bytes = encoded(&g, 1);
        let at = 12 + (4 + 2) * 4;
        bytes[at..at + 4].copy_from_slice(&(-10.0f32).to_le_bytes());
        assert!(matches!(
            read_graph(&mut Cursor::new(bytes), 1, 4),
            Err(CacheError::Graph(_))
        ));
    }

    #[test]
    fn list_entry_out_of_range_is_rejected() {
        let g = chain_graph(3, 10.0);
        let mut bytes = encoded(&g, 1);
        // Last word is the final entry of leaf 3's list.
        let at = bytes.len() - 4;
        bytes[at..].copy_from_slice(&9u32.to_le_bytes());
        assert!(matches!(
            read_graph(&mut Cursor::new(bytes), 1, 4),
            Err(CacheError::Graph(_))
        ));
    }
}
