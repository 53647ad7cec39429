//! The immutable leaf adjacency graph.
//!
//! Tables are stored flat and row-major: `distance[i * N + j]` and
//! `direction[i * N + j]`. Adjacency lists are compacted into one buffer of
//! `[len, e1, .., elen]` records; `list_offsets[i]` is the index of leaf
//! `i`'s `len` slot. Leaf 0 always has the empty list at offset 0.
//!
//! All tables live in [`SharedBuffer`]s, so cloning a graph for a builder
//! task shares the storage, and [`LeafGraph::try_adopt`] can reuse the
//! direction table between graphs of different precision.

use std::fmt;

use hark_arena::SharedBuffer;
use hark_core::{GraphIndex, GraphScalar, Vec3};

use crate::error::GraphError;

/// Tolerance on direction length accepted by [`LeafGraph::validate`].
pub const DIRECTION_TOLERANCE: f32 = 0.1;

/// Leaf adjacency graph with distance scalar `D` and index type `O`.
pub struct LeafGraph<D: GraphScalar = f32, O: GraphIndex = u32> {
    num_leafs: usize,
    distances: SharedBuffer<D>,
    directions: SharedBuffer<Vec3>,
    list_offsets: SharedBuffer<O>,
    list_data: SharedBuffer<O>,
    dummy: bool,
}

impl<D: GraphScalar, O: GraphIndex> LeafGraph<D, O> {
    /// Build a graph from distance and direction tables, deriving the
    /// adjacency lists from the finite distances.
    pub fn from_tables(
        num_leafs: usize,
        distances: Vec<D>,
        directions: Vec<Vec3>,
    ) -> Result<Self, GraphError> {
        let cells = table_cells(num_leafs)?;
        check_len("distances", cells, distances.len())?;
        check_len("directions", cells, directions.len())?;
        check_distances(num_leafs, &distances)?;

        let (list_offsets, list_data) = build_adjacency::<D, O>(num_leafs, &distances)?;
        Ok(Self {
            num_leafs,
            distances: SharedBuffer::from_vec(distances),
            directions: SharedBuffer::from_vec(directions),
            list_offsets: SharedBuffer::from_vec(list_offsets),
            list_data: SharedBuffer::from_vec(list_data),
            dummy: false,
        })
    }

    /// Assemble a graph from all four tables, as stored on disk.
    ///
    /// Every table is checked with [`LeafGraph::validate`]; any
    /// inconsistency rejects the whole graph.
    pub fn from_parts(
        num_leafs: usize,
        distances: Vec<D>,
        directions: Vec<Vec3>,
        list_offsets: Vec<O>,
        list_data: Vec<O>,
    ) -> Result<Self, GraphError> {
        let graph = Self {
            num_leafs,
            distances: SharedBuffer::from_vec(distances),
            directions: SharedBuffer::from_vec(directions),
            list_offsets: SharedBuffer::from_vec(list_offsets),
            list_data: SharedBuffer::from_vec(list_data),
            dummy: false,
        };
        graph.validate()?;
        Ok(graph)
    }

    /// Placeholder graph with the single reserved leaf and no edges.
    pub fn dummy() -> Self {
        Self {
            num_leafs: 1,
            distances: SharedBuffer::from_vec(vec![D::INFINITY]),
            directions: SharedBuffer::from_vec(vec![Vec3::INVALID]),
            list_offsets: SharedBuffer::from_vec(vec![O::ZERO]),
            list_data: SharedBuffer::from_vec(vec![O::ZERO]),
            dummy: true,
        }
    }

    /// Convert a graph of another precision, sharing the direction table.
    ///
    /// Returns `None` when the source is a dummy graph or any offset or
    /// leaf index does not fit `O`. Callers fall back to building.
    pub fn try_adopt<D2: GraphScalar, O2: GraphIndex>(source: &LeafGraph<D2, O2>) -> Option<Self> {
        if source.dummy {
            return None;
        }
        let list_offsets = convert_indices::<O2, O>(&source.list_offsets)?;
        let list_data = convert_indices::<O2, O>(&source.list_data)?;
        let distances: Vec<D> = source
            .distances
            .iter()
            .map(|d| D::from_f64(d.to_f64()))
            .collect();

        Some(Self {
            num_leafs: source.num_leafs,
            distances: SharedBuffer::from_vec(distances),
            directions: source.directions.clone(),
            list_offsets: SharedBuffer::from_vec(list_offsets),
            list_data: SharedBuffer::from_vec(list_data),
            dummy: false,
        })
    }

    /// Leaf count `N`, including the reserved leaf 0.
    #[inline]
    pub fn num_leafs(&self) -> usize {
        self.num_leafs
    }

    /// Whether this is the placeholder graph.
    pub fn is_dummy(&self) -> bool {
        self.dummy
    }

    /// Direct distance between `i` and `j`; infinite without an edge.
    #[inline]
    pub fn distance(&self, i: usize, j: usize) -> D {
        self.distances[i * self.num_leafs + j]
    }

    /// Unit direction from `i` toward `j`, or [`Vec3::INVALID`].
    #[inline]
    pub fn direction(&self, i: usize, j: usize) -> Vec3 {
        self.directions[i * self.num_leafs + j]
    }

    /// Whether a direct edge connects `i` and `j`.
    #[inline]
    pub fn has_edge(&self, i: usize, j: usize) -> bool {
        i != j && self.distance(i, j).is_finite()
    }

    /// Leaves directly connected to `i`, ascending.
    #[inline]
    pub fn neighbors(&self, i: usize) -> &[O] {
        let offset = self.list_offsets[i].to_usize();
        let len = self.list_data[offset].to_usize();
        &self.list_data[offset + 1..offset + 1 + len]
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        (0..self.num_leafs)
            .map(|i| self.neighbors(i).len())
            .sum::<usize>()
            / 2
    }

    /// Flat distance table.
    pub fn distances(&self) -> &[D] {
        &self.distances
    }

    /// Flat direction table.
    pub fn directions(&self) -> &[Vec3] {
        &self.directions
    }

    /// Per-leaf offsets into [`LeafGraph::list_data`].
    pub fn list_offsets(&self) -> &[O] {
        &self.list_offsets
    }

    /// Compacted adjacency records.
    pub fn list_data(&self) -> &[O] {
        &self.list_data
    }

    /// Whether `other` shares this graph's direction storage.
    pub fn shares_directions_with<D2: GraphScalar, O2: GraphIndex>(
        &self,
        other: &LeafGraph<D2, O2>,
    ) -> bool {
        self.directions.ptr_eq(&other.directions)
    }

    /// Memory used by all tables in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.distances.memory_bytes()
            + self.directions.memory_bytes()
            + self.list_offsets.memory_bytes()
            + self.list_data.memory_bytes()
    }

    /// Check every structural invariant of the stored tables.
    pub fn validate(&self) -> Result<(), GraphError> {
        let n = self.num_leafs;
        let cells = table_cells(n)?;
        if n - 1 > O::MAX_INDEX {
            return Err(GraphError::IndexOverflow {
                value: n - 1,
                index_type: O::NAME,
            });
        }
        check_len("distances", cells, self.distances.len())?;
        check_len("directions", cells, self.directions.len())?;
        check_len("offsets", n, self.list_offsets.len())?;
        check_distances(n, &self.distances)?;
        check_directions(n, &self.directions)?;
        check_lists(n, &self.distances, &self.list_offsets, &self.list_data)
    }
}

impl<D: GraphScalar, O: GraphIndex> Clone for LeafGraph<D, O> {
    fn clone(&self) -> Self {
        Self {
            num_leafs: self.num_leafs,
            distances: self.distances.clone(),
            directions: self.directions.clone(),
            list_offsets: self.list_offsets.clone(),
            list_data: self.list_data.clone(),
            dummy: self.dummy,
        }
    }
}

impl<D: GraphScalar, O: GraphIndex> fmt::Debug for LeafGraph<D, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeafGraph")
            .field("precision", &format_args!("{}/{}", D::NAME, O::NAME))
            .field("num_leafs", &self.num_leafs)
            .field("edges", &self.edge_count())
            .field("dummy", &self.dummy)
            .finish()
    }
}

fn table_cells(num_leafs: usize) -> Result<usize, GraphError> {
    if num_leafs == 0 {
        return Err(GraphError::NoLeafs);
    }
    num_leafs
        .checked_mul(num_leafs)
        .ok_or(GraphError::IndexOverflow {
            value: num_leafs,
            index_type: "usize",
        })
}

fn check_len(table: &'static str, expected: usize, actual: usize) -> Result<(), GraphError> {
    if expected != actual {
        return Err(GraphError::SizeMismatch {
            table,
            expected,
            actual,
        });
    }
    Ok(())
}

fn check_distances<D: GraphScalar>(n: usize, distances: &[D]) -> Result<(), GraphError> {
    for i in 0..n {
        for j in i..n {
            let d = distances[i * n + j];
            let dt = distances[j * n + i];
            let v = d.to_f64();
            if v.is_nan() || v < 0.0 {
                return Err(GraphError::InvalidDistance { i, j });
            }
            if d != dt {
                return Err(GraphError::AsymmetricDistance { i, j });
            }
        }
    }
    Ok(())
}

fn check_directions(n: usize, directions: &[Vec3]) -> Result<(), GraphError> {
    for (cell, dir) in directions.iter().enumerate() {
        if dir.is_invalid_marker() {
            continue;
        }
        let length = dir.length();
        if !length.is_finite() || (length - 1.0).abs() > DIRECTION_TOLERANCE {
            return Err(GraphError::InvalidDirection {
                i: cell / n,
                j: cell % n,
                length,
            });
        }
    }
    Ok(())
}

fn check_lists<D: GraphScalar, O: GraphIndex>(
    n: usize,
    distances: &[D],
    offsets: &[O],
    data: &[O],
) -> Result<(), GraphError> {
    let mut expected = 0usize;
    for leaf in 0..n {
        let offset = offsets[leaf].to_usize();
        if offset != expected || offset >= data.len() {
            return Err(GraphError::InvalidOffset { leaf, offset });
        }
        let len = data[offset].to_usize();
        let end = offset + 1 + len;
        if end > data.len() {
            return Err(GraphError::ListSizeMismatch {
                expected: end,
                actual: data.len(),
            });
        }
        let mut previous = 0usize;
        for entry in data[offset + 1..end].iter().map(|e| e.to_usize()) {
            let linked = leaf != 0
                && entry != 0
                && entry < n
                && entry != leaf
                && distances[leaf * n + entry].is_finite();
            if !linked {
                return Err(GraphError::InvalidListEntry { leaf, entry });
            }
            if entry <= previous {
                return Err(GraphError::UnsortedList { leaf, entry });
            }
            previous = entry;
        }
        let neighbours = if leaf == 0 {
            0
        } else {
            (1..n)
                .filter(|&j| j != leaf && distances[leaf * n + j].is_finite())
                .count()
        };
        if len != neighbours {
            return Err(GraphError::IncompleteList {
                leaf,
                expected: neighbours,
                actual: len,
            });
        }
        expected = end;
    }
    if expected != data.len() {
        return Err(GraphError::ListSizeMismatch {
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

fn to_index<O: GraphIndex>(value: usize) -> Result<O, GraphError> {
    O::try_from_usize(value).ok_or(GraphError::IndexOverflow {
        value,
        index_type: O::NAME,
    })
}

fn build_adjacency<D: GraphScalar, O: GraphIndex>(
    n: usize,
    distances: &[D],
) -> Result<(Vec<O>, Vec<O>), GraphError> {
    let mut offsets = Vec::with_capacity(n);
    let mut data = Vec::with_capacity(n);

    offsets.push(O::ZERO);
    data.push(O::ZERO);

    let mut row = Vec::new();
    for i in 1..n {
        row.clear();
        row.extend((1..n).filter(|&j| j != i && distances[i * n + j].is_finite()));
        offsets.push(to_index(data.len())?);
        data.push(to_index(row.len())?);
        for &j in &row {
            data.push(to_index(j)?);
        }
    }
    Ok((offsets, data))
}

fn convert_indices<A: GraphIndex, B: GraphIndex>(source: &[A]) -> Option<Vec<B>> {
    source
        .iter()
        .map(|v| B::try_from_usize(v.to_usize()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Leaves 1..n in a line, 10 units apart along +x.
    fn line(n: usize) -> LeafGraph<f32, u32> {
        let mut dist = vec![f32::INFINITY; n * n];
        let mut dir = vec![Vec3::INVALID; n * n];
        for i in 1..n - 1 {
            let j = i + 1;
            dist[i * n + j] = 10.0;
            dist[j * n + i] = 10.0;
            dir[i * n + j] = Vec3::new(1.0, 0.0, 0.0);
            dir[j * n + i] = Vec3::new(-1.0, 0.0, 0.0);
        }
        LeafGraph::from_tables(n, dist, dir).unwrap()
    }

    // ── Construction ─────────────────────────────────────────

    #[test]
    fn adjacency_follows_finite_distances() {
        let g = line(5);
        assert!(g.neighbors(0).is_empty());
        assert_eq!(g.neighbors(1), &[2]);
        assert_eq!(g.neighbors(2), &[1, 3]);
        assert_eq!(g.neighbors(4), &[3]);
        assert_eq!(g.edge_count(), 3);
        assert!(g.has_edge(2, 3));
        assert!(!g.has_edge(1, 3));
        assert!(!g.has_edge(2, 2));
    }

    #[test]
    fn offsets_chain_through_list_records() {
        let g = line(5);
        let offsets: Vec<usize> = g.list_offsets().iter().map(|&o| o as usize).collect();
        assert_eq!(offsets[0], 0);
        for i in 1..5 {
            let prev = offsets[i - 1];
            assert_eq!(offsets[i], prev + 1 + g.list_data()[prev] as usize);
        }
        assert!(g.validate().is_ok());
    }

    #[test]
    fn isolated_leaf_has_empty_list() {
        let n = 4;
        let mut dist = vec![f32::INFINITY; n * n];
        dist[n + 2] = 5.0;
        dist[2 * n + 1] = 5.0;
        let mut dir = vec![Vec3::INVALID; n * n];
        dir[n + 2] = Vec3::new(0.0, 1.0, 0.0);
        dir[2 * n + 1] = Vec3::new(0.0, -1.0, 0.0);
        let g: LeafGraph = LeafGraph::from_tables(n, dist, dir).unwrap();
        assert!(g.neighbors(3).is_empty());
    }

    #[test]
    fn asymmetric_distances_are_rejected() {
        let n = 3;
        let mut dist = vec![f32::INFINITY; n * n];
        dist[n + 2] = 4.0;
        let err = LeafGraph::<f32, u32>::from_tables(n, dist, vec![Vec3::INVALID; n * n])
            .unwrap_err();
        assert_eq!(err, GraphError::AsymmetricDistance { i: 1, j: 2 });
    }

    #[test]
    fn wrong_table_size_is_rejected() {
        let err = LeafGraph::<f32, u32>::from_tables(3, vec![f32::INFINITY; 8], vec![Vec3::INVALID; 9])
            .unwrap_err();
        assert!(matches!(err, GraphError::SizeMismatch { table: "distances", .. }));
        assert_eq!(
            LeafGraph::<f32, u32>::from_tables(0, vec![], vec![]).unwrap_err(),
            GraphError::NoLeafs
        );
    }

    #[test]
    fn dummy_has_no_edges() {
        let g = LeafGraph::<f32, u32>::dummy();
        assert!(g.is_dummy());
        assert_eq!(g.num_leafs(), 1);
        assert!(g.neighbors(0).is_empty());
        assert!(g.validate().is_ok());
    }

    // ── Validation of stored parts ───────────────────────────

    #[test]
    fn from_parts_accepts_own_tables() {
        let g = line(6);
        let copy = LeafGraph::<f32, u32>::from_parts(
            6,
            g.distances().to_vec(),
            g.directions().to_vec(),
            g.list_offsets().to_vec(),
            g.list_data().to_vec(),
        )
        .unwrap();
        assert_eq!(copy.neighbors(3), g.neighbors(3));
    }

    #[test]
    fn corrupted_offset_is_rejected() {
        let g = line(6);
        let mut offsets = g.list_offsets().to_vec();
        offsets[3] += 1;
        let err = LeafGraph::<f32, u32>::from_parts(
            6,
            g.distances().to_vec(),
            g.directions().to_vec(),
            offsets,
            g.list_data().to_vec(),
        )
        .unwrap_err();
        assert!(matches!(err, GraphError::InvalidOffset { leaf: 3, .. }));
    }

    #[test]
    fn out_of_range_entry_is_rejected() {
        let g = line(4);
        let mut data = g.list_data().to_vec();
        let off = g.list_offsets()[1] as usize;
        data[off + 1] = 9;
        let err = LeafGraph::<f32, u32>::from_parts(
            4,
            g.distances().to_vec(),
            g.directions().to_vec(),
            g.list_offsets().to_vec(),
            data,
        )
        .unwrap_err();
        assert_eq!(err, GraphError::InvalidListEntry { leaf: 1, entry: 9 });
    }

    #[test]
    fn trailing_list_data_is_rejected() {
        let g = line(4);
        let mut data = g.list_data().to_vec();
        data.push(0);
        let err = LeafGraph::<f32, u32>::from_parts(
            4,
            g.distances().to_vec(),
            g.directions().to_vec(),
            g.list_offsets().to_vec(),
            data,
        )
        .unwrap_err();
        assert!(matches!(err, GraphError::ListSizeMismatch { .. }));
    }

    #[test]
    fn short_direction_is_rejected() {
        let g = line(4);
        let mut dir = g.directions().to_vec();
        dir[4 + 2] = Vec3::new(0.5, 0.0, 0.0);
        let err = LeafGraph::<f32, u32>::from_parts(
            4,
            g.distances().to_vec(),
            dir,
            g.list_offsets().to_vec(),
            g.list_data().to_vec(),
        )
        .unwrap_err();
        assert!(matches!(err, GraphError::InvalidDirection { i: 1, j: 2, .. }));
    }

    fn parts_with_lists(g: &LeafGraph<f32, u32>, data: Vec<u32>) -> Result<LeafGraph<f32, u32>, GraphError> {
        LeafGraph::from_parts(
            g.num_leafs(),
            g.distances().to_vec(),
            g.directions().to_vec(),
            g.list_offsets().to_vec(),
            data,
        )
    }

    #[test]
    fn out_of_order_list_is_rejected() {
        let g = line(5);
        let mut data = g.list_data().to_vec();
        let off = g.list_offsets()[2] as usize;
        assert_eq!(&data[off + 1..off + 3], &[1, 3]);
        data.swap(off + 1, off + 2);
        assert_eq!(
            parts_with_lists(&g, data).unwrap_err(),
            GraphError::UnsortedList { leaf: 2, entry: 1 }
        );
    }

    #[test]
    fn duplicate_list_entry_is_rejected() {
        let g = line(5);
        let mut data = g.list_data().to_vec();
        let off = g.list_offsets()[2] as usize;
        data[off + 2] = data[off + 1];
        assert_eq!(
            parts_with_lists(&g, data).unwrap_err(),
            GraphError::UnsortedList { leaf: 2, entry: 1 }
        );
    }

    #[test]
    fn list_missing_a_neighbour_is_rejected() {
        let g = line(4);
        let n = 4;
        let mut dist = g.distances().to_vec();
        let mut dir = g.directions().to_vec();
        dist[n + 3] = 20.0;
        dist[3 * n + 1] = 20.0;
        dir[n + 3] = Vec3::new(1.0, 0.0, 0.0);
        dir[3 * n + 1] = Vec3::new(-1.0, 0.0, 0.0);
        let err = LeafGraph::<f32, u32>::from_parts(
            n,
            dist,
            dir,
            g.list_offsets().to_vec(),
            g.list_data().to_vec(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            GraphError::IncompleteList {
                leaf: 1,
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn leaf_count_beyond_index_type_is_rejected() {
        let err = LeafGraph::<f32, u16>::from_parts(70_000, vec![], vec![], vec![], vec![]).unwrap_err();
        assert_eq!(
            err,
            GraphError::IndexOverflow {
                value: 69_999,
                index_type: "u16"
            }
        );
    }

    // ── Precision adoption ───────────────────────────────────

    #[test]
    fn adopt_widens_and_shares_directions() {
        let g = line(5);
        let wide: LeafGraph<f64, u32> = LeafGraph::try_adopt(&g).unwrap();
        assert_eq!(wide.distance(2, 3), 10.0);
        assert_eq!(wide.neighbors(2), &[1, 3]);
        assert!(wide.shares_directions_with(&g));
    }

    #[test]
    fn adopt_declines_dummy_source() {
        let dummy = LeafGraph::<f32, u32>::dummy();
        assert!(LeafGraph::<f64, u32>::try_adopt(&dummy).is_none());
    }

    #[test]
    fn adopt_declines_index_overflow() {
        let n = 300;
        let mut dist = vec![f32::INFINITY; n * n];
        let mut dir = vec![Vec3::INVALID; n * n];
        // Dense enough that list offsets pass u16::MAX.
        for i in 1..n {
            for j in 1..n {
                if i != j {
                    dist[i * n + j] = 1.0;
                    dir[i * n + j] = Vec3::new(1.0, 0.0, 0.0);
                }
            }
        }
        let g: LeafGraph<f32, u32> = LeafGraph::from_tables(n, dist, dir).unwrap();
        assert!(LeafGraph::<f32, u16>::try_adopt(&g).is_none());
    }

    #[test]
    fn clone_shares_all_tables() {
        let g = line(5);
        let c = g.clone();
        assert!(c.shares_directions_with(&g));
        assert_eq!(c.memory_bytes(), g.memory_bytes());
    }
}
