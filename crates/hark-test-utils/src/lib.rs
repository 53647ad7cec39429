//! Test utilities and mock spatial providers for Hark development.
//!
//! Provides [`GridWorld`], a [`SpatialQuery`] over a 2D grid of open and
//! solid cells, and graph [`fixtures`] with an all-pairs reference solver.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::sync::atomic::{AtomicUsize, Ordering};

use hark_core::{Aabb, LeafId, SpatialQuery, TraceResult, Vec3};

/// Grid map where every open cell is one leaf.
///
/// Cells are `cell_size` units square in x/y and one cell tall in z. Open
/// cells are numbered row by row starting at leaf 1. Traces march along
/// the segment and stop at the first solid or out-of-grid sample. The PVS
/// test always passes.
pub struct GridWorld {
    width: usize,
    height: usize,
    cell_size: f32,
    leaf_of_cell: Vec<u32>,
    cell_of_leaf: Vec<usize>,
    traces: AtomicUsize,
}

impl GridWorld {
    /// Parse rows of `.` (open) and `#` (solid). Row 0 is `y = 0`.
    pub fn from_rows(rows: &[&str], cell_size: f32) -> Self {
        let height = rows.len();
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        let mut leaf_of_cell = vec![0u32; width * height];
        let mut cell_of_leaf = vec![usize::MAX];

        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                if c == '.' {
                    let cell = y * width + x;
                    leaf_of_cell[cell] = cell_of_leaf.len() as u32;
                    cell_of_leaf.push(cell);
                }
            }
        }

        Self {
            width,
            height,
            cell_size,
            leaf_of_cell,
            cell_of_leaf,
            traces: AtomicUsize::new(0),
        }
    }

    /// A fully open `width × height` grid.
    pub fn open(width: usize, height: usize, cell_size: f32) -> Self {
        let row = ".".repeat(width);
        let rows: Vec<&str> = (0..height).map(|_| row.as_str()).collect();
        Self::from_rows(&rows, cell_size)
    }

    /// Leaf occupying grid cell `(x, y)`, or [`LeafId::INVALID`] if solid.
    pub fn leaf_at(&self, x: usize, y: usize) -> LeafId {
        LeafId(self.leaf_of_cell[y * self.width + x])
    }

    /// Number of traces answered so far.
    pub fn trace_count(&self) -> usize {
        self.traces.load(Ordering::Relaxed)
    }

    fn cell_at(&self, p: Vec3) -> Option<usize> {
        if p.x < 0.0 || p.y < 0.0 || p.z < 0.0 || p.z >= self.cell_size {
            return None;
        }
        let x = (p.x / self.cell_size) as usize;
        let y = (p.y / self.cell_size) as usize;
        (x < self.width && y < self.height).then_some(y * self.width + x)
    }

    fn is_open(&self, p: Vec3) -> bool {
        self.cell_at(p).is_some_and(|c| self.leaf_of_cell[c] != 0)
    }
}

impl SpatialQuery for GridWorld {
    fn num_leafs(&self) -> usize {
        self.cell_of_leaf.len()
    }

    fn leaf_bounds(&self, leaf: LeafId) -> Aabb {
        let Some(&cell) = self.cell_of_leaf.get(leaf.index()).filter(|&&c| c != usize::MAX)
        else {
            return Aabb::new(Vec3::ZERO, Vec3::ZERO);
        };
        let x = (cell % self.width) as f32 * self.cell_size;
        let y = (cell / self.width) as f32 * self.cell_size;
        Aabb::new(
            Vec3::new(x, y, 0.0),
            Vec3::new(x + self.cell_size, y + self.cell_size, self.cell_size),
        )
    }

    fn point_leaf(&self, p: Vec3) -> LeafId {
        match self.cell_at(p) {
            Some(cell) => LeafId(self.leaf_of_cell[cell]),
            None => LeafId::INVALID,
        }
    }

    fn leafs_in_pvs(&self, _a: LeafId, _b: LeafId) -> bool {
        true
    }

    fn trace_solid(&self, from: Vec3, to: Vec3) -> TraceResult {
        self.traces.fetch_add(1, Ordering::Relaxed);
        let length = from.distance(to);
        let steps = ((length / (self.cell_size / 16.0)).ceil() as usize).max(1);
        for step in 0..=steps {
            let t = step as f32 / steps as f32;
            let p = from + (to - from) * t;
            if !self.is_open(p) {
                return TraceResult {
                    fraction: t,
                    end_pos: p,
                    normal: Vec3::ZERO,
                };
            }
        }
        TraceResult::clear(to)
    }
}
