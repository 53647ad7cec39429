//! Reference-counted immutable table storage.
//!
//! [`SharedBuffer`] holds the large leaf-graph tables (distances,
//! directions, adjacency lists). Cloning a graph for a builder task, or
//! handing the same tables to a second consumer, only bumps a reference
//! count; the data itself is never copied or mutated after construction.

use std::ops::Deref;
use std::sync::Arc;

use crate::alloc::try_vec;
use crate::error::ArenaError;

/// Immutable, reference-counted slice.
pub struct SharedBuffer<T> {
    data: Arc<[T]>,
}

impl<T> SharedBuffer<T> {
    /// Freeze a vector into shared storage.
    pub fn from_vec(data: Vec<T>) -> Self {
        Self { data: data.into() }
    }

    /// The stored elements.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of live handles sharing this storage.
    pub fn share_count(&self) -> usize {
        Arc::strong_count(&self.data)
    }

    /// Whether two handles point at the same storage.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Memory used by the elements in bytes.
    pub fn memory_bytes(&self) -> usize {
        std::mem::size_of_val(&*self.data)
    }
}

impl<T: Clone> SharedBuffer<T> {
    /// Allocate `len` copies of `value`, failing gracefully on exhaustion.
    pub fn try_filled(len: usize, value: T) -> Result<Self, ArenaError> {
        Ok(Self::from_vec(try_vec(len, value)?))
    }
}

impl<T> Clone for SharedBuffer<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T> Deref for SharedBuffer<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.data
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for SharedBuffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedBuffer")
            .field("len", &self.data.len())
            .field("shares", &Arc::strong_count(&self.data))
            .finish()
    }
}
