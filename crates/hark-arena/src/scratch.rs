//! Task-private scratch slots with O(1) reset.
//!
//! [`StampedSlots`] backs per-search state (tentative distances, parent
//! pointers, settled flags). A path search touches only a small fraction of
//! the leaves, so clearing `N` slots before every search would dominate the
//! cost. Instead each slot records the generation in which it was last
//! written; [`reset`](StampedSlots::reset) bumps the generation and every
//! slot written in an earlier generation reads back as the default. The
//! backing allocation is reused across searches.

/// Fixed-length scratch array whose contents reset in O(1).
pub struct StampedSlots<T: Copy> {
    values: Vec<T>,
    stamps: Vec<u32>,
    generation: u32,
    default: T,
}

impl<T: Copy> StampedSlots<T> {
    /// Create `len` slots that all read as `default`.
    pub fn new(len: usize, default: T) -> Self {
        Self {
            values: vec![default; len],
            stamps: vec![0; len],
            generation: 1,
            default,
        }
    }

    /// Forget every value written since the last reset.
    pub fn reset(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if self.generation == 0 {
            // Wrapped: stale stamps could alias the new generation.
            self.stamps.fill(0);
            self.generation = 1;
        }
    }

    /// Read slot `index`, or the default if it was not written this generation.
    #[inline]
    pub fn get(&self, index: usize) -> T {
        if self.stamps[index] == self.generation {
            self.values[index]
        } else {
            self.default
        }
    }

    /// Write slot `index`.
    #[inline]
    pub fn set(&mut self, index: usize, value: T) {
        self.values[index] = value;
        self.stamps[index] = self.generation;
    }

    /// Whether slot `index` was written this generation.
    #[inline]
    pub fn is_set(&self, index: usize) -> bool {
        self.stamps[index] == self.generation
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no slots.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Memory usage of the backing storage in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.values.len() * (std::mem::size_of::<T>() + std::mem::size_of::<u32>())
    }
}
