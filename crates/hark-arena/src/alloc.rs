//! Fallible allocation of large tables.

use crate::error::ArenaError;

/// Allocate a vector of `len` copies of `value`, reporting failure instead
/// of aborting the process.
///
/// Propagation tables grow with the square of the leaf count; on very large
/// maps the engine degrades to a dummy table when this fails.
pub fn try_vec<T: Clone>(len: usize, value: T) -> Result<Vec<T>, ArenaError> {
    let element_bytes = std::mem::size_of::<T>();
    let requested = len
        .checked_mul(element_bytes)
        .filter(|&bytes| bytes <= isize::MAX as usize)
        .ok_or(ArenaError::SizeOverflow {
            elements: len,
            element_bytes,
        })?;

    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| ArenaError::AllocationFailed { requested })?;
    v.resize(len, value);
    Ok(v)
}
