//! Equal-workload partitioning of triangular pair loops.
//!
//! Builders visit every unordered leaf pair `(i, j)` with `i < j` inside
//! `[start, end)`. Row `i` owns `end - 1 - i` pairs, so splitting rows into
//! equal-length ranges would give the first task most of the work. The
//! partitioner instead places boundaries so every range carries roughly
//! `total / parts` pairs.

use std::ops::Range;

/// Pairs owned by rows `[start, b)` when each row `i` pairs with every
/// `j` in `(i, end)`.
///
/// Closed form: the triangle among the rows themselves plus the rectangle
/// of those rows against `[b, end)`.
pub fn pair_workload(start: usize, b: usize, end: usize) -> u64 {
    debug_assert!(start <= b && b <= end);
    let rows = (b - start) as u64;
    let triangle = rows * rows.saturating_sub(1) / 2;
    let rectangle = rows * (end - b) as u64;
    triangle + rectangle
}

/// Split rows `[start, end)` into at most `parts` contiguous, non-empty
/// ranges of approximately equal pair workload.
///
/// The ranges cover `[start, end)` exactly and are returned in order. An
/// empty input yields no ranges.
pub fn partition_triangular(start: usize, end: usize, parts: usize) -> Vec<Range<usize>> {
    if start >= end {
        return Vec::new();
    }
    let parts = parts.max(1);
    let total = pair_workload(start, end, end);

    let mut ranges = Vec::with_capacity(parts);
    let mut a = start;
    for k in 1..=parts {
        if a >= end {
            break;
        }
        let b = if k == parts {
            end
        } else {
            let target = total * k as u64 / parts as u64;
            let mut b = a + 1;
            while b < end && pair_workload(start, b, end) < target {
                b += 1;
            }
            b
        };
        ranges.push(a..b);
        a = b;
    }
    ranges
}
