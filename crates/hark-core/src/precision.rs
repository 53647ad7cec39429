//! Numeric precision traits for leaf graphs.
//!
//! A leaf graph is generic over the scalar used for edge distances
//! ([`GraphScalar`]) and the integer used for adjacency offsets and leaf
//! entries ([`GraphIndex`]). Graphs of different precision can be
//! converted into each other through the common wide types `f64` and
//! `usize`; narrowing conversions of indices are checked.

use std::fmt::Debug;

/// Scalar type for edge distances.
pub trait GraphScalar: Copy + PartialOrd + Debug + Send + Sync + 'static {
    /// Additive identity.
    const ZERO: Self;
    /// Marker for "no direct edge".
    const INFINITY: Self;
    /// Short name for diagnostics (`"f32"`, `"f64"`).
    const NAME: &'static str;

    /// Widen to `f64`.
    fn to_f64(self) -> f64;

    /// Convert from `f64`. Infinity maps to [`GraphScalar::INFINITY`].
    fn from_f64(v: f64) -> Self;

    /// Whether the value is a finite distance.
    fn is_finite(self) -> bool;
}

impl GraphScalar for f32 {
    const ZERO: Self = 0.0;
    const INFINITY: Self = f32::INFINITY;
    const NAME: &'static str = "f32";

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v as f32
    }

    #[inline]
    fn is_finite(self) -> bool {
        f32::is_finite(self)
    }
}

impl GraphScalar for f64 {
    const ZERO: Self = 0.0;
    const INFINITY: Self = f64::INFINITY;
    const NAME: &'static str = "f64";

    #[inline]
    fn to_f64(self) -> f64 {
        self
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v
    }

    #[inline]
    fn is_finite(self) -> bool {
        f64::is_finite(self)
    }
}

/// Integer type for adjacency offsets and list entries.
pub trait GraphIndex: Copy + Eq + Ord + Debug + Send + Sync + 'static {
    /// Zero.
    const ZERO: Self;
    /// Largest value representable, as `usize`.
    const MAX_INDEX: usize;
    /// Short name for diagnostics (`"u16"`, `"u32"`).
    const NAME: &'static str;

    /// Widen to `usize`.
    fn to_usize(self) -> usize;

    /// Narrow from `usize`, or `None` if the value does not fit.
    fn try_from_usize(v: usize) -> Option<Self>;
}

impl GraphIndex for u16 {
    const ZERO: Self = 0;
    const MAX_INDEX: usize = u16::MAX as usize;
    const NAME: &'static str = "u16";

    #[inline]
    fn to_usize(self) -> usize {
        self as usize
    }

    #[inline]
    fn try_from_usize(v: usize) -> Option<Self> {
        u16::try_from(v).ok()
    }
}

impl GraphIndex for u32 {
    const ZERO: Self = 0;
    const MAX_INDEX: usize = u32::MAX as usize;
    const NAME: &'static str = "u32";

    #[inline]
    fn to_usize(self) -> usize {
        self as usize
    }

    #[inline]
    fn try_from_usize(v: usize) -> Option<Self> {
        u32::try_from(v).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_infinity_round_trips_through_f64() {
        assert_eq!(f32::from_f64(f32::INFINITY.to_f64()), f32::INFINITY);
        assert!(!<f32 as GraphScalar>::is_finite(f32::from_f64(f64::INFINITY)));
    }

    #[test]
    fn narrow_index_overflow_is_rejected() {
        assert_eq!(u16::try_from_usize(65_535), Some(u16::MAX));
        assert_eq!(u16::try_from_usize(65_536), None);
        assert_eq!(u32::try_from_usize(65_536), Some(65_536));
    }
}
