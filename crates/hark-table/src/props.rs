//! Per-pair propagation properties and their packed 32-bit encoding.
//!
//! Bit layout of the packed word (least significant bit first):
//!
//! | Bits    | Field                                  |
//! |---------|----------------------------------------|
//! | 0       | direct path                            |
//! | 1       | indirect path                          |
//! | 2..=13  | distance / 16, saturating at 4095      |
//! | 14..=19 | direction x, 6-bit two's complement    |
//! | 20..=25 | direction y                            |
//! | 26..=31 | direction z                            |
//!
//! Direction components are stored as `round(v * 31)`. Decoding divides by
//! 31 and renormalises, so a decoded direction is always unit length even
//! though the quantized vector generally is not.

use hark_core::Vec3;

use crate::error::TableError;

/// Distance units per quantization step.
pub const DISTANCE_QUANTUM: f32 = 16.0;
/// Largest quantized distance.
pub const MAX_QUANTIZED_DISTANCE: u16 = 4095;
/// Scale of one direction component.
pub const DIRECTION_SCALE: f32 = 31.0;

const DIRECT_BIT: u32 = 1;
const INDIRECT_BIT: u32 = 1 << 1;
const DISTANCE_SHIFT: u32 = 2;
const DISTANCE_MASK: u32 = 0xFFF;
const AXIS_SHIFTS: [u32; 3] = [14, 20, 26];
const AXIS_MASK: u32 = 0x3F;

/// Propagation properties of one ordered leaf pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PropagationProps {
    direct: bool,
    indirect: bool,
    distance: u16,
    direction: [i8; 3],
}

impl PropagationProps {
    /// No known path.
    pub const NONE: Self = Self {
        direct: false,
        indirect: false,
        distance: 0,
        direction: [0; 3],
    };

    /// A direct (line of sight) path.
    pub const DIRECT: Self = Self {
        direct: true,
        ..Self::NONE
    };

    /// An indirect path of `distance` units with sound arriving from
    /// `direction`.
    pub fn indirect(direction: Vec3, distance: f32) -> Self {
        Self {
            direct: false,
            indirect: true,
            distance: quantize_distance(distance),
            direction: quantize_direction(direction),
        }
    }

    /// Whether a direct path exists.
    #[inline]
    pub fn has_direct_path(&self) -> bool {
        self.direct
    }

    /// Whether an indirect path exists.
    #[inline]
    pub fn has_indirect_path(&self) -> bool {
        self.indirect
    }

    /// Indirect travel distance, to the nearest 16 units.
    pub fn distance(&self) -> f32 {
        f32::from(self.distance) * DISTANCE_QUANTUM
    }

    /// Quantized distance in 16-unit steps.
    pub fn quantized_distance(&self) -> u16 {
        self.distance
    }

    /// Decoded direction before renormalisation.
    pub fn raw_direction(&self) -> Vec3 {
        let [x, y, z] = self.direction.map(|q| f32::from(q) / DIRECTION_SCALE);
        Vec3::new(x, y, z)
    }

    /// Unit arrival direction, or [`Vec3::INVALID`] when none is stored.
    pub fn direction(&self) -> Vec3 {
        self.raw_direction().try_normalize().unwrap_or(Vec3::INVALID)
    }

    /// Encode into the packed 32-bit form.
    pub fn pack(&self) -> u32 {
        let mut bits = 0;
        if self.direct {
            bits |= DIRECT_BIT;
        }
        if self.indirect {
            bits |= INDIRECT_BIT;
        }
        bits |= (u32::from(self.distance) & DISTANCE_MASK) << DISTANCE_SHIFT;
        for (q, shift) in self.direction.iter().zip(AXIS_SHIFTS) {
            bits |= ((*q as u8 as u32) & AXIS_MASK) << shift;
        }
        bits
    }

    /// Decode a packed word. Words with both path flags set are rejected.
    pub fn unpack(bits: u32) -> Result<Self, TableError> {
        let direct = bits & DIRECT_BIT != 0;
        let indirect = bits & INDIRECT_BIT != 0;
        if direct && indirect {
            return Err(TableError::ConflictingFlags { bits });
        }
        Ok(Self {
            direct,
            indirect,
            distance: ((bits >> DISTANCE_SHIFT) & DISTANCE_MASK) as u16,
            direction: AXIS_SHIFTS.map(|shift| sign_extend_6((bits >> shift) & AXIS_MASK)),
        })
    }
}

fn quantize_distance(distance: f32) -> u16 {
    if distance.is_nan() || distance <= 0.0 {
        return 0;
    }
    let q = (distance / DISTANCE_QUANTUM).round();
    q.min(f32::from(MAX_QUANTIZED_DISTANCE)) as u16
}

fn quantize_direction(direction: Vec3) -> [i8; 3] {
    if !direction.is_finite() {
        return [0; 3];
    }
    direction
        .to_array()
        .map(|v| (v * DIRECTION_SCALE).round().clamp(-DIRECTION_SCALE, DIRECTION_SCALE) as i8)
}

fn sign_extend_6(field: u32) -> i8 {
    ((field as u8) << 2) as i8 >> 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn none_packs_to_zero() {
        assert_eq!(PropagationProps::NONE.pack(), 0);
        assert_eq!(PropagationProps::unpack(0).unwrap(), PropagationProps::NONE);
    }

    #[test]
    fn direct_flag_is_bit_zero() {
        assert_eq!(PropagationProps::DIRECT.pack(), 1);
        assert!(PropagationProps::unpack(1).unwrap().has_direct_path());
    }

    #[test]
    fn conflicting_flags_are_rejected() {
        let err = PropagationProps::unpack(0b11).unwrap_err();
        assert_eq!(err, TableError::ConflictingFlags { bits: 3 });
    }

    #[test]
    fn distance_rounds_to_quantum_and_saturates() {
        let p = PropagationProps::indirect(Vec3::new(1.0, 0.0, 0.0), 40.0);
        assert_eq!(p.quantized_distance(), 3);
        assert_eq!(p.distance(), 48.0);
        let far = PropagationProps::indirect(Vec3::new(1.0, 0.0, 0.0), 1.0e6);
        assert_eq!(far.quantized_distance(), MAX_QUANTIZED_DISTANCE);
        assert_eq!(far.distance(), 65_520.0);
        let neg = PropagationProps::indirect(Vec3::new(1.0, 0.0, 0.0), -5.0);
        assert_eq!(neg.quantized_distance(), 0);
    }

    #[test]
    fn negative_axes_survive_packing() {
        let p = PropagationProps::indirect(Vec3::new(-1.0, 0.0, 0.0), 100.0);
        let q = PropagationProps::unpack(p.pack()).unwrap();
        assert_eq!(q, p);
        assert_eq!(q.direction(), Vec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn missing_direction_decodes_invalid() {
        let p = PropagationProps::indirect(Vec3::INVALID, 100.0);
        assert!(p.direction().is_invalid_marker());
    }

    #[test]
    fn sign_extension() {
        assert_eq!(sign_extend_6(0b011111), 31);
        assert_eq!(sign_extend_6(0b100001), -31);
        assert_eq!(sign_extend_6(0b111111), -1);
        assert_eq!(sign_extend_6(0b100000), -32);
    }

    proptest! {
        #[test]
        fn unit_directions_decode_close(
            x in -1.0f32..1.0, y in -1.0f32..1.0, z in -1.0f32..1.0,
            d in 0.0f32..60_000.0,
        ) {
            let Some(dir) = Vec3::new(x, y, z).try_normalize() else {
                return Ok(());
            };
            let p = PropagationProps::indirect(dir, d);
            let q = PropagationProps::unpack(p.pack()).unwrap();
            prop_assert_eq!(q, p);

            let raw = q.raw_direction().length();
            prop_assert!((0.8..=1.2).contains(&raw), "raw length {}", raw);
            let decoded = q.direction();
            prop_assert!((decoded.length() - 1.0).abs() < 1e-5);
            prop_assert!(decoded.dot(dir) > 0.99);
            prop_assert!((q.distance() - d).abs() <= DISTANCE_QUANTUM / 2.0 + 0.01);
        }
    }
}
