//! Deterministic randomness for spawning and lattice noise.
//!
//! Two flavours live here. [`Xorshift64`] is a seedable stream used wherever
//! the engine needs "some random point" (default source placement, particle
//! respawn, seed jitter). [`lattice_hash`] is stateless: it maps integer
//! lattice coordinates plus a seed to a value, so noise stays a pure function
//! of its inputs no matter the query order.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::bounds::Bounds;

/// Xorshift64 deterministic PRNG. Same seed always produces the same sequence.
///
/// Uses the standard shift parameters (13, 7, 17). Seed of 0 is replaced
/// with a non-zero fallback to avoid the all-zeros fixed point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Xorshift64 {
    state: u64,
}

impl Xorshift64 {
    const FALLBACK_SEED: u64 = 0x5EED_DEAD_BEEF_CAFE;

    /// Creates a new PRNG with the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { Self::FALLBACK_SEED } else { seed },
        }
    }

    /// Advances the state and returns the next 64-bit value.
    pub fn next_u64(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }

    /// Returns a uniformly distributed f64 in [0, 1) from the upper 53 bits.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Returns a uniformly distributed f64 in [min, max).
    pub fn next_range(&mut self, min: f64, max: f64) -> f64 {
        min + self.next_f64() * (max - min)
    }

    /// Returns a uniformly distributed usize in [0, max), or 0 when `max` is 0.
    pub fn next_usize(&mut self, max: usize) -> usize {
        if max == 0 {
            return 0;
        }
        (self.next_u64() as usize) % max
    }

    /// Returns a uniformly distributed point inside `bounds`.
    pub fn next_point(&mut self, bounds: &Bounds) -> DVec2 {
        let min = bounds.min();
        let max = bounds.max();
        DVec2::new(
            self.next_range(min.x, max.x),
            self.next_range(min.y, max.y),
        )
    }
}

/// Stateless 64-bit hash of an integer lattice cell and a seed.
///
/// SplitMix64 finalizer over a mix of both coordinates, so neighbouring
/// cells decorrelate fully.
pub fn lattice_hash(ix: i64, iy: i64, seed: u64) -> u64 {
    let mut h = seed
        ^ (ix as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (iy as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
    h = (h ^ (h >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    h = (h ^ (h >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    h ^ (h >> 31)
}

/// Maps [`lattice_hash`] to a value in [-1, 1).
pub fn lattice_value(ix: i64, iy: i64, seed: u64) -> f64 {
    let unit = (lattice_hash(ix, iy, seed) >> 11) as f64 / (1u64 << 53) as f64;
    unit * 2.0 - 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_u64_produces_known_golden_value_for_seed_42() {
        // If this breaks, every saved scene that relies on spawn order changes.
        let mut rng = Xorshift64::new(42);
        assert_eq!(rng.next_u64(), 45_454_805_674);
    }

    #[test]
    fn seed_zero_does_not_produce_all_zeros() {
        let mut rng = Xorshift64::new(0);
        for _ in 0..3 {
            assert_ne!(rng.next_u64(), 0, "seed=0 guard failed");
        }
    }

    #[test]
    fn two_instances_with_same_seed_produce_identical_sequences() {
        let mut a = Xorshift64::new(7);
        let mut b = Xorshift64::new(7);
        for i in 0..1000 {
            assert_eq!(a.next_u64(), b.next_u64(), "diverged at index {i}");
        }
    }

    #[test]
    fn next_usize_zero_max_returns_zero() {
        let mut rng = Xorshift64::new(1);
        assert_eq!(rng.next_usize(0), 0);
    }

    #[test]
    fn next_point_stays_inside_bounds() {
        let bounds = Bounds::new(10.0, 20.0, 300.0, 40.0).unwrap();
        let mut rng = Xorshift64::new(99);
        for i in 0..5_000 {
            let p = rng.next_point(&bounds);
            assert!(bounds.contains(p), "point {p} escaped bounds at {i}");
        }
    }

    #[test]
    fn lattice_hash_is_pure() {
        assert_eq!(lattice_hash(3, -8, 42), lattice_hash(3, -8, 42));
        assert_ne!(lattice_hash(3, -8, 42), lattice_hash(3, -8, 43));
        assert_ne!(lattice_hash(3, -8, 42), lattice_hash(-8, 3, 42));
    }

    #[test]
    fn lattice_value_in_signed_unit_interval() {
        for ix in -50..50 {
            for iy in -50..50 {
                let v = lattice_value(ix, iy, 1234);
                assert!((-1.0..1.0).contains(&v), "value {v} at ({ix},{iy})");
            }
        }
    }

    #[test]
    fn serialization_roundtrip_preserves_state() {
        let mut rng = Xorshift64::new(42);
        for _ in 0..50 {
            rng.next_u64();
        }
        let json = serde_json::to_string(&rng).unwrap();
        let mut restored: Xorshift64 = serde_json::from_str(&json).unwrap();
        for i in 0..100 {
            assert_eq!(rng.next_u64(), restored.next_u64(), "diverged at {i}");
        }
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn next_range_in_bounds_for_any_seed_and_range(
                seed: u64,
                min in -1e6_f64..1e6,
                max in -1e6_f64..1e6,
            ) {
                prop_assume!(min < max);
                let mut rng = Xorshift64::new(seed);
                for _ in 0..100 {
                    let v = rng.next_range(min, max);
                    prop_assert!(v >= min && v < max, "next_range({min}, {max}) = {v}");
                }
            }

            #[test]
            fn lattice_values_roughly_balanced(seed: u64) {
                let positive = (0..2_000)
                    .filter(|&i| lattice_value(i, i * 7 - 300, seed) > 0.0)
                    .count();
                prop_assert!(
                    (700..1_300).contains(&positive),
                    "only {positive}/2000 positive lattice values for seed {seed}"
                );
            }
        }
    }
}
