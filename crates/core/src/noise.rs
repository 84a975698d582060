//! Deterministic multi-octave coherent noise.
//!
//! Each octave samples a lattice function at `frequency = lacunarity^o / scale`
//! and weights it by `persistence^o`; the sum is divided by the total weight
//! so the result stays in [-1, 1]. The default lattice is value noise: a pure
//! hash of the integer cell and the seed, smoothstep-interpolated between the
//! four corners. Perlin gradient noise is available as an alternative basis.

use ::noise::{NoiseFn, Perlin};

use crate::prng::lattice_value;
use crate::settings::{NoiseBasis, NoiseSettings};

#[derive(Debug, Clone)]
enum Lattice {
    Value { seed: u64 },
    Perlin(Perlin),
}

impl Lattice {
    fn get(&self, x: f64, y: f64) -> f64 {
        match self {
            Lattice::Value { seed } => value_noise(x, y, *seed),
            Lattice::Perlin(perlin) => perlin.get([x, y]),
        }
    }
}

/// A reusable noise sampler built from one [`NoiseSettings`] snapshot.
///
/// Construction sanitizes the settings, so a zero scale or zero octave count
/// never reaches the sampling loop.
#[derive(Debug, Clone)]
pub struct NoiseField {
    settings: NoiseSettings,
    lattice: Lattice,
    inv_total_amplitude: f64,
}

impl NoiseField {
    pub fn new(settings: &NoiseSettings) -> Self {
        let settings = settings.sanitized();
        let lattice = match settings.basis {
            NoiseBasis::Value => Lattice::Value {
                seed: settings.seed.to_bits(),
            },
            NoiseBasis::Perlin => Lattice::Perlin(Perlin::new(fold_seed(settings.seed))),
        };
        let total: f64 = (0..settings.octaves)
            .map(|o| settings.persistence.powi(o as i32))
            .sum();
        Self {
            settings,
            lattice,
            inv_total_amplitude: 1.0 / total,
        }
    }

    /// The sanitized settings this field samples with.
    pub fn settings(&self) -> &NoiseSettings {
        &self.settings
    }

    /// Samples the octave sum at `(x, y)`. Always in [-1, 1].
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let s = &self.settings;
        let base_frequency = 1.0 / s.scale;
        let (sum, _, _) = (0..s.octaves).fold(
            (0.0, 1.0, base_frequency),
            |(sum, amplitude, frequency), _| {
                (
                    sum + amplitude * self.lattice.get(x * frequency, y * frequency),
                    amplitude * s.persistence,
                    frequency * s.lacunarity,
                )
            },
        );
        let normalized = sum * self.inv_total_amplitude;
        if normalized.is_finite() {
            normalized.clamp(-1.0, 1.0)
        } else {
            0.0
        }
    }
}

/// One-shot sample; builds a [`NoiseField`] per call.
///
/// Prefer holding a `NoiseField` when sampling many points with the same settings.
pub fn sample(x: f64, y: f64, settings: &NoiseSettings) -> f64 {
    NoiseField::new(settings).sample(x, y)
}

/// Single-octave value noise at lattice-space coordinates.
fn value_noise(x: f64, y: f64, seed: u64) -> f64 {
    let x0 = x.floor();
    let y0 = y.floor();
    let tx = smoothstep(x - x0);
    let ty = smoothstep(y - y0);
    // `as` saturates, which keeps far-away coordinates finite
    let ix = x0 as i64;
    let iy = y0 as i64;

    let v00 = lattice_value(ix, iy, seed);
    let v10 = lattice_value(ix.wrapping_add(1), iy, seed);
    let v01 = lattice_value(ix, iy.wrapping_add(1), seed);
    let v11 = lattice_value(ix.wrapping_add(1), iy.wrapping_add(1), seed);

    let top = lerp(v00, v10, tx);
    let bottom = lerp(v01, v11, tx);
    lerp(top, bottom, ty)
}

fn smoothstep(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Folds an f64 seed into the u32 seed Perlin expects.
fn fold_seed(seed: f64) -> u32 {
    let bits = seed.to_bits();
    (bits ^ (bits >> 32)) as u32
}
