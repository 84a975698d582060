//! The combined velocity field: singularities + base flow + animated noise.

use std::sync::Arc;

use glam::DVec2;

use crate::field_source::{FieldSource, SingularitySource};
use crate::noise::NoiseField;
use crate::settings::{FlowSettings, NoiseSettings};

/// Canvas units the noise pattern drifts along +x per unit of animation time.
pub const DRIFT_RATE: f64 = 20.0;
/// Offset between the x and y noise channels so they decorrelate.
pub const NOISE_PHASE_OFFSET: f64 = 1000.0;

/// Immutable snapshot of everything that shapes the field.
///
/// Cloning is cheap (sources live behind an `Arc`) and the type is
/// `Send + Sync`, so independent traces can share one snapshot across
/// threads. Edits to the owning [`SourceManager`](crate::manager::SourceManager)
/// after the snapshot was taken are not visible through it.
#[derive(Debug, Clone)]
pub struct FieldEvaluator {
    sources: Arc<[SingularitySource]>,
    noise: NoiseField,
    flow: FlowSettings,
    intensity: f64,
}

impl FieldEvaluator {
    /// Builds a snapshot. `intensity` scales the noise vector; zero disables it.
    pub fn new(
        sources: Arc<[SingularitySource]>,
        noise: &NoiseSettings,
        flow: &FlowSettings,
        intensity: f64,
    ) -> Self {
        Self {
            sources,
            noise: NoiseField::new(noise),
            flow: flow.sanitized(),
            intensity: if intensity.is_finite() { intensity } else { 0.0 },
        }
    }

    /// A field made only of the given sources: no base flow, no noise.
    pub fn from_sources(sources: impl Into<Arc<[SingularitySource]>>) -> Self {
        Self::new(
            sources.into(),
            &NoiseSettings::default(),
            &FlowSettings::default(),
            0.0,
        )
    }

    pub fn sources(&self) -> &[SingularitySource] {
        &self.sources
    }

    pub fn intensity(&self) -> f64 {
        self.intensity
    }

    /// Total velocity at `(px, py)` at animation time `time`.
    pub fn evaluate(&self, px: f64, py: f64, time: f64) -> DVec2 {
        let p = DVec2::new(px, py);
        let mut total = self
            .sources
            .iter()
            .fold(DVec2::ZERO, |acc, s| acc + s.velocity_at(p));

        if self.flow.enabled {
            let theta = self.flow.base_angle.to_radians();
            total += DVec2::new(theta.cos(), theta.sin()) * self.flow.base_velocity;
        }

        if self.intensity != 0.0 {
            total += self.noise_vector(px, py, time) * self.intensity;
        }

        total
    }

    /// The unscaled noise vector, each component in [-1, 1].
    pub fn noise_vector(&self, px: f64, py: f64, time: f64) -> DVec2 {
        let shifted = px + time * DRIFT_RATE;
        DVec2::new(
            self.noise.sample(shifted, py),
            self.noise.sample(shifted, py + NOISE_PHASE_OFFSET),
        )
    }

    /// Smallest and largest speed over `points`, or `(0, 0)` for no points.
    pub fn magnitude_range(&self, points: &[DVec2], time: f64) -> (f64, f64) {
        if points.is_empty() {
            return (0.0, 0.0);
        }
        points
            .iter()
            .map(|p| self.evaluate(p.x, p.y, time).length())
            .fold((f64::INFINITY, 0.0_f64), |(lo, hi), m| (lo.min(m), hi.max(m)))
    }
}

impl FieldSource for FieldEvaluator {
    fn sample(&self, x: f64, y: f64, time: f64) -> DVec2 {
        self.evaluate(x, y, time)
    }
}
