//! Field sources: analytic 2D velocity contributors.
//!
//! A [`FieldSource`] produces a velocity vector at any point in space and
//! time. [`SingularitySource`] implements the closed-form point singularities
//! (vortex, source, sink) and the position-independent uniform flow; the
//! [`FieldEvaluator`](crate::evaluator::FieldEvaluator) sums them with noise.
//!
//! All implementations are deterministic: same inputs produce the same output.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::params::normalize_degrees;

/// A source of 2D velocity values.
///
/// All implementations must be deterministic and must never return NaN or
/// infinite components for finite input.
pub trait FieldSource: Send + Sync {
    /// Velocity at `(x, y)` at the given animation time.
    fn sample(&self, x: f64, y: f64, time: f64) -> DVec2;
}

/// Distance floor for singularities: queries closer than this to a source
/// centre are evaluated as if they were this far away.
pub const SINGULARITY_EPS: f64 = 1e-3;

/// The kind of analytic contributor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Vortex,
    Source,
    Sink,
    Uniform,
}

impl SourceKind {
    pub const ALL: [SourceKind; 4] = [
        SourceKind::Vortex,
        SourceKind::Source,
        SourceKind::Sink,
        SourceKind::Uniform,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SourceKind::Vortex => "vortex",
            SourceKind::Source => "source",
            SourceKind::Sink => "sink",
            SourceKind::Uniform => "uniform",
        }
    }

    /// Display label used for default source names.
    pub fn label(self) -> &'static str {
        match self {
            SourceKind::Vortex => "Vortex",
            SourceKind::Source => "Source",
            SourceKind::Sink => "Sink",
            SourceKind::Uniform => "Uniform",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, EngineError> {
        match name {
            "vortex" => Ok(SourceKind::Vortex),
            "source" => Ok(SourceKind::Source),
            "sink" => Ok(SourceKind::Sink),
            "uniform" => Ok(SourceKind::Uniform),
            other => Err(EngineError::UnknownSourceKind(other.to_string())),
        }
    }

    /// Strength given to freshly added sources. Sinks start negative so the
    /// sign alone encodes inflow.
    pub fn default_strength(self) -> f64 {
        match self {
            SourceKind::Vortex | SourceKind::Source => 50.0,
            SourceKind::Sink => -50.0,
            SourceKind::Uniform => 1.0,
        }
    }
}

/// One analytic flow contributor.
///
/// `strength` is signed: for `source`/`sink` a positive value pushes outward
/// and a negative value pulls inward, whatever the kind label says. For a
/// vortex the sign picks the rotation direction. `angle` is in degrees and
/// only used by `uniform`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingularitySource {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SourceKind,
    pub x: f64,
    pub y: f64,
    pub strength: f64,
    #[serde(default)]
    pub angle: f64,
}

impl SingularitySource {
    /// Creates a source with the kind's default strength and zero angle.
    pub fn new(id: impl Into<String>, kind: SourceKind, x: f64, y: f64) -> Self {
        let id = id.into();
        Self {
            name: format!("{} {id}", kind.label()),
            id,
            kind,
            x,
            y,
            strength: kind.default_strength(),
            angle: 0.0,
        }
    }

    /// Builder-style strength override.
    pub fn with_strength(mut self, strength: f64) -> Self {
        self.strength = strength;
        self
    }

    /// Builder-style angle override, normalized to [0, 360).
    pub fn with_angle(mut self, degrees: f64) -> Self {
        self.angle = normalize_degrees(degrees);
        self
    }

    pub fn position(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }

    /// Closed-form velocity contributed at `p`.
    pub fn velocity_at(&self, p: DVec2) -> DVec2 {
        match self.kind {
            SourceKind::Vortex => {
                let (d, r) = self.offset(p);
                // radial unit vector rotated by +90 degrees
                DVec2::new(-d.y / r, d.x / r) * (self.strength / r)
            }
            SourceKind::Source | SourceKind::Sink => {
                let (d, r) = self.offset(p);
                DVec2::new(d.x / r, d.y / r) * (self.strength / r)
            }
            SourceKind::Uniform => {
                let theta = self.angle.to_radians();
                DVec2::new(theta.cos(), theta.sin()) * self.strength
            }
        }
    }

    /// Offset from the centre to `p` and its length floored at [`SINGULARITY_EPS`].
    fn offset(&self, p: DVec2) -> (DVec2, f64) {
        let d = p - self.position();
        (d, d.length().max(SINGULARITY_EPS))
    }

    /// Replaces non-finite numeric fields with usable values and normalizes the angle.
    pub fn sanitize(&mut self) {
        if !self.x.is_finite() {
            self.x = 0.0;
        }
        if !self.y.is_finite() {
            self.y = 0.0;
        }
        if !self.strength.is_finite() {
            self.strength = self.kind.default_strength();
        }
        self.angle = normalize_degrees(self.angle);
    }
}

impl FieldSource for SingularitySource {
    fn sample(&self, x: f64, y: f64, _time: f64) -> DVec2 {
        self.velocity_at(DVec2::new(x, y))
    }
}

/// Partial update for a [`SingularitySource`]. `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcePatch {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<SourceKind>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub strength: Option<f64>,
    pub angle: Option<f64>,
}

impl SourcePatch {
    /// Applies the patch. Non-finite numbers are skipped field by field so a
    /// bad slider value cannot poison the source.
    pub fn apply_to(&self, source: &mut SingularitySource) {
        if let Some(name) = &self.name {
            source.name.clone_from(name);
        }
        if let Some(kind) = self.kind {
            source.kind = kind;
        }
        let id = source.id.clone();
        let finite = |v: Option<f64>, field: &str| match v {
            Some(v) if v.is_finite() => Some(v),
            Some(v) => {
                log::debug!("source {id}: ignoring non-finite {field} = {v}");
                None
            }
            None => None,
        };
        if let Some(x) = finite(self.x, "x") {
            source.x = x;
        }
        if let Some(y) = finite(self.y, "y") {
            source.y = y;
        }
        if let Some(strength) = finite(self.strength, "strength") {
            source.strength = strength;
        }
        if let Some(angle) = finite(self.angle, "angle") {
            source.angle = normalize_degrees(angle);
        }
    }
}
