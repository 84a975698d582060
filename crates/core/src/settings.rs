//! Immutable parameter snapshots: noise, base flow, visualization, animation.
//!
//! Each settings struct is a plain value. Callers build one (from defaults,
//! JSON, or by hand), call [`sanitized`](NoiseSettings::sanitized) or go
//! through `merge_json` which sanitizes for them, and hand it to the
//! evaluator by reference. Nothing in the core mutates a snapshot in place.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EngineError;
use crate::params::{
    clamp_f64, clamp_usize, finite_or, normalize_degrees, param_bool, param_f64, param_string,
    param_usize,
};
use crate::particles::BoundaryPolicy;

/// Smallest allowed noise feature size; zero would mean infinite frequency.
pub const MIN_SCALE: f64 = 1e-6;
/// Octave sums beyond this add nothing visible below one canvas unit.
pub const MAX_OCTAVES: usize = 12;
/// Floor for persistence, which must stay strictly positive.
pub const MIN_PERSISTENCE: f64 = 1e-3;
/// Floor for every length-like visualization parameter.
pub const MIN_LENGTH: f64 = 1e-3;
/// Upper bound on glyph, seed and particle counts.
pub const MAX_LINE_COUNT: usize = 100_000;
/// Upper bound on integration steps per streamline.
pub const MAX_STREAMLINE_STEPS: usize = 10_000;

// ---------------------------------------------------------------------------
// Noise
// ---------------------------------------------------------------------------

/// Lattice function used by each noise octave.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseBasis {
    /// Hashed lattice values, smoothstep-interpolated.
    #[default]
    Value,
    /// Perlin gradient noise from the `noise` crate.
    Perlin,
}

impl NoiseBasis {
    pub fn name(self) -> &'static str {
        match self {
            NoiseBasis::Value => "value",
            NoiseBasis::Perlin => "perlin",
        }
    }

    fn from_name_or(name: &str, fallback: Self) -> Self {
        match name {
            "value" => NoiseBasis::Value,
            "perlin" => NoiseBasis::Perlin,
            _ => fallback,
        }
    }
}

/// Multi-octave coherent noise parameters.
///
/// `scale` is the feature size in canvas units: the first octave has one
/// lattice cell per `scale` units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseSettings {
    pub scale: f64,
    pub octaves: usize,
    pub persistence: f64,
    pub lacunarity: f64,
    pub seed: f64,
    pub basis: NoiseBasis,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            scale: 120.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            seed: 42.0,
            basis: NoiseBasis::Value,
        }
    }
}

impl NoiseSettings {
    /// Returns a copy with every field pulled into its valid range.
    pub fn sanitized(&self) -> Self {
        let scale = if self.scale.is_finite() && self.scale > 0.0 {
            self.scale
        } else {
            log::debug!("noise.scale: {} replaced by {MIN_SCALE}", self.scale);
            MIN_SCALE
        };
        Self {
            scale: scale.max(MIN_SCALE),
            octaves: clamp_usize("noise.octaves", self.octaves, 1, MAX_OCTAVES),
            persistence: clamp_f64("noise.persistence", self.persistence, MIN_PERSISTENCE, 1.0),
            lacunarity: clamp_f64("noise.lacunarity", self.lacunarity, 1.0, 16.0),
            seed: finite_or("noise.seed", self.seed, 0.0),
            basis: self.basis,
        }
    }

    /// Applies the keys present in `params` over `self`, then sanitizes.
    pub fn merge_json(&self, params: &Value) -> Self {
        Self {
            scale: param_f64(params, "scale", self.scale),
            octaves: param_usize(params, "octaves", self.octaves),
            persistence: param_f64(params, "persistence", self.persistence),
            lacunarity: param_f64(params, "lacunarity", self.lacunarity),
            seed: param_f64(params, "seed", self.seed),
            basis: NoiseBasis::from_name_or(
                &param_string(params, "basis", self.basis.name()),
                self.basis,
            ),
        }
        .sanitized()
    }

    pub fn from_json(params: &Value) -> Self {
        Self::default().merge_json(params)
    }
}

// ---------------------------------------------------------------------------
// Base flow
// ---------------------------------------------------------------------------

/// Global uniform flow added on top of every source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowSettings {
    pub enabled: bool,
    pub base_velocity: f64,
    /// Direction in degrees, 0 = +x, 90 = +y.
    pub base_angle: f64,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            base_velocity: 1.0,
            base_angle: 0.0,
        }
    }
}

impl FlowSettings {
    pub fn sanitized(&self) -> Self {
        Self {
            enabled: self.enabled,
            base_velocity: clamp_f64("flow.base_velocity", self.base_velocity, 0.0, f64::MAX),
            base_angle: normalize_degrees(self.base_angle),
        }
    }

    pub fn merge_json(&self, params: &Value) -> Self {
        Self {
            enabled: param_bool(params, "enabled", self.enabled),
            base_velocity: param_f64(params, "base_velocity", self.base_velocity),
            base_angle: param_f64(params, "base_angle", self.base_angle),
        }
        .sanitized()
    }

    pub fn from_json(params: &Value) -> Self {
        Self::default().merge_json(params)
    }
}

// ---------------------------------------------------------------------------
// Visualization
// ---------------------------------------------------------------------------

/// How the field is drawn. Exactly one mode is active at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualizationMode {
    /// Static grid of direction glyphs.
    #[default]
    Vector,
    /// Polylines traced from stable seeds.
    Streamline,
    /// Particles advected frame to frame.
    Particle,
}

impl VisualizationMode {
    pub const ALL: [VisualizationMode; 3] = [
        VisualizationMode::Vector,
        VisualizationMode::Streamline,
        VisualizationMode::Particle,
    ];

    pub fn name(self) -> &'static str {
        match self {
            VisualizationMode::Vector => "vector",
            VisualizationMode::Streamline => "streamline",
            VisualizationMode::Particle => "particle",
        }
    }

    /// Parses a mode name. `flowing` is accepted as an alias for `particle`.
    pub fn from_name(name: &str) -> Result<Self, EngineError> {
        match name {
            "vector" => Ok(VisualizationMode::Vector),
            "streamline" => Ok(VisualizationMode::Streamline),
            "particle" | "flowing" => Ok(VisualizationMode::Particle),
            other => Err(EngineError::UnknownMode(other.to_string())),
        }
    }

    /// Maps the legacy pair of toggles onto a single mode.
    ///
    /// Streamline wins when both are set.
    pub fn from_flags(streamline_mode: bool, flowing_mode: bool) -> Self {
        match (streamline_mode, flowing_mode) {
            (true, _) => VisualizationMode::Streamline,
            (false, true) => VisualizationMode::Particle,
            (false, false) => VisualizationMode::Vector,
        }
    }
}

/// Density and shape parameters for the active visualization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurbulenceSettings {
    /// Number of glyphs, streamline seeds or particles.
    pub line_count: usize,
    /// Glyph length in canvas units.
    pub line_length: f64,
    pub show_sources: bool,
    pub mode: VisualizationMode,
    pub streamline_steps: usize,
    pub streamline_step_size: f64,
    /// Trace streamlines backward as well as forward from each seed.
    pub bidirectional: bool,
    /// Frames a particle lives before respawning.
    pub particle_lifetime: u32,
    /// Positions kept per particle for trail rendering.
    pub trail_length: usize,
    /// Seed jitter as a fraction of one grid cell, in [0, 1].
    pub jitter: f64,
    /// What particles do at the canvas edge.
    pub boundary: BoundaryPolicy,
}

impl Default for TurbulenceSettings {
    fn default() -> Self {
        Self {
            line_count: 400,
            line_length: 12.0,
            show_sources: true,
            mode: VisualizationMode::Vector,
            streamline_steps: 100,
            streamline_step_size: 2.0,
            bidirectional: false,
            particle_lifetime: 200,
            trail_length: 8,
            jitter: 0.0,
            boundary: BoundaryPolicy::Wrap,
        }
    }
}

impl TurbulenceSettings {
    pub fn sanitized(&self) -> Self {
        Self {
            line_count: clamp_usize("line_count", self.line_count, 1, MAX_LINE_COUNT),
            line_length: clamp_f64("line_length", self.line_length, MIN_LENGTH, f64::MAX),
            show_sources: self.show_sources,
            mode: self.mode,
            streamline_steps: clamp_usize(
                "streamline_steps",
                self.streamline_steps,
                1,
                MAX_STREAMLINE_STEPS,
            ),
            streamline_step_size: clamp_f64(
                "streamline_step_size",
                self.streamline_step_size,
                MIN_LENGTH,
                f64::MAX,
            ),
            bidirectional: self.bidirectional,
            particle_lifetime: self.particle_lifetime.max(1),
            trail_length: self.trail_length,
            jitter: clamp_f64("jitter", self.jitter, 0.0, 1.0),
            boundary: self.boundary,
        }
    }

    /// Applies the keys present in `params` over `self`, then sanitizes.
    ///
    /// `mode` takes a name; when absent the legacy `streamline_mode` and
    /// `flowing_mode` booleans are honoured. Unknown mode names keep the
    /// current mode.
    pub fn merge_json(&self, params: &Value) -> Self {
        let mode = match params.get("mode").and_then(Value::as_str) {
            Some(name) => VisualizationMode::from_name(name).unwrap_or(self.mode),
            None if params.get("streamline_mode").is_some()
                || params.get("flowing_mode").is_some() =>
            {
                VisualizationMode::from_flags(
                    param_bool(params, "streamline_mode", false),
                    param_bool(params, "flowing_mode", false),
                )
            }
            None => self.mode,
        };
        let lifetime = param_usize(params, "particle_lifetime", self.particle_lifetime as usize);
        Self {
            line_count: param_usize(params, "line_count", self.line_count),
            line_length: param_f64(params, "line_length", self.line_length),
            show_sources: param_bool(params, "show_sources", self.show_sources),
            mode,
            streamline_steps: param_usize(params, "streamline_steps", self.streamline_steps),
            streamline_step_size: param_f64(
                params,
                "streamline_step_size",
                self.streamline_step_size,
            ),
            bidirectional: param_bool(params, "bidirectional", self.bidirectional),
            particle_lifetime: u32::try_from(lifetime).unwrap_or(u32::MAX),
            trail_length: param_usize(params, "trail_length", self.trail_length),
            jitter: param_f64(params, "jitter", self.jitter),
            boundary: match params.get("boundary").and_then(Value::as_str) {
                Some("wrap") => BoundaryPolicy::Wrap,
                Some("respawn") => BoundaryPolicy::Respawn,
                _ => self.boundary,
            },
        }
        .sanitized()
    }

    pub fn from_json(params: &Value) -> Self {
        Self::default().merge_json(params)
    }
}

// ---------------------------------------------------------------------------
// Animation
// ---------------------------------------------------------------------------

/// Animation clock and noise intensity.
///
/// `time` only moves forward: it grows by `speed * dt` on every tick while
/// `is_animating` is set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationState {
    pub is_animating: bool,
    pub speed: f64,
    /// Multiplier on the noise contribution.
    pub intensity: f64,
    pub time: f64,
}

impl Default for AnimationState {
    fn default() -> Self {
        Self {
            is_animating: true,
            speed: 1.0,
            intensity: 1.0,
            time: 0.0,
        }
    }
}

impl AnimationState {
    pub fn sanitized(&self) -> Self {
        Self {
            is_animating: self.is_animating,
            speed: clamp_f64("animation.speed", self.speed, 0.0, f64::MAX),
            intensity: clamp_f64("animation.intensity", self.intensity, 0.0, f64::MAX),
            time: clamp_f64("animation.time", self.time, 0.0, f64::MAX),
        }
    }

    /// Applies the keys present in `params`. `time` is never rewound by a merge.
    pub fn merge_json(&self, params: &Value) -> Self {
        Self {
            is_animating: param_bool(params, "is_animating", self.is_animating),
            speed: param_f64(params, "speed", self.speed),
            intensity: param_f64(params, "intensity", self.intensity),
            time: param_f64(params, "time", self.time).max(self.time),
        }
        .sanitized()
    }

    pub fn from_json(params: &Value) -> Self {
        Self::default().merge_json(params)
    }

    /// Advances the clock by one tick of length `dt` and returns the new time.
    ///
    /// Paused clocks and non-positive or non-finite `dt` leave time unchanged.
    pub fn advance(&mut self, dt: f64) -> f64 {
        if self.is_animating && dt.is_finite() && dt > 0.0 {
            self.time += self.speed * dt;
        }
        self.time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn noise_zero_scale_is_clamped_to_epsilon() {
        let s = NoiseSettings {
            scale: 0.0,
            ..Default::default()
        }
        .sanitized();
        assert!(s.scale > 0.0, "scale must stay positive, got {}", s.scale);
        let neg = NoiseSettings {
            scale: -4.0,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(neg.scale, MIN_SCALE);
    }

    #[test]
    fn noise_zero_octaves_becomes_one() {
        let s = NoiseSettings {
            octaves: 0,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(s.octaves, 1);
    }

    #[test]
    fn noise_persistence_and_lacunarity_clamped() {
        let s = NoiseSettings {
            persistence: 0.0,
            lacunarity: 0.5,
            ..Default::default()
        }
        .sanitized();
        assert!(s.persistence > 0.0 && s.persistence <= 1.0);
        assert_eq!(s.lacunarity, 1.0);
    }

    #[test]
    fn noise_merge_json_keeps_unspecified_fields() {
        let base = NoiseSettings {
            scale: 80.0,
            ..Default::default()
        };
        let merged = base.merge_json(&json!({"octaves": 2, "basis": "perlin"}));
        assert_eq!(merged.scale, 80.0);
        assert_eq!(merged.octaves, 2);
        assert_eq!(merged.basis, NoiseBasis::Perlin);
    }

    #[test]
    fn noise_unknown_basis_keeps_current() {
        let merged = NoiseSettings::default().merge_json(&json!({"basis": "worley"}));
        assert_eq!(merged.basis, NoiseBasis::Value);
    }

    #[test]
    fn flow_negative_velocity_clamped_and_angle_normalized() {
        let f = FlowSettings::from_json(&json!({
            "enabled": true,
            "base_velocity": -3.0,
            "base_angle": -45.0,
        }));
        assert!(f.enabled);
        assert_eq!(f.base_velocity, 0.0);
        assert_eq!(f.base_angle, 315.0);
    }

    #[test]
    fn mode_from_name_accepts_known_names() {
        assert_eq!(
            VisualizationMode::from_name("streamline").unwrap(),
            VisualizationMode::Streamline
        );
        assert_eq!(
            VisualizationMode::from_name("flowing").unwrap(),
            VisualizationMode::Particle
        );
        assert!(matches!(
            VisualizationMode::from_name("hatching"),
            Err(EngineError::UnknownMode(_))
        ));
    }

    #[test]
    fn mode_names_round_trip() {
        for mode in VisualizationMode::ALL {
            assert_eq!(VisualizationMode::from_name(mode.name()).unwrap(), mode);
        }
    }

    #[test]
    fn legacy_flags_never_produce_two_modes() {
        assert_eq!(
            VisualizationMode::from_flags(true, true),
            VisualizationMode::Streamline
        );
        assert_eq!(
            VisualizationMode::from_flags(false, true),
            VisualizationMode::Particle
        );
        assert_eq!(
            VisualizationMode::from_flags(false, false),
            VisualizationMode::Vector
        );
    }

    #[test]
    fn turbulence_from_json_honours_legacy_flags() {
        let t = TurbulenceSettings::from_json(&json!({"flowing_mode": true}));
        assert_eq!(t.mode, VisualizationMode::Particle);
        let t = TurbulenceSettings::from_json(&json!({
            "mode": "vector",
            "streamline_mode": true,
        }));
        assert_eq!(t.mode, VisualizationMode::Vector, "explicit mode wins");
    }

    #[test]
    fn turbulence_zero_counts_clamped() {
        let t = TurbulenceSettings::from_json(&json!({
            "line_count": 0,
            "streamline_steps": 0,
            "streamline_step_size": -1.0,
            "line_length": 0.0,
            "particle_lifetime": 0,
            "jitter": 3.0,
        }));
        assert_eq!(t.line_count, 1);
        assert_eq!(t.streamline_steps, 1);
        assert_eq!(t.streamline_step_size, MIN_LENGTH);
        assert_eq!(t.line_length, MIN_LENGTH);
        assert_eq!(t.particle_lifetime, 1);
        assert_eq!(t.jitter, 1.0);
    }

    #[test]
    fn turbulence_boundary_policy_parses_by_name() {
        assert_eq!(TurbulenceSettings::default().boundary, BoundaryPolicy::Wrap);
        let t = TurbulenceSettings::from_json(&json!({"boundary": "respawn"}));
        assert_eq!(t.boundary, BoundaryPolicy::Respawn);
        let kept = t.merge_json(&json!({"boundary": "bounce"}));
        assert_eq!(kept.boundary, BoundaryPolicy::Respawn);
    }

    #[test]
    fn animation_advance_accumulates_speed_times_dt() {
        let mut a = AnimationState {
            speed: 2.0,
            ..Default::default()
        };
        a.advance(0.5);
        a.advance(0.25);
        assert!((a.time - 1.5).abs() < 1e-12, "time = {}", a.time);
    }

    #[test]
    fn animation_paused_or_bad_dt_does_not_move() {
        let mut a = AnimationState {
            is_animating: false,
            ..Default::default()
        };
        assert_eq!(a.advance(1.0), 0.0);
        a.is_animating = true;
        assert_eq!(a.advance(-1.0), 0.0);
        assert_eq!(a.advance(f64::NAN), 0.0);
    }

    #[test]
    fn animation_merge_never_rewinds_time() {
        let a = AnimationState {
            time: 10.0,
            ..Default::default()
        };
        let merged = a.merge_json(&json!({"time": 3.0, "speed": -1.0}));
        assert_eq!(merged.time, 10.0);
        assert_eq!(merged.speed, 0.0);
    }

    #[test]
    fn settings_deserialize_partial_json_with_defaults() {
        let t: TurbulenceSettings =
            serde_json::from_value(json!({"mode": "particle", "line_count": 50})).unwrap();
        assert_eq!(t.mode, VisualizationMode::Particle);
        assert_eq!(t.line_count, 50);
        assert_eq!(t.streamline_steps, TurbulenceSettings::default().streamline_steps);
    }
}
