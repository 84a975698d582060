//! Reproducible description of a flow-field piece.
//!
//! A [`Scene`] captures everything needed to recreate a frame sequence:
//! canvas size, PRNG seed, every settings snapshot, the source list, and how
//! many ticks of which length to run. Two identical scenes fed to the same
//! binary produce identical geometry.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::bounds::Bounds;
use crate::error::EngineError;
use crate::field_source::SingularitySource;
use crate::params::{param_f64, param_usize};
use crate::settings::{AnimationState, FlowSettings, NoiseSettings, TurbulenceSettings};

/// Default tick length, one frame at 60 fps.
pub const DEFAULT_DT: f64 = 1.0 / 60.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub width: f64,
    pub height: f64,
    pub seed: u64,
    /// Ticks to run before the frame is captured.
    #[serde(default)]
    pub frames: usize,
    #[serde(default = "default_dt")]
    pub dt: f64,
    #[serde(default)]
    pub noise: NoiseSettings,
    #[serde(default)]
    pub flow: FlowSettings,
    #[serde(default)]
    pub turbulence: TurbulenceSettings,
    #[serde(default)]
    pub animation: AnimationState,
    #[serde(default)]
    pub sources: Vec<SingularitySource>,
}

fn default_dt() -> f64 {
    DEFAULT_DT
}

impl Scene {
    /// A scene with default settings, no sources and zero frames.
    pub fn new(width: f64, height: f64, seed: u64) -> Self {
        Self {
            width,
            height,
            seed,
            frames: 0,
            dt: DEFAULT_DT,
            noise: NoiseSettings::default(),
            flow: FlowSettings::default(),
            turbulence: TurbulenceSettings::default(),
            animation: AnimationState::default(),
            sources: Vec::new(),
        }
    }

    /// Builds a scene from loose JSON params. Top-level `frames` and `dt`
    /// are read directly; `noise`, `flow`, `turbulence` and `animation`
    /// objects are merged over the defaults; `sources` must deserialize.
    pub fn from_params(
        width: f64,
        height: f64,
        seed: u64,
        params: &Value,
    ) -> Result<Self, EngineError> {
        let section = |key: &str| params.get(key).cloned().unwrap_or(Value::Null);
        let sources = match params.get("sources") {
            Some(list) => serde_json::from_value(list.clone())?,
            None => Vec::new(),
        };
        Ok(Self {
            width,
            height,
            seed,
            frames: param_usize(params, "frames", 0),
            dt: param_f64(params, "dt", DEFAULT_DT),
            noise: NoiseSettings::from_json(&section("noise")),
            flow: FlowSettings::from_json(&section("flow")),
            turbulence: TurbulenceSettings::from_json(&section("turbulence")),
            animation: AnimationState::from_json(&section("animation")),
            sources,
        })
    }

    /// Canvas rectangle anchored at the origin.
    pub fn bounds(&self) -> Result<Bounds, EngineError> {
        Bounds::from_size(self.width, self.height)
    }

    /// Checks the canvas is usable and the tick length is sane.
    pub fn validate(&self) -> Result<(), EngineError> {
        self.bounds()?;
        if !self.dt.is_finite() || self.dt < 0.0 {
            return Err(EngineError::InvalidScene(format!(
                "dt must be finite and non-negative, got {}",
                self.dt
            )));
        }
        if let Some(bad) = self
            .sources
            .iter()
            .find(|s| !(s.x.is_finite() && s.y.is_finite() && s.strength.is_finite()))
        {
            return Err(EngineError::InvalidScene(format!(
                "source {:?} has non-finite position or strength",
                bad.name
            )));
        }
        Ok(())
    }
}
