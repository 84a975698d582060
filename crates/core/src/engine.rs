//! The `Engine` trait every frame-driven flow visualization implements.
//!
//! The trait is object-safe so engines can be driven as `dyn Engine` by the
//! CLI and exporters without knowing the concrete type.

use serde_json::Value;

use crate::bounds::Bounds;
use crate::error::EngineError;
use crate::geometry::FrameGeometry;

/// A frame-driven generator of renderer-agnostic geometry.
///
/// Each call to [`step`](Engine::step) advances the animation by one tick;
/// [`geometry`](Engine::geometry) reports what the current frame looks like.
pub trait Engine {
    /// Advance the animation by one tick of `dt` seconds.
    fn step(&mut self, dt: f64) -> Result<(), EngineError>;

    /// Geometry for the current frame in the active visualization mode.
    fn geometry(&self) -> FrameGeometry;

    /// Current parameter values as a JSON object.
    fn params(&self) -> Value;

    /// Schema describing all available parameters, their types, ranges, and defaults.
    fn param_schema(&self) -> Value;

    /// The canvas rectangle geometry is produced in.
    fn bounds(&self) -> Bounds;

    /// Current animation time. Must not build a frame to answer.
    fn time(&self) -> f64;
}
