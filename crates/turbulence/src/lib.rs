#![deny(unsafe_code)]
//! Turbulence engine.
//!
//! Composes analytic singularities (vortices, sources, sinks, uniform flow)
//! with an optional base flow and animated coherent noise, then draws the
//! resulting velocity field one of three ways: a static grid of direction
//! glyphs, streamlines traced from stable seeds, or particles advected from
//! frame to frame.
//!
//! The engine owns all mutable state (the source list, the animation clock,
//! the particle population). Every [`geometry`](Engine::geometry) call
//! evaluates against a fresh immutable snapshot of the sources.

use flowfield_core::bounds::Bounds;
use flowfield_core::error::EngineError;
use flowfield_core::evaluator::FieldEvaluator;
use flowfield_core::geometry::{FrameGeometry, Shapes};
use flowfield_core::grid::{glyphs, plan_jittered, plan_samples};
use flowfield_core::manager::SourceManager;
use flowfield_core::particles::ParticleAdvector;
use flowfield_core::scene::Scene;
use flowfield_core::settings::{
    AnimationState, FlowSettings, NoiseSettings, TurbulenceSettings, VisualizationMode,
    MAX_LINE_COUNT, MAX_OCTAVES, MAX_STREAMLINE_STEPS,
};
use flowfield_core::streamline::StreamlineIntegrator;
use flowfield_core::{DVec2, Engine};
use serde_json::{json, Value};

/// Mixed into the scene seed for the particle PRNG.
const PARTICLE_SEED_SALT: u64 = 0x5851_F42D_4C95_7F2D;
/// Mixed into the scene seed for streamline seed jitter.
const JITTER_SEED_SALT: u64 = 0x1405_7B7E_F767_814F;

/// Animated flow-field engine.
pub struct TurbulenceEngine {
    bounds: Bounds,
    seed: u64,
    manager: SourceManager,
    noise: NoiseSettings,
    flow: FlowSettings,
    turbulence: TurbulenceSettings,
    animation: AnimationState,
    /// Glyph positions, a regular grid.
    samples: Vec<DVec2>,
    /// Streamline seeds, the same grid with optional jitter.
    seeds: Vec<DVec2>,
    particles: ParticleAdvector,
}

impl TurbulenceEngine {
    /// Creates an engine with default settings and no sources.
    ///
    /// Returns `EngineError::InvalidDimensions` if width or height is not
    /// positive and finite.
    pub fn new(width: f64, height: f64, seed: u64) -> Result<Self, EngineError> {
        Self::from_scene(&Scene::new(width, height, seed))
    }

    /// Creates an engine from a JSON params object.
    ///
    /// Reads the nested `noise`, `flow`, `turbulence` and `animation`
    /// objects (missing keys fall back to defaults) and an optional
    /// `sources` array.
    pub fn from_json(
        width: f64,
        height: f64,
        seed: u64,
        params: &Value,
    ) -> Result<Self, EngineError> {
        Self::from_scene(&Scene::from_params(width, height, seed, params)?)
    }

    /// Creates an engine reproducing `scene`. Source ids are reassigned in
    /// list order starting at `"1"`.
    pub fn from_scene(scene: &Scene) -> Result<Self, EngineError> {
        scene.validate()?;
        let bounds = scene.bounds()?;
        let turbulence = scene.turbulence.sanitized();

        let mut manager = SourceManager::new(bounds, scene.seed);
        for source in &scene.sources {
            manager.add_source(source.clone());
        }

        let particles = ParticleAdvector::new(
            turbulence.line_count,
            bounds,
            turbulence.particle_lifetime,
            scene.seed ^ PARTICLE_SEED_SALT,
        )
        .with_policy(turbulence.boundary)
        .with_trail_length(turbulence.trail_length);

        let mut engine = Self {
            bounds,
            seed: scene.seed,
            manager,
            noise: scene.noise.sanitized(),
            flow: scene.flow.sanitized(),
            turbulence,
            animation: scene.animation.sanitized(),
            samples: Vec::new(),
            seeds: Vec::new(),
            particles,
        };
        engine.replan();
        log::info!(
            "turbulence engine {}x{} seed {}: {} mode, {} sources, {} lines",
            bounds.width(),
            bounds.height(),
            scene.seed,
            turbulence.mode.name(),
            engine.manager.len(),
            turbulence.line_count
        );
        Ok(engine)
    }

    /// The current state as a reproducible scene with zero frames.
    pub fn scene(&self) -> Scene {
        let mut scene = Scene::new(self.bounds.width(), self.bounds.height(), self.seed);
        scene.noise = self.noise;
        scene.flow = self.flow;
        scene.turbulence = self.turbulence;
        scene.animation = self.animation;
        scene.sources = self.manager.list().to_vec();
        scene
    }

    /// Immutable snapshot of the field as it is right now.
    pub fn evaluator(&self) -> FieldEvaluator {
        FieldEvaluator::new(
            self.manager.snapshot(),
            &self.noise,
            &self.flow,
            self.animation.intensity,
        )
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn sources(&self) -> &SourceManager {
        &self.manager
    }

    /// Mutable access for add/remove/update. Edits show up in the next
    /// [`geometry`](Engine::geometry) call.
    pub fn sources_mut(&mut self) -> &mut SourceManager {
        &mut self.manager
    }

    pub fn noise(&self) -> &NoiseSettings {
        &self.noise
    }

    pub fn flow(&self) -> &FlowSettings {
        &self.flow
    }

    pub fn turbulence(&self) -> &TurbulenceSettings {
        &self.turbulence
    }

    pub fn animation(&self) -> &AnimationState {
        &self.animation
    }

    pub fn mode(&self) -> VisualizationMode {
        self.turbulence.mode
    }

    pub fn particles(&self) -> &ParticleAdvector {
        &self.particles
    }

    /// Streamline seed points. Stable until the line count, jitter, bounds
    /// or seed change.
    pub fn seeds(&self) -> &[DVec2] {
        &self.seeds
    }

    pub fn set_noise(&mut self, noise: NoiseSettings) {
        self.noise = noise.sanitized();
    }

    pub fn set_flow(&mut self, flow: FlowSettings) {
        self.flow = flow.sanitized();
    }

    /// Replaces the visualization settings. A new line count or jitter
    /// replans the sample grid and resizes the particle population.
    pub fn set_turbulence(&mut self, turbulence: TurbulenceSettings) {
        let next = turbulence.sanitized();
        let prev = std::mem::replace(&mut self.turbulence, next);
        if next.line_count != prev.line_count || next.jitter != prev.jitter {
            self.replan();
            self.particles.reconfigure(next.line_count);
        }
        if next.mode != prev.mode {
            log::debug!("mode {} -> {}", prev.mode.name(), next.mode.name());
        }
        self.particles.set_lifetime(next.particle_lifetime);
        self.particles.set_trail_length(next.trail_length);
        self.particles.set_policy(next.boundary);
    }

    pub fn set_mode(&mut self, mode: VisualizationMode) {
        self.set_turbulence(TurbulenceSettings {
            mode,
            ..self.turbulence
        });
    }

    /// Replaces the animation state. Time never moves backwards here; use
    /// [`reset`](Self::reset) to rewind.
    pub fn set_animation(&mut self, animation: AnimationState) {
        let mut next = animation.sanitized();
        next.time = next.time.max(self.animation.time);
        self.animation = next;
    }

    /// Merges any of the `noise`, `flow`, `turbulence` and `animation`
    /// objects present in `params` over the current settings. The output
    /// of [`params`](Engine::params) is accepted unchanged.
    pub fn merge_params(&mut self, params: &Value) {
        if let Some(p) = params.get("noise") {
            self.set_noise(self.noise.merge_json(p));
        }
        if let Some(p) = params.get("flow") {
            self.set_flow(self.flow.merge_json(p));
        }
        if let Some(p) = params.get("turbulence") {
            self.set_turbulence(self.turbulence.merge_json(p));
        }
        if let Some(p) = params.get("animation") {
            self.set_animation(self.animation.merge_json(p));
        }
    }

    /// Rewinds time to zero and re-randomizes everything derived from the
    /// seed: particles and jittered streamline seeds. Sources are kept.
    pub fn reset(&mut self, seed: u64) {
        self.seed = seed;
        self.animation.time = 0.0;
        self.particles.reset(seed ^ PARTICLE_SEED_SALT);
        self.replan();
        log::info!("turbulence engine reset with seed {seed}");
    }

    /// Changes the canvas size. Sources keep their positions; seeds and
    /// particles are redistributed over the new canvas.
    pub fn resize(&mut self, width: f64, height: f64) -> Result<(), EngineError> {
        self.bounds = Bounds::from_size(width, height)?;
        self.manager.set_bounds(self.bounds);
        self.particles.set_bounds(self.bounds);
        self.replan();
        Ok(())
    }

    fn replan(&mut self) {
        let count = self.turbulence.line_count;
        self.samples = plan_samples(count, &self.bounds);
        self.seeds = plan_jittered(
            count,
            &self.bounds,
            self.turbulence.jitter,
            self.seed ^ JITTER_SEED_SALT,
        );
    }
}

impl Engine for TurbulenceEngine {
    /// Advances the clock by `speed * dt`. In particle mode the population
    /// moves by `v * speed * dt`. Paused engines and non-finite or negative
    /// `dt` leave everything unchanged.
    fn step(&mut self, dt: f64) -> Result<(), EngineError> {
        if !self.animation.is_animating {
            return Ok(());
        }
        if !dt.is_finite() || dt < 0.0 {
            log::debug!("ignoring tick with dt = {dt}");
            return Ok(());
        }
        let time = self.animation.advance(dt);
        if self.turbulence.mode == VisualizationMode::Particle {
            let field = self.evaluator();
            self.particles
                .step(&field, time, dt * self.animation.speed);
        }
        Ok(())
    }

    fn geometry(&self) -> FrameGeometry {
        let field = self.evaluator();
        let time = self.animation.time;
        let shapes = match self.turbulence.mode {
            VisualizationMode::Vector => Shapes::Glyphs(glyphs(
                &field,
                &self.samples,
                self.turbulence.line_length,
                time,
            )),
            VisualizationMode::Streamline => {
                let integrator = StreamlineIntegrator::from_settings(&self.turbulence, self.bounds);
                Shapes::Streamlines(integrator.trace_all(&field, &self.seeds, time))
            }
            VisualizationMode::Particle => Shapes::Particles(self.particles.marks()),
        };
        let sources = if self.turbulence.show_sources {
            field.sources().to_vec()
        } else {
            Vec::new()
        };
        FrameGeometry {
            bounds: self.bounds,
            time,
            shapes,
            sources,
        }
    }

    fn params(&self) -> Value {
        let n = &self.noise;
        let f = &self.flow;
        let t = &self.turbulence;
        let a = &self.animation;
        json!({
            "width": self.bounds.width(),
            "height": self.bounds.height(),
            "seed": self.seed,
            "source_count": self.manager.len(),
            "noise": {
                "scale": n.scale,
                "octaves": n.octaves,
                "persistence": n.persistence,
                "lacunarity": n.lacunarity,
                "seed": n.seed,
                "basis": n.basis.name(),
            },
            "flow": {
                "enabled": f.enabled,
                "base_velocity": f.base_velocity,
                "base_angle": f.base_angle,
            },
            "turbulence": {
                "line_count": t.line_count,
                "line_length": t.line_length,
                "show_sources": t.show_sources,
                "mode": t.mode.name(),
                "streamline_steps": t.streamline_steps,
                "streamline_step_size": t.streamline_step_size,
                "bidirectional": t.bidirectional,
                "particle_lifetime": t.particle_lifetime,
                "trail_length": t.trail_length,
                "jitter": t.jitter,
                "boundary": t.boundary.name(),
            },
            "animation": {
                "is_animating": a.is_animating,
                "speed": a.speed,
                "intensity": a.intensity,
                "time": a.time,
            },
        })
    }

    fn param_schema(&self) -> Value {
        let noise = NoiseSettings::default();
        let flow = FlowSettings::default();
        let turbulence = TurbulenceSettings::default();
        let animation = AnimationState::default();
        json!({
            "noise": {
                "scale": {
                    "type": "number",
                    "default": noise.scale,
                    "min": 0.0,
                    "description": "Feature size of the first octave in canvas units"
                },
                "octaves": {
                    "type": "integer",
                    "default": noise.octaves,
                    "min": 1,
                    "max": MAX_OCTAVES,
                    "description": "Number of summed noise layers"
                },
                "persistence": {
                    "type": "number",
                    "default": noise.persistence,
                    "min": 0.0,
                    "max": 1.0,
                    "description": "Amplitude multiplier per octave"
                },
                "lacunarity": {
                    "type": "number",
                    "default": noise.lacunarity,
                    "min": 1.0,
                    "max": 16.0,
                    "description": "Frequency multiplier per octave"
                },
                "seed": {
                    "type": "number",
                    "default": noise.seed,
                    "description": "Noise seed; equal seeds give identical noise"
                },
                "basis": {
                    "type": "string",
                    "default": noise.basis.name(),
                    "enum": ["value", "perlin"],
                    "description": "Lattice function used by each octave"
                }
            },
            "flow": {
                "enabled": {
                    "type": "boolean",
                    "default": flow.enabled,
                    "description": "Add a global uniform flow"
                },
                "base_velocity": {
                    "type": "number",
                    "default": flow.base_velocity,
                    "min": 0.0,
                    "description": "Speed of the global flow"
                },
                "base_angle": {
                    "type": "number",
                    "default": flow.base_angle,
                    "min": 0.0,
                    "max": 360.0,
                    "description": "Direction of the global flow in degrees"
                }
            },
            "turbulence": {
                "line_count": {
                    "type": "integer",
                    "default": turbulence.line_count,
                    "min": 1,
                    "max": MAX_LINE_COUNT,
                    "description": "Number of glyphs, streamlines or particles"
                },
                "line_length": {
                    "type": "number",
                    "default": turbulence.line_length,
                    "min": 0.0,
                    "description": "Glyph length in canvas units"
                },
                "show_sources": {
                    "type": "boolean",
                    "default": turbulence.show_sources,
                    "description": "Include source markers in the frame"
                },
                "mode": {
                    "type": "string",
                    "default": turbulence.mode.name(),
                    "enum": VisualizationMode::ALL.map(VisualizationMode::name),
                    "description": "How the field is drawn"
                },
                "streamline_steps": {
                    "type": "integer",
                    "default": turbulence.streamline_steps,
                    "min": 1,
                    "max": MAX_STREAMLINE_STEPS,
                    "description": "Maximum integration steps per streamline"
                },
                "streamline_step_size": {
                    "type": "number",
                    "default": turbulence.streamline_step_size,
                    "min": 0.0,
                    "description": "Arc length of one integration step"
                },
                "bidirectional": {
                    "type": "boolean",
                    "default": turbulence.bidirectional,
                    "description": "Trace streamlines backward as well as forward"
                },
                "particle_lifetime": {
                    "type": "integer",
                    "default": turbulence.particle_lifetime,
                    "min": 1,
                    "description": "Frames a particle lives before respawning"
                },
                "trail_length": {
                    "type": "integer",
                    "default": turbulence.trail_length,
                    "min": 0,
                    "description": "Past positions drawn behind each particle"
                },
                "jitter": {
                    "type": "number",
                    "default": turbulence.jitter,
                    "min": 0.0,
                    "max": 1.0,
                    "description": "Streamline seed jitter as a fraction of a grid cell"
                },
                "boundary": {
                    "type": "string",
                    "default": turbulence.boundary.name(),
                    "enum": ["wrap", "respawn"],
                    "description": "What particles do at the canvas edge"
                }
            },
            "animation": {
                "is_animating": {
                    "type": "boolean",
                    "default": animation.is_animating,
                    "description": "Advance time on each step"
                },
                "speed": {
                    "type": "number",
                    "default": animation.speed,
                    "min": 0.0,
                    "description": "Time units per second of dt"
                },
                "intensity": {
                    "type": "number",
                    "default": animation.intensity,
                    "min": 0.0,
                    "description": "Multiplier on the noise contribution"
                },
                "time": {
                    "type": "number",
                    "default": animation.time,
                    "min": 0.0,
                    "description": "Current animation time"
                }
            }
        })
    }

    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn time(&self) -> f64 {
        self.animation.time
    }
}
