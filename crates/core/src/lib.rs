#![deny(unsafe_code)]
//! Core types and algorithms for the flowfield engine.
//!
//! Provides analytic flow singularities (`SingularitySource`), multi-octave
//! coherent noise (`NoiseField`), the combined `FieldEvaluator`, the
//! `SourceManager`, streamline tracing, particle advection, sample-grid
//! planning, renderer-agnostic geometry, the `Engine` trait and `Scene`.

pub mod bounds;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod field_source;
pub mod geometry;
pub mod grid;
pub mod manager;
pub mod noise;
pub mod params;
pub mod particles;
pub mod prng;
pub mod scene;
pub mod settings;
pub mod streamline;

pub use bounds::Bounds;
pub use engine::Engine;
pub use error::EngineError;
pub use evaluator::FieldEvaluator;
pub use field_source::{FieldSource, SingularitySource, SourceKind, SourcePatch};
pub use geometry::{FrameGeometry, Glyph, ParticleMark, Polyline, Shapes};
pub use manager::SourceManager;
pub use noise::NoiseField;
pub use particles::{BoundaryPolicy, Particle, ParticleAdvector};
pub use prng::Xorshift64;
pub use scene::Scene;
pub use settings::{
    AnimationState, FlowSettings, NoiseBasis, NoiseSettings, TurbulenceSettings,
    VisualizationMode,
};
pub use streamline::StreamlineIntegrator;

pub use glam::DVec2;
