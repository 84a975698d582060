//! Renderer-agnostic frame output.
//!
//! Everything a renderer or exporter needs is plain points and segments;
//! nothing here knows about colours, canvases or SVG.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::bounds::Bounds;
use crate::field_source::SingularitySource;
use crate::settings::VisualizationMode;

/// An ordered run of points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    pub points: Vec<DVec2>,
}

impl Polyline {
    pub fn new(points: Vec<DVec2>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Sum of segment lengths.
    pub fn arc_length(&self) -> f64 {
        self.points.windows(2).map(|w| w[0].distance(w[1])).sum()
    }
}

/// A direction glyph: a fixed-length segment from `origin` along the local
/// field direction. `magnitude` is the raw field speed, left for the renderer
/// to map onto opacity or width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Glyph {
    pub origin: DVec2,
    pub end: DVec2,
    pub magnitude: f64,
}

impl Glyph {
    /// Builds a glyph of `length` along `velocity`. A vanishing velocity
    /// yields a zero-length glyph at `origin`.
    pub fn new(origin: DVec2, velocity: DVec2, length: f64) -> Self {
        let magnitude = velocity.length();
        let end = match velocity.try_normalize() {
            Some(dir) => origin + dir * length,
            None => origin,
        };
        Self {
            origin,
            end,
            magnitude,
        }
    }

    pub fn direction(&self) -> DVec2 {
        (self.end - self.origin).normalize_or_zero()
    }
}

/// A particle's head position plus its recent trail (oldest first).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleMark {
    pub position: DVec2,
    pub trail: Vec<DVec2>,
    pub age: u32,
}

/// The shapes drawn for one frame, one variant per visualization mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "items", rename_all = "snake_case")]
pub enum Shapes {
    Glyphs(Vec<Glyph>),
    Streamlines(Vec<Polyline>),
    Particles(Vec<ParticleMark>),
}

impl Shapes {
    pub fn mode(&self) -> VisualizationMode {
        match self {
            Shapes::Glyphs(_) => VisualizationMode::Vector,
            Shapes::Streamlines(_) => VisualizationMode::Streamline,
            Shapes::Particles(_) => VisualizationMode::Particle,
        }
    }

    /// Number of shape elements (glyphs, polylines or particles).
    pub fn len(&self) -> usize {
        match self {
            Shapes::Glyphs(g) => g.len(),
            Shapes::Streamlines(s) => s.len(),
            Shapes::Particles(p) => p.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Complete output of one frame: the canvas rectangle, the animation time
/// it was computed at, the shapes, and the source markers to draw (empty
/// when sources are hidden).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameGeometry {
    pub bounds: Bounds,
    pub time: f64,
    pub shapes: Shapes,
    pub sources: Vec<SingularitySource>,
}
