//! Axis-aligned rectangular canvas bounds.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// An axis-aligned rectangle in canvas units, `min` inclusive to `max` inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    min: DVec2,
    max: DVec2,
}

impl Bounds {
    /// Creates bounds with origin `(x, y)` and the given size.
    ///
    /// Returns `EngineError::InvalidDimensions` if the size is not positive
    /// and finite or the origin is not finite.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Result<Self, EngineError> {
        let valid = x.is_finite()
            && y.is_finite()
            && width.is_finite()
            && height.is_finite()
            && width > 0.0
            && height > 0.0;
        if !valid {
            return Err(EngineError::InvalidDimensions);
        }
        Ok(Self {
            min: DVec2::new(x, y),
            max: DVec2::new(x + width, y + height),
        })
    }

    /// Bounds anchored at the origin, the usual canvas rectangle.
    pub fn from_size(width: f64, height: f64) -> Result<Self, EngineError> {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn min(&self) -> DVec2 {
        self.min
    }

    pub fn max(&self) -> DVec2 {
        self.max
    }

    pub fn size(&self) -> DVec2 {
        self.max - self.min
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }

    /// True if `p` lies inside or on the edge of the rectangle.
    pub fn contains(&self, p: DVec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Wraps `p` toroidally into `[min, max)` on both axes.
    pub fn wrap(&self, p: DVec2) -> DVec2 {
        let size = self.size();
        let rel = p - self.min;
        DVec2::new(
            self.min.x + rel.x.rem_euclid(size.x),
            self.min.y + rel.y.rem_euclid(size.y),
        )
    }
}
