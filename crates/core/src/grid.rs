//! Sample-point planning for glyphs and streamline seeds.
//!
//! Points are the centres of a near-square grid whose aspect follows the
//! canvas, read in row-major order and truncated to the requested count.

use glam::DVec2;

use crate::bounds::Bounds;
use crate::field_source::FieldSource;
use crate::geometry::Glyph;
use crate::params::clamp_f64;
use crate::prng::Xorshift64;

/// Column and row counts for `count` cells over a `width` x `height` canvas.
///
/// `cols * rows >= count` always holds; `(0, 0)` for zero cells.
pub fn layout(count: usize, width: f64, height: f64) -> (usize, usize) {
    if count == 0 {
        return (0, 0);
    }
    let aspect = if width > 0.0 && height > 0.0 {
        width / height
    } else {
        1.0
    };
    let cols = ((count as f64 * aspect).sqrt().ceil() as usize).clamp(1, count);
    let rows = count.div_ceil(cols);
    (cols, rows)
}

/// Exactly `count` cell centres inside `bounds`, deterministic for a given
/// input.
pub fn plan_samples(count: usize, bounds: &Bounds) -> Vec<DVec2> {
    let (cols, rows) = layout(count, bounds.width(), bounds.height());
    if cols == 0 {
        return Vec::new();
    }
    let cell = DVec2::new(bounds.width() / cols as f64, bounds.height() / rows as f64);
    let origin = bounds.min();
    (0..rows)
        .flat_map(|row| (0..cols).map(move |col| (col, row)))
        .take(count)
        .map(|(col, row)| origin + cell * DVec2::new(col as f64 + 0.5, row as f64 + 0.5))
        .collect()
}

/// Like [`plan_samples`] but each point is displaced by up to `jitter`
/// (a fraction in [0, 1] of half the cell size) in each axis. The offsets
/// come from `seed`, so the plan is still reproducible and points never
/// leave their cell.
pub fn plan_jittered(count: usize, bounds: &Bounds, jitter: f64, seed: u64) -> Vec<DVec2> {
    let jitter = clamp_f64("jitter", jitter, 0.0, 1.0);
    let mut points = plan_samples(count, bounds);
    if jitter == 0.0 || points.is_empty() {
        return points;
    }
    let (cols, rows) = layout(count, bounds.width(), bounds.height());
    let half_cell = DVec2::new(
        bounds.width() / cols as f64,
        bounds.height() / rows as f64,
    ) * 0.5;
    let mut rng = Xorshift64::new(seed);
    for p in &mut points {
        let offset = DVec2::new(rng.next_range(-1.0, 1.0), rng.next_range(-1.0, 1.0));
        *p = (*p + offset * half_cell * jitter).clamp(bounds.min(), bounds.max());
    }
    points
}

/// A glyph starting at `point`, `length` long, oriented along `velocity`.
pub fn glyph_at(point: DVec2, velocity: DVec2, length: f64) -> Glyph {
    Glyph::new(point, velocity, length)
}

/// One glyph per sample point, sampled from `field` at `time`.
pub fn glyphs<F: FieldSource + ?Sized>(
    field: &F,
    points: &[DVec2],
    length: f64,
    time: f64,
) -> Vec<Glyph> {
    points
        .iter()
        .map(|&p| glyph_at(p, field.sample(p.x, p.y, time), length))
        .collect()
}
