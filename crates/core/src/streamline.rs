//! Streamline tracing by constant arc-length stepping.
//!
//! Every step moves exactly `step_size` along the normalized local velocity,
//! so line spacing does not depend on how fast the field is. A trace stops
//! when the field vanishes, when it folds back on itself (it has run into a
//! sink or a stagnation point), when the next point would leave the bounds,
//! or after `steps` steps.

use glam::DVec2;

use crate::bounds::Bounds;
use crate::field_source::FieldSource;
use crate::geometry::Polyline;
use crate::params::{clamp_f64, clamp_usize};
use crate::settings::{TurbulenceSettings, MAX_STREAMLINE_STEPS, MIN_LENGTH};

/// Speeds below this count as a vanished field.
pub const STALL_EPS: f64 = 1e-9;
/// A step whose direction has cosine below this with the previous step's
/// direction is a fold-back.
pub const REVERSAL_COS: f64 = -0.5;

/// Traces polylines through any [`FieldSource`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamlineIntegrator {
    steps: usize,
    step_size: f64,
    bounds: Bounds,
    bidirectional: bool,
}

impl StreamlineIntegrator {
    /// Zero steps and non-positive step sizes are clamped to the smallest usable values.
    pub fn new(steps: usize, step_size: f64, bounds: Bounds) -> Self {
        Self {
            steps: clamp_usize("streamline_steps", steps, 1, MAX_STREAMLINE_STEPS),
            step_size: clamp_f64("streamline_step_size", step_size, MIN_LENGTH, f64::MAX),
            bounds,
            bidirectional: false,
        }
    }

    pub fn from_settings(settings: &TurbulenceSettings, bounds: Bounds) -> Self {
        Self::new(
            settings.streamline_steps,
            settings.streamline_step_size,
            bounds,
        )
        .with_bidirectional(settings.bidirectional)
    }

    /// Makes [`trace_all`](Self::trace_all) trace both ways from each seed.
    pub fn with_bidirectional(mut self, bidirectional: bool) -> Self {
        self.bidirectional = bidirectional;
        self
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn step_size(&self) -> f64 {
        self.step_size
    }

    /// Traces forward from `seed`. The result starts at `seed` and holds at
    /// most `steps + 1` points.
    pub fn trace<F: FieldSource + ?Sized>(&self, field: &F, seed: DVec2, time: f64) -> Vec<DVec2> {
        self.march(field, seed, time, 1.0)
    }

    /// Traces backward and forward from `seed` and joins the halves, so the
    /// seed sits somewhere in the middle. At most `2 * steps + 1` points.
    pub fn trace_bidirectional<F: FieldSource + ?Sized>(
        &self,
        field: &F,
        seed: DVec2,
        time: f64,
    ) -> Vec<DVec2> {
        let mut points = self.march(field, seed, time, -1.0);
        points.reverse();
        let forward = self.march(field, seed, time, 1.0);
        points.extend(forward.into_iter().skip(1));
        points
    }

    /// Traces one polyline per seed, dropping traces that never left their seed.
    pub fn trace_all<F: FieldSource + ?Sized>(
        &self,
        field: &F,
        seeds: &[DVec2],
        time: f64,
    ) -> Vec<Polyline> {
        seeds
            .iter()
            .map(|&seed| {
                if self.bidirectional {
                    self.trace_bidirectional(field, seed, time)
                } else {
                    self.trace(field, seed, time)
                }
            })
            .filter(|points| points.len() > 1)
            .map(Polyline::new)
            .collect()
    }

    fn march<F: FieldSource + ?Sized>(
        &self,
        field: &F,
        seed: DVec2,
        time: f64,
        sign: f64,
    ) -> Vec<DVec2> {
        let mut points = Vec::with_capacity(self.steps + 1);
        if !seed.is_finite() {
            return points;
        }
        points.push(seed);

        let mut current = seed;
        let mut previous_dir: Option<DVec2> = None;
        for _ in 0..self.steps {
            let v = field.sample(current.x, current.y, time) * sign;
            let speed = v.length();
            // negated comparison also catches NaN
            if !(speed >= STALL_EPS) {
                log::trace!("streamline stalled at {current} after {} points", points.len());
                break;
            }
            let dir = v / speed;
            if previous_dir.is_some_and(|prev| prev.dot(dir) < REVERSAL_COS) {
                log::trace!("streamline folded back at {current}");
                break;
            }
            let next = current + dir * self.step_size;
            if !self.bounds.contains(next) {
                break;
            }
            points.push(next);
            current = next;
            previous_dir = Some(dir);
        }
        points
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::FieldEvaluator;
    use crate::field_source::{SingularitySource, SourceKind};

    fn canvas() -> Bounds {
        Bounds::from_size(200.0, 200.0).unwrap()
    }

    fn uniform_right() -> FieldEvaluator {
        FieldEvaluator::from_sources(vec![SingularitySource::new(
            "1",
            SourceKind::Uniform,
            0.0,
            0.0,
        )])
    }

    #[test]
    fn trace_never_exceeds_steps_plus_one() {
        let integrator = StreamlineIntegrator::new(25, 1.0, canvas());
        let line = integrator.trace(&uniform_right(), DVec2::new(10.0, 100.0), 0.0);
        assert_eq!(line.len(), 26);
    }

    #[test]
    fn steps_have_constant_arc_length() {
        // magnitude varies with distance but steps must not
        let vortex = FieldEvaluator::from_sources(vec![SingularitySource::new(
            "1",
            SourceKind::Vortex,
            100.0,
            100.0,
        )]);
        let integrator = StreamlineIntegrator::new(40, 2.0, canvas());
        let line = integrator.trace(&vortex, DVec2::new(150.0, 100.0), 0.0);
        assert!(line.len() > 10);
        for w in line.windows(2) {
            let d = w[0].distance(w[1]);
            assert!((d - 2.0).abs() < 1e-9, "step length {d}");
        }
    }

    #[test]
    fn trace_seeded_on_sink_terminates_immediately() {
        let sink = FieldEvaluator::from_sources(vec![SingularitySource::new(
            "1",
            SourceKind::Sink,
            100.0,
            100.0,
        )]);
        let integrator = StreamlineIntegrator::new(500, 5.0, canvas());
        let line = integrator.trace(&sink, DVec2::new(100.0, 100.0), 0.0);
        assert_eq!(line, vec![DVec2::new(100.0, 100.0)]);
    }

    #[test]
    fn trace_into_sink_stops_within_a_few_steps() {
        let sink = FieldEvaluator::from_sources(vec![SingularitySource::new(
            "1",
            SourceKind::Sink,
            100.0,
            100.0,
        )]);
        let integrator = StreamlineIntegrator::new(500, 5.0, canvas());
        let line = integrator.trace(&sink, DVec2::new(123.0, 100.0), 0.0);
        assert!(line.len() < 10, "trace ran {} points into the sink", line.len());
        let last = *line.last().unwrap();
        assert!(last.distance(DVec2::new(100.0, 100.0)) <= 5.0, "stopped at {last}");
    }

    #[test]
    fn trace_stops_before_leaving_bounds() {
        let integrator = StreamlineIntegrator::new(1000, 3.0, canvas());
        let line = integrator.trace(&uniform_right(), DVec2::new(180.0, 50.0), 0.0);
        assert!(line.len() < 1001);
        assert!(line.iter().all(|p| canvas().contains(*p)));
        assert!(line.last().unwrap().x > 197.0 - 1e-9);
    }

    #[test]
    fn trace_in_empty_field_is_just_the_seed() {
        let empty = FieldEvaluator::from_sources(Vec::<SingularitySource>::new());
        let integrator = StreamlineIntegrator::new(10, 1.0, canvas());
        assert_eq!(integrator.trace(&empty, DVec2::new(5.0, 5.0), 0.0).len(), 1);
    }

    #[test]
    fn trace_is_reproducible() {
        let field = FieldEvaluator::new(
            std::sync::Arc::from(vec![SingularitySource::new("1", SourceKind::Vortex, 80.0, 90.0)]),
            &crate::settings::NoiseSettings::default(),
            &crate::settings::FlowSettings::default(),
            0.8,
        );
        let integrator = StreamlineIntegrator::new(60, 1.5, canvas());
        let a = integrator.trace(&field, DVec2::new(30.0, 40.0), 2.0);
        let b = integrator.trace(&field, DVec2::new(30.0, 40.0), 2.0);
        assert_eq!(a, b);
    }

    #[test]
    fn bidirectional_extends_both_ways() {
        let integrator = StreamlineIntegrator::new(10, 1.0, canvas());
        let seed = DVec2::new(100.0, 100.0);
        let line = integrator.trace_bidirectional(&uniform_right(), seed, 0.0);
        assert_eq!(line.len(), 21);
        assert!((line[0].x - 90.0).abs() < 1e-9);
        assert_eq!(line[10], seed);
        assert!((line[20].x - 110.0).abs() < 1e-9);
        assert!(line.windows(2).all(|w| w[1].x > w[0].x));
    }

    #[test]
    fn trace_all_drops_degenerate_lines() {
        let sink = FieldEvaluator::from_sources(vec![SingularitySource::new(
            "1",
            SourceKind::Sink,
            100.0,
            100.0,
        )]);
        let integrator = StreamlineIntegrator::new(20, 2.0, canvas());
        let seeds = [DVec2::new(100.0, 100.0), DVec2::new(150.0, 150.0)];
        let lines = integrator.trace_all(&sink, &seeds, 0.0);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].points[0], seeds[1]);
    }

    #[test]
    fn invalid_parameters_are_clamped() {
        let integrator = StreamlineIntegrator::new(0, -2.0, canvas());
        assert_eq!(integrator.steps(), 1);
        assert_eq!(integrator.step_size(), MIN_LENGTH);
    }

    #[test]
    fn non_finite_seed_yields_nothing() {
        let integrator = StreamlineIntegrator::new(10, 1.0, canvas());
        let line = integrator.trace(&uniform_right(), DVec2::new(f64::NAN, 1.0), 0.0);
        assert!(line.is_empty());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn length_bounded_and_points_in_bounds(
                sx in 0.0_f64..200.0,
                sy in 0.0_f64..200.0,
                vx in 0.0_f64..200.0,
                vy in 0.0_f64..200.0,
                steps in 1_usize..300,
                step_size in 0.1_f64..10.0,
            ) {
                let field = FieldEvaluator::from_sources(vec![
                    SingularitySource::new("1", SourceKind::Vortex, vx, vy),
                    SingularitySource::new("2", SourceKind::Sink, vy, vx),
                ]);
                let integrator = StreamlineIntegrator::new(steps, step_size, canvas());
                let line = integrator.trace(&field, DVec2::new(sx, sy), 0.0);
                prop_assert!(line.len() <= steps + 1);
                prop_assert!(line.iter().skip(1).all(|p| canvas().contains(*p)));
            }
        }
    }
}
