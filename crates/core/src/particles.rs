//! Frame-to-frame particle advection.
//!
//! Each tick moves every particle by `v * dt` (explicit Euler), ages it by
//! one frame, and respawns it at a random in-bounds point once it is too old
//! or its position stops being finite. Particles that leave the canvas wrap
//! around toroidally by default.

use std::collections::VecDeque;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::bounds::Bounds;
use crate::field_source::FieldSource;
use crate::geometry::ParticleMark;
use crate::prng::Xorshift64;

/// What happens to a particle that crosses the canvas edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Re-enter from the opposite edge.
    #[default]
    Wrap,
    /// Respawn at a random point with age 0.
    Respawn,
}

impl BoundaryPolicy {
    pub fn name(self) -> &'static str {
        match self {
            BoundaryPolicy::Wrap => "wrap",
            BoundaryPolicy::Respawn => "respawn",
        }
    }
}

/// A single advected point. `trail` holds previous positions, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub position: DVec2,
    pub age: u32,
    pub trail: VecDeque<DVec2>,
}

impl Particle {
    fn spawn(position: DVec2, age: u32) -> Self {
        Self {
            position,
            age,
            trail: VecDeque::new(),
        }
    }
}

/// A fixed-size particle population.
///
/// The population only changes size through [`reconfigure`](Self::reconfigure).
#[derive(Debug, Clone)]
pub struct ParticleAdvector {
    particles: Vec<Particle>,
    bounds: Bounds,
    lifetime: u32,
    trail_length: usize,
    policy: BoundaryPolicy,
    rng: Xorshift64,
}

impl ParticleAdvector {
    /// Spawns `count` particles at random positions. Initial ages are
    /// staggered over the lifetime so respawns spread across frames.
    pub fn new(count: usize, bounds: Bounds, lifetime: u32, seed: u64) -> Self {
        let mut advector = Self {
            particles: Vec::with_capacity(count),
            bounds,
            lifetime: lifetime.max(1),
            trail_length: 0,
            policy: BoundaryPolicy::Wrap,
            rng: Xorshift64::new(seed),
        };
        advector.reconfigure(count);
        advector
    }

    pub fn with_policy(mut self, policy: BoundaryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Number of past positions kept per particle; 0 disables trails.
    pub fn with_trail_length(mut self, trail_length: usize) -> Self {
        self.trail_length = trail_length;
        self
    }

    pub fn set_policy(&mut self, policy: BoundaryPolicy) {
        self.policy = policy;
    }

    pub fn policy(&self) -> BoundaryPolicy {
        self.policy
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn positions(&self) -> Vec<DVec2> {
        self.particles.iter().map(|p| p.position).collect()
    }

    pub fn lifetime(&self) -> u32 {
        self.lifetime
    }

    pub fn set_lifetime(&mut self, lifetime: u32) {
        self.lifetime = lifetime.max(1);
    }

    pub fn set_trail_length(&mut self, trail_length: usize) {
        self.trail_length = trail_length;
        for p in &mut self.particles {
            while p.trail.len() > trail_length {
                p.trail.pop_front();
            }
        }
    }

    /// Changes the population size. Surviving particles keep their state;
    /// new ones spawn at random with staggered ages.
    pub fn reconfigure(&mut self, count: usize) {
        if count <= self.particles.len() {
            self.particles.truncate(count);
            return;
        }
        let missing = count - self.particles.len();
        for _ in 0..missing {
            let position = self.rng.next_point(&self.bounds);
            let age = self.rng.next_usize(self.lifetime as usize) as u32;
            self.particles.push(Particle::spawn(position, age));
        }
    }

    /// Moves to new bounds; every particle is respawned inside them.
    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = bounds;
        let count = self.particles.len();
        self.particles.clear();
        self.reconfigure(count);
    }

    /// Re-randomizes the whole population from `seed`.
    pub fn reset(&mut self, seed: u64) {
        self.rng = Xorshift64::new(seed);
        let count = self.particles.len();
        self.particles.clear();
        self.reconfigure(count);
    }

    /// Advances every particle by one tick through `field` at `time`.
    pub fn step<F: FieldSource + ?Sized>(&mut self, field: &F, time: f64, dt: f64) -> &[Particle] {
        let dt = if dt.is_finite() { dt } else { 0.0 };
        let Self {
            particles,
            bounds,
            lifetime,
            trail_length,
            policy,
            rng,
        } = self;

        for particle in particles.iter_mut() {
            let v = field.sample(particle.position.x, particle.position.y, time);
            let mut next = particle.position + v * dt;
            particle.age = particle.age.saturating_add(1);

            let mut respawn = !next.is_finite() || particle.age > *lifetime;
            let mut broke_trail = false;
            if !respawn && !bounds.contains(next) {
                match policy {
                    BoundaryPolicy::Wrap => {
                        next = bounds.wrap(next);
                        broke_trail = true;
                    }
                    BoundaryPolicy::Respawn => respawn = true,
                }
            }

            if respawn {
                *particle = Particle::spawn(rng.next_point(bounds), 0);
                continue;
            }

            if broke_trail {
                particle.trail.clear();
            } else if *trail_length > 0 {
                particle.trail.push_back(particle.position);
                while particle.trail.len() > *trail_length {
                    particle.trail.pop_front();
                }
            }
            particle.position = next;
        }
        &self.particles
    }

    /// Snapshot of the population for rendering.
    pub fn marks(&self) -> Vec<ParticleMark> {
        self.particles
            .iter()
            .map(|p| ParticleMark {
                position: p.position,
                trail: p.trail.iter().copied().collect(),
                age: p.age,
            })
            .collect()
    }
}
