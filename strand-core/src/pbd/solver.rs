use super::constraint::{CircularBoundaryConstraint, CollisionConstraint, Constraint};
use crate::{attractor::AttractorSet, config::Config};
use glam::Vec2;

/// Solver parameters, usually taken from [`Config`].
#[derive(Clone, Copy, Debug)]
pub struct PbdParams {
    pub dt: f32,
    pub attraction_gain: f32,
    pub damping: f32,
    pub max_velocity: f32,
    pub stiffness: f32,
    pub passes: usize,
    pub particle_radius: f32,
    pub contact_skin: f32,
}

impl From<&Config> for PbdParams {
    fn from(cfg: &Config) -> Self {
        Self {
            dt: cfg.dt,
            attraction_gain: cfg.attraction_gain,
            damping: cfg.damping,
            max_velocity: cfg.max_velocity,
            stiffness: cfg.stiffness,
            passes: cfg.solver_passes,
            particle_radius: cfg.particle_radius,
            contact_skin: cfg.contact_skin,
        }
    }
}

/// Position-based-dynamics solver for disks inside a circular profile.
///
/// All particles have unit mass. One instance is re-parametrised per node
/// with [`PbdSolver::set_profile`] and [`PbdSolver::set_points`].
#[derive(Debug)]
pub struct PbdSolver {
    x: Vec<Vec2>,
    v: Vec<Vec2>,
    p: Vec<Vec2>,

    attractors: AttractorSet,
    boundary: CircularBoundaryConstraint,
    collision: CollisionConstraint,
    params: PbdParams,

    /// Scratch list of candidate collision pairs, rebuilt every iteration.
    pairs: Vec<(usize, usize)>,
}

impl PbdSolver {
    pub fn new(params: PbdParams, attractors: AttractorSet) -> Self {
        Self {
            x: Vec::new(),
            v: Vec::new(),
            p: Vec::new(),
            attractors,
            boundary: CircularBoundaryConstraint {
                center: Vec2::ZERO,
                radius: f32::INFINITY,
            },
            collision: CollisionConstraint {
                radius: params.particle_radius,
            },
            params,
            pairs: Vec::new(),
        }
    }

    pub fn set_profile(&mut self, center: Vec2, radius: f32) {
        self.boundary = CircularBoundaryConstraint { center, radius };
    }

    /// Loads a new particle set and resets velocities.
    pub fn set_points(&mut self, points: &[Vec2]) {
        self.x.clear();
        self.x.extend_from_slice(points);
        self.v.clear();
        self.v.resize(points.len(), Vec2::ZERO);
        self.p.clear();
        self.p.resize(points.len(), Vec2::ZERO);
    }

    #[inline]
    pub fn positions(&self) -> &[Vec2] {
        &self.x
    }

    /// Runs `iterations` solver steps and returns the final positions.
    pub fn execute(&mut self, iterations: usize) -> &[Vec2] {
        if self.x.is_empty() {
            return &self.x;
        }
        for _ in 0..iterations {
            self.step();
        }
        &self.x
    }

    /// Per-pass stiffness giving the configured overall stiffness after
    /// `passes` projections.
    fn pass_stiffness(&self) -> f32 {
        let k = self.params.stiffness.clamp(0.0, 1.0);
        1.0 - (1.0 - k).powf(1.0 / self.params.passes as f32)
    }

    /// One solver iteration: external forces, prediction, projection,
    /// velocity update.
    pub fn step(&mut self) {
        let dt = self.params.dt;

        for i in 0..self.x.len() {
            let force = self.attractors.pull(self.x[i], self.params.attraction_gain);
            let v = (self.v[i] + force) * (1.0 - self.params.damping);
            self.v[i] = v.clamp_length_max(self.params.max_velocity);
            self.p[i] = self.x[i] + dt * self.v[i];
        }

        self.collect_pairs();

        let k = self.pass_stiffness();
        for _ in 0..self.params.passes {
            self.project(k);
        }

        for i in 0..self.x.len() {
            self.v[i] = (self.p[i] - self.x[i]) / dt;
            self.x[i] = self.p[i];
        }
    }

    fn collect_pairs(&mut self) {
        let reach = 2.0 * self.params.particle_radius + self.params.contact_skin;
        let reach2 = reach * reach;

        self.pairs.clear();
        for i in 0..self.p.len() {
            for j in i + 1..self.p.len() {
                if self.p[i].distance_squared(self.p[j]) < reach2 {
                    self.pairs.push((i, j));
                }
            }
        }
    }

    fn project(&mut self, k: f32) {
        for i in 0..self.p.len() {
            let pts = [self.p[i]];
            if !self.boundary.is_satisfied(pts) {
                let [d] = self.boundary.compute_correction(pts, k);
                self.p[i] += d;
            }
        }

        for &(i, j) in &self.pairs {
            let pts = [self.p[i], self.p[j]];
            if !self.collision.is_satisfied(pts) {
                let [di, dj] = self.collision.compute_correction(pts, k);
                self.p[i] += di;
                self.p[j] += dj;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solver(cfg: &Config, radius: f32) -> PbdSolver {
        let mut s = PbdSolver::new(PbdParams::from(cfg), AttractorSet::single(Vec2::ZERO));
        s.set_profile(Vec2::ZERO, radius);
        s
    }

    fn assert_packed(points: &[Vec2], particle_radius: f32, profile_radius: f32, eps: f32) {
        for (i, a) in points.iter().enumerate() {
            assert!(
                a.length() <= profile_radius + eps,
                "particle {i} outside profile: {}",
                a.length()
            );
            for (j, b) in points.iter().enumerate().skip(i + 1) {
                let d = a.distance(*b);
                assert!(
                    d >= 2.0 * particle_radius - eps,
                    "particles {i} and {j} overlap: {d}"
                );
            }
        }
    }

    #[test]
    fn overlapping_ring_is_packed_without_intersections() {
        let cfg = Config::default();
        let r = cfg.particle_radius;
        let profile = cfg.profile_radius_for(8);

        // 8 particles on a ring too small for them.
        let pts: Vec<Vec2> = (0..8)
            .map(|i| {
                let a = i as f32 / 8.0 * std::f32::consts::TAU;
                Vec2::new(a.cos(), a.sin()) * 0.03
            })
            .collect();

        let mut s = solver(&cfg, profile);
        s.set_points(&pts);
        let out = s.execute(200).to_vec();

        assert_packed(&out, r, profile, 0.25 * r);
    }

    #[test]
    fn particles_outside_the_profile_are_pulled_in() {
        let cfg = Config::default();
        let r = cfg.particle_radius;
        let profile = cfg.profile_radius_for(3);

        let pts = vec![
            Vec2::new(0.5, 0.0),
            Vec2::new(-0.4, 0.1),
            Vec2::new(0.0, -0.3),
        ];
        let mut s = solver(&cfg, profile);
        s.set_points(&pts);
        let out = s.execute(100).to_vec();

        assert_packed(&out, r, profile, 0.25 * r);
    }

    #[test]
    fn coincident_particles_are_separated() {
        let cfg = Config::default();
        let r = cfg.particle_radius;
        let profile = cfg.profile_radius_for(4);

        let pts = vec![Vec2::ZERO; 4];
        let mut s = solver(&cfg, profile);
        s.set_points(&pts);
        let out = s.execute(200).to_vec();

        assert!(out.iter().all(|p| p.is_finite()));
        assert_packed(&out, r, profile, 0.25 * r);
    }

    #[test]
    fn empty_and_single_particle_sets_are_stable() {
        let cfg = Config::default();
        let mut s = solver(&cfg, 0.1);

        s.set_points(&[]);
        assert!(s.execute(10).is_empty());

        s.set_points(&[Vec2::new(0.05, 0.0)]);
        let out = s.execute(500);
        // A lone particle just falls onto the attractor.
        assert!(out[0].length() < 0.05);
    }
}
