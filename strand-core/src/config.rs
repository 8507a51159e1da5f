//! Tunable parameters for the whole strand pipeline.
//!
//! [`Config`] is a plain value type: callers start from
//! [`Config::default`] and overwrite the fields they care about. Call
//! [`Config::validate`] (done automatically by
//! [`crate::pipeline::StrandPipeline::new`]) before running.

use crate::error::ConfigError;

#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Strands generated at every leaf node.
    pub strands_per_leaf: usize,
    /// Radius of one strand particle in the node plane.
    pub particle_radius: f32,
    /// Radius of the circle leaf strands are placed on (before clearance).
    pub leaf_profile_radius: f32,
    /// Minimum radius of the circular profile used while packing a node.
    pub node_profile_radius: f32,
    /// Target disk coverage used to grow the profile for large bundles.
    pub packing_density: f32,

    /// Integration time step of the packing solver.
    pub dt: f32,
    /// Gain of the linear pull towards the attractors.
    pub attraction_gain: f32,
    /// Fraction of velocity removed every iteration.
    pub damping: f32,
    /// Velocity clip applied after external forces.
    pub max_velocity: f32,
    /// Stiffness of both packing constraints, in `[0, 1]`.
    pub stiffness: f32,
    /// Constraint projection passes per solver iteration.
    pub solver_passes: usize,
    /// Solver iterations per node, multiplied by the total strand count.
    pub iterations_per_strand: usize,
    /// Extra distance added to the collision candidate test.
    pub contact_skin: f32,

    /// Spline samples per original strand segment. Also the number of
    /// cross-section intervals per branch segment.
    pub spline_steps: usize,

    /// Compute per-vertex normals for the assembled mesh.
    pub compute_normals: bool,

    /// Seed for strand placement. `None` seeds from the wall clock.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strands_per_leaf: 10,
            particle_radius: 0.02,
            leaf_profile_radius: 0.1,
            node_profile_radius: 0.1,
            packing_density: 0.6,

            dt: 0.002,
            attraction_gain: 100.0,
            damping: 0.02,
            max_velocity: 1.0,
            stiffness: 1.0,
            solver_passes: 20,
            iterations_per_strand: 5,
            contact_skin: 0.005,

            spline_steps: 8,

            compute_normals: true,

            seed: None,
        }
    }
}

impl Config {
    /// Checks that all parameters are usable.
    ///
    /// ### Returns
    /// - `Ok(())` if the configuration is consistent.
    /// - `Err(ConfigError)` naming the first offending parameter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.strands_per_leaf == 0 {
            return Err(ConfigError::NotPositive("strands_per_leaf"));
        }
        if !(self.particle_radius > 0.0) {
            return Err(ConfigError::NotPositive("particle_radius"));
        }
        if self.leaf_profile_radius <= self.particle_radius {
            return Err(ConfigError::ProfileTooSmall {
                profile: self.leaf_profile_radius,
                particle: self.particle_radius,
            });
        }
        if !(self.node_profile_radius > 0.0) {
            return Err(ConfigError::NotPositive("node_profile_radius"));
        }
        if !(self.packing_density > 0.0 && self.packing_density <= 1.0) {
            return Err(ConfigError::OutOfRange {
                name: "packing_density",
                value: self.packing_density,
            });
        }
        if !(self.dt > 0.0) {
            return Err(ConfigError::NotPositive("dt"));
        }
        if !(self.max_velocity > 0.0) {
            return Err(ConfigError::NotPositive("max_velocity"));
        }
        if !(0.0..=1.0).contains(&self.stiffness) {
            return Err(ConfigError::OutOfRange {
                name: "stiffness",
                value: self.stiffness,
            });
        }
        if !(0.0..1.0).contains(&self.damping) {
            return Err(ConfigError::OutOfRange {
                name: "damping",
                value: self.damping,
            });
        }
        if self.solver_passes == 0 {
            return Err(ConfigError::NotPositive("solver_passes"));
        }
        if self.spline_steps == 0 {
            return Err(ConfigError::NotPositive("spline_steps"));
        }
        if self.contact_skin < 0.0 {
            return Err(ConfigError::OutOfRange {
                name: "contact_skin",
                value: self.contact_skin,
            });
        }
        Ok(())
    }

    /// Radius at which leaf strands are placed: profile minus one particle.
    pub fn leaf_placement_radius(&self) -> f32 {
        self.leaf_profile_radius - self.particle_radius
    }

    /// Profile radius used when packing `particle_count` particles.
    ///
    /// Never smaller than `node_profile_radius`; grows with the square root
    /// of the count so that the disks cover at most `packing_density` of the
    /// profile area.
    pub fn profile_radius_for(&self, particle_count: usize) -> f32 {
        let needed = self.particle_radius * (particle_count as f32 / self.packing_density).sqrt();
        needed.max(self.node_profile_radius)
    }
}
