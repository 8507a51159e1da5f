//! Packing of strand bundles with position-based dynamics.
//!
//! The placer produces bundles that overlap freely. Packing runs one
//! [`PbdSolver`] per node, independently of all other nodes:
//!
//! 1. [`PbdSolver::set_profile`]: circular profile sized for the bundle.
//! 2. [`PbdSolver::set_points`]: the node's strand offsets.
//! 3. [`PbdSolver::execute`]: attraction, prediction, constraint projection.
//!
//! The packed offsets are written back into the node's bundle.

pub mod constraint;
pub mod solver;

pub use constraint::{CircularBoundaryConstraint, CollisionConstraint, Constraint, ConstraintKind};
pub use solver::{PbdParams, PbdSolver};

use crate::{attractor::AttractorSet, config::Config, placement::NodeBundles};
use glam::Vec2;
use log::debug;

/// Packs every node's bundle in place.
///
/// Each node runs `cfg.iterations_per_strand * strand_count` iterations
/// with a profile radius of [`Config::profile_radius_for`] the bundle size,
/// centered on the node.
pub fn pack_bundles(bundles: &mut NodeBundles, cfg: &Config, strand_count: usize) {
    let mut solver = PbdSolver::new(PbdParams::from(cfg), AttractorSet::single(Vec2::ZERO));
    let iterations = cfg.iterations_per_strand * strand_count;
    let mut offsets = Vec::new();

    for node in 0..bundles.len() {
        let bundle = bundles.at_mut(node);
        if bundle.is_empty() {
            continue;
        }

        let radius = cfg.profile_radius_for(bundle.len());
        solver.set_profile(Vec2::ZERO, radius);

        offsets.clear();
        offsets.extend(bundle.iter().map(|e| e.offset));
        solver.set_points(&offsets);

        let packed = solver.execute(iterations);
        for (entry, &p) in bundle.iter_mut().zip(packed) {
            entry.offset = p;
        }
        debug!(
            "packed {} strands at node {node} (radius {radius:.4}, {iterations} iterations)",
            bundle.len()
        );
    }
}
