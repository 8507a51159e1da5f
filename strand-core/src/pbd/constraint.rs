//! Position-based-dynamics constraints used for strand packing.

use glam::Vec2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConstraintKind {
    /// Satisfied when `evaluate() == 0`.
    Equality,
    /// Satisfied when `evaluate() >= 0`.
    Inequality,
}

/// Constraint over `N` particle positions.
///
/// Implementors are stateless with respect to the particles: the current
/// positions are passed to every call, so one instance serves all pairs.
pub trait Constraint<const N: usize> {
    fn kind(&self) -> ConstraintKind;

    /// Scalar constraint value `C(p)`.
    fn evaluate(&self, points: [Vec2; N]) -> f32;

    /// Per-point position deltas that move `points` towards `C(p) = 0`,
    /// already scaled by the given per-pass stiffness.
    fn compute_correction(&self, points: [Vec2; N], stiffness: f32) -> [Vec2; N];

    fn is_satisfied(&self, points: [Vec2; N]) -> bool {
        let value = self.evaluate(points);
        match self.kind() {
            ConstraintKind::Equality => value == 0.0,
            ConstraintKind::Inequality => value >= 0.0,
        }
    }
}

/// Keeps two particles at least `2 · radius` apart.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionConstraint {
    pub radius: f32,
}

/// Keeps one particle within `radius` of `center`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CircularBoundaryConstraint {
    pub center: Vec2,
    pub radius: f32,
}

impl Constraint<2> for CollisionConstraint {
    fn kind(&self) -> ConstraintKind {
        ConstraintKind::Inequality
    }

    fn evaluate(&self, [a, b]: [Vec2; 2]) -> f32 {
        a.distance(b) - 2.0 * self.radius
    }

    fn compute_correction(&self, [a, b]: [Vec2; 2], stiffness: f32) -> [Vec2; 2] {
        let c = self.evaluate([a, b]);
        // Coincident particles are split along a fixed axis.
        let n = (a - b).try_normalize().unwrap_or(Vec2::X);
        let delta = 0.5 * c * stiffness * n;
        [-delta, delta]
    }
}

impl Constraint<1> for CircularBoundaryConstraint {
    fn kind(&self) -> ConstraintKind {
        ConstraintKind::Inequality
    }

    fn evaluate(&self, [p]: [Vec2; 1]) -> f32 {
        self.radius - p.distance(self.center)
    }

    fn compute_correction(&self, [p]: [Vec2; 1], stiffness: f32) -> [Vec2; 1] {
        let c = self.evaluate([p]);
        let Some(outward) = (p - self.center).try_normalize() else {
            return [Vec2::ZERO];
        };
        [c * stiffness * outward]
    }
}
