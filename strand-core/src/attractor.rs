use glam::Vec2;

/// Fixed point pulling packed particles towards it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Attractor {
    pub pos: Vec2,
    /// Multiplier applied on top of the solver's attraction gain.
    pub weight: f32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttractorSet {
    pub points: Vec<Attractor>,
}

impl AttractorSet {
    pub fn from_positions(positions: Vec<Vec2>) -> Self {
        let points = positions
            .into_iter()
            .map(|pos| Attractor { pos, weight: 1.0 })
            .collect();

        Self { points }
    }

    /// A single unit-weight attractor, typically the profile center.
    pub fn single(pos: Vec2) -> Self {
        Self::from_positions(vec![pos])
    }

    /// Force on a particle at `pos`: linear in the displacement to every
    /// attractor.
    pub fn pull(&self, pos: Vec2, gain: f32) -> Vec2 {
        self.points
            .iter()
            .map(|a| gain * a.weight * (a.pos - pos))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pull_is_proportional_to_displacement() {
        let set = AttractorSet::single(Vec2::ZERO);

        assert_eq!(set.pull(Vec2::new(1.0, 0.0), 10.0), Vec2::new(-10.0, 0.0));
        assert_eq!(set.pull(Vec2::new(0.0, -2.0), 10.0), Vec2::new(0.0, 20.0));
        assert_eq!(set.pull(Vec2::ZERO, 10.0), Vec2::ZERO);
    }

    #[test]
    fn pull_sums_weighted_attractors() {
        let mut set = AttractorSet::from_positions(vec![Vec2::new(1.0, 0.0), Vec2::new(-1.0, 0.0)]);
        assert_eq!(set.pull(Vec2::ZERO, 1.0), Vec2::ZERO);

        set.points[0].weight = 3.0;
        assert_eq!(set.pull(Vec2::ZERO, 1.0), Vec2::new(2.0, 0.0));
    }

    #[test]
    fn empty_set_exerts_no_force() {
        let set = AttractorSet::default();
        assert_eq!(set.pull(Vec2::new(5.0, 5.0), 100.0), Vec2::ZERO);
    }
}
