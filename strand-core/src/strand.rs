//! Strands, their particles, and the per-node particle index.

use crate::{
    frame::Frontplane,
    graph::PlantGraph,
    placement::NodeBundles,
    spline,
    types::{NodeId, ParticleHandle, StrandId},
};
use glam::{Vec2, Vec3};

#[derive(Clone, Debug, PartialEq)]
pub struct StrandParticle {
    pub strand: StrandId,
    /// World-space position.
    pub pos: Vec3,
    /// Offset in the owning node's frontplane. Zero for synthetic particles.
    pub offset: Vec2,
    /// Node this particle was placed at. `None` for synthetic particles.
    pub node: Option<NodeId>,
    /// `true` if produced by spline resampling.
    pub synthetic: bool,
}

/// One fiber following the skeleton, stored base to tip.
#[derive(Clone, Debug)]
pub struct Strand {
    pub id: StrandId,
    particles: Vec<StrandParticle>,
}

impl StrandParticle {
    pub fn placed(strand: StrandId, node: NodeId, pos: Vec3, offset: Vec2) -> Self {
        Self {
            strand,
            pos,
            offset,
            node: Some(node),
            synthetic: false,
        }
    }

    pub fn synthetic(strand: StrandId, pos: Vec3) -> Self {
        Self {
            strand,
            pos,
            offset: Vec2::ZERO,
            node: None,
            synthetic: true,
        }
    }
}

impl Strand {
    pub fn new(id: StrandId) -> Self {
        Self {
            id,
            particles: Vec::new(),
        }
    }

    /// Appends a particle and returns its index within the strand.
    pub fn push(&mut self, particle: StrandParticle) -> usize {
        debug_assert_eq!(particle.strand, self.id);
        self.particles.push(particle);
        self.particles.len() - 1
    }

    #[inline]
    pub fn particles(&self) -> &[StrandParticle] {
        &self.particles
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn positions(&self) -> Vec<Vec3> {
        self.particles.iter().map(|p| p.pos).collect()
    }

    /// Replaces the particle sequence with a centripetal Catmull-Rom
    /// resampling using `steps` samples per segment.
    ///
    /// The first sample of every segment is the original particle, so the
    /// original particle `k` ends up at index `k * steps`. All other samples
    /// are new synthetic particles. Strands with fewer than two particles
    /// are left untouched.
    pub fn resample(&mut self, steps: usize) {
        if self.particles.len() < 2 || steps <= 1 {
            return;
        }

        let positions = self.positions();
        let samples = spline::resample(&positions, steps);

        let mut resampled = Vec::with_capacity(samples.len());
        for (i, pos) in samples.into_iter().enumerate() {
            if i % steps == 0 {
                resampled.push(self.particles[i / steps].clone());
            } else {
                resampled.push(StrandParticle::synthetic(self.id, pos));
            }
        }
        self.particles = resampled;
    }
}

/// All strands of one pipeline run, indexed by [`StrandId`].
#[derive(Clone, Debug, Default)]
pub struct StrandSet {
    strands: Vec<Strand>,
}

impl StrandSet {
    /// Turns packed node bundles into world-space strands.
    ///
    /// Nodes are visited in preorder, so each strand receives its particles
    /// from base to tip.
    pub fn from_bundles(
        graph: &PlantGraph,
        frames: &[Frontplane],
        bundles: &NodeBundles,
        strand_count: usize,
    ) -> Self {
        let mut strands: Vec<Strand> = (0..strand_count).map(Strand::new).collect();

        for id in graph.preorder() {
            let origin = graph.node(id).pos;
            let frame = &frames[id];
            for entry in bundles.at(id) {
                let pos = origin + frame.to_world(entry.offset);
                strands[entry.strand].push(StrandParticle::placed(
                    entry.strand,
                    id,
                    pos,
                    entry.offset,
                ));
            }
        }
        Self { strands }
    }

    /// ### Panics
    /// Panics if `id` is not a strand of this set.
    #[inline]
    pub fn get(&self, id: StrandId) -> &Strand {
        &self.strands[id]
    }

    #[inline]
    pub fn particle(&self, handle: ParticleHandle) -> &StrandParticle {
        &self.strands[handle.strand].particles[handle.index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Strand> {
        self.strands.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.strands.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.strands.is_empty()
    }

    pub fn resample(&mut self, steps: usize) {
        for strand in &mut self.strands {
            strand.resample(steps);
        }
    }

    /// Ordered world-space polyline of every strand.
    pub fn polylines(&self) -> Vec<Vec<Vec3>> {
        self.strands.iter().map(Strand::positions).collect()
    }
}

/// Secondary, non-owning index: which particles sit at which node.
#[derive(Clone, Debug, Default)]
pub struct NodeParticleIndex {
    per_node: Vec<Vec<ParticleHandle>>,
}

impl NodeParticleIndex {
    /// Rebuilds the index from the placed (non-synthetic) particles.
    pub fn build(strands: &StrandSet, node_count: usize) -> Self {
        let mut per_node = vec![Vec::new(); node_count];
        for strand in strands.iter() {
            for (index, particle) in strand.particles().iter().enumerate() {
                if let Some(node) = particle.node {
                    per_node[node].push(ParticleHandle::new(strand.id, index));
                }
            }
        }
        for handles in &mut per_node {
            handles.sort_unstable();
        }
        Self { per_node }
    }

    #[inline]
    pub fn at(&self, node: NodeId) -> &[ParticleHandle] {
        &self.per_node[node]
    }

    /// Handle of `strand`'s particle at `node`, if the strand passes there.
    pub fn find(&self, node: NodeId, strand: StrandId) -> Option<ParticleHandle> {
        let handles = &self.per_node[node];
        handles
            .binary_search_by_key(&strand, |h| h.strand)
            .ok()
            .map(|i| handles[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::BundleEntry;

    fn straight_strand(n: usize) -> Strand {
        let mut s = Strand::new(3);
        for i in 0..n {
            s.push(StrandParticle::placed(
                3,
                i,
                Vec3::new(0.0, i as f32, 0.0),
                Vec2::new(0.1, 0.0),
            ));
        }
        s
    }

    #[test]
    fn resample_keeps_originals_at_multiples_of_steps() {
        let mut s = straight_strand(4);
        let originals = s.particles().to_vec();

        s.resample(5);

        assert_eq!(s.len(), 3 * 5 + 1);
        for (k, p) in originals.iter().enumerate() {
            assert_eq!(&s.particles()[k * 5], p);
        }
        let synthetic = s.particles().iter().filter(|p| p.synthetic).count();
        assert_eq!(synthetic, 3 * 4);
        assert!(s.particles().iter().all(|p| p.strand == 3));
    }

    #[test]
    fn resample_leaves_single_particle_strand_alone() {
        let mut s = straight_strand(1);
        s.resample(8);
        assert_eq!(s.len(), 1);
        assert!(!s.particles()[0].synthetic);
    }

    #[test]
    fn from_bundles_orders_particles_base_to_tip() {
        let mut g = PlantGraph::new(Vec3::ZERO);
        let a = g.add_node(0, Vec3::new(0.0, 1.0, 0.0));
        let b = g.add_node(a, Vec3::new(0.0, 2.0, 0.0));
        let frames = crate::frame::compute_frontplanes(&g);

        let mut bundles = NodeBundles::with_nodes(g.len());
        for node in [0, a, b] {
            bundles.set(
                node,
                vec![BundleEntry {
                    strand: 0,
                    offset: Vec2::new(0.05, 0.0),
                }],
            );
        }

        let strands = StrandSet::from_bundles(&g, &frames, &bundles, 1);
        let ys: Vec<f32> = strands.get(0).positions().iter().map(|p| p.y).collect();
        assert_eq!(ys, vec![0.0, 1.0, 2.0]);
        // Offset along the root's right axis.
        assert!((strands.get(0).particles()[0].pos.x - 0.05).abs() < 1e-6);
    }

    #[test]
    fn node_index_finds_handles_after_resampling() {
        let mut g = PlantGraph::new(Vec3::ZERO);
        let a = g.add_node(0, Vec3::new(0.0, 1.0, 0.0));
        let frames = crate::frame::compute_frontplanes(&g);

        let mut bundles = NodeBundles::with_nodes(g.len());
        let entries = vec![
            BundleEntry {
                strand: 0,
                offset: Vec2::new(0.05, 0.0),
            },
            BundleEntry {
                strand: 1,
                offset: Vec2::new(-0.05, 0.0),
            },
        ];
        bundles.set(0, entries.clone());
        bundles.set(a, entries);

        let mut strands = StrandSet::from_bundles(&g, &frames, &bundles, 2);
        strands.resample(4);
        let index = NodeParticleIndex::build(&strands, g.len());

        assert_eq!(index.at(a).len(), 2);
        assert_eq!(index.find(a, 1), Some(ParticleHandle::new(1, 4)));
        assert_eq!(index.find(0, 0), Some(ParticleHandle::new(0, 0)));
        assert_eq!(index.find(a, 9), None);
        assert_eq!(strands.particle(ParticleHandle::new(1, 4)).node, Some(a));
    }
}
