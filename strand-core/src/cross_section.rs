//! Planar slices through the strand bundle.
//!
//! Two kinds of sections exist:
//! - node base sections, lying in the node's frontplane and using the packed
//!   offsets directly as planar coordinates;
//! - segment sections, interpolated between a parent and a child node from
//!   the resampled strands and projected onto a least-squares plane.
//!
//! Sections are built untriangulated; [`CrossSection::triangulate`] fills in
//! the triangles and the boundary loop.

use glam::{Vec2, Vec3};

use crate::{
    error::{GeometryError, StrandError},
    frame::Frontplane,
    graph::PlantGraph,
    plane::{Plane, PlaneBasis},
    strand::{NodeParticleIndex, StrandSet},
    triangulate::{boundary_loop, delaunay},
    types::{NodeId, ParticleHandle, StrandId},
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SectionPoint {
    pub world: Vec3,
    pub planar: Vec2,
    pub strand: StrandId,
    /// Index of the particle within its strand.
    pub particle: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CrossSection {
    /// Sorted by strand id.
    pub points: Vec<SectionPoint>,
    pub plane: Plane,
    pub basis: PlaneBasis,
    /// Counter-clockwise in `basis`, indexing `points`.
    pub triangles: Vec<[u32; 3]>,
    /// Counter-clockwise outer loop, indexing `points`.
    pub boundary: Vec<u32>,
}

/// Interpolated sections of one skeleton edge, base to tip. Sections that
/// failed to build are left out.
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    pub parent: NodeId,
    pub child: NodeId,
    pub sections: Vec<CrossSection>,
}

impl CrossSection {
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn planar(&self) -> Vec<Vec2> {
        self.points.iter().map(|p| p.planar).collect()
    }

    pub fn world(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.points.iter().map(|p| p.world)
    }

    /// Position in [`CrossSection::points`] of `strand`'s point.
    pub fn find_strand(&self, strand: StrandId) -> Option<usize> {
        self.points.binary_search_by_key(&strand, |p| p.strand).ok()
    }

    /// Delaunay-triangulates the planar points and extracts the boundary.
    pub fn triangulate(&mut self) -> Result<(), GeometryError> {
        let planar = self.planar();
        self.triangles = delaunay(&planar)?;
        self.boundary = boundary_loop(&planar, &self.triangles);
        Ok(())
    }
}

/// Section at `node` made of the strands' original particles there.
pub fn node_base_section(
    graph: &PlantGraph,
    frames: &[Frontplane],
    strands: &StrandSet,
    index: &NodeParticleIndex,
    node: NodeId,
) -> CrossSection {
    let frame = &frames[node];
    let origin = graph.node(node).pos;

    let points = index
        .at(node)
        .iter()
        .map(|&h| {
            let particle = strands.particle(h);
            SectionPoint {
                world: particle.pos,
                planar: particle.offset,
                strand: h.strand,
                particle: h.index,
            }
        })
        .collect();

    CrossSection {
        points,
        plane: Plane {
            origin,
            normal: frame.forward,
        },
        basis: PlaneBasis {
            origin,
            u: frame.right,
            v: frame.up,
        },
        triangles: Vec::new(),
        boundary: Vec::new(),
    }
}

/// Interpolated sections along the edge `parent → child`.
///
/// Section `i` (for `i` in `1..steps`) collects, for every strand at
/// `child`, the particle `i` samples past that strand's particle at
/// `parent`. The fitted plane's normal points from parent to child and the
/// planar basis follows the child's `right` axis.
///
/// ### Returns
/// One entry per section in base-to-tip order. Failed sections carry the
/// reason instead.
pub fn segment_sections(
    graph: &PlantGraph,
    frames: &[Frontplane],
    strands: &StrandSet,
    index: &NodeParticleIndex,
    parent: NodeId,
    child: NodeId,
    steps: usize,
) -> Vec<Result<CrossSection, StrandError>> {
    let mut starts = Vec::with_capacity(index.at(child).len());
    for h in index.at(child) {
        match index.find(parent, h.strand) {
            Some(p) => starts.push(p),
            None => {
                return vec![Err(StrandError::MissingParticle {
                    strand: h.strand,
                    node: parent,
                })];
            }
        }
    }

    let axis = graph.node(child).pos - graph.node(parent).pos;
    let hint = frames[child].right;

    (1..steps)
        .map(|i| {
            let samples: Vec<(ParticleHandle, Vec3)> = starts
                .iter()
                .map(|s| {
                    let h = ParticleHandle::new(s.strand, s.index + i);
                    (h, strands.particle(h).pos)
                })
                .collect();

            project_section(&samples, axis, hint).map_err(|source| StrandError::Section {
                node: child,
                section: i,
                source,
            })
        })
        .collect()
}

/// Fits a plane through `samples` and projects them onto it.
fn project_section(
    samples: &[(ParticleHandle, Vec3)],
    axis: Vec3,
    hint: Vec3,
) -> Result<CrossSection, GeometryError> {
    let world: Vec<Vec3> = samples.iter().map(|(_, p)| *p).collect();
    let plane = Plane::fit(&world)?.oriented_towards(axis);
    let basis = plane.basis(hint);

    let points = samples
        .iter()
        .map(|&(h, world)| SectionPoint {
            world,
            planar: basis.project(world),
            strand: h.strand,
            particle: h.index,
        })
        .collect();

    Ok(CrossSection {
        points,
        plane,
        basis,
        triangles: Vec::new(),
        boundary: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        frame::compute_frontplanes,
        placement::{BundleEntry, NodeBundles},
        triangulate::signed_area,
    };
    use approx::assert_abs_diff_eq;
    use std::f32::consts::TAU;

    /// Straight edge from the origin to (0, 2, 0) with `n` strands on a
    /// ring, resampled with `steps`.
    fn straight_edge(
        n: usize,
        steps: usize,
    ) -> (PlantGraph, Vec<Frontplane>, StrandSet, NodeParticleIndex) {
        let mut g = PlantGraph::new(Vec3::ZERO);
        let c = g.add_node(0, Vec3::new(0.0, 2.0, 0.0));
        let frames = compute_frontplanes(&g);

        let ring: Vec<BundleEntry> = (0..n)
            .map(|i| {
                let a = i as f32 / n as f32 * TAU;
                BundleEntry {
                    strand: i,
                    offset: Vec2::new(a.cos(), a.sin()) * 0.1,
                }
            })
            .collect();
        let mut bundles = NodeBundles::with_nodes(g.len());
        bundles.set(0, ring.clone());
        bundles.set(c, ring);

        let mut strands = StrandSet::from_bundles(&g, &frames, &bundles, n);
        strands.resample(steps);
        let index = NodeParticleIndex::build(&strands, g.len());
        (g, frames, strands, index)
    }

    #[test]
    fn base_section_uses_packed_offsets() {
        let (g, frames, strands, index) = straight_edge(6, 4);
        let mut base = node_base_section(&g, &frames, &strands, &index, 1);

        assert_eq!(base.len(), 6);
        for p in &base.points {
            let back = base.basis.project(p.world);
            assert_abs_diff_eq!(back.distance(p.planar), 0.0, epsilon = 1e-5);
        }

        base.triangulate().unwrap();
        assert_eq!(base.triangles.len(), 4);
        assert_eq!(base.boundary.len(), 6);
        assert!(signed_area(&base.planar(), &base.boundary) > 0.0);
    }

    #[test]
    fn segment_sections_step_along_the_edge() {
        let steps = 4;
        let (g, frames, strands, index) = straight_edge(6, steps);
        let sections = segment_sections(&g, &frames, &strands, &index, 0, 1, steps);

        assert_eq!(sections.len(), steps - 1);
        let mut last_y = 0.0;
        for (k, s) in sections.iter().enumerate() {
            let s = s.as_ref().unwrap();
            let i = k + 1;
            assert_eq!(s.len(), 6);
            assert!(s.points.iter().all(|p| p.particle == i));

            // Parallel strands: sections advance monotonically along +Y.
            assert!(s.plane.origin.y > last_y && s.plane.origin.y < 2.0);
            last_y = s.plane.origin.y;
            assert_abs_diff_eq!(s.plane.normal.dot(Vec3::Y), 1.0, epsilon = 1e-4);

            // Same planar layout as the packed offsets.
            for p in &s.points {
                let a = p.strand as f32 / 6.0 * TAU;
                let expected = Vec2::new(a.cos(), a.sin()) * 0.1;
                assert_abs_diff_eq!(p.planar.distance(expected), 0.0, epsilon = 1e-4);
            }
        }
    }

    #[test]
    fn too_few_strands_is_reported_per_section() {
        let (g, frames, strands, index) = straight_edge(2, 3);
        let sections = segment_sections(&g, &frames, &strands, &index, 0, 1, 3);

        assert_eq!(sections.len(), 2);
        for (k, s) in sections.into_iter().enumerate() {
            assert_eq!(
                s,
                Err(StrandError::Section {
                    node: 1,
                    section: k + 1,
                    source: GeometryError::TooFewPoints { needed: 3, got: 2 },
                })
            );
        }
    }

    #[test]
    fn strand_missing_at_parent_fails_the_segment() {
        let (g, frames, _, _) = straight_edge(3, 2);
        let entry = |strand: usize, a: f32| BundleEntry {
            strand,
            offset: Vec2::from_angle(a) * 0.1,
        };
        // Strand 3 starts at the child and never reaches the parent.
        let mut bundles = NodeBundles::with_nodes(g.len());
        bundles.set(0, vec![entry(0, 0.0), entry(1, 2.0), entry(2, 4.0)]);
        bundles.set(1, vec![entry(0, 0.0), entry(1, 1.5), entry(2, 3.0), entry(3, 4.5)]);

        let mut strands = StrandSet::from_bundles(&g, &frames, &bundles, 4);
        strands.resample(2);
        let index = NodeParticleIndex::build(&strands, g.len());

        let sections = segment_sections(&g, &frames, &strands, &index, 0, 1, 2);

        assert_eq!(
            sections,
            vec![Err(StrandError::MissingParticle { strand: 3, node: 0 })]
        );
    }

    #[test]
    fn find_strand_searches_sorted_points() {
        let (g, frames, strands, index) = straight_edge(5, 2);
        let base = node_base_section(&g, &frames, &strands, &index, 0);

        assert_eq!(base.find_strand(3), Some(3));
        assert_eq!(base.find_strand(42), None);
    }
}
