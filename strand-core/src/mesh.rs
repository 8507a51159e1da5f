//! Triangle mesh and its assembly from cross-sections.

use glam::Vec3;
use log::{debug, warn};

use crate::{
    cross_section::{CrossSection, Segment},
    error::StitchError,
    graph::PlantGraph,
    normals::NormalAccumulator,
    types::NodeId,
};

/// Indexed triangle mesh.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub positions: Vec<Vec3>,
    /// Per-vertex unit normals, once computed.
    pub normals: Option<Vec<Vec3>>,
    pub indices: Vec<[u32; 3]>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Appends a block of vertices with its local triangles.
    ///
    /// ### Returns
    /// The offset of the block's first vertex.
    pub fn add_block(
        &mut self,
        positions: impl IntoIterator<Item = Vec3>,
        triangles: &[[u32; 3]],
    ) -> u32 {
        let offset = self.positions.len() as u32;
        self.positions.extend(positions);
        self.indices
            .extend(triangles.iter().map(|t| t.map(|i| i + offset)));
        offset
    }

    #[inline]
    pub fn add_triangle(&mut self, tri: [u32; 3]) {
        self.indices.push(tri);
    }

    /// Computes area-weighted vertex normals from the triangles.
    pub fn compute_normals(&mut self) {
        let mut acc = NormalAccumulator::with_len(self.positions.len());
        for &tri in &self.indices {
            acc.add_triangle(&self.positions, tri);
        }
        self.normals = Some(acc.into_normals());
    }
}

/// Concatenates all sections into one mesh and stitches neighbouring
/// sections into tubes.
///
/// Blocks are laid out as the node base sections in preorder followed by
/// each segment's sections in order. Along every segment the chain
/// `base(parent), sections…, base(child)` is stitched pairwise: each edge of
/// the tip-side section's boundary loop is matched by strand id against
/// the base-side section and becomes a quad of two triangles.
///
/// ### Parameters
/// - `bases` - Base section per node id; `None` where it failed to build.
/// - `segments` - Sections of every skeleton edge.
///
/// ### Returns
/// The mesh and every boundary edge that could not be matched. Unmatched
/// edges are left open.
pub fn assemble_mesh(
    graph: &PlantGraph,
    bases: &[Option<CrossSection>],
    segments: &[Segment],
) -> (Mesh, Vec<StitchError>) {
    let mut mesh = Mesh::new();
    let mut errors = Vec::new();

    let mut base_offsets: Vec<Option<u32>> = vec![None; bases.len()];
    for id in graph.preorder() {
        if let Some(base) = &bases[id] {
            base_offsets[id] = Some(mesh.add_block(base.world(), &base.triangles));
        }
    }

    let mut segment_offsets: Vec<Vec<u32>> = Vec::with_capacity(segments.len());
    for segment in segments {
        let offsets = segment
            .sections
            .iter()
            .map(|s| mesh.add_block(s.world(), &s.triangles))
            .collect();
        segment_offsets.push(offsets);
    }
    let cap_triangles = mesh.triangle_count();

    for (segment, offsets) in segments.iter().zip(&segment_offsets) {
        let mut chain: Vec<(&CrossSection, u32)> = Vec::with_capacity(segment.sections.len() + 2);
        if let (Some(base), Some(off)) = (&bases[segment.parent], base_offsets[segment.parent]) {
            chain.push((base, off));
        }
        chain.extend(segment.sections.iter().zip(offsets.iter().copied()));
        if let (Some(base), Some(off)) = (&bases[segment.child], base_offsets[segment.child]) {
            chain.push((base, off));
        }

        for pair in chain.windows(2) {
            stitch(&mut mesh, pair[0], pair[1], segment.child, &mut errors);
        }
    }

    debug!(
        "assembled {} vertices, {} cap and {} strip triangles",
        mesh.vertex_count(),
        cap_triangles,
        mesh.triangle_count() - cap_triangles
    );
    (mesh, errors)
}

/// Emits the quad strip between a base-side and a tip-side section.
fn stitch(
    mesh: &mut Mesh,
    (lo, lo_offset): (&CrossSection, u32),
    (hi, hi_offset): (&CrossSection, u32),
    node: NodeId,
    errors: &mut Vec<StitchError>,
) {
    let n = hi.boundary.len();
    if n < 2 {
        return;
    }

    for j in 0..n {
        let a = hi.boundary[j] as usize;
        let b = hi.boundary[(j + 1) % n] as usize;
        let (sa, sb) = (hi.points[a].strand, hi.points[b].strand);

        let (la, lb) = match (lo.find_strand(sa), lo.find_strand(sb)) {
            (Some(la), Some(lb)) => (la as u32 + lo_offset, lb as u32 + lo_offset),
            (la, _) => {
                let strand = if la.is_none() { sa } else { sb };
                warn!("no match for strand {strand} below node {node}, skipping quad");
                errors.push(StitchError { node, strand });
                continue;
            }
        };
        let (ha, hb) = (a as u32 + hi_offset, b as u32 + hi_offset);

        mesh.add_triangle([la, lb, hb]);
        mesh.add_triangle([la, hb, ha]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cross_section::SectionPoint,
        plane::{Plane, PlaneBasis},
    };
    use approx::assert_abs_diff_eq;
    use glam::Vec2;
    use std::f32::consts::TAU;

    /// Ring section at height `y` around the Y axis holding `strands`.
    fn ring(y: f32, strands: &[usize]) -> CrossSection {
        let origin = Vec3::new(0.0, y, 0.0);
        let basis = PlaneBasis {
            origin,
            u: Vec3::X,
            v: -Vec3::Z,
        };
        let points = strands
            .iter()
            .enumerate()
            .map(|(k, &strand)| {
                let a = k as f32 / strands.len() as f32 * TAU;
                let planar = Vec2::new(a.cos(), a.sin());
                SectionPoint {
                    world: origin + basis.u * planar.x + basis.v * planar.y,
                    planar,
                    strand,
                    particle: 0,
                }
            })
            .collect();
        let mut s = CrossSection {
            points,
            plane: Plane {
                origin,
                normal: Vec3::Y,
            },
            basis,
            triangles: Vec::new(),
            boundary: Vec::new(),
        };
        s.triangulate().unwrap();
        s
    }

    fn two_node_graph() -> PlantGraph {
        let mut g = PlantGraph::new(Vec3::ZERO);
        g.add_node(0, Vec3::new(0.0, 2.0, 0.0));
        g
    }

    fn assert_indices_valid(mesh: &Mesh) {
        let n = mesh.vertex_count() as u32;
        assert!(mesh.indices.iter().flatten().all(|&i| i < n));
    }

    #[test]
    fn add_block_offsets_indices() {
        let mut mesh = Mesh::new();
        let first = mesh.add_block([Vec3::ZERO, Vec3::X, Vec3::Y], &[[0, 1, 2]]);
        let second = mesh.add_block([Vec3::Z, Vec3::ONE, Vec3::NEG_X], &[[0, 1, 2]]);

        assert_eq!((first, second), (0, 3));
        assert_eq!(mesh.indices, vec![[0, 1, 2], [3, 4, 5]]);
        assert_indices_valid(&mesh);
    }

    #[test]
    fn assembled_tube_has_one_block_per_section() {
        let g = two_node_graph();
        let strands: Vec<usize> = (0..6).collect();
        let bases = vec![Some(ring(0.0, &strands)), Some(ring(2.0, &strands))];
        let segments = vec![Segment {
            parent: 0,
            child: 1,
            sections: vec![ring(0.7, &strands), ring(1.4, &strands)],
        }];

        let (mesh, errors) = assemble_mesh(&g, &bases, &segments);

        assert!(errors.is_empty());
        assert_eq!(mesh.vertex_count(), 4 * 6);
        assert_indices_valid(&mesh);
        // 4 hexagon caps, 3 strips of 6 quads.
        assert_eq!(mesh.triangle_count(), 4 * 4 + 3 * 6 * 2);
    }

    #[test]
    fn strip_faces_point_outward() {
        let g = two_node_graph();
        let strands: Vec<usize> = (0..8).collect();
        let bases = vec![Some(ring(0.0, &strands)), Some(ring(2.0, &strands))];
        let segments = vec![Segment {
            parent: 0,
            child: 1,
            sections: Vec::new(),
        }];

        let (mut mesh, _) = assemble_mesh(&g, &bases, &segments);
        mesh.compute_normals();

        let caps = 2 * (2 * 8 - 2 - 8);
        for &[a, b, c] in &mesh.indices[caps..] {
            let [pa, pb, pc] = [a, b, c].map(|i| mesh.positions[i as usize]);
            let n = (pb - pa).cross(pc - pa);
            let centroid = (pa + pb + pc) / 3.0;
            let radial = Vec3::new(centroid.x, 0.0, centroid.z);
            assert!(n.dot(radial) > 0.0);
        }

        let normals = mesh.normals.as_ref().unwrap();
        assert_eq!(normals.len(), mesh.vertex_count());
        for n in normals {
            assert_abs_diff_eq!(n.length(), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn unmatched_strand_skips_quads() {
        let g = two_node_graph();
        // Strand 9 reaches the tip section but not the base below it.
        let bases = vec![Some(ring(0.0, &[0, 1, 2, 3])), None];
        let segments = vec![Segment {
            parent: 0,
            child: 1,
            sections: vec![ring(1.0, &[0, 1, 2, 9])],
        }];

        let (mesh, errors) = assemble_mesh(&g, &bases, &segments);

        // Both loop edges touching strand 9 are skipped.
        assert_eq!(
            errors,
            vec![StitchError { node: 1, strand: 9 }, StitchError { node: 1, strand: 9 }]
        );
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.triangle_count(), 2 + 2 + 2 * 2);
        assert_indices_valid(&mesh);
    }
}
