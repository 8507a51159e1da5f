//! End-to-end strand meshing of a [`PlantGraph`].
//!
//! A run goes through these stages in order:
//! 1. [`compute_frontplanes`]: one coordinate frame per node.
//! 2. [`place_strands`]: leaf bundles merged towards the root.
//! 3. [`pack_bundles`]: PBD packing of every node's bundle.
//! 4. [`StrandSet::from_bundles`] and [`StrandSet::resample`]: world-space
//!    strands densified with a centripetal Catmull-Rom spline.
//! 5. [`node_base_section`] and [`segment_sections`]: planar slices,
//!    triangulated with [`CrossSection::triangulate`].
//! 6. [`assemble_mesh`]: caps plus stitched tube strips.
//!
//! Recoverable failures (degenerate sections, unmatched strands) never abort
//! the run. They are logged and collected in
//! [`PipelineOutput::diagnostics`].

use std::time::{SystemTime, UNIX_EPOCH};

use glam::Vec3;
use log::{debug, info, warn};
use rand::{SeedableRng, rngs::StdRng};

use crate::{
    config::Config,
    cross_section::{CrossSection, Segment, node_base_section, segment_sections},
    error::StrandError,
    frame::{Frontplane, compute_frontplanes},
    graph::PlantGraph,
    mesh::{Mesh, assemble_mesh},
    pbd::pack_bundles,
    placement::{NodeBundles, place_strands},
    strand::{NodeParticleIndex, StrandSet},
    types::IdAllocator,
};

/// Everything a run produces, from frames down to the mesh.
#[derive(Clone, Debug)]
pub struct PipelineOutput {
    pub frames: Vec<Frontplane>,
    /// Packed bundles, indexed by node id.
    pub bundles: NodeBundles,
    /// Resampled strands.
    pub strands: StrandSet,
    pub node_index: NodeParticleIndex,
    /// Triangulated base section per node id; `None` where it failed.
    pub bases: Vec<Option<CrossSection>>,
    /// Interpolated sections per skeleton edge, in preorder of the child.
    pub segments: Vec<Segment>,
    pub mesh: Mesh,
    /// World-space polyline of every strand, indexed by strand id.
    pub polylines: Vec<Vec<Vec3>>,
    pub diagnostics: Vec<StrandError>,
    /// Seed the placement RNG was started from.
    pub seed: u64,
}

/// One meshing run over a borrowed graph.
///
/// The pipeline owns its RNG and strand id allocator, so independent
/// pipelines never share state.
#[derive(Debug)]
pub struct StrandPipeline<'g> {
    graph: &'g PlantGraph,
    cfg: Config,
    rng: StdRng,
    ids: IdAllocator,
    seed: u64,
}

fn wall_clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos() as u64)
}

impl<'g> StrandPipeline<'g> {
    /// Validates `cfg` and seeds the RNG from `cfg.seed`, or from the wall
    /// clock if unset.
    pub fn new(graph: &'g PlantGraph, cfg: Config) -> Result<Self, StrandError> {
        cfg.validate()?;

        let seed = cfg.seed.unwrap_or_else(wall_clock_seed);
        info!(
            "strand pipeline seeded with {seed} ({} nodes, {} leaves)",
            graph.len(),
            graph.leaf_count()
        );

        Ok(Self {
            graph,
            cfg,
            rng: StdRng::seed_from_u64(seed),
            ids: IdAllocator::new(),
            seed,
        })
    }

    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Runs every stage and returns the results.
    pub fn run(mut self) -> PipelineOutput {
        let graph = self.graph;
        let cfg = self.cfg;

        let frames = compute_frontplanes(graph);

        let mut bundles = place_strands(graph, &frames, &cfg, &mut self.ids, &mut self.rng);
        let strand_count = self.ids.allocated();
        debug!("placed {strand_count} strands");

        pack_bundles(&mut bundles, &cfg, strand_count);

        let mut strands = StrandSet::from_bundles(graph, &frames, &bundles, strand_count);
        strands.resample(cfg.spline_steps);
        let node_index = NodeParticleIndex::build(&strands, graph.len());
        let polylines = strands.polylines();

        let mut diagnostics = Vec::new();

        let bases: Vec<Option<CrossSection>> = (0..graph.len())
            .map(|node| {
                let mut base = node_base_section(graph, &frames, &strands, &node_index, node);
                match base.triangulate() {
                    Ok(()) => Some(base),
                    Err(source) => {
                        let err = StrandError::Base { node, source };
                        warn!("skipping {err}");
                        diagnostics.push(err);
                        None
                    }
                }
            })
            .collect();

        let mut segments = Vec::new();
        for (parent, child) in graph.edges() {
            let results = segment_sections(
                graph,
                &frames,
                &strands,
                &node_index,
                parent,
                child,
                cfg.spline_steps,
            );

            let mut sections = Vec::with_capacity(results.len());
            for (k, result) in results.into_iter().enumerate() {
                let triangulated = result.and_then(|mut s| match s.triangulate() {
                    Ok(()) => Ok(s),
                    Err(source) => Err(StrandError::Section {
                        node: child,
                        section: k + 1,
                        source,
                    }),
                });
                match triangulated {
                    Ok(s) => sections.push(s),
                    Err(err) => {
                        warn!("skipping {err}");
                        diagnostics.push(err);
                    }
                }
            }
            segments.push(Segment {
                parent,
                child,
                sections,
            });
        }

        let (mut mesh, stitch_errors) = assemble_mesh(graph, &bases, &segments);
        diagnostics.extend(stitch_errors.into_iter().map(StrandError::from));

        if cfg.compute_normals {
            mesh.compute_normals();
        }

        info!(
            "meshed {strand_count} strands: {} vertices, {} triangles, {} diagnostics",
            mesh.vertex_count(),
            mesh.triangle_count(),
            diagnostics.len()
        );

        PipelineOutput {
            frames,
            bundles,
            strands,
            node_index,
            bases,
            segments,
            mesh,
            polylines,
            diagnostics,
            seed: self.seed,
        }
    }
}

/// Branching skeleton used by the preview binary and the tests: a trunk
/// splitting into a short side branch and a forked main branch.
pub fn demo_graph() -> PlantGraph {
    let mut g = PlantGraph::new(Vec3::ZERO);
    let trunk = g.add_node(g.root(), Vec3::new(0.0, 2.0, 0.0));
    g.add_node(trunk, Vec3::new(-0.5, 2.8, 0.4));
    let fork = g.add_node(trunk, Vec3::new(0.9, 3.3, -0.4));
    g.add_node(fork, Vec3::new(1.0, 4.8, 0.4));
    g.add_node(fork, Vec3::new(0.8, 4.2, -0.6));
    g
}
