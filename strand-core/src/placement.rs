//! Bottom-up strand placement.
//!
//! Leaves spawn new strands on a ring; unbranched nodes pass their child's
//! bundle through unchanged; branching nodes lay their children's bundles
//! out side by side. The result is deterministic for a given RNG state but
//! not collision-free: overlaps are resolved afterwards by the packer.

use crate::{
    config::Config,
    frame::Frontplane,
    graph::PlantGraph,
    types::{IdAllocator, NodeId, StrandId},
};
use glam::Vec2;
use log::debug;
use rand::Rng;
use std::f32::consts::TAU;

/// One strand passing through a node, with its offset in the node plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BundleEntry {
    pub strand: StrandId,
    pub offset: Vec2,
}

/// Strand bundle of every node, indexed by [`NodeId`].
#[derive(Clone, Debug, Default)]
pub struct NodeBundles {
    bundles: Vec<Vec<BundleEntry>>,
}

impl NodeBundles {
    pub fn with_nodes(count: usize) -> Self {
        Self {
            bundles: vec![Vec::new(); count],
        }
    }

    #[inline]
    pub fn at(&self, node: NodeId) -> &[BundleEntry] {
        &self.bundles[node]
    }

    #[inline]
    pub fn at_mut(&mut self, node: NodeId) -> &mut Vec<BundleEntry> {
        &mut self.bundles[node]
    }

    pub fn set(&mut self, node: NodeId, entries: Vec<BundleEntry>) {
        self.bundles[node] = entries;
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    /// Iterates `(node, bundle)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &[BundleEntry])> {
        self.bundles.iter().enumerate().map(|(id, b)| (id, b.as_slice()))
    }
}

/// Largest distance of a bundle particle from the node center.
pub fn radial_extent(bundle: &[BundleEntry]) -> f32 {
    bundle
        .iter()
        .map(|e| e.offset.length())
        .fold(0.0, f32::max)
}

/// Generates the bundle of a leaf node.
///
/// Every strand gets a fresh id and a random angle on a circle of radius
/// [`Config::leaf_placement_radius`]. No intersection test is performed.
pub fn leaf_bundle(cfg: &Config, ids: &mut IdAllocator, rng: &mut impl Rng) -> Vec<BundleEntry> {
    let radius = cfg.leaf_placement_radius();
    (0..cfg.strands_per_leaf)
        .map(|_| {
            let theta = rng.random_range(0.0..TAU);
            BundleEntry {
                strand: ids.next_id(),
                offset: Vec2::new(theta.cos(), theta.sin()) * radius,
            }
        })
        .collect()
}

/// Merges child bundles at a branching node.
///
/// `children` holds, per child, the merge direction in the node plane and
/// the child's bundle. Children are ordered by bundle size (descending,
/// stable). The largest bundle is copied as is; each following bundle `k`
/// is shifted along its direction by `R + e_k`, where `e_k` is its own
/// radial extent and `R` the running footprint of the bundles already laid
/// out (starting at the largest bundle's extent and growing by `2·e_k`).
pub fn merge_bundles(mut children: Vec<(Vec2, &[BundleEntry])>) -> Vec<BundleEntry> {
    children.sort_by(|a, b| b.1.len().cmp(&a.1.len()));

    let total = children.iter().map(|(_, b)| b.len()).sum();
    let mut merged = Vec::with_capacity(total);

    let mut footprint = 0.0;
    for (k, (dir, bundle)) in children.into_iter().enumerate() {
        let extent = radial_extent(bundle);
        let shift = if k == 0 {
            footprint = extent;
            Vec2::ZERO
        } else {
            let s = dir * (footprint + extent);
            footprint += 2.0 * extent;
            s
        };

        merged.extend(bundle.iter().map(|e| BundleEntry {
            strand: e.strand,
            offset: e.offset + shift,
        }));
    }
    merged
}

/// Direction towards `child` expressed in `frame`'s plane.
///
/// Falls back to the frame's right axis when the edge is parallel to the
/// node's forward axis.
pub fn merge_direction(
    graph: &PlantGraph,
    frame: &Frontplane,
    node: NodeId,
    child: NodeId,
) -> Vec2 {
    let edge = graph.node(child).pos - graph.node(node).pos;
    frame.to_local(edge).try_normalize().unwrap_or(Vec2::X)
}

/// Places strands for the whole graph, children before parents.
///
/// ### Returns
/// The bundle of every node. Strand ids are drawn from `ids`, so after the
/// call `ids.allocated()` equals the number of leaves times
/// `cfg.strands_per_leaf`.
pub fn place_strands(
    graph: &PlantGraph,
    frames: &[Frontplane],
    cfg: &Config,
    ids: &mut IdAllocator,
    rng: &mut impl Rng,
) -> NodeBundles {
    let mut bundles = NodeBundles::with_nodes(graph.len());

    for id in graph.postorder() {
        let children = graph.children(id);

        let bundle = match children {
            [] => leaf_bundle(cfg, ids, rng),
            [only] => bundles.at(*only).to_vec(),
            _ => {
                let inputs = children
                    .iter()
                    .map(|&c| (merge_direction(graph, &frames[id], id, c), bundles.at(c)))
                    .collect();
                let merged = merge_bundles(inputs);
                debug!(
                    "merged {} child bundles into {} strands at node {id}",
                    children.len(),
                    merged.len()
                );
                merged
            }
        };
        bundles.set(id, bundle);
    }
    bundles
}
