//! Per-node coordinate frames ("frontplanes").
//!
//! Every node gets an orthonormal, right-handed basis whose `forward` axis
//! follows the incoming branch edge. The `right` axis is derived from the
//! parent's `up` axis instead of a fixed world axis, which keeps the frame
//! from twisting along a branch and avoids flips on near-vertical edges.

use crate::graph::PlantGraph;
use glam::{Mat3, Vec2, Vec3};
use log::warn;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frontplane {
    pub right: Vec3,
    pub up: Vec3,
    pub forward: Vec3,
}

impl Frontplane {
    /// Basis of the root node.
    pub const DEFAULT: Self = Self {
        right: Vec3::new(1.0, 0.0, 0.0),
        up: Vec3::new(0.0, 0.0, -1.0),
        forward: Vec3::new(0.0, 1.0, 0.0),
    };

    /// Frame of a node whose incoming edge is `edge`, given the parent frame.
    ///
    /// Degenerate cases:
    /// - zero-length edge: the parent frame is reused;
    /// - edge parallel to the parent's `up`: `right` falls back to the
    ///   parent's `right` axis, then to any vector orthogonal to `forward`.
    pub fn propagate(parent: &Frontplane, edge: Vec3) -> Option<Self> {
        let forward = edge.try_normalize()?;
        let right = parent
            .up
            .cross(forward)
            .try_normalize()
            .or_else(|| (parent.right - forward * parent.right.dot(forward)).try_normalize())
            .unwrap_or_else(|| forward.any_orthonormal_vector());
        let up = forward.cross(right);

        Some(Self { right, up, forward })
    }

    /// Column matrix `[right, up, forward]`.
    pub fn to_mat3(&self) -> Mat3 {
        Mat3::from_cols(self.right, self.up, self.forward)
    }

    /// Maps a planar offset in this frame to a world-space displacement.
    #[inline]
    pub fn to_world(&self, offset: Vec2) -> Vec3 {
        self.right * offset.x + self.up * offset.y
    }

    /// Projects a world-space displacement onto the frame's plane.
    #[inline]
    pub fn to_local(&self, v: Vec3) -> Vec2 {
        Vec2::new(v.dot(self.right), v.dot(self.up))
    }
}

impl Default for Frontplane {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Computes the frontplane of every node, indexed by node id.
///
/// Nodes are visited in preorder so every parent frame exists before its
/// children are processed.
pub fn compute_frontplanes(graph: &PlantGraph) -> Vec<Frontplane> {
    let mut frames = vec![Frontplane::DEFAULT; graph.len()];

    for id in graph.preorder() {
        let node = graph.node(id);
        let Some(parent) = node.parent else {
            continue;
        };

        let parent_frame = frames[parent];
        let edge = node.pos - graph.node(parent).pos;
        frames[id] = match Frontplane::propagate(&parent_frame, edge) {
            Some(frame) => frame,
            None => {
                warn!("node {id} coincides with its parent {parent}; reusing parent frame");
                parent_frame
            }
        };
    }
    frames
}
