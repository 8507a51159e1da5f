//! Rooted branch skeleton consumed by the pipeline.

use crate::types::{IdAllocator, NodeId};
use glam::Vec3;

#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub pos: Vec3,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// Tree of 3D branch-node positions.
///
/// Nodes can only be attached to an existing parent, so the structure is a
/// tree by construction: exactly one root (id `0`), no cycles, every node
/// reachable from the root along exactly one path.
#[derive(Debug, Clone)]
pub struct PlantGraph {
    nodes: Vec<Node>,
    ids: IdAllocator,
}

impl Node {
    fn new_root(id: NodeId, pos: Vec3) -> Self {
        Self {
            id,
            pos,
            parent: None,
            children: Vec::with_capacity(4),
        }
    }

    fn new_child(id: NodeId, pos: Vec3, parent: NodeId) -> Self {
        Self {
            id,
            pos,
            parent: Some(parent),
            children: Vec::with_capacity(4),
        }
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

impl PlantGraph {
    pub fn new(root_pos: Vec3) -> Self {
        let mut ids = IdAllocator::new();
        let root = Node::new_root(ids.next_id(), root_pos);
        Self {
            nodes: vec![root],
            ids,
        }
    }

    /// Attaches a new node below `parent`.
    ///
    /// ### Panics
    /// Panics if `parent` is not a node of this graph.
    pub fn add_node(&mut self, parent: NodeId, pos: Vec3) -> NodeId {
        assert!(parent < self.nodes.len(), "unknown parent node {parent}");
        let id = self.ids.next_id();
        self.nodes.push(Node::new_child(id, pos, parent));
        self.nodes[parent].children.push(id);
        id
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        0
    }

    /// ### Panics
    /// Panics if `id` is not a node of this graph.
    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[inline]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Node ids in depth-first preorder (parents before children, children
    /// in insertion order).
    ///
    /// Uses an explicit stack and a visited set, so deep skeletons cannot
    /// overflow the call stack.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut visited = vec![false; self.nodes.len()];
        let mut stack = vec![self.root()];

        while let Some(id) = stack.pop() {
            if visited[id] {
                continue;
            }
            visited[id] = true;
            order.push(id);

            // Reverse so the first child is popped first.
            for &child in self.nodes[id].children.iter().rev() {
                if !visited[child] {
                    stack.push(child);
                }
            }
        }
        order
    }

    /// Node ids in depth-first postorder (children before parents).
    pub fn postorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut visited = vec![false; self.nodes.len()];
        // (node, children already expanded)
        let mut stack = vec![(self.root(), false)];

        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                order.push(id);
                continue;
            }
            if visited[id] {
                continue;
            }
            visited[id] = true;
            stack.push((id, true));
            for &child in self.nodes[id].children.iter().rev() {
                if !visited[child] {
                    stack.push((child, false));
                }
            }
        }
        order
    }

    /// All `(parent, child)` edges, ordered by the preorder of the child.
    pub fn edges(&self) -> Vec<(NodeId, NodeId)> {
        self.preorder()
            .into_iter()
            .filter_map(|id| self.nodes[id].parent.map(|p| (p, id)))
            .collect()
    }
}
