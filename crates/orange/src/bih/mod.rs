//! Bounding interval hierarchy over volume bounding boxes.
//!
//! The tree narrows point location and ray searches in a unit to the few
//! volumes whose boxes contain the point (or are crossed by the ray).
//! Volumes with fully infinite boxes cannot be partitioned; they are kept
//! in a separate list that is searched after the tree.
//!
//! # Architecture
//!
//! - [`BihBuilder`] - surface-area-heuristic construction
//! - [`BihEnclosingFinder`] - first volume containing a point
//! - [`BihIntersectingFinder`] - nearest volume along a ray

use serde::{Deserialize, Serialize};

use orange_math::BoundingBox;

use crate::id::{BihNodeId, LocalVolumeId};

mod builder;
mod finder;

pub use builder::BihBuilder;
pub use finder::{BihEnclosingFinder, BihIntersectingFinder};

/// A node in the flattened tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BihNode {
    /// Internal node with two children.
    Inner {
        /// Union of the children's boxes.
        bbox: BoundingBox,
        /// Left and right children.
        children: [BihNodeId; 2],
    },
    /// Leaf node holding volumes.
    Leaf {
        /// Union of the volumes' boxes.
        bbox: BoundingBox,
        /// Volumes in ascending order.
        volumes: Vec<LocalVolumeId>,
    },
}

impl BihNode {
    /// Bounding box of the node.
    pub fn bbox(&self) -> &BoundingBox {
        match self {
            BihNode::Inner { bbox, .. } | BihNode::Leaf { bbox, .. } => bbox,
        }
    }
}

/// Search tree for the volumes of one unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BihTree {
    /// Flattened nodes; the root is the first if any exist.
    pub nodes: Vec<BihNode>,
    /// Bounding box of every local volume (null for excluded volumes).
    pub bboxes: Vec<BoundingBox>,
    /// Volumes with infinite boxes, in ascending order.
    pub inf_volumes: Vec<LocalVolumeId>,
}

impl BihTree {
    /// Root node, if the tree holds any finite volumes.
    pub fn root(&self) -> Option<BihNodeId> {
        (!self.nodes.is_empty()).then(|| BihNodeId::new(0))
    }

    /// Node by id.
    pub fn node(&self, id: BihNodeId) -> &BihNode {
        &self.nodes[id.get()]
    }

    /// Box of a volume.
    pub fn bbox(&self, vol: LocalVolumeId) -> &BoundingBox {
        &self.bboxes[vol.get()]
    }

    /// Number of leaves.
    pub fn num_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, BihNode::Leaf { .. }))
            .count()
    }

    /// Number of edges on the longest path from the root to a leaf.
    pub fn depth(&self) -> usize {
        fn visit(tree: &BihTree, id: BihNodeId) -> usize {
            match tree.node(id) {
                BihNode::Leaf { .. } => 0,
                BihNode::Inner { children, .. } => {
                    1 + visit(tree, children[0]).max(visit(tree, children[1]))
                }
            }
        }
        self.root().map_or(0, |r| visit(self, r))
    }
}
