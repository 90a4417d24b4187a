//! Construction of the bounding interval hierarchy.
//!
//! Finite boxes are split recursively by their centers along the axis and
//! position with the lowest surface-area cost. Boxes that extend to
//! infinity along an axis make surface areas meaningless; such nodes are
//! split at the median center instead.

use orange_math::{BoundingBox, Real3};

use super::{BihNode, BihTree};
use crate::id::{BihNodeId, LocalVolumeId};

const NUM_BUCKETS: usize = 12;
const TRAVERSAL_COST: f64 = 0.125;

/// A volume to be partitioned.
#[derive(Debug, Clone, Copy)]
struct Item {
    id: LocalVolumeId,
    bbox: BoundingBox,
    center: Real3,
}

/// Build a BIH from volume bounding boxes.
#[derive(Debug, Clone, Copy)]
pub struct BihBuilder {
    max_leaf_size: usize,
}

impl BihBuilder {
    /// Create a builder with a maximum leaf size.
    pub fn new(max_leaf_size: usize) -> Self {
        debug_assert!(max_leaf_size > 0);
        Self { max_leaf_size }
    }

    /// Build a tree; `None` entries are excluded from the search.
    pub fn build(&self, bboxes: &[Option<BoundingBox>]) -> BihTree {
        let mut inf_volumes = Vec::new();
        let mut items = Vec::new();
        for (i, bbox) in bboxes.iter().enumerate() {
            let Some(bbox) = bbox else { continue };
            debug_assert!(!bbox.is_null() && !bbox.is_half_infinite());
            let id = LocalVolumeId::from_usize(i);
            if bbox.is_infinite() {
                inf_volumes.push(id);
            } else {
                items.push(Item {
                    id,
                    bbox: *bbox,
                    center: bbox.center(),
                });
            }
        }

        let mut nodes = Vec::new();
        if !items.is_empty() {
            self.build_node(&mut items, &mut nodes);
        }

        let tree = BihTree {
            nodes,
            bboxes: bboxes
                .iter()
                .map(|b| b.unwrap_or_else(BoundingBox::null))
                .collect(),
            inf_volumes,
        };
        tracing::debug!(
            nodes = tree.nodes.len(),
            leaves = tree.num_leaves(),
            depth = tree.depth(),
            infinite = tree.inf_volumes.len(),
            "built BIH"
        );
        tree
    }

    /// Recursively build a node, returning its index.
    fn build_node(&self, items: &mut [Item], nodes: &mut Vec<BihNode>) -> BihNodeId {
        let mut bounds = BoundingBox::null();
        let mut centers = BoundingBox::null();
        for item in items.iter() {
            bounds.include(&item.bbox);
            centers.include_point(&item.center);
        }

        let idx = BihNodeId::from_usize(nodes.len());
        let mid = if items.len() <= self.max_leaf_size {
            None
        } else {
            split(items, &bounds, &centers)
        };

        let Some(mid) = mid else {
            let mut volumes: Vec<_> = items.iter().map(|item| item.id).collect();
            volumes.sort();
            nodes.push(BihNode::Leaf {
                bbox: bounds,
                volumes,
            });
            return idx;
        };

        // Reserve space for this node
        nodes.push(BihNode::Leaf {
            bbox: bounds,
            volumes: Vec::new(),
        });
        let (left, right) = items.split_at_mut(mid);
        let left = self.build_node(left, nodes);
        let right = self.build_node(right, nodes);
        nodes[idx.get()] = BihNode::Inner {
            bbox: bounds,
            children: [left, right],
        };
        idx
    }
}

/// Partition items in place, returning the split point.
///
/// Returns `None` if every center coincides.
fn split(items: &mut [Item], bounds: &BoundingBox, centers: &BoundingBox) -> Option<usize> {
    let extent = centers.upper - centers.lower;
    let widest = (0..3).max_by(|&a, &b| extent[a].total_cmp(&extent[b]))?;
    if !(extent[widest] > 0.0) {
        return None;
    }

    if bounds.is_finite() {
        if let Some((axis, pos)) = find_best_split(items, bounds, centers) {
            let mid = partition(items, axis, pos);
            if mid > 0 && mid < items.len() {
                return Some(mid);
            }
        }
    }

    // Median split along the widest spread of centers
    items.sort_by(|a, b| a.center[widest].total_cmp(&b.center[widest]));
    Some(items.len() / 2)
}

/// Find the axis and position with the lowest bucketed SAH cost.
fn find_best_split(
    items: &[Item],
    bounds: &BoundingBox,
    centers: &BoundingBox,
) -> Option<(usize, f64)> {
    let total_area = bounds.surface_area();
    if !(total_area > 0.0) {
        return None;
    }

    let mut best: Option<(f64, usize, f64)> = None;
    for axis in 0..3 {
        let axis_min = centers.lower[axis];
        let axis_extent = centers.upper[axis] - axis_min;
        if !(axis_extent > 0.0) {
            continue;
        }

        let mut counts = [0usize; NUM_BUCKETS];
        let mut bucket_bounds = [BoundingBox::null(); NUM_BUCKETS];
        for item in items {
            let b = ((item.center[axis] - axis_min) / axis_extent * NUM_BUCKETS as f64) as usize;
            let b = b.min(NUM_BUCKETS - 1);
            counts[b] += 1;
            bucket_bounds[b].include(&item.bbox);
        }

        for split in 1..NUM_BUCKETS {
            let (mut left_count, mut left_bounds) = (0, BoundingBox::null());
            for i in 0..split {
                left_count += counts[i];
                left_bounds.include(&bucket_bounds[i]);
            }
            let (mut right_count, mut right_bounds) = (0, BoundingBox::null());
            for i in split..NUM_BUCKETS {
                right_count += counts[i];
                right_bounds.include(&bucket_bounds[i]);
            }
            if left_count == 0 || right_count == 0 {
                continue;
            }

            let cost = TRAVERSAL_COST
                + left_bounds.surface_area() / total_area * left_count as f64
                + right_bounds.surface_area() / total_area * right_count as f64;
            if best.map_or(true, |(c, _, _)| cost < c) {
                let pos = axis_min + (split as f64 / NUM_BUCKETS as f64) * axis_extent;
                best = Some((cost, axis, pos));
            }
        }
    }
    best.map(|(_, axis, pos)| (axis, pos))
}

/// Move items with centers below `pos` to the front.
fn partition(items: &mut [Item], axis: usize, pos: f64) -> usize {
    let mut left = 0;
    let mut right = items.len();
    while left < right {
        if items[left].center[axis] < pos {
            left += 1;
        } else {
            right -= 1;
            items.swap(left, right);
        }
    }
    left
}
