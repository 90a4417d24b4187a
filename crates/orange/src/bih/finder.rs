//! Searches over a built BIH.

use orange_math::Real3;

use super::{BihNode, BihTree};
use crate::id::{BihNodeId, LocalVolumeId};

/// Find the first volume that contains a point.
///
/// Candidate volumes are those whose boxes contain the point; the caller's
/// predicate decides membership. Finite volumes are tested in tree order
/// (ascending within a leaf) before the infinite ones.
#[derive(Debug, Clone, Copy)]
pub struct BihEnclosingFinder<'a> {
    tree: &'a BihTree,
}

impl<'a> BihEnclosingFinder<'a> {
    /// Search a tree.
    pub fn new(tree: &'a BihTree) -> Self {
        Self { tree }
    }

    /// First candidate for which `is_inside` returns true.
    pub fn find<F>(&self, pos: &Real3, mut is_inside: F) -> Option<LocalVolumeId>
    where
        F: FnMut(LocalVolumeId) -> bool,
    {
        if let Some(root) = self.tree.root() {
            if let Some(found) = self.visit(root, pos, &mut is_inside) {
                return Some(found);
            }
        }
        self.tree.inf_volumes.iter().copied().find(|&v| is_inside(v))
    }

    fn visit<F>(&self, id: BihNodeId, pos: &Real3, is_inside: &mut F) -> Option<LocalVolumeId>
    where
        F: FnMut(LocalVolumeId) -> bool,
    {
        let node = self.tree.node(id);
        if !node.bbox().contains(pos) {
            return None;
        }
        match node {
            BihNode::Leaf { volumes, .. } => volumes
                .iter()
                .copied()
                .find(|&v| self.tree.bbox(v).contains(pos) && is_inside(v)),
            BihNode::Inner { children, .. } => children
                .iter()
                .find_map(|&child| self.visit(child, pos, is_inside)),
        }
    }
}

/// Find the nearest volume hit along a ray.
///
/// Nodes are visited closest first; anything whose box is entered beyond
/// the best distance found so far is skipped.
#[derive(Debug, Clone, Copy)]
pub struct BihIntersectingFinder<'a> {
    tree: &'a BihTree,
}

impl<'a> BihIntersectingFinder<'a> {
    /// Search a tree.
    pub fn new(tree: &'a BihTree) -> Self {
        Self { tree }
    }

    /// Nearest result of `intersect` over candidate volumes.
    ///
    /// `intersect(volume, max_dist)` returns the distance to a volume and
    /// an associated value, or `None` if it is not hit within `max_dist`.
    pub fn find<T, F>(
        &self,
        pos: &Real3,
        dir: &Real3,
        max_dist: f64,
        mut intersect: F,
    ) -> Option<(f64, T)>
    where
        F: FnMut(LocalVolumeId, f64) -> Option<(f64, T)>,
    {
        let mut best: Option<(f64, T)> = None;
        let mut best_dist = max_dist;
        if let Some(root) = self.tree.root() {
            self.visit(root, pos, dir, &mut best, &mut best_dist, &mut intersect);
        }
        for &v in &self.tree.inf_volumes {
            test_volume(v, best_dist, &mut best, &mut intersect);
            if let Some((d, _)) = &best {
                best_dist = *d;
            }
        }
        best
    }

    fn visit<T, F>(
        &self,
        id: BihNodeId,
        pos: &Real3,
        dir: &Real3,
        best: &mut Option<(f64, T)>,
        best_dist: &mut f64,
        intersect: &mut F,
    ) where
        F: FnMut(LocalVolumeId, f64) -> Option<(f64, T)>,
    {
        match self.tree.node(id) {
            BihNode::Leaf { volumes, .. } => {
                for &v in volumes {
                    let entry = self.tree.bbox(v).intersect_ray(pos, dir);
                    if entry.is_some_and(|(t_min, _)| t_min <= *best_dist) {
                        test_volume(v, *best_dist, best, intersect);
                        if let Some((d, _)) = best {
                            *best_dist = *d;
                        }
                    }
                }
            }
            BihNode::Inner { children, .. } => {
                let entry = |child: BihNodeId| {
                    self.tree
                        .node(child)
                        .bbox()
                        .intersect_ray(pos, dir)
                        .map(|(t_min, _)| t_min)
                };
                // Nearer child first; missed children sort last as infinity
                let mut order = children.map(|c| (entry(c).unwrap_or(f64::INFINITY), c));
                if order[1].0 < order[0].0 {
                    order.swap(0, 1);
                }
                for (t_min, child) in order {
                    if t_min < f64::INFINITY && t_min <= *best_dist {
                        self.visit(child, pos, dir, best, best_dist, intersect);
                    }
                }
            }
        }
    }
}

fn test_volume<T, F>(v: LocalVolumeId, max_dist: f64, best: &mut Option<(f64, T)>, intersect: &mut F)
where
    F: FnMut(LocalVolumeId, f64) -> Option<(f64, T)>,
{
    if let Some((dist, value)) = intersect(v, max_dist) {
        if best.as_ref().map_or(dist <= max_dist, |(d, _)| dist < *d) {
            *best = Some((dist, value));
        }
    }
}
