//! Axis-aligned bounding boxes.
//!
//! Used as the broadphase for point location: only volumes whose boxes
//! contain a point (or are crossed by a ray) need their logic evaluated.

use serde::{Deserialize, Serialize};

use crate::{Axis, Real3, Tolerance};

/// Axis-aligned bounding box in 3D.
///
/// A box whose lower corner exceeds its upper corner along any axis is
/// "null" (contains nothing). Infinite bounds are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum corner.
    pub lower: Real3,
    /// Maximum corner.
    pub upper: Real3,
}

impl BoundingBox {
    /// Create a box from lower and upper corners.
    pub fn new(lower: Real3, upper: Real3) -> Self {
        Self { lower, upper }
    }

    /// A box that contains every point.
    pub fn from_infinite() -> Self {
        Self {
            lower: Real3::repeat(f64::NEG_INFINITY),
            upper: Real3::repeat(f64::INFINITY),
        }
    }

    /// An inverted box suitable for expansion.
    pub fn null() -> Self {
        Self {
            lower: Real3::repeat(f64::INFINITY),
            upper: Real3::repeat(f64::NEG_INFINITY),
        }
    }

    /// Whether the box contains no points.
    pub fn is_null(&self) -> bool {
        (0..3).any(|ax| self.lower[ax] > self.upper[ax])
    }

    /// Whether every bound is infinite.
    pub fn is_infinite(&self) -> bool {
        self.lower.iter().all(|&v| v == f64::NEG_INFINITY)
            && self.upper.iter().all(|&v| v == f64::INFINITY)
    }

    /// Whether every bound is finite.
    pub fn is_finite(&self) -> bool {
        self.lower.iter().chain(self.upper.iter()).all(|v| v.is_finite())
    }

    /// Whether exactly one side of any axis is infinite.
    pub fn is_half_infinite(&self) -> bool {
        (0..3).any(|ax| self.lower[ax].is_infinite() != self.upper[ax].is_infinite())
    }

    /// Test whether a point is inside or on the box.
    pub fn contains(&self, pos: &Real3) -> bool {
        (0..3).all(|ax| pos[ax] >= self.lower[ax] && pos[ax] <= self.upper[ax])
    }

    /// Center of the box; infinite axes are centered at zero.
    pub fn center(&self) -> Real3 {
        let mut c = (self.lower + self.upper) / 2.0;
        for v in c.iter_mut() {
            if v.is_nan() {
                *v = 0.0;
            }
        }
        c
    }

    /// Width along one axis.
    pub fn width(&self, axis: Axis) -> f64 {
        self.upper[axis.index()] - self.lower[axis.index()]
    }

    /// Surface area, used by split heuristics.
    pub fn surface_area(&self) -> f64 {
        if self.is_null() {
            return 0.0;
        }
        let d = self.upper - self.lower;
        2.0 * (d.x * d.y + d.y * d.z + d.z * d.x)
    }

    /// Expand this box to include a point.
    pub fn include_point(&mut self, p: &Real3) {
        self.lower = self.lower.inf(p);
        self.upper = self.upper.sup(p);
    }

    /// Expand this box to include another box.
    pub fn include(&mut self, other: &BoundingBox) {
        if other.is_null() {
            return;
        }
        self.include_point(&other.lower);
        self.include_point(&other.upper);
    }

    /// Grow the box outward so that points within tolerance of its
    /// faces are still enclosed.
    ///
    /// Each finite bound moves by the larger of the absolute tolerance and
    /// the relative tolerance scaled by the bound's magnitude.
    pub fn bumped(&self, tol: &Tolerance) -> Self {
        let bump = |v: f64| tol.abs.max(tol.rel * v.abs());
        let mut result = *self;
        for ax in 0..3 {
            result.lower[ax] -= bump(self.lower[ax]);
            result.upper[ax] += bump(self.upper[ax]);
        }
        result
    }

    /// Slab test of a ray against the box.
    ///
    /// Returns the entry and exit distances along the ray, clamped to start
    /// at zero, or `None` if the ray misses.
    pub fn intersect_ray(&self, pos: &Real3, dir: &Real3) -> Option<(f64, f64)> {
        let mut t_min = 0.0_f64;
        let mut t_max = f64::INFINITY;

        for ax in 0..3 {
            if dir[ax] == 0.0 {
                if pos[ax] < self.lower[ax] || pos[ax] > self.upper[ax] {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / dir[ax];
            let mut t0 = (self.lower[ax] - pos[ax]) * inv;
            let mut t1 = (self.upper[ax] - pos[ax]) * inv;
            if inv < 0.0 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_max < t_min {
                return None;
            }
        }

        Some((t_min, t_max))
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::null()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> BoundingBox {
        BoundingBox::new(Real3::new(0.0, 0.0, 0.0), Real3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_null_and_infinite() {
        assert!(BoundingBox::null().is_null());
        assert!(BoundingBox::default().is_null());
        assert!(!BoundingBox::from_infinite().is_null());
        assert!(BoundingBox::from_infinite().is_infinite());
        assert!(!unit_box().is_infinite());
        assert!(unit_box().is_finite());
    }

    #[test]
    fn test_half_infinite() {
        let half = BoundingBox::new(
            Real3::new(f64::NEG_INFINITY, 0.0, 0.0),
            Real3::new(1.0, 1.0, 1.0),
        );
        assert!(half.is_half_infinite());

        let slab = BoundingBox::new(
            Real3::new(f64::NEG_INFINITY, 0.0, 0.0),
            Real3::new(f64::INFINITY, 1.0, 1.0),
        );
        assert!(!slab.is_half_infinite());
        assert!(!slab.is_infinite());
        assert_eq!(slab.center(), Real3::new(0.0, 0.5, 0.5));
    }

    #[test]
    fn test_contains() {
        let b = unit_box();
        assert!(b.contains(&Real3::new(0.5, 0.5, 0.5)));
        assert!(b.contains(&Real3::new(1.0, 0.0, 0.5)));
        assert!(!b.contains(&Real3::new(1.5, 0.5, 0.5)));
        assert!(BoundingBox::from_infinite().contains(&Real3::new(1e300, -1e300, 0.0)));
    }

    #[test]
    fn test_include() {
        let mut b = BoundingBox::null();
        b.include_point(&Real3::new(1.0, 2.0, 3.0));
        b.include(&unit_box());
        assert_eq!(b.lower, Real3::new(0.0, 0.0, 0.0));
        assert_eq!(b.upper, Real3::new(1.0, 2.0, 3.0));
        assert!((b.surface_area() - 22.0).abs() < 1e-12);
    }

    #[test]
    fn test_bumped() {
        let tol = Tolerance { rel: 1e-3, abs: 1e-2 };
        let b = BoundingBox::new(Real3::new(-100.0, 0.0, 0.0), Real3::new(1.0, 1.0, 1.0))
            .bumped(&tol);
        assert!((b.lower.x + 100.1).abs() < 1e-12);
        assert!((b.lower.y + 0.01).abs() < 1e-12);
        assert!((b.upper.x - 1.01).abs() < 1e-12);

        let inf = BoundingBox::from_infinite().bumped(&tol);
        assert!(inf.is_infinite());
    }

    #[test]
    fn test_intersect_ray() {
        let b = unit_box();
        let hit = b
            .intersect_ray(&Real3::new(-1.0, 0.5, 0.5), &Real3::new(1.0, 0.0, 0.0))
            .unwrap();
        assert!((hit.0 - 1.0).abs() < 1e-12);
        assert!((hit.1 - 2.0).abs() < 1e-12);

        let inside = b
            .intersect_ray(&Real3::new(0.5, 0.5, 0.5), &Real3::new(0.0, 0.0, -1.0))
            .unwrap();
        assert_eq!(inside.0, 0.0);
        assert!((inside.1 - 0.5).abs() < 1e-12);

        assert!(b
            .intersect_ray(&Real3::new(-1.0, 2.0, 0.5), &Real3::new(1.0, 0.0, 0.0))
            .is_none());
        assert!(b
            .intersect_ray(&Real3::new(2.0, 0.5, 0.5), &Real3::new(1.0, 0.0, 0.0))
            .is_none());
    }
}
