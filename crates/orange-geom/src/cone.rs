//! Double cones parallel to a coordinate axis.

use orange_math::{Axis, Real3};
use serde::{Deserialize, Serialize};

use crate::{Intersections, QuadraticSolver, SignedSense, Surface, SurfaceState, SurfaceType};

/// A double cone with its axis parallel to a coordinate axis.
///
/// For the Z cone: `(x - x0)^2 + (y - y0)^2 - t^2 (z - z0)^2 = 0`, where
/// `t` is the tangent of the half-opening angle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConeAligned {
    /// Axis the cone is parallel to.
    pub axis: Axis,
    /// Vanishing point.
    pub origin: Real3,
    /// Square of the opening tangent.
    pub tsq: f64,
}

impl ConeAligned {
    /// Create a cone with vanishing point `origin` and opening tangent.
    pub fn new(axis: Axis, origin: Real3, tangent: f64) -> Self {
        debug_assert!(tangent > 0.0);
        Self {
            axis,
            origin,
            tsq: tangent * tangent,
        }
    }

    /// Per-axis coefficient: `-t^2` along the axis, one elsewhere.
    fn scale(&self) -> Real3 {
        let mut s = Real3::repeat(1.0);
        s[self.axis.index()] = -self.tsq;
        s
    }
}

impl Surface for ConeAligned {
    fn surface_type(&self) -> SurfaceType {
        match self.axis {
            Axis::X => SurfaceType::Kx,
            Axis::Y => SurfaceType::Ky,
            Axis::Z => SurfaceType::Kz,
        }
    }

    fn calc_sense(&self, pos: &Real3) -> SignedSense {
        let rel = pos - self.origin;
        SignedSense::from_real(rel.component_mul(&self.scale()).dot(&rel))
    }

    fn calc_intersections(
        &self,
        pos: &Real3,
        dir: &Real3,
        on_surface: SurfaceState,
    ) -> Intersections {
        let rel = pos - self.origin;
        let s = self.scale();
        let a = dir.component_mul(&s).dot(dir);
        let half_b = rel.component_mul(&s).dot(dir);
        let c = rel.component_mul(&s).dot(&rel);
        QuadraticSolver::solve_general(a, half_b, c, on_surface)
    }

    fn calc_normal(&self, pos: &Real3) -> Real3 {
        (pos - self.origin).component_mul(&self.scale()).normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use orange_math::NO_INTERSECTION;

    #[test]
    fn test_sense() {
        // 45-degree cone about z
        let k = ConeAligned::new(Axis::Z, Real3::zeros(), 1.0);
        assert_eq!(k.surface_type(), SurfaceType::Kz);
        assert_eq!(k.calc_sense(&Real3::new(0.5, 0.0, 1.0)), SignedSense::Inside);
        assert_eq!(k.calc_sense(&Real3::new(0.5, 0.0, -1.0)), SignedSense::Inside);
        assert_eq!(k.calc_sense(&Real3::new(2.0, 0.0, 1.0)), SignedSense::Outside);
    }

    #[test]
    fn test_intersect() {
        let k = ConeAligned::new(Axis::Z, Real3::new(0.0, 0.0, 0.0), 0.5);
        // Horizontal ray at z = 2 crosses where |x| = 1
        let d = k.calc_intersections(
            &Real3::new(-3.0, 0.0, 2.0),
            &Real3::new(1.0, 0.0, 0.0),
            SurfaceState::Off,
        );
        assert_relative_eq!(d[0], 2.0, epsilon = 1e-12);
        assert_relative_eq!(d[1], 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_parallel_to_asymptote() {
        // Ray along the cone's surface direction from inside: linear case
        let k = ConeAligned::new(Axis::X, Real3::zeros(), 1.0);
        let dir = Real3::new(1.0, 1.0, 0.0).normalize();
        let d = k.calc_intersections(&Real3::new(1.0, 0.0, 0.0), &dir, SurfaceState::Off);
        assert_eq!(d[0], NO_INTERSECTION);
    }

    #[test]
    fn test_normal() {
        let k = ConeAligned::new(Axis::Z, Real3::zeros(), 1.0);
        let n = k.calc_normal(&Real3::new(1.0, 0.0, 1.0));
        assert_relative_eq!(n, Real3::new(1.0, 0.0, -1.0).normalize(), epsilon = 1e-12);
    }
}
