//! Spheres, centered at the origin or anywhere.

use orange_math::Real3;
use serde::{Deserialize, Serialize};

use crate::{Intersections, QuadraticSolver, SignedSense, Surface, SurfaceState, SurfaceType};

/// Intersect a sphere with a ray, given the position relative to its center.
fn intersect_sphere(rel: &Real3, dir: &Real3, radius_sq: f64, on_surface: SurfaceState) -> Intersections {
    let solve = QuadraticSolver::new(1.0, rel.dot(dir));
    match on_surface {
        SurfaceState::On => solve.solve_on_surface(),
        SurfaceState::Off => solve.solve(rel.norm_squared() - radius_sq),
    }
}

/// A sphere centered at the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SphereCentered {
    /// Square of the radius.
    pub radius_sq: f64,
}

impl SphereCentered {
    /// Create a sphere with the given radius.
    pub fn new(radius: f64) -> Self {
        debug_assert!(radius > 0.0);
        Self {
            radius_sq: radius * radius,
        }
    }
}

impl Surface for SphereCentered {
    fn surface_type(&self) -> SurfaceType {
        SurfaceType::Sc
    }

    fn calc_sense(&self, pos: &Real3) -> SignedSense {
        SignedSense::from_real(pos.norm_squared() - self.radius_sq)
    }

    fn calc_intersections(
        &self,
        pos: &Real3,
        dir: &Real3,
        on_surface: SurfaceState,
    ) -> Intersections {
        intersect_sphere(pos, dir, self.radius_sq, on_surface)
    }

    fn calc_normal(&self, pos: &Real3) -> Real3 {
        pos.normalize()
    }

    fn calc_safety(&self, pos: &Real3) -> Option<f64> {
        Some((pos.norm() - self.radius_sq.sqrt()).abs())
    }
}

/// A sphere with an arbitrary center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    /// Center of the sphere.
    pub origin: Real3,
    /// Square of the radius.
    pub radius_sq: f64,
}

impl Sphere {
    /// Create a sphere at `origin` with the given radius.
    pub fn new(origin: Real3, radius: f64) -> Self {
        debug_assert!(radius > 0.0);
        Self {
            origin,
            radius_sq: radius * radius,
        }
    }
}

impl Surface for Sphere {
    fn surface_type(&self) -> SurfaceType {
        SurfaceType::S
    }

    fn calc_sense(&self, pos: &Real3) -> SignedSense {
        SignedSense::from_real((pos - self.origin).norm_squared() - self.radius_sq)
    }

    fn calc_intersections(
        &self,
        pos: &Real3,
        dir: &Real3,
        on_surface: SurfaceState,
    ) -> Intersections {
        intersect_sphere(&(pos - self.origin), dir, self.radius_sq, on_surface)
    }

    fn calc_normal(&self, pos: &Real3) -> Real3 {
        (pos - self.origin).normalize()
    }

    fn calc_safety(&self, pos: &Real3) -> Option<f64> {
        Some(((pos - self.origin).norm() - self.radius_sq.sqrt()).abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use orange_math::NO_INTERSECTION;

    #[test]
    fn test_centered_from_inside() {
        let s = SphereCentered::new(1.5);
        let d = s.calc_intersections(
            &Real3::new(0.5, 0.0, 0.0),
            &Real3::new(0.0, 0.0, 1.0),
            SurfaceState::Off,
        );
        assert_eq!(d[0], NO_INTERSECTION);
        assert_relative_eq!(d[1], 2.0_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_centered_from_outside() {
        let s = SphereCentered::new(1.0);
        let d = s.calc_intersections(
            &Real3::new(-3.0, 0.0, 0.0),
            &Real3::new(1.0, 0.0, 0.0),
            SurfaceState::Off,
        );
        assert_relative_eq!(d[0], 2.0, epsilon = 1e-12);
        assert_relative_eq!(d[1], 4.0, epsilon = 1e-12);

        // Miss
        let d = s.calc_intersections(
            &Real3::new(-3.0, 2.0, 0.0),
            &Real3::new(1.0, 0.0, 0.0),
            SurfaceState::Off,
        );
        assert_eq!(d, [NO_INTERSECTION; 2]);
    }

    #[test]
    fn test_centered_on_surface() {
        let s = SphereCentered::new(1.5);
        let pos = Real3::new(1.5, 0.0, 0.0);
        let inward = s.calc_intersections(&pos, &Real3::new(-1.0, 0.0, 0.0), SurfaceState::On);
        assert_relative_eq!(inward[0], 3.0, epsilon = 1e-12);
        let outward = s.calc_intersections(&pos, &Real3::new(1.0, 0.0, 0.0), SurfaceState::On);
        assert_eq!(outward[0], NO_INTERSECTION);
    }

    #[test]
    fn test_centered_normal_safety() {
        let s = SphereCentered::new(1.5);
        assert_relative_eq!(s.calc_normal(&Real3::new(0.0, -1.5, 0.0)), Real3::new(0.0, -1.0, 0.0));
        assert_relative_eq!(s.calc_safety(&Real3::new(0.5, 0.0, 0.0)).unwrap(), 1.0);
        assert_relative_eq!(s.calc_safety(&Real3::new(2.0, 2.0, 0.0)).unwrap(), 8.0_f64.sqrt() - 1.5);
    }

    #[test]
    fn test_offset_sphere() {
        let s = Sphere::new(Real3::new(1.0, 2.0, 3.0), 0.5);
        assert_eq!(s.surface_type(), SurfaceType::S);
        assert_eq!(s.calc_sense(&Real3::new(1.0, 2.0, 3.2)), SignedSense::Inside);
        let d = s.calc_intersections(
            &Real3::new(1.0, 2.0, 0.0),
            &Real3::new(0.0, 0.0, 1.0),
            SurfaceState::Off,
        );
        assert_relative_eq!(d[0], 2.5, epsilon = 1e-12);
        assert_relative_eq!(d[1], 3.5, epsilon = 1e-12);
        assert_relative_eq!(s.calc_normal(&Real3::new(1.5, 2.0, 3.0)), Real3::new(1.0, 0.0, 0.0));
    }
}
