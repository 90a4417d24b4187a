//! Planes: axis-aligned and arbitrarily oriented.

use orange_math::{is_soft_unit_vector, Axis, Real3, NO_INTERSECTION};
use serde::{Deserialize, Serialize};

use crate::{Intersections, SignedSense, Surface, SurfaceState, SurfaceType};

/// A plane perpendicular to a coordinate axis: `x_axis - position = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaneAligned {
    /// Normal axis.
    pub axis: Axis,
    /// Intercept along the axis.
    pub position: f64,
}

impl PlaneAligned {
    /// Create a plane at `position` along `axis`.
    pub fn new(axis: Axis, position: f64) -> Self {
        Self { axis, position }
    }
}

impl Surface for PlaneAligned {
    fn surface_type(&self) -> SurfaceType {
        match self.axis {
            Axis::X => SurfaceType::Px,
            Axis::Y => SurfaceType::Py,
            Axis::Z => SurfaceType::Pz,
        }
    }

    fn calc_sense(&self, pos: &Real3) -> SignedSense {
        SignedSense::from_real(pos[self.axis.index()] - self.position)
    }

    fn calc_intersections(
        &self,
        pos: &Real3,
        dir: &Real3,
        on_surface: SurfaceState,
    ) -> Intersections {
        let ax = self.axis.index();
        if on_surface == SurfaceState::Off && dir[ax] != 0.0 {
            let dist = (self.position - pos[ax]) / dir[ax];
            if dist > 0.0 {
                return [dist, NO_INTERSECTION];
            }
        }
        [NO_INTERSECTION; 2]
    }

    fn calc_normal(&self, _pos: &Real3) -> Real3 {
        self.axis.unit()
    }

    fn calc_safety(&self, pos: &Real3) -> Option<f64> {
        Some((pos[self.axis.index()] - self.position).abs())
    }
}

/// An arbitrarily oriented plane: `n . x - d = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    /// Unit normal.
    pub normal: Real3,
    /// Distance from the origin along the normal.
    pub displacement: f64,
}

impl Plane {
    /// Create from a unit normal and a point on the plane.
    pub fn new(normal: Real3, point: &Real3) -> Self {
        Self::from_displacement(normal, normal.dot(point))
    }

    /// Create from a unit normal and displacement.
    pub fn from_displacement(normal: Real3, displacement: f64) -> Self {
        debug_assert!(is_soft_unit_vector(&normal));
        Self {
            normal,
            displacement,
        }
    }

    /// Create from three points; the normal follows the right-hand rule
    /// `(p1 - p0) x (p2 - p0)`.
    pub fn from_points(p0: &Real3, p1: &Real3, p2: &Real3) -> Self {
        let normal = (p1 - p0).cross(&(p2 - p0)).normalize();
        Self::new(normal, p0)
    }
}

impl From<PlaneAligned> for Plane {
    fn from(other: PlaneAligned) -> Self {
        Self::from_displacement(other.axis.unit(), other.position)
    }
}

impl Surface for Plane {
    fn surface_type(&self) -> SurfaceType {
        SurfaceType::P
    }

    fn calc_sense(&self, pos: &Real3) -> SignedSense {
        SignedSense::from_real(self.normal.dot(pos) - self.displacement)
    }

    fn calc_intersections(
        &self,
        pos: &Real3,
        dir: &Real3,
        on_surface: SurfaceState,
    ) -> Intersections {
        let n_dir = self.normal.dot(dir);
        if on_surface == SurfaceState::Off && n_dir != 0.0 {
            let dist = (self.displacement - self.normal.dot(pos)) / n_dir;
            if dist > 0.0 {
                return [dist, NO_INTERSECTION];
            }
        }
        [NO_INTERSECTION; 2]
    }

    fn calc_normal(&self, _pos: &Real3) -> Real3 {
        self.normal
    }

    fn calc_safety(&self, pos: &Real3) -> Option<f64> {
        Some((self.normal.dot(pos) - self.displacement).abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_aligned_sense() {
        let p = PlaneAligned::new(Axis::X, 1.0);
        assert_eq!(p.surface_type(), SurfaceType::Px);
        assert_eq!(p.calc_sense(&Real3::new(0.5, 9.0, 9.0)), SignedSense::Inside);
        assert_eq!(p.calc_sense(&Real3::new(1.5, 0.0, 0.0)), SignedSense::Outside);
        assert_eq!(p.calc_sense(&Real3::new(1.0, 0.0, 0.0)), SignedSense::On);
    }

    #[test]
    fn test_aligned_intersect() {
        let p = PlaneAligned::new(Axis::Y, 2.0);
        let pos = Real3::new(0.0, 0.0, 0.0);
        let d = p.calc_intersections(&pos, &Real3::new(0.0, 0.5, 0.0), SurfaceState::Off);
        assert!((d[0] - 4.0).abs() < 1e-12);
        // Moving away
        let d = p.calc_intersections(&pos, &Real3::new(0.0, -1.0, 0.0), SurfaceState::Off);
        assert_eq!(d[0], NO_INTERSECTION);
        // Parallel
        let d = p.calc_intersections(&pos, &Real3::new(1.0, 0.0, 0.0), SurfaceState::Off);
        assert_eq!(d[0], NO_INTERSECTION);
        // On the surface: never hits itself
        let on = Real3::new(0.0, 2.0, 0.0);
        let d = p.calc_intersections(&on, &Real3::new(0.0, 1.0, 0.0), SurfaceState::On);
        assert_eq!(d[0], NO_INTERSECTION);
    }

    #[test]
    fn test_general_plane() {
        let n = Real3::new(1.0, 1.0, 0.0).normalize();
        let p = Plane::new(n, &Real3::new(1.0, 1.0, 0.0));
        assert_relative_eq!(p.displacement, 2.0_f64.sqrt(), epsilon = 1e-12);
        assert_eq!(p.calc_sense(&Real3::zeros()), SignedSense::Inside);

        let d = p.calc_intersections(&Real3::zeros(), &Real3::new(1.0, 0.0, 0.0), SurfaceState::Off);
        assert_relative_eq!(d[0], 2.0, epsilon = 1e-12);
        assert_relative_eq!(p.calc_normal(&Real3::zeros()), n);
        assert_relative_eq!(p.calc_safety(&Real3::zeros()).unwrap(), 2.0_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_from_points() {
        let p = Plane::from_points(
            &Real3::new(0.0, 0.0, 1.0),
            &Real3::new(1.0, 0.0, 1.0),
            &Real3::new(0.0, 1.0, 1.0),
        );
        assert_relative_eq!(p.normal, Real3::new(0.0, 0.0, 1.0), epsilon = 1e-12);
        assert_relative_eq!(p.displacement, 1.0, epsilon = 1e-12);

        let promoted = Plane::from(PlaneAligned::new(Axis::Z, 1.0));
        assert_eq!(promoted, p);
    }
}
