//! Axis-aligned infinite cylinders.

use orange_math::{Axis, Real3, NO_INTERSECTION};
use serde::{Deserialize, Serialize};

use crate::{Intersections, QuadraticSolver, SignedSense, Surface, SurfaceState, SurfaceType};

/// Intersect a cylinder of squared radius `radius_sq` with a ray, given the
/// position already expressed relative to the cylinder axis.
fn intersect_cylinder(
    axis: Axis,
    rel: &Real3,
    dir: &Real3,
    radius_sq: f64,
    on_surface: SurfaceState,
) -> Intersections {
    let (u, v) = axis.perpendicular();
    let (u, v) = (u.index(), v.index());

    let a = dir[u] * dir[u] + dir[v] * dir[v];
    if a < QuadraticSolver::MIN_A {
        // Parallel to the axis
        return [NO_INTERSECTION; 2];
    }

    let half_b = rel[u] * dir[u] + rel[v] * dir[v];
    let solve = QuadraticSolver::new(a, half_b);
    match on_surface {
        SurfaceState::On => solve.solve_on_surface(),
        SurfaceState::Off => {
            let c = rel[u] * rel[u] + rel[v] * rel[v] - radius_sq;
            solve.solve(c)
        }
    }
}

fn radial(axis: Axis, rel: &Real3) -> Real3 {
    let mut r = *rel;
    r[axis.index()] = 0.0;
    r
}

/// A cylinder whose axis is a coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CylCentered {
    /// Axis of the cylinder.
    pub axis: Axis,
    /// Square of the radius.
    pub radius_sq: f64,
}

impl CylCentered {
    /// Create a cylinder about `axis` with the given radius.
    pub fn new(axis: Axis, radius: f64) -> Self {
        debug_assert!(radius > 0.0);
        Self {
            axis,
            radius_sq: radius * radius,
        }
    }
}

impl Surface for CylCentered {
    fn surface_type(&self) -> SurfaceType {
        match self.axis {
            Axis::X => SurfaceType::Cxc,
            Axis::Y => SurfaceType::Cyc,
            Axis::Z => SurfaceType::Czc,
        }
    }

    fn calc_sense(&self, pos: &Real3) -> SignedSense {
        SignedSense::from_real(radial(self.axis, pos).norm_squared() - self.radius_sq)
    }

    fn calc_intersections(
        &self,
        pos: &Real3,
        dir: &Real3,
        on_surface: SurfaceState,
    ) -> Intersections {
        intersect_cylinder(self.axis, pos, dir, self.radius_sq, on_surface)
    }

    fn calc_normal(&self, pos: &Real3) -> Real3 {
        radial(self.axis, pos).normalize()
    }

    fn calc_safety(&self, pos: &Real3) -> Option<f64> {
        Some((radial(self.axis, pos).norm() - self.radius_sq.sqrt()).abs())
    }
}

/// A cylinder parallel to a coordinate axis, offset from the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CylAligned {
    /// Axis the cylinder is parallel to.
    pub axis: Axis,
    /// A point on the cylinder's axis; the component along `axis` is zero.
    pub origin: Real3,
    /// Square of the radius.
    pub radius_sq: f64,
}

impl CylAligned {
    /// Create a cylinder parallel to `axis` through `origin`.
    pub fn new(axis: Axis, origin: Real3, radius: f64) -> Self {
        debug_assert!(radius > 0.0);
        Self {
            axis,
            origin: radial(axis, &origin),
            radius_sq: radius * radius,
        }
    }
}

impl Surface for CylAligned {
    fn surface_type(&self) -> SurfaceType {
        match self.axis {
            Axis::X => SurfaceType::Cx,
            Axis::Y => SurfaceType::Cy,
            Axis::Z => SurfaceType::Cz,
        }
    }

    fn calc_sense(&self, pos: &Real3) -> SignedSense {
        let rel = pos - self.origin;
        SignedSense::from_real(radial(self.axis, &rel).norm_squared() - self.radius_sq)
    }

    fn calc_intersections(
        &self,
        pos: &Real3,
        dir: &Real3,
        on_surface: SurfaceState,
    ) -> Intersections {
        let rel = pos - self.origin;
        intersect_cylinder(self.axis, &rel, dir, self.radius_sq, on_surface)
    }

    fn calc_normal(&self, pos: &Real3) -> Real3 {
        radial(self.axis, &(pos - self.origin)).normalize()
    }

    fn calc_safety(&self, pos: &Real3) -> Option<f64> {
        let rel = pos - self.origin;
        Some((radial(self.axis, &rel).norm() - self.radius_sq.sqrt()).abs())
    }
}
