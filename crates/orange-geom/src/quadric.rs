//! Second-order surfaces with explicit coefficients.

use orange_math::Real3;
use serde::{Deserialize, Serialize};

use crate::{Intersections, QuadraticSolver, SignedSense, Surface, SurfaceState, SurfaceType};

/// Quadric without cross terms:
/// `a x^2 + b y^2 + c z^2 + d x + e y + f z + g = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimpleQuadric {
    /// Second-order coefficients `(a, b, c)`.
    pub second: Real3,
    /// First-order coefficients `(d, e, f)`.
    pub first: Real3,
    /// Constant term `g`.
    pub zeroth: f64,
}

impl SimpleQuadric {
    /// Create from coefficients.
    pub fn new(second: Real3, first: Real3, zeroth: f64) -> Self {
        Self {
            second,
            first,
            zeroth,
        }
    }

    fn eval(&self, pos: &Real3) -> f64 {
        (self.second.component_mul(pos) + self.first).dot(pos) + self.zeroth
    }
}

impl Surface for SimpleQuadric {
    fn surface_type(&self) -> SurfaceType {
        SurfaceType::Sq
    }

    fn calc_sense(&self, pos: &Real3) -> SignedSense {
        SignedSense::from_real(self.eval(pos))
    }

    fn calc_intersections(
        &self,
        pos: &Real3,
        dir: &Real3,
        on_surface: SurfaceState,
    ) -> Intersections {
        let a = self.second.component_mul(dir).dot(dir);
        let b = (2.0 * self.second.component_mul(pos) + self.first).dot(dir);
        QuadraticSolver::solve_general(a, b / 2.0, self.eval(pos), on_surface)
    }

    fn calc_normal(&self, pos: &Real3) -> Real3 {
        (2.0 * self.second.component_mul(pos) + self.first).normalize()
    }
}

/// General quadric:
/// `a x^2 + b y^2 + c z^2 + d xy + e yz + f zx + g x + h y + i z + j = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeneralQuadric {
    /// Second-order coefficients `(a, b, c)`.
    pub second: Real3,
    /// Cross coefficients `(d, e, f)` for `xy`, `yz`, `zx`.
    pub cross: Real3,
    /// First-order coefficients `(g, h, i)`.
    pub first: Real3,
    /// Constant term `j`.
    pub zeroth: f64,
}

impl GeneralQuadric {
    /// Create from coefficients.
    pub fn new(second: Real3, cross: Real3, first: Real3, zeroth: f64) -> Self {
        Self {
            second,
            cross,
            first,
            zeroth,
        }
    }

    fn eval(&self, p: &Real3) -> f64 {
        let (x, y, z) = (p.x, p.y, p.z);
        let [a, b, c] = [self.second.x, self.second.y, self.second.z];
        let [d, e, f] = [self.cross.x, self.cross.y, self.cross.z];
        let [g, h, i] = [self.first.x, self.first.y, self.first.z];
        (a * x + d * y + f * z + g) * x + (b * y + e * z + h) * y + (c * z + i) * z + self.zeroth
    }

    fn gradient(&self, p: &Real3) -> Real3 {
        let (x, y, z) = (p.x, p.y, p.z);
        let [a, b, c] = [self.second.x, self.second.y, self.second.z];
        let [d, e, f] = [self.cross.x, self.cross.y, self.cross.z];
        let [g, h, i] = [self.first.x, self.first.y, self.first.z];
        Real3::new(
            2.0 * a * x + d * y + f * z + g,
            2.0 * b * y + d * x + e * z + h,
            2.0 * c * z + e * y + f * x + i,
        )
    }
}

impl From<SimpleQuadric> for GeneralQuadric {
    fn from(other: SimpleQuadric) -> Self {
        Self::new(other.second, Real3::zeros(), other.first, other.zeroth)
    }
}

impl Surface for GeneralQuadric {
    fn surface_type(&self) -> SurfaceType {
        SurfaceType::Gq
    }

    fn calc_sense(&self, pos: &Real3) -> SignedSense {
        SignedSense::from_real(self.eval(pos))
    }

    fn calc_intersections(
        &self,
        pos: &Real3,
        dir: &Real3,
        on_surface: SurfaceState,
    ) -> Intersections {
        let (u, v, w) = (dir.x, dir.y, dir.z);
        let [a, b, c] = [self.second.x, self.second.y, self.second.z];
        let [d, e, f] = [self.cross.x, self.cross.y, self.cross.z];

        let qa = (a * u + d * v) * u + (b * v + e * w) * v + (c * w + f * u) * w;
        let qb = self.gradient(pos).dot(dir);
        QuadraticSolver::solve_general(qa, qb / 2.0, self.eval(pos), on_surface)
    }

    fn calc_normal(&self, pos: &Real3) -> Real3 {
        self.gradient(pos).normalize()
    }
}
