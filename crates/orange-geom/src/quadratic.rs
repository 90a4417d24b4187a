//! Positive roots of `a x^2 + 2 b x + c = 0` along a ray.
//!
//! Quadric surfaces reduce ray intersection to this equation, with `x` the
//! distance along a unit direction and `b` the "half" linear coefficient.
//! Only strictly positive roots are reported; the rest are replaced with
//! [`NO_INTERSECTION`].

use orange_math::{Tolerance, NO_INTERSECTION};

use crate::{Intersections, SurfaceState};

/// Solver for a quadratic with a fixed leading and half-linear coefficient.
#[derive(Debug, Clone, Copy)]
pub struct QuadraticSolver {
    a_inv: f64,
    hba: f64,
}

impl QuadraticSolver {
    /// Smallest leading coefficient treated as a true quadratic.
    pub const MIN_A: f64 = Tolerance::SQRT_QUADRATIC * Tolerance::SQRT_QUADRATIC;

    /// Create a solver for `a x^2 + 2 half_b x + c`.
    ///
    /// `a` must be nonzero.
    pub fn new(a: f64, half_b: f64) -> Self {
        debug_assert!(a != 0.0);
        let a_inv = 1.0 / a;
        Self {
            a_inv,
            hba: half_b * a_inv,
        }
    }

    /// Solve for a point off the surface with constant term `c`.
    pub fn solve(&self, c: f64) -> Intersections {
        let b2_4 = self.hba * self.hba;
        let c = c * self.a_inv;

        if b2_4 > c {
            let t2 = (b2_4 - c).sqrt();
            [positive(-self.hba - t2), positive(-self.hba + t2)]
        } else if b2_4 == c {
            // Tangent
            [positive(-self.hba), NO_INTERSECTION]
        } else {
            [NO_INTERSECTION; 2]
        }
    }

    /// Solve for a point on the surface (`c == 0`).
    ///
    /// One root is the current position; only the other one is returned.
    pub fn solve_on_surface(&self) -> Intersections {
        [positive(-2.0 * self.hba), NO_INTERSECTION]
    }

    /// Solve the general case, degrading to a linear equation when the
    /// ray is nearly parallel to the quadric's asymptote.
    pub fn solve_general(a: f64, half_b: f64, c: f64, on_surface: SurfaceState) -> Intersections {
        if a.abs() >= Self::MIN_A {
            let solve = Self::new(a, half_b);
            return match on_surface {
                SurfaceState::On => solve.solve_on_surface(),
                SurfaceState::Off => solve.solve(c),
            };
        }
        if on_surface == SurfaceState::Off && half_b != 0.0 {
            return [positive(-c / (2.0 * half_b)), NO_INTERSECTION];
        }
        [NO_INTERSECTION; 2]
    }
}

fn positive(x: f64) -> f64 {
    if x > 0.0 {
        x
    } else {
        NO_INTERSECTION
    }
}
