#![warn(missing_docs)]

//! Analytic surfaces for the ORANGE navigation core.
//!
//! Every surface is the zero set of a first- or second-order polynomial
//! `f(x) = 0`. A point's *sense* is the sign of `f`: negative is inside,
//! positive is outside. Each surface can compute its sense at a point,
//! the positive distances at which a ray crosses it, its outward normal,
//! and (for the simple shapes) an exact distance to the surface.
//!
//! # Architecture
//!
//! - [`Surface`] - common calculations, implemented by each shape
//! - [`VariantSurface`] - closed set of shapes for match-based dispatch
//! - [`quadratic`] - positive roots of the ray-quadric equation

use orange_math::Real3;
use serde::{Deserialize, Serialize};

mod cone;
mod cylinder;
mod plane;
pub mod quadratic;
mod quadric;
mod sphere;

pub use cone::ConeAligned;
pub use cylinder::{CylAligned, CylCentered};
pub use plane::{Plane, PlaneAligned};
pub use quadratic::QuadraticSolver;
pub use quadric::{GeneralQuadric, SimpleQuadric};
pub use sphere::{Sphere, SphereCentered};

/// Up to two positive distances along a ray; unused slots are infinite.
pub type Intersections = [f64; 2];

// =============================================================================
// Senses
// =============================================================================

/// Which side of a surface a point is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sense {
    /// Quadric expression is negative.
    Inside,
    /// Quadric expression is positive.
    Outside,
}

impl Sense {
    /// The opposite sense.
    #[must_use]
    pub fn flip(self) -> Self {
        match self {
            Sense::Inside => Sense::Outside,
            Sense::Outside => Sense::Inside,
        }
    }

    /// Sense from an "is outside" flag.
    pub fn from_outside(outside: bool) -> Self {
        if outside {
            Sense::Outside
        } else {
            Sense::Inside
        }
    }

    /// Single-character representation (`-` or `+`).
    pub fn to_char(self) -> char {
        match self {
            Sense::Inside => '-',
            Sense::Outside => '+',
        }
    }
}

/// Sense including the degenerate "exactly on the surface" case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignedSense {
    /// Quadric expression is negative.
    Inside,
    /// Quadric expression is exactly zero.
    On,
    /// Quadric expression is positive.
    Outside,
}

impl SignedSense {
    /// Sense from the value of a quadric expression.
    pub fn from_real(value: f64) -> Self {
        if value < 0.0 {
            SignedSense::Inside
        } else if value > 0.0 {
            SignedSense::Outside
        } else {
            SignedSense::On
        }
    }

    /// Collapse to a two-valued sense; points on the surface are outside.
    pub fn to_sense(self) -> Sense {
        match self {
            SignedSense::Inside => Sense::Inside,
            SignedSense::On | SignedSense::Outside => Sense::Outside,
        }
    }
}

/// Whether a calculation starts exactly on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SurfaceState {
    /// Off the surface.
    #[default]
    Off,
    /// On the surface.
    On,
}

// =============================================================================
// Surface types
// =============================================================================

/// Surface type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SurfaceType {
    /// Plane aligned with X axis.
    Px,
    /// Plane aligned with Y axis.
    Py,
    /// Plane aligned with Z axis.
    Pz,
    /// Cylinder centered on X axis.
    Cxc,
    /// Cylinder centered on Y axis.
    Cyc,
    /// Cylinder centered on Z axis.
    Czc,
    /// Sphere centered at the origin.
    Sc,
    /// Cylinder parallel to X axis.
    Cx,
    /// Cylinder parallel to Y axis.
    Cy,
    /// Cylinder parallel to Z axis.
    Cz,
    /// General plane.
    P,
    /// Sphere.
    S,
    /// Cone parallel to X axis.
    Kx,
    /// Cone parallel to Y axis.
    Ky,
    /// Cone parallel to Z axis.
    Kz,
    /// Simple quadric (no cross terms).
    Sq,
    /// General quadric.
    Gq,
}

impl SurfaceType {
    /// Short lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            SurfaceType::Px => "px",
            SurfaceType::Py => "py",
            SurfaceType::Pz => "pz",
            SurfaceType::Cxc => "cxc",
            SurfaceType::Cyc => "cyc",
            SurfaceType::Czc => "czc",
            SurfaceType::Sc => "sc",
            SurfaceType::Cx => "cx",
            SurfaceType::Cy => "cy",
            SurfaceType::Cz => "cz",
            SurfaceType::P => "p",
            SurfaceType::S => "s",
            SurfaceType::Kx => "kx",
            SurfaceType::Ky => "ky",
            SurfaceType::Kz => "kz",
            SurfaceType::Sq => "sq",
            SurfaceType::Gq => "gq",
        }
    }

    /// Maximum number of times a straight line can cross this surface.
    pub fn num_intersections(self) -> usize {
        match self {
            SurfaceType::Px | SurfaceType::Py | SurfaceType::Pz | SurfaceType::P => 1,
            _ => 2,
        }
    }

    /// Whether the distance to the surface is exact and cheap.
    pub fn simple_safety(self) -> bool {
        !matches!(
            self,
            SurfaceType::Kx | SurfaceType::Ky | SurfaceType::Kz | SurfaceType::Sq | SurfaceType::Gq
        )
    }
}

impl std::fmt::Display for SurfaceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Calculations shared by all surfaces.
pub trait Surface {
    /// The type code of this surface.
    fn surface_type(&self) -> SurfaceType;

    /// Which side of the surface a point is on.
    fn calc_sense(&self, pos: &Real3) -> SignedSense;

    /// Positive distances at which a ray crosses the surface.
    ///
    /// When `on_surface` is [`SurfaceState::On`] the ray starts on the
    /// surface and the zero-distance root is suppressed.
    fn calc_intersections(&self, pos: &Real3, dir: &Real3, on_surface: SurfaceState)
        -> Intersections;

    /// Unit normal pointing toward the outside sense.
    fn calc_normal(&self, pos: &Real3) -> Real3;

    /// Exact distance from a point to the surface, if cheaply available.
    fn calc_safety(&self, _pos: &Real3) -> Option<f64> {
        None
    }
}

// =============================================================================
// Variant
// =============================================================================

/// Any of the supported surfaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VariantSurface {
    /// Axis-aligned plane.
    PlaneAligned(PlaneAligned),
    /// Cylinder centered on an axis.
    CylCentered(CylCentered),
    /// Sphere centered at the origin.
    SphereCentered(SphereCentered),
    /// Cylinder parallel to an axis.
    CylAligned(CylAligned),
    /// General plane.
    Plane(Plane),
    /// Sphere.
    Sphere(Sphere),
    /// Cone parallel to an axis.
    ConeAligned(ConeAligned),
    /// Quadric without cross terms.
    SimpleQuadric(SimpleQuadric),
    /// General quadric.
    GeneralQuadric(GeneralQuadric),
}

impl VariantSurface {
    fn as_surface(&self) -> &dyn Surface {
        match self {
            VariantSurface::PlaneAligned(s) => s,
            VariantSurface::CylCentered(s) => s,
            VariantSurface::SphereCentered(s) => s,
            VariantSurface::CylAligned(s) => s,
            VariantSurface::Plane(s) => s,
            VariantSurface::Sphere(s) => s,
            VariantSurface::ConeAligned(s) => s,
            VariantSurface::SimpleQuadric(s) => s,
            VariantSurface::GeneralQuadric(s) => s,
        }
    }

    /// Coefficients that, with the surface type, uniquely define the surface.
    ///
    /// The axis of aligned shapes is encoded by the surface type, so it does
    /// not appear here.
    pub fn data(&self) -> Vec<f64> {
        fn xyz(v: &Real3) -> [f64; 3] {
            [v.x, v.y, v.z]
        }
        match self {
            VariantSurface::PlaneAligned(s) => vec![s.position],
            VariantSurface::CylCentered(s) => vec![s.radius_sq],
            VariantSurface::SphereCentered(s) => vec![s.radius_sq],
            VariantSurface::CylAligned(s) => {
                let mut d = xyz(&s.origin).to_vec();
                d.push(s.radius_sq);
                d
            }
            VariantSurface::Plane(s) => {
                let mut d = xyz(&s.normal).to_vec();
                d.push(s.displacement);
                d
            }
            VariantSurface::Sphere(s) => {
                let mut d = xyz(&s.origin).to_vec();
                d.push(s.radius_sq);
                d
            }
            VariantSurface::ConeAligned(s) => {
                let mut d = xyz(&s.origin).to_vec();
                d.push(s.tsq);
                d
            }
            VariantSurface::SimpleQuadric(s) => {
                let mut d = [xyz(&s.second), xyz(&s.first)].concat();
                d.push(s.zeroth);
                d
            }
            VariantSurface::GeneralQuadric(s) => {
                let mut d = [xyz(&s.second), xyz(&s.cross), xyz(&s.first)].concat();
                d.push(s.zeroth);
                d
            }
        }
    }
}

impl Surface for VariantSurface {
    fn surface_type(&self) -> SurfaceType {
        self.as_surface().surface_type()
    }

    fn calc_sense(&self, pos: &Real3) -> SignedSense {
        self.as_surface().calc_sense(pos)
    }

    fn calc_intersections(
        &self,
        pos: &Real3,
        dir: &Real3,
        on_surface: SurfaceState,
    ) -> Intersections {
        self.as_surface().calc_intersections(pos, dir, on_surface)
    }

    fn calc_normal(&self, pos: &Real3) -> Real3 {
        self.as_surface().calc_normal(pos)
    }

    fn calc_safety(&self, pos: &Real3) -> Option<f64> {
        self.as_surface().calc_safety(pos)
    }
}

macro_rules! impl_from_surface {
    ($($ty:ident),*) => {
        $(
            impl From<$ty> for VariantSurface {
                fn from(s: $ty) -> Self {
                    VariantSurface::$ty(s)
                }
            }
        )*
    };
}

impl_from_surface!(
    PlaneAligned,
    CylCentered,
    SphereCentered,
    CylAligned,
    Plane,
    Sphere,
    ConeAligned,
    SimpleQuadric,
    GeneralQuadric
);
