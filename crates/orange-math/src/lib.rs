#![warn(missing_docs)]

//! Math types for the ORANGE navigation core.
//!
//! Thin wrappers around nalgebra providing the domain types used by
//! surfaces, trackers and the track view: three-vectors, axes, numeric
//! tolerances, bounding boxes and rigid transforms.

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

pub mod bbox;
pub mod transform;

pub use bbox::BoundingBox;
pub use transform::VariantTransform;

/// A position or direction in 3D space.
pub type Real3 = Vector3<f64>;

/// A 3x3 rotation matrix.
pub type Mat3 = Matrix3<f64>;

/// Sentinel distance for "no intersection".
pub const NO_INTERSECTION: f64 = f64::INFINITY;

/// Cartesian axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// X axis.
    X,
    /// Y axis.
    Y,
    /// Z axis.
    Z,
}

impl Axis {
    /// All axes in order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Index of this axis into a three-vector.
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// The two axes perpendicular to this one, in cyclic order.
    pub fn perpendicular(self) -> (Axis, Axis) {
        match self {
            Axis::X => (Axis::Y, Axis::Z),
            Axis::Y => (Axis::Z, Axis::X),
            Axis::Z => (Axis::X, Axis::Y),
        }
    }

    /// Unit vector along this axis.
    pub fn unit(self) -> Real3 {
        let mut v = Real3::zeros();
        v[self.index()] = 1.0;
        v
    }

    /// Lowercase character for labels (`x`, `y`, `z`).
    pub fn to_char(self) -> char {
        match self {
            Axis::X => 'x',
            Axis::Y => 'y',
            Axis::Z => 'z',
        }
    }
}

/// Relative and absolute tolerances for construction and transport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    /// Relative error for differences.
    pub rel: f64,
    /// Absolute error in native length units.
    pub abs: f64,
}

impl Tolerance {
    /// Intercept tolerance for nearly-parallel quadric cases.
    pub const SQRT_QUADRATIC: f64 = 1e-5;

    /// Square root of machine precision, rounded up.
    const SQRT_EPSILON: f64 = 1.5e-8;

    /// Tolerance from the default relative value and a length scale.
    pub fn from_default(length: f64) -> Self {
        Self {
            rel: Self::SQRT_EPSILON,
            abs: Self::SQRT_EPSILON * length,
        }
    }

    /// Tolerance from a relative value and a length scale.
    ///
    /// Returns `None` unless `rel` is in `(0, 1)` and `length` is positive.
    pub fn from_relative(rel: f64, length: f64) -> Option<Self> {
        if !(rel > 0.0 && rel < 1.0) || !(length > 0.0) {
            return None;
        }
        Some(Self {
            rel,
            abs: rel * length,
        })
    }

    /// Whether the tolerances are usable.
    pub fn is_valid(&self) -> bool {
        self.rel > 0.0 && self.rel < 1.0 && self.abs > 0.0
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::from_default(1.0)
    }
}

/// Add `a * x` to `y` in place.
pub fn axpy(a: f64, x: &Real3, y: &mut Real3) {
    *y += a * x;
}

/// Whether a vector has unit length to within a loose tolerance.
pub fn is_soft_unit_vector(v: &Real3) -> bool {
    (v.norm_squared() - 1.0).abs() < 1e-6
}
