//! Rigid transforms between a daughter universe and its parent.
//!
//! All transforms map daughter coordinates "up" into the parent frame:
//! `parent = R * daughter + t`. Navigation mostly goes the other way
//! (`transform_down`), which uses the transpose of the rotation.

use serde::{Deserialize, Serialize};

use crate::{Axis, Mat3, Real3};

/// A rotation plus translation, or one of its cheaper special cases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VariantTransform {
    /// Identity.
    NoTransformation,
    /// Translation only.
    Translation {
        /// Offset of the daughter origin in the parent frame.
        translation: Real3,
    },
    /// Rotation followed by translation.
    Transformation {
        /// Rotation from daughter to parent axes.
        rotation: Mat3,
        /// Offset of the daughter origin in the parent frame.
        translation: Real3,
    },
}

impl VariantTransform {
    /// Identity transform.
    pub fn identity() -> Self {
        Self::NoTransformation
    }

    /// Translation by `(dx, dy, dz)`.
    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        Self::Translation {
            translation: Real3::new(dx, dy, dz),
        }
    }

    /// Rotation about a coordinate axis by `angle` radians, then translation.
    pub fn rotation(axis: Axis, angle: f64, translation: Real3) -> Self {
        let (s, c) = angle.sin_cos();
        let rotation = match axis {
            Axis::X => Mat3::new(1.0, 0.0, 0.0, 0.0, c, -s, 0.0, s, c),
            Axis::Y => Mat3::new(c, 0.0, s, 0.0, 1.0, 0.0, -s, 0.0, c),
            Axis::Z => Mat3::new(c, -s, 0.0, s, c, 0.0, 0.0, 0.0, 1.0),
        };
        Self::Transformation {
            rotation,
            translation,
        }
    }

    /// Short name of the transform kind.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::NoTransformation => "no_transformation",
            Self::Translation { .. } => "translation",
            Self::Transformation { .. } => "transformation",
        }
    }

    /// Map a daughter-frame position into the parent frame.
    pub fn transform_up(&self, pos: &Real3) -> Real3 {
        match self {
            Self::NoTransformation => *pos,
            Self::Translation { translation } => pos + translation,
            Self::Transformation {
                rotation,
                translation,
            } => rotation * pos + translation,
        }
    }

    /// Map a parent-frame position into the daughter frame.
    pub fn transform_down(&self, pos: &Real3) -> Real3 {
        match self {
            Self::NoTransformation => *pos,
            Self::Translation { translation } => pos - translation,
            Self::Transformation {
                rotation,
                translation,
            } => rotation.tr_mul(&(pos - translation)),
        }
    }

    /// Rotate a daughter-frame direction into the parent frame.
    pub fn rotate_up(&self, dir: &Real3) -> Real3 {
        match self {
            Self::Transformation { rotation, .. } => rotation * dir,
            _ => *dir,
        }
    }

    /// Rotate a parent-frame direction into the daughter frame.
    pub fn rotate_down(&self, dir: &Real3) -> Real3 {
        match self {
            Self::Transformation { rotation, .. } => rotation.tr_mul(dir),
            _ => *dir,
        }
    }

    /// The transform that maps parent coordinates into daughter coordinates.
    pub fn inverse(&self) -> Self {
        match self {
            Self::NoTransformation => Self::NoTransformation,
            Self::Translation { translation } => Self::Translation {
                translation: -translation,
            },
            Self::Transformation {
                rotation,
                translation,
            } => {
                let rinv = rotation.transpose();
                let tinv = -(rinv * translation);
                Self::Transformation {
                    rotation: rinv,
                    translation: tinv,
                }
            }
        }
    }

    /// Whether the rotation (if any) is orthonormal.
    pub fn is_orthonormal(&self) -> bool {
        match self {
            Self::Transformation { rotation, .. } => {
                let err = rotation.tr_mul(rotation) - Mat3::identity();
                err.abs().max() < 1e-8
            }
            _ => true,
        }
    }
}

impl Default for VariantTransform {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_identity() {
        let t = VariantTransform::identity();
        let p = Real3::new(1.0, 2.0, 3.0);
        assert_eq!(t.transform_up(&p), p);
        assert_eq!(t.transform_down(&p), p);
        assert_eq!(t.rotate_down(&p), p);
        assert_eq!(t.type_name(), "no_transformation");
    }

    #[test]
    fn test_translation() {
        let t = VariantTransform::translation(10.0, 20.0, 30.0);
        let p = Real3::new(1.0, 2.0, 3.0);
        assert_eq!(t.transform_up(&p), Real3::new(11.0, 22.0, 33.0));
        assert_eq!(t.transform_down(&Real3::new(11.0, 22.0, 33.0)), p);
        assert_eq!(t.rotate_up(&p), p);
    }

    #[test]
    fn test_rotation_z_90() {
        let t = VariantTransform::rotation(Axis::Z, PI / 2.0, Real3::new(0.0, 0.0, 1.0));
        assert!(t.is_orthonormal());

        let up = t.transform_up(&Real3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(up, Real3::new(0.0, 1.0, 1.0), epsilon = 1e-12);

        let down = t.transform_down(&up);
        assert_relative_eq!(down, Real3::new(1.0, 0.0, 0.0), epsilon = 1e-12);

        let d = t.rotate_down(&Real3::new(0.0, 1.0, 0.0));
        assert_relative_eq!(d, Real3::new(1.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_inverse() {
        let t = VariantTransform::rotation(Axis::X, 0.3, Real3::new(1.0, -2.0, 0.5));
        let inv = t.inverse();
        let p = Real3::new(5.0, 6.0, 7.0);
        assert_relative_eq!(inv.transform_up(&p), t.transform_down(&p), epsilon = 1e-12);
        assert_relative_eq!(inv.inverse().transform_up(&p), t.transform_up(&p), epsilon = 1e-12);

        let tr = VariantTransform::translation(1.0, 2.0, 3.0).inverse();
        assert_eq!(tr.transform_up(&Real3::zeros()), Real3::new(-1.0, -2.0, -3.0));
    }

    #[test]
    fn test_not_orthonormal() {
        let t = VariantTransform::Transformation {
            rotation: Mat3::identity() * 2.0,
            translation: Real3::zeros(),
        };
        assert!(!t.is_orthonormal());
    }
}
