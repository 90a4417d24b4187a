//! Construction and runtime options.

use serde::{Deserialize, Serialize};

use crate::error::{OrangeError, Result};
use orange_math::Tolerance;

/// Options for building and navigating a geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrangeOptions {
    /// Maximum number of faces in a single volume.
    ///
    /// Volumes with more faces are replaced by empty "nowhere" volumes.
    pub max_faces: usize,
    /// Maximum number of intersections a ray can have with one volume.
    pub max_intersections: usize,
    /// Maximum number of volumes in a BIH leaf.
    pub bih_max_leaf_size: usize,
    /// Number of navigation failures to log before going quiet.
    pub max_failure_logs: usize,
    /// Override of the input tolerance.
    pub tolerance: Option<Tolerance>,
}

impl Default for OrangeOptions {
    fn default() -> Self {
        Self {
            max_faces: 1024,
            max_intersections: 4096,
            bih_max_leaf_size: 2,
            max_failure_logs: 16,
            tolerance: None,
        }
    }
}

impl OrangeOptions {
    /// Validate options.
    pub fn validate(&self) -> Result<()> {
        if self.max_faces == 0 {
            return Err(OrangeError::InvalidOptions(
                "max_faces must be positive".into(),
            ));
        }
        if self.max_intersections == 0 {
            return Err(OrangeError::InvalidOptions(
                "max_intersections must be positive".into(),
            ));
        }
        if self.bih_max_leaf_size == 0 {
            return Err(OrangeError::InvalidOptions(
                "bih_max_leaf_size must be positive".into(),
            ));
        }
        if let Some(tol) = &self.tolerance {
            if !tol.is_valid() {
                return Err(OrangeError::InvalidTolerance {
                    rel: tol.rel,
                    abs: tol.abs,
                });
            }
        }
        Ok(())
    }

    /// Parse and validate options from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        let options: Self = toml::from_str(text)?;
        options.validate()?;
        Ok(options)
    }
}
