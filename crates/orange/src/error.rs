//! Error types for geometry construction.
//!
//! Navigation never returns errors: a track that cannot be located is
//! flagged as failed instead.

use thiserror::Error;

/// Errors that can occur while building navigation tables.
#[derive(Error, Debug)]
pub enum OrangeError {
    /// The input has no universes or is otherwise unusable.
    #[error("invalid geometry input: {0}")]
    InvalidInput(String),

    /// Tolerances outside `(0, 1)` relative or nonpositive absolute.
    #[error("invalid tolerance: rel={rel}, abs={abs}")]
    InvalidTolerance {
        /// Relative tolerance.
        rel: f64,
        /// Absolute tolerance.
        abs: f64,
    },

    /// A volume's logic does not reduce to a single value.
    #[error("invalid logic definition in volume '{label}': operators do not balance")]
    UnbalancedLogic {
        /// Offending volume.
        label: String,
    },

    /// A volume's logic needs a deeper stack than the trackers support.
    #[error("logic depth {depth} of volume '{label}' exceeds maximum {max}")]
    LogicTooDeep {
        /// Offending volume.
        label: String,
        /// Required depth.
        depth: usize,
        /// Supported depth.
        max: usize,
    },

    /// A volume definition is malformed.
    #[error("invalid volume '{label}' in '{unit}': {reason}")]
    InvalidVolume {
        /// Owning unit.
        unit: String,
        /// Offending volume.
        label: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Bounding boxes that are null or infinite on only one side.
    #[error("invalid (null or half-infinite) bounding boxes in '{unit}': {details}")]
    InvalidBoundingBoxes {
        /// Owning unit.
        unit: String,
        /// Comma-separated `index='label': box` entries.
        details: String,
    },

    /// Exterior or background volume in the wrong place.
    #[error("bad z-order in '{unit}': {reason}")]
    BadZOrder {
        /// Owning unit.
        unit: String,
        /// What is wrong.
        reason: String,
    },

    /// A rectangular array definition is malformed.
    #[error("invalid rect array '{label}': {reason}")]
    InvalidRectArray {
        /// Offending array.
        label: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The number of daughters does not match the number of cells.
    #[error("number of input daughters ({actual}) in '{label}' does not match number of volumes ({expected})")]
    DaughterCountMismatch {
        /// Offending array.
        label: String,
        /// Number of cells.
        expected: usize,
        /// Number of daughters given.
        actual: usize,
    },

    /// A daughter refers to a universe that does not exist or to an ancestor.
    #[error("invalid daughter universe {universe} in '{label}': {reason}")]
    InvalidDaughter {
        /// Parent universe.
        label: String,
        /// Referenced universe index.
        universe: u32,
        /// What is wrong with it.
        reason: String,
    },

    /// The first universe must be a CSG unit.
    #[error("root universe must be a unit")]
    RootNotUnit,

    /// Configuration values are out of range.
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    /// Failed to parse options.
    #[error("failed to parse options: {0}")]
    OptionsParse(#[from] toml::de::Error),

    /// Construction input could not be read or converted.
    #[error(transparent)]
    Ir(#[from] orange_ir::IrError),

    /// JSON parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for construction operations.
pub type Result<T> = std::result::Result<T, OrangeError>;
