//! Error types for construction input.

use thiserror::Error;

/// Errors that can occur while reading or converting construction input.
#[derive(Error, Debug)]
pub enum IrError {
    /// A logic string contained an unknown character.
    #[error("invalid character '{ch}' at position {pos} in logic string")]
    InvalidLogicChar {
        /// Offending character.
        ch: char,
        /// Byte offset in the string.
        pos: usize,
    },

    /// A logic expression did not balance to a single value.
    #[error("invalid logic definition: operators do not balance")]
    UnbalancedLogic,

    /// Parentheses in an infix expression did not match.
    #[error("mismatched parentheses in logic expression")]
    MismatchedParens,

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for construction input operations.
pub type Result<T> = std::result::Result<T, IrError>;
