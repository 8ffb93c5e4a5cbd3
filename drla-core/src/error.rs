//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DrlaError {
    /// Sampling was requested from a store holding no transitions.
    #[error("Insufficient data: requested {requested} samples from a store of size {size}")]
    InsufficientData {
        /// Number of requested samples.
        requested: usize,
        /// Number of valid entries in the store.
        size: usize,
    },

    /// A loss or parameter became NaN or infinite.
    #[error("Numeric divergence: {0}")]
    NumericDivergence(String),

    /// The environment failed during reset or step.
    #[error("Environment fault: {0}")]
    EnvironmentFault(String),

    /// Dimensionality of observation or action disagrees with the configured one.
    #[error("Shape mismatch of {what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Which quantity has the wrong shape.
        what: String,
        /// Configured dimensionality.
        expected: usize,
        /// Received dimensionality.
        actual: usize,
    },

    /// A configuration value is out of its valid range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),
}

impl DrlaError {
    /// Shorthand for [`DrlaError::ShapeMismatch`].
    pub fn shape_mismatch(what: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::ShapeMismatch {
            what: what.into(),
            expected,
            actual,
        }
    }
}
