//! Domain error types
//!
//! All errors are domain-specific and don't expose third-party types. The
//! caller-input validation variants leave the engine's tables unmodified:
//! a failed call can always be retried with corrected input.

use thiserror::Error;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, VeilError>;

/// Main veil error type
#[derive(Debug, Error)]
pub enum VeilError {
    /// Two dataset columns share a name (construction-time, unrecoverable)
    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),

    /// Columns of unequal length (construction-time, unrecoverable)
    #[error("Column '{column}' has {found} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    /// A named column does not exist in the dataset
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// A property override value is not in the approved set
    #[error("Unknown {kind} '{value}'; approved values are [{approved}]")]
    InvalidProperty {
        kind: &'static str,
        value: String,
        approved: String,
    },

    /// A transformation name is not in the column's allowed list
    #[error("Transformation '{name}' is not allowed for column '{column}'; allowed: [{allowed}]")]
    UnknownTransformation {
        column: String,
        name: String,
        allowed: String,
    },

    /// An operation was invoked out of state-machine order
    #[error("Precondition violated: {0}")]
    PreconditionViolated(String),

    /// A transformation could not be applied to a column
    #[error("Transformation '{name}' failed on column '{column}': {source}")]
    Transformation {
        column: String,
        name: String,
        #[source]
        source: TransformError,
    },

    /// Pattern registry or options failed to load/validate
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Failure applying a single transformation function to a column
#[derive(Debug, Error)]
pub enum TransformError {
    /// A value did not have the format the transformation requires
    #[error("malformed value: {0}")]
    Format(String),

    /// A value's type is not supported by the transformation
    #[error("unsupported value type: {0}")]
    UnsupportedType(String),
}
