//! Error types for the harrier library.
//!
//! All fallible operations return [`Result`], and every error is a variant of
//! [`HarrierError`]. Each variant carries enough context (row index, column
//! name, file path) to diagnose the failure without re-running the operation.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// The main error type for harrier operations.
#[derive(Error, Debug)]
pub enum HarrierError {
    /// A dataset line whose field count does not match the schema.
    #[error("malformed row at {path}:{line}: expected {expected} fields, found {found}")]
    MalformedRow {
        path: String,
        line: usize,
        expected: usize,
        found: usize,
    },

    /// A dataset field that cannot be converted to its declared type.
    #[error("cannot coerce value '{value}' in column '{column}' (line {line}) to {target}")]
    TypeCoercion {
        column: String,
        value: String,
        line: usize,
        target: String,
    },

    /// A pipeline step referenced a column not yet produced.
    #[error("pipeline step '{step}' references unknown column '{column}'")]
    UnknownColumn { step: String, column: String },

    /// A model artifact file that is unreadable or incompatible.
    #[error("corrupt artifact at {path}: {reason}")]
    CorruptArtifact { path: PathBuf, reason: String },

    /// A prediction request missing fields the pipeline requires.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Any failure inside the model backend, not inspected further.
    #[error("backend training error: {0}")]
    BackendTraining(String),

    /// Schema definition errors (duplicate or empty column names, etc.)
    #[error("schema error: {0}")]
    Schema(String),

    /// I/O errors (file operations, network, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with [`HarrierError`].
pub type Result<T> = std::result::Result<T, HarrierError>;

impl HarrierError {
    /// Create a new malformed-row error.
    pub fn malformed_row(
        path: impl Into<String>,
        line: usize,
        expected: usize,
        found: usize,
    ) -> Self {
        HarrierError::MalformedRow {
            path: path.into(),
            line,
            expected,
            found,
        }
    }

    /// Create a new type-coercion error.
    pub fn type_coercion(
        column: impl Into<String>,
        value: impl Into<String>,
        line: usize,
        target: impl Into<String>,
    ) -> Self {
        HarrierError::TypeCoercion {
            column: column.into(),
            value: value.into(),
            line,
            target: target.into(),
        }
    }

    /// Create a new unknown-column error.
    pub fn unknown_column(step: impl Into<String>, column: impl Into<String>) -> Self {
        HarrierError::UnknownColumn {
            step: step.into(),
            column: column.into(),
        }
    }

    /// Create a new corrupt-artifact error.
    pub fn corrupt_artifact(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        HarrierError::CorruptArtifact {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a new invalid-input error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        HarrierError::InvalidInput(msg.into())
    }

    /// Create a new backend-training error.
    pub fn backend<S: Into<String>>(msg: S) -> Self {
        HarrierError::BackendTraining(msg.into())
    }

    /// Create a new schema error.
    pub fn schema<S: Into<String>>(msg: S) -> Self {
        HarrierError::Schema(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        HarrierError::Other(msg.into())
    }
}
