//! Error types for cross-validation runs.
//!
//! Validation errors are raised before any fold work begins. Adapter failures
//! raised while refitting a fold abort the whole run.

use thiserror::Error;

/// Boxed error raised by a model adapter.
pub type AdapterSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for cross-validation operations.
///
/// # Examples
///
/// ```
/// use crossfold::error::CvError;
///
/// let err = CvError::InvalidFoldSpec {
///     k: 1,
///     n: 10,
///     reason: "k must be at least 2".to_string(),
/// };
/// assert!(err.to_string().contains("invalid fold specification"));
/// ```
#[derive(Debug, Error)]
pub enum CvError {
    /// The number of folds is out of range for the number of units.
    #[error("invalid fold specification: k = {k} for n = {n} ({reason})")]
    InvalidFoldSpec {
        /// Requested fold count
        k: usize,
        /// Number of cases or clusters being partitioned
        n: usize,
        /// Constraint that was violated
        reason: String,
    },

    /// A combination of options that cannot be honoured.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The adapter produced a response that is not a vector.
    #[error("response is not a vector: {0}")]
    NonVectorResponse(String),

    /// The adapter produced a response that cannot be coded numerically.
    #[error("response is not numeric: {0}")]
    NonNumericResponse(String),

    /// The selection-procedure run has neither a model nor a response expression.
    #[error("cannot determine the response: supply a fitted model or a response expression")]
    MissingResponse,

    /// Lengths that must agree do not.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected length description
        expected: String,
        /// Actual length found
        actual: String,
    },

    /// A named column is absent from the data.
    #[error("column not found: {0}")]
    ColumnNotFound(String),

    /// Invalid data frame construction.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Refit or prediction failed inside a model adapter.
    #[error("adapter failure in {context}: {source}")]
    Adapter {
        /// Where the failure happened (e.g. "fold 3 refit")
        context: String,
        /// Underlying adapter error
        #[source]
        source: AdapterSource,
    },

    /// The worker pool could not be constructed.
    #[error("worker pool error: {0}")]
    WorkerPool(String),

    /// JSON (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CvError {
    /// Create a dimension mismatch error with descriptive context
    #[must_use]
    pub fn dimension_mismatch(context: &str, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            expected: format!("{context}={expected}"),
            actual: format!("{actual}"),
        }
    }

    /// Wrap an adapter error with the place it was raised.
    pub fn adapter(context: impl Into<String>, source: impl Into<AdapterSource>) -> Self {
        Self::Adapter {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Attach a location to an adapter error; other variants pass through.
    #[must_use]
    pub fn in_context(self, context: &str) -> Self {
        match self {
            Self::Adapter {
                context: inner,
                source,
            } => Self::Adapter {
                context: format!("{context}: {inner}"),
                source,
            },
            other => other,
        }
    }
}

/// Convenience type alias for Results.
pub type Result<T> = std::result::Result<T, CvError>;
