//! Error types for benchmark evaluation and performance logging.
//!
//! Programmer errors on hot paths (a [`Scale`](crate::scale::Scale) queried
//! outside its range, a bucket index past the end) are asserted instead of
//! being returned here. Everything a caller can reasonably react to, such as a
//! wrong dimensionality, a failing constraint or an unwritable log file, is a
//! [`BenchError`].

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while evaluating problems or recording their performance.
#[derive(Debug, Error)]
pub enum BenchError {
    /// A point with the wrong number of variables was evaluated.
    #[error("dimension mismatch on problem {problem}: expected {expected} variables, got {got}")]
    DimensionMismatch {
        /// Name of the offending problem
        problem: String,
        /// Number of variables of the problem
        expected: usize,
        /// Number of variables supplied
        got: usize,
    },

    /// A scale was built with an empty or inverted range, or no buckets.
    #[error("invalid scale: [{min}, {max}] with {size} buckets")]
    InvalidScale {
        /// Lower end of the range
        min: f64,
        /// Upper end of the range
        max: f64,
        /// Requested number of buckets
        size: usize,
    },

    /// A trigger was configured with parameters that can never fire.
    #[error("invalid trigger: {reason}")]
    InvalidTrigger {
        /// Why the trigger was rejected
        reason: String,
    },

    /// A user supplied constraint function failed.
    #[error("constraint {constraint} failed: {reason}")]
    ConstraintFailed {
        /// Name of the constraint
        constraint: String,
        /// Failure reported by the constraint function
        reason: String,
    },

    /// A log file or directory could not be created or written.
    #[error("io error on {}: {source}", path.display())]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A JSON configuration could not be parsed.
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    /// A configuration was syntactically valid but semantically wrong.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Why the configuration was rejected
        reason: String,
    },

    /// No problem with this name or id is registered.
    #[error("unknown problem: {name}")]
    UnknownProblem {
        /// Requested name or id
        name: String,
    },

    /// A problem name or id was registered twice.
    #[error("problem already registered: {name}")]
    DuplicateProblem {
        /// Name or id registered twice
        name: String,
    },

    /// A shared logger mutex was poisoned by a panic in another holder.
    #[error("logger lock poisoned")]
    LoggerPoisoned,

    /// One or more loggers of a fan-out failed. Siblings were still served.
    #[error("{} logger(s) failed: {}", .failures.len(), describe_failures(.failures))]
    Combined {
        /// Index of each failing logger with its error
        failures: Vec<(usize, BenchError)>,
    },
}

fn describe_failures(failures: &[(usize, BenchError)]) -> String {
    failures
        .iter()
        .map(|(index, err)| format!("#{}: {}", index, err))
        .collect::<Vec<_>>()
        .join("; ")
}

/// A specialized `Result` type for benchmark operations.
pub type Result<T> = std::result::Result<T, BenchError>;

impl BenchError {
    /// Wraps an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BenchError::Io {
            path: path.into(),
            source,
        }
    }

    /// Collapses the failures of a fan-out into a single result.
    pub(crate) fn combine(failures: Vec<(usize, BenchError)>) -> Result<()> {
        if failures.is_empty() {
            Ok(())
        } else {
            Err(BenchError::Combined { failures })
        }
    }

    /// Returns `true` if the caller broke a precondition of the call.
    ///
    /// This includes `DimensionMismatch` and `InvalidScale`.
    pub fn is_precondition_error(&self) -> bool {
        matches!(
            self,
            BenchError::DimensionMismatch { .. } | BenchError::InvalidScale { .. }
        )
    }

    /// Returns `true` if this is an I/O failure, directly or inside a fan-out.
    pub fn is_io_error(&self) -> bool {
        match self {
            BenchError::Io { .. } => true,
            BenchError::Combined { failures } => failures.iter().any(|(_, e)| e.is_io_error()),
            _ => false,
        }
    }

    /// Returns `true` if this is a configuration-related error.
    ///
    /// This includes `InvalidTrigger`, `InvalidConfig`, `Json`,
    /// `UnknownProblem` and `DuplicateProblem`.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            BenchError::InvalidTrigger { .. }
                | BenchError::InvalidConfig { .. }
                | BenchError::Json(_)
                | BenchError::UnknownProblem { .. }
                | BenchError::DuplicateProblem { .. }
        )
    }
}
