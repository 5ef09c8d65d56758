//! Evaluation-specific error types.

use thiserror::Error;

/// Errors that can occur while evaluating an event or swapping configuration.
#[derive(Debug, Error)]
pub enum EvalError {
    /// A rule predicate was applied to a field value of a different kind.
    ///
    /// Only the evaluation that hit the mismatch fails.
    #[error("rule on field '{field}' expects a {expected} value, got {actual}")]
    KindMismatch {
        field: &'static str,
        expected: &'static str,
        actual: &'static str,
    },

    /// A configuration error propagated from the loader.
    #[error("configuration error: {0}")]
    Config(#[from] pgaudit_config::ConfigError),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, EvalError>;
