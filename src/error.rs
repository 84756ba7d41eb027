//! Error types for u-inference.
//!
//! Only precondition failures are errors. Numeric degeneracies found while
//! computing (zero variance, saturated special functions) are reported as
//! `None` in the affected result field instead.

use thiserror::Error;

/// All errors produced by u-inference operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    /// A test's minimum sample size is not met.
    #[error("{test} needs at least {min_required} observations, got {actual}")]
    InsufficientData {
        test: &'static str,
        min_required: usize,
        actual: usize,
    },
    /// A test received the wrong number of non-empty groups.
    #[error("{test} needs {expected} non-empty groups, got {actual}")]
    GroupCount {
        test: &'static str,
        expected: &'static str,
        actual: usize,
    },
    /// Column not found in the dataset.
    #[error("column '{name}' not found")]
    ColumnNotFound { name: String },
    /// Dimension mismatch.
    #[error("expected {expected} elements, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Result alias used throughout the crate.
pub type InferenceResult<T> = Result<T, InferenceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_data_message_is_actionable() {
        let err = InferenceError::InsufficientData {
            test: "linear regression",
            min_required: 3,
            actual: 2,
        };
        assert_eq!(
            err.to_string(),
            "linear regression needs at least 3 observations, got 2"
        );
    }

    #[test]
    fn group_count_message() {
        let err = InferenceError::GroupCount {
            test: "t-test",
            expected: "exactly 2",
            actual: 3,
        };
        assert_eq!(err.to_string(), "t-test needs exactly 2 non-empty groups, got 3");
    }

    #[test]
    fn column_not_found_message() {
        let err = InferenceError::ColumnNotFound {
            name: "age".into(),
        };
        assert_eq!(err.to_string(), "column 'age' not found");
    }
}
