//! Error types for topology planning.

use std::fmt;

/// Result type alias for topology operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of planning errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The requested node counts cannot form a cluster.
    Shape,
    /// A required field is missing or empty.
    Field,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Shape => "Impossible cluster shape",
            Self::Field => "Invalid cluster field",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Shape => "Adjust the node counts or enable single-node mode",
            Self::Field => "Fill in the field in the cluster file",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors raised by the planner before any instance is launched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The cluster spec describes a topology that cannot be provisioned.
    #[error("invalid cluster spec: {reason}")]
    InvalidSpec {
        /// Why the spec was rejected.
        reason: String,
        /// What kind of problem it is.
        category: ErrorCategory,
    },
}

impl Error {
    pub(crate) fn shape(reason: impl Into<String>) -> Self {
        Self::InvalidSpec {
            reason: reason.into(),
            category: ErrorCategory::Shape,
        }
    }

    pub(crate) fn field(reason: impl Into<String>) -> Self {
        Self::InvalidSpec {
            reason: reason.into(),
            category: ErrorCategory::Field,
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidSpec { category, .. } => *category,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::shape("no data nodes");
        assert_eq!(err.to_string(), "invalid cluster spec: no data nodes");
        assert_eq!(err.category(), ErrorCategory::Shape);
    }

    #[test]
    fn test_category_advice() {
        assert!(!ErrorCategory::Shape.advice().is_empty());
        assert_eq!(ErrorCategory::Field.to_string(), "Invalid cluster field");
    }
}
