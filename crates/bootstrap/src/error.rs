//! Error types for bootstrap composition and execution.
//!
//! Composition errors surface before any instance boots. Step failures
//! surface per instance at boot time: a fatal step aborts the bootstrap and
//! the instance must not report healthy. Optional step failures are not
//! errors; they are collected as [`StepWarning`]s.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type alias for bootstrap operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of bootstrap errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Config templates are missing or malformed.
    Template,
    /// A fatal bootstrap step failed on the instance.
    Step,
    /// The step runner itself could not run a step.
    Runner,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Template => "Invalid config template",
            Self::Step => "Bootstrap step failed",
            Self::Runner => "Could not run bootstrap step",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Template => "Check the template directory or fall back to the built-in templates",
            Self::Step => "Replace the instance; a half-configured node must not join the cluster",
            Self::Runner => "Check that bash is available and the bootstrap runs as root",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while composing or executing a bootstrap plan.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No overlay template exists for a role.
    #[error("no config overlay '{key}' for role {role}")]
    MissingOverlay {
        /// Overlay key that was looked up.
        key: String,
        /// Role being composed.
        role: String,
    },

    /// A template could not be parsed.
    #[error("invalid template '{name}': {message}")]
    InvalidTemplate {
        /// Template name.
        name: String,
        /// Parser message.
        message: String,
    },

    /// A fatal step exited unsuccessfully.
    #[error("fatal bootstrap step '{step}' failed: {message}")]
    FatalStep {
        /// Step id.
        step: String,
        /// Exit status and stderr summary.
        message: String,
    },

    /// The runner could not execute a step.
    #[error("runner error in step '{step}': {source}")]
    Runner {
        /// Step id.
        step: String,
        /// Underlying runner error.
        #[source]
        source: anyhow::Error,
    },
}

impl Error {
    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingOverlay { .. } | Self::InvalidTemplate { .. } => ErrorCategory::Template,
            Self::FatalStep { .. } => ErrorCategory::Step,
            Self::Runner { .. } => ErrorCategory::Runner,
        }
    }
}

/// A non-fatal step that failed during execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepWarning {
    /// Step id.
    pub step: String,
    /// Exit status and stderr summary.
    pub message: String,
}

impl fmt::Display for StepWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "optional step '{}' failed: {}", self.step, self.message)
    }
}
