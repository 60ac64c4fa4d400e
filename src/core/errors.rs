/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Loader-related errors with serialization support
///
/// Failures from a delegate propagate through every layer unchanged, so a
/// caller cannot tell a hand-off execution apart from an inline one by the
/// shape of the error it receives.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum LoadError {
    #[error("unit or resource {0} not found")]
    #[diagnostic(
        code(loader::not_found),
        help("No delegate or fallback produced the named unit. Check the name and the delegation chain.")
    )]
    NotFound(String),

    #[error("invalid unit name: {0}")]
    #[diagnostic(
        code(loader::invalid_name),
        help("Unit and resource names must be non-empty.")
    )]
    InvalidName(String),

    #[error("serializer worker failed: {0}")]
    #[diagnostic(
        code(loader::worker_failed),
        help("The resolution raised an unexpected failure on the serializer thread. See logs for the iteration report.")
    )]
    Worker(String),
}

impl LoadError {
    /// Expected "nothing by that name" outcome, carrying the requested name.
    pub fn not_found(name: impl Into<String>) -> Self {
        LoadError::NotFound(name.into())
    }

    /// Fail-fast rejection of a malformed name, raised before any locking.
    pub fn invalid_name(reason: impl Into<String>) -> Self {
        LoadError::InvalidName(reason.into())
    }

    /// Unexpected failure captured on the serializer thread and delivered to
    /// the blocked caller as if it had occurred inline.
    pub fn worker(message: impl Into<String>) -> Self {
        LoadError::Worker(message.into())
    }

    /// True for the expected not-found outcome (returned, not logged).
    pub fn is_not_found(&self) -> bool {
        matches!(self, LoadError::NotFound(_))
    }
}

/// Result type for loader operations
pub type Result<T> = std::result::Result<T, LoadError>;
