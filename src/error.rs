// src/error.rs

//! Error types for the resolution engine
//!
//! Diagnostic conditions ("nothing to do", "already installed", ...) are not
//! errors; they travel as [`crate::status::Status`] values inside resolution
//! results. This enum covers the genuinely exceptional cases: precondition
//! violations, unparseable versions, missing profiles, and collaborator
//! failures.

use thiserror::Error;

/// Result type alias for director operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the resolution and remediation engine
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid argument supplied by the caller; fails fast at call time
    #[error("precondition violated: {0}")]
    Precondition(String),

    /// The referenced profile does not exist in the registry
    #[error("profile not found: {0}")]
    ProfileNotFound(String),

    /// A version string could not be parsed
    #[error("invalid version '{0}'")]
    VersionParse(String),

    /// A version range string could not be parsed
    #[error("invalid version range '{0}'")]
    RangeParse(String),

    /// The planner collaborator failed outright (not mere infeasibility)
    #[error("planner error: {0}")]
    Planner(String),

    /// The request flexer collaborator failed outright
    #[error("flexer error: {0}")]
    Flexer(String),

    /// Cooperative cancellation was observed
    #[error("operation cancelled")]
    Cancelled,

    /// Internal invariant violation
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Convenience constructor for precondition violations
    pub fn precondition(msg: impl Into<String>) -> Self {
        Error::Precondition(msg.into())
    }
}
