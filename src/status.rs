// src/status.rs

//! Resolution status taxonomy
//!
//! Diagnostic conditions discovered while building or resolving a change
//! request are reported as [`Status`] values, never thrown. A status carries
//! a severity, a machine-checkable code, a human-readable message, and
//! optionally the child statuses it aggregates.

use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::Display;

/// Status severity, ordered from harmless to fatal
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
)]
pub enum Severity {
    Ok,
    Info,
    Warning,
    Cancel,
    Error,
}

/// Machine-checkable status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum StatusCode {
    /// The computed request would not change the profile
    NothingToDo,
    /// No update candidate survived selection
    NothingToUpdate,
    /// The requested unit is already installed as a root
    AlreadyInstalled,
    /// An installed non-root unit was promoted to root
    PartialInstallCompleted,
    /// An implied update was skipped because the installed unit is locked
    IgnoredImpliedUpdate,
    /// A requested unit is older than the installed one
    IgnoredImpliedDowngrade,
    /// Another resolution is already in flight for this profile
    OperationInProgress,
    /// The referenced profile does not exist in the registry
    ProfileNotFound,
    /// The planner accepted the request
    PlanAccepted,
    /// The planner rejected the request as infeasible
    PlannerFailure,
    /// No relaxation produced a resolvable request
    NoRemedyFound,
    /// Cooperative cancellation was observed
    Cancelled,
    /// Internal failure surfaced as a status
    Internal,
}

/// A resolution status: severity, code, message, and aggregated children
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub severity: Severity,
    pub code: StatusCode,
    pub message: String,
    /// Child statuses for aggregates; empty for leaf statuses
    pub children: Vec<Status>,
}

impl Status {
    pub fn new(severity: Severity, code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            children: Vec::new(),
        }
    }

    pub fn ok(code: StatusCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Ok, code, message)
    }

    pub fn info(code: StatusCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, code, message)
    }

    pub fn warning(code: StatusCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, message)
    }

    pub fn cancel(message: impl Into<String>) -> Self {
        Self::new(Severity::Cancel, StatusCode::Cancelled, message)
    }

    pub fn error(code: StatusCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, message)
    }

    /// Aggregate child statuses; severity and code come from the most
    /// severe child (last wins on ties)
    pub fn aggregate(message: impl Into<String>, children: Vec<Status>) -> Self {
        let worst = children
            .iter()
            .max_by_key(|s| s.severity)
            .map(|s| (s.severity, s.code))
            .unwrap_or((Severity::Ok, StatusCode::NothingToDo));
        Self {
            severity: worst.0,
            code: worst.1,
            message: message.into(),
            children,
        }
    }

    /// Collapse accumulated diagnostics into a single reportable status
    ///
    /// Exactly one diagnostic surfaces standalone; zero collapses to an Ok
    /// status with the given fallback; more than one aggregates.
    pub fn flatten(mut diagnostics: Vec<Status>, fallback: impl Into<String>) -> Self {
        match diagnostics.len() {
            0 => Status::ok(StatusCode::NothingToDo, fallback),
            1 => diagnostics.remove(0),
            _ => Status::aggregate(fallback, diagnostics),
        }
    }

    /// Whether work may proceed under this status (below Cancel severity)
    pub fn is_ok(&self) -> bool {
        self.severity < Severity::Cancel
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.code, self.message)?;
        for child in &self.children {
            write!(f, "\n  {}", child)?;
        }
        Ok(())
    }
}
