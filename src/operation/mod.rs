// src/operation/mod.rs

//! Profile change operation lifecycle
//!
//! Every concrete operation (install, uninstall, synchronize, update,
//! remediation) shares one resolution lifecycle:
//!
//! ```text
//! UNRESOLVED -> RESOLVING -> RESOLVED(Ok | NoChange | Failed | Cancelled)
//! ```
//!
//! `resolve` builds the operation's change request, hands it to the planner,
//! and records the outcome. Calling `resolve` again re-runs the whole
//! pipeline and replaces prior results; callers that mutate selections
//! between calls must resolve again for a fresh answer. Planner failures are
//! reported, never retried by this layer.

mod install;
mod synchronize;
mod uninstall;
mod update;

pub use install::InstallOperation;
pub use synchronize::SynchronizeOperation;
pub use uninstall::UninstallOperation;
pub use update::{Update, UpdateOperation};

use crate::engine::{Engine, Plan, ProvisioningContext, ProvisioningJob};
use crate::error::{Error, Result};
use crate::model::Profile;
use crate::monitor::ProgressMonitor;
use crate::request::ProfileChangeRequest;
use crate::status::{Severity, Status, StatusCode};
use std::sync::Arc;
use strum_macros::Display;
use tracing::debug;

/// How a completed resolution ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ResolutionKind {
    /// The planner accepted the request; a plan is available
    Ok,
    /// Nothing to do, or another operation was already in flight
    NoChange,
    /// The request was infeasible or a collaborator failed
    Failed,
    /// Cooperative cancellation was observed
    Cancelled,
}

/// Lifecycle state of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum OperationState {
    #[default]
    Unresolved,
    Resolving,
    Resolved(ResolutionKind),
}

/// The outcome of the most recent `resolve` call
///
/// Owned per operation instance; re-resolving replaces it wholesale.
#[derive(Debug, Default)]
pub struct ResolutionResult {
    pub state: OperationState,
    pub status: Option<Status>,
    pub request: Option<ProfileChangeRequest>,
    pub plan: Option<Plan>,
}

/// Shared lifecycle over the concrete operations' request-building policies
///
/// Implementors supply the policy (`compute_change_request`) and storage for
/// the resolution result; the provided methods own the state machine.
pub trait ChangeOperation {
    /// The profile this operation targets
    fn profile_id(&self) -> &str;

    /// The injected collaborators for this operation
    fn context(&self) -> &ProvisioningContext;

    fn resolution(&self) -> &ResolutionResult;

    fn resolution_mut(&mut self) -> &mut ResolutionResult;

    /// Build the change request for this operation's intent
    ///
    /// Returns `None` when there is nothing to request; diagnostics explain
    /// why. `Err(Error::Cancelled)` aborts the resolution as cancelled.
    fn compute_change_request(
        &mut self,
        profile: &Profile,
        diagnostics: &mut Vec<Status>,
        monitor: &dyn ProgressMonitor,
    ) -> Result<Option<ProfileChangeRequest>>;

    /// Hook invoked at the start of each `resolve`; `rerun` is true when a
    /// prior resolution is being replaced
    fn on_resolve_start(&mut self, _rerun: bool) {}

    /// Run the resolution pipeline and record the outcome
    fn resolve(&mut self, monitor: &dyn ProgressMonitor) -> Status {
        let profile_id = self.profile_id().to_string();
        let rerun = matches!(self.resolution().state, OperationState::Resolved(_));
        self.on_resolve_start(rerun);
        *self.resolution_mut() = ResolutionResult {
            state: OperationState::Resolving,
            ..Default::default()
        };

        // Advisory mutual exclusion: checked once at the start, not a lock
        // held for the duration.
        let in_flight = Arc::clone(self.context().in_flight());
        if !in_flight.begin(&profile_id) {
            let status = Status::info(
                StatusCode::OperationInProgress,
                format!("an operation is already in progress for profile '{}'", profile_id),
            );
            return self.complete(ResolutionKind::NoChange, status, None, None);
        }

        let status = self.resolve_guarded(&profile_id, monitor);
        in_flight.finish(&profile_id);
        status
    }

    /// Resolution body run while the in-flight mark is held
    #[doc(hidden)]
    fn resolve_guarded(&mut self, profile_id: &str, monitor: &dyn ProgressMonitor) -> Status {
        let Some(profile) = self.context().profile(profile_id) else {
            let status = Status::error(
                StatusCode::ProfileNotFound,
                format!("profile '{}' not found", profile_id),
            );
            return self.complete(ResolutionKind::Failed, status, None, None);
        };

        let mut diagnostics = Vec::new();
        let request = match self.compute_change_request(&profile, &mut diagnostics, monitor) {
            Ok(request) => request,
            Err(Error::Cancelled) => {
                return self.complete(
                    ResolutionKind::Cancelled,
                    Status::cancel("resolution cancelled"),
                    None,
                    None,
                );
            }
            Err(e) => {
                let status = Status::error(StatusCode::Internal, e.to_string());
                return self.complete(ResolutionKind::Failed, status, None, None);
            }
        };

        if monitor.is_cancelled() {
            return self.complete(
                ResolutionKind::Cancelled,
                Status::cancel("resolution cancelled"),
                None,
                None,
            );
        }

        let request = request.filter(|r| !r.is_empty());
        let Some(request) = request else {
            let status = Status::flatten(diagnostics, "no changes to apply");
            let kind = if status.severity >= Severity::Error {
                ResolutionKind::Failed
            } else {
                ResolutionKind::NoChange
            };
            return self.complete(kind, status, None, None);
        };

        debug!(profile = profile_id, "handing change request to planner");
        let planner = Arc::clone(self.context().planner());
        match planner.resolve(&request, self.context(), monitor) {
            Ok(plan) => {
                let status = plan.status().clone();
                let kind = match status.severity {
                    Severity::Error => ResolutionKind::Failed,
                    Severity::Cancel => ResolutionKind::Cancelled,
                    _ => ResolutionKind::Ok,
                };
                self.complete(kind, status, Some(request), Some(plan))
            }
            Err(e) => {
                let status = Status::error(StatusCode::PlannerFailure, e.to_string());
                self.complete(ResolutionKind::Failed, status, Some(request), None)
            }
        }
    }

    /// Record the terminal state and return the resolution status
    #[doc(hidden)]
    fn complete(
        &mut self,
        kind: ResolutionKind,
        status: Status,
        request: Option<ProfileChangeRequest>,
        plan: Option<Plan>,
    ) -> Status {
        debug!(
            profile = self.profile_id(),
            outcome = %kind,
            severity = %status.severity,
            "resolution finished"
        );
        *self.resolution_mut() = ResolutionResult {
            state: OperationState::Resolved(kind),
            status: Some(status.clone()),
            request,
            plan,
        };
        status
    }

    /// The status of the most recent resolution, if any
    fn resolution_status(&self) -> Option<&Status> {
        self.resolution().status.as_ref()
    }

    /// The change request accepted by the planner, if resolution succeeded
    fn resolved_request(&self) -> Option<&ProfileChangeRequest> {
        self.resolution().request.as_ref()
    }

    /// One-shot executable unit wrapping the resolved plan
    ///
    /// Available only when the resolution status severity is below Cancel.
    fn provisioning_job(&self, engine: Arc<dyn Engine>) -> Option<ProvisioningJob> {
        let resolution = self.resolution();
        let status = resolution.status.as_ref()?;
        if !status.is_ok() {
            return None;
        }
        let plan = resolution.plan.clone()?;
        Some(ProvisioningJob::new(plan, engine))
    }
}
