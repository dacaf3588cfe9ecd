// src/operation/synchronize.rs

//! Synchronize operation
//!
//! Makes the profile's roots match a target set exactly: every current root
//! not in the target set is removed, then the install policy runs over the
//! target set. Resolving twice against an unchanged profile reports nothing
//! to do the second time.

use super::install::plan_install_unit;
use super::{ChangeOperation, ResolutionResult};
use crate::engine::ProvisioningContext;
use crate::error::{Error, Result};
use crate::model::{InstallableUnit, Profile};
use crate::monitor::ProgressMonitor;
use crate::request::ProfileChangeRequest;
use crate::status::Status;
use tracing::debug;

/// Reshapes a profile so its roots equal the target set
pub struct SynchronizeOperation {
    context: ProvisioningContext,
    profile_id: String,
    targets: Vec<InstallableUnit>,
    resolution: ResolutionResult,
}

impl SynchronizeOperation {
    pub fn new(
        context: ProvisioningContext,
        profile_id: impl Into<String>,
        targets: Vec<InstallableUnit>,
    ) -> Self {
        Self {
            context,
            profile_id: profile_id.into(),
            targets,
            resolution: ResolutionResult::default(),
        }
    }
}

impl ChangeOperation for SynchronizeOperation {
    fn profile_id(&self) -> &str {
        &self.profile_id
    }

    fn context(&self) -> &ProvisioningContext {
        &self.context
    }

    fn resolution(&self) -> &ResolutionResult {
        &self.resolution
    }

    fn resolution_mut(&mut self) -> &mut ResolutionResult {
        &mut self.resolution
    }

    fn compute_change_request(
        &mut self,
        profile: &Profile,
        diagnostics: &mut Vec<Status>,
        monitor: &dyn ProgressMonitor,
    ) -> Result<Option<ProfileChangeRequest>> {
        let mut request = ProfileChangeRequest::new(profile.id());

        // Drop roots that are not part of the target set
        let stale: Vec<InstallableUnit> = profile
            .roots()
            .filter(|root| !self.targets.contains(root))
            .cloned()
            .collect();
        for root in stale {
            debug!(iu = %root, "synchronize: removing stale root");
            request.remove(root.clone());
            request.clear_root(&root);
        }

        // Then the regular install policy over the target set
        for iu in &self.targets {
            if monitor.is_cancelled() {
                return Err(Error::Cancelled);
            }
            plan_install_unit(&mut request, profile, iu, diagnostics);
            monitor.worked(1);
        }

        if request.is_empty() {
            return Ok(None);
        }
        Ok(Some(request))
    }
}
