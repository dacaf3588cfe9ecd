// src/operation/uninstall.rs

//! Uninstall operation
//!
//! Removal alone may not take effect while other units still require the
//! target transitively, so the root marker is cleared explicitly: even a
//! retained unit stops being treated as user-wanted.

use super::{ChangeOperation, ResolutionResult};
use crate::engine::ProvisioningContext;
use crate::error::Result;
use crate::model::{InstallableUnit, Profile};
use crate::monitor::ProgressMonitor;
use crate::request::ProfileChangeRequest;
use crate::status::{Status, StatusCode};

/// Removes the given units from a profile
pub struct UninstallOperation {
    context: ProvisioningContext,
    profile_id: String,
    targets: Vec<InstallableUnit>,
    resolution: ResolutionResult,
}

impl UninstallOperation {
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

impl ChangeOperation for UninstallOperation {
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
        _monitor: &dyn ProgressMonitor,
    ) -> Result<Option<ProfileChangeRequest>> {
        let mut request = ProfileChangeRequest::new(profile.id());
        for iu in &self.targets {
            if !profile.contains(iu) {
                diagnostics.push(Status::info(
                    StatusCode::NothingToDo,
                    format!("{} is not installed", iu),
                ));
                continue;
            }
            request.remove(iu.clone());
            request.clear_root(iu);
        }
        if request.is_empty() {
            return Ok(None);
        }
        Ok(Some(request))
    }
}
