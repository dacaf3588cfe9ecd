// src/operation/install.rs

//! Install operation
//!
//! Builds the change request for installing a set of units into a profile.
//! Installing something already present is a diagnostic report, never an
//! error: repeating an install and re-resolving is idempotent.

use super::{ChangeOperation, ResolutionResult};
use crate::engine::ProvisioningContext;
use crate::error::{Error, Result};
use crate::model::{InstallableUnit, Profile};
use crate::monitor::ProgressMonitor;
use crate::request::{InclusionRule, ProfileChangeRequest};
use crate::status::{Status, StatusCode};
use tracing::debug;

/// Installs the given units as roots of a profile
pub struct InstallOperation {
    context: ProvisioningContext,
    profile_id: String,
    targets: Vec<InstallableUnit>,
    resolution: ResolutionResult,
}

impl InstallOperation {
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

impl ChangeOperation for InstallOperation {
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

/// Apply the per-unit install policy to `request`
///
/// Shared with [`super::SynchronizeOperation`], which reuses the install
/// policy for its target set after removing stale roots.
pub(super) fn plan_install_unit(
    request: &mut ProfileChangeRequest,
    profile: &Profile,
    iu: &InstallableUnit,
    diagnostics: &mut Vec<Status>,
) {
    // Patches are optional so removing the patch later does not force-remove
    // the patched unit.
    if iu.patch {
        request.set_inclusion_rule(iu, InclusionRule::Optional);
    }

    match profile.iu_with_id(&iu.id) {
        Some(installed) => {
            let installed = installed.clone();
            match installed.version.cmp(&iu.version) {
                std::cmp::Ordering::Less => {
                    // Implied update of the installed unit
                    plan_implied_update(request, profile, iu, &installed, diagnostics);
                }
                std::cmp::Ordering::Greater => {
                    debug!(iu = %iu, installed = %installed, "ignoring implied downgrade");
                    diagnostics.push(Status::info(
                        StatusCode::IgnoredImpliedDowngrade,
                        format!(
                            "altered: ignored implied downgrade of {} to {}",
                            installed, iu.version
                        ),
                    ));
                }
                std::cmp::Ordering::Equal => {
                    if profile.is_root(&installed) {
                        diagnostics.push(Status::info(
                            StatusCode::AlreadyInstalled,
                            format!("{} is already installed", iu),
                        ));
                    } else {
                        // Present as a dependency; promote to root
                        request.mark_root(&installed);
                        diagnostics.push(Status::info(
                            StatusCode::PartialInstallCompleted,
                            format!("completed partial install of {}", iu),
                        ));
                    }
                }
            }
        }
        None => {
            // No same-id match; the unit may still declare itself an update
            // of something installed under another id.
            if let Some(old) = profile.ius().find(|inst| iu.is_update_of(inst)) {
                let old = old.clone();
                plan_implied_update(request, profile, iu, &old, diagnostics);
            } else {
                request.add(iu.clone());
                request.mark_root(iu);
            }
        }
    }
}

/// Replace `installed` with `iu`, unless `installed` is locked against updates
fn plan_implied_update(
    request: &mut ProfileChangeRequest,
    profile: &Profile,
    iu: &InstallableUnit,
    installed: &InstallableUnit,
    diagnostics: &mut Vec<Status>,
) {
    if profile.is_update_locked(installed) {
        debug!(iu = %iu, installed = %installed, "ignoring implied update of locked unit");
        diagnostics.push(Status::info(
            StatusCode::IgnoredImpliedUpdate,
            format!("altered: ignored implied update of locked {}", installed),
        ));
        return;
    }
    request.add(iu.clone());
    request.remove(installed.clone());
    request.mark_root(iu);
}
