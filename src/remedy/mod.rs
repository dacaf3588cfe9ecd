// src/remedy/mod.rs

//! Weighted relaxation search for infeasible change requests
//!
//! When the strict request cannot be satisfied, the remediation operation
//! sweeps every non-trivial combination of four independent relaxation
//! permissions, asks the request flexer for a resolvable relaxed request
//! under each, and keeps the best feasible remedy. Two bests are exposed so
//! callers can present "loosen what you asked for" and "loosen what is
//! installed" as distinct choices.

use crate::engine::{ProvisioningContext, RequestFlexer};
use crate::error::{Error, Result};
use crate::model::Profile;
use crate::monitor::ProgressMonitor;
use crate::operation::{ChangeOperation, ResolutionResult};
use crate::request::ProfileChangeRequest;
use crate::status::{Status, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Four independent relaxation permissions
///
/// Kept as explicit booleans rather than a bitmask so the weight tables can
/// be exhaustive-matched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemedyConfig {
    /// Allow dropping units from what is being installed
    pub allow_partial_install: bool,
    /// Allow installing a different version than requested
    pub allow_different_version: bool,
    /// Allow updating already-installed units
    pub allow_installed_update: bool,
    /// Allow removing already-installed units
    pub allow_installed_removal: bool,
}

impl RemedyConfig {
    /// All 15 non-trivial configs, in bitmask order 1..=15
    ///
    /// `allow_partial_install` varies fastest. The all-false config is
    /// excluded: it is the strict request itself.
    pub fn all() -> Vec<RemedyConfig> {
        (1u8..=15).map(Self::from_bits).collect()
    }

    fn from_bits(bits: u8) -> Self {
        Self {
            allow_partial_install: bits & 0b0001 != 0,
            allow_different_version: bits & 0b0010 != 0,
            allow_installed_update: bits & 0b0100 != 0,
            allow_installed_removal: bits & 0b1000 != 0,
        }
    }

    /// The fixed config for update discovery: find updates without removing
    /// or partially installing anything
    pub fn check_for_updates() -> Self {
        Self {
            allow_partial_install: false,
            allow_different_version: true,
            allow_installed_update: true,
            allow_installed_removal: false,
        }
    }

    /// How much this config relaxes what is being installed (0..=3)
    pub fn being_installed_relaxed_weight(&self) -> u8 {
        match (self.allow_different_version, self.allow_partial_install) {
            (true, false) => 3,
            (false, true) => 2,
            (true, true) => 1,
            (false, false) => 0,
        }
    }

    /// How much this config relaxes what is already installed (0..=3)
    pub fn installation_relaxed_weight(&self) -> u8 {
        match (self.allow_installed_update, self.allow_installed_removal) {
            (true, false) => 3,
            (false, true) => 2,
            (true, true) => 1,
            (false, false) => 0,
        }
    }
}

impl fmt::Display for RemedyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "partial={} version={} update={} removal={}",
            self.allow_partial_install,
            self.allow_different_version,
            self.allow_installed_update,
            self.allow_installed_removal,
        )
    }
}

/// The result of attempting resolution under one relaxation config
#[derive(Debug, Clone)]
pub struct Remedy {
    pub config: RemedyConfig,
    /// The relaxed request, when this relaxation admits a resolution
    pub request: Option<ProfileChangeRequest>,
    pub being_installed_relaxed_weight: u8,
    pub installation_relaxed_weight: u8,
    /// The strict request this remedy was derived from
    pub original: ProfileChangeRequest,
}

impl Remedy {
    pub fn new(
        config: RemedyConfig,
        request: Option<ProfileChangeRequest>,
        original: ProfileChangeRequest,
    ) -> Self {
        Self {
            config,
            request,
            being_installed_relaxed_weight: config.being_installed_relaxed_weight(),
            installation_relaxed_weight: config.installation_relaxed_weight(),
            original,
        }
    }
}

/// Searches the relaxation space for the best feasible alternative request
pub struct RemediationOperation {
    context: ProvisioningContext,
    profile_id: String,
    original: ProfileChangeRequest,
    flexer: Arc<dyn RequestFlexer>,
    /// Evaluate only the fixed update-discovery config instead of all 15
    check_for_updates: bool,
    remedies: Vec<Remedy>,
    best_changing_the_request: Option<Remedy>,
    best_changing_what_is_installed: Option<Remedy>,
    selected: Option<ProfileChangeRequest>,
    resolution: ResolutionResult,
}

impl RemediationOperation {
    pub fn new(
        context: ProvisioningContext,
        original: ProfileChangeRequest,
        flexer: Arc<dyn RequestFlexer>,
    ) -> Self {
        let profile_id = original.profile_id().to_string();
        Self {
            context,
            profile_id,
            original,
            flexer,
            check_for_updates: false,
            remedies: Vec::new(),
            best_changing_the_request: None,
            best_changing_what_is_installed: None,
            selected: None,
            resolution: ResolutionResult::default(),
        }
    }

    /// Restrict the search to the fixed update-discovery config
    ///
    /// In this mode at most one remedy is produced and the best-solution
    /// accessors stay empty.
    pub fn for_check_for_updates(mut self) -> Self {
        self.check_for_updates = true;
        self
    }

    /// All remedies produced by the last search
    pub fn remedies(&self) -> &[Remedy] {
        &self.remedies
    }

    /// Best remedy that only relaxes what is being installed
    pub fn best_solution_changing_the_request(&self) -> Option<&Remedy> {
        self.best_changing_the_request.as_ref()
    }

    /// Best remedy that only relaxes what is already installed
    pub fn best_solution_changing_what_is_installed(&self) -> Option<&Remedy> {
        self.best_changing_what_is_installed.as_ref()
    }

    /// The relaxed request chosen by the last search
    pub fn selected_request(&self) -> Option<&ProfileChangeRequest> {
        self.selected.as_ref()
    }

    /// Pick the two bests and the overall selection from the remedy list
    ///
    /// Remedies are scanned in enumeration order with a greedy running max
    /// (strict greater-than, so the earliest among equals wins). A remedy
    /// that relaxes both sides matches neither best and only feeds the
    /// unweighted last-seen fallback.
    fn determine_best_solutions(&mut self) {
        let mut fallback: Option<ProfileChangeRequest> = None;

        for remedy in &self.remedies {
            let Some(request) = remedy.request.as_ref() else {
                continue;
            };
            if remedy.installation_relaxed_weight == 0 {
                let better = self
                    .best_changing_the_request
                    .as_ref()
                    .is_none_or(|best| {
                        remedy.being_installed_relaxed_weight
                            > best.being_installed_relaxed_weight
                    });
                if better {
                    self.best_changing_the_request = Some(remedy.clone());
                }
            } else if remedy.being_installed_relaxed_weight == 0 {
                let better = self
                    .best_changing_what_is_installed
                    .as_ref()
                    .is_none_or(|best| {
                        remedy.installation_relaxed_weight > best.installation_relaxed_weight
                    });
                if better {
                    self.best_changing_what_is_installed = Some(remedy.clone());
                }
            } else {
                // Matches neither condition; last seen wins, unweighted
                fallback = Some(request.clone());
            }
        }

        self.selected = self
            .best_changing_the_request
            .as_ref()
            .and_then(|r| r.request.clone())
            .or_else(|| {
                self.best_changing_what_is_installed
                    .as_ref()
                    .and_then(|r| r.request.clone())
            })
            .or(fallback);
    }
}

impl ChangeOperation for RemediationOperation {
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
        self.remedies.clear();
        self.best_changing_the_request = None;
        self.best_changing_what_is_installed = None;
        self.selected = None;

        let configs = if self.check_for_updates {
            vec![RemedyConfig::check_for_updates()]
        } else {
            RemedyConfig::all()
        };

        for config in configs {
            // Cancellation between sub-resolutions discards partial results
            if monitor.is_cancelled() {
                self.remedies.clear();
                return Err(Error::Cancelled);
            }
            monitor.set_message(&format!("Trying relaxation: {}", config));
            match self
                .flexer
                .relaxed_request(&self.original, profile, &config, monitor)?
            {
                Some(request) => {
                    debug!(config = %config, "relaxation admits a resolution");
                    self.remedies
                        .push(Remedy::new(config, Some(request), self.original.clone()));
                }
                None => {
                    debug!(config = %config, "relaxation infeasible, skipping");
                    diagnostics.push(Status::info(
                        StatusCode::PlannerFailure,
                        format!("no resolution under relaxation ({})", config),
                    ));
                }
            }
            monitor.worked(1);
        }

        if self.check_for_updates {
            self.selected = self
                .remedies
                .first()
                .and_then(|remedy| remedy.request.clone());
        } else {
            self.determine_best_solutions();
        }

        match self.selected.clone() {
            Some(request) => Ok(Some(request)),
            None => {
                diagnostics.push(Status::error(
                    StatusCode::NoRemedyFound,
                    "no relaxation of the request admits a resolution",
                ));
                Ok(None)
            }
        }
    }
}
