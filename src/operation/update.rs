// src/operation/update.rs

//! Update operation and update-selection policy
//!
//! Given a set of installed units to update (default: all current roots),
//! decide exactly one replacement per original unit, or honor a
//! caller-supplied selection. The policy:
//!
//! - candidates already installed are dropped (a patch already applied is
//!   never re-proposed);
//! - patches are keyed by replacement id, true updates by the original id;
//!   within a key the highest version wins, strict greater-than only, so
//!   the first seen keeps ties;
//! - a true update always beats patches for the same original;
//! - a selected true update removes the original, a selected patch keeps it
//!   and is included optionally.
//!
//! Looking up candidates is expensive, so results are memoised per unit for
//! the lifetime of the operation instance and invalidated when it is
//! re-resolved.

use super::{ChangeOperation, ResolutionResult};
use crate::engine::ProvisioningContext;
use crate::error::{Error, Result};
use crate::model::{InstallableUnit, Profile};
use crate::monitor::ProgressMonitor;
use crate::request::{InclusionRule, ProfileChangeRequest};
use crate::status::{Status, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// One candidate replacement edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Update {
    pub to_update: InstallableUnit,
    pub replacement: InstallableUnit,
}

impl Update {
    pub fn new(to_update: InstallableUnit, replacement: InstallableUnit) -> Self {
        Self {
            to_update,
            replacement,
        }
    }
}

impl fmt::Display for Update {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => {}", self.to_update, self.replacement)
    }
}

/// Updates installed units to the best available replacements
pub struct UpdateOperation {
    context: ProvisioningContext,
    profile_id: String,
    /// Units to update; `None` means all current roots
    targets: Option<Vec<InstallableUnit>>,
    /// Candidate lookups are expensive; memoised per unit, cleared on re-resolve
    possible_updates_by_iu: HashMap<InstallableUnit, Vec<InstallableUnit>>,
    selected_updates: Option<Vec<Update>>,
    resolution: ResolutionResult,
}

impl UpdateOperation {
    /// Update every current root of the profile
    pub fn new(context: ProvisioningContext, profile_id: impl Into<String>) -> Self {
        Self {
            context,
            profile_id: profile_id.into(),
            targets: None,
            possible_updates_by_iu: HashMap::new(),
            selected_updates: None,
            resolution: ResolutionResult::default(),
        }
    }

    /// Update only the given units
    pub fn with_targets(mut self, targets: Vec<InstallableUnit>) -> Self {
        self.targets = Some(targets);
        self
    }

    /// All candidate updates, one per (original, replacement) pair
    ///
    /// Triggers the candidate lookup; subsequent calls are served from the
    /// memo until the operation is re-resolved.
    pub fn possible_updates(&mut self, monitor: &dyn ProgressMonitor) -> Result<Vec<Update>> {
        let profile = self.lookup_profile()?;
        let targets = self.effective_targets(&profile);
        let mut updates = Vec::new();
        for iu in &targets {
            if monitor.is_cancelled() {
                return Err(Error::Cancelled);
            }
            for candidate in self.lookup_updates(&profile, iu, monitor)? {
                updates.push(Update::new(iu.clone(), candidate));
            }
        }
        Ok(updates)
    }

    /// Override the automatic selection with an explicit update list
    ///
    /// Every entry must be one of the computed candidates; callers must
    /// resolve again for the selection to take effect.
    pub fn set_selected_updates(
        &mut self,
        updates: Vec<Update>,
        monitor: &dyn ProgressMonitor,
    ) -> Result<()> {
        let profile = self.lookup_profile()?;
        for update in &updates {
            let candidates = self.lookup_updates(&profile, &update.to_update, monitor)?;
            if !candidates.contains(&update.replacement) {
                return Err(Error::precondition(format!(
                    "{} is not a known update of {}",
                    update.replacement, update.to_update
                )));
            }
        }
        self.selected_updates = Some(updates);
        Ok(())
    }

    pub fn selected_updates(&self) -> Option<&[Update]> {
        self.selected_updates.as_deref()
    }

    fn lookup_profile(&self) -> Result<Profile> {
        self.context
            .profile(&self.profile_id)
            .ok_or_else(|| Error::ProfileNotFound(self.profile_id.clone()))
    }

    fn effective_targets(&self, profile: &Profile) -> Vec<InstallableUnit> {
        match &self.targets {
            Some(targets) => targets.clone(),
            None => profile.roots().cloned().collect(),
        }
    }

    /// Memoised candidate lookup, filtered of already-installed candidates
    fn lookup_updates(
        &mut self,
        profile: &Profile,
        iu: &InstallableUnit,
        monitor: &dyn ProgressMonitor,
    ) -> Result<Vec<InstallableUnit>> {
        if let Some(cached) = self.possible_updates_by_iu.get(iu) {
            return Ok(cached.clone());
        }
        debug!(iu = %iu, "looking up update candidates");
        let planner = Arc::clone(self.context.planner());
        let candidates = planner.updates_for(iu, &self.context, monitor)?;
        let filtered: Vec<InstallableUnit> = candidates
            .into_iter()
            .filter(|c| !profile.contains(c))
            .collect();
        self.possible_updates_by_iu
            .insert(iu.clone(), filtered.clone());
        Ok(filtered)
    }

    /// Pick the winning replacement(s) for one original unit
    fn select_for(
        original: &InstallableUnit,
        candidates: Vec<InstallableUnit>,
        elements: &mut Vec<Update>,
    ) {
        let mut best_true: Option<InstallableUnit> = None;
        // Best patch per replacement id, insertion order preserved
        let mut best_patches: Vec<InstallableUnit> = Vec::new();

        for candidate in candidates {
            if candidate.patch {
                match best_patches.iter_mut().find(|p| p.id == candidate.id) {
                    // Strict greater-than: equal versions keep the first seen
                    Some(existing) => {
                        if candidate.version > existing.version {
                            *existing = candidate;
                        }
                    }
                    None => best_patches.push(candidate),
                }
            } else {
                match &best_true {
                    Some(existing) => {
                        if candidate.version > existing.version {
                            best_true = Some(candidate);
                        }
                    }
                    None => best_true = Some(candidate),
                }
            }
        }

        if let Some(replacement) = best_true {
            // A true update beats any patches for the same original
            elements.push(Update::new(original.clone(), replacement));
        } else {
            for patch in best_patches {
                elements.push(Update::new(original.clone(), patch));
            }
        }
    }
}

impl ChangeOperation for UpdateOperation {
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

    fn on_resolve_start(&mut self, rerun: bool) {
        if rerun {
            self.possible_updates_by_iu.clear();
        }
    }

    fn compute_change_request(
        &mut self,
        profile: &Profile,
        diagnostics: &mut Vec<Status>,
        monitor: &dyn ProgressMonitor,
    ) -> Result<Option<ProfileChangeRequest>> {
        let elements = match self.selected_updates.clone() {
            Some(selected) => selected,
            None => {
                let targets = self.effective_targets(profile);
                let mut elements = Vec::new();
                for iu in &targets {
                    if monitor.is_cancelled() {
                        return Err(Error::Cancelled);
                    }
                    monitor.set_message(&format!("Checking for updates to {}", iu));
                    let candidates = self.lookup_updates(profile, iu, monitor)?;
                    Self::select_for(iu, candidates, &mut elements);
                    monitor.worked(1);
                }
                elements
            }
        };

        if elements.is_empty() {
            diagnostics.push(Status::info(
                StatusCode::NothingToUpdate,
                "no updates available for the selected units",
            ));
            return Ok(None);
        }

        let mut request = ProfileChangeRequest::new(profile.id());
        for update in &elements {
            request.add(update.replacement.clone());
            request.mark_root(&update.replacement);
            if update.replacement.patch {
                // Patch: install alongside, optionally; the original stays
                request.set_inclusion_rule(&update.replacement, InclusionRule::Optional);
            } else {
                request.remove(update.to_update.clone());
            }
        }
        Ok(Some(request))
    }
}
