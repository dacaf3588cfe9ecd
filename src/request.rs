// src/request.rs

//! Profile change requests
//!
//! A change request is the command object handed to the planner: the units
//! to add and remove, per-unit inclusion-rule overrides, and property edits.
//! It is built against exactly one profile, mutated by a single writer, and
//! discarded once planned.

use crate::model::{InstallableUnit, PROP_PROFILE_ROOT};
use serde::{Deserialize, Serialize};

/// How strongly an added unit is included in the resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InclusionRule {
    /// The unit must be installed for the request to resolve
    Strict,
    /// The unit is installed when possible; removing it later does not
    /// force-remove what it applies to (used for patches)
    Optional,
}

/// A pending delta against one profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileChangeRequest {
    profile_id: String,
    additions: Vec<InstallableUnit>,
    removals: Vec<InstallableUnit>,
    inclusion_rules: Vec<(InstallableUnit, InclusionRule)>,
    iu_property_sets: Vec<(InstallableUnit, String, String)>,
    iu_property_removals: Vec<(InstallableUnit, String)>,
    profile_property_sets: Vec<(String, String)>,
    profile_property_removals: Vec<String>,
}

impl ProfileChangeRequest {
    /// Create an empty request against the given profile
    pub fn new(profile_id: impl Into<String>) -> Self {
        Self {
            profile_id: profile_id.into(),
            additions: Vec::new(),
            removals: Vec::new(),
            inclusion_rules: Vec::new(),
            iu_property_sets: Vec::new(),
            iu_property_removals: Vec::new(),
            profile_property_sets: Vec::new(),
            profile_property_removals: Vec::new(),
        }
    }

    pub fn profile_id(&self) -> &str {
        &self.profile_id
    }

    /// Queue a unit for installation; duplicate adds are collapsed
    pub fn add(&mut self, iu: InstallableUnit) {
        if !self.additions.contains(&iu) {
            self.additions.push(iu);
        }
    }

    /// Queue a unit for removal; duplicate removes are collapsed
    pub fn remove(&mut self, iu: InstallableUnit) {
        if !self.removals.contains(&iu) {
            self.removals.push(iu);
        }
    }

    /// Override the inclusion rule for an added unit (last write wins)
    pub fn set_inclusion_rule(&mut self, iu: &InstallableUnit, rule: InclusionRule) {
        if let Some(entry) = self.inclusion_rules.iter_mut().find(|(i, _)| i == iu) {
            entry.1 = rule;
        } else {
            self.inclusion_rules.push((iu.clone(), rule));
        }
    }

    /// Queue a per-unit property write
    pub fn set_iu_property(
        &mut self,
        iu: &InstallableUnit,
        key: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.iu_property_sets
            .push((iu.clone(), key.into(), value.into()));
    }

    /// Queue a per-unit property removal
    pub fn remove_iu_property(&mut self, iu: &InstallableUnit, key: impl Into<String>) {
        self.iu_property_removals.push((iu.clone(), key.into()));
    }

    /// Queue a profile-wide property write
    pub fn set_profile_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.profile_property_sets.push((key.into(), value.into()));
    }

    /// Queue a profile-wide property removal
    pub fn remove_profile_property(&mut self, key: impl Into<String>) {
        self.profile_property_removals.push(key.into());
    }

    /// Mark a unit as explicitly user-requested
    pub fn mark_root(&mut self, iu: &InstallableUnit) {
        self.set_iu_property(iu, PROP_PROFILE_ROOT, "true");
    }

    /// Clear the user-requested marker so the unit is no longer treated as
    /// wanted even if other units retain it transitively
    pub fn clear_root(&mut self, iu: &InstallableUnit) {
        self.remove_iu_property(iu, PROP_PROFILE_ROOT);
    }

    pub fn additions(&self) -> &[InstallableUnit] {
        &self.additions
    }

    pub fn removals(&self) -> &[InstallableUnit] {
        &self.removals
    }

    /// The inclusion rule override for a unit, if any
    pub fn inclusion_rule(&self, iu: &InstallableUnit) -> Option<InclusionRule> {
        self.inclusion_rules
            .iter()
            .find(|(i, _)| i == iu)
            .map(|(_, r)| *r)
    }

    pub fn iu_property_sets(&self) -> &[(InstallableUnit, String, String)] {
        &self.iu_property_sets
    }

    pub fn iu_property_removals(&self) -> &[(InstallableUnit, String)] {
        &self.iu_property_removals
    }

    pub fn profile_property_sets(&self) -> &[(String, String)] {
        &self.profile_property_sets
    }

    pub fn profile_property_removals(&self) -> &[String] {
        &self.profile_property_removals
    }

    /// Whether the request would change nothing at all
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty()
            && self.removals.is_empty()
            && self.iu_property_sets.is_empty()
            && self.iu_property_removals.is_empty()
            && self.profile_property_sets.is_empty()
            && self.profile_property_removals.is_empty()
    }

    /// Human-readable summary of the queued actions
    pub fn describe(&self) -> String {
        let mut lines = Vec::new();
        for iu in &self.additions {
            match self.inclusion_rule(iu) {
                Some(InclusionRule::Optional) => lines.push(format!("Install {} [optional]", iu)),
                _ => lines.push(format!("Install {}", iu)),
            }
        }
        for iu in &self.removals {
            lines.push(format!("Remove {}", iu));
        }
        for (iu, key, value) in &self.iu_property_sets {
            lines.push(format!("Set {}={} on {}", key, value, iu));
        }
        for (iu, key) in &self.iu_property_removals {
            lines.push(format!("Clear {} on {}", key, iu));
        }
        if lines.is_empty() {
            lines.push("No changes".to_string());
        }
        lines.join("\n")
    }
}
