// src/model/mod.rs

//! Installable unit and profile model
//!
//! An installable unit (IU) is the immutable description of a versioned
//! component: identity, requirements, provided capabilities, and an optional
//! update descriptor naming what it replaces. A profile is the record of what
//! is currently installed, plus per-unit and profile-wide properties.
//!
//! This core only reads profiles and proposes deltas; the persisted store
//! that owns them applies changes through the engine.

use crate::version::{Version, VersionRange};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Per-unit profile property marking an explicitly user-requested install
pub const PROP_PROFILE_ROOT: &str = "director.root";

/// Per-unit profile property locking a unit against implied updates
pub const PROP_LOCKED_UPDATE: &str = "director.locked.update";

/// A capability provided by an installable unit
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Capability {
    pub name: String,
    pub version: Version,
}

/// A requirement on a named capability within a version range
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Requirement {
    pub name: String,
    pub range: VersionRange,
    /// Optional requirements do not force installation of a provider
    pub optional: bool,
}

/// Declares which unit this one is an update of
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UpdateDescriptor {
    /// Identifier of the unit being replaced
    pub target_id: String,
    /// Versions of the target this update applies to
    pub range: VersionRange,
}

impl UpdateDescriptor {
    /// Check whether `iu` is a unit this descriptor updates
    pub fn matches(&self, iu: &InstallableUnit) -> bool {
        iu.id == self.target_id && self.range.includes(&iu.version)
    }
}

/// Immutable description of a versioned component
///
/// Identity is `(id, version)`: two units with the same id and version are
/// interchangeable, regardless of the rest of their metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallableUnit {
    pub id: String,
    pub version: Version,
    /// At most one version of a singleton may be installed at a time
    pub singleton: bool,
    /// Patches modify another unit's effective requirements without replacing it
    pub patch: bool,
    pub requirements: Vec<Requirement>,
    pub provided_capabilities: Vec<Capability>,
    pub update_descriptor: Option<UpdateDescriptor>,
}

impl InstallableUnit {
    /// Create a unit with the given identity and no metadata
    pub fn new(id: impl Into<String>, version: Version) -> Self {
        Self {
            id: id.into(),
            version,
            singleton: false,
            patch: false,
            requirements: Vec::new(),
            provided_capabilities: Vec::new(),
            update_descriptor: None,
        }
    }

    pub fn with_singleton(mut self, singleton: bool) -> Self {
        self.singleton = singleton;
        self
    }

    pub fn with_patch(mut self, patch: bool) -> Self {
        self.patch = patch;
        self
    }

    pub fn with_requirement(mut self, requirement: Requirement) -> Self {
        self.requirements.push(requirement);
        self
    }

    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.provided_capabilities.push(capability);
        self
    }

    pub fn with_update_descriptor(mut self, descriptor: UpdateDescriptor) -> Self {
        self.update_descriptor = Some(descriptor);
        self
    }

    /// Check whether this unit declares itself an update of `other`
    pub fn is_update_of(&self, other: &InstallableUnit) -> bool {
        self.update_descriptor
            .as_ref()
            .is_some_and(|d| d.matches(other))
    }
}

// Identity is (id, version) only; the remaining fields are metadata that two
// interchangeable units are expected to share.
impl PartialEq for InstallableUnit {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.version == other.version
    }
}

impl Eq for InstallableUnit {}

impl Hash for InstallableUnit {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.version.hash(state);
    }
}

impl fmt::Display for InstallableUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.version)
    }
}

/// An installed unit together with its profile properties
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProfileUnit {
    iu: InstallableUnit,
    properties: BTreeMap<String, String>,
}

/// The record of what is currently installed
///
/// Owned by an external persisted store; this core reads it during
/// resolution and proposes deltas through
/// [`crate::request::ProfileChangeRequest`], never mutating it directly.
/// The mutators below exist for the owning store and for test setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    id: String,
    units: Vec<ProfileUnit>,
    properties: BTreeMap<String, String>,
}

impl Profile {
    /// Create an empty profile with the given id
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            units: Vec::new(),
            properties: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// All installed units, in installation order
    pub fn ius(&self) -> impl Iterator<Item = &InstallableUnit> {
        self.units.iter().map(|u| &u.iu)
    }

    /// Whether the exact unit (id and version) is installed
    pub fn contains(&self, iu: &InstallableUnit) -> bool {
        self.units.iter().any(|u| u.iu == *iu)
    }

    /// First installed unit with the given id, any version
    pub fn iu_with_id(&self, id: &str) -> Option<&InstallableUnit> {
        self.units.iter().map(|u| &u.iu).find(|iu| iu.id == id)
    }

    /// Units marked as explicitly user-requested
    pub fn roots(&self) -> impl Iterator<Item = &InstallableUnit> {
        self.units
            .iter()
            .filter(|u| u.properties.get(PROP_PROFILE_ROOT).map(String::as_str) == Some("true"))
            .map(|u| &u.iu)
    }

    pub fn is_root(&self, iu: &InstallableUnit) -> bool {
        self.iu_property(iu, PROP_PROFILE_ROOT) == Some("true")
    }

    /// Whether the unit is locked against implied updates
    pub fn is_update_locked(&self, iu: &InstallableUnit) -> bool {
        self.iu_property(iu, PROP_LOCKED_UPDATE) == Some("true")
    }

    /// A per-unit property value
    pub fn iu_property(&self, iu: &InstallableUnit, key: &str) -> Option<&str> {
        self.units
            .iter()
            .find(|u| u.iu == *iu)
            .and_then(|u| u.properties.get(key))
            .map(String::as_str)
    }

    /// A profile-wide property value (e.g. environment filter)
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Install a unit; replaces an existing entry with the same identity
    pub fn add_iu(&mut self, iu: InstallableUnit) {
        self.remove_iu(&iu);
        self.units.push(ProfileUnit {
            iu,
            properties: BTreeMap::new(),
        });
    }

    /// Remove an installed unit and its properties
    pub fn remove_iu(&mut self, iu: &InstallableUnit) {
        self.units.retain(|u| u.iu != *iu);
    }

    /// Set a per-unit property; no-op if the unit is not installed
    pub fn set_iu_property(
        &mut self,
        iu: &InstallableUnit,
        key: impl Into<String>,
        value: impl Into<String>,
    ) {
        if let Some(unit) = self.units.iter_mut().find(|u| u.iu == *iu) {
            unit.properties.insert(key.into(), value.into());
        }
    }

    /// Remove a per-unit property; no-op if absent
    pub fn remove_iu_property(&mut self, iu: &InstallableUnit, key: &str) {
        if let Some(unit) = self.units.iter_mut().find(|u| u.iu == *iu) {
            unit.properties.remove(key);
        }
    }

    /// Set a profile-wide property
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    /// Remove a profile-wide property
    pub fn remove_property(&mut self, key: &str) {
        self.properties.remove(key);
    }
}
