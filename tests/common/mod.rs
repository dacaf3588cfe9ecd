// tests/common/mod.rs

//! Shared test utilities: fixture builders and scripted collaborators.

#![allow(dead_code)]

use director::{
    InstallableUnit, Plan, Planner, Profile, ProfileChangeRequest, ProfileRegistry,
    ProgressMonitor, ProvisioningContext, RemedyConfig, RequestFlexer, Result, Status, StatusCode,
    Version, PROP_PROFILE_ROOT,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Initialize tracing output for tests; safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Build a plain unit.
pub fn iu(id: &str, version: &str) -> InstallableUnit {
    InstallableUnit::new(id, Version::parse(version).unwrap())
}

/// Build a patch unit.
pub fn patch_iu(id: &str, version: &str) -> InstallableUnit {
    iu(id, version).with_patch(true)
}

/// Build a profile with the given units installed as roots.
pub fn root_profile(id: &str, roots: &[InstallableUnit]) -> Profile {
    let mut profile = Profile::new(id);
    for root in roots {
        profile.add_iu(root.clone());
        profile.set_iu_property(root, PROP_PROFILE_ROOT, "true");
    }
    profile
}

/// Apply a change request to a profile the way the external store would.
///
/// Used to close the loop in idempotence tests; the real engine is out of
/// scope for this crate.
pub fn apply_request(profile: &mut Profile, request: &ProfileChangeRequest) {
    for iu in request.removals() {
        profile.remove_iu(iu);
    }
    for iu in request.additions() {
        profile.add_iu(iu.clone());
    }
    for (iu, key, value) in request.iu_property_sets() {
        profile.set_iu_property(iu, key.clone(), value.clone());
    }
    for (iu, key) in request.iu_property_removals() {
        profile.remove_iu_property(iu, key);
    }
    for (key, value) in request.profile_property_sets() {
        profile.set_property(key.clone(), value.clone());
    }
    for key in request.profile_property_removals() {
        profile.remove_property(key);
    }
}

/// In-memory profile registry.
#[derive(Default)]
pub struct InMemoryRegistry {
    profiles: Mutex<HashMap<String, Profile>>,
}

impl InMemoryRegistry {
    pub fn with_profile(profile: Profile) -> Arc<Self> {
        let registry = Self::default();
        registry
            .profiles
            .lock()
            .unwrap()
            .insert(profile.id().to_string(), profile);
        Arc::new(registry)
    }

    /// Replace a stored profile (simulates the engine applying a plan).
    pub fn store(&self, profile: Profile) {
        self.profiles
            .lock()
            .unwrap()
            .insert(profile.id().to_string(), profile);
    }
}

impl ProfileRegistry for InMemoryRegistry {
    fn profile(&self, id: &str) -> Option<Profile> {
        self.profiles.lock().unwrap().get(id).cloned()
    }
}

/// Scripted planner: accepts every request unless told to fail, and serves
/// update candidates from a fixed table.
#[derive(Default)]
pub struct FakePlanner {
    updates: HashMap<InstallableUnit, Vec<InstallableUnit>>,
    fail_message: Option<String>,
    pub resolve_calls: AtomicUsize,
    pub updates_calls: AtomicUsize,
}

impl FakePlanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_updates(mut self, iu: InstallableUnit, candidates: Vec<InstallableUnit>) -> Self {
        self.updates.insert(iu, candidates);
        self
    }

    /// Reject every request as infeasible with the given explanation.
    pub fn failing(mut self, message: &str) -> Self {
        self.fail_message = Some(message.to_string());
        self
    }
}

impl Planner for FakePlanner {
    fn resolve(
        &self,
        request: &ProfileChangeRequest,
        _context: &ProvisioningContext,
        _monitor: &dyn ProgressMonitor,
    ) -> Result<Plan> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        let status = match &self.fail_message {
            Some(message) => Status::error(StatusCode::PlannerFailure, message.clone()),
            None => Status::ok(StatusCode::PlanAccepted, "request is resolvable"),
        };
        Ok(Plan::new(request.clone(), status))
    }

    fn updates_for(
        &self,
        iu: &InstallableUnit,
        _context: &ProvisioningContext,
        _monitor: &dyn ProgressMonitor,
    ) -> Result<Vec<InstallableUnit>> {
        self.updates_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.updates.get(iu).cloned().unwrap_or_default())
    }
}

/// Scripted request flexer: admits a resolution only for the listed configs.
///
/// The produced request is the original tagged with the admitting config so
/// tests can tell which relaxation a remedy came from.
#[derive(Default)]
pub struct ScriptedFlexer {
    feasible: Vec<RemedyConfig>,
    pub calls: Mutex<Vec<RemedyConfig>>,
}

impl ScriptedFlexer {
    pub fn feasible_for(configs: Vec<RemedyConfig>) -> Self {
        Self {
            feasible: configs,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl RequestFlexer for ScriptedFlexer {
    fn relaxed_request(
        &self,
        original: &ProfileChangeRequest,
        _profile: &Profile,
        config: &RemedyConfig,
        _monitor: &dyn ProgressMonitor,
    ) -> Result<Option<ProfileChangeRequest>> {
        self.calls.lock().unwrap().push(*config);
        if self.feasible.contains(config) {
            let mut relaxed = original.clone();
            relaxed.set_profile_property("remedy.config", config.to_string());
            Ok(Some(relaxed))
        } else {
            Ok(None)
        }
    }
}

/// A context wired to an in-memory registry holding one profile.
pub fn context_for(profile: Profile, planner: Arc<FakePlanner>) -> ProvisioningContext {
    ProvisioningContext::new(InMemoryRegistry::with_profile(profile), planner)
}
