// src/engine/mod.rs

//! Collaborator contracts and the provisioning context
//!
//! The planner, request flexer, profile registry, and execution engine are
//! external collaborators: this core specifies their contracts as traits and
//! never ships an implementation beyond test fakes. The provisioning context
//! bundles the injected collaborators so operations (and tests) can run with
//! isolated instances rather than process globals.

use crate::error::{Error, Result};
use crate::model::{InstallableUnit, Profile};
use crate::monitor::ProgressMonitor;
use crate::remedy::RemedyConfig;
use crate::request::ProfileChangeRequest;
use crate::status::Status;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;

/// A feasible, executable description of the changes to apply
///
/// Opaque to this core beyond its status: the engine consumes it, resolution
/// only decides whether one exists.
#[derive(Debug, Clone)]
pub struct Plan {
    id: Uuid,
    created_at: DateTime<Utc>,
    request: ProfileChangeRequest,
    status: Status,
}

impl Plan {
    /// Create a plan for an accepted request
    pub fn new(request: ProfileChangeRequest, status: Status) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            request,
            status,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The request this plan satisfies
    pub fn request(&self) -> &ProfileChangeRequest {
        &self.request
    }

    /// The planner's verdict; Error severity means infeasible
    pub fn status(&self) -> &Status {
        &self.status
    }
}

/// Turns a change request into a feasible plan, or explains why it cannot
///
/// Infeasibility is reported through the returned plan's status (Error
/// severity); `Err` is reserved for collaborator failure.
pub trait Planner: Send + Sync {
    /// Resolve a change request against the profile it targets
    fn resolve(
        &self,
        request: &ProfileChangeRequest,
        context: &ProvisioningContext,
        monitor: &dyn ProgressMonitor,
    ) -> Result<Plan>;

    /// Candidate replacements for an installed unit
    fn updates_for(
        &self,
        iu: &InstallableUnit,
        context: &ProvisioningContext,
        monitor: &dyn ProgressMonitor,
    ) -> Result<Vec<InstallableUnit>>;
}

/// Attempts to loosen an infeasible request under one relaxation config
///
/// Returns a modified request guaranteed resolvable under the relaxed
/// constraints, or `None` when even this relaxation admits no resolution.
pub trait RequestFlexer: Send + Sync {
    fn relaxed_request(
        &self,
        original: &ProfileChangeRequest,
        profile: &Profile,
        config: &RemedyConfig,
        monitor: &dyn ProgressMonitor,
    ) -> Result<Option<ProfileChangeRequest>>;
}

/// Source of profile snapshots
pub trait ProfileRegistry: Send + Sync {
    fn profile(&self, id: &str) -> Option<Profile>;
}

/// Applies a resolved plan to the installed state
pub trait Engine: Send + Sync {
    fn perform(&self, plan: &Plan, monitor: &dyn ProgressMonitor) -> Status;
}

/// Advisory registry of profiles with a resolution currently in flight
///
/// Consulted once at resolve start, not held for the duration. This is a
/// best-effort, racy check; the planner and engine remain the source of
/// truth for genuinely conflicting concurrent mutation.
#[derive(Debug, Default)]
pub struct InFlightRegistry {
    active: Mutex<HashSet<String>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a profile as having a resolution in flight
    ///
    /// Returns false if one is already active for this id.
    pub fn begin(&self, profile_id: &str) -> bool {
        self.active.lock().unwrap().insert(profile_id.to_string())
    }

    /// Clear the in-flight mark; called on completion, success or not
    pub fn finish(&self, profile_id: &str) {
        self.active.lock().unwrap().remove(profile_id);
    }

    pub fn is_active(&self, profile_id: &str) -> bool {
        self.active.lock().unwrap().contains(profile_id)
    }
}

/// Bundles the injected collaborators and context properties for a resolution
#[derive(Clone)]
pub struct ProvisioningContext {
    registry: Arc<dyn ProfileRegistry>,
    planner: Arc<dyn Planner>,
    in_flight: Arc<InFlightRegistry>,
    properties: BTreeMap<String, String>,
}

impl ProvisioningContext {
    pub fn new(registry: Arc<dyn ProfileRegistry>, planner: Arc<dyn Planner>) -> Self {
        Self {
            registry,
            planner,
            in_flight: Arc::new(InFlightRegistry::new()),
            properties: BTreeMap::new(),
        }
    }

    /// Share an in-flight registry across contexts
    pub fn with_in_flight(mut self, in_flight: Arc<InFlightRegistry>) -> Self {
        self.in_flight = in_flight;
        self
    }

    /// Set a context property (e.g. an environment filter value)
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn profile(&self, id: &str) -> Option<Profile> {
        self.registry.profile(id)
    }

    pub fn planner(&self) -> &Arc<dyn Planner> {
        &self.planner
    }

    pub fn in_flight(&self) -> &Arc<InFlightRegistry> {
        &self.in_flight
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

/// One-shot executable unit of work wrapping a resolved plan
///
/// Obtainable from a resolved operation only while its status severity is
/// below Cancel. Running it twice is a precondition violation.
pub struct ProvisioningJob {
    plan: Plan,
    engine: Arc<dyn Engine>,
    executed: AtomicBool,
}

impl ProvisioningJob {
    pub fn new(plan: Plan, engine: Arc<dyn Engine>) -> Self {
        Self {
            plan,
            engine,
            executed: AtomicBool::new(false),
        }
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    /// Execute the plan through the engine; single-shot
    pub fn run(&self, monitor: &dyn ProgressMonitor) -> Result<Status> {
        if self.executed.swap(true, Ordering::SeqCst) {
            return Err(Error::precondition("provisioning job already executed"));
        }
        if monitor.is_cancelled() {
            return Ok(Status::cancel("provisioning cancelled before execution"));
        }
        debug!(plan = %self.plan.id(), "executing provisioning job");
        Ok(self.engine.perform(&self.plan, monitor))
    }
}
