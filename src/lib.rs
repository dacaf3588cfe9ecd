// src/lib.rs

//! Director - Profile-Change Resolution & Remediation Engine
//!
//! Director decides what change to request against an installed software
//! configuration ("profile") of versioned, interdependent components
//! ("installable units"), and - when the strict request is infeasible -
//! searches a bounded configuration space of relaxations for the best
//! feasible alternative.
//!
//! # Architecture
//!
//! - Immutable unit/profile model: resolution reads state, never writes it
//! - Change requests: single-writer command objects handed to the planner
//! - Operations: one resolution lifecycle per instance, with caching
//! - Remediation: weighted search over 15 relaxation configurations
//! - External collaborators (planner, flexer, registry, engine) as traits

pub mod engine;
mod error;
pub mod model;
pub mod monitor;
pub mod operation;
pub mod remedy;
pub mod request;
pub mod status;
pub mod version;

pub use engine::{
    Engine, InFlightRegistry, Plan, Planner, ProfileRegistry, ProvisioningContext,
    ProvisioningJob, RequestFlexer,
};
pub use error::{Error, Result};
pub use model::{
    Capability, InstallableUnit, Profile, Requirement, UpdateDescriptor, PROP_LOCKED_UPDATE,
    PROP_PROFILE_ROOT,
};
pub use monitor::{CancelFlag, LogMonitor, ProgressMonitor, SilentMonitor};
pub use operation::{
    ChangeOperation, InstallOperation, OperationState, ResolutionKind, ResolutionResult,
    SynchronizeOperation, UninstallOperation, Update, UpdateOperation,
};
pub use remedy::{RemediationOperation, Remedy, RemedyConfig};
pub use request::{InclusionRule, ProfileChangeRequest};
pub use status::{Severity, Status, StatusCode};
pub use version::{Version, VersionRange};
