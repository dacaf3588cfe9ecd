// tests/update.rs

//! Update-selection policy: precedence, tie-breaks, caching, and overrides.

mod common;

use common::{context_for, iu, patch_iu, root_profile, FakePlanner};
use director::{
    ChangeOperation, Error, InclusionRule, OperationState, ResolutionKind, Severity,
    SilentMonitor, StatusCode, Update, UpdateOperation, PROP_PROFILE_ROOT,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;

#[test]
fn test_true_update_beats_patch_regardless_of_order() {
    common::init_tracing();
    let app = iu("app", "1.0");
    let update = iu("app", "1.1");
    let fix = patch_iu("app-fix", "1.0");

    // Patch discovered first
    let planner = Arc::new(
        FakePlanner::new().with_updates(app.clone(), vec![fix.clone(), update.clone()]),
    );
    let context = context_for(root_profile("default", &[app.clone()]), planner);
    let mut op = UpdateOperation::new(context, "default");
    op.resolve(&SilentMonitor::new());
    let request = op.resolved_request().unwrap();
    assert_eq!(request.additions(), &[update.clone()]);
    assert_eq!(request.removals(), &[app.clone()]);

    // Patch discovered last
    let planner = Arc::new(
        FakePlanner::new().with_updates(app.clone(), vec![update.clone(), fix.clone()]),
    );
    let context = context_for(root_profile("default", &[app.clone()]), planner);
    let mut op = UpdateOperation::new(context, "default");
    op.resolve(&SilentMonitor::new());
    let request = op.resolved_request().unwrap();
    assert_eq!(request.additions(), &[update]);
    assert_eq!(request.removals(), &[app]);
}

#[test]
fn test_latest_wins_with_stable_first_seen_tie_break() {
    let app = iu("app", "1.0");
    // Two distinct 1.1 candidates: identity-equal, different metadata.
    // The first seen must be kept on a version tie.
    let first = iu("app", "1.1").with_singleton(true);
    let second = iu("app", "1.1");
    let older = iu("app", "1.0.1");

    let planner = Arc::new(FakePlanner::new().with_updates(
        app.clone(),
        vec![older, first.clone(), second],
    ));
    let context = context_for(root_profile("default", &[app.clone()]), planner);
    let mut op = UpdateOperation::new(context, "default");
    op.resolve(&SilentMonitor::new());

    let request = op.resolved_request().unwrap();
    assert_eq!(request.additions().len(), 1);
    let selected = &request.additions()[0];
    assert_eq!(selected, &first);
    // Metadata proves which instance won the tie
    assert!(selected.singleton);
}

#[test]
fn test_patch_only_update_keeps_original_and_is_optional() {
    let app = iu("app", "1.0");
    let fix = patch_iu("app-fix", "1.0");

    let planner = Arc::new(FakePlanner::new().with_updates(app.clone(), vec![fix.clone()]));
    let context = context_for(root_profile("default", &[app.clone()]), planner);
    let mut op = UpdateOperation::new(context, "default");
    op.resolve(&SilentMonitor::new());

    let request = op.resolved_request().unwrap();
    assert_eq!(request.additions(), &[fix.clone()]);
    assert!(request.removals().is_empty());
    assert_eq!(request.inclusion_rule(&fix), Some(InclusionRule::Optional));
    assert!(request
        .iu_property_sets()
        .iter()
        .any(|(unit, key, _)| *unit == fix && key == PROP_PROFILE_ROOT));
}

#[test]
fn test_already_installed_candidates_are_filtered() {
    let app = iu("app", "1.0");
    let applied_fix = patch_iu("app-fix", "1.0");
    let mut profile = root_profile("default", &[app.clone()]);
    profile.add_iu(applied_fix.clone());

    let planner = Arc::new(FakePlanner::new().with_updates(app.clone(), vec![applied_fix]));
    let context = context_for(profile, Arc::clone(&planner));
    let mut op = UpdateOperation::new(context, "default");
    let status = op.resolve(&SilentMonitor::new());

    // The only candidate is already applied, so there is nothing to update
    assert_eq!(status.code, StatusCode::NothingToUpdate);
    assert_eq!(
        op.resolution().state,
        OperationState::Resolved(ResolutionKind::NoChange)
    );
}

#[test]
fn test_nothing_to_update_is_not_an_error() {
    let app = iu("app", "1.0");
    let planner = Arc::new(FakePlanner::new());
    let context = context_for(root_profile("default", &[app]), planner);
    let mut op = UpdateOperation::new(context, "default");
    let status = op.resolve(&SilentMonitor::new());

    assert_eq!(status.code, StatusCode::NothingToUpdate);
    assert_eq!(status.severity, Severity::Info);
}

#[test]
fn test_candidate_lookup_is_memoised_per_instance() {
    let app = iu("app", "1.0");
    let update = iu("app", "1.1");
    let planner = Arc::new(FakePlanner::new().with_updates(app.clone(), vec![update]));
    let context = context_for(root_profile("default", &[app.clone()]), Arc::clone(&planner));
    let mut op = UpdateOperation::new(context, "default");
    let monitor = SilentMonitor::new();

    op.possible_updates(&monitor).unwrap();
    op.possible_updates(&monitor).unwrap();
    op.resolve(&monitor);
    assert_eq!(planner.updates_calls.load(Ordering::SeqCst), 1);

    // Re-resolving invalidates the memo and queries again
    op.resolve(&monitor);
    assert_eq!(planner.updates_calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_selected_updates_override_automatic_selection() {
    let app = iu("app", "1.0");
    let newest = iu("app", "1.2");
    let older = iu("app", "1.1");
    let planner = Arc::new(
        FakePlanner::new().with_updates(app.clone(), vec![older.clone(), newest.clone()]),
    );
    let context = context_for(root_profile("default", &[app.clone()]), planner);
    let mut op = UpdateOperation::new(context, "default");
    let monitor = SilentMonitor::new();

    // Explicitly pick the older candidate instead of the automatic winner
    op.set_selected_updates(vec![Update::new(app.clone(), older.clone())], &monitor)
        .unwrap();
    op.resolve(&monitor);

    let request = op.resolved_request().unwrap();
    assert_eq!(request.additions(), &[older]);
    assert_eq!(request.removals(), &[app]);
}

#[test]
fn test_selected_updates_validated_against_candidates() {
    let app = iu("app", "1.0");
    let planner = Arc::new(FakePlanner::new().with_updates(app.clone(), vec![iu("app", "1.1")]));
    let context = context_for(root_profile("default", &[app.clone()]), planner);
    let mut op = UpdateOperation::new(context, "default");

    let bogus = Update::new(app, iu("app", "9.9"));
    let result = op.set_selected_updates(vec![bogus], &SilentMonitor::new());
    assert!(matches!(result, Err(Error::Precondition(_))));
}

#[test]
fn test_update_scenario_root_with_true_update_and_patch() {
    // Profile has root app 1.0; repository offers app 1.1 and a patch.
    // With no explicit selection the result adds 1.1 as root, removes 1.0,
    // and excludes the patch entirely.
    let app = iu("app", "1.0");
    let update = iu("app", "1.1");
    let fix = patch_iu("app-fix", "1.0");

    let planner = Arc::new(
        FakePlanner::new().with_updates(app.clone(), vec![update.clone(), fix.clone()]),
    );
    let context = context_for(root_profile("default", &[app.clone()]), planner);
    let mut op = UpdateOperation::new(context, "default");
    let monitor = SilentMonitor::new();

    // Both candidates are visible before selection
    let possible = op.possible_updates(&monitor).unwrap();
    assert_eq!(possible.len(), 2);

    let status = op.resolve(&monitor);
    assert_eq!(status.severity, Severity::Ok);
    let request = op.resolved_request().unwrap();
    assert_eq!(request.additions(), &[update.clone()]);
    assert_eq!(request.removals(), &[app]);
    assert!(!request.additions().contains(&fix));
    assert!(request
        .iu_property_sets()
        .iter()
        .any(|(unit, key, _)| *unit == update && key == PROP_PROFILE_ROOT));
}
