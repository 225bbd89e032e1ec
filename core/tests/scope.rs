mod common;

use common::*;
use grc_core::{
    model::{EntityKind, RiskClassification},
    scope::{FixedScope, ScopeFilter, Unscoped, VisibleSet},
    store::{SqliteStore, TeamScope},
    EngineConfig, EngineError, EngineResult, StatusEngine,
};

fn teamed_store() -> SqliteStore {
    let store = store();
    add_control(&store, "c-fin", "monthly", RiskClassification::Medium);
    add_control(&store, "c-ops", "monthly", RiskClassification::High);
    add_control(&store, "c-none", "monthly", RiskClassification::Low);
    add_kpi(&store, "k-fin", "c-fin");
    add_kpi(&store, "k-ops", "c-ops");
    store.link_control_team("c-fin", "finance").unwrap();
    store.link_control_team("c-ops", "ops").unwrap();
    store
}

fn ids(store: &SqliteStore, scope: &dyn ScopeFilter) -> Vec<String> {
    let engine = StatusEngine::new(store, EngineConfig::default_test()).unwrap();
    engine
        .load_entities(scope)
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect()
}

#[test]
fn unscoped_sees_everything() {
    let store = teamed_store();
    assert_eq!(
        ids(&store, &Unscoped),
        vec!["c-fin", "c-none", "c-ops", "k-fin", "k-ops"],
        "controls first, then KPIs, each by id"
    );
}

#[test]
fn caller_in_no_team_sees_nothing() {
    let store = teamed_store();
    let scope = TeamScope::new(&store, vec![]);
    assert!(ids(&store, &scope).is_empty());
}

#[test]
fn single_team_sees_its_controls_and_their_kpis() {
    let store = teamed_store();
    let scope = TeamScope::new(&store, vec!["finance".into()]);
    assert_eq!(ids(&store, &scope), vec!["c-fin", "k-fin"]);
}

#[test]
fn many_teams_see_the_union() {
    let store = teamed_store();
    store.link_control_team("c-fin", "ops").unwrap();
    let scope = TeamScope::new(&store, vec!["finance".into(), "ops".into()]);
    assert_eq!(ids(&store, &scope), vec!["c-fin", "c-ops", "k-fin", "k-ops"]);
}

#[test]
fn fixed_scope_limits_by_control_id() {
    let store = teamed_store();
    assert_eq!(ids(&store, &FixedScope::new(["c-ops"])), vec!["c-ops", "k-ops"]);
}

#[test]
fn archived_controls_are_hidden() {
    let store = teamed_store();
    store.archive_control("c-ops").unwrap();
    assert_eq!(ids(&store, &Unscoped), vec!["c-fin", "c-none", "k-fin"]);
}

#[test]
fn scoped_dashboard_only_counts_visible_controls() {
    let store = teamed_store();
    let engine = StatusEngine::new(&store, EngineConfig::default_test()).unwrap();
    let scope = TeamScope::new(&store, vec!["ops".into()]);

    let summary = engine
        .evaluate_dashboard(&scope, EntityKind::Control, as_of("2024-02-20"))
        .unwrap();

    assert_eq!(summary.total_entities, 1);
    assert_eq!(summary.counts.overdue, 1);
}

struct BrokenDirectory;

impl ScopeFilter for BrokenDirectory {
    fn visible_entity_ids(&self) -> EngineResult<VisibleSet> {
        Err(EngineError::ScopeResolution { reason: "directory unavailable".into() })
    }
}

#[test]
fn scope_failure_aborts_the_request() {
    let store = teamed_store();
    let engine = StatusEngine::new(&store, EngineConfig::default_test()).unwrap();

    let err = engine
        .evaluate_dashboard(&BrokenDirectory, EntityKind::Control, as_of("2024-02-20"))
        .unwrap_err();

    assert!(matches!(err, EngineError::ScopeResolution { .. }), "got {err:?}");
}

#[test]
fn detail_lookups_respect_scope() {
    let store = teamed_store();
    let engine = StatusEngine::new(&store, EngineConfig::default_test()).unwrap();
    let finance = TeamScope::new(&store, vec!["finance".into()]);

    assert!(engine.find_entity(&finance, "k-fin").unwrap().is_some());
    assert!(engine.find_entity(&finance, "k-ops").unwrap().is_none(), "other team's KPI");
    assert!(engine.find_control(&finance, "c-fin").unwrap().is_some());
    assert!(engine.find_control(&finance, "c-ops").unwrap().is_none(), "other team's control");
    assert!(engine.find_control(&Unscoped, "c-ops").unwrap().is_some());
}

