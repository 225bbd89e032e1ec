//! Portfolio summaries. The counts, the trend and the critical list
//! must all agree, because they come from one evaluation.

mod common;

use common::*;
use grc_core::{
    classifier::Applicability,
    model::{AutoStatus, EntityKind, RiskClassification, TrackedEntity},
    scope::Unscoped,
    store::SqliteStore,
    EngineConfig, StatusEngine,
};

/// Six controls as of 2024-02-20:
///   c1 monthly medium   Jan in target      → effective
///   c2 monthly high     Jan out of target  → out of standard (critical)
///   c3 monthly low      nothing            → overdue
///   c4 quarterly crit.  (Feb not collected) → not applicable
///   c5 monthly critical Jan warning        → warning
///   c6 monthly medium   Jan out of target  → out of standard (not critical)
fn mixed_portfolio() -> SqliteStore {
    let store = store();
    add_control(&store, "c1", "monthly", RiskClassification::Medium);
    add_control(&store, "c2", "monthly", RiskClassification::High);
    add_control(&store, "c3", "monthly", RiskClassification::Low);
    add_control(&store, "c4", "quarterly", RiskClassification::Critical);
    add_control(&store, "c5", "monthly", RiskClassification::Critical);
    add_control(&store, "c6", "monthly", RiskClassification::Medium);
    add_execution(&store, "e1", "c1", "2024-01-31", AutoStatus::InTarget,    1_000);
    add_execution(&store, "e2", "c2", "2024-01-31", AutoStatus::OutOfTarget, 1_000);
    add_execution(&store, "e4", "c4", "2023-12-31", AutoStatus::OutOfTarget, 1_000);
    add_execution(&store, "e5", "c5", "2024-01-31", AutoStatus::Warning,     1_000);
    add_execution(&store, "e6", "c6", "2024-01-31", AutoStatus::OutOfTarget, 1_000);
    store
}

fn controls(engine: &StatusEngine<'_, SqliteStore>) -> Vec<TrackedEntity> {
    engine
        .load_entities(&Unscoped)
        .unwrap()
        .into_iter()
        .filter(|e| e.kind == EntityKind::Control)
        .collect()
}

#[test]
fn empty_portfolio_is_all_zero() {
    let store = store();
    let engine = StatusEngine::new(&store, EngineConfig::default_test()).unwrap();

    let summary = engine.evaluate_portfolio(&[], as_of("2024-02-20")).unwrap();

    assert_eq!(summary.total_entities, 0);
    assert_eq!(summary.counts.total(), 0);
    assert_eq!(summary.in_target_pct, 0.0);
    assert!(summary.critical.is_empty());
    assert_eq!(summary.trend.len(), 6, "one point per trend month even with no data");
    assert!(summary.trend.iter().all(|p| p.counts.total() == 0 && p.in_target_pct == 0.0));
}

#[test]
fn mixed_portfolio_counts() {
    let store = mixed_portfolio();
    let engine = StatusEngine::new(&store, EngineConfig::default_test()).unwrap();

    let summary = engine
        .evaluate_dashboard(&Unscoped, EntityKind::Control, as_of("2024-02-20"))
        .unwrap();

    let c = summary.counts;
    assert_eq!(summary.total_entities, 6);
    assert_eq!(c.effective, 1);
    assert_eq!(c.warning, 1);
    assert_eq!(c.out_of_standard, 2);
    assert_eq!(c.overdue, 1);
    assert_eq!(c.pending, 0);
    assert_eq!(c.not_applicable, 1);
    assert_eq!(summary.overdue_count, 1);
    assert_eq!(summary.in_target_pct, 20.0, "1 effective of 5 tracked");
}

#[test]
fn critical_list_holds_high_risk_out_of_standard_only() {
    let store = mixed_portfolio();
    let engine = StatusEngine::new(&store, EngineConfig::default_test()).unwrap();

    let summary = engine.evaluate_portfolio(&controls(&engine), as_of("2024-02-20")).unwrap();

    let ids: Vec<&str> = summary.critical.iter().map(|e| e.entity_id.as_str()).collect();
    assert_eq!(ids, vec!["c2"]);
    let entry = &summary.critical[0];
    assert_eq!(entry.risk, RiskClassification::High);
    assert_eq!(entry.due_date, Some(date("2024-02-14")));
    assert_eq!(entry.matched_execution_id.as_deref(), Some("e2"));
}

#[test]
fn last_trend_point_matches_summary() {
    let store = mixed_portfolio();
    let engine = StatusEngine::new(&store, EngineConfig::default_test()).unwrap();

    let summary = engine.evaluate_portfolio(&controls(&engine), as_of("2024-02-20")).unwrap();

    assert_eq!(summary.trend.len(), 6);
    let months: Vec<&str> = summary.trend.iter().map(|p| p.month.as_str()).collect();
    assert_eq!(months, vec!["2023-09", "2023-10", "2023-11", "2023-12", "2024-01", "2024-02"]);

    let last = summary.trend.last().unwrap();
    assert_eq!(last.counts, summary.counts);
    assert_eq!(last.in_target_pct, summary.in_target_pct);
}

#[test]
fn trend_history_reflects_each_month() {
    let store = store();
    add_control(&store, "m1", "monthly", RiskClassification::Medium);
    add_execution(&store, "e-dec", "m1", "2023-12-31", AutoStatus::InTarget, 1_000);
    add_execution(&store, "e-jan", "m1", "2024-01-31", AutoStatus::OutOfTarget, 2_000);
    let engine = StatusEngine::new(&store, EngineConfig::default_test()).unwrap();

    let trend = engine.evaluate_trend(&controls(&engine), as_of("2024-02-20"), 3).unwrap();

    assert_eq!(trend.len(), 3);
    // Dec looks at Nov: nothing, long overdue.
    assert_eq!(trend[0].month, "2023-12");
    assert_eq!(trend[0].counts.overdue, 1);
    // Jan looks at Dec.
    assert_eq!(trend[1].counts.effective, 1);
    assert_eq!(trend[1].in_target_pct, 100.0);
    // Feb looks at Jan.
    assert_eq!(trend[2].counts.out_of_standard, 1);
    assert_eq!(trend[2].in_target_pct, 0.0);
}

#[test]
fn critical_list_ordering() {
    let store = store();
    add_control(&store, "q1", "quarterly", RiskClassification::High);
    add_control(&store, "m1", "monthly", RiskClassification::Critical);
    add_control(&store, "m2", "monthly", RiskClassification::High);
    add_control(&store, "m3", "monthly", RiskClassification::High);
    add_execution(&store, "eq1", "q1", "2023-12-31", AutoStatus::OutOfTarget, 1_000);
    add_execution(&store, "em1", "m1", "2024-01-31", AutoStatus::OutOfTarget, 1_000);
    add_execution(&store, "em2", "m2", "2024-01-31", AutoStatus::OutOfTarget, 3_000);
    add_execution(&store, "em3", "m3", "2024-01-31", AutoStatus::OutOfTarget, 2_000);
    let config = EngineConfig {
        applicability: Applicability::Always,
        ..EngineConfig::default_test()
    };
    let engine = StatusEngine::new(&store, config).unwrap();

    let summary = engine.evaluate_portfolio(&controls(&engine), as_of("2024-02-20")).unwrap();

    let ids: Vec<&str> = summary.critical.iter().map(|e| e.entity_id.as_str()).collect();
    // Feb 14 before Feb 29; critical before high; newer execution first.
    assert_eq!(ids, vec!["m1", "m2", "m3", "q1"]);
    assert_eq!(summary.critical[3].due_date, Some(date("2024-02-29")));
}

#[test]
fn critical_list_is_capped() {
    let store = store();
    for i in 0..12 {
        let id = format!("c{i:02}");
        add_control(&store, &id, "monthly", RiskClassification::High);
        add_execution(&store, &format!("e{i:02}"), &id, "2024-01-31", AutoStatus::OutOfTarget, 1_000 + i);
    }
    let engine = StatusEngine::new(&store, EngineConfig::default_test()).unwrap();

    let summary = engine.evaluate_portfolio(&controls(&engine), as_of("2024-02-20")).unwrap();

    assert_eq!(summary.counts.out_of_standard, 12);
    assert_eq!(summary.critical.len(), 10);
    assert_eq!(summary.critical[0].entity_id, "c11", "most recent execution first on ties");
}

#[test]
fn awaiting_review_counts_matched_executions_in_queue() {
    let store = store();
    for (id, workflow) in [("a", "submitted"), ("b", "under_review"), ("c", "approved")] {
        add_control(&store, id, "monthly", RiskClassification::Medium);
        let mut exec = execution(&format!("e-{id}"), id, None, "2024-01-31", Some(AutoStatus::InTarget), 1_000);
        exec.workflow_status = workflow.into();
        store.insert_execution(&exec).unwrap();
    }
    // Queued, but for a period nobody is looking at.
    add_control(&store, "d", "monthly", RiskClassification::Medium);
    let mut stale = execution("e-d", "d", None, "2023-11-30", Some(AutoStatus::InTarget), 1_000);
    stale.workflow_status = "submitted".into();
    store.insert_execution(&stale).unwrap();
    let engine = StatusEngine::new(&store, EngineConfig::default_test()).unwrap();

    let summary = engine.evaluate_portfolio(&controls(&engine), as_of("2024-02-20")).unwrap();

    assert_eq!(summary.awaiting_review, 2);
}

#[test]
fn result_does_not_depend_on_pool_size() {
    let store = mixed_portfolio();
    add_kpi(&store, "k1", "c1");
    add_kpi(&store, "k2", "c2");

    let run = |threads: usize| {
        let config = EngineConfig { max_concurrency: threads, ..EngineConfig::default_test() };
        let engine = StatusEngine::new(&store, config).unwrap();
        let entities = engine.load_entities(&Unscoped).unwrap();
        let summary = engine.evaluate_portfolio(&entities, as_of("2024-02-20")).unwrap();
        serde_json::to_string(&summary).unwrap()
    };

    assert_eq!(run(1), run(8));
}

#[test]
fn kpi_dashboard_counts_kpis_only() {
    let store = mixed_portfolio();
    add_kpi(&store, "k1", "c1");
    add_kpi(&store, "k4", "c4");
    store
        .insert_execution(&execution("ek1", "c1", Some("k1"), "2024-01-31", Some(AutoStatus::InTarget), 1_000))
        .unwrap();
    let engine = StatusEngine::new(&store, EngineConfig::default_test()).unwrap();

    let summary = engine
        .evaluate_dashboard(&Unscoped, EntityKind::Kpi, as_of("2024-02-20"))
        .unwrap();

    assert_eq!(summary.total_entities, 2);
    assert_eq!(summary.counts.effective, 1);
    assert_eq!(summary.counts.not_applicable, 1, "k4 follows its quarterly control");
    assert_eq!(summary.in_target_pct, 100.0);
}

/// Trend months before the supported calendar window carry no data.
/// They read as zero activity, not as an error.
#[test]
fn trend_months_before_window_are_zero() {
    let store = store();
    add_control(&store, "m1", "monthly", RiskClassification::Medium);
    let engine = StatusEngine::new(&store, EngineConfig::default_test()).unwrap();

    let summary = engine.evaluate_portfolio(&controls(&engine), as_of("1900-03-10")).unwrap();

    let months: Vec<&str> = summary.trend.iter().map(|p| p.month.as_str()).collect();
    assert_eq!(months, vec!["1899-10", "1899-11", "1899-12", "1900-01", "1900-02", "1900-03"]);
    assert!(summary.trend[..3].iter().all(|p| p.counts.total() == 0 && p.in_target_pct == 0.0));
    assert_eq!(summary.trend[3].counts.total(), 1);
    assert_eq!(summary.trend.last().unwrap().counts, summary.counts);
    assert_eq!(summary.counts.pending, 1);
}

