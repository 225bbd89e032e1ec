//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use chrono::{Datelike, NaiveDate, TimeZone, Utc};
use grc_core::{
    model::{AutoStatus, Control, Execution, Kpi, RiskClassification, TrackedEntity},
    store::SqliteStore,
    AsOf,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A migrated in-memory store.
pub fn store() -> SqliteStore {
    init_logging();
    let store = SqliteStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid test date")
}

pub fn as_of(s: &str) -> AsOf {
    AsOf::parse(s).expect("valid as-of date")
}

pub fn control(id: &str, frequency: &str, risk: RiskClassification) -> Control {
    Control {
        id:                  id.into(),
        code:                id.to_uppercase(),
        name:                format!("Control {id}"),
        frequency:           frequency.into(),
        risk_classification: risk,
        owner_id:            Some("owner-1".into()),
    }
}

pub fn add_control(store: &SqliteStore, id: &str, frequency: &str, risk: RiskClassification) -> Control {
    let c = control(id, frequency, risk);
    store.insert_control(&c).expect("insert control");
    c
}

pub fn add_kpi(store: &SqliteStore, id: &str, control_id: &str) -> Kpi {
    let k = Kpi {
        id:         id.into(),
        control_id: control_id.into(),
        code:       id.to_uppercase(),
        name:       format!("KPI {id}"),
    };
    store.insert_kpi(&k).expect("insert kpi");
    k
}

pub fn execution(
    id:           &str,
    control_id:   &str,
    kpi_id:       Option<&str>,
    period_end:   &str,
    auto_status:  Option<AutoStatus>,
    created_secs: i64,
) -> Execution {
    let end = date(period_end);
    Execution {
        id:              id.into(),
        kpi_id:          kpi_id.map(Into::into),
        control_id:      control_id.into(),
        period_start:    end.with_day(1).expect("first of month"),
        period_end:      end,
        result_numeric:  Some(95.0),
        auto_status,
        workflow_status: "approved".into(),
        created_at:      Utc.timestamp_opt(created_secs, 0).single().expect("timestamp"),
    }
}

pub fn add_execution(
    store:        &SqliteStore,
    id:           &str,
    control_id:   &str,
    period_end:   &str,
    auto_status:  AutoStatus,
    created_secs: i64,
) {
    store
        .insert_execution(&execution(id, control_id, None, period_end, Some(auto_status), created_secs))
        .expect("insert execution");
}

pub fn tracked(control: &Control) -> TrackedEntity {
    TrackedEntity::from_control(control)
}
